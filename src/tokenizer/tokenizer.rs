use crate::config::TokenizerConfig;

/// Extracts the index tokens of a post: the author name and every
/// whitespace-delimited message word that starts with a configured sigil.
///
/// Tokens are matched exactly, with no case folding or punctuation
/// stripping, so `#Rust`, `#rust` and `#rust,` are three different tokens.
#[derive(Clone, Debug)]
pub struct Tokenizer {
    config: TokenizerConfig,
}

impl Tokenizer {
    /// Create a new tokenizer from configuration
    pub fn new(config: &TokenizerConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Whether `word` is a mention or hashtag
    pub fn is_token(&self, word: &str) -> bool {
        word.chars()
            .next()
            .is_some_and(|first| self.config.sigils.contains(&first))
    }

    /// Mentions and hashtags of `message` in order of appearance.
    /// Repeated words are yielded every time they occur.
    pub fn message_tokens<'a>(&'a self, message: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        message
            .split_whitespace()
            .filter(move |word| self.is_token(word))
    }

    /// All tokens a post is indexed under, author first
    pub fn post_tokens<'a>(
        &'a self,
        author: &'a str,
        message: &'a str,
    ) -> impl Iterator<Item = &'a str> + 'a {
        let author = self.config.index_author.then_some(author);
        author.into_iter().chain(self.message_tokens(message))
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new(&TokenizerConfig::default())
    }
}
