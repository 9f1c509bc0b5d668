use std::cmp::Ordering;

use tracing::{debug, error, trace};

use crate::collections::{HashMap, Heap, List};
use crate::config::IndexSettings;
use crate::error::{Result, TweetdexError};
use crate::models::{effective_limit, SearchOrder, SearchRequest, Tweet, TweetId};
use crate::tokenizer::Tokenizer;

/// Single-writer index of tweets by author, mention and hashtag.
///
/// The tweet store is the sole owner of every tweet; each token maps to a
/// list of tweet ids, newest first, resolved against the store on read.
pub struct TweetIndex {
    tweets: Vec<Tweet>,
    tokens: HashMap<List<TweetId>>,
    tokenizer: Tokenizer,
    settings: IndexSettings,
}

impl TweetIndex {
    pub fn new(settings: IndexSettings) -> Result<Self> {
        settings.validate()?;
        let mut tweets = Vec::new();
        tweets.try_reserve_exact(settings.store.initial_capacity)?;
        let tokens = HashMap::with_config(&settings.map)?;
        let tokenizer = Tokenizer::new(&settings.tokenizer);

        Ok(Self {
            tweets,
            tokens,
            tokenizer,
            settings,
        })
    }

    pub fn settings(&self) -> &IndexSettings {
        &self.settings
    }

    /// Number of stored tweets, which is also the next id to assign
    pub fn len(&self) -> usize {
        self.tweets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tweets.is_empty()
    }

    /// Number of distinct indexed tokens
    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    pub fn get(&self, id: TweetId) -> Option<&Tweet> {
        self.tweets.get(id)
    }

    /// Ids indexed under `token`, newest first
    pub fn token_postings(&self, token: &str) -> impl Iterator<Item = TweetId> + '_ {
        self.tokens
            .get(token)
            .into_iter()
            .flat_map(|postings| postings.iter().copied())
    }

    /// Store a new tweet and index it under its author and every mention
    /// and hashtag in `message`.
    ///
    /// A failure while indexing leaves the tweet stored but only partially
    /// indexed; callers must treat any error from here as fatal.
    pub fn post(&mut self, author: &str, message: &str) -> Result<TweetId> {
        self.reserve_store()?;
        let id = self.tweets.len();
        self.tweets.push(Tweet::new(id, author, message)?);

        let mut indexed = 0usize;
        for token in self.tokenizer.post_tokens(author, message) {
            match index_token(&mut self.tokens, token, id) {
                Ok(inserted) => indexed += usize::from(inserted),
                Err(err) => {
                    error!(id, token, error = %err, "indexing failed, tweet left partially indexed");
                    return Err(err);
                }
            }
        }

        debug!(id, author, tokens = indexed, "posted tweet");
        Ok(id)
    }

    /// Add a favorite to tweet `id`
    pub fn favorite(&mut self, id: TweetId) -> Result<()> {
        let tweet = self
            .tweets
            .get_mut(id)
            .ok_or(TweetdexError::TweetNotFound(id))?;
        tweet.favorite();
        debug!(id, favorites = tweet.favorite_count(), "favorited tweet");
        Ok(())
    }

    pub fn search(&self, request: &SearchRequest) -> Result<Vec<&Tweet>> {
        match request.order {
            SearchOrder::Chronological => self.search_chronological(&request.token, request.limit),
            SearchOrder::Popular => self.search_popular(&request.token, request.limit),
        }
    }

    /// Up to `limit` tweets indexed under `token`, most recent first.
    /// A `limit` of 0 returns all of them; an unknown token returns none.
    pub fn search_chronological(&self, token: &str, limit: usize) -> Result<Vec<&Tweet>> {
        let Some(postings) = self.tokens.get(token) else {
            debug!(token, "chronological search on unindexed token");
            return Ok(Vec::new());
        };

        let count = effective_limit(limit, postings.len());
        let mut results = Vec::new();
        results.try_reserve_exact(count)?;
        results.extend(
            postings
                .iter()
                .take(count)
                .filter_map(|&id| self.tweets.get(id)),
        );

        debug!(token, limit, results = results.len(), "chronological search");
        Ok(results)
    }

    /// Up to `limit` tweets indexed under `token`, most favorited first.
    ///
    /// Bounded top-K selection: a heap whose root is the least favorited
    /// of the retained candidates holds at most K tweets while the token's
    /// postings are scanned once. A candidate replaces the root only when it
    /// has strictly more favorites. Order among equally favorited tweets is
    /// unspecified.
    pub fn search_popular(&self, token: &str, limit: usize) -> Result<Vec<&Tweet>> {
        let Some(postings) = self.tokens.get(token) else {
            debug!(token, "popular search on unindexed token");
            return Ok(Vec::new());
        };

        let k = effective_limit(limit, postings.len());
        if k == 0 {
            return Ok(Vec::new());
        }

        let mut retained: Heap<&Tweet, _> =
            Heap::with_config(&self.settings.heap, fewer_favorites)?;
        let candidates = postings.iter().filter_map(|&id| self.tweets.get(id));
        for (scanned, tweet) in candidates.enumerate() {
            if scanned >= k {
                let beats_min = retained
                    .peek_max()
                    .is_some_and(|min| tweet.favorite_count() > min.favorite_count());
                if !beats_min {
                    continue;
                }
                retained.pop_max();
            }
            retained.push(tweet)?;
        }

        let mut results = Vec::new();
        results.try_reserve_exact(retained.len())?;
        while let Some(tweet) = retained.pop_max() {
            results.push(tweet);
        }
        results.reverse();

        debug!(token, limit, results = results.len(), "popular search");
        Ok(results)
    }

    fn reserve_store(&mut self) -> Result<()> {
        if self.tweets.len() < self.tweets.capacity() {
            return Ok(());
        }
        let capacity = self.tweets.capacity().max(1) * self.settings.store.growth_factor;
        self.tweets.try_reserve_exact(capacity - self.tweets.len())?;
        trace!(capacity, "grew tweet store");
        Ok(())
    }
}

/// Heap priority for popular search: fewer favorites ranks higher, so the
/// heap root is the weakest retained candidate.
fn fewer_favorites(a: &&Tweet, b: &&Tweet) -> Ordering {
    b.favorite_count().cmp(&a.favorite_count())
}

/// Prepend `id` to the postings of `token`, creating them on first use.
///
/// Returns false when the postings already start with `id`. The tweet being
/// posted is always the newest, so this collapses every repeat of a token
/// within one post, including an author who mentions themselves.
fn index_token(tokens: &mut HashMap<List<TweetId>>, token: &str, id: TweetId) -> Result<bool> {
    if let Some(postings) = tokens.get_mut(token) {
        if postings.peek_first() == Some(&id) {
            return Ok(false);
        }
        postings.insert_first(id)?;
        return Ok(true);
    }

    let mut postings = List::new();
    postings.insert_first(id)?;
    tokens.put(token, postings)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_index() -> TweetIndex {
        TweetIndex::new(IndexSettings::default()).unwrap()
    }

    fn ids(tweets: &[&Tweet]) -> Vec<TweetId> {
        tweets.iter().map(|t| t.id()).collect()
    }

    fn favorite_times(index: &mut TweetIndex, id: TweetId, times: usize) {
        for _ in 0..times {
            index.favorite(id).unwrap();
        }
    }

    #[test]
    fn test_ids_are_sequential() {
        let mut index = create_index();
        assert_eq!(index.post("@ana", "first").unwrap(), 0);
        assert_eq!(index.post("@bob", "second").unwrap(), 1);
        assert_eq!(index.post("@ana", "third").unwrap(), 2);
        assert_eq!(index.len(), 3);
        assert_eq!(index.get(1).unwrap().author(), "@bob");
        assert_eq!(index.get(1).unwrap().favorite_count(), 0);
    }

    #[test]
    fn test_store_grows_past_initial_capacity() {
        let settings = IndexSettings::default().with_store_capacity(2);
        let mut index = TweetIndex::new(settings).unwrap();
        for i in 0..20 {
            assert_eq!(index.post("@ana", &format!("post {i}")).unwrap(), i);
        }
        assert_eq!(index.get(19).unwrap().message(), "post 19");
        assert_eq!(index.token_postings("@ana").count(), 20);
    }

    #[test]
    fn test_favorite() {
        let mut index = create_index();
        index.post("@ana", "hi").unwrap();
        favorite_times(&mut index, 0, 2);
        assert_eq!(index.get(0).unwrap().favorite_count(), 2);
    }

    #[test]
    fn test_favorite_unknown_id() {
        let mut index = create_index();
        for _ in 0..3 {
            index.post("@ana", "hi").unwrap();
        }
        assert!(matches!(
            index.favorite(5),
            Err(TweetdexError::TweetNotFound(5))
        ));
        assert!(matches!(
            index.favorite(3),
            Err(TweetdexError::TweetNotFound(3))
        ));
        for id in 0..3 {
            assert_eq!(index.get(id).unwrap().favorite_count(), 0);
        }
    }

    #[test]
    fn test_author_mention_collapses() {
        let mut index = create_index();
        assert_eq!(index.post("@ana", "hello @ana #x").unwrap(), 0);

        assert_eq!(index.token_postings("@ana").collect::<Vec<_>>(), vec![0]);
        assert_eq!(index.token_postings("#x").collect::<Vec<_>>(), vec![0]);
        assert_eq!(index.token_count(), 2);
    }

    #[test]
    fn test_repeats_within_a_post_collapse() {
        let mut index = create_index();
        index.post("@bob", "#a #b #a").unwrap();
        index.post("@bob", "#a #a #b").unwrap();

        assert_eq!(index.token_postings("#a").collect::<Vec<_>>(), vec![1, 0]);
        assert_eq!(index.token_postings("#b").collect::<Vec<_>>(), vec![1, 0]);
        assert_eq!(index.token_postings("@bob").collect::<Vec<_>>(), vec![1, 0]);
        assert_eq!(index.search_chronological("#a", 0).unwrap().len(), 2);
    }

    #[test]
    fn test_chronological_order_and_limit() {
        let mut index = create_index();
        index.post("@ana", "A #t").unwrap();
        index.post("@bob", "B #t").unwrap();
        index.post("@cid", "C #t").unwrap();

        let all = index.search_chronological("#t", 0).unwrap();
        assert_eq!(ids(&all), vec![2, 1, 0]);

        let two = index.search_chronological("#t", 2).unwrap();
        assert_eq!(ids(&two), vec![2, 1]);

        let many = index.search_chronological("#t", 10).unwrap();
        assert_eq!(ids(&many), vec![2, 1, 0]);
    }

    #[test]
    fn test_unknown_token_is_empty() {
        let mut index = create_index();
        index.post("@ana", "#x").unwrap();
        assert!(index.search_chronological("#y", 0).unwrap().is_empty());
        assert!(index.search_popular("#y", 3).unwrap().is_empty());
        assert!(index.search_chronological("#X", 0).unwrap().is_empty());
    }

    #[test]
    fn test_popular_top_k() {
        let mut index = create_index();
        for i in 0..6 {
            index.post("@ana", &format!("post {i} #t")).unwrap();
        }
        favorite_times(&mut index, 1, 5);
        favorite_times(&mut index, 4, 3);
        favorite_times(&mut index, 2, 1);

        let top = index.search_popular("#t", 2).unwrap();
        assert_eq!(ids(&top), vec![1, 4]);

        let top = index.search_popular("#t", 3).unwrap();
        assert_eq!(ids(&top), vec![1, 4, 2]);

        let all = index.search_popular("#t", 0).unwrap();
        assert_eq!(all.len(), 6);
        let counts: Vec<u64> = all.iter().map(|t| t.favorite_count()).collect();
        assert_eq!(counts, vec![5, 3, 1, 0, 0, 0]);
    }

    #[test]
    fn test_popular_candidate_needs_strictly_more() {
        let mut index = create_index();
        index.post("@ana", "#t old").unwrap();
        index.post("@ana", "#t new").unwrap();
        favorite_times(&mut index, 0, 1);
        favorite_times(&mut index, 1, 1);

        // newest is scanned first and kept; the older tie does not displace it
        let top = index.search_popular("#t", 1).unwrap();
        assert_eq!(ids(&top), vec![1]);
    }

    #[test]
    fn test_popular_limit_above_matches() {
        let mut index = create_index();
        index.post("@ana", "#t").unwrap();
        index.post("@bob", "#t").unwrap();
        favorite_times(&mut index, 0, 2);

        let top = index.search_popular("#t", 50).unwrap();
        assert_eq!(ids(&top), vec![0, 1]);
    }

    #[test]
    fn test_search_dispatch() {
        let mut index = create_index();
        index.post("@ana", "#t").unwrap();
        index.post("@bob", "#t").unwrap();
        favorite_times(&mut index, 0, 1);

        let chrono = index.search(&SearchRequest::chronological("#t", 0)).unwrap();
        assert_eq!(ids(&chrono), vec![1, 0]);
        let popular = index.search(&SearchRequest::popular("#t", 0)).unwrap();
        assert_eq!(ids(&popular), vec![0, 1]);
    }

    #[test]
    fn test_author_not_indexed_when_disabled() {
        let mut settings = IndexSettings::default();
        settings.tokenizer.index_author = false;
        let mut index = TweetIndex::new(settings).unwrap();
        index.post("@ana", "hi #x").unwrap();
        assert_eq!(index.token_postings("@ana").count(), 0);
        assert_eq!(index.token_postings("#x").count(), 1);
    }

    #[test]
    fn test_rejects_invalid_settings() {
        let mut settings = IndexSettings::default();
        settings.store.initial_capacity = 0;
        assert!(matches!(
            TweetIndex::new(settings),
            Err(TweetdexError::Config(_))
        ));
    }
}
