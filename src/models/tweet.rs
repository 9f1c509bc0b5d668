use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Result;

/// Tweet identifier: its position in the tweet store
pub type TweetId = usize;

/// A posted message. Only the favorite counter changes after creation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tweet {
    id: TweetId,
    author: String,
    message: String,
    favorite_count: u64,
}

impl Tweet {
    /// Create a tweet with no favorites, copying author and message
    pub fn new(id: TweetId, author: &str, message: &str) -> Result<Self> {
        Ok(Self {
            id,
            author: try_to_owned(author)?,
            message: try_to_owned(message)?,
            favorite_count: 0,
        })
    }

    pub fn id(&self) -> TweetId {
        self.id
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn favorite_count(&self) -> u64 {
        self.favorite_count
    }

    /// Add one favorite
    pub fn favorite(&mut self) {
        self.favorite_count += 1;
    }
}

/// Renders as `<id> <author> <message>`
impl fmt::Display for Tweet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.id, self.author, self.message)
    }
}

fn try_to_owned(s: &str) -> Result<String> {
    let mut owned = String::new();
    owned.try_reserve_exact(s.len())?;
    owned.push_str(s);
    Ok(owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_tweet() {
        let tweet = Tweet::new(3, "@ana", "hello #rust").unwrap();
        assert_eq!(tweet.id(), 3);
        assert_eq!(tweet.author(), "@ana");
        assert_eq!(tweet.message(), "hello #rust");
        assert_eq!(tweet.favorite_count(), 0);
    }

    #[test]
    fn test_favorite_only_increases() {
        let mut tweet = Tweet::new(0, "@ana", "hi").unwrap();
        tweet.favorite();
        tweet.favorite();
        assert_eq!(tweet.favorite_count(), 2);
    }

    #[test]
    fn test_display() {
        let tweet = Tweet::new(7, "@bob", "see you @ana").unwrap();
        assert_eq!(tweet.to_string(), "7 @bob see you @ana");
    }

    #[test]
    fn test_serialization() {
        let tweet = Tweet::new(1, "@ana", "hi").unwrap();
        let json = serde_json::to_string(&tweet).unwrap();
        assert_eq!(
            json,
            r#"{"id":1,"author":"@ana","message":"hi","favorite_count":0}"#
        );
        let back: Tweet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tweet);
    }
}
