use std::collections::TryReserveError;

use thiserror::Error;

use crate::models::TweetId;

/// Main error type for tweetdex operations
#[derive(Error, Debug)]
pub enum TweetdexError {
    #[error("Allocation failure: {0}")]
    AllocationFailure(#[from] TryReserveError),

    #[error("Tweet not found: {0}")]
    TweetNotFound(TweetId),

    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error("Invalid tweet id: {0}")]
    InvalidTweetId(String),

    #[error("Tweet too long: {length} bytes, at most {max} allowed")]
    TweetTooLong { length: usize, max: usize },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for tweetdex operations
pub type Result<T> = std::result::Result<T, TweetdexError>;

impl TweetdexError {
    /// Fatal errors leave the engine in an unspecified state; the session
    /// must be torn down instead of continuing.
    pub fn is_fatal(&self) -> bool {
        matches!(self, TweetdexError::AllocationFailure(_))
    }

    /// Errors that are answered to the client and leave the engine untouched
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            TweetdexError::TweetNotFound(_)
                | TweetdexError::InvalidCommand(_)
                | TweetdexError::InvalidTweetId(_)
                | TweetdexError::TweetTooLong { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reserve_error() -> TryReserveError {
        let mut v: Vec<u64> = Vec::new();
        v.try_reserve(usize::MAX).unwrap_err()
    }

    #[test]
    fn test_error_display() {
        let err = TweetdexError::TweetNotFound(42);
        assert_eq!(err.to_string(), "Tweet not found: 42");

        let err = TweetdexError::TweetTooLong {
            length: 151,
            max: 150,
        };
        assert_eq!(
            err.to_string(),
            "Tweet too long: 151 bytes, at most 150 allowed"
        );
    }

    #[test]
    fn test_fatal_errors() {
        assert!(TweetdexError::from(reserve_error()).is_fatal());
        assert!(!TweetdexError::TweetNotFound(1).is_fatal());
        assert!(!TweetdexError::InvalidCommand("x".to_string()).is_fatal());
    }

    #[test]
    fn test_rejections() {
        assert!(TweetdexError::TweetNotFound(3).is_rejection());
        assert!(TweetdexError::InvalidTweetId("-1".to_string()).is_rejection());
        assert!(!TweetdexError::from(reserve_error()).is_rejection());
        assert!(!TweetdexError::Config("bad".to_string()).is_rejection());
    }
}
