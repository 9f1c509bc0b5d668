//! Instrumented index wrapper for testing
//!
//! Wraps a [`TweetIndex`] and records every operation in an [`EventLog`]
//! for invariant verification.

use crate::error::Result;
use crate::index::TweetIndex;
use crate::models::{SearchOrder, SearchRequest, Tweet, TweetId};
use crate::testing::prelude::*;

/// Wrapper around TweetIndex that captures events for testing
pub struct InstrumentedIndex {
    inner: TweetIndex,
    event_log: EventLog,
}

impl InstrumentedIndex {
    pub fn new(inner: TweetIndex) -> Self {
        Self {
            inner,
            event_log: EventLog::new(),
        }
    }

    /// Create with a pre-existing event log (for continuation testing)
    pub fn with_event_log(inner: TweetIndex, event_log: EventLog) -> Self {
        Self { inner, event_log }
    }

    pub fn event_log(&self) -> &EventLog {
        &self.event_log
    }

    pub fn inner(&self) -> &TweetIndex {
        &self.inner
    }

    pub fn into_inner(self) -> TweetIndex {
        self.inner
    }

    /// Post a tweet with event capture
    pub fn post(&mut self, author: &str, message: &str) -> Result<TweetId> {
        let op_id = self.event_log.record_invoke(OperationType::Post {
            author: author.to_string(),
            message: message.to_string(),
        });

        let result = self.inner.post(author, message);
        self.record_outcome(op_id, &result, |&id| OperationResult::PostSuccess { id });
        result
    }

    /// Favorite a tweet with event capture
    pub fn favorite(&mut self, id: TweetId) -> Result<()> {
        let op_id = self
            .event_log
            .record_invoke(OperationType::Favorite { id });

        let result = self.inner.favorite(id);
        self.record_outcome(op_id, &result, |_| OperationResult::FavoriteSuccess { id });
        result
    }

    /// Look up a tweet with event capture
    pub fn get(&self, id: TweetId) -> Option<&Tweet> {
        let op_id = self.event_log.record_invoke(OperationType::Get { id });
        let tweet = self.inner.get(id);
        self.event_log.record_return(
            op_id,
            OperationResult::GetSuccess {
                id,
                found: tweet.is_some(),
            },
        );
        tweet
    }

    /// Search with event capture
    pub fn search(&self, request: &SearchRequest) -> Result<Vec<&Tweet>> {
        let op_id = self.event_log.record_invoke(OperationType::Search {
            token: request.token.clone(),
            order: request.order,
            limit: request.limit,
        });

        let result = self.inner.search(request);
        self.record_outcome(op_id, &result, |tweets| OperationResult::SearchSuccess {
            ids: tweets.iter().map(|t| t.id()).collect(),
            favorites: tweets.iter().map(|t| t.favorite_count()).collect(),
        });
        result
    }

    pub fn search_chronological(&self, token: &str, limit: usize) -> Result<Vec<&Tweet>> {
        self.search(&SearchRequest::new(token, SearchOrder::Chronological, limit))
    }

    pub fn search_popular(&self, token: &str, limit: usize) -> Result<Vec<&Tweet>> {
        self.search(&SearchRequest::new(token, SearchOrder::Popular, limit))
    }

    /// Check invariants against the captured history
    pub fn check_invariants(&self, invariants: &[Box<dyn Invariant>]) -> Vec<Violation> {
        check_all_invariants(&self.event_log, invariants)
    }

    fn record_outcome<T>(
        &self,
        op_id: OperationId,
        result: &Result<T>,
        on_success: impl FnOnce(&T) -> OperationResult,
    ) {
        let outcome = match result {
            Ok(value) => on_success(value),
            Err(e) => OperationResult::Error {
                message: e.to_string(),
            },
        };
        self.event_log.record_return(op_id, outcome);
    }
}
