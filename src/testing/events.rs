//! Event types for capturing index operations
//!
//! Events record every operation with its invocation and return times so a
//! history can be checked against the invariants in [`super::invariants`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::{SearchOrder, TweetId};

/// Unique identifier for an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperationId(pub u64);

impl OperationId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

/// Type of operation applied to the index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OperationType {
    /// Post a tweet
    Post { author: String, message: String },
    /// Favorite a tweet
    Favorite { id: TweetId },
    /// Search by token
    Search {
        token: String,
        order: SearchOrder,
        limit: usize,
    },
    /// Look up a tweet by id
    Get { id: TweetId },
}

/// Result of an operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OperationResult {
    /// Tweet stored under `id`
    PostSuccess { id: TweetId },
    /// Favorite applied
    FavoriteSuccess { id: TweetId },
    /// Search results in returned order, with each tweet's favorite count
    /// as observed when the search ran
    SearchSuccess {
        ids: Vec<TweetId>,
        favorites: Vec<u64>,
    },
    /// Lookup result
    GetSuccess { id: TweetId, found: bool },
    /// Operation failed
    Error { message: String },
}

/// Timestamp wrapper for consistent time handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now().timestamp_nanos_opt().unwrap_or(0))
    }

    pub fn from_nanos(nanos: i64) -> Self {
        Self(nanos)
    }

    pub fn to_datetime(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_nanos(self.0)
    }
}

/// A recorded event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Unique operation ID
    pub op_id: OperationId,

    /// Type of operation
    pub op_type: OperationType,

    /// When the operation was invoked
    pub invoke_time: Timestamp,

    /// When the operation returned (None if still pending)
    pub return_time: Option<Timestamp>,

    /// Result of the operation (None if still pending)
    pub result: Option<OperationResult>,
}

impl Event {
    /// Create a new event at invocation time
    pub fn invoke(op_id: OperationId, op_type: OperationType) -> Self {
        Self {
            op_id,
            op_type,
            invoke_time: Timestamp::now(),
            return_time: None,
            result: None,
        }
    }

    /// Mark event as completed
    pub fn complete(&mut self, result: OperationResult) {
        self.return_time = Some(Timestamp::now());
        self.result = Some(result);
    }

    pub fn is_complete(&self) -> bool {
        self.return_time.is_some() && self.result.is_some()
    }

    /// Duration of the operation in nanoseconds
    pub fn duration_nanos(&self) -> Option<i64> {
        self.return_time.map(|rt| rt.0 - self.invoke_time.0)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Op({:?}) {:?} @ {} -> ",
            self.op_id, self.op_type, self.invoke_time.0
        )?;
        match &self.result {
            Some(result) => write!(f, "{:?} @ {:?}", result, self.return_time),
            None => write!(f, "<pending>"),
        }
    }
}
