use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TweetdexError;

/// Result ordering for a token search
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchOrder {
    /// Most recently posted first
    Chronological,
    /// Most favorited first
    Popular,
}

impl SearchOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchOrder::Chronological => "chronological",
            SearchOrder::Popular => "popular",
        }
    }
}

impl fmt::Display for SearchOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchOrder {
    type Err = TweetdexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "chronological" | "cronologico" => Ok(SearchOrder::Chronological),
            "popular" => Ok(SearchOrder::Popular),
            other => Err(TweetdexError::InvalidCommand(format!(
                "unknown search order '{other}'"
            ))),
        }
    }
}

/// Search for the tweets indexed under one token
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub token: String,
    pub order: SearchOrder,
    /// Maximum number of results; 0 means no limit
    pub limit: usize,
}

impl SearchRequest {
    pub fn new(token: impl Into<String>, order: SearchOrder, limit: usize) -> Self {
        Self {
            token: token.into(),
            order,
            limit,
        }
    }

    pub fn chronological(token: impl Into<String>, limit: usize) -> Self {
        Self::new(token, SearchOrder::Chronological, limit)
    }

    pub fn popular(token: impl Into<String>, limit: usize) -> Self {
        Self::new(token, SearchOrder::Popular, limit)
    }
}

/// Number of results a search with `limit` yields out of `available` matches
pub fn effective_limit(limit: usize, available: usize) -> usize {
    if limit == 0 {
        available
    } else {
        limit.min(available)
    }
}
