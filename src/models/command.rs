use serde::{Deserialize, Serialize};

use super::search::SearchRequest;
use super::tweet::TweetId;

/// A validated request from the command layer to the index
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    Post { author: String, message: String },
    Favorite { id: TweetId },
    Search(SearchRequest),
}

impl Command {
    /// Protocol name of the command
    pub fn name(&self) -> &'static str {
        match self {
            Command::Post { .. } => "post",
            Command::Favorite { .. } => "favorite",
            Command::Search(_) => "search",
        }
    }
}
