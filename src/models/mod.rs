pub mod command;
pub mod search;
pub mod tweet;

pub use command::Command;
pub use search::{effective_limit, SearchOrder, SearchRequest};
pub use tweet::{Tweet, TweetId};
