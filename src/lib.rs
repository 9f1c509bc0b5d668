pub mod collections;
pub mod command;
pub mod config;
pub mod error;
pub mod index;
pub mod metrics;
pub mod models;
pub mod testing;
pub mod tokenizer;

pub use collections::{heap_sort, HashMap, Heap, List};
pub use command::{CommandParser, Session, SessionStats};
pub use config::{IndexSettings, TokenizerConfig};
pub use error::{Result, TweetdexError};
pub use index::{InstrumentedIndex, TweetIndex};
pub use metrics::IndexMetrics;
pub use models::*;
pub use tokenizer::Tokenizer;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
