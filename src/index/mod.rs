pub mod engine;
pub mod instrumented;

pub use engine::TweetIndex;
pub use instrumented::InstrumentedIndex;
