//! Testing infrastructure for correctness verification
//!
//! This module provides:
//! - Event capture and history tracking
//! - An invariant checking framework
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use tweetdex::index::InstrumentedIndex;
//! use tweetdex::testing::prelude::*;
//!
//! let mut index = InstrumentedIndex::new(TweetIndex::new(IndexSettings::default())?);
//! index.post("@ana", "hello #rust")?;
//! index.search_popular("#rust", 5)?;
//!
//! let violations = index.check_invariants(&default_invariants());
//! assert!(violations.is_empty());
//! ```
//!
//! # Invariants
//!
//! - **DenseSequentialIds**: ids are assigned 0, 1, 2, ... in posting order
//! - **FavoriteTargetsExist**: favorites succeed exactly for posted ids
//! - **ChronologicalOrderRespected**: newest first, within the limit
//! - **PopularOrderRespected**: most favorited first, counts match history
//! - **SearchResultsContainToken**: every result carries the searched token

pub mod events;
pub mod history;
pub mod invariants;

pub use events::{Event, OperationId, OperationResult, OperationType, Timestamp};
pub use history::EventLog;
pub use invariants::{
    check_all_invariants, default_invariants, ChronologicalOrderRespected, DenseSequentialIds,
    FavoriteTargetsExist, Invariant, PopularOrderRespected, SearchResultsContainToken, Violation,
};

/// Prelude for easy imports
pub mod prelude {
    pub use super::events::*;
    pub use super::history::EventLog;
    pub use super::invariants::{check_all_invariants, default_invariants, Invariant, Violation};
}
