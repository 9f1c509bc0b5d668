//! Invariant checking framework for correctness verification
//!
//! Each invariant replays a completed event history and reports the first
//! inconsistency it finds. The index has a single writer, so completion
//! order is the order operations took effect.

use super::events::{OperationResult, OperationType};
use super::history::EventLog;
use crate::models::{SearchOrder, TweetId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A violation of an invariant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    pub invariant: String,
    pub description: String,
    pub violating_events: Vec<usize>, // indices into the completed events
    pub context: HashMap<String, String>,
}

impl Violation {
    fn new(invariant: &str, description: String, event: usize) -> Self {
        Self {
            invariant: invariant.to_string(),
            description,
            violating_events: vec![event],
            context: HashMap::new(),
        }
    }

    fn with_context(mut self, key: &str, value: impl ToString) -> Self {
        self.context.insert(key.to_string(), value.to_string());
        self
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "INVARIANT VIOLATION: {}", self.invariant)?;
        writeln!(f, "  Description: {}", self.description)?;
        writeln!(f, "  Violating events: {:?}", self.violating_events)?;
        if !self.context.is_empty() {
            writeln!(f, "  Context:")?;
            for (key, value) in &self.context {
                writeln!(f, "    {}: {}", key, value)?;
            }
        }
        Ok(())
    }
}

/// Trait for invariant checkers
pub trait Invariant: Send + Sync {
    fn name(&self) -> &str;

    /// Check the invariant against an event log
    fn check(&self, log: &EventLog) -> Result<(), Violation>;

    fn description(&self) -> &str {
        "No description provided"
    }
}

/// Check all invariants and return violations
pub fn check_all_invariants(log: &EventLog, invariants: &[Box<dyn Invariant>]) -> Vec<Violation> {
    invariants
        .iter()
        .filter_map(|invariant| invariant.check(log).err())
        .collect()
}

/// Invariant: tweet ids are assigned densely from zero in posting order
pub struct DenseSequentialIds;

impl Invariant for DenseSequentialIds {
    fn name(&self) -> &str {
        "DenseSequentialIds"
    }

    fn description(&self) -> &str {
        "The n-th successful post receives id n - 1"
    }

    fn check(&self, log: &EventLog) -> Result<(), Violation> {
        let mut expected: TweetId = 0;

        for (idx, event) in log.completed_events().iter().enumerate() {
            if let Some(OperationResult::PostSuccess { id }) = &event.result {
                if *id != expected {
                    return Err(Violation::new(
                        self.name(),
                        format!("post received id {} but {} was next", id, expected),
                        idx,
                    ));
                }
                expected += 1;
            }
        }

        Ok(())
    }
}

/// Invariant: favorites succeed exactly for ids that were already posted
pub struct FavoriteTargetsExist;

impl Invariant for FavoriteTargetsExist {
    fn name(&self) -> &str {
        "FavoriteTargetsExist"
    }

    fn description(&self) -> &str {
        "A favorite succeeds if and only if its id names a posted tweet"
    }

    fn check(&self, log: &EventLog) -> Result<(), Violation> {
        let mut posted = 0usize;

        for (idx, event) in log.completed_events().iter().enumerate() {
            match (&event.op_type, &event.result) {
                (_, Some(OperationResult::PostSuccess { .. })) => posted += 1,
                (OperationType::Favorite { id }, Some(result)) => {
                    let exists = *id < posted;
                    let succeeded = matches!(result, OperationResult::FavoriteSuccess { .. });
                    if exists != succeeded {
                        return Err(Violation::new(
                            self.name(),
                            format!(
                                "favorite of {} {} with {} tweets posted",
                                id,
                                if succeeded { "succeeded" } else { "failed" },
                                posted
                            ),
                            idx,
                        )
                        .with_context("result", format!("{:?}", result)));
                    }
                }
                _ => {}
            }
        }

        Ok(())
    }
}

/// Invariant: chronological searches return newest first within the limit
pub struct ChronologicalOrderRespected;

impl Invariant for ChronologicalOrderRespected {
    fn name(&self) -> &str {
        "ChronologicalOrderRespected"
    }

    fn description(&self) -> &str {
        "Chronological results have non-increasing ids and respect the limit"
    }

    fn check(&self, log: &EventLog) -> Result<(), Violation> {
        for (idx, event) in log.completed_events().iter().enumerate() {
            let (
                OperationType::Search {
                    order: SearchOrder::Chronological,
                    limit,
                    token,
                },
                Some(OperationResult::SearchSuccess { ids, .. }),
            ) = (&event.op_type, &event.result)
            else {
                continue;
            };

            if *limit > 0 && ids.len() > *limit {
                return Err(Violation::new(
                    self.name(),
                    format!("{} results exceed limit {}", ids.len(), limit),
                    idx,
                )
                .with_context("token", token));
            }
            if ids.windows(2).any(|pair| pair[0] < pair[1]) {
                return Err(Violation::new(
                    self.name(),
                    "results are not newest first".to_string(),
                    idx,
                )
                .with_context("token", token)
                .with_context("ids", format!("{:?}", ids)));
            }
        }

        Ok(())
    }
}

/// Invariant: popular searches return the most favorited tweets first and
/// report favorite counts consistent with the history
pub struct PopularOrderRespected;

impl Invariant for PopularOrderRespected {
    fn name(&self) -> &str {
        "PopularOrderRespected"
    }

    fn description(&self) -> &str {
        "Popular results have non-increasing favorites matching the replayed counts"
    }

    fn check(&self, log: &EventLog) -> Result<(), Violation> {
        let mut favorites: HashMap<TweetId, u64> = HashMap::new();

        for (idx, event) in log.completed_events().iter().enumerate() {
            match (&event.op_type, &event.result) {
                (_, Some(OperationResult::FavoriteSuccess { id })) => {
                    *favorites.entry(*id).or_default() += 1;
                }
                (
                    OperationType::Search { order, limit, token },
                    Some(OperationResult::SearchSuccess { ids, favorites: observed }),
                ) => {
                    if ids.len() != observed.len() {
                        return Err(Violation::new(
                            self.name(),
                            "favorite counts do not line up with ids".to_string(),
                            idx,
                        ));
                    }
                    for (id, count) in ids.iter().zip(observed) {
                        let replayed = favorites.get(id).copied().unwrap_or(0);
                        if replayed != *count {
                            return Err(Violation::new(
                                self.name(),
                                format!("tweet {} reported {} favorites, history has {}", id, count, replayed),
                                idx,
                            )
                            .with_context("token", token));
                        }
                    }

                    if *order != SearchOrder::Popular {
                        continue;
                    }
                    if *limit > 0 && ids.len() > *limit {
                        return Err(Violation::new(
                            self.name(),
                            format!("{} results exceed limit {}", ids.len(), limit),
                            idx,
                        )
                        .with_context("token", token));
                    }
                    if observed.windows(2).any(|pair| pair[0] < pair[1]) {
                        return Err(Violation::new(
                            self.name(),
                            "results are not most favorited first".to_string(),
                            idx,
                        )
                        .with_context("token", token)
                        .with_context("favorites", format!("{:?}", observed)));
                    }
                }
                _ => {}
            }
        }

        Ok(())
    }
}

/// Invariant: every search result was posted with the searched token
pub struct SearchResultsContainToken;

impl Invariant for SearchResultsContainToken {
    fn name(&self) -> &str {
        "SearchResultsContainToken"
    }

    fn description(&self) -> &str {
        "Each search result has the token as author or as a word of its message"
    }

    fn check(&self, log: &EventLog) -> Result<(), Violation> {
        let mut posts: Vec<(String, String)> = Vec::new();

        for (idx, event) in log.completed_events().iter().enumerate() {
            match (&event.op_type, &event.result) {
                (
                    OperationType::Post { author, message },
                    Some(OperationResult::PostSuccess { .. }),
                ) => posts.push((author.clone(), message.clone())),
                (
                    OperationType::Search { token, .. },
                    Some(OperationResult::SearchSuccess { ids, .. }),
                ) => {
                    for id in ids {
                        let carries_token = posts.get(*id).is_some_and(|(author, message)| {
                            author == token || message.split_whitespace().any(|w| w == token)
                        });
                        if !carries_token {
                            return Err(Violation::new(
                                self.name(),
                                format!("tweet {} returned for {} does not carry it", id, token),
                                idx,
                            ));
                        }
                    }
                }
                _ => {}
            }
        }

        Ok(())
    }
}

/// The invariants every index history must satisfy
pub fn default_invariants() -> Vec<Box<dyn Invariant>> {
    vec![
        Box::new(DenseSequentialIds),
        Box::new(FavoriteTargetsExist),
        Box::new(ChronologicalOrderRespected),
        Box::new(PopularOrderRespected),
        Box::new(SearchResultsContainToken),
    ]
}
