use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Result, TweetdexError};

/// Index settings configuration
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    pub store: StoreConfig,
    pub map: MapConfig,
    pub heap: HeapConfig,
    pub tokenizer: TokenizerConfig,
    pub command: CommandConfig,
}

/// Growth policy of the append-only tweet store
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub initial_capacity: usize,
    pub growth_factor: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 100,
            growth_factor: 3,
        }
    }
}

/// Table sizing and load-factor hysteresis of the token map
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub initial_buckets: usize,
    pub min_load: f64,
    pub max_load: f64,
    pub ideal_load: f64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            initial_buckets: 97,
            min_load: 0.4,
            max_load: 2.0,
            ideal_load: 0.8,
        }
    }
}

/// Capacity policy of the priority heap
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeapConfig {
    pub initial_capacity: usize,
    pub grow_threshold: f64,
    pub growth_factor: usize,
    pub shrink_threshold: f64,
}

impl Default for HeapConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 50,
            grow_threshold: 0.9,
            growth_factor: 3,
            shrink_threshold: 0.3,
        }
    }
}

/// Tokenizer configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenizerConfig {
    /// Leading characters that turn a message word into an index token
    pub sigils: Vec<char>,
    /// Whether the author name is indexed as a token of its own tweets
    pub index_author: bool,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            sigils: vec!['@', '#'],
            index_author: true,
        }
    }
}

/// Limits enforced by the command layer before reaching the index
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandConfig {
    pub max_message_length: usize,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            max_message_length: 150,
        }
    }
}

impl IndexSettings {
    /// Load settings from a JSON file; missing fields keep their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let settings: IndexSettings = serde_json::from_str(&raw)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Override the maximum accepted message length
    pub fn with_max_message_length(mut self, max: usize) -> Self {
        self.command.max_message_length = max;
        self
    }

    /// Override the tweet store's initial capacity
    pub fn with_store_capacity(mut self, capacity: usize) -> Self {
        self.store.initial_capacity = capacity;
        self
    }

    /// Reject settings the containers cannot operate with
    pub fn validate(&self) -> Result<()> {
        if self.store.initial_capacity == 0 {
            return Err(TweetdexError::Config(
                "store.initial_capacity must be positive".to_string(),
            ));
        }
        if self.store.growth_factor < 2 || self.heap.growth_factor < 2 {
            return Err(TweetdexError::Config(
                "growth factors must be at least 2".to_string(),
            ));
        }
        if self.map.initial_buckets == 0 || self.heap.initial_capacity == 0 {
            return Err(TweetdexError::Config(
                "map.initial_buckets and heap.initial_capacity must be positive".to_string(),
            ));
        }
        if !(0.0 <= self.map.min_load
            && self.map.min_load < self.map.ideal_load
            && self.map.ideal_load < self.map.max_load)
        {
            return Err(TweetdexError::Config(format!(
                "map loads must satisfy 0 <= min < ideal < max, got {} / {} / {}",
                self.map.min_load, self.map.ideal_load, self.map.max_load
            )));
        }
        if !(0.0 < self.heap.shrink_threshold && self.heap.shrink_threshold < self.heap.grow_threshold)
            || self.heap.grow_threshold > 1.0
        {
            return Err(TweetdexError::Config(format!(
                "heap thresholds must satisfy 0 < shrink < grow <= 1, got {} / {}",
                self.heap.shrink_threshold, self.heap.grow_threshold
            )));
        }
        if self.tokenizer.sigils.is_empty() {
            return Err(TweetdexError::Config(
                "tokenizer.sigils must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
