//! String-keyed hash map with separate chaining.
//!
//! Each slot of the table holds an optional bucket [`List`]; a bucket exists
//! only while at least one entry hashes to it. The table is resized after
//! inserts whose resulting load factor leaves the `(min_load, max_load)`
//! band, targeting `ideal_load`. A resize allocates every new bucket before
//! moving any entry, so a failed resize leaves the map untouched at its
//! previous size.

use std::fmt;

use tracing::{trace, warn};

use super::list::List;
use crate::config::MapConfig;
use crate::error::Result;

/// Strategy invoked on every value the map discards: overwritten values,
/// values left at `clear`, and values still stored when the map is dropped.
pub type ValueDestructor<V> = Box<dyn FnMut(V)>;

struct Entry<V> {
    key: String,
    value: V,
}

type Bucket<V> = Option<List<Entry<V>>>;

/// Rotate-xor hash over the key bytes, seeded with the key length
pub fn dek_hash(key: &[u8]) -> u64 {
    key.iter()
        .fold(key.len() as u64, |h, &byte| ((h << 5) ^ (h >> 27)) ^ u64::from(byte))
}

fn bucket_index(key: &str, table_size: usize) -> usize {
    (dek_hash(key.as_bytes()) % table_size as u64) as usize
}

pub struct HashMap<V> {
    buckets: Vec<Bucket<V>>,
    count: usize,
    config: MapConfig,
    destructor: Option<ValueDestructor<V>>,
}

impl<V> HashMap<V> {
    /// Create an empty map with the default table policy
    pub fn new() -> Result<Self> {
        Self::with_config(&MapConfig::default())
    }

    pub fn with_config(config: &MapConfig) -> Result<Self> {
        let mut buckets = Vec::new();
        buckets.try_reserve_exact(config.initial_buckets)?;
        buckets.resize_with(config.initial_buckets, || None);
        Ok(Self {
            buckets,
            count: 0,
            config: config.clone(),
            destructor: None,
        })
    }

    /// Install the destructor applied to discarded values
    pub fn with_destructor(mut self, destructor: impl FnMut(V) + 'static) -> Self {
        self.destructor = Some(Box::new(destructor));
        self
    }

    /// Store `value` under `key`.
    ///
    /// An existing value for the key is handed to the destructor (or
    /// dropped) and replaced. On error nothing is stored and the map keeps
    /// its previous contents.
    pub fn put(&mut self, key: &str, value: V) -> Result<()> {
        let idx = bucket_index(key, self.buckets.len());
        if let Some(entry) = self.buckets[idx]
            .as_mut()
            .and_then(|list| list.find_mut(|e| e.key == key))
        {
            let old = std::mem::replace(&mut entry.value, value);
            self.dispose(old);
            return Ok(());
        }

        let mut owned = String::new();
        owned.try_reserve_exact(key.len())?;
        owned.push_str(key);

        let bucket = self.buckets[idx].get_or_insert_with(List::new);
        if let Err(err) = bucket.insert_last(Entry { key: owned, value }) {
            if bucket.is_empty() {
                self.buckets[idx] = None;
            }
            return Err(err);
        }
        self.count += 1;
        self.maybe_resize();
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        let idx = bucket_index(key, self.buckets.len());
        self.buckets[idx]
            .as_ref()?
            .iter()
            .find(|e| e.key == key)
            .map(|e| &e.value)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        let idx = bucket_index(key, self.buckets.len());
        self.buckets[idx]
            .as_mut()?
            .find_mut(|e| e.key == key)
            .map(|e| &mut e.value)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Remove `key` and return its value without invoking the destructor.
    /// A bucket left empty is released.
    pub fn remove(&mut self, key: &str) -> Option<V> {
        let idx = bucket_index(key, self.buckets.len());
        let bucket = self.buckets[idx].as_mut()?;

        let mut cursor = bucket.cursor_mut();
        while let Some(entry) = cursor.current() {
            if entry.key == key {
                break;
            }
            cursor.advance();
        }
        let entry = cursor.remove_current()?;

        if bucket.is_empty() {
            self.buckets[idx] = None;
        }
        self.count -= 1;
        Some(entry.value)
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Current number of table slots
    pub fn table_size(&self) -> usize {
        self.buckets.len()
    }

    /// Entries in bucket order, then chain order within each bucket.
    ///
    /// The order is stable for a given map state and changes on resize.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> + '_ {
        self.buckets
            .iter()
            .flatten()
            .flat_map(|bucket| bucket.iter())
            .map(|e| (e.key.as_str(), &e.value))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.iter().map(|(key, _)| key)
    }

    /// Remove every entry, passing each value to the destructor.
    /// The table keeps its current size.
    pub fn clear(&mut self) {
        for slot in self.buckets.iter_mut() {
            if let Some(bucket) = slot.take() {
                for entry in bucket {
                    if let Some(destructor) = self.destructor.as_mut() {
                        destructor(entry.value);
                    }
                }
            }
        }
        self.count = 0;
    }

    fn dispose(&mut self, value: V) {
        if let Some(destructor) = self.destructor.as_mut() {
            destructor(value);
        }
    }

    fn maybe_resize(&mut self) {
        let load = self.count as f64 / self.buckets.len() as f64;
        if self.config.min_load < load && load < self.config.max_load {
            return;
        }

        let target = (self.count as f64 / self.config.ideal_load) as usize;
        if target < self.config.initial_buckets {
            return;
        }

        let previous = self.buckets.len();
        match self.rehash(target) {
            Ok(()) => trace!(previous, target, count = self.count, "resized token map"),
            Err(err) => warn!(previous, target, error = %err, "token map resize failed, keeping current table"),
        }
    }

    fn rehash(&mut self, table_size: usize) -> Result<()> {
        let mut sizes: Vec<usize> = Vec::new();
        sizes.try_reserve_exact(table_size)?;
        sizes.resize(table_size, 0);
        for (key, _) in self.iter() {
            sizes[bucket_index(key, table_size)] += 1;
        }

        let mut buckets: Vec<Bucket<V>> = Vec::new();
        buckets.try_reserve_exact(table_size)?;
        for &size in &sizes {
            buckets.push(match size {
                0 => None,
                n => Some(List::try_with_capacity(n)?),
            });
        }

        // Every bucket has room for its entries, so relinking cannot fail.
        let old = std::mem::replace(&mut self.buckets, buckets);
        for entry in old.into_iter().flatten().flatten() {
            let idx = bucket_index(&entry.key, table_size);
            if let Some(bucket) = self.buckets[idx].as_mut() {
                bucket.insert_last(entry)?;
            }
        }
        Ok(())
    }
}

impl<V> Drop for HashMap<V> {
    fn drop(&mut self) {
        if self.destructor.is_some() {
            self.clear();
        }
    }
}

impl<V: fmt::Debug> fmt::Debug for HashMap<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
