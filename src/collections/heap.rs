//! Binary max-heap ordered by an injected comparator.
//!
//! The comparator decides priority: `Ordering::Greater` means the first
//! argument ranks above the second. A min-heap is a max-heap with the
//! comparator reversed. Ties have no defined order; equal elements come out
//! in whatever order their positions in the tree dictate.
//!
//! The heap keeps its own logical capacity with hysteresis: it grows by
//! `growth_factor` once occupancy passes `grow_threshold` and halves once
//! occupancy drops under `shrink_threshold`, never going below the
//! configured initial capacity.

use std::cmp::Ordering;
use std::fmt;

use tracing::trace;

use crate::config::HeapConfig;
use crate::error::Result;

pub struct Heap<T, C>
where
    C: Fn(&T, &T) -> Ordering,
{
    items: Vec<T>,
    capacity: usize,
    config: HeapConfig,
    cmp: C,
}

impl<T, C> Heap<T, C>
where
    C: Fn(&T, &T) -> Ordering,
{
    /// Create an empty heap with the default capacity policy
    pub fn new(cmp: C) -> Result<Self> {
        Self::with_config(&HeapConfig::default(), cmp)
    }

    pub fn with_config(config: &HeapConfig, cmp: C) -> Result<Self> {
        let mut items = Vec::new();
        items.try_reserve_exact(config.initial_capacity)?;
        Ok(Self {
            items,
            capacity: config.initial_capacity,
            config: config.clone(),
            cmp,
        })
    }

    /// Build a heap from unordered items in O(n)
    pub fn from_vec(config: &HeapConfig, mut items: Vec<T>, cmp: C) -> Result<Self> {
        heapify(&mut items, &cmp);
        let capacity = config.initial_capacity.max(items.len());
        if capacity > items.len() {
            items.try_reserve_exact(capacity - items.len())?;
        }
        Ok(Self {
            items,
            capacity,
            config: config.clone(),
            cmp,
        })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Logical capacity governed by the grow/shrink policy
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Insert `elem`. On allocation failure the heap is left unchanged.
    pub fn push(&mut self, elem: T) -> Result<()> {
        if self.items.len() as f64 > self.capacity as f64 * self.config.grow_threshold {
            self.resize(self.capacity * self.config.growth_factor)?;
        }
        self.items.try_reserve(1)?;
        self.items.push(elem);
        self.sift_up(self.items.len() - 1);
        Ok(())
    }

    /// Highest-priority element, `None` when empty
    pub fn peek_max(&self) -> Option<&T> {
        self.items.first()
    }

    /// Remove and return the highest-priority element
    pub fn pop_max(&mut self) -> Option<T> {
        if self.items.is_empty() {
            return None;
        }
        let max = self.items.swap_remove(0);
        sift_down(&mut self.items, 0, &self.cmp);

        let half = self.capacity / 2;
        if half >= self.config.initial_capacity
            && (self.items.len() as f64) < self.capacity as f64 * self.config.shrink_threshold
        {
            trace!(from = self.capacity, to = half, "shrinking heap");
            self.capacity = half;
            self.items.shrink_to(half);
        }
        Some(max)
    }

    /// Destroy the heap, handing every element to `destructor` in storage
    /// order (not priority order).
    pub fn drain_with(self, destructor: impl FnMut(T)) {
        self.items.into_iter().for_each(destructor);
    }

    fn resize(&mut self, capacity: usize) -> Result<()> {
        if capacity > self.items.capacity() {
            self.items.try_reserve_exact(capacity - self.items.len())?;
        }
        trace!(from = self.capacity, to = capacity, "growing heap");
        self.capacity = capacity;
        Ok(())
    }

    fn sift_up(&mut self, mut pos: usize) {
        while pos > 0 {
            let parent = (pos - 1) / 2;
            if (self.cmp)(&self.items[pos], &self.items[parent]) != Ordering::Greater {
                break;
            }
            self.items.swap(pos, parent);
            pos = parent;
        }
    }
}

impl<T: fmt::Debug, C> fmt::Debug for Heap<T, C>
where
    C: Fn(&T, &T) -> Ordering,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Heap")
            .field("items", &self.items)
            .field("capacity", &self.capacity)
            .finish()
    }
}

/// Restore the heap property below `start` within `items`.
///
/// The right child is chosen only when it strictly outranks the left one;
/// the walk stops as soon as the parent is not outranked by that child.
fn sift_down<T, C>(items: &mut [T], start: usize, cmp: &C)
where
    C: Fn(&T, &T) -> Ordering,
{
    let len = items.len();
    let mut parent = start;
    loop {
        let mut child = 2 * parent + 1;
        if child >= len {
            break;
        }
        if child + 1 < len && cmp(&items[child + 1], &items[child]) == Ordering::Greater {
            child += 1;
        }
        if cmp(&items[parent], &items[child]) != Ordering::Less {
            break;
        }
        items.swap(parent, child);
        parent = child;
    }
}

fn heapify<T, C>(items: &mut [T], cmp: &C)
where
    C: Fn(&T, &T) -> Ordering,
{
    if items.len() <= 1 {
        return;
    }
    for start in (0..=(items.len() - 2) / 2).rev() {
        sift_down(items, start, cmp);
    }
}

/// In-place heapsort without building a [`Heap`].
///
/// Leaves `items` ordered from lowest to highest priority; pass a reversed
/// comparator to get highest priority first.
pub fn heap_sort<T, C>(items: &mut [T], cmp: C)
where
    C: Fn(&T, &T) -> Ordering,
{
    heapify(items, &cmp);
    for end in (1..items.len()).rev() {
        items.swap(0, end);
        sift_down(&mut items[..end], 0, &cmp);
    }
}
