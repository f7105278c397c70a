//! Bounded rolling history of node snapshots
//!
//! The buffer trusts insertion order; it never re-sorts by timestamp.

use crate::models::MetricSnapshot;
use std::collections::VecDeque;

/// Maximum number of snapshots retained per predictor.
pub const HISTORY_CAPACITY: usize = 100;

/// Ring of the most recent snapshots, oldest first.
#[derive(Debug)]
pub struct History {
    samples: VecDeque<MetricSnapshot>,
    capacity: usize,
}

impl History {
    pub fn new() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    /// Append a snapshot, discarding the oldest entry at capacity.
    pub fn push(&mut self, snapshot: MetricSnapshot) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(snapshot);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// All retained snapshots, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &MetricSnapshot> {
        self.samples.iter()
    }

    /// The last up-to-`window` snapshots, oldest first, without copying.
    pub fn recent(&self, window: usize) -> impl Iterator<Item = &MetricSnapshot> {
        let skip = self.samples.len().saturating_sub(window);
        self.samples.iter().skip(skip)
    }

    /// Most recently appended snapshot.
    pub fn latest(&self) -> Option<&MetricSnapshot> {
        self.samples.back()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}
