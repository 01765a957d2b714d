//! Insertion Order Module
//!
//! Tracks key insertion order for FIFO eviction.

use std::collections::VecDeque;

use crate::cache::RequestKey;

// == Insertion Order ==
/// Tracks the order in which keys first entered a tier.
///
/// Keys are stored in a VecDeque where:
/// - Front = Oldest insert
/// - Back = Newest insert
///
/// Re-inserting a tracked key does not move it.
#[derive(Debug, Default, Clone)]
pub struct InsertionOrder {
    order: VecDeque<RequestKey>,
}

impl InsertionOrder {
    // == Constructor ==
    pub fn new() -> Self {
        Self {
            order: VecDeque::new(),
        }
    }

    // == Record ==
    /// Appends a key unless it is already tracked.
    ///
    /// Returns true if the key was new.
    pub fn record(&mut self, key: &RequestKey) -> bool {
        if self.contains(key) {
            return false;
        }
        self.order.push_back(key.clone());
        true
    }

    // == Remove ==
    /// Removes a key from the tracker.
    pub fn remove(&mut self, key: &RequestKey) {
        self.order.retain(|k| k != key);
    }

    // == Evict Oldest ==
    /// Returns and removes the oldest key, None if empty.
    pub fn evict_oldest(&mut self) -> Option<RequestKey> {
        self.order.pop_front()
    }

    /// Keys from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &RequestKey> {
        self.order.iter()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, key: &RequestKey) -> bool {
        self.order.iter().any(|k| k == key)
    }
}
