//! Recency Tracker Module
//!
//! Tracks key access order for least-recently-used eviction.

use std::collections::VecDeque;

// == Recency Tracker ==
/// Access-order tracker backing LRU eviction.
///
/// Keys live in a VecDeque: front = most recently used, back = least
/// recently used. O(n) on touch/forget, which is fine at the capacities
/// this cache is configured with.
#[derive(Debug, Default)]
pub struct RecencyTracker {
    /// Keys ordered by recency of access
    order: VecDeque<String>,
}

impl RecencyTracker {
    /// Creates a new empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    // == Touch ==
    /// Marks a key as most recently used, inserting it if new.
    pub fn touch(&mut self, key: &str) {
        self.forget(key);
        self.order.push_front(key.to_string());
    }

    // == Forget ==
    /// Drops a key from the tracker. Unknown keys are ignored.
    pub fn forget(&mut self, key: &str) {
        self.order.retain(|k| k != key);
    }

    // == Pop LRU ==
    /// Removes and returns the least recently used key, or None when empty.
    pub fn pop_lru(&mut self) -> Option<String> {
        self.order.pop_back()
    }

    // == Clear ==
    /// Drops all tracked keys.
    pub fn clear(&mut self) {
        self.order.clear();
    }

    /// Returns the number of tracked keys.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns true if no keys are tracked.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
