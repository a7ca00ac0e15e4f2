//! Cache Statistics Module
//!
//! Tracks hit/miss accounting and eviction counts for one cache instance.
//!
//! Counters are process-local and never synchronized across sibling
//! instances; an inbound reset broadcast zeroes them, an inbound delete
//! broadcast leaves them alone.

use serde::Serialize;

// == Cache Stats ==
/// Cache performance counters.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Successful lookups (direct gets and batch-lookup hits)
    pub hits: u64,
    /// Failed lookups (key absent or expired)
    pub misses: u64,
    /// Entries evicted by the capacity policy
    pub evictions: u64,
}

impl CacheStats {
    /// Creates stats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 before any lookup.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Increments the hit counter.
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    /// Increments the miss counter.
    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    /// Increments the eviction counter.
    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    // == Reset ==
    /// Zeroes all counters. Invoked by cache reset, whether initiated
    /// locally or by a reset broadcast from a sibling.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
