//! Cache Store Module
//!
//! Bounded eviction store: HashMap storage plus recency tracking, TTL
//! expiry, and either entry-count or weighted capacity enforcement.
//!
//! The store is a purely local collaborator. It knows nothing about
//! broadcast invalidation or hit/miss accounting; those live in the
//! [`NamedCache`](crate::cache::NamedCache) facade wrapping it.

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use crate::cache::{CacheEntry, RecencyTracker};
use crate::config::{CacheConfig, Weigher};

// == Dump Entry ==
/// One entry in a serializable store snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct DumpEntry<V> {
    /// The entry's key
    pub key: String,
    /// The stored value
    pub value: V,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Expiration timestamp (Unix milliseconds), if any
    pub expires_at: Option<u64>,
}

// == Cache Store ==
/// Bounded key-value store with LRU eviction and TTL support.
#[derive(Debug)]
pub struct CacheStore<V> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<V>>,
    /// Access-order tracker for eviction
    recency: RecencyTracker,
    /// Entry-count capacity bound, if configured
    max_entries: Option<usize>,
    /// Weighted capacity bound, if configured
    max_weighted_size: Option<u64>,
    /// Weight function; present whenever `max_weighted_size` is
    size_calculation: Option<Weigher<V>>,
    /// Sum of weights of all current entries
    current_weight: u64,
    /// Default TTL in milliseconds for entries without an explicit TTL
    ttl_ms: Option<u64>,
    /// Serve an expired entry once before discarding it
    allow_stale: bool,
}

impl<V: Clone> CacheStore<V> {
    // == Constructor ==
    /// Creates a store from a validated configuration.
    pub fn new(config: &CacheConfig<V>) -> Self {
        Self {
            entries: HashMap::new(),
            recency: RecencyTracker::new(),
            max_entries: config.max_entries,
            max_weighted_size: config.max_weighted_size,
            size_calculation: config.size_calculation,
            current_weight: 0,
            ttl_ms: config.ttl_ms,
            allow_stale: config.allow_stale,
        }
    }

    // == Set ==
    /// Stores a key-value pair, overwriting any existing entry.
    ///
    /// A per-call TTL overrides the store default for this entry only.
    /// Inserts that push the store over capacity evict least recently used
    /// entries until the bound holds again; the number of evicted entries
    /// is returned. A single value heavier than the whole weighted capacity
    /// is not stored at all.
    pub fn set(&mut self, key: String, value: V, ttl_ms: Option<u64>) -> usize {
        let weight = self.size_calculation.map(|f| f(&value)).unwrap_or(1);

        if let Some(max_weight) = self.max_weighted_size {
            if weight > max_weight {
                debug!(key = %key, weight, max_weight, "value exceeds capacity; not stored");
                return 0;
            }
        }

        // Overwrite: retire the old entry's weight first
        if let Some(old) = self.entries.remove(&key) {
            self.current_weight -= old.weight;
        }

        let effective_ttl = ttl_ms.or(self.ttl_ms);
        self.entries
            .insert(key.clone(), CacheEntry::new(value, weight, effective_ttl));
        self.current_weight += weight;
        self.recency.touch(&key);

        self.evict_to_capacity()
    }

    /// Evicts least recently used entries until both capacity bounds hold.
    fn evict_to_capacity(&mut self) -> usize {
        let mut evicted = 0;
        while self.over_capacity() {
            match self.recency.pop_lru() {
                Some(victim) => {
                    if let Some(entry) = self.entries.remove(&victim) {
                        self.current_weight -= entry.weight;
                        evicted += 1;
                        debug!(key = %victim, "evicted least recently used entry");
                    }
                }
                None => break,
            }
        }
        evicted
    }

    fn over_capacity(&self) -> bool {
        if let Some(max) = self.max_entries {
            if self.entries.len() > max {
                return true;
            }
        }
        if let Some(max) = self.max_weighted_size {
            if self.current_weight > max {
                return true;
            }
        }
        false
    }

    // == Get ==
    /// Retrieves a value by key, updating its recency.
    ///
    /// Expired entries are removed on access. When `allow_stale` is set the
    /// expired value is still returned this one time; afterwards the key is
    /// absent either way.
    pub fn get(&mut self, key: &str) -> Option<V> {
        let expired = match self.entries.get(key) {
            Some(entry) => entry.is_expired(),
            None => return None,
        };

        if expired {
            self.recency.forget(key);
            let entry = self.entries.remove(key)?;
            self.current_weight -= entry.weight;
            if self.allow_stale {
                return Some(entry.value);
            }
            return None;
        }

        self.recency.touch(key);
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    // == Peek ==
    /// Looks up a value without updating recency. Expired entries report
    /// absent but are left in place for the sweep to collect.
    pub fn peek(&self, key: &str) -> Option<&V> {
        self.entries
            .get(key)
            .filter(|entry| !entry.is_expired())
            .map(|entry| &entry.value)
    }

    // == Delete ==
    /// Removes an entry by key. Deleting an absent key is a silent no-op;
    /// returns whether the key was present.
    pub fn delete(&mut self, key: &str) -> bool {
        match self.entries.remove(key) {
            Some(entry) => {
                self.current_weight -= entry.weight;
                self.recency.forget(key);
                true
            }
            None => false,
        }
    }

    // == Clear ==
    /// Removes every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.recency.clear();
        self.current_weight = 0;
    }

    // == Purge Expired ==
    /// Removes all expired entries, returning how many were removed.
    pub fn purge_expired(&mut self) -> usize {
        let expired_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired_keys {
            if let Some(entry) = self.entries.remove(key) {
                self.current_weight -= entry.weight;
            }
            self.recency.forget(key);
        }

        expired_keys.len()
    }

    // == Introspection ==
    /// Returns the current number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the sum of weights of all current entries.
    pub fn current_weight(&self) -> u64 {
        self.current_weight
    }

    /// Returns the entry-count capacity bound, if configured.
    pub fn max_entries(&self) -> Option<usize> {
        self.max_entries
    }

    /// Returns the weighted capacity bound, if configured.
    pub fn max_weighted_size(&self) -> Option<u64> {
        self.max_weighted_size
    }

    /// Returns the configured default TTL in milliseconds.
    pub fn ttl_ms(&self) -> Option<u64> {
        self.ttl_ms
    }
}

impl<V: Clone + Serialize> CacheStore<V> {
    // == Dump ==
    /// Returns a serializable snapshot of all live entries.
    pub fn dump(&self) -> Vec<DumpEntry<V>> {
        self.entries
            .iter()
            .filter(|(_, entry)| !entry.is_expired())
            .map(|(key, entry)| DumpEntry {
                key: key.clone(),
                value: entry.value.clone(),
                created_at: entry.created_at,
                expires_at: entry.expires_at,
            })
            .collect()
    }
}
