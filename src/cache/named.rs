//! Named Cache Module
//!
//! The cache facade each worker process constructs per logical cache name.
//!
//! A `NamedCache` owns a local bounded store and keeps siblings (instances
//! with the same name in other processes) eventually consistent through two
//! broadcast topics derived from the name: `<name>:lruCache:del` carrying a
//! JSON array of keys, and `<name>:lruCache:reset` carrying no payload.
//! Writes are local-only; only destructive operations broadcast. Inbound
//! broadcasts are applied to the local store directly and never re-published,
//! which is what keeps the protocol loop-free.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use serde::Serialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::bus::{MessageBus, Payload};
use crate::cache::{CacheStats, CacheStore, DumpEntry};
use crate::config::CacheOptions;
use crate::error::Result;

// == Keys ==
/// Normalized delete argument: a single key or a list of keys.
pub struct Keys(Vec<String>);

impl From<&str> for Keys {
    fn from(key: &str) -> Self {
        Keys(vec![key.to_string()])
    }
}

impl From<String> for Keys {
    fn from(key: String) -> Self {
        Keys(vec![key])
    }
}

impl From<Vec<String>> for Keys {
    fn from(keys: Vec<String>) -> Self {
        Keys(keys)
    }
}

impl From<Vec<&str>> for Keys {
    fn from(keys: Vec<&str>) -> Self {
        Keys(keys.into_iter().map(str::to_string).collect())
    }
}

impl From<&[String]> for Keys {
    fn from(keys: &[String]) -> Self {
        Keys(keys.to_vec())
    }
}

// == Cache Info ==
/// On-demand introspection snapshot mirroring the underlying store under
/// both current and legacy field names.
#[derive(Debug, Clone, Serialize)]
pub struct CacheInfo {
    /// Legacy alias of `calculated_size`
    pub length: u64,
    /// Sum of entry weights
    pub calculated_size: u64,
    /// Entry-count capacity bound
    pub max: Option<usize>,
    /// Weighted capacity bound
    pub max_size: Option<u64>,
    /// Legacy alias of `size`
    pub item_count: usize,
    /// Current number of entries
    pub size: usize,
    /// Default TTL in milliseconds
    pub ttl: Option<u64>,
}

/// Process-local mutable state behind the facade's lock.
struct CacheInner<V> {
    store: CacheStore<V>,
    stats: CacheStats,
    enabled: bool,
}

// == Named Cache ==
/// Per-process cache facade with cross-process invalidation.
///
/// Cloning yields another handle to the same instance, suitable for handing
/// to background tasks.
pub struct NamedCache<V> {
    /// Cache name; immutable, namespaces the broadcast topics
    name: String,
    /// Topic carrying delete-keys broadcasts
    del_topic: String,
    /// Topic carrying reset broadcasts
    reset_topic: String,
    /// The signaling channel shared with sibling instances
    bus: Arc<dyn MessageBus>,
    /// Local store, counters, and the enabled flag
    inner: Arc<Mutex<CacheInner<V>>>,
}

impl<V> Clone for NamedCache<V> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            del_topic: self.del_topic.clone(),
            reset_topic: self.reset_topic.clone(),
            bus: self.bus.clone(),
            inner: self.inner.clone(),
        }
    }
}

impl<V: Clone + Send + 'static> NamedCache<V> {
    // == Constructor ==
    /// Builds a cache from raw options and registers its two invalidation
    /// subscriptions on the bus.
    ///
    /// Options are normalized first (deprecated field names are mapped with
    /// a warning); structural misconfiguration fails here, never at first
    /// use.
    pub fn new(options: CacheOptions<V>, bus: Arc<dyn MessageBus>) -> Result<Self> {
        let config = options.normalize()?;
        let name = config.name.clone();
        let del_topic = format!("{name}:lruCache:del");
        let reset_topic = format!("{name}:lruCache:reset");

        let inner = Arc::new(Mutex::new(CacheInner {
            store: CacheStore::new(&config),
            stats: CacheStats::new(),
            enabled: config.enabled,
        }));

        // Handlers hold a Weak reference: the bus may outlive any one cache,
        // and a dropped cache must not be kept alive by its subscriptions.
        Self::subscribe_del(&*bus, &del_topic, Arc::downgrade(&inner));
        Self::subscribe_reset(&*bus, &reset_topic, Arc::downgrade(&inner));

        Ok(Self {
            name,
            del_topic,
            reset_topic,
            bus,
            inner,
        })
    }

    /// Registers the delete-keys handler: apply locally, never re-publish.
    /// Inbound deletes leave the hit/miss counters alone.
    fn subscribe_del(bus: &dyn MessageBus, topic: &str, weak: Weak<Mutex<CacheInner<V>>>) {
        let log_topic = topic.to_string();
        bus.subscribe(
            topic,
            Box::new(move |payload: Payload| {
                let Some(inner) = weak.upgrade() else { return };
                let keys: Vec<String> = match serde_json::from_value(payload) {
                    Ok(keys) => keys,
                    Err(err) => {
                        warn!(topic = %log_topic, %err, "ignoring malformed delete broadcast");
                        return;
                    }
                };

                let mut inner = inner.lock().unwrap();
                for key in &keys {
                    inner.store.delete(key);
                }
                debug!(topic = %log_topic, count = keys.len(), "applied delete broadcast");
            }),
        );
    }

    /// Registers the reset handler: empty the store and zero the counters
    /// locally, never re-publish.
    fn subscribe_reset(bus: &dyn MessageBus, topic: &str, weak: Weak<Mutex<CacheInner<V>>>) {
        let log_topic = topic.to_string();
        bus.subscribe(
            topic,
            Box::new(move |_payload: Payload| {
                let Some(inner) = weak.upgrade() else { return };
                let mut inner = inner.lock().unwrap();
                inner.store.clear();
                inner.stats.reset();
                debug!(topic = %log_topic, "applied reset broadcast");
            }),
        );
    }

    // == Set ==
    /// Stores a key-value pair locally. Dropped silently while disabled.
    ///
    /// A per-call TTL overrides the configured default for this entry only.
    /// Writes are never broadcast: siblings perform their own writes or are
    /// reached through invalidation.
    pub fn set(&self, key: impl Into<String>, value: V, ttl_ms: Option<u64>) {
        let mut inner = self.inner.lock().unwrap();
        if !inner.enabled {
            return;
        }
        let evicted = inner.store.set(key.into(), value, ttl_ms);
        inner.stats.evictions += evicted as u64;
    }

    // == Get ==
    /// Looks a key up locally, counting a hit or a miss.
    ///
    /// While disabled, always returns `None` without touching the counters.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.enabled {
            return None;
        }
        let value = inner.store.get(key);
        match value {
            Some(_) => inner.stats.record_hit(),
            None => inner.stats.record_miss(),
        }
        value
    }

    // == Del ==
    /// Deletes one key or a list of keys, here and in every sibling.
    ///
    /// The key list is broadcast first, then removed from the local store.
    /// Deleting an absent key is a silent no-op on every instance.
    pub fn del(&self, keys: impl Into<Keys>) {
        let Keys(keys) = keys.into();

        self.bus.publish(&self.del_topic, json!(keys));

        let mut inner = self.inner.lock().unwrap();
        for key in &keys {
            inner.store.delete(key);
        }
    }

    // == Reset ==
    /// Empties the cache and zeroes the counters, here and in every
    /// sibling.
    pub fn reset(&self) {
        self.bus.publish(&self.reset_topic, Payload::Null);

        let mut inner = self.inner.lock().unwrap();
        inner.store.clear();
        inner.stats.reset();
    }

    /// Alias for [`NamedCache::reset`].
    pub fn clear(&self) {
        self.reset();
    }

    // == Get Uncached Keys ==
    /// Batch lookup splitting `keys` into cached and uncached halves.
    ///
    /// Hits are written into `cached_data`; the returned list holds exactly
    /// the missed keys, in input order, ready to be fetched from the backing
    /// source. Each key counts toward hits/misses exactly as a direct `get`
    /// would. While disabled, returns `keys` unchanged and leaves
    /// `cached_data` untouched.
    pub fn get_uncached_keys(
        &self,
        keys: &[String],
        cached_data: &mut HashMap<String, V>,
    ) -> Vec<String> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.enabled {
            return keys.to_vec();
        }

        let mut uncached = Vec::new();
        for key in keys {
            match inner.store.get(key) {
                Some(value) => {
                    inner.stats.record_hit();
                    cached_data.insert(key.clone(), value);
                }
                None => {
                    inner.stats.record_miss();
                    uncached.push(key.clone());
                }
            }
        }
        uncached
    }

    // == Peek ==
    /// Looks a key up without updating recency or the hit/miss counters.
    pub fn peek(&self, key: &str) -> Option<V> {
        let inner = self.inner.lock().unwrap();
        inner.store.peek(key).cloned()
    }

    // == Purge Expired ==
    /// Removes expired entries from the local store, returning the count.
    /// Driven periodically by the sweep task.
    pub fn purge_expired(&self) -> usize {
        let mut inner = self.inner.lock().unwrap();
        inner.store.purge_expired()
    }

    // == Introspection ==
    /// Returns the cache name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns whether the cache is currently enabled.
    pub fn enabled(&self) -> bool {
        self.inner.lock().unwrap().enabled
    }

    /// Enables or disables the cache. Process-local; never synchronized
    /// across siblings.
    pub fn set_enabled(&self, enabled: bool) {
        self.inner.lock().unwrap().enabled = enabled;
    }

    /// Returns the cumulative hit count since the last reset.
    pub fn hits(&self) -> u64 {
        self.inner.lock().unwrap().stats.hits
    }

    /// Returns the cumulative miss count since the last reset.
    pub fn misses(&self) -> u64 {
        self.inner.lock().unwrap().stats.misses
    }

    /// Returns a snapshot of all counters.
    pub fn stats(&self) -> CacheStats {
        self.inner.lock().unwrap().stats.clone()
    }

    /// Returns the current number of entries.
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().store.len()
    }

    /// Returns true if the local store is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().unwrap().store.is_empty()
    }

    /// Returns the size/capacity/ttl projection, including legacy aliases,
    /// computed on demand from the store.
    pub fn info(&self) -> CacheInfo {
        let inner = self.inner.lock().unwrap();
        CacheInfo {
            length: inner.store.current_weight(),
            calculated_size: inner.store.current_weight(),
            max: inner.store.max_entries(),
            max_size: inner.store.max_weighted_size(),
            item_count: inner.store.len(),
            size: inner.store.len(),
            ttl: inner.store.ttl_ms(),
        }
    }
}

impl<V: Clone + Send + Serialize + 'static> NamedCache<V> {
    // == Dump ==
    /// Returns a serializable snapshot of all live local entries. No
    /// broadcast, no counter effect.
    pub fn dump(&self) -> Vec<DumpEntry<V>> {
        self.inner.lock().unwrap().store.dump()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::LocalBus;

    fn test_cache(name: &str, bus: &Arc<LocalBus>) -> NamedCache<String> {
        let bus: Arc<dyn MessageBus> = bus.clone();
        NamedCache::new(CacheOptions::new(name, 100), bus).unwrap()
    }

    fn new_cache(name: &str) -> NamedCache<String> {
        test_cache(name, &Arc::new(LocalBus::new()))
    }

    #[test]
    fn test_set_get_round_trip() {
        let cache = new_cache("users");

        cache.set("k", "v".to_string(), None);

        assert_eq!(cache.get("k"), Some("v".to_string()));
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.misses(), 0);
    }

    #[test]
    fn test_get_miss_counts() {
        let cache = new_cache("users");

        assert_eq!(cache.get("absent"), None);
        assert_eq!(cache.hits(), 0);
        assert_eq!(cache.misses(), 1);
    }

    #[test]
    fn test_peek_does_not_count() {
        let cache = new_cache("users");
        cache.set("k", "v".to_string(), None);

        assert_eq!(cache.peek("k"), Some("v".to_string()));
        assert_eq!(cache.peek("absent"), None);
        assert_eq!(cache.hits(), 0);
        assert_eq!(cache.misses(), 0);
    }

    #[test]
    fn test_del_accepts_single_key_and_lists() {
        let cache = new_cache("users");
        cache.set("a", "1".to_string(), None);
        cache.set("b", "2".to_string(), None);
        cache.set("c", "3".to_string(), None);

        cache.del("a");
        cache.del(vec!["b", "c"]);
        cache.del("never-existed"); // silent no-op

        assert!(cache.is_empty());
    }

    #[test]
    fn test_del_does_not_touch_counters() {
        let cache = new_cache("users");
        cache.set("a", "1".to_string(), None);
        cache.get("a");

        cache.del("a");

        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.misses(), 0);
    }

    #[test]
    fn test_reset_empties_and_zeroes() {
        let cache = new_cache("users");
        cache.set("a", "1".to_string(), None);
        cache.get("a");
        cache.get("absent");

        cache.reset();

        assert!(cache.is_empty());
        assert_eq!(cache.hits(), 0);
        assert_eq!(cache.misses(), 0);
        assert_eq!(cache.get("a"), None);
    }

    #[test]
    fn test_clear_is_reset_alias() {
        let cache = new_cache("users");
        cache.set("a", "1".to_string(), None);

        cache.clear();

        assert!(cache.is_empty());
        assert_eq!(cache.stats().hits, 0);
    }

    #[test]
    fn test_get_uncached_keys_partition_and_order() {
        let cache = new_cache("users");
        cache.set("k1", "v1".to_string(), None);

        let keys: Vec<String> = ["k1", "k2", "k3"].iter().map(|k| k.to_string()).collect();
        let mut cached = HashMap::new();

        let uncached = cache.get_uncached_keys(&keys, &mut cached);

        assert_eq!(uncached, vec!["k2".to_string(), "k3".to_string()]);
        assert_eq!(cached.get("k1"), Some(&"v1".to_string()));
        assert_eq!(cached.len(), 1);
        // one evaluation per key, counted once each
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.misses(), 2);
    }

    #[test]
    fn test_disabled_get_returns_none_without_counting() {
        let cache = new_cache("users");
        cache.set("k", "v".to_string(), None);
        cache.set_enabled(false);

        assert_eq!(cache.get("k"), None);
        assert_eq!(cache.hits(), 0);
        assert_eq!(cache.misses(), 0);
    }

    #[test]
    fn test_disabled_set_is_dropped() {
        let cache = new_cache("users");
        cache.set_enabled(false);

        cache.set("k", "v".to_string(), None);
        cache.set_enabled(true);

        assert_eq!(cache.get("k"), None, "write while disabled never landed");
        assert_eq!(cache.misses(), 1);
    }

    #[test]
    fn test_disabled_uncached_keys_pass_through() {
        let cache = new_cache("users");
        cache.set("k1", "v1".to_string(), None);
        cache.set_enabled(false);

        let keys: Vec<String> = ["k1", "k2"].iter().map(|k| k.to_string()).collect();
        let mut cached = HashMap::new();

        let uncached = cache.get_uncached_keys(&keys, &mut cached);

        assert_eq!(uncached, keys);
        assert!(cached.is_empty());
        assert_eq!(cache.hits(), 0);
        assert_eq!(cache.misses(), 0);
    }

    #[test]
    fn test_per_call_ttl_overrides_default() {
        let bus: Arc<dyn MessageBus> = Arc::new(LocalBus::new());
        let cache: NamedCache<String> = NamedCache::new(
            CacheOptions {
                name: "users".to_string(),
                max_entries: Some(100),
                ttl_ms: Some(60_000),
                ..Default::default()
            },
            bus,
        )
        .unwrap();

        cache.set("short", "v".to_string(), Some(30));
        cache.set("long", "v".to_string(), None);

        std::thread::sleep(std::time::Duration::from_millis(60));

        assert_eq!(cache.get("short"), None);
        assert_eq!(cache.get("long"), Some("v".to_string()));
    }

    #[test]
    fn test_evictions_reach_stats() {
        let bus: Arc<dyn MessageBus> = Arc::new(LocalBus::new());
        let cache: NamedCache<String> =
            NamedCache::new(CacheOptions::new("users", 2), bus).unwrap();

        cache.set("a", "1".to_string(), None);
        cache.set("b", "2".to_string(), None);
        cache.set("c", "3".to_string(), None);

        assert_eq!(cache.stats().evictions, 1);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_info_projection() {
        let cache = new_cache("users");
        cache.set("a", "1".to_string(), None);
        cache.set("b", "2".to_string(), None);

        let info = cache.info();
        assert_eq!(info.size, 2);
        assert_eq!(info.item_count, info.size);
        assert_eq!(info.length, info.calculated_size);
        assert_eq!(info.max, Some(100));
        assert!(serde_json::to_string(&info).is_ok());
    }

    #[test]
    fn test_dump_has_no_counter_effect() {
        let cache = new_cache("users");
        cache.set("a", "1".to_string(), None);

        let dump = cache.dump();

        assert_eq!(dump.len(), 1);
        assert_eq!(cache.hits(), 0);
        assert_eq!(cache.misses(), 0);
    }

    #[test]
    fn test_sibling_receives_delete_broadcast() {
        let bus = Arc::new(LocalBus::new());
        let a = test_cache("users", &bus);
        let b = test_cache("users", &bus);

        a.set("x", "1".to_string(), None);
        b.set("x", "1".to_string(), None);

        a.del("x");

        // LocalBus delivers synchronously; the broadcast already landed
        assert_eq!(b.peek("x"), None);
    }

    #[test]
    fn test_malformed_delete_broadcast_is_ignored() {
        let bus = Arc::new(LocalBus::new());
        let cache = test_cache("users", &bus);
        cache.set("x", "1".to_string(), None);

        bus.publish("users:lruCache:del", json!({"not": "a list"}));

        assert_eq!(cache.peek("x"), Some("1".to_string()));
    }

    #[test]
    fn test_differently_named_caches_do_not_interfere() {
        let bus = Arc::new(LocalBus::new());
        let users = test_cache("users", &bus);
        let sessions = test_cache("sessions", &bus);

        users.set("x", "1".to_string(), None);
        sessions.set("x", "1".to_string(), None);

        users.del("x");

        assert_eq!(sessions.peek("x"), Some("1".to_string()));
    }

    #[test]
    fn test_construction_rejects_bad_config() {
        let bus: Arc<dyn MessageBus> = Arc::new(LocalBus::new());
        let result: Result<NamedCache<String>> =
            NamedCache::new(CacheOptions::default(), bus);
        assert!(result.is_err());
    }
}
