//! Cluster Cache demo
//!
//! Simulates a small cluster of worker processes sharing one broadcast bus:
//! every worker owns its own `NamedCache`, writes stay local, and delete /
//! reset operations fan out to the siblings.
//!
//! # Startup Sequence
//! 1. Initialize tracing subscriber for logging
//! 2. Load configuration from environment variables
//! 3. Construct one cache instance per simulated worker on a shared bus
//! 4. Start the background TTL sweep task
//! 5. Run the invalidation scenario and report per-worker stats

use std::env;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cluster_cache::{BroadcastBus, CacheOptions, MessageBus, NamedCache};

/// Demo configuration loaded from environment variables.
///
/// # Environment Variables
/// - `MAX_ENTRIES` - per-worker cache capacity (default: 1000)
/// - `DEFAULT_TTL_MS` - default entry TTL in milliseconds (default: 300000)
/// - `WORKERS` - number of simulated worker processes (default: 3)
/// - `SWEEP_INTERVAL` - TTL sweep frequency in seconds (default: 1)
#[derive(Debug, Clone)]
struct DemoConfig {
    max_entries: usize,
    default_ttl_ms: u64,
    workers: usize,
    sweep_interval: u64,
}

impl DemoConfig {
    fn from_env() -> Self {
        Self {
            max_entries: env::var("MAX_ENTRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1000),
            default_ttl_ms: env::var("DEFAULT_TTL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(300_000),
            workers: env::var("WORKERS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3),
            sweep_interval: env::var("SWEEP_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1),
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cluster_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting cluster cache demo");

    let config = DemoConfig::from_env();
    info!(
        "Configuration loaded: max_entries={}, default_ttl_ms={}, workers={}, sweep_interval={}s",
        config.max_entries, config.default_ttl_ms, config.workers, config.sweep_interval
    );

    let bus: Arc<dyn MessageBus> = Arc::new(BroadcastBus::new());

    let caches: Vec<NamedCache<String>> = (0..config.workers)
        .map(|_| {
            let options = CacheOptions {
                name: "users".to_string(),
                max_entries: Some(config.max_entries),
                ttl_ms: Some(config.default_ttl_ms),
                ..Default::default()
            };
            NamedCache::new(options, bus.clone()).expect("valid demo configuration")
        })
        .collect();
    info!("{} sibling cache instances initialized", caches.len());

    let sweep_handle = spawn_sweep(&caches[0], config.sweep_interval);

    // Every worker caches the same user record independently; writes are
    // local-only, so each instance fills its own store.
    for (id, cache) in caches.iter().enumerate() {
        cache.set("user:42", format!("record from worker {id}"), None);
    }

    // Worker 0 invalidates; the delete broadcast reaches every sibling.
    caches[0].del("user:42");
    tokio::time::sleep(Duration::from_millis(100)).await;

    for (id, cache) in caches.iter().enumerate() {
        let status = match cache.get("user:42") {
            Some(_) => "still cached",
            None => "invalidated",
        };
        info!(
            "worker {id}: user:42 {status} (hits={}, misses={}, entries={})",
            cache.hits(),
            cache.misses(),
            cache.len()
        );
    }

    // Worker 1 resets; every sibling ends up empty with zeroed counters.
    caches[1].reset();
    tokio::time::sleep(Duration::from_millis(100)).await;

    for (id, cache) in caches.iter().enumerate() {
        info!(
            "worker {id} after reset: entries={}, hits={}, misses={}",
            cache.len(),
            cache.hits(),
            cache.misses()
        );
    }

    sweep_handle.abort();
    info!("Demo complete");
}

fn spawn_sweep(cache: &NamedCache<String>, interval: u64) -> tokio::task::JoinHandle<()> {
    let handle = cluster_cache::spawn_sweep_task(cache.clone(), interval);
    info!("Background TTL sweep task started");
    handle
}
