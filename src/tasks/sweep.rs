//! TTL Sweep Task
//!
//! Background task that periodically removes expired cache entries.
//!
//! Expired entries are already dropped lazily on access; the sweep exists so
//! entries nobody reads again still get reclaimed.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::NamedCache;

/// Spawns a background task that periodically purges expired entries.
///
/// The task loops forever, sleeping for the configured interval between
/// sweeps. It takes its own handle to the cache (a cheap clone) and can be
/// aborted at shutdown via the returned JoinHandle.
pub fn spawn_sweep_task<V>(cache: NamedCache<V>, sweep_interval_secs: u64) -> JoinHandle<()>
where
    V: Clone + Send + 'static,
{
    let interval = Duration::from_secs(sweep_interval_secs);

    tokio::spawn(async move {
        info!(
            cache = cache.name(),
            interval_secs = sweep_interval_secs,
            "starting TTL sweep task"
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.purge_expired();
            if removed > 0 {
                info!(cache = cache.name(), removed, "TTL sweep removed expired entries");
            } else {
                debug!(cache = cache.name(), "TTL sweep found no expired entries");
            }
        }
    })
}
