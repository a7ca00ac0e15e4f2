//! Cluster Cache - per-process LRU caching with cross-process invalidation
//!
//! Each worker process constructs a [`NamedCache`] per logical cache name.
//! Reads and writes stay local; destructive operations (delete, reset) are
//! additionally broadcast over a pub/sub bus so sibling instances in other
//! processes converge. The protocol is best-effort: no shared store, no
//! ordering across publishers, eventual consistency only.

pub mod bus;
pub mod cache;
pub mod config;
pub mod error;
pub mod tasks;

pub use bus::{BroadcastBus, LocalBus, MessageBus};
pub use cache::{CacheInfo, CacheStats, DumpEntry, Keys, NamedCache};
pub use config::CacheOptions;
pub use error::{CacheError, Result};
pub use tasks::spawn_sweep_task;
