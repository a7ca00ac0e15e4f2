//! Cache Module
//!
//! In-memory caching with TTL expiration, LRU eviction, and the
//! broadcast-invalidated [`NamedCache`] facade.

mod entry;
mod named;
mod recency;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use named::{CacheInfo, Keys, NamedCache};
pub use recency::RecencyTracker;
pub use stats::CacheStats;
pub use store::{CacheStore, DumpEntry};
