//! Configuration Module
//!
//! Cache options with legacy field normalization and validation.
//!
//! Option structs accept deprecated field names from older deployments
//! (`stale`, `max_age`) so existing configuration files keep loading; the
//! deprecated spellings are mapped onto their replacements at construction
//! time with a logged warning.

use serde::Deserialize;
use tracing::warn;

use crate::error::{CacheError, Result};

/// Weight function mapping a value to its size contribution.
///
/// Required when a weighted capacity (`max_weighted_size`) is configured.
pub type Weigher<V> = fn(&V) -> u64;

// == Cache Options ==
/// Raw, as-supplied cache options. Normalized into [`CacheConfig`] once at
/// construction via [`CacheOptions::normalize`].
#[derive(Deserialize)]
#[serde(default, bound(deserialize = ""))]
pub struct CacheOptions<V> {
    /// Cache name; namespace for the invalidation broadcast topics
    pub name: String,
    /// Maximum number of entries
    pub max_entries: Option<usize>,
    /// Maximum total weighted size (requires `size_calculation`)
    pub max_weighted_size: Option<u64>,
    /// Weight function for values; only meaningful with `max_weighted_size`
    #[serde(skip)]
    pub size_calculation: Option<Weigher<V>>,
    /// Default TTL in milliseconds for entries without an explicit TTL
    pub ttl_ms: Option<u64>,
    /// Whether an expired entry may be returned once before removal
    pub allow_stale: Option<bool>,
    /// Whether the cache starts enabled (default: true)
    pub enabled: Option<bool>,

    /// Deprecated spelling of `ttl_ms`
    pub max_age: Option<u64>,
    /// Deprecated spelling of `allow_stale`
    pub stale: Option<bool>,
}

impl<V> Default for CacheOptions<V> {
    fn default() -> Self {
        Self {
            name: String::new(),
            max_entries: None,
            max_weighted_size: None,
            size_calculation: None,
            ttl_ms: None,
            allow_stale: None,
            enabled: None,
            max_age: None,
            stale: None,
        }
    }
}

impl<V> Clone for CacheOptions<V> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            size_calculation: self.size_calculation,
            ..*self
        }
    }
}

impl<V> CacheOptions<V> {
    /// Creates options with a name and an entry-count capacity, the common
    /// case.
    pub fn new(name: impl Into<String>, max_entries: usize) -> Self {
        Self {
            name: name.into(),
            max_entries: Some(max_entries),
            ..Self::default()
        }
    }

    // == Normalize ==
    /// Maps deprecated field names onto current ones and validates the
    /// result.
    ///
    /// Deprecated usage is non-fatal: each mapped field logs a warning and
    /// the replacement is synthesized from the old value. Structural
    /// misconfiguration (missing name, missing capacity, weighted capacity
    /// without a weigher) is fatal.
    pub fn normalize(mut self) -> Result<CacheConfig<V>> {
        // A weigher with no weighted capacity to apply it to is superfluous;
        // enforced as of lru-cache@7.
        if self.size_calculation.is_some() && self.max_weighted_size.is_none() {
            warn!(
                cache = %self.name,
                "DEPRECATION: size_calculation was passed without a corresponding \
                 max_weighted_size; dropping it. Both are required together."
            );
            self.size_calculation = None;
        }

        if self.max_age.is_some() && self.ttl_ms.is_none() {
            warn!(
                cache = %self.name,
                "DEPRECATION: the option max_age has been deprecated. \
                 Please change this to ttl_ms instead."
            );
            self.ttl_ms = self.max_age;
        }

        if self.stale.is_some() && self.allow_stale.is_none() {
            warn!(
                cache = %self.name,
                "DEPRECATION: the option stale has been deprecated. \
                 Please change this to allow_stale instead."
            );
            self.allow_stale = self.stale;
        }

        if self.name.is_empty() {
            return Err(CacheError::Config("name is required".to_string()));
        }

        if self.max_entries.is_none() && self.max_weighted_size.is_none() {
            return Err(CacheError::Config(
                "at least one of max_entries or max_weighted_size is required".to_string(),
            ));
        }

        if self.max_weighted_size.is_some() && self.size_calculation.is_none() {
            return Err(CacheError::Config(
                "max_weighted_size requires a size_calculation function".to_string(),
            ));
        }

        Ok(CacheConfig {
            name: self.name,
            max_entries: self.max_entries,
            max_weighted_size: self.max_weighted_size,
            size_calculation: self.size_calculation,
            ttl_ms: self.ttl_ms,
            allow_stale: self.allow_stale.unwrap_or(false),
            enabled: self.enabled.unwrap_or(true),
        })
    }
}

// == Cache Config ==
/// Validated effective configuration produced by
/// [`CacheOptions::normalize`]. No deprecated fields survive normalization.
pub struct CacheConfig<V> {
    /// Cache name
    pub name: String,
    /// Entry-count capacity bound, if configured
    pub max_entries: Option<usize>,
    /// Weighted capacity bound, if configured
    pub max_weighted_size: Option<u64>,
    /// Weight function; present whenever `max_weighted_size` is
    pub size_calculation: Option<Weigher<V>>,
    /// Default TTL in milliseconds
    pub ttl_ms: Option<u64>,
    /// Serve an expired entry once before discarding it
    pub allow_stale: bool,
    /// Initial enabled state
    pub enabled: bool,
}
