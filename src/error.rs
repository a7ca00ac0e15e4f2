//! Error types for the cache facade
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache facade.
///
/// Normal cache operations never fail: absent keys are reported as `None`,
/// never as errors. The only fatal path is construction-time misconfiguration.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Invalid or incomplete configuration, reported at construction time
    #[error("Invalid configuration: {0}")]
    Config(String),
}

// == Result Type Alias ==
/// Convenience Result type for the cache facade.
pub type Result<T> = std::result::Result<T, CacheError>;
