//! Error types for addrcache.
//!
//! An empty cache is not an error: `peek`/`pop` report it as `None`.

use thiserror::Error;

/// Result type alias using `CacheError`.
pub type Result<T> = std::result::Result<T, CacheError>;

/// Main error type for all cache operations.
#[derive(Debug, Error)]
pub enum CacheError {
    // ═══════════════════════════════════════════════════════════════════════════
    // LIFECYCLE ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// The cache has been closed; no further mutation or blocking is possible.
    #[error("Address cache is closed")]
    Closed,

    /// A blocked take was asked to abandon its wait.
    #[error("Take was interrupted while waiting for an address")]
    Interrupted,

    // ═══════════════════════════════════════════════════════════════════════════
    // SETUP ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The background evictor thread could not be started.
    #[error("Failed to start evictor thread: {0}")]
    EvictorSpawn(#[source] std::io::Error),
}

impl CacheError {
    /// Returns true if this error reports a closed cache.
    pub fn is_closed(&self) -> bool {
        matches!(self, CacheError::Closed)
    }

    /// Returns true if this error reports an interrupted wait.
    pub fn is_interrupted(&self) -> bool {
        matches!(self, CacheError::Interrupted)
    }
}
