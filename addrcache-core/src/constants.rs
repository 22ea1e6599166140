//! Reference defaults for the address cache.

// ═══════════════════════════════════════════════════════════════════════════════
// EVICTION
// ═══════════════════════════════════════════════════════════════════════════════

/// Period of the background evictor in milliseconds (5 seconds).
pub const DEFAULT_EVICTION_INTERVAL_MS: u64 = 5_000;

/// Name given to the evictor thread.
pub const DEFAULT_EVICTOR_THREAD_NAME: &str = "addrcache-evictor";

// ═══════════════════════════════════════════════════════════════════════════════
// CAPACITY
// ═══════════════════════════════════════════════════════════════════════════════

/// Preallocation hint for the membership structure.
pub const DEFAULT_INITIAL_CAPACITY: usize = 64;

// ═══════════════════════════════════════════════════════════════════════════════
// ENVIRONMENT
// ═══════════════════════════════════════════════════════════════════════════════

/// Overrides `CacheConfig::eviction_interval_ms`.
pub const ENV_EVICTION_INTERVAL_MS: &str = "ADDRCACHE_EVICTION_INTERVAL_MS";

/// Overrides `CacheConfig::default_ttl_ms`.
pub const ENV_DEFAULT_TTL_MS: &str = "ADDRCACHE_DEFAULT_TTL_MS";
