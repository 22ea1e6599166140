//! Shared data types.

use serde::{Deserialize, Serialize};

/// Point-in-time cache statistics.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Entries currently live
    pub live_entries: usize,
    /// Live entries that carry an expiration deadline
    pub scheduled_expirations: usize,
    /// Successful offers since creation (re-offers included)
    pub offered_total: u64,
    /// Entries removed by the evictor since creation
    pub evicted_total: u64,
    /// Whether the cache has been closed
    pub closed: bool,
}

impl CacheStats {
    /// Live entries that will never expire.
    pub fn unbounded_entries(&self) -> usize {
        self.live_entries.saturating_sub(self.scheduled_expirations)
    }
}
