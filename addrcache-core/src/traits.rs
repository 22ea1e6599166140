//! Common traits for addrcache.
//!
//! These traits define the interfaces that different implementations can satisfy,
//! enabling modularity and testing.

use std::fmt::Debug;
use std::hash::Hash;
use std::time::Duration;

use crate::error::Result;

// ═══════════════════════════════════════════════════════════════════════════════
// ENTRY BOUND
// ═══════════════════════════════════════════════════════════════════════════════

/// Values that can be stored in an address cache.
///
/// Entries are compared by value. `IpAddr`, `SocketAddr` and `String` all qualify.
pub trait CacheEntry: Clone + Eq + Hash + Debug + Send + 'static {}

impl<T> CacheEntry for T where T: Clone + Eq + Hash + Debug + Send + 'static {}

// ═══════════════════════════════════════════════════════════════════════════════
// ADDRESS CACHE TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// A thread-safe, time-bounded cache of unique addresses.
///
/// Retrieval is last-in-first-out: `peek`, `pop` and `take` all return the
/// most recently offered live entry. Expired entries are removed by a
/// background evictor.
///
/// Mutating and blocking calls fail with `CacheError::Closed` once `close`
/// has run. Queries keep working and report the empty state.
pub trait AddressCache<A: CacheEntry>: Send + Sync {
    /// Adds `address`, or moves it to the most-recent position if present.
    ///
    /// Uses the configured default TTL, if any.
    fn offer(&self, address: A) -> Result<bool>;

    /// Adds `address` and (re)schedules its expiration at `now + ttl`.
    fn offer_with_ttl(&self, address: A, ttl: Duration) -> Result<bool>;

    /// Returns true if `address` is live in the cache.
    fn contains(&self, address: &A) -> bool;

    /// Removes `address`; returns whether it was present.
    fn remove(&self, address: &A) -> Result<bool>;

    /// Returns the most recently offered entry without removing it.
    fn peek(&self) -> Option<A>;

    /// Removes and returns the most recently offered entry.
    fn pop(&self) -> Result<Option<A>>;

    /// Removes and returns the most recently offered entry,
    /// blocking until one is available or the cache is closed.
    fn take(&self) -> Result<A>;

    /// Closes the cache, releasing blocked takers and stopping eviction.
    ///
    /// Calling it more than once has no further effect.
    fn close(&self);

    /// Returns the number of live entries.
    fn len(&self) -> usize;

    /// Returns true if there are no live entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
