//! Thread-safe LIFO address cache.

use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, info, instrument, warn};

use addrcache_core::config::CacheConfig;
use addrcache_core::error::{CacheError, Result};
use addrcache_core::traits::{AddressCache, CacheEntry};
use addrcache_core::types::CacheStats;

use crate::evictor;
use crate::state::CacheState;

/// State shared between cache handles, takers and the evictor thread.
pub(crate) struct Shared<A> {
    pub(crate) state: Mutex<CacheState<A>>,
    /// Signalled on every offer and on close.
    pub(crate) available: Condvar,
    /// Signalled on close so the evictor stops sleeping.
    pub(crate) tick: Condvar,
}

/// In-memory LIFO cache of unique addresses with TTL eviction.
///
/// # Retrieval
///
/// `peek`, `pop` and `take` return the most recently offered live entry.
/// Offering an entry that is already present moves it to the top.
///
/// # Expiration
///
/// Entries offered with a TTL are removed by a background thread that wakes
/// every `eviction_interval_ms`. Entries offered without one use the
/// configured default TTL, or never expire if none is set.
///
/// # Thread Safety
///
/// All operations lock one mutex covering the whole state, so every call
/// observes the membership set, order and expiration index in agreement.
/// `take` waits on a condition variable and does not hold the lock while
/// blocked.
///
/// # Complexity
///
/// | Operation            | Cost        |
/// |----------------------|-------------|
/// | `offer`              | O(log n)    |
/// | `contains`, `len`    | O(1)        |
/// | `remove(&a)`, `pop`  | O(log n)    |
/// | `peek`               | O(log n)    |
/// | eviction pass        | O(k log n) for k expired entries |
pub struct LifoAddressCache<A: CacheEntry = IpAddr> {
    shared: Arc<Shared<A>>,
    evictor: Mutex<Option<JoinHandle<()>>>,
    config: CacheConfig,
}

impl<A: CacheEntry> LifoAddressCache<A> {
    /// Creates a cache with the default configuration.
    pub fn new() -> Result<Self> {
        Self::with_config(CacheConfig::default())
    }

    /// Creates a cache with custom configuration and starts its evictor.
    pub fn with_config(config: CacheConfig) -> Result<Self> {
        config.validate()?;

        let shared = Arc::new(Shared {
            state: Mutex::new(CacheState::with_capacity(config.initial_capacity)),
            available: Condvar::new(),
            tick: Condvar::new(),
        });
        let handle = evictor::spawn(Arc::clone(&shared), &config)?;

        Ok(Self {
            shared,
            evictor: Mutex::new(Some(handle)),
            config,
        })
    }

    /// Returns the configuration this cache was built with.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Adds `address` using the default TTL, if one is configured.
    pub fn offer(&self, address: A) -> Result<bool> {
        self.insert(address, self.config.default_ttl())
    }

    /// Adds `address` and schedules it for eviction after `ttl`.
    pub fn offer_with_ttl(&self, address: A, ttl: Duration) -> Result<bool> {
        self.insert(address, Some(ttl))
    }

    fn insert(&self, address: A, ttl: Option<Duration>) -> Result<bool> {
        // A deadline past the clock's range is treated as never.
        let deadline = ttl.and_then(|ttl| Instant::now().checked_add(ttl));

        let mut state = self.shared.state.lock();
        let inserted = state.offer(address.clone(), deadline)?;
        self.shared.available.notify_all();
        drop(state);

        debug!(?address, inserted, ?ttl, "Offered address");
        Ok(true)
    }

    /// Returns true if `address` is live in the cache.
    pub fn contains(&self, address: &A) -> bool {
        self.shared.state.lock().contains(address)
    }

    /// Removes `address`; returns whether it was present.
    pub fn remove(&self, address: &A) -> Result<bool> {
        let removed = self.shared.state.lock().remove(address)?;
        if removed {
            debug!(?address, "Removed address");
        }
        Ok(removed)
    }

    /// Returns the most recently offered entry, or `None` if empty.
    pub fn peek(&self) -> Option<A> {
        self.shared.state.lock().peek()
    }

    /// Removes and returns the most recently offered entry, or `None` if empty.
    pub fn pop(&self) -> Result<Option<A>> {
        let popped = self.shared.state.lock().pop()?;
        if let Some(address) = &popped {
            debug!(?address, "Popped address");
        }
        Ok(popped)
    }

    /// Removes and returns the most recently offered entry, waiting until
    /// one is offered if the cache is empty.
    ///
    /// Fails with `CacheError::Closed` if the cache is or becomes closed.
    #[instrument(level = "trace", skip(self))]
    pub fn take(&self) -> Result<A> {
        let mut state = self.shared.state.lock();
        loop {
            if let Some(address) = state.pop()? {
                debug!(?address, "Took address");
                return Ok(address);
            }
            self.shared.available.wait(&mut state);
        }
    }

    /// Like [`take`](Self::take), but gives up after `timeout`.
    ///
    /// Returns `Ok(None)` if nothing was offered in time.
    #[instrument(level = "trace", skip(self))]
    pub fn take_timeout(&self, timeout: Duration) -> Result<Option<A>> {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            return self.take().map(Some);
        };

        let mut state = self.shared.state.lock();
        loop {
            if let Some(address) = state.pop()? {
                debug!(?address, "Took address");
                return Ok(Some(address));
            }
            if self.shared.available.wait_until(&mut state, deadline).timed_out() {
                return state.pop();
            }
        }
    }

    /// Like [`take`](Self::take), but abandons the wait with
    /// `CacheError::Interrupted` once `interrupt` fires.
    ///
    /// The cache itself is left untouched by an interruption.
    #[instrument(level = "trace", skip_all)]
    pub fn take_interruptible(&self, interrupt: &TakeInterrupt<A>) -> Result<A> {
        if !Arc::ptr_eq(&self.shared, &interrupt.shared) {
            return Err(CacheError::ConfigError(
                "interrupt handle belongs to a different cache".into(),
            ));
        }

        let mut state = self.shared.state.lock();
        loop {
            state.ensure_open()?;
            if interrupt.flag.swap(false, Ordering::SeqCst) {
                debug!("Take interrupted");
                return Err(CacheError::Interrupted);
            }
            if let Some(address) = state.pop()? {
                debug!(?address, "Took address");
                return Ok(address);
            }
            self.shared.available.wait(&mut state);
        }
    }

    /// Creates a handle that can interrupt `take_interruptible` calls on this cache.
    pub fn interrupt_handle(&self) -> TakeInterrupt<A> {
        TakeInterrupt {
            shared: Arc::clone(&self.shared),
            flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Closes the cache.
    ///
    /// Clears all entries, wakes every blocked taker and stops the evictor.
    /// Later calls are no-ops.
    pub fn close(&self) {
        let cleared = {
            let mut state = self.shared.state.lock();
            let Some(cleared) = state.close() else {
                return;
            };
            self.shared.available.notify_all();
            self.shared.tick.notify_all();
            cleared
        };
        info!(cleared, "Address cache closed");

        if let Some(handle) = self.evictor.lock().take() {
            if handle.join().is_err() {
                warn!("Evictor thread panicked before shutdown");
            }
        }
    }

    /// Returns true once `close` has run.
    pub fn is_closed(&self) -> bool {
        self.shared.state.lock().is_closed()
    }

    /// Returns the number of live entries.
    pub fn len(&self) -> usize {
        self.shared.state.lock().len()
    }

    /// Returns true if there are no live entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns live entries, most recent first.
    pub fn snapshot(&self) -> Vec<A> {
        self.shared.state.lock().snapshot()
    }

    /// Returns cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.shared.state.lock().stats()
    }
}

impl<A: CacheEntry> Drop for LifoAddressCache<A> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<A: CacheEntry> AddressCache<A> for LifoAddressCache<A> {
    fn offer(&self, address: A) -> Result<bool> {
        LifoAddressCache::offer(self, address)
    }

    fn offer_with_ttl(&self, address: A, ttl: Duration) -> Result<bool> {
        LifoAddressCache::offer_with_ttl(self, address, ttl)
    }

    fn contains(&self, address: &A) -> bool {
        LifoAddressCache::contains(self, address)
    }

    fn remove(&self, address: &A) -> Result<bool> {
        LifoAddressCache::remove(self, address)
    }

    fn peek(&self) -> Option<A> {
        LifoAddressCache::peek(self)
    }

    fn pop(&self) -> Result<Option<A>> {
        LifoAddressCache::pop(self)
    }

    fn take(&self) -> Result<A> {
        LifoAddressCache::take(self)
    }

    fn close(&self) {
        LifoAddressCache::close(self)
    }

    fn len(&self) -> usize {
        LifoAddressCache::len(self)
    }

    fn is_empty(&self) -> bool {
        LifoAddressCache::is_empty(self)
    }
}

/// Cooperative cancellation for a waiting [`LifoAddressCache::take_interruptible`].
///
/// An interrupt raised while nobody is waiting is delivered to the next
/// interruptible take that uses this handle.
#[derive(Clone)]
pub struct TakeInterrupt<A> {
    shared: Arc<Shared<A>>,
    flag: Arc<AtomicBool>,
}

impl<A> TakeInterrupt<A> {
    /// Asks the taker using this handle to stop waiting.
    pub fn interrupt(&self) {
        self.flag.store(true, Ordering::SeqCst);
        // Taking the lock orders the flag store against a taker about to wait.
        let _state = self.shared.state.lock();
        self.shared.available.notify_all();
    }

    /// Returns true if an interrupt is pending.
    pub fn is_pending(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
