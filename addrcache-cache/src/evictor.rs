//! Background eviction thread.
//!
//! The evictor sleeps on the cache's `tick` condition variable under the
//! cache mutex, so `close` both stops it and wakes it in one step.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, info};

use addrcache_core::config::CacheConfig;
use addrcache_core::error::{CacheError, Result};
use addrcache_core::traits::CacheEntry;

use crate::cache::Shared;

/// Starts the evictor for `shared` on a named thread.
pub(crate) fn spawn<A: CacheEntry>(
    shared: Arc<Shared<A>>,
    config: &CacheConfig,
) -> Result<JoinHandle<()>> {
    let interval = config.eviction_interval();
    thread::Builder::new()
        .name(config.thread_name.clone())
        .spawn(move || run(&shared, interval))
        .map_err(CacheError::EvictorSpawn)
}

/// Runs eviction passes at a fixed rate until the cache closes.
fn run<A: CacheEntry>(shared: &Shared<A>, interval: Duration) {
    debug!(?interval, "Evictor started");

    let mut next_run = Instant::now().checked_add(interval);
    let mut state = shared.state.lock();

    while !state.is_closed() {
        let Some(due) = next_run else {
            // Interval beyond the clock's range: only close can wake us.
            shared.tick.wait(&mut state);
            continue;
        };

        let now = Instant::now();
        if now < due {
            shared.tick.wait_until(&mut state, due);
            continue;
        }

        let evicted = state.evict_expired(now);
        for address in &evicted {
            debug!(?address, "Evicted expired address");
        }
        if !evicted.is_empty() {
            info!(count = evicted.len(), remaining = state.len(), "Eviction pass complete");
        }

        // Fixed rate; skip missed ticks instead of bursting.
        next_run = due.checked_add(interval).and_then(|next| {
            if next <= now {
                now.checked_add(interval)
            } else {
                Some(next)
            }
        });
    }

    debug!("Evictor stopped");
}
