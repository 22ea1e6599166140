//! Concurrent, time-bounded LIFO address cache.
//!
//! Entries are unique addresses retrieved most-recent first. A background
//! thread evicts entries whose TTL has passed, and `take` blocks until an
//! entry arrives or the cache is closed.
//!
//! ```rust
//! use std::net::{IpAddr, Ipv4Addr};
//! use std::time::Duration;
//! use addrcache_cache::LifoAddressCache;
//!
//! let cache: LifoAddressCache<IpAddr> = LifoAddressCache::new().unwrap();
//! cache.offer(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1))).unwrap();
//! cache.offer_with_ttl(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2)), Duration::from_secs(30)).unwrap();
//!
//! assert_eq!(cache.take().unwrap(), IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2)));
//! cache.close();
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

mod cache;
mod evictor;
mod state;

pub use cache::{LifoAddressCache, TakeInterrupt};

pub use addrcache_core::{AddressCache, CacheConfig, CacheEntry, CacheError, CacheStats, Result};
