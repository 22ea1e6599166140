//! # addrcache core
//!
//! Core errors, configuration, and traits for the addrcache address cache.
//!
//! This crate provides the foundational building blocks used by the cache implementation:
//!
//! - **Errors**: The closed-cache / interruption taxonomy
//! - **Config**: Eviction period and default TTL settings
//! - **Constants**: Reference defaults and environment variable names
//! - **Traits**: The `AddressCache` capability surface
//! - **Types**: Statistics snapshots
//!
//! ## Example
//!
//! ```rust
//! use std::time::Duration;
//! use addrcache_core::CacheConfig;
//!
//! let config = CacheConfig::default()
//!     .with_eviction_interval(Duration::from_millis(250))
//!     .with_default_ttl(Duration::from_secs(30));
//! assert!(config.validate().is_ok());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

pub mod config;
pub mod constants;
pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used items at crate root
pub use config::CacheConfig;
pub use constants::*;
pub use error::{CacheError, Result};
pub use traits::*;
pub use types::*;
