//! Cache configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_EVICTION_INTERVAL_MS, DEFAULT_EVICTOR_THREAD_NAME, DEFAULT_INITIAL_CAPACITY,
    ENV_DEFAULT_TTL_MS, ENV_EVICTION_INTERVAL_MS,
};
use crate::error::{CacheError, Result};

/// Cache configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Period of the background evictor in milliseconds
    pub eviction_interval_ms: u64,
    /// TTL applied by a plain `offer`, in milliseconds.
    /// `None` means entries offered without a TTL never expire.
    pub default_ttl_ms: Option<u64>,
    /// Preallocation hint for the internal structures
    pub initial_capacity: usize,
    /// Name of the evictor thread
    pub thread_name: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            eviction_interval_ms: DEFAULT_EVICTION_INTERVAL_MS,
            default_ttl_ms: None,
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            thread_name: DEFAULT_EVICTOR_THREAD_NAME.into(),
        }
    }
}

impl CacheConfig {
    /// Builds a config from `ADDRCACHE_*` environment variables.
    ///
    /// Missing or unparsable values fall back to the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let parse_ms = |key: &str| lookup(key).and_then(|v| v.trim().parse::<u64>().ok());

        let defaults = Self::default();
        Self {
            eviction_interval_ms: parse_ms(ENV_EVICTION_INTERVAL_MS)
                .unwrap_or(defaults.eviction_interval_ms),
            default_ttl_ms: parse_ms(ENV_DEFAULT_TTL_MS).or(defaults.default_ttl_ms),
            ..defaults
        }
    }

    /// Sets the evictor period.
    pub fn with_eviction_interval(mut self, interval: Duration) -> Self {
        self.eviction_interval_ms = duration_to_ms(interval);
        self
    }

    /// Sets the TTL applied by a plain `offer`.
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl_ms = Some(duration_to_ms(ttl));
        self
    }

    /// Sets the preallocation hint.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    /// Evictor period.
    pub fn eviction_interval(&self) -> Duration {
        Duration::from_millis(self.eviction_interval_ms)
    }

    /// TTL applied by a plain `offer`, if any.
    pub fn default_ttl(&self) -> Option<Duration> {
        self.default_ttl_ms.map(Duration::from_millis)
    }

    /// Checks that the configuration can drive a cache.
    pub fn validate(&self) -> Result<()> {
        if self.eviction_interval_ms == 0 {
            return Err(CacheError::ConfigError(
                "eviction interval must be non-zero".into(),
            ));
        }
        if self.default_ttl_ms == Some(0) {
            return Err(CacheError::ConfigError(
                "default TTL must be non-zero when set".into(),
            ));
        }
        Ok(())
    }
}

fn duration_to_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use test_case::test_case;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = CacheConfig::default();
        assert_eq!(config.eviction_interval(), Duration::from_secs(5));
        assert_eq!(config.default_ttl(), None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = CacheConfig::default()
            .with_eviction_interval(Duration::from_millis(20))
            .with_default_ttl(Duration::from_secs(2))
            .with_capacity(8);

        assert_eq!(config.eviction_interval_ms, 20);
        assert_eq!(config.default_ttl_ms, Some(2000));
        assert_eq!(config.initial_capacity, 8);
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = CacheConfig::from_lookup(lookup_from(&[
            (ENV_EVICTION_INTERVAL_MS, "250"),
            (ENV_DEFAULT_TTL_MS, " 1000 "),
        ]));

        assert_eq!(config.eviction_interval_ms, 250);
        assert_eq!(config.default_ttl(), Some(Duration::from_secs(1)));
    }

    #[test]
    fn test_from_lookup_ignores_garbage() {
        let config = CacheConfig::from_lookup(lookup_from(&[
            (ENV_EVICTION_INTERVAL_MS, "soon"),
            (ENV_DEFAULT_TTL_MS, "-5"),
        ]));

        assert_eq!(config, CacheConfig::default());
    }

    #[test_case(0, None ; "zero interval")]
    #[test_case(100, Some(0) ; "zero default ttl")]
    fn test_validate_rejects(interval_ms: u64, ttl_ms: Option<u64>) {
        let config = CacheConfig {
            eviction_interval_ms: interval_ms,
            default_ttl_ms: ttl_ms,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(CacheError::ConfigError(_))));
    }

    #[test]
    fn test_deserialize_partial() {
        let config: CacheConfig =
            serde_json::from_str(r#"{ "default_ttl_ms": 1500 }"#).unwrap();

        assert_eq!(config.default_ttl_ms, Some(1500));
        assert_eq!(config.eviction_interval_ms, DEFAULT_EVICTION_INTERVAL_MS);
        assert_eq!(config.thread_name, DEFAULT_EVICTOR_THREAD_NAME);
    }
}
