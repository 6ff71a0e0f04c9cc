//! Configuration Module
//!
//! Loads cache settings from environment variables or a JSON document.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::cache::{with_expiry, CacheOption, Expiry};
use crate::error::{ConfigError, Result};

/// Environment variable holding the maximum entry count.
pub const CAPACITY_VAR: &str = "LRU_CAPACITY";
/// Environment variable holding the TTL in milliseconds.
pub const TTL_MS_VAR: &str = "LRU_TTL_MS";

/// Cache configuration parameters.
///
/// Missing values fall back to the defaults: 1000 entries, no expiry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of entries, 0 = unbounded
    pub capacity: usize,
    /// Entry TTL in milliseconds; None or 0 disables expiry
    pub ttl_ms: Option<u64>,
}

impl CacheConfig {
    /// Loads a config from environment variables.
    ///
    /// # Environment Variables
    /// - `LRU_CAPACITY` - Maximum cache entries (default: 1000)
    /// - `LRU_TTL_MS` - Entry TTL in milliseconds (default: disabled)
    ///
    /// Unset variables use defaults; unparsable ones are an error.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let config = Self {
            capacity: read_var(CAPACITY_VAR)?.unwrap_or(defaults.capacity),
            ttl_ms: read_var(TTL_MS_VAR)?.or(defaults.ttl_ms),
        };
        debug!(
            capacity = config.capacity,
            ttl_ms = ?config.ttl_ms,
            "loaded cache config from env"
        );
        Ok(config)
    }

    /// Parses a config from JSON, e.g. `{"capacity": 64, "ttl_ms": 500}`.
    pub fn from_json(document: &str) -> Result<Self> {
        Ok(serde_json::from_str(document)?)
    }

    /// Returns the TTL policy described by `ttl_ms`.
    pub fn ttl(&self) -> Expiry {
        Expiry::from(self.ttl_ms.map(Duration::from_millis))
    }

    /// Converts the config into cache options. Capacity is passed separately.
    pub fn options<K, V>(&self) -> Vec<CacheOption<K, V>> {
        match self.ttl() {
            Expiry::After(ttl) => vec![with_expiry(ttl)],
            Expiry::Disabled => Vec::new(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 1000,
            ttl_ms: None,
        }
    }
}

fn read_var<T: FromStr>(var: &'static str) -> Result<Option<T>> {
    match env::var(var) {
        Ok(value) => match value.trim().parse() {
            Ok(parsed) => Ok(Some(parsed)),
            Err(_) => Err(ConfigError::InvalidValue { var, value }),
        },
        Err(_) => Ok(None),
    }
}
