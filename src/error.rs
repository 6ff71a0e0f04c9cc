//! Error types for cache configuration
//!
//! The cache engine itself is infallible; only loading configuration can fail.

use thiserror::Error;

// == Config Error Enum ==
/// Errors raised while loading a [`CacheConfig`](crate::config::CacheConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    /// An environment variable held a value that could not be parsed
    #[error("Invalid value for {var}: {value:?}")]
    InvalidValue { var: &'static str, value: String },

    /// A JSON configuration document was malformed
    #[error("Invalid configuration document: {0}")]
    Parse(#[from] serde_json::Error),
}

// == Result Type Alias ==
/// Convenience Result type for configuration loading.
pub type Result<T> = std::result::Result<T, ConfigError>;
