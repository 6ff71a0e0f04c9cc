//! Expiring LRU - A fixed-capacity in-memory cache
//!
//! Provides O(1) least-recently-used eviction with lazy TTL expiration and
//! eviction callbacks.
//!
//! ```
//! use std::time::Duration;
//! use expiring_lru::{with_expiry, LruCache};
//!
//! let mut cache = LruCache::new(2, [with_expiry(Duration::from_secs(60))]);
//! cache.add("a", 1);
//! cache.add("b", 2);
//! cache.get("a");
//! cache.add("c", 3);
//!
//! assert_eq!(cache.get("b"), None);
//! assert_eq!(cache.len(), 2);
//! ```

pub mod cache;
pub mod clock;
pub mod config;
pub mod error;

pub use cache::{
    with_clock, with_eviction_callback, with_expiry, with_reentrant_eviction_callback,
    CacheOption, Expiry, LruCache,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::CacheConfig;
pub use error::ConfigError;
