//! Cache Module
//!
//! Provides the in-memory LRU engine with lazy TTL expiration and eviction
//! callbacks.

mod entry;
mod lru;
mod options;
mod store;


// Re-export public types
pub(crate) use entry::Entry;
pub use entry::Expiry;
pub(crate) use lru::{RecencyList, SlotId};
pub use options::{
    with_clock, with_eviction_callback, with_expiry, with_reentrant_eviction_callback,
    CacheOption, EvictionCallback, ReentrantEvictionCallback,
};
pub use store::LruCache;
