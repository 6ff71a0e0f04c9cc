//! Cache Options Module
//!
//! Functional options applied to an [`LruCache`] while it is being built.

use std::fmt;
use std::time::Duration;

use crate::cache::{Expiry, LruCache};
use crate::clock::Clock;

// == Eviction Callback ==
/// Callback invoked with the key and value of every entry leaving the cache.
pub type EvictionCallback<K, V> = Box<dyn FnMut(K, V) + Send>;

/// Callback that also receives the cache, so it can re-enter it.
pub type ReentrantEvictionCallback<K, V> = Box<dyn FnMut(&mut LruCache<K, V>, K, V) + Send>;

pub(crate) enum OnEvicted<K, V> {
    Plain(EvictionCallback<K, V>),
    Reentrant(ReentrantEvictionCallback<K, V>),
}

impl<K, V> OnEvicted<K, V> {
    pub(crate) fn call(&mut self, cache: &mut LruCache<K, V>, key: K, value: V) {
        match self {
            OnEvicted::Plain(callback) => callback(key, value),
            OnEvicted::Reentrant(callback) => callback(cache, key, value),
        }
    }
}

// == Cache Option ==
/// A configuration mutator applied, in order, to the cache under construction.
pub struct CacheOption<K, V>(Setting<K, V>);

enum Setting<K, V> {
    Expiry(Expiry),
    OnEvicted(OnEvicted<K, V>),
    Clock(Box<dyn Clock>),
}

impl<K, V> CacheOption<K, V> {
    pub(crate) fn apply(self, cache: &mut LruCache<K, V>) {
        match self.0 {
            Setting::Expiry(expiry) => cache.set_expiry(expiry),
            Setting::OnEvicted(on_evicted) => cache.set_on_evicted(on_evicted),
            Setting::Clock(clock) => cache.set_clock(clock),
        }
    }
}

impl<K, V> fmt::Debug for CacheOption<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Setting::Expiry(expiry) => f.debug_tuple("Expiry").field(expiry).finish(),
            Setting::OnEvicted(_) => f.write_str("OnEvicted(..)"),
            Setting::Clock(_) => f.write_str("Clock(..)"),
        }
    }
}

// == Option Constructors ==
/// Sets the time-to-live of entries. A zero duration disables expiry.
pub fn with_expiry<K, V>(ttl: Duration) -> CacheOption<K, V> {
    CacheOption(Setting::Expiry(Expiry::from_duration(ttl)))
}

/// Registers a callback for every eviction path.
pub fn with_eviction_callback<K, V, F>(on_evicted: F) -> CacheOption<K, V>
where
    F: FnMut(K, V) + Send + 'static,
{
    CacheOption(Setting::OnEvicted(OnEvicted::Plain(Box::new(on_evicted))))
}

/// Registers a callback that may call back into the cache.
///
/// The callback sees the cache after the evicted entry has been fully
/// removed. Evictions it causes are reported once it returns.
pub fn with_reentrant_eviction_callback<K, V, F>(on_evicted: F) -> CacheOption<K, V>
where
    F: FnMut(&mut LruCache<K, V>, K, V) + Send + 'static,
{
    CacheOption(Setting::OnEvicted(OnEvicted::Reentrant(Box::new(on_evicted))))
}

/// Replaces the wall clock, typically with a [`ManualClock`](crate::clock::ManualClock).
pub fn with_clock<K, V, C>(clock: C) -> CacheOption<K, V>
where
    C: Clock + 'static,
{
    CacheOption(Setting::Clock(Box::new(clock)))
}
