//! Cache Store Module
//!
//! Main cache engine combining a key index with an arena-backed recency list,
//! capacity-driven LRU eviction, and lazy TTL expiry.

use std::borrow::Borrow;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::hash::Hash;
use std::panic::{self, AssertUnwindSafe};

use chrono::{DateTime, Utc};
use tracing::{debug, trace, warn};

use crate::cache::options::OnEvicted;
use crate::cache::{CacheOption, Entry, Expiry, RecencyList, SlotId};
use crate::clock::{Clock, SystemClock};
use crate::config::CacheConfig;

// == Eviction Reason ==
#[derive(Debug, Clone, Copy)]
enum EvictionReason {
    Capacity,
    Removed,
    Expired,
    Cleared,
}

impl EvictionReason {
    fn as_str(self) -> &'static str {
        match self {
            EvictionReason::Capacity => "capacity",
            EvictionReason::Removed => "removed",
            EvictionReason::Expired => "expired",
            EvictionReason::Cleared => "cleared",
        }
    }
}

// == LRU Cache ==
/// Fixed-capacity cache with LRU eviction and optional TTL.
///
/// The key index and the recency list are updated together by every
/// mutation. Entries that exceed the TTL are discovered and evicted when
/// they are read; nothing sweeps them in the background.
///
/// The cache performs no locking. Wrap it in a `Mutex` for shared use.
pub struct LruCache<K, V> {
    /// Key to recency-list handle
    index: HashMap<K, SlotId>,
    /// Entries ordered from most to least recently used
    list: RecencyList<Entry<K, V>>,
    /// Maximum number of entries, 0 = unbounded
    capacity: usize,
    expiry: Expiry,
    clock: Box<dyn Clock>,
    on_evicted: Option<OnEvicted<K, V>>,
    /// Evictions raised while a callback is running
    pending: VecDeque<(K, V)>,
    dispatching: bool,
}

impl<K, V> LruCache<K, V> {
    // == Option Setters ==
    pub(crate) fn set_expiry(&mut self, expiry: Expiry) {
        self.expiry = expiry;
    }

    pub(crate) fn set_on_evicted(&mut self, on_evicted: OnEvicted<K, V>) {
        self.on_evicted = Some(on_evicted);
    }

    pub(crate) fn set_clock(&mut self, clock: Box<dyn Clock>) {
        self.clock = clock;
    }

    // == Accessors ==
    /// Returns the current number of entries in the cache.
    pub fn len(&self) -> usize {
        self.list.len()
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Returns the configured capacity, 0 meaning unbounded.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the configured TTL policy.
    pub fn ttl(&self) -> Expiry {
        self.expiry
    }

    /// Iterates keys from most to least recently used, including entries
    /// that are stale but have not been read since.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.list.iter().map(|entry| &entry.key)
    }

    // Only calls the clock when expiry is enabled.
    fn stamp(&self) -> Option<DateTime<Utc>> {
        self.expiry.is_enabled().then(|| self.clock.now())
    }

    fn is_stale(&self, entry: &Entry<K, V>) -> bool {
        self.expiry.is_enabled() && self.expiry.is_expired(entry.inserted_at, self.clock.now())
    }

    // == Eviction Dispatch ==
    /// Hands a departed entry to the callback.
    ///
    /// Must only be called once the entry is gone from both the index and
    /// the list. Evictions raised from inside a running callback are queued
    /// and delivered in order by the outermost dispatch.
    ///
    /// A panicking callback propagates to the caller. The callback is
    /// reinstalled first and any still-queued departures are dropped, so the
    /// cache keeps reporting evictions afterwards.
    fn notify(&mut self, key: K, value: V) {
        if self.dispatching {
            self.pending.push_back((key, value));
            return;
        }
        let Some(mut on_evicted) = self.on_evicted.take() else {
            return;
        };

        self.dispatching = true;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            on_evicted.call(self, key, value);
            while let Some((key, value)) = self.pending.pop_front() {
                on_evicted.call(self, key, value);
            }
        }));
        self.dispatching = false;
        self.on_evicted = Some(on_evicted);

        if let Err(payload) = outcome {
            warn!(
                dropped = self.pending.len(),
                "eviction callback panicked, dropping queued evictions"
            );
            self.pending.clear();
            panic::resume_unwind(payload);
        }
    }
}

impl<K, V> LruCache<K, V>
where
    K: Hash + Eq + Clone,
{
    // == Constructor ==
    /// Creates an empty cache and applies `options` in order.
    ///
    /// # Arguments
    /// * `capacity` - Maximum number of entries, 0 disables count-based eviction
    /// * `options` - Mutators such as [`with_expiry`](crate::cache::with_expiry)
    pub fn new<I>(capacity: usize, options: I) -> Self
    where
        I: IntoIterator<Item = CacheOption<K, V>>,
    {
        let mut cache = Self {
            index: HashMap::new(),
            list: RecencyList::new(),
            capacity,
            expiry: Expiry::Disabled,
            clock: Box::new(SystemClock),
            on_evicted: None,
            pending: VecDeque::new(),
            dispatching: false,
        };
        for option in options {
            option.apply(&mut cache);
        }
        cache
    }

    /// Creates a cache from loaded configuration, then applies `options`.
    ///
    /// Options run after the configured TTL, so an explicit `with_expiry`
    /// overrides the config.
    pub fn from_config<I>(config: &CacheConfig, options: I) -> Self
    where
        I: IntoIterator<Item = CacheOption<K, V>>,
    {
        Self::new(config.capacity, config.options().into_iter().chain(options))
    }

    // == Add ==
    /// Inserts or replaces a value and marks it most recently used.
    ///
    /// Replacing an existing key restamps it and never fires the eviction
    /// callback. Inserting a new key past capacity evicts the least recently
    /// used entry, which is never the key just inserted.
    pub fn add(&mut self, key: K, value: V) {
        let inserted_at = self.stamp();

        if let Some(&id) = self.index.get(&key) {
            if let Some(entry) = self.list.get_mut(id) {
                entry.replace(value, inserted_at);
            }
            self.list.move_to_front(id);
            trace!(len = self.list.len(), "replaced cache entry");
            return;
        }

        let id = self.list.push_front(Entry::new(key.clone(), value, inserted_at));
        self.index.insert(key, id);
        trace!(len = self.list.len(), "inserted cache entry");

        if self.capacity != 0 && self.list.len() > self.capacity {
            self.evict_oldest(EvictionReason::Capacity);
        }
    }

    // == Get ==
    /// Retrieves a value and marks it most recently used.
    ///
    /// An entry older than the TTL is evicted here and reported as absent.
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let id = *self.index.get(key)?;

        if self.list.get(id).is_some_and(|entry| self.is_stale(entry)) {
            self.evict(id, EvictionReason::Expired);
            return None;
        }

        self.list.move_to_front(id);
        self.list.get(id).map(|entry| &entry.value)
    }

    // == Peek ==
    /// Reads a value without touching recency order or evicting it.
    ///
    /// A stale entry reads as absent but stays in the cache.
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let entry = self.list.get(*self.index.get(key)?)?;
        if self.is_stale(entry) {
            return None;
        }
        Some(&entry.value)
    }

    /// Checks for a live entry without touching recency order.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.peek(key).is_some()
    }

    // == Update Element ==
    /// Overwrites the value of an existing key without changing its recency
    /// or its insertion time. Absent keys are ignored.
    pub fn update_element<Q>(&mut self, key: &Q, value: V)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        if let Some(&id) = self.index.get(key) {
            if let Some(entry) = self.list.get_mut(id) {
                entry.value = value;
            }
        }
    }

    // == Remove ==
    /// Evicts an entry by key. Absent keys are ignored.
    pub fn remove<Q>(&mut self, key: &Q)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        if let Some(&id) = self.index.get(key) {
            self.evict(id, EvictionReason::Removed);
        }
    }

    // == Remove Oldest ==
    /// Evicts the least recently used entry. Does nothing on an empty cache.
    pub fn remove_oldest(&mut self) {
        self.evict_oldest(EvictionReason::Removed);
    }

    // == Clear ==
    /// Evicts every entry, firing the callback once per entry.
    pub fn clear(&mut self) {
        self.index.clear();
        let entries = self.list.drain();
        if !entries.is_empty() {
            debug!(
                count = entries.len(),
                reason = EvictionReason::Cleared.as_str(),
                "cleared cache"
            );
        }

        for entry in entries {
            let (key, value) = entry.into_pair();
            self.notify(key, value);
        }
    }

    // == Purge Expired ==
    /// Evicts every entry older than the TTL without reordering the rest.
    ///
    /// Expiry is otherwise only checked on read; this gives callers an
    /// explicit sweep. Returns the number of entries removed.
    pub fn purge_expired(&mut self) -> usize {
        if !self.expiry.is_enabled() {
            return 0;
        }

        let now = self.clock.now();
        let expiry = self.expiry;
        let stale = self
            .list
            .find_all(|entry| expiry.is_expired(entry.inserted_at, now));

        // Detach everything first so callbacks cannot invalidate the handles
        let removed: Vec<_> = stale.into_iter().filter_map(|id| self.detach(id)).collect();
        let count = removed.len();
        if count > 0 {
            debug!(count, reason = EvictionReason::Expired.as_str(), "purged expired entries");
        }

        for entry in removed {
            let (key, value) = entry.into_pair();
            self.notify(key, value);
        }
        count
    }

    // == Internal Eviction ==
    fn evict_oldest(&mut self, reason: EvictionReason) {
        if let Some(id) = self.list.back() {
            self.evict(id, reason);
        }
    }

    fn evict(&mut self, id: SlotId, reason: EvictionReason) {
        if let Some(entry) = self.detach(id) {
            debug!(reason = reason.as_str(), len = self.list.len(), "evicted cache entry");
            let (key, value) = entry.into_pair();
            self.notify(key, value);
        }
    }

    /// Removes an entry from both the list and the index.
    fn detach(&mut self, id: SlotId) -> Option<Entry<K, V>> {
        let entry = self.list.remove(id)?;
        self.index.remove(&entry.key);
        Some(entry)
    }
}

impl<K, V> fmt::Debug for LruCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruCache")
            .field("len", &self.list.len())
            .field("capacity", &self.capacity)
            .field("expiry", &self.expiry)
            .field("has_callback", &self.on_evicted.is_some())
            .finish()
    }
}
