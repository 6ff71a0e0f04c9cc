//! Cache Entry Module
//!
//! Defines the stored entry and the TTL policy that decides when it is stale.

use std::time::Duration;

use chrono::{DateTime, Utc};

// == Expiry ==
/// Time-to-live policy of a cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Expiry {
    /// Entries never go stale
    #[default]
    Disabled,
    /// Entries older than the given age are treated as absent
    After(Duration),
}

impl Expiry {
    // == Constructor ==
    /// Builds a policy from a duration. A zero duration disables expiry.
    pub fn from_duration(ttl: Duration) -> Self {
        if ttl.is_zero() {
            Expiry::Disabled
        } else {
            Expiry::After(ttl)
        }
    }

    /// Returns true when entries can expire.
    pub fn is_enabled(&self) -> bool {
        matches!(self, Expiry::After(_))
    }

    // == Is Expired ==
    /// Checks whether an entry stamped at `inserted_at` is stale at `now`.
    ///
    /// The boundary is exclusive: an entry whose age equals the TTL is still
    /// live. An entry without a timestamp, or one stamped in the future of a
    /// clock that went backwards, never counts as expired.
    pub fn is_expired(&self, inserted_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        let (Expiry::After(ttl), Some(inserted_at)) = (self, inserted_at) else {
            return false;
        };

        match now.signed_duration_since(inserted_at).to_std() {
            Ok(age) => age > *ttl,
            Err(_) => false,
        }
    }
}

impl From<Option<Duration>> for Expiry {
    fn from(ttl: Option<Duration>) -> Self {
        ttl.map(Expiry::from_duration).unwrap_or_default()
    }
}

// == Cache Entry ==
/// A single key/value pair together with its insertion stamp.
#[derive(Debug, Clone)]
pub(crate) struct Entry<K, V> {
    /// The key, duplicated from the index so eviction can hand it back
    pub key: K,
    /// The stored value
    pub value: V,
    /// When the entry was created or last replaced; None while expiry is disabled
    pub inserted_at: Option<DateTime<Utc>>,
}

impl<K, V> Entry<K, V> {
    pub fn new(key: K, value: V, inserted_at: Option<DateTime<Utc>>) -> Self {
        Self {
            key,
            value,
            inserted_at,
        }
    }

    // == Replace ==
    /// Overwrites the value and restamps the entry.
    pub fn replace(&mut self, value: V, inserted_at: Option<DateTime<Utc>>) {
        self.value = value;
        self.inserted_at = inserted_at;
    }

    /// Splits the entry into its key and value.
    pub fn into_pair(self) -> (K, V) {
        (self.key, self.value)
    }
}
