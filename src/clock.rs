//! Clock Module
//!
//! Abstracts the wall-clock time source used for TTL bookkeeping so tests can
//! drive expiry deterministically.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

// == Clock Trait ==
/// A source of "now" for entry timestamps.
pub trait Clock: Send + Sync {
    /// Returns the current wall-clock time.
    fn now(&self) -> DateTime<Utc>;
}

// == System Clock ==
/// Reads the real wall clock. This is the default clock of every cache.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

// == Manual Clock ==
/// A clock that only moves when told to.
///
/// Clones share the same underlying instant, so a test can keep one handle
/// and hand another to the cache.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    /// Nanoseconds since the Unix epoch
    nanos: Arc<AtomicI64>,
}

impl ManualClock {
    // == Constructor ==
    /// Creates a clock frozen at the Unix epoch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a clock frozen at `start`.
    pub fn starting_at(start: DateTime<Utc>) -> Self {
        Self {
            nanos: Arc::new(AtomicI64::new(to_nanos(start))),
        }
    }

    // == Advance ==
    /// Moves the clock forward by `by`, at nanosecond resolution.
    ///
    /// Saturates at the latest instant representable in nanoseconds
    /// (around the year 2262).
    pub fn advance(&self, by: Duration) {
        let step = i64::try_from(by.as_nanos()).unwrap_or(i64::MAX);
        self.nanos
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |ns| {
                Some(ns.saturating_add(step))
            })
            .ok();
    }

    // == Set ==
    /// Jumps the clock to `to`.
    pub fn set(&self, to: DateTime<Utc>) {
        self.nanos.store(to_nanos(to), Ordering::SeqCst);
    }
}

fn to_nanos(at: DateTime<Utc>) -> i64 {
    at.timestamp_nanos_opt().unwrap_or(if at < DateTime::UNIX_EPOCH {
        i64::MIN
    } else {
        i64::MAX
    })
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_nanos(self.nanos.load(Ordering::SeqCst))
    }
}
