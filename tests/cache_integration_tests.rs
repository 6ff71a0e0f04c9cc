//! Integration Tests for the LRU Engine
//!
//! Drives the public API through the documented scenarios, with a manual
//! clock standing in for wall time.

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use expiring_lru::{
    with_clock, with_eviction_callback, with_expiry, with_reentrant_eviction_callback,
    CacheConfig, Expiry, LruCache, ManualClock,
};
use tracing_subscriber::EnvFilter;

// == Helper Functions ==

type Evicted = Arc<Mutex<Vec<(String, u32)>>>;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "expiring_lru=warn".into()),
        )
        .with_test_writer()
        .try_init();
}

fn recorder() -> (Evicted, impl FnMut(String, u32) + Send + 'static) {
    let evicted: Evicted = Arc::default();
    let sink = evicted.clone();
    (evicted, move |key, value| sink.lock().unwrap().push((key, value)))
}

fn keys(cache: &LruCache<String, u32>) -> Vec<String> {
    cache.keys().cloned().collect()
}

// == LRU Order ==

#[test]
fn test_get_promotes_before_capacity_eviction() {
    init_tracing();
    let (evicted, on_evicted) = recorder();
    let mut cache = LruCache::new(2, [with_eviction_callback(on_evicted)]);

    cache.add("a".to_string(), 1);
    cache.add("b".to_string(), 2);
    assert_eq!(cache.get("a"), Some(&1));
    cache.add("c".to_string(), 3);

    assert_eq!(cache.len(), 2);
    assert_eq!(keys(&cache), vec!["c", "a"]);
    assert_eq!(cache.peek("a"), Some(&1));
    assert_eq!(cache.peek("c"), Some(&3));
    assert_eq!(*evicted.lock().unwrap(), vec![("b".to_string(), 2)]);
}

#[test]
fn test_overflow_evicts_first_untouched_key() {
    init_tracing();
    let (evicted, on_evicted) = recorder();
    let mut cache = LruCache::new(3, [with_eviction_callback(on_evicted)]);

    for (n, key) in ["k1", "k2", "k3", "k4"].into_iter().enumerate() {
        cache.add(key.to_string(), n as u32);
    }

    assert_eq!(cache.len(), 3);
    assert!(!cache.contains("k1"));
    assert_eq!(*evicted.lock().unwrap(), vec![("k1".to_string(), 0)]);
}

#[test]
fn test_update_element_does_not_promote() {
    init_tracing();
    let mut cache = LruCache::new(2, []);

    cache.add("a".to_string(), 1);
    cache.add("b".to_string(), 2);
    cache.update_element("a", 100);
    assert_eq!(keys(&cache), vec!["b", "a"]);

    cache.add("c".to_string(), 3);
    assert_eq!(keys(&cache), vec!["c", "b"]);
}

// == TTL Expiry ==

#[test]
fn test_ttl_lazy_expiry_scenario() {
    init_tracing();
    let clock = ManualClock::new();
    let (evicted, on_evicted) = recorder();
    let mut cache = LruCache::new(
        0,
        [
            with_expiry(Duration::from_millis(100)),
            with_eviction_callback(on_evicted),
            with_clock(clock.clone()),
        ],
    );

    cache.add("x".to_string(), 1);
    clock.advance(Duration::from_millis(50));
    assert_eq!(cache.get("x"), Some(&1));

    clock.advance(Duration::from_millis(100));
    // Stale but not yet read
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.get("x"), None);

    assert_eq!(cache.len(), 0);
    assert_eq!(*evicted.lock().unwrap(), vec![("x".to_string(), 1)]);
}

#[test]
fn test_ttl_boundary() {
    init_tracing();
    let clock = ManualClock::new();
    let mut cache = LruCache::new(
        0,
        [with_expiry(Duration::from_millis(100)), with_clock(clock.clone())],
    );

    cache.add("early".to_string(), 1);
    cache.add("late".to_string(), 2);

    clock.advance(Duration::from_millis(99));
    assert_eq!(cache.get("early"), Some(&1));

    clock.advance(Duration::from_millis(2));
    assert_eq!(cache.get("late"), None);
}

#[test]
fn test_ttl_sub_millisecond_epsilon() {
    init_tracing();
    let clock = ManualClock::new();
    let mut cache = LruCache::new(
        0,
        [with_expiry(Duration::from_millis(100)), with_clock(clock.clone())],
    );

    cache.add("x".to_string(), 1);
    clock.advance(Duration::from_millis(100) - Duration::from_micros(500));
    assert_eq!(cache.get("x"), Some(&1));

    // get() does not restamp, so the entry still ages from insertion
    clock.advance(Duration::from_millis(1));
    assert_eq!(cache.get("x"), None);
}

#[test]
fn test_update_element_keeps_ttl_clock() {
    init_tracing();
    let clock = ManualClock::new();
    let mut cache = LruCache::new(
        0,
        [with_expiry(Duration::from_millis(100)), with_clock(clock.clone())],
    );

    cache.add("x".to_string(), 1);
    clock.advance(Duration::from_millis(90));
    cache.update_element("x", 2);
    clock.advance(Duration::from_millis(20));

    assert_eq!(cache.get("x"), None);
}

#[test]
fn test_zero_expiry_disables_ttl() {
    init_tracing();
    let clock = ManualClock::new();
    let mut cache = LruCache::new(0, [with_expiry(Duration::ZERO), with_clock(clock.clone())]);

    cache.add("x".to_string(), 1);
    clock.advance(Duration::from_secs(86_400));

    assert_eq!(cache.ttl(), Expiry::Disabled);
    assert_eq!(cache.get("x"), Some(&1));
}

#[test]
fn test_purge_expired_reports_each_entry() {
    init_tracing();
    let clock = ManualClock::new();
    let (evicted, on_evicted) = recorder();
    let mut cache = LruCache::new(
        0,
        [
            with_expiry(Duration::from_millis(10)),
            with_eviction_callback(on_evicted),
            with_clock(clock.clone()),
        ],
    );

    cache.add("a".to_string(), 1);
    cache.add("b".to_string(), 2);
    clock.advance(Duration::from_millis(11));
    cache.add("c".to_string(), 3);

    assert_eq!(cache.purge_expired(), 2);
    assert_eq!(keys(&cache), vec!["c"]);
    assert_eq!(evicted.lock().unwrap().len(), 2);
}

// == Eviction Callback ==

#[test]
fn test_clear_reports_every_entry_once() {
    init_tracing();
    let (evicted, on_evicted) = recorder();
    let mut cache = LruCache::new(10, [with_eviction_callback(on_evicted)]);

    cache.add("a".to_string(), 1);
    cache.add("b".to_string(), 2);
    cache.add("c".to_string(), 3);
    cache.clear();
    cache.clear();

    assert_eq!(cache.len(), 0);
    let mut seen = evicted.lock().unwrap().clone();
    seen.sort();
    assert_eq!(
        seen,
        vec![
            ("a".to_string(), 1),
            ("b".to_string(), 2),
            ("c".to_string(), 3)
        ]
    );
}

#[test]
fn test_replacement_never_reports() {
    init_tracing();
    let (evicted, on_evicted) = recorder();
    let mut cache = LruCache::new(1, [with_eviction_callback(on_evicted)]);

    cache.add("a".to_string(), 1);
    cache.add("a".to_string(), 2);
    cache.add("a".to_string(), 3);

    assert_eq!(cache.get("a"), Some(&3));
    assert!(evicted.lock().unwrap().is_empty());
}

#[test]
fn test_remove_absent_twice() {
    init_tracing();
    let (evicted, on_evicted) = recorder();
    let mut cache = LruCache::new(4, [with_eviction_callback(on_evicted)]);
    cache.add("a".to_string(), 1);

    cache.remove("missing");
    cache.remove("missing");

    assert_eq!(cache.len(), 1);
    assert!(evicted.lock().unwrap().is_empty());
}

// == Reentrant Callbacks ==

#[test]
fn test_callback_observes_completed_removal() {
    init_tracing();
    let observed: Arc<Mutex<Vec<(bool, usize)>>> = Arc::default();
    let sink = observed.clone();
    let mut cache = LruCache::new(
        0,
        [with_reentrant_eviction_callback(
            move |cache: &mut LruCache<String, u32>, key: String, _value: u32| {
                sink.lock().unwrap().push((cache.contains(&key), cache.len()));
            },
        )],
    );

    cache.add("a".to_string(), 1);
    cache.add("b".to_string(), 2);
    cache.remove("a");

    assert_eq!(*observed.lock().unwrap(), vec![(false, 1)]);
}

#[test]
fn test_callback_adding_during_capacity_eviction() {
    init_tracing();
    let evicted: Evicted = Arc::default();
    let sink = evicted.clone();
    let mut cache = LruCache::new(
        2,
        [with_reentrant_eviction_callback(
            move |cache: &mut LruCache<String, u32>, key: String, value: u32| {
                sink.lock().unwrap().push((key, value));
                cache.add("log".to_string(), value);
            },
        )],
    );

    cache.add("a".to_string(), 1);
    cache.add("b".to_string(), 2);
    // Evicts "a"; the callback's add then pushes out "b"
    cache.add("c".to_string(), 3);

    assert_eq!(cache.len(), 2);
    assert_eq!(keys(&cache), vec!["log", "c"]);
    assert_eq!(cache.peek("log"), Some(&2));
    assert_eq!(
        *evicted.lock().unwrap(),
        vec![("a".to_string(), 1), ("b".to_string(), 2)]
    );
}

#[test]
fn test_callback_adding_during_clear() {
    init_tracing();
    let evicted: Evicted = Arc::default();
    let sink = evicted.clone();
    let mut cache = LruCache::new(
        0,
        [with_reentrant_eviction_callback(
            move |cache: &mut LruCache<String, u32>, key: String, value: u32| {
                sink.lock().unwrap().push((key.clone(), value));
                cache.add(format!("{key}-tombstone"), value);
            },
        )],
    );

    cache.add("a".to_string(), 1);
    cache.add("b".to_string(), 2);
    cache.add("c".to_string(), 3);
    cache.clear();

    assert_eq!(evicted.lock().unwrap().len(), 3);
    assert_eq!(cache.len(), 3);
    assert!(cache.contains("a-tombstone"));
    assert!(cache.contains("b-tombstone"));
    assert!(cache.contains("c-tombstone"));
}

#[test]
fn test_callback_removing_other_keys() {
    init_tracing();
    let evicted: Evicted = Arc::default();
    let sink = evicted.clone();
    let mut cache = LruCache::new(
        0,
        [with_reentrant_eviction_callback(
            move |cache: &mut LruCache<String, u32>, key: String, value: u32| {
                sink.lock().unwrap().push((key, value));
                cache.remove_oldest();
            },
        )],
    );

    cache.add("a".to_string(), 1);
    cache.add("b".to_string(), 2);
    cache.add("c".to_string(), 3);
    // Each callback removes the next oldest until the cache is empty
    cache.remove("c");

    assert!(cache.is_empty());
    assert_eq!(
        *evicted.lock().unwrap(),
        vec![
            ("c".to_string(), 3),
            ("a".to_string(), 1),
            ("b".to_string(), 2)
        ]
    );
}

// == Configuration & Sharing ==

#[test]
fn test_cache_from_config() {
    init_tracing();
    let clock = ManualClock::new();
    let config = CacheConfig::from_json(r#"{"capacity": 2, "ttl_ms": 100}"#).unwrap();
    let mut cache = LruCache::from_config(&config, [with_clock(clock.clone())]);

    cache.add("a".to_string(), 1);
    cache.add("b".to_string(), 2);
    cache.add("c".to_string(), 3);
    assert_eq!(cache.capacity(), 2);
    assert_eq!(cache.ttl(), Expiry::After(Duration::from_millis(100)));
    assert_eq!(cache.get("a"), None);

    clock.advance(Duration::from_millis(101));
    assert_eq!(cache.get("b"), None);
}

#[test]
fn test_cache_behind_mutex_across_threads() {
    init_tracing();
    let cache: Arc<Mutex<LruCache<String, u32>>> = Arc::new(Mutex::new(LruCache::new(8, [])));

    let handles: Vec<_> = (0..4u32)
        .map(|t| {
            let cache = cache.clone();
            thread::spawn(move || {
                for n in 0..10u32 {
                    cache.lock().unwrap().add(format!("{t}-{n}"), n);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(cache.lock().unwrap().len(), 8);
}
