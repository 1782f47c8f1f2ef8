//! End-to-end scenarios exercising the public `Cache` API as a whole,
//! one test per literal scenario.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use cachekit_common::LoadError;
use cachekit_core::{Cache, CacheConfig, Loader};

fn config(capacity: usize, ttl: Duration) -> CacheConfig {
    CacheConfig::new(
        NonZeroUsize::new(capacity).unwrap(),
        ttl,
        Duration::from_secs(3600),
    )
}

#[test]
fn lru_correctness_under_access() {
    let cache: Arc<Cache<String, i32>> =
        Cache::new(config(5, Duration::from_secs(60)), None).unwrap();

    for i in 1..=5 {
        cache.put(format!("k{i}"), i);
    }
    assert_eq!(cache.get(&"k1".to_string()), Some(1));

    cache.put("k6".to_string(), 6);

    assert!(cache.contains_key(&"k1".to_string()));
    assert!(!cache.contains_key(&"k2".to_string()));
    assert!(cache.contains_key(&"k6".to_string()));
    assert_eq!(cache.stats().snapshot().evictions, 1);
}

#[test]
fn overwrite_promotes_and_survives_eviction() {
    let cache: Arc<Cache<String, String>> =
        Cache::new(config(5, Duration::from_secs(60)), None).unwrap();

    for i in 1..=5 {
        cache.put(format!("k{i}"), format!("v{i}"));
    }
    cache.put("k1".to_string(), "updated".to_string());
    cache.put("k6".to_string(), "v6".to_string());

    assert_eq!(cache.get(&"k1".to_string()), Some("updated".to_string()));
    assert!(!cache.contains_key(&"k2".to_string()));
}

#[test]
fn loader_memoizes_successful_load() {
    let loader: Box<Loader<String, String>> =
        Box::new(|key: &String| Ok(Some(format!("loaded-{key}"))));
    let cache: Arc<Cache<String, String>> =
        Cache::new(config(10, Duration::from_secs(60)), Some(loader)).unwrap();

    assert_eq!(
        cache.get(&"k1".to_string()),
        Some("loaded-k1".to_string())
    );
    assert_eq!(cache.stats().snapshot().loads, 1);

    assert_eq!(
        cache.get(&"k1".to_string()),
        Some("loaded-k1".to_string())
    );
    assert_eq!(cache.stats().snapshot().loads, 1);
}

#[test]
fn loader_returning_none_is_not_a_failure() {
    let loader: Box<Loader<String, String>> = Box::new(|_key: &String| Ok(None));
    let cache: Arc<Cache<String, String>> =
        Cache::new(config(10, Duration::from_secs(60)), Some(loader)).unwrap();

    assert_eq!(cache.get(&"anything".to_string()), None);
    let snap = cache.stats().snapshot();
    assert_eq!(snap.loads, 1);
    assert_eq!(snap.load_failures, 0);
    assert!(!cache.contains_key(&"anything".to_string()));
}

#[test]
fn loader_exception_is_absorbed_as_a_miss() {
    let loader: Box<Loader<String, String>> =
        Box::new(|key: &String| Err(LoadError::new(key, "backing store unavailable")));
    let cache: Arc<Cache<String, String>> =
        Cache::new(config(10, Duration::from_secs(60)), Some(loader)).unwrap();

    assert_eq!(cache.get(&"k".to_string()), None);
    assert_eq!(cache.stats().snapshot().load_failures, 1);
    assert!(!cache.contains_key(&"k".to_string()));
}

#[test]
fn concurrent_puts_bound_size_and_tally_exactly() {
    const THREADS: usize = 16;
    const OPS_PER_THREAD: usize = 500;

    let cache: Arc<Cache<u64, u64>> =
        Cache::new(config(100, Duration::from_secs(60)), None).unwrap();

    std::thread::scope(|scope| {
        for t in 0..THREADS {
            let cache = &cache;
            scope.spawn(move || {
                for i in 0..OPS_PER_THREAD {
                    let key = (t * OPS_PER_THREAD + i) as u64;
                    cache.put(key, key);
                }
            });
        }
    });

    assert!(cache.size() <= 100);
    assert_eq!(
        cache.stats().snapshot().puts,
        (THREADS * OPS_PER_THREAD) as u64
    );

    cache.shutdown();
}
