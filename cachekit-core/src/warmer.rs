//! Warmer (C7): an external collaborator against the engine's public
//! contract — it only calls [`Cache::put`], never touches the engine's
//! lock or internals directly.
//!
//! Grounded on `hkv-bench`'s benchmark harness (pre-built workload,
//! `Instant`-measured elapsed time) generalized from a single-threaded
//! loop to a bounded worker pool, the way `MemoryEngine`'s sharding
//! spreads work across a fixed number of workers.

use std::hash::Hash;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use cachekit_common::{CacheError, CacheResult};

use crate::engine::{Cache, Loader};

/// Outcome of a bulk warm operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WarmResult {
    pub success_count: usize,
    pub fail_count: usize,
    pub total_count: usize,
    pub elapsed: Duration,
}

/// Parallel bulk pre-loader. Given a list of keys and a loader, invokes
/// the loader for each key on a bounded-concurrency worker pool and
/// `put`s every success into the cache.
pub struct Warmer<K, V> {
    loader: Arc<Loader<K, V>>,
    concurrency: usize,
}

impl<K, V> Warmer<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Rejects a non-positive `concurrency` at construction (E2); the
    /// loader is mandatory, so it is a required constructor argument
    /// rather than an optional field that could be left unset.
    pub fn new(loader: Arc<Loader<K, V>>, concurrency: usize) -> CacheResult<Self> {
        if concurrency == 0 {
            return Err(CacheError::InvalidConfig(
                "warmer concurrency must be positive".into(),
            ));
        }
        Ok(Self { loader, concurrency })
    }

    /// Empty `keys` returns an all-zero result with zero elapsed time
    /// without spawning any workers.
    pub fn warm(&self, cache: &Cache<K, V>, keys: Vec<K>) -> WarmResult {
        let total_count = keys.len();
        if total_count == 0 {
            return WarmResult {
                success_count: 0,
                fail_count: 0,
                total_count: 0,
                elapsed: Duration::ZERO,
            };
        }

        let start = Instant::now();
        let workers = self.concurrency.min(total_count);
        let chunks = split_round_robin(keys, workers);

        let success_count = AtomicUsize::new(0);
        let fail_count = AtomicUsize::new(0);

        std::thread::scope(|scope| {
            for chunk in chunks {
                let loader = Arc::clone(&self.loader);
                let success_count = &success_count;
                let fail_count = &fail_count;
                scope.spawn(move || {
                    for key in chunk {
                        match loader(&key) {
                            Ok(Some(value)) => {
                                cache.put(key, value);
                                success_count.fetch_add(1, Ordering::Relaxed);
                            }
                            Ok(None) => {
                                success_count.fetch_add(1, Ordering::Relaxed);
                            }
                            Err(err) => {
                                tracing::warn!(key = %err.key_debug(), "warmer load failed");
                                fail_count.fetch_add(1, Ordering::Relaxed);
                            }
                        }
                    }
                });
            }
        });

        WarmResult {
            success_count: success_count.load(Ordering::Relaxed),
            fail_count: fail_count.load(Ordering::Relaxed),
            total_count,
            elapsed: start.elapsed(),
        }
    }
}

fn split_round_robin<T>(items: Vec<T>, workers: usize) -> Vec<Vec<T>> {
    let mut chunks: Vec<Vec<T>> = (0..workers).map(|_| Vec::new()).collect();
    for (i, item) in items.into_iter().enumerate() {
        chunks[i % workers].push(item);
    }
    chunks.retain(|c| !c.is_empty());
    chunks
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;

    use super::*;
    use crate::config::CacheConfig;

    fn cache() -> Arc<Cache<u32, u32>> {
        Cache::new(
            CacheConfig::new(
                NonZeroUsize::new(100).unwrap(),
                Duration::from_secs(60),
                Duration::from_secs(3600),
            ),
            None,
        )
        .unwrap()
    }

    #[test]
    fn empty_keys_returns_all_zero_result() {
        let c = cache();
        let loader: Arc<Loader<u32, u32>> = Arc::new(|k: &u32| Ok(Some(*k * 2)));
        let warmer = Warmer::new(loader, 4).unwrap();
        let result = warmer.warm(&c, vec![]);
        assert_eq!(
            result,
            WarmResult {
                success_count: 0,
                fail_count: 0,
                total_count: 0,
                elapsed: Duration::ZERO,
            }
        );
    }

    #[test]
    fn warm_loads_and_inserts_all_keys() {
        let c = cache();
        let loader: Arc<Loader<u32, u32>> = Arc::new(|k: &u32| Ok(Some(*k * 2)));
        let warmer = Warmer::new(loader, 4).unwrap();
        let keys: Vec<u32> = (0..50).collect();
        let result = warmer.warm(&c, keys);

        assert_eq!(result.success_count, 50);
        assert_eq!(result.fail_count, 0);
        assert_eq!(result.total_count, 50);
        for k in 0..50u32 {
            assert_eq!(c.get(&k), Some(k * 2));
        }
    }

    #[test]
    fn warm_counts_failures_without_inserting() {
        let c = cache();
        let loader: Arc<Loader<u32, u32>> = Arc::new(|k: &u32| {
            if *k % 2 == 0 {
                Ok(Some(*k))
            } else {
                Err(cachekit_common::LoadError::new(k, "odd keys fail"))
            }
        });
        let warmer = Warmer::new(loader, 3).unwrap();
        let result = warmer.warm(&c, (0..10).collect());

        assert_eq!(result.success_count, 5);
        assert_eq!(result.fail_count, 5);
        assert_eq!(result.total_count, 10);
        assert!(!c.contains_key(&1));
        assert!(c.contains_key(&2));
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let loader: Arc<Loader<u32, u32>> = Arc::new(|k: &u32| Ok(Some(*k)));
        assert!(Warmer::new(loader, 0).is_err());
    }
}
