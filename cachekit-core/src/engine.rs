//! LRU/TTL engine (C5): composes the index (C4) and recency list (C3)
//! under a single read/write lock, implementing get/put/remove/contains/
//! size/clear, eviction, lazy expiry, and loader integration.

use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};

use cachekit_common::{CacheResult, LoadError};

use crate::config::CacheConfig;
use crate::entry::Entry;
use crate::index::Index;
use crate::list::RecencyList;
use crate::stats::Stats;
use crate::sweeper::{self, SweeperState};

/// A key loader invoked on miss. `Ok(Some(v))` is a successful load
/// (§4.4.4), `Ok(None)` is the "loader returns null" outcome (E4), and
/// `Err(_)` is a load-exception (E3).
pub type Loader<K, V> = dyn Fn(&K) -> Result<Option<V>, LoadError> + Send + Sync;

struct Inner<K, V> {
    index: Index<K>,
    list: RecencyList<K, V>,
}

impl<K, V> Inner<K, V>
where
    K: Eq + Hash,
{
    fn new() -> Self {
        Self {
            index: Index::new(),
            list: RecencyList::new(),
        }
    }
}

enum ExpiryOutcome {
    Removed,
    GoneAlready,
    StillFresh,
}

/// The concurrent LRU/TTL cache itself.
///
/// Every public operation here is the Rust realization of the table in
/// spec §4.4; see that table and §4.4.1/§4.4.2 for the exact read/write
/// path semantics this implementation follows.
pub struct Cache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    inner: RwLock<Inner<K, V>>,
    config: CacheConfig,
    stats: Arc<Stats>,
    loader: Option<Box<Loader<K, V>>>,
    sweeper: Mutex<Option<SweeperState>>,
}

impl<K, V> Cache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Validates `config` (E2 on failure), then constructs a cache and
    /// starts its background sweeper (C6). Returned as `Arc` because the
    /// sweeper thread outlives this call and needs shared ownership.
    pub fn new(config: CacheConfig, loader: Option<Box<Loader<K, V>>>) -> CacheResult<Arc<Self>> {
        config.validate()?;
        let cache = Arc::new(Self {
            inner: RwLock::new(Inner::new()),
            stats: Arc::new(Stats::new(config.record_stats)),
            sweeper: Mutex::new(None),
            loader,
            config,
        });
        let state = sweeper::spawn(Arc::clone(&cache));
        *cache.sweeper.lock() = Some(state);
        Ok(cache)
    }

    pub(crate) fn cleanup_interval(&self) -> Duration {
        self.config.cleanup_interval
    }

    /// §4.4.1: read-lock fast path, with lock upgrade only when a hit
    /// actually needs to move in the recency list.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = Instant::now();

        let fast_path = {
            let guard = self.inner.read();
            match guard.index.get(key) {
                None => None,
                Some(idx) => Some(guard.list.entry(idx).is_expired(now, self.config.ttl)),
            }
        };

        match fast_path {
            None => {
                self.stats.record_miss();
                self.load_on_miss(key)
            }
            Some(false) => self.promote_on_hit(key),
            Some(true) => self.handle_expired(key, now),
        }
    }

    /// Upgrades to the write lock and re-verifies the key is still
    /// indexed before promoting (§9: "Lock-upgrade pattern" — the
    /// release-and-reacquire sequence is not atomic, so the entry found
    /// under the read lock may no longer exist by the time the write
    /// lock is granted).
    fn promote_on_hit(&self, key: &K) -> Option<V> {
        let mut guard = self.inner.write();
        match guard.index.get(key) {
            Some(idx) => {
                guard.list.move_to_head(idx);
                let value = guard.list.entry(idx).value.clone();
                drop(guard);
                self.stats.record_hit();
                Some(value)
            }
            None => {
                drop(guard);
                self.stats.record_miss();
                self.load_on_miss(key)
            }
        }
    }

    /// §4.4.1 expired-hit branch: re-verify under the write lock before
    /// deleting, since the entry may have been overwritten in the gap
    /// between locks.
    fn handle_expired(&self, key: &K, now: Instant) -> Option<V> {
        let outcome = {
            let mut guard = self.inner.write();
            match guard.index.get(key) {
                None => ExpiryOutcome::GoneAlready,
                Some(idx) => {
                    if guard.list.entry(idx).is_expired(now, self.config.ttl) {
                        guard.index.remove(key);
                        guard.list.unlink(idx);
                        guard.list.dealloc(idx);
                        ExpiryOutcome::Removed
                    } else {
                        ExpiryOutcome::StillFresh
                    }
                }
            }
        };

        match outcome {
            ExpiryOutcome::Removed => {
                self.stats.record_expired();
                self.stats.record_miss();
                self.load_on_miss(key)
            }
            ExpiryOutcome::GoneAlready => {
                self.stats.record_miss();
                self.load_on_miss(key)
            }
            ExpiryOutcome::StillFresh => self.promote_on_hit(key),
        }
    }

    /// §4.4.4: invoked outside any cache lock with the original key.
    fn load_on_miss(&self, key: &K) -> Option<V> {
        let loader = self.loader.as_ref()?;
        match loader(key) {
            Ok(Some(value)) => {
                self.stats.record_load();
                self.put(key.clone(), value.clone());
                Some(value)
            }
            Ok(None) => {
                self.stats.record_load();
                None
            }
            Err(err) => {
                tracing::warn!(key = %err.key_debug(), error = %err, "loader raised a load-exception");
                self.stats.record_load_fail();
                None
            }
        }
    }

    /// §4.4.2: write path. Overwrites never evict; a fresh insertion
    /// evicts the LRU victim only when the index is already at capacity.
    pub fn put(&self, key: K, value: V) {
        let now = Instant::now();
        let mut guard = self.inner.write();
        self.stats.record_put();

        if let Some(idx) = guard.index.get(&key) {
            let entry = guard.list.entry_mut(idx);
            entry.value = value;
            entry.created_at = now;
            guard.list.move_to_head(idx);
            return;
        }

        if guard.index.len() == self.config.capacity.get() {
            if let Some(victim_idx) = guard.list.pop_lru() {
                let victim = guard.list.dealloc(victim_idx);
                guard.index.remove(&victim.key);
                self.stats.record_eviction();
            }
        }

        let idx = guard.list.alloc(Entry::new(key.clone(), value, now));
        guard.list.link_at_head(idx);
        guard.index.insert(key, idx);
    }

    /// Unlinks and drops the entry if present; does not consult TTL.
    pub fn remove(&self, key: &K) -> bool {
        let mut guard = self.inner.write();
        match guard.index.remove(key) {
            Some(idx) => {
                guard.list.unlink(idx);
                guard.list.dealloc(idx);
                true
            }
            None => false,
        }
    }

    /// Read-through predicate: does **not** promote recency order
    /// (§9 Open Questions: this specification says no).
    pub fn contains_key(&self, key: &K) -> bool {
        let now = Instant::now();
        let guard = self.inner.read();
        match guard.index.get(key) {
            Some(idx) => !guard.list.entry(idx).is_expired(now, self.config.ttl),
            None => false,
        }
    }

    pub fn size(&self) -> usize {
        self.inner.read().index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Removes all entries; counters are untouched.
    pub fn clear(&self) {
        let mut guard = self.inner.write();
        guard.index.clear();
        guard.list.clear();
    }

    /// Weakly-consistent snapshot of current keys.
    pub fn keys(&self) -> Vec<K> {
        self.inner.read().index.keys_snapshot()
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    /// Stops the sweeper and joins it within the running process; after
    /// this call, further operations are not guaranteed to behave
    /// sensibly (§4.4: "further operations undefined").
    pub fn shutdown(&self) {
        self.stop_sweeper();
    }

    fn stop_sweeper(&self) {
        if let Some(state) = self.sweeper.lock().take() {
            state.stop();
        }
    }

    /// §4.5: collect-then-double-checked-remove sweep, run once.
    /// Returns the number of entries actually removed.
    pub(crate) fn purge_expired_once(&self, now: Instant) -> usize {
        let candidates: Vec<K> = {
            let guard = self.inner.read();
            guard
                .index
                .keys_snapshot()
                .into_iter()
                .filter(|key| {
                    guard
                        .index
                        .get(key)
                        .map(|idx| guard.list.entry(idx).is_expired(now, self.config.ttl))
                        .unwrap_or(false)
                })
                .collect()
        };

        if candidates.is_empty() {
            return 0;
        }

        let mut removed = 0usize;
        let mut guard = self.inner.write();
        for key in candidates {
            if let Some(idx) = guard.index.get(&key) {
                if guard.list.entry(idx).is_expired(now, self.config.ttl) {
                    guard.index.remove(&key);
                    guard.list.unlink(idx);
                    guard.list.dealloc(idx);
                    removed += 1;
                }
                // else: overwritten since the collect phase — the
                // double-check is load-bearing, skip it.
            }
            // else: already removed by another thread — skip.
        }
        drop(guard);

        for _ in 0..removed {
            self.stats.record_expired();
        }
        removed
    }
}

/// The sweeper thread holds only a `Weak<Cache<K, V>>` (see
/// `sweeper::spawn`), so dropping the last `Arc<Cache<K, V>>` without an
/// explicit `shutdown()` call must still stop and join it here — otherwise
/// the thread would wake forever on a cache nothing can reach.
impl<K, V> Drop for Cache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn drop(&mut self) {
        self.stop_sweeper();
    }
}
