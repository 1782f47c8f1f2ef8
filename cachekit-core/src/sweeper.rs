//! Background sweeper (C6): a daemon thread that periodically removes
//! expired entries via [`crate::engine::Cache::purge_expired_once`].
//!
//! Grounded on `hkv-engine::memory::{ExpirationHandle, start_expirer}`:
//! an `AtomicBool` stop flag plus a joined `std::thread::JoinHandle`,
//! spawned with `std::thread::spawn` rather than anything
//! runtime/executor-specific, so the cache has no async dependency.
//!
//! The thread holds only a `Weak<Cache<K, V>>`, never a strong `Arc`: the
//! cache's own `sweeper` field owns this thread's `JoinHandle`, so a
//! strong back-reference here would form a cycle that `Cache::drop`
//! could never break. An upgrade failure (every `Arc<Cache<K, V>>` gone)
//! ends the loop on its own as a second line of defense beyond
//! `Cache::drop`'s explicit stop signal.

use std::hash::Hash;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::thread::JoinHandle;
use std::time::Instant;

use crate::engine::Cache;

/// Handle owned by [`Cache`] for the lifetime of the sweeper thread.
pub(crate) struct SweeperState {
    stop: Arc<AtomicBool>,
    join: Option<JoinHandle<()>>,
}

impl SweeperState {
    /// Signals the sweeper to stop and joins it. The sweeper must not
    /// prevent process shutdown on its own (§4.5), but an explicit
    /// `shutdown()` still waits for the in-flight sweep to finish.
    pub fn stop(mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

pub(crate) fn spawn<K, V>(cache: Arc<Cache<K, V>>) -> SweeperState
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    let interval = cache.cleanup_interval();
    let stop = Arc::new(AtomicBool::new(false));
    let stop_thread = Arc::clone(&stop);
    let weak_cache: Weak<Cache<K, V>> = Arc::downgrade(&cache);

    let join = std::thread::spawn(move || {
        while !stop_thread.load(Ordering::Acquire) {
            std::thread::sleep(interval);
            if stop_thread.load(Ordering::Acquire) {
                break;
            }
            let Some(cache) = weak_cache.upgrade() else {
                break;
            };
            // Any internal failure here would be logged and swallowed
            // rather than propagated (§7); `purge_expired_once` is
            // currently infallible, so there is nothing to catch yet.
            let removed = cache.purge_expired_once(Instant::now());
            if removed > 0 {
                tracing::debug!(removed, "sweeper removed expired entries");
            }
        }
    });

    SweeperState {
        stop,
        join: Some(join),
    }
}
