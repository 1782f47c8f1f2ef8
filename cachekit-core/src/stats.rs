//! Statistics counters (C1).
//!
//! Seven independent atomic counters plus derived rates. Grounded on
//! `hkv-server::metrics::Metrics`: plain `AtomicU64` fields, `Relaxed`
//! ordering throughout because counters are not expected to be mutually
//! consistent with one another, only eventually accurate individually.

use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time, immutable copy of the counters.
///
/// Once returned from [`Stats::snapshot`], a `StatsSnapshot` is invariant
/// under further counter activity (P6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub loads: u64,
    pub load_failures: u64,
    pub expirations: u64,
    pub puts: u64,
}

impl StatsSnapshot {
    /// `hits / (hits + misses)`, zero when both are zero.
    pub fn hit_rate(&self) -> f64 {
        let total = self.total_request_count();
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// `misses / (hits + misses)`, zero when both are zero.
    pub fn miss_rate(&self) -> f64 {
        let total = self.total_request_count();
        if total == 0 {
            0.0
        } else {
            self.misses as f64 / total as f64
        }
    }

    /// `hits + misses`.
    pub fn total_request_count(&self) -> u64 {
        self.hits + self.misses
    }
}

/// Thread-safe counter bank. Cheap to share via `Arc`, independent of the
/// cache's read/write lock (§5: "Statistics counters use atomic
/// increments and are independent of the cache lock").
#[derive(Debug, Default)]
pub struct Stats {
    enabled: bool,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    loads: AtomicU64,
    load_failures: AtomicU64,
    expirations: AtomicU64,
    puts: AtomicU64,
}

impl Stats {
    /// `enabled = false` makes every `record_*` call a no-op, matching
    /// `recordStats: false` in the configuration table.
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            ..Default::default()
        }
    }

    #[inline]
    fn bump(&self, counter: &AtomicU64) {
        if self.enabled {
            counter.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_hit(&self) {
        self.bump(&self.hits);
    }

    pub fn record_miss(&self) {
        self.bump(&self.misses);
    }

    pub fn record_eviction(&self) {
        self.bump(&self.evictions);
    }

    pub fn record_load(&self) {
        self.bump(&self.loads);
    }

    pub fn record_load_fail(&self) {
        self.bump(&self.load_failures);
    }

    pub fn record_expired(&self) {
        self.bump(&self.expirations);
    }

    pub fn record_put(&self) {
        self.bump(&self.puts);
    }

    /// Atomically (per counter) resets every counter to zero.
    pub fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.evictions.store(0, Ordering::Relaxed);
        self.loads.store(0, Ordering::Relaxed);
        self.load_failures.store(0, Ordering::Relaxed);
        self.expirations.store(0, Ordering::Relaxed);
        self.puts.store(0, Ordering::Relaxed);
    }

    pub fn hit_rate(&self) -> f64 {
        self.snapshot().hit_rate()
    }

    pub fn miss_rate(&self) -> f64 {
        self.snapshot().miss_rate()
    }

    pub fn total_request_count(&self) -> u64 {
        self.snapshot().total_request_count()
    }

    /// Produces an immutable value copy of all seven counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            loads: self.loads.load(Ordering::Relaxed),
            load_failures: self.load_failures.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
            puts: self.puts.load(Ordering::Relaxed),
        }
    }
}
