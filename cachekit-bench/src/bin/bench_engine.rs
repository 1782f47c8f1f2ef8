//! # Engine Benchmark Harness
//!
//! A dependency-free, repeatable benchmark driver for `cachekit-core`'s
//! LRU/TTL engine so baseline throughput and latency can be compared over
//! time: deterministic PRNG workload, pre-built keys to keep setup off
//! the hot path, direct calls against the concrete engine (no dynamic
//! dispatch).

use std::env;
use std::hint::black_box;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use cachekit_core::{Cache, CacheConfig};

const DEFAULT_KEY_COUNT: usize = 1 << 16;
const DEFAULT_OP_COUNT: usize = 1_000_000;

struct BenchConfig {
    requested_keys: usize,
    key_count: usize,
    key_mask: usize,
    op_count: usize,
}

impl BenchConfig {
    fn from_args() -> Self {
        let mut args = env::args().skip(1);
        let requested_keys = parse_usize(args.next(), DEFAULT_KEY_COUNT);
        let op_count = parse_usize(args.next(), DEFAULT_OP_COUNT);

        let key_count = normalize_power_of_two(requested_keys);
        let key_mask = key_count - 1;

        BenchConfig {
            requested_keys,
            key_count,
            key_mask,
            op_count,
        }
    }
}

fn parse_usize(value: Option<String>, fallback: usize) -> usize {
    value.and_then(|raw| raw.parse().ok()).unwrap_or(fallback)
}

fn normalize_power_of_two(value: usize) -> usize {
    let value = value.max(1);
    if value.is_power_of_two() {
        value
    } else {
        value.next_power_of_two()
    }
}

/// Tiny deterministic PRNG used to avoid external dependencies.
struct XorShift64 {
    state: u64,
}

impl XorShift64 {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    #[inline]
    fn next_index(&mut self, mask: usize) -> usize {
        (self.next_u64() as usize) & mask
    }
}

fn report(label: &str, ops: usize, elapsed: Duration) {
    let secs = elapsed.as_secs_f64();
    let ops_per_sec = (ops as f64) / secs;
    let nanos_per_op = (secs * 1e9) / (ops as f64);
    println!("{label}: {ops} ops in {secs:.3}s ({ops_per_sec:.0} ops/s, {nanos_per_op:.1} ns/op)");
}

fn main() {
    let config = BenchConfig::from_args();

    let cache = Cache::<u64, u64>::new(
        CacheConfig::new(
            NonZeroUsize::new(config.key_count).unwrap(),
            Duration::from_secs(3600),
            Duration::from_secs(3600),
        ),
        None,
    )
    .expect("bench config is valid");

    println!(
        "keys: requested={}, actual={}, ops={}",
        config.requested_keys, config.key_count, config.op_count
    );

    for i in 0..config.key_count as u64 {
        cache.put(i, i);
    }

    let mut rng = XorShift64::new(0x1234_5678_9ABC_DEF0);
    let start = Instant::now();
    for _ in 0..config.op_count {
        let idx = rng.next_index(config.key_mask) as u64;
        let value = cache.get(&idx);
        black_box(value);
    }
    report("GET", config.op_count, start.elapsed());

    let mut rng = XorShift64::new(0x0FED_CBA9_8765_4321);
    let start = Instant::now();
    for _ in 0..config.op_count {
        let idx = rng.next_index(config.key_mask) as u64;
        cache.put(idx, idx ^ 0xFF);
    }
    report("SET", config.op_count, start.elapsed());

    let snapshot = cache.stats().snapshot();
    println!(
        "hits={} misses={} hit_rate={:.4} evictions={}",
        snapshot.hits,
        snapshot.misses,
        snapshot.hit_rate(),
        snapshot.evictions
    );

    cache.shutdown();
}
