//! Tracker performance counters.
//!
//! # Responsibility
//! - Count cache and store interactions for performance introspection.
//! - Stay injectable so each tracker (and each test) observes an isolated
//!   instance instead of process-wide state.
//!
//! # Invariants
//! - Counters only increase.
//! - Snapshots are display-grade reads, not a synchronized transaction.
//!
//! # See also
//! - docs/architecture/caching.md

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic counters shared by one tracker instance.
#[derive(Debug, Default)]
pub struct TrackerMetrics {
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    store_calls: AtomicU64,
    store_failures: AtomicU64,
    coalesced_reads: AtomicU64,
}

impl TrackerMetrics {
    /// Records a read served from the cache.
    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a read that fell through to the store.
    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Records one remote collaborator call.
    pub fn record_store_call(&self) {
        self.store_calls.fetch_add(1, Ordering::Relaxed);
    }

    /// Records one failed remote collaborator call.
    pub fn record_store_failure(&self) {
        self.store_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a read that waited on another caller's in-flight fetch.
    pub fn record_coalesced_read(&self) {
        self.coalesced_reads.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            store_calls: self.store_calls.load(Ordering::Relaxed),
            store_failures: self.store_failures.load(Ordering::Relaxed),
            coalesced_reads: self.coalesced_reads.load(Ordering::Relaxed),
        }
    }
}

/// Plain counter copy handed to callers and the FFI layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub store_calls: u64,
    pub store_failures: u64,
    pub coalesced_reads: u64,
}

#[cfg(test)]
mod tests {
    use super::TrackerMetrics;

    #[test]
    fn snapshot_reflects_recorded_counts() {
        let metrics = TrackerMetrics::default();
        metrics.record_cache_hit();
        metrics.record_cache_miss();
        metrics.record_cache_miss();
        metrics.record_store_call();
        metrics.record_store_failure();
        metrics.record_coalesced_read();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.cache_hits, 1);
        assert_eq!(snapshot.cache_misses, 2);
        assert_eq!(snapshot.store_calls, 1);
        assert_eq!(snapshot.store_failures, 1);
        assert_eq!(snapshot.coalesced_reads, 1);
    }
}
