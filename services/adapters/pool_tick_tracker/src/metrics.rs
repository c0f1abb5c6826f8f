//! Tracker counters
//!
//! Lock-free so that concurrent per-pool calls can share one instance.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct TrackerMetrics {
    replay_accepts: AtomicU64,
    narrow_refetches: AtomicU64,
    full_refetches: AtomicU64,
    terminal_failures: AtomicU64,
    pruned_fallbacks: AtomicU64,
    skipped_logs: AtomicU64,
    initializations: AtomicU64,
}

/// Point-in-time copy of [`TrackerMetrics`]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub replay_accepts: u64,
    pub narrow_refetches: u64,
    pub full_refetches: u64,
    pub terminal_failures: u64,
    pub pruned_fallbacks: u64,
    pub skipped_logs: u64,
    pub initializations: u64,
}

impl TrackerMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_replay_accept(&self) {
        self.replay_accepts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_narrow_refetch(&self) {
        self.narrow_refetches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_full_refetch(&self) {
        self.full_refetches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_terminal_failure(&self) {
        self.terminal_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_pruned_fallback(&self) {
        self.pruned_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_skipped_logs(&self, count: usize) {
        if count > 0 {
            self.skipped_logs.fetch_add(count as u64, Ordering::Relaxed);
        }
    }

    pub fn record_initialization(&self) {
        self.initializations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            replay_accepts: self.replay_accepts.load(Ordering::Relaxed),
            narrow_refetches: self.narrow_refetches.load(Ordering::Relaxed),
            full_refetches: self.full_refetches.load(Ordering::Relaxed),
            terminal_failures: self.terminal_failures.load(Ordering::Relaxed),
            pruned_fallbacks: self.pruned_fallbacks.load(Ordering::Relaxed),
            skipped_logs: self.skipped_logs.load(Ordering::Relaxed),
            initializations: self.initializations.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let metrics = TrackerMetrics::new();
        metrics.record_replay_accept();
        metrics.record_replay_accept();
        metrics.record_skipped_logs(0);
        metrics.record_skipped_logs(3);
        metrics.record_pruned_fallback();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.replay_accepts, 2);
        assert_eq!(snapshot.skipped_logs, 3);
        assert_eq!(snapshot.pruned_fallbacks, 1);
        assert_eq!(snapshot.full_refetches, 0);
    }
}
