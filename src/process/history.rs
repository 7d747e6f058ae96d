//! Bounded, time-windowed memory history per process identifier.
//!
//! Every successful process read appends one `(timestamp, resident MB)`
//! sample. The retained sequence is trimmed to a sliding window relative
//! to its newest sample and capped at a fixed number of entries, so a
//! single identifier can never grow its history without bound.

use std::sync::atomic::{AtomicU32, Ordering};

use ahash::AHashSet;
use dashmap::DashMap;
use serde::Serialize;

/// Maximum retained samples per process.
pub const HISTORY_MAX_SAMPLES: usize = 30;

/// Retention window in milliseconds, relative to the newest sample.
pub const HISTORY_WINDOW_MS: i64 = 60_000;

/// Full scans between sweeps of identifiers that stopped appearing.
const SWEEP_EVERY_N_SCANS: u32 = 10;

/// A single (timestamp, resident memory) observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MemorySample {
    /// Milliseconds since the Unix epoch.
    pub timestamp_ms: i64,
    /// Resident set size in megabytes at that instant.
    pub memory_mb: f64,
}

/// Per-identifier sample store.
///
/// Shared between the refresh worker and on-demand single-process reads;
/// each key is only ever appended to in timestamp order.
#[derive(Debug, Default)]
pub struct HistoryStore {
    entries: DashMap<i32, Vec<MemorySample>>,
    scans_since_sweep: AtomicU32,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a sample for `pid`, trims the window, caps the length,
    /// and returns a copy of the retained sequence (newest last).
    pub fn record(&self, pid: i32, timestamp_ms: i64, memory_mb: f64) -> Vec<MemorySample> {
        let mut entry = self.entries.entry(pid).or_default();
        let samples = entry.value_mut();

        samples.push(MemorySample {
            timestamp_ms,
            memory_mb,
        });

        let newest = samples[samples.len() - 1].timestamp_ms;
        samples.retain(|s| newest - s.timestamp_ms <= HISTORY_WINDOW_MS);

        if samples.len() > HISTORY_MAX_SAMPLES {
            let excess = samples.len() - HISTORY_MAX_SAMPLES;
            samples.drain(..excess);
        }

        samples.clone()
    }

    /// Called once per completed discovery pass with the set of pids
    /// observed. The actual sweep only runs every
    /// `SWEEP_EVERY_N_SCANS` calls; single-pid reads never trigger it.
    pub fn sweep_after_scan(&self, alive: &AHashSet<i32>) {
        let scans = self.scans_since_sweep.fetch_add(1, Ordering::Relaxed) + 1;
        if scans % SWEEP_EVERY_N_SCANS != 0 {
            return;
        }
        self.entries.retain(|pid, _| alive.contains(pid));
    }

    /// Whether any samples are retained for `pid`.
    pub fn contains(&self, pid: i32) -> bool {
        self.entries.contains_key(&pid)
    }

    /// Number of identifiers currently tracked.
    pub fn tracked(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_returns_appended_sequence() {
        let store = HistoryStore::new();
        store.record(1, 1_000, 10.0);
        let history = store.record(1, 3_000, 12.0);

        assert_eq!(history.len(), 2);
        assert_eq!(history[0].timestamp_ms, 1_000);
        assert_eq!(history[1].timestamp_ms, 3_000);
        assert_eq!(history[1].memory_mb, 12.0);
    }

    #[test]
    fn history_caps_at_max_samples_newest_last() {
        let store = HistoryStore::new();
        let mut last = Vec::new();
        // 2-second cadence keeps every sample inside the window, so the
        // count cap is the only limit exercised here.
        for i in 0..40 {
            last = store.record(7, i * 2_000, i as f64);
        }

        assert_eq!(last.len(), HISTORY_MAX_SAMPLES);
        assert_eq!(last[0].memory_mb, 10.0);
        assert_eq!(last[last.len() - 1].memory_mb, 39.0);
    }

    #[test]
    fn samples_older_than_window_are_dropped() {
        let store = HistoryStore::new();
        store.record(2, 0, 1.0);
        store.record(2, 30_000, 2.0);
        let history = store.record(2, 70_000, 3.0);

        // The t=0 sample is 70s older than the newest and falls out;
        // t=30_000 is exactly 40s old and stays.
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].timestamp_ms, 30_000);
        assert_eq!(history[1].timestamp_ms, 70_000);
    }

    #[test]
    fn sample_exactly_at_window_edge_is_retained() {
        let store = HistoryStore::new();
        store.record(3, 0, 1.0);
        let history = store.record(3, HISTORY_WINDOW_MS, 2.0);

        assert_eq!(history.len(), 2);
    }

    #[test]
    fn sweep_runs_only_every_tenth_scan() {
        let store = HistoryStore::new();
        store.record(1, 0, 1.0);
        store.record(2, 0, 1.0);

        let mut alive = AHashSet::default();
        alive.insert(1);

        for _ in 0..9 {
            store.sweep_after_scan(&alive);
            assert!(store.contains(2));
        }
        store.sweep_after_scan(&alive);

        assert!(store.contains(1));
        assert!(!store.contains(2));
        assert_eq!(store.tracked(), 1);
    }
}
