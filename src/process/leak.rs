//! Memory-leak heuristic over a process's retained history.

use super::history::{MemorySample, HISTORY_WINDOW_MS};

/// Growth a process must exceed inside the window before it is suspect.
pub const LEAK_THRESHOLD_MB: f64 = 100.0;

/// Fraction of the window a sample must span to serve as the rate-test
/// baseline.
const BASELINE_AGE_FRACTION: f64 = 0.8;

/// Evaluates the leak heuristic over a trimmed, chronological history.
///
/// Returns the growth to report when the history looks like a leak.
/// The rate test picks its own baseline - the first sample aged at
/// least 80% of the window, falling back to the oldest - while the
/// reported magnitude always measures current memory against the oldest
/// retained sample. The two baselines are kept separate on purpose.
pub fn evaluate(history: &[MemorySample]) -> Option<f64> {
    if history.len() < 2 {
        return None;
    }

    let newest = history[history.len() - 1];
    let min_age_ms = (HISTORY_WINDOW_MS as f64 * BASELINE_AGE_FRACTION) as i64;

    let mut baseline = history[0];
    for sample in history {
        if newest.timestamp_ms - sample.timestamp_ms >= min_age_ms {
            baseline = *sample;
            break;
        }
    }

    let growth_mb = newest.memory_mb - baseline.memory_mb;
    let span_ms = newest.timestamp_ms - baseline.timestamp_ms;
    if span_ms <= 0 || growth_mb <= LEAK_THRESHOLD_MB {
        return None;
    }

    // Growth over a partial span is scaled to a full-window-equivalent
    // rate before the threshold re-test.
    let normalized_mb = growth_mb * HISTORY_WINDOW_MS as f64 / span_ms as f64;
    if normalized_mb <= LEAK_THRESHOLD_MB {
        return None;
    }

    Some(newest.memory_mb - history[0].memory_mb)
}
