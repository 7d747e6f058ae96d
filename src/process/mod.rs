//! Process-level readers, heuristics, and control primitives.
//!
//! This module provides:
//! - `snapshot`: point-in-time reads of one process entry
//! - `scanner`: discovery of candidate pids under the proc root
//! - `history`: bounded, time-windowed memory samples per pid
//! - `leak`: the abnormal-growth heuristic over a history
//! - `control`: signal delivery and priority changes
//! - `focus`: focus-mode reprioritization over a snapshot set

pub mod control;
pub mod focus;
pub mod history;
pub mod leak;
pub mod scanner;
pub mod snapshot;

// Re-export commonly used types
pub use control::{
    KernelControl, LifecycleController, ProcessControl, TerminationMethod, NICE_MAX, NICE_MIN,
};
pub use history::{HistoryStore, MemorySample, HISTORY_MAX_SAMPLES, HISTORY_WINDOW_MS};
pub use leak::LEAK_THRESHOLD_MB;
pub use scanner::{collect_candidate_pids, scan_processes};
pub use snapshot::{is_valid_pid, read_snapshot, ProcessSnapshot, RunState, SnapshotError};
