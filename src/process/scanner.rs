//! Process discovery: enumerating candidate pids under the proc root.

use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use super::snapshot::{is_valid_pid, ProcessSnapshot, SnapshotError};

/// Enumerates candidate process identifiers under `proc_root`.
///
/// An entry qualifies only when its name is all digits and parses to a
/// pid inside the valid range. Ordering follows raw directory
/// enumeration order, not numeric order. Failure to open the root
/// itself yields an empty result.
pub fn collect_candidate_pids(proc_root: &Path) -> Vec<i32> {
    let mut out = Vec::new();

    let entries = match fs::read_dir(proc_root) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Failed to open {}: {}", proc_root.display(), e);
            return out;
        }
    };

    for entry in entries.flatten() {
        let name = entry.file_name();
        let name = match name.to_str() {
            Some(v) => v,
            None => continue,
        };
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }
        let pid: i32 = match name.parse() {
            Ok(v) => v,
            Err(_) => continue,
        };
        if !is_valid_pid(pid) {
            continue;
        }
        out.push(pid);
    }

    out
}

/// Runs one discovery pass: enumerate candidates and read each through
/// `read`, dropping entries that fail.
///
/// A pid vanishing between enumeration and read surfaces as `NotFound`
/// from the reader and is skipped exactly like one that never existed;
/// no per-entry failure aborts the pass.
pub fn scan_processes<F>(proc_root: &Path, mut read: F) -> Vec<ProcessSnapshot>
where
    F: FnMut(i32) -> Result<ProcessSnapshot, SnapshotError>,
{
    let mut snapshots = Vec::new();

    for pid in collect_candidate_pids(proc_root) {
        match read(pid) {
            Ok(snap) => snapshots.push(snap),
            Err(SnapshotError::NotFound(pid)) => {
                debug!("Process {} vanished between enumeration and read", pid);
            }
            Err(e) => {
                debug!("Skipping process entry: {}", e);
            }
        }
    }

    snapshots
}
