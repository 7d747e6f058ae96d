//! Point-in-time process reads from the proc pseudo-filesystem.
//!
//! One call reads one process entry: name from `comm`, resident memory
//! from `status`, and run state, nice value, and CPU tick counters from
//! the whitespace-split `stat` line. Only the name is mandatory - every
//! other field degrades to a documented default so a half-readable entry
//! still produces a usable snapshot.

use std::fs;
use std::path::Path;

use serde::Serialize;
use thiserror::Error;

use crate::process::history::MemorySample;
use crate::system::{read_uptime, CLK_TCK};

/// Lowest valid process identifier.
pub const PID_MIN: i32 = 1;

/// Exclusive upper bound for process identifiers.
pub const PID_MAX: i32 = 65536;

/// Failure reading a single process entry.
///
/// Callers scanning many entries treat any of these as "drop this one
/// entry"; none of them aborts a batch.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Identifier outside the accepted range, rejected before any I/O.
    #[error("pid {0} outside valid range")]
    InvalidPid(i32),

    /// The process directory is gone (or never existed).
    #[error("process {0} no longer exists")]
    NotFound(i32),

    /// A mandatory field could not be read.
    #[error("failed to read {path}: {reason}")]
    Read { path: String, reason: String },
}

/// Run state derived from the third field of the stat line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunState {
    Running,
    Suspended,
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunState::Running => write!(f, "running"),
            RunState::Suspended => write!(f, "suspended"),
        }
    }
}

/// Point-in-time view of one process.
///
/// Produced fresh on every discovery pass; no identity persists across
/// snapshots beyond the pid value. `memory_history` and
/// `leak_suspected` are attached by the engine's read path after the
/// raw read succeeds.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessSnapshot {
    pub pid: i32,
    /// Trimmed command name, never empty.
    pub name: String,
    /// Resident set size in megabytes; 0.0 when unavailable.
    pub memory_mb: f64,
    /// Lifetime-average CPU usage, clamped to [0, 100].
    pub cpu_percent: f64,
    pub state: RunState,
    /// Scheduling nice value, [-20, 19]; 0 when unreadable.
    pub nice: i32,
    /// Set when the retained history trips the leak heuristic.
    pub leak_suspected: bool,
    /// Windowed memory samples, chronological, newest last.
    pub memory_history: Vec<MemorySample>,
}

/// Whether `pid` lies inside the accepted identifier range.
pub fn is_valid_pid(pid: i32) -> bool {
    (PID_MIN..PID_MAX).contains(&pid)
}

/// Reads one process entry under `proc_root`.
///
/// `memory_history` is empty and `leak_suspected` false on the returned
/// value; history tracking runs inline in the engine's read path, not
/// here.
pub fn read_snapshot(proc_root: &Path, pid: i32) -> Result<ProcessSnapshot, SnapshotError> {
    if !is_valid_pid(pid) {
        return Err(SnapshotError::InvalidPid(pid));
    }

    let proc_path = proc_root.join(pid.to_string());
    if !proc_path.is_dir() {
        return Err(SnapshotError::NotFound(pid));
    }

    let name = read_name(&proc_path)?;
    let memory_mb = read_memory_mb(&proc_path);
    let stat = read_stat_fields(&proc_path);
    let uptime = read_uptime(proc_root).ok();
    let cpu_percent = cpu_percent(stat.utime_ticks, stat.stime_ticks, uptime);

    Ok(ProcessSnapshot {
        pid,
        name,
        memory_mb,
        cpu_percent,
        state: stat.state,
        nice: stat.nice,
        leak_suspected: false,
        memory_history: Vec::new(),
    })
}

/// Reads and trims the command name; empty or unreadable is a hard
/// failure for the whole entry.
fn read_name(proc_path: &Path) -> Result<String, SnapshotError> {
    let comm = proc_path.join("comm");
    let content = fs::read_to_string(&comm).map_err(|e| SnapshotError::Read {
        path: comm.display().to_string(),
        reason: e.to_string(),
    })?;

    let name = content.trim();
    if name.is_empty() {
        return Err(SnapshotError::Read {
            path: comm.display().to_string(),
            reason: "empty process name".into(),
        });
    }
    Ok(name.to_string())
}

/// Parses the `VmRSS:` line ("VmRSS:    1234 kB") into megabytes.
/// Missing field or unreadable file falls back to 0.0.
fn read_memory_mb(proc_path: &Path) -> f64 {
    let content = match fs::read_to_string(proc_path.join("status")) {
        Ok(c) => c,
        Err(_) => return 0.0,
    };

    for line in content.lines() {
        if let Some(rest) = line.strip_prefix("VmRSS:") {
            if let Some(kb) = rest
                .split_whitespace()
                .next()
                .and_then(|v| v.parse::<u64>().ok())
            {
                return kb as f64 / 1024.0;
            }
            break;
        }
    }
    0.0
}

/// Fields pulled from the whitespace-split stat line.
struct StatFields {
    state: RunState,
    nice: i32,
    utime_ticks: f64,
    stime_ticks: f64,
}

/// stat layout (1-based): field 3 = state, 14/15 = utime/stime in clock
/// ticks, 19 = nice. Anything missing or unparsable takes its default.
fn read_stat_fields(proc_path: &Path) -> StatFields {
    let fallback = StatFields {
        state: RunState::Running,
        nice: 0,
        utime_ticks: 0.0,
        stime_ticks: 0.0,
    };

    let content = match fs::read_to_string(proc_path.join("stat")) {
        Ok(c) => c,
        Err(_) => return fallback,
    };
    let parts: Vec<&str> = content.split_whitespace().collect();

    let state = match parts.get(2) {
        Some(&"T") | Some(&"t") => RunState::Suspended,
        _ => RunState::Running,
    };
    let nice = parts
        .get(18)
        .and_then(|v| v.parse::<i32>().ok())
        .unwrap_or(0);
    let utime_ticks = parts
        .get(13)
        .and_then(|v| v.parse::<f64>().ok())
        .unwrap_or(0.0);
    let stime_ticks = parts
        .get(14)
        .and_then(|v| v.parse::<f64>().ok())
        .unwrap_or(0.0);

    StatFields {
        state,
        nice,
        utime_ticks,
        stime_ticks,
    }
}

/// Lifetime-average CPU usage: total CPU seconds over system uptime.
///
/// Recomputed from scratch on every call - this is not a delta-sampled
/// instantaneous rate. Returns 0.0 when uptime or the tick rate is
/// unavailable or non-positive; the result is clamped to [0, 100] so
/// overflow-prone counters cannot push it out of range.
fn cpu_percent(utime_ticks: f64, stime_ticks: f64, uptime_seconds: Option<f64>) -> f64 {
    let uptime = match uptime_seconds {
        Some(u) if u > 0.0 => u,
        _ => return 0.0,
    };
    let ticks_per_sec = *CLK_TCK;
    if ticks_per_sec <= 0.0 {
        return 0.0;
    }

    let cpu_seconds = (utime_ticks + stime_ticks) / ticks_per_sec;
    ((cpu_seconds / uptime) * 100.0).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{tempdir, TempDir};

    /// Lays out a minimal process entry under a fake proc root.
    fn fake_proc_entry(pid: i32, comm: &str, status: &str, stat: &str) -> TempDir {
        let root = tempdir().expect("Failed to create temp dir");
        let dir = root.path().join(pid.to_string());
        std::fs::create_dir(&dir).expect("Failed to create pid dir");
        std::fs::write(dir.join("comm"), comm).expect("Failed to write comm");
        std::fs::write(dir.join("status"), status).expect("Failed to write status");
        std::fs::write(dir.join("stat"), stat).expect("Failed to write stat");
        std::fs::write(root.path().join("uptime"), "100.00 50.00\n")
            .expect("Failed to write uptime");
        root
    }

    fn stat_line(pid: i32, state: &str, utime: u64, stime: u64, nice: i64) -> String {
        format!(
            "{pid} (test) {state} 1 {pid} {pid} 0 -1 4194304 100 0 0 0 {utime} {stime} 0 0 20 {nice} 1 0 12345 12345678 1234 0 0 0 0 0 0 0 0 0 17 1 0 0 0 0 0"
        )
    }

    #[test]
    fn test_read_snapshot_full_entry() {
        let root = fake_proc_entry(
            42,
            "myproc\n",
            "Name:\tmyproc\nUid:\t1000\t1000\t1000\t1000\nVmRSS:\t   2048 kB\n",
            &stat_line(42, "S", 1000, 500, 5),
        );

        let snap = read_snapshot(root.path(), 42).unwrap();
        assert_eq!(snap.pid, 42);
        assert_eq!(snap.name, "myproc");
        assert_eq!(snap.memory_mb, 2.0);
        assert_eq!(snap.state, RunState::Running);
        assert_eq!(snap.nice, 5);
        assert!(!snap.leak_suspected);
        assert!(snap.memory_history.is_empty());

        // 1500 ticks over 100s of uptime.
        let expected = ((1500.0 / *CLK_TCK) / 100.0) * 100.0;
        assert!((snap.cpu_percent - expected).abs() < 0.001);
    }

    #[test]
    fn test_invalid_pid_rejected_without_io() {
        // Root does not even exist - a range failure must come first.
        let bogus = Path::new("/nonexistent-proc-root");
        assert!(matches!(
            read_snapshot(bogus, 0),
            Err(SnapshotError::InvalidPid(0))
        ));
        assert!(matches!(
            read_snapshot(bogus, -7),
            Err(SnapshotError::InvalidPid(-7))
        ));
        assert!(matches!(
            read_snapshot(bogus, 65536),
            Err(SnapshotError::InvalidPid(65536))
        ));
    }

    #[test]
    fn test_boundary_pids_pass_validation() {
        assert!(is_valid_pid(1));
        assert!(is_valid_pid(65535));
        assert!(!is_valid_pid(0));
        assert!(!is_valid_pid(65536));
    }

    #[test]
    fn test_missing_directory_is_not_found() {
        let root = tempdir().expect("Failed to create temp dir");
        assert!(matches!(
            read_snapshot(root.path(), 500),
            Err(SnapshotError::NotFound(500))
        ));
    }

    #[test]
    fn test_missing_comm_is_read_error() {
        let root = tempdir().expect("Failed to create temp dir");
        std::fs::create_dir(root.path().join("99")).expect("Failed to create pid dir");

        assert!(matches!(
            read_snapshot(root.path(), 99),
            Err(SnapshotError::Read { .. })
        ));
    }

    #[test]
    fn test_empty_comm_is_read_error() {
        let root = fake_proc_entry(10, "  \n", "VmRSS:\t100 kB\n", &stat_line(10, "S", 0, 0, 0));
        assert!(matches!(
            read_snapshot(root.path(), 10),
            Err(SnapshotError::Read { .. })
        ));
    }

    #[test]
    fn test_missing_memory_field_defaults_to_zero() {
        let root = fake_proc_entry(
            11,
            "noswap\n",
            "Name:\tnoswap\nUid:\t0\t0\t0\t0\n",
            &stat_line(11, "S", 0, 0, 0),
        );

        let snap = read_snapshot(root.path(), 11).unwrap();
        assert_eq!(snap.memory_mb, 0.0);
    }

    #[test]
    fn test_stopped_state_maps_to_suspended() {
        for state in ["T", "t"] {
            let root = fake_proc_entry(
                12,
                "stopped\n",
                "VmRSS:\t512 kB\n",
                &stat_line(12, state, 0, 0, 0),
            );
            let snap = read_snapshot(root.path(), 12).unwrap();
            assert_eq!(snap.state, RunState::Suspended);
        }
    }

    #[test]
    fn test_unreadable_stat_defaults() {
        let root = tempdir().expect("Failed to create temp dir");
        let dir = root.path().join("13");
        std::fs::create_dir(&dir).expect("Failed to create pid dir");
        std::fs::write(dir.join("comm"), "bare\n").expect("Failed to write comm");

        let snap = read_snapshot(root.path(), 13).unwrap();
        assert_eq!(snap.state, RunState::Running);
        assert_eq!(snap.nice, 0);
        assert_eq!(snap.cpu_percent, 0.0);
        assert_eq!(snap.memory_mb, 0.0);
    }

    #[test]
    fn test_cpu_percent_clamped_for_overflowing_counters() {
        assert_eq!(cpu_percent(f64::MAX, f64::MAX, Some(1.0)), 100.0);
        assert_eq!(cpu_percent(1e18, 1e18, Some(0.001)), 100.0);
    }

    #[test]
    fn test_cpu_percent_zero_without_uptime() {
        assert_eq!(cpu_percent(1000.0, 1000.0, None), 0.0);
        assert_eq!(cpu_percent(1000.0, 1000.0, Some(0.0)), 0.0);
        assert_eq!(cpu_percent(1000.0, 1000.0, Some(-5.0)), 0.0);
    }

    #[test]
    fn test_cpu_percent_never_negative() {
        assert_eq!(cpu_percent(-100.0, 0.0, Some(10.0)), 0.0);
    }
}
