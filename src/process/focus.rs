//! Focus-mode prioritization: boost the presumed-active process, push
//! known background services down.
//!
//! "Focused" is a CPU-usage heuristic over the cached snapshots, not a
//! windowing-system query.

use tracing::debug;

use super::control::LifecycleController;
use super::snapshot::ProcessSnapshot;

/// Name fragments that mark a process as a background service
/// regardless of its resource profile.
const BACKGROUND_NAME_HINTS: &[&str] = &[
    "systemd", "kworker", "ksoftirqd", "kthreadd", "migration", "rcu_", "dbus", "udevd",
    "journald", "cron", "getty", "daemon",
];

/// Resource heuristic bounds for background classification.
const BACKGROUND_CPU_BELOW: f64 = 1.0;
const BACKGROUND_MEMORY_ABOVE_MB: f64 = 50.0;

/// Nice values applied while focus mode is active.
const FOCUSED_NICE: i32 = -10;
const BACKGROUND_NICE: i32 = 10;

/// True when the snapshot looks like a background service: a known
/// daemon name, or a large mostly-idle resident set.
pub fn is_background(snapshot: &ProcessSnapshot) -> bool {
    let name = snapshot.name.to_lowercase();
    if BACKGROUND_NAME_HINTS.iter().any(|hint| name.contains(hint)) {
        return true;
    }
    snapshot.cpu_percent < BACKGROUND_CPU_BELOW && snapshot.memory_mb > BACKGROUND_MEMORY_ABOVE_MB
}

/// Picks the focused pid: highest CPU% among non-background snapshots,
/// first encountered wins ties. None when nothing qualifies.
pub fn pick_focused(snapshots: &[ProcessSnapshot]) -> Option<i32> {
    let mut best: Option<(i32, f64)> = None;
    for snap in snapshots {
        if is_background(snap) {
            continue;
        }
        match best {
            Some((_, cpu)) if snap.cpu_percent <= cpu => {}
            _ => best = Some((snap.pid, snap.cpu_percent)),
        }
    }
    best.map(|(pid, _)| pid)
}

/// Applies one focus pass over a freshly replaced cache: focused gets
/// nice -10, background processes get +10, everything else is left
/// untouched. Individual renice failures are ignored.
pub fn optimize(snapshots: &[ProcessSnapshot], controller: &LifecycleController) {
    let focused = pick_focused(snapshots);
    if let Some(pid) = focused {
        debug!("Focus candidate: pid {}", pid);
        controller.set_priority(pid, FOCUSED_NICE);
    }
    for snap in snapshots {
        if is_background(snap) {
            controller.set_priority(snap.pid, BACKGROUND_NICE);
        }
    }
}

/// Clears focus adjustments: renices every cached process back to 0.
/// Individual failures are ignored.
pub fn reset(snapshots: &[ProcessSnapshot], controller: &LifecycleController) {
    for snap in snapshots {
        controller.set_priority(snap.pid, 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::snapshot::RunState;

    fn snap(pid: i32, name: &str, cpu_percent: f64, memory_mb: f64) -> ProcessSnapshot {
        ProcessSnapshot {
            pid,
            name: name.to_string(),
            memory_mb,
            cpu_percent,
            state: RunState::Running,
            nice: 0,
            leak_suspected: false,
            memory_history: Vec::new(),
        }
    }

    #[test]
    fn daemon_name_is_background_regardless_of_cpu() {
        assert!(is_background(&snap(1, "systemd-resolved", 95.0, 5.0)));
        assert!(is_background(&snap(2, "Journald-Worker", 80.0, 1.0)));
        assert!(is_background(&snap(3, "crond", 50.0, 2.0)));
    }

    #[test]
    fn idle_large_process_is_background() {
        assert!(is_background(&snap(4, "editor", 0.5, 120.0)));
    }

    #[test]
    fn active_or_small_process_is_not_background() {
        assert!(!is_background(&snap(5, "editor", 2.0, 120.0)));
        assert!(!is_background(&snap(6, "editor", 0.5, 10.0)));
    }

    #[test]
    fn focused_is_highest_cpu_non_background() {
        let cache = [
            snap(10, "systemd-udevd", 99.0, 5.0),
            snap(11, "editor", 12.0, 30.0),
            snap(12, "compiler", 70.0, 40.0),
        ];
        assert_eq!(pick_focused(&cache), Some(12));
    }

    #[test]
    fn focus_ties_keep_first_in_cache_order() {
        let cache = [
            snap(20, "alpha", 10.0, 1.0),
            snap(21, "beta", 10.0, 1.0),
        ];
        assert_eq!(pick_focused(&cache), Some(20));
    }

    #[test]
    fn all_background_yields_no_focus() {
        let cache = [
            snap(30, "kworker/0:1", 0.0, 0.0),
            snap(31, "idlehog", 0.2, 400.0),
        ];
        assert_eq!(pick_focused(&cache), None);
    }
}
