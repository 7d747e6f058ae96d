//! The process-management engine: discovery, the snapshot cache, the
//! refresh scheduler, and the public query/command surface.
//!
//! The cache is a copy-on-write value: every refresh cycle builds a
//! complete new snapshot set and swaps it in wholesale, so readers
//! always see a consistent pass and never a partially updated one.
//! Control operations bypass the cache entirely - they act on the OS by
//! identifier and may run concurrently with a refresh tick.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};

use ahash::AHashSet;
use chrono::Utc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::events::{self, EngineEvent};
use crate::process::control::{
    KernelControl, LifecycleController, ProcessControl, TerminationMethod,
};
use crate::process::focus;
use crate::process::history::HistoryStore;
use crate::process::leak;
use crate::process::scanner;
use crate::process::snapshot::{self, ProcessSnapshot, SnapshotError};

/// Default refresh period for the periodic scheduler.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_millis(2000);

/// State shared between the refresh task and direct callers.
struct EngineShared {
    proc_root: PathBuf,
    cache: RwLock<Arc<Vec<ProcessSnapshot>>>,
    history: HistoryStore,
    controller: LifecycleController,
    focus_enabled: AtomicBool,
    events: broadcast::Sender<EngineEvent>,
}

impl EngineShared {
    /// One process read with history attachment and leak evaluation
    /// running inline, exactly as on the scan path.
    fn read_enriched(&self, pid: i32) -> Result<ProcessSnapshot, SnapshotError> {
        let mut snap = snapshot::read_snapshot(&self.proc_root, pid)?;
        let now_ms = Utc::now().timestamp_millis();
        snap.memory_history = self.history.record(pid, now_ms, snap.memory_mb);

        if let Some(growth_mb) = leak::evaluate(&snap.memory_history) {
            snap.leak_suspected = true;
            warn!(
                "Process {} ({}) grew {:.1} MB inside the sampling window",
                snap.pid, snap.name, growth_mb
            );
            let _ = self.events.send(EngineEvent::MemoryLeakDetected {
                pid: snap.pid,
                name: snap.name.clone(),
                growth_mb,
            });
        }

        Ok(snap)
    }

    /// One full refresh cycle: discover, sweep stale history, swap the
    /// cache, run the focus pass if enabled, publish the update.
    fn scan_cycle(&self) -> Arc<Vec<ProcessSnapshot>> {
        let started = Instant::now();
        let snapshots = scanner::scan_processes(&self.proc_root, |pid| self.read_enriched(pid));

        let alive: AHashSet<i32> = snapshots.iter().map(|s| s.pid).collect();
        self.history.sweep_after_scan(&alive);

        let fresh = Arc::new(snapshots);
        {
            let mut cache = self.cache.write().expect("cache lock poisoned");
            *cache = fresh.clone();
        }

        if self.focus_enabled.load(Ordering::Relaxed) {
            focus::optimize(&fresh, &self.controller);
        }

        debug!(
            "Discovery pass found {} processes in {:.1} ms",
            fresh.len(),
            started.elapsed().as_secs_f64() * 1000.0
        );
        let _ = self
            .events
            .send(EngineEvent::ProcessesUpdated(fresh.clone()));
        fresh
    }

    fn cached(&self) -> Arc<Vec<ProcessSnapshot>> {
        self.cache.read().expect("cache lock poisoned").clone()
    }
}

/// Process discovery, monitoring, and control engine.
///
/// Queries and commands are synchronous; the periodic refresh runs on a
/// spawned task and publishes through the event channel. `start` and
/// `stop` therefore need a Tokio runtime, everything else does not.
pub struct ProcessEngine {
    shared: Arc<EngineShared>,
    refresh_task: Mutex<Option<JoinHandle<()>>>,
}

impl ProcessEngine {
    /// Engine over the real kernel interfaces.
    pub fn new(proc_root: impl Into<PathBuf>) -> Self {
        Self::with_control(proc_root, Arc::new(KernelControl))
    }

    /// Engine with a substituted control seam.
    pub fn with_control(proc_root: impl Into<PathBuf>, control: Arc<dyn ProcessControl>) -> Self {
        let proc_root = proc_root.into();
        let shared = Arc::new(EngineShared {
            controller: LifecycleController::new(proc_root.clone(), control),
            proc_root,
            cache: RwLock::new(Arc::new(Vec::new())),
            history: HistoryStore::new(),
            focus_enabled: AtomicBool::new(false),
            events: events::channel(),
        });
        Self {
            shared,
            refresh_task: Mutex::new(None),
        }
    }

    /// Subscribes to engine notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.shared.events.subscribe()
    }

    /// The most recent full snapshot set. Empty until the first scan.
    pub fn cached(&self) -> Arc<Vec<ProcessSnapshot>> {
        self.shared.cached()
    }

    /// Runs one full discovery pass now and returns the new set. The
    /// cache is replaced and the updated event emitted, the same as a
    /// scheduler tick.
    pub fn scan(&self) -> Arc<Vec<ProcessSnapshot>> {
        self.shared.scan_cycle()
    }

    /// Reads a single process, updating its history inline. None when
    /// the pid is invalid, gone, or unreadable.
    pub fn get_process(&self, pid: i32) -> Option<ProcessSnapshot> {
        match self.shared.read_enriched(pid) {
            Ok(snap) => Some(snap),
            Err(SnapshotError::InvalidPid(pid)) => {
                warn!("Invalid pid requested: {}", pid);
                None
            }
            Err(SnapshotError::NotFound(pid)) => {
                debug!("Process {} no longer exists", pid);
                None
            }
            Err(e) => {
                warn!("Error reading process {}: {}", pid, e);
                None
            }
        }
    }

    /// Issues a termination signal and publishes the outcome.
    pub fn terminate(&self, pid: i32, method: TerminationMethod) -> bool {
        let success = self.shared.controller.terminate(pid, method);
        let _ = self
            .shared
            .events
            .send(EngineEvent::ProcessTerminated { pid, success });
        success
    }

    pub fn suspend(&self, pid: i32) -> bool {
        self.shared.controller.suspend(pid)
    }

    pub fn resume(&self, pid: i32) -> bool {
        self.shared.controller.resume(pid)
    }

    pub fn set_priority(&self, pid: i32, nice: i32) -> bool {
        self.shared.controller.set_priority(pid, nice)
    }

    pub fn focus_mode(&self) -> bool {
        self.shared.focus_enabled.load(Ordering::Relaxed)
    }

    /// Enables or disables focus mode. Enabling applies one pass over
    /// the current cache immediately and on every refresh thereafter;
    /// disabling renices every cached process back to 0. A call that
    /// does not change the state is a no-op.
    pub fn set_focus_mode(&self, enabled: bool) {
        let previous = self.shared.focus_enabled.swap(enabled, Ordering::Relaxed);
        if previous == enabled {
            return;
        }

        if enabled {
            info!("Focus mode enabled");
            focus::optimize(&self.shared.cached(), &self.shared.controller);
        } else {
            info!("Focus mode disabled, restoring priorities");
            focus::reset(&self.shared.cached(), &self.shared.controller);
        }

        let _ = self
            .shared
            .events
            .send(EngineEvent::FocusModeChanged { enabled });
    }

    /// Starts the periodic refresh, replacing any running schedule.
    /// Must be called inside a Tokio runtime.
    pub fn start(&self, interval: Duration) {
        let mut guard = self.refresh_task.lock().expect("refresh task lock poisoned");
        if let Some(task) = guard.take() {
            task.abort();
        }

        info!("Starting periodic refresh every {} ms", interval.as_millis());
        let shared = self.shared.clone();
        *guard = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                shared.scan_cycle();
            }
        }));
    }

    /// Stops the periodic refresh; a no-op when none is running.
    pub fn stop(&self) {
        let mut guard = self.refresh_task.lock().expect("refresh task lock poisoned");
        if let Some(task) = guard.take() {
            task.abort();
            info!("Stopped periodic refresh");
        }
    }
}

impl Drop for ProcessEngine {
    fn drop(&mut self) {
        self.stop();
    }
}
