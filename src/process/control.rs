//! Lifecycle control: termination, suspension, resumption, and priority
//! changes, validated before anything reaches the kernel.
//!
//! All operations are synchronous and single-attempt. A return value of
//! `true` means the kernel accepted the request - whether the target
//! reacts (a process may ignore SIGTERM) only becomes visible on the
//! next discovery pass.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use tracing::{debug, info, warn};

use super::snapshot::is_valid_pid;

/// How a termination request should be delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationMethod {
    /// SIGTERM - the target may clean up or ignore it.
    Graceful,
    /// SIGKILL - immediate, non-interceptable.
    Force,
}

/// Lowest accepted nice value (highest scheduling priority).
pub const NICE_MIN: i32 = -20;

/// Highest accepted nice value (lowest scheduling priority).
pub const NICE_MAX: i32 = 19;

/// Seam between the controller and the kernel, so tests can observe
/// delivered signals and priority changes without touching real
/// processes.
pub trait ProcessControl: Send + Sync {
    fn send_signal(&self, pid: i32, signal: Signal) -> io::Result<()>;
    fn set_priority(&self, pid: i32, nice: i32) -> io::Result<()>;
    fn effective_uid(&self) -> u32;
}

/// Kernel-backed implementation used outside tests.
pub struct KernelControl;

impl ProcessControl for KernelControl {
    fn send_signal(&self, pid: i32, signal: Signal) -> io::Result<()> {
        signal::kill(Pid::from_raw(pid), signal).map_err(io::Error::from)
    }

    fn set_priority(&self, pid: i32, nice: i32) -> io::Result<()> {
        // SAFETY: setpriority takes its target by value and touches no
        // caller memory.
        let rc = unsafe { libc::setpriority(libc::PRIO_PROCESS as _, pid as libc::id_t, nice) };
        if rc == -1 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    fn effective_uid(&self) -> u32 {
        nix::unistd::geteuid().as_raw()
    }
}

/// Validates and issues process control requests.
///
/// Operates purely on the OS by identifier; never reads the engine
/// cache, so it is safe to call concurrently with a refresh pass.
pub struct LifecycleController {
    proc_root: PathBuf,
    control: Arc<dyn ProcessControl>,
}

impl LifecycleController {
    pub fn new(proc_root: PathBuf, control: Arc<dyn ProcessControl>) -> Self {
        Self { proc_root, control }
    }

    /// Sends the termination signal for `method`.
    pub fn terminate(&self, pid: i32, method: TerminationMethod) -> bool {
        if !self.may_signal(pid) {
            return false;
        }
        let signal = match method {
            TerminationMethod::Graceful => Signal::SIGTERM,
            TerminationMethod::Force => Signal::SIGKILL,
        };
        self.deliver(pid, signal)
    }

    /// Pauses the target with SIGSTOP.
    pub fn suspend(&self, pid: i32) -> bool {
        self.may_signal(pid) && self.deliver(pid, Signal::SIGSTOP)
    }

    /// Resumes a stopped target with SIGCONT.
    pub fn resume(&self, pid: i32) -> bool {
        self.may_signal(pid) && self.deliver(pid, Signal::SIGCONT)
    }

    /// Clamps `nice` into [-20, 19] and applies it. No ownership
    /// pre-check here - the kernel is the authority on renice rights.
    pub fn set_priority(&self, pid: i32, nice: i32) -> bool {
        if !is_valid_pid(pid) {
            warn!("Invalid pid for priority change: {}", pid);
            return false;
        }
        let clamped = nice.clamp(NICE_MIN, NICE_MAX);
        match self.control.set_priority(pid, clamped) {
            Ok(()) => {
                debug!("Set nice {} on process {}", clamped, pid);
                true
            }
            Err(e) => {
                debug!("Failed to set priority on process {}: {}", pid, e);
                false
            }
        }
    }

    fn deliver(&self, pid: i32, signal: Signal) -> bool {
        match self.control.send_signal(pid, signal) {
            Ok(()) => {
                info!("Sent {} to process {}", signal, pid);
                true
            }
            Err(e) => {
                warn!("Failed to send {} to process {}: {}", signal, pid, e);
                false
            }
        }
    }

    /// Range check plus ownership check: root may signal anything,
    /// other callers only processes whose status `Uid:` real uid equals
    /// the caller's effective uid. An unreadable status denies.
    fn may_signal(&self, pid: i32) -> bool {
        if !is_valid_pid(pid) {
            warn!("Invalid pid for signal delivery: {}", pid);
            return false;
        }
        let euid = self.control.effective_uid();
        if euid == 0 {
            return true;
        }
        match read_owner_uid(&self.proc_root, pid) {
            Some(uid) if uid == euid => true,
            Some(uid) => {
                debug!("Process {} owned by uid {}, not signalling", pid, uid);
                false
            }
            None => {
                debug!("Cannot determine owner of process {}", pid);
                false
            }
        }
    }
}

/// Parses the real uid (first value) from the status `Uid:` line.
fn read_owner_uid(proc_root: &Path, pid: i32) -> Option<u32> {
    let path = proc_root.join(pid.to_string()).join("status");
    let content = fs::read_to_string(path).ok()?;
    for line in content.lines() {
        if let Some(rest) = line.strip_prefix("Uid:") {
            return rest.split_whitespace().next()?.parse::<u32>().ok();
        }
    }
    None
}
