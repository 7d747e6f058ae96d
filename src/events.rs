//! Engine notifications fanned out to subscribers.
//!
//! The presentation layer subscribes over a broadcast channel; slow
//! subscribers lose the oldest events rather than blocking the engine.

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::process::snapshot::ProcessSnapshot;

/// Buffered events per subscriber before laggards start losing them.
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Notifications published by the engine.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// A refresh cycle completed; carries the full new snapshot set.
    ProcessesUpdated(Arc<Vec<ProcessSnapshot>>),
    /// A termination request was issued, with its delivery outcome.
    ProcessTerminated { pid: i32, success: bool },
    /// A process's retained history tripped the leak heuristic.
    MemoryLeakDetected {
        pid: i32,
        name: String,
        growth_mb: f64,
    },
    /// Focus mode was switched on or off.
    FocusModeChanged { enabled: bool },
}

/// Creates the engine's event channel.
pub fn channel() -> broadcast::Sender<EngineEvent> {
    broadcast::channel(EVENT_CHANNEL_CAPACITY).0
}
