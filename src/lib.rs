//! procwarden - process discovery, monitoring, and control engine.
//!
//! Reads kernel process metadata from the proc pseudo-filesystem,
//! derives per-process metrics (resident memory, lifetime-average CPU
//! usage, a time-windowed memory history), flags abnormal memory
//! growth, and issues lifecycle signals and priority changes.
//!
//! The engine renders nothing: presentation layers call the
//! query/command methods on [`ProcessEngine`] and subscribe to its
//! [`EngineEvent`] stream.
//!
//! # Usage
//!
//! ```no_run
//! use procwarden::{ProcessEngine, DEFAULT_REFRESH_INTERVAL};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let engine = ProcessEngine::new("/proc");
//! let mut events = engine.subscribe();
//!
//! engine.start(DEFAULT_REFRESH_INTERVAL);
//! if let Ok(event) = events.recv().await {
//!     println!("{:?}", event);
//! }
//! engine.stop();
//! # }
//! ```

pub mod engine;
pub mod events;
pub mod process;
pub mod system;

// Re-export the public engine surface for convenience
pub use engine::{ProcessEngine, DEFAULT_REFRESH_INTERVAL};
pub use events::EngineEvent;
pub use process::control::{ProcessControl, TerminationMethod};
pub use process::history::MemorySample;
pub use process::snapshot::{ProcessSnapshot, RunState};
