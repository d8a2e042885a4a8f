//! Reconciliation subsystem.
//!
//! # Data Flow
//! ```text
//! trigger sources (startup, SIGHUP, watcher.rs, admin)
//!     → trigger.rs (single-slot queue, coalescing)
//!     → reconciler.rs (one pass at a time)
//!         → scanner.rs (eligible files)
//!         → resource decoder + classifier
//!         → snapshot builder (version from the shared counter)
//!         → store.set on success, log on failure
//! ```
//!
//! # Design Decisions
//! - The reconciler is the only writer into the store for its group
//! - File-level and consistency failures never escalate beyond the pass
//! - The version counter advances once per attempt

pub mod reconciler;
pub mod scanner;
pub mod trigger;
pub mod watcher;

pub use reconciler::{Outcome, ReconcileReport, Reconciler};
pub use trigger::{reconcile_channel, Fired, ReconcileTrigger, ReconcileWorker, TriggerReason};
pub use watcher::DirectoryWatcher;
