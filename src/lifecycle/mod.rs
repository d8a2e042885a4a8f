//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs, startup.rs):
//!     Config → Logging → Metrics → Store/Engine → Bind → PID file
//!         → Initial reconcile → Watcher → Signal loop
//!
//! Signals (signals.rs):
//!     SIGHUP → reconcile trigger
//!     SIGTERM/SIGINT → shutdown
//!
//! Shutdown (shutdown.rs):
//!     Broadcast → servers stop accepting → sessions end → drain with grace
//! ```

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use signals::{run_signal_loop, SignalAction, Signals};
