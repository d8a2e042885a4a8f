//! Startup helpers.
//!
//! # Design Decisions
//! - A PID file that cannot be written is a warning, not a startup failure
//! - Listener binding stays fatal and lives in `net::listener`

use std::path::Path;

/// Write the current process id, newline-terminated.
pub fn write_pid_file(path: &Path) -> std::io::Result<()> {
    std::fs::write(path, format!("{}\n", std::process::id()))
}

/// Write the PID file, logging instead of failing.
pub fn record_pid(path: &Path) {
    match write_pid_file(path) {
        Ok(()) => tracing::info!(path = %path.display(), pid = std::process::id(), "PID file written"),
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "Could not write PID file"),
    }
}

/// Best-effort removal on shutdown.
pub fn remove_pid_file(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::debug!(path = %path.display(), error = %e, "Could not remove PID file");
        }
    }
}
