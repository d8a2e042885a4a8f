//! OS signal handling.
//!
//! # Responsibilities
//! - Register handlers for SIGTERM, SIGINT and SIGHUP
//! - Translate them into reconcile or shutdown actions
//!
//! # Design Decisions
//! - SIGHUP re-reads the resource directories, never the config file
//! - Streams are registered once and live as long as the loop, so a signal
//!   delivered while an earlier one is being handled is still seen
//! - The first SIGTERM/SIGINT ends the loop; draining is the caller's job

use crate::reconcile::{ReconcileTrigger, TriggerReason};

/// What a delivered signal asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalAction {
    Reconcile,
    Shutdown,
}

/// Installed signal streams.
#[cfg(unix)]
pub struct Signals {
    hangup: tokio::signal::unix::Signal,
    terminate: tokio::signal::unix::Signal,
    interrupt: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl Signals {
    pub fn install() -> std::io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};

        Ok(Self {
            hangup: signal(SignalKind::hangup())?,
            terminate: signal(SignalKind::terminate())?,
            interrupt: signal(SignalKind::interrupt())?,
        })
    }

    pub async fn next(&mut self) -> SignalAction {
        tokio::select! {
            _ = self.hangup.recv() => SignalAction::Reconcile,
            _ = self.terminate.recv() => SignalAction::Shutdown,
            _ = self.interrupt.recv() => SignalAction::Shutdown,
        }
    }
}

#[cfg(not(unix))]
pub struct Signals;

#[cfg(not(unix))]
impl Signals {
    pub fn install() -> std::io::Result<Self> {
        Ok(Self)
    }

    pub async fn next(&mut self) -> SignalAction {
        match tokio::signal::ctrl_c().await {
            Ok(()) => SignalAction::Shutdown,
            Err(e) => {
                tracing::error!(error = %e, "Ctrl-C handler failed");
                std::future::pending().await
            }
        }
    }
}

/// Handle signals until one asks for shutdown.
///
/// Returns an error only if handlers cannot be installed.
pub async fn run_signal_loop(trigger: ReconcileTrigger) -> std::io::Result<()> {
    let mut signals = Signals::install()?;
    loop {
        match signals.next().await {
            SignalAction::Reconcile => {
                tracing::info!("SIGHUP received, reconciling resource directories");
                trigger.fire(TriggerReason::Signal);
            }
            SignalAction::Shutdown => {
                tracing::info!("Shutdown signal received");
                return Ok(());
            }
        }
    }
}
