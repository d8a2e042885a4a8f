//! Coalescing reconciliation trigger.
//!
//! # Design Decisions
//! - Triggers go through a single-slot queue: one pass may be queued while
//!   another runs, everything beyond that is dropped as already covered
//! - A single worker owns the reconciler, so passes never overlap
//! - Passes run on the blocking pool (file I/O)

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, watch};

use crate::reconcile::reconciler::{ReconcileReport, Reconciler};

/// What asked for a reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerReason {
    Startup,
    Signal,
    FileChange,
    Admin,
}

impl std::fmt::Display for TriggerReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            TriggerReason::Startup => "startup",
            TriggerReason::Signal => "signal",
            TriggerReason::FileChange => "file_change",
            TriggerReason::Admin => "admin",
        })
    }
}

/// Result of firing a trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fired {
    /// A new pass was queued.
    Queued,
    /// A pass was already queued and will cover this request.
    Coalesced,
    /// The worker has stopped.
    Closed,
}

/// Cloneable handle used by signal, watcher and admin sources.
#[derive(Debug, Clone)]
pub struct ReconcileTrigger {
    tx: mpsc::Sender<TriggerReason>,
    reports: watch::Receiver<Option<Arc<ReconcileReport>>>,
}

impl ReconcileTrigger {
    /// Request a pass without waiting for it.
    pub fn fire(&self, reason: TriggerReason) -> Fired {
        match self.tx.try_send(reason) {
            Ok(()) => {
                tracing::debug!(reason = %reason, "Reconciliation queued");
                Fired::Queued
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::debug!(reason = %reason, "Reconciliation already queued, coalescing");
                Fired::Coalesced
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Fired::Closed,
        }
    }

    /// Report of the most recent completed pass.
    pub fn last_report(&self) -> Option<Arc<ReconcileReport>> {
        self.reports.borrow().clone()
    }

    /// Receiver that changes after every completed pass.
    pub fn reports(&self) -> watch::Receiver<Option<Arc<ReconcileReport>>> {
        self.reports.clone()
    }
}

/// Runs reconciliation passes one at a time.
pub struct ReconcileWorker {
    reconciler: Arc<Reconciler>,
    rx: mpsc::Receiver<TriggerReason>,
    reports: watch::Sender<Option<Arc<ReconcileReport>>>,
}

/// Create a trigger handle and the worker it feeds.
pub fn reconcile_channel(reconciler: Reconciler) -> (ReconcileTrigger, ReconcileWorker) {
    let (tx, rx) = mpsc::channel(1);
    let (reports_tx, reports_rx) = watch::channel(None);
    (
        ReconcileTrigger { tx, reports: reports_rx },
        ReconcileWorker {
            reconciler: Arc::new(reconciler),
            rx,
            reports: reports_tx,
        },
    )
}

impl ReconcileWorker {
    /// Process triggers until shutdown or until every trigger handle is gone.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            directories = ?self.reconciler.directories(),
            "Reconciliation worker started"
        );

        loop {
            let reason = tokio::select! {
                reason = self.rx.recv() => match reason {
                    Some(reason) => reason,
                    None => break,
                },
                _ = shutdown.recv() => {
                    tracing::info!("Reconciliation worker received shutdown signal");
                    break;
                }
            };

            tracing::info!(reason = %reason, "Reconciling");
            let reconciler = self.reconciler.clone();
            match tokio::task::spawn_blocking(move || reconciler.run()).await {
                Ok(report) => {
                    self.reports.send_replace(Some(Arc::new(report)));
                }
                Err(e) => {
                    tracing::error!(error = %e, "Reconciliation pass panicked");
                }
            }
        }

        tracing::info!("Reconciliation worker stopped");
    }
}
