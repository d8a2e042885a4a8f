use std::collections::BTreeMap;

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::admin::AdminState;
use crate::distribution::SessionStatus;
use crate::reconcile::{Fired, Outcome, ReconcileReport, TriggerReason};
use crate::resource::ResourceKind;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub uptime_secs: u64,
    pub active_sessions: u64,
    pub groups: usize,
    pub last_reconcile: Option<ReconcileSummary>,
}

#[derive(Serialize)]
pub struct ReconcileSummary {
    pub version: String,
    pub committed: bool,
    pub reason: Option<String>,
    pub failed_files: Vec<String>,
    pub unrecognized: usize,
    pub duration_ms: u64,
}

impl From<&ReconcileReport> for ReconcileSummary {
    fn from(report: &ReconcileReport) -> Self {
        Self {
            version: report.version.to_string(),
            committed: report.committed(),
            reason: match &report.outcome {
                Outcome::Committed => None,
                Outcome::Rejected { reason } => Some(reason.clone()),
            },
            failed_files: report.failed_files.iter().map(|p| p.display().to_string()).collect(),
            unrecognized: report.unrecognized,
            duration_ms: report.duration.as_millis() as u64,
        }
    }
}

#[derive(Serialize)]
pub struct SnapshotSummary {
    pub group: String,
    pub version: String,
    /// Resource count per kind, keyed by wire name.
    pub counts: BTreeMap<&'static str, usize>,
}

#[derive(Serialize)]
pub struct ReconcileAccepted {
    pub result: &'static str,
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    let last = state.trigger.last_report();
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        uptime_secs: state.started.elapsed().as_secs(),
        active_sessions: state.engine.active_sessions(),
        groups: state.engine.store().len(),
        last_reconcile: last.as_deref().map(ReconcileSummary::from),
    })
}

pub async fn get_snapshots(State(state): State<AdminState>) -> Json<Vec<SnapshotSummary>> {
    let store = state.engine.store();
    let summaries = store
        .keys()
        .into_iter()
        .filter_map(|group| {
            let snapshot = store.get(&group)?;
            let counts = ResourceKind::ALL
                .into_iter()
                .map(|kind| (kind.as_str(), snapshot.kind(kind).len()))
                .collect();
            Some(SnapshotSummary {
                group: group.to_string(),
                version: snapshot.version().to_string(),
                counts,
            })
        })
        .collect();
    Json(summaries)
}

pub async fn get_sessions(State(state): State<AdminState>) -> Json<Vec<SessionStatus>> {
    Json(state.engine.sessions())
}

pub async fn post_reconcile(State(state): State<AdminState>) -> (StatusCode, Json<ReconcileAccepted>) {
    match state.trigger.fire(TriggerReason::Admin) {
        Fired::Queued => (StatusCode::ACCEPTED, Json(ReconcileAccepted { result: "queued" })),
        Fired::Coalesced => (StatusCode::ACCEPTED, Json(ReconcileAccepted { result: "coalesced" })),
        Fired::Closed => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReconcileAccepted { result: "stopped" }),
        ),
    }
}
