//! One reconciliation pass: scan → decode → classify → build → commit.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::observability::metrics;
use crate::reconcile::scanner::scan;
use crate::resource::{decode_file, Classification, PerKind, ResourceKind};
use crate::snapshot::{BuildError, SnapshotBuilder, Version, VersionCounter};
use crate::store::{GroupKey, SnapshotStore};

/// How a pass ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The candidate was committed to the store.
    Committed,
    /// The candidate was rejected; the previous snapshot stays live.
    Rejected { reason: String },
}

/// Summary of one reconciliation pass.
#[derive(Debug, Clone)]
pub struct ReconcileReport {
    pub version: Version,
    pub outcome: Outcome,
    /// Resources accepted into the candidate, per kind.
    pub counts: PerKind<usize>,
    /// Files that failed to decode.
    pub failed_files: Vec<PathBuf>,
    /// Decoded resources of an unrecognized type.
    pub unrecognized: usize,
    pub duration: Duration,
}

impl ReconcileReport {
    pub fn committed(&self) -> bool {
        self.outcome == Outcome::Committed
    }
}

/// Owns the write path into the snapshot store for one group.
#[derive(Debug)]
pub struct Reconciler {
    directories: Vec<PathBuf>,
    group: GroupKey,
    counter: Arc<VersionCounter>,
    store: Arc<SnapshotStore>,
}

impl Reconciler {
    pub fn new(
        directories: Vec<PathBuf>,
        group: GroupKey,
        counter: Arc<VersionCounter>,
        store: Arc<SnapshotStore>,
    ) -> Self {
        Self { directories, group, counter, store }
    }

    pub fn directories(&self) -> &[PathBuf] {
        &self.directories
    }

    /// Run one full pass. Never fails: every problem is logged and folded
    /// into the report, and a failed pass leaves the store untouched.
    ///
    /// Blocking file I/O; call from a blocking context.
    pub fn run(&self) -> ReconcileReport {
        let started = Instant::now();
        let scanned = scan(&self.directories);

        let mut builder = SnapshotBuilder::new();
        let mut failed_files = Vec::new();
        let mut unrecognized = 0;

        for path in scanned.files {
            let resource = match decode_file(&path) {
                Ok(resource) => resource,
                Err(e) => {
                    tracing::warn!(file = %e.path.display(), error = %e.cause, "Skipping undecodable file");
                    metrics::record_decode_error();
                    failed_files.push(path);
                    continue;
                }
            };

            let name = resource.name().to_string();
            match builder.insert(resource) {
                Classification::Kind(kind) => {
                    tracing::debug!(file = %path.display(), kind = %kind, name = %name, "Loaded resource");
                }
                Classification::Unrecognized { type_url } => {
                    tracing::warn!(file = %path.display(), type_url = %type_url, "Unrecognized resource type, dropping");
                    unrecognized += 1;
                }
            }
        }

        let counts = PerKind::from_fn(|kind| builder.resources().len(kind));
        // One version per attempt, committed or not.
        let version = self.counter.next_version();

        let outcome = match builder.build(version) {
            Ok(snapshot) => {
                self.store.set(&self.group, snapshot);
                Outcome::Committed
            }
            Err(BuildError::Inconsistent(e)) => {
                for problem in &e.problems {
                    tracing::error!(version = %version, problem = %problem, "Snapshot inconsistency");
                }
                Outcome::Rejected { reason: e.to_string() }
            }
            Err(e) => {
                tracing::error!(version = %version, error = %e, "Snapshot build failed");
                Outcome::Rejected { reason: e.to_string() }
            }
        };

        let duration = started.elapsed();
        metrics::record_reconcile(outcome_label(&outcome), duration);

        let report = ReconcileReport {
            version,
            outcome,
            counts,
            failed_files,
            unrecognized,
            duration,
        };
        log_report(&self.group, &report);
        report
    }
}

fn outcome_label(outcome: &Outcome) -> &'static str {
    match outcome {
        Outcome::Committed => "committed",
        Outcome::Rejected { .. } => "rejected",
    }
}

fn log_report(group: &GroupKey, report: &ReconcileReport) {
    let count = |kind: ResourceKind| *report.counts.get(kind);
    match &report.outcome {
        Outcome::Committed => tracing::info!(
            group = %group,
            version = %report.version,
            clusters = count(ResourceKind::Cluster),
            endpoints = count(ResourceKind::EndpointAssignment),
            routes = count(ResourceKind::RouteConfiguration),
            listeners = count(ResourceKind::Listener),
            failed_files = report.failed_files.len(),
            elapsed_ms = report.duration.as_millis() as u64,
            "Snapshot committed"
        ),
        Outcome::Rejected { .. } => tracing::warn!(
            group = %group,
            version = %report.version,
            failed_files = report.failed_files.len(),
            "Snapshot rejected, keeping previous configuration"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    const CLUSTER_C1: &str = r#"{
        "@type": "type.config-plane.dev/Cluster",
        "name": "c1",
        "hosts": [{"host": "127.0.0.1", "port": 8080}]
    }"#;

    fn route_to(cluster: &str) -> String {
        format!(
            r#"{{
                "@type": "type.config-plane.dev/RouteConfiguration",
                "name": "r1",
                "virtual_hosts": [{{
                    "name": "all",
                    "domains": ["*"],
                    "routes": [{{"prefix": "/", "cluster": "{cluster}"}}]
                }}]
            }}"#
        )
    }

    fn reconciler(dir: &Path) -> (Reconciler, Arc<SnapshotStore>) {
        let store = Arc::new(SnapshotStore::new());
        let reconciler = Reconciler::new(
            vec![dir.to_path_buf()],
            GroupKey::from("default"),
            Arc::new(VersionCounter::new()),
            store.clone(),
        );
        (reconciler, store)
    }

    #[test]
    fn test_dangling_route_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("cluster.json"), CLUSTER_C1).unwrap();
        std::fs::write(dir.path().join("route.json"), route_to("nope")).unwrap();

        let (reconciler, store) = reconciler(dir.path());
        let report = reconciler.run();

        assert!(!report.committed());
        assert_eq!(report.version.to_string(), "v0");
        assert!(store.get(&"default".into()).is_none());
    }

    #[test]
    fn test_commit_then_rejection_keeps_previous() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("cluster.json"), CLUSTER_C1).unwrap();
        std::fs::write(dir.path().join("route.json"), route_to("c1")).unwrap();

        let (reconciler, store) = reconciler(dir.path());
        let first = reconciler.run();
        assert!(first.committed());
        assert_eq!(*first.counts.get(ResourceKind::RouteConfiguration), 1);

        std::fs::write(dir.path().join("route.json"), route_to("c9")).unwrap();
        let second = reconciler.run();
        assert!(!second.committed());
        assert_eq!(second.version.to_string(), "v1");

        let live = store.get(&"default".into()).unwrap();
        assert_eq!(live.version().to_string(), "v0");

        std::fs::write(dir.path().join("route.json"), route_to("c1")).unwrap();
        let third = reconciler.run();
        assert!(third.committed());
        assert_eq!(store.get(&"default".into()).unwrap().version().to_string(), "v2");
    }

    #[test]
    fn test_bad_file_does_not_block_others() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("cluster.json"), CLUSTER_C1).unwrap();
        std::fs::write(dir.path().join("broken.json"), "{ nope").unwrap();
        std::fs::write(
            dir.path().join("secret.json"),
            r#"{"@type": "type.example.com/Secret", "name": "tls"}"#,
        )
        .unwrap();

        let (reconciler, store) = reconciler(dir.path());
        let report = reconciler.run();

        assert!(report.committed());
        assert_eq!(report.failed_files, vec![dir.path().join("broken.json")]);
        assert_eq!(report.unrecognized, 1);
        let live = store.get(&"default".into()).unwrap();
        assert_eq!(live.resources().clusters.len(), 1);
    }

    #[test]
    fn test_empty_directory_commits_empty_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let (reconciler, store) = reconciler(dir.path());
        assert!(reconciler.run().committed());
        assert!(store.get(&"default".into()).unwrap().resources().is_empty());
    }
}
