//! Process assembly: wires every subsystem from a validated config.
//!
//! # Startup Order
//! ```text
//! store + version counter + engine
//!     → bind discovery listener (fatal)
//!     → bind admin listener (fatal, when enabled)
//!     → PID file (warning on failure)
//!     → reconcile worker + initial pass
//!     → directory watcher (when enabled)
//! ```
//!
//! # Shutdown Order
//! Broadcast → servers stop accepting → sessions observe the signal and
//! end → wait for drain up to the grace period → remove the PID file.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use notify::RecommendedWatcher;
use tokio::task::JoinHandle;

use crate::admin::{serve_admin, setup_admin_router, AdminState};
use crate::config::ServerConfig;
use crate::distribution::{
    DiscoveryServer, DistributionEngine, FixedGroup, PushPolicy,
};
use crate::lifecycle::{startup, Shutdown};
use crate::net::{bind_tcp, ListenError, Listener};
use crate::reconcile::{
    reconcile_channel, DirectoryWatcher, ReconcileReport, ReconcileTrigger, Reconciler, TriggerReason,
};
use crate::snapshot::VersionCounter;
use crate::store::{GroupKey, SnapshotStore};

#[derive(Debug, thiserror::Error)]
pub enum StartError {
    #[error("discovery listener: {0}")]
    Discovery(#[source] ListenError),
    #[error("admin listener: {0}")]
    Admin(#[source] ListenError),
    #[error("cannot start directory watcher: {0}")]
    Watch(#[from] notify::Error),
}

/// A started server. Dropping it does not stop anything; call `stop`.
pub struct ConfigPlane {
    discovery_addr: SocketAddr,
    admin_addr: Option<SocketAddr>,
    engine: Arc<DistributionEngine>,
    trigger: ReconcileTrigger,
    shutdown: Shutdown,
    tasks: Vec<JoinHandle<()>>,
    _watcher: Option<RecommendedWatcher>,
    grace: Duration,
    pid_file: PathBuf,
}

impl ConfigPlane {
    /// Start every subsystem and run the first reconciliation.
    ///
    /// Returns once the first pass has finished, committed or not.
    pub async fn start(config: ServerConfig, shutdown: Shutdown) -> Result<Self, StartError> {
        let store = Arc::new(SnapshotStore::new());
        let counter = Arc::new(VersionCounter::new());
        let group_key = GroupKey::new(config.distribution.group_key.clone());

        let grouping = Arc::new(FixedGroup::new(group_key.clone()));
        let policy = PushPolicy {
            suppress_identical: config.distribution.suppress_identical_pushes,
        };
        let engine = Arc::new(DistributionEngine::new(store.clone(), grouping, policy));

        let listener = Listener::bind(&config.listener).await.map_err(StartError::Discovery)?;
        let discovery_addr = listener.local_addr();
        let limit = listener.session_limit();

        let admin = if config.admin.enabled {
            Some(bind_tcp(&config.admin.bind_address).await.map_err(StartError::Admin)?)
        } else {
            None
        };

        startup::record_pid(&config.lifecycle.pid_file);

        let reconciler = Reconciler::new(
            config.sources.directories.clone(),
            group_key,
            counter,
            store,
        );
        let (trigger, worker) = reconcile_channel(reconciler);
        let mut tasks = vec![tokio::spawn(worker.run(shutdown.subscribe()))];

        let discovery = DiscoveryServer::new(
            engine.clone(),
            limit,
            config.distribution.send_buffer,
            shutdown.clone(),
        );
        let server_shutdown = shutdown.clone();
        let server_listener = listener.into_inner();
        tasks.push(tokio::spawn(async move {
            if let Err(e) = discovery.run(server_listener, server_shutdown).await {
                tracing::error!(error = %e, "Discovery server failed");
            }
        }));

        let admin_addr = match admin {
            Some((admin_listener, addr)) => {
                let router = setup_admin_router(AdminState {
                    engine: engine.clone(),
                    trigger: trigger.clone(),
                    api_key: Arc::from(config.admin.api_key.as_str()),
                    started: Instant::now(),
                });
                let admin_shutdown = shutdown.clone();
                tasks.push(tokio::spawn(async move {
                    if let Err(e) = serve_admin(admin_listener, router, admin_shutdown).await {
                        tracing::error!(error = %e, "Admin server failed");
                    }
                }));
                Some(addr)
            }
            None => None,
        };

        let mut reports = trigger.reports();
        trigger.fire(TriggerReason::Startup);
        if reports.wait_for(|r| r.is_some()).await.is_err() {
            tracing::error!("Reconciliation worker stopped before the initial pass");
        }

        let watcher = if config.sources.watch {
            let watcher = DirectoryWatcher::new(
                config.sources.directories.clone(),
                Duration::from_millis(config.sources.debounce_ms),
                trigger.clone(),
            );
            Some(watcher.run(shutdown.subscribe())?)
        } else {
            None
        };

        Ok(Self {
            discovery_addr,
            admin_addr,
            engine,
            trigger,
            shutdown,
            tasks,
            _watcher: watcher,
            grace: Duration::from_secs(config.lifecycle.shutdown_grace_secs),
            pid_file: config.lifecycle.pid_file,
        })
    }

    pub fn discovery_addr(&self) -> SocketAddr {
        self.discovery_addr
    }

    pub fn admin_addr(&self) -> Option<SocketAddr> {
        self.admin_addr
    }

    pub fn engine(&self) -> &Arc<DistributionEngine> {
        &self.engine
    }

    pub fn trigger(&self) -> &ReconcileTrigger {
        &self.trigger
    }

    pub fn last_report(&self) -> Option<Arc<ReconcileReport>> {
        self.trigger.last_report()
    }

    /// Signal shutdown and wait for sessions and servers, bounded by the
    /// grace period.
    pub async fn stop(self) {
        tracing::info!(active_sessions = self.engine.active_sessions(), "Shutting down");
        self.shutdown.trigger();

        let remaining = self.engine.tracker().wait_for_drain(self.grace).await;
        if remaining > 0 {
            tracing::warn!(remaining, "Grace period elapsed with sessions still open");
        }

        for task in self.tasks {
            if tokio::time::timeout(self.grace, task).await.is_err() {
                tracing::warn!("Background task did not stop within the grace period");
            }
        }

        startup::remove_pid_file(&self.pid_file);
        tracing::info!("Shutdown complete");
    }
}
