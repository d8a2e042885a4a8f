//! Distribution engine: drives every subscriber session.
//!
//! # Responsibilities
//! - Bind each session to its group's store entry
//! - Push the live snapshot on connect, then every later commit
//! - Match responses to outstanding pushes
//! - Keep a live per-session view for the admin API
//!
//! # Design Decisions
//! - Transport-agnostic: a session is a pair of channels, so the WebSocket
//!   adapter and tests drive the same loop
//! - Sessions never share mutable state; a slow or broken subscriber only
//!   affects itself
//! - Subscribing to the store before reading it means no commit can slip
//!   between the initial push and the first wait

use std::ops::ControlFlow;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{broadcast, mpsc};

use crate::distribution::grouping::GroupResolver;
use crate::distribution::protocol::{AckMessage, ClientMessage, NodeId, ServerMessage};
use crate::distribution::session::{PushPolicy, Session, SessionStatus};
use crate::distribution::subscription::AckOutcome;
use crate::net::{SessionId, SessionTracker};
use crate::observability::metrics;
use crate::snapshot::Snapshot;
use crate::store::SnapshotStore;

/// Failure of one session's transport. Never affects other sessions.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("subscriber stream closed while pushing")]
    Closed,
    #[error("websocket error: {0}")]
    WebSocket(#[from] axum::Error),
}

#[derive(Debug)]
pub struct DistributionEngine {
    store: Arc<SnapshotStore>,
    grouping: Arc<dyn GroupResolver>,
    policy: PushPolicy,
    tracker: SessionTracker,
    sessions: DashMap<SessionId, SessionStatus>,
}

impl DistributionEngine {
    pub fn new(store: Arc<SnapshotStore>, grouping: Arc<dyn GroupResolver>, policy: PushPolicy) -> Self {
        Self {
            store,
            grouping,
            policy,
            tracker: SessionTracker::new(),
            sessions: DashMap::new(),
        }
    }

    pub fn store(&self) -> &Arc<SnapshotStore> {
        &self.store
    }

    pub fn tracker(&self) -> &SessionTracker {
        &self.tracker
    }

    pub fn active_sessions(&self) -> u64 {
        self.tracker.active_count()
    }

    /// Current state of every live session, oldest first.
    pub fn sessions(&self) -> Vec<SessionStatus> {
        let mut sessions: Vec<_> = self.sessions.iter().map(|s| s.value().clone()).collect();
        sessions.sort_by(|a, b| {
            a.connected_at_unix
                .cmp(&b.connected_at_unix)
                .then_with(|| a.node_id.as_str().cmp(b.node_id.as_str()))
        });
        sessions
    }

    /// Serve one subscriber until it disconnects, its transport fails, or
    /// shutdown is signalled.
    ///
    /// `inbound` closing is a normal disconnect. `outbound` closing while a
    /// push is in flight is a transport error.
    pub async fn run_session(
        &self,
        node: NodeId,
        mut inbound: mpsc::Receiver<ClientMessage>,
        outbound: mpsc::Sender<ServerMessage>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), TransportError> {
        let guard = self.tracker.track();
        let group = self.grouping.group_for(&node);
        let mut session = Session::new(guard.id(), node, group, self.policy);

        tracing::info!(
            session_id = %session.id(),
            node_id = %session.node(),
            group = %session.group(),
            "Session opened"
        );
        self.sessions.insert(session.id(), session.status());

        let result = self
            .drive(&mut session, &mut inbound, &outbound, &mut shutdown)
            .await;

        self.sessions.remove(&session.id());
        match &result {
            Ok(()) => tracing::info!(session_id = %session.id(), node_id = %session.node(), "Session closed"),
            Err(e) => tracing::warn!(
                session_id = %session.id(),
                node_id = %session.node(),
                error = %e,
                "Session terminated"
            ),
        }
        result
    }

    async fn drive(
        &self,
        session: &mut Session,
        inbound: &mut mpsc::Receiver<ClientMessage>,
        outbound: &mpsc::Sender<ServerMessage>,
        shutdown: &mut broadcast::Receiver<()>,
    ) -> Result<(), TransportError> {
        let mut watch = self.store.subscribe(session.group());

        match watch.current() {
            Some(snapshot) => {
                if self.push(session, &snapshot, outbound, shutdown).await?.is_break() {
                    return Ok(());
                }
            }
            None => tracing::debug!(
                session_id = %session.id(),
                group = %session.group(),
                "No snapshot yet, waiting for first commit"
            ),
        }
        self.sessions.insert(session.id(), session.status());

        loop {
            tokio::select! {
                snapshot = watch.next() => {
                    if self.push(session, &snapshot, outbound, shutdown).await?.is_break() {
                        return Ok(());
                    }
                }
                message = inbound.recv() => match message {
                    Some(ClientMessage::Ack(ack)) => self.handle_ack(session, &ack),
                    None => return Ok(()),
                },
                _ = shutdown.recv() => {
                    tracing::debug!(session_id = %session.id(), "Session received shutdown signal");
                    return Ok(());
                }
            }
            self.sessions.insert(session.id(), session.status());
        }
    }

    /// Queue every push the snapshot produces. Breaks if shutdown fires
    /// while the subscriber's queue is full.
    async fn push(
        &self,
        session: &mut Session,
        snapshot: &Snapshot,
        outbound: &mpsc::Sender<ServerMessage>,
        shutdown: &mut broadcast::Receiver<()>,
    ) -> Result<ControlFlow<()>, TransportError> {
        let pushes = session.on_snapshot(snapshot);
        if pushes.is_empty() {
            tracing::debug!(
                session_id = %session.id(),
                version = %snapshot.version(),
                "Snapshot carries nothing new for session"
            );
            return Ok(ControlFlow::Continue(()));
        }

        for push in pushes {
            let kind = push.kind;
            tracing::debug!(
                session_id = %session.id(),
                kind = %kind,
                version = %push.version_info,
                nonce = %push.nonce,
                resources = push.resources.len(),
                "Pushing resources"
            );
            tokio::select! {
                sent = outbound.send(ServerMessage::Push(push)) => {
                    sent.map_err(|_| TransportError::Closed)?;
                }
                _ = shutdown.recv() => {
                    tracing::debug!(session_id = %session.id(), "Shutdown while subscriber queue is full");
                    return Ok(ControlFlow::Break(()));
                }
            }
            metrics::record_push(kind.as_str());
        }
        Ok(ControlFlow::Continue(()))
    }

    fn handle_ack(&self, session: &mut Session, ack: &AckMessage) {
        let kind = ack.kind;
        match session.on_ack(ack) {
            AckOutcome::Accepted { version } => {
                metrics::record_ack(kind.as_str(), "accepted");
                tracing::debug!(session_id = %session.id(), kind = %kind, version = %version, "Push acknowledged");
            }
            AckOutcome::Rejected { version, detail } => {
                metrics::record_ack(kind.as_str(), "rejected");
                tracing::warn!(
                    session_id = %session.id(),
                    node_id = %session.node(),
                    kind = %kind,
                    version = %version,
                    detail = detail.as_deref().unwrap_or(""),
                    "Subscriber rejected push"
                );
            }
            AckOutcome::Stale => {
                metrics::record_ack(kind.as_str(), "stale");
                tracing::debug!(
                    session_id = %session.id(),
                    kind = %kind,
                    nonce = %ack.nonce,
                    "Ignoring response with stale nonce"
                );
            }
        }
    }
}
