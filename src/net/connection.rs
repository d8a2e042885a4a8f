//! Session lifetime tracking.
//!
//! # Responsibilities
//! - Hand out unique session IDs for logs and the admin API
//! - Count live sessions for the metrics gauge and graceful drain
//! - Let shutdown wait for sessions to finish, bounded by a grace period

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Notify;
use uuid::Uuid;

/// Unique identifier for a subscriber session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sess-{}", self.0.simple())
    }
}

/// Counts live sessions.
#[derive(Debug, Clone, Default)]
pub struct SessionTracker {
    active: Arc<AtomicU64>,
    drained: Arc<Notify>,
}

impl SessionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session. The returned guard unregisters it on drop.
    pub fn track(&self) -> SessionGuard {
        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        crate::observability::metrics::record_active_sessions(active);
        SessionGuard {
            active: Arc::clone(&self.active),
            drained: Arc::clone(&self.drained),
            id: SessionId::new(),
        }
    }

    pub fn active_count(&self) -> u64 {
        self.active.load(Ordering::SeqCst)
    }

    /// Wait until every session has ended or `grace` elapses.
    ///
    /// Returns the number of sessions still alive at the deadline.
    pub async fn wait_for_drain(&self, grace: Duration) -> u64 {
        let drain = async {
            loop {
                let notified = self.drained.notified();
                if self.active_count() == 0 {
                    return;
                }
                notified.await;
            }
        };
        let _ = tokio::time::timeout(grace, drain).await;
        self.active_count()
    }
}

/// Held for the lifetime of one session.
#[derive(Debug)]
pub struct SessionGuard {
    active: Arc<AtomicU64>,
    drained: Arc<Notify>,
    id: SessionId,
}

impl SessionGuard {
    pub fn id(&self) -> SessionId {
        self.id
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let remaining = self.active.fetch_sub(1, Ordering::SeqCst) - 1;
        crate::observability::metrics::record_active_sessions(remaining);
        if remaining == 0 {
            self.drained.notify_waiters();
        }
        tracing::trace!(session_id = %self.id, "Session released");
    }
}
