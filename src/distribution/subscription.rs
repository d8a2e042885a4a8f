//! Per-kind delivery state for one session.
//!
//! # State Machine
//! ```text
//!            push                   ack(nonce)
//! Unsent ──────────▶ Pending ─────────────────▶ Acked
//!                     │  ▲  nack(nonce): stays Pending
//!                     │  └── push of newer content supersedes
//! Acked  ──push──────▶ Pending
//! ```
//!
//! # Design Decisions
//! - Only the nonce of the single outstanding push is honoured; anything
//!   else is stale and ignored
//! - A push never carries a version at or below the last one pushed
//! - With suppression on, a new version whose bytes equal what the
//!   subscriber was last sent is not pushed again

use serde::Serialize;

use crate::snapshot::Version;

/// The push awaiting a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outstanding {
    pub version: Version,
    pub nonce: String,
    pub digest: blake3::Hash,
}

/// Content the subscriber has confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Applied {
    pub version: Version,
    pub digest: blake3::Hash,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryState {
    /// Nothing sent yet.
    Unsent,
    /// A push is outstanding.
    Pending(Outstanding),
    /// The last push was acknowledged.
    Acked(Applied),
}

/// Result of matching a response against the outstanding push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AckOutcome {
    Accepted { version: Version },
    Rejected { version: Version, detail: Option<String> },
    /// Unknown or superseded nonce; no state change.
    Stale,
}

/// Delivery state of one resource kind.
#[derive(Debug, Clone)]
pub struct KindSubscription {
    state: DeliveryState,
    last_acked: Option<Applied>,
    last_pushed: Option<Version>,
    last_error: Option<String>,
}

impl Default for KindSubscription {
    fn default() -> Self {
        Self {
            state: DeliveryState::Unsent,
            last_acked: None,
            last_pushed: None,
            last_error: None,
        }
    }
}

impl KindSubscription {
    pub fn state(&self) -> &DeliveryState {
        &self.state
    }

    pub fn last_acked(&self) -> Option<Applied> {
        self.last_acked
    }

    /// Digest of the content the subscriber was most recently sent.
    fn latest_sent_digest(&self) -> Option<blake3::Hash> {
        match &self.state {
            DeliveryState::Unsent => None,
            DeliveryState::Pending(out) => Some(out.digest),
            DeliveryState::Acked(applied) => Some(applied.digest),
        }
    }

    /// Whether content at `version` should be pushed.
    pub fn needs_push(&self, version: Version, digest: blake3::Hash, suppress_identical: bool) -> bool {
        if self.last_pushed.is_some_and(|last| version <= last) {
            return false;
        }
        match self.latest_sent_digest() {
            None => true,
            Some(sent) => !(suppress_identical && sent == digest),
        }
    }

    /// Record that a push went out.
    pub fn mark_sent(&mut self, version: Version, nonce: String, digest: blake3::Hash) {
        self.last_pushed = Some(version);
        self.state = DeliveryState::Pending(Outstanding { version, nonce, digest });
    }

    /// Apply a subscriber response.
    pub fn on_response(&mut self, nonce: &str, accepted: bool, detail: Option<String>) -> AckOutcome {
        let outstanding = match &self.state {
            DeliveryState::Pending(out) if out.nonce == nonce => out.clone(),
            _ => return AckOutcome::Stale,
        };

        if accepted {
            let applied = Applied {
                version: outstanding.version,
                digest: outstanding.digest,
            };
            self.state = DeliveryState::Acked(applied);
            self.last_acked = Some(applied);
            self.last_error = None;
            AckOutcome::Accepted { version: outstanding.version }
        } else {
            self.last_error = detail.clone();
            AckOutcome::Rejected { version: outstanding.version, detail }
        }
    }

    /// Serializable view for the admin API.
    pub fn status(&self) -> KindStatus {
        let (state, pending_version, pending_nonce) = match &self.state {
            DeliveryState::Unsent => ("unsent", None, None),
            DeliveryState::Pending(out) => ("pending", Some(out.version.to_string()), Some(out.nonce.clone())),
            DeliveryState::Acked(_) => ("acked", None, None),
        };
        KindStatus {
            state,
            acked_version: self.last_acked.map(|a| a.version.to_string()),
            pending_version,
            pending_nonce,
            last_error: self.last_error.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct KindStatus {
    pub state: &'static str,
    pub acked_version: Option<String>,
    pub pending_version: Option<String>,
    pub pending_nonce: Option<String>,
    pub last_error: Option<String>,
}
