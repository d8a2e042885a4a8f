//! Discovery wire protocol.
//!
//! JSON text frames over a WebSocket:
//!
//! ```text
//! server → client  {"type":"push","kind":"cluster","type_url":"...",
//!                   "version_info":"v3","nonce":"7","resources":[...]}
//! client → server  {"type":"ack","kind":"cluster","version_info":"v3",
//!                   "nonce":"7","accepted":true}
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::resource::ResourceKind;

/// Node identity used when a subscriber does not send one.
pub const UNKNOWN_NODE: &str = "unknown";

/// Opaque identity of a subscriber process.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Use the given id, or the `unknown` sentinel if absent or blank.
    pub fn from_optional(id: Option<String>) -> Self {
        match id {
            Some(id) if !id.trim().is_empty() => Self(id),
            _ => Self(UNKNOWN_NODE.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Messages sent to subscribers.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Push(DiscoveryResponse),
}

/// The full resource list of one kind at one version.
#[derive(Debug, Clone, Serialize)]
pub struct DiscoveryResponse {
    pub kind: ResourceKind,
    pub type_url: String,
    pub version_info: String,
    pub nonce: String,
    /// Shared with the snapshot; pushing to many sessions does not copy.
    pub resources: Arc<Vec<serde_json::Value>>,
}

/// Messages received from subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Ack(AckMessage),
}

/// Acknowledgement (or rejection) of one push.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AckMessage {
    pub kind: ResourceKind,
    pub version_info: String,
    pub nonce: String,

    #[serde(default = "accepted_by_default")]
    pub accepted: bool,

    #[serde(default)]
    pub error_detail: Option<String>,
}

fn accepted_by_default() -> bool {
    true
}
