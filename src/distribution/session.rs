//! One subscriber session: per-kind delivery state plus nonce generation.
//!
//! Pure state; the engine feeds it snapshots and responses and forwards
//! whatever pushes it returns.

use std::time::SystemTime;

use serde::Serialize;

use crate::distribution::protocol::{AckMessage, DiscoveryResponse, NodeId};
use crate::distribution::subscription::{AckOutcome, KindStatus, KindSubscription};
use crate::net::SessionId;
use crate::resource::{PerKind, ResourceKind};
use crate::snapshot::Snapshot;
use crate::store::GroupKey;

/// Push behaviour shared by every session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PushPolicy {
    /// Skip a push when the kind's content is byte-identical to what the
    /// subscriber was last sent.
    pub suppress_identical: bool,
}

impl Default for PushPolicy {
    fn default() -> Self {
        Self { suppress_identical: true }
    }
}

#[derive(Debug)]
pub struct Session {
    id: SessionId,
    node: NodeId,
    group: GroupKey,
    policy: PushPolicy,
    kinds: PerKind<KindSubscription>,
    next_nonce: u64,
    connected_at: SystemTime,
}

impl Session {
    pub fn new(id: SessionId, node: NodeId, group: GroupKey, policy: PushPolicy) -> Self {
        Self {
            id,
            node,
            group,
            policy,
            kinds: PerKind::default(),
            next_nonce: 1,
            connected_at: SystemTime::now(),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn node(&self) -> &NodeId {
        &self.node
    }

    pub fn group(&self) -> &GroupKey {
        &self.group
    }

    fn nonce(&mut self) -> String {
        let nonce = self.next_nonce;
        self.next_nonce += 1;
        nonce.to_string()
    }

    /// Compute the pushes `snapshot` calls for and mark them sent.
    ///
    /// Pushes come back in dependency order: clusters, endpoints, routes,
    /// listeners.
    pub fn on_snapshot(&mut self, snapshot: &Snapshot) -> Vec<DiscoveryResponse> {
        let version = snapshot.version();
        let mut pushes = Vec::new();

        for kind in ResourceKind::ALL {
            let content = snapshot.kind(kind);
            let digest = content.digest();
            if !self.kinds.get(kind).needs_push(version, digest, self.policy.suppress_identical) {
                continue;
            }

            let nonce = self.nonce();
            self.kinds.get_mut(kind).mark_sent(version, nonce.clone(), digest);
            pushes.push(DiscoveryResponse {
                kind,
                type_url: kind.type_url(),
                version_info: version.to_string(),
                nonce,
                resources: content.encoded().clone(),
            });
        }
        pushes
    }

    /// Apply a subscriber response to the matching kind.
    pub fn on_ack(&mut self, ack: &AckMessage) -> AckOutcome {
        self.kinds
            .get_mut(ack.kind)
            .on_response(&ack.nonce, ack.accepted, ack.error_detail.clone())
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            id: self.id,
            node_id: self.node.clone(),
            group: self.group.clone(),
            connected_at_unix: self
                .connected_at
                .duration_since(SystemTime::UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or_default(),
            cluster: self.kinds.get(ResourceKind::Cluster).status(),
            endpoint_assignment: self.kinds.get(ResourceKind::EndpointAssignment).status(),
            route_configuration: self.kinds.get(ResourceKind::RouteConfiguration).status(),
            listener: self.kinds.get(ResourceKind::Listener).status(),
        }
    }
}

/// Serializable view of a session for the admin API.
#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    pub id: SessionId,
    pub node_id: NodeId,
    pub group: GroupKey,
    pub connected_at_unix: u64,
    pub cluster: KindStatus,
    pub endpoint_assignment: KindStatus,
    pub route_configuration: KindStatus,
    pub listener: KindStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::Resource;
    use crate::snapshot::testing::*;
    use crate::snapshot::{SnapshotBuilder, Version};

    fn snapshot(generation: u64, route_cluster: &str) -> Snapshot {
        let mut builder = SnapshotBuilder::new();
        builder.insert(Resource::Cluster(static_cluster("c1")));
        builder.insert(Resource::Cluster(static_cluster("c2")));
        builder.insert(Resource::RouteConfiguration(route_config("r1", &[route_cluster])));
        builder.insert(Resource::Listener(listener("l1", Some("r1"))));
        builder.build(Version::from_generation(generation)).unwrap()
    }

    fn session(suppress_identical: bool) -> Session {
        Session::new(
            SessionId::new(),
            NodeId::new("edge-1"),
            GroupKey::from("default"),
            PushPolicy { suppress_identical },
        )
    }

    fn ack(push: &DiscoveryResponse) -> AckMessage {
        AckMessage {
            kind: push.kind,
            version_info: push.version_info.clone(),
            nonce: push.nonce.clone(),
            accepted: true,
            error_detail: None,
        }
    }

    #[test]
    fn first_snapshot_pushes_every_kind_in_order() {
        let mut session = session(true);
        let pushes = session.on_snapshot(&snapshot(0, "c1"));

        let kinds: Vec<_> = pushes.iter().map(|p| p.kind).collect();
        assert_eq!(kinds, ResourceKind::ALL.to_vec());
        assert!(pushes.iter().all(|p| p.version_info == "v0"));

        let nonces: std::collections::HashSet<_> = pushes.iter().map(|p| p.nonce.clone()).collect();
        assert_eq!(nonces.len(), 4, "nonces are unique within a session");
    }

    #[test]
    fn only_changed_kinds_are_pushed() {
        let mut session = session(true);
        for push in session.on_snapshot(&snapshot(0, "c1")) {
            assert!(matches!(session.on_ack(&ack(&push)), AckOutcome::Accepted { .. }));
        }

        let pushes = session.on_snapshot(&snapshot(1, "c2"));
        assert_eq!(pushes.len(), 1);
        assert_eq!(pushes[0].kind, ResourceKind::RouteConfiguration);
        assert_eq!(pushes[0].version_info, "v1");
    }

    #[test]
    fn identical_snapshot_not_pushed_unless_disabled() {
        let mut suppressing = session(true);
        suppressing.on_snapshot(&snapshot(0, "c1"));
        assert!(suppressing.on_snapshot(&snapshot(1, "c1")).is_empty());

        let mut eager = session(false);
        eager.on_snapshot(&snapshot(0, "c1"));
        assert_eq!(eager.on_snapshot(&snapshot(1, "c1")).len(), 4);
    }

    #[test]
    fn stale_ack_leaves_state_alone() {
        let mut session = session(false);
        let first = session.on_snapshot(&snapshot(0, "c1"));
        let _second = session.on_snapshot(&snapshot(1, "c1"));

        assert_eq!(session.on_ack(&ack(&first[0])), AckOutcome::Stale);
        assert_eq!(session.status().cluster.state, "pending");
        assert_eq!(session.status().cluster.pending_version.as_deref(), Some("v1"));
    }

    #[test]
    fn replaying_an_older_snapshot_is_ignored() {
        let mut session = session(false);
        session.on_snapshot(&snapshot(3, "c1"));
        assert!(session.on_snapshot(&snapshot(2, "c2")).is_empty());
    }
}
