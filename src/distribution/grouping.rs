//! Mapping from node identity to snapshot group.

use crate::distribution::protocol::NodeId;
use crate::store::GroupKey;

/// Decides which store entry a subscriber reads from.
pub trait GroupResolver: Send + Sync + std::fmt::Debug {
    fn group_for(&self, node: &NodeId) -> GroupKey;
}

/// Every node shares one group.
#[derive(Debug, Clone)]
pub struct FixedGroup(GroupKey);

impl FixedGroup {
    pub fn new(key: GroupKey) -> Self {
        Self(key)
    }
}

impl GroupResolver for FixedGroup {
    fn group_for(&self, _node: &NodeId) -> GroupKey {
        self.0.clone()
    }
}
