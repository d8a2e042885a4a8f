//! Per-kind resource collections.

use crate::resource::{
    classify, Classification, Cluster, EndpointAssignment, Listener, Resource, ResourceKind,
    RouteConfiguration,
};

/// Four insertion-ordered collections, one per resource kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceSet {
    pub clusters: Vec<Cluster>,
    pub endpoints: Vec<EndpointAssignment>,
    pub routes: Vec<RouteConfiguration>,
    pub listeners: Vec<Listener>,
}

impl ResourceSet {
    /// Classify `resource` and append it to its kind's collection.
    ///
    /// Unrecognized resources are not stored; the caller decides how loudly
    /// to drop them.
    pub fn insert(&mut self, resource: Resource) -> Classification {
        let classification = classify(&resource);
        match resource {
            Resource::Cluster(c) => self.clusters.push(c),
            Resource::EndpointAssignment(e) => self.endpoints.push(e),
            Resource::RouteConfiguration(r) => self.routes.push(r),
            Resource::Listener(l) => self.listeners.push(l),
            Resource::Unrecognized { .. } => {}
        }
        classification
    }

    pub fn len(&self, kind: ResourceKind) -> usize {
        match kind {
            ResourceKind::Cluster => self.clusters.len(),
            ResourceKind::EndpointAssignment => self.endpoints.len(),
            ResourceKind::RouteConfiguration => self.routes.len(),
            ResourceKind::Listener => self.listeners.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        ResourceKind::ALL.iter().all(|kind| self.len(*kind) == 0)
    }

    /// Resources of one kind, cloned back into the tagged form.
    pub fn resources(&self, kind: ResourceKind) -> Vec<Resource> {
        match kind {
            ResourceKind::Cluster => self.clusters.iter().cloned().map(Resource::Cluster).collect(),
            ResourceKind::EndpointAssignment => self
                .endpoints
                .iter()
                .cloned()
                .map(Resource::EndpointAssignment)
                .collect(),
            ResourceKind::RouteConfiguration => self
                .routes
                .iter()
                .cloned()
                .map(Resource::RouteConfiguration)
                .collect(),
            ResourceKind::Listener => self.listeners.iter().cloned().map(Resource::Listener).collect(),
        }
    }
}
