//! Resource classification.

use crate::resource::kind::ResourceKind;
use crate::resource::types::Resource;

/// Result of classifying a decoded resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Kind(ResourceKind),
    Unrecognized { type_url: String },
}

/// Assign a decoded resource to its kind.
pub fn classify(resource: &Resource) -> Classification {
    match resource {
        Resource::Cluster(_) => Classification::Kind(ResourceKind::Cluster),
        Resource::EndpointAssignment(_) => Classification::Kind(ResourceKind::EndpointAssignment),
        Resource::RouteConfiguration(_) => Classification::Kind(ResourceKind::RouteConfiguration),
        Resource::Listener(_) => Classification::Kind(ResourceKind::Listener),
        Resource::Unrecognized { type_url } => Classification::Unrecognized {
            type_url: type_url.clone(),
        },
    }
}
