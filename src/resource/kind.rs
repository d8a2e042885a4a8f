//! Resource kinds and their type URLs.

use serde::{Deserialize, Serialize};

/// Prefix shared by every type URL this server understands.
pub const TYPE_URL_PREFIX: &str = "type.config-plane.dev/";

/// The four resource categories distributed to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Cluster,
    EndpointAssignment,
    RouteConfiguration,
    Listener,
}

impl ResourceKind {
    /// All kinds, in push order.
    ///
    /// Clusters and their endpoints go out before the routes and listeners
    /// that name them, so a subscriber applying pushes in arrival order never
    /// sees a dangling reference.
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::Cluster,
        ResourceKind::EndpointAssignment,
        ResourceKind::RouteConfiguration,
        ResourceKind::Listener,
    ];

    /// Dense index for per-kind tables.
    pub const fn index(self) -> usize {
        match self {
            ResourceKind::Cluster => 0,
            ResourceKind::EndpointAssignment => 1,
            ResourceKind::RouteConfiguration => 2,
            ResourceKind::Listener => 3,
        }
    }

    /// Short type name (the part of the type URL after the prefix).
    pub const fn type_name(self) -> &'static str {
        match self {
            ResourceKind::Cluster => "Cluster",
            ResourceKind::EndpointAssignment => "EndpointAssignment",
            ResourceKind::RouteConfiguration => "RouteConfiguration",
            ResourceKind::Listener => "Listener",
        }
    }

    /// Full type URL used in resource envelopes and pushes.
    pub fn type_url(self) -> String {
        format!("{}{}", TYPE_URL_PREFIX, self.type_name())
    }

    /// Resolve a type URL to a kind. Returns `None` for any other type.
    pub fn from_type_url(type_url: &str) -> Option<Self> {
        let name = type_url.strip_prefix(TYPE_URL_PREFIX)?;
        Self::ALL.into_iter().find(|kind| kind.type_name() == name)
    }

    /// Label used in logs and metrics.
    pub const fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Cluster => "cluster",
            ResourceKind::EndpointAssignment => "endpoint_assignment",
            ResourceKind::RouteConfiguration => "route_configuration",
            ResourceKind::Listener => "listener",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fixed-size table holding one value per resource kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PerKind<T>([T; 4]);

impl<T> PerKind<T> {
    /// Build a table by evaluating `f` for each kind.
    pub fn from_fn(mut f: impl FnMut(ResourceKind) -> T) -> Self {
        Self(ResourceKind::ALL.map(&mut f))
    }

    /// Fallible variant of `from_fn`; stops at the first error.
    pub fn try_from_fn<E>(mut f: impl FnMut(ResourceKind) -> Result<T, E>) -> Result<Self, E> {
        let [a, b, c, d] = ResourceKind::ALL;
        Ok(Self([f(a)?, f(b)?, f(c)?, f(d)?]))
    }

    pub fn get(&self, kind: ResourceKind) -> &T {
        &self.0[kind.index()]
    }

    pub fn get_mut(&mut self, kind: ResourceKind) -> &mut T {
        &mut self.0[kind.index()]
    }

    /// Iterate `(kind, value)` pairs in push order.
    pub fn iter(&self) -> impl Iterator<Item = (ResourceKind, &T)> {
        ResourceKind::ALL.into_iter().zip(self.0.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_url_lookup() {
        for kind in ResourceKind::ALL {
            assert_eq!(ResourceKind::from_type_url(&kind.type_url()), Some(kind));
        }
        assert_eq!(ResourceKind::from_type_url("type.config-plane.dev/Secret"), None);
        assert_eq!(ResourceKind::from_type_url("Cluster"), None);
    }

    #[test]
    fn per_kind_indexes_match() {
        let table = PerKind::from_fn(|kind| kind.index());
        for (kind, idx) in table.iter() {
            assert_eq!(kind.index(), *idx);
        }
    }
}
