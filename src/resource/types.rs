//! Typed resource payloads.
//!
//! Every payload derives Serde so the same struct can be read from any of
//! the supported file encodings and written back out in pushes.

use serde::{Deserialize, Serialize};

use crate::resource::kind::ResourceKind;

/// A network address (`host:port`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SocketAddress {
    pub host: String,
    pub port: u16,
}

impl std::fmt::Display for SocketAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Load balancing policy for a cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LbPolicy {
    #[default]
    RoundRobin,
    LeastRequest,
    Random,
}

/// How a cluster learns its members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryType {
    /// Members listed inline in `hosts`.
    #[default]
    Static,
    /// Members resolved from the DNS names in `hosts`.
    StrictDns,
    /// Members delivered through an `EndpointAssignment`.
    Eds,
}

/// An upstream cluster.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Cluster {
    pub name: String,

    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    #[serde(default)]
    pub lb_policy: LbPolicy,

    #[serde(default)]
    pub discovery: DiscoveryType,

    #[serde(default)]
    pub hosts: Vec<SocketAddress>,

    /// Name of the endpoint assignment to use for EDS clusters.
    /// Falls back to the cluster name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eds_service_name: Option<String>,
}

fn default_connect_timeout_ms() -> u64 {
    5_000
}

impl Cluster {
    /// The endpoint assignment this cluster depends on, if any.
    pub fn endpoint_reference(&self) -> Option<&str> {
        match self.discovery {
            DiscoveryType::Eds => Some(self.eds_service_name.as_deref().unwrap_or(&self.name)),
            DiscoveryType::Static | DiscoveryType::StrictDns => None,
        }
    }
}

/// A group of endpoints sharing a locality.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LocalityEndpoints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locality: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lb_weight: Option<u32>,

    pub addresses: Vec<SocketAddress>,
}

/// Endpoint membership for one EDS cluster.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EndpointAssignment {
    pub cluster_name: String,

    #[serde(default)]
    pub endpoints: Vec<LocalityEndpoints>,
}

/// A single route entry inside a virtual host.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Route {
    pub prefix: String,
    pub cluster: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

/// A virtual host: a set of domains sharing a route table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct VirtualHost {
    pub name: String,
    pub domains: Vec<String>,
    pub routes: Vec<Route>,
}

/// A named route table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RouteConfiguration {
    pub name: String,

    #[serde(default)]
    pub virtual_hosts: Vec<VirtualHost>,
}

impl RouteConfiguration {
    /// Every cluster name referenced by this route table, in declaration order.
    pub fn cluster_references(&self) -> impl Iterator<Item = &str> {
        self.virtual_hosts
            .iter()
            .flat_map(|vh| vh.routes.iter())
            .map(|route| route.cluster.as_str())
    }
}

/// A listening socket on the subscriber side.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Listener {
    pub name: String,
    pub address: SocketAddress,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stat_prefix: Option<String>,

    /// Route table delivered separately and bound by name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_config_name: Option<String>,
}

/// A decoded resource file.
///
/// Known types carry their payload; any other well-formed type URL is kept
/// as `Unrecognized` so the classifier can drop it with a warning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    Cluster(Cluster),
    EndpointAssignment(EndpointAssignment),
    RouteConfiguration(RouteConfiguration),
    Listener(Listener),
    Unrecognized { type_url: String },
}

impl Resource {
    /// The resource's name, unique within its kind.
    pub fn name(&self) -> &str {
        match self {
            Resource::Cluster(c) => &c.name,
            Resource::EndpointAssignment(e) => &e.cluster_name,
            Resource::RouteConfiguration(r) => &r.name,
            Resource::Listener(l) => &l.name,
            Resource::Unrecognized { type_url } => type_url,
        }
    }

    pub fn type_url(&self) -> String {
        match self {
            Resource::Cluster(_) => ResourceKind::Cluster.type_url(),
            Resource::EndpointAssignment(_) => ResourceKind::EndpointAssignment.type_url(),
            Resource::RouteConfiguration(_) => ResourceKind::RouteConfiguration.type_url(),
            Resource::Listener(_) => ResourceKind::Listener.type_url(),
            Resource::Unrecognized { type_url } => type_url.clone(),
        }
    }
}
