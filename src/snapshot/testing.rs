//! Resource fixtures shared by unit tests.

use crate::resource::types::{
    Cluster, DiscoveryType, EndpointAssignment, LbPolicy, Listener, LocalityEndpoints, Route,
    RouteConfiguration, SocketAddress, VirtualHost,
};

pub fn addr(port: u16) -> SocketAddress {
    SocketAddress { host: "127.0.0.1".into(), port }
}

pub fn static_cluster(name: &str) -> Cluster {
    Cluster {
        name: name.into(),
        connect_timeout_ms: 250,
        lb_policy: LbPolicy::RoundRobin,
        discovery: DiscoveryType::Static,
        hosts: vec![addr(8080)],
        eds_service_name: None,
    }
}

pub fn eds_cluster(name: &str, service: Option<&str>) -> Cluster {
    Cluster {
        discovery: DiscoveryType::Eds,
        hosts: Vec::new(),
        eds_service_name: service.map(str::to_string),
        ..static_cluster(name)
    }
}

pub fn assignment(cluster_name: &str) -> EndpointAssignment {
    EndpointAssignment {
        cluster_name: cluster_name.into(),
        endpoints: vec![LocalityEndpoints {
            locality: None,
            lb_weight: None,
            addresses: vec![addr(9000)],
        }],
    }
}

pub fn route_config(name: &str, clusters: &[&str]) -> RouteConfiguration {
    RouteConfiguration {
        name: name.into(),
        virtual_hosts: vec![VirtualHost {
            name: "all".into(),
            domains: vec!["*".into()],
            routes: clusters
                .iter()
                .map(|c| Route { prefix: "/".into(), cluster: c.to_string(), timeout_ms: None })
                .collect(),
        }],
    }
}

pub fn listener(name: &str, route: Option<&str>) -> Listener {
    Listener {
        name: name.into(),
        address: addr(10000),
        stat_prefix: None,
        route_config_name: route.map(str::to_string),
    }
}
