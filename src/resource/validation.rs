//! Per-type semantic validation.
//!
//! # Responsibilities
//! - Check field values serde cannot express (non-empty names, port ranges)
//! - Check intra-resource shape (EDS clusters carry no inline hosts)
//!
//! # Design Decisions
//! - Cross-resource references are NOT checked here; that needs the whole
//!   snapshot and lives in the snapshot builder
//! - First violation wins: a resource is either valid or rejected

use thiserror::Error;

use crate::resource::types::{
    Cluster, DiscoveryType, EndpointAssignment, Listener, RouteConfiguration, SocketAddress,
};

/// A single semantic violation inside one resource.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("field '{field}' must not be empty")]
    Empty { field: String },

    #[error("field '{field}' must be greater than zero")]
    Zero { field: String },

    #[error("route prefix '{prefix}' must start with '/'")]
    BadPrefix { prefix: String },

    #[error("{discovery:?} cluster requires at least one host")]
    MissingHosts { discovery: DiscoveryType },

    #[error("EDS cluster must not list inline hosts")]
    InlineHostsOnEds,
}

/// Semantic validation hook run after envelope decoding.
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

fn non_empty(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Empty { field: field.to_string() });
    }
    Ok(())
}

fn non_zero(field: &str, value: u64) -> Result<(), ValidationError> {
    if value == 0 {
        return Err(ValidationError::Zero { field: field.to_string() });
    }
    Ok(())
}

fn address(field: &str, addr: &SocketAddress) -> Result<(), ValidationError> {
    non_empty(&format!("{field}.host"), &addr.host)?;
    non_zero(&format!("{field}.port"), u64::from(addr.port))
}

impl Validate for Cluster {
    fn validate(&self) -> Result<(), ValidationError> {
        non_empty("name", &self.name)?;
        non_zero("connect_timeout_ms", self.connect_timeout_ms)?;

        match self.discovery {
            DiscoveryType::Static | DiscoveryType::StrictDns => {
                if self.hosts.is_empty() {
                    return Err(ValidationError::MissingHosts { discovery: self.discovery });
                }
            }
            DiscoveryType::Eds => {
                if !self.hosts.is_empty() {
                    return Err(ValidationError::InlineHostsOnEds);
                }
                if let Some(service) = &self.eds_service_name {
                    non_empty("eds_service_name", service)?;
                }
            }
        }

        for (i, host) in self.hosts.iter().enumerate() {
            address(&format!("hosts[{i}]"), host)?;
        }
        Ok(())
    }
}

impl Validate for EndpointAssignment {
    fn validate(&self) -> Result<(), ValidationError> {
        non_empty("cluster_name", &self.cluster_name)?;
        for (i, group) in self.endpoints.iter().enumerate() {
            if let Some(weight) = group.lb_weight {
                non_zero(&format!("endpoints[{i}].lb_weight"), u64::from(weight))?;
            }
            for (j, addr) in group.addresses.iter().enumerate() {
                address(&format!("endpoints[{i}].addresses[{j}]"), addr)?;
            }
        }
        Ok(())
    }
}

impl Validate for RouteConfiguration {
    fn validate(&self) -> Result<(), ValidationError> {
        non_empty("name", &self.name)?;
        for (i, vh) in self.virtual_hosts.iter().enumerate() {
            non_empty(&format!("virtual_hosts[{i}].name"), &vh.name)?;
            if vh.domains.is_empty() {
                return Err(ValidationError::Empty { field: format!("virtual_hosts[{i}].domains") });
            }
            if vh.routes.is_empty() {
                return Err(ValidationError::Empty { field: format!("virtual_hosts[{i}].routes") });
            }
            for (j, route) in vh.routes.iter().enumerate() {
                if !route.prefix.starts_with('/') {
                    return Err(ValidationError::BadPrefix { prefix: route.prefix.clone() });
                }
                non_empty(&format!("virtual_hosts[{i}].routes[{j}].cluster"), &route.cluster)?;
                if let Some(timeout) = route.timeout_ms {
                    non_zero(&format!("virtual_hosts[{i}].routes[{j}].timeout_ms"), timeout)?;
                }
            }
        }
        Ok(())
    }
}

impl Validate for Listener {
    fn validate(&self) -> Result<(), ValidationError> {
        non_empty("name", &self.name)?;
        address("address", &self.address)?;
        if let Some(route) = &self.route_config_name {
            non_empty("route_config_name", route)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::types::{LbPolicy, Route, VirtualHost};

    fn addr(port: u16) -> SocketAddress {
        SocketAddress { host: "10.0.0.1".into(), port }
    }

    fn static_cluster() -> Cluster {
        Cluster {
            name: "c1".into(),
            connect_timeout_ms: 250,
            lb_policy: LbPolicy::RoundRobin,
            discovery: DiscoveryType::Static,
            hosts: vec![addr(8080)],
            eds_service_name: None,
        }
    }

    #[test]
    fn test_cluster_rules() {
        assert!(static_cluster().validate().is_ok());

        let mut c = static_cluster();
        c.hosts.clear();
        assert_eq!(
            c.validate(),
            Err(ValidationError::MissingHosts { discovery: DiscoveryType::Static })
        );

        let mut c = static_cluster();
        c.discovery = DiscoveryType::Eds;
        assert_eq!(c.validate(), Err(ValidationError::InlineHostsOnEds));

        let mut c = static_cluster();
        c.hosts = vec![addr(0)];
        assert!(matches!(c.validate(), Err(ValidationError::Zero { .. })));

        let mut c = static_cluster();
        c.name = "  ".into();
        assert_eq!(c.validate(), Err(ValidationError::Empty { field: "name".into() }));
    }

    #[test]
    fn test_route_rules() {
        let mut rc = RouteConfiguration {
            name: "r1".into(),
            virtual_hosts: vec![VirtualHost {
                name: "vh".into(),
                domains: vec!["*".into()],
                routes: vec![Route { prefix: "/".into(), cluster: "c1".into(), timeout_ms: None }],
            }],
        };
        assert!(rc.validate().is_ok());

        rc.virtual_hosts[0].routes[0].prefix = "api".into();
        assert_eq!(rc.validate(), Err(ValidationError::BadPrefix { prefix: "api".into() }));

        rc.virtual_hosts[0].routes[0].prefix = "/api".into();
        rc.virtual_hosts[0].domains.clear();
        assert!(matches!(rc.validate(), Err(ValidationError::Empty { .. })));
    }

    #[test]
    fn test_listener_rules() {
        let mut l = Listener {
            name: "http".into(),
            address: addr(80),
            stat_prefix: None,
            route_config_name: Some("r1".into()),
        };
        assert!(l.validate().is_ok());

        l.route_config_name = Some(String::new());
        assert!(l.validate().is_err());
    }
}
