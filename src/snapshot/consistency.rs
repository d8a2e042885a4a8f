//! Cross-kind referential consistency.
//!
//! # Rules
//! - Names are unique within each kind
//! - EDS clusters → an EndpointAssignment named by `eds_service_name`
//!   (or the cluster name)
//! - RouteConfiguration routes → a Cluster named by `cluster`
//! - Listeners with `route_config_name` → a RouteConfiguration of that name
//!
//! Unreferenced resources are allowed.

use std::collections::HashSet;

use thiserror::Error;

use crate::resource::ResourceKind;
use crate::snapshot::resource_set::ResourceSet;
use crate::snapshot::version::Version;

/// One broken invariant inside a candidate snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inconsistency {
    /// `kind/name` references `target_kind/target`, which does not exist.
    Dangling {
        kind: ResourceKind,
        name: String,
        target_kind: ResourceKind,
        target: String,
    },
    /// Two resources of `kind` share `name`.
    Duplicate { kind: ResourceKind, name: String },
}

impl std::fmt::Display for Inconsistency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Inconsistency::Dangling { kind, name, target_kind, target } => write!(
                f,
                "{kind} '{name}' references missing {target_kind} '{target}'"
            ),
            Inconsistency::Duplicate { kind, name } => {
                write!(f, "duplicate {kind} name '{name}'")
            }
        }
    }
}

/// A candidate snapshot that failed the consistency check.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("snapshot {version} is inconsistent: {}", render(.problems))]
pub struct ConsistencyError {
    pub version: Version,
    pub problems: Vec<Inconsistency>,
}

fn render(problems: &[Inconsistency]) -> String {
    problems.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

/// Check every cross-reference in `set`. Returns all problems found.
pub fn check(set: &ResourceSet) -> Vec<Inconsistency> {
    let mut problems = Vec::new();

    let clusters = unique_names(
        ResourceKind::Cluster,
        set.clusters.iter().map(|c| c.name.as_str()),
        &mut problems,
    );
    let endpoints = unique_names(
        ResourceKind::EndpointAssignment,
        set.endpoints.iter().map(|e| e.cluster_name.as_str()),
        &mut problems,
    );
    let routes = unique_names(
        ResourceKind::RouteConfiguration,
        set.routes.iter().map(|r| r.name.as_str()),
        &mut problems,
    );
    unique_names(
        ResourceKind::Listener,
        set.listeners.iter().map(|l| l.name.as_str()),
        &mut problems,
    );

    for cluster in &set.clusters {
        if let Some(target) = cluster.endpoint_reference() {
            if !endpoints.contains(target) {
                problems.push(Inconsistency::Dangling {
                    kind: ResourceKind::Cluster,
                    name: cluster.name.clone(),
                    target_kind: ResourceKind::EndpointAssignment,
                    target: target.to_string(),
                });
            }
        }
    }

    for route in &set.routes {
        // One report per missing target, even if several routes use it.
        let mut reported = HashSet::new();
        for target in route.cluster_references() {
            if !clusters.contains(target) && reported.insert(target) {
                problems.push(Inconsistency::Dangling {
                    kind: ResourceKind::RouteConfiguration,
                    name: route.name.clone(),
                    target_kind: ResourceKind::Cluster,
                    target: target.to_string(),
                });
            }
        }
    }

    for listener in &set.listeners {
        if let Some(target) = listener.route_config_name.as_deref() {
            if !routes.contains(target) {
                problems.push(Inconsistency::Dangling {
                    kind: ResourceKind::Listener,
                    name: listener.name.clone(),
                    target_kind: ResourceKind::RouteConfiguration,
                    target: target.to_string(),
                });
            }
        }
    }

    problems
}

fn unique_names<'a>(
    kind: ResourceKind,
    names: impl Iterator<Item = &'a str>,
    problems: &mut Vec<Inconsistency>,
) -> HashSet<&'a str> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            problems.push(Inconsistency::Duplicate { kind, name: name.to_string() });
        }
    }
    seen
}
