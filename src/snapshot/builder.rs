//! Candidate snapshot assembly.

use std::sync::Arc;

use thiserror::Error;

use crate::resource::encode::{to_json_envelope, EncodeError};
use crate::resource::{Classification, PerKind, Resource, ResourceKind};
use crate::snapshot::consistency::{check, ConsistencyError};
use crate::snapshot::resource_set::ResourceSet;
use crate::snapshot::version::Version;
use crate::snapshot::{KindResources, Snapshot};

/// Why a candidate snapshot was not produced.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Inconsistent(#[from] ConsistencyError),

    #[error("snapshot {version}: failed to encode {kind} resources: {source}")]
    Encode {
        version: Version,
        kind: ResourceKind,
        #[source]
        source: EncodeError,
    },
}

/// Accumulates classified resources into a candidate snapshot.
#[derive(Debug, Default)]
pub struct SnapshotBuilder {
    resources: ResourceSet,
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify and add one decoded resource.
    pub fn insert(&mut self, resource: Resource) -> Classification {
        self.resources.insert(resource)
    }

    pub fn resources(&self) -> &ResourceSet {
        &self.resources
    }

    /// Check referential consistency and freeze the candidate.
    pub fn build(self, version: Version) -> Result<Snapshot, BuildError> {
        let problems = check(&self.resources);
        if !problems.is_empty() {
            return Err(ConsistencyError { version, problems }.into());
        }

        let kinds = PerKind::try_from_fn(|kind| {
            encode_kind(&self.resources, kind)
                .map_err(|source| BuildError::Encode { version, kind, source })
        })?;

        Ok(Snapshot { version, resources: self.resources, kinds })
    }
}

fn encode_kind(set: &ResourceSet, kind: ResourceKind) -> Result<KindResources, EncodeError> {
    let resources = set.resources(kind);
    let names = resources.iter().map(|r| r.name().to_string()).collect();
    let encoded = resources
        .iter()
        .map(to_json_envelope)
        .collect::<Result<Vec<_>, _>>()?;
    let digest = blake3::hash(&serde_json::to_vec(&encoded)?);

    Ok(KindResources { names, encoded: Arc::new(encoded), digest })
}
