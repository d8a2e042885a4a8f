//! Snapshot construction subsystem.
//!
//! # Data Flow
//! ```text
//! classified resources
//!     → resource_set.rs (four insertion-ordered collections)
//!     → builder.rs (consistency check, per-kind encoding + digest)
//!     → Snapshot (immutable, versioned)
//!     → handed to the store for commit
//! ```
//!
//! # Design Decisions
//! - A snapshot is immutable once built; replacing it is the store's job
//! - Per-kind wire encoding is computed once here, not per session
//! - Each kind carries a BLAKE3 digest of its encoding so sessions can tell
//!   "new version" apart from "new content"

pub mod builder;
pub mod consistency;
pub mod resource_set;
pub mod version;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

pub use builder::{BuildError, SnapshotBuilder};
pub use consistency::{ConsistencyError, Inconsistency};
pub use resource_set::ResourceSet;
pub use version::{Version, VersionCounter};

use crate::resource::{PerKind, ResourceKind};

/// An immutable, versioned, internally consistent resource bundle.
#[derive(Debug, Clone)]
pub struct Snapshot {
    version: Version,
    resources: ResourceSet,
    kinds: PerKind<KindResources>,
}

impl Snapshot {
    pub fn version(&self) -> Version {
        self.version
    }

    /// The typed resources, grouped by kind.
    pub fn resources(&self) -> &ResourceSet {
        &self.resources
    }

    /// Pre-encoded resources of one kind.
    pub fn kind(&self, kind: ResourceKind) -> &KindResources {
        self.kinds.get(kind)
    }
}

/// The resources of one kind inside a snapshot, ready to push.
#[derive(Debug, Clone)]
pub struct KindResources {
    names: Vec<String>,
    encoded: Arc<Vec<serde_json::Value>>,
    digest: blake3::Hash,
}

impl KindResources {
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// `"@type"`-tagged JSON envelopes, in insertion order.
    pub fn encoded(&self) -> &Arc<Vec<serde_json::Value>> {
        &self.encoded
    }

    /// Digest of the encoded resources; equal digests mean byte-identical
    /// content.
    pub fn digest(&self) -> blake3::Hash {
        self.digest
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
