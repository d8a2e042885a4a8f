//! Snapshot versions.

use std::sync::atomic::{AtomicU64, Ordering};

/// Version identifier of a snapshot, rendered as `v<generation>`.
///
/// Ordered by generation, so a newer snapshot always compares greater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version(u64);

impl Version {
    pub const fn from_generation(generation: u64) -> Self {
        Self(generation)
    }

    pub const fn generation(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Process-wide generation counter.
///
/// Incremented once per reconciliation attempt, whether or not the attempt
/// is committed, so a rejected candidate never donates its version to a
/// later snapshot.
#[derive(Debug, Default)]
pub struct VersionCounter {
    next: AtomicU64,
}

impl VersionCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start counting at `generation` instead of zero.
    #[cfg(test)]
    pub fn starting_at(generation: u64) -> Self {
        Self { next: AtomicU64::new(generation) }
    }

    /// Claim the next version.
    pub fn next_version(&self) -> Version {
        Version(self.next.fetch_add(1, Ordering::SeqCst))
    }

    /// The version the next call to `next_version` will return.
    #[cfg(test)]
    pub fn peek(&self) -> Version {
        Version(self.next.load(Ordering::SeqCst))
    }
}
