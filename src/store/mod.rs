//! Snapshot store: the latest accepted snapshot per subscriber group.
//!
//! # Data Flow
//! ```text
//! reconciler ──set(key, snapshot)──▶ StoreEntry.current (ArcSwapOption)
//!                                    StoreEntry.changes (watch) ──▶ sessions
//! sessions   ──get(key)────────────▶ lock-free pointer load
//! ```
//!
//! # Design Decisions
//! - One entry per group key, created lazily by the first `set` or
//!   `subscribe`, so sessions can wait on a group that has no snapshot yet
//! - Snapshots are swapped whole behind an `Arc`; readers never see a mix
//! - DashMap guards are never held across an `.await`
//! - No history: `set` hands back the superseded snapshot and forgets it

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::observability::metrics;
use crate::snapshot::{Snapshot, Version};

/// Identifies the cohort of subscribers a snapshot is destined for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
pub struct GroupKey(String);

impl GroupKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for GroupKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl std::fmt::Display for GroupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug)]
struct StoreEntry {
    current: ArcSwapOption<Snapshot>,
    /// Version of the last commit, for change notification only.
    changes: watch::Sender<Option<Version>>,
}

impl StoreEntry {
    fn new() -> Self {
        let (changes, _) = watch::channel(None);
        Self { current: ArcSwapOption::empty(), changes }
    }
}

/// Process-wide keyed snapshot cache.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    entries: DashMap<GroupKey, Arc<StoreEntry>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, key: &GroupKey) -> Arc<StoreEntry> {
        if let Some(entry) = self.entries.get(key) {
            return entry.clone();
        }
        self.entries
            .entry(key.clone())
            .or_insert_with(|| Arc::new(StoreEntry::new()))
            .clone()
    }

    /// Atomically replace the snapshot for `key` and wake its subscribers.
    ///
    /// Returns the snapshot that was live before, if any.
    pub fn set(&self, key: &GroupKey, snapshot: Snapshot) -> Option<Arc<Snapshot>> {
        let entry = self.entry(key);
        let version = snapshot.version();
        let previous = entry.current.swap(Some(Arc::new(snapshot)));
        entry.changes.send_replace(Some(version));

        metrics::record_snapshot_committed(key.as_str(), version.generation());
        tracing::debug!(
            group = %key,
            version = %version,
            previous = ?previous.as_ref().map(|s| s.version().to_string()),
            subscribers = entry.changes.receiver_count(),
            "Snapshot committed to store"
        );
        previous
    }

    /// The live snapshot for `key`, or `None` before the first commit.
    pub fn get(&self, key: &GroupKey) -> Option<Arc<Snapshot>> {
        let entry = self.entries.get(key)?.clone();
        entry.current.load_full()
    }

    /// Watch `key` for commits. Works before the first commit.
    pub fn subscribe(&self, key: &GroupKey) -> SnapshotWatch {
        let entry = self.entry(key);
        let rx = entry.changes.subscribe();
        SnapshotWatch { entry, rx }
    }

    /// Group keys with an entry, sorted.
    pub fn keys(&self) -> Vec<GroupKey> {
        let mut keys: Vec<_> = self.entries.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }

    /// Number of groups that hold a committed snapshot.
    pub fn len(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.value().current.load().is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A subscription to one group's commits.
#[derive(Debug)]
pub struct SnapshotWatch {
    entry: Arc<StoreEntry>,
    rx: watch::Receiver<Option<Version>>,
}

impl SnapshotWatch {
    /// The live snapshot; marks every commit so far as seen.
    pub fn current(&mut self) -> Option<Arc<Snapshot>> {
        self.rx.borrow_and_update();
        self.entry.current.load_full()
    }

    /// Wait for the next commit and return the snapshot then live.
    ///
    /// Commits that land while the caller is busy collapse into one wakeup;
    /// the returned snapshot is always the newest.
    pub async fn next(&mut self) -> Arc<Snapshot> {
        loop {
            if self.rx.changed().await.is_err() {
                // The sender lives in `entry`, which this watch keeps alive.
                std::future::pending::<()>().await;
            }
            if let Some(snapshot) = self.current() {
                return snapshot;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::Resource;
    use crate::snapshot::testing::static_cluster;
    use crate::snapshot::SnapshotBuilder;
    use std::time::Duration;

    fn snapshot(generation: u64, cluster: &str) -> Snapshot {
        let mut builder = SnapshotBuilder::new();
        builder.insert(Resource::Cluster(static_cluster(cluster)));
        builder.build(Version::from_generation(generation)).unwrap()
    }

    #[test]
    fn test_get_before_and_after_set() {
        let store = SnapshotStore::new();
        let key = GroupKey::from("default");
        assert!(store.get(&key).is_none());
        assert!(store.is_empty());

        assert!(store.set(&key, snapshot(0, "a")).is_none());
        assert_eq!(store.get(&key).unwrap().version(), Version::from_generation(0));

        let previous = store.set(&key, snapshot(1, "b")).unwrap();
        assert_eq!(previous.version(), Version::from_generation(0));
        assert_eq!(store.get(&key).unwrap().version(), Version::from_generation(1));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_groups_are_independent() {
        let store = SnapshotStore::new();
        store.set(&"a".into(), snapshot(0, "x"));
        assert!(store.get(&"b".into()).is_none());

        // Subscribing creates an empty entry that does not count as committed.
        let _watch = store.subscribe(&"b".into());
        assert_eq!(store.keys(), vec![GroupKey::from("a"), GroupKey::from("b")]);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_watch_wakes_on_commit() {
        let store = Arc::new(SnapshotStore::new());
        let key = GroupKey::from("default");
        let mut watch = store.subscribe(&key);
        assert!(watch.current().is_none());

        let writer = store.clone();
        let k = key.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            writer.set(&k, snapshot(7, "a"));
        });

        let seen = tokio::time::timeout(Duration::from_secs(2), watch.next())
            .await
            .expect("commit notification");
        assert_eq!(seen.version(), Version::from_generation(7));
    }

    #[tokio::test]
    async fn test_burst_collapses_to_latest() {
        let store = SnapshotStore::new();
        let key = GroupKey::from("default");
        let mut watch = store.subscribe(&key);

        for generation in 0..5 {
            store.set(&key, snapshot(generation, "a"));
        }
        let seen = watch.next().await;
        assert_eq!(seen.version(), Version::from_generation(4));

        // Nothing further pending.
        assert!(tokio::time::timeout(Duration::from_millis(50), watch.next()).await.is_err());
    }
}
