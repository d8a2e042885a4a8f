//! Resource directory watcher for hot reload.

use std::path::PathBuf;
use std::time::Duration;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::{broadcast, mpsc};

use crate::reconcile::trigger::{ReconcileTrigger, TriggerReason};
use crate::resource::is_decodable;

/// Watches resource directories and fires the reconcile trigger on change.
pub struct DirectoryWatcher {
    directories: Vec<PathBuf>,
    debounce: Duration,
    trigger: ReconcileTrigger,
}

impl DirectoryWatcher {
    pub fn new(directories: Vec<PathBuf>, debounce: Duration, trigger: ReconcileTrigger) -> Self {
        Self { directories, debounce, trigger }
    }

    /// Start watching.
    ///
    /// The returned watcher must be kept alive; dropping it stops the
    /// notifications. Events are debounced on a Tokio task so a burst of
    /// writes (editor save, `kubectl apply`) produces one trigger.
    pub fn run(self, shutdown: broadcast::Receiver<()>) -> Result<RecommendedWatcher, notify::Error> {
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if is_relevant(&event) {
                        tracing::debug!(paths = ?event.paths, kind = ?event.kind, "Resource directory change detected");
                        let _ = events_tx.send(());
                    }
                }
                Err(e) => tracing::warn!("Watcher error: {:?}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        for dir in &self.directories {
            match watcher.watch(dir, RecursiveMode::NonRecursive) {
                Ok(()) => tracing::info!(path = %dir.display(), "Watching resource directory"),
                Err(e) => {
                    tracing::warn!(path = %dir.display(), error = %e, "Cannot watch resource directory")
                }
            }
        }

        tokio::spawn(debounce(events_rx, self.debounce, self.trigger, shutdown));
        Ok(watcher)
    }
}

fn is_relevant(event: &Event) -> bool {
    if matches!(event.kind, EventKind::Access(_)) {
        return false;
    }
    // `..data` is the symlink swapped atomically by mounted config maps.
    event.paths.iter().any(|p| {
        is_decodable(p)
            || p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(".."))
    })
}

async fn debounce(
    mut events: mpsc::UnboundedReceiver<()>,
    window: Duration,
    trigger: ReconcileTrigger,
    mut shutdown: broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            event = events.recv() => {
                if event.is_none() {
                    break;
                }
                tokio::time::sleep(window).await;
                while events.try_recv().is_ok() {}
                trigger.fire(TriggerReason::FileChange);
            }
            _ = shutdown.recv() => break,
        }
    }
}
