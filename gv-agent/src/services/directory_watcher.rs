//! Filesystem creation events
//!
//! The ingestion loop consumes creation events through the `EventSource`
//! trait so it can be driven by a synthetic source in tests. The production
//! implementation wraps a notify watcher over the single flat watch
//! directory.

use std::path::{Path, PathBuf};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

/// A stream of "file created" paths for one directory.
///
/// Subscribing happens at construction time; `None` means the subscription
/// has ended. Delivery is at-least-once in arrival order.
pub trait EventSource {
    // Consumed on the runtime's main task only, so no Send bound is needed.
    #[allow(async_fn_in_trait)]
    async fn next_created(&mut self) -> Option<PathBuf>;
}

/// Notify-backed watcher for one flat directory.
///
/// Creation events are forwarded from the notify callback thread into an
/// unbounded channel, which provides the only buffering between arrival and
/// processing. Dropping the watcher ends the subscription.
pub struct DirectoryWatcher {
    // Kept alive for the lifetime of the subscription.
    _watcher: RecommendedWatcher,
    events: mpsc::UnboundedReceiver<PathBuf>,
}

impl DirectoryWatcher {
    /// Start watching `dir` (non-recursive) for created files.
    pub fn new(dir: &Path) -> Result<Self, notify::Error> {
        let (tx, rx) = mpsc::unbounded_channel();

        let mut watcher =
            notify::recommended_watcher(move |res: Result<Event, notify::Error>| match res {
                Ok(event) => {
                    if let EventKind::Create(_) = event.kind {
                        for path in event.paths {
                            // A closed receiver means the run loop already
                            // stopped; nothing left to deliver to.
                            let _ = tx.send(path);
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!("Watcher error: {}", e);
                }
            })?;

        watcher.watch(dir, RecursiveMode::NonRecursive)?;
        tracing::info!(dir = %dir.display(), "Watching for new images");

        Ok(Self {
            _watcher: watcher,
            events: rx,
        })
    }
}

impl EventSource for DirectoryWatcher {
    async fn next_created(&mut self) -> Option<PathBuf> {
        self.events.recv().await
    }
}
