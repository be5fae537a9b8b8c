use notify::event::{AccessKind, AccessMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use snaptask_core::Screenshot;

use crate::{ScreenshotStore, StoreError};

/// Live subscription to the screenshot listing.
///
/// Backed by a filesystem watch on the store directory. The first call to
/// [`next`](Self::next) returns the current listing; later calls block until
/// a create/modify/remove/close-write event changes it. Consecutive
/// structurally-equal listings are suppressed. Dropping the feed tears down
/// the watch.
pub struct ScreenshotFeed {
    store: ScreenshotStore,
    _watcher: RecommendedWatcher,
    events: mpsc::UnboundedReceiver<()>,
    primed: bool,
    last: Option<Vec<Screenshot>>,
}

impl ScreenshotStore {
    pub fn observe(&self) -> Result<ScreenshotFeed, StoreError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| match res {
                Ok(event) if is_relevant(&event.kind) => {
                    let _ = tx.send(());
                }
                Ok(_) => {}
                Err(e) => warn!(error = %e, "screenshot watch error"),
            },
            notify::Config::default(),
        )
        .map_err(|e| StoreError::Watch(e.to_string()))?;
        watcher
            .watch(self.dir(), RecursiveMode::NonRecursive)
            .map_err(|e| StoreError::Watch(e.to_string()))?;

        Ok(ScreenshotFeed {
            store: self.clone(),
            _watcher: watcher,
            events: rx,
            primed: false,
            last: None,
        })
    }
}

fn is_relevant(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_)
            | EventKind::Modify(_)
            | EventKind::Remove(_)
            | EventKind::Access(AccessKind::Close(AccessMode::Write))
    )
}

impl ScreenshotFeed {
    /// Next listing, or `None` once the watch backend has shut down.
    pub async fn next(&mut self) -> Option<Vec<Screenshot>> {
        loop {
            if self.primed {
                self.events.recv().await?;
                // Collapse a burst of events into one re-listing
                while self.events.try_recv().is_ok() {}
            }
            self.primed = true;

            let listing = self.store.list().await;
            if self.last.as_ref() == Some(&listing) {
                debug!("screenshot listing unchanged, suppressing emission");
                continue;
            }
            self.last = Some(listing.clone());
            return Some(listing);
        }
    }
}
