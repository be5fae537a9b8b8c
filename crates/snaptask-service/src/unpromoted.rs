use std::collections::HashSet;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use snaptask_core::{Screenshot, Task};
use snaptask_db::TaskFeed;
use snaptask_store::ScreenshotFeed;

enum Update {
    Files(Vec<Screenshot>),
    Tasks(Vec<Task>),
}

/// Live view of unpromoted screenshots: the screenshot listing minus every
/// path a task references.
///
/// Combine-latest over the two upstream feeds: the join recomputes on every
/// emission from either side, starting from the first emission of whichever
/// side arrives first. Dropping the feed aborts both forwarders, which drops
/// the upstream feeds and with them the filesystem watch.
pub struct UnpromotedFeed {
    rx: mpsc::UnboundedReceiver<Update>,
    forwarders: [JoinHandle<()>; 2],
    files: Vec<Screenshot>,
    task_paths: HashSet<String>,
    last: Option<Vec<Screenshot>>,
}

impl UnpromotedFeed {
    pub(crate) fn spawn(mut files: ScreenshotFeed, mut tasks: TaskFeed) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        let file_tx = tx.clone();
        let file_forwarder = tokio::spawn(async move {
            while let Some(listing) = files.next().await {
                if file_tx.send(Update::Files(listing)).is_err() {
                    break;
                }
            }
        });
        let task_forwarder = tokio::spawn(async move {
            while let Ok(listing) = tasks.next().await {
                if tx.send(Update::Tasks(listing)).is_err() {
                    break;
                }
            }
        });

        Self {
            rx,
            forwarders: [file_forwarder, task_forwarder],
            files: Vec::new(),
            task_paths: HashSet::new(),
            last: None,
        }
    }

    /// Next derived listing, or `None` once both upstream feeds have closed.
    pub async fn next(&mut self) -> Option<Vec<Screenshot>> {
        loop {
            match self.rx.recv().await? {
                Update::Files(listing) => self.files = listing,
                Update::Tasks(tasks) => {
                    self.task_paths = tasks.into_iter().map(|t| t.image_path).collect();
                }
            }

            let derived: Vec<Screenshot> = self
                .files
                .iter()
                .filter(|shot| !self.task_paths.contains(&shot.path_str()))
                .cloned()
                .collect();

            if self.last.as_ref() == Some(&derived) {
                debug!("unpromoted view unchanged, suppressing emission");
                continue;
            }
            self.last = Some(derived.clone());
            return Some(derived);
        }
    }
}

impl Drop for UnpromotedFeed {
    fn drop(&mut self) {
        for handle in &self.forwarders {
            handle.abort();
        }
    }
}
