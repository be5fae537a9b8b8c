use tokio::sync::watch;
use tracing::debug;

use snaptask_core::Task;

use crate::{Db, DbError};

/// Live subscription to the ordered task listing.
///
/// The first call to [`next`](Self::next) returns the current listing; later
/// calls block until a mutation changes the listing. Consecutive
/// structurally-equal listings are suppressed. Dropping the feed releases the
/// revision-channel subscription.
pub struct TaskFeed {
    db: Db,
    revision: watch::Receiver<u64>,
    primed: bool,
    last: Option<Vec<Task>>,
}

impl TaskFeed {
    pub(crate) fn new(db: Db, revision: watch::Receiver<u64>) -> Self {
        Self {
            db,
            revision,
            primed: false,
            last: None,
        }
    }

    pub async fn next(&mut self) -> Result<Vec<Task>, DbError> {
        loop {
            if self.primed {
                self.revision
                    .changed()
                    .await
                    .map_err(|_| DbError::Internal("task feed closed".into()))?;
            }
            self.primed = true;

            let db = self.db.clone();
            let tasks = tokio::task::spawn_blocking(move || db.get_all_tasks())
                .await
                .map_err(|e| DbError::Internal(e.to_string()))??;

            if self.last.as_ref() == Some(&tasks) {
                debug!("task listing unchanged, suppressing emission");
                continue;
            }
            self.last = Some(tasks.clone());
            return Ok(tasks);
        }
    }
}
