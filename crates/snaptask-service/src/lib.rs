mod unpromoted;

use std::path::Path;

use thiserror::Error;
use tracing::{debug, warn};

use snaptask_ai::{SuggestClient, SuggestError};
use snaptask_core::{Task, TaskDraft, TaskSuggestion};
use snaptask_db::{Db, DbError, TaskFeed};
use snaptask_store::{ScreenshotFeed, ScreenshotStore, StoreError};

pub use unpromoted::UnpromotedFeed;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<DbError> for ServiceError {
    fn from(e: DbError) -> Self {
        ServiceError::Internal(e.to_string())
    }
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        ServiceError::Internal(e.to_string())
    }
}

/// The promotion workflow: joins the screenshot store and the task table.
///
/// A screenshot is "unpromoted" while no task row references its path.
/// Promoting attaches a task without moving the image; demoting removes the
/// row and keeps the image; a full delete removes both. The service owns
/// neither side, it only coordinates.
pub struct SnapService {
    files: ScreenshotStore,
    db: Db,
    ai: Option<SuggestClient>,
}

impl SnapService {
    pub fn new(files: ScreenshotStore, db: Db, ai: Option<SuggestClient>) -> Self {
        Self { files, db, ai }
    }

    pub fn files(&self) -> &ScreenshotStore {
        &self.files
    }

    /// Run a database operation off the caller's thread.
    async fn with_db<T, F>(&self, f: F) -> Result<T, ServiceError>
    where
        T: Send + 'static,
        F: FnOnce(&Db) -> Result<T, DbError> + Send + 'static,
    {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || f(&db))
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))?
            .map_err(Into::into)
    }

    // -- Task queries --

    pub async fn list_tasks(&self) -> Result<Vec<Task>, ServiceError> {
        self.with_db(|db| db.get_all_tasks()).await
    }

    pub async fn get_task(&self, id: i64) -> Result<Option<Task>, ServiceError> {
        self.with_db(move |db| db.get_task(id)).await
    }

    pub async fn get_task_by_path(&self, path: &str) -> Result<Option<Task>, ServiceError> {
        let path = path.to_string();
        self.with_db(move |db| db.get_task_by_path(&path)).await
    }

    /// Insert when the task has no id yet, otherwise update.
    pub async fn save_task(&self, mut task: Task) -> Result<Task, ServiceError> {
        if task.id == 0 {
            let to_insert = task.clone();
            task.id = self.with_db(move |db| db.insert_task(&to_insert)).await?;
        } else {
            let to_update = task.clone();
            let changed = self.with_db(move |db| db.update_task(&to_update)).await?;
            if changed == 0 {
                return Err(ServiceError::NotFound(format!("task {}", task.id)));
            }
        }
        Ok(task)
    }

    pub async fn toggle_completed(&self, task: &Task) -> Result<Task, ServiceError> {
        let mut toggled = task.clone();
        toggled.is_completed = !toggled.is_completed;
        self.save_task(toggled).await
    }

    // -- Promotion workflow --

    /// Attach a task to the image at `path`. An empty draft (no title, no due
    /// date) is a no-op and leaves the image unpromoted.
    pub async fn promote(
        &self,
        path: &str,
        draft: TaskDraft,
    ) -> Result<Option<Task>, ServiceError> {
        if draft.is_empty() {
            debug!(path, "empty draft, image stays unpromoted");
            return Ok(None);
        }
        let path = path.to_string();
        self.with_db(move |db| {
            let task = match db.get_task_by_path(&path)? {
                Some(mut existing) => {
                    existing.title = draft.title;
                    existing.description = draft.description;
                    existing.due_date = draft.due_date;
                    db.update_task(&existing)?;
                    existing
                }
                None => {
                    let mut task = Task::from_draft(path, draft);
                    task.id = db.insert_task(&task)?;
                    task
                }
            };
            Ok(Some(task))
        })
        .await
    }

    /// Remove the task row only; the image file reverts to an unpromoted snap.
    pub async fn demote(&self, task: &Task) -> Result<(), ServiceError> {
        let task = task.clone();
        self.with_db(move |db| db.delete_task(&task)).await?;
        Ok(())
    }

    /// Remove a task together with its backing image. The image is deleted
    /// first, best-effort: a failed file delete never keeps the row alive.
    pub async fn delete_task(&self, task: &Task) -> Result<(), ServiceError> {
        if let Err(e) = self.files.delete(Path::new(&task.image_path)).await {
            warn!(
                path = %task.image_path,
                error = %e,
                "failed to delete backing image, removing task row anyway"
            );
        }
        let task = task.clone();
        self.with_db(move |db| db.delete_task(&task)).await?;
        Ok(())
    }

    /// Delete an image that has no task attached.
    pub async fn delete_image(&self, path: &Path) -> Result<(), ServiceError> {
        self.files.delete(path).await?;
        Ok(())
    }

    /// Remove every completed task and its backing image. File deletes are
    /// best-effort per file; rows are removed in one bulk delete. Returns the
    /// number of rows removed.
    pub async fn delete_completed(&self) -> Result<usize, ServiceError> {
        let completed = self.with_db(|db| db.get_completed_tasks()).await?;
        for task in &completed {
            if let Err(e) = self.files.delete(Path::new(&task.image_path)).await {
                warn!(path = %task.image_path, error = %e, "failed to delete completed task image");
            }
        }
        self.with_db(|db| db.delete_completed_tasks()).await
    }

    // -- AI suggestion --

    /// Ask the model for a candidate task. Every failure class maps to
    /// `None`; the classes differ only in what gets logged.
    pub async fn suggest(&self, path: &Path) -> Option<TaskSuggestion> {
        let client = match &self.ai {
            Some(client) => client,
            None => {
                debug!("no AI client configured, skipping suggestion");
                return None;
            }
        };
        match client.suggest(path).await {
            Ok(suggestion) => Some(suggestion),
            Err(e @ SuggestError::UnreadableImage(_)) => {
                warn!(error = %e, "suggestion skipped");
                None
            }
            Err(e @ SuggestError::MalformedResponse(_)) => {
                warn!(error = %e, "model reply could not be parsed");
                None
            }
            Err(e) => {
                warn!(error = %e, "suggestion failed");
                None
            }
        }
    }

    // -- Live views --

    pub fn observe_tasks(&self) -> TaskFeed {
        self.db.observe()
    }

    pub fn observe_screenshots(&self) -> Result<ScreenshotFeed, ServiceError> {
        Ok(self.files.observe()?)
    }

    /// The derived "snaps" view: the full screenshot listing minus every path
    /// referenced by a task, recomputed on any change to either source.
    ///
    /// Spawns forwarder tasks, so this must be called from within a tokio
    /// runtime.
    pub fn observe_unpromoted(&self) -> Result<UnpromotedFeed, ServiceError> {
        let files = self.files.observe()?;
        let tasks = self.db.observe();
        Ok(UnpromotedFeed::spawn(files, tasks))
    }
}
