use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A screenshot promoted to an actionable task.
///
/// `id` is 0 until the task is first inserted; SQLite assigns the real id.
/// `image_path` references the backing screenshot file and may dangle if the
/// file is removed externally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub image_path: String,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Build a fresh (unsaved) task for an image from user-entered fields.
    pub fn from_draft(image_path: impl Into<String>, draft: TaskDraft) -> Self {
        Self {
            id: 0,
            image_path: image_path.into(),
            title: draft.title,
            description: draft.description,
            due_date: draft.due_date,
            is_completed: false,
            created_at: Utc::now(),
        }
    }
}

/// User-entered task fields before they are attached to an image.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskDraft {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
}

impl TaskDraft {
    /// An empty draft carries neither a title nor a due date; promoting with
    /// one is a no-op and the image stays a plain snap.
    pub fn is_empty(&self) -> bool {
        self.title.trim().is_empty() && self.due_date.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_with_only_whitespace_title_is_empty() {
        let draft = TaskDraft {
            title: "   ".into(),
            description: Some("notes".into()),
            due_date: None,
        };
        assert!(draft.is_empty());
    }

    #[test]
    fn draft_with_due_date_but_no_title_is_not_empty() {
        let draft = TaskDraft {
            title: String::new(),
            description: None,
            due_date: Some(Utc::now()),
        };
        assert!(!draft.is_empty());
    }

    #[test]
    fn from_draft_starts_unsaved_and_incomplete() {
        let task = Task::from_draft(
            "/data/screenshots/screenshot_1.png",
            TaskDraft {
                title: "Buy milk".into(),
                ..Default::default()
            },
        );
        assert_eq!(task.id, 0);
        assert!(!task.is_completed);
        assert_eq!(task.title, "Buy milk");
    }
}
