use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Due-date format the model is instructed to reply with (ISO 8601, no zone).
pub const DUE_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Candidate task fields extracted from one image by the model.
///
/// Not persisted; the caller decides whether to materialize it as a task.
/// The all-empty value means "model explicitly found nothing" and is distinct
/// from a failed call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSuggestion {
    pub title: String,
    pub description: String,
    pub due_date: Option<DateTime<Utc>>,
}

impl TaskSuggestion {
    pub fn empty() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            due_date: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_empty() && self.description.is_empty() && self.due_date.is_none()
    }
}

/// Parse a model-supplied due date. Failures degrade to `None` rather than
/// rejecting the whole suggestion.
pub fn parse_due_date(s: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s, DUE_DATE_FORMAT)
        .ok()
        .map(|dt| dt.and_utc())
}
