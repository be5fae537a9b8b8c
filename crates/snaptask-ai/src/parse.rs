use serde_json::{Map, Value};

use snaptask_core::suggestion::{parse_due_date, TaskSuggestion};

use crate::SuggestError;

/// Parse the model's textual reply into a suggestion.
///
/// The reply is expected to contain a JSON object with keys `task_name`,
/// `description` and `due_date`, possibly wrapped in markdown code fences.
/// The literal string `"null"` and the empty string count as absent for each
/// field. An unparseable due date degrades to no due date. All three fields
/// absent yields the empty sentinel suggestion, which is distinct from a
/// malformed reply.
pub fn parse_suggestion(text: &str) -> Result<TaskSuggestion, SuggestError> {
    let clean = strip_fences(text);
    let value: Value = serde_json::from_str(&clean)
        .map_err(|e| SuggestError::MalformedResponse(e.to_string()))?;
    let obj = value
        .as_object()
        .ok_or_else(|| SuggestError::MalformedResponse("reply is not a JSON object".into()))?;

    let title = opt_field(obj, "task_name");
    let description = opt_field(obj, "description");
    let due_raw = opt_field(obj, "due_date");

    if title.is_none() && description.is_none() && due_raw.is_none() {
        return Ok(TaskSuggestion::empty());
    }

    Ok(TaskSuggestion {
        title: title.unwrap_or_default(),
        description: description.unwrap_or_default(),
        due_date: due_raw.as_deref().and_then(parse_due_date),
    })
}

fn strip_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}

fn opt_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    match obj.get(key)? {
        Value::Null => None,
        Value::String(s) if s.is_empty() || s == "null" => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
