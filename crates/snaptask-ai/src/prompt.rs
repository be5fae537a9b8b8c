use chrono::{DateTime, Local};

/// Build the task-extraction prompt, anchored to the current date so relative
/// phrases in the screenshot ("tomorrow", "next Friday") resolve correctly.
pub fn extraction_prompt(now: DateTime<Local>) -> String {
    let mut prompt = String::new();
    prompt.push_str(
        "You are a task extraction assistant. Analyze the provided image and \
         extract task information.\n\n",
    );
    prompt.push_str("**Current Context:**\n");
    prompt.push_str(&format!(
        "- Date: {} ({})\n\n",
        now.format("%Y-%m-%d %H:%M:%S"),
        now.format("%A"),
    ));
    prompt.push_str(
        "**Goal:**\n\
         Extract:\n\
         1. **Task Name**: Short title (max 50 chars).\n\
         2. **Description**: Brief description.\n\
         3. **Due Date**: specific date mentioned or implied (e.g., \"tomorrow\").\n\n",
    );
    prompt.push_str(
        "**Rules:**\n\
         - Only extract CLEAR info.\n\
         - Return JSON structure:\n\
         {\n\
             \"task_name\": \"...\",\n\
             \"description\": \"...\",\n\
             \"due_date\": \"YYYY-MM-DDTHH:MM:SS\" (ISO 8601) or null\n\
         }\n\
         - If vague/no task info, return null values.\n",
    );
    prompt
}
