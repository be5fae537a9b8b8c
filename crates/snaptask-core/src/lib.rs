pub mod screenshot;
pub mod suggestion;
pub mod task;

pub use screenshot::Screenshot;
pub use suggestion::TaskSuggestion;
pub use task::{Task, TaskDraft};
