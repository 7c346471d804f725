//! Task list model.

use super::{require_text, TaskListId, UserId, ValidationError};
use serde::Serialize;

/// Named, emoji-labelled grouping of tasks owned by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskList {
    pub id: TaskListId,
    pub user_id: UserId,
    pub name: String,
    pub emoji: String,
}

impl TaskList {
    /// Header label shown above a list, e.g. `"🛒 Groceries"`.
    pub fn label(&self) -> String {
        format!("{} {}", self.emoji, self.name)
    }
}

/// Create/rename request for a task list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTaskList {
    pub name: String,
    pub emoji: String,
}

impl NewTaskList {
    pub fn new(name: impl Into<String>, emoji: impl Into<String>) -> Self {
        Self {
            name: name.into().trim().to_string(),
            emoji: emoji.into().trim().to_string(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name)?;
        require_text("emoji", &self.emoji)
    }
}
