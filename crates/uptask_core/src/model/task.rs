//! Task model plus the sort and filter vocabulary used by list queries.
//!
//! # Invariants
//! - `due_date` is a calendar date persisted as ISO `YYYY-MM-DD`, so text
//!   order equals date order.
//! - Lower `priority` values sort first.
//! - A done task is transient: completing it removes the row.

use super::{require_text, TaskId, TaskListId, ValidationError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Persisted task row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Task {
    pub id: TaskId,
    pub task_list_id: TaskListId,
    pub text: String,
    pub description: String,
    pub due_date: NaiveDate,
    pub priority: i32,
    pub is_done: bool,
}

/// Create/update request carrying the user-editable task fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub text: String,
    pub description: String,
    pub due_date: NaiveDate,
    pub priority: i32,
}

impl NewTask {
    /// Builds a request with empty description and priority 0.
    pub fn new(text: impl Into<String>, due_date: NaiveDate) -> Self {
        Self {
            text: text.into(),
            description: String::new(),
            due_date,
            priority: 0,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Task text must not be blank; description may be empty.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("text", &self.text)
    }
}

/// Column a task list is ordered by. Ties always break on id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Insertion order.
    #[default]
    Id,
    Text,
    Priority,
    DueDate,
}

impl SortKey {
    /// Maps the numeric sort codes used by host routes.
    ///
    /// `1` text, `2` priority, `3` due date; anything else is insertion order.
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => Self::Text,
            2 => Self::Priority,
            3 => Self::DueDate,
            _ => Self::Id,
        }
    }

    /// Parses `id|text|priority|due_date`; unknown names fall back to `Id`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "text" => Self::Text,
            "priority" => Self::Priority,
            "due_date" | "due-date" | "due" => Self::DueDate,
            _ => Self::Id,
        }
    }

    pub fn code(self) -> i32 {
        match self {
            Self::Id => 0,
            Self::Text => 1,
            Self::Priority => 2,
            Self::DueDate => 3,
        }
    }

    pub(crate) fn order_by_sql(self) -> &'static str {
        match self {
            Self::Id => "id ASC",
            Self::Text => "task ASC, id ASC",
            Self::Priority => "priority ASC, id ASC",
            Self::DueDate => "due_date ASC, id ASC",
        }
    }
}

/// Free-text task filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TaskFilter {
    #[default]
    All,
    /// Case-sensitive substring of text or description.
    Contains(String),
}

impl TaskFilter {
    /// Sentinel hosts pass when no filter is set.
    pub const NONE_SENTINEL: &'static str = "none";

    /// `""` and the `"none"` sentinel both mean no filtering.
    pub fn parse(value: &str) -> Self {
        if value.is_empty() || value == Self::NONE_SENTINEL {
            Self::All
        } else {
            Self::Contains(value.to_string())
        }
    }

    pub fn matches(&self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::Contains(needle) => {
                task.text.contains(needle.as_str()) || task.description.contains(needle.as_str())
            }
        }
    }
}
