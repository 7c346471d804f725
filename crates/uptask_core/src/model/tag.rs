//! Tag model.

use super::{require_text, TagId, TaskId, ValidationError};
use serde::Serialize;

/// Short label attached to one task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tag {
    pub id: TagId,
    pub task_id: TaskId,
    pub tag: String,
}

/// Insert request for a tag; the label is stored trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTag {
    pub tag: String,
}

impl NewTag {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().trim().to_string(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("tag", &self.tag)
    }
}
