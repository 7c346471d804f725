//! Domain model for users, task lists, tasks and tags.
//!
//! # Responsibility
//! - Define the records stored by core and the insert requests that create them.
//! - Validate requests before any SQL mutation.
//!
//! # Invariants
//! - Every record is identified by a typed integer id assigned by SQLite.
//! - Insertion id order is the default ordering for every list.

use rusqlite::types::{FromSql, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod tag;
pub mod task;
pub mod task_list;
pub mod user;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
            serde::Serialize, serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.0))
            }
        }

        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                i64::column_result(value).map(Self)
            }
        }
    };
}

entity_id!(
    /// Row id in `users`.
    UserId
);
entity_id!(
    /// Row id in `task_lists`.
    TaskListId
);
entity_id!(
    /// Row id in `user_tasks`.
    TaskId
);
entity_id!(
    /// Row id in `task_tags`.
    TagId
);

/// Model validation failure raised before persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required text field is empty (or blank, where trimming applies).
    EmptyField(&'static str),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyField(field) => write!(f, "`{field}` cannot be empty"),
        }
    }
}

impl Error for ValidationError {}

pub(crate) fn require_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{require_text, TaskId, ValidationError};

    #[test]
    fn ids_display_as_plain_integers() {
        assert_eq!(TaskId(42).to_string(), "42");
    }

    #[test]
    fn ids_serialize_transparently() {
        let json = serde_json::to_string(&TaskId(7)).expect("serialize id");
        assert_eq!(json, "7");
    }

    #[test]
    fn require_text_rejects_blank_values() {
        assert_eq!(
            require_text("name", "  \t"),
            Err(ValidationError::EmptyField("name"))
        );
        assert!(require_text("name", "x").is_ok());
    }
}
