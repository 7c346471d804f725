//! Repository layer contracts and SQLite implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts per entity.
//! - Isolate SQL details from service orchestration.
//!
//! # Invariants
//! - Repositories borrow a connection (usually a gateway transaction) and never
//!   open or commit transactions themselves.
//! - Write paths validate requests before SQL mutations.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::DbError;
use crate::model::ValidationError;
use rusqlite::{Connection, ErrorCode};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod tag_repo;
pub mod task_list_repo;
pub mod task_repo;
pub mod user_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    Db(DbError),
    NotFound { entity: &'static str, id: i64 },
    /// A unique index rejected the write.
    Duplicate { entity: &'static str, field: &'static str },
    InvalidData(String),
    MissingRequiredTable(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::Duplicate { entity, field } => {
                write!(f, "{entity} with the same {field} already exists")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound { .. }
            | Self::Duplicate { .. }
            | Self::InvalidData(_)
            | Self::MissingRequiredTable(_) => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// True only for UNIQUE index conflicts; NOT NULL, CHECK and foreign key
/// failures are not duplicates.
pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(inner, _)
            if inner.code == ErrorCode::ConstraintViolation
                && inner.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

/// Fails with the first table of `tables` absent from the schema.
pub(crate) fn ensure_tables(conn: &Connection, tables: &[&'static str]) -> RepoResult<()> {
    let mut stmt = conn.prepare_cached(
        "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1;",
    )?;
    for &table in tables {
        if !stmt.exists([table])? {
            return Err(RepoError::MissingRequiredTable(table));
        }
    }
    Ok(())
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    i64::from(value)
}

pub(crate) fn int_to_bool(table: &str, column: &str, value: i64) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid {column} value `{other}` in {table}.{column}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::is_unique_violation;
    use rusqlite::Connection;

    #[test]
    fn only_unique_conflicts_count_as_duplicates() {
        let conn = Connection::open_in_memory().expect("open db");
        conn.execute_batch(
            "CREATE TABLE t (
                name TEXT NOT NULL UNIQUE,
                size INTEGER NOT NULL CHECK (size > 0)
            );
            INSERT INTO t (name, size) VALUES ('a', 1);",
        )
        .expect("schema");

        let duplicate = conn
            .execute("INSERT INTO t (name, size) VALUES ('a', 2);", [])
            .expect_err("unique");
        let not_null = conn
            .execute("INSERT INTO t (name, size) VALUES (NULL, 2);", [])
            .expect_err("not null");
        let check = conn
            .execute("INSERT INTO t (name, size) VALUES ('b', 0);", [])
            .expect_err("check");

        assert!(is_unique_violation(&duplicate));
        assert!(!is_unique_violation(&not_null));
        assert!(!is_unique_violation(&check));
    }
}
