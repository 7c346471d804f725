//! User repository contracts and SQLite implementation.
//!
//! # Invariants
//! - `users.login` is unique; a duplicate insert maps to `RepoError::Duplicate`.
//! - Lookups by login return the lowest id when several rows match.

use crate::model::user::User;
use crate::model::UserId;
use crate::repo::{ensure_tables, is_unique_violation, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

const USER_SELECT_SQL: &str = "SELECT id, login, password_hash FROM users";

/// Repository interface for user records.
pub trait UserRepository {
    /// Inserts one user with an already hashed password.
    fn create_user(&self, login: &str, password_hash: &str) -> RepoResult<User>;
    fn get_user(&self, id: UserId) -> RepoResult<Option<User>>;
    fn find_by_login(&self, login: &str) -> RepoResult<Option<User>>;
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["users"])?;
        Ok(Self { conn })
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(&self, login: &str, password_hash: &str) -> RepoResult<User> {
        let inserted = self.conn.execute(
            "INSERT INTO users (login, password_hash) VALUES (?1, ?2);",
            params![login, password_hash],
        );
        match inserted {
            Ok(_) => {}
            Err(err) if is_unique_violation(&err) => {
                return Err(RepoError::Duplicate {
                    entity: "user",
                    field: "login",
                });
            }
            Err(err) => return Err(err.into()),
        }

        Ok(User {
            id: UserId(self.conn.last_insert_rowid()),
            login: login.to_string(),
            password_hash: password_hash.to_string(),
        })
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        let user = self
            .conn
            .query_row(
                &format!("{USER_SELECT_SQL} WHERE id = ?1;"),
                [id],
                parse_user_row,
            )
            .optional()?;
        Ok(user)
    }

    fn find_by_login(&self, login: &str) -> RepoResult<Option<User>> {
        let user = self
            .conn
            .query_row(
                &format!("{USER_SELECT_SQL} WHERE login = ?1 ORDER BY id ASC LIMIT 1;"),
                [login],
                parse_user_row,
            )
            .optional()?;
        Ok(user)
    }
}

fn parse_user_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get("id")?,
        login: row.get("login")?,
        password_hash: row.get("password_hash")?,
    })
}
