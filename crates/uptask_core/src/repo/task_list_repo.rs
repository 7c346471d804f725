//! Task list repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Lists are returned in insertion (id) order.
//! - Deleting a list cascades to its tasks and their tags via foreign keys.

use crate::model::task_list::{NewTaskList, TaskList};
use crate::model::{TaskListId, UserId};
use crate::repo::{ensure_tables, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

const TASK_LIST_SELECT_SQL: &str = "SELECT id, user_id, name, emoji FROM task_lists";

/// Repository interface for task lists.
pub trait TaskListRepository {
    fn create_task_list(&self, user_id: UserId, list: &NewTaskList) -> RepoResult<TaskList>;
    fn get_task_list(&self, id: TaskListId) -> RepoResult<Option<TaskList>>;
    fn lists_for_user(&self, user_id: UserId) -> RepoResult<Vec<TaskList>>;
    fn update_task_list(&self, id: TaskListId, list: &NewTaskList) -> RepoResult<()>;
    fn delete_task_list(&self, id: TaskListId) -> RepoResult<()>;
}

/// SQLite-backed task list repository.
pub struct SqliteTaskListRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskListRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["users", "task_lists"])?;
        Ok(Self { conn })
    }
}

impl TaskListRepository for SqliteTaskListRepository<'_> {
    fn create_task_list(&self, user_id: UserId, list: &NewTaskList) -> RepoResult<TaskList> {
        list.validate()?;

        let user_exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1);",
            [user_id],
            |row| row.get(0),
        )?;
        if user_exists != 1 {
            return Err(RepoError::NotFound {
                entity: "user",
                id: user_id.0,
            });
        }

        self.conn.execute(
            "INSERT INTO task_lists (user_id, name, emoji) VALUES (?1, ?2, ?3);",
            params![user_id, list.name.as_str(), list.emoji.as_str()],
        )?;

        Ok(TaskList {
            id: TaskListId(self.conn.last_insert_rowid()),
            user_id,
            name: list.name.clone(),
            emoji: list.emoji.clone(),
        })
    }

    fn get_task_list(&self, id: TaskListId) -> RepoResult<Option<TaskList>> {
        let list = self
            .conn
            .query_row(
                &format!("{TASK_LIST_SELECT_SQL} WHERE id = ?1;"),
                [id],
                parse_task_list_row,
            )
            .optional()?;
        Ok(list)
    }

    fn lists_for_user(&self, user_id: UserId) -> RepoResult<Vec<TaskList>> {
        let mut stmt = self.conn.prepare(&format!(
            "{TASK_LIST_SELECT_SQL} WHERE user_id = ?1 ORDER BY id ASC;"
        ))?;
        let lists = stmt
            .query_map([user_id], parse_task_list_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(lists)
    }

    fn update_task_list(&self, id: TaskListId, list: &NewTaskList) -> RepoResult<()> {
        list.validate()?;

        let changed = self.conn.execute(
            "UPDATE task_lists SET name = ?2, emoji = ?3 WHERE id = ?1;",
            params![id, list.name.as_str(), list.emoji.as_str()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "task list",
                id: id.0,
            });
        }
        Ok(())
    }

    fn delete_task_list(&self, id: TaskListId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM task_lists WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "task list",
                id: id.0,
            });
        }
        Ok(())
    }
}

fn parse_task_list_row(row: &Row<'_>) -> rusqlite::Result<TaskList> {
    Ok(TaskList {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        name: row.get("name")?,
        emoji: row.get("emoji")?,
    })
}
