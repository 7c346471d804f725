//! Task repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist task rows in `user_tasks` and read them back in list order.
//! - Own the done-flag mutations and the removal of done tasks.
//!
//! # Invariants
//! - List reads are scoped to one task list and one done state.
//! - Ordering is ascending on the sort column, ties broken by ascending id.
//! - `due_date` is stored as `YYYY-MM-DD` text.

use crate::model::task::{NewTask, SortKey, Task};
use crate::model::{TaskId, TaskListId};
use crate::repo::{bool_to_int, ensure_tables, int_to_bool, RepoError, RepoResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};

const TASK_SELECT_SQL: &str = "SELECT
    id,
    task_list_id,
    task,
    description,
    due_date,
    priority,
    is_done
FROM user_tasks";

const DUE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Repository interface for task rows.
pub trait TaskRepository {
    fn create_task(&self, task_list_id: TaskListId, task: &NewTask) -> RepoResult<Task>;
    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>>;
    /// Replaces text, description, due date and priority.
    fn update_task(&self, id: TaskId, task: &NewTask) -> RepoResult<()>;
    fn set_done(&self, id: TaskId, done: bool) -> RepoResult<()>;
    fn delete_task(&self, id: TaskId) -> RepoResult<()>;
    /// Deletes every done task of one list and returns the removed ids.
    fn delete_done_in_list(&self, task_list_id: TaskListId) -> RepoResult<Vec<TaskId>>;
    /// Tasks of one list with the given done state, ordered by `sort`.
    fn list_tasks(
        &self,
        task_list_id: TaskListId,
        show_done: bool,
        sort: SortKey,
    ) -> RepoResult<Vec<Task>>;
}

/// SQLite-backed task repository.
pub struct SqliteTaskRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["task_lists", "user_tasks"])?;
        Ok(Self { conn })
    }
}

impl TaskRepository for SqliteTaskRepository<'_> {
    fn create_task(&self, task_list_id: TaskListId, task: &NewTask) -> RepoResult<Task> {
        task.validate()?;

        let list_exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM task_lists WHERE id = ?1);",
            [task_list_id],
            |row| row.get(0),
        )?;
        if list_exists != 1 {
            return Err(RepoError::NotFound {
                entity: "task list",
                id: task_list_id.0,
            });
        }

        self.conn.execute(
            "INSERT INTO user_tasks (
                task_list_id,
                task,
                description,
                due_date,
                priority,
                is_done
            ) VALUES (?1, ?2, ?3, ?4, ?5, 0);",
            params![
                task_list_id,
                task.text.as_str(),
                task.description.as_str(),
                format_due_date(task.due_date),
                task.priority,
            ],
        )?;

        Ok(Task {
            id: TaskId(self.conn.last_insert_rowid()),
            task_list_id,
            text: task.text.clone(),
            description: task.description.clone(),
            due_date: task.due_date,
            priority: task.priority,
            is_done: false,
        })
    }

    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_task_row(row)?)),
            None => Ok(None),
        }
    }

    fn update_task(&self, id: TaskId, task: &NewTask) -> RepoResult<()> {
        task.validate()?;

        let changed = self.conn.execute(
            "UPDATE user_tasks
             SET
                task = ?2,
                description = ?3,
                due_date = ?4,
                priority = ?5
             WHERE id = ?1;",
            params![
                id,
                task.text.as_str(),
                task.description.as_str(),
                format_due_date(task.due_date),
                task.priority,
            ],
        )?;
        ensure_changed(changed, id)
    }

    fn set_done(&self, id: TaskId, done: bool) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE user_tasks SET is_done = ?2 WHERE id = ?1;",
            params![id, bool_to_int(done)],
        )?;
        ensure_changed(changed, id)
    }

    fn delete_task(&self, id: TaskId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM user_tasks WHERE id = ?1;", [id])?;
        ensure_changed(changed, id)
    }

    fn delete_done_in_list(&self, task_list_id: TaskListId) -> RepoResult<Vec<TaskId>> {
        let mut stmt = self.conn.prepare(
            "DELETE FROM user_tasks
             WHERE task_list_id = ?1
               AND is_done = 1
             RETURNING id;",
        )?;
        let mut removed = stmt
            .query_map([task_list_id], |row| row.get::<_, TaskId>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        removed.sort();
        Ok(removed)
    }

    fn list_tasks(
        &self,
        task_list_id: TaskListId,
        show_done: bool,
        sort: SortKey,
    ) -> RepoResult<Vec<Task>> {
        let mut stmt = self.conn.prepare(&format!(
            "{TASK_SELECT_SQL}
             WHERE task_list_id = ?1
               AND is_done = ?2
             ORDER BY {};",
            sort.order_by_sql()
        ))?;
        let mut rows = stmt.query(params![task_list_id, bool_to_int(show_done)])?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }
        Ok(tasks)
    }
}

fn ensure_changed(changed: usize, id: TaskId) -> RepoResult<()> {
    if changed == 0 {
        return Err(RepoError::NotFound {
            entity: "task",
            id: id.0,
        });
    }
    Ok(())
}

fn format_due_date(date: NaiveDate) -> String {
    date.format(DUE_DATE_FORMAT).to_string()
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<Task> {
    let due_text: String = row.get("due_date")?;
    let due_date = NaiveDate::parse_from_str(&due_text, DUE_DATE_FORMAT).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid due date `{due_text}` in user_tasks.due_date"
        ))
    })?;
    let is_done = int_to_bool("user_tasks", "is_done", row.get("is_done")?)?;

    Ok(Task {
        id: row.get("id")?,
        task_list_id: row.get("task_list_id")?,
        text: row.get("task")?,
        description: row.get("description")?,
        due_date,
        priority: row.get("priority")?,
        is_done,
    })
}
