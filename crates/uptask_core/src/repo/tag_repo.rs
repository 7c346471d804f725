//! Tag repository contracts and SQLite implementation.

use crate::model::tag::{NewTag, Tag};
use crate::model::{TagId, TaskId};
use crate::repo::{ensure_tables, RepoError, RepoResult};
use rusqlite::{params, Connection};

/// Repository interface for task tags.
pub trait TagRepository {
    fn create_tag(&self, task_id: TaskId, tag: &NewTag) -> RepoResult<Tag>;
    /// Tags of one task in insertion order.
    fn tags_for_task(&self, task_id: TaskId) -> RepoResult<Vec<Tag>>;
    /// Returns the owning task of the deleted tag.
    fn delete_tag(&self, id: TagId) -> RepoResult<TaskId>;
}

/// SQLite-backed tag repository.
pub struct SqliteTagRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTagRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["user_tasks", "task_tags"])?;
        Ok(Self { conn })
    }
}

impl TagRepository for SqliteTagRepository<'_> {
    fn create_tag(&self, task_id: TaskId, tag: &NewTag) -> RepoResult<Tag> {
        tag.validate()?;

        let task_exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM user_tasks WHERE id = ?1);",
            [task_id],
            |row| row.get(0),
        )?;
        if task_exists != 1 {
            return Err(RepoError::NotFound {
                entity: "task",
                id: task_id.0,
            });
        }

        self.conn.execute(
            "INSERT INTO task_tags (task_id, tag) VALUES (?1, ?2);",
            params![task_id, tag.tag.as_str()],
        )?;

        Ok(Tag {
            id: TagId(self.conn.last_insert_rowid()),
            task_id,
            tag: tag.tag.clone(),
        })
    }

    fn tags_for_task(&self, task_id: TaskId) -> RepoResult<Vec<Tag>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, task_id, tag FROM task_tags WHERE task_id = ?1 ORDER BY id ASC;")?;
        let tags = stmt
            .query_map([task_id], |row| {
                Ok(Tag {
                    id: row.get("id")?,
                    task_id: row.get("task_id")?,
                    tag: row.get("tag")?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tags)
    }

    fn delete_tag(&self, id: TagId) -> RepoResult<TaskId> {
        let mut stmt = self
            .conn
            .prepare("DELETE FROM task_tags WHERE id = ?1 RETURNING task_id;")?;
        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => Ok(row.get(0)?),
            None => Err(RepoError::NotFound {
                entity: "tag",
                id: id.0,
            }),
        }
    }
}
