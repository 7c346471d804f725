//! Task and tag mutation use cases.
//!
//! # Responsibility
//! - Create, edit, toggle, complete and delete tasks.
//! - Add and delete task tags.
//! - Publish one change notice per affected row after commit.
//!
//! # Invariants
//! - Each public call is exactly one gateway transaction.
//! - `toggle_done` never deletes; removal only happens through
//!   `complete_task`, `purge_if_done`, `purge_done` or `delete_task`.
//! - Failed calls publish nothing.

use crate::db::{Database, DbError};
use crate::events::{ChangeEvent, ChangeFeed};
use crate::model::tag::{NewTag, Tag};
use crate::model::task::{NewTask, Task};
use crate::model::{TagId, TaskId, TaskListId, ValidationError};
use crate::repo::tag_repo::{SqliteTagRepository, TagRepository};
use crate::repo::task_repo::{SqliteTaskRepository, TaskRepository};
use crate::repo::RepoError;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for task/tag use cases.
#[derive(Debug)]
pub enum TaskServiceError {
    TaskNotFound(TaskId),
    TaskListNotFound(TaskListId),
    TagNotFound(TagId),
    Validation(ValidationError),
    Repo(RepoError),
}

impl Display for TaskServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TaskNotFound(id) => write!(f, "task not found: {id}"),
            Self::TaskListNotFound(id) => write!(f, "task list not found: {id}"),
            Self::TagNotFound(id) => write!(f, "tag not found: {id}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TaskServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for TaskServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { entity: "task", id } => Self::TaskNotFound(TaskId(id)),
            RepoError::NotFound {
                entity: "task list",
                id,
            } => Self::TaskListNotFound(TaskListId(id)),
            RepoError::NotFound { entity: "tag", id } => Self::TagNotFound(TagId(id)),
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

impl From<DbError> for TaskServiceError {
    fn from(value: DbError) -> Self {
        Self::Repo(RepoError::Db(value))
    }
}

/// Task/tag mutation service over the persistence gateway.
#[derive(Clone, Copy)]
pub struct TaskService<'a> {
    db: &'a Database,
    feed: &'a ChangeFeed,
}

impl<'a> TaskService<'a> {
    pub fn new(db: &'a Database, feed: &'a ChangeFeed) -> Self {
        Self { db, feed }
    }

    /// Inserts a new, not-done task under `task_list_id`.
    pub fn create_task(
        &self,
        task_list_id: TaskListId,
        task: &NewTask,
    ) -> Result<Task, TaskServiceError> {
        let created = self.db.transaction(|conn| {
            let repo = SqliteTaskRepository::try_new(conn)?;
            repo.create_task(task_list_id, task)
                .map_err(TaskServiceError::from)
        })?;

        info!(
            "event=task_create module=service status=ok task_list_id={} task_id={}",
            task_list_id, created.id
        );
        self.feed.publish(ChangeEvent::TaskCreated {
            task_list_id,
            task_id: created.id,
        });
        Ok(created)
    }

    /// Replaces the editable fields of an existing task.
    pub fn update_task(&self, task_id: TaskId, task: &NewTask) -> Result<Task, TaskServiceError> {
        let updated = self.db.transaction(|conn| {
            let repo = SqliteTaskRepository::try_new(conn)?;
            repo.update_task(task_id, task)?;
            load_task(&repo, task_id)
        })?;

        info!(
            "event=task_update module=service status=ok task_id={}",
            task_id
        );
        self.feed.publish(ChangeEvent::TaskUpdated {
            task_list_id: updated.task_list_id,
            task_id,
        });
        Ok(updated)
    }

    /// Flips the done flag and returns the updated task.
    pub fn toggle_done(&self, task_id: TaskId) -> Result<Task, TaskServiceError> {
        let toggled = self.db.transaction(|conn| {
            let repo = SqliteTaskRepository::try_new(conn)?;
            let mut task = load_task(&repo, task_id)?;
            task.is_done = !task.is_done;
            repo.set_done(task_id, task.is_done)?;
            Ok::<_, TaskServiceError>(task)
        })?;

        info!(
            "event=task_toggle module=service status=ok task_id={} done={}",
            task_id, toggled.is_done
        );
        self.feed.publish(ChangeEvent::TaskToggled {
            task_list_id: toggled.task_list_id,
            task_id,
            done: toggled.is_done,
        });
        Ok(toggled)
    }

    /// Deletes the task when its done flag is set; reports whether it did.
    pub fn purge_if_done(&self, task_id: TaskId) -> Result<bool, TaskServiceError> {
        let removed = self.db.transaction(|conn| {
            let repo = SqliteTaskRepository::try_new(conn)?;
            let task = load_task(&repo, task_id)?;
            if !task.is_done {
                return Ok(None);
            }
            repo.delete_task(task_id)?;
            Ok::<_, TaskServiceError>(Some(task.task_list_id))
        })?;

        let Some(task_list_id) = removed else {
            return Ok(false);
        };
        info!(
            "event=task_purge module=service status=ok task_id={}",
            task_id
        );
        self.feed.publish(ChangeEvent::TaskRemoved {
            task_list_id,
            task_id,
        });
        Ok(true)
    }

    /// Completes a task by removing it; done is never a stored state.
    ///
    /// Returns the removed task with `is_done` set.
    pub fn complete_task(&self, task_id: TaskId) -> Result<Task, TaskServiceError> {
        let completed = self.db.transaction(|conn| {
            let repo = SqliteTaskRepository::try_new(conn)?;
            let mut task = load_task(&repo, task_id)?;
            repo.delete_task(task_id)?;
            task.is_done = true;
            Ok::<_, TaskServiceError>(task)
        })?;

        info!(
            "event=task_complete module=service status=ok task_list_id={} task_id={}",
            completed.task_list_id, task_id
        );
        self.feed.publish(ChangeEvent::TaskRemoved {
            task_list_id: completed.task_list_id,
            task_id,
        });
        Ok(completed)
    }

    /// Removes every done task of a list and returns how many were removed.
    pub fn purge_done(&self, task_list_id: TaskListId) -> Result<usize, TaskServiceError> {
        let removed = self.db.transaction(|conn| {
            let repo = SqliteTaskRepository::try_new(conn)?;
            repo.delete_done_in_list(task_list_id)
                .map_err(TaskServiceError::from)
        })?;

        info!(
            "event=task_purge_done module=service status=ok task_list_id={} removed={}",
            task_list_id,
            removed.len()
        );
        for task_id in &removed {
            self.feed.publish(ChangeEvent::TaskRemoved {
                task_list_id,
                task_id: *task_id,
            });
        }
        Ok(removed.len())
    }

    /// Deletes a task regardless of its done flag.
    pub fn delete_task(&self, task_id: TaskId) -> Result<(), TaskServiceError> {
        let task_list_id = self.db.transaction(|conn| {
            let repo = SqliteTaskRepository::try_new(conn)?;
            let task = load_task(&repo, task_id)?;
            repo.delete_task(task_id)?;
            Ok::<_, TaskServiceError>(task.task_list_id)
        })?;

        info!(
            "event=task_delete module=service status=ok task_id={}",
            task_id
        );
        self.feed.publish(ChangeEvent::TaskRemoved {
            task_list_id,
            task_id,
        });
        Ok(())
    }

    pub fn get_task(&self, task_id: TaskId) -> Result<Option<Task>, TaskServiceError> {
        self.db.read(|conn| {
            let repo = SqliteTaskRepository::try_new(conn)?;
            repo.get_task(task_id).map_err(TaskServiceError::from)
        })
    }

    /// Attaches a tag to an existing task.
    pub fn add_tag(&self, task_id: TaskId, tag: &NewTag) -> Result<Tag, TaskServiceError> {
        let (created, task_list_id) = self.db.transaction(|conn| {
            let tasks = SqliteTaskRepository::try_new(conn)?;
            let task = load_task(&tasks, task_id)?;
            let tags = SqliteTagRepository::try_new(conn)?;
            let created = tags.create_tag(task_id, tag)?;
            Ok::<_, TaskServiceError>((created, task.task_list_id))
        })?;

        info!(
            "event=tag_add module=service status=ok task_id={} tag_id={}",
            task_id, created.id
        );
        self.feed.publish(ChangeEvent::TagAdded {
            task_list_id,
            task_id,
            tag_id: created.id,
        });
        Ok(created)
    }

    /// Tags of one task in insertion order.
    pub fn tags_for_task(&self, task_id: TaskId) -> Result<Vec<Tag>, TaskServiceError> {
        self.db.read(|conn| {
            let repo = SqliteTagRepository::try_new(conn)?;
            repo.tags_for_task(task_id).map_err(TaskServiceError::from)
        })
    }

    /// Deletes a tag immediately, without confirmation.
    pub fn delete_tag(&self, tag_id: TagId) -> Result<(), TaskServiceError> {
        let (task_list_id, task_id) = self.db.transaction(|conn| {
            let tags = SqliteTagRepository::try_new(conn)?;
            let task_id = tags.delete_tag(tag_id)?;
            let tasks = SqliteTaskRepository::try_new(conn)?;
            let task = load_task(&tasks, task_id)?;
            Ok::<_, TaskServiceError>((task.task_list_id, task_id))
        })?;

        info!(
            "event=tag_delete module=service status=ok task_id={} tag_id={}",
            task_id, tag_id
        );
        self.feed.publish(ChangeEvent::TagDeleted {
            task_list_id,
            task_id,
            tag_id,
        });
        Ok(())
    }
}

fn load_task(repo: &impl TaskRepository, task_id: TaskId) -> Result<Task, TaskServiceError> {
    repo.get_task(task_id)?
        .ok_or(TaskServiceError::TaskNotFound(task_id))
}
