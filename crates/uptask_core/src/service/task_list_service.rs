//! Task list use cases.

use crate::db::{Database, DbError};
use crate::events::{ChangeEvent, ChangeFeed};
use crate::model::task_list::{NewTaskList, TaskList};
use crate::model::{TaskListId, UserId, ValidationError};
use crate::repo::task_list_repo::{SqliteTaskListRepository, TaskListRepository};
use crate::repo::RepoError;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for task list use cases.
#[derive(Debug)]
pub enum TaskListServiceError {
    UserNotFound(UserId),
    TaskListNotFound(TaskListId),
    Validation(ValidationError),
    Repo(RepoError),
}

impl Display for TaskListServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UserNotFound(id) => write!(f, "user not found: {id}"),
            Self::TaskListNotFound(id) => write!(f, "task list not found: {id}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TaskListServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for TaskListServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { entity: "user", id } => Self::UserNotFound(UserId(id)),
            RepoError::NotFound {
                entity: "task list",
                id,
            } => Self::TaskListNotFound(TaskListId(id)),
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

impl From<DbError> for TaskListServiceError {
    fn from(value: DbError) -> Self {
        Self::Repo(RepoError::Db(value))
    }
}

/// Task list service over the persistence gateway.
#[derive(Clone, Copy)]
pub struct TaskListService<'a> {
    db: &'a Database,
    feed: &'a ChangeFeed,
}

impl<'a> TaskListService<'a> {
    pub fn new(db: &'a Database, feed: &'a ChangeFeed) -> Self {
        Self { db, feed }
    }

    pub fn create_task_list(
        &self,
        user_id: UserId,
        list: &NewTaskList,
    ) -> Result<TaskList, TaskListServiceError> {
        let created = self.db.transaction(|conn| {
            let repo = SqliteTaskListRepository::try_new(conn)?;
            repo.create_task_list(user_id, list)
                .map_err(TaskListServiceError::from)
        })?;

        info!(
            "event=task_list_create module=service status=ok user_id={} task_list_id={}",
            user_id, created.id
        );
        self.feed.publish(ChangeEvent::TaskListCreated {
            task_list_id: created.id,
        });
        Ok(created)
    }

    /// Lists of one user in insertion order.
    pub fn lists_for_user(&self, user_id: UserId) -> Result<Vec<TaskList>, TaskListServiceError> {
        self.db.read(|conn| {
            let repo = SqliteTaskListRepository::try_new(conn)?;
            repo.lists_for_user(user_id)
                .map_err(TaskListServiceError::from)
        })
    }

    pub fn get_task_list(
        &self,
        task_list_id: TaskListId,
    ) -> Result<Option<TaskList>, TaskListServiceError> {
        self.db.read(|conn| {
            let repo = SqliteTaskListRepository::try_new(conn)?;
            repo.get_task_list(task_list_id)
                .map_err(TaskListServiceError::from)
        })
    }

    /// Replaces name and emoji of a list.
    pub fn rename_task_list(
        &self,
        task_list_id: TaskListId,
        list: &NewTaskList,
    ) -> Result<TaskList, TaskListServiceError> {
        let updated = self.db.transaction(|conn| {
            let repo = SqliteTaskListRepository::try_new(conn)?;
            repo.update_task_list(task_list_id, list)?;
            repo.get_task_list(task_list_id)?
                .ok_or(TaskListServiceError::TaskListNotFound(task_list_id))
        })?;

        info!(
            "event=task_list_rename module=service status=ok task_list_id={}",
            task_list_id
        );
        self.feed
            .publish(ChangeEvent::TaskListUpdated { task_list_id });
        Ok(updated)
    }

    /// Deletes a list together with its tasks and tags.
    pub fn delete_task_list(&self, task_list_id: TaskListId) -> Result<(), TaskListServiceError> {
        self.db.transaction(|conn| {
            let repo = SqliteTaskListRepository::try_new(conn)?;
            repo.delete_task_list(task_list_id)
                .map_err(TaskListServiceError::from)
        })?;

        info!(
            "event=task_list_delete module=service status=ok task_list_id={}",
            task_list_id
        );
        self.feed
            .publish(ChangeEvent::TaskListDeleted { task_list_id });
        Ok(())
    }
}
