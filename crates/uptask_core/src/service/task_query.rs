//! Task list queries and the change-driven read path.
//!
//! # Responsibility
//! - Answer "tasks of list L, done or not, sorted by K, filtered by F".
//! - Re-run that query when the change feed reports a relevant mutation.
//!
//! # Invariants
//! - Every call is a fresh read through the gateway; nothing is cached.
//! - Unknown task lists yield an empty result, never an error.
//! - Filtering is a case-sensitive substring test on text or description.

use crate::db::Database;
use crate::events::ChangeNotice;
use crate::model::task::{SortKey, Task, TaskFilter};
use crate::model::TaskListId;
use crate::repo::task_repo::{SqliteTaskRepository, TaskRepository};
use crate::repo::RepoResult;
use log::debug;
use std::sync::mpsc::Receiver;

/// Parameters of one task list read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskQuery {
    pub task_list_id: TaskListId,
    pub sort: SortKey,
    pub filter: TaskFilter,
    pub show_done: bool,
}

impl TaskQuery {
    /// Builds a query; `filter` follows `TaskFilter::parse` (`"none"` = no filter).
    pub fn new(task_list_id: TaskListId, sort: SortKey, filter: &str, show_done: bool) -> Self {
        Self {
            task_list_id,
            sort,
            filter: TaskFilter::parse(filter),
            show_done,
        }
    }

    /// Open tasks of one list in insertion order, unfiltered.
    pub fn open_tasks(task_list_id: TaskListId) -> Self {
        Self::new(task_list_id, SortKey::Id, "", false)
    }
}

/// Read-only task list query service.
#[derive(Clone, Copy)]
pub struct TaskQueryService<'a> {
    db: &'a Database,
}

impl<'a> TaskQueryService<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Returns the matching tasks in the requested order.
    pub fn list_tasks(&self, query: &TaskQuery) -> RepoResult<Vec<Task>> {
        let rows = self.db.read(|conn| {
            let repo = SqliteTaskRepository::try_new(conn)?;
            repo.list_tasks(query.task_list_id, query.show_done, query.sort)
        })?;
        let scanned = rows.len();
        let tasks = rows
            .into_iter()
            .filter(|task| query.filter.matches(task))
            .collect::<Vec<_>>();

        debug!(
            "event=task_list_query module=service status=ok task_list_id={} sort={:?} show_done={} scanned={} returned={}",
            query.task_list_id,
            query.sort,
            query.show_done,
            scanned,
            tasks.len()
        );
        Ok(tasks)
    }

    /// Convenience form taking the raw host parameters.
    pub fn list_tasks_by(
        &self,
        task_list_id: TaskListId,
        sort: SortKey,
        filter: &str,
        show_done: bool,
    ) -> RepoResult<Vec<Task>> {
        self.list_tasks(&TaskQuery::new(task_list_id, sort, filter, show_done))
    }
}

/// A task query bound to a change-feed subscription.
///
/// Hosts call `refresh_if_changed` whenever they are ready to redraw; the
/// query re-runs only when a notice touched the watched list.
pub struct TaskListWatch<'a> {
    queries: TaskQueryService<'a>,
    query: TaskQuery,
    changes: Receiver<ChangeNotice>,
    seen_revision: u64,
}

impl<'a> TaskListWatch<'a> {
    pub fn new(
        queries: TaskQueryService<'a>,
        query: TaskQuery,
        changes: Receiver<ChangeNotice>,
        seen_revision: u64,
    ) -> Self {
        Self {
            queries,
            query,
            changes,
            seen_revision,
        }
    }

    pub fn query(&self) -> &TaskQuery {
        &self.query
    }

    /// Swaps the watched query (new sort, filter or done view).
    pub fn set_query(&mut self, query: TaskQuery) {
        self.query = query;
    }

    /// Revision of the last notice drained by this watch.
    pub fn seen_revision(&self) -> u64 {
        self.seen_revision
    }

    /// Runs the watched query now.
    pub fn current(&self) -> RepoResult<Vec<Task>> {
        self.queries.list_tasks(&self.query)
    }

    /// Drains pending notices and re-queries if any concerned this list.
    ///
    /// Notices without a list scope count as relevant.
    pub fn refresh_if_changed(&mut self) -> RepoResult<Option<Vec<Task>>> {
        let mut relevant = false;
        while let Ok(notice) = self.changes.try_recv() {
            self.seen_revision = notice.revision;
            if notice
                .event
                .task_list_id()
                .map_or(true, |id| id == self.query.task_list_id)
            {
                relevant = true;
            }
        }

        if !relevant {
            return Ok(None);
        }
        self.current().map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::TaskQuery;
    use crate::model::task::{SortKey, TaskFilter};
    use crate::model::TaskListId;

    #[test]
    fn query_new_parses_the_filter_sentinel() {
        let query = TaskQuery::new(TaskListId(1), SortKey::Text, "none", true);
        assert_eq!(query.filter, TaskFilter::All);
        assert!(query.show_done);
    }

    #[test]
    fn open_tasks_defaults_to_insertion_order() {
        let query = TaskQuery::open_tasks(TaskListId(2));
        assert_eq!(query.sort, SortKey::Id);
        assert!(!query.show_done);
    }
}
