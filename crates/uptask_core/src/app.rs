//! `Uptask` facade: one gateway plus one change feed, shared by all services.

use crate::config::CoreConfig;
use crate::db::{Database, DbResult};
use crate::events::{ChangeFeed, ChangeNotice};
use crate::service::task_list_service::TaskListService;
use crate::service::task_query::{TaskListWatch, TaskQuery, TaskQueryService};
use crate::service::task_service::TaskService;
use crate::service::user_service::UserService;
use std::path::PathBuf;
use std::sync::mpsc::Receiver;
use std::sync::Arc;

/// Entry point for hosts: owns storage access and change notifications.
#[derive(Clone)]
pub struct Uptask {
    db: Arc<Database>,
    feed: Arc<ChangeFeed>,
}

impl Uptask {
    /// Wraps an existing gateway with a fresh change feed.
    pub fn with_database(db: Arc<Database>) -> Self {
        Self {
            db,
            feed: Arc::new(ChangeFeed::new()),
        }
    }

    /// Opens (connecting eagerly) the database file at `path`.
    pub fn open(path: impl Into<PathBuf>) -> DbResult<Self> {
        let db = Database::file(path);
        db.connect()?;
        Ok(Self::with_database(Arc::new(db)))
    }

    /// Private in-memory store, mainly for tests and demos.
    pub fn in_memory() -> DbResult<Self> {
        let db = Database::in_memory();
        db.connect()?;
        Ok(Self::with_database(Arc::new(db)))
    }

    pub fn from_config(config: &CoreConfig) -> DbResult<Self> {
        Self::open(config.db_path.clone())
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn changes(&self) -> &ChangeFeed {
        &self.feed
    }

    /// Current change revision.
    pub fn revision(&self) -> u64 {
        self.feed.revision()
    }

    pub fn subscribe(&self) -> Receiver<ChangeNotice> {
        self.feed.subscribe()
    }

    pub fn tasks(&self) -> TaskService<'_> {
        TaskService::new(&self.db, &self.feed)
    }

    pub fn queries(&self) -> TaskQueryService<'_> {
        TaskQueryService::new(&self.db)
    }

    pub fn users(&self) -> UserService<'_> {
        UserService::new(&self.db, &self.feed)
    }

    pub fn task_lists(&self) -> TaskListService<'_> {
        TaskListService::new(&self.db, &self.feed)
    }

    /// Subscribes a query to later changes.
    ///
    /// Changes committed before this call are not replayed; call
    /// `TaskListWatch::current` for the initial rows.
    pub fn watch(&self, query: TaskQuery) -> TaskListWatch<'_> {
        let changes = self.feed.subscribe();
        TaskListWatch::new(self.queries(), query, changes, self.feed.revision())
    }
}
