//! Core domain logic for Uptask.
//! This crate is the single source of truth for task list invariants.

pub mod app;
pub mod config;
pub mod db;
pub mod events;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use app::Uptask;
pub use config::{
    db_path_from_env, ConfigError, CoreConfig, DB_PATH_ENV, LOG_DIR_ENV, LOG_LEVEL_ENV,
};
pub use db::{connect_to_db, Database, DbError, DbResult};
pub use events::{ChangeEvent, ChangeFeed, ChangeNotice};
pub use logging::{default_log_level, init_logging, logging_status, LogConfig, LoggingError};
pub use model::tag::{NewTag, Tag};
pub use model::task::{NewTask, SortKey, Task, TaskFilter};
pub use model::task_list::{NewTaskList, TaskList};
pub use model::user::{NewUser, User};
pub use model::{TagId, TaskId, TaskListId, UserId, ValidationError};
pub use repo::{RepoError, RepoResult};
pub use service::task_list_service::{TaskListService, TaskListServiceError};
pub use service::task_query::{TaskListWatch, TaskQuery, TaskQueryService};
pub use service::task_service::{TaskService, TaskServiceError};
pub use service::user_service::{UserService, UserServiceError, MISSING_CREDENTIALS_MESSAGE};

/// Minimal health-check API for host integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
