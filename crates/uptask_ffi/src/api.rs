//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose stable, use-case-level functions to Dart via FRB.
//! - Map core errors to flat response envelopes the UI can render.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - All calls share the process-wide gateway and one change feed.
//! - Ids cross the boundary as `i64`; due dates as `YYYY-MM-DD` strings.

use chrono::NaiveDate;
use log::warn;
use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};
use uptask_core::{
    connect_to_db, core_version as core_version_inner, db_path_from_env,
    init_logging as init_logging_inner, ping as ping_inner, ChangeFeed, Database, NewTag, NewTask, NewTaskList, SortKey,
    TagId, Task, TaskId, TaskList, TaskListId, TaskListService, TaskQuery, TaskQueryService,
    TaskService, UserId, UserService,
};

const DUE_DATE_FORMAT: &str = "%Y-%m-%d";

static DB_PATH: OnceCell<PathBuf> = OnceCell::new();
static FEED: OnceCell<ChangeFeed> = OnceCell::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rotated logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir`.
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Generic action response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    /// Whether operation succeeded.
    pub ok: bool,
    /// Id of the created or affected row, when there is one.
    pub id: Option<i64>,
    /// Human-readable message for the UI.
    pub message: String,
}

impl ActionResponse {
    fn success(message: impl Into<String>, id: Option<i64>) -> Self {
        Self {
            ok: true,
            id,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            id: None,
            message: message.into(),
        }
    }
}

/// Task row as rendered by the list screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskItem {
    pub id: i64,
    pub task_list_id: i64,
    pub text: String,
    pub description: String,
    pub due_date: String,
    pub priority: i32,
    pub is_done: bool,
}

/// Task list row for the list picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskListItem {
    pub id: i64,
    pub name: String,
    pub emoji: String,
    /// `"<emoji> <name>"`.
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagItem {
    pub id: i64,
    pub tag: String,
}

/// Task query response; `revision` lets the host skip stale redraws.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TasksResponse {
    pub ok: bool,
    pub items: Vec<TaskItem>,
    pub message: String,
    pub revision: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskListsResponse {
    pub ok: bool,
    pub items: Vec<TaskListItem>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagsResponse {
    pub ok: bool,
    pub items: Vec<TagItem>,
    pub message: String,
}

/// Registers a user account.
///
/// Blank login or password fails with `Please fill all fields`.
#[flutter_rust_bridge::frb(sync)]
pub fn register_user(login: String, password: String) -> ActionResponse {
    let result = with_gateway(|db, feed| {
        UserService::new(db, feed)
            .register_user(&login, &password)
            .map_err(|err| err.user_message())
    });
    match result {
        Ok(user) => ActionResponse::success("Account created.", Some(user.id.0)),
        Err(message) => ActionResponse::failure(message),
    }
}

/// Checks credentials; returns the user id on success.
#[flutter_rust_bridge::frb(sync)]
pub fn sign_in(login: String, password: String) -> ActionResponse {
    let result = with_gateway(|db, feed| {
        UserService::new(db, feed)
            .authenticate(&login, &password)
            .map_err(|err| err.user_message())
    });
    match result {
        Ok(Some(user)) => ActionResponse::success("Signed in.", Some(user.id.0)),
        Ok(None) => ActionResponse::failure("Invalid login or password"),
        Err(message) => ActionResponse::failure(message),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn create_task_list(user_id: i64, name: String, emoji: String) -> ActionResponse {
    let result = with_gateway(|db, feed| {
        TaskListService::new(db, feed)
            .create_task_list(UserId(user_id), &NewTaskList::new(name, emoji))
            .map_err(|err| format!("create_task_list failed: {err}"))
    });
    match result {
        Ok(list) => ActionResponse::success("Task list created.", Some(list.id.0)),
        Err(message) => ActionResponse::failure(message),
    }
}

/// Lists of one user in creation order.
#[flutter_rust_bridge::frb(sync)]
pub fn list_task_lists(user_id: i64) -> TaskListsResponse {
    let result = with_gateway(|db, feed| {
        TaskListService::new(db, feed)
            .lists_for_user(UserId(user_id))
            .map_err(|err| format!("list_task_lists failed: {err}"))
    });
    match result {
        Ok(lists) => TaskListsResponse {
            ok: true,
            message: format!("Found {} list(s).", lists.len()),
            items: lists.into_iter().map(to_task_list_item).collect(),
        },
        Err(message) => TaskListsResponse {
            ok: false,
            items: Vec::new(),
            message,
        },
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn delete_task_list(task_list_id: i64) -> ActionResponse {
    let result = with_gateway(|db, feed| {
        TaskListService::new(db, feed)
            .delete_task_list(TaskListId(task_list_id))
            .map_err(|err| format!("delete_task_list failed: {err}"))
    });
    match result {
        Ok(()) => ActionResponse::success("Task list deleted.", Some(task_list_id)),
        Err(message) => ActionResponse::failure(message),
    }
}

/// Creates a task; `due_date` must be `YYYY-MM-DD`.
#[flutter_rust_bridge::frb(sync)]
pub fn create_task(
    task_list_id: i64,
    text: String,
    description: String,
    due_date: String,
    priority: i32,
) -> ActionResponse {
    let result = parse_due_date(&due_date).and_then(|due| {
        let task = NewTask::new(text, due)
            .with_description(description)
            .with_priority(priority);
        with_gateway(|db, feed| {
            TaskService::new(db, feed)
                .create_task(TaskListId(task_list_id), &task)
                .map_err(|err| format!("create_task failed: {err}"))
        })
    });
    match result {
        Ok(task) => ActionResponse::success("Task created.", Some(task.id.0)),
        Err(message) => ActionResponse::failure(message),
    }
}

/// Tasks of one list.
///
/// Input semantics:
/// - `sort`: 1 text, 2 priority, 3 due date, anything else insertion order.
/// - `filter`: case-sensitive substring of text or description; empty or
///   `none` disables filtering.
/// - `show_done`: selects done tasks instead of open ones.
#[flutter_rust_bridge::frb(sync)]
pub fn list_tasks(task_list_id: i64, sort: i32, filter: String, show_done: bool) -> TasksResponse {
    let query = TaskQuery::new(
        TaskListId(task_list_id),
        SortKey::from_code(sort),
        &filter,
        show_done,
    );
    let result = with_gateway(|db, feed| {
        let tasks = TaskQueryService::new(db)
            .list_tasks(&query)
            .map_err(|err| format!("list_tasks failed: {err}"))?;
        Ok((tasks, feed.revision()))
    });
    match result {
        Ok((tasks, revision)) => TasksResponse {
            ok: true,
            message: format!("Found {} task(s).", tasks.len()),
            items: tasks.into_iter().map(to_task_item).collect(),
            revision,
        },
        Err(message) => TasksResponse {
            ok: false,
            items: Vec::new(),
            message,
            revision: current_revision(),
        },
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn toggle_task_done(task_id: i64) -> ActionResponse {
    let result = with_gateway(|db, feed| {
        TaskService::new(db, feed)
            .toggle_done(TaskId(task_id))
            .map_err(|err| format!("toggle_task_done failed: {err}"))
    });
    match result {
        Ok(task) if task.is_done => ActionResponse::success("Task done.", Some(task_id)),
        Ok(_) => ActionResponse::success("Task reopened.", Some(task_id)),
        Err(message) => ActionResponse::failure(message),
    }
}

/// Marks a task done and removes it.
#[flutter_rust_bridge::frb(sync)]
pub fn complete_task(task_id: i64) -> ActionResponse {
    let result = with_gateway(|db, feed| {
        TaskService::new(db, feed)
            .complete_task(TaskId(task_id))
            .map_err(|err| format!("complete_task failed: {err}"))
    });
    match result {
        Ok(_) => ActionResponse::success("Task completed.", Some(task_id)),
        Err(message) => ActionResponse::failure(message),
    }
}

/// Removes the task only when it is already done.
#[flutter_rust_bridge::frb(sync)]
pub fn purge_if_done(task_id: i64) -> ActionResponse {
    let result = with_gateway(|db, feed| {
        TaskService::new(db, feed)
            .purge_if_done(TaskId(task_id))
            .map_err(|err| format!("purge_if_done failed: {err}"))
    });
    match result {
        Ok(true) => ActionResponse::success("Task removed.", Some(task_id)),
        Ok(false) => ActionResponse::success("Task is not done.", Some(task_id)),
        Err(message) => ActionResponse::failure(message),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn add_tag(task_id: i64, tag: String) -> ActionResponse {
    let result = with_gateway(|db, feed| {
        TaskService::new(db, feed)
            .add_tag(TaskId(task_id), &NewTag::new(tag))
            .map_err(|err| format!("add_tag failed: {err}"))
    });
    match result {
        Ok(tag) => ActionResponse::success("Tag added.", Some(tag.id.0)),
        Err(message) => ActionResponse::failure(message),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn list_tags(task_id: i64) -> TagsResponse {
    let result = with_gateway(|db, feed| {
        TaskService::new(db, feed)
            .tags_for_task(TaskId(task_id))
            .map_err(|err| format!("list_tags failed: {err}"))
    });
    match result {
        Ok(tags) => TagsResponse {
            ok: true,
            message: format!("Found {} tag(s).", tags.len()),
            items: tags
                .into_iter()
                .map(|tag| TagItem {
                    id: tag.id.0,
                    tag: tag.tag,
                })
                .collect(),
        },
        Err(message) => TagsResponse {
            ok: false,
            items: Vec::new(),
            message,
        },
    }
}

/// Deletes a tag immediately.
#[flutter_rust_bridge::frb(sync)]
pub fn delete_tag(tag_id: i64) -> ActionResponse {
    let result = with_gateway(|db, feed| {
        TaskService::new(db, feed)
            .delete_tag(TagId(tag_id))
            .map_err(|err| format!("delete_tag failed: {err}"))
    });
    match result {
        Ok(()) => ActionResponse::success("Tag deleted.", Some(tag_id)),
        Err(message) => ActionResponse::failure(message),
    }
}

/// Change revision; grows by one per committed mutation in this process.
#[flutter_rust_bridge::frb(sync)]
pub fn current_revision() -> u64 {
    feed().revision()
}

/// `UPTASK_DB_PATH` as seen by the first call; logging settings never
/// affect data calls.
fn db_path() -> &'static Path {
    DB_PATH.get_or_init(db_path_from_env)
}

fn feed() -> &'static ChangeFeed {
    FEED.get_or_init(ChangeFeed::new)
}

fn with_gateway<T>(
    f: impl FnOnce(&'static Database, &'static ChangeFeed) -> Result<T, String>,
) -> Result<T, String> {
    let db = connect_to_db(db_path()).map_err(|err| {
        warn!("event=ffi_db_connect module=ffi status=error error={err}");
        format!("database open failed: {err}")
    })?;
    f(db, feed())
}

fn parse_due_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), DUE_DATE_FORMAT)
        .map_err(|_| format!("due date must be YYYY-MM-DD, got `{value}`"))
}

fn to_task_item(task: Task) -> TaskItem {
    TaskItem {
        id: task.id.0,
        task_list_id: task.task_list_id.0,
        text: task.text,
        description: task.description,
        due_date: task.due_date.format(DUE_DATE_FORMAT).to_string(),
        priority: task.priority,
        is_done: task.is_done,
    }
}

fn to_task_list_item(list: TaskList) -> TaskListItem {
    TaskListItem {
        id: list.id.0,
        label: list.label(),
        name: list.name,
        emoji: list.emoji,
    }
}

#[cfg(test)]
mod tests {
    use super::{
        add_tag, complete_task, core_version, create_task, create_task_list, current_revision,
        delete_tag, init_logging, list_tags, list_task_lists, list_tasks, ping, purge_if_done,
        register_user, sign_in, toggle_task_done, DB_PATH,
    };
    use once_cell::sync::OnceCell;
    use std::time::{SystemTime, UNIX_EPOCH};
    use tempfile::TempDir;
    use uptask_core::LOG_LEVEL_ENV;

    static TEST_DIR: OnceCell<TempDir> = OnceCell::new();

    /// Points the process gateway at a per-run temp file before first use.
    fn use_temp_db() {
        let dir = TEST_DIR.get_or_init(|| tempfile::tempdir().expect("temp dir"));
        let path = DB_PATH.get_or_init(|| dir.path().join("uptask.sqlite3"));
        assert!(path.starts_with(dir.path()), "gateway path resolved too early");
    }

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        assert!(!init_logging("info".to_string(), String::new()).is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        assert!(!init_logging("verbose".to_string(), "/tmp/logs".to_string()).is_empty());
    }

    #[test]
    fn register_requires_all_fields() {
        use_temp_db();
        let response = register_user(String::new(), "pw".to_string());
        assert!(!response.ok);
        assert_eq!(response.message, "Please fill all fields");
    }

    #[test]
    fn sign_in_rejects_wrong_password() {
        use_temp_db();
        let login = unique_token("sign-in");
        assert!(register_user(login.clone(), "pw".to_string()).ok);
        assert!(sign_in(login.clone(), "pw".to_string()).ok);
        assert!(!sign_in(login, "nope".to_string()).ok);
    }

    #[test]
    fn task_flow_round_trips_through_envelopes() {
        use_temp_db();
        let user = register_user(unique_token("flow"), "pw".to_string());
        let user_id = user.id.expect("user id");
        let list = create_task_list(user_id, "Home".to_string(), "🏠".to_string());
        let list_id = list.id.expect("list id");

        let lists = list_task_lists(user_id);
        assert_eq!(lists.items.len(), 1);
        assert_eq!(lists.items[0].label, "🏠 Home");

        let milk = create_task(
            list_id,
            "Buy milk".to_string(),
            String::new(),
            "2024-05-01".to_string(),
            1,
        );
        let dog = create_task(
            list_id,
            "Walk dog".to_string(),
            "evening".to_string(),
            "2024-05-02".to_string(),
            2,
        );
        let (milk_id, dog_id) = (milk.id.expect("milk"), dog.id.expect("dog"));

        let before = current_revision();
        assert!(toggle_task_done(dog_id).ok);
        assert!(current_revision() > before);
        assert!(purge_if_done(dog_id).ok);

        let open = list_tasks(list_id, 1, "none".to_string(), false);
        assert!(open.ok, "{}", open.message);
        assert_eq!(
            open.items.iter().map(|t| t.id).collect::<Vec<_>>(),
            vec![milk_id]
        );
        assert_eq!(open.items[0].due_date, "2024-05-01");
        assert!(list_tasks(list_id, 0, String::new(), true).items.is_empty());

        let tag = add_tag(milk_id, "errand".to_string());
        let tag_id = tag.id.expect("tag id");
        assert_eq!(list_tags(milk_id).items.len(), 1);
        assert!(delete_tag(tag_id).ok);
        assert!(list_tags(milk_id).items.is_empty());

        assert!(complete_task(milk_id).ok);
        assert!(list_tasks(list_id, 0, String::new(), false).items.is_empty());
        assert!(!complete_task(milk_id).ok);
    }

    #[test]
    fn create_task_rejects_malformed_due_date() {
        use_temp_db();
        let response = create_task(1, "x".to_string(), String::new(), "05/01/2024".to_string(), 0);
        assert!(!response.ok);
        assert!(response.message.contains("YYYY-MM-DD"));
    }

    #[test]
    fn data_calls_ignore_log_level_setting() {
        use_temp_db();
        std::env::set_var(LOG_LEVEL_ENV, "verbose");

        let user = register_user(unique_token("log-level"), "pw".to_string());
        assert!(user.ok, "{}", user.message);
        let listed = list_tasks(1, 0, String::new(), false);
        assert!(listed.ok, "{}", listed.message);
    }

    fn unique_token(prefix: &str) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time went backwards")
            .as_nanos();
        format!("{prefix}-{nanos}")
    }
}
