//! Command-line host for Uptask core.
//!
//! # Responsibility
//! - Drive every core use case from a terminal, one command per call.
//! - Print results as JSON so scripts can consume them.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use log::info;
use serde_json::json;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use uptask_core::{
    CoreConfig, NewTag, NewTask, NewTaskList, SortKey, TagId, TaskId, TaskListId, TaskQuery,
    Uptask, UserId,
};

type CliResult<T> = Result<T, Box<dyn Error>>;

/// Uptask task manager
#[derive(Parser)]
#[command(name = "uptask", version, about = "Manage Uptask users, lists and tasks")]
#[command(propagate_version = true)]
struct Cli {
    /// Database file; overrides UPTASK_DB_PATH.
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Log level; overrides UPTASK_LOG_LEVEL.
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print health-check and version
    Ping,
    /// Register a new account
    Register { login: String, password: String },
    /// Check credentials and print the user
    Login { login: String, password: String },
    /// Create a task list
    ListCreate {
        #[arg(long)]
        user: i64,
        name: String,
        emoji: String,
    },
    /// Show the lists of a user
    Lists {
        #[arg(long)]
        user: i64,
    },
    /// Rename a task list
    RenameList {
        list: i64,
        name: String,
        emoji: String,
    },
    /// Delete a task list with its tasks and tags
    DeleteList { list: i64 },
    /// Add a task to a list
    Add {
        #[arg(long)]
        list: i64,
        text: String,
        /// Due date as YYYY-MM-DD
        #[arg(long)]
        due: NaiveDate,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value_t = 0)]
        priority: i32,
    },
    /// Show tasks of a list
    Tasks {
        #[arg(long)]
        list: i64,
        /// 1 text, 2 priority, 3 due date, other values insertion order
        #[arg(long, default_value_t = 0)]
        sort: i32,
        /// Case-sensitive text filter; `none` disables it
        #[arg(long, default_value = "none")]
        filter: String,
        /// Show done tasks instead of open ones
        #[arg(long)]
        done: bool,
    },
    /// Flip the done flag of a task
    Toggle { task: i64 },
    /// Mark a task done and remove it
    Complete { task: i64 },
    /// Remove a task if it is done; with --list, remove all done tasks of the list
    Purge {
        task: Option<i64>,
        #[arg(long, conflicts_with = "task")]
        list: Option<i64>,
    },
    /// Delete a task
    Delete { task: i64 },
    /// Attach a tag to a task
    Tag { task: i64, tag: String },
    /// Show tags of a task
    Tags { task: i64 },
    /// Delete a tag
    Untag { tag: i64 },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> CliResult<String> {
    let mut config = CoreConfig::from_env()?;
    if let Some(level) = cli.log_level.as_deref() {
        config = config.with_log_level(level)?;
    }
    if let Some(path) = cli.db {
        config.db_path = path;
    }
    config.init_logging()?;

    if matches!(cli.command, Command::Ping) {
        return Ok(pretty(&json!({
            "ping": uptask_core::ping(),
            "version": uptask_core::core_version(),
        }))?);
    }

    let app = Uptask::from_config(&config)?;
    info!(
        "event=cli_start module=cli status=ok db_path={}",
        config.db_path.display()
    );
    execute(&app, cli.command)
}

fn execute(app: &Uptask, command: Command) -> CliResult<String> {
    let value = match command {
        Command::Ping => json!({ "ping": uptask_core::ping() }),
        Command::Register { login, password } => {
            let user = app
                .users()
                .register_user(&login, &password)
                .map_err(|err| err.user_message())?;
            serde_json::to_value(user)?
        }
        Command::Login { login, password } => match app.users().authenticate(&login, &password)? {
            Some(user) => serde_json::to_value(user)?,
            None => return Err("invalid login or password".into()),
        },
        Command::ListCreate { user, name, emoji } => serde_json::to_value(
            app.task_lists()
                .create_task_list(UserId(user), &NewTaskList::new(name, emoji))?,
        )?,
        Command::Lists { user } => {
            serde_json::to_value(app.task_lists().lists_for_user(UserId(user))?)?
        }
        Command::RenameList { list, name, emoji } => serde_json::to_value(
            app.task_lists()
                .rename_task_list(TaskListId(list), &NewTaskList::new(name, emoji))?,
        )?,
        Command::DeleteList { list } => {
            app.task_lists().delete_task_list(TaskListId(list))?;
            json!({ "deleted": list })
        }
        Command::Add {
            list,
            text,
            due,
            description,
            priority,
        } => {
            let task = NewTask::new(text, due)
                .with_description(description)
                .with_priority(priority);
            serde_json::to_value(app.tasks().create_task(TaskListId(list), &task)?)?
        }
        Command::Tasks {
            list,
            sort,
            filter,
            done,
        } => {
            let query = TaskQuery::new(TaskListId(list), SortKey::from_code(sort), &filter, done);
            serde_json::to_value(app.queries().list_tasks(&query)?)?
        }
        Command::Toggle { task } => serde_json::to_value(app.tasks().toggle_done(TaskId(task))?)?,
        Command::Complete { task } => {
            serde_json::to_value(app.tasks().complete_task(TaskId(task))?)?
        }
        Command::Purge { task, list } => match (task, list) {
            (Some(task), _) => json!({ "removed": app.tasks().purge_if_done(TaskId(task))? }),
            (None, Some(list)) => json!({ "removed": app.tasks().purge_done(TaskListId(list))? }),
            (None, None) => return Err("purge needs a task id or --list".into()),
        },
        Command::Delete { task } => {
            app.tasks().delete_task(TaskId(task))?;
            json!({ "deleted": task })
        }
        Command::Tag { task, tag } => {
            serde_json::to_value(app.tasks().add_tag(TaskId(task), &NewTag::new(tag))?)?
        }
        Command::Tags { task } => serde_json::to_value(app.tasks().tags_for_task(TaskId(task))?)?,
        Command::Untag { tag } => {
            app.tasks().delete_tag(TagId(tag))?;
            json!({ "deleted": tag })
        }
    };
    pretty(&value)
}

fn pretty(value: &serde_json::Value) -> CliResult<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

#[cfg(test)]
mod tests {
    use super::{execute, Cli, Command};
    use clap::{CommandFactory, Parser};
    use uptask_core::Uptask;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn tasks_defaults_to_unfiltered_open_view() {
        let cli = Cli::parse_from(["uptask", "tasks", "--list", "3"]);
        match cli.command {
            Command::Tasks {
                list,
                sort,
                filter,
                done,
            } => {
                assert_eq!(list, 3);
                assert_eq!(sort, 0);
                assert_eq!(filter, "none");
                assert!(!done);
            }
            _ => panic!("expected tasks command"),
        }
    }

    #[test]
    fn add_rejects_malformed_due_date() {
        assert!(Cli::try_parse_from(["uptask", "add", "--list", "1", "x", "--due", "soon"]).is_err());
    }

    #[test]
    fn commands_print_json() {
        let app = Uptask::in_memory().expect("in-memory store");
        let user = execute(
            &app,
            Command::Register {
                login: "alice".to_string(),
                password: "pw".to_string(),
            },
        )
        .expect("register");
        let user: serde_json::Value = serde_json::from_str(&user).expect("json");
        assert_eq!(user["login"], "alice");
        assert!(user.get("password_hash").is_none());

        let err = execute(
            &app,
            Command::Register {
                login: String::new(),
                password: "pw".to_string(),
            },
        )
        .expect_err("blank login");
        assert_eq!(err.to_string(), "Please fill all fields");
    }
}
