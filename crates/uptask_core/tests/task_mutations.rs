use chrono::NaiveDate;
use uptask_core::{
    ChangeEvent, DbError, NewTag, NewTask, NewTaskList, SortKey, TagId, TaskId, TaskListId, TaskQuery,
    TaskServiceError, Uptask, ValidationError,
};

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
}

fn store_with_list() -> (Uptask, TaskListId) {
    let app = Uptask::in_memory().unwrap();
    let user = app.users().register_user("alice", "pw").unwrap();
    let list = app
        .task_lists()
        .create_task_list(user.id, &NewTaskList::new("Home", "🏠"))
        .unwrap();
    (app, list.id)
}

fn open_ids(app: &Uptask, list: TaskListId, done: bool) -> Vec<TaskId> {
    app.queries()
        .list_tasks_by(list, SortKey::Id, "", done)
        .unwrap()
        .into_iter()
        .map(|task| task.id)
        .collect()
}

#[test]
fn create_task_starts_not_done_with_given_fields() {
    let (app, list) = store_with_list();
    let created = app
        .tasks()
        .create_task(
            list,
            &NewTask::new("Buy milk", day(4))
                .with_description("2 litres")
                .with_priority(3),
        )
        .unwrap();

    let loaded = app.tasks().get_task(created.id).unwrap().unwrap();
    assert_eq!(loaded, created);
    assert!(!loaded.is_done);
    assert_eq!(loaded.description, "2 litres");
    assert_eq!(loaded.due_date, day(4));
    assert_eq!(loaded.priority, 3);
}

#[test]
fn create_task_validates_and_checks_list() {
    let (app, list) = store_with_list();
    let blank = app
        .tasks()
        .create_task(list, &NewTask::new("  ", day(1)))
        .unwrap_err();
    assert!(matches!(
        blank,
        TaskServiceError::Validation(ValidationError::EmptyField("text"))
    ));

    let missing = app
        .tasks()
        .create_task(TaskListId(77), &NewTask::new("x", day(1)))
        .unwrap_err();
    assert!(matches!(missing, TaskServiceError::TaskListNotFound(TaskListId(77))));
}

#[test]
fn toggle_then_purge_removes_the_task() {
    let (app, list) = store_with_list();
    let a = app
        .tasks()
        .create_task(list, &NewTask::new("Buy milk", day(1)))
        .unwrap();
    let b = app
        .tasks()
        .create_task(list, &NewTask::new("Walk dog", day(1)))
        .unwrap();

    let toggled = app.tasks().toggle_done(b.id).unwrap();
    assert!(toggled.is_done);
    assert_eq!(open_ids(&app, list, true), vec![b.id]);

    assert!(app.tasks().purge_if_done(b.id).unwrap());
    assert_eq!(open_ids(&app, list, false), vec![a.id]);
    assert!(open_ids(&app, list, true).is_empty());
}

#[test]
fn purge_if_done_keeps_open_tasks() {
    let (app, list) = store_with_list();
    let a = app
        .tasks()
        .create_task(list, &NewTask::new("stay", day(1)))
        .unwrap();
    assert!(!app.tasks().purge_if_done(a.id).unwrap());
    assert_eq!(open_ids(&app, list, false), vec![a.id]);
}

#[test]
fn toggling_twice_restores_open_state() {
    let (app, list) = store_with_list();
    let a = app
        .tasks()
        .create_task(list, &NewTask::new("flip", day(1)))
        .unwrap();
    app.tasks().toggle_done(a.id).unwrap();
    let back = app.tasks().toggle_done(a.id).unwrap();
    assert!(!back.is_done);
    assert_eq!(open_ids(&app, list, false), vec![a.id]);
}

#[test]
fn complete_task_removes_it_in_one_step() {
    let (app, list) = store_with_list();
    let a = app
        .tasks()
        .create_task(list, &NewTask::new("finish report", day(1)))
        .unwrap();
    app.tasks().add_tag(a.id, &NewTag::new("work")).unwrap();

    let completed = app.tasks().complete_task(a.id).unwrap();
    assert!(completed.is_done);
    assert!(app.tasks().get_task(a.id).unwrap().is_none());
    assert!(app.tasks().tags_for_task(a.id).unwrap().is_empty());
    assert!(open_ids(&app, list, true).is_empty());

    let again = app.tasks().complete_task(a.id).unwrap_err();
    assert!(matches!(again, TaskServiceError::TaskNotFound(id) if id == a.id));
}

#[test]
fn complete_task_deletes_without_writing_the_done_flag() {
    let (app, list) = store_with_list();
    let a = app
        .tasks()
        .create_task(list, &NewTask::new("one shot", day(1)))
        .unwrap();
    app.database()
        .transaction(|conn| {
            conn.execute_batch(
                "CREATE TABLE task_updates (task_id INTEGER NOT NULL);
                 CREATE TRIGGER log_task_update AFTER UPDATE ON user_tasks
                 BEGIN
                     INSERT INTO task_updates (task_id) VALUES (NEW.id);
                 END;",
            )
            .map_err(DbError::from)
        })
        .unwrap();

    assert!(app.tasks().complete_task(a.id).unwrap().is_done);

    let updates: i64 = app
        .database()
        .read(|conn| {
            conn.query_row("SELECT COUNT(*) FROM task_updates;", [], |row| row.get(0))
                .map_err(DbError::from)
        })
        .unwrap();
    assert_eq!(updates, 0);
}

#[test]
fn purge_done_removes_only_done_tasks_of_the_list() {
    let (app, list) = store_with_list();
    let tasks = app.tasks();
    let keep = tasks.create_task(list, &NewTask::new("keep", day(1))).unwrap();
    for text in ["done one", "done two"] {
        let task = tasks.create_task(list, &NewTask::new(text, day(1))).unwrap();
        tasks.toggle_done(task.id).unwrap();
    }

    assert_eq!(tasks.purge_done(list).unwrap(), 2);
    assert_eq!(open_ids(&app, list, false), vec![keep.id]);
    assert!(open_ids(&app, list, true).is_empty());
    assert_eq!(tasks.purge_done(list).unwrap(), 0);
}

#[test]
fn update_task_replaces_editable_fields() {
    let (app, list) = store_with_list();
    let a = app
        .tasks()
        .create_task(list, &NewTask::new("draft", day(1)))
        .unwrap();
    let updated = app
        .tasks()
        .update_task(
            a.id,
            &NewTask::new("final", day(9))
                .with_description("edited")
                .with_priority(5),
        )
        .unwrap();
    assert_eq!(updated.text, "final");
    assert_eq!(updated.description, "edited");
    assert_eq!(updated.due_date, day(9));
    assert_eq!(updated.priority, 5);
    assert_eq!(updated.task_list_id, list);
}

#[test]
fn delete_task_and_missing_ids() {
    let (app, list) = store_with_list();
    let a = app
        .tasks()
        .create_task(list, &NewTask::new("gone", day(1)))
        .unwrap();
    app.tasks().delete_task(a.id).unwrap();
    assert!(app.tasks().get_task(a.id).unwrap().is_none());
    assert!(matches!(
        app.tasks().delete_task(a.id),
        Err(TaskServiceError::TaskNotFound(_))
    ));
    assert!(matches!(
        app.tasks().toggle_done(TaskId(404)),
        Err(TaskServiceError::TaskNotFound(TaskId(404)))
    ));
}

#[test]
fn tags_are_added_listed_and_deleted_immediately() {
    let (app, list) = store_with_list();
    let a = app
        .tasks()
        .create_task(list, &NewTask::new("tagged", day(1)))
        .unwrap();
    let urgent = app.tasks().add_tag(a.id, &NewTag::new("  urgent ")).unwrap();
    let home = app.tasks().add_tag(a.id, &NewTag::new("home")).unwrap();
    assert_eq!(urgent.tag, "urgent");

    let tags = app.tasks().tags_for_task(a.id).unwrap();
    assert_eq!(tags, vec![urgent.clone(), home.clone()]);

    app.tasks().delete_tag(urgent.id).unwrap();
    assert_eq!(app.tasks().tags_for_task(a.id).unwrap(), vec![home]);
    assert!(matches!(
        app.tasks().delete_tag(urgent.id),
        Err(TaskServiceError::TagNotFound(id)) if id == urgent.id
    ));
}

#[test]
fn tag_requires_existing_task_and_label() {
    let (app, list) = store_with_list();
    let a = app
        .tasks()
        .create_task(list, &NewTask::new("t", day(1)))
        .unwrap();
    assert!(matches!(
        app.tasks().add_tag(a.id, &NewTag::new("   ")),
        Err(TaskServiceError::Validation(_))
    ));
    assert!(matches!(
        app.tasks().add_tag(TaskId(404), &NewTag::new("x")),
        Err(TaskServiceError::TaskNotFound(_))
    ));
    assert!(matches!(
        app.tasks().delete_tag(TagId(404)),
        Err(TaskServiceError::TagNotFound(_))
    ));
}

#[test]
fn mutations_publish_notices_after_commit() {
    let (app, list) = store_with_list();
    let changes = app.subscribe();
    let before = app.revision();

    let a = app
        .tasks()
        .create_task(list, &NewTask::new("watched", day(1)))
        .unwrap();
    app.tasks().toggle_done(a.id).unwrap();
    app.tasks().purge_if_done(a.id).unwrap();

    let events = changes.try_iter().map(|notice| notice.event).collect::<Vec<_>>();
    assert_eq!(
        events,
        vec![
            ChangeEvent::TaskCreated {
                task_list_id: list,
                task_id: a.id
            },
            ChangeEvent::TaskToggled {
                task_list_id: list,
                task_id: a.id,
                done: true
            },
            ChangeEvent::TaskRemoved {
                task_list_id: list,
                task_id: a.id
            },
        ]
    );
    assert_eq!(app.revision(), before + 3);
}

#[test]
fn failed_mutations_publish_nothing() {
    let (app, _) = store_with_list();
    let changes = app.subscribe();
    let before = app.revision();

    assert!(app.tasks().toggle_done(TaskId(404)).is_err());
    assert!(app.tasks().delete_tag(TagId(404)).is_err());

    assert!(changes.try_recv().is_err());
    assert_eq!(app.revision(), before);
}

#[test]
fn watch_requeries_only_for_its_list() {
    let (app, list) = store_with_list();
    let user = app.users().find_by_login("alice").unwrap().unwrap();
    let other = app
        .task_lists()
        .create_task_list(user.id, &NewTaskList::new("Other", "📦"))
        .unwrap();
    let mut watch = app.watch(TaskQuery::open_tasks(list));
    assert!(watch.current().unwrap().is_empty());
    assert!(watch.refresh_if_changed().unwrap().is_none());

    app.tasks()
        .create_task(other.id, &NewTask::new("elsewhere", day(1)))
        .unwrap();
    assert!(watch.refresh_if_changed().unwrap().is_none());

    let a = app
        .tasks()
        .create_task(list, &NewTask::new("here", day(1)))
        .unwrap();
    let refreshed = watch.refresh_if_changed().unwrap().expect("list changed");
    assert_eq!(refreshed.len(), 1);
    assert_eq!(refreshed[0].id, a.id);
    assert_eq!(watch.seen_revision(), app.revision());

    app.tasks().complete_task(a.id).unwrap();
    let refreshed = watch.refresh_if_changed().unwrap().expect("list changed");
    assert!(refreshed.is_empty());
}
