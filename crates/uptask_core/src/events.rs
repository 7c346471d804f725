//! Change notifications published after committed mutations.
//!
//! # Responsibility
//! - Stamp every committed mutation with a monotonically increasing revision.
//! - Fan notices out to any number of subscribers over `std::sync::mpsc`.
//!
//! # Invariants
//! - Revisions start at 0 and only grow; each publish bumps them by one.
//! - Subscribers whose receiver was dropped are pruned on the next publish.
//! - Services publish only after their transaction has committed.

use crate::model::{TagId, TaskId, TaskListId, UserId};
use log::{debug, error};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Mutex;

/// What changed in storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChangeEvent {
    UserRegistered {
        user_id: UserId,
    },
    TaskListCreated {
        task_list_id: TaskListId,
    },
    TaskListUpdated {
        task_list_id: TaskListId,
    },
    TaskListDeleted {
        task_list_id: TaskListId,
    },
    TaskCreated {
        task_list_id: TaskListId,
        task_id: TaskId,
    },
    TaskUpdated {
        task_list_id: TaskListId,
        task_id: TaskId,
    },
    TaskToggled {
        task_list_id: TaskListId,
        task_id: TaskId,
        done: bool,
    },
    TaskRemoved {
        task_list_id: TaskListId,
        task_id: TaskId,
    },
    TagAdded {
        task_list_id: TaskListId,
        task_id: TaskId,
        tag_id: TagId,
    },
    TagDeleted {
        task_list_id: TaskListId,
        task_id: TaskId,
        tag_id: TagId,
    },
}

impl ChangeEvent {
    /// Task list affected by this change, if any.
    pub fn task_list_id(&self) -> Option<TaskListId> {
        match *self {
            Self::UserRegistered { .. } => None,
            Self::TaskListCreated { task_list_id }
            | Self::TaskListUpdated { task_list_id }
            | Self::TaskListDeleted { task_list_id }
            | Self::TaskCreated { task_list_id, .. }
            | Self::TaskUpdated { task_list_id, .. }
            | Self::TaskToggled { task_list_id, .. }
            | Self::TaskRemoved { task_list_id, .. }
            | Self::TagAdded { task_list_id, .. }
            | Self::TagDeleted { task_list_id, .. } => Some(task_list_id),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::UserRegistered { .. } => "user_registered",
            Self::TaskListCreated { .. } => "task_list_created",
            Self::TaskListUpdated { .. } => "task_list_updated",
            Self::TaskListDeleted { .. } => "task_list_deleted",
            Self::TaskCreated { .. } => "task_created",
            Self::TaskUpdated { .. } => "task_updated",
            Self::TaskToggled { .. } => "task_toggled",
            Self::TaskRemoved { .. } => "task_removed",
            Self::TagAdded { .. } => "tag_added",
            Self::TagDeleted { .. } => "tag_deleted",
        }
    }
}

/// A change stamped with the revision it produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChangeNotice {
    pub revision: u64,
    pub event: ChangeEvent,
}

/// Explicit publish/subscribe channel for storage changes.
#[derive(Default)]
pub struct ChangeFeed {
    revision: AtomicU64,
    subscribers: Mutex<Vec<Sender<ChangeNotice>>>,
}

impl ChangeFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current revision; 0 before anything was published.
    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::SeqCst)
    }

    /// Registers a new subscriber that receives every later notice.
    pub fn subscribe(&self) -> Receiver<ChangeNotice> {
        let (tx, rx) = mpsc::channel();
        match self.subscribers.lock() {
            Ok(mut subscribers) => subscribers.push(tx),
            Err(poisoned) => poisoned.into_inner().push(tx),
        }
        rx
    }

    /// Bumps the revision and delivers the notice to live subscribers.
    pub fn publish(&self, event: ChangeEvent) -> ChangeNotice {
        let revision = self.revision.fetch_add(1, Ordering::SeqCst) + 1;
        let notice = ChangeNotice { revision, event };

        let mut subscribers = match self.subscribers.lock() {
            Ok(subscribers) => subscribers,
            Err(poisoned) => {
                error!("event=change_publish module=events status=error error_code=lock_poisoned");
                poisoned.into_inner()
            }
        };
        subscribers.retain(|tx| tx.send(notice).is_ok());
        debug!(
            "event=change_publish module=events status=ok change={} revision={} subscribers={}",
            event.name(),
            revision,
            subscribers.len()
        );
        notice
    }

    /// Number of subscribers still registered.
    pub fn subscriber_count(&self) -> usize {
        match self.subscribers.lock() {
            Ok(subscribers) => subscribers.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }
}
