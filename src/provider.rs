//! Seams to the outside world: the data provider and change notification.
//!
//! The engine never talks to storage directly. A [`DataProvider`] hands over
//! snapshots and applies single-call mutations; a [`ChangeNotifier`] tells
//! consumers that something changed so they can decide whether to refetch.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::error::Result;
use crate::model::{ChecklistItem, NewProfile, Profile, Task, TaskDraft, TaskStatus};

/// Persistence collaborator.
///
/// Every call is a single request; no retry, queue or rollback happens above
/// this trait.
pub trait DataProvider {
    /// All tasks, newest first.
    fn list_tasks(&self) -> Result<Vec<Task>>;

    /// Checklist items of one task, ascending by `order`.
    fn list_checklist_items(&self, task_id: &str) -> Result<Vec<ChecklistItem>>;

    /// Every checklist item in the store. The default asks for each task in
    /// turn; stores that can read everything at once override it.
    fn list_all_checklist_items(&self) -> Result<Vec<ChecklistItem>> {
        let mut items = Vec::new();
        for task in self.list_tasks()? {
            items.extend(self.list_checklist_items(&task.id)?);
        }
        Ok(items)
    }

    fn get_profile(&self, user_id: &str) -> Result<Option<Profile>>;

    fn list_profiles(&self) -> Result<Vec<Profile>>;

    /// Create a task and its checklist as one unit.
    fn create_task(&self, draft: &TaskDraft, created_by: &str) -> Result<Task>;

    fn update_task_status(&self, task_id: &str, status: TaskStatus) -> Result<Task>;

    fn toggle_checklist_item(&self, item_id: &str, completed: bool) -> Result<ChecklistItem>;

    /// Delete a task; its checklist items go with it.
    fn delete_task(&self, task_id: &str) -> Result<()>;

    fn create_profile(&self, profile: &NewProfile) -> Result<Profile>;

    fn update_profile_name(&self, user_id: &str, full_name: &str) -> Result<Profile>;

    fn set_avatar_url(&self, user_id: &str, avatar_url: &str) -> Result<Profile>;
}

/// Table touched by a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeTable {
    Tasks,
    ChecklistItems,
    Profiles,
}

impl ChangeTable {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeTable::Tasks => "tasks",
            ChangeTable::ChecklistItems => "checklist_items",
            ChangeTable::Profiles => "profiles",
        }
    }
}

impl fmt::Display for ChangeTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque "something changed" notice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeToken {
    pub sequence: u64,
    pub tables: Vec<ChangeTable>,
}

impl ChangeToken {
    pub fn touches(&self, table: ChangeTable) -> bool {
        self.tables.contains(&table)
    }
}

/// Change-notification collaborator.
pub trait ChangeNotifier {
    fn subscribe(&self) -> Result<Subscription>;
}

/// Stream of [`ChangeToken`]s. Dropping it or calling [`Subscription::cancel`]
/// stops delivery.
pub struct Subscription {
    receiver: Receiver<ChangeToken>,
    cancelled: Arc<AtomicBool>,
}

/// Handle a producer uses to notice that its subscriber went away.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    cancelled: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl Subscription {
    /// Create a subscription and the producer half that feeds it.
    pub fn channel() -> (mpsc::Sender<ChangeToken>, CancelHandle, Self) {
        let (sender, receiver) = mpsc::channel();
        let cancelled = Arc::new(AtomicBool::new(false));
        let handle = CancelHandle {
            cancelled: Arc::clone(&cancelled),
        };
        (sender, handle, Self { receiver, cancelled })
    }

    /// Block for the next token. `None` once cancelled or the producer is gone.
    pub fn recv(&self) -> Option<ChangeToken> {
        if self.is_cancelled() {
            return None;
        }
        self.receiver.recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<ChangeToken> {
        if self.is_cancelled() {
            return None;
        }
        match self.receiver.recv_timeout(timeout) {
            Ok(token) => Some(token),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    pub fn try_recv(&self) -> Option<ChangeToken> {
        if self.is_cancelled() {
            return None;
        }
        match self.receiver.try_recv() {
            Ok(token) => Some(token),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(sequence: u64) -> ChangeToken {
        ChangeToken {
            sequence,
            tables: vec![ChangeTable::Tasks],
        }
    }

    #[test]
    fn delivers_until_cancelled() {
        let (sender, handle, subscription) = Subscription::channel();
        sender.send(token(1)).expect("send");
        assert_eq!(subscription.try_recv(), Some(token(1)));
        assert!(!handle.is_cancelled());

        sender.send(token(2)).expect("send");
        subscription.cancel();
        assert!(handle.is_cancelled());
        assert_eq!(subscription.try_recv(), None);
    }

    #[test]
    fn drop_marks_cancelled() {
        let (_sender, handle, subscription) = Subscription::channel();
        drop(subscription);
        assert!(handle.is_cancelled());
    }

    #[test]
    fn recv_returns_none_when_producer_gone() {
        let (sender, _handle, subscription) = Subscription::channel();
        drop(sender);
        assert_eq!(subscription.recv(), None);
        assert_eq!(subscription.recv_timeout(Duration::from_millis(5)), None);
    }

    #[test]
    fn token_reports_tables() {
        let token = ChangeToken {
            sequence: 3,
            tables: vec![ChangeTable::Tasks, ChangeTable::ChecklistItems],
        };
        assert!(token.touches(ChangeTable::ChecklistItems));
        assert!(!token.touches(ChangeTable::Profiles));
        assert_eq!(ChangeTable::ChecklistItems.to_string(), "checklist_items");
    }
}
