//! File-backed data provider.
//!
//! Tasks and checklist items are recorded as an append-only JSONL event log
//! (`tasks.jsonl`). A materialized snapshot (`tasks.snapshot.json`) is kept
//! next to it and records the log length it covers; a missing snapshot, or
//! one whose length disagrees with the log, is replaced by a replay. Profiles
//! live in a separate registry handled by [`Storage`].

use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::error::{Error, Result, ValidationError};
use crate::lock::{lock_path_for, FileLock, DEFAULT_LOCK_TIMEOUT_MS};
use crate::model::{ChecklistItem, NewProfile, Profile, Task, TaskDraft, TaskStatus};
use crate::provider::DataProvider;
use crate::storage::Storage;

pub const SNAPSHOT_SCHEMA_VERSION: &str = "taskdesk.tasks.v1";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StoreEventType {
    TaskCreated,
    TaskStatusChanged,
    ChecklistItemToggled,
    TaskDeleted,
}

/// One line of the task log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreEvent {
    pub event_id: String,
    pub task_id: String,
    #[serde(rename = "type")]
    pub event_type: StoreEventType,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<Task>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub checklist_items: Vec<ChecklistItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl StoreEvent {
    pub fn new(event_type: StoreEventType, task_id: impl Into<String>) -> Self {
        Self {
            event_id: Ulid::new().to_string(),
            task_id: task_id.into(),
            event_type,
            timestamp: Utc::now(),
            actor: None,
            task: None,
            checklist_items: Vec::new(),
            status: None,
            item_id: None,
            completed: None,
        }
    }
}

/// Materialized tasks and checklist items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSnapshot {
    pub schema_version: String,
    pub generated_at: DateTime<Utc>,
    /// Byte length of `tasks.jsonl` when this snapshot was written.
    #[serde(default)]
    pub log_bytes: u64,
    pub tasks: Vec<Task>,
    pub checklist_items: Vec<ChecklistItem>,
}

impl TaskSnapshot {
    pub fn empty() -> Self {
        Self {
            schema_version: SNAPSHOT_SCHEMA_VERSION.to_string(),
            generated_at: Utc::now(),
            log_bytes: 0,
            tasks: Vec::new(),
            checklist_items: Vec::new(),
        }
    }

    fn from_state(state: SnapshotState) -> Self {
        let SnapshotState { tasks, items } = state;

        let mut tasks: Vec<Task> = tasks.into_values().collect();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));

        let known: HashSet<&str> = tasks.iter().map(|task| task.id.as_str()).collect();
        let mut checklist_items: Vec<ChecklistItem> = items
            .into_values()
            .filter(|item| known.contains(item.task_id.as_str()))
            .collect();
        checklist_items.sort_by(|a, b| {
            a.task_id
                .cmp(&b.task_id)
                .then_with(|| a.order.cmp(&b.order))
                .then_with(|| a.id.cmp(&b.id))
        });

        Self {
            schema_version: SNAPSHOT_SCHEMA_VERSION.to_string(),
            generated_at: Utc::now(),
            log_bytes: 0,
            tasks,
            checklist_items,
        }
    }

    fn into_state(self) -> SnapshotState {
        SnapshotState {
            tasks: self
                .tasks
                .into_iter()
                .map(|task| (task.id.clone(), task))
                .collect(),
            items: self
                .checklist_items
                .into_iter()
                .map(|item| (item.id.clone(), item))
                .collect(),
        }
    }
}

#[derive(Debug, Default)]
struct SnapshotState {
    tasks: HashMap<String, Task>,
    items: HashMap<String, ChecklistItem>,
}

fn apply_event(state: &mut SnapshotState, event: &StoreEvent) -> Result<()> {
    match event.event_type {
        StoreEventType::TaskCreated => {
            if state.tasks.contains_key(&event.task_id) {
                return Err(Error::InvalidArgument(format!(
                    "task already exists: {}",
                    event.task_id
                )));
            }
            let task = event.task.clone().ok_or_else(|| {
                Error::DataAccess(format!("task_created without task for {}", event.task_id))
            })?;
            for item in &event.checklist_items {
                state.items.insert(item.id.clone(), item.clone());
            }
            state.tasks.insert(event.task_id.clone(), task);
        }
        StoreEventType::TaskStatusChanged => {
            let status = event.status.ok_or_else(|| {
                Error::DataAccess(format!("status change without status for {}", event.task_id))
            })?;
            let task = state
                .tasks
                .get_mut(&event.task_id)
                .ok_or_else(|| Error::TaskNotFound(event.task_id.clone()))?;
            task.status = status;
            task.updated_at = event.timestamp;
        }
        StoreEventType::ChecklistItemToggled => {
            let item_id = event.item_id.as_deref().ok_or_else(|| {
                Error::DataAccess(format!("toggle without item for {}", event.task_id))
            })?;
            let item = state
                .items
                .get_mut(item_id)
                .ok_or_else(|| Error::ChecklistItemNotFound(item_id.to_string()))?;
            item.is_completed = event.completed.unwrap_or(!item.is_completed);
        }
        StoreEventType::TaskDeleted => {
            if state.tasks.remove(&event.task_id).is_none() {
                return Err(Error::TaskNotFound(event.task_id.clone()));
            }
            state.items.retain(|_, item| item.task_id != event.task_id);
        }
    }
    Ok(())
}

/// Replay events in log order. Events that no longer apply are skipped.
fn build_snapshot(events: &[StoreEvent]) -> TaskSnapshot {
    let mut state = SnapshotState::default();
    for event in events {
        if let Err(err) = apply_event(&mut state, event) {
            tracing::warn!(event_id = %event.event_id, error = %err, "skipping task event");
        }
    }
    TaskSnapshot::from_state(state)
}

/// [`DataProvider`] over the `.taskdesk/` directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    storage: Storage,
}

impl FileStore {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    pub fn open(root: impl AsRef<Path>) -> Self {
        Self::new(Storage::new(root.as_ref()))
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Current snapshot. Replays the log when the stored snapshot is missing
    /// or does not cover the whole log.
    pub fn snapshot(&self) -> Result<TaskSnapshot> {
        let path = self.storage.tasks_snapshot();
        let log_bytes = self.log_bytes()?;
        if path.exists() {
            let stored: TaskSnapshot = self.storage.read_json(&path)?;
            if stored.log_bytes == log_bytes {
                return Ok(stored);
            }
            tracing::warn!(
                snapshot_bytes = stored.log_bytes,
                log_bytes,
                "task snapshot is stale, replaying log"
            );
        }
        let events = self.load_events()?;
        let mut snapshot = build_snapshot(&events);
        snapshot.log_bytes = log_bytes;
        Ok(snapshot)
    }

    /// Replay the whole log and overwrite the snapshot.
    pub fn rebuild(&self) -> Result<TaskSnapshot> {
        let _lock = self.lock()?;
        let events = self.load_events()?;
        let mut snapshot = build_snapshot(&events);
        snapshot.log_bytes = self.log_bytes()?;
        self.storage
            .write_json(&self.storage.tasks_snapshot(), &snapshot)?;
        tracing::info!(events = events.len(), tasks = snapshot.tasks.len(), "rebuilt task snapshot");
        Ok(snapshot)
    }

    pub fn load_events(&self) -> Result<Vec<StoreEvent>> {
        self.storage.read_jsonl(&self.storage.tasks_log())
    }

    fn log_bytes(&self) -> Result<u64> {
        match fs::metadata(self.storage.tasks_log()) {
            Ok(meta) => Ok(meta.len()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(0),
            Err(err) => Err(err.into()),
        }
    }

    fn lock(&self) -> Result<FileLock> {
        FileLock::acquire(
            lock_path_for(&self.storage.tasks_log()),
            DEFAULT_LOCK_TIMEOUT_MS,
        )
    }

    /// Validate `event` against the current state, then log it and refresh the
    /// snapshot, all under the log lock.
    ///
    /// Once the event is in the log the mutation stands. A snapshot that fails
    /// to write is removed so the next read replays the log.
    fn commit(&self, event: StoreEvent) -> Result<TaskSnapshot> {
        let _lock = self.lock()?;

        let mut state = self.snapshot()?.into_state();
        apply_event(&mut state, &event)?;

        self.storage.append_jsonl(&self.storage.tasks_log(), &event)?;
        let mut snapshot = TaskSnapshot::from_state(state);
        snapshot.log_bytes = self.log_bytes()?;
        let snapshot_path = self.storage.tasks_snapshot();
        if let Err(err) = self.storage.write_json(&snapshot_path, &snapshot) {
            tracing::warn!(error = %err, "task snapshot write failed, dropping it");
            if let Err(err) = fs::remove_file(&snapshot_path) {
                if err.kind() != ErrorKind::NotFound {
                    tracing::warn!(error = %err, "could not remove stale task snapshot");
                }
            }
        }

        tracing::debug!(
            event_id = %event.event_id,
            task_id = %event.task_id,
            event_type = ?event.event_type,
            "committed task event"
        );
        Ok(snapshot)
    }

    fn find_item(&self, item_id: &str) -> Result<ChecklistItem> {
        self.snapshot()?
            .checklist_items
            .into_iter()
            .find(|item| item.id == item_id)
            .ok_or_else(|| Error::ChecklistItemNotFound(item_id.to_string()))
    }
}

impl DataProvider for FileStore {
    fn list_tasks(&self) -> Result<Vec<Task>> {
        Ok(self.snapshot()?.tasks)
    }

    fn list_checklist_items(&self, task_id: &str) -> Result<Vec<ChecklistItem>> {
        let mut items: Vec<ChecklistItem> = self
            .snapshot()?
            .checklist_items
            .into_iter()
            .filter(|item| item.task_id == task_id)
            .collect();
        items.sort_by_key(|item| item.order);
        Ok(items)
    }

    fn list_all_checklist_items(&self) -> Result<Vec<ChecklistItem>> {
        Ok(self.snapshot()?.checklist_items)
    }

    fn get_profile(&self, user_id: &str) -> Result<Option<Profile>> {
        Ok(self
            .storage
            .list_profiles()?
            .into_iter()
            .find(|profile| profile.id == user_id))
    }

    fn list_profiles(&self) -> Result<Vec<Profile>> {
        self.storage.list_profiles()
    }

    fn create_task(&self, draft: &TaskDraft, created_by: &str) -> Result<Task> {
        let now = Utc::now();
        let task_id = Ulid::new().to_string();
        let task = Task {
            id: task_id.clone(),
            title: draft.title.clone(),
            description: draft.description.clone(),
            deadline: draft.deadline,
            status: TaskStatus::Pending,
            assignment: draft.assignment.clone(),
            created_by: created_by.to_string(),
            created_at: now,
            updated_at: now,
        };
        let items = draft
            .checklist
            .iter()
            .enumerate()
            .map(|(order, description)| ChecklistItem {
                id: Ulid::new().to_string(),
                task_id: task_id.clone(),
                description: description.clone(),
                is_completed: false,
                order: order as u32,
            })
            .collect();

        let mut event = StoreEvent::new(StoreEventType::TaskCreated, &task_id);
        event.timestamp = now;
        event.actor = Some(created_by.to_string());
        event.task = Some(task.clone());
        event.checklist_items = items;
        self.commit(event)?;
        Ok(task)
    }

    fn update_task_status(&self, task_id: &str, status: TaskStatus) -> Result<Task> {
        let mut event = StoreEvent::new(StoreEventType::TaskStatusChanged, task_id);
        event.status = Some(status);
        let snapshot = self.commit(event)?;
        snapshot
            .tasks
            .into_iter()
            .find(|task| task.id == task_id)
            .ok_or_else(|| Error::TaskNotFound(task_id.to_string()))
    }

    fn toggle_checklist_item(&self, item_id: &str, completed: bool) -> Result<ChecklistItem> {
        let item = self.find_item(item_id)?;
        let mut event = StoreEvent::new(StoreEventType::ChecklistItemToggled, &item.task_id);
        event.item_id = Some(item_id.to_string());
        event.completed = Some(completed);
        let snapshot = self.commit(event)?;
        snapshot
            .checklist_items
            .into_iter()
            .find(|item| item.id == item_id)
            .ok_or_else(|| Error::ChecklistItemNotFound(item_id.to_string()))
    }

    fn delete_task(&self, task_id: &str) -> Result<()> {
        self.commit(StoreEvent::new(StoreEventType::TaskDeleted, task_id))?;
        Ok(())
    }

    fn create_profile(&self, profile: &NewProfile) -> Result<Profile> {
        let record = Profile {
            id: uuid::Uuid::new_v4().to_string(),
            full_name: profile.full_name.clone(),
            email: profile.email.clone(),
            department: profile.department.clone(),
            role: profile.role,
            avatar_url: None,
            created_at: Utc::now(),
        };
        let stored = record.clone();
        self.storage
            .update_profiles(move |registry| registry.insert(stored))?;
        tracing::debug!(profile_id = %record.id, role = %record.role, "created profile");
        Ok(record)
    }

    fn update_profile_name(&self, user_id: &str, full_name: &str) -> Result<Profile> {
        let full_name = full_name.trim();
        if full_name.is_empty() {
            return Err(ValidationError::MissingName.into());
        }
        self.storage.update_profiles(|registry| {
            let profile = registry
                .find_mut(user_id)
                .ok_or_else(|| Error::ProfileNotFound(user_id.to_string()))?;
            profile.full_name = full_name.to_string();
            Ok(profile.clone())
        })
    }

    fn set_avatar_url(&self, user_id: &str, avatar_url: &str) -> Result<Profile> {
        self.storage.update_profiles(|registry| {
            let profile = registry
                .find_mut(user_id)
                .ok_or_else(|| Error::ProfileNotFound(user_id.to_string()))?;
            profile.avatar_url = Some(avatar_url.to_string());
            Ok(profile.clone())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Assignment, Role};
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn draft(title: &str, items: &[&str]) -> TaskDraft {
        TaskDraft {
            title: title.to_string(),
            description: None,
            deadline: NaiveDate::from_ymd_opt(2030, 6, 1).expect("date"),
            assignment: Assignment::Department("Vendas".into()),
            checklist: items.iter().map(|item| item.to_string()).collect(),
        }
    }

    fn store() -> (tempfile::TempDir, FileStore) {
        let dir = tempdir().expect("tempdir");
        let store = FileStore::open(dir.path());
        store.storage().init().expect("init");
        (dir, store)
    }

    #[test]
    fn create_task_stores_ordered_checklist() {
        let (_dir, store) = store();
        let task = store
            .create_task(&draft("Inventário", &["contar", "conferir", "assinar"]), "boss")
            .expect("create");
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.created_by, "boss");

        let items = store.list_checklist_items(&task.id).expect("items");
        let texts: Vec<&str> = items.iter().map(|item| item.description.as_str()).collect();
        assert_eq!(texts, vec!["contar", "conferir", "assinar"]);
        assert_eq!(items.iter().map(|item| item.order).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert!(items.iter().all(|item| !item.is_completed));
    }

    #[test]
    fn status_and_toggle_update_snapshot() {
        let (_dir, store) = store();
        let task = store.create_task(&draft("T", &["a", "b"]), "boss").expect("create");

        let updated = store
            .update_task_status(&task.id, TaskStatus::InProgress)
            .expect("status");
        assert_eq!(updated.status, TaskStatus::InProgress);
        assert!(updated.updated_at >= task.updated_at);

        let items = store.list_checklist_items(&task.id).expect("items");
        let toggled = store.toggle_checklist_item(&items[0].id, true).expect("toggle");
        assert!(toggled.is_completed);

        let reread = store.list_checklist_items(&task.id).expect("items");
        assert!(reread[0].is_completed);
        assert!(!reread[1].is_completed);
    }

    #[test]
    fn delete_cascades_checklist_items() {
        let (_dir, store) = store();
        let keep = store.create_task(&draft("keep", &["k"]), "boss").expect("create");
        let gone = store.create_task(&draft("gone", &["g1", "g2"]), "boss").expect("create");

        store.delete_task(&gone.id).expect("delete");

        let tasks = store.list_tasks().expect("tasks");
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, keep.id);
        let items = store.list_all_checklist_items().expect("items");
        assert!(items.iter().all(|item| item.task_id == keep.id));
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn missing_targets_are_reported() {
        let (_dir, store) = store();
        assert!(matches!(
            store.update_task_status("nope", TaskStatus::Completed),
            Err(Error::TaskNotFound(_))
        ));
        assert!(matches!(
            store.toggle_checklist_item("nope", true),
            Err(Error::ChecklistItemNotFound(_))
        ));
        assert!(matches!(store.delete_task("nope"), Err(Error::TaskNotFound(_))));
        assert!(store.load_events().expect("events").is_empty());
    }

    #[test]
    fn snapshot_is_rebuilt_from_log() {
        let (_dir, store) = store();
        let first = store.create_task(&draft("first", &["x"]), "boss").expect("create");
        let second = store.create_task(&draft("second", &["y"]), "boss").expect("create");
        store
            .update_task_status(&first.id, TaskStatus::Completed)
            .expect("status");

        std::fs::remove_file(store.storage().tasks_snapshot()).expect("remove snapshot");
        let rebuilt = store.snapshot().expect("snapshot");
        assert_eq!(rebuilt.tasks.len(), 2);
        let first_again = rebuilt
            .tasks
            .iter()
            .find(|task| task.id == first.id)
            .expect("first");
        assert_eq!(first_again.status, TaskStatus::Completed);
        assert!(rebuilt.tasks.iter().any(|task| task.id == second.id));

        store.rebuild().expect("rebuild");
        assert!(store.storage().tasks_snapshot().exists());
    }

    #[test]
    fn stale_snapshot_is_ignored_in_favor_of_log() {
        let (_dir, store) = store();
        let first = store.create_task(&draft("first", &["x"]), "boss").expect("create");
        let stale = std::fs::read(store.storage().tasks_snapshot()).expect("read snapshot");

        let second = store.create_task(&draft("second", &["y"]), "boss").expect("create");
        store
            .update_task_status(&first.id, TaskStatus::InProgress)
            .expect("status");
        std::fs::write(store.storage().tasks_snapshot(), stale).expect("restore stale snapshot");

        let tasks = store.list_tasks().expect("tasks");
        assert_eq!(tasks.len(), 2);
        assert!(tasks.iter().any(|task| task.id == second.id));
        let first_again = tasks.iter().find(|task| task.id == first.id).expect("first");
        assert_eq!(first_again.status, TaskStatus::InProgress);
        assert_eq!(store.list_checklist_items(&second.id).expect("items").len(), 1);

        let third = store.create_task(&draft("third", &["z"]), "boss").expect("create");
        let replayed = store.rebuild().expect("rebuild");
        assert_eq!(store.snapshot().expect("snapshot").tasks, replayed.tasks);
        assert!(replayed.tasks.iter().any(|task| task.id == third.id));
    }

    #[test]
    fn snapshot_drops_orphan_items() {
        let now = Utc::now();
        let mut state = SnapshotState::default();
        state.items.insert(
            "orphan".to_string(),
            ChecklistItem {
                id: "orphan".to_string(),
                task_id: "missing".to_string(),
                description: "lost".to_string(),
                is_completed: false,
                order: 0,
            },
        );
        state.tasks.insert(
            "t".to_string(),
            Task {
                id: "t".to_string(),
                title: "t".to_string(),
                description: None,
                deadline: NaiveDate::from_ymd_opt(2030, 1, 1).expect("date"),
                status: TaskStatus::Pending,
                assignment: Assignment::User("u".to_string()),
                created_by: "m".to_string(),
                created_at: now,
                updated_at: now,
            },
        );
        let snapshot = TaskSnapshot::from_state(state);
        assert_eq!(snapshot.tasks.len(), 1);
        assert!(snapshot.checklist_items.is_empty());
    }

    #[test]
    fn list_tasks_is_newest_first() {
        let (_dir, store) = store();
        let older = store.create_task(&draft("older", &["a"]), "boss").expect("create");
        std::thread::sleep(std::time::Duration::from_millis(5));
        let newer = store.create_task(&draft("newer", &["b"]), "boss").expect("create");

        let ids: Vec<String> = store
            .list_tasks()
            .expect("tasks")
            .into_iter()
            .map(|task| task.id)
            .collect();
        assert_eq!(ids, vec![newer.id, older.id]);
    }

    #[test]
    fn profiles_round_trip() {
        let (_dir, store) = store();
        let profile = store
            .create_profile(&NewProfile {
                full_name: "Ana Lima".to_string(),
                email: "ana@example.com".to_string(),
                role: Role::Member,
                department: Some("Vendas".into()),
            })
            .expect("create");
        assert!(uuid::Uuid::parse_str(&profile.id).is_ok());

        let renamed = store
            .update_profile_name(&profile.id, "  Ana Souza ")
            .expect("rename");
        assert_eq!(renamed.full_name, "Ana Souza");

        let with_avatar = store
            .set_avatar_url(&profile.id, "avatars/x/1.jpg")
            .expect("avatar");
        assert_eq!(with_avatar.avatar_url.as_deref(), Some("avatars/x/1.jpg"));

        let fetched = store.get_profile(&profile.id).expect("get").expect("some");
        assert_eq!(fetched.full_name, "Ana Souza");
        assert!(store.get_profile("missing").expect("get").is_none());

        assert!(matches!(
            store.update_profile_name(&profile.id, " "),
            Err(Error::Validation(ValidationError::MissingName))
        ));
        assert!(matches!(
            store.set_avatar_url("missing", "x"),
            Err(Error::ProfileNotFound(_))
        ));
    }
}
