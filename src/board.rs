//! The task board: joins provider snapshots into [`TaskWithDetails`] and
//! drives mutations with role and visibility checks.

use std::collections::HashMap;

use chrono::Utc;
use serde::Serialize;

use crate::config::Config;
use crate::error::{Error, Result, ValidationError};
use crate::filter::{apply_filters, TaskFilter};
use crate::model::{
    Actor, Assignment, ChecklistItem, NewChecklistItem, NewProfile, NewTask, Profile, Task, TaskStatus,
    TaskWithDetails,
};
use crate::progress::{completes_checklist, ChecklistProgress};
use crate::provider::DataProvider;
use crate::stats::TaskStats;
use crate::validate::{validate_new_profile, validate_new_task};
use crate::visibility::{is_visible_in_scope, visible_tasks, Scope};

/// Result of toggling one checklist item.
#[derive(Debug, Clone, Serialize)]
pub struct ToggleOutcome {
    pub item: ChecklistItem,
    pub progress: ChecklistProgress,
    /// This toggle completed the last open item of the checklist.
    pub checklist_completed: bool,
}

pub struct Board<P: DataProvider> {
    provider: P,
    config: Config,
}

impl<P: DataProvider> Board<P> {
    pub fn new(provider: P, config: Config) -> Self {
        Self { provider, config }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Actor for a stored profile id.
    pub fn actor_for(&self, user_id: &str) -> Result<Actor> {
        let profile = self
            .provider
            .get_profile(user_id)?
            .ok_or_else(|| Error::UnknownActor(user_id.to_string()))?;
        Ok(Actor::from_profile(&profile)?)
    }

    /// Fetch everything and join it. Checklist items whose task is gone are
    /// dropped.
    pub fn load(&self) -> Result<Vec<TaskWithDetails>> {
        let tasks = self.provider.list_tasks()?;
        let profiles: HashMap<String, Profile> = self
            .provider
            .list_profiles()?
            .into_iter()
            .map(|profile| (profile.id.clone(), profile))
            .collect();

        let mut items_by_task: HashMap<String, Vec<ChecklistItem>> = HashMap::new();
        for item in self.provider.list_all_checklist_items()? {
            items_by_task
                .entry(item.task_id.clone())
                .or_default()
                .push(item);
        }

        let details = tasks
            .into_iter()
            .map(|task| {
                let mut checklist_items = items_by_task.remove(&task.id).unwrap_or_default();
                checklist_items.sort_by_key(|item| item.order);
                let creator = profiles.get(&task.created_by).cloned();
                let assignee = task
                    .assigned_user_id()
                    .and_then(|user_id| profiles.get(user_id))
                    .cloned();
                TaskWithDetails {
                    task,
                    creator,
                    assignee,
                    checklist_items,
                }
            })
            .collect();

        if !items_by_task.is_empty() {
            tracing::debug!(orphans = items_by_task.len(), "dropped checklist items without a task");
        }
        Ok(details)
    }

    /// Visible tasks in `scope`, then filtered. Input order is kept.
    pub fn view(
        &self,
        actor: &Actor,
        scope: Scope,
        filter: &TaskFilter,
    ) -> Result<Vec<TaskWithDetails>> {
        let all = self.load()?;
        let visible = visible_tasks(actor, &all, scope);
        Ok(apply_filters(actor, &visible, filter))
    }

    pub fn stats(&self, actor: &Actor) -> Result<TaskStats> {
        let tasks = self.provider.list_tasks()?;
        Ok(TaskStats::for_actor(actor, &tasks))
    }

    /// One task with details, if the actor can see it.
    pub fn details(&self, actor: &Actor, task_id: &str) -> Result<TaskWithDetails> {
        let task = self
            .load()?
            .into_iter()
            .find(|details| details.task.id == task_id)
            .ok_or_else(|| Error::TaskNotFound(task_id.to_string()))?;
        if !is_visible_in_scope(actor, &task.task, Scope::All) {
            return Err(Error::forbidden(actor.id(), format!("view task {task_id}")));
        }
        Ok(task)
    }

    pub fn create_task(
        &self,
        actor: &Actor,
        form: &NewTask,
        items: &[NewChecklistItem],
    ) -> Result<Task> {
        if !actor.is_manager() {
            return Err(Error::forbidden(actor.id(), "create tasks"));
        }
        let today = Utc::now().date_naive();
        let draft = validate_new_task(form, items, &self.config, today)?;
        if let Assignment::User(user_id) = &draft.assignment {
            if self.provider.get_profile(user_id)?.is_none() {
                return Err(Error::ProfileNotFound(user_id.clone()));
            }
        }

        let task = self.provider.create_task(&draft, actor.id())?;
        tracing::info!(task_id = %task.id, actor = actor.id(), items = draft.checklist.len(), "task created");
        Ok(task)
    }

    pub fn update_status(&self, actor: &Actor, task_id: &str, status: TaskStatus) -> Result<Task> {
        self.require_visible(actor, task_id, "change the status of")?;
        let task = self.provider.update_task_status(task_id, status)?;
        tracing::info!(task_id, actor = actor.id(), status = %status, "task status changed");
        Ok(task)
    }

    /// Set one checklist item's completion.
    ///
    /// `checklist_completed` comes from a read taken before the store lock,
    /// so two concurrent toggles closing the last two items may both report
    /// `false`.
    pub fn toggle_item(
        &self,
        actor: &Actor,
        item_id: &str,
        completed: bool,
    ) -> Result<ToggleOutcome> {
        let owner = self
            .provider
            .list_all_checklist_items()?
            .into_iter()
            .find(|item| item.id == item_id)
            .ok_or_else(|| Error::ChecklistItemNotFound(item_id.to_string()))?;
        self.require_visible(actor, &owner.task_id, "update the checklist of")?;

        let before = self.provider.list_checklist_items(&owner.task_id)?;
        let checklist_completed = completes_checklist(&before, item_id, completed);

        let item = self.provider.toggle_checklist_item(item_id, completed)?;
        let after = self.provider.list_checklist_items(&item.task_id)?;
        tracing::info!(item_id, task_id = %item.task_id, completed, "checklist item toggled");

        Ok(ToggleOutcome {
            item,
            progress: ChecklistProgress::of(&after),
            checklist_completed,
        })
    }

    pub fn delete_task(&self, actor: &Actor, task_id: &str) -> Result<()> {
        if !actor.is_manager() {
            return Err(Error::forbidden(actor.id(), "delete tasks"));
        }
        self.provider.delete_task(task_id)?;
        tracing::info!(task_id, actor = actor.id(), "task deleted");
        Ok(())
    }

    pub fn register_profile(&self, form: &NewProfile) -> Result<Profile> {
        let profile = validate_new_profile(form, &self.config)?;
        self.provider.create_profile(&profile)
    }

    pub fn rename_profile(&self, actor: &Actor, full_name: &str) -> Result<Profile> {
        let full_name = full_name.trim();
        if full_name.is_empty() {
            return Err(ValidationError::MissingName.into());
        }
        self.provider.update_profile_name(actor.id(), full_name)
    }

    pub fn set_avatar(&self, actor: &Actor, avatar_url: &str) -> Result<Profile> {
        self.provider.set_avatar_url(actor.id(), avatar_url)
    }

    fn require_visible(&self, actor: &Actor, task_id: &str, action: &str) -> Result<Task> {
        let task = self
            .provider
            .list_tasks()?
            .into_iter()
            .find(|task| task.id == task_id)
            .ok_or_else(|| Error::TaskNotFound(task_id.to_string()))?;
        if !is_visible_in_scope(actor, &task, Scope::All) {
            return Err(Error::forbidden(actor.id(), format!("{action} task {task_id}")));
        }
        Ok(task)
    }
}
