//! Which tasks an actor may see.
//!
//! - `mine`: tasks assigned to the actor directly
//! - `department`: tasks assigned to the actor's department
//! - `all`: every task for Managers, `mine ∪ department` for Members

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::model::{Actor, Assignment, Task};

/// Base visibility bucket requested by a view.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    #[default]
    All,
    Mine,
    Department,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::All => "all",
            Scope::Mine => "mine",
            Scope::Department => "department",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" | "all-tasks" => Ok(Scope::All),
            "mine" | "my-tasks" => Ok(Scope::Mine),
            "department" | "department-tasks" => Ok(Scope::Department),
            other => Err(format!(
                "invalid scope '{other}' (expected all|mine|department)"
            )),
        }
    }
}

pub fn is_assigned_to_me(actor: &Actor, task: &Task) -> bool {
    matches!(&task.assignment, Assignment::User(id) if id == actor.id())
}

pub fn is_my_department(actor: &Actor, task: &Task) -> bool {
    match (&task.assignment, actor.department()) {
        (Assignment::Department(target), Some(mine)) => target == mine,
        _ => false,
    }
}

/// Tasks a Member counts as their own: direct or department assignment.
pub fn is_relevant_to(actor: &Actor, task: &Task) -> bool {
    is_assigned_to_me(actor, task) || is_my_department(actor, task)
}

pub fn is_visible_in_scope(actor: &Actor, task: &Task, scope: Scope) -> bool {
    match scope {
        Scope::All => actor.is_manager() || is_relevant_to(actor, task),
        Scope::Mine => is_assigned_to_me(actor, task),
        Scope::Department => is_my_department(actor, task),
    }
}

/// Keep the tasks visible to `actor` in `scope`, preserving input order.
pub fn visible_tasks<T>(actor: &Actor, tasks: &[T], scope: Scope) -> Vec<T>
where
    T: AsRef<Task> + Clone,
{
    tasks
        .iter()
        .filter(|task| is_visible_in_scope(actor, task.as_ref(), scope))
        .cloned()
        .collect()
}
