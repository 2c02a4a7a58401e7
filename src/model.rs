//! Domain records shared by the engine, the data provider and the CLI.
//!
//! Records here are snapshots handed over by a [`crate::provider::DataProvider`].
//! Nothing in this module performs I/O.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::progress::ChecklistProgress;

/// Organizational role of a user.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Manager,
    Member,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Manager => "manager",
            Role::Member => "member",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Role::Manager => "Gestor",
            Role::Member => "Colaborador",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "manager" | "gestor" => Ok(Role::Manager),
            "member" | "colaborador" => Ok(Role::Member),
            other => Err(format!("invalid role '{other}' (expected manager|member)")),
        }
    }
}

/// Department name. The set of valid names is configuration, see
/// [`crate::config::DepartmentsConfig`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct Department(String);

impl Department {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Department {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl PartialEq<str> for Department {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

/// The authenticated user performing an operation.
///
/// A Manager never carries a department; a Member always carries exactly one.
/// Fields are private so the invariant holds for every constructed value.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Actor {
    id: String,
    role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    department: Option<Department>,
}

impl Actor {
    pub fn manager(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: Role::Manager,
            department: None,
        }
    }

    pub fn member(id: impl Into<String>, department: impl Into<Department>) -> Self {
        Self {
            id: id.into(),
            role: Role::Member,
            department: Some(department.into()),
        }
    }

    /// Build the actor for a stored profile.
    ///
    /// A department on a Manager profile is ignored.
    pub fn from_profile(profile: &Profile) -> Result<Self, ValidationError> {
        match profile.role {
            Role::Manager => Ok(Self::manager(profile.id.clone())),
            Role::Member => {
                let department = profile
                    .department
                    .clone()
                    .ok_or(ValidationError::MemberWithoutDepartment)?;
                Ok(Self::member(profile.id.clone(), department))
            }
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn department(&self) -> Option<&Department> {
        self.department.as_ref()
    }

    pub fn is_manager(&self) -> bool {
        self.role == Role::Manager
    }
}

/// Stored user profile.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Profile {
    pub id: String,
    pub full_name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<Department>,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Profile {
    /// Up to two uppercase initials taken from the words of the full name.
    pub fn initials(&self) -> String {
        self.full_name
            .split_whitespace()
            .filter_map(|word| word.chars().next())
            .flat_map(char::to_uppercase)
            .take(2)
            .collect()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 3] = [
        TaskStatus::Pending,
        TaskStatus::InProgress,
        TaskStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
        }
    }

    /// Label shown on the dashboard.
    pub fn label(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "Pendente",
            TaskStatus::InProgress => "Em Andamento",
            TaskStatus::Completed => "Concluída",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        for status in TaskStatus::ALL {
            if status.label().eq_ignore_ascii_case(trimmed) {
                return Ok(status);
            }
        }
        match trimmed.to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "pending" => Ok(TaskStatus::Pending),
            "in_progress" => Ok(TaskStatus::InProgress),
            "completed" => Ok(TaskStatus::Completed),
            _ => Err(format!(
                "invalid status '{trimmed}' (expected pending|in_progress|completed)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentType {
    User,
    Department,
}

impl FromStr for AssignmentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(AssignmentType::User),
            "department" => Ok(AssignmentType::Department),
            other => Err(format!(
                "invalid assignment type '{other}' (expected user|department)"
            )),
        }
    }
}

/// Who a task is addressed to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "target", rename_all = "snake_case")]
pub enum Assignment {
    User(String),
    Department(Department),
}

impl Assignment {
    pub fn assignment_type(&self) -> AssignmentType {
        match self {
            Assignment::User(_) => AssignmentType::User,
            Assignment::Department(_) => AssignmentType::Department,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub deadline: NaiveDate,
    pub status: TaskStatus,
    pub assignment: Assignment,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn assignment_type(&self) -> AssignmentType {
        self.assignment.assignment_type()
    }

    pub fn assigned_user_id(&self) -> Option<&str> {
        match &self.assignment {
            Assignment::User(id) => Some(id),
            Assignment::Department(_) => None,
        }
    }

    pub fn assigned_department(&self) -> Option<&Department> {
        match &self.assignment {
            Assignment::Department(department) => Some(department),
            Assignment::User(_) => None,
        }
    }

    /// Past its deadline and not yet completed.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.deadline < today && self.status != TaskStatus::Completed
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChecklistItem {
    pub id: String,
    pub task_id: String,
    pub description: String,
    pub is_completed: bool,
    pub order: u32,
}

/// A task joined with its creator, assignee and ordered checklist.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TaskWithDetails {
    #[serde(flatten)]
    pub task: Task,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator: Option<Profile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<Profile>,
    pub checklist_items: Vec<ChecklistItem>,
}

impl TaskWithDetails {
    pub fn new(task: Task) -> Self {
        Self {
            task,
            creator: None,
            assignee: None,
            checklist_items: Vec::new(),
        }
    }

    pub fn progress(&self) -> ChecklistProgress {
        ChecklistProgress::of(&self.checklist_items)
    }
}

impl AsRef<Task> for Task {
    fn as_ref(&self) -> &Task {
        self
    }
}

impl AsRef<Task> for TaskWithDetails {
    fn as_ref(&self) -> &Task {
        &self.task
    }
}

/// Task creation form as submitted, before validation.
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub deadline: Option<NaiveDate>,
    pub assignment_type: Option<AssignmentType>,
    pub assigned_user_id: Option<String>,
    pub assigned_department: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewChecklistItem {
    pub description: String,
}

impl NewChecklistItem {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }
}

/// A validated task ready to be handed to the data provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub description: Option<String>,
    pub deadline: NaiveDate,
    pub assignment: Assignment,
    pub checklist: Vec<String>,
}

/// Profile registration form.
#[derive(Debug, Clone)]
pub struct NewProfile {
    pub full_name: String,
    pub email: String,
    pub role: Role,
    pub department: Option<Department>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(name: &str, role: Role, department: Option<&str>) -> Profile {
        Profile {
            id: "u-1".to_string(),
            full_name: name.to_string(),
            email: "u1@example.com".to_string(),
            department: department.map(Department::from),
            role,
            avatar_url: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn manager_profile_drops_department() {
        let actor = Actor::from_profile(&profile("Ana", Role::Manager, Some("Vendas")))
            .expect("actor");
        assert!(actor.is_manager());
        assert!(actor.department().is_none());
    }

    #[test]
    fn member_profile_requires_department() {
        let err = Actor::from_profile(&profile("Ana", Role::Member, None)).expect_err("no dept");
        assert_eq!(err, ValidationError::MemberWithoutDepartment);
    }

    #[test]
    fn initials_take_two_words() {
        let p = profile("maria da silva", Role::Member, Some("Vendas"));
        assert_eq!(p.initials(), "MD");
        let single = profile("Ângela", Role::Member, Some("Vendas"));
        assert_eq!(single.initials(), "Â");
    }

    #[test]
    fn status_parses_labels_and_keys() {
        assert_eq!("Em Andamento".parse::<TaskStatus>(), Ok(TaskStatus::InProgress));
        assert_eq!("in-progress".parse::<TaskStatus>(), Ok(TaskStatus::InProgress));
        assert_eq!("COMPLETED".parse::<TaskStatus>(), Ok(TaskStatus::Completed));
        assert_eq!("Concluída".parse::<TaskStatus>(), Ok(TaskStatus::Completed));
        assert!("done".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn assignment_serializes_as_tagged_variant() {
        let value = serde_json::to_value(Assignment::Department("Vendas".into())).expect("json");
        assert_eq!(value["type"], "department");
        assert_eq!(value["target"], "Vendas");
    }

    #[test]
    fn overdue_ignores_completed_tasks() {
        let now = Utc::now();
        let mut task = Task {
            id: "t".to_string(),
            title: "T".to_string(),
            description: None,
            deadline: NaiveDate::from_ymd_opt(2024, 1, 10).expect("date"),
            status: TaskStatus::Pending,
            assignment: Assignment::User("u".to_string()),
            created_by: "m".to_string(),
            created_at: now,
            updated_at: now,
        };
        let today = NaiveDate::from_ymd_opt(2024, 1, 11).expect("date");
        assert!(task.is_overdue(today));
        assert!(!task.is_overdue(task.deadline));
        task.status = TaskStatus::Completed;
        assert!(!task.is_overdue(today));
    }
}
