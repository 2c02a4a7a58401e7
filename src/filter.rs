//! Compound task filtering: status, department and free-text search.
//!
//! Filters run after visibility and keep the relative order of their input.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::model::{Actor, Department, TaskStatus, TaskWithDetails};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    #[default]
    All,
    Only(TaskStatus),
}

impl StatusFilter {
    pub fn matches(&self, status: TaskStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => *wanted == status,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(StatusFilter::All);
        }
        s.parse().map(StatusFilter::Only)
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusFilter::All => f.write_str("all"),
            StatusFilter::Only(status) => write!(f, "{status}"),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DepartmentFilter {
    #[default]
    All,
    Only(Department),
}

impl DepartmentFilter {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            DepartmentFilter::All
        } else {
            DepartmentFilter::Only(Department::from(trimmed))
        }
    }
}

impl fmt::Display for DepartmentFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DepartmentFilter::All => f.write_str("all"),
            DepartmentFilter::Only(department) => write!(f, "{department}"),
        }
    }
}

/// Filter criteria chosen on a task list.
#[derive(Debug, Clone, Serialize, PartialEq, Eq, Default)]
pub struct TaskFilter {
    pub status: StatusFilter,
    pub department: DepartmentFilter,
    pub search: String,
}

impl TaskFilter {
    pub fn is_identity(&self) -> bool {
        self.status == StatusFilter::All
            && self.department == DepartmentFilter::All
            && self.search.is_empty()
    }

    /// Whether `task` passes every criterion for `actor`.
    ///
    /// The department criterion only applies to Managers: it matches tasks
    /// addressed to the department and tasks whose assignee belongs to it.
    pub fn matches(&self, actor: &Actor, task: &TaskWithDetails) -> bool {
        if !self.status.matches(task.task.status) {
            return false;
        }

        if actor.is_manager() {
            if let DepartmentFilter::Only(wanted) = &self.department {
                let direct = task.task.assigned_department() == Some(wanted);
                let via_assignee = task
                    .assignee
                    .as_ref()
                    .and_then(|profile| profile.department.as_ref())
                    == Some(wanted);
                if !direct && !via_assignee {
                    return false;
                }
            }
        }

        if !self.search.is_empty() {
            let needle = self.search.to_lowercase();
            let in_title = task.task.title.to_lowercase().contains(&needle);
            let in_description = task
                .task
                .description
                .as_deref()
                .map(|text| text.to_lowercase().contains(&needle))
                .unwrap_or(false);
            if !in_title && !in_description {
                return false;
            }
        }

        true
    }
}

pub fn apply_filters(
    actor: &Actor,
    tasks: &[TaskWithDetails],
    filter: &TaskFilter,
) -> Vec<TaskWithDetails> {
    if filter.is_identity() {
        return tasks.to_vec();
    }
    tasks
        .iter()
        .filter(|task| filter.matches(actor, task))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Assignment, Profile, Role, Task};
    use chrono::{NaiveDate, Utc};

    fn detailed(
        id: &str,
        title: &str,
        description: Option<&str>,
        status: TaskStatus,
        assignment: Assignment,
        assignee_department: Option<&str>,
    ) -> TaskWithDetails {
        let now = Utc::now();
        let assignee = match (&assignment, assignee_department) {
            (Assignment::User(user_id), Some(department)) => Some(Profile {
                id: user_id.clone(),
                full_name: user_id.clone(),
                email: format!("{user_id}@example.com"),
                department: Some(Department::from(department)),
                role: Role::Member,
                avatar_url: None,
                created_at: now,
            }),
            _ => None,
        };
        TaskWithDetails {
            task: Task {
                id: id.to_string(),
                title: title.to_string(),
                description: description.map(str::to_string),
                deadline: NaiveDate::from_ymd_opt(2030, 6, 1).expect("date"),
                status,
                assignment,
                created_by: "boss".to_string(),
                created_at: now,
                updated_at: now,
            },
            creator: None,
            assignee,
            checklist_items: Vec::new(),
        }
    }

    fn sample() -> Vec<TaskWithDetails> {
        vec![
            detailed(
                "t1",
                "Desenvolver módulo de relatórios",
                Some("Exportar PDF"),
                TaskStatus::InProgress,
                Assignment::User("ana".to_string()),
                Some("Desenvolvimento"),
            ),
            detailed(
                "t2",
                "Campanha de verão",
                None,
                TaskStatus::Pending,
                Assignment::Department(Department::from("Marketing")),
                None,
            ),
            detailed(
                "t3",
                "Fechar contrato",
                Some("Relatório de vendas anexado"),
                TaskStatus::Completed,
                Assignment::Department(Department::from("Vendas")),
                None,
            ),
            detailed(
                "t4",
                "Revisar backlog",
                None,
                TaskStatus::Pending,
                Assignment::Department(Department::from("Desenvolvimento")),
                None,
            ),
        ]
    }

    fn ids(tasks: &[TaskWithDetails]) -> Vec<&str> {
        tasks.iter().map(|task| task.task.id.as_str()).collect()
    }

    #[test]
    fn default_filter_is_identity() {
        let tasks = sample();
        let manager = Actor::manager("boss");
        let filtered = apply_filters(&manager, &tasks, &TaskFilter::default());
        assert_eq!(filtered, tasks);
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let tasks = sample();
        let manager = Actor::manager("boss");
        let filter = TaskFilter {
            search: "RELAT".to_string(),
            ..TaskFilter::default()
        };
        assert_eq!(ids(&apply_filters(&manager, &tasks, &filter)), vec!["t1", "t3"]);

        let filter = TaskFilter {
            search: "rep".to_string(),
            ..TaskFilter::default()
        };
        assert!(apply_filters(&manager, &tasks, &filter).is_empty());
    }

    #[test]
    fn task_without_description_matches_only_by_title() {
        let tasks = sample();
        let manager = Actor::manager("boss");
        let filter = TaskFilter {
            search: "verão".to_string(),
            ..TaskFilter::default()
        };
        assert_eq!(ids(&apply_filters(&manager, &tasks, &filter)), vec!["t2"]);
        let filter = TaskFilter {
            search: "pdf".to_string(),
            ..TaskFilter::default()
        };
        assert_eq!(ids(&apply_filters(&manager, &tasks, &filter)), vec!["t1"]);
    }

    #[test]
    fn status_filter_keeps_order() {
        let tasks = sample();
        let manager = Actor::manager("boss");
        let filter = TaskFilter {
            status: StatusFilter::Only(TaskStatus::Pending),
            ..TaskFilter::default()
        };
        assert_eq!(ids(&apply_filters(&manager, &tasks, &filter)), vec!["t2", "t4"]);
    }

    #[test]
    fn department_filter_matches_task_or_assignee_department() {
        let tasks = sample();
        let manager = Actor::manager("boss");
        let filter = TaskFilter {
            department: DepartmentFilter::Only(Department::from("Desenvolvimento")),
            ..TaskFilter::default()
        };
        assert_eq!(ids(&apply_filters(&manager, &tasks, &filter)), vec!["t1", "t4"]);
    }

    #[test]
    fn department_filter_is_ignored_for_members() {
        let tasks = sample();
        let member = Actor::member("ana", "Desenvolvimento");
        let filter = TaskFilter {
            department: DepartmentFilter::Only(Department::from("Vendas")),
            ..TaskFilter::default()
        };
        assert_eq!(apply_filters(&member, &tasks, &filter).len(), tasks.len());
    }

    #[test]
    fn filtering_is_idempotent() {
        let tasks = sample();
        let manager = Actor::manager("boss");
        let filter = TaskFilter {
            status: StatusFilter::Only(TaskStatus::Pending),
            department: DepartmentFilter::Only(Department::from("Desenvolvimento")),
            search: "back".to_string(),
        };
        let once = apply_filters(&manager, &tasks, &filter);
        let twice = apply_filters(&manager, &once, &filter);
        assert_eq!(once, twice);
        assert_eq!(ids(&once), vec!["t4"]);
    }

    #[test]
    fn status_filter_parses_all_and_labels() {
        assert_eq!("all".parse::<StatusFilter>(), Ok(StatusFilter::All));
        assert_eq!(
            "Pendente".parse::<StatusFilter>(),
            Ok(StatusFilter::Only(TaskStatus::Pending))
        );
        assert_eq!(DepartmentFilter::parse(" "), DepartmentFilter::All);
    }
}
