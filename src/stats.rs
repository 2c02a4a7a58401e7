//! Dashboard counters for the requesting actor.

use serde::Serialize;

use crate::model::{Actor, Task, TaskStatus};
use crate::visibility::is_relevant_to;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
pub struct TaskStats {
    pub total: usize,
    pub in_progress: usize,
    pub completed: usize,
}

impl TaskStats {
    /// Managers count every task; Members count tasks assigned to them or to
    /// their department.
    pub fn for_actor<T: AsRef<Task>>(actor: &Actor, tasks: &[T]) -> Self {
        tasks
            .iter()
            .map(AsRef::as_ref)
            .filter(|task| actor.is_manager() || is_relevant_to(actor, task))
            .fold(TaskStats::default(), |mut stats, task| {
                stats.total += 1;
                match task.status {
                    TaskStatus::InProgress => stats.in_progress += 1,
                    TaskStatus::Completed => stats.completed += 1,
                    TaskStatus::Pending => {}
                }
                stats
            })
    }

    pub fn pending(&self) -> usize {
        self.total - self.in_progress - self.completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Assignment, Department};
    use chrono::{NaiveDate, Utc};

    fn task(id: &str, status: TaskStatus, assignment: Assignment) -> Task {
        let now = Utc::now();
        Task {
            id: id.to_string(),
            title: id.to_string(),
            description: None,
            deadline: NaiveDate::from_ymd_opt(2030, 1, 1).expect("date"),
            status,
            assignment,
            created_by: "boss".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn manager_counts_every_task() {
        let tasks = vec![
            task("a", TaskStatus::Pending, Assignment::User("x".to_string())),
            task("b", TaskStatus::InProgress, Assignment::User("y".to_string())),
            task("c", TaskStatus::Completed, Assignment::Department("Vendas".into())),
            task("d", TaskStatus::InProgress, Assignment::Department("RH".into())),
        ];
        let stats = TaskStats::for_actor(&Actor::manager("boss"), &tasks);
        assert_eq!(
            stats,
            TaskStats {
                total: 4,
                in_progress: 2,
                completed: 1,
            }
        );
        assert_eq!(stats.pending(), 1);
    }

    #[test]
    fn member_counts_only_relevant_tasks() {
        let tasks = vec![
            task("t1", TaskStatus::Pending, Assignment::User("ana".to_string())),
            task(
                "t2",
                TaskStatus::InProgress,
                Assignment::Department(Department::from("Vendas")),
            ),
            task(
                "t3",
                TaskStatus::Completed,
                Assignment::Department(Department::from("Marketing")),
            ),
        ];
        let stats = TaskStats::for_actor(&Actor::member("ana", "Vendas"), &tasks);
        assert_eq!(
            stats,
            TaskStats {
                total: 2,
                in_progress: 1,
                completed: 0,
            }
        );
    }
}
