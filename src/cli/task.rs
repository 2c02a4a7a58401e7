//! taskdesk task command implementations.

use chrono::{NaiveDate, Utc};
use serde::Serialize;

use crate::cli::{BoardContext, Globals};
use crate::error::{Error, Result};
use crate::events::{EventKind, EventOutput};
use crate::filter::{DepartmentFilter, StatusFilter, TaskFilter};
use crate::model::{
    Assignment, AssignmentType, NewChecklistItem, NewTask, Task, TaskStatus, TaskWithDetails,
};
use crate::output::{emit_success, HumanOutput};
use crate::progress::ChecklistProgress;
use crate::stats::TaskStats;
use crate::visibility::Scope;

pub struct NewOptions {
    pub title: String,
    pub deadline: String,
    pub user: Option<String>,
    pub department: Option<String>,
    pub items: Vec<String>,
    pub description: Option<String>,
}

pub struct ListOptions {
    pub scope: String,
    pub status: Option<String>,
    pub department: Option<String>,
    pub search: Option<String>,
}

#[derive(Serialize)]
struct TaskCreatedOutput {
    task: Task,
    checklist_items: usize,
}

#[derive(Serialize)]
struct TaskView {
    #[serde(flatten)]
    details: TaskWithDetails,
    progress: ChecklistProgress,
    overdue: bool,
}

impl TaskView {
    fn new(details: TaskWithDetails, today: NaiveDate) -> Self {
        Self {
            progress: details.progress(),
            overdue: details.task.is_overdue(today),
            details,
        }
    }
}

#[derive(Serialize)]
struct TaskListOutput {
    scope: Scope,
    total: usize,
    stats: TaskStats,
    tasks: Vec<TaskView>,
}

#[derive(Serialize)]
struct StatusChangedOutput {
    task: Task,
    previous: TaskStatus,
}

#[derive(Serialize)]
struct DeletedOutput {
    id: String,
    title: String,
}

#[derive(Serialize)]
struct StatsOutput {
    #[serde(flatten)]
    stats: TaskStats,
    pending: usize,
}

pub fn run_new(globals: &Globals, options: NewOptions) -> Result<()> {
    let ctx = BoardContext::open(globals)?;
    let mut events = EventOutput::open(globals.events.as_deref())?;
    let actor = ctx.actor(globals)?;

    let deadline = parse_deadline(&options.deadline)?;
    let assignment_type = if options.department.is_some() {
        AssignmentType::Department
    } else {
        AssignmentType::User
    };
    let form = NewTask {
        title: options.title,
        description: options.description,
        deadline: Some(deadline),
        assignment_type: Some(assignment_type),
        assigned_user_id: options.user,
        assigned_department: options.department,
    };
    let items: Vec<NewChecklistItem> = options.items.into_iter().map(NewChecklistItem::new).collect();

    let task = ctx.board.create_task(&actor, &form, &items)?;
    let checklist = ctx.board.details(&actor, &task.id)?.checklist_items;

    let event_warning = events.emit(
        EventKind::TaskCreated,
        Some(actor.id()),
        serde_json::json!({ "task": &task, "checklist_items": &checklist }),
    );

    let mut human = HumanOutput::new("Task created");
    if let Some(warning) = event_warning {
        human.push_warning(warning);
    }
    human.push_summary("ID", task.id.clone());
    human.push_summary("Title", task.title.clone());
    human.push_summary("Deadline", task.deadline.to_string());
    human.push_summary("Assigned to", describe_assignment(&task.assignment));
    for item in &checklist {
        human.push_detail(format!("[ ] {} ({})", item.description, item.id));
    }
    human.push_next_step(format!("taskdesk task show {}", task.id));

    let output = TaskCreatedOutput {
        checklist_items: checklist.len(),
        task,
    };
    emit_success(globals.output(&events), "task new", &output, Some(&human))
}

pub fn run_list(globals: &Globals, options: ListOptions) -> Result<()> {
    let ctx = BoardContext::open(globals)?;
    let actor = ctx.actor(globals)?;

    let scope: Scope = options.scope.parse().map_err(Error::InvalidArgument)?;
    let status = match options.status.as_deref() {
        Some(raw) => raw.parse().map_err(Error::InvalidArgument)?,
        None => StatusFilter::All,
    };
    let filter = TaskFilter {
        status,
        department: options
            .department
            .as_deref()
            .map(DepartmentFilter::parse)
            .unwrap_or_default(),
        search: options.search.unwrap_or_default(),
    };

    let tasks = ctx.board.view(&actor, scope, &filter)?;
    let stats = ctx.board.stats(&actor)?;
    let today = Utc::now().date_naive();

    let mut human = HumanOutput::new(format!("Tasks ({scope})"));
    human.push_summary("Shown", tasks.len().to_string());
    human.push_summary(
        "Board",
        format!(
            "{} total, {} in progress, {} completed",
            stats.total, stats.in_progress, stats.completed
        ),
    );
    if !filter.is_identity() {
        human.push_summary("Filter", describe_filter(&filter));
    }
    if !actor.is_manager() && !matches!(filter.department, DepartmentFilter::All) {
        human.push_warning("department filter only applies to managers");
    }
    for details in &tasks {
        human.push_detail(format_task_line(details, today));
    }
    if tasks.is_empty() && actor.is_manager() {
        human.push_next_step("taskdesk task new \"<title>\" --deadline YYYY-MM-DD --department <name> --item \"<step>\"");
    }

    let views: Vec<TaskView> = tasks
        .into_iter()
        .map(|details| TaskView::new(details, today))
        .collect();
    let output = TaskListOutput {
        scope,
        total: views.len(),
        stats,
        tasks: views,
    };
    emit_success(globals.plain_output(), "task list", &output, Some(&human))
}

pub fn run_show(globals: &Globals, id: String) -> Result<()> {
    let ctx = BoardContext::open(globals)?;
    let actor = ctx.actor(globals)?;
    let details = ctx.board.details(&actor, id.trim())?;
    let today = Utc::now().date_naive();

    let task = &details.task;
    let progress = details.progress();
    let mut human = HumanOutput::new(task.title.clone());
    human.push_summary("ID", task.id.clone());
    human.push_summary("Status", task.status.label());
    human.push_summary("Deadline", task.deadline.to_string());
    if task.is_overdue(today) {
        human.push_summary("Overdue", "yes");
    }
    human.push_summary("Assigned to", describe_assignment(&task.assignment));
    if let Some(assignee) = &details.assignee {
        human.push_summary("Assignee", assignee.full_name.clone());
    }
    if let Some(creator) = &details.creator {
        human.push_summary("Created by", creator.full_name.clone());
    }
    if let Some(description) = &task.description {
        human.push_summary("Description", description.clone());
    }
    if progress.has_progress_bar() {
        human.push_summary(
            "Progress",
            format!("{}/{} ({}%)", progress.completed, progress.total, progress.percentage),
        );
    }
    for item in &details.checklist_items {
        let mark = if item.is_completed { "x" } else { " " };
        human.push_detail(format!("[{mark}] {} ({})", item.description, item.id));
    }

    let view = TaskView::new(details, today);
    emit_success(globals.plain_output(), "task show", &view, Some(&human))
}

pub fn run_status(globals: &Globals, id: String, status: String) -> Result<()> {
    let ctx = BoardContext::open(globals)?;
    let mut events = EventOutput::open(globals.events.as_deref())?;
    let actor = ctx.actor(globals)?;
    let status: TaskStatus = status.parse().map_err(Error::InvalidArgument)?;

    let previous = ctx.board.details(&actor, id.trim())?.task.status;
    let task = ctx.board.update_status(&actor, id.trim(), status)?;

    let event_warning = events.emit(
        EventKind::TaskStatusChanged,
        Some(actor.id()),
        serde_json::json!({ "id": &task.id, "from": previous, "to": task.status }),
    );

    let mut human = HumanOutput::new("Task status updated");
    if let Some(warning) = event_warning {
        human.push_warning(warning);
    }
    human.push_summary("ID", task.id.clone());
    human.push_summary("Status", format!("{} -> {}", previous.label(), task.status.label()));

    let output = StatusChangedOutput { task, previous };
    emit_success(globals.output(&events), "task status", &output, Some(&human))
}

pub fn run_toggle(globals: &Globals, item_id: String, completed: bool) -> Result<()> {
    let ctx = BoardContext::open(globals)?;
    let mut events = EventOutput::open(globals.events.as_deref())?;
    let actor = ctx.actor(globals)?;

    let outcome = ctx.board.toggle_item(&actor, item_id.trim(), completed)?;

    let mut warnings = Vec::new();
    warnings.extend(events.emit(EventKind::ChecklistItemToggled, Some(actor.id()), &outcome.item));
    if outcome.checklist_completed {
        warnings.extend(events.emit(
            EventKind::ChecklistCompleted,
            Some(actor.id()),
            serde_json::json!({ "id": &outcome.item.task_id }),
        ));
    }

    let mut human = HumanOutput::new(if outcome.checklist_completed {
        "Checklist complete! Every item of the task is done."
    } else if completed {
        "Checklist item done"
    } else {
        "Checklist item reopened"
    });
    for warning in warnings {
        human.push_warning(warning);
    }
    human.push_summary("Item", outcome.item.description.clone());
    human.push_summary(
        "Progress",
        format!(
            "{}/{} ({}%)",
            outcome.progress.completed, outcome.progress.total, outcome.progress.percentage
        ),
    );
    if outcome.checklist_completed {
        human.push_next_step(format!("taskdesk task status {} completed", outcome.item.task_id));
    }

    emit_success(globals.output(&events), "task toggle", &outcome, Some(&human))
}

pub fn run_delete(globals: &Globals, id: String) -> Result<()> {
    let ctx = BoardContext::open(globals)?;
    let mut events = EventOutput::open(globals.events.as_deref())?;
    let actor = ctx.actor(globals)?;

    let details = ctx.board.details(&actor, id.trim())?;
    ctx.board.delete_task(&actor, &details.task.id)?;

    let output = DeletedOutput {
        id: details.task.id.clone(),
        title: details.task.title.clone(),
    };
    let event_warning = events.emit(EventKind::TaskDeleted, Some(actor.id()), &output);

    let mut human = HumanOutput::new("Task deleted");
    if let Some(warning) = event_warning {
        human.push_warning(warning);
    }
    human.push_summary("ID", output.id.clone());
    human.push_summary("Title", output.title.clone());
    human.push_summary("Checklist items removed", details.checklist_items.len().to_string());

    emit_success(globals.output(&events), "task delete", &output, Some(&human))
}

pub fn run_stats(globals: &Globals) -> Result<()> {
    let ctx = BoardContext::open(globals)?;
    let actor = ctx.actor(globals)?;
    let stats = ctx.board.stats(&actor)?;

    let human = stats_human(&stats);
    let output = StatsOutput {
        pending: stats.pending(),
        stats,
    };
    emit_success(globals.plain_output(), "task stats", &output, Some(&human))
}

pub(crate) fn stats_human(stats: &TaskStats) -> HumanOutput {
    let mut human = HumanOutput::new("Task stats");
    human.push_summary("Total", stats.total.to_string());
    human.push_summary(TaskStatus::Pending.label(), stats.pending().to_string());
    human.push_summary(TaskStatus::InProgress.label(), stats.in_progress.to_string());
    human.push_summary(TaskStatus::Completed.label(), stats.completed.to_string());
    human
}

fn parse_deadline(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        Error::InvalidArgument(format!("invalid deadline '{raw}' (expected YYYY-MM-DD)"))
    })
}

fn describe_assignment(assignment: &Assignment) -> String {
    match assignment {
        Assignment::User(id) => format!("user {id}"),
        Assignment::Department(department) => format!("department {department}"),
    }
}

fn describe_filter(filter: &TaskFilter) -> String {
    let mut parts = Vec::new();
    if !matches!(filter.status, StatusFilter::All) {
        parts.push(format!("status={}", filter.status));
    }
    if !matches!(filter.department, DepartmentFilter::All) {
        parts.push(format!("department={}", filter.department));
    }
    if !filter.search.is_empty() {
        parts.push(format!("search={:?}", filter.search));
    }
    parts.join(", ")
}

fn format_task_line(details: &TaskWithDetails, today: NaiveDate) -> String {
    let task = &details.task;
    let progress = details.progress();
    let mut line = format!(
        "{} [{}] {} | due {}",
        task.id,
        task.status.label(),
        task.title,
        task.deadline
    );
    if task.is_overdue(today) {
        line.push_str(" (overdue)");
    }
    let target = match (&task.assignment, &details.assignee) {
        (Assignment::User(_), Some(profile)) => profile.full_name.clone(),
        (assignment, _) => describe_assignment(assignment),
    };
    line.push_str(&format!(" | {target}"));
    if progress.has_progress_bar() {
        line.push_str(&format!(
            " | {}/{} ({}%)",
            progress.completed, progress.total, progress.percentage
        ));
    }
    line
}
