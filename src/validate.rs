//! Input validation for mutations.
//!
//! Every check here runs before the data provider is touched.

use chrono::NaiveDate;

use crate::config::Config;
use crate::error::ValidationError;
use crate::model::{
    Assignment, AssignmentType, Department, NewChecklistItem, NewProfile, NewTask, Role, TaskDraft,
};

/// Turn a submitted task form into a [`TaskDraft`].
///
/// Blank checklist entries are dropped; at least one must remain. The
/// deadline may be `today` but not earlier.
pub fn validate_new_task(
    form: &NewTask,
    items: &[NewChecklistItem],
    config: &Config,
    today: NaiveDate,
) -> Result<TaskDraft, ValidationError> {
    let title = form.title.trim();
    if title.is_empty() {
        return Err(ValidationError::MissingTitle);
    }

    let deadline = form.deadline.ok_or(ValidationError::MissingDeadline)?;
    if deadline < today {
        return Err(ValidationError::DeadlineInPast { deadline, today });
    }

    let assignment = match form.assignment_type.unwrap_or(AssignmentType::User) {
        AssignmentType::User => {
            let user_id = non_empty(form.assigned_user_id.as_deref())
                .ok_or(ValidationError::MissingAssignee)?;
            Assignment::User(user_id.to_string())
        }
        AssignmentType::Department => {
            let name = non_empty(form.assigned_department.as_deref())
                .ok_or(ValidationError::MissingDepartment)?;
            Assignment::Department(known_department(name, config)?)
        }
    };

    let checklist: Vec<String> = items
        .iter()
        .filter_map(|item| non_empty(Some(item.description.as_str())))
        .map(str::to_string)
        .collect();
    if checklist.is_empty() {
        return Err(ValidationError::EmptyChecklist);
    }
    let max = config.tasks.max_checklist_items;
    if checklist.len() > max {
        return Err(ValidationError::TooManyChecklistItems { max });
    }

    let description = non_empty(form.description.as_deref()).map(str::to_string);

    Ok(TaskDraft {
        title: title.to_string(),
        description,
        deadline,
        assignment,
        checklist,
    })
}

/// Validate a profile registration. Managers drop any department given.
pub fn validate_new_profile(
    form: &NewProfile,
    config: &Config,
) -> Result<NewProfile, ValidationError> {
    let full_name = form.full_name.trim();
    if full_name.is_empty() {
        return Err(ValidationError::MissingName);
    }
    let department = match form.role {
        Role::Manager => None,
        Role::Member => {
            let name = form
                .department
                .as_ref()
                .and_then(|department| non_empty(Some(department.as_str())))
                .ok_or(ValidationError::MemberWithoutDepartment)?;
            Some(known_department(name, config)?)
        }
    };
    Ok(NewProfile {
        full_name: full_name.to_string(),
        email: form.email.trim().to_string(),
        role: form.role,
        department,
    })
}

pub fn known_department(name: &str, config: &Config) -> Result<Department, ValidationError> {
    let trimmed = name.trim();
    if config.departments.contains(trimmed) {
        Ok(Department::from(trimmed))
    } else {
        Err(ValidationError::UnknownDepartment(trimmed.to_string()))
    }
}

fn non_empty(input: Option<&str>) -> Option<&str> {
    input.and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2030, 1, 15).expect("date")
    }

    fn form() -> NewTask {
        NewTask {
            title: "  Relatório mensal ".to_string(),
            description: Some("   ".to_string()),
            deadline: NaiveDate::from_ymd_opt(2030, 3, 1),
            assignment_type: Some(AssignmentType::Department),
            assigned_user_id: None,
            assigned_department: Some("Vendas".to_string()),
        }
    }

    fn items(texts: &[&str]) -> Vec<NewChecklistItem> {
        texts.iter().map(|text| NewChecklistItem::new(*text)).collect()
    }

    #[test]
    fn valid_form_is_normalized() {
        let draft = validate_new_task(
            &form(),
            &items(&["a", " ", "b"]),
            &Config::default(),
            today(),
        )
        .expect("valid");
        assert_eq!(draft.title, "Relatório mensal");
        assert_eq!(draft.description, None);
        assert_eq!(draft.assignment, Assignment::Department("Vendas".into()));
        assert_eq!(draft.checklist, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn rejects_missing_fields() {
        let config = Config::default();
        let list = items(&["a"]);

        let mut no_title = form();
        no_title.title = " ".to_string();
        assert_eq!(
            validate_new_task(&no_title, &list, &config, today()),
            Err(ValidationError::MissingTitle)
        );

        let mut no_deadline = form();
        no_deadline.deadline = None;
        assert_eq!(
            validate_new_task(&no_deadline, &list, &config, today()),
            Err(ValidationError::MissingDeadline)
        );

        let mut no_user = form();
        no_user.assignment_type = Some(AssignmentType::User);
        assert_eq!(
            validate_new_task(&no_user, &list, &config, today()),
            Err(ValidationError::MissingAssignee)
        );

        let mut no_department = form();
        no_department.assigned_department = None;
        assert_eq!(
            validate_new_task(&no_department, &list, &config, today()),
            Err(ValidationError::MissingDepartment)
        );

        assert_eq!(
            validate_new_task(&form(), &items(&["", "  "]), &config, today()),
            Err(ValidationError::EmptyChecklist)
        );
    }

    #[test]
    fn deadline_may_be_today_but_not_earlier() {
        let config = Config::default();
        let list = items(&["a"]);

        let mut due_today = form();
        due_today.deadline = Some(today());
        assert!(validate_new_task(&due_today, &list, &config, today()).is_ok());

        let yesterday = today().pred_opt().expect("date");
        let mut overdue = form();
        overdue.deadline = Some(yesterday);
        assert_eq!(
            validate_new_task(&overdue, &list, &config, today()),
            Err(ValidationError::DeadlineInPast {
                deadline: yesterday,
                today: today(),
            })
        );
    }

    #[test]
    fn rejects_unknown_department_and_long_checklists() {
        let config = Config::default();
        let mut unknown = form();
        unknown.assigned_department = Some("Jurídico".to_string());
        assert_eq!(
            validate_new_task(&unknown, &items(&["a"]), &config, today()),
            Err(ValidationError::UnknownDepartment("Jurídico".to_string()))
        );

        let many: Vec<String> = (0..21).map(|idx| format!("step {idx}")).collect();
        let many: Vec<&str> = many.iter().map(String::as_str).collect();
        assert_eq!(
            validate_new_task(&form(), &items(&many), &config, today()),
            Err(ValidationError::TooManyChecklistItems { max: 20 })
        );
    }

    #[test]
    fn member_profile_needs_known_department() {
        let config = Config::default();
        let member = NewProfile {
            full_name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            role: Role::Member,
            department: None,
        };
        assert_eq!(
            validate_new_profile(&member, &config).map(|p| p.department),
            Err(ValidationError::MemberWithoutDepartment)
        );

        let manager = NewProfile {
            role: Role::Manager,
            department: Some("Vendas".into()),
            ..member
        };
        let normalized = validate_new_profile(&manager, &config).expect("manager");
        assert!(normalized.department.is_none());
    }
}
