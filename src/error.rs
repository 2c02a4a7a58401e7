//! Error types for taskdesk
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (bad args, validation failures, unknown records)
//! - 3: Blocked by policy (actor lacks the role or visibility for the action)
//! - 4: Operation failed (data access, I/O, lock contention)

use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

/// Exit codes for the taskdesk CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 2;
    pub const POLICY_BLOCKED: i32 = 3;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Malformed input to a mutation, detected before the data provider is called.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("title is required")]
    MissingTitle,

    #[error("deadline is required")]
    MissingDeadline,

    #[error("deadline {deadline} is before today ({today})")]
    DeadlineInPast { deadline: NaiveDate, today: NaiveDate },

    #[error("select a user to assign the task to")]
    MissingAssignee,

    #[error("select a department to assign the task to")]
    MissingDepartment,

    #[error("unknown department '{0}'")]
    UnknownDepartment(String),

    #[error("add at least one checklist item")]
    EmptyChecklist,

    #[error("a task can have at most {max} checklist items")]
    TooManyChecklistItems { max: usize },

    #[error("members must belong to a department")]
    MemberWithoutDepartment,

    #[error("unsupported image type '{0}' (use JPEG, PNG, GIF or WebP)")]
    UnsupportedImageType(String),

    #[error("image is {size} bytes, the limit is {max} bytes")]
    ImageTooLarge { size: u64, max: u64 },

    #[error("invalid crop region: {0}")]
    InvalidCropRegion(String),

    #[error("name cannot be empty")]
    MissingName,
}

/// Main error type for taskdesk operations
#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 2)
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Checklist item not found: {0}")]
    ChecklistItemNotFound(String),

    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    #[error("Unknown actor: {0}")]
    UnknownActor(String),

    // Policy blocks (exit code 3)
    #[error("{actor} is not allowed to {action}")]
    Forbidden { actor: String, action: String },

    // Operation failures (exit code 4)
    #[error("Data access failed: {0}")]
    DataAccess(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Lock acquisition failed: {0}")]
    LockFailed(PathBuf),

    #[error("Watch error: {0}")]
    Watch(#[from] notify::Error),
}

impl Error {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            // User errors
            Error::Validation(_)
            | Error::InvalidArgument(_)
            | Error::InvalidConfig(_)
            | Error::TaskNotFound(_)
            | Error::ChecklistItemNotFound(_)
            | Error::ProfileNotFound(_)
            | Error::UnknownActor(_) => exit_codes::USER_ERROR,

            // Policy blocks
            Error::Forbidden { .. } => exit_codes::POLICY_BLOCKED,

            // Operation failures
            Error::DataAccess(_)
            | Error::Io(_)
            | Error::Json(_)
            | Error::TomlParse(_)
            | Error::TomlSerialize(_)
            | Error::LockFailed(_)
            | Error::Watch(_) => exit_codes::OPERATION_FAILED,
        }
    }

    /// Structured details attached to JSON error output, if any.
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Error::Forbidden { actor, action } => Some(serde_json::json!({
                "actor": actor,
                "action": action,
            })),
            Error::Validation(ValidationError::TooManyChecklistItems { max }) => {
                Some(serde_json::json!({ "max": max }))
            }
            Error::Validation(ValidationError::DeadlineInPast { deadline, today }) => {
                Some(serde_json::json!({
                    "deadline": deadline.to_string(),
                    "today": today.to_string(),
                }))
            }
            Error::Validation(ValidationError::ImageTooLarge { size, max }) => {
                Some(serde_json::json!({ "size": size, "max": max }))
            }
            _ => None,
        }
    }

    pub(crate) fn forbidden(actor: &str, action: impl Into<String>) -> Self {
        Error::Forbidden {
            actor: actor.to_string(),
            action: action.into(),
        }
    }
}

/// Result type alias for taskdesk operations
pub type Result<T> = std::result::Result<T, Error>;

/// Wrapper for displaying errors in JSON format
#[derive(serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<&Error> for JsonError {
    fn from(err: &Error) -> Self {
        JsonError {
            error: err.to_string(),
            code: err.exit_code(),
            details: err.details(),
        }
    }
}
