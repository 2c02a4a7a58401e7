use std::path::PathBuf;

use serde_json::Value;
use taskdesk::error::{exit_codes, Error, JsonError, ValidationError};

#[test]
fn exit_code_user_error() {
    let err = Error::InvalidArgument("bad input".to_string());
    assert_eq!(err.exit_code(), exit_codes::USER_ERROR);
    let err = Error::Validation(ValidationError::EmptyChecklist);
    assert_eq!(err.exit_code(), exit_codes::USER_ERROR);
}

#[test]
fn exit_code_policy_blocked() {
    let err = Error::Forbidden {
        actor: "ana".to_string(),
        action: "delete tasks".to_string(),
    };
    assert_eq!(err.exit_code(), exit_codes::POLICY_BLOCKED);
}

#[test]
fn exit_code_operation_failed() {
    let err = Error::LockFailed(PathBuf::from(".taskdesk/tasks.jsonl.lock"));
    assert_eq!(err.exit_code(), exit_codes::OPERATION_FAILED);
    let err = Error::DataAccess("disk gone".to_string());
    assert_eq!(err.exit_code(), exit_codes::OPERATION_FAILED);
}

#[test]
fn json_error_includes_details() {
    let err = Error::Validation(ValidationError::TooManyChecklistItems { max: 20 });
    let json = JsonError::from(&err);
    assert_eq!(json.code, exit_codes::USER_ERROR);
    let details = json.details.expect("details");
    assert_eq!(details["max"], Value::from(20));
}

#[test]
fn json_error_without_details_skips_field() {
    let err = Error::TaskNotFound("t-1".to_string());
    let value = serde_json::to_value(JsonError::from(&err)).expect("json");
    assert!(value.get("details").is_none());
    assert!(value["error"].as_str().expect("message").contains("t-1"));
}
