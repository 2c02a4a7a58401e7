//! JSONL stream of board events for external integrations.
//!
//! `--events -` writes to stdout, any other value appends to that file.

use std::fs::OpenOptions;
use std::io::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::Result;

pub const EVENT_SCHEMA_VERSION: &str = "taskdesk.event.v1";

/// Board events emitted by taskdesk commands.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    TaskCreated,
    TaskStatusChanged,
    ChecklistItemToggled,
    /// The last open checklist item of a task was just ticked.
    ChecklistCompleted,
    TaskDeleted,
    ProfileCreated,
    ProfileUpdated,
}

/// One line of the event stream.
#[derive(Debug, Clone, Serialize)]
pub struct Event {
    pub schema_version: &'static str,
    pub event: EventKind,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
    pub data: serde_json::Value,
}

impl Event {
    pub fn new<T: Serialize>(event: EventKind, actor: Option<&str>, data: T) -> Result<Self> {
        Ok(Self {
            schema_version: EVENT_SCHEMA_VERSION,
            event,
            timestamp: Utc::now(),
            actor: actor.map(str::to_string),
            data: serde_json::to_value(data)?,
        })
    }
}

/// Optional event writer opened from a `--events` flag value.
///
/// Emission problems become warnings so the command itself still succeeds.
pub struct EventOutput {
    writer: Option<Box<dyn Write + Send>>,
    to_stdout: bool,
}

impl EventOutput {
    pub fn open(raw: Option<&str>) -> Result<Self> {
        let target = raw.map(str::trim).filter(|value| !value.is_empty());
        let (writer, to_stdout): (Option<Box<dyn Write + Send>>, bool) = match target {
            None => (None, false),
            Some("-") => (Some(Box::new(std::io::stdout())), true),
            Some(path) => {
                let file = OpenOptions::new().create(true).append(true).open(path)?;
                (Some(Box::new(file)), false)
            }
        };
        Ok(Self { writer, to_stdout })
    }

    /// Events own stdout, so regular output is suppressed.
    pub fn to_stdout(&self) -> bool {
        self.to_stdout
    }

    /// Write one event; returns a warning instead of failing.
    pub fn emit<T: Serialize>(
        &mut self,
        kind: EventKind,
        actor: Option<&str>,
        data: T,
    ) -> Option<String> {
        let writer = self.writer.as_mut()?;
        let written = Event::new(kind, actor, data).and_then(|event| {
            let mut line = serde_json::to_vec(&event)?;
            line.push(b'\n');
            writer.write_all(&line)?;
            writer.flush()?;
            Ok(())
        });
        match written {
            Ok(()) => None,
            Err(err) => {
                tracing::warn!(error = %err, event = ?kind, "event output failed");
                Some(format!("event output failed: {err}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_output_appends_jsonl() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("events.jsonl");
        let raw = path.to_string_lossy().to_string();

        let mut output = EventOutput::open(Some(&raw)).expect("open");
        assert!(!output.to_stdout());
        assert!(output
            .emit(EventKind::TaskCreated, Some("boss"), serde_json::json!({"id": "t1"}))
            .is_none());
        let mut reopened = EventOutput::open(Some(&raw)).expect("reopen");
        assert!(reopened
            .emit(EventKind::ChecklistCompleted, None, serde_json::json!({"id": "t1"}))
            .is_none());

        let content = std::fs::read_to_string(&path).expect("read");
        let lines: Vec<serde_json::Value> = content
            .lines()
            .map(|line| serde_json::from_str(line).expect("json"))
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["schema_version"], EVENT_SCHEMA_VERSION);
        assert_eq!(lines[0]["event"], "task_created");
        assert_eq!(lines[0]["actor"], "boss");
        assert_eq!(lines[0]["data"]["id"], "t1");
        assert_eq!(lines[1]["event"], "checklist_completed");
        assert!(lines[1].get("actor").is_none());
    }

    #[test]
    fn blank_or_missing_target_is_silent() {
        for raw in [None, Some("  ")] {
            let mut output = EventOutput::open(raw).expect("open");
            assert!(!output.to_stdout());
            assert!(output
                .emit(EventKind::TaskDeleted, None, serde_json::json!({}))
                .is_none());
        }
    }

    #[test]
    fn dash_targets_stdout() {
        let output = EventOutput::open(Some("-")).expect("open");
        assert!(output.to_stdout());
    }

    #[test]
    fn missing_directory_fails_to_open() {
        let dir = tempfile::tempdir().expect("tempdir");
        let raw = dir.path().join("nope").join("events.jsonl");
        assert!(EventOutput::open(Some(&raw.to_string_lossy())).is_err());
    }
}
