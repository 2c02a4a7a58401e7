#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

pub fn taskdesk_cmd() -> Command {
    let mut cmd = Command::cargo_bin("taskdesk").expect("binary");
    cmd.env_remove("TASKDESK_ACTOR")
        .env_remove("TASKDESK_ROOT")
        .env_remove("RUST_LOG")
        .env_remove("TASKDESK_LOG");
    cmd
}

/// A board in a temporary directory.
pub struct TestBoard {
    dir: TempDir,
}

impl TestBoard {
    /// Empty directory, no `taskdesk init` yet.
    pub fn empty() -> Self {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        Self { dir }
    }

    pub fn init() -> Self {
        let board = Self::empty();
        board.cmd().arg("init").assert().success();
        board
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn data_dir(&self) -> PathBuf {
        self.dir.path().join(".taskdesk")
    }

    pub fn cmd(&self) -> Command {
        let mut cmd = taskdesk_cmd();
        cmd.current_dir(self.path());
        cmd
    }

    /// Run with `--json` as `actor` and return the `data` field of a success envelope.
    pub fn json_as(&self, actor: Option<&str>, args: &[&str]) -> Value {
        let mut cmd = self.cmd();
        if let Some(actor) = actor {
            cmd.args(["--actor", actor]);
        }
        let output = cmd.args(args).arg("--json").output().expect("run taskdesk");
        assert!(
            output.status.success(),
            "taskdesk {args:?} failed: {}\n{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        let envelope: Value = serde_json::from_slice(&output.stdout).expect("json envelope");
        assert_eq!(envelope["schema_version"], "taskdesk.v1");
        assert_eq!(envelope["status"], "success");
        envelope["data"].clone()
    }

    /// Run with `--json`, expect failure, and return `(exit code, envelope)`.
    pub fn json_error_as(&self, actor: Option<&str>, args: &[&str]) -> (i32, Value) {
        let mut cmd = self.cmd();
        if let Some(actor) = actor {
            cmd.args(["--actor", actor]);
        }
        let output = cmd.args(args).arg("--json").output().expect("run taskdesk");
        assert!(!output.status.success(), "taskdesk {args:?} unexpectedly succeeded");
        let envelope: Value = serde_json::from_slice(&output.stdout).expect("json envelope");
        assert_eq!(envelope["status"], "error");
        (output.status.code().unwrap_or(-1), envelope)
    }

    /// Register a profile and return its id.
    pub fn add_profile(&self, name: &str, role: &str, department: Option<&str>) -> String {
        let email = format!("{}@example.com", name.to_lowercase().replace(' ', "."));
        let mut args = vec!["profile", "add", name, "--email", email.as_str(), "--role", role];
        if let Some(department) = department {
            args.extend(["--department", department]);
        }
        let data = self.json_as(None, &args);
        data["id"].as_str().expect("profile id").to_string()
    }

    pub fn write_config(&self, contents: &str) -> PathBuf {
        let path = self.path().join(".taskdesk.toml");
        fs::write(&path, contents).expect("write config");
        path
    }
}
