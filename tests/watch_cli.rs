mod support;

use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;

use serde_json::Value;

use support::TestBoard;

#[test]
fn watch_times_out_without_changes() {
    let board = TestBoard::init();
    let boss = board.add_profile("Bia Souza", "manager", None);

    let data = board.json_as(Some(&boss), &["watch", "--timeout", "1"]);
    assert_eq!(data["changes"], 0);
    assert_eq!(data["timed_out"], true);
    assert_eq!(data["stats"]["total"], 0);
}

#[test]
fn watch_once_reports_first_change() {
    let board = TestBoard::init();
    let boss = board.add_profile("Bia Souza", "manager", None);

    let mut child = Command::new(assert_cmd::cargo::cargo_bin("taskdesk"))
        .current_dir(board.path())
        .env_remove("TASKDESK_ACTOR")
        .env_remove("TASKDESK_ROOT")
        .env_remove("TASKDESK_LOG")
        .args(["--actor", &boss, "watch", "--once", "--timeout", "30", "--json"])
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn watch");

    // Keep changing the board until the watcher picks one up.
    for attempt in 0..40 {
        thread::sleep(Duration::from_millis(250));
        board.json_as(
            Some(&boss),
            &[
                "task",
                "new",
                &format!("Tarefa {attempt}"),
                "--deadline",
                "2030-01-01",
                "--department",
                "Vendas",
                "--item",
                "a",
            ],
        );
        if child.try_wait().expect("poll watch").is_some() {
            break;
        }
    }

    let output = child.wait_with_output().expect("watch output");
    assert!(
        output.status.success(),
        "watch failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let envelope: Value = serde_json::from_slice(&output.stdout).expect("json envelope");
    let data = &envelope["data"];
    assert_eq!(data["changes"], 1);
    assert_eq!(data["timed_out"], false);
    let tables = data["last_change"]["tables"].as_array().expect("tables");
    assert!(tables.iter().any(|table| table == "tasks"));
    assert!(data["stats"]["total"].as_u64().expect("total") >= 1);
}

#[test]
fn watch_rejects_timeout_past_clock_range() {
    let board = TestBoard::init();
    let boss = board.add_profile("Bia Souza", "manager", None);

    let (code, envelope) =
        board.json_error_as(Some(&boss), &["watch", "--timeout", &u64::MAX.to_string()]);
    assert_eq!(code, 2);
    assert_eq!(envelope["error"]["kind"], "user_error");
    assert!(envelope["error"]["message"]
        .as_str()
        .expect("message")
        .contains("--timeout"));
}
