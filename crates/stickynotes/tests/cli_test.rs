use std::io::Write;
use std::process::{Command, Stdio};

use serde_json::Value;
use tempfile::TempDir;

fn stickies_cmd(tmp: &TempDir) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_stickies"));
    cmd.env(
        "STICKYNOTES_STORAGE__DATABASE_PATH",
        tmp.path().join("notes.sqlite"),
    )
    .env_remove("RUST_LOG")
    .args(["-c", &tmp.path().join("config.toml").to_string_lossy()]);
    cmd
}

fn run_json(tmp: &TempDir, args: &[&str]) -> Value {
    let output = stickies_cmd(tmp).args(args).output().unwrap();
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn test_add_then_list() {
    let tmp = TempDir::new().unwrap();

    let note = run_json(&tmp, &["add", "Groceries", "--content", "<p>milk</p>", "--json"]);
    assert_eq!(note["title"], "Groceries");

    let notes = run_json(&tmp, &["list", "--json"]);
    assert_eq!(notes.as_array().unwrap().len(), 1);
    assert_eq!(notes[0]["content"], "<p>milk</p>");
}

#[test]
fn test_edit_pin_and_delete() {
    let tmp = TempDir::new().unwrap();
    let note = run_json(&tmp, &["add", "Todo", "--json"]);
    let id = note["id"].to_string();

    let output = stickies_cmd(&tmp)
        .args(["edit", &id, "<p>done</p>"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let output = stickies_cmd(&tmp).args(["pin", &id]).output().unwrap();
    assert!(String::from_utf8_lossy(&output.stdout).contains("Pinned"));

    let shown = run_json(&tmp, &["show", &id, "--json"]);
    assert_eq!(shown["content"], "<p>done</p>");
    assert_eq!(shown["pinned"], true);

    let output = stickies_cmd(&tmp).args(["delete", &id]).output().unwrap();
    assert!(output.status.success());

    let output = stickies_cmd(&tmp).args(["show", &id]).output().unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("not found"));
}

#[test]
fn test_status_json() {
    let tmp = TempDir::new().unwrap();
    run_json(&tmp, &["add", "One", "--json"]);

    let status = run_json(&tmp, &["status", "--json"]);
    assert_eq!(status["total_notes"], 1);
    assert_eq!(status["pinned_notes"], 0);
}

#[test]
fn test_config_validate_reports_bad_value() {
    let tmp = TempDir::new().unwrap();
    let config = tmp.path().join("bad.toml");
    std::fs::write(&config, "[windows.pinned]\nopacity = 3.0\n").unwrap();

    let output = stickies_cmd(&tmp)
        .args(["config", "validate", "-f", &config.to_string_lossy()])
        .output()
        .unwrap();

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Configuration error"));
}

#[test]
fn test_serve_over_stdio() {
    let tmp = TempDir::new().unwrap();
    let mut child = stickies_cmd(&tmp)
        .arg("serve")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();

    {
        let stdin = child.stdin.as_mut().unwrap();
        writeln!(
            stdin,
            r#"{{"id": 1, "channel": "save-note", "args": {{"note": {{"title": "a"}}}}}}"#
        )
        .unwrap();
        writeln!(stdin, r#"{{"id": 2, "channel": "open-pinned-window", "args": {{"id": 1}}}}"#)
            .unwrap();
        writeln!(stdin, r#"{{"id": 3, "channel": "get-pinned-note"}}"#).unwrap();
        writeln!(stdin, r#"{{"id": 4, "channel": "nope"}}"#).unwrap();
    }
    drop(child.stdin.take());

    let output = child.wait_with_output().unwrap();
    assert!(output.status.success());

    let lines: Vec<Value> = String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    let reply = |id: i64| {
        lines
            .iter()
            .find(|l| l["id"] == id)
            .map(|l| l["response"].clone())
            .unwrap()
    };

    assert_eq!(reply(1)["success"], true);
    assert_eq!(reply(2)["data"]["note"]["pinned"], true);
    assert_eq!(reply(3)["data"]["pinned_note"]["title"], "a");
    assert_eq!(reply(4)["error"], "Invalid channel: nope");
}
