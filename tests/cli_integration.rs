//! CLI integration tests.
//!
//! End-to-end tests for CLI commands using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn chatroute_cmd() -> Command {
    let mut cmd = Command::cargo_bin("chatroute").unwrap();
    cmd.env_remove("CHATROUTE_FEEDBACK_DB")
        .env_remove("GEMINI_API_KEY")
        .env_remove("HF_API_TOKEN");
    cmd
}

#[test]
fn test_version_output() {
    chatroute_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("chatroute"));
}

#[test]
fn test_help_shows_all_commands() {
    chatroute_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("backends"))
        .stdout(predicate::str::contains("insights"))
        .stdout(predicate::str::contains("config"))
        .stdout(predicate::str::contains("completions"));
}

#[test]
fn test_serve_help() {
    chatroute_cmd()
        .args(["serve", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--config"))
        .stdout(predicate::str::contains("--port"))
        .stdout(predicate::str::contains("--feedback-db"));
}

#[test]
fn test_config_init_then_backends_list() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("chatroute.toml");

    chatroute_cmd()
        .args(["config", "init", "-o", config_path.to_str().unwrap()])
        .assert()
        .success();

    chatroute_cmd()
        .args(["backends", "list", "-c", config_path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("gemini"))
        .stdout(predicate::str::contains("huggingface"));
}

#[test]
fn test_backends_list_json() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("chatroute.toml");
    std::fs::write(
        &config_path,
        r#"
[[backends]]
name = "hf"
type = "huggingface"
requests_per_minute = 7
"#,
    )
    .unwrap();

    let output = chatroute_cmd()
        .args(["backends", "list", "--json", "-c", config_path.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(output.status.success());

    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed["backends"][0]["name"], "hf");
    assert_eq!(parsed["backends"][0]["rate_limit"]["minute_limit"], 7);
    assert_eq!(parsed["backends"][0]["available"], true);
}

#[test]
fn test_config_init_no_overwrite() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("chatroute.toml");
    std::fs::write(&config_path, "existing content").unwrap();

    chatroute_cmd()
        .args(["config", "init", "-o", config_path.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("exists"));
}

#[test]
fn test_insights_without_database_fails() {
    let temp_dir = TempDir::new().unwrap();
    chatroute_cmd()
        .current_dir(temp_dir.path())
        .arg("insights")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no feedback database configured"));
}

#[test]
fn test_invalid_command() {
    chatroute_cmd()
        .arg("invalid-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_completions_bash() {
    chatroute_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("complete"));
}
