// tests/cli_integration_tests.rs
use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn version_display() {
    let mut cmd = Command::cargo_bin("sonargate").unwrap();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("sonargate"));
}

#[test]
fn help_display() {
    let mut cmd = Command::cargo_bin("sonargate").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("delivery orchestration"));
}

#[test]
fn invalid_subcommand_fails() {
    let mut cmd = Command::cargo_bin("sonargate").unwrap();
    cmd.arg("not-a-real-command").assert().failure();
}

#[test]
fn analyze_missing_file_fails() {
    let mut cmd = Command::cargo_bin("sonargate").unwrap();
    cmd.args(["analyze", "/no/such/file.wav"])
        .assert()
        .failure();
}

#[test]
fn completions_bash_emits_script() {
    let mut cmd = Command::cargo_bin("sonargate").unwrap();
    cmd.args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sonargate"));
}

#[test]
fn config_show_prints_toml() {
    let mut cmd = Command::cargo_bin("sonargate").unwrap();
    cmd.args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[general]"));
}

#[test]
fn config_validate_succeeds_on_defaults() {
    let mut cmd = Command::cargo_bin("sonargate").unwrap();
    cmd.args(["config", "validate"]).assert().success();
}
