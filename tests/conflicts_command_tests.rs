// tests/conflicts_command_tests.rs
use assert_cmd::Command;
use tempfile::tempdir;

#[test]
fn clean_parameters_pass() {
    let dir = tempdir().unwrap();
    let params_path = dir.path().join("params.json");
    std::fs::write(
        &params_path,
        serde_json::json!({"eqBoostMax": 2.0, "limiterThreshold": -6.0}).to_string(),
    )
    .unwrap();

    let mut cmd = Command::cargo_bin("sonargate").unwrap();
    cmd.args(["conflicts", "check", params_path.to_str().unwrap()])
        .assert()
        .success();
}

#[test]
fn blocking_conflict_fails_the_command() {
    let dir = tempdir().unwrap();
    let params_path = dir.path().join("params.json");
    std::fs::write(&params_path, serde_json::json!({"eqBoostMax": 13.0}).to_string()).unwrap();

    let mut cmd = Command::cargo_bin("sonargate").unwrap();
    cmd.args(["conflicts", "check", params_path.to_str().unwrap()])
        .assert()
        .failure();
}

#[test]
fn non_object_json_is_rejected() {
    let dir = tempdir().unwrap();
    let params_path = dir.path().join("params.json");
    std::fs::write(&params_path, "[1, 2, 3]").unwrap();

    let mut cmd = Command::cargo_bin("sonargate").unwrap();
    cmd.args(["conflicts", "check", params_path.to_str().unwrap()])
        .assert()
        .failure();
}
