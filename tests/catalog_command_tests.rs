// tests/catalog_command_tests.rs
use assert_cmd::Command;
use tempfile::tempdir;

#[test]
fn catalog_over_empty_directory_writes_zero_file_summary() {
    let catalog_dir = tempdir().unwrap();
    let out_dir = tempdir().unwrap();
    let output = out_dir.path().join("report.json");

    let mut cmd = Command::cargo_bin("sonargate").unwrap();
    cmd.args([
        "catalog",
        "--catalog",
        catalog_dir.path().to_str().unwrap(),
        "--output",
        output.to_str().unwrap(),
    ])
    .assert()
    .success();

    let summary: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(summary["summary"]["total_files"], 0);

    let full_path = out_dir.path().join("report.full.json");
    assert!(full_path.exists());
    let full: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&full_path).unwrap()).unwrap();
    assert_eq!(full["files"].as_array().unwrap().len(), 0);
}

#[test]
fn catalog_rejects_missing_ground_truth_file() {
    let catalog_dir = tempdir().unwrap();
    let out_dir = tempdir().unwrap();

    let mut cmd = Command::cargo_bin("sonargate").unwrap();
    cmd.args([
        "catalog",
        "--catalog",
        catalog_dir.path().to_str().unwrap(),
        "--output",
        out_dir.path().join("report.json").to_str().unwrap(),
        "--ground-truth",
        out_dir.path().join("missing.json").to_str().unwrap(),
    ])
    .assert()
    .failure();
}
