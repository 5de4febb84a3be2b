use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;

fn csvhero() -> Command {
    let mut cmd = Command::cargo_bin("csvhero").expect("binary should build");
    cmd.env("NO_COLOR", "1");
    cmd
}

#[test]
fn test_no_files_found_exits_zero() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("readme.txt"), "nothing here").unwrap();

    csvhero()
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("No CSV files found."));
}

#[test]
fn test_scan_writes_readmes_and_summary() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("orders.csv"), "id,name,amount\n1,a,1\n2,b,2\n3,c,3\n").unwrap();
    fs::write(dir.path().join("empty.csv"), "").unwrap();

    csvhero()
        .arg(dir.path())
        .arg("--quiet")
        .assert()
        .success()
        .stdout(predicate::str::contains("csv files seen"))
        .stdout(predicate::str::contains("rows across all csvs"))
        .stdout(predicate::str::contains("Done."));

    let orders = fs::read_to_string(dir.path().join("orders.readme.md")).unwrap();
    assert!(orders.contains("- **Rows (excluding header):** 3\n"));
    let empty = fs::read_to_string(dir.path().join("empty.readme.md")).unwrap();
    assert!(empty.contains("- **Columns (0):** _(none)_\n"));
}

#[test]
fn test_overwrite_flag_and_json_summary() {
    let dir = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let json = out.path().join("summary.json");
    fs::write(dir.path().join("a.csv"), "x\n1\n2\n").unwrap();
    fs::write(dir.path().join("a.readme.md"), "old").unwrap();

    csvhero()
        .arg(dir.path())
        .args(["--quiet", "--json"])
        .arg(&json)
        .assert()
        .success();
    assert_eq!(fs::read_to_string(dir.path().join("a.readme.md")).unwrap(), "old");
    let summary: serde_json::Value = serde_json::from_str(&fs::read_to_string(&json).unwrap()).unwrap();
    assert_eq!(summary["skipped"], 1);
    assert_eq!(summary["written"], 0);
    assert_eq!(summary["total_rows"], 2);

    csvhero()
        .arg(dir.path())
        .args(["--quiet", "--overwrite"])
        .assert()
        .success();
    assert!(fs::read_to_string(dir.path().join("a.readme.md"))
        .unwrap()
        .contains("- **Rows (excluding header):** 2\n"));
}

#[test]
fn test_missing_folder_fails() {
    let dir = tempfile::tempdir().unwrap();

    csvhero()
        .arg(dir.path().join("does-not-exist"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Directory not found"));
}

#[test]
fn test_unknown_encoding_fails_before_scanning() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.csv"), "x\n1\n").unwrap();

    csvhero()
        .arg(dir.path())
        .args(["--encoding", "klingon"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown encoding"));
    assert!(!dir.path().join("a.readme.md").exists());
}

#[test]
fn test_config_file_enables_recursion() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("nested")).unwrap();
    fs::write(dir.path().join("nested/inner.csv"), "x\n1\n").unwrap();
    let config = dir.path().join("csvhero.json");
    fs::write(&config, r#"{"recursive": true}"#).unwrap();

    csvhero()
        .arg(dir.path())
        .arg("--quiet")
        .arg("--config")
        .arg(&config)
        .assert()
        .success();
    assert!(dir.path().join("nested/inner.readme.md").exists());
}

#[test]
fn test_summary_printed_when_every_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.csv"), "x\n1\n2\n").unwrap();
    fs::create_dir(dir.path().join("a.readme.md")).unwrap();

    csvhero()
        .arg(dir.path())
        .args(["--quiet", "--overwrite"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Failed: a.csv —"))
        .stdout(predicate::str::contains("csv files seen"))
        .stdout(predicate::str::contains("files failed"))
        .stdout(predicate::str::contains("Done."));
    assert!(dir.path().join("a.readme.md").is_dir());
}
