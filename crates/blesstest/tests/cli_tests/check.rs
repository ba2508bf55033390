//! `check` command tests.

use super::{blesstest, fixtures_dir};
use predicates::prelude::*;

#[test]
fn test_check_clean_tree() {
    blesstest()
        .arg("check")
        .arg(fixtures_dir().join("basic"))
        .assert()
        .success()
        .stdout(predicate::str::contains("math.blesstest.json (4 cases)"))
        .stdout(predicate::str::contains("strings.blesstest.jsonc (2 cases)"))
        .stdout(predicate::str::contains("checked 2 definition files; 0 failed"));
}

#[test]
fn test_check_reports_every_file() {
    blesstest()
        .arg("check")
        .arg(fixtures_dir().join("broken"))
        .assert()
        .code(1)
        .stdout(predicate::str::contains("good.blesstest.json (1 cases)"))
        .stdout(predicate::str::contains("checked 2 definition files; 1 failed"))
        .stderr(predicate::str::contains("cycle.blesstest.json"))
        .stderr(predicate::str::contains("loop_a -> loop_b -> loop_a"));
}

#[test]
fn test_check_empty_tree_warns() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::TempDir::new()?;
    blesstest()
        .arg("check")
        .arg(dir.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("no definition files found"));
    Ok(())
}

#[test]
fn test_check_invalid_config() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::TempDir::new()?;
    std::fs::write(dir.path().join("blesstest.config.yaml"), "patterns: []\n")?;
    blesstest()
        .arg("check")
        .arg(dir.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Failed to load config"));
    Ok(())
}

#[test]
fn test_check_rejects_path_separator_in_case_name() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::TempDir::new()?;
    std::fs::write(
        dir.path().join("paths.blesstest.json"),
        r#"{"a/b": {"harness": "h"}}"#,
    )?;
    blesstest()
        .arg("check")
        .arg(dir.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("case id 'paths_a/b' contains a path separator"));
    Ok(())
}
