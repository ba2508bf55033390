//! `prune` command tests.

use super::blesstest;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn project() -> Result<TempDir, Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    fs::write(
        dir.path().join("math.blesstest.json"),
        r#"{"sum": {"harness": "add", "params": {"a": 1, "[b]": [1, 2]}}}"#,
    )?;
    let blessed = dir.path().join("blessed");
    fs::create_dir_all(&blessed)?;
    for name in [
        "math_sum__b_1.json",
        "math_sum__b_2.json.new",
        "math_old.json",
        "math_old.json.new",
    ] {
        fs::write(blessed.join(name), "{}\n")?;
    }
    Ok(dir)
}

#[test]
fn test_prune_dry_run_keeps_files() -> TestResult {
    let dir = project()?;
    blesstest()
        .arg("prune")
        .arg(dir.path())
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains("would remove"))
        .stdout(predicate::str::contains("math_old.json"))
        .stdout(predicate::str::contains("2 stale artifacts found (dry run)"));
    assert!(dir.path().join("blessed/math_old.json").exists());
    Ok(())
}

#[test]
fn test_prune_removes_stale_only() -> TestResult {
    let dir = project()?;
    blesstest()
        .arg("prune")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("2 stale artifacts removed"));
    assert!(!dir.path().join("blessed/math_old.json").exists());
    assert!(!dir.path().join("blessed/math_old.json.new").exists());
    assert!(dir.path().join("blessed/math_sum__b_1.json").exists());
    assert!(dir.path().join("blessed/math_sum__b_2.json.new").exists());
    Ok(())
}

#[test]
fn test_prune_file_with_only_abstract_cases() -> TestResult {
    let dir = TempDir::new()?;
    fs::create_dir_all(dir.path().join("sub/blessed"))?;
    fs::write(
        dir.path().join("sub/tpl.blesstest.json"),
        r#"{"only": {"abstract": true, "harness": "h"}}"#,
    )?;
    fs::write(dir.path().join("sub/blessed/tpl_old.json"), "{}\n")?;
    blesstest()
        .arg("prune")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("1 stale artifacts removed"));
    assert!(!dir.path().join("sub/blessed/tpl_old.json").exists());
    Ok(())
}
