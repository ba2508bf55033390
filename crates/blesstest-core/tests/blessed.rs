//! End-to-end runs against blessed artifacts on disk.

use blesstest_core::{
    BlessConfig, BlessMode, BlessStatus, HarnessSet, RunnerError, assert_blessed, run_blocking,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

type TestResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Debug, Serialize, Deserialize)]
struct AddInput {
    a: i64,
    b: i64,
}

#[derive(Debug, Serialize)]
struct AddOutput {
    sum: i64,
}

fn registry() -> HarnessSet {
    let mut set = HarnessSet::new();
    set.register("add", |input: AddInput| -> Result<AddOutput, String> {
        Ok(AddOutput {
            sum: input.a + input.b,
        })
    });
    set
}

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn copy_fixture(name: &str) -> Result<TempDir, Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let source = fixture(name);
    fs::copy(
        source.join("demo.blesstest.json"),
        dir.path().join("demo.blesstest.json"),
    )?;
    fs::create_dir_all(dir.path().join("blessed"))?;
    for entry in fs::read_dir(source.join("blessed"))? {
        let path = entry?.path();
        let file_name = path.file_name().ok_or("artifact without a file name")?;
        fs::copy(&path, dir.path().join("blessed").join(file_name))?;
    }
    Ok(dir)
}

#[test]
fn test_demo_fixture_is_blessed() -> TestResult {
    let dir = copy_fixture("demo")?;
    let summary = run_blocking(dir.path(), &registry(), &BlessConfig::default())?;
    assert_eq!(summary.outcomes.len(), 2);
    assert!(
        summary
            .outcomes
            .iter()
            .all(|o| o.status == BlessStatus::Match),
        "{:?}",
        summary.failures()
    );
    assert!(summary.pruned.is_empty());
    Ok(())
}

#[test]
fn test_changed_output_leaves_pending_file() -> TestResult {
    let dir = copy_fixture("demo")?;
    fs::write(
        dir.path().join("demo.blesstest.json"),
        r#"{"a_plus_b": {"harness": "add", "params": {"a": 1, "b": 2},
            "variations": [{}, {"params": {"b": 20}}]}}"#,
    )?;

    let summary = run_blocking(dir.path(), &registry(), &BlessConfig::default())?;
    let statuses: Vec<(&str, BlessStatus)> = summary
        .outcomes
        .iter()
        .map(|o| (o.id.as_str(), o.status))
        .collect();
    assert_eq!(
        statuses,
        vec![
            ("demo_a_plus_b", BlessStatus::Match),
            ("demo_a_plus_b__b_20", BlessStatus::New),
        ]
    );
    // The variation that disappeared is stale
    assert_eq!(
        summary.pruned,
        vec![dir.path().join("blessed/demo_a_plus_b__b_10.json")]
    );
    let pending = fs::read_to_string(dir.path().join("blessed/demo_a_plus_b__b_20.json.new"))?;
    assert!(pending.contains("\"sum\": 21"));
    Ok(())
}

#[test]
fn test_bless_mode_accepts_changes() -> TestResult {
    let dir = copy_fixture("demo")?;
    let path = dir.path().join("blessed/demo_a_plus_b.json");
    fs::write(&path, "{}\n")?;

    let bless = BlessConfig {
        mode: BlessMode::Bless,
        ..BlessConfig::default()
    };
    let summary = run_blocking(dir.path(), &registry(), &bless)?;
    assert_eq!(summary.outcomes[0].status, BlessStatus::Changed);
    assert!(summary.failures().is_empty());

    let restored = fs::read_to_string(&path)?;
    let committed = fs::read_to_string(fixture("demo").join("blessed/demo_a_plus_b.json"))?;
    assert_eq!(restored, committed);
    Ok(())
}

#[test]
fn test_assert_blessed_lists_unblessed_cases() -> TestResult {
    let dir = TempDir::new()?;
    fs::write(
        dir.path().join("fresh.blesstest.json"),
        r#"{"sum": {"harness": "add", "params": {"a": 2, "b": 2}}}"#,
    )?;
    fs::write(dir.path().join("blesstest.config.yaml"), "parallel: 1\n")?;

    match assert_blessed(dir.path(), &registry()) {
        Err(RunnerError::Unblessed { failures }) => {
            assert_eq!(failures.len(), 1);
            assert!(failures[0].contains("fresh_sum"));
        }
        // An environment that forces bless mode accepts the new output
        Ok(summary) => assert_eq!(summary.passed(), 1),
        Err(other) => return Err(other.into()),
    }
    Ok(())
}
