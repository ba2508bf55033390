//! CLI argument tests.

use super::{blesstest, fixtures_dir};
use predicates::prelude::*;

#[test]
fn test_arg_help() {
    blesstest()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Expand and inspect blesstest definition files",
        ));
}

#[test]
fn test_arg_version() {
    blesstest()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("blesstest"));
}

#[test]
fn test_arg_missing_subcommand() {
    blesstest().assert().failure();
}

#[test]
fn test_arg_invalid_format() {
    blesstest()
        .arg("list")
        .arg(fixtures_dir().join("basic"))
        .args(["--format", "invalid"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid format"));
}

#[test]
fn test_arg_nonexistent_root() {
    blesstest()
        .args(["list", "/nonexistent/blesstest-root"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("is not a directory"));
}

#[test]
fn test_arg_verbose_logs_to_stderr() {
    blesstest()
        .env_remove("RUST_LOG")
        .arg("-v")
        .arg("check")
        .arg(fixtures_dir().join("basic"))
        .assert()
        .success()
        .stderr(predicate::str::contains("loaded config"))
        .stderr(predicate::str::contains("failed to initialize logging").not());
}
