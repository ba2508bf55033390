//! `list` command tests.

use super::{blesstest, fixtures_dir};
use predicates::prelude::*;
use serde_json::Value;

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn list_json(args: &[&str]) -> Result<Vec<Value>, Box<dyn std::error::Error>> {
    let output = blesstest()
        .arg("list")
        .arg(fixtures_dir().join("basic"))
        .args(["--format", "json"])
        .args(args)
        .output()?;
    assert!(output.status.success());
    let listing: Value = serde_json::from_slice(&output.stdout)?;
    let cases = listing.as_array().cloned().ok_or("expected a JSON array")?;
    Ok(cases)
}

fn ids(listing: &[Value]) -> Vec<&str> {
    listing.iter().filter_map(|c| c["id"].as_str()).collect()
}

#[test]
fn test_list_json_order_and_names() -> TestResult {
    let listing = list_json(&[])?;
    assert_eq!(
        ids(&listing),
        vec![
            "math_a_plus_b",
            "math_a_plus_b__b_10",
            "math_scaled__y_3",
            "math_scaled__y_4",
            "strings_upper__lang_en_text_hi",
            "strings_upper__lang_es_text_hola",
        ]
    );
    Ok(())
}

#[test]
fn test_list_json_params_are_merged() -> TestResult {
    let listing = list_json(&[])?;
    let scaled = listing
        .iter()
        .find(|c| c["id"] == "math_scaled__y_4")
        .ok_or("missing scaled case")?;
    assert_eq!(scaled["harness"], "mul");
    assert_eq!(scaled["name"], "scaled__y_4");
    assert_eq!(scaled["params"], serde_json::json!({"x": 2, "y": 4}));
    Ok(())
}

#[test]
fn test_list_filter() -> TestResult {
    let listing = list_json(&["--filter", "upper"])?;
    assert_eq!(listing.len(), 2);
    assert!(ids(&listing).iter().all(|id| id.starts_with("strings_upper")));
    Ok(())
}

#[test]
fn test_list_table() {
    blesstest()
        .arg("list")
        .arg(fixtures_dir().join("basic"))
        .assert()
        .success()
        .stdout(predicate::str::contains("math_a_plus_b__b_10"))
        .stdout(predicate::str::contains("{\"a\":1,\"b\":2}"))
        .stdout(predicate::str::contains("yes"))
        .stdout(predicate::str::contains("6 cases"));
}

#[test]
fn test_list_broken_document() {
    blesstest()
        .arg("list")
        .arg(fixtures_dir().join("broken"))
        .assert()
        .code(3)
        .stderr(predicate::str::contains("cyclic base reference"));
}
