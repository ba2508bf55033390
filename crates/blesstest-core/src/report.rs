//! Formatting of expanded case listings.

use crate::loader::CollectedCase;
use crate::types::Params;
use serde_json::Value;

/// Format for report output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Table,
    Json,
}

impl std::str::FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            _ => Err(format!("unknown format: {s}. Valid formats: table, json")),
        }
    }
}

/// Generate a JSON listing of collected cases.
#[must_use]
pub fn format_cases_json(cases: &[CollectedCase]) -> String {
    serde_json::to_string_pretty(cases).unwrap_or_else(|_| "[]".to_string())
}

/// Params as compact JSON, in declaration order.
#[must_use]
pub fn format_params(params: &Params) -> String {
    Value::Object(params.clone()).to_string()
}

/// Keep the cases whose id contains `filter`.
#[must_use]
pub fn filter_cases(cases: Vec<CollectedCase>, filter: Option<&str>) -> Vec<CollectedCase> {
    match filter {
        Some(needle) => cases.into_iter().filter(|c| c.id.contains(needle)).collect(),
        None => cases,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ResolvedCase;
    use serde_json::json;
    use std::path::PathBuf;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    fn case(id: &str) -> Result<CollectedCase, Box<dyn std::error::Error>> {
        let Value::Object(params) = json!({"b": 2, "a": 1}) else {
            return Err("expected object".into());
        };
        Ok(CollectedCase {
            id: id.to_string(),
            file: PathBuf::from("math.blesstest.json"),
            case: ResolvedCase {
                name: id.trim_start_matches("math_").to_string(),
                harness: "add".to_string(),
                params,
            },
        })
    }

    #[test]
    fn test_report_format_from_str() -> Result<(), String> {
        assert_eq!("table".parse::<ReportFormat>()?, ReportFormat::Table);
        assert_eq!("JSON".parse::<ReportFormat>()?, ReportFormat::Json);
        let err = "csv".parse::<ReportFormat>().err().unwrap_or_default();
        assert!(err.contains("unknown format"));
        Ok(())
    }

    #[test]
    fn test_format_params_keeps_order() -> TestResult {
        assert_eq!(format_params(&case("math_x")?.case.params), r#"{"b":2,"a":1}"#);
        Ok(())
    }

    #[test]
    fn test_format_cases_json_is_flat() -> TestResult {
        let listing: Value = serde_json::from_str(&format_cases_json(&[case("math_x")?]))?;
        assert_eq!(listing[0]["id"], "math_x");
        assert_eq!(listing[0]["name"], "x");
        assert_eq!(listing[0]["harness"], "add");
        assert_eq!(listing[0]["params"]["a"], 1);
        Ok(())
    }

    #[test]
    fn test_filter_cases() -> TestResult {
        let cases = vec![case("math_sum")?, case("math_div")?];
        let kept = filter_cases(cases.clone(), Some("div"));
        assert_eq!(kept.len(), 1);
        assert_eq!(filter_cases(cases, None).len(), 2);
        Ok(())
    }
}
