//! Deterministic case names.

use crate::types::BuildError;
use crate::variation::Segment;
use std::collections::HashMap;

/// Separator between the root name and each segment.
const SEPARATOR: &str = "__";

/// Text a segment contributes, or `None` when it is elided.
///
/// Change pairs render as `key_value`, sorted by key, joined by `_`.
#[must_use]
pub fn segment_text(segment: &Segment) -> Option<String> {
    match segment {
        Segment::Named(name) => Some(name.clone()),
        Segment::Changes(changes) if changes.is_empty() => None,
        Segment::Changes(changes) => {
            let mut sorted: Vec<&(String, String)> = changes.iter().collect();
            sorted.sort();
            Some(
                sorted
                    .iter()
                    .map(|(key, value)| format!("{key}_{value}"))
                    .collect::<Vec<_>>()
                    .join("_"),
            )
        }
    }
}

/// Build the name of a leaf from its root case name and path segments.
#[must_use]
pub fn case_name(root: &str, segments: &[Segment]) -> String {
    let mut name = root.to_string();
    for text in segments.iter().filter_map(segment_text) {
        name.push_str(SEPARATOR);
        name.push_str(&text);
    }
    name
}

/// Tracks names handed out within one document.
#[derive(Debug, Default)]
pub struct NameRegistry {
    claimed: HashMap<String, String>,
}

impl NameRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `name` as produced by the branch at `path`.
    ///
    /// # Errors
    /// Returns `BuildError::DuplicateCaseName` if the name was already claimed.
    pub fn claim(&mut self, name: &str, path: &str) -> Result<(), BuildError> {
        if let Some(first) = self.claimed.get(name) {
            return Err(BuildError::DuplicateCaseName {
                name: name.to_string(),
                paths: vec![first.clone(), path.to_string()],
            });
        }
        self.claimed.insert(name.to_string(), path.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn changes(pairs: &[(&str, &str)]) -> Segment {
        Segment::Changes(
            pairs
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_root_only() {
        assert_eq!(case_name("root", &[]), "root");
        assert_eq!(case_name("root", &[changes(&[])]), "root");
    }

    #[test]
    fn test_changes_sorted_by_key() {
        let segment = changes(&[("zeta", "1"), ("alpha", "x")]);
        assert_eq!(segment_text(&segment).as_deref(), Some("alpha_x_zeta_1"));
    }

    #[test]
    fn test_empty_segments_are_elided() {
        let segments = [
            changes(&[]),
            changes(&[("x", "O1")]),
            changes(&[]),
            Segment::Named("last".to_string()),
        ];
        assert_eq!(case_name("r", &segments), "r__x_O1__last");
    }

    #[test]
    fn test_explicit_name_is_verbatim() {
        let segments = [Segment::Named("Mixed Case-1".to_string())];
        assert_eq!(case_name("r", &segments), "r__Mixed Case-1");
    }

    #[test]
    fn test_duplicate_claim() {
        let mut names = NameRegistry::new();
        assert!(names.claim("r__b_1", "r.variations[0]").is_ok());
        assert!(names.claim("r__b_2", "r.variations[1]").is_ok());
        assert_eq!(
            names.claim("r__b_1", "r.variations[2]"),
            Err(BuildError::DuplicateCaseName {
                name: "r__b_1".to_string(),
                paths: vec!["r.variations[0]".to_string(), "r.variations[2]".to_string()],
            })
        );
    }
}
