//! Core data types for blesstest.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// A parameter mapping. Key order follows the definition document.
pub type Params = Map<String, Value>;

/// Errors raised while turning a parsed document into resolved cases.
///
/// Every variant is a structural problem with the input document. A build
/// that hits one of them produces no cases at all.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("case '{name}' references missing base '{referenced}'")]
    MissingBase { name: String, referenced: String },
    #[error("cyclic base reference: {}", .cycle.join(" -> "))]
    CyclicBase { cycle: Vec<String> },
    #[error("'{path}' declares bracket params and a non-empty variations list")]
    ConflictingVariationSyntax { path: String },
    #[error("malformed bracket key '{key}' at '{path}': {reason}")]
    MalformedBracketKey {
        path: String,
        key: String,
        reason: String,
    },
    #[error("case '{name}' has no harness")]
    MissingHarness { name: String },
    #[error("duplicate case name '{name}' produced by {}", .paths.join(" and "))]
    DuplicateCaseName { name: String, paths: Vec<String> },
}

/// A top-level entry of a test definition document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CaseSpec {
    /// Abstract cases are templates: usable as a `base`, never emitted.
    #[serde(rename = "abstract", default)]
    pub is_abstract: bool,
    #[serde(default)]
    pub harness: Option<String>,
    /// Name of another entry in the same document to inherit from.
    #[serde(default)]
    pub base: Option<String>,
    #[serde(default)]
    pub params: Params,
    #[serde(default)]
    pub variations: Vec<VariationNode>,
}

/// A nested override that splits its parent into branches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VariationNode {
    /// Explicit name segment. Without it the segment is derived from params.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub harness: Option<String>,
    #[serde(default)]
    pub params: Params,
    #[serde(default)]
    pub variations: Vec<VariationNode>,
}

/// A parsed test definition document: case name to spec, in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    entries: Vec<(String, CaseSpec)>,
}

impl Document {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Insert a case. Re-inserting a name replaces the spec in place.
    pub fn insert(&mut self, name: impl Into<String>, spec: CaseSpec) {
        let name = name.into();
        if let Some(slot) = self.entries.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = spec;
        } else {
            self.entries.push((name, spec));
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&CaseSpec> {
        self.entries
            .iter()
            .find_map(|(n, spec)| (n == name).then_some(spec))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CaseSpec)> {
        self.entries.iter().map(|(n, spec)| (n.as_str(), spec))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<N: Into<String>> FromIterator<(N, CaseSpec)> for Document {
    fn from_iter<T: IntoIterator<Item = (N, CaseSpec)>>(iter: T) -> Self {
        let mut document = Self::new();
        for (name, spec) in iter {
            document.insert(name, spec);
        }
        document
    }
}

/// A concrete, fully expanded case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedCase {
    /// Unique within its document.
    pub name: String,
    pub harness: String,
    /// Fully merged params; never contains bracket keys.
    pub params: Params,
}
