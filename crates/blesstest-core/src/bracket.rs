//! Bracket-keyed parameter sweeps.
//!
//! A params key of the form `"[name]"` binds `name` to each element of its
//! list value in turn. `"[[a,b]]"` binds `a` and `b` together from a list of
//! tuples. Several bracket keys in one mapping combine by cartesian product,
//! in declaration order with the rightmost key varying fastest.

use crate::types::{BuildError, Params};
use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::OnceLock;

/// A parsed bracket key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BracketKey {
    /// `"[name]"`: one value per variant.
    Single(String),
    /// `"[[n1,n2,...]]"`: one tuple per variant, zipped onto the names.
    Zipped(Vec<String>),
}

fn zipped_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\[\[(.*)\]\]$").ok()).as_ref()
}

fn single_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\[(.*)\]$").ok()).as_ref()
}

/// Whether a params key uses the bracket convention at all.
#[must_use]
pub fn is_bracket_key(key: &str) -> bool {
    key.starts_with('[') && key.ends_with(']')
}

/// Whether any key of the mapping is a bracket key.
#[must_use]
pub fn has_bracket_keys(params: &Params) -> bool {
    params.keys().any(|key| is_bracket_key(key))
}

impl BracketKey {
    /// Parse a key. Returns `Ok(None)` for ordinary keys.
    ///
    /// # Errors
    /// Returns the reason when the key looks like a bracket key but its
    /// name list is unusable.
    pub fn parse(key: &str) -> Result<Option<Self>, String> {
        if !is_bracket_key(key) {
            return Ok(None);
        }

        if let Some(caps) = zipped_regex().and_then(|re| re.captures(key)) {
            let inner = caps.get(1).map_or("", |m| m.as_str());
            let names: Vec<String> = inner.split(',').map(|n| n.trim().to_string()).collect();
            let mut seen = HashSet::new();
            for name in &names {
                validate_name(name)?;
                if !seen.insert(name.as_str()) {
                    return Err(format!("parameter '{name}' is listed twice"));
                }
            }
            return Ok(Some(Self::Zipped(names)));
        }

        if let Some(caps) = single_regex().and_then(|re| re.captures(key)) {
            let name = caps.get(1).map_or("", |m| m.as_str()).trim();
            if name.contains(',') {
                return Err("several names need the [[a,b]] form".to_string());
            }
            validate_name(name)?;
            return Ok(Some(Self::Single(name.to_string())));
        }

        Err("unrecognised bracket syntax".to_string())
    }

    /// Parameter names bound by this key, in declaration order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        match self {
            Self::Single(name) => vec![name.as_str()],
            Self::Zipped(names) => names.iter().map(String::as_str).collect(),
        }
    }
}

fn validate_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("empty parameter name".to_string());
    }
    if name.contains(['[', ']']) {
        return Err(format!("parameter name '{name}' contains a bracket"));
    }
    Ok(())
}

/// One variant produced by bracket expansion.
#[derive(Debug, Clone, PartialEq)]
pub struct BracketVariant {
    /// `(name, value)` pairs bound in this variant, in dimension order.
    pub label: Vec<(String, String)>,
    /// Input params with bracket keys replaced by their bound values.
    pub params: Params,
}

/// Render a value for use in a case name: strings verbatim, anything else
/// as compact JSON.
#[must_use]
pub fn label_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Expand every bracket key of `params`.
///
/// A mapping without bracket keys yields exactly one variant: the input
/// unchanged with an empty label. `path` names the owning node in errors.
///
/// # Errors
/// Returns `BuildError::MalformedBracketKey` for bad key syntax, a value
/// that is not a non-empty list, tuples of the wrong arity, or a name bound
/// by more than one key.
pub fn expand_brackets(params: &Params, path: &str) -> Result<Vec<BracketVariant>, BuildError> {
    let mut statics = Params::new();
    let mut dimensions: Vec<Vec<Vec<(String, Value)>>> = Vec::new();
    let mut bound: HashSet<String> = HashSet::new();

    for (key, value) in params {
        let malformed = |reason: String| BuildError::MalformedBracketKey {
            path: path.to_string(),
            key: key.clone(),
            reason,
        };
        let Some(parsed) = BracketKey::parse(key).map_err(malformed)? else {
            statics.insert(key.clone(), value.clone());
            continue;
        };
        for name in parsed.names() {
            if !bound.insert(name.to_string()) {
                return Err(malformed(format!(
                    "parameter '{name}' is bound by more than one bracket key"
                )));
            }
        }
        dimensions.push(dimension(&parsed, value).map_err(malformed)?);
    }

    let mut variants = vec![BracketVariant {
        label: Vec::new(),
        params: statics,
    }];
    for dimension in dimensions {
        let mut next = Vec::with_capacity(variants.len() * dimension.len());
        for variant in &variants {
            for bindings in &dimension {
                let mut params = variant.params.clone();
                let mut label = variant.label.clone();
                for (name, value) in bindings {
                    params.insert(name.clone(), value.clone());
                    label.push((name.clone(), label_value(value)));
                }
                next.push(BracketVariant { label, params });
            }
        }
        variants = next;
    }

    Ok(variants)
}

/// Bindings for each variant of one bracket key.
fn dimension(key: &BracketKey, value: &Value) -> Result<Vec<Vec<(String, Value)>>, String> {
    let Value::Array(entries) = value else {
        return Err("value must be a list".to_string());
    };
    if entries.is_empty() {
        return Err("value list is empty".to_string());
    }

    match key {
        BracketKey::Single(name) => Ok(entries
            .iter()
            .map(|v| vec![(name.clone(), v.clone())])
            .collect()),
        BracketKey::Zipped(names) => entries
            .iter()
            .enumerate()
            .map(|(index, entry)| match entry {
                Value::Array(tuple) if tuple.len() == names.len() => Ok(names
                    .iter()
                    .cloned()
                    .zip(tuple.iter().cloned())
                    .collect()),
                _ => Err(format!(
                    "entry {index} is not a list of {} values",
                    names.len()
                )),
            })
            .collect(),
    }
}
