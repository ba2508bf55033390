//! Turns a definition document into its ordered list of concrete cases.

use crate::document::{DocumentError, parse_document};
use crate::namer::{NameRegistry, case_name};
use crate::resolver::resolve;
use crate::types::{BuildError, Document, ResolvedCase};
use crate::variation::expand_spec;
use thiserror::Error;

/// Build every concrete case of a document.
///
/// Cases come out grouped by top-level entry in declaration order, each
/// group in expansion order. Abstract entries contribute nothing of their
/// own. The function is pure: the same document always yields the same
/// cases in the same order.
///
/// # Errors
/// Returns the first `BuildError` found; no partial result is produced.
pub fn build(document: &Document) -> Result<Vec<ResolvedCase>, BuildError> {
    let specs = resolve(document)?;
    let mut names = NameRegistry::new();
    let mut cases = Vec::new();

    for spec in specs.iter().filter(|spec| !spec.is_abstract) {
        for leaf in expand_spec(spec)? {
            let name = case_name(&spec.name, &leaf.segments);
            let Some(harness) = leaf.harness.filter(|h| !h.trim().is_empty()) else {
                return Err(BuildError::MissingHarness { name });
            };
            names.claim(&name, &leaf.path)?;
            cases.push(ResolvedCase {
                name,
                harness,
                params: leaf.params,
            });
        }
    }

    Ok(cases)
}

/// Errors from [`build_str`].
#[derive(Error, Debug)]
pub enum ExpandError {
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error(transparent)]
    Build(#[from] BuildError),
}

/// Parse and build a document in one step.
///
/// # Errors
/// Returns parse errors and build errors.
pub fn build_str(src: &str) -> Result<Vec<ResolvedCase>, ExpandError> {
    let document = parse_document(src)?;
    Ok(build(&document)?)
}
