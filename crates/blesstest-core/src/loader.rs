//! Discovery and loading of definition files.

use crate::bless;
use crate::builder::build;
use crate::config::BlessConfig;
use crate::document::{DocumentError, parse_document};
use crate::types::{BuildError, ResolvedCase};
use glob::glob;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// File name suffixes recognised as definition files.
pub const DEFINITION_SUFFIXES: [&str; 2] = [".blesstest.json", ".blesstest.jsonc"];

/// Errors that can occur during loading.
#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("glob pattern error: {0}")]
    Glob(#[from] glob::PatternError),
    #[error("{path}: {source}")]
    Document {
        path: PathBuf,
        #[source]
        source: DocumentError,
    },
    #[error("{path}: {source}")]
    Build {
        path: PathBuf,
        #[source]
        source: BuildError,
    },
    #[error("'{path}' is not a definition file")]
    NotADefinitionFile { path: PathBuf },
    #[error("{path}: case id '{id}' contains a path separator")]
    InvalidCaseId { path: PathBuf, id: String },
}

/// Ids each blessed directory keeps, keyed by directory.
pub type BlessedIds = BTreeMap<PathBuf, HashSet<String>>;

/// A resolved case together with where it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectedCase {
    /// `<file prefix>_<case name>`; keys the blessed artifact.
    pub id: String,
    pub file: PathBuf,
    #[serde(flatten)]
    pub case: ResolvedCase,
}

impl CollectedCase {
    /// Directory holding this case's blessed artifacts.
    #[must_use]
    pub fn blessed_dir(&self, blessed_dir: &str) -> PathBuf {
        blessed_dir_for(&self.file, blessed_dir)
    }

    /// Path of this case's accepted artifact.
    #[must_use]
    pub fn blessed_path(&self, blessed_dir: &str) -> PathBuf {
        bless::blessed_path(&self.blessed_dir(blessed_dir), &self.id)
    }
}

/// Directory holding the blessed artifacts of definition file `file`.
#[must_use]
pub fn blessed_dir_for(file: &Path, blessed_dir: &str) -> PathBuf {
    file.parent()
        .unwrap_or_else(|| Path::new(""))
        .join(blessed_dir)
}

/// Discover definition files under `root` using patterns.
///
/// Matches without a definition suffix are skipped.
///
/// # Errors
/// Returns an error if a glob pattern is invalid.
pub fn discover_definition_files(
    root: &Path,
    patterns: &[String],
    exclude_patterns: &[String],
) -> Result<Vec<PathBuf>, LoaderError> {
    let mut files = Vec::new();
    let mut seen = HashSet::new();

    for pattern in patterns {
        let full_pattern = root.join(pattern);
        let pattern_str = full_pattern.to_string_lossy();

        for path in glob(&pattern_str)?.flatten() {
            let relative = path.strip_prefix(root).unwrap_or(&path);
            let relative_str = relative.to_string_lossy();

            let excluded = exclude_patterns.iter().any(|ex| {
                // Wildcards mean a glob; anything else is a plain substring like "target/"
                if ex.contains('*') || ex.contains('?') || ex.contains('[') {
                    glob::Pattern::new(ex)
                        .map_or_else(|_| relative_str.contains(ex), |p| p.matches(&relative_str))
                } else {
                    relative_str.contains(ex)
                }
            });

            if !excluded
                && path.is_file()
                && is_definition_file(&path)
                && seen.insert(path.clone())
            {
                files.push(path);
            }
        }
    }

    files.sort();
    debug!(root = %root.display(), count = files.len(), "discovered definition files");
    Ok(files)
}

/// File name of `path` minus its definition suffix.
#[must_use]
pub fn file_prefix(path: &Path) -> Option<&str> {
    let name = path.file_name()?.to_str()?;
    DEFINITION_SUFFIXES
        .iter()
        .find_map(|suffix| name.strip_suffix(suffix))
        .filter(|prefix| !prefix.is_empty())
}

fn is_definition_file(path: &Path) -> bool {
    file_prefix(path).is_some()
}

/// Read, parse and build one definition file.
///
/// Case ids name artifact files, so an id containing `/` or `\` is rejected.
///
/// # Errors
/// Returns an error if the file cannot be read, parsed or built, or a case
/// id is not a valid file name.
pub fn load_definition_file(path: &Path) -> Result<Vec<CollectedCase>, LoaderError> {
    let prefix = file_prefix(path).ok_or_else(|| LoaderError::NotADefinitionFile {
        path: path.to_path_buf(),
    })?;
    let content = std::fs::read_to_string(path).map_err(|source| LoaderError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let document = parse_document(&content).map_err(|source| LoaderError::Document {
        path: path.to_path_buf(),
        source,
    })?;
    let cases = build(&document).map_err(|source| LoaderError::Build {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), cases = cases.len(), "loaded definition file");

    cases
        .into_iter()
        .map(|case| {
            let id = format!("{prefix}_{}", case.name);
            if id.contains(['/', '\\']) {
                return Err(LoaderError::InvalidCaseId {
                    path: path.to_path_buf(),
                    id,
                });
            }
            Ok(CollectedCase {
                id,
                file: path.to_path_buf(),
                case,
            })
        })
        .collect()
}

/// Collect the cases of every definition file under `root`.
///
/// Files are visited in sorted path order; the first failing file aborts
/// the collection.
///
/// # Errors
/// Returns an error if discovery fails or any file cannot be loaded.
pub fn collect(root: &Path, config: &BlessConfig) -> Result<Vec<CollectedCase>, LoaderError> {
    collect_with_blessed_ids(root, config).map(|(cases, _)| cases)
}

/// Like [`collect`], also returning the ids each blessed directory keeps.
///
/// Every discovered file's blessed directory has an entry, even when the
/// file yields no concrete cases, so its artifacts can still be pruned.
///
/// # Errors
/// Returns an error if discovery fails or any file cannot be loaded.
pub fn collect_with_blessed_ids(
    root: &Path,
    config: &BlessConfig,
) -> Result<(Vec<CollectedCase>, BlessedIds), LoaderError> {
    let mut cases = Vec::new();
    let mut keep = BlessedIds::new();
    for file in discover_definition_files(root, &config.patterns, &config.exclude)? {
        let loaded = load_definition_file(&file)?;
        keep.entry(blessed_dir_for(&file, &config.blessed_dir))
            .or_default()
            .extend(loaded.iter().map(|case| case.id.clone()));
        cases.extend(loaded);
    }
    Ok((cases, keep))
}
