//! Blessed output artifacts: serialization, comparison and persistence.
//!
//! Every case owns one artifact, `<blessed-dir>/<id>.json`, holding the
//! harness name, the normalized params and the harness result. In check mode
//! a differing output is written next to it as `<id>.json.new` for review;
//! in bless mode the artifact itself is replaced.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Extension of accepted artifacts.
pub const BLESSED_EXTENSION: &str = "json";
/// Extension of pending artifacts awaiting review.
pub const PENDING_EXTENSION: &str = "json.new";

/// Errors that can occur while persisting artifacts.
#[derive(Error, Debug)]
pub enum BlessError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot serialize blessed record: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl BlessError {
    fn io(path: &Path) -> impl FnOnce(io::Error) -> Self + '_ {
        move |source| Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// How outputs that differ from the accepted artifact are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlessMode {
    /// Fail and leave a pending file for review.
    #[default]
    Check,
    /// Accept the current output.
    Bless,
}

/// Outcome of comparing current output with the accepted artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlessStatus {
    Match,
    Changed,
    New,
}

/// Contents of a blessed artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlessedRecord {
    pub harness: String,
    pub params: Value,
    pub result: Value,
}

impl BlessedRecord {
    /// Pretty JSON with a trailing newline, as stored on disk.
    ///
    /// # Errors
    /// Returns an error if the record cannot be serialized.
    pub fn to_json(&self) -> Result<String, BlessError> {
        let mut text = serde_json::to_string_pretty(self)?;
        text.push('\n');
        Ok(text)
    }

    /// Result recorded for a harness that raised.
    #[must_use]
    pub fn exception(message: &str) -> Value {
        serde_json::json!({ "exception": message })
    }

    /// Result recorded for output that could not be serialized.
    #[must_use]
    pub fn invalid_output(message: &str) -> Value {
        serde_json::json!({ "invalid_output": message })
    }
}

/// Path of the accepted artifact for `id`.
#[must_use]
pub fn blessed_path(blessed_dir: &Path, id: &str) -> PathBuf {
    blessed_dir.join(format!("{id}.{BLESSED_EXTENSION}"))
}

/// Path of the pending artifact for `id`.
#[must_use]
pub fn pending_path(blessed_dir: &Path, id: &str) -> PathBuf {
    blessed_dir.join(format!("{id}.{PENDING_EXTENSION}"))
}

/// Compare serialized output with the accepted artifact, if any.
#[must_use]
pub fn compare(accepted: Option<&str>, current: &str) -> BlessStatus {
    match accepted {
        None => BlessStatus::New,
        Some(previous) if previous == current => BlessStatus::Match,
        Some(_) => BlessStatus::Changed,
    }
}

/// Compare `current` with the artifact for `id` and persist per `mode`.
///
/// # Errors
/// Returns an error if the blessed directory or files cannot be accessed.
pub fn persist(
    blessed_dir: &Path,
    id: &str,
    current: &str,
    mode: BlessMode,
) -> Result<BlessStatus, BlessError> {
    let accepted_path = blessed_path(blessed_dir, id);
    let pending = pending_path(blessed_dir, id);

    let accepted = match fs::read_to_string(&accepted_path) {
        Ok(text) => Some(text),
        Err(e) if e.kind() == io::ErrorKind::NotFound => None,
        Err(e) => return Err(BlessError::io(&accepted_path)(e)),
    };
    let status = compare(accepted.as_deref(), current);
    debug!(id, ?status, ?mode, "compared blessed artifact");

    match (status, mode) {
        (BlessStatus::Match, _) => remove_if_exists(&pending)?,
        (_, BlessMode::Check) => write(&pending, current)?,
        (_, BlessMode::Bless) => {
            write(&accepted_path, current)?;
            remove_if_exists(&pending)?;
        }
    }

    Ok(status)
}

/// Delete artifacts in `blessed_dir` whose id is not in `keep`.
///
/// Only `*.json` and `*.json.new` files are considered. With `dry_run` the
/// stale paths are reported but left in place.
///
/// # Errors
/// Returns an error if the directory cannot be listed or a file removed.
pub fn prune_stale(
    blessed_dir: &Path,
    keep: &HashSet<String>,
    dry_run: bool,
) -> Result<Vec<PathBuf>, BlessError> {
    let entries = match fs::read_dir(blessed_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(BlessError::io(blessed_dir)(e)),
    };

    let mut stale = Vec::new();
    for entry in entries {
        let path = entry.map_err(BlessError::io(blessed_dir))?.path();
        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let id = file_name
            .strip_suffix(&format!(".{PENDING_EXTENSION}"))
            .or_else(|| file_name.strip_suffix(&format!(".{BLESSED_EXTENSION}")));
        if let Some(id) = id {
            if !keep.contains(id) {
                stale.push(path);
            }
        }
    }
    stale.sort();

    if !dry_run {
        for path in &stale {
            fs::remove_file(path).map_err(BlessError::io(path))?;
            warn!(path = %path.display(), "removed stale blessed artifact");
        }
    }
    Ok(stale)
}

fn write(path: &Path, contents: &str) -> Result<(), BlessError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(BlessError::io(parent))?;
    }
    fs::write(path, contents).map_err(BlessError::io(path))
}

fn remove_if_exists(path: &Path) -> Result<(), BlessError> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(BlessError::io(path)(e)),
        _ => Ok(()),
    }
}
