//! Configuration loader for blesstest.

use crate::bless::BlessMode;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// File name looked up in the project root.
pub const CONFIG_FILE: &str = "blesstest.config.yaml";

/// Errors that can occur during config loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yml::Error),
    #[error("patterns must list at least one glob")]
    NoPatterns,
    #[error("blessed-dir must be a non-empty relative path, got '{0}'")]
    InvalidBlessedDir(String),
}

/// Project configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields, default)]
pub struct BlessConfig {
    /// Globs (relative to the root) that find definition files.
    pub patterns: Vec<String>,
    /// Paths to skip: glob if the entry has wildcards, substring otherwise.
    pub exclude: Vec<String>,
    /// Directory, next to each definition file, holding blessed artifacts.
    pub blessed_dir: String,
    pub mode: BlessMode,
    /// Propagate harness failures instead of recording them.
    pub debug: bool,
    /// Concurrent harness invocations (None = CPU count, 0 = sequential).
    pub parallel: Option<usize>,
    /// Delete blessed artifacts no current case produces.
    pub prune: bool,
}

impl Default for BlessConfig {
    fn default() -> Self {
        Self {
            patterns: vec![
                "**/*.blesstest.json".to_string(),
                "**/*.blesstest.jsonc".to_string(),
            ],
            exclude: vec!["target/".to_string()],
            blessed_dir: "blessed".to_string(),
            mode: BlessMode::Check,
            debug: false,
            parallel: None,
            prune: true,
        }
    }
}

/// Load configuration from `root/blesstest.config.yaml`.
///
/// If the file doesn't exist, returns default configuration.
///
/// # Errors
/// Returns an error if:
/// - The file exists but cannot be read
/// - The YAML is invalid
/// - `patterns` is empty or `blessed-dir` is not a relative path
pub fn load_config(root: &Path) -> Result<BlessConfig, ConfigError> {
    let config_path = root.join(CONFIG_FILE);

    let config = if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)?;
        serde_yml::from_str(&content)?
    } else {
        BlessConfig::default()
    };

    validate_config(&config)?;
    Ok(config)
}

/// Validate the configuration.
///
/// # Errors
/// See [`ConfigError`].
pub fn validate_config(config: &BlessConfig) -> Result<(), ConfigError> {
    if config.patterns.is_empty() {
        return Err(ConfigError::NoPatterns);
    }
    let blessed = config.blessed_dir.trim();
    if blessed.is_empty() || Path::new(blessed).is_absolute() {
        return Err(ConfigError::InvalidBlessedDir(config.blessed_dir.clone()));
    }
    Ok(())
}

/// Override options layered over the file configuration.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub mode: Option<BlessMode>,
    pub debug: Option<bool>,
}

impl ConfigOverrides {
    /// Overrides from `BLESSTEST_BLESS` and `BLESSTEST_DEBUG`.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Overrides from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let flag = |key: &str| lookup(key).map(|value| is_truthy(&value));
        Self {
            mode: flag("BLESSTEST_BLESS").and_then(|bless| bless.then_some(BlessMode::Bless)),
            debug: flag("BLESSTEST_DEBUG"),
        }
    }
}

fn is_truthy(value: &str) -> bool {
    let value = value.trim();
    !(value.is_empty() || value == "0" || value.eq_ignore_ascii_case("false"))
}

/// Apply overrides to a configuration.
#[must_use]
pub fn apply_overrides(mut config: BlessConfig, overrides: &ConfigOverrides) -> BlessConfig {
    if let Some(mode) = overrides.mode {
        config.mode = mode;
    }
    if let Some(debug) = overrides.debug {
        config.debug = debug;
    }
    config
}
