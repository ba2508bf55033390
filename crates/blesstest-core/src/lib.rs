//! Core library for blesstest.
//!
//! This crate turns blesstest definition documents into concrete cases and
//! checks harness output against blessed artifacts:
//! - Comment-tolerant document parsing
//! - `base` inheritance, nested variations and bracket sweeps
//! - Deterministic, collision-checked case names
//! - Harness registry, runner and blessed artifact persistence

pub mod bless;
pub mod bracket;
pub mod builder;
pub mod config;
pub mod document;
pub mod harness;
pub mod loader;
pub mod namer;
pub mod report;
pub mod reporter;
pub mod resolver;
pub mod runner;
pub mod types;
pub mod variation;

pub use bless::{BlessError, BlessMode, BlessStatus, BlessedRecord, persist, prune_stale};
pub use builder::{ExpandError, build, build_str};
pub use config::{
    BlessConfig, CONFIG_FILE, ConfigError, ConfigOverrides, apply_overrides, load_config,
};
pub use document::{DocumentError, parse_document};
pub use harness::{
    FnHarness, Harness, HarnessError, HarnessOutput, HarnessRegistry, HarnessSet, Invocation,
};
pub use loader::{
    BlessedIds, CollectedCase, LoaderError, collect, collect_with_blessed_ids,
    discover_definition_files, load_definition_file,
};
pub use report::ReportFormat;
pub use reporter::{Reporter, ReporterConfig};
pub use runner::{
    CaseOutcome, RunSummary, RunnerError, assert_blessed, default_parallelism, run_all,
    run_blocking, run_cases,
};
pub use types::*;
