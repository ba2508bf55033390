//! Runs collected cases against their harnesses and checks the blessed output.

use crate::bless::{self, BlessError, BlessMode, BlessStatus, BlessedRecord};
use crate::config::{BlessConfig, ConfigError, ConfigOverrides, apply_overrides, load_config};
use crate::harness::{Harness, HarnessError, HarnessOutput, HarnessRegistry, Invocation};
use crate::loader::{CollectedCase, LoaderError, collect_with_blessed_ids};
use crate::reporter::{Reporter, ReporterConfig};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use serde_json::Value;
use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur during a run.
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Loader error: {0}")]
    Loader(#[from] LoaderError),
    #[error("case '{id}': {source}")]
    Harness {
        id: String,
        #[source]
        source: HarnessError,
    },
    #[error("case '{id}': {source}")]
    Bless {
        id: String,
        #[source]
        source: BlessError,
    },
    #[error("harness task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error("cannot start runtime: {0}")]
    Runtime(#[source] std::io::Error),
    #[error("{} case(s) not blessed:\n{}", .failures.len(), .failures.join("\n"))]
    Unblessed { failures: Vec<String> },
}

/// Result of running one case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaseOutcome {
    pub id: String,
    pub name: String,
    pub harness: String,
    pub status: BlessStatus,
    pub mode: BlessMode,
    /// Accepted artifact.
    pub blessed_path: PathBuf,
    /// Where differing output is left for review in check mode.
    pub pending_path: PathBuf,
}

impl CaseOutcome {
    /// A case passes when its output matched or was just blessed.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.status == BlessStatus::Match || self.mode == BlessMode::Bless
    }

    /// Why the case failed, if it did.
    #[must_use]
    pub fn failure_message(&self) -> Option<String> {
        if self.passed() {
            return None;
        }
        let what = match self.status {
            BlessStatus::New => "has no blessed output",
            _ => "output differs from the blessed output",
        };
        Some(format!(
            "{} {what}; review {} and rerun with BLESSTEST_BLESS=1 to accept",
            self.id,
            self.pending_path.display()
        ))
    }
}

/// Outcomes of a run, in case order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub outcomes: Vec<CaseOutcome>,
    /// Stale artifacts removed after the run.
    pub pruned: Vec<PathBuf>,
}

impl RunSummary {
    /// Number of passing cases.
    #[must_use]
    pub fn passed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.passed()).count()
    }

    /// Failure messages of every failing case.
    #[must_use]
    pub fn failures(&self) -> Vec<String> {
        self.outcomes
            .iter()
            .filter_map(CaseOutcome::failure_message)
            .collect()
    }
}

/// Get the default parallelism level (number of CPU cores).
#[must_use]
pub fn default_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(std::num::NonZeroUsize::get)
        .unwrap_or(1)
}

#[derive(Debug, Clone)]
struct Settings {
    blessed_dir: String,
    mode: BlessMode,
    debug: bool,
}

/// Run cases against `registry` and persist their output.
///
/// Every harness is resolved before anything runs. Invocations go to the
/// blocking pool, at most `config.parallel` at a time (CPU count when unset,
/// one at a time when 0); outcomes keep the order of `cases`.
///
/// # Errors
/// Returns an error on unknown harnesses, invalid harness input, artifact
/// I/O failures, and in debug mode on harness failures.
pub async fn run_cases<R>(
    cases: Vec<CollectedCase>,
    registry: &R,
    config: &BlessConfig,
) -> Result<Vec<CaseOutcome>, RunnerError>
where
    R: HarnessRegistry + ?Sized,
{
    let resolved = cases
        .into_iter()
        .map(|case| match registry.resolve(&case.case.harness) {
            Ok(harness) => Ok((case, harness)),
            Err(source) => Err(RunnerError::Harness {
                id: case.id,
                source,
            }),
        })
        .collect::<Result<Vec<_>, _>>()?;

    let settings = Settings {
        blessed_dir: config.blessed_dir.clone(),
        mode: config.mode,
        debug: config.debug,
    };
    let n = match config.parallel {
        None => default_parallelism(),
        Some(n) => n.max(1),
    };

    let futures = resolved.into_iter().map(|(case, harness)| {
        let settings = settings.clone();
        async move {
            tokio::task::spawn_blocking(move || execute(&case, harness.as_ref(), &settings))
                .await?
        }
    });

    stream::iter(futures)
        .buffered(n)
        .collect::<Vec<_>>()
        .await
        .into_iter()
        .collect()
}

fn execute(
    case: &CollectedCase,
    harness: &dyn Harness,
    settings: &Settings,
) -> Result<CaseOutcome, RunnerError> {
    let harness_error = |source| RunnerError::Harness {
        id: case.id.clone(),
        source,
    };

    let invocation = catch_unwind(AssertUnwindSafe(|| harness.invoke(&case.case.params)))
        .unwrap_or_else(|payload| {
            Ok(Invocation {
                input: Value::Object(case.case.params.clone()),
                output: HarnessOutput::Exception(panic_message(payload.as_ref())),
            })
        })
        .map_err(harness_error)?;

    let result = match invocation.output {
        HarnessOutput::Value(value) => value,
        HarnessOutput::Exception(message) | HarnessOutput::InvalidOutput(message)
            if settings.debug =>
        {
            return Err(harness_error(HarnessError::Failed {
                harness: case.case.harness.clone(),
                message,
            }));
        }
        HarnessOutput::Exception(message) => BlessedRecord::exception(&message),
        HarnessOutput::InvalidOutput(message) => BlessedRecord::invalid_output(&message),
    };

    let record = BlessedRecord {
        harness: case.case.harness.clone(),
        params: invocation.input,
        result,
    };
    let bless_error = |source| RunnerError::Bless {
        id: case.id.clone(),
        source,
    };
    let json = record.to_json().map_err(bless_error)?;
    let dir = case.blessed_dir(&settings.blessed_dir);
    let status = bless::persist(&dir, &case.id, &json, settings.mode).map_err(bless_error)?;
    debug!(id = %case.id, ?status, "ran case");

    Ok(CaseOutcome {
        id: case.id.clone(),
        name: case.case.name.clone(),
        harness: case.case.harness.clone(),
        status,
        mode: settings.mode,
        blessed_path: bless::blessed_path(&dir, &case.id),
        pending_path: bless::pending_path(&dir, &case.id),
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(ToString::to_string)
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "harness panicked".to_string())
}

/// Collect every case under `root`, run it, and prune stale artifacts.
///
/// # Errors
/// Returns collection errors and the errors of [`run_cases`].
pub async fn run_all<R>(
    root: &Path,
    registry: &R,
    config: &BlessConfig,
) -> Result<RunSummary, RunnerError>
where
    R: HarnessRegistry + ?Sized,
{
    let (cases, keep) = collect_with_blessed_ids(root, config)?;
    let outcomes = run_cases(cases, registry, config).await?;

    let mut pruned = Vec::new();
    if config.prune {
        for (dir, ids) in &keep {
            let removed = bless::prune_stale(dir, ids, false).map_err(|source| {
                RunnerError::Bless {
                    id: dir.display().to_string(),
                    source,
                }
            })?;
            pruned.extend(removed);
        }
    }

    let summary = RunSummary { outcomes, pruned };
    info!(
        total = summary.outcomes.len(),
        passed = summary.passed(),
        pruned = summary.pruned.len(),
        "run finished"
    );
    Ok(summary)
}

/// [`run_all`] on a runtime of its own, for use from synchronous tests.
///
/// # Errors
/// See [`run_all`].
pub fn run_blocking<R>(
    root: &Path,
    registry: &R,
    config: &BlessConfig,
) -> Result<RunSummary, RunnerError>
where
    R: HarnessRegistry + ?Sized,
{
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(RunnerError::Runtime)?
        .block_on(run_all(root, registry, config))
}

/// Run every case under `root` with its project configuration and fail
/// unless all of them are blessed.
///
/// `BLESSTEST_BLESS` and `BLESSTEST_DEBUG` override the configuration file.
///
/// # Errors
/// Returns `RunnerError::Unblessed` listing every failing case, or any
/// error of [`run_all`].
pub fn assert_blessed<R>(root: &Path, registry: &R) -> Result<RunSummary, RunnerError>
where
    R: HarnessRegistry + ?Sized,
{
    let config = apply_overrides(load_config(root)?, &ConfigOverrides::from_env());
    let reporter = Reporter::new(ReporterConfig {
        verbose: false,
        color: false,
    });

    let start = Instant::now();
    let summary = run_blocking(root, registry, &config)?;
    reporter.run_start(summary.outcomes.len());
    for outcome in &summary.outcomes {
        reporter.case_result(outcome);
    }
    reporter.failures(&summary);
    reporter.summary(&summary, start.elapsed());
    reporter.flush();

    let failures = summary.failures();
    if failures.is_empty() {
        Ok(summary)
    } else {
        Err(RunnerError::Unblessed { failures })
    }
}
