//! Run output with cargo test-like formatting.

use crate::runner::{CaseOutcome, RunSummary};
use std::io::{self, Write};
use std::time::Duration;

/// Reporter configuration.
#[derive(Debug, Clone)]
pub struct ReporterConfig {
    /// Show artifact paths under each case.
    pub verbose: bool,
    /// Use colors in output.
    pub color: bool,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            color: true,
        }
    }
}

/// Run reporter with cargo test-like output.
#[derive(Clone)]
pub struct Reporter {
    config: ReporterConfig,
}

impl Reporter {
    /// Create a new reporter with the given configuration.
    #[must_use]
    pub const fn new(config: ReporterConfig) -> Self {
        Self { config }
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if self.config.color {
            format!("\x1b[{code}m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }

    /// Print the start of a run.
    pub fn run_start(&self, case_count: usize) {
        println!();
        println!("running {case_count} blessed cases");
    }

    /// Print a case result line.
    pub fn case_result(&self, outcome: &CaseOutcome) {
        let status = if outcome.passed() {
            self.paint("ok", "32")
        } else {
            self.paint("FAILED", "31")
        };
        println!("test {} ... {status}", outcome.id);

        if self.config.verbose {
            println!("     ({})", outcome.blessed_path.display());
        }
    }

    /// Print failures section.
    pub fn failures(&self, summary: &RunSummary) {
        let failures: Vec<(&CaseOutcome, String)> = summary
            .outcomes
            .iter()
            .filter_map(|o| o.failure_message().map(|m| (o, m)))
            .collect();
        if failures.is_empty() {
            return;
        }

        println!();
        println!("failures:");
        println!();
        for (outcome, message) in failures {
            println!("---- {} ----", outcome.id);
            println!("    {message}");
            println!();
        }
    }

    /// Print the final summary.
    pub fn summary(&self, summary: &RunSummary, duration: Duration) {
        let passed = summary.passed();
        let failed = summary.outcomes.len() - passed;
        let status = if failed == 0 {
            self.paint("ok", "32")
        } else {
            self.paint("FAILED", "31")
        };

        println!();
        println!(
            "test result: {status}. {passed} passed; {failed} failed; {} pruned; finished in {:.1}s",
            summary.pruned.len(),
            duration.as_secs_f64()
        );
    }

    /// Print a warning message.
    pub fn warn(&self, message: &str) {
        eprintln!("{}: {message}", self.paint("warning", "33"));
    }

    /// Print an error message.
    pub fn error(&self, message: &str) {
        eprintln!("{}: {message}", self.paint("error", "31"));
    }

    /// Flush stdout.
    pub fn flush(&self) {
        let _ = io::stdout().flush();
    }
}
