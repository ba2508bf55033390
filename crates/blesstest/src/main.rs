//! blesstest CLI - inspect expanded cases and blessed artifacts.

use blesstest_core::{
    BlessConfig, CollectedCase, LoaderError, ReportFormat, Reporter, ReporterConfig, collect,
    collect_with_blessed_ids, discover_definition_files, load_config, load_definition_file,
    prune_stale,
};
use blesstest_core::report::{filter_cases, format_cases_json, format_params};
use clap::{Parser, Subcommand};
use comfy_table::{Cell, Color, Table};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Exit codes for the CLI.
mod exit_code {
    pub const SUCCESS: u8 = 0;
    pub const CHECK_FAILED: u8 = 1;
    pub const CONFIG_ERROR: u8 = 2;
    pub const DOCUMENT_ERROR: u8 = 3;
}

#[derive(Parser)]
#[command(name = "blesstest")]
#[command(about = "Expand and inspect blesstest definition files")]
#[command(version)]
struct Cli {
    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every expanded case
    List {
        /// Project root (default: current directory)
        #[arg(value_name = "ROOT", default_value = ".")]
        root: PathBuf,

        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,

        /// Filter cases by ID (substring match)
        #[arg(long)]
        filter: Option<String>,
    },

    /// Build every definition file and report errors
    Check {
        /// Project root (default: current directory)
        #[arg(value_name = "ROOT", default_value = ".")]
        root: PathBuf,
    },

    /// Remove blessed artifacts no current case produces
    Prune {
        /// Project root (default: current directory)
        #[arg(value_name = "ROOT", default_value = ".")]
        root: PathBuf,

        /// Preview removals without applying
        #[arg(long)]
        dry_run: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let reporter = Reporter::new(ReporterConfig {
        verbose: cli.verbose,
        color: !cli.no_color,
    });

    match &cli.command {
        Commands::List {
            root,
            format,
            filter,
        } => list(&reporter, root, format, filter.as_deref(), !cli.no_color),
        Commands::Check { root } => check(&reporter, root),
        Commands::Prune { root, dry_run } => prune(&reporter, root, *dry_run),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    if let Err(e) = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
    {
        eprintln!("warning: failed to initialize logging: {e}");
    }
}

fn config_for(reporter: &Reporter, root: &Path) -> Result<BlessConfig, ExitCode> {
    if !root.is_dir() {
        reporter.error(&format!("root '{}' is not a directory", root.display()));
        return Err(ExitCode::from(exit_code::CONFIG_ERROR));
    }
    let config = load_config(root).map_err(|e| {
        reporter.error(&format!("Failed to load config: {e}"));
        ExitCode::from(exit_code::CONFIG_ERROR)
    })?;
    debug!(root = %root.display(), ?config, "loaded config");
    Ok(config)
}

fn discover(
    reporter: &Reporter,
    root: &Path,
    config: &BlessConfig,
) -> Result<Vec<PathBuf>, ExitCode> {
    let files = discover_definition_files(root, &config.patterns, &config.exclude).map_err(|e| {
        reporter.error(&format!("Failed to discover definition files: {e}"));
        ExitCode::from(exit_code::CONFIG_ERROR)
    })?;
    if files.is_empty() {
        reporter.warn(&format!("no definition files found under {}", root.display()));
    }
    Ok(files)
}

fn load_failed(reporter: &Reporter, e: &LoaderError) -> ExitCode {
    reporter.error(&e.to_string());
    match e {
        LoaderError::Glob(_) => ExitCode::from(exit_code::CONFIG_ERROR),
        _ => ExitCode::from(exit_code::DOCUMENT_ERROR),
    }
}

fn list(
    reporter: &Reporter,
    root: &Path,
    format: &str,
    filter: Option<&str>,
    color: bool,
) -> ExitCode {
    let report_format: ReportFormat = match format.parse() {
        Ok(f) => f,
        Err(e) => {
            reporter.error(&format!("Invalid format: {e}"));
            return ExitCode::from(exit_code::CONFIG_ERROR);
        }
    };
    let config = match config_for(reporter, root) {
        Ok(config) => config,
        Err(code) => return code,
    };
    let cases = match collect(root, &config) {
        Ok(cases) => filter_cases(cases, filter),
        Err(e) => return load_failed(reporter, &e),
    };

    match report_format {
        ReportFormat::Json => println!("{}", format_cases_json(&cases)),
        ReportFormat::Table => print_cases_table(&cases, root, &config, color),
    }
    ExitCode::from(exit_code::SUCCESS)
}

fn print_cases_table(cases: &[CollectedCase], root: &Path, config: &BlessConfig, color: bool) {
    let mut table = Table::new();
    table.set_header(vec!["ID", "Harness", "Params", "File", "Blessed"]);

    for case in cases {
        let blessed = case.blessed_path(&config.blessed_dir).exists();
        let blessed_cell = match (blessed, color) {
            (true, true) => Cell::new("yes").fg(Color::Green),
            (false, true) => Cell::new("no").fg(Color::Yellow),
            (true, false) => Cell::new("yes"),
            (false, false) => Cell::new("no"),
        };
        let file = case.file.strip_prefix(root).unwrap_or(&case.file);

        table.add_row(vec![
            Cell::new(&case.id),
            Cell::new(&case.case.harness),
            Cell::new(format_params(&case.case.params)),
            Cell::new(file.display()),
            blessed_cell,
        ]);
    }

    println!("{table}");
    println!("{} cases", cases.len());
}

fn check(reporter: &Reporter, root: &Path) -> ExitCode {
    let config = match config_for(reporter, root) {
        Ok(config) => config,
        Err(code) => return code,
    };
    let files = match discover(reporter, root, &config) {
        Ok(files) => files,
        Err(code) => return code,
    };

    let mut failed = 0_usize;
    for file in &files {
        match load_definition_file(file) {
            Ok(cases) => println!("ok {} ({} cases)", file.display(), cases.len()),
            Err(e) => {
                failed += 1;
                reporter.error(&e.to_string());
            }
        }
    }

    println!();
    println!("checked {} definition files; {failed} failed", files.len());
    if failed == 0 {
        ExitCode::from(exit_code::SUCCESS)
    } else {
        ExitCode::from(exit_code::CHECK_FAILED)
    }
}

fn prune(reporter: &Reporter, root: &Path, dry_run: bool) -> ExitCode {
    let config = match config_for(reporter, root) {
        Ok(config) => config,
        Err(code) => return code,
    };
    let keep = match collect_with_blessed_ids(root, &config) {
        Ok((_, keep)) => keep,
        Err(e) => return load_failed(reporter, &e),
    };
    if keep.is_empty() {
        reporter.warn(&format!("no definition files found under {}", root.display()));
    }

    let verb = if dry_run { "would remove" } else { "removed" };
    let mut total = 0_usize;
    for (dir, ids) in &keep {
        match prune_stale(dir, ids, dry_run) {
            Ok(stale) => {
                for path in &stale {
                    println!("{verb} {}", path.display());
                }
                total += stale.len();
            }
            Err(e) => {
                reporter.error(&e.to_string());
                return ExitCode::from(exit_code::CONFIG_ERROR);
            }
        }
    }

    if dry_run {
        println!("{total} stale artifacts found (dry run)");
    } else {
        println!("{total} stale artifacts removed");
    }
    ExitCode::from(exit_code::SUCCESS)
}
