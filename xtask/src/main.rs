use std::env;
use std::path::PathBuf;
use std::process::{Command, ExitCode};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "xtask", about = "Build tasks for blesstest")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run cargo fmt --check
    Fmt,
    /// Run cargo check
    Check,
    /// Run cargo clippy
    Clippy,
    /// Run cargo test
    Test,
    /// Run all CI checks (fmt, check, clippy, test, cases)
    Ci,
    /// Check every definition file in the workspace
    Cases {
        /// Arguments to pass to `blesstest check`
        #[arg(trailing_var_arg = true)]
        args: Vec<String>,
    },
    /// Run the tests with BLESSTEST_BLESS=1 to accept new outputs
    Bless,
    /// Build release and install to ~/.blesstest/bin/
    Install,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {e:?}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Fmt => cmd_fmt(),
        Commands::Check => cmd_check(),
        Commands::Clippy => cmd_clippy(),
        Commands::Test => cmd_test(),
        Commands::Ci => cmd_ci(),
        Commands::Cases { args } => cmd_cases(&args),
        Commands::Bless => cmd_bless(),
        Commands::Install => cmd_install(),
    }
}

fn cmd_fmt() -> Result<()> {
    cargo(&["fmt", "--all", "--check"])
}

fn cmd_check() -> Result<()> {
    cargo(&["check", "--workspace", "--all-targets"])
}

fn cmd_clippy() -> Result<()> {
    cargo(&["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"])
}

fn cmd_test() -> Result<()> {
    cargo(&["test", "--workspace"])
}

fn cmd_ci() -> Result<()> {
    cmd_fmt()?;
    cmd_check()?;
    cmd_clippy()?;
    cmd_test()?;
    cmd_cases(&[])?;
    Ok(())
}

fn cmd_cases(args: &[String]) -> Result<()> {
    let mut cmd_args = vec!["run", "-p", "blesstest", "--", "check"];
    if args.is_empty() {
        cmd_args.push("crates/blesstest-core/tests/fixtures");
    } else {
        cmd_args.extend(args.iter().map(String::as_str));
    }
    cargo(&cmd_args)
}

fn cmd_bless() -> Result<()> {
    let cmd_line = "BLESSTEST_BLESS=1 cargo test --workspace";
    eprintln!("$ {cmd_line}");

    let status = Command::new("cargo")
        .args(["test", "--workspace"])
        .env("BLESSTEST_BLESS", "1")
        .status()
        .with_context(|| format!("Failed to execute: {cmd_line}"))?;
    check_status(cmd_line, status)
}

fn cmd_install() -> Result<()> {
    cargo(&["build", "--release", "-p", "blesstest"])?;

    let home = env::var_os("HOME").context("HOME environment variable not set")?;
    let bin_dir = PathBuf::from(home).join(".blesstest/bin");

    std::fs::create_dir_all(&bin_dir)
        .with_context(|| format!("Failed to create directory: {}", bin_dir.display()))?;

    let src = PathBuf::from("target/release/blesstest");
    let dst = bin_dir.join("blesstest");
    std::fs::copy(&src, &dst)
        .with_context(|| format!("Failed to copy {} to {}", src.display(), dst.display()))?;
    println!("Installed: {}", dst.display());

    println!();
    println!("Add to shell profile:");
    println!("  export PATH={}:$PATH", bin_dir.display());

    Ok(())
}

fn cargo(args: &[&str]) -> Result<()> {
    exec("cargo", args)
}

fn exec(program: &str, args: &[&str]) -> Result<()> {
    let cmd_line = format!("{program} {}", args.join(" "));
    eprintln!("$ {cmd_line}");

    let status = Command::new(program)
        .args(args)
        .status()
        .with_context(|| format!("Failed to execute: {cmd_line}"))?;
    check_status(&cmd_line, status)
}

fn check_status(cmd_line: &str, status: std::process::ExitStatus) -> Result<()> {
    if !status.success() {
        let code_info = match status.code() {
            Some(code) => format!("exit code {code}"),
            None => "terminated by signal".to_string(),
        };
        bail!("{cmd_line}: {code_info}");
    }
    Ok(())
}
