//! CLI entry point for the pkgref migration tool.
//!
//! This binary migrates legacy NuGet dependency artifacts in bulk:
//! `packages.config` manifests become `PackageReference` items in the owning
//! project, and duplicated binding redirects in `app.config`/`web.config`
//! are consolidated to one rule per assembly.
//!
//! # Usage
//!
//! ```bash
//! pkgref-migrate [OPTIONS] <COMMAND>
//!
//! # Rewrite manifests into their owning projects
//! pkgref-migrate packages src/App/packages.config src/Lib/packages.config
//!
//! # Consolidate binding redirects
//! pkgref-migrate redirects src/App/app.config
//!
//! # Bounded parallelism plus a JSON report
//! pkgref-migrate packages --jobs 4 --report report.json src/**/packages.config
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

mod host;

use std::io::Write;

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use pkgref_core::{MigrationKind, MigrationTarget};
use pkgref_engine::{BatchConfig, BatchOrchestrator, BatchReport, BatchStatus};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::host::ConsoleHost;

// =============================================================================
// CLI ARGUMENT TYPES
// =============================================================================

/// Batch migrator for legacy NuGet dependency artifacts.
#[derive(Parser)]
#[command(name = "pkgref-migrate", version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    command: Commands,

    /// Maximum number of worker threads.
    ///
    /// Defaults to the machine's available parallelism; clamped to it.
    #[arg(short, long, global = true, env = "PKGREF_MIGRATE_JOBS")]
    jobs: Option<usize>,

    /// Write a JSON report of per-file outcomes to this path.
    #[arg(long, global = true)]
    report: Option<Utf8PathBuf>,

    /// Enable verbose logging (debug level).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Migrate packages.config manifests into PackageReference items.
    ///
    /// Each manifest's owning project is resolved as the single project file
    /// in the same directory; the project is rewritten in place and the
    /// manifest deleted once nothing references it anymore. Files that are
    /// not named packages.config are skipped.
    Packages {
        /// Manifest files to migrate.
        #[arg(required = true)]
        files: Vec<Utf8PathBuf>,
    },

    /// Consolidate duplicate binding redirects in configuration files.
    ///
    /// Keeps one dependentAssembly entry per assembly name, the one with the
    /// highest newVersion. Files not named app.config or web.config are
    /// skipped.
    Redirects {
        /// Configuration files to consolidate.
        #[arg(required = true)]
        files: Vec<Utf8PathBuf>,
    },
}

// =============================================================================
// INITIALIZATION
// =============================================================================

/// Initializes the tracing subscriber for logging.
///
/// Respects the `RUST_LOG` environment variable if set. Otherwise, uses
/// `debug` level if `--verbose` is set, or `info` level by default.
fn init_tracing(verbose: bool, no_color: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if verbose { "debug" } else { "info" };
        EnvFilter::new(level.to_owned())
    });

    // Check if colors should be disabled (flag or NO_COLOR env var)
    let use_ansi = !no_color && std::env::var("NO_COLOR").is_err();

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_ansi(use_ansi))
        .with(filter)
        .init();
}

/// Builds a [`BatchConfig`] from CLI arguments.
fn build_config(kind: MigrationKind, jobs: Option<usize>) -> BatchConfig {
    let config = BatchConfig::new(kind);
    match jobs {
        Some(jobs) => config.with_max_parallelism(jobs),
        None => config,
    }
}

// =============================================================================
// BATCH EXECUTION
// =============================================================================

/// Runs one batch and handles reporting and the exit disposition.
fn run_batch(
    kind: MigrationKind,
    files: &[Utf8PathBuf],
    cli: &Cli,
) -> color_eyre::Result<()> {
    let targets: Vec<MigrationTarget> = files
        .iter()
        .map(|path| MigrationTarget::new(path.clone()))
        .collect();

    let config = build_config(kind, cli.jobs);
    let host = ConsoleHost;
    let orchestrator = BatchOrchestrator::new();

    let report = orchestrator.run(&targets, &config, &host)?;
    print_outcomes(&report)?;

    if let Some(report_path) = &cli.report {
        let content = generate_json_report(&report)?;
        std::fs::write(report_path.as_std_path(), content)?;
        info!(path = %report_path, "Report written");
    }

    if report.is_success() {
        Ok(())
    } else {
        Err(color_eyre::eyre::eyre!(
            "{} of {} file(s) failed to migrate",
            report.failed(),
            report.outcomes.len()
        ))
    }
}

// =============================================================================
// OUTPUT HELPERS
// =============================================================================

/// Prints per-file outcomes and the final status line.
fn print_outcomes(report: &BatchReport) -> color_eyre::Result<()> {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();

    for outcome in &report.outcomes {
        match &outcome.result {
            Ok(summary) => writeln!(handle, "ok      {}: {summary}", outcome.target.path)?,
            Err(error) => writeln!(handle, "failed  {}: {error}", outcome.target.path)?,
        }
    }
    writeln!(handle)?;
    writeln!(handle, "{}", report.summary())?;
    Ok(())
}

/// Serializable view of one file's outcome.
#[derive(serde::Serialize)]
struct FileReport<'a> {
    path: &'a str,
    ok: bool,
    detail: String,
}

/// Generates the JSON report document.
fn generate_json_report(report: &BatchReport) -> color_eyre::Result<String> {
    #[derive(serde::Serialize)]
    struct Report<'a> {
        kind: MigrationKind,
        status: &'static str,
        succeeded: usize,
        failed: usize,
        files: Vec<FileReport<'a>>,
    }

    let files = report
        .outcomes
        .iter()
        .map(|outcome| FileReport {
            path: outcome.target.path.as_str(),
            ok: outcome.succeeded(),
            detail: match &outcome.result {
                Ok(summary) => summary.clone(),
                Err(error) => error.to_string(),
            },
        })
        .collect();

    let document = Report {
        kind: report.kind,
        status: status_label(report.status),
        succeeded: report.succeeded(),
        failed: report.failed(),
        files,
    };
    serde_json::to_string_pretty(&document)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to serialize JSON: {}", e))
}

/// Maps a batch status to its report label.
const fn status_label(status: BatchStatus) -> &'static str {
    match status {
        BatchStatus::NothingToDo => "nothing_to_do",
        BatchStatus::AllSucceeded => "all_succeeded",
        BatchStatus::PartialFailure => "partial_failure",
        BatchStatus::TotalFailure => "total_failure",
    }
}

// =============================================================================
// MAIN ENTRY POINT
// =============================================================================

/// Application entry point.
fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.no_color);

    match &cli.command {
        Commands::Packages { files } => run_batch(MigrationKind::PackageReference, files, &cli),
        Commands::Redirects { files } => run_batch(MigrationKind::BindingRedirect, files, &cli),
    }
}
