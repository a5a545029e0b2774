//! fixity - content-integrity baselines for directory trees.
//!
//! Usage:
//!   fixity [PATH]              Choose generate or compare interactively
//!   fixity generate [PATH]     Recompute and overwrite the baseline
//!   fixity compare [PATH]      Compare the tree against the baseline
//!   fixity --help              Show help

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::atomic::Ordering;
use std::thread::JoinHandle;
use std::time::Instant;

use clap::{Args, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result};
use dialoguer::{Confirm, Select};
use tokio::sync::broadcast;
use tracing::info;
use tracing_subscriber::EnvFilter;

use fixity_core::{
    DEFAULT_BASELINE_FILE, DEFAULT_STATUS_FILE, DigestAlgorithm, ScanConfig, StatusReport,
};
use fixity_reconcile::{Classification, ReconcileConfig, Reconciler, RelocationPolicy};
use fixity_scan::{CurrentScan, HashCoordinator, HashProgress, PathFilter};
use fixity_store::{BaselineStore, StatusStore};

#[derive(Parser)]
#[command(
    name = "fixity",
    version,
    about = "Content-integrity baselines for directory trees",
    long_about = "fixity checksums every file under a directory, stores the result as a \
                  baseline, and later reports which files changed, appeared, went missing \
                  or moved.\n\n\
                  Run `fixity [PATH]` to pick an operation interactively, or use the \
                  `generate` and `compare` subcommands."
)]
struct Cli {
    /// Directory to check (defaults to current directory)
    #[arg(default_value = ".")]
    path: PathBuf,

    #[command(flatten)]
    options: Options,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Args)]
struct Options {
    /// Baseline file, relative to the checked directory
    #[arg(long, global = true, default_value = DEFAULT_BASELINE_FILE)]
    baseline: PathBuf,

    /// Status report file, relative to the checked directory
    #[arg(long, global = true, default_value = DEFAULT_STATUS_FILE)]
    status: PathBuf,

    /// Digest algorithm (blake3 or blake2b); must match the baseline
    #[arg(short, long, global = true, default_value = "blake3")]
    algorithm: DigestAlgorithm,

    /// Number of hashing threads (0 = all cores)
    #[arg(short = 'j', long, global = true, default_value = "0")]
    threads: usize,

    /// Additional directory name to skip (repeatable)
    #[arg(long = "exclude-dir", global = true, value_name = "NAME")]
    exclude_dirs: Vec<String>,

    /// Additional file name to skip (repeatable)
    #[arg(long = "exclude-file", global = true, value_name = "NAME")]
    exclude_files: Vec<String>,

    /// Glob pattern over relative paths to skip (repeatable)
    #[arg(long = "exclude-glob", global = true, value_name = "PATTERN")]
    exclude_globs: Vec<String>,

    /// Drop relocated files from the report instead of listing them
    #[arg(long, global = true)]
    suppress_relocations: bool,

    /// Answer prompts automatically (generate when no baseline exists, else compare)
    #[arg(short, long, global = true)]
    yes: bool,

    /// Exit with status 2 when differences are found
    #[arg(long, global = true)]
    fail_on_change: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Recompute every checksum and overwrite the baseline
    Generate {
        /// Directory to check (defaults to the path before the subcommand)
        path: Option<PathBuf>,
    },

    /// Compare the current tree against the baseline
    Compare {
        /// Directory to check (defaults to the path before the subcommand)
        path: Option<PathBuf>,
    },
}

impl Cli {
    /// Split into the directory to check, the requested operation and the options.
    ///
    /// A path after the subcommand wins over one given before it.
    fn into_parts(self) -> (PathBuf, Option<Operation>, Options) {
        let (path, requested) = match self.command {
            Some(Command::Generate { path }) => (path, Some(Operation::Generate)),
            Some(Command::Compare { path }) => (path, Some(Operation::Compare)),
            None => (None, None),
        };
        (path.unwrap_or(self.path), requested, self.options)
    }
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Generate,
    Compare,
}

fn main() -> Result<ExitCode> {
    color_eyre::install()?;

    let (path, requested, options) = Cli::parse().into_parts();
    init_logging(options.verbose);

    let root = path
        .canonicalize()
        .wrap_err_with(|| format!("Invalid path: {}", path.display()))?;
    let baseline_store = BaselineStore::new(root.join(&options.baseline));
    let status_store = StatusStore::new(root.join(&options.status));

    // Decided up front so no prompt interleaves with the hashing workers.
    let Some(operation) = resolve_operation(requested, &baseline_store, options.yes)? else {
        eprintln!("Negative answer. Exiting.");
        return Ok(ExitCode::FAILURE);
    };

    let config = build_scan_config(&root, &options)?;

    match operation {
        Operation::Generate => {
            eprintln!("Checksumming of all files is now starting...");
            timed("checksumming all files", || run_generate(&config, &baseline_store))?;
            Ok(ExitCode::SUCCESS)
        }
        Operation::Compare => {
            eprintln!("Comparing checksums...");
            let relocation = if options.suppress_relocations {
                RelocationPolicy::Suppress
            } else {
                RelocationPolicy::Report
            };
            let report = timed("comparing checksums", || {
                run_compare(&config, &baseline_store, &status_store, relocation)
            })?;

            print_report(&report, options.format)?;

            if options.fail_on_change && report.has_differences() {
                Ok(ExitCode::from(2))
            } else {
                Ok(ExitCode::SUCCESS)
            }
        }
    }
}

/// Install the stderr log subscriber. `FIXITY_LOG` overrides `-v`.
fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_env("FIXITY_LOG").unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Pick the operation, prompting when it was not given on the command line.
///
/// Returns `None` when the user declines to create the initial baseline.
fn resolve_operation(
    requested: Option<Operation>,
    store: &BaselineStore,
    assume_yes: bool,
) -> Result<Option<Operation>> {
    if !store.exists() {
        if requested == Some(Operation::Generate) || assume_yes {
            return Ok(Some(Operation::Generate));
        }
        let proceed = Confirm::new()
            .with_prompt("Checksum file does not exist, so it needs to be generated. Proceed?")
            .default(false)
            .interact()
            .context("Failed to read answer")?;
        return Ok(proceed.then_some(Operation::Generate));
    }

    if let Some(operation) = requested {
        return Ok(Some(operation));
    }
    if assume_yes {
        return Ok(Some(Operation::Compare));
    }

    let choice = Select::new()
        .with_prompt("Generate new checksum file list, or compare to current checksum file list?")
        .items(&["generate", "compare"])
        .default(1)
        .interact()
        .context("Failed to read answer")?;

    Ok(Some(if choice == 0 {
        Operation::Generate
    } else {
        Operation::Compare
    }))
}

/// Merge the command-line exclusions into a validated scan config.
fn build_scan_config(root: &Path, options: &Options) -> Result<ScanConfig> {
    let mut config = ScanConfig::new(root);
    config.algorithm = options.algorithm;
    config.threads = options.threads;
    config.exclude_globs = options.exclude_globs.clone();
    config.excluded_dirs.extend(options.exclude_dirs.iter().cloned());
    for name in &options.exclude_files {
        config.exclude_file(name.clone());
    }

    // Never checksum our own output files or executable.
    for own in [&options.baseline, &options.status] {
        if let Some(name) = own.file_name().and_then(|n| n.to_str()) {
            config.exclude_file(name);
        }
    }
    if let Some(name) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.file_name().and_then(|n| n.to_str()).map(str::to_string))
    {
        config.exclude_file(name);
    }

    config.validate().context("Invalid exclusion list")?;
    Ok(config)
}

/// Run an operation and print its wall-clock time, even if it failed.
fn timed<T>(label: &str, op: impl FnOnce() -> Result<T>) -> Result<T> {
    timed_to(&mut io::stderr(), label, op)
}

fn timed_to<T>(out: &mut impl Write, label: &str, op: impl FnOnce() -> Result<T>) -> Result<T> {
    let start = Instant::now();
    let result = op();
    let _ = writeln!(
        out,
        "Elapsed time: {:.6} seconds for {label}.",
        start.elapsed().as_secs_f64()
    );
    result
}

fn run_generate(config: &ScanConfig, store: &BaselineStore) -> Result<()> {
    let current = scan_tree(config)?;
    report_failures(&current);

    let baseline = current.to_baseline();
    store.save(&baseline).context("Failed to write baseline")?;

    eprintln!(
        "Wrote {} checksums to {}",
        baseline.len(),
        store.path().display()
    );
    Ok(())
}

fn run_compare(
    config: &ScanConfig,
    baseline_store: &BaselineStore,
    status_store: &StatusStore,
    relocation: RelocationPolicy,
) -> Result<StatusReport> {
    // A malformed baseline must stop us before any hashing work.
    let baseline = baseline_store
        .load(config.algorithm)
        .context("Failed to load baseline")?;

    let current = scan_tree(config)?;
    report_failures(&current);

    let reconcile_config = ReconcileConfig { relocation };
    let report = Reconciler::with_config(reconcile_config).reconcile(&baseline, &current);

    status_store
        .save(&report)
        .context("Failed to write status report")?;
    Ok(report)
}

/// Walk and hash the tree. Ctrl-C cancels the batch.
fn scan_tree(config: &ScanConfig) -> Result<CurrentScan> {
    let filter = PathFilter::new(config).context("Invalid scan configuration")?;
    eprintln!("Scanning {}...", filter.root().display());

    let (files, warnings) = filter.collect();
    for warning in &warnings {
        eprintln!("warning: {}: {}", warning.path.display(), warning.message);
    }

    let coordinator = HashCoordinator::from_config(config);
    let cancel = coordinator.cancel_handle();
    // Only the first call in a process succeeds; later scans reuse that handler.
    let _ = ctrlc::set_handler(move || {
        eprintln!("\nInterrupt received, stopping...");
        cancel.store(true, Ordering::SeqCst);
    });

    let reporter = spawn_progress_reporter(coordinator.subscribe());
    let outcomes = coordinator.hash_all(files);
    drop(coordinator);
    let last_progress = reporter.join().ok().flatten();

    let outcomes = outcomes.context("Hashing failed")?;
    if let Some(progress) = last_progress {
        eprintln!(
            "Hashed {} files ({}) at {}/s",
            progress.files_hashed,
            format_size(progress.bytes_hashed),
            format_size(progress.bytes_per_second() as u64)
        );
    }

    let mut current = CurrentScan::from_outcomes(outcomes);
    current.record_walk_warnings(&warnings);
    Ok(current)
}

/// Log progress snapshots until the coordinator is dropped; return the last one.
fn spawn_progress_reporter(
    mut progress_rx: broadcast::Receiver<HashProgress>,
) -> JoinHandle<Option<HashProgress>> {
    std::thread::spawn(move || {
        let mut last = None;
        loop {
            match progress_rx.blocking_recv() {
                Ok(progress) => {
                    info!(
                        done = progress.files_done(),
                        total = progress.total_files,
                        bytes = %format_size(progress.bytes_hashed),
                        "Hashing progress {:.0}%",
                        progress.fraction_done() * 100.0
                    );
                    last = Some(progress);
                }
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        last
    })
}

fn report_failures(current: &CurrentScan) {
    for (path, message) in current.failures() {
        eprintln!("{path} generated an exception: {message}");
    }
}

fn print_report(report: &StatusReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            println!();
            println!("{}", "─".repeat(70));
            println!(" Integrity Report");
            println!("{}", "─".repeat(70));
            println!(
                " {} matched, {} changed, {} new, {} missing, {} relocated, {} failed",
                report.matched.len(),
                report.changed.len(),
                report.new.len(),
                report.missing.len(),
                report.relocated.len(),
                report.failed.len()
            );
            println!();

            if report.is_clean() {
                println!(" No differences found.");
            } else {
                for classification in report.classifications() {
                    match classification {
                        Classification::Matched(_) => {}
                        Classification::Changed(f) => println!(" {:<10} {}", "changed", f.path),
                        Classification::New(f) => println!(" {:<10} {}", "new", f.path),
                        Classification::Missing(f) => println!(" {:<10} {}", "missing", f.path),
                        Classification::Relocated(f) => {
                            println!(" {:<10} {} -> {}", "relocated", f.from, f.to)
                        }
                        Classification::Failed(f) => {
                            println!(" {:<10} {}: {}", "failed", f.path, f.error)
                        }
                    }
                }
            }
            println!();
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(report)?);
        }
    }

    Ok(())
}

/// Format size in human-readable form.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}
