//! Command-line interface module for file-collector.
//!
//! This module handles argument parsing and orchestrates one run:
//! - Configuration file loading
//! - Category selection and destination resolution
//! - Ctrl-C handling
//! - Progress display and the final report

use crate::config::CollectorConfig;
use crate::error::CollectError;
use crate::file_category::{Category, CategorySelection};
use crate::file_collector::{RunResult, collect};
use crate::output::{CliReporter, OutputFormatter};
use crate::progress::{CancelFlag, ProgressReporter, SilentReporter};
use crate::run_config::{RunConfig, default_destination};
use clap::Parser;
use std::path::PathBuf;

/// Collect files from a directory tree into a dated, per-category folder.
#[derive(Debug, Parser)]
#[command(name = "file-collector", version, about, long_about = None)]
pub struct Cli {
    /// Directory to collect files from (searched recursively).
    pub source: PathBuf,

    /// Categories to collect: images, documents, videos, audio, archives.
    #[arg(short = 'c', long = "category", value_delimiter = ',', conflicts_with = "all")]
    pub categories: Vec<Category>,

    /// Collect every file, placing unlisted extensions under Other.
    #[arg(long)]
    pub all: bool,

    /// Show what would be collected without writing anything.
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Directory to create the COLLECTED_FILES_<timestamp> folder in.
    /// Defaults to the configured destination, then the Desktop.
    #[arg(short = 'd', long = "dest")]
    pub destination: Option<PathBuf>,

    /// Configuration file to use instead of the discovered one.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print the run result as JSON instead of the summary table.
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// The category selection requested on the command line.
    pub fn selection(&self) -> CategorySelection {
        if self.all {
            CategorySelection::All
        } else {
            CategorySelection::only(self.categories.iter().copied())
        }
    }

    /// Destination precedence: `--dest`, then `[output] destination`, then the Desktop.
    pub fn destination(&self, settings: &CollectorConfig) -> PathBuf {
        self.destination
            .clone()
            .or_else(|| settings.output.destination.clone())
            .unwrap_or_else(default_destination)
    }
}

/// Runs one collection as described by `cli` and prints the report.
///
/// Per-file failures are part of the returned result. Only problems that
/// prevent the run from starting are returned as errors.
///
/// # Examples
///
/// ```no_run
/// use clap::Parser;
/// use file_collector::cli::{Cli, run_cli};
///
/// let cli = Cli::parse_from(["file-collector", "/mnt/old-disk", "-c", "images", "--dry-run"]);
/// match run_cli(&cli) {
///     Ok(result) => println!("{} files would be collected", result.counts.placed()),
///     Err(e) => eprintln!("Error: {}", e),
/// }
/// ```
pub fn run_cli(cli: &Cli) -> Result<RunResult, CollectError> {
    let settings = CollectorConfig::load(cli.config.as_deref())?;
    let config = RunConfig::new(
        &cli.source,
        cli.selection(),
        cli.dry_run,
        cli.destination(&settings),
    )?;

    let cancel = CancelFlag::new();
    install_interrupt_handler(&cancel);

    if !cli.json {
        if config.dry_run() {
            OutputFormatter::dry_run_notice(&format!(
                "Analyzing contents of: {}",
                config.source_root().display()
            ));
        } else {
            OutputFormatter::info(&format!(
                "Collecting from: {}",
                config.source_root().display()
            ));
        }
    }

    let cli_reporter;
    let reporter: &dyn ProgressReporter = if cli.json {
        &SilentReporter
    } else {
        cli_reporter = CliReporter::new();
        &cli_reporter
    };

    let result = collect(&config, &settings, reporter, cancel)?;

    if cli.json {
        match serde_json::to_string_pretty(&result) {
            Ok(json) => println!("{}", json),
            Err(e) => log::error!("could not serialize run result: {}", e),
        }
    } else {
        OutputFormatter::summary_table(&result);
        OutputFormatter::error_list(&result);
        OutputFormatter::completion(&result);
    }

    Ok(result)
}

/// Routes Ctrl-C to `cancel`. The run stops before the next file and keeps
/// what it has already copied.
fn install_interrupt_handler(cancel: &CancelFlag) {
    let handle = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || handle.cancel()) {
        // Only one handler per process; a second run in the same process keeps the first.
        log::debug!("interrupt handler not installed: {}", e);
    }
}
