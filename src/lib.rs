//! file-collector - gather scattered files into one dated, categorized tree
//!
//! This library scans a directory tree, classifies files by extension,
//! removes duplicate content by SHA-256 digest and copies what it finds into
//! `COLLECTED_FILES_<timestamp>/<Category>_<YYYY-MM-DD>/`. Every run can be
//! simulated first with a dry run that reports exactly what a real run would do.

pub mod cli;
pub mod config;
pub mod content_hash;
pub mod error;
pub mod file_category;
pub mod file_collector;
pub mod name_resolver;
pub mod operation_log;
pub mod output;
pub mod progress;
pub mod run_config;
pub mod scan_planner;

pub use config::{CollectorConfig, CompiledFilters, ConfigError};
pub use error::{CollectError, CollectResult, FileError};
pub use file_category::{Category, CategorySelection, FileMapper};
pub use file_collector::{
    ActionKind, ActionRecord, CopyExecutor, DedupeRegistry, RunCounts, RunResult, collect,
};
pub use progress::{CancelFlag, Progress, ProgressReporter, SilentReporter};
pub use run_config::RunConfig;
pub use scan_planner::{PlanItem, ScanPlanner};

pub use cli::{Cli, run_cli};
