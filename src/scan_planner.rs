/// Source tree traversal and plan generation.
///
/// The planner walks the source root depth-first with entries sorted by
/// file name at every level, so the same tree always yields the same plan
/// order. The plan is a lazy, single-pass iterator: nothing is read ahead.
use crate::config::CompiledFilters;
use crate::error::FileError;
use crate::file_category::{Category, FileMapper};
use crate::run_config::RunConfig;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Bucket date used when a file's modification time cannot be read.
pub const NO_DATE_FOLDER: &str = "no_dates";

/// A regular file found in the source tree.
#[derive(Debug, Clone, Serialize)]
pub struct SourceFile {
    /// Absolute path of the file.
    pub path: PathBuf,
    /// Extension as found on disk, without the dot. Empty if there is none.
    pub extension: String,
    /// Last modification time, if the platform reported one.
    pub modified: Option<DateTime<Local>>,
    /// Size in bytes.
    pub size: u64,
}

impl SourceFile {
    /// The file name component, as used for the default output name.
    /// Kept as raw OS bytes so names that are not valid UTF-8 survive the copy.
    pub fn file_name(&self) -> OsString {
        self.path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default()
    }

    /// Modification date as `YYYY-MM-DD`, or [`NO_DATE_FOLDER`].
    pub fn modification_date(&self) -> String {
        match self.modified {
            Some(modified) => modified.format("%Y-%m-%d").to_string(),
            None => NO_DATE_FOLDER.to_string(),
        }
    }
}

/// One file's planned destination, before collision resolution.
#[derive(Debug, Clone)]
pub struct PlanEntry {
    pub source: SourceFile,
    pub category: Category,
    /// `<Category>_<YYYY-MM-DD>`
    pub bucket: String,
    /// Desired output file name inside the bucket.
    pub output_name: OsString,
}

impl PlanEntry {
    /// The desired destination under `output_root`.
    pub fn desired_path(&self, output_root: &Path) -> PathBuf {
        output_root.join(&self.bucket).join(&self.output_name)
    }
}

/// Why a file was left out of the plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SkipReason {
    /// Its category is not part of the run's selection.
    CategoryNotSelected(Category),
    /// A configured filter rule excluded it.
    Filtered,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::CategoryNotSelected(category) => {
                write!(f, "category {} not selected", category)
            }
            SkipReason::Filtered => f.write_str("excluded by filter rules"),
        }
    }
}

/// What the plan yields for each thing the traversal encounters.
#[derive(Debug)]
pub enum PlanItem {
    Entry(PlanEntry),
    Skipped {
        path: PathBuf,
        category: Category,
        reason: SkipReason,
    },
    Error(FileError),
}

/// Builds plans for one run.
pub struct ScanPlanner<'a> {
    config: &'a RunConfig,
    mapper: FileMapper,
    filters: CompiledFilters,
    excluded_dirs: Vec<PathBuf>,
}

impl<'a> ScanPlanner<'a> {
    /// Creates a planner with the given extension table and filters.
    pub fn new(config: &'a RunConfig, mapper: FileMapper, filters: CompiledFilters) -> Self {
        Self {
            config,
            mapper,
            filters,
            excluded_dirs: Vec::new(),
        }
    }

    /// Never descends into `dir`. Used for the run's own output root when
    /// it sits inside the source tree.
    pub fn exclude_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.excluded_dirs.push(dir.into());
        self
    }

    fn walker(&self) -> impl Iterator<Item = walkdir::Result<walkdir::DirEntry>> + '_ {
        WalkDir::new(self.config.source_root())
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |entry| {
                if entry.depth() == 0 || !entry.file_type().is_dir() {
                    return true;
                }
                let path = entry.path();
                !self.excluded_dirs.iter().any(|dir| dir.as_path() == path)
            })
    }

    /// Starts a new single-pass plan over the source tree.
    pub fn plan(&self) -> Plan<'_> {
        log::info!(
            "planning collection from {}",
            self.config.source_root().display()
        );
        Plan {
            planner: self,
            walker: Box::new(self.walker()),
        }
    }

    /// Counts the regular files the plan will visit, without classifying or
    /// reading them. Used as the progress total estimate.
    ///
    /// This is a full extra walk of the source tree (directory reads only, no
    /// file contents), so on very large trees it adds noticeably to start-up.
    pub fn count_candidates(&self) -> u64 {
        self.walker()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .count() as u64
    }

    fn plan_entry(&self, entry: walkdir::DirEntry) -> Option<PlanItem> {
        if !entry.file_type().is_file() {
            // Directories are traversed, symlinks and special files ignored.
            return None;
        }

        let path = entry.path().to_path_buf();
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();
        let category = self.mapper.classify(&extension);

        let relative = path.strip_prefix(self.config.source_root()).unwrap_or(&path);
        let filtered = !self.filters.should_include(&path)
            || self.filters.hidden_by_directory(&path, relative);
        if filtered {
            log::debug!("filtered out {}", path.display());
            return Some(PlanItem::Skipped {
                path,
                category,
                reason: SkipReason::Filtered,
            });
        }

        if !self.config.selection().includes(category) {
            log::debug!("skipping {} ({})", path.display(), category);
            return Some(PlanItem::Skipped {
                path,
                category,
                reason: SkipReason::CategoryNotSelected(category),
            });
        }

        let metadata = match entry.metadata() {
            Ok(metadata) => metadata,
            Err(err) => return Some(PlanItem::Error(FileError::from(err))),
        };

        let modified = match metadata.modified() {
            Ok(time) => Some(DateTime::<Local>::from(time)),
            Err(err) => {
                log::warn!("no modification time for {}: {}", path.display(), err);
                None
            }
        };

        let source = SourceFile {
            extension,
            modified,
            size: metadata.len(),
            path,
        };
        let bucket = category.bucket(&source.modification_date());
        let output_name = source.file_name();
        log::debug!(
            "planned {} -> {}/{}",
            source.path.display(),
            bucket,
            output_name.to_string_lossy()
        );

        Some(PlanItem::Entry(PlanEntry {
            source,
            category,
            bucket,
            output_name,
        }))
    }
}

/// A lazy plan. Each call to `next` advances the traversal just far enough
/// to produce one item.
pub struct Plan<'p> {
    planner: &'p ScanPlanner<'p>,
    walker: Box<dyn Iterator<Item = walkdir::Result<walkdir::DirEntry>> + 'p>,
}

impl Iterator for Plan<'_> {
    type Item = PlanItem;

    fn next(&mut self) -> Option<PlanItem> {
        loop {
            match self.walker.next()? {
                Ok(entry) => {
                    if let Some(item) = self.planner.plan_entry(entry) {
                        return Some(item);
                    }
                }
                Err(err) => {
                    let err = FileError::from(err);
                    log::warn!("{}", err);
                    return Some(PlanItem::Error(err));
                }
            }
        }
    }
}
