/// File collection: hashing, deduplication and copying.
///
/// This module consumes a plan produced by the scan planner, decides the
/// final destination of every file and either copies it there or, in dry-run
/// mode, only computes what would happen. Both modes go through the exact
/// same hashing and naming steps, so their results agree.
use crate::config::CollectorConfig;
use crate::content_hash::{self, ContentDigest};
use crate::error::{CollectResult, FileError};
use crate::file_category::Category;
use crate::name_resolver::NameResolver;
use crate::operation_log::OperationLog;
use crate::progress::{CancelFlag, Progress, ProgressReporter, SilentReporter, estimate_eta};
use crate::run_config::RunConfig;
use crate::scan_planner::{PlanEntry, PlanItem, ScanPlanner, SkipReason};
use filetime::FileTime;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// What happened to one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ActionKind {
    /// Unique content, copied under its own name.
    Copied,
    /// Unique content, copied under a numbered name because the plain one was taken.
    Renamed,
    /// Same content as an earlier file in this run, copied with a `_dup` name.
    Duplicate,
    /// Left out of the plan.
    Skipped,
    /// Could not be read, hashed or copied.
    Error,
}

/// Where in the pipeline an error happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorStage {
    Traversal,
    Hash,
    Copy,
}

/// Record of one file's outcome.
#[derive(Debug, Clone, Serialize)]
pub struct ActionRecord {
    pub source: PathBuf,
    pub category: Option<Category>,
    /// Final destination, for copied, renamed and duplicate files.
    pub destination: Option<PathBuf>,
    pub kind: ActionKind,
    pub error_stage: Option<ErrorStage>,
    /// Skip reason or error description.
    pub reason: Option<String>,
}

impl ActionRecord {
    fn placed(entry: &PlanEntry, destination: PathBuf, kind: ActionKind) -> Self {
        Self {
            source: entry.source.path.clone(),
            category: Some(entry.category),
            destination: Some(destination),
            kind,
            error_stage: None,
            reason: None,
        }
    }

    fn skipped(path: PathBuf, category: Category, reason: SkipReason) -> Self {
        Self {
            source: path,
            category: Some(category),
            destination: None,
            kind: ActionKind::Skipped,
            error_stage: None,
            reason: Some(reason.to_string()),
        }
    }

    fn failed(err: &FileError, category: Option<Category>) -> Self {
        let stage = match err {
            FileError::Traversal { .. } => ErrorStage::Traversal,
            FileError::Hash { .. } => ErrorStage::Hash,
            FileError::Copy { .. } => ErrorStage::Copy,
        };
        Self {
            source: err.path().clone(),
            category,
            destination: None,
            kind: ActionKind::Error,
            error_stage: Some(stage),
            reason: Some(err.reason()),
        }
    }
}

/// Aggregate counts for a run.
///
/// `copied` counts every unique file placed, `renamed` is the subset of those
/// that needed a numbered name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunCounts {
    pub copied: usize,
    pub renamed: usize,
    pub duplicated: usize,
    pub skipped: usize,
    pub errors: usize,
}

impl RunCounts {
    fn add(&mut self, kind: ActionKind) {
        match kind {
            ActionKind::Copied => self.copied += 1,
            ActionKind::Renamed => {
                self.copied += 1;
                self.renamed += 1;
            }
            ActionKind::Duplicate => self.duplicated += 1,
            ActionKind::Skipped => self.skipped += 1,
            ActionKind::Error => self.errors += 1,
        }
    }

    /// Files that ended up (or would end up) in the output tree.
    pub fn placed(&self) -> usize {
        self.copied + self.duplicated
    }
}

/// Outcome of a run. Identical in shape for dry and real runs.
#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub output_root: PathBuf,
    pub dry_run: bool,
    /// True if the run was stopped before the plan was exhausted.
    pub cancelled: bool,
    pub counts: RunCounts,
    pub records: Vec<ActionRecord>,
    /// Where the operation log was written. Always `None` for dry runs.
    pub log_path: Option<PathBuf>,
}

impl RunResult {
    /// Number of placed files per category.
    pub fn category_counts(&self) -> BTreeMap<Category, usize> {
        let mut counts = BTreeMap::new();
        for record in &self.records {
            if let (Some(category), Some(_)) = (record.category, &record.destination) {
                *counts.entry(category).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Records of files that failed.
    pub fn errors(&self) -> impl Iterator<Item = &ActionRecord> {
        self.records
            .iter()
            .filter(|record| record.kind == ActionKind::Error)
    }

    /// Destination of the record whose source is `source`, if it was placed.
    pub fn destination_of(&self, source: &Path) -> Option<&Path> {
        self.records
            .iter()
            .find(|record| record.source == source)
            .and_then(|record| record.destination.as_deref())
    }
}

/// Content digests seen in the current run and the outputs assigned to them.
///
/// Lives for exactly one run; nothing carries over between runs.
#[derive(Debug, Default)]
pub struct DedupeRegistry {
    seen: HashMap<ContentDigest, Vec<PathBuf>>,
}

impl DedupeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if this content has already been placed in this run.
    pub fn contains(&self, digest: &ContentDigest) -> bool {
        self.seen.contains_key(digest)
    }

    /// Records an output assigned to `digest`.
    pub fn register(&mut self, digest: ContentDigest, output: PathBuf) {
        self.seen.entry(digest).or_default().push(output);
    }

    /// Outputs assigned to `digest`, first occurrence first.
    pub fn outputs(&self, digest: &ContentDigest) -> &[PathBuf] {
        self.seen.get(digest).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of distinct contents seen.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// Executes a plan for one run.
///
/// The executor owns the run's dedupe registry and name resolver, and is
/// consumed by [`CopyExecutor::execute`].
pub struct CopyExecutor<'r> {
    output_root: PathBuf,
    dry_run: bool,
    registry: DedupeRegistry,
    resolver: NameResolver,
    log: OperationLog,
    reporter: &'r dyn ProgressReporter,
    cancel: CancelFlag,
    total_estimate: Option<u64>,
}

impl CopyExecutor<'static> {
    /// Creates an executor writing under `output_root`.
    pub fn new(config: &RunConfig, output_root: PathBuf) -> Self {
        let log = OperationLog::new(
            config.source_root().to_path_buf(),
            output_root.clone(),
            config.dry_run(),
        );
        Self {
            output_root,
            dry_run: config.dry_run(),
            registry: DedupeRegistry::new(),
            resolver: NameResolver::new(),
            log,
            reporter: &SilentReporter,
            cancel: CancelFlag::new(),
            total_estimate: None,
        }
    }
}

impl<'r> CopyExecutor<'r> {
    /// Sends progress to `reporter`.
    pub fn with_reporter<'n>(self, reporter: &'n dyn ProgressReporter) -> CopyExecutor<'n> {
        CopyExecutor {
            output_root: self.output_root,
            dry_run: self.dry_run,
            registry: self.registry,
            resolver: self.resolver,
            log: self.log,
            reporter,
            cancel: self.cancel,
            total_estimate: self.total_estimate,
        }
    }

    /// Stops the run at the next plan item once `cancel` is set.
    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Total used for progress percentages and ETA.
    pub fn with_total_estimate(mut self, total: u64) -> Self {
        self.total_estimate = Some(total);
        self
    }

    /// Runs the plan to completion (or cancellation).
    ///
    /// Per-file failures are recorded and never abort the run.
    pub fn execute<I>(mut self, plan: I) -> RunResult
    where
        I: IntoIterator<Item = PlanItem>,
    {
        let started = Instant::now();
        let mut plan = plan.into_iter();
        let mut counts = RunCounts::default();
        let mut records = Vec::new();
        let mut processed: u64 = 0;
        let mut cancelled = false;

        log::info!(
            "{} into {}",
            if self.dry_run { "simulating collection" } else { "collecting" },
            self.output_root.display()
        );
        self.reporter.on_start(self.total_estimate);

        loop {
            if self.cancel.is_cancelled() {
                log::warn!("run cancelled after {} items", processed);
                cancelled = true;
                break;
            }
            let Some(item) = plan.next() else {
                break;
            };

            let record = match item {
                PlanItem::Entry(entry) => self.execute_entry(&entry),
                PlanItem::Skipped {
                    path,
                    category,
                    reason,
                } => ActionRecord::skipped(path, category, reason),
                PlanItem::Error(err) => ActionRecord::failed(&err, None),
            };

            counts.add(record.kind);
            if !self.dry_run {
                self.log.record(&record);
            }

            processed += 1;
            let elapsed = started.elapsed();
            self.reporter.on_progress(&Progress {
                processed,
                total_estimate: self.total_estimate,
                current_file: &record.source,
                elapsed,
                eta: estimate_eta(elapsed, processed, self.total_estimate),
            });
            records.push(record);
        }

        let log_path = if !self.dry_run && !self.log.is_empty() {
            match self.log.save(&counts, cancelled) {
                Ok(path) => Some(path),
                Err(e) => {
                    log::warn!("could not write operation log: {}", e);
                    None
                }
            }
        } else {
            None
        };

        log::info!(
            "run finished: {} copied, {} duplicates, {} skipped, {} errors",
            counts.copied,
            counts.duplicated,
            counts.skipped,
            counts.errors
        );

        let result = RunResult {
            output_root: self.output_root,
            dry_run: self.dry_run,
            cancelled,
            counts,
            records,
            log_path,
        };
        self.reporter.on_complete(&result);
        result
    }

    fn execute_entry(&mut self, entry: &PlanEntry) -> ActionRecord {
        let source = &entry.source.path;

        let digest = match content_hash::digest(source) {
            Ok(digest) => digest,
            Err(e) => {
                let err = FileError::Hash {
                    path: source.clone(),
                    source: e,
                };
                log::warn!("{}", err);
                return ActionRecord::failed(&err, Some(entry.category));
            }
        };

        let desired = entry.desired_path(&self.output_root);
        let is_duplicate = self.registry.contains(&digest);
        let target = self.resolver.resolve(&desired, is_duplicate);
        let kind = if is_duplicate {
            ActionKind::Duplicate
        } else if target != desired {
            ActionKind::Renamed
        } else {
            ActionKind::Copied
        };

        if !self.dry_run
            && let Err(e) = copy_file(source, &target)
        {
            let err = FileError::Copy {
                from: source.clone(),
                to: target,
                source: e,
            };
            log::warn!("{}", err);
            return ActionRecord::failed(&err, Some(entry.category));
        }

        log::debug!(
            "{:?} {} -> {} ({})",
            kind,
            source.display(),
            target.display(),
            digest
        );
        self.registry.register(digest, target.clone());
        ActionRecord::placed(entry, target, kind)
    }
}

/// Copies `from` to `to`, creating the parent directory if needed.
///
/// The destination is opened with create-new semantics, so an existing file
/// is never overwritten. A copy that fails partway leaves nothing behind.
/// The source's modification time is carried over; failing to set it only
/// logs a warning, since the content is already in place.
pub fn copy_file(from: &Path, to: &Path) -> io::Result<()> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut reader = File::open(from)?;
    let metadata = reader.metadata()?;
    write_new(&mut reader, to)?;

    let mtime = FileTime::from_last_modification_time(&metadata);
    if let Err(e) = filetime::set_file_mtime(to, mtime) {
        log::warn!(
            "could not preserve modification time on {}: {}",
            to.display(),
            e
        );
    }
    Ok(())
}

/// Writes everything from `reader` into a new file at `to`, removing the
/// file again if any write fails.
fn write_new<R: Read>(reader: &mut R, to: &Path) -> io::Result<u64> {
    let mut writer = OpenOptions::new().write(true).create_new(true).open(to)?;
    let written = io::copy(reader, &mut writer).and_then(|n| writer.sync_all().map(|()| n));
    drop(writer);

    written.inspect_err(|_| {
        if let Err(e) = fs::remove_file(to) {
            log::warn!("could not remove partial copy {}: {}", to.display(), e);
        }
    })
}

/// Plans and executes a whole run.
///
/// The output root is `COLLECTED_FILES_<now>` under the configured
/// destination. It is pruned from traversal if it lies inside the source.
///
/// # Errors
///
/// Fails only if `settings` cannot be turned into a mapper and filters.
/// Everything that goes wrong with individual files ends up in the result.
///
/// # Examples
///
/// ```no_run
/// use file_collector::config::CollectorConfig;
/// use file_collector::file_category::{Category, CategorySelection};
/// use file_collector::file_collector::collect;
/// use file_collector::progress::{CancelFlag, SilentReporter};
/// use file_collector::run_config::RunConfig;
///
/// let config = RunConfig::new(
///     "/home/me/old-laptop",
///     CategorySelection::only([Category::Images]),
///     true,
///     "/home/me/Desktop",
/// )
/// .unwrap();
/// let result = collect(&config, &CollectorConfig::default(), &SilentReporter, CancelFlag::new()).unwrap();
/// println!("{} unique, {} duplicates", result.counts.copied, result.counts.duplicated);
/// ```
pub fn collect(
    config: &RunConfig,
    settings: &CollectorConfig,
    reporter: &dyn ProgressReporter,
    cancel: CancelFlag,
) -> CollectResult<RunResult> {
    let mapper = settings.file_mapper()?;
    let filters = settings.compile()?;
    let output_root = config.output_root(chrono::Local::now());

    let planner = ScanPlanner::new(config, mapper, filters).exclude_dir(&output_root);
    let total = planner.count_candidates();

    let result = CopyExecutor::new(config, output_root)
        .with_reporter(reporter)
        .with_cancel_flag(cancel)
        .with_total_estimate(total)
        .execute(planner.plan());
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompiledFilters;
    use crate::file_category::{CategorySelection, FileMapper};
    use std::cell::RefCell;
    use tempfile::TempDir;

    fn run(source: &Path, out: &Path, selection: CategorySelection, dry_run: bool) -> RunResult {
        let config = RunConfig::new(source, selection, dry_run, out).unwrap();
        let planner = ScanPlanner::new(&config, FileMapper::default(), CompiledFilters::default());
        CopyExecutor::new(&config, out.join("collected")).execute(planner.plan())
    }

    fn bucket_of(result: &RunResult, source: &Path) -> PathBuf {
        result
            .destination_of(source)
            .and_then(Path::parent)
            .expect("file should have been placed")
            .to_path_buf()
    }

    #[test]
    fn test_duplicates_get_dup_names() {
        let src = TempDir::new().expect("Failed to create temp directory");
        let out = TempDir::new().expect("Failed to create temp directory");
        fs::write(src.path().join("a.jpg"), "same").unwrap();
        fs::write(src.path().join("b.jpg"), "same").unwrap();
        fs::write(src.path().join("c.jpg"), "same").unwrap();

        let result = run(src.path(), out.path(), CategorySelection::All, false);
        let a = src.path().canonicalize().unwrap().join("a.jpg");
        let b = a.with_file_name("b.jpg");
        let c = a.with_file_name("c.jpg");
        let bucket = bucket_of(&result, &a);

        assert_eq!(result.counts.copied, 1);
        assert_eq!(result.counts.duplicated, 2);
        assert_eq!(result.destination_of(&a), Some(bucket.join("a.jpg").as_path()));
        assert_eq!(result.destination_of(&b), Some(bucket.join("b_dup.jpg").as_path()));
        assert_eq!(result.destination_of(&c), Some(bucket.join("c_dup.jpg").as_path()));
        assert_eq!(fs::read(bucket.join("c_dup.jpg")).unwrap(), b"same");
    }

    #[test]
    fn test_same_name_same_content_in_different_dirs() {
        let src = TempDir::new().expect("Failed to create temp directory");
        let out = TempDir::new().expect("Failed to create temp directory");
        for dir in ["one", "three", "two"] {
            fs::create_dir(src.path().join(dir)).unwrap();
            fs::write(src.path().join(dir).join("x.png"), "pixels").unwrap();
        }

        let result = run(src.path(), out.path(), CategorySelection::All, true);
        let names: Vec<_> = result
            .records
            .iter()
            .filter_map(|r| r.destination.as_ref())
            .map(|d| d.file_name().unwrap().to_string_lossy().into_owned())
            .collect();

        assert_eq!(names, vec!["x.png", "x_dup.png", "x_dup1.png"]);
    }

    #[test]
    fn test_same_name_different_content_is_renamed() {
        let src = TempDir::new().expect("Failed to create temp directory");
        let out = TempDir::new().expect("Failed to create temp directory");
        fs::create_dir(src.path().join("a")).unwrap();
        fs::create_dir(src.path().join("b")).unwrap();
        fs::write(src.path().join("a/notes.txt"), "first").unwrap();
        fs::write(src.path().join("b/notes.txt"), "second").unwrap();

        let result = run(src.path(), out.path(), CategorySelection::All, false);

        assert_eq!(result.counts.copied, 2);
        assert_eq!(result.counts.renamed, 1);
        assert_eq!(result.counts.duplicated, 0);
        let kinds: Vec<_> = result.records.iter().map(|r| r.kind).collect();
        assert_eq!(kinds, vec![ActionKind::Copied, ActionKind::Renamed]);

        let renamed = result.records[1].destination.clone().unwrap();
        assert_eq!(renamed.file_name().unwrap(), "notes_1.txt");
        assert_eq!(fs::read_to_string(renamed).unwrap(), "second");
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let src = TempDir::new().expect("Failed to create temp directory");
        let out = TempDir::new().expect("Failed to create temp directory");
        fs::write(src.path().join("a.jpg"), "same").unwrap();
        fs::write(src.path().join("b.jpg"), "same").unwrap();

        let result = run(src.path(), out.path(), CategorySelection::All, true);

        assert!(result.dry_run);
        assert_eq!(result.counts.copied, 1);
        assert_eq!(result.counts.duplicated, 1);
        assert!(result.log_path.is_none());
        assert!(!out.path().join("collected").exists());
    }

    #[test]
    fn test_real_run_writes_log() {
        let src = TempDir::new().expect("Failed to create temp directory");
        let out = TempDir::new().expect("Failed to create temp directory");
        fs::write(src.path().join("a.jpg"), "same").unwrap();
        fs::write(src.path().join("b.jpg"), "same").unwrap();

        let result = run(src.path(), out.path(), CategorySelection::All, false);
        let log_path = result.log_path.clone().expect("log should be written");
        let text = fs::read_to_string(log_path).unwrap();

        assert!(text.contains("COPY "));
        assert!(text.contains("DUPLICATE "));
        assert!(text.contains("b_dup.jpg"));
        assert!(text.contains("SUMMARY copied=1 renamed=0 duplicated=1 skipped=0 errors=0"));
    }

    #[test]
    fn test_copy_preserves_modification_time() {
        let src = TempDir::new().expect("Failed to create temp directory");
        let out = TempDir::new().expect("Failed to create temp directory");
        let file = src.path().join("old.jpg");
        fs::write(&file, "vintage").unwrap();
        let mtime = FileTime::from_unix_time(1_500_000_000, 0);
        filetime::set_file_mtime(&file, mtime).unwrap();

        let result = run(src.path(), out.path(), CategorySelection::All, false);
        let copied = result.records[0].destination.clone().unwrap();
        let copied_mtime = FileTime::from_last_modification_time(&fs::metadata(copied).unwrap());

        assert_eq!(copied_mtime, mtime);
    }

    #[test]
    fn test_copy_file_never_overwrites() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let from = temp_dir.path().join("from.txt");
        let to = temp_dir.path().join("to.txt");
        fs::write(&from, "new").unwrap();
        fs::write(&to, "existing").unwrap();

        let result = copy_file(&from, &to);

        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::AlreadyExists);
        assert_eq!(fs::read_to_string(&to).unwrap(), "existing");
    }

    /// Yields some bytes, then fails like a device running out of space.
    struct FailingReader {
        sent: bool,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.sent {
                return Err(io::Error::other("no space left on device"));
            }
            self.sent = true;
            let chunk = b"partial";
            buf[..chunk.len()].copy_from_slice(chunk);
            Ok(chunk.len())
        }
    }

    #[test]
    fn test_failed_write_removes_partial_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let to = temp_dir.path().join("half.jpg");

        let result = write_new(&mut FailingReader { sent: false }, &to);

        assert!(result.is_err());
        assert!(!to.exists());
    }

    #[test]
    fn test_write_new_complete_copy() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let to = temp_dir.path().join("whole.jpg");

        let written = write_new(&mut &b"all of it"[..], &to).unwrap();

        assert_eq!(written, 9);
        assert_eq!(fs::read(&to).unwrap(), b"all of it");
    }

    #[test]
    fn test_hash_failure_is_recorded_and_run_continues() {
        let src = TempDir::new().expect("Failed to create temp directory");
        let out = TempDir::new().expect("Failed to create temp directory");
        fs::write(src.path().join("good.jpg"), "fine").unwrap();

        let config = RunConfig::new(src.path(), CategorySelection::All, false, out.path()).unwrap();
        let planner = ScanPlanner::new(&config, FileMapper::default(), CompiledFilters::default());
        let mut items: Vec<PlanItem> = planner.plan().collect();

        // Point a copy of the entry at a file that no longer exists.
        let mut vanished = match &items[0] {
            PlanItem::Entry(entry) => entry.clone(),
            _ => panic!("expected an entry"),
        };
        vanished.source.path = src.path().join("vanished.jpg");
        vanished.output_name = "vanished.jpg".into();
        items.insert(0, PlanItem::Entry(vanished));

        let result = CopyExecutor::new(&config, out.path().join("collected")).execute(items);

        assert_eq!(result.counts.errors, 1);
        assert_eq!(result.counts.copied, 1);
        assert_eq!(result.records[0].error_stage, Some(ErrorStage::Hash));
        let log = fs::read_to_string(result.log_path.unwrap()).unwrap();
        assert!(log.contains("ERROR "));
    }

    #[test]
    fn test_cancelled_before_start() {
        let src = TempDir::new().expect("Failed to create temp directory");
        let out = TempDir::new().expect("Failed to create temp directory");
        fs::write(src.path().join("a.jpg"), "x").unwrap();

        let config = RunConfig::new(src.path(), CategorySelection::All, false, out.path()).unwrap();
        let planner = ScanPlanner::new(&config, FileMapper::default(), CompiledFilters::default());
        let cancel = CancelFlag::new();
        cancel.cancel();

        let result = CopyExecutor::new(&config, out.path().join("collected"))
            .with_cancel_flag(cancel)
            .execute(planner.plan());

        assert!(result.cancelled);
        assert!(result.records.is_empty());
        assert!(result.log_path.is_none());
    }

    struct CancelAfterFirst {
        cancel: CancelFlag,
        seen: RefCell<Vec<(u64, Option<u64>)>>,
    }

    impl ProgressReporter for CancelAfterFirst {
        fn on_progress(&self, progress: &Progress<'_>) {
            self.seen
                .borrow_mut()
                .push((progress.processed, progress.total_estimate));
            self.cancel.cancel();
        }
    }

    #[test]
    fn test_cancel_between_items_keeps_partial_result() {
        let src = TempDir::new().expect("Failed to create temp directory");
        let out = TempDir::new().expect("Failed to create temp directory");
        fs::write(src.path().join("a.jpg"), "1").unwrap();
        fs::write(src.path().join("b.jpg"), "2").unwrap();
        fs::write(src.path().join("c.jpg"), "3").unwrap();

        let config = RunConfig::new(src.path(), CategorySelection::All, false, out.path()).unwrap();
        let planner = ScanPlanner::new(&config, FileMapper::default(), CompiledFilters::default());
        let cancel = CancelFlag::new();
        let reporter = CancelAfterFirst {
            cancel: cancel.clone(),
            seen: RefCell::new(Vec::new()),
        };

        let result = CopyExecutor::new(&config, out.path().join("collected"))
            .with_reporter(&reporter)
            .with_cancel_flag(cancel)
            .with_total_estimate(planner.count_candidates())
            .execute(planner.plan());

        assert!(result.cancelled);
        assert_eq!(result.counts.copied, 1);
        assert_eq!(*reporter.seen.borrow(), vec![(1, Some(3))]);
        // What was copied stays, and the log says so.
        let first = result.records[0].destination.clone().unwrap();
        assert!(first.exists());
        let log = fs::read_to_string(result.log_path.unwrap()).unwrap();
        assert!(log.contains("CANCELLED"));
    }

    #[test]
    fn test_registry_tracks_outputs_per_digest() {
        let digest = content_hash::digest_reader(&b"abc"[..]).unwrap();
        let other = content_hash::digest_reader(&b"xyz"[..]).unwrap();
        let mut registry = DedupeRegistry::new();

        assert!(!registry.contains(&digest));
        registry.register(digest, PathBuf::from("/o/a.jpg"));
        registry.register(digest, PathBuf::from("/o/a_dup.jpg"));

        assert!(registry.contains(&digest));
        assert!(!registry.contains(&other));
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.outputs(&digest),
            &[PathBuf::from("/o/a.jpg"), PathBuf::from("/o/a_dup.jpg")]
        );
        assert!(registry.outputs(&other).is_empty());
    }

    #[test]
    fn test_category_counts() {
        let src = TempDir::new().expect("Failed to create temp directory");
        let out = TempDir::new().expect("Failed to create temp directory");
        fs::write(src.path().join("a.jpg"), "1").unwrap();
        fs::write(src.path().join("b.png"), "2").unwrap();
        fs::write(src.path().join("c.mp3"), "3").unwrap();
        fs::write(src.path().join("d.xyz"), "4").unwrap();

        let result = run(
            src.path(),
            out.path(),
            CategorySelection::only([Category::Images, Category::Audio]),
            true,
        );
        let counts = result.category_counts();

        assert_eq!(counts.get(&Category::Images), Some(&2));
        assert_eq!(counts.get(&Category::Audio), Some(&1));
        assert_eq!(counts.get(&Category::Other), None);
        assert_eq!(result.counts.skipped, 1);
    }
}
