/// Plain-text record of what a real run did.
///
/// One line per action, a header describing the run and a trailing summary
/// line. The log is only ever written for real runs, into `log.txt` at the
/// output root.
use crate::file_collector::{ActionKind, ActionRecord, RunCounts};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// File name of the log inside the output root.
pub const LOG_FILE_NAME: &str = "log.txt";

/// Accumulates log lines for one run.
#[derive(Debug, Clone)]
pub struct OperationLog {
    /// RFC 3339 timestamp of when the run started.
    pub timestamp: String,
    pub source_root: PathBuf,
    pub output_root: PathBuf,
    pub dry_run: bool,
    lines: Vec<String>,
}

impl OperationLog {
    /// Creates an empty log for a run.
    pub fn new(source_root: PathBuf, output_root: PathBuf, dry_run: bool) -> Self {
        Self {
            timestamp: chrono::Local::now().to_rfc3339(),
            source_root,
            output_root,
            dry_run,
            lines: Vec::new(),
        }
    }

    /// Appends the line for `record`. Skipped files are not logged.
    pub fn record(&mut self, record: &ActionRecord) {
        if let Some(line) = Self::format_record(record) {
            self.lines.push(line);
        }
    }

    /// The action lines recorded so far.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Formats one action line, e.g. `COPY /src/a.jpg -> /out/Images_2024-01-01/a.jpg`.
    pub fn format_record(record: &ActionRecord) -> Option<String> {
        let src = record.source.display();
        let dst = || {
            record
                .destination
                .as_deref()
                .map(|d| d.display().to_string())
                .unwrap_or_default()
        };
        match record.kind {
            ActionKind::Copied => Some(format!("COPY {} -> {}", src, dst())),
            ActionKind::Renamed => Some(format!("RENAME {} -> {}", src, dst())),
            ActionKind::Duplicate => Some(format!("DUPLICATE {} -> {}", src, dst())),
            ActionKind::Error => Some(format!(
                "ERROR {}: {}",
                src,
                record.reason.as_deref().unwrap_or("unknown error")
            )),
            ActionKind::Skipped => None,
        }
    }

    /// Formats the trailing summary line.
    pub fn format_summary(counts: &RunCounts) -> String {
        format!(
            "SUMMARY copied={} renamed={} duplicated={} skipped={} errors={}",
            counts.copied, counts.renamed, counts.duplicated, counts.skipped, counts.errors
        )
    }

    /// Renders the whole log as text.
    pub fn render(&self, counts: &RunCounts, cancelled: bool) -> String {
        let mut out = String::new();
        out.push_str(&format!("Run log at: {}\n", self.timestamp));
        out.push_str(&format!("Source folder: {}\n", self.source_root.display()));
        out.push_str(&format!(
            "Destination folder: {}\n",
            self.output_root.display()
        ));
        out.push_str(&format!("Dry run: {}\n\n", self.dry_run));
        for line in &self.lines {
            out.push_str(line);
            out.push('\n');
        }
        if cancelled {
            out.push_str("\nCANCELLED by user\n");
        }
        out.push('\n');
        out.push_str(&Self::format_summary(counts));
        out.push('\n');
        out
    }

    /// Writes the log to `<output_root>/log.txt`, creating the root if needed.
    ///
    /// Returns the path written.
    pub fn save(&self, counts: &RunCounts, cancelled: bool) -> io::Result<PathBuf> {
        fs::create_dir_all(&self.output_root)?;
        let path = Self::log_path(&self.output_root);
        fs::write(&path, self.render(counts, cancelled))?;
        Ok(path)
    }

    /// Path of the log file for an output root.
    pub fn log_path(output_root: &Path) -> PathBuf {
        output_root.join(LOG_FILE_NAME)
    }
}
