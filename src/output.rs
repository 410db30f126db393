//! Output formatting and styling module.
//!
//! All terminal output of the CLI goes through here: colored status lines,
//! the progress bar shown while a run is in flight, and the summary table
//! printed when it ends.

use crate::file_collector::RunResult;
use crate::progress::{Progress, ProgressReporter};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;
use std::time::Duration;

/// Manages all CLI output with consistent styling and formatting.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use file_collector::output::OutputFormatter;
    /// OutputFormatter::success("Collection complete");
    /// ```
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Prints a dry-run notice message.
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }

    /// Creates a progress bar for a run of `total` items.
    ///
    /// Falls back to indicatif's default style if the template is rejected.
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} ({eta} remaining) {msg}",
        )
        .map(|style| style.progress_chars("█▓░"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
        pb.set_style(style);
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }

    /// Prints the per-category table and the action totals of a run.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use file_collector::file_collector::RunResult;
    /// use file_collector::output::OutputFormatter;
    ///
    /// fn report(result: &RunResult) {
    ///     OutputFormatter::summary_table(result);
    /// }
    /// ```
    pub fn summary_table(result: &RunResult) {
        Self::header("SUMMARY");

        let category_counts = result.category_counts();
        let max_category_len = category_counts
            .keys()
            .map(|category| category.dir_name().len())
            .max()
            .unwrap_or(0)
            .max(8); // At least "Category" width

        println!(
            "{:<width$} | {}",
            "Category".bold(),
            "Files".bold(),
            width = max_category_len
        );
        println!("{}", "-".repeat(max_category_len + 10));

        for (category, count) in &category_counts {
            println!(
                "{:<width$} | {} {}",
                category.dir_name(),
                count.to_string().green(),
                plural(*count),
                width = max_category_len
            );
        }

        println!("{}", "-".repeat(max_category_len + 10));
        let placed = result.counts.placed();
        println!(
            "{:<width$} | {} {}",
            "Total".bold(),
            placed.to_string().green().bold(),
            plural(placed),
            width = max_category_len
        );

        let counts = &result.counts;
        println!();
        println!("  Unique:     {}", counts.copied.to_string().green());
        if counts.renamed > 0 {
            println!("    renamed:  {}", counts.renamed.to_string().cyan());
        }
        println!("  Duplicates: {}", counts.duplicated.to_string().yellow());
        println!("  Skipped:    {}", counts.skipped);
        if counts.errors > 0 {
            println!("  Errors:     {}", counts.errors.to_string().red());
        } else {
            println!("  Errors:     0");
        }
    }

    /// Lists every file that failed, with its reason.
    pub fn error_list(result: &RunResult) {
        let mut errors = result.errors().peekable();
        if errors.peek().is_none() {
            return;
        }
        Self::header("ERRORS");
        for record in errors {
            eprintln!(
                "  {} {}: {}",
                "✗".red(),
                record.source.display(),
                record.reason.as_deref().unwrap_or("unknown error")
            );
        }
    }

    /// Prints the closing lines of a run: where the output went, or that
    /// nothing was written.
    pub fn completion(result: &RunResult) {
        println!();
        if result.cancelled {
            Self::warning("Run cancelled. Files copied so far were kept.");
        }

        if result.dry_run {
            Self::dry_run_notice(&format!(
                "Files would be collected into {}",
                result.output_root.display()
            ));
            Self::success("Dry run complete. No files were written.");
            return;
        }

        if result.counts.placed() == 0 && result.log_path.is_none() {
            Self::info("Nothing to collect.");
            return;
        }

        Self::success(&format!(
            "Files collected into {}",
            result.output_root.display()
        ));
        if let Some(log_path) = &result.log_path {
            Self::info(&format!("Log written to {}", log_path.display()));
        }
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "file" } else { "files" }
}

/// Terminal progress reporter backed by an indicatif bar.
///
/// Shows a spinner when the total is unknown and a bar with an ETA otherwise.
pub struct CliReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn finish_bar(&self) {
        if let Ok(mut guard) = self.bar.lock()
            && let Some(pb) = guard.take()
        {
            pb.finish_and_clear();
        }
    }
}

impl Default for CliReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for CliReporter {
    fn on_start(&self, total_estimate: Option<u64>) {
        let pb = match total_estimate {
            Some(total) => OutputFormatter::create_progress_bar(total),
            None => {
                let pb = ProgressBar::new_spinner();
                pb.enable_steady_tick(Duration::from_millis(100));
                pb
            }
        };
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(old) = guard.replace(pb) {
                old.finish_and_clear();
            }
        }
    }

    fn on_progress(&self, progress: &Progress<'_>) {
        if let Ok(guard) = self.bar.lock()
            && let Some(pb) = guard.as_ref()
        {
            pb.set_position(progress.processed);
            let name = progress
                .current_file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            pb.set_message(name);
        }
    }

    fn on_complete(&self, _result: &RunResult) {
        self.finish_bar();
    }
}
