//! Per-invocation run settings.

use crate::error::{CollectError, CollectResult};
use crate::file_category::{Category, CategorySelection};
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};

/// Prefix of the timestamped output root directory.
pub const OUTPUT_ROOT_PREFIX: &str = "COLLECTED_FILES_";

/// Everything a single run needs to know, validated up front.
///
/// Built once from user input and never changed during the run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    source_root: PathBuf,
    selection: CategorySelection,
    dry_run: bool,
    destination: PathBuf,
}

impl RunConfig {
    /// Validates the input and builds a run configuration.
    ///
    /// # Errors
    ///
    /// Returns `CollectError::InvalidInput` if the source is missing or not a
    /// directory, if the selection is empty, or if an explicit selection
    /// names `Other` (only reachable through "All").
    pub fn new(
        source_root: impl Into<PathBuf>,
        selection: CategorySelection,
        dry_run: bool,
        destination: impl Into<PathBuf>,
    ) -> CollectResult<Self> {
        let source_root = source_root.into();

        if !source_root.exists() {
            return Err(CollectError::InvalidInput(format!(
                "source directory does not exist: {}",
                source_root.display()
            )));
        }
        if !source_root.is_dir() {
            return Err(CollectError::InvalidInput(format!(
                "source is not a directory: {}",
                source_root.display()
            )));
        }
        if selection.is_empty() {
            return Err(CollectError::InvalidInput(
                "select at least one category (or All)".to_string(),
            ));
        }
        if matches!(&selection, CategorySelection::Only(set) if set.contains(&Category::Other)) {
            return Err(CollectError::InvalidInput(
                "unlisted extensions are only collected with All".to_string(),
            ));
        }

        // Absolute paths keep log lines and output-root pruning unambiguous.
        let source_root = source_root.canonicalize().unwrap_or(source_root);
        let destination = destination.into();
        let destination = destination.canonicalize().unwrap_or(destination);

        Ok(Self {
            source_root,
            selection,
            dry_run,
            destination,
        })
    }

    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    pub fn selection(&self) -> &CategorySelection {
        &self.selection
    }

    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    /// Base directory the output root is created in.
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// The output root for a run started at `started`:
    /// `<destination>/COLLECTED_FILES_<YYYY-MM-DD_HH-MM-SS>`.
    pub fn output_root(&self, started: DateTime<Local>) -> PathBuf {
        self.destination.join(format!(
            "{}{}",
            OUTPUT_ROOT_PREFIX,
            started.format("%Y-%m-%d_%H-%M-%S")
        ))
    }
}

/// The user's Desktop, or `~/Desktop` where the platform has no such notion.
pub fn default_destination() -> PathBuf {
    dirs::desktop_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Desktop")))
        .unwrap_or_else(|| PathBuf::from("Desktop"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    #[test]
    fn test_valid_config() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let config = RunConfig::new(
            temp_dir.path(),
            CategorySelection::only([Category::Images]),
            true,
            "/non/existent/out",
        )
        .expect("config should be valid");

        assert!(config.dry_run());
        assert!(config.source_root().is_absolute());
        assert!(config.selection().includes(Category::Images));
        assert_eq!(config.destination(), Path::new("/non/existent/out"));
    }

    #[test]
    fn test_missing_source_rejected() {
        let result = RunConfig::new(
            "/non/existent/path",
            CategorySelection::All,
            false,
            "/non/existent/out",
        );
        assert!(matches!(result, Err(CollectError::InvalidInput(_))));
    }

    #[test]
    fn test_file_source_rejected() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let file = temp_dir.path().join("a.jpg");
        std::fs::write(&file, "x").unwrap();

        let result = RunConfig::new(&file, CategorySelection::All, false, "/non/existent/out");
        assert!(matches!(result, Err(CollectError::InvalidInput(_))));
    }

    #[test]
    fn test_empty_selection_rejected() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let result = RunConfig::new(temp_dir.path(), CategorySelection::only([]), false, "/o");
        assert!(matches!(result, Err(CollectError::InvalidInput(_))));
    }

    #[test]
    fn test_explicit_other_rejected() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let result = RunConfig::new(
            temp_dir.path(),
            CategorySelection::only([Category::Other]),
            false,
            "/o",
        );
        assert!(matches!(result, Err(CollectError::InvalidInput(_))));
    }

    #[test]
    fn test_output_root_name() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let config =
            RunConfig::new(temp_dir.path(), CategorySelection::All, false, "/desk").unwrap();
        let started = Local.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap();

        assert_eq!(
            config.output_root(started),
            PathBuf::from("/desk/COLLECTED_FILES_2024-05-06_07-08-09")
        );
    }
}
