//! Error types for collection runs.
//!
//! Only [`CollectError`] is ever returned to a caller: it means the run could
//! not start. Everything that goes wrong with an individual file is a
//! [`FileError`], recorded in the run result and never propagated.

use crate::config::ConfigError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors, raised before any traversal happens.
#[derive(Debug, Error)]
pub enum CollectError {
    /// Bad source path, empty category selection, or unusable destination.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The configuration file could not be loaded or compiled.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type for collection entry points.
pub type CollectResult<T> = Result<T, CollectError>;

/// Per-file failures. These are recorded and the run moves on.
#[derive(Debug, Error)]
pub enum FileError {
    /// A directory or entry could not be read during the scan.
    #[error("cannot read {}: {reason}", path.display())]
    Traversal { path: PathBuf, reason: String },

    /// The file content could not be read for hashing.
    #[error("cannot hash {}: {source}", path.display())]
    Hash {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The copy to the destination failed.
    #[error("cannot copy {} to {}: {source}", from.display(), to.display())]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl FileError {
    /// The source-side path this error is about.
    pub fn path(&self) -> &PathBuf {
        match self {
            FileError::Traversal { path, .. } | FileError::Hash { path, .. } => path,
            FileError::Copy { from, .. } => from,
        }
    }

    /// A short description without the path, as written to the log.
    pub fn reason(&self) -> String {
        match self {
            FileError::Traversal { reason, .. } => reason.clone(),
            FileError::Hash { source, .. } => format!("read failed: {}", source),
            FileError::Copy { to, source, .. } => {
                format!("copy to {} failed: {}", to.display(), source)
            }
        }
    }
}

impl From<walkdir::Error> for FileError {
    fn from(err: walkdir::Error) -> Self {
        let path = err.path().map(PathBuf::from).unwrap_or_default();
        let reason = match err.io_error() {
            Some(io_err) => io_err.to_string(),
            None => err.to_string(),
        };
        FileError::Traversal { path, reason }
    }
}
