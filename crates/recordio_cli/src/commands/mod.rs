//! CLI command implementations.

pub mod append;
pub mod dump;
pub mod recover;
pub mod verify;

use recordio_core::LogError;
use recordio_storage::StorageError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for CLI commands.
pub type CliResult<T> = Result<T, CliError>;

/// Errors reported by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// The log file does not exist.
    #[error("log file not found: {0}")]
    NotFound(PathBuf),

    /// Record log error.
    #[error(transparent)]
    Log(#[from] LogError),

    /// Storage backend error.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Reading an input file failed.
    #[error("cannot read {path}: {source}")]
    Input {
        /// The input file.
        path: PathBuf,
        /// The underlying error.
        source: std::io::Error,
    },

    /// JSON output failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The log did not pass verification.
    #[error("verification failed: {0}")]
    VerificationFailed(String),
}

/// Fails with [`CliError::NotFound`] unless `path` exists.
pub(crate) fn require_existing(path: &std::path::Path) -> CliResult<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(CliError::NotFound(path.to_path_buf()))
    }
}
