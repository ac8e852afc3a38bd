//! Typed error definitions for pdf_splitter.
//! Provides a small set of well-known failure modes for better logs and tests.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SplitError {
    #[error("Source folder not found or not a directory: {0}")]
    SourceNotFound(PathBuf),

    #[error("No files ending in '{suffix}' found under {}", source_dir.display())]
    NoFilesFound { source_dir: PathBuf, suffix: String },

    #[error("Size limit must be greater than zero (got {0} bytes)")]
    InvalidLimit(u64),

    #[error("Destination exists but is not a directory: {0}")]
    DestinationNotDirectory(PathBuf),

    #[error("Destination already holds a file with this name: {0}")]
    DestinationExists(PathBuf),

    #[error("Source file missing a file name: {0}")]
    MissingFileName(PathBuf),

    #[error("A split run is already in progress")]
    AlreadyRunning,
}

impl SplitError {
    /// Stable short code, attached to structured log events.
    pub fn code(&self) -> &'static str {
        match self {
            SplitError::SourceNotFound(_) => "E_SOURCE_NOT_FOUND",
            SplitError::NoFilesFound { .. } => "E_NO_FILES",
            SplitError::InvalidLimit(_) => "E_INVALID_LIMIT",
            SplitError::DestinationNotDirectory(_) => "E_DEST_NOT_DIR",
            SplitError::DestinationExists(_) => "E_DEST_EXISTS",
            SplitError::MissingFileName(_) => "E_NO_FILE_NAME",
            SplitError::AlreadyRunning => "E_ALREADY_RUNNING",
        }
    }

    /// Short sentence shown to the user when this error ends a run.
    pub fn user_message(&self) -> String {
        match self {
            SplitError::SourceNotFound(_) => "Source folder not found.".to_string(),
            SplitError::NoFilesFound { suffix, .. } => {
                format!("No {suffix} files were found in the source folder.")
            }
            other => other.to_string(),
        }
    }
}
