//! Job validation logic.
//! Verifies the size limit, the source folder, and the destination folder shape.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, error};

use crate::errors::SplitError;

use super::types::SplitJob;

impl SplitJob {
    /// Check the preconditions of a run without touching the filesystem.
    ///
    /// - size_limit must be positive.
    /// - source_dir must exist and be a directory.
    /// - dest_dir, if it exists, must be a directory.
    pub fn validate(&self) -> Result<()> {
        if self.size_limit == 0 {
            error!(code = "E_INVALID_LIMIT", "size limit is zero");
            return Err(SplitError::InvalidLimit(self.size_limit).into());
        }
        if !self.source_dir.is_dir() {
            error!(path = %self.source_dir.display(), "source folder missing or not a directory");
            return Err(SplitError::SourceNotFound(self.source_dir.clone()).into());
        }
        fs::read_dir(&self.source_dir).with_context(|| {
            format!(
                "Cannot read source folder '{}'; check permissions",
                self.source_dir.display()
            )
        })?;
        if self.dest_dir.exists() && !self.dest_dir.is_dir() {
            error!(path = %self.dest_dir.display(), "destination exists but isn't a directory");
            return Err(SplitError::DestinationNotDirectory(self.dest_dir.clone()).into());
        }
        debug!(
            source = %self.source_dir.display(),
            dest = %self.dest_dir.display(),
            limit = self.size_limit,
            "job validated"
        );
        Ok(())
    }

    /// True when source and destination resolve to the same folder.
    pub fn is_in_place(&self) -> bool {
        same_location(&self.source_dir, &self.dest_dir)
    }
}

/// Compare two paths after resolving symlinks; paths that cannot be resolved
/// (e.g. not yet created) are compared as given.
pub fn same_location(a: &Path, b: &Path) -> bool {
    let a_real = dunce::canonicalize(a).unwrap_or_else(|_| a.to_path_buf());
    let b_real = dunce::canonicalize(b).unwrap_or_else(|_| b.to_path_buf());
    a_real == b_real
}
