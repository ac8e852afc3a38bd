//! Discovery: recursive scan of the source tree for files with a given suffix.
//!
//! The whole tree is walked and materialised into a `Vec<FileRecord>` before any file
//! is moved. Size lookups that fail (broken symlink, permission denied) and unreadable
//! subtrees are reported as warnings and skipped.

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

use crate::errors::SplitError;
use crate::events::Notifier;
use crate::report::format_mb;

/// A matching file and its size at discovery time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Absolute path
    pub path: PathBuf,
    /// Size in bytes
    pub size: u64,
}

impl FileRecord {
    /// Base name for log messages.
    pub fn display_name(&self) -> String {
        display_name(&self.path)
    }
}

pub(crate) fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Prefix of bucket directory names: `output_001`, `output_002`, ...
pub const BUCKET_PREFIX: &str = "output_";

/// Name of the bucket directory with the given 1-based index.
pub fn bucket_dir_name(index: usize) -> String {
    format!("{BUCKET_PREFIX}{index:03}")
}

/// True for names shaped like a bucket directory (`output_` + at least three digits).
pub fn is_bucket_dir_name(name: &str) -> bool {
    name.strip_prefix(BUCKET_PREFIX)
        .is_some_and(|digits| digits.len() >= 3 && digits.bytes().all(|b| b.is_ascii_digit()))
}

/// Case-insensitive suffix match on the file name.
pub fn matches_suffix(name: &str, suffix: &str) -> bool {
    name.to_lowercase().ends_with(&suffix.to_lowercase())
}

/// Scanner configuration.
#[derive(Debug, Clone)]
pub struct Discovery {
    source: PathBuf,
    suffix: String,
    /// Destination root whose bucket directories must not be scanned
    bucket_root: Option<PathBuf>,
}

impl Discovery {
    pub fn new(source: impl Into<PathBuf>, suffix: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            suffix: suffix.into(),
            bucket_root: None,
        }
    }

    /// Skip `output_NNN` directories directly under `dest` when they sit inside the source tree.
    pub fn excluding_buckets_of(mut self, dest: impl AsRef<Path>) -> Self {
        let dest = dest.as_ref();
        self.bucket_root = Some(dunce::canonicalize(dest).unwrap_or_else(|_| dest.to_path_buf()));
        self
    }

    /// Walk the tree. Fails with `SourceNotFound` if the source is not a directory.
    pub fn scan(&self, notify: &Notifier<'_>) -> Result<Vec<FileRecord>> {
        if !self.source.is_dir() {
            return Err(SplitError::SourceNotFound(self.source.clone()).into());
        }
        let root = dunce::canonicalize(&self.source)
            .map_err(crate::fs_ops::io_error_with_help("resolve source folder", &self.source))?;

        let mut found = Vec::new();
        // Sorted walk keeps the order, and so the allocation, stable across runs.
        let walker = WalkDir::new(&root)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !self.is_excluded_bucket(e));

        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    let at = e
                        .path()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| root.display().to_string());
                    notify.warn(format!("Warning: cannot read '{at}': {e}. Skipping."));
                    continue;
                }
            };
            if entry.file_type().is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if !matches_suffix(&name, &self.suffix) {
                continue;
            }
            // Follow symlinks for the size, like a plain stat of the path would.
            match fs::metadata(entry.path()) {
                Ok(meta) if meta.is_file() => {
                    let record = FileRecord {
                        path: entry.into_path(),
                        size: meta.len(),
                    };
                    notify.log(format!(
                        "Found: '{}' ({})",
                        record.display_name(),
                        format_mb(record.size)
                    ));
                    found.push(record);
                }
                Ok(_) => {}
                Err(e) => {
                    notify.warn(format!(
                        "Warning: failed to get the size of '{name}': {e}. Skipping this file."
                    ));
                }
            }
        }
        Ok(found)
    }

    fn is_excluded_bucket(&self, entry: &DirEntry) -> bool {
        let Some(bucket_root) = &self.bucket_root else {
            return false;
        };
        entry.file_type().is_dir()
            && is_bucket_dir_name(&entry.file_name().to_string_lossy())
            && entry.path().parent() == Some(bucket_root.as_path())
    }
}
