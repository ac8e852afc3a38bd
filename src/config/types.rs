//! Core configuration types.
//! - Config holds runtime settings with sensible defaults.
//! - SplitJob is the subset the splitting core consumes.
//! - LogLevel represents verbosity with simple parsing helpers.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use super::{DEFAULT_LIMIT_MB, DEFAULT_SUFFIX};
use crate::fs_ops::OnDuplicate;
use crate::report::BYTES_PER_MB;

/// Program-defined verbosity levels exposed to users/config.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Only errors
    Quiet,
    /// Informational output (default)
    #[default]
    Normal,
    /// More info (like verbose)
    Info,
    /// Debug/trace
    Debug,
}

impl LogLevel {
    /// Parse common string names into our LogLevel (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "quiet" | "error" | "none" => Some(LogLevel::Quiet),
            "normal" => Some(LogLevel::Normal),
            "info" | "verbose" | "detailed" => Some(LogLevel::Info),
            "debug" | "trace" => Some(LogLevel::Debug),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Quiet => "quiet",
            LogLevel::Normal => "normal",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        };
        f.write_str(s)
    }
}

impl FromStr for LogLevel {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("invalid log level: '{s}'"))
    }
}

/// Input of one split run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitJob {
    /// Tree scanned for matching files
    pub source_dir: PathBuf,
    /// Root under which `output_NNN` buckets are created
    pub dest_dir: PathBuf,
    /// Capacity of one bucket in bytes
    pub size_limit: u64,
    /// Case-insensitive file name suffix filter
    pub suffix: String,
    /// What to do when a bucket already holds a file with the same name
    pub on_duplicate: OnDuplicate,
}

impl SplitJob {
    pub fn new(source_dir: impl Into<PathBuf>, dest_dir: impl Into<PathBuf>, size_limit: u64) -> Self {
        Self {
            source_dir: source_dir.into(),
            dest_dir: dest_dir.into(),
            size_limit,
            suffix: DEFAULT_SUFFIX.to_string(),
            on_duplicate: OnDuplicate::default(),
        }
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    pub fn with_on_duplicate(mut self, policy: OnDuplicate) -> Self {
        self.on_duplicate = policy;
        self
    }
}

/// Runtime configuration used by the binary.
#[derive(Debug, Clone)]
pub struct Config {
    /// Folder holding the files to distribute
    pub source_dir: Option<PathBuf>,
    /// Folder receiving the numbered buckets
    pub dest_dir: Option<PathBuf>,
    /// Bucket capacity in bytes
    pub size_limit: u64,
    pub suffix: String,
    pub on_duplicate: OnDuplicate,
    /// Console verbosity
    pub log_level: LogLevel,
    /// Optional path to a log file
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_dir: None,
            dest_dir: None,
            size_limit: DEFAULT_LIMIT_MB * BYTES_PER_MB,
            suffix: DEFAULT_SUFFIX.to_string(),
            on_duplicate: OnDuplicate::default(),
            log_level: LogLevel::Normal,
            log_file: None,
        }
    }
}

impl Config {
    /// Set the size limit from a megabyte count.
    pub fn set_limit_mb(&mut self, mb: u64) {
        self.size_limit = mb.saturating_mul(BYTES_PER_MB);
    }

    /// Build the job for the splitting core; both folders must be configured.
    pub fn job(&self) -> anyhow::Result<SplitJob> {
        let source = self
            .source_dir
            .clone()
            .ok_or_else(|| anyhow::anyhow!("no source folder configured; pass --source or set <source_dir>"))?;
        let dest = self
            .dest_dir
            .clone()
            .ok_or_else(|| anyhow::anyhow!("no destination folder configured; pass --dest or set <dest_dir>"))?;
        Ok(SplitJob {
            source_dir: source,
            dest_dir: dest,
            size_limit: self.size_limit,
            suffix: self.suffix.clone(),
            on_duplicate: self.on_duplicate,
        })
    }
}
