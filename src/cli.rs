//! CLI definition and parsing.
//! Defines Args and provides parse() for command-line handling.
//!
//! Notes:
//! - Flags override values from the XML config file.
//! - --debug is a shorthand for --log-level debug.

use clap::{Parser, ValueHint};
use std::path::PathBuf;

use crate::config::types::{Config, LogLevel};
use crate::fs_ops::OnDuplicate;

/// Split a folder of PDFs into numbered output folders under a size limit.
#[derive(Parser, Debug, Clone)]
#[command(
    author,
    version,
    about = "Distribute files into output_001, output_002, ... folders that each stay under a size limit"
)]
pub struct Args {
    /// Folder scanned recursively for matching files.
    #[arg(long, short = 's', value_name = "DIR", value_hint = ValueHint::DirPath)]
    pub source: Option<PathBuf>,

    /// Folder that receives the numbered output folders (created if missing).
    #[arg(long, short = 'o', value_name = "DIR", value_hint = ValueHint::DirPath)]
    pub dest: Option<PathBuf>,

    /// Maximum size of one output folder, in MB (1 MB = 1048576 bytes).
    #[arg(
        long,
        short = 'l',
        value_name = "MB",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub limit_mb: Option<u64>,

    /// File name ending to match, case-insensitive (default ".pdf").
    #[arg(long, value_name = "SUFFIX")]
    pub suffix: Option<String>,

    /// What to do when an output folder already holds a file with the same name.
    #[arg(long, value_name = "POLICY", help = "On name clash: rename | overwrite | skip")]
    pub on_duplicate: Option<OnDuplicate>,

    /// Proceed without asking when source and destination are the same folder.
    #[arg(long, short = 'y')]
    pub yes: bool,

    /// Do not draw a progress bar; print log lines instead.
    #[arg(long)]
    pub no_progress: bool,

    /// Enable debug logging (equivalent to `--log-level debug`).
    #[arg(long, help = "Enable debug logging (shorthand for --log-level debug)")]
    pub debug: bool,

    /// Set log level. One of: quiet, normal, info, debug.
    #[arg(long, value_name = "LEVEL", help = "Set log level: quiet, normal, info, debug")]
    pub log_level: Option<LogLevel>,

    /// Also write logs to this file.
    #[arg(long, value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub log_file: Option<PathBuf>,

    /// Emit logs and the final report as JSON.
    #[arg(long, help = "Emit logs and the final report in structured JSON")]
    pub json: bool,

    /// Print where the config file is looked up (or PDF_SPLITTER_CONFIG if set), then exit.
    #[arg(long, help = "Print the config file location and exit")]
    pub print_config: bool,

    /// Write a commented template config file at the default location, then exit.
    #[arg(long, help = "Create a template config file and exit")]
    pub init_config: bool,
}

impl Args {
    /// Effective log level derived from flags.
    /// Precedence: --debug > --log-level value > None (use config default).
    pub fn effective_log_level(&self) -> Option<LogLevel> {
        if self.debug {
            return Some(LogLevel::Debug);
        }
        self.log_level.clone()
    }

    /// Apply CLI overrides to a loaded Config (in-place). No-ops for unset flags.
    pub fn apply_overrides(&self, cfg: &mut Config) {
        if let Some(src) = &self.source {
            cfg.source_dir = Some(src.clone());
        }
        if let Some(dest) = &self.dest {
            cfg.dest_dir = Some(dest.clone());
        }
        if let Some(mb) = self.limit_mb {
            cfg.set_limit_mb(mb);
        }
        if let Some(suffix) = self.suffix.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            cfg.suffix = suffix.to_string();
        }
        if let Some(policy) = self.on_duplicate {
            cfg.on_duplicate = policy;
        }
        if let Some(level) = self.effective_log_level() {
            cfg.log_level = level;
        }
        if let Some(lf) = &self.log_file {
            cfg.log_file = Some(lf.clone());
        }
    }
}

pub fn parse() -> Args {
    Args::parse()
}
