//! Config module.
//! Provides configuration types, default paths, XML loading, and validation.

pub mod paths;
pub mod types;
mod validate;
pub mod xml;

pub use paths::{default_config_path, default_log_path, path_has_symlink_ancestor};
pub use types::{Config, LogLevel, SplitJob};
pub use validate::same_location;
pub use xml::{create_template_config, load_config_from_xml_path, load_config_from_xml};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "PDF_SPLITTER_CONFIG";
/// Size limit applied when neither the config file nor the CLI sets one.
pub const DEFAULT_LIMIT_MB: u64 = 100;
/// Only files whose names end with this (case-insensitively) are distributed.
pub const DEFAULT_SUFFIX: &str = ".pdf";
