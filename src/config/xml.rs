//! XML configuration support.
//! - Loads settings from config.xml (quick_xml + serde).
//! - Writes a commented template on request.
//!
//! Notes:
//! - This module only reads/writes the config file; folder validation happens elsewhere.
//! - Unknown XML fields are an error so typos surface instead of being ignored.

use anyhow::{Context, Result, bail};
use quick_xml::de::from_str as from_xml_str;
use serde::Deserialize;
use serde::de::Error as _;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::paths::{default_config_path, default_log_path, path_has_symlink_ancestor};
use super::{DEFAULT_LIMIT_MB, DEFAULT_SUFFIX};

use crate::config::types::{Config, LogLevel};
use crate::fs_ops::OnDuplicate;
use crate::platform::{set_dir_mode_0700, write_new_file_0600};

/// Struct mirroring the XML config for deserialization.
#[derive(Debug, Deserialize)]
#[serde(rename = "config")]
#[serde(deny_unknown_fields)]
struct XmlConfig {
    #[serde(rename = "source_dir")]
    source_dir: Option<String>,
    #[serde(rename = "dest_dir")]
    dest_dir: Option<String>,
    /// Bucket capacity in megabytes
    #[serde(rename = "limit_mb", default, deserialize_with = "de_u64_trimmed_opt")]
    limit_mb: Option<u64>,
    #[serde(rename = "suffix")]
    suffix: Option<String>,
    #[serde(rename = "on_duplicate")]
    on_duplicate: Option<String>,
    #[serde(rename = "log_level")]
    log_level: Option<String>,
    #[serde(rename = "log_file")]
    log_file: Option<String>,
}

// Optional u64 with surrounding whitespace trimmed. Blank means absent; anything
// else that is not a number is an error.
fn de_u64_trimmed_opt<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    match opt.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s
            .parse::<u64>()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("<limit_mb> must be a whole number of MB, got '{s}'"))),
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

// Map XmlConfig -> Config, leaving defaults for anything absent.
fn xml_to_config(parsed: XmlConfig) -> Result<Config> {
    let mut cfg = Config::default();

    cfg.source_dir = non_empty(parsed.source_dir.as_deref()).map(PathBuf::from);
    cfg.dest_dir = non_empty(parsed.dest_dir.as_deref()).map(PathBuf::from);
    cfg.log_file = non_empty(parsed.log_file.as_deref()).map(PathBuf::from);

    if let Some(mb) = parsed.limit_mb {
        if mb == 0 {
            bail!("<limit_mb> must be greater than zero");
        }
        cfg.set_limit_mb(mb);
    }
    if let Some(s) = non_empty(parsed.suffix.as_deref()) {
        cfg.suffix = s.to_string();
    }
    if let Some(s) = non_empty(parsed.on_duplicate.as_deref()) {
        cfg.on_duplicate = s.parse::<OnDuplicate>().map_err(anyhow::Error::msg)?;
    }
    if let Some(s) = non_empty(parsed.log_level.as_deref()) {
        cfg.log_level = s.parse::<LogLevel>().map_err(anyhow::Error::msg)?;
    }

    Ok(cfg)
}

/// Load a Config from a specific XML file path.
pub fn load_config_from_xml_path(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("read config xml '{}'", path.display()))?;
    let parsed: XmlConfig = from_xml_str(&contents)
        .with_context(|| format!("parse config xml '{}'", path.display()))?;
    xml_to_config(parsed).with_context(|| format!("invalid config xml '{}'", path.display()))
}

/// Load the config file from its default location (or `$PDF_SPLITTER_CONFIG`).
/// Returns Ok(None) when no file exists there.
pub fn load_config_from_xml() -> Result<Option<Config>> {
    let Some(path) = default_config_path() else {
        return Ok(None);
    };
    if !path.exists() {
        debug!(path = %path.display(), "no config file; using defaults");
        return Ok(None);
    }
    let cfg = load_config_from_xml_path(&path)?;
    debug!(path = %path.display(), "loaded config file");
    Ok(Some(cfg))
}

/// Create a commented template config file and its parent directory.
/// Refuses to write through symlinked ancestors or over an existing file.
pub fn create_template_config(path: &Path) -> Result<()> {
    if path_has_symlink_ancestor(path)? {
        bail!(
            "Refusing to create config: ancestor of {} is a symlink",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
        let _ = set_dir_mode_0700(parent);
    }

    let suggested_log = default_log_path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "/path/to/pdf_splitter.log".into());

    let content = format!(
        "<!--\n  pdf_splitter configuration (XML)\n\n    source_dir    -> folder scanned (recursively) for matching files\n    dest_dir      -> folder receiving output_001, output_002, ...\n    limit_mb      -> maximum size of one output folder in MB (1 MB = 1048576 bytes)\n    suffix        -> file name ending to match, case-insensitive\n    on_duplicate  -> rename | overwrite | skip (name clash inside an output folder)\n    log_level     -> quiet | normal | info | debug\n    log_file      -> path to log file (optional)\n\n  CLI flags override XML values.\n-->\n<config>\n  <source_dir></source_dir>\n  <dest_dir></dest_dir>\n  <limit_mb>{}</limit_mb>\n  <suffix>{}</suffix>\n  <on_duplicate>{}</on_duplicate>\n  <log_level>normal</log_level>\n  <log_file>{}</log_file>\n</config>\n",
        DEFAULT_LIMIT_MB,
        DEFAULT_SUFFIX,
        OnDuplicate::default(),
        suggested_log
    );

    write_new_file_0600(path, content.as_bytes())
        .with_context(|| format!("write template config '{}'", path.display()))?;

    info!("Created template config at {}", path.display());
    Ok(())
}
