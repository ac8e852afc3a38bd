//! Duplicate-name resolution inside a bucket.
//!
//! Two source files from different subfolders may share a base name and land in the
//! same bucket. Policy:
//! - Rename: pick "name (2).pdf", "name (3).pdf", ... until free (default).
//! - Overwrite: use the requested name; the later file replaces the earlier one.
//! - Skip: use the requested name; the caller leaves the source in place if it exists.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::trace;

use super::util::TEMP_PREFIX;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OnDuplicate {
    /// Pick a unique name by appending " (n)" before the extension.
    #[default]
    Rename,
    /// Use the requested name and replace whatever is there.
    Overwrite,
    /// Use the requested name; the move is refused if the path already exists.
    Skip,
}

impl fmt::Display for OnDuplicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OnDuplicate::Rename => "rename",
            OnDuplicate::Overwrite => "overwrite",
            OnDuplicate::Skip => "skip",
        })
    }
}

impl FromStr for OnDuplicate {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rename" | "suffix" => Ok(OnDuplicate::Rename),
            "overwrite" | "replace" => Ok(OnDuplicate::Overwrite),
            "skip" => Ok(OnDuplicate::Skip),
            other => Err(format!(
                "invalid duplicate policy: '{other}' (expected rename, overwrite or skip)"
            )),
        }
    }
}

/// Compute the destination path for `name` inside `dst_dir` according to `policy`.
pub fn resolve_destination(dst_dir: &Path, name: &OsStr, policy: OnDuplicate) -> PathBuf {
    let candidate = dst_dir.join(name);
    match policy {
        OnDuplicate::Skip | OnDuplicate::Overwrite => candidate,
        OnDuplicate::Rename => {
            // Never suffix our own transient names.
            if name.to_str().is_some_and(|s| s.starts_with(TEMP_PREFIX)) {
                return candidate;
            }
            if !candidate.exists() {
                return candidate;
            }
            unique_with_numeric_suffix(dst_dir, name)
        }
    }
}

/// Return a unique path by appending " (n)" before the extension until no collision.
///
/// - "scan.pdf" -> "scan (2).pdf", "scan (3).pdf", ...
/// - "archive.tar.pdf" -> "archive.tar (2).pdf"
/// - "README" -> "README (2)"
fn unique_with_numeric_suffix(dst_dir: &Path, name: &OsStr) -> PathBuf {
    let base = Path::new(name);
    let stem: OsString = base
        .file_stem()
        .map(|s| s.to_os_string())
        .unwrap_or_else(|| name.to_os_string());
    let ext: Option<OsString> = base.extension().map(|e| e.to_os_string());

    const MAX_TRIES: u64 = 10_000;
    for n in 2..=MAX_TRIES {
        let candidate = dst_dir.join(name_with_suffix(&stem, ext.as_deref(), &format!(" ({n})")));
        if !candidate.exists() {
            return candidate;
        }
        if n == 4 {
            trace!(name = ?name, dir = %dst_dir.display(), "duplicate: several collisions, still searching");
        }
    }
    // Directory is absurdly crowded with numbered variants.
    dst_dir.join(name_with_suffix(&stem, ext.as_deref(), " (final)"))
}

fn name_with_suffix(stem: &OsStr, ext: Option<&OsStr>, suffix: &str) -> OsString {
    let mut out = stem.to_os_string();
    out.push(suffix);
    if let Some(e) = ext {
        out.push(".");
        out.push(e);
    }
    out
}
