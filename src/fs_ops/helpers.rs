//! I/O helper utilities.
//!
//! Provides an adapter that enriches io::Error with the operation, the path and a
//! platform-aware hint, for use with `map_err` in anyhow::Result code paths:
//!
//!   fs::create_dir_all(dir).map_err(io_error_with_help("create bucket directory", dir))?;

use anyhow::anyhow;
use std::io;
use std::path::Path;

fn hint_for(e: &io::Error) -> Option<&'static str> {
    if let Some(code) = e.raw_os_error() {
        #[cfg(unix)]
        {
            return match code {
                libc::EACCES | libc::EPERM => Some("permission denied; check ownership and write permissions"),
                libc::EXDEV => Some("cross-filesystem; atomic rename not possible"),
                libc::EBUSY => Some("resource busy; ensure no other process is using the file"),
                libc::ENOENT => Some("path not found; it may have been moved or deleted meanwhile"),
                libc::ENOSPC => Some("insufficient space on device"),
                libc::EROFS => Some("read-only filesystem; cannot write here"),
                libc::ENAMETOOLONG => Some("filename or path too long"),
                libc::EISDIR => Some("a directory is in the way"),
                _ => None,
            };
        }
        #[cfg(windows)]
        {
            return match code {
                5 => Some("access denied; check permissions"),        // ERROR_ACCESS_DENIED
                17 => Some("not same device; cross-filesystem move"), // ERROR_NOT_SAME_DEVICE
                32 => Some("sharing violation; file is in use"),      // ERROR_SHARING_VIOLATION
                2 | 3 => Some("path not found; verify it exists"),    // FILE/PATH NOT FOUND
                112 => Some("insufficient disk space"),               // ERROR_DISK_FULL
                206 => Some("filename or path too long"),             // ERROR_FILENAME_EXCED_RANGE
                _ => None,
            };
        }
    }
    match e.kind() {
        io::ErrorKind::PermissionDenied => Some("permission denied; check ownership and write permissions"),
        io::ErrorKind::NotFound => Some("path not found; verify it exists"),
        io::ErrorKind::AlreadyExists => Some("already exists; remove it or pick another name"),
        _ => None,
    }
}

/// Format a human-friendly message with op/path plus a hint when one applies.
fn build_message(op: &str, path: &Path, e: &io::Error) -> String {
    let mut msg = format!("{} '{}': {}", op, path.display(), e);
    if let Some(hint) = hint_for(e) {
        msg.push_str(" (");
        msg.push_str(hint);
        msg.push(')');
    }
    msg
}

/// Returns a closure suitable for `.map_err(...)` that converts io::Error -> anyhow::Error.
pub fn io_error_with_help<'a>(
    op: &'a str,
    path: &'a Path,
) -> impl FnOnce(io::Error) -> anyhow::Error + 'a {
    move |e: io::Error| anyhow!(build_message(op, path, &e))
}
