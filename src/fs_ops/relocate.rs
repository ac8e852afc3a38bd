//! Relocation of a single file into a bucket directory.
//! Attempts an atomic rename; across filesystems falls back to copy into a temp
//! sibling, fsync, rename into place, then removal of the source.

use anyhow::Result;
use filetime::FileTime;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::errors::SplitError;

use super::duplicate::{OnDuplicate, resolve_destination};
use super::helpers::io_error_with_help;
use super::util::{fsync_dir, is_cross_device, unique_temp_path};

/// Moves one file into a directory, returning where it landed.
///
/// The allocator only talks to this trait, so callers can substitute their own
/// transport (or inject failures in tests).
pub trait Relocator: Send + Sync {
    fn relocate(&self, src: &Path, dest_dir: &Path) -> Result<PathBuf>;
}

/// Real filesystem relocation honouring a duplicate-name policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsRelocator {
    pub on_duplicate: OnDuplicate,
}

impl FsRelocator {
    pub fn new(on_duplicate: OnDuplicate) -> Self {
        Self { on_duplicate }
    }
}

impl Relocator for FsRelocator {
    fn relocate(&self, src: &Path, dest_dir: &Path) -> Result<PathBuf> {
        move_file_into(src, dest_dir, self.on_duplicate)
    }
}

/// Move `src` into `dest_dir`, keeping its base name (subject to `policy`).
pub fn move_file_into(src: &Path, dest_dir: &Path, policy: OnDuplicate) -> Result<PathBuf> {
    let name = src
        .file_name()
        .ok_or_else(|| SplitError::MissingFileName(src.to_path_buf()))?;
    let dest = resolve_destination(dest_dir, name, policy);

    if policy == OnDuplicate::Skip && dest.exists() {
        return Err(SplitError::DestinationExists(dest).into());
    }

    match fs::rename(src, &dest) {
        Ok(()) => {
            debug!(src = %src.display(), dest = %dest.display(), "renamed file");
            Ok(dest)
        }
        Err(e) if is_cross_device(&e) => {
            warn!(src = %src.display(), dest = %dest.display(), "cross-filesystem move; copying instead");
            copy_into_place(src, &dest, dest_dir)?;
            remove_source_or_roll_back(src, &dest, |p| fs::remove_file(p))?;
            Ok(dest)
        }
        Err(e) => Err(io_error_with_help("move file", src)(e)),
    }
}

/// Drop the source after a cross-device copy. If that fails, the copy is taken back out
/// so the file exists only at its original location.
fn remove_source_or_roll_back(
    src: &Path,
    dest: &Path,
    remove: impl FnOnce(&Path) -> io::Result<()>,
) -> Result<()> {
    if let Err(e) = remove(src) {
        if let Err(undo) = fs::remove_file(dest) {
            warn!(dest = %dest.display(), error = %undo, "could not remove copy after failed source removal");
        }
        return Err(io_error_with_help("remove original file", src)(e));
    }
    Ok(())
}

/// Copy into a temp sibling of `dest`, carry over mtime, fsync, then rename over `dest`.
/// The temp file is removed on failure.
fn copy_into_place(src: &Path, dest: &Path, dest_dir: &Path) -> Result<()> {
    let tmp = unique_temp_path(dest_dir);
    let result = (|| -> Result<()> {
        fs::copy(src, &tmp).map_err(io_error_with_help("copy file", src))?;
        if let Ok(meta) = fs::metadata(src) {
            let mtime = FileTime::from_last_modification_time(&meta);
            let _ = filetime::set_file_mtime(&tmp, mtime);
        }
        File::open(&tmp)
            .and_then(|f| f.sync_all())
            .map_err(io_error_with_help("sync copied file", &tmp))?;
        fs::rename(&tmp, dest).map_err(io_error_with_help("rename copied file into place", dest))?;
        Ok(())
    })();

    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    } else if let Err(e) = fsync_dir(dest_dir) {
        debug!(dir = %dest_dir.display(), error = %e, "fsync of bucket directory failed");
    }
    result
}
