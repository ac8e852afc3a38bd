//! Largest-first greedy bucket filling.
//!
//! Files are sorted by size, descending (stable, so equal sizes keep discovery order),
//! then moved one at a time into the current bucket. A bucket is closed when it already
//! holds something and the next file would push it past the limit; a file larger than
//! the limit therefore ends up alone in a fresh bucket instead of failing the run.
//!
//! Per-file move failures are logged and skipped: the file stays where it was and does
//! not count toward the bucket total. Directory creation failures are fatal.

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::discovery::{FileRecord, bucket_dir_name};
use crate::errors::SplitError;
use crate::events::Notifier;
use crate::fs_ops::{Relocator, io_error_with_help};
use crate::report::{RunStats, format_mb};
use crate::shutdown::CancelToken;

/// One numbered output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket {
    /// 1-based, assigned in opening order without gaps
    pub index: usize,
    pub path: PathBuf,
    /// Sum of sizes of files successfully moved in (in-memory tally)
    pub accumulated_size: u64,
    /// Where each moved file landed, in move order
    pub files: Vec<PathBuf>,
}

impl Bucket {
    pub fn name(&self) -> String {
        bucket_dir_name(self.index)
    }
}

/// What an allocation pass did.
#[derive(Debug, Clone, Default)]
pub struct Allocation {
    /// Buckets in index order; the last one is the one that was open at the end
    pub buckets: Vec<Bucket>,
    pub stats: RunStats,
    /// True if the pass stopped early on a cancellation request
    pub cancelled: bool,
}

/// Sort by size, largest first. Stable: equal sizes keep their relative order.
pub fn sort_largest_first(files: &mut [FileRecord]) {
    files.sort_by(|a, b| b.size.cmp(&a.size));
}

pub struct Allocator<'a> {
    dest_root: &'a Path,
    limit: u64,
    relocator: &'a dyn Relocator,
    cancel: CancelToken,
}

impl<'a> Allocator<'a> {
    pub fn new(dest_root: &'a Path, limit: u64, relocator: &'a dyn Relocator) -> Self {
        Self {
            dest_root,
            limit,
            relocator,
            cancel: CancelToken::new(),
        }
    }

    /// Check `token` before each file and stop early once it is cancelled.
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Distribute `files` into buckets under the destination root, which must exist.
    pub fn run(&self, mut files: Vec<FileRecord>, notify: &Notifier<'_>) -> Result<Allocation> {
        if self.limit == 0 {
            return Err(SplitError::InvalidLimit(self.limit).into());
        }

        let total = files.len();
        notify.log("Sorting files by size (largest first)...");
        sort_largest_first(&mut files);

        let mut out = Allocation {
            stats: RunStats {
                discovered: total,
                ..RunStats::default()
            },
            ..Allocation::default()
        };

        let first = self.open_bucket(1, notify)?;
        notify.log(format!("Created initial output folder: {}", first.name()));
        notify.status(format!("Moving into '{}' ({})", first.name(), format_mb(0)));
        out.buckets.push(first);

        for (done, file) in files.iter().enumerate() {
            if self.cancel.is_cancelled() {
                notify.warn(format!(
                    "Cancellation requested; stopping after {done} of {total} files."
                ));
                out.cancelled = true;
                break;
            }

            let needs_new = {
                let current = current(&out.buckets);
                current.accumulated_size > 0
                    && current.accumulated_size.saturating_add(file.size) > self.limit
            };
            if needs_new {
                let closing = current(&out.buckets);
                notify.log(format!(
                    "Limit of {} reached for '{}'. Final size of this folder: {}",
                    format_mb(self.limit),
                    closing.name(),
                    format_mb(closing.accumulated_size)
                ));
                info!(bucket = %closing.name(), bytes = closing.accumulated_size, "bucket closed");
                let next = self.open_bucket(closing.index + 1, notify)?;
                notify.log(format!("Created new output folder: {}", next.name()));
                notify.status(format!("Switched to new folder '{}' ({})", next.name(), format_mb(0)));
                out.buckets.push(next);
            }

            let name = file.display_name();
            let bucket = current_mut(&mut out.buckets);
            notify.log(format!(
                "Moving '{}' ({}) to '{}'",
                name,
                format_mb(file.size),
                bucket.name()
            ));
            match self.relocator.relocate(&file.path, &bucket.path) {
                Ok(dest) => {
                    bucket.accumulated_size = bucket.accumulated_size.saturating_add(file.size);
                    bucket.files.push(dest);
                    out.stats.moved += 1;
                    debug!(file = %file.path.display(), bucket = %bucket.name(), bytes = file.size, "moved");
                    notify.status(format!(
                        "Moved '{}' ({} in '{}')",
                        name,
                        format_mb(bucket.accumulated_size),
                        bucket.name()
                    ));
                }
                Err(e) => {
                    out.stats.failed += 1;
                    notify.warn(format!("Failed to move '{name}': {e:#}"));
                    notify.status(format!("Failed to move '{name}'"));
                }
            }

            notify.progress(done + 1, total);
        }

        Ok(out)
    }

    fn open_bucket(&self, index: usize, notify: &Notifier<'_>) -> Result<Bucket> {
        let path = self.dest_root.join(bucket_dir_name(index));
        if path.is_dir() {
            notify.warn(format!(
                "Output folder '{}' already exists; its current contents will be counted in the final sizes.",
                bucket_dir_name(index)
            ));
        }
        fs::create_dir_all(&path).map_err(io_error_with_help("create output folder", &path))?;
        Ok(Bucket {
            index,
            path,
            accumulated_size: 0,
            files: Vec::new(),
        })
    }
}

// The bucket list is never empty once `run` has opened bucket 1.
fn current(buckets: &[Bucket]) -> &Bucket {
    &buckets[buckets.len() - 1]
}

fn current_mut(buckets: &mut [Bucket]) -> &mut Bucket {
    let last = buckets.len() - 1;
    &mut buckets[last]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{NullSink, Recorder};
    use crate::fs_ops::FsRelocator;
    use std::sync::Mutex;

    /// Relocator that only records calls; nothing touches the disk.
    #[derive(Default)]
    struct Ledger {
        calls: Mutex<Vec<(PathBuf, PathBuf)>>,
        fail_on: Vec<&'static str>,
    }

    impl Relocator for Ledger {
        fn relocate(&self, src: &Path, dest_dir: &Path) -> Result<PathBuf> {
            let name = src.file_name().unwrap().to_string_lossy().into_owned();
            if self.fail_on.contains(&name.as_str()) {
                anyhow::bail!("injected failure for {name}");
            }
            self.calls.lock().unwrap().push((src.to_path_buf(), dest_dir.to_path_buf()));
            Ok(dest_dir.join(name))
        }
    }

    fn rec(name: &str, size: u64) -> FileRecord {
        FileRecord {
            path: PathBuf::from("/src").join(name),
            size,
        }
    }

    fn sizes(a: &Allocation) -> Vec<u64> {
        a.buckets.iter().map(|b| b.accumulated_size).collect()
    }

    #[test]
    fn sort_is_stable_for_equal_sizes() {
        let mut files = vec![rec("a", 5), rec("b", 9), rec("c", 5), rec("d", 9)];
        sort_largest_first(&mut files);
        let order: Vec<_> = files.iter().map(|f| f.display_name()).collect();
        assert_eq!(order, vec!["b", "d", "a", "c"]);
    }

    #[test]
    fn greedy_fill_matches_worked_example() {
        let td = tempfile::tempdir().unwrap();
        let ledger = Ledger::default();
        let files = vec![rec("a", 50), rec("b", 30), rec("c", 40), rec("d", 10)];
        let alloc = Allocator::new(td.path(), 100, &ledger)
            .run(files, &Notifier::new(&NullSink))
            .unwrap();
        assert_eq!(sizes(&alloc), vec![90, 40]);
        assert_eq!(alloc.buckets[0].files.len(), 2);
        assert_eq!(alloc.buckets[1].name(), "output_002");
        assert!(td.path().join("output_002").is_dir());
    }

    #[test]
    fn oversized_file_sits_alone() {
        let td = tempfile::tempdir().unwrap();
        let ledger = Ledger::default();
        let files = vec![rec("small", 10), rec("huge", 500), rec("mid", 60)];
        let alloc = Allocator::new(td.path(), 100, &ledger)
            .run(files, &Notifier::new(&NullSink))
            .unwrap();
        // huge alone, then 60 + 10
        assert_eq!(sizes(&alloc), vec![500, 70]);
    }

    #[test]
    fn failed_move_does_not_count_and_progress_still_advances() {
        let td = tempfile::tempdir().unwrap();
        let ledger = Ledger {
            fail_on: vec!["b"],
            ..Ledger::default()
        };
        let recorder = Recorder::new();
        let files = vec![rec("a", 60), rec("b", 30), rec("c", 30)];
        let alloc = Allocator::new(td.path(), 100, &ledger)
            .run(files, &Notifier::new(&recorder))
            .unwrap();
        // b failed, so c still fits next to a
        assert_eq!(sizes(&alloc), vec![90]);
        assert_eq!(alloc.stats.moved, 2);
        assert_eq!(alloc.stats.failed, 1);
        assert_eq!(recorder.progress(), vec![33, 66, 100]);
        assert!(recorder.log_lines().iter().any(|l| l.contains("Failed to move 'b'")));
    }

    #[test]
    fn empty_bucket_is_never_closed() {
        let td = tempfile::tempdir().unwrap();
        let ledger = Ledger {
            fail_on: vec!["first"],
            ..Ledger::default()
        };
        let files = vec![rec("first", 300), rec("second", 200)];
        let alloc = Allocator::new(td.path(), 100, &ledger)
            .run(files, &Notifier::new(&NullSink))
            .unwrap();
        assert_eq!(alloc.buckets.len(), 1);
        assert_eq!(sizes(&alloc), vec![200]);
    }

    #[test]
    fn cancelled_token_stops_before_first_file() {
        let td = tempfile::tempdir().unwrap();
        let ledger = Ledger::default();
        let token = CancelToken::new();
        token.cancel();
        let alloc = Allocator::new(td.path(), 100, &ledger)
            .with_cancel(token)
            .run(vec![rec("a", 1)], &Notifier::new(&NullSink))
            .unwrap();
        assert!(alloc.cancelled);
        assert_eq!(alloc.stats.moved, 0);
        assert!(ledger.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn zero_limit_is_rejected() {
        let td = tempfile::tempdir().unwrap();
        let err = Allocator::new(td.path(), 0, &FsRelocator::default())
            .run(vec![rec("a", 1)], &Notifier::new(&NullSink))
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SplitError>(),
            Some(SplitError::InvalidLimit(0))
        ));
    }
}
