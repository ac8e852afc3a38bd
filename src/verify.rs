//! Verification pass: bucket sizes measured from disk, not from the in-memory tally.

use anyhow::Result;
use std::fs;
use std::io;
use std::path::Path;
use tracing::debug;

use crate::allocator::Bucket;
use crate::events::Notifier;
use crate::fs_ops::io_error_with_help;
use crate::report::{BucketSize, format_mb};

/// Sum of sizes of the regular files directly inside `dir` (not recursive).
/// A missing directory measures as 0.
pub fn measure_dir(dir: &Path) -> Result<u64> {
    let entries = match fs::read_dir(dir) {
        Ok(it) => it,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(io_error_with_help("list output folder", dir)(e)),
    };

    let mut total = 0u64;
    for entry in entries {
        let entry = entry.map_err(io_error_with_help("list output folder", dir))?;
        let path = entry.path();
        match fs::metadata(&path) {
            Ok(meta) if meta.is_file() => total = total.saturating_add(meta.len()),
            Ok(_) => {}
            // Vanished or dangling entries are simply not there.
            Err(e) => debug!(path = %path.display(), error = %e, "skipping unreadable entry"),
        }
    }
    Ok(total)
}

/// Re-measure every bucket and report the results in bucket-index order.
pub fn verify_buckets(buckets: &[Bucket], notify: &Notifier<'_>) -> Result<Vec<BucketSize>> {
    notify.log("Verifying final folder sizes on disk...");
    let mut report = Vec::with_capacity(buckets.len());
    for bucket in buckets {
        let bytes = measure_dir(&bucket.path)?;
        if bytes != bucket.accumulated_size {
            notify.warn(format!(
                "'{}' holds {} on disk, expected {}",
                bucket.name(),
                format_mb(bytes),
                format_mb(bucket.accumulated_size)
            ));
        }
        report.push(BucketSize {
            name: bucket.name(),
            bytes,
        });
    }
    Ok(report)
}
