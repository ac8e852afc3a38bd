//! Terminal result of a split run and small size-formatting helpers.

use serde::Serialize;

/// Bytes per megabyte as used for limits and display (binary megabyte).
pub const BYTES_PER_MB: u64 = 1024 * 1024;

/// Verified on-disk size of one bucket directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BucketSize {
    /// Directory name, e.g. `output_001`.
    pub name: String,
    pub bytes: u64,
}

/// File counters for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub discovered: usize,
    pub moved: usize,
    pub failed: usize,
}

/// Outcome reported exactly once at the end of a run.
///
/// `bucket_sizes` is in bucket-index order. It is empty for precondition and fatal
/// failures; a cancelled run reports the buckets created so far.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunResult {
    pub success: bool,
    pub message: String,
    pub bucket_sizes: Vec<BucketSize>,
    pub stats: RunStats,
}

impl RunResult {
    pub fn completed(message: impl Into<String>, bucket_sizes: Vec<BucketSize>, stats: RunStats) -> Self {
        Self {
            success: true,
            message: message.into(),
            bucket_sizes,
            stats,
        }
    }

    /// Failure without any bucket report.
    pub fn failed(message: impl Into<String>, stats: RunStats) -> Self {
        Self {
            success: false,
            message: message.into(),
            bucket_sizes: Vec::new(),
            stats,
        }
    }

    /// Verified size for a bucket by directory name.
    pub fn bucket(&self, name: &str) -> Option<u64> {
        self.bucket_sizes.iter().find(|b| b.name == name).map(|b| b.bytes)
    }

    pub fn total_bytes(&self) -> u64 {
        self.bucket_sizes.iter().map(|b| b.bytes).sum()
    }
}

/// Bytes as megabytes, for display.
pub fn as_mb(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_MB as f64
}

/// "12.34 MB"
pub fn format_mb(bytes: u64) -> String {
    format!("{:.2} MB", as_mb(bytes))
}
