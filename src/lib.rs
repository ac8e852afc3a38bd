//! Core library for `pdf_splitter`.
//!
//! Distributes the files of a source tree into numbered output folders
//! (`output_001`, `output_002`, ...) so that no folder exceeds a size limit,
//! filling largest files first.
//!
//! Pipeline: [`discovery`] -> [`allocator`] -> [`verify`], wrapped by [`runner`],
//! which turns every outcome into exactly one final [`events::Event::Finished`].
//!
//! ```no_run
//! use pdf_splitter::{CancelToken, FsRelocator, Recorder, SplitJob, run_job};
//!
//! let job = SplitJob::new("/scans", "/scans-split", 100 * 1024 * 1024);
//! let events = Recorder::new();
//! let result = run_job(&job, &FsRelocator::default(), &CancelToken::new(), &events);
//! println!("{}: {:?}", result.message, result.bucket_sizes);
//! ```

pub mod allocator;
pub mod cli;
pub mod config;
pub mod discovery;
pub mod errors;
pub mod events;
pub mod fs_ops;
pub mod output;
pub mod platform;
pub mod report;
pub mod runner;
pub mod shutdown;
pub mod verify;

pub use allocator::{Allocation, Allocator, Bucket};
pub use config::{Config, LogLevel, SplitJob, default_config_path, default_log_path, path_has_symlink_ancestor};
pub use discovery::{Discovery, FileRecord};
pub use errors::SplitError;
pub use events::{Event, EventSink, FnSink, Notifier, NullSink, Recorder};
pub use fs_ops::{FsRelocator, OnDuplicate, Relocator};
pub use report::{BucketSize, RunResult, RunStats};
pub use runner::{RunState, Supervisor, run_job};
pub use shutdown::CancelToken;
