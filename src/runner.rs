//! Run orchestration.
//!
//! `run_job` is the single top-level boundary of a split: validation, discovery,
//! allocation and verification happen inside it, and every outcome (including fatal
//! errors) becomes exactly one `Finished` event, emitted last.
//!
//! `Supervisor` runs a job on a background thread so a front end stays responsive,
//! owns the `RunState`, and hands out the event stream.

use anyhow::{Context, Result};
use std::any::Any;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use tracing::{error, info};

use crate::allocator::Allocator;
use crate::config::SplitJob;
use crate::discovery::Discovery;
use crate::errors::SplitError;
use crate::events::{EventSink, Notifier};
use crate::fs_ops::{FsRelocator, Relocator, io_error_with_help};
use crate::report::{RunResult, RunStats, format_mb};
use crate::shutdown::CancelToken;
use crate::verify::verify_buckets;

/// Lifecycle of the supervised run, for front ends to derive their affordances from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    Idle,
    Running,
    Completed,
    Failed,
}

/// Run `job` to completion on the calling thread and emit its events into `sink`.
/// The returned result is the same one carried by the final `Finished` event.
pub fn run_job(
    job: &SplitJob,
    relocator: &dyn Relocator,
    cancel: &CancelToken,
    sink: &dyn EventSink,
) -> RunResult {
    let notify = Notifier::new(sink);
    let result = outcome(job, relocator, cancel, &notify);
    notify.finished(result.clone());
    result
}

/// Everything but the final notification; never fails, errors become a failed result.
fn outcome(job: &SplitJob, relocator: &dyn Relocator, cancel: &CancelToken, notify: &Notifier<'_>) -> RunResult {
    match execute(job, relocator, cancel, notify) {
        Ok(result) => result,
        Err(e) => failure(&e, notify),
    }
}

fn execute(
    job: &SplitJob,
    relocator: &dyn Relocator,
    cancel: &CancelToken,
    notify: &Notifier<'_>,
) -> Result<RunResult> {
    notify.log("Starting file split...");
    notify.status("Validating folders and searching for files...");
    job.validate()?;

    if job.dest_dir.is_dir() {
        notify.log(format!("Destination folder already exists: {}", job.dest_dir.display()));
    } else {
        fs::create_dir_all(&job.dest_dir)
            .map_err(io_error_with_help("create destination folder", &job.dest_dir))?;
        notify.status(format!("Created destination folder: {}", job.dest_dir.display()));
        notify.log(format!("Created destination folder: {}", job.dest_dir.display()));
    }
    if job.is_in_place() {
        notify.warn("Source and destination are the same folder; existing output folders will not be rescanned.");
    }

    notify.log(format!(
        "Searching for '{}' files in '{}'...",
        job.suffix,
        job.source_dir.display()
    ));
    let files = Discovery::new(&job.source_dir, &job.suffix)
        .excluding_buckets_of(&job.dest_dir)
        .scan(notify)?;
    if files.is_empty() {
        return Err(SplitError::NoFilesFound {
            source_dir: job.source_dir.clone(),
            suffix: job.suffix.clone(),
        }
        .into());
    }
    notify.log(format!("Found {} matching files in total.", files.len()));

    let allocation = Allocator::new(&job.dest_dir, job.size_limit, relocator)
        .with_cancel(cancel.clone())
        .run(files, notify)?;

    let sizes = verify_buckets(&allocation.buckets, notify)?;
    let stats = allocation.stats;
    info!(
        buckets = sizes.len(),
        moved = stats.moved,
        failed = stats.failed,
        cancelled = allocation.cancelled,
        "split finished"
    );

    if allocation.cancelled {
        let processed = stats.moved + stats.failed;
        return Ok(RunResult {
            success: false,
            message: format!("Cancelled after {processed} of {} files.", stats.discovered),
            bucket_sizes: sizes,
            stats,
        });
    }

    notify.log("All files have been processed.");
    let message = if stats.failed == 0 {
        "File split complete!".to_string()
    } else {
        format!("File split complete with {} failed move(s).", stats.failed)
    };
    Ok(RunResult::completed(message, sizes, stats))
}

fn failure(e: &anyhow::Error, notify: &Notifier<'_>) -> RunResult {
    if let Some(se) = e.downcast_ref::<SplitError>() {
        error!(code = se.code(), error = %se, "run aborted");
        match se {
            SplitError::SourceNotFound(p) => notify.log(format!(
                "Error: source folder '{}' was not found or is not a directory.",
                p.display()
            )),
            SplitError::NoFilesFound { suffix, .. } => {
                notify.log(format!("No '{suffix}' files were found in the source folder."))
            }
            other => notify.log(format!("Error: {other}")),
        }
        return RunResult::failed(se.user_message(), RunStats::default());
    }
    error!(error = ?e, "run failed");
    notify.log(format!("A fatal error occurred during the run: {e:#}"));
    RunResult::failed(format!("An error occurred: {e:#}"), RunStats::default())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    }
}

/// Owns one background run at a time.
#[derive(Default)]
pub struct Supervisor {
    state: Arc<Mutex<RunState>>,
    cancel: CancelToken,
    worker: Option<JoinHandle<RunResult>>,
}

impl Supervisor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> RunState {
        self.state.lock().map(|s| *s).unwrap_or(RunState::Failed)
    }

    /// Start `job` with real filesystem moves. See [`Supervisor::start_with`].
    pub fn start(&mut self, job: SplitJob) -> Result<Receiver<crate::events::Event>> {
        let relocator = Arc::new(FsRelocator::new(job.on_duplicate));
        self.start_with(job, relocator)
    }

    /// Spawn the run on a worker thread and return its event stream. The stream ends
    /// after the `Finished` event. Fails if a run is already in progress.
    pub fn start_with(
        &mut self,
        job: SplitJob,
        relocator: Arc<dyn Relocator>,
    ) -> Result<Receiver<crate::events::Event>> {
        {
            let mut state = self
                .state
                .lock()
                .map_err(|_| anyhow::anyhow!("run state lock poisoned"))?;
            if *state == RunState::Running {
                return Err(SplitError::AlreadyRunning.into());
            }
            *state = RunState::Running;
        }
        // Reap a previous, already finished worker.
        if let Some(old) = self.worker.take() {
            let _ = old.join();
        }

        self.cancel = CancelToken::new();
        let cancel = self.cancel.clone();
        let state = Arc::clone(&self.state);
        let (tx, rx) = mpsc::channel();

        let spawned = thread::Builder::new()
            .name("pdf-splitter-worker".into())
            .spawn(move || {
                let notify = Notifier::new(&tx);
                let result = panic::catch_unwind(AssertUnwindSafe(|| {
                    outcome(&job, relocator.as_ref(), &cancel, &notify)
                }))
                .unwrap_or_else(|payload| {
                    let msg = panic_message(payload.as_ref());
                    error!(panic = %msg, "worker panicked");
                    notify.log(format!("A fatal error occurred during the run: {msg}"));
                    RunResult::failed(format!("An error occurred: {msg}"), RunStats::default())
                });
                if let Ok(mut s) = state.lock() {
                    *s = if result.success {
                        RunState::Completed
                    } else {
                        RunState::Failed
                    };
                }
                notify.finished(result.clone());
                result
            })
            .context("spawn worker thread");

        match spawned {
            Ok(handle) => {
                self.worker = Some(handle);
                Ok(rx)
            }
            Err(e) => {
                if let Ok(mut s) = self.state.lock() {
                    *s = RunState::Idle;
                }
                Err(e)
            }
        }
    }

    /// Ask the current run to stop before its next file.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Block until the current run ends and return its result.
    pub fn wait(&mut self) -> Result<RunResult> {
        let handle = self
            .worker
            .take()
            .ok_or_else(|| anyhow::anyhow!("no run has been started"))?;
        handle
            .join()
            .map_err(|p| anyhow::anyhow!("worker thread died: {}", panic_message(p.as_ref())))
    }
}

/// One-line human summary of a bucket report.
pub fn describe_buckets(result: &RunResult) -> Vec<String> {
    result
        .bucket_sizes
        .iter()
        .map(|b| format!("{}: {}", b.name, format_mb(b.bytes)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{Event, Recorder};
    use assert_fs::prelude::*;

    #[test]
    fn missing_source_fails_without_touching_destination() {
        let temp = assert_fs::TempDir::new().unwrap();
        let dest = temp.path().join("out");
        let job = SplitJob::new(temp.path().join("missing"), &dest, 100);
        let rec = Recorder::new();
        let result = run_job(&job, &FsRelocator::default(), &CancelToken::new(), &rec);
        assert!(!result.success);
        assert_eq!(result.message, "Source folder not found.");
        assert!(result.bucket_sizes.is_empty());
        assert!(!dest.exists());
        assert!(matches!(rec.events().last(), Some(Event::Finished(_))));
    }

    #[test]
    fn finished_is_emitted_once_and_last() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("in/a.pdf").write_binary(&[0u8; 4]).unwrap();
        let job = SplitJob::new(temp.path().join("in"), temp.path().join("out"), 10);
        let rec = Recorder::new();
        let result = run_job(&job, &FsRelocator::default(), &CancelToken::new(), &rec);
        assert!(result.success, "{}", result.message);
        assert_eq!(rec.finished(), vec![result]);
        assert!(matches!(rec.events().last(), Some(Event::Finished(_))));
    }

    #[test]
    fn panic_payloads_are_readable() {
        let p: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(p.as_ref()), "boom");
        let p: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(p.as_ref()), "bang");
        let p: Box<dyn Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(p.as_ref()), "worker panicked");
    }

    #[test]
    fn bucket_summary_lines() {
        let r = RunResult::completed(
            "ok",
            vec![crate::report::BucketSize {
                name: "output_001".into(),
                bytes: 1024 * 1024,
            }],
            RunStats::default(),
        );
        assert_eq!(describe_buckets(&r), vec!["output_001: 1.00 MB"]);
    }
}
