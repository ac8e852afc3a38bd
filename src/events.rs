//! Run notifications.
//!
//! A split run talks to its front end through one-way, fire-and-forget events emitted in
//! strict processing order: log lines, status text, progress percentage, and exactly one
//! final `Finished` carrying the `RunResult`.
//!
//! `Notifier` is the emitting side used by the core. It timestamps log lines and mirrors
//! them into `tracing` so file logging sees the same story as the front end.

use std::sync::Mutex;
use std::sync::mpsc::Sender;

use chrono::Local;
use tracing::{info, warn};

use crate::report::RunResult;

/// Tracing target used when mirroring run log lines.
pub const RUN_TARGET: &str = "pdf_splitter::run";

/// One notification from a running split.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Timestamped, human-readable log line.
    Log(String),
    /// Short status text describing the current step.
    Status(String),
    /// Overall progress, 0..=100.
    Progress(u8),
    /// Terminal result; always the last event of a run.
    Finished(RunResult),
}

/// Consumer of run events. Implementations must not block the emitter.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: Event);
}

impl EventSink for Sender<Event> {
    fn emit(&self, event: Event) {
        // Receiver dropped means nobody is watching anymore; the run carries on regardless.
        let _ = self.send(event);
    }
}

/// Adapter turning a closure into an `EventSink`.
pub struct FnSink<F>(pub F);

impl<F> EventSink for FnSink<F>
where
    F: Fn(Event) + Send + Sync,
{
    fn emit(&self, event: Event) {
        (self.0)(event)
    }
}

/// Sink that discards everything.
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: Event) {}
}

/// In-memory sink that keeps every event, in order. Handy for tests and embedding.
#[derive(Default)]
pub struct Recorder {
    events: Mutex<Vec<Event>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all events recorded so far.
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().map(|g| g.clone()).unwrap_or_default()
    }

    /// Log lines only, timestamps included.
    pub fn log_lines(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Log(line) => Some(line),
                _ => None,
            })
            .collect()
    }

    /// Progress values in emission order.
    pub fn progress(&self) -> Vec<u8> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Progress(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    /// Every `Finished` result seen (a well-behaved run produces exactly one).
    pub fn finished(&self) -> Vec<RunResult> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Finished(r) => Some(r),
                _ => None,
            })
            .collect()
    }
}

impl EventSink for Recorder {
    fn emit(&self, event: Event) {
        if let Ok(mut g) = self.events.lock() {
            g.push(event);
        }
    }
}

/// Emitting side of the event contract.
pub struct Notifier<'a> {
    sink: &'a dyn EventSink,
}

impl<'a> Notifier<'a> {
    pub fn new(sink: &'a dyn EventSink) -> Self {
        Self { sink }
    }

    /// Emit a timestamped log line.
    pub fn log(&self, msg: impl AsRef<str>) {
        let msg = msg.as_ref();
        info!(target: RUN_TARGET, "{msg}");
        self.sink.emit(Event::Log(stamp(msg)));
    }

    /// Emit a timestamped log line that also surfaces as a tracing warning.
    pub fn warn(&self, msg: impl AsRef<str>) {
        let msg = msg.as_ref();
        warn!(target: RUN_TARGET, "{msg}");
        self.sink.emit(Event::Log(stamp(msg)));
    }

    pub fn status(&self, text: impl Into<String>) {
        self.sink.emit(Event::Status(text.into()));
    }

    /// Emit progress as an integer-truncated percentage of `done / total`.
    pub fn progress(&self, done: usize, total: usize) {
        self.sink.emit(Event::Progress(percent(done, total)));
    }

    pub fn finished(&self, result: RunResult) {
        self.sink.emit(Event::Finished(result));
    }
}

fn stamp(msg: &str) -> String {
    format!("[{}] {}", Local::now().format("%Y-%m-%d %H:%M:%S"), msg)
}

/// Integer-truncated percentage, clamped to 100. An empty total counts as complete.
pub fn percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    let p = (done as u128 * 100) / total as u128;
    p.min(100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn percent_truncates() {
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(2, 3), 66);
        assert_eq!(percent(3, 3), 100);
        assert_eq!(percent(0, 7), 0);
        assert_eq!(percent(0, 0), 100);
    }

    #[test]
    fn log_lines_carry_a_timestamp_prefix() {
        let rec = Recorder::new();
        Notifier::new(&rec).log("hello");
        let lines = rec.log_lines();
        assert_eq!(lines.len(), 1);
        let line = &lines[0];
        // "[YYYY-MM-DD HH:MM:SS] hello"
        assert!(line.starts_with('['));
        assert_eq!(&line[20..22], "] ");
        assert!(line.ends_with("hello"));
    }

    #[test]
    fn channel_sink_preserves_order_and_survives_dropped_receiver() {
        let (tx, rx) = mpsc::channel();
        let n = Notifier::new(&tx);
        n.status("a");
        n.progress(1, 2);
        n.status("b");
        let got: Vec<Event> = rx.try_iter().collect();
        assert_eq!(
            got,
            vec![
                Event::Status("a".into()),
                Event::Progress(50),
                Event::Status("b".into())
            ]
        );
        drop(rx);
        n.status("nobody listening");
    }

    #[test]
    fn fn_sink_forwards() {
        let seen = Mutex::new(Vec::new());
        let sink = FnSink(|e: Event| seen.lock().unwrap().push(e));
        Notifier::new(&sink).progress(1, 4);
        assert_eq!(*seen.lock().unwrap(), vec![Event::Progress(25)]);
    }
}
