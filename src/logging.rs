//! Tracing setup for the binary.
//!
//! - One console layer on stderr (stdout is reserved for the report), compact or JSON.
//! - An optional non-blocking file layer; refused when a parent folder is a symlink.
//! - Each layer has its own filter derived from LogLevel; RUST_LOG is not consulted.

use anyhow::Result;
use chrono::Local;
use pdf_splitter::output as out;
use pdf_splitter::platform::open_log_file_secure_append;
use pdf_splitter::events::RUN_TARGET;
use pdf_splitter::{LogLevel, default_log_path, path_has_symlink_ancestor};
use std::fmt as stdfmt;
use std::path::Path;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::fmt as tsfmt;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::{Registry, registry};
use tracing_subscriber::util::SubscriberInitExt;

/// Human-friendly timestamp formatter (YYYY-MM-DD HH:MM:SS, local time)
struct LocalHumanTime;
impl FormatTime for LocalHumanTime {
    fn format_time(&self, w: &mut tsfmt::format::Writer<'_>) -> stdfmt::Result {
        write!(w, "{}", Local::now().format("%Y-%m-%d %H:%M:%S"))
    }
}

#[inline]
fn to_level_filter(lvl: &LogLevel) -> LevelFilter {
    match lvl {
        LogLevel::Quiet => LevelFilter::ERROR,
        LogLevel::Normal => LevelFilter::INFO,
        LogLevel::Info => LevelFilter::DEBUG,
        LogLevel::Debug => LevelFilter::TRACE,
    }
}

#[inline]
fn level_str(level_filter: LevelFilter) -> &'static str {
    match level_filter {
        LevelFilter::ERROR => "error",
        LevelFilter::WARN => "warn",
        LevelFilter::INFO => "info",
        LevelFilter::DEBUG => "debug",
        LevelFilter::TRACE => "trace",
        _ => "info",
    }
}

/// Console filter. The run log (`pdf_splitter::run`) is rendered by the front end
/// itself, so it is muted here unless debugging.
fn console_filter(lvl: &LogLevel) -> EnvFilter {
    let level = level_str(to_level_filter(lvl));
    if *lvl == LogLevel::Debug {
        EnvFilter::new(level)
    } else {
        EnvFilter::new(format!("{level},{RUN_TARGET}=off"))
    }
}

/// File filter: everything at the configured level, run log included.
fn file_filter(lvl: &LogLevel) -> EnvFilter {
    EnvFilter::new(level_str(to_level_filter(lvl)))
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

fn console_layer(lvl: &LogLevel, json: bool) -> BoxedLayer {
    let base = tsfmt::layer()
        .with_timer(LocalHumanTime)
        .with_writer(std::io::stderr);
    if json {
        base.json().with_target(true).with_filter(console_filter(lvl)).boxed()
    } else {
        base.compact().with_target(false).with_filter(console_filter(lvl)).boxed()
    }
}

fn file_layer(writer: NonBlocking, lvl: &LogLevel, json: bool) -> BoxedLayer {
    let base = tsfmt::layer()
        .with_timer(LocalHumanTime)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(writer);
    if json {
        base.json().with_filter(file_filter(lvl)).boxed()
    } else {
        base.compact().with_filter(file_filter(lvl)).boxed()
    }
}

/// Open the log file for appending behind a non-blocking writer.
/// Returns None (after saying why on stderr) when the path is unsafe or unopenable.
fn open_log_writer(path: &Path) -> Option<(NonBlocking, WorkerGuard)> {
    match path_has_symlink_ancestor(path) {
        Ok(false) => {}
        Ok(true) => {
            eprintln!(
                "Refusing file logging to {}: a parent folder is a symlink.",
                path.display()
            );
            return None;
        }
        Err(e) => {
            eprintln!("Cannot check log path {} for symlinks: {e}", path.display());
            return None;
        }
    }
    match open_log_file_secure_append(path) {
        Ok(file) => Some(tracing_appender::non_blocking(file)),
        Err(e) => {
            eprintln!("Cannot open log file {}: {e}", path.display());
            None
        }
    }
}

/// Install the global subscriber. The returned guard (present when a log file is in use)
/// must live until exit so buffered lines get flushed.
pub fn init_tracing(lvl: &LogLevel, log_file: Option<&Path>, json: bool) -> Result<Option<WorkerGuard>> {
    let mut layers = vec![console_layer(lvl, json)];
    let mut guard = None;

    if let Some(path) = log_file {
        match open_log_writer(path) {
            Some((writer, g)) => {
                layers.push(file_layer(writer, lvl, json));
                guard = Some(g);
            }
            None => {
                out::print_warn(&format!(
                    "File logging to '{}' is disabled; logs go to stderr only.",
                    path.display()
                ));
                if let Some(def) = default_log_path() {
                    out::print_info(&format!("The default log path may work instead: {}", def.display()));
                }
            }
        }
    }

    registry().with(layers).try_init()?;
    Ok(guard)
}
