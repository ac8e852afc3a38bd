//! Application orchestrator.
//! Loads/merges config, initializes logging, installs the interrupt handler, confirms
//! in-place runs, then drives a supervised split and prints its report.

use anyhow::{Context, Result, bail};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, BufRead, Write};
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, error, info};

use pdf_splitter::cli::Args;
use pdf_splitter::config::{CONFIG_ENV, create_template_config, load_config_from_xml, same_location};
use pdf_splitter::output as out;
use pdf_splitter::report::format_mb;
use pdf_splitter::runner::describe_buckets;
use pdf_splitter::{Config, Event, RunResult, SplitJob, Supervisor, default_config_path, shutdown};

use crate::logging::init_tracing;

const PROGRESS_TEMPLATE: &str = "[{elapsed_precise}] {bar:40.blue} {pos:>3}% {wide_msg}";
const STEADY_TICK_MS: u64 = 100;

/// Run the CLI application.
pub fn run(args: Args) -> Result<()> {
    // Handled before logging init
    if args.print_config {
        print_config_location();
        return Ok(());
    }
    if args.init_config {
        return init_config();
    }

    let mut cfg = match load_config_from_xml() {
        Ok(Some(cfg)) => cfg,
        Ok(None) => Config::default(),
        Err(e) => {
            out::print_error(&format!("Failed to load config: {e:#}"));
            return Err(e);
        }
    };
    args.apply_overrides(&mut cfg);

    let guard_opt = init_tracing(&cfg.log_level, cfg.log_file.as_deref(), args.json).map_err(|e| {
        out::print_error(&format!("Failed to initialize logging: {}", e));
        e
    })?;

    // Guard is dropped on SIGINT to flush logs
    let guard_slot = Arc::new(Mutex::new(guard_opt));
    {
        let guard_slot = Arc::clone(&guard_slot);
        ctrlc::set_handler(move || {
            shutdown::request();
            out::print_warn("Received interrupt; stopping after the current file...");
            if let Ok(mut g) = guard_slot.lock() {
                let _ = g.take();
            }
        })
        .context("install interrupt handler")?;
    }

    debug!(?args, "starting pdf_splitter");
    let result = split(&args, &cfg);

    if let Ok(mut g) = guard_slot.lock() {
        let _ = g.take();
    }
    result
}

fn print_config_location() {
    if let Ok(explicit) = std::env::var(CONFIG_ENV) {
        out::print_info(&format!("Using {CONFIG_ENV} (explicit):\n  {explicit}\n"));
        out::print_info(&format!("To override, unset {CONFIG_ENV} or set it to another file."));
        return;
    }
    match default_config_path() {
        Some(p) => {
            out::print_info(&format!("Default pdf_splitter config path:\n  {}\n", p.display()));
            if p.exists() {
                out::print_info("A config file already exists at that location.");
            } else {
                out::print_info("No config file exists there yet. Run with --init-config to create a template.");
            }
        }
        None => out::print_error("Could not determine a default config path."),
    }
}

fn init_config() -> Result<()> {
    let Some(path) = default_config_path() else {
        bail!("could not determine a config path; set {CONFIG_ENV}");
    };
    if path.exists() {
        out::print_warn(&format!("A config file already exists at {}; leaving it untouched.", path.display()));
        return Ok(());
    }
    create_template_config(&path)?;
    out::print_success(&format!("A template pdf_splitter config was written to: {}", path.display()));
    out::print_info("Edit <source_dir>, <dest_dir> and <limit_mb>, then run pdf_splitter without arguments.");
    Ok(())
}

fn split(args: &Args, cfg: &Config) -> Result<()> {
    let job = cfg.job()?;

    if same_location(&job.source_dir, &job.dest_dir) && !args.yes && !confirm_in_place(&job)? {
        out::print_warn("Nothing was moved.");
        bail!("source and destination are the same folder; re-run with --yes to proceed");
    }

    info!(
        source = %job.source_dir.display(),
        dest = %job.dest_dir.display(),
        limit = %format_mb(job.size_limit),
        suffix = %job.suffix,
        "starting split"
    );

    let mut supervisor = Supervisor::new();
    let events = supervisor.start(job)?;
    if args.json {
        drain_silently(&events);
    } else if args.no_progress || !atty::is(atty::Stream::Stderr) {
        drain_plain(&events);
    } else {
        drain_with_progress(&events)?;
    }
    let result = supervisor.wait()?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_summary(&result);
    }

    if !result.success {
        error!(message = %result.message, "split did not complete");
        bail!("{}", result.message);
    }
    Ok(())
}

/// Ask before distributing a folder into itself. Non-interactive sessions need `--yes`.
fn confirm_in_place(job: &SplitJob) -> Result<bool> {
    out::print_warn(&format!(
        "Source and destination are the same folder: {}",
        job.source_dir.display()
    ));
    if !atty::is(atty::Stream::Stdin) {
        out::print_warn("Not a terminal; pass --yes to split a folder in place.");
        return Ok(false);
    }
    eprint!("Continue? [y/N] ");
    io::stderr().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

/// Consume events until `Finished`; the stream closes when the worker drops its sender.
fn drain_silently(events: &Receiver<Event>) {
    for event in events {
        if matches!(event, Event::Finished(_)) {
            break;
        }
    }
}

fn drain_plain(events: &Receiver<Event>) {
    for event in events {
        match event {
            Event::Log(line) => out::print_user(&line),
            Event::Finished(_) => break,
            Event::Status(_) | Event::Progress(_) => {}
        }
    }
}

fn drain_with_progress(events: &Receiver<Event>) -> Result<()> {
    let pb = ProgressBar::new(100);
    pb.set_style(ProgressStyle::with_template(PROGRESS_TEMPLATE)?.progress_chars("█▓▒░  "));
    pb.enable_steady_tick(Duration::from_millis(STEADY_TICK_MS));

    for event in events {
        match event {
            Event::Log(line) => pb.println(line),
            Event::Status(text) => pb.set_message(text),
            Event::Progress(p) => pb.set_position(u64::from(p)),
            Event::Finished(result) => {
                pb.finish_with_message(result.message);
                break;
            }
        }
    }
    Ok(())
}

fn print_summary(result: &RunResult) {
    if result.success {
        out::print_success(&result.message);
    } else {
        out::print_error(&result.message);
    }
    if !result.bucket_sizes.is_empty() {
        out::print_info("Final folder sizes:");
        for line in describe_buckets(result) {
            out::print_bucket_line(&line);
        }
    }
    let stats = result.stats;
    if stats.discovered > 0 {
        out::print_info(&format!(
            "{} file(s) found, {} moved, {} failed.",
            stats.discovered, stats.moved, stats.failed
        ));
    }
}
