//! # strata - Main Entry Point
//!
//! Supports two operational modes:
//! - **TUI** (`strata <TRACE>`): interactive replay of a recorded trace
//! - **Headless** (`--headless`): fold one window and print what would be drawn

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use std::io::{self, BufWriter, Write};
use std::time::Instant;

use strata::cli::Args;
use strata::dispatch::PoolDispatch;
use strata::domain::{TraceError, UsageError};
use strata::report::{write_json, write_report};
use strata::timeline::Timeline;
use strata::trace_data::Trace;
use strata::tui;

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;
const EXIT_USAGE: i32 = 2;
const EXIT_NOINPUT: i32 = 66;

fn main() {
    env_logger::init();
    std::process::exit(match run() {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            let code = exit_code_for(&e);
            eprintln!("error: {e:#}");
            code
        }
    });
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    let missing_input = err.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<TraceError>(),
            Some(TraceError::Io(e)) if e.kind() == io::ErrorKind::NotFound
        )
    });
    if missing_input {
        EXIT_NOINPUT
    } else if err.chain().any(|cause| cause.is::<UsageError>()) {
        EXIT_USAGE
    } else {
        EXIT_ERROR
    }
}

fn run() -> Result<()> {
    let args = Args::parse();

    let loaded = Instant::now();
    let trace = Trace::from_file(&args.trace)
        .with_context(|| format!("failed to load {}", args.trace.display()))?;
    info!("Trace ready in {:.1?}", loaded.elapsed());
    if trace.threads.is_empty() {
        warn!("{} contains no threads", args.trace.display());
    }
    if !trace.ghost_zones_ready && args.ghost {
        warn!("Ghost zones were not reconstructed for this trace; --ghost has no effect");
    }

    let ctx = args.window(&trace)?;
    let dispatch = PoolDispatch::new(args.jobs).context("failed to start fold workers")?;
    let options = args.view_options();

    if args.headless {
        let mut timeline = Timeline::new(&trace);
        let folded = Instant::now();
        timeline.preprocess(&ctx, &options, &dispatch);
        info!("Folded {} rows in {:.1?}", timeline.rows().len(), folded.elapsed());

        let mut out = BufWriter::new(io::stdout().lock());
        if args.json {
            write_json(&mut out, &timeline).context("failed to write JSON report")?;
            writeln!(out)?;
        } else {
            write_report(&mut out, &timeline, &ctx).context("failed to write report")?;
        }
        out.flush()?;
        timeline.draw_finished();
        return Ok(());
    }

    tui::App::new(&trace, ctx, options, &dispatch)?.run()?;
    Ok(())
}
