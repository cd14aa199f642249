//! CLI argument definitions

use clap::Parser;
use std::path::PathBuf;

use crate::domain::UsageError;
use crate::timeline::{TimelineContext, ViewOptions};
use crate::trace_data::Trace;

#[derive(Parser, Debug)]
#[command(
    name = "strata",
    about = "Fold and browse a recorded profiler timeline",
    after_help = "\
EXAMPLES:
    strata capture.json                                  Browse the whole trace
    strata capture.json --start 2000000 --end 3000000    Open on a window (ns)
    strata capture.json --headless --width 1920          Print fold statistics
    RUST_LOG=debug strata capture.json --headless        With per-frame logging"
)]
pub struct Args {
    /// Replay document to load
    #[arg(value_name = "TRACE")]
    pub trace: PathBuf,

    /// Window start in nanoseconds (defaults to the trace start)
    #[arg(long)]
    pub start: Option<i64>,

    /// Window end in nanoseconds (defaults to the trace end)
    #[arg(long)]
    pub end: Option<i64>,

    /// Row width in pixels for headless folding (the TUI uses the terminal width)
    #[arg(long, default_value = "1920")]
    pub width: f32,

    /// UI scale factor applied to the folding thresholds
    #[arg(long, default_value = "1.0")]
    pub scale: f32,

    /// Folding worker threads (0 = one per CPU)
    #[arg(short, long, default_value = "0")]
    pub jobs: usize,

    /// Print a fold report instead of starting the TUI
    #[arg(long)]
    pub headless: bool,

    /// Emit the headless report as JSON
    #[arg(long, requires = "headless")]
    pub json: bool,

    /// Show ghost zones on threads without instrumented zones
    #[arg(long)]
    pub ghost: bool,

    /// Do not fold context switches
    #[arg(long)]
    pub no_context_switches: bool,

    /// Do not fold call-stack samples
    #[arg(long)]
    pub no_samples: bool,
}

impl Args {
    #[must_use]
    pub fn view_options(&self) -> ViewOptions {
        ViewOptions {
            ghost_zones: self.ghost,
            context_switches: !self.no_context_switches,
            samples: !self.no_samples,
        }
    }

    /// Requested window, defaulting to the trace's own range.
    ///
    /// # Errors
    /// Returns [`UsageError::InvalidWindow`] if the window is empty, inverted
    /// or narrower than one pixel.
    pub fn window(&self, trace: &Trace) -> Result<TimelineContext, UsageError> {
        let start = self.start.unwrap_or(trace.first_time);
        let end = self.end.unwrap_or(trace.last_time);
        if end > start && self.width >= 1.0 {
            Ok(TimelineContext::new(start, end, self.width, self.scale))
        } else {
            Err(UsageError::InvalidWindow { start, end, width: self.width })
        }
    }
}
