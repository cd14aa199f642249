//! Headless fold report.
//!
//! Folds one window of the trace and prints, per thread, its summary and how
//! many draw records of each kind the window produced. Useful for checking
//! what a viewer would have to draw without opening a terminal UI.

use std::io::{self, Write};

use serde::Serialize;

use crate::folding::{ContextSwitchDraw, ContextSwitchDrawKind, SamplesDraw, TimelineDraw};
use crate::timeline::{ThreadRow, Timeline, TimelineContext};

/// Draw record counts for one row and one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FoldStats {
    pub depth: u32,
    pub zones: usize,
    pub folded: usize,
    /// Source zones hidden inside folded records.
    pub folded_members: u64,
    pub ghosts: usize,
    pub ghosts_folded: usize,
    pub running: usize,
    pub waiting: usize,
    pub ctx_folded: usize,
    pub sample_runs: usize,
    pub samples: u64,
}

impl FoldStats {
    #[must_use]
    pub fn from_row(row: &ThreadRow<'_>) -> Self {
        let mut stats = Self { depth: row.depth(), ..Self::default() };
        stats.add_zones(row.draw());
        stats.add_context_switches(row.context_switch_draw());
        stats.add_samples(row.samples_draw());
        stats
    }

    fn add_zones(&mut self, draw: &[TimelineDraw<'_>]) {
        for record in draw {
            match record {
                TimelineDraw::Zone { .. } => self.zones += 1,
                TimelineDraw::Folded { count, .. } => {
                    self.folded += 1;
                    self.folded_members += u64::from(*count);
                }
                TimelineDraw::Ghost { .. } => self.ghosts += 1,
                TimelineDraw::GhostFolded { count, .. } => {
                    self.ghosts_folded += 1;
                    self.folded_members += u64::from(*count);
                }
            }
        }
    }

    fn add_context_switches(&mut self, draw: &[ContextSwitchDraw<'_>]) {
        for record in draw {
            match record.kind {
                ContextSwitchDrawKind::Running => self.running += 1,
                ContextSwitchDrawKind::Waiting { .. } => self.waiting += 1,
                ContextSwitchDrawKind::FoldedOne { .. }
                | ContextSwitchDrawKind::FoldedMulti { .. } => self.ctx_folded += 1,
            }
        }
    }

    fn add_samples(&mut self, draw: &[SamplesDraw]) {
        self.sample_runs += draw.len();
        self.samples += draw.iter().map(|run| u64::from(run.count)).sum::<u64>();
    }

    /// Records the consumer would have to draw.
    #[must_use]
    pub fn records(&self) -> usize {
        self.zones
            + self.folded
            + self.ghosts
            + self.ghosts_folded
            + self.running
            + self.waiting
            + self.ctx_folded
            + self.sample_runs
    }
}

/// Print the report for an already preprocessed timeline.
///
/// # Errors
/// Returns any error raised by `out`.
pub fn write_report(
    out: &mut impl Write,
    timeline: &Timeline<'_>,
    ctx: &TimelineContext,
) -> io::Result<()> {
    let trace = timeline.trace();
    writeln!(
        out,
        "window {}..{} ns over {} px ({:.1} ns/px), trace {}..{}",
        ctx.v_start, ctx.v_end, ctx.w, ctx.nspx, trace.first_time, trace.last_time
    )?;

    let mut max_depth = 0;
    let mut total = 0;
    for row in timeline.rows() {
        let stats = FoldStats::from_row(row);
        max_depth = max_depth.max(stats.depth);
        total += stats.records();

        writeln!(out, "{}", row.summary())?;
        writeln!(
            out,
            "  zones: {} drawn, {} folded ({} inside), {} ghost, {} ghost folded, depth {}",
            stats.zones,
            stats.folded,
            stats.folded_members,
            stats.ghosts,
            stats.ghosts_folded,
            stats.depth
        )?;
        writeln!(
            out,
            "  context switches: {} running, {} waiting, {} folded",
            stats.running, stats.waiting, stats.ctx_folded
        )?;
        writeln!(out, "  samples: {} in {} runs", stats.samples, stats.sample_runs)?;
    }

    writeln!(
        out,
        "{} threads, {} draw records, max depth {}",
        timeline.rows().len(),
        total,
        max_depth
    )
}

/// Per-row statistics as JSON, keyed by thread id.
///
/// # Errors
/// Returns an error if serialization fails or `out` cannot be written.
pub fn write_json(out: &mut impl Write, timeline: &Timeline<'_>) -> serde_json::Result<()> {
    #[derive(Serialize)]
    struct Row<'a> {
        id: u64,
        name: &'a str,
        #[serde(flatten)]
        stats: FoldStats,
    }

    let rows: Vec<Row<'_>> = timeline
        .rows()
        .iter()
        .map(|row| Row { id: row.thread().id, name: &row.thread().name, stats: FoldStats::from_row(row) })
        .collect();
    serde_json::to_writer_pretty(out, &rows)
}
