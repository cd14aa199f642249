//! Rasterizes a thread row's draw buffers into terminal cells.
//!
//! The terminal is the pixel grid: the frame's [`TimelineContext`] is built
//! with the lane width in cells, so record positions map straight onto
//! columns. Records are drawn in buffer order without any re-clipping.

// Pixel positions become cell indices
#![allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]

use std::fmt;

use ratatui::{
    style::Style,
    text::{Line, Span},
};

use super::theme::Glyph;
use crate::folding::{ContextSwitchDrawKind, TimelineDraw};
use crate::timeline::{ThreadRow, TimelineContext};
use crate::trace_data::Trace;

/// One line of cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lane {
    cells: Vec<Option<Glyph>>,
}

impl Lane {
    #[must_use]
    pub fn new(width: usize) -> Self {
        Self { cells: vec![None; width] }
    }

    #[must_use]
    pub fn cells(&self) -> &[Option<Glyph>] {
        &self.cells
    }

    /// Cover `[x0, x1)`, at least one cell, clamped to the lane.
    fn fill(&mut self, x0: f64, x1: f64, glyph: Glyph) {
        let width = self.cells.len();
        if width == 0 || x1 < 0.0 || x0 >= width as f64 {
            return;
        }
        let a = x0.max(0.0).floor() as usize;
        let b = (x1.ceil().max(0.0) as usize).clamp(a + 1, width);
        self.cells[a..b].fill(Some(glyph));
    }

    fn mark(&mut self, x: f64, glyph: Glyph) {
        if x >= 0.0 {
            if let Some(cell) = self.cells.get_mut(x.floor() as usize) {
                *cell = Some(glyph);
            }
        }
    }

    /// Styled line, one span per run of identical cells.
    #[must_use]
    pub fn to_line(&self) -> Line<'static> {
        let mut spans = Vec::new();
        let mut run = String::new();
        let mut current: Option<Option<Glyph>> = None;
        for &cell in &self.cells {
            if current.is_some_and(|c| c != cell) {
                spans.push(styled(std::mem::take(&mut run), current.flatten()));
            }
            current = Some(cell);
            run.push(cell.map_or(' ', Glyph::symbol));
        }
        if !run.is_empty() {
            spans.push(styled(run, current.flatten()));
        }
        Line::from(spans)
    }
}

fn styled(text: String, glyph: Option<Glyph>) -> Span<'static> {
    match glyph {
        Some(glyph) => Span::styled(text, Style::new().fg(glyph.color())),
        None => Span::raw(text),
    }
}

impl fmt::Display for Lane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for cell in &self.cells {
            write!(f, "{}", cell.map_or(' ', Glyph::symbol))?;
        }
        Ok(())
    }
}

fn lane_width(ctx: &TimelineContext) -> usize {
    ctx.w.max(0.0) as usize
}

/// One lane per zone depth, top level first.
#[must_use]
pub fn zone_lanes(row: &ThreadRow<'_>, trace: &Trace, ctx: &TimelineContext) -> Vec<Lane> {
    let depth = row.draw().iter().map(|d| d.depth() + 1).max().unwrap_or(0);
    let mut lanes = vec![Lane::new(lane_width(ctx)); depth as usize];
    for record in row.draw() {
        let (end, glyph) = match *record {
            TimelineDraw::Zone { zone, .. } => (trace.zone_end(zone), Glyph::Zone),
            TimelineDraw::Folded { end, .. } => (end, Glyph::Folded),
            TimelineDraw::Ghost { zone, .. } => (zone.end, Glyph::Ghost),
            TimelineDraw::GhostFolded { end, .. } => (end, Glyph::GhostFolded),
        };
        lanes[record.depth() as usize].fill(ctx.time_to_px(record.start()), ctx.time_to_px(end), glyph);
    }
    lanes
}

/// Running regions and the waits between them.
#[must_use]
pub fn context_switch_lane(row: &ThreadRow<'_>, trace: &Trace, ctx: &TimelineContext) -> Option<Lane> {
    let draw = row.context_switch_draw();
    if draw.is_empty() {
        return None;
    }
    let mut lane = Lane::new(lane_width(ctx));
    for record in draw {
        let start = ctx.time_to_px(record.region.start);
        match record.kind {
            ContextSwitchDrawKind::Running => {
                let end = ctx.time_to_px(trace.region_end(record.region));
                lane.fill(start, end, Glyph::Running);
            }
            ContextSwitchDrawKind::Waiting { prev, .. } => {
                let from = ctx.time_to_px(trace.region_end(prev)).max(f64::from(record.minpx));
                if start > from {
                    lane.fill(from, start, Glyph::Waiting);
                }
            }
            ContextSwitchDrawKind::FoldedOne { .. } | ContextSwitchDrawKind::FoldedMulti { .. } => {
                lane.fill(start, f64::from(record.minpx), Glyph::ContextSwitchFolded);
            }
        }
    }
    Some(lane)
}

/// Sample markers; runs of several samples get a denser glyph.
#[must_use]
pub fn sample_lane(row: &ThreadRow<'_>, ctx: &TimelineContext) -> Option<Lane> {
    let draw = row.samples_draw();
    if draw.is_empty() {
        return None;
    }
    let samples = &row.thread().samples;
    let mut lane = Lane::new(lane_width(ctx));
    for run in draw {
        let glyph = if run.count > 1 { Glyph::SampleRun } else { Glyph::Sample };
        lane.mark(ctx.time_to_px(samples[run.index as usize].time), glyph);
    }
    Some(lane)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::InlineDispatch;
    use crate::timeline::{Timeline, ViewOptions};
    use crate::trace_data::{ContextSwitch, ThreadData, ZoneLevel};
    use strata_common::{ContextSwitchRegion, SampleData, ZoneEvent};

    /// 10 cells over 100ns.
    fn ctx() -> TimelineContext {
        TimelineContext::new(0, 100, 10.0, 1.0)
    }

    fn trace() -> Trace {
        let mut thread = ThreadData::new(1, "main");
        thread.timeline = ZoneLevel::Direct(vec![
            ZoneEvent::new(0, 50),
            ZoneEvent::new(60, 61),
            ZoneEvent::new(62, 63),
        ]);
        thread.samples = vec![SampleData::new(15, 1), SampleData::new(17, 1), SampleData::new(80, 1)];
        let mut trace = Trace { last_time: 200, threads: vec![thread], ..Trace::default() };
        trace.context_switches.insert(
            1,
            ContextSwitch::new(vec![ContextSwitchRegion::new(0, 40), ContextSwitchRegion::new(60, 100)]),
        );
        trace
    }

    #[test]
    fn test_lanes_render_each_record_kind() {
        let trace = trace();
        let ctx = ctx();
        let mut timeline = Timeline::new(&trace);
        timeline.preprocess(&ctx, &ViewOptions::default(), &InlineDispatch);
        let row = &timeline.rows()[0];

        let zones = zone_lanes(row, &trace, &ctx);
        assert_eq!(zones.len(), 1);
        assert_eq!(zones[0].to_string(), "█████ ▒   ");

        let switches = context_switch_lane(row, &trace, &ctx).expect("context switches");
        assert_eq!(switches.to_string(), "━━━━··━━━━");

        let samples = sample_lane(row, &ctx).expect("samples");
        assert_eq!(samples.to_string(), " ⁘      • ");
    }

    #[test]
    fn test_fill_clamps_to_lane() {
        let mut lane = Lane::new(4);
        lane.fill(-3.0, 1.2, Glyph::Zone);
        lane.fill(3.5, 9.0, Glyph::Ghost);
        lane.fill(7.0, 9.0, Glyph::Folded);
        assert_eq!(lane.to_string(), "██ ░");
    }

    #[test]
    fn test_sub_cell_interval_still_visible() {
        let mut lane = Lane::new(3);
        lane.fill(1.2, 1.3, Glyph::Zone);
        assert_eq!(lane.to_string(), " █ ");
    }

    #[test]
    fn test_to_line_groups_runs() {
        let mut lane = Lane::new(6);
        lane.fill(0.0, 2.0, Glyph::Zone);
        lane.fill(4.0, 6.0, Glyph::Folded);
        let line = lane.to_line();
        let texts: Vec<&str> = line.spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(texts, vec!["██", "  ", "▒▒"]);
    }

    #[test]
    fn test_empty_buffers_have_no_lanes() {
        let trace = Trace { last_time: 10, threads: vec![ThreadData::new(5, "idle")], ..Trace::default() };
        let ctx = ctx();
        let mut timeline = Timeline::new(&trace);
        timeline.preprocess(&ctx, &ViewOptions::default(), &InlineDispatch);
        let row = &timeline.rows()[0];

        assert!(zone_lanes(row, &trace, &ctx).is_empty());
        assert!(context_switch_lane(row, &trace, &ctx).is_none());
        assert!(sample_lane(row, &ctx).is_none());
    }
}
