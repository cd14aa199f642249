//! Thread rows: one per traced thread, each owning its frame's draw buffers.
//!
//! A frame goes through two phases:
//!
//! 1. [`Timeline::preprocess`] queues every row's folding jobs on a
//!    [`TaskDispatch`] and returns once all of them have finished
//! 2. the consumer reads the buffers, then calls [`Timeline::draw_finished`]
//!
//! Rows never share a buffer, and within a row the zone, context-switch and
//! sample passes each write a buffer of their own.

use log::debug;

use crate::dispatch::{Job, TaskDispatch};
use crate::domain::{Duration, Timestamp};
use crate::folding::{
    fold_context_switches, fold_ghosts, fold_samples, fold_zones, ContextSwitchDraw, SamplesDraw,
    TimelineDraw,
};
use crate::trace_data::{ThreadData, Trace};

use super::summary::ThreadSummary;
use super::TimelineContext;

/// Global view switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewOptions {
    /// Show ghost zones on threads without instrumentation.
    pub ghost_zones: bool,
    pub context_switches: bool,
    pub samples: bool,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self { ghost_zones: false, context_switches: true, samples: true }
    }
}

// =============================================================================
// THREAD ROW
// =============================================================================

/// One thread's slice of the timeline.
#[derive(Debug)]
pub struct ThreadRow<'t> {
    trace: &'t Trace,
    thread: &'t ThreadData,
    /// Per-row ghost zone toggle.
    ghost: bool,
    depth: u32,
    draw: Vec<TimelineDraw<'t>>,
    ctx_draw: Vec<ContextSwitchDraw<'t>>,
    samples_draw: Vec<SamplesDraw>,
}

impl<'t> ThreadRow<'t> {
    #[must_use]
    pub fn new(trace: &'t Trace, thread: &'t ThreadData) -> Self {
        Self {
            trace,
            thread,
            ghost: false,
            depth: 0,
            draw: Vec::new(),
            ctx_draw: Vec::new(),
            samples_draw: Vec::new(),
        }
    }

    #[must_use]
    pub fn thread(&self) -> &'t ThreadData {
        self.thread
    }

    #[must_use]
    pub fn ghost(&self) -> bool {
        self.ghost
    }

    pub fn set_ghost(&mut self, ghost: bool) {
        self.ghost = ghost;
    }

    /// Number of zone levels drawn by the last pass.
    #[must_use]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    #[must_use]
    pub fn draw(&self) -> &[TimelineDraw<'t>] {
        &self.draw
    }

    #[must_use]
    pub fn context_switch_draw(&self) -> &[ContextSwitchDraw<'t>] {
        &self.ctx_draw
    }

    #[must_use]
    pub fn samples_draw(&self) -> &[SamplesDraw] {
        &self.samples_draw
    }

    /// Whether this frame folds ghost zones instead of instrumented zones.
    #[must_use]
    pub fn shows_ghosts(&self, options: &ViewOptions) -> bool {
        self.trace.ghost_zones_ready
            && (self.ghost || (options.ghost_zones && self.thread.timeline.is_empty()))
    }

    /// Queue this row's folding passes for the frame described by `ctx`.
    ///
    /// The jobs hold the row's buffers until they have run.
    pub fn preprocess<'s>(
        &'s mut self,
        ctx: &'s TimelineContext,
        options: &ViewOptions,
        jobs: &mut Vec<Job<'s>>,
    ) {
        debug_assert!(self.draw.is_empty(), "zone buffer not cleared since last frame");
        debug_assert!(self.ctx_draw.is_empty(), "context switch buffer not cleared since last frame");
        debug_assert!(self.samples_draw.is_empty(), "sample buffer not cleared since last frame");

        let ghosts = self.shows_ghosts(options);
        let Self { trace, thread, depth, draw, ctx_draw, samples_draw, .. } = self;
        let trace: &'t Trace = *trace;
        let thread: &'t ThreadData = *thread;

        if ghosts {
            jobs.push(Box::new(move || {
                *depth = fold_ghosts(ctx, trace, &thread.ghost_zones, 0, draw);
            }));
        } else {
            jobs.push(Box::new(move || {
                *depth = fold_zones(ctx, trace, &thread.timeline, 0, draw);
            }));
        }

        if options.context_switches {
            if let Some(switches) = trace.context_switches(thread.id) {
                jobs.push(Box::new(move || {
                    fold_context_switches(ctx, trace, switches, &thread.samples, ctx_draw);
                }));
            }
        }

        if options.samples && !thread.samples.is_empty() {
            jobs.push(Box::new(move || fold_samples(ctx, &thread.samples, samples_draw)));
        }
    }

    /// Release this frame's records; the buffers keep their capacity.
    pub fn draw_finished(&mut self) {
        self.draw.clear();
        self.ctx_draw.clear();
        self.samples_draw.clear();
    }

    /// First recorded activity, or `i64::MAX` if there is none.
    #[must_use]
    pub fn range_begin(&self) -> i64 {
        let mut first = i64::MAX;
        if let Some(region) =
            self.trace.context_switches(self.thread.id).and_then(|cs| cs.regions.first())
        {
            first = region.start;
        }
        if let Some(zone) = self.thread.timeline.first(&self.trace.zones) {
            first = first.min(zone.start);
        }
        if let Some(&message) = self.thread.messages.first() {
            first = first.min(message);
        }
        first
    }

    /// Last recorded activity, or `-1` if there is none.
    #[must_use]
    pub fn range_end(&self) -> i64 {
        let mut last = -1;
        if let Some(region) =
            self.trace.context_switches(self.thread.id).and_then(|cs| cs.regions.last())
        {
            last = region.end.closed().unwrap_or(region.start);
        }
        if let Some(zone) = self.thread.timeline.last(&self.trace.zones) {
            last = last.max(self.trace.zone_end(zone));
        }
        if let Some(&message) = self.thread.messages.last() {
            last = last.max(message);
        }
        last
    }

    /// Nothing to draw in any mode.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.thread.timeline.is_empty()
            && self.thread.messages.is_empty()
            && self.thread.ghost_zones.is_empty()
    }

    #[must_use]
    pub fn summary(&self) -> ThreadSummary {
        let thread = self.thread;
        let first = self.range_begin();
        let last = self.range_end();
        let active = first <= last;
        let lifetime = if active { last - first } else { 0 };
        let switches = self.trace.context_switches(thread.id);

        ThreadSummary {
            id: thread.thread_id(),
            name: thread.name.clone(),
            is_fiber: thread.is_fiber,
            appeared_at: active.then_some(Timestamp(first)),
            last_event: active.then_some(Timestamp(last)),
            lifetime: Duration(lifetime),
            trace_share: ThreadSummary::percent(
                lifetime,
                self.trace.last_time() - self.trace.first_time,
            ),
            running_time: switches.map(|cs| Duration(cs.running_time)),
            running_share: switches.map(|cs| ThreadSummary::percent(cs.running_time, lifetime)),
            zone_count: self.trace.zone_count(&thread.timeline),
            top_level_zones: thread.timeline.len(),
            messages: thread.messages.len(),
            running_regions: switches.map_or(0, |cs| cs.regions.len()),
            samples: thread.samples.len(),
            kernel_samples: thread.kernel_sample_count,
        }
    }
}

// =============================================================================
// TIMELINE
// =============================================================================

/// Every thread row of a trace.
#[derive(Debug)]
pub struct Timeline<'t> {
    trace: &'t Trace,
    rows: Vec<ThreadRow<'t>>,
}

impl<'t> Timeline<'t> {
    #[must_use]
    pub fn new(trace: &'t Trace) -> Self {
        let rows = trace.threads.iter().map(|thread| ThreadRow::new(trace, thread)).collect();
        Self { trace, rows }
    }

    #[must_use]
    pub fn trace(&self) -> &'t Trace {
        self.trace
    }

    #[must_use]
    pub fn rows(&self) -> &[ThreadRow<'t>] {
        &self.rows
    }

    pub fn row_mut(&mut self, index: usize) -> Option<&mut ThreadRow<'t>> {
        self.rows.get_mut(index)
    }

    /// Fold every row for the frame and wait for all of it to finish.
    pub fn preprocess(
        &mut self,
        ctx: &TimelineContext,
        options: &ViewOptions,
        dispatch: &dyn TaskDispatch,
    ) {
        let rows = self.rows.len();
        let mut jobs = Vec::with_capacity(rows * 3);
        for row in &mut self.rows {
            row.preprocess(ctx, options, &mut jobs);
        }
        debug!(
            "Folding {} rows as {} jobs on {} workers, window {}..{}",
            rows,
            jobs.len(),
            dispatch.workers(),
            ctx.v_start,
            ctx.v_end
        );
        dispatch.run(jobs);
    }

    pub fn draw_finished(&mut self) {
        for row in &mut self.rows {
            row.draw_finished();
        }
    }
}
