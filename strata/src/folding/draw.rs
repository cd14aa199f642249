//! Draw records produced by the folding passes.
//!
//! Records borrow their representative source element from the trace, so a
//! buffer of records lives no longer than the trace itself. The consumer
//! reads them in order and must not re-sort or re-clip.

use strata_common::{CallstackId, ContextSwitchRegion, GhostZone, ZoneEvent};

/// One entry of a row's zone draw list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimelineDraw<'t> {
    Zone { depth: u32, zone: &'t ZoneEvent },
    /// Run of sub-pixel zones starting at `zone` and ending at `end`.
    Folded { depth: u32, zone: &'t ZoneEvent, end: i64, count: u32 },
    Ghost { depth: u32, zone: &'t GhostZone },
    GhostFolded { depth: u32, zone: &'t GhostZone, end: i64, count: u32 },
}

impl TimelineDraw<'_> {
    #[must_use]
    pub fn depth(&self) -> u32 {
        match *self {
            TimelineDraw::Zone { depth, .. }
            | TimelineDraw::Folded { depth, .. }
            | TimelineDraw::Ghost { depth, .. }
            | TimelineDraw::GhostFolded { depth, .. } => depth,
        }
    }

    /// Start of the representative interval.
    #[must_use]
    pub fn start(&self) -> i64 {
        match *self {
            TimelineDraw::Zone { zone, .. } | TimelineDraw::Folded { zone, .. } => zone.start,
            TimelineDraw::Ghost { zone, .. } | TimelineDraw::GhostFolded { zone, .. } => zone.start,
        }
    }

    /// Source intervals represented by this record.
    #[must_use]
    pub fn count(&self) -> u32 {
        match *self {
            TimelineDraw::Zone { .. } | TimelineDraw::Ghost { .. } => 1,
            TimelineDraw::Folded { count, .. } | TimelineDraw::GhostFolded { count, .. } => count,
        }
    }

    #[must_use]
    pub fn is_folded(&self) -> bool {
        matches!(self, TimelineDraw::Folded { .. } | TimelineDraw::GhostFolded { .. })
    }
}

/// What a context-switch record stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextSwitchDrawKind<'t> {
    Running,
    /// Gap between `prev` and the record's region.
    Waiting { prev: &'t ContextSwitchRegion, wait_stack: Option<CallstackId> },
    /// A single narrow region, ending at `rend`.
    FoldedOne { rend: i64 },
    FoldedMulti { rend: i64, num: u32 },
}

/// One entry of a row's context-switch draw list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContextSwitchDraw<'t> {
    pub region: &'t ContextSwitchRegion,
    /// Pixel position the record may not start left of.
    ///
    /// Fed forward from the right edge of the last fold so a waiting marker
    /// never renders underneath it. Not a time value.
    pub minpx: f32,
    pub kind: ContextSwitchDrawKind<'t>,
}

impl ContextSwitchDraw<'_> {
    /// Regions this record accounts for; waiting gaps account for none.
    #[must_use]
    pub fn region_count(&self) -> u32 {
        match self.kind {
            ContextSwitchDrawKind::Running | ContextSwitchDrawKind::FoldedOne { .. } => 1,
            ContextSwitchDrawKind::Waiting { .. } => 0,
            ContextSwitchDrawKind::FoldedMulti { num, .. } => num,
        }
    }
}

/// Run of samples drawn as one marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SamplesDraw {
    /// Index of the first sample of the run in the thread's sample list.
    pub index: u32,
    /// Samples in the run, at least one.
    pub count: u32,
}

pub(crate) fn saturating_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}
