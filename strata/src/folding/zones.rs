//! Zone and ghost-zone folding.
//!
//! Walks one level of a call hierarchy left to right, clipped to the visible
//! window, and recurses into the children of every interval wide enough to
//! be drawn on its own. Runs of intervals narrower than [`MIN_VIS_SIZE`]
//! pixels are merged into a single folded record.
//!
//! The walk is written once and is generic over two things:
//!
//! - [`Level`]: how a level is stored (inline slice or ids into an arena)
//! - [`Hierarchy`]: which tree is walked (instrumented zones or ghost zones),
//!   which decides clip margins, end resolution and record construction
//!
//! ## Cost
//!
//! Clipping is two binary searches. Absorbing a run repeatedly binary-searches
//! forward, so every interval in the clipped range is touched O(1) times.

// Pixel thresholds are converted to nanoseconds through f64
#![allow(clippy::cast_possible_truncation)]

use strata_common::{ChildHandle, GhostZone, Interval, ZoneEvent, ZoneId};

use super::draw::{saturating_u32, TimelineDraw};
use crate::timeline::TimelineContext;
use crate::trace_data::{Trace, ZoneLevel};

/// Zones narrower than this many (scaled) pixels are folded.
pub const MIN_VIS_SIZE: f32 = 3.0;

/// Width in nanoseconds of `px` scaled pixels at the current zoom.
pub(crate) fn min_vis_ns(ctx: &TimelineContext, px: f32) -> i64 {
    (f64::from(ctx.scale * px) * ctx.nspx).round() as i64
}

// =============================================================================
// LEVEL STORAGE
// =============================================================================

/// Read access to one level of intervals, sorted by start.
pub trait Level<'t> {
    type Item: Interval + 't;

    fn len(&self) -> usize;

    fn get(&self, index: usize) -> &'t Self::Item;

    /// First index in `lo..hi` for which `pred` is false.
    fn partition_point<P>(&self, lo: usize, hi: usize, mut pred: P) -> usize
    where
        P: FnMut(&Self::Item) -> bool,
    {
        let (mut lo, mut hi) = (lo, hi);
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if pred(self.get(mid)) {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        lo
    }
}

impl<'t, T: Interval + 't> Level<'t> for &'t [T] {
    type Item = T;

    fn len(&self) -> usize {
        <[T]>::len(self)
    }

    fn get(&self, index: usize) -> &'t T {
        let items: &'t [T] = *self;
        &items[index]
    }

    fn partition_point<P>(&self, lo: usize, hi: usize, pred: P) -> usize
    where
        P: FnMut(&T) -> bool,
    {
        let items: &'t [T] = *self;
        lo + items[lo..hi].partition_point(pred)
    }
}

/// Level stored as ids into the trace's zone arena.
#[derive(Debug, Clone, Copy)]
pub struct IndirectLevel<'t> {
    ids: &'t [ZoneId],
    arena: &'t [ZoneEvent],
}

impl<'t> IndirectLevel<'t> {
    #[must_use]
    pub fn new(ids: &'t [ZoneId], arena: &'t [ZoneEvent]) -> Self {
        Self { ids, arena }
    }
}

impl<'t> Level<'t> for IndirectLevel<'t> {
    type Item = ZoneEvent;

    fn len(&self) -> usize {
        self.ids.len()
    }

    fn get(&self, index: usize) -> &'t ZoneEvent {
        let arena = self.arena;
        &arena[self.ids[index].index()]
    }
}

// =============================================================================
// HIERARCHIES
// =============================================================================

/// A call tree the level walker can fold.
pub trait Hierarchy<'t> {
    type Item: Interval + 't;

    /// Effective end of `item`; open ends resolve to the trace's last time.
    fn end(&self, item: &Self::Item) -> i64;

    /// How far left of the window start intervals may still end.
    fn clip_margin(&self, min_vis_ns: i64) -> i64;

    /// Extra room right of the window end for interval starts.
    fn clip_slack(&self) -> i64;

    fn draw(&self, depth: u32, item: &'t Self::Item) -> TimelineDraw<'t>;

    fn draw_folded(&self, depth: u32, item: &'t Self::Item, end: i64, count: u32)
        -> TimelineDraw<'t>;

    /// Fold the level behind `handle` at `depth`, returning the deepest level reached.
    fn descend(&self, folder: &mut LevelFolder<'_, 't>, handle: ChildHandle, depth: u32) -> u32;
}

/// Instrumented zones.
struct Zones<'t> {
    trace: &'t Trace,
}

impl<'t> Zones<'t> {
    fn fold_level(&self, folder: &mut LevelFolder<'_, 't>, level: &'t ZoneLevel, depth: u32) -> u32 {
        match level {
            ZoneLevel::Direct(zones) => folder.fold(self, &zones.as_slice(), depth),
            ZoneLevel::Indirect(ids) => {
                let trace = self.trace;
                folder.fold(self, &IndirectLevel::new(ids, &trace.zones), depth)
            }
        }
    }
}

impl<'t> Hierarchy<'t> for Zones<'t> {
    type Item = ZoneEvent;

    fn end(&self, item: &ZoneEvent) -> i64 {
        self.trace.zone_end(item)
    }

    // Events may arrive late by up to the capture delay.
    fn clip_margin(&self, min_vis_ns: i64) -> i64 {
        self.trace.delay().max(min_vis_ns.saturating_mul(2))
    }

    fn clip_slack(&self) -> i64 {
        self.trace.resolution()
    }

    fn draw(&self, depth: u32, zone: &'t ZoneEvent) -> TimelineDraw<'t> {
        TimelineDraw::Zone { depth, zone }
    }

    fn draw_folded(&self, depth: u32, zone: &'t ZoneEvent, end: i64, count: u32) -> TimelineDraw<'t> {
        TimelineDraw::Folded { depth, zone, end, count }
    }

    fn descend(&self, folder: &mut LevelFolder<'_, 't>, handle: ChildHandle, depth: u32) -> u32 {
        let trace = self.trace;
        self.fold_level(folder, trace.zone_children(handle), depth)
    }
}

/// Call stacks reconstructed from sampling.
struct Ghosts<'t> {
    trace: &'t Trace,
}

impl<'t> Hierarchy<'t> for Ghosts<'t> {
    type Item = GhostZone;

    fn end(&self, item: &GhostZone) -> i64 {
        item.end
    }

    fn clip_margin(&self, min_vis_ns: i64) -> i64 {
        min_vis_ns.saturating_mul(2)
    }

    fn clip_slack(&self) -> i64 {
        0
    }

    fn draw(&self, depth: u32, zone: &'t GhostZone) -> TimelineDraw<'t> {
        TimelineDraw::Ghost { depth, zone }
    }

    fn draw_folded(&self, depth: u32, zone: &'t GhostZone, end: i64, count: u32) -> TimelineDraw<'t> {
        TimelineDraw::GhostFolded { depth, zone, end, count }
    }

    fn descend(&self, folder: &mut LevelFolder<'_, 't>, handle: ChildHandle, depth: u32) -> u32 {
        let trace = self.trace;
        folder.fold(self, &trace.ghost_children(handle), depth)
    }
}

// =============================================================================
// LEVEL WALKER
// =============================================================================

/// Folding state shared by every level of one pass.
pub struct LevelFolder<'a, 't> {
    ctx: &'a TimelineContext,
    min_vis_ns: i64,
    out: &'a mut Vec<TimelineDraw<'t>>,
}

impl<'a, 't> LevelFolder<'a, 't> {
    fn new(ctx: &'a TimelineContext, out: &'a mut Vec<TimelineDraw<'t>>) -> Self {
        debug_assert!(out.is_empty(), "zone draw buffer must be cleared between frames");
        Self { ctx, min_vis_ns: min_vis_ns(ctx, MIN_VIS_SIZE), out }
    }

    /// Fold one level at `depth`; returns `depth` when nothing is visible,
    /// otherwise the deepest level reached plus one.
    pub fn fold<H, L>(&mut self, hierarchy: &H, level: &L, depth: u32) -> u32
    where
        H: Hierarchy<'t> + ?Sized,
        L: Level<'t, Item = H::Item>,
    {
        let v_start = self.ctx.v_start;
        let v_end = self.ctx.v_end;
        let min_vis_ns = self.min_vis_ns;
        let len = level.len();

        let clip_start = v_start.saturating_sub(hierarchy.clip_margin(min_vis_ns)).max(0);
        let mut it = level.partition_point(0, len, |z| z.end().before(clip_start));
        if it == len {
            return depth;
        }
        let clip_end = v_end.saturating_add(hierarchy.clip_slack());
        let zitend = level.partition_point(it, len, |z| z.start() < clip_end);
        if it == zitend {
            return depth;
        }
        let first = level.get(it);
        if !first.end().is_closed() && hierarchy.end(first) < v_start {
            return depth;
        }
        if hierarchy.end(level.get(zitend - 1)) < v_start {
            return depth;
        }

        let mut max_depth = depth + 1;

        while it < zitend {
            let ev = level.get(it);
            let end = hierarchy.end(ev);
            if end.saturating_sub(ev.start()) < min_vis_ns {
                let mut next_time = end.saturating_add(min_vis_ns);
                let mut next = it + 1;
                loop {
                    next = level.partition_point(next, zitend, |z| z.end().before(next_time));
                    if next == zitend {
                        break;
                    }
                    let prev = next - 1;
                    if prev == it {
                        break;
                    }
                    let pt = hierarchy.end(level.get(prev));
                    let nt = hierarchy.end(level.get(next));
                    if nt.saturating_sub(pt) >= min_vis_ns {
                        break;
                    }
                    next_time = nt.saturating_add(min_vis_ns);
                }
                let run_end = hierarchy.end(level.get(next - 1));
                self.out.push(hierarchy.draw_folded(depth, ev, run_end, saturating_u32(next - it)));
                it = next;
            } else {
                if let Some(child) = ev.child() {
                    let d = hierarchy.descend(self, child, depth + 1);
                    max_depth = max_depth.max(d);
                }
                self.out.push(hierarchy.draw(depth, ev));
                it += 1;
            }
        }

        max_depth
    }
}

// =============================================================================
// ENTRY POINTS
// =============================================================================

/// Fold a thread's zone tree into `out`, starting at `depth`.
///
/// Returns the deepest level reached, or `depth` unchanged when nothing in
/// `level` is visible.
pub fn fold_zones<'t>(
    ctx: &TimelineContext,
    trace: &'t Trace,
    level: &'t ZoneLevel,
    depth: u32,
    out: &mut Vec<TimelineDraw<'t>>,
) -> u32 {
    let mut folder = LevelFolder::new(ctx, out);
    Zones { trace }.fold_level(&mut folder, level, depth)
}

/// Fold a thread's ghost-zone tree into `out`, starting at `depth`.
pub fn fold_ghosts<'t>(
    ctx: &TimelineContext,
    trace: &'t Trace,
    zones: &'t [GhostZone],
    depth: u32,
    out: &mut Vec<TimelineDraw<'t>>,
) -> u32 {
    let mut folder = LevelFolder::new(ctx, out);
    folder.fold(&Ghosts { trace }, &zones, depth)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace_data::ThreadData;

    /// 300ns over 90px: `MIN_VIS_SIZE` covers exactly 10ns.
    fn window() -> TimelineContext {
        TimelineContext::new(0, 300, 90.0, 1.0)
    }

    fn trace_with(zone_children: Vec<ZoneLevel>) -> Trace {
        Trace { last_time: 1_000, zone_children, ..Trace::default() }
    }

    fn direct(zones: &[(i64, i64)]) -> ZoneLevel {
        ZoneLevel::Direct(zones.iter().map(|&(s, e)| ZoneEvent::new(s, e)).collect())
    }

    #[test]
    fn test_min_vis_ns_scales_with_zoom_and_ui_scale() {
        assert_eq!(min_vis_ns(&window(), MIN_VIS_SIZE), 10);
        let scaled = TimelineContext::new(0, 300, 90.0, 2.0);
        assert_eq!(min_vis_ns(&scaled, MIN_VIS_SIZE), 20);
    }

    #[test]
    fn test_narrow_zones_fold_into_one_group() {
        let trace = trace_with(Vec::new());
        let level = direct(&[(0, 1), (2, 3), (100, 200)]);
        let mut out = Vec::new();

        let depth = fold_zones(&window(), &trace, &level, 0, &mut out);

        assert_eq!(depth, 1);
        assert_eq!(out.len(), 2);
        match out[0] {
            TimelineDraw::Folded { depth, zone, end, count } => {
                assert_eq!(depth, 0);
                assert_eq!(zone.start, 0);
                assert_eq!(end, 3);
                assert_eq!(count, 2);
            }
            other => panic!("expected folded group, got {other:?}"),
        }
        assert!(matches!(out[1], TimelineDraw::Zone { depth: 0, zone } if zone.start == 100));
    }

    #[test]
    fn test_empty_level_keeps_base_depth() {
        let trace = trace_with(Vec::new());
        let mut out = Vec::new();
        let level = ZoneLevel::default();
        assert_eq!(fold_zones(&window(), &trace, &level, 4, &mut out), 4);
        assert!(out.is_empty());
    }

    #[test]
    fn test_level_outside_window_emits_nothing() {
        let trace = trace_with(Vec::new());
        let level = direct(&[(500, 600), (700, 800)]);
        let mut out = Vec::new();
        assert_eq!(fold_zones(&window(), &trace, &level, 2, &mut out), 2);
        assert!(out.is_empty());

        let ctx = TimelineContext::new(10_000, 10_300, 90.0, 1.0);
        assert_eq!(fold_zones(&ctx, &trace, &level, 2, &mut out), 2);
        assert!(out.is_empty());
    }

    #[test]
    fn test_child_level_adds_depth() {
        let trace = trace_with(vec![direct(&[(20, 80)])]);
        let level = ZoneLevel::Direct(vec![ZoneEvent::new(0, 100).with_child(ChildHandle(0))]);
        let mut out = Vec::new();

        let depth = fold_zones(&window(), &trace, &level, 3, &mut out);

        assert_eq!(depth, 5);
        assert_eq!(out.len(), 2);
        // Children are emitted before their parent.
        assert!(matches!(out[0], TimelineDraw::Zone { depth: 4, zone } if zone.start == 20));
        assert!(matches!(out[1], TimelineDraw::Zone { depth: 3, zone } if zone.start == 0));
    }

    #[test]
    fn test_folded_zone_does_not_descend() {
        let trace = trace_with(vec![direct(&[(1, 2)])]);
        let level = ZoneLevel::Direct(vec![ZoneEvent::new(0, 5).with_child(ChildHandle(0))]);
        let mut out = Vec::new();

        assert_eq!(fold_zones(&window(), &trace, &level, 0, &mut out), 1);
        assert_eq!(out.len(), 1);
        assert!(out[0].is_folded());
    }

    #[test]
    fn test_indirect_level_matches_direct() {
        let spans = [(0, 1), (2, 3), (5, 6), (40, 90), (150, 151)];
        let mut trace = trace_with(Vec::new());
        trace.zones = spans.iter().map(|&(s, e)| ZoneEvent::new(s, e)).collect();
        let ids = (0..spans.len()).map(|i| ZoneId(u32::try_from(i).unwrap())).collect();
        let indirect = ZoneLevel::Indirect(ids);
        let direct = direct(&spans);

        let mut a = Vec::new();
        let mut b = Vec::new();
        let da = fold_zones(&window(), &trace, &indirect, 0, &mut a);
        let db = fold_zones(&window(), &trace, &direct, 0, &mut b);

        assert_eq!(da, db);
        assert_eq!(a, b);
        assert_eq!(a.len(), 3);
        assert_eq!(a[0].count(), 3);
    }

    #[test]
    fn test_open_zone_is_never_clipped_as_ended() {
        let trace = trace_with(Vec::new());
        let level = ZoneLevel::Direct(vec![ZoneEvent::new(0, 10), ZoneEvent::open(20)]);
        let ctx = TimelineContext::new(500, 800, 90.0, 1.0);
        let mut out = Vec::new();

        assert_eq!(fold_zones(&ctx, &trace, &level, 0, &mut out), 1);
        assert_eq!(out.len(), 1);
        assert!(matches!(out[0], TimelineDraw::Zone { zone, .. } if zone.start == 20));
    }

    #[test]
    fn test_open_zone_ending_before_window_is_skipped() {
        let mut trace = trace_with(Vec::new());
        trace.last_time = 400;
        let level = ZoneLevel::Direct(vec![ZoneEvent::open(20)]);
        let ctx = TimelineContext::new(500, 800, 90.0, 1.0);
        let mut out = Vec::new();

        assert_eq!(fold_zones(&ctx, &trace, &level, 0, &mut out), 0);
        assert!(out.is_empty());
    }

    #[test]
    fn test_delay_widens_left_clip_margin() {
        let level = direct(&[(0, 50), (60, 400)]);
        let ctx = TimelineContext::new(200, 500, 90.0, 1.0);

        let strict = trace_with(Vec::new());
        let mut out = Vec::new();
        fold_zones(&ctx, &strict, &level, 0, &mut out);
        assert_eq!(out.len(), 1);

        // Late delivery margin keeps a zone that ends before the window.
        let late = Trace { delay: 180, ..trace_with(Vec::new()) };
        let mut out = Vec::new();
        fold_zones(&ctx, &late, &level, 0, &mut out);
        assert_eq!(out.len(), 2);
        assert!(matches!(out[0], TimelineDraw::Zone { zone, .. } if zone.start == 0));
    }

    #[test]
    fn test_resolution_widens_right_clip() {
        let level = direct(&[(0, 100), (302, 400)]);

        let exact = trace_with(Vec::new());
        let mut out = Vec::new();
        fold_zones(&window(), &exact, &level, 0, &mut out);
        assert_eq!(out.len(), 1);

        let coarse = Trace { resolution: 5, ..trace_with(Vec::new()) };
        let mut out = Vec::new();
        fold_zones(&window(), &coarse, &level, 0, &mut out);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_wide_gap_splits_runs() {
        let trace = trace_with(Vec::new());
        let level = direct(&[(0, 2), (4, 6), (50, 52), (54, 56), (58, 60)]);
        let mut out = Vec::new();
        fold_zones(&window(), &trace, &level, 0, &mut out);

        let counts: Vec<u32> = out.iter().map(TimelineDraw::count).collect();
        assert_eq!(counts, vec![2, 3]);
        assert!(out.iter().all(TimelineDraw::is_folded));
        assert!(matches!(out[1], TimelineDraw::Folded { end: 60, .. }));
    }

    #[test]
    fn test_single_narrow_zone_folds_alone() {
        let trace = trace_with(Vec::new());
        let level = direct(&[(100, 102)]);
        let mut out = Vec::new();
        fold_zones(&window(), &trace, &level, 0, &mut out);
        assert!(matches!(out[0], TimelineDraw::Folded { count: 1, end: 102, .. }));
    }

    #[test]
    fn test_ghost_levels_fold_the_same_way() {
        let mut trace = trace_with(Vec::new());
        trace.ghost_children = vec![vec![GhostZone::new(10, 60), GhostZone::new(61, 62)]];
        let mut root = GhostZone::new(0, 200);
        root.child = Some(ChildHandle(0));
        let ghosts = vec![root, GhostZone::new(201, 202), GhostZone::new(203, 204)];
        let mut thread = ThreadData::new(1, "t");
        thread.ghost_zones = ghosts;
        trace.threads.push(thread);
        let mut out = Vec::new();

        let depth = fold_ghosts(&window(), &trace, &trace.threads[0].ghost_zones, 0, &mut out);

        assert_eq!(depth, 2);
        assert_eq!(out.len(), 4);
        assert!(matches!(out[0], TimelineDraw::Ghost { depth: 1, .. }));
        assert!(matches!(out[1], TimelineDraw::GhostFolded { depth: 1, count: 1, end: 62, .. }));
        assert!(matches!(out[2], TimelineDraw::Ghost { depth: 0, .. }));
        assert!(matches!(out[3], TimelineDraw::GhostFolded { depth: 0, count: 2, end: 204, .. }));
    }

    #[test]
    fn test_refold_is_identical() {
        let trace = trace_with(vec![direct(&[(10, 11), (12, 13), (20, 90)])]);
        let level = ZoneLevel::Direct(vec![
            ZoneEvent::new(0, 100).with_child(ChildHandle(0)),
            ZoneEvent::new(101, 102),
            ZoneEvent::new(150, 290),
        ]);
        let mut first = Vec::new();
        let mut second = Vec::new();
        let d1 = fold_zones(&window(), &trace, &level, 0, &mut first);
        let d2 = fold_zones(&window(), &trace, &level, 0, &mut second);
        assert_eq!(d1, d2);
        assert_eq!(first, second);
    }

    #[test]
    fn test_zones_at_end_of_clock_fold_without_overflow() {
        let trace = Trace { last_time: i64::MAX, ..Trace::default() };
        let level = direct(&[(i64::MAX - 3, i64::MAX - 2), (i64::MAX - 1, i64::MAX)]);
        let ctx = TimelineContext::new(i64::MAX - 300, i64::MAX, 90.0, 1.0);
        let mut out = Vec::new();

        let depth = fold_zones(&ctx, &trace, &level, 0, &mut out);

        assert_eq!(depth, 1);
        assert_eq!(out.len(), 2);
        assert!(matches!(out[0], TimelineDraw::Folded { count: 1, end, .. } if end == i64::MAX - 2));
        assert!(matches!(out[1], TimelineDraw::Folded { count: 1, end: i64::MAX, .. }));
    }
}
