//! Context-switch folding.
//!
//! A thread's running regions alternate with implicit waiting gaps. Each
//! visible region becomes a `Running` record, or joins a folded group when it
//! is narrower than [`MIN_CTX_SIZE`] pixels; every record after the first is
//! preceded by a `Waiting` record for the gap in front of it.
//!
//! ## Cross-iteration state
//!
//! Two values are carried from one region to the next:
//!
//! - `prev`: the last region already accounted for, which the next waiting
//!   gap starts from
//! - `minpx`: right pixel edge of the last folded group; the next waiting
//!   marker may not start left of it, so it never renders under the fold
//!
//! ```text
//! regions   ██  █ █      ████████        █
//! records   [FoldedMulti][Waiting][Running][Waiting][FoldedOne]
//!                       ^minpx
//! ```

// Pixel positions are f64 internally and f32 in the draw records
#![allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]

use strata_common::{CallstackId, ContextSwitchRegion, SampleData};

use super::draw::{saturating_u32, ContextSwitchDraw, ContextSwitchDrawKind};
use crate::timeline::TimelineContext;
use crate::trace_data::{ContextSwitch, Trace};

/// Regions narrower than this many pixels are folded.
pub const MIN_CTX_SIZE: f64 = 4.0;

/// How far left of the row a fold may start, and right of it `minpx` may reach.
const OVERSCAN_PX: f64 = 10.0;

/// Fold a thread's running regions into `out`.
///
/// `samples` are the thread's call-stack samples; a sample taken exactly
/// where a wait begins or ends is attached to the waiting record.
pub fn fold_context_switches<'t>(
    ctx: &TimelineContext,
    trace: &'t Trace,
    switches: &'t ContextSwitch,
    samples: &[SampleData],
    out: &mut Vec<ContextSwitchDraw<'t>>,
) {
    debug_assert!(out.is_empty(), "context switch draw buffer must be cleared between frames");

    let w = f64::from(ctx.w);
    let pxns = ctx.pxns;
    let nspx = ctx.nspx;
    let v_start = ctx.v_start;
    let v_end = ctx.v_end;

    let regions = switches.regions.as_slice();
    let mut it = regions.partition_point(|r| r.end.before(v_start.max(0)));
    if it == regions.len() {
        return;
    }
    // One region on each side so the adjoining waits are drawn.
    if it != 0 {
        it -= 1;
    }
    let mut citend = it + regions[it..].partition_point(|r| r.start < v_end);
    if it == citend {
        return;
    }
    if citend != regions.len() {
        citend += 1;
    }

    let min_ctx_ns = MIN_CTX_SIZE * nspx;
    let px_width = |region: &ContextSwitchRegion| {
        (trace.region_end(region).saturating_sub(region.start) as f64 * pxns).max(pxns * 0.5)
    };

    let mut prev: Option<&'t ContextSwitchRegion> = None;
    let mut minpx = -OVERSCAN_PX;

    while it < citend {
        let ev = &regions[it];
        if let Some(prev) = prev {
            let wait_stack = wait_stack(samples, regions, it);
            out.push(ContextSwitchDraw {
                region: ev,
                minpx: minpx as f32,
                kind: ContextSwitchDrawKind::Waiting { prev, wait_stack },
            });
        }

        let end = trace.region_end(ev);
        if px_width(ev) < MIN_CTX_SIZE {
            let px0 = (ev.start.saturating_sub(v_start) as f64 * pxns).max(-OVERSCAN_PX);
            let first = it;
            let mut rend;
            let mut next_time = (end as f64 + min_ctx_ns) as i64;
            loop {
                let prev_it = it;
                it += regions[it..citend].partition_point(|r| r.end.before(next_time));
                if it == prev_it {
                    it += 1;
                }
                rend = trace.region_end(&regions[it - 1]);
                if it == citend {
                    break;
                }
                let next = &regions[it];
                let nend = trace.region_end(next);
                if nend.saturating_sub(rend) as f64 >= min_ctx_ns * 2.0 || px_width(next) >= MIN_CTX_SIZE {
                    break;
                }
                next_time = (nend as f64 + nspx) as i64;
            }
            let num = it - first;
            minpx = (rend.saturating_sub(v_start) as f64 * pxns).max(px0 + MIN_CTX_SIZE).min(w + OVERSCAN_PX);
            let kind = if num == 1 {
                ContextSwitchDrawKind::FoldedOne { rend }
            } else {
                ContextSwitchDrawKind::FoldedMulti { rend, num: saturating_u32(num) }
            };
            out.push(ContextSwitchDraw { region: ev, minpx: minpx as f32, kind });
            prev = Some(&regions[it - 1]);
        } else {
            out.push(ContextSwitchDraw {
                region: ev,
                minpx: minpx as f32,
                kind: ContextSwitchDrawKind::Running,
            });
            prev = Some(ev);
            it += 1;
        }
    }
}

/// Call stack sampled where the wait before `regions[index]` ended, or else
/// where it began.
fn wait_stack(
    samples: &[SampleData],
    regions: &[ContextSwitchRegion],
    index: usize,
) -> Option<CallstackId> {
    let sampled_at = |t: i64| {
        let i = samples.partition_point(|s| s.time < t);
        samples.get(i).filter(|s| s.time == t).map(|s| s.callstack)
    };
    sampled_at(regions[index].start).or_else(|| {
        index.checked_sub(1).and_then(|p| regions[p].end.closed()).and_then(sampled_at)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_common::ZoneEnd;

    fn switches(spans: &[(i64, i64)]) -> ContextSwitch {
        ContextSwitch::new(spans.iter().map(|&(s, e)| ContextSwitchRegion::new(s, e)).collect())
    }

    fn trace() -> Trace {
        Trace { last_time: 5_000, ..Trace::default() }
    }

    fn kinds(out: &[ContextSwitchDraw<'_>]) -> Vec<&'static str> {
        out.iter()
            .map(|d| match d.kind {
                ContextSwitchDrawKind::Running => "running",
                ContextSwitchDrawKind::Waiting { .. } => "waiting",
                ContextSwitchDrawKind::FoldedOne { .. } => "folded_one",
                ContextSwitchDrawKind::FoldedMulti { .. } => "folded_multi",
            })
            .collect()
    }

    #[test]
    fn test_wide_regions_alternate_with_waits() {
        // 10ns/px: 50ns regions are 5px wide.
        let ctx = TimelineContext::new(0, 1_100, 110.0, 1.0);
        let trace = trace();
        let cs = switches(&[(0, 50), (1_000, 1_050)]);
        let mut out = Vec::new();

        fold_context_switches(&ctx, &trace, &cs, &[], &mut out);

        assert_eq!(kinds(&out), vec!["running", "waiting", "running"]);
        assert_eq!(out[0].region.start, 0);
        assert_eq!(out[2].region.start, 1_000);
        match out[1].kind {
            ContextSwitchDrawKind::Waiting { prev, wait_stack } => {
                assert_eq!(prev.end, ZoneEnd::Closed(50));
                assert_eq!(out[1].region.start, 1_000);
                assert_eq!(wait_stack, None);
            }
            other => panic!("expected waiting gap, got {other:?}"),
        }
        assert!(out.iter().all(|d| d.minpx == -10.0));
    }

    #[test]
    fn test_narrow_isolated_regions_fold_alone() {
        // 25ns/px: MIN_CTX_SIZE covers 100ns, 50ns regions are 2px wide.
        let ctx = TimelineContext::new(0, 1_100, 44.0, 1.0);
        let trace = trace();
        let cs = switches(&[(0, 50), (1_000, 1_050)]);
        let mut out = Vec::new();

        fold_context_switches(&ctx, &trace, &cs, &[], &mut out);

        assert_eq!(kinds(&out), vec!["folded_one", "waiting", "folded_one"]);
        assert!(matches!(out[0].kind, ContextSwitchDrawKind::FoldedOne { rend: 50 }));
        assert!(matches!(out[2].kind, ContextSwitchDrawKind::FoldedOne { rend: 1_050 }));
        // The fold is pushed to MIN_CTX_SIZE px past its start; the wait starts there.
        assert_eq!(out[0].minpx, 4.0);
        assert_eq!(out[1].minpx, 4.0);
    }

    #[test]
    fn test_burst_of_narrow_regions_folds_into_one_group() {
        // 10ns/px: MIN_CTX_SIZE covers 40ns.
        let ctx = TimelineContext::new(0, 1_000, 100.0, 1.0);
        let trace = trace();
        let cs = switches(&[(100, 110), (115, 120), (125, 130), (140, 145), (500, 700)]);
        let mut out = Vec::new();

        fold_context_switches(&ctx, &trace, &cs, &[], &mut out);

        assert_eq!(kinds(&out), vec!["folded_multi", "waiting", "running"]);
        assert!(matches!(out[0].kind, ContextSwitchDrawKind::FoldedMulti { rend: 145, num: 4 }));
        match out[1].kind {
            ContextSwitchDrawKind::Waiting { prev, .. } => assert_eq!(prev.start, 140),
            other => panic!("expected waiting gap, got {other:?}"),
        }
        assert!((out[1].minpx - 14.5).abs() < 1e-4);
        assert_eq!(out[2].minpx, out[1].minpx);
    }

    #[test]
    fn test_wide_neighbour_is_not_absorbed() {
        // 10ns/px: the 50ns region right after a fold is 5px wide.
        let ctx = TimelineContext::new(0, 1_000, 100.0, 1.0);
        let trace = trace();
        let cs = switches(&[(100, 110), (115, 165)]);
        let mut out = Vec::new();

        fold_context_switches(&ctx, &trace, &cs, &[], &mut out);

        assert_eq!(kinds(&out), vec!["folded_one", "waiting", "running"]);
    }

    #[test]
    fn test_neighbours_outside_window_are_included() {
        let ctx = TimelineContext::new(1_000, 2_000, 100.0, 1.0);
        let trace = trace();
        let cs = switches(&[(0, 100), (200, 300), (1_200, 1_500), (2_500, 2_600), (3_000, 3_100)]);
        let mut out = Vec::new();

        fold_context_switches(&ctx, &trace, &cs, &[], &mut out);

        let starts: Vec<i64> = out
            .iter()
            .filter(|d| !matches!(d.kind, ContextSwitchDrawKind::Waiting { .. }))
            .map(|d| d.region.start)
            .collect();
        assert_eq!(starts, vec![200, 1_200, 2_500]);
        assert_eq!(kinds(&out), vec!["running", "waiting", "running", "waiting", "running"]);
    }

    #[test]
    fn test_open_region_reaches_trace_end() {
        let ctx = TimelineContext::new(4_000, 4_500, 100.0, 1.0);
        let trace = trace();
        let cs = ContextSwitch::new(vec![
            ContextSwitchRegion::new(0, 100),
            ContextSwitchRegion { start: 3_000, end: ZoneEnd::Open, cpu: 2 },
        ]);
        let mut out = Vec::new();

        fold_context_switches(&ctx, &trace, &cs, &[], &mut out);

        assert_eq!(kinds(&out), vec!["running", "waiting", "running"]);
        assert_eq!(out[2].region.end, ZoneEnd::Open);
    }

    #[test]
    fn test_nothing_visible() {
        let trace = trace();
        let mut out = Vec::new();
        let ctx = TimelineContext::new(0, 1_000, 100.0, 1.0);
        let cs = ContextSwitch::default();
        fold_context_switches(&ctx, &trace, &cs, &[], &mut out);
        assert!(out.is_empty());

        let cs = switches(&[(0, 100), (200, 300)]);
        let late = TimelineContext::new(4_000, 4_500, 100.0, 1.0);
        fold_context_switches(&late, &trace, &cs, &[], &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn test_wait_stack_prefers_wake_up_sample() {
        let ctx = TimelineContext::new(0, 1_100, 110.0, 1.0);
        let trace = trace();
        let cs = switches(&[(0, 50), (1_000, 1_050), (2_000, 2_050)]);
        let samples = vec![
            SampleData::new(50, 7),
            SampleData::new(1_000, 8),
            SampleData::new(1_050, 9),
        ];
        let mut out = Vec::new();

        fold_context_switches(&ctx, &trace, &cs, &samples, &mut out);

        let stacks: Vec<Option<CallstackId>> = out
            .iter()
            .filter_map(|d| match d.kind {
                ContextSwitchDrawKind::Waiting { wait_stack, .. } => Some(wait_stack),
                _ => None,
            })
            .collect();
        assert_eq!(stacks, vec![Some(CallstackId(8)), Some(CallstackId(9))]);
    }

    #[test]
    fn test_wait_stack_missing_is_none() {
        let regions = vec![ContextSwitchRegion::new(0, 10), ContextSwitchRegion::new(20, 30)];
        let samples = vec![SampleData::new(15, 1)];
        assert_eq!(wait_stack(&samples, &regions, 1), None);
        assert_eq!(wait_stack(&samples, &regions, 0), None);
        assert_eq!(wait_stack(&[SampleData::new(10, 4)], &regions, 1), Some(CallstackId(4)));
    }

    #[test]
    fn test_every_region_accounted_once() {
        // 3ns/px: regions of 13ns and up stay unfolded, the rest fold.
        let spans: Vec<(i64, i64)> = (0..300).map(|i| (i * 17, i * 17 + 3 + (i % 7) * 2)).collect();
        let cs = switches(&spans);
        let trace = trace();
        let ctx = TimelineContext::new(600, 4_200, 1_200.0, 1.0);
        let mut out = Vec::new();

        fold_context_switches(&ctx, &trace, &cs, &[], &mut out);

        assert!(out.iter().any(|d| d.kind == ContextSwitchDrawKind::Running));
        assert!(out.iter().any(|d| d.region_count() > 1));
        // Overlapping regions plus one neighbour on each side.
        let overlapping = spans.iter().filter(|&&(s, e)| e >= 600 && s < 4_200).count();
        let represented: u32 = out.iter().map(ContextSwitchDraw::region_count).sum();
        assert_eq!(represented as usize, overlapping + 2);

        let mut minpx = f32::MIN;
        for draw in &out {
            assert!(draw.minpx >= minpx);
            minpx = draw.minpx;
        }
    }
}
