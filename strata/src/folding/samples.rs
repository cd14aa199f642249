//! Call-stack sample folding.
//!
//! Samples are a flat, dense sequence, so every sample is a folding
//! candidate: consecutive samples closer than [`MIN_SAMPLE_SIZE`] pixels are
//! grouped into one run. Singletons are emitted as runs of one.

use strata_common::SampleData;

use super::draw::{saturating_u32, SamplesDraw};
use super::zones::min_vis_ns;
use crate::timeline::TimelineContext;

/// Samples closer than this many (scaled) pixels share a marker.
pub const MIN_SAMPLE_SIZE: f32 = 5.0;

/// Group the visible samples into runs and append them to `out`.
pub fn fold_samples(ctx: &TimelineContext, samples: &[SampleData], out: &mut Vec<SamplesDraw>) {
    debug_assert!(out.is_empty(), "sample draw buffer must be cleared between frames");

    let min_vis_ns = min_vis_ns(ctx, MIN_SAMPLE_SIZE);

    let clip_start = ctx.v_start.saturating_sub(min_vis_ns);
    let mut it = samples.partition_point(|s| s.time < clip_start);
    if it == samples.len() {
        return;
    }
    let itend = it + samples[it..].partition_point(|s| s.time < ctx.v_end);
    if it == itend {
        return;
    }

    while it < itend {
        let mut next = it + 1;
        if next != itend {
            let mut next_time = samples[it].time.saturating_add(min_vis_ns);
            loop {
                next += samples[next..itend].partition_point(|s| s.time < next_time);
                if next == itend {
                    break;
                }
                let prev = next - 1;
                if prev == it {
                    break;
                }
                let pt = samples[prev].time;
                let nt = samples[next].time;
                if nt.saturating_sub(pt) >= min_vis_ns {
                    break;
                }
                next_time = nt.saturating_add(min_vis_ns);
            }
        }
        out.push(SamplesDraw { index: saturating_u32(it), count: saturating_u32(next - it) });
        it = next;
    }
}
