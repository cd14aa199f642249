//! Visibility folding.
//!
//! Each pass takes one sorted source sequence and the frame's
//! [`TimelineContext`](crate::timeline::TimelineContext), clips it to the
//! visible window and merges everything narrower than a few pixels into
//! aggregate records. The passes only read the trace and only write the
//! buffer they are handed, so any number of them can run at once.
//!
//! | pass                       | source                 | threshold |
//! |----------------------------|------------------------|-----------|
//! | [`fold_zones`]             | zone hierarchy         | 3 px      |
//! | [`fold_ghosts`]            | ghost-zone hierarchy   | 3 px      |
//! | [`fold_context_switches`]  | running regions        | 4 px      |
//! | [`fold_samples`]           | call-stack samples     | 5 px      |
//!
//! Output buffers must be empty when a pass starts. Clearing them after the
//! frame has been drawn is the consumer's job.

pub mod context_switches;
pub mod draw;
pub mod samples;
pub mod zones;

pub use context_switches::{fold_context_switches, MIN_CTX_SIZE};
pub use draw::{ContextSwitchDraw, ContextSwitchDrawKind, SamplesDraw, TimelineDraw};
pub use samples::{fold_samples, MIN_SAMPLE_SIZE};
pub use zones::{fold_ghosts, fold_zones, MIN_VIS_SIZE};
