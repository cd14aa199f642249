//! Per-thread activity summary.

// Shares are percentages computed from nanosecond counts
#![allow(clippy::cast_precision_loss)]

use std::fmt;

use crate::domain::{Duration, ThreadId, Timestamp};

/// What a thread did over the whole trace.
#[derive(Debug, Clone, PartialEq)]
pub struct ThreadSummary {
    pub id: ThreadId,
    pub name: String,
    pub is_fiber: bool,
    /// First recorded activity; `None` for a thread with nothing recorded.
    pub appeared_at: Option<Timestamp>,
    pub last_event: Option<Timestamp>,
    pub lifetime: Duration,
    /// Lifetime as a percentage of the trace length.
    pub trace_share: f64,
    /// Time spent scheduled on a CPU, when context switches were captured.
    pub running_time: Option<Duration>,
    /// Running time as a percentage of the lifetime.
    pub running_share: Option<f64>,
    /// Zones at every depth.
    pub zone_count: u64,
    pub top_level_zones: usize,
    pub messages: usize,
    pub running_regions: usize,
    pub samples: usize,
    pub kernel_samples: u64,
}

impl ThreadSummary {
    /// `part` as a percentage of `whole`, zero when `whole` is empty.
    #[must_use]
    pub fn percent(part: i64, whole: i64) -> f64 {
        if whole <= 0 {
            0.0
        } else {
            part as f64 / whole as f64 * 100.0
        }
    }
}

impl fmt::Display for ThreadSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?}", self.id, self.name)?;
        if self.is_fiber {
            write!(f, " (fiber)")?;
        }
        match (self.appeared_at, self.last_event) {
            (Some(first), Some(last)) => write!(
                f,
                " | {first} .. {last} | lifetime {} ({:.2}%)",
                self.lifetime, self.trace_share
            )?,
            _ => write!(f, " | no activity")?,
        }
        if let (Some(running), Some(share)) = (self.running_time, self.running_share) {
            write!(f, " | running {running} ({share:.2}%) in {} regions", self.running_regions)?;
        }
        write!(
            f,
            " | zones {} ({} top-level) | messages {} | samples {}",
            self.zone_count, self.top_level_zones, self.messages, self.samples
        )?;
        if self.kernel_samples > 0 {
            write!(f, " (+{} kernel)", self.kernel_samples)?;
        }
        Ok(())
    }
}
