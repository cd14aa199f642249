//! # Shared Trace Data Model
//!
//! Plain data types describing an already-materialized trace: nested call
//! intervals (zones), sampled call-stack reconstructions (ghost zones),
//! thread run/wait regions (context switches) and call-stack samples.
//!
//! The types carry no behaviour beyond ordering and accessors so they can be
//! shared between the trace store, the folding passes and any external tool
//! that writes replay documents. Enable the `serde` feature for
//! `Serialize`/`Deserialize` implementations.
//!
//! ## Key Types
//!
//! - [`ZoneEnd`] - End of an interval that may still be running
//! - [`ZoneEvent`] - Instrumented call interval
//! - [`GhostZone`] - Call interval reconstructed from sampling
//! - [`ContextSwitchRegion`] - Period a thread spent running on a CPU
//! - [`SampleData`] - Timestamped call-stack sample
//! - [`Interval`] - Accessor capability shared by zones and ghost zones

use core::cmp::Ordering;
use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// ============================================================================
// Handles
// ============================================================================

/// Stable index of a children level in the trace's children arena.
///
/// Children are never referenced by address: the arena may grow while the
/// trace is being captured, indices stay valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct ChildHandle(pub u32);

impl ChildHandle {
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Stable index of a zone in the trace's zone arena (indirect levels).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct ZoneId(pub u32);

impl ZoneId {
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Opaque call-stack handle resolved by the symbol layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct CallstackId(pub u32);

impl fmt::Display for CallstackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CS#{}", self.0)
    }
}

// ============================================================================
// Interval ends
// ============================================================================

/// End of an interval.
///
/// `Open` means the interval had not finished when the trace was captured; it
/// extends to the trace's last known time. `Open` orders after every closed
/// end so that clipping never treats a running interval as already ended.
///
/// Serialized as an optional integer: `null` is `Open`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(from = "Option<i64>", into = "Option<i64>")
)]
pub enum ZoneEnd {
    Closed(i64),
    Open,
}

impl ZoneEnd {
    #[must_use]
    pub fn is_closed(self) -> bool {
        matches!(self, ZoneEnd::Closed(_))
    }

    /// Closed end, or `None` while still running.
    #[must_use]
    pub fn closed(self) -> Option<i64> {
        match self {
            ZoneEnd::Closed(t) => Some(t),
            ZoneEnd::Open => None,
        }
    }

    /// Resolve against the trace's last known time.
    #[must_use]
    pub fn or_last(self, last_time: i64) -> i64 {
        self.closed().unwrap_or(last_time)
    }

    /// True when the end lies strictly before `t`. Open ends never do.
    #[must_use]
    pub fn before(self, t: i64) -> bool {
        self < ZoneEnd::Closed(t)
    }
}

impl Ord for ZoneEnd {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (ZoneEnd::Closed(a), ZoneEnd::Closed(b)) => a.cmp(b),
            (ZoneEnd::Closed(_), ZoneEnd::Open) => Ordering::Less,
            (ZoneEnd::Open, ZoneEnd::Closed(_)) => Ordering::Greater,
            (ZoneEnd::Open, ZoneEnd::Open) => Ordering::Equal,
        }
    }
}

impl PartialOrd for ZoneEnd {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<Option<i64>> for ZoneEnd {
    fn from(end: Option<i64>) -> Self {
        end.map_or(ZoneEnd::Open, ZoneEnd::Closed)
    }
}

impl From<ZoneEnd> for Option<i64> {
    fn from(end: ZoneEnd) -> Self {
        end.closed()
    }
}

// ============================================================================
// Events
// ============================================================================

/// Accessor capability shared by every nested interval kind.
pub trait Interval {
    fn start(&self) -> i64;
    fn end(&self) -> ZoneEnd;
    fn child(&self) -> Option<ChildHandle>;
}

/// Instrumented call interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ZoneEvent {
    pub start: i64,
    pub end: ZoneEnd,
    /// Source location id, resolved by the presentation layer.
    #[cfg_attr(feature = "serde", serde(default))]
    pub srcloc: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub child: Option<ChildHandle>,
}

impl ZoneEvent {
    #[must_use]
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end: ZoneEnd::Closed(end), srcloc: 0, child: None }
    }

    #[must_use]
    pub fn open(start: i64) -> Self {
        Self { start, end: ZoneEnd::Open, srcloc: 0, child: None }
    }

    #[must_use]
    pub fn with_child(mut self, child: ChildHandle) -> Self {
        self.child = Some(child);
        self
    }
}

impl Interval for ZoneEvent {
    fn start(&self) -> i64 {
        self.start
    }

    fn end(&self) -> ZoneEnd {
        self.end
    }

    fn child(&self) -> Option<ChildHandle> {
        self.child
    }
}

/// Call interval reconstructed from periodic stack samples.
///
/// Ghost zones are built after capture and are therefore always closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GhostZone {
    pub start: i64,
    pub end: i64,
    /// Symbol frame id of the reconstructed call.
    #[cfg_attr(feature = "serde", serde(default))]
    pub frame: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub child: Option<ChildHandle>,
}

impl GhostZone {
    #[must_use]
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end, frame: 0, child: None }
    }
}

impl Interval for GhostZone {
    fn start(&self) -> i64 {
        self.start
    }

    fn end(&self) -> ZoneEnd {
        ZoneEnd::Closed(self.end)
    }

    fn child(&self) -> Option<ChildHandle> {
        self.child
    }
}

/// Period a thread spent running. The gap to the next region is a wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ContextSwitchRegion {
    pub start: i64,
    pub end: ZoneEnd,
    #[cfg_attr(feature = "serde", serde(default))]
    pub cpu: u16,
}

impl ContextSwitchRegion {
    #[must_use]
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end: ZoneEnd::Closed(end), cpu: 0 }
    }
}

/// Timestamped call-stack sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SampleData {
    pub time: i64,
    pub callstack: CallstackId,
}

impl SampleData {
    #[must_use]
    pub fn new(time: i64, callstack: u32) -> Self {
        Self { time, callstack: CallstackId(callstack) }
    }
}
