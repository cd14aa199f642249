//! Domain types providing compile-time safety and self-documentation
//!
//! Trace times are signed nanoseconds: the capture clock may start before the
//! first recorded event, and "no event yet" is encoded as `-1` by the range
//! queries.

// Nanosecond values are formatted as floating point for display
#![allow(clippy::cast_precision_loss)]

use std::fmt;

/// Thread ID
///
/// Represents the id the capture layer assigned to a traced thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ThreadId(pub u64);

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TID:{}", self.0)
    }
}

/// Timestamp in nanoseconds
///
/// Represents an absolute point on the trace clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(pub i64);

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&Duration(self.0), f)
    }
}

/// Duration in nanoseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Duration(pub i64);

impl Duration {
    /// Convert to microseconds (f64)
    pub fn as_micros(self) -> f64 {
        self.0 as f64 / 1_000.0
    }

    /// Convert to milliseconds (f64)
    pub fn as_millis(self) -> f64 {
        self.0 as f64 / 1_000_000.0
    }

    /// Convert to seconds (f64)
    pub fn as_seconds(self) -> f64 {
        self.0 as f64 / 1_000_000_000.0
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let abs = self.0.unsigned_abs();
        if abs < 1_000 {
            write!(f, "{} ns", self.0)
        } else if abs < 1_000_000 {
            write!(f, "{:.2} us", self.as_micros())
        } else if abs < 1_000_000_000 {
            write!(f, "{:.2} ms", self.as_millis())
        } else {
            write!(f, "{:.2} s", self.as_seconds())
        }
    }
}
