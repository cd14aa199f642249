//! Structured error types for strata
//!
//! Using thiserror for automatic Display implementation and error chaining.
//! Folding itself never fails; these errors belong to the trace store and
//! the terminal front end.

use super::types::ThreadId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TraceError {
    #[error("{what} is not sorted by time at index {index}")]
    Unsorted { what: String, index: usize },

    #[error("{what} references child level {handle} but only {len} levels exist")]
    DanglingChild { what: String, handle: u32, len: usize },

    #[error("{what} references zone {zone} but the arena holds {len} zones")]
    DanglingZone { what: String, zone: u32, len: usize },

    #[error("{what} child level {handle} is its own ancestor")]
    CyclicChildren { what: &'static str, handle: u32 },

    #[error("context switches recorded for unknown thread {0}")]
    UnknownThread(ThreadId),

    #[error("trace time range is inverted: first {first} > last {last}")]
    InvertedRange { first: i64, last: i64 },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Command-line input that parses but cannot be acted on.
#[derive(Error, Debug)]
pub enum UsageError {
    #[error("invalid window {start}..{end} at {width} px")]
    InvalidWindow { start: i64, end: i64, width: f32 },
}

#[derive(Error, Debug)]
pub enum TuiError {
    #[error("Trace has no threads to display")]
    EmptyTrace,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
