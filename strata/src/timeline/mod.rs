//! Timeline model: the view window, per-thread rows and their summaries.

pub mod context;
pub mod summary;
pub mod thread_row;

pub use context::TimelineContext;
pub use summary::ThreadSummary;
pub use thread_row::{ThreadRow, Timeline, ViewOptions};
