//! # Strata - Visibility Folding for Profiler Timelines
//!
//! Strata turns an already recorded trace into the draw records a timeline
//! view needs for one frame. A trace may hold millions of intervals per
//! thread; at any zoom level most of them are narrower than a pixel. Each
//! frame, strata clips every thread's sequences to the visible window and
//! folds runs of sub-pixel intervals into single aggregate records, so the
//! cost of a frame follows the number of pixels, not the size of the trace.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                  Replay document (trace.json)                   │
//! └───────────────────────┬─────────────────────────────────────────┘
//!                         │ serde_json, validated once
//!                         ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Trace (immutable)                           │
//! │  zone levels · ghost zones · context switches · samples         │
//! └───────────────────────┬─────────────────────────────────────────┘
//!                         │ borrowed by every frame
//!                         ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  Timeline: one ThreadRow per thread                             │
//! │                                                                 │
//! │   TimelineContext ──▶ row jobs ──▶ TaskDispatch (rayon scope)   │
//! │                        │                                        │
//! │        ┌───────────────┼──────────────────┐                     │
//! │        ▼               ▼                  ▼                     │
//! │  ┌───────────┐  ┌──────────────┐  ┌──────────────┐              │
//! │  │ zones or  │  │   context    │  │   samples    │              │
//! │  │  ghosts   │  │   switches   │  │              │              │
//! │  └─────┬─────┘  └──────┬───────┘  └──────┬───────┘              │
//! │        ▼               ▼                 ▼                      │
//! │   TimelineDraw   ContextSwitchDraw   SamplesDraw   (per row)    │
//! └───────────────────────┬─────────────────────────────────────────┘
//!                         │ read once, then draw_finished()
//!                         ▼
//! ┌──────────────────────────────┐   ┌──────────────────────────────┐
//! │        TUI (ratatui)         │   │   Headless fold report       │
//! └──────────────────────────────┘   └──────────────────────────────┘
//! ```
//!
//! ## Module Structure
//!
//! - [`trace_data`]: the immutable trace store, its replay loader and the
//!   queries the folders use (open-end resolution, child lookup)
//! - [`folding`]: the zone, ghost-zone, context-switch and sample folders
//!   and the draw records they produce
//! - [`timeline`]: the per-frame view window, thread rows and summaries
//! - [`dispatch`]: fork/join execution of a frame's folding jobs
//! - [`report`]: headless per-thread fold statistics
//! - [`tui`]: interactive terminal viewer
//! - [`cli`]: command-line argument parsing
//! - [`domain`]: shared newtypes and error types
//!
//! ## Folding Thresholds
//!
//! | records          | folded below |
//! |------------------|--------------|
//! | zones, ghosts    | 3 px         |
//! | context switches | 4 px         |
//! | samples          | 5 px         |
//!
//! Pixel thresholds are multiplied by the UI scale factor before being
//! converted to nanoseconds at the current zoom.
//!
//! ## Typical Usage
//!
//! ```bash
//! # Browse a recorded trace
//! ./strata capture.json
//!
//! # Fold one window at 1920 px and print what would be drawn
//! ./strata capture.json --headless --start 0 --end 5000000
//! ```

// Expose modules for testing
pub mod cli;
pub mod dispatch;
pub mod domain;
pub mod folding;
pub mod report;
pub mod timeline;
pub mod trace_data;
pub mod tui;
