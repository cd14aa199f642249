//! Per-frame view window geometry.
//!
//! A [`TimelineContext`] is built once per frame by whoever owns the
//! scroll/zoom state and is only read by the folding passes.

// Nanosecond/pixel conversions are inherently lossy
#![allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]

/// Visible time range and its mapping onto pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimelineContext {
    /// Row width in pixels.
    pub w: f32,
    pub v_start: i64,
    pub v_end: i64,
    /// Nanoseconds per pixel.
    pub nspx: f64,
    /// Pixels per nanosecond.
    pub pxns: f64,
    /// Global UI scale factor.
    pub scale: f32,
}

impl TimelineContext {
    /// Window `[v_start, v_end]` spread over `width` pixels.
    ///
    /// Degenerate inputs are widened to one nanosecond and one pixel.
    #[must_use]
    pub fn new(v_start: i64, v_end: i64, width: f32, scale: f32) -> Self {
        let v_start = v_start.min(i64::MAX - 1);
        let v_end = v_end.max(v_start + 1);
        let w = width.max(1.0);
        let nspx = v_end.saturating_sub(v_start) as f64 / f64::from(w);
        Self { w, v_start, v_end, nspx, pxns: 1.0 / nspx, scale }
    }

    /// Visible span in nanoseconds.
    #[must_use]
    pub fn span(&self) -> i64 {
        self.v_end.saturating_sub(self.v_start)
    }

    /// Horizontal pixel offset of `t` from the window start.
    #[must_use]
    pub fn time_to_px(&self, t: i64) -> f64 {
        t.saturating_sub(self.v_start) as f64 * self.pxns
    }

    /// Same window at a different row width.
    #[must_use]
    pub fn with_width(&self, width: f32) -> Self {
        Self::new(self.v_start, self.v_end, width, self.scale)
    }

    /// Zoom by `factor` (< 1 zooms in) keeping the time under `anchor_px` fixed.
    #[must_use]
    pub fn zoom(&self, factor: f64, anchor_px: f32) -> Self {
        let anchor = self.v_start.saturating_add((f64::from(anchor_px) * self.nspx) as i64);
        let span = ((self.span() as f64 * factor) as i64).max(1);
        let left = (f64::from(anchor_px) / f64::from(self.w) * span as f64) as i64;
        let v_start = anchor.saturating_sub(left);
        Self::new(v_start, v_start.saturating_add(span), self.w, self.scale)
    }

    /// Scroll by `dx` pixels (positive moves right).
    #[must_use]
    pub fn pan(&self, dx: f64) -> Self {
        let shift = (dx * self.nspx) as i64;
        Self::new(self.v_start.saturating_add(shift), self.v_end.saturating_add(shift), self.w, self.scale)
    }
}
