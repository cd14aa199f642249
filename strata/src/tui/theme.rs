//! TUI color theme
//!
//! HUD-inspired color scheme for the terminal interface, plus the glyph
//! each kind of draw record is rendered with.

use ratatui::style::Color;

// HUD color scheme (F-35 inspired)
pub const HUD_GREEN: Color = Color::Rgb(0, 255, 0);
pub const CRITICAL_RED: Color = Color::Rgb(255, 0, 0);
pub const CAUTION_AMBER: Color = Color::Rgb(255, 191, 0);
pub const INFO_DIM: Color = Color::Rgb(0, 180, 0);
pub const BACKGROUND: Color = Color::Rgb(0, 20, 0);
pub const GHOST_CYAN: Color = Color::Rgb(0, 200, 200);

/// One terminal cell of a rendered lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Glyph {
    Zone,
    Folded,
    Ghost,
    GhostFolded,
    Running,
    Waiting,
    ContextSwitchFolded,
    Sample,
    SampleRun,
}

impl Glyph {
    #[must_use]
    pub fn symbol(self) -> char {
        match self {
            Glyph::Zone => '█',
            Glyph::Folded | Glyph::GhostFolded => '▒',
            Glyph::Ghost => '░',
            Glyph::Running => '━',
            Glyph::Waiting => '·',
            Glyph::ContextSwitchFolded => '┅',
            Glyph::Sample => '•',
            Glyph::SampleRun => '⁘',
        }
    }

    #[must_use]
    pub fn color(self) -> Color {
        match self {
            Glyph::Zone | Glyph::Running => HUD_GREEN,
            Glyph::Folded | Glyph::ContextSwitchFolded => CAUTION_AMBER,
            Glyph::Ghost | Glyph::GhostFolded => GHOST_CYAN,
            Glyph::Waiting | Glyph::Sample => INFO_DIM,
            Glyph::SampleRun => CRITICAL_RED,
        }
    }
}

/// Horizontal gauge of `width` cells filled to `percentage`.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
pub fn gauge_bar(percentage: f64, width: usize) -> String {
    let filled = ((percentage.clamp(0.0, 100.0) / 100.0) * width as f64).round() as usize;
    format!("{}{}", "▓".repeat(filled), "░".repeat(width - filled))
}

/// Color for a share of lifetime spent running
/// - Above 80%: Critical (Red), the thread hardly ever waits
/// - Above 50%: Caution (Amber)
/// - Otherwise: Normal (Green)
#[must_use]
pub fn load_color(percentage: f64) -> Color {
    if percentage > 80.0 {
        CRITICAL_RED
    } else if percentage > 50.0 {
        CAUTION_AMBER
    } else {
        HUD_GREEN
    }
}
