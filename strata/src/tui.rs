//! # Terminal User Interface (TUI)
//!
//! Interactive replay viewer using `ratatui`. Every frame it folds the
//! visible window with the terminal's columns as pixels, draws the
//! resulting records, then releases the buffers for the next frame.
//!
//! ## Layout
//!
//! - **Lanes** - one block per thread: a line per zone depth, then the
//!   context-switch lane and the sample lane
//! - **Thread** - summary of the selected thread and of its current fold
//!
//! ## Sub-Modules
//!
//! - `lanes` - draw records to terminal cells
//! - `status` - selected thread panel
//! - `theme` - color scheme and glyphs

// TUI rendering intentionally uses precision-losing casts and long functions for clarity
#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::too_many_lines
)]

use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::{debug, info};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};
use std::io;
use std::time::Duration;

pub mod lanes;
mod status;
mod theme;

use lanes::{context_switch_lane, sample_lane, zone_lanes};
use status::StatusPanel;
use theme::{BACKGROUND, CAUTION_AMBER, HUD_GREEN, INFO_DIM};

use crate::dispatch::TaskDispatch;
use crate::domain::TuiError;
use crate::timeline::{Timeline, TimelineContext, ViewOptions};
use crate::trace_data::Trace;

// =============================================================================
// STYLE CONSTANTS
// =============================================================================

const STYLE_HEADING: Style = Style::new().fg(HUD_GREEN).add_modifier(Modifier::BOLD);
const STYLE_LABEL: Style = Style::new().fg(CAUTION_AMBER).add_modifier(Modifier::BOLD);
const STYLE_DIM: Style = Style::new().fg(INFO_DIM);
const STYLE_KEY: Style = Style::new().fg(CAUTION_AMBER);
const STYLE_TEXT: Style = Style::new().fg(ratatui::style::Color::White);

/// Zoom step per key press.
const ZOOM_FACTOR: f64 = 0.5;
/// Share of the window scrolled per key press.
const PAN_FRACTION: f64 = 0.25;

// =============================================================================
// REPLAY APP
// =============================================================================

/// Screen regions of one frame.
struct AppLayout {
    header: Rect,
    lanes: Rect,
    thread: Rect,
    status_bar: Rect,
}

impl AppLayout {
    fn new(area: Rect) -> Self {
        let outer = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Min(0),    // Lanes + thread panel
                Constraint::Length(3), // Status bar
            ])
            .split(area);
        let main = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(72), Constraint::Percentage(28)])
            .split(outer[1]);
        Self { header: outer[0], lanes: main[0], thread: main[1], status_bar: outer[2] }
    }

    /// Columns available to a lane inside its border.
    fn lane_width(&self) -> u16 {
        self.lanes.width.saturating_sub(2).max(1)
    }
}

/// TUI application replaying a loaded trace
pub struct App<'t, 'd> {
    timeline: Timeline<'t>,
    ctx: TimelineContext,
    options: ViewOptions,
    dispatch: &'d dyn TaskDispatch,

    // UI state
    selected: usize,
    show_help: bool,
    should_quit: bool,
}

impl<'t, 'd> App<'t, 'd> {
    /// # Errors
    /// Returns [`TuiError::EmptyTrace`] if the trace has no threads.
    pub fn new(
        trace: &'t Trace,
        ctx: TimelineContext,
        options: ViewOptions,
        dispatch: &'d dyn TaskDispatch,
    ) -> Result<Self, TuiError> {
        if trace.threads.is_empty() {
            return Err(TuiError::EmptyTrace);
        }
        Ok(Self {
            timeline: Timeline::new(trace),
            ctx,
            options,
            dispatch,
            selected: 0,
            show_help: false,
            should_quit: false,
        })
    }

    #[must_use]
    pub fn ctx(&self) -> &TimelineContext {
        &self.ctx
    }

    #[must_use]
    pub fn options(&self) -> &ViewOptions {
        &self.options
    }

    #[must_use]
    pub fn selected(&self) -> usize {
        self.selected
    }

    #[must_use]
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    #[must_use]
    pub fn timeline(&self) -> &Timeline<'t> {
        &self.timeline
    }

    /// Handle keyboard input
    pub fn handle_key(&mut self, key: KeyCode) {
        if self.show_help {
            // Any key closes help
            self.show_help = false;
            return;
        }
        let half = f64::from(self.ctx.w) / 2.0;
        let step = f64::from(self.ctx.w) * PAN_FRACTION;
        match key {
            KeyCode::Char('q' | 'Q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('w' | 'W') => self.ctx = self.ctx.zoom(ZOOM_FACTOR, half as f32),
            KeyCode::Char('s' | 'S') => self.ctx = self.ctx.zoom(1.0 / ZOOM_FACTOR, half as f32),
            KeyCode::Char('a' | 'A') | KeyCode::Left => self.ctx = self.ctx.pan(-step),
            KeyCode::Char('d' | 'D') | KeyCode::Right => self.ctx = self.ctx.pan(step),
            KeyCode::Up => self.selected = self.selected.saturating_sub(1),
            KeyCode::Down => {
                if self.selected + 1 < self.timeline.rows().len() {
                    self.selected += 1;
                }
            }
            KeyCode::Char('g' | 'G') => {
                if let Some(row) = self.timeline.row_mut(self.selected) {
                    row.set_ghost(!row.ghost());
                }
            }
            KeyCode::Char('c' | 'C') => {
                self.options.context_switches = !self.options.context_switches;
            }
            KeyCode::Char('p' | 'P') => self.options.samples = !self.options.samples,
            KeyCode::Char('?') => self.show_help = true,
            _ => {}
        }
    }

    /// Fold, draw and release one frame.
    ///
    /// # Errors
    /// Returns an error if the terminal cannot be queried or drawn to.
    pub fn frame<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), TuiError> {
        let size = terminal.size()?;
        let layout = AppLayout::new(Rect::new(0, 0, size.width, size.height));
        self.ctx = self.ctx.with_width(f32::from(layout.lane_width()));

        self.timeline.preprocess(&self.ctx, &self.options, self.dispatch);
        let drawn = terminal.draw(|f| self.render(f, &layout));
        self.timeline.draw_finished();
        drawn?;
        Ok(())
    }

    fn render(&self, f: &mut Frame, layout: &AppLayout) {
        let trace = self.timeline.trace();

        // Header - window and zoom
        let header = Paragraph::new(vec![Line::from(vec![
            Span::styled("STRATA", STYLE_HEADING),
            Span::styled(" | ", STYLE_DIM),
            Span::styled("REPLAY", Style::new().fg(CAUTION_AMBER)),
            Span::styled(" | ", STYLE_DIM),
            Span::styled(
                format!("{} .. {}", self.ctx.v_start, self.ctx.v_end),
                Style::new().fg(HUD_GREEN),
            ),
            Span::styled(" | ", STYLE_DIM),
            Span::styled(format!("{:.1} ns/col", self.ctx.nspx), Style::new().fg(HUD_GREEN)),
            Span::styled(" | ", STYLE_DIM),
            Span::styled(
                format!("{} threads", trace.threads.len()),
                Style::new().fg(HUD_GREEN),
            ),
        ])])
        .block(Block::default().borders(Borders::ALL).border_style(Style::new().fg(HUD_GREEN)));
        f.render_widget(header, layout.header);

        // Lanes
        let mut lines = Vec::new();
        let mut selected_line = 0;
        for (i, row) in self.timeline.rows().iter().enumerate() {
            let thread = row.thread();
            let is_selected = i == self.selected;
            if is_selected {
                selected_line = lines.len();
            }
            let marker = if is_selected { "▶ " } else { "  " };
            let style = if is_selected {
                Style::default().fg(CAUTION_AMBER).add_modifier(Modifier::REVERSED)
            } else {
                STYLE_LABEL
            };
            let mut label = vec![
                Span::raw(marker),
                Span::styled(format!("{} {}", thread.thread_id(), thread.name), style),
            ];
            if row.shows_ghosts(&self.options) {
                label.push(Span::styled(" [ghost]", STYLE_DIM));
            }
            lines.push(Line::from(label));

            lines.extend(zone_lanes(row, trace, &self.ctx).iter().map(lanes::Lane::to_line));
            if let Some(lane) = context_switch_lane(row, trace, &self.ctx) {
                lines.push(lane.to_line());
            }
            if let Some(lane) = sample_lane(row, &self.ctx) {
                lines.push(lane.to_line());
            }
        }
        let visible = usize::from(layout.lanes.height.saturating_sub(2));
        let scroll = selected_line.saturating_sub(visible / 3);
        let lanes = Paragraph::new(lines)
            .scroll((u16::try_from(scroll).unwrap_or(u16::MAX), 0))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Timeline")
                    .border_style(Style::default().fg(HUD_GREEN))
                    .style(Style::new().bg(BACKGROUND)),
            );
        f.render_widget(lanes, layout.lanes);

        if let Some(row) = self.timeline.rows().get(self.selected) {
            StatusPanel::new(row).render(f, layout.thread);
        }

        // Status bar keybinds
        let toggle = |on: bool| {
            if on {
                Span::styled("on ", Style::default().fg(HUD_GREEN))
            } else {
                Span::styled("off ", Style::default().fg(INFO_DIM))
            }
        };
        let status_line = Line::from(vec![
            Span::styled("Q", STYLE_KEY),
            Span::styled(":Quit ", STYLE_DIM),
            Span::styled("W/S", STYLE_KEY),
            Span::styled(":Zoom ", STYLE_DIM),
            Span::styled("A/D", STYLE_KEY),
            Span::styled(":Pan ", STYLE_DIM),
            Span::styled("G", STYLE_KEY),
            Span::styled(":Ghost ", STYLE_DIM),
            Span::styled("C", STYLE_KEY),
            Span::styled(":Switches ", STYLE_DIM),
            toggle(self.options.context_switches),
            Span::styled("P", STYLE_KEY),
            Span::styled(":Samples ", STYLE_DIM),
            toggle(self.options.samples),
            Span::styled("?", STYLE_KEY),
            Span::styled(":Help", STYLE_DIM),
        ]);
        let status = Paragraph::new(vec![status_line]).block(
            Block::default().borders(Borders::ALL).border_style(Style::default().fg(HUD_GREEN)),
        );
        f.render_widget(status, layout.status_bar);

        if self.show_help {
            render_help_overlay(f, f.area());
        }
    }

    fn event_loop<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), TuiError> {
        while !self.should_quit {
            self.frame(terminal)?;

            if event::poll(Duration::from_millis(100))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code);
                        debug!("Window {}..{}", self.ctx.v_start, self.ctx.v_end);
                    }
                }
            }
        }
        Ok(())
    }

    /// Run the TUI event loop
    ///
    /// # Errors
    /// Returns an error if terminal setup or rendering fails
    pub fn run(mut self) -> Result<(), TuiError> {
        // Setup terminal
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        info!("Replay viewer started for {} threads", self.timeline.rows().len());

        let result = self.event_loop(&mut terminal);

        // Cleanup terminal
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
        terminal.show_cursor()?;

        result
    }
}

// =============================================================================
// OVERLAY RENDERERS
// =============================================================================

/// Render the help overlay explaining the glyphs and keyboard shortcuts
fn render_help_overlay(f: &mut Frame, area: Rect) {
    let popup_area = centered_popup(area, 70, 22);

    let glyph = |symbol: &'static str, text: &'static str| {
        Line::from(vec![Span::styled(symbol, STYLE_LABEL), Span::styled(text, STYLE_DIM)])
    };
    let help_text = vec![
        Line::from(""),
        Line::from(Span::styled("  What You're Looking At", STYLE_HEADING)),
        Line::from(Span::styled(
            "  Each thread shows its zones by depth, then when it ran and waited,",
            STYLE_DIM,
        )),
        Line::from(Span::styled(
            "  then its call-stack samples. Anything too narrow is folded.",
            STYLE_DIM,
        )),
        Line::from(""),
        Line::from(Span::styled("  Glyphs", STYLE_HEADING)),
        glyph("  █ ", "zone            ▒ folded zones"),
        glyph("  ░ ", "ghost zone      ━ running"),
        glyph("  · ", "waiting         ┅ folded switches"),
        glyph("  • ", "sample          ⁘ sample run"),
        Line::from(""),
        Line::from(Span::styled("  Keys", STYLE_HEADING)),
        Line::from(vec![
            Span::styled("  W/S", STYLE_KEY),
            Span::styled(" Zoom   ", STYLE_TEXT),
            Span::styled("A/D", STYLE_KEY),
            Span::styled(" Pan   ", STYLE_TEXT),
            Span::styled("↑↓", STYLE_KEY),
            Span::styled(" Select   ", STYLE_TEXT),
            Span::styled("G", STYLE_KEY),
            Span::styled(" Ghost zones", STYLE_TEXT),
        ]),
        Line::from(vec![
            Span::styled("  C", STYLE_KEY),
            Span::styled(" Context switches   ", STYLE_TEXT),
            Span::styled("P", STYLE_KEY),
            Span::styled(" Samples   ", STYLE_TEXT),
            Span::styled("Q", STYLE_KEY),
            Span::styled(" Quit", STYLE_TEXT),
        ]),
        Line::from(""),
        Line::from(Span::styled("  Press any key to close", STYLE_DIM)),
    ];

    let help_widget = Paragraph::new(help_text).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Help ")
            .style(Style::new().bg(ratatui::style::Color::Black).fg(HUD_GREEN)),
    );

    f.render_widget(ratatui::widgets::Clear, popup_area);
    f.render_widget(help_widget, popup_area);
}

/// Create a centered popup area with given width percentage and height in lines
fn centered_popup(area: Rect, width_percent: u16, height_lines: u16) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Fill(1), Constraint::Length(height_lines), Constraint::Fill(1)])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - width_percent) / 2),
            Constraint::Percentage(width_percent),
            Constraint::Percentage((100 - width_percent) / 2),
        ])
        .split(vertical[1])[1]
}
