use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::theme::{gauge_bar, load_color, CAUTION_AMBER, HUD_GREEN, INFO_DIM};
use crate::report::FoldStats;
use crate::timeline::{ThreadRow, ThreadSummary};

/// Selected thread panel - summary of the thread and of this frame's fold
pub struct StatusPanel {
    summary: ThreadSummary,
    stats: FoldStats,
    ghost: bool,
}

impl StatusPanel {
    pub fn new(row: &ThreadRow<'_>) -> Self {
        Self { summary: row.summary(), stats: FoldStats::from_row(row), ghost: row.ghost() }
    }

    fn stat(label: &'static str, value: String) -> Line<'static> {
        Line::from(vec![
            Span::styled(label, Style::default().fg(INFO_DIM)),
            Span::styled(value, Style::default().fg(HUD_GREEN)),
        ])
    }

    pub fn render(&self, f: &mut Frame, area: Rect) {
        let s = &self.summary;
        let mut lines = vec![Line::from(Span::styled(
            format!(" {} {}", s.id, s.name),
            Style::default().fg(HUD_GREEN).add_modifier(Modifier::BOLD),
        ))];
        if s.is_fiber {
            lines.push(Line::from(Span::styled(" fiber", Style::default().fg(CAUTION_AMBER))));
        }
        lines.push(Line::from(""));

        match (s.appeared_at, s.last_event) {
            (Some(first), Some(last)) => {
                lines.push(Self::stat(" Appeared ", first.to_string()));
                lines.push(Self::stat(" Last     ", last.to_string()));
                lines.push(Self::stat(
                    " Lifetime ",
                    format!("{} ({:.1}%)", s.lifetime, s.trace_share),
                ));
            }
            _ => lines.push(Line::from(Span::styled(" No activity", Style::default().fg(INFO_DIM)))),
        }

        if let (Some(running), Some(share)) = (s.running_time, s.running_share) {
            let color = load_color(share);
            lines.push(Self::stat(" Running  ", running.to_string()));
            lines.push(Line::from(vec![
                Span::raw(" "),
                Span::styled(gauge_bar(share, 10), Style::default().fg(color)),
                Span::styled(format!(" {share:.0}%"), Style::default().fg(color)),
            ]));
            lines.push(Self::stat(" Regions  ", s.running_regions.to_string()));
        }

        lines.push(Line::from(""));
        lines.push(Self::stat(" Zones    ", format!("{} ({} top)", s.zone_count, s.top_level_zones)));
        lines.push(Self::stat(" Messages ", s.messages.to_string()));
        lines.push(Self::stat(" Samples  ", s.samples.to_string()));
        if s.kernel_samples > 0 {
            lines.push(Self::stat(" Kernel   ", s.kernel_samples.to_string()));
        }

        let st = &self.stats;
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            if self.ghost { " Frame (ghost)" } else { " Frame" },
            Style::default().fg(CAUTION_AMBER).add_modifier(Modifier::BOLD),
        )));
        lines.push(Self::stat(" Depth    ", st.depth.to_string()));
        lines.push(Self::stat(" Drawn    ", format!("{} zones, {} ghosts", st.zones, st.ghosts)));
        lines.push(Self::stat(
            " Folded   ",
            format!("{} ({} inside)", st.folded + st.ghosts_folded, st.folded_members),
        ));
        lines.push(Self::stat(" Switches ", format!("{}/{}/{}", st.running, st.waiting, st.ctx_folded)));
        lines.push(Self::stat(" Runs     ", format!("{} ({} samples)", st.sample_runs, st.samples)));

        let paragraph = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title("Thread")
                .border_style(Style::default().fg(HUD_GREEN)),
        );

        f.render_widget(paragraph, area);
    }
}
