//! Status bar rendering with keybindings and state indicators

use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

/// Where execution stands, as shown in the status badge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Paused { line: usize },
    Finished,
    Halted { line: usize },
}

pub fn render_status_bar(frame: &mut Frame, area: Rect, message: &str, state: RunState) {
    let layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let (badge, badge_bg) = match state {
        RunState::Paused { line } => (format!(" Line {} ", line), DEFAULT_THEME.primary),
        RunState::Finished => (" END ".to_string(), DEFAULT_THEME.success),
        RunState::Halted { line } => (format!(" HALTED at {} ", line), DEFAULT_THEME.error),
    };
    let bar = Style::default().bg(DEFAULT_THEME.current_line_bg);

    let left = Line::from(vec![
        Span::styled(
            badge,
            Style::default()
                .bg(badge_bg)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(" | ", bar.fg(DEFAULT_THEME.comment)),
        Span::styled(
            format!(" {} ", message),
            bar.fg(if matches!(state, RunState::Halted { .. }) {
                DEFAULT_THEME.error
            } else {
                DEFAULT_THEME.fg
            }),
        ),
    ]);
    frame.render_widget(
        Paragraph::new(left).style(bar).alignment(Alignment::Left),
        layout[0],
    );

    let key_style = Style::default().bg(DEFAULT_THEME.comment).fg(Color::Black);
    let desc_style = bar.fg(DEFAULT_THEME.fg);
    let sep_style = bar.fg(DEFAULT_THEME.comment);

    let mut right = Vec::new();
    for (i, (key, desc)) in [
        (" ↵ ", " run command "),
        (" ⇥ ", " focus "),
        (" ↑/↓ ", " scroll "),
        (" esc ", " quit "),
    ]
    .into_iter()
    .enumerate()
    {
        if i > 0 {
            right.push(Span::styled("│", sep_style));
            right.push(Span::styled(" ", desc_style));
        }
        right.push(Span::styled(key, key_style));
        right.push(Span::styled(desc, desc_style));
    }
    frame.render_widget(
        Paragraph::new(Line::from(right))
            .style(bar)
            .alignment(Alignment::Right),
        layout[1],
    );
}
