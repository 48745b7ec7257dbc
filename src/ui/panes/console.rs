//! Console pane rendering: command transcript and input line

use crate::debugger::{OutputKind, OutputLine};
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::{Constraint, Direction, Layout, Position, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Padding, Paragraph},
    Frame,
};

/// Prompt shown in front of the input line
pub const PROMPT: &str = "> ";

pub fn render_console_pane(
    frame: &mut Frame,
    area: Rect,
    transcript: &[OutputLine],
    input: &str,
    is_focused: bool,
    scroll_offset: &mut usize,
) {
    let block = Block::default()
        .title(" Console ")
        .borders(Borders::ALL)
        .border_style(super::border_style(is_focused))
        .padding(Padding::new(1, 0, 0, 0));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(inner);

    let visible_height = rows[0].height.max(1) as usize;
    if transcript.len() > visible_height {
        *scroll_offset = (*scroll_offset).min(transcript.len() - visible_height);
    } else {
        *scroll_offset = 0;
    }

    let items: Vec<ListItem> = transcript
        .iter()
        .skip(*scroll_offset)
        .take(visible_height)
        .map(|line| ListItem::new(line.text.as_str()).style(output_style(line.kind)))
        .collect();
    frame.render_widget(List::new(items), rows[0]);

    let prompt = Line::from(vec![
        Span::styled(
            PROMPT,
            Style::default()
                .fg(DEFAULT_THEME.secondary)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(input, Style::default().fg(DEFAULT_THEME.fg)),
    ]);
    frame.render_widget(Paragraph::new(prompt), rows[1]);

    if is_focused {
        let column = rows[1].x + (PROMPT.len() + input.chars().count()) as u16;
        frame.set_cursor_position(Position::new(
            column.min(rows[1].right().saturating_sub(1)),
            rows[1].y,
        ));
    }
}

fn output_style(kind: OutputKind) -> Style {
    match kind {
        OutputKind::Info => Style::default().fg(DEFAULT_THEME.comment),
        OutputKind::Echo => Style::default().fg(DEFAULT_THEME.secondary),
        OutputKind::Value => Style::default().fg(DEFAULT_THEME.fg),
        OutputKind::Error => Style::default()
            .fg(DEFAULT_THEME.error)
            .add_modifier(Modifier::BOLD),
        OutputKind::Log => Style::default().fg(DEFAULT_THEME.type_name),
    }
}
