//! Source code pane rendering with syntax highlighting
//!
//! Displays the program being stepped with the next line to execute
//! highlighted. When execution has halted on a fault the line turns red.
//!
//! The pane uses a small character tokenizer for highlighting; it only needs
//! to tell keywords, type names, literals and comments apart.

use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

fn highlight_source_code(line: &str) -> Line<'_> {
    let mut spans = Vec::new();
    let mut word = String::new();
    let chars: Vec<(usize, char)> = line.char_indices().collect();
    let mut i = 0;

    while i < chars.len() {
        let (offset, c) = chars[i];

        // `//` runs to the end of the line; `#` lines are skipped by the lexer
        let rest_is_comment = (c == '/' && matches!(chars.get(i + 1), Some((_, '/'))))
            || (c == '#' && line[..offset].trim().is_empty());
        if rest_is_comment {
            flush_word(&mut spans, &mut word, false);
            spans.push(Span::styled(
                line[offset..].to_string(),
                Style::default().fg(DEFAULT_THEME.comment),
            ));
            return Line::from(spans);
        }

        if c == '"' {
            flush_word(&mut spans, &mut word, false);
            let mut end = i + 1;
            while end < chars.len() && chars[end].1 != '"' {
                end += if chars[end].1 == '\\' { 2 } else { 1 };
            }
            let stop = chars.get(end + 1).map_or(line.len(), |&(o, _)| o);
            spans.push(Span::styled(
                line[offset..stop].to_string(),
                Style::default().fg(DEFAULT_THEME.string),
            ));
            i = end + 1;
            continue;
        }

        if !c.is_alphanumeric() && c != '_' && !(c == '.' && starts_number(&word)) {
            flush_word(&mut spans, &mut word, c == '(');
            let style = match c {
                '{' | '}' | '(' | ')' | '[' | ']' => Style::default().fg(DEFAULT_THEME.primary),
                _ => Style::default().fg(DEFAULT_THEME.fg),
            };
            spans.push(Span::styled(c.to_string(), style));
            i += 1;
            continue;
        }

        word.push(c);
        i += 1;
    }

    flush_word(&mut spans, &mut word, false);
    Line::from(spans)
}

fn starts_number(word: &str) -> bool {
    word.chars().next().is_some_and(|c| c.is_ascii_digit())
}

fn flush_word(spans: &mut Vec<Span<'_>>, word: &mut String, is_call: bool) {
    if !word.is_empty() {
        let style = word_style(word, is_call);
        spans.push(Span::styled(std::mem::take(word), style));
    }
}

fn word_style(word: &str, is_call: bool) -> Style {
    match word {
        "int" | "float" | "char" | "void" | "double" | "long" | "short" | "unsigned"
        | "signed" => Style::default().fg(DEFAULT_THEME.type_name),
        "return" | "if" | "else" | "while" | "for" | "break" | "continue" => Style::default()
            .fg(DEFAULT_THEME.keyword)
            .add_modifier(Modifier::BOLD),
        _ if starts_number(word) => Style::default().fg(DEFAULT_THEME.number),
        _ if is_call => Style::default().fg(DEFAULT_THEME.function),
        _ => Style::default().fg(DEFAULT_THEME.fg),
    }
}

/// Scroll state for the source pane
#[derive(Debug, Default)]
pub struct SourceScrollState {
    pub offset: usize,
    /// Visual row the current line is pinned to; centred on first render
    pub target_line_row: Option<usize>,
}

/// Data needed to render the source pane
pub struct SourceRenderData<'a> {
    pub lines: &'a [String],
    /// Next line to execute, `None` once the program has finished
    pub current_line: Option<usize>,
    pub is_error: bool,
}

pub fn render_source_pane(
    frame: &mut Frame,
    area: Rect,
    data: SourceRenderData,
    is_focused: bool,
    scroll_state: &mut SourceScrollState,
) {
    let block = Block::default()
        .title(" Source Code ")
        .borders(Borders::ALL)
        .border_style(super::border_style(is_focused));

    let total_lines = data.lines.len();
    let visible_height = area.height.saturating_sub(2).max(1) as usize;

    let target_row = scroll_state
        .target_line_row
        .unwrap_or(visible_height / 2)
        .min(visible_height.saturating_sub(1));
    scroll_state.target_line_row = Some(target_row);

    if let Some(current) = data.current_line.filter(|&l| l > 0 && l <= total_lines) {
        scroll_state.offset = (current - 1).saturating_sub(target_row);
    }
    scroll_state.offset = scroll_state
        .offset
        .min(total_lines.saturating_sub(visible_height));

    let visible_lines: Vec<Line> = data
        .lines
        .iter()
        .enumerate()
        .skip(scroll_state.offset)
        .take(visible_height)
        .map(|(idx, text)| {
            let is_current = data.current_line == Some(idx + 1);
            let number = Span::styled(
                format!("{:4} ", idx + 1),
                if is_current {
                    Style::default()
                        .fg(if data.is_error {
                            DEFAULT_THEME.error
                        } else {
                            DEFAULT_THEME.secondary
                        })
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(DEFAULT_THEME.comment)
                },
            );

            let mut content = highlight_source_code(text);
            if is_current && data.is_error {
                let error_style = Style::default()
                    .bg(DEFAULT_THEME.error)
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD);
                for span in &mut content.spans {
                    span.style = error_style;
                }
            } else if is_current {
                let current_style = Style::default().bg(DEFAULT_THEME.current_line_bg);
                for span in &mut content.spans {
                    span.style = span.style.patch(current_style);
                }
            }

            let mut spans = vec![number];
            spans.extend(content.spans);
            Line::from(spans)
        })
        .collect();

    frame.render_widget(Paragraph::new(visible_lines).block(block), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(line: &Line) -> Vec<String> {
        line.spans.iter().map(|s| s.content.to_string()).collect()
    }

    #[test]
    fn test_highlight_keeps_text() {
        let source = "for (i = 0; i < 3.5; i++) { x = f(\"a b\"); } // done";
        let line = highlight_source_code(source);
        assert_eq!(texts(&line).concat(), source);
    }

    #[test]
    fn test_highlight_styles() {
        let line = highlight_source_code("int x = 12;");
        assert_eq!(line.spans[0].style.fg, Some(DEFAULT_THEME.type_name));
        let number = line.spans.iter().find(|s| s.content == "12").unwrap();
        assert_eq!(number.style.fg, Some(DEFAULT_THEME.number));
    }

    #[test]
    fn test_directive_is_comment() {
        let line = highlight_source_code("#include <stdio.h>");
        assert_eq!(line.spans.len(), 1);
        assert_eq!(line.spans[0].style.fg, Some(DEFAULT_THEME.comment));
    }
}
