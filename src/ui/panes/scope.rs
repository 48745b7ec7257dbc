//! Scope pane rendering with the call chain and visible symbols
//!
//! The pane lists the active calls, innermost last, followed by the scope
//! chain from the current scope out to the global scope. Every scope shows
//! its symbols in declaration order with type, value and virtual address.

use crate::interpreter::environment::Activation;
use crate::snapshot::ScopeView;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
    Frame,
};

/// Data needed to render the scope pane
pub struct ScopeRenderData<'a> {
    pub scopes: &'a [ScopeView],
    pub calls: &'a [Activation],
}

pub fn render_scope_pane(
    frame: &mut Frame,
    area: Rect,
    data: ScopeRenderData,
    is_focused: bool,
    scroll_offset: &mut usize,
) {
    let block = Block::default()
        .title(" Scopes ")
        .borders(Borders::ALL)
        .border_style(super::border_style(is_focused));

    let items = scope_items(&data);
    let visible_height = area.height.saturating_sub(2).max(1) as usize;
    *scroll_offset = (*scroll_offset).min(items.len().saturating_sub(visible_height));

    let visible: Vec<ListItem> = items
        .into_iter()
        .skip(*scroll_offset)
        .take(visible_height)
        .collect();
    frame.render_widget(List::new(visible).block(block), area);
}

fn scope_items<'a>(data: &ScopeRenderData<'a>) -> Vec<ListItem<'a>> {
    let muted = Style::default().fg(DEFAULT_THEME.comment);
    let mut items = Vec::new();

    for (depth, call) in data.calls.iter().enumerate() {
        items.push(ListItem::new(Line::from(vec![
            Span::styled(format!("  ↪ [{}] ", depth), muted),
            Span::styled(
                format!("{}()", call.function),
                Style::default().fg(DEFAULT_THEME.muted_function),
            ),
            Span::styled(format!(" called at line {}", call.call_line), muted),
        ])));
    }

    for (depth, scope) in data.scopes.iter().enumerate() {
        items.push(ListItem::new(Line::from(vec![
            Span::styled("▸ ", Style::default().fg(DEFAULT_THEME.secondary)),
            Span::styled(format!("Scope {} ", depth), muted),
            Span::styled("│ ", muted),
            Span::styled(
                scope.label.clone(),
                Style::default()
                    .fg(DEFAULT_THEME.function)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!(" ({:?})", scope.kind), muted),
        ])));

        if scope.symbols.is_empty() {
            items.push(ListItem::new(Span::styled("    (empty)", muted)));
        }
        for symbol in &scope.symbols {
            let value_style = match (&symbol.value, symbol.is_function) {
                (_, true) => Style::default().fg(DEFAULT_THEME.function),
                (None, false) => muted,
                (Some(_), false) => Style::default().fg(DEFAULT_THEME.fg),
            };
            items.push(ListItem::new(Line::from(vec![
                Span::styled(
                    format!("    {} ", symbol.ty),
                    Style::default().fg(DEFAULT_THEME.type_name),
                ),
                Span::styled(symbol.name.clone(), Style::default().fg(DEFAULT_THEME.fg)),
                Span::styled(" = ", muted),
                Span::styled(symbol.display_value(), value_style),
                Span::styled(format!("  @ 0x{:08x}", symbol.address), muted),
            ])));
        }
    }

    if items.is_empty() {
        items.push(ListItem::new(Span::styled("(empty)", muted)));
    }
    items
}
