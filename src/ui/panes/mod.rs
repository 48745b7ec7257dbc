//! TUI pane rendering modules
//!
//! # Pane Modules
//!
//! - [`source`]: Source code display with syntax highlighting and current line indicator
//! - [`scope`]: Active calls and the scope chain with each scope's symbols
//! - [`console`]: Command transcript and the input line
//! - [`status`]: Status bar with keybindings and execution state
//!
//! Each pane module exports a `render_*` function plus the state or data
//! types it needs.

pub mod console;
pub mod scope;
pub mod source;
pub mod status;

use crate::ui::theme::DEFAULT_THEME;
use ratatui::style::{Modifier, Style};

pub use console::render_console_pane;
pub use scope::{render_scope_pane, ScopeRenderData};
pub use source::{render_source_pane, SourceRenderData, SourceScrollState};
pub use status::{render_status_bar, RunState};

fn border_style(is_focused: bool) -> Style {
    if is_focused {
        Style::default()
            .fg(DEFAULT_THEME.border_focused)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(DEFAULT_THEME.border_normal)
    }
}
