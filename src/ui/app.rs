//! Main TUI application state and logic

use crate::debugger::{Command, OutputLine, Session};
use crate::ui::panes::{
    self, RunState, ScopeRenderData, SourceRenderData, SourceScrollState,
};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    Frame, Terminal,
};
use std::io;
use std::time::Duration;

/// Which pane is currently focused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusedPane {
    Console,
    Source,
    Scope,
}

impl FocusedPane {
    /// Move focus to the next pane (console -> source -> scope)
    pub fn next(self) -> Self {
        match self {
            FocusedPane::Console => FocusedPane::Source,
            FocusedPane::Source => FocusedPane::Scope,
            FocusedPane::Scope => FocusedPane::Console,
        }
    }
}

/// The main application state
pub struct App {
    pub session: Session,

    pub focused_pane: FocusedPane,

    /// Command being typed
    pub input: String,

    /// Everything the console has shown so far
    pub transcript: Vec<OutputLine>,

    /// Previously submitted commands, oldest first
    pub history: Vec<String>,
    history_cursor: Option<usize>,

    pub source_scroll: SourceScrollState,
    pub scope_scroll: usize,
    pub console_scroll: usize,

    pub should_quit: bool,

    /// Status message to display
    pub status_message: String,
}

impl App {
    pub fn new(mut session: Session) -> Self {
        let mut transcript = session.execute(&Command::Help);
        transcript.push(session.location_line());
        App {
            session,
            focused_pane: FocusedPane::Console,
            input: String::new(),
            transcript,
            history: Vec::new(),
            history_cursor: None,
            source_scroll: SourceScrollState::default(),
            scope_scroll: 0,
            console_scroll: usize::MAX,
            should_quit: false,
            status_message: String::from("Ready!"),
        }
    }

    /// Run the TUI application
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if self.should_quit {
                break;
            }

            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key_event(key);
                    }
                }
            }
        }

        Ok(())
    }

    fn render(&mut self, frame: &mut Frame) {
        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(frame.area());

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(main_chunks[0]);

        // Left column: Source (top) | Console (bottom)
        let left_rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
            .split(columns[0]);

        let stepper = self.session.stepper();
        let state = self.run_state();

        panes::render_source_pane(
            frame,
            left_rows[0],
            SourceRenderData {
                lines: self.session.source(),
                current_line: match state {
                    RunState::Paused { line } | RunState::Halted { line } => Some(line),
                    RunState::Finished => None,
                },
                is_error: matches!(state, RunState::Halted { .. }),
            },
            self.focused_pane == FocusedPane::Source,
            &mut self.source_scroll,
        );

        panes::render_console_pane(
            frame,
            left_rows[1],
            &self.transcript,
            &self.input,
            self.focused_pane == FocusedPane::Console,
            &mut self.console_scroll,
        );

        // After a fault the scope pane shows the captured state
        let scopes = match stepper.fault() {
            Some(fault) => fault.snapshot.scopes.clone(),
            None => stepper.scope_chain(),
        };
        panes::render_scope_pane(
            frame,
            columns[1],
            ScopeRenderData {
                scopes: &scopes,
                calls: stepper.call_stack(),
            },
            self.focused_pane == FocusedPane::Scope,
            &mut self.scope_scroll,
        );

        panes::render_status_bar(frame, main_chunks[1], &self.status_message, state);
    }

    fn run_state(&self) -> RunState {
        let stepper = self.session.stepper();
        match stepper.fault() {
            Some(fault) => RunState::Halted {
                line: fault.snapshot.line,
            },
            None if stepper.is_finished() => RunState::Finished,
            None => RunState::Paused {
                line: stepper.current_line(),
            },
        }
    }

    fn handle_key_event(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
            }
            KeyCode::Tab => self.focused_pane = self.focused_pane.next(),
            KeyCode::Enter => self.submit(),
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Char(c) => {
                self.focused_pane = FocusedPane::Console;
                self.input.push(c);
            }
            KeyCode::Up => match self.focused_pane {
                // Scrolling up makes the current line move down visually
                FocusedPane::Source => {
                    if let Some(row) = self.source_scroll.target_line_row {
                        self.source_scroll.target_line_row = Some(row.saturating_add(1));
                    }
                }
                FocusedPane::Scope => self.scope_scroll = self.scope_scroll.saturating_sub(1),
                FocusedPane::Console => self.recall(-1),
            },
            KeyCode::Down => match self.focused_pane {
                FocusedPane::Source => {
                    if let Some(row) = self.source_scroll.target_line_row {
                        self.source_scroll.target_line_row = Some(row.saturating_sub(1));
                    }
                }
                FocusedPane::Scope => self.scope_scroll = self.scope_scroll.saturating_add(1),
                FocusedPane::Console => self.recall(1),
            },
            KeyCode::PageUp => self.console_scroll = self.console_scroll.saturating_sub(5),
            KeyCode::PageDown => self.console_scroll = self.console_scroll.saturating_add(5),
            _ => {}
        }
    }

    /// Run the typed command through the session
    fn submit(&mut self) {
        let input = std::mem::take(&mut self.input);
        self.transcript.push(OutputLine::echo(&input));
        let output = self.session.execute_line(&input);

        self.status_message = match output.last() {
            Some(line) => line.text.clone(),
            None => String::new(),
        };
        self.transcript.extend(output);
        // Auto-scroll console to bottom
        self.console_scroll = usize::MAX;

        if !input.trim().is_empty() {
            self.history.push(input);
        }
        self.history_cursor = None;
        self.should_quit = self.session.should_exit();
    }

    /// Walk the command history; `-1` goes back, `1` forward
    fn recall(&mut self, direction: isize) {
        if self.history.is_empty() {
            return;
        }
        let last = self.history.len() - 1;
        let cursor = match (self.history_cursor, direction < 0) {
            (None, true) => Some(last),
            (None, false) => None,
            (Some(i), true) => Some(i.saturating_sub(1)),
            (Some(i), false) if i < last => Some(i + 1),
            (Some(_), false) => None,
        };
        self.history_cursor = cursor;
        self.input = cursor
            .and_then(|i| self.history.get(i))
            .cloned()
            .unwrap_or_default();
    }
}
