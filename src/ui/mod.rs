//! Terminal user interface built on [ratatui](https://github.com/ratatui-org/ratatui).
//!
//! The UI is organized into three layers:
//!
//! - **[`app`]**: application state, keyboard event loop, pane focus, command input
//! - **[`panes`]**: render functions for each visible pane (source, scopes,
//!   console, status bar)
//! - **[`theme`]**: centralized color palette used by all panes
//!
//! The entry point for consumers is [`App`]: construct it with a debugger
//! [`Session`] and call [`App::run`] to start the event loop. Commands typed
//! into the console go through the same [`Session`] the batch mode uses.
//!
//! [`Session`]: crate::debugger::Session
//! [`App::run`]: app::App::run

pub mod app;
pub mod panes;
pub mod theme;

pub use app::App;
