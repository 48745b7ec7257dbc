//! # Introduction
//!
//! minic parses a small subset of C and executes it one source line at a
//! time. Execution can stop between any two lines and resume later; while it
//! is paused every variable's current value, the full history of values it
//! has held, and the scope chain can be inspected. A terminal UI built with
//! [ratatui](https://docs.rs/ratatui) and a plain batch mode drive the same
//! debugger commands.
//!
//! ## Execution pipeline
//!
//! ```text
//! Source → Lexer → Parser → node arena → Stepper ⇄ Environment → Session → TUI / batch
//! ```
//!
//! 1. [`parser`]: tokenises the source and builds the immutable node arena
//!    ([`parser::Program`]).
//! 2. [`interpreter`]: the resumable engine. Frames on a control stack
//!    carry each node's progress, so execution can pause after any slice and
//!    [`interpreter::Stepper`] can advance line by line.
//! 3. [`memory`]: typed [`memory::value::Value`]s, symbols with their
//!    write history, and the arena of chained scopes.
//! 4. [`snapshot`]: read-only views of the environment, also captured
//!    when a runtime error halts execution.
//! 5. [`debugger`]: command parsing and the `next`/`print`/`trace`/`scope`
//!    session shared by both front-ends.
//! 6. [`ui`]: ratatui-based TUI; not part of the stable library API.
//!
//! ## Supported C subset
//!
//! Types: `int`, `float`, `void`, string literals, one-dimensional arrays,
//! pointer declarators. Control flow: `if/else`, `while`, `for`, `break`,
//! `continue`, `return`. Postfix `++`/`--` take effect at the end of the
//! statement; prefix forms take effect immediately.

pub mod debugger;
pub mod interpreter;
pub mod memory;
pub mod parser;
pub mod snapshot;
pub mod ui;
