//! mini-C execution engine
//!
//! This module provides the core execution logic:
//! - [`environment`]: control, value and call stacks, scopes, deferred updates
//! - [`frame`]: frames, phases and operands
//! - [`engine`]: per-node dispatch of the resumable execution protocol
//! - [`stepper`]: line-by-line driver and read-only inspection
//! - [`errors`]: Runtime error types
//!
//! # Execution Model
//!
//! Execution is a stack machine. Nodes never hold execution state: a frame on
//! the control stack records where a node's activation resumes, and children
//! hand their results to their parent through the value stack. Returning from
//! [`Environment::execute`](environment::Environment) is the only suspension
//! point, so the stepper can stop between any two node slices.

pub mod constants;
mod declarations;
pub mod engine;
pub mod environment;
pub mod errors;
mod expressions;
pub mod frame;
mod ops;
mod statements;
pub mod stepper;

pub use errors::{Fault, RuntimeError};
pub use stepper::Stepper;
