//! Runtime error types for the interpreter
//!
//! This module defines [`RuntimeError`], which represents all errors that can occur
//! during program execution (as opposed to parse errors or command errors), and
//! [`Fault`], which pairs an error with a [`Snapshot`] of the environment taken
//! at the moment it was raised.
//!
//! All runtime errors are fatal - they halt the stepper, which then keeps
//! reporting the same fault.

use crate::parser::ast::SourceLocation;
use crate::snapshot::Snapshot;
use thiserror::Error;

/// Runtime errors that can occur during execution
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    /// Reference to, or call of, a name no scope binds
    #[error("Undefined symbol '{name}' at line {}", .location.line)]
    UndefinedSymbol {
        name: String,
        location: SourceLocation,
    },

    /// Function called with the wrong number of arguments
    #[error(
        "Function '{function}' expects {expected} argument(s) but got {got} at line {}",
        .location.line
    )]
    ArgumentCountMismatch {
        function: String,
        expected: usize,
        got: usize,
        location: SourceLocation,
    },

    /// Argument not castable to the parameter's declared type
    #[error(
        "Argument {position} of '{function}' has type {got}, expected {expected} at line {}",
        .location.line
    )]
    ArgumentTypeMismatch {
        function: String,
        position: usize,
        expected: String,
        got: String,
        location: SourceLocation,
    },

    /// Returned value not castable to the declared return type
    #[error(
        "Function '{function}' returns {expected} but got {got} at line {}",
        .location.line
    )]
    ReturnTypeMismatch {
        function: String,
        expected: String,
        got: String,
        location: SourceLocation,
    },

    /// Operands (or a value and its destination) are not castable to each other
    #[error("Type mismatch: {left} and {right} at line {}", .location.line)]
    TypeMismatch {
        left: String,
        right: String,
        location: SourceLocation,
    },

    /// A value of the wrong kind was used
    #[error("Type error: expected {expected}, got {got} at line {}", .location.line)]
    TypeError {
        expected: String,
        got: String,
        location: SourceLocation,
    },

    /// Array index outside `0..length`
    #[error(
        "Index {index} out of range for '{name}' of length {length} at line {}",
        .location.line
    )]
    IndexOutOfRange {
        name: String,
        index: i64,
        length: usize,
        location: SourceLocation,
    },

    /// Name declared twice in one scope
    #[error("Duplicate symbol '{name}' at line {}", .location.line)]
    DuplicateSymbol {
        name: String,
        location: SourceLocation,
    },

    /// Operator symbol not in the operator table
    #[error("Invalid operator '{op}' at line {}", .location.line)]
    InvalidOperator {
        op: String,
        location: SourceLocation,
    },

    /// Read of a declared but never assigned variable
    #[error("Variable '{name}' read before initialization at line {}", .location.line)]
    UninitializedRead {
        name: String,
        location: SourceLocation,
    },

    /// Division or modulo by zero
    #[error("Division by zero in '{op}' at line {}", .location.line)]
    DivisionByZero {
        op: String,
        location: SourceLocation,
    },

    /// Integer arithmetic overflowed
    #[error("Integer overflow in '{op}' at line {}", .location.line)]
    IntegerOverflow {
        op: String,
        location: SourceLocation,
    },

    /// `break` / `continue` outside a loop, or `return` outside a function
    #[error("'{keyword}' outside of {context} at line {}", .location.line)]
    MisplacedJump {
        keyword: String,
        context: String,
        location: SourceLocation,
    },

    /// No `main` function to start from
    #[error("No 'main' function defined")]
    NoMainFunction,

    /// Stack discipline violated; indicates an interpreter bug
    #[error("Internal error: {message} at line {}", .location.line)]
    Internal {
        message: String,
        location: SourceLocation,
    },
}

impl RuntimeError {
    /// Get the source location of this error, if it has one
    pub fn location(&self) -> Option<SourceLocation> {
        match self {
            RuntimeError::UndefinedSymbol { location, .. }
            | RuntimeError::ArgumentCountMismatch { location, .. }
            | RuntimeError::ArgumentTypeMismatch { location, .. }
            | RuntimeError::ReturnTypeMismatch { location, .. }
            | RuntimeError::TypeMismatch { location, .. }
            | RuntimeError::TypeError { location, .. }
            | RuntimeError::IndexOutOfRange { location, .. }
            | RuntimeError::DuplicateSymbol { location, .. }
            | RuntimeError::InvalidOperator { location, .. }
            | RuntimeError::UninitializedRead { location, .. }
            | RuntimeError::DivisionByZero { location, .. }
            | RuntimeError::IntegerOverflow { location, .. }
            | RuntimeError::MisplacedJump { location, .. }
            | RuntimeError::Internal { location, .. } => Some(*location),
            RuntimeError::NoMainFunction => None,
        }
    }

    pub(crate) fn internal(message: impl Into<String>, location: SourceLocation) -> Self {
        RuntimeError::Internal {
            message: message.into(),
            location,
        }
    }
}

/// A fatal runtime error together with the environment state it left behind
#[derive(Debug, Clone, Error)]
#[error("{error}")]
pub struct Fault {
    #[source]
    pub error: RuntimeError,
    pub snapshot: Snapshot,
}
