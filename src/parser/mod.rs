//! Mini-C source code parser
//!
//! This module transforms source text into an arena-backed syntax tree:
//! - [`lexer`]: Tokenization (source text → tokens)
//! - [`parse`]: Parser coordinator, helpers and the [`Program`] builder
//! - `declarations`, `statements`, `expressions`: grammar rules
//! - [`ast`]: Node definitions
//!
//! # Supported Subset
//!
//! - Types: `int`, `float`, `void`, pointers (declaration only), fixed-size arrays
//! - Statements: declarations, expression statements, `if`/`else`, `while`,
//!   `for`, `return`, `break`, `continue`, blocks
//! - Expressions: arithmetic, comparison, logical, casts, calls, `++`/`--`
//! - No preprocessor (directive lines are skipped)
//!
//! # Parser Implementation
//!
//! Hand-written recursive descent parser, one method per precedence level.
//! No external parser generator dependencies.

pub mod ast;
mod declarations;
mod expressions;
pub mod lexer;
pub mod parse;
mod statements;

pub use ast::{NodeId, Program};
pub use parse::{ParseError, Parser};

/// Lex and parse a complete source file
pub fn parse_program(source: &str) -> Result<Program, ParseError> {
    Parser::new(source)?.parse_program()
}
