//! Main parser coordinator
//!
//! This module provides the [`Parser`] struct and core parsing infrastructure,
//! including error types, helper methods, and the main parse entry point.
//!
//! # Parser Architecture
//!
//! The Parser uses a recursive descent approach with the following organization:
//! - This module: Parser struct, node arena, helper methods, and coordination
//! - `declarations`: external declarations, declarators and parameters
//! - `statements`: compound, selection, iteration and jump statements
//! - `expressions`: expressions, one method per precedence level
//!
//! # Implementation
//!
//! Parser methods are split across multiple files using `impl Parser` blocks,
//! allowing each module to extend the Parser with related functionality while
//! maintaining access to the shared parser state. Nodes are appended to a flat
//! arena as they are completed, so children always precede their parents.

use crate::parser::ast::*;
use crate::parser::lexer::{LexError, Lexer, Token};
use rustc_hash::FxHashMap;
use thiserror::Error;

/// Parser error type
#[derive(Debug, Clone, Error)]
#[error("Parse error at line {}, column {}: {message}", .location.line, .location.column)]
pub struct ParseError {
    pub message: String,
    pub location: SourceLocation,
}

impl From<LexError> for ParseError {
    fn from(err: LexError) -> Self {
        ParseError {
            message: err.message,
            location: err.location,
        }
    }
}

/// Recursive descent parser for mini-C
pub struct Parser {
    pub(crate) tokens: Vec<Token>,
    pub(crate) position: usize,
    pub(crate) nodes: Vec<Node>,
    pub(crate) functions: FxHashMap<String, NodeId>,
    line_count: usize,
}

impl Parser {
    pub fn new(source: &str) -> Result<Self, ParseError> {
        let mut lexer = Lexer::new(source);
        let tokens = lexer.tokenize()?;
        Ok(Self {
            tokens,
            position: 0,
            nodes: Vec::new(),
            functions: FxHashMap::default(),
            line_count: source.lines().count(),
        })
    }

    /// Parse the whole translation unit and build the [`Program`]
    pub fn parse_program(mut self) -> Result<Program, ParseError> {
        let start = self.current_location();
        let mut items = Vec::new();

        while !self.is_at_end() {
            items.push(self.parse_external_declaration()?);
        }

        let end = self.current_location();
        let root = self.push_node(NodeKind::TranslationUnit(items), Span::new(start, end));
        let entry = self.build_entry_call();

        Ok(Program {
            nodes: self.nodes,
            root,
            functions: self.functions,
            entry,
            line_count: self.line_count,
        })
    }

    /// Synthesize `main()` so execution can start like any other call
    fn build_entry_call(&mut self) -> NodeId {
        let span = self
            .functions
            .get("main")
            .map(|&id| self.nodes[id].span)
            .unwrap_or_default();
        let callee = self.push_node(NodeKind::Identifier("main".to_string()), span);
        let args = self.push_node(NodeKind::ArgumentList(Vec::new()), span);
        self.push_node(NodeKind::FunctionCall { callee, args }, span)
    }

    // ===== Node arena =====

    pub(crate) fn push_node(&mut self, kind: NodeKind, span: Span) -> NodeId {
        self.nodes.push(Node { kind, span });
        self.nodes.len() - 1
    }

    /// Add a node spanning from `start` to the last consumed token
    pub(crate) fn finish(&mut self, kind: NodeKind, start: SourceLocation) -> NodeId {
        let end = self.previous_location();
        self.push_node(kind, Span::new(start, end))
    }

    pub(crate) fn node_start(&self, id: NodeId) -> SourceLocation {
        self.nodes[id].span.start
    }

    // ===== Helper methods =====

    pub(crate) fn is_type_keyword(&self) -> bool {
        matches!(self.peek(), Token::Int(_) | Token::Float(_) | Token::Void(_))
    }

    pub(crate) fn match_token(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn check(&self, token: &Token) -> bool {
        std::mem::discriminant(self.peek()) == std::mem::discriminant(token)
    }

    pub(crate) fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.position += 1;
        }
        self.previous()
    }

    pub(crate) fn is_at_end(&self) -> bool {
        matches!(self.peek(), Token::Eof(_))
    }

    pub(crate) fn peek(&self) -> &Token {
        &self.tokens[self.position]
    }

    pub(crate) fn peek_token(&self) -> Token {
        self.tokens[self.position].clone()
    }

    pub(crate) fn peek_ahead(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.position + n)
    }

    pub(crate) fn previous(&self) -> &Token {
        &self.tokens[self.position.saturating_sub(1)]
    }

    pub(crate) fn previous_location(&self) -> SourceLocation {
        self.previous().location()
    }

    pub(crate) fn current_location(&self) -> SourceLocation {
        self.peek().location()
    }

    pub(crate) fn expect_token(&mut self, token: &Token, message: &str) -> Result<(), ParseError> {
        if self.check(token) {
            self.advance();
            Ok(())
        } else {
            Err(self.error(format!("{}, found {}", message, self.peek())))
        }
    }

    pub(crate) fn expect_identifier(&mut self) -> Result<String, ParseError> {
        if let Token::Ident(name, _) = self.peek_token() {
            self.advance();
            Ok(name)
        } else {
            Err(self.error(format!("Expected identifier, found {}", self.peek())))
        }
    }

    pub(crate) fn error(&self, message: String) -> ParseError {
        ParseError {
            message,
            location: self.current_location(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::value::BaseType;

    fn parse(source: &str) -> Program {
        Parser::new(source).unwrap().parse_program().unwrap()
    }

    #[test]
    fn test_parse_simple_function() {
        let program = parse("int main() { return 0; }");

        let main = program.functions["main"];
        match &program.node(main).kind {
            NodeKind::FunctionDefinition { declarator, body, .. } => {
                assert_eq!(program.declarator_name(*declarator), Some("main"));
                assert!(matches!(&program.node(*body).kind, NodeKind::Compound(items) if items.len() == 1));
            }
            other => panic!("Expected function definition, got {:?}", other),
        }
        assert!(matches!(
            program.node(program.entry).kind,
            NodeKind::FunctionCall { .. }
        ));
    }

    #[test]
    fn test_binary_children_order() {
        let program = parse("int main() { int x = 1 + 2 * 3; }");
        let binary = program
            .nodes
            .iter()
            .find(|n| matches!(n.kind, NodeKind::Binary { .. }))
            .unwrap();
        let children = binary.children();
        assert_eq!(children.len(), 3);
        assert_eq!(program.node(children[0]).kind, NodeKind::Operator("+".to_string()));
        assert!(matches!(
            program.node(children[2]).kind,
            NodeKind::Binary { .. }
        ));
    }

    #[test]
    fn test_spans_cover_lines() {
        let program = parse("int main() {\n  if (1) {\n    int x;\n  }\n}\n");
        let selection = program
            .nodes
            .iter()
            .find(|n| matches!(n.kind, NodeKind::Selection { .. }))
            .unwrap();
        assert_eq!(selection.span.start_line(), 2);
        assert_eq!(selection.span.end_line(), 4);
        assert_eq!(program.line_count, 5);
    }

    #[test]
    fn test_global_declarations_and_types() {
        let program = parse("float g = 1.5;\nint a[3];\nint main(void) { }");
        let specs: Vec<_> = program
            .nodes
            .iter()
            .filter_map(|n| match n.kind {
                NodeKind::TypeSpec(base) => Some(base),
                _ => None,
            })
            .collect();
        assert_eq!(specs, vec![BaseType::Float, BaseType::Int, BaseType::Int, BaseType::Void]);
        assert!(program.functions.contains_key("main"));
    }

    #[test]
    fn test_call_requires_identifier() {
        let err = Parser::new("int main() { (1)(2); }")
            .unwrap()
            .parse_program()
            .unwrap_err();
        assert!(err.message.contains("identifier"));
    }

    #[test]
    fn test_missing_semicolon() {
        let err = Parser::new("int main() {\n int x = 1\n}")
            .unwrap()
            .parse_program()
            .unwrap_err();
        assert_eq!(err.location.line, 3);
    }

    #[test]
    fn test_duplicate_function_definition() {
        let err = Parser::new("int f() { } int f() { }")
            .unwrap()
            .parse_program()
            .unwrap_err();
        assert!(err.message.contains("redefinition"));
    }
}
