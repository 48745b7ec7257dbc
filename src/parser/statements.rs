//! Statement parsing implementation
//!
//! This module handles parsing of all mini-C statement types:
//!
//! - Compound statements: `{ ... }` mixing declarations and statements
//! - Control flow: `if`/`else`, `while`, `for`
//! - Jump statements: `return`, `break`, `continue`
//! - Expression statements, including the empty statement `;`
//!
//! # Grammar
//!
//! ```text
//! statement ::= compound | if_stmt | while_stmt | for_stmt
//!             | jump_stmt | [expression] ";"
//! compound  ::= "{" ( declaration | statement )* "}"
//! for_stmt  ::= "for" "(" ( declaration | [expression] ";" ) [expression] ";"
//!               [expression] ")" statement
//! ```
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use crate::parser::ast::*;
use crate::parser::lexer::Token;
use crate::parser::parse::{ParseError, Parser};

impl Parser {
    /// Parse `{ ... }`
    pub(crate) fn parse_compound_statement(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current_location();
        self.expect_token(&Token::LBrace(start), "Expected '{'")?;

        let mut items = Vec::new();
        while !self.check(&Token::RBrace(self.current_location())) && !self.is_at_end() {
            let item = if self.is_type_keyword() {
                self.parse_declaration()?
            } else {
                self.parse_statement()?
            };
            items.push(item);
        }

        self.expect_token(
            &Token::RBrace(self.current_location()),
            "Expected '}' after block",
        )?;
        Ok(self.finish(NodeKind::Compound(items), start))
    }

    /// Parse a statement
    pub(crate) fn parse_statement(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current_location();

        match self.peek_token() {
            Token::LBrace(_) => self.parse_compound_statement(),
            Token::If(_) => self.parse_if_statement(),
            Token::While(_) => self.parse_while_statement(),
            Token::For(_) => self.parse_for_statement(),
            Token::Return(_) | Token::Break(_) | Token::Continue(_) => self.parse_jump_statement(),
            Token::Semicolon(_) => {
                self.advance();
                Ok(self.finish(NodeKind::ExpressionStatement(None), start))
            }
            _ => {
                let expr = self.parse_expression()?;
                self.expect_token(
                    &Token::Semicolon(self.current_location()),
                    "Expected ';' after expression",
                )?;
                Ok(self.finish(NodeKind::ExpressionStatement(Some(expr)), start))
            }
        }
    }

    fn parse_if_statement(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current_location();
        self.advance(); // consume 'if'
        self.expect_token(&Token::LParen(self.current_location()), "Expected '(' after 'if'")?;
        let condition = self.parse_expression()?;
        self.expect_token(
            &Token::RParen(self.current_location()),
            "Expected ')' after condition",
        )?;

        let then_branch = self.parse_statement()?;
        let else_branch = if self.match_token(&Token::Else(self.current_location())) {
            Some(self.parse_statement()?)
        } else {
            None
        };

        Ok(self.finish(
            NodeKind::Selection {
                condition,
                then_branch,
                else_branch,
            },
            start,
        ))
    }

    fn parse_while_statement(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current_location();
        self.advance(); // consume 'while'
        self.expect_token(
            &Token::LParen(self.current_location()),
            "Expected '(' after 'while'",
        )?;
        let condition = self.parse_expression()?;
        self.expect_token(
            &Token::RParen(self.current_location()),
            "Expected ')' after condition",
        )?;
        let body = self.parse_statement()?;

        Ok(self.finish(
            NodeKind::Iteration {
                kind: IterationKind::While,
                init: None,
                condition: Some(condition),
                update: None,
                body,
            },
            start,
        ))
    }

    fn parse_for_statement(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current_location();
        self.advance(); // consume 'for'
        self.expect_token(&Token::LParen(self.current_location()), "Expected '(' after 'for'")?;

        let init = if self.is_type_keyword() {
            Some(self.parse_declaration()?)
        } else {
            let init = self.parse_optional_expression(&Token::Semicolon(self.current_location()))?;
            self.expect_token(
                &Token::Semicolon(self.current_location()),
                "Expected ';' after for initializer",
            )?;
            init
        };

        let condition = self.parse_optional_expression(&Token::Semicolon(self.current_location()))?;
        self.expect_token(
            &Token::Semicolon(self.current_location()),
            "Expected ';' after for condition",
        )?;

        let update = self.parse_optional_expression(&Token::RParen(self.current_location()))?;
        self.expect_token(
            &Token::RParen(self.current_location()),
            "Expected ')' after for clauses",
        )?;

        let body = self.parse_statement()?;

        Ok(self.finish(
            NodeKind::Iteration {
                kind: IterationKind::For,
                init,
                condition,
                update,
                body,
            },
            start,
        ))
    }

    fn parse_jump_statement(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current_location();
        let kind = match self.advance() {
            Token::Break(_) => JumpKind::Break,
            Token::Continue(_) => JumpKind::Continue,
            _ => JumpKind::Return,
        };

        let expr = if kind == JumpKind::Return {
            self.parse_optional_expression(&Token::Semicolon(self.current_location()))?
        } else {
            None
        };

        self.expect_token(
            &Token::Semicolon(self.current_location()),
            "Expected ';' after jump statement",
        )?;
        Ok(self.finish(NodeKind::Jump { kind, expr }, start))
    }

    /// Parse an expression unless the next token is `terminator`
    fn parse_optional_expression(&mut self, terminator: &Token) -> Result<Option<NodeId>, ParseError> {
        if self.check(terminator) {
            Ok(None)
        } else {
            self.parse_expression().map(Some)
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::ast::*;
    use crate::parser::parse::Parser;

    fn parse(source: &str) -> Program {
        Parser::new(source).unwrap().parse_program().unwrap()
    }

    fn find(program: &Program, pred: impl Fn(&NodeKind) -> bool) -> &Node {
        program.nodes.iter().find(|n| pred(&n.kind)).unwrap()
    }

    #[test]
    fn test_for_with_declaration() {
        let program = parse("int main() { for (int i = 0; i < 3; i++) { } }");
        let node = find(&program, |k| matches!(k, NodeKind::Iteration { .. }));
        match &node.kind {
            NodeKind::Iteration {
                kind,
                init,
                condition,
                update,
                ..
            } => {
                assert_eq!(*kind, IterationKind::For);
                assert!(matches!(
                    program.node(init.unwrap()).kind,
                    NodeKind::Declaration { .. }
                ));
                assert!(condition.is_some());
                assert!(matches!(
                    program.node(update.unwrap()).kind,
                    NodeKind::Unary { postfix: true, .. }
                ));
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_if_else() {
        let program = parse("int main() { if (1) return 1; else return 0; }");
        let node = find(&program, |k| matches!(k, NodeKind::Selection { .. }));
        assert!(matches!(
            node.kind,
            NodeKind::Selection {
                else_branch: Some(_),
                ..
            }
        ));
    }

    #[test]
    fn test_jumps() {
        let program = parse("int main() { while (1) { break; continue; } return; }");
        let kinds: Vec<_> = program
            .nodes
            .iter()
            .filter_map(|n| match n.kind {
                NodeKind::Jump { kind, expr } => Some((kind, expr.is_some())),
                _ => None,
            })
            .collect();
        assert_eq!(
            kinds,
            vec![
                (JumpKind::Break, false),
                (JumpKind::Continue, false),
                (JumpKind::Return, false)
            ]
        );
    }

    #[test]
    fn test_empty_for_clauses() {
        let program = parse("int main() { for (;;) { break; } }");
        let node = find(&program, |k| matches!(k, NodeKind::Iteration { .. }));
        assert!(matches!(
            node.kind,
            NodeKind::Iteration {
                init: None,
                condition: None,
                update: None,
                ..
            }
        ));
    }
}
