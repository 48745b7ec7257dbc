//! Expression parsing implementation
//!
//! This module handles parsing of mini-C expressions with one recursive
//! descent method per precedence level.
//!
//! # Supported Expressions
//!
//! - Literals: integers, floats, strings
//! - Identifiers
//! - Binary operators: `* / %`, `+ -`, `< > <= >=`, `== !=`, `&&`, `||`
//! - Unary operators: `-`, `!`, prefix `++`/`--`
//! - Postfix: `[]`, `()`, `++`, `--`
//! - Type casts: `(float) x`, `(int*) p`
//! - Assignment `=` (right-associative) and the comma operator
//!
//! Binary operators become a `Binary` node whose first child is a bare
//! `Operator` node, followed by the left and right operands.
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use crate::parser::ast::*;
use crate::parser::lexer::Token;
use crate::parser::parse::{ParseError, Parser};

/// Binary precedence levels, loosest first
const BINARY_LEVELS: &[&[&str]] = &[
    &["||"],
    &["&&"],
    &["==", "!="],
    &["<", ">", "<=", ">="],
    &["+", "-"],
    &["*", "/", "%"],
];

impl Parser {
    /// Parse expression (top-level entry point, includes the comma operator)
    pub(crate) fn parse_expression(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current_location();
        let first = self.parse_assignment()?;

        if !self.check(&Token::Comma(self.current_location())) {
            return Ok(first);
        }

        let mut items = vec![first];
        while self.match_token(&Token::Comma(self.current_location())) {
            items.push(self.parse_assignment()?);
        }
        Ok(self.finish(NodeKind::ExpressionList(items), start))
    }

    /// Parse assignment (right-associative)
    pub(crate) fn parse_assignment(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current_location();
        let target = self.parse_binary(0)?;

        if self.match_token(&Token::Eq(self.current_location())) {
            let value = self.parse_assignment()?;
            return Ok(self.finish(NodeKind::Assignment { target, value }, start));
        }

        Ok(target)
    }

    /// Parse a left-associative binary level
    fn parse_binary(&mut self, level: usize) -> Result<NodeId, ParseError> {
        if level >= BINARY_LEVELS.len() {
            return self.parse_cast();
        }

        let start = self.current_location();
        let mut left = self.parse_binary(level + 1)?;

        while let Some(symbol) = self
            .peek()
            .binary_symbol()
            .filter(|s| BINARY_LEVELS[level].contains(s))
        {
            let op_loc = self.current_location();
            self.advance();
            let op = self.finish(NodeKind::Operator(symbol.to_string()), op_loc);
            let right = self.parse_binary(level + 1)?;
            left = self.finish(NodeKind::Binary { op, left, right }, start);
        }

        Ok(left)
    }

    /// Parse cast: `(type *) expr`
    fn parse_cast(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current_location();
        let is_cast = self.check(&Token::LParen(start))
            && matches!(
                self.peek_ahead(1),
                Some(Token::Int(_) | Token::Float(_) | Token::Void(_))
            );

        if !is_cast {
            return self.parse_unary();
        }

        self.advance(); // consume '('
        let specifiers = self.parse_decl_specifiers()?;
        let pointer = self.parse_pointer();
        self.expect_token(
            &Token::RParen(self.current_location()),
            "Expected ')' after cast type",
        )?;
        let expr = self.parse_cast()?;

        Ok(self.finish(
            NodeKind::TypeCast {
                specifiers,
                pointer,
                expr,
            },
            start,
        ))
    }

    /// Parse unary (`! - + ++ --`)
    fn parse_unary(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current_location();

        let op = match self.peek_token() {
            Token::PlusPlus(_) => UnaryOp::Increment,
            Token::MinusMinus(_) => UnaryOp::Decrement,
            Token::Minus(_) => UnaryOp::Negate,
            Token::Bang(_) => UnaryOp::Not,
            Token::Plus(_) => {
                self.advance();
                return self.parse_cast();
            }
            _ => return self.parse_postfix(),
        };

        self.advance();
        let operand = self.parse_cast()?;
        Ok(self.finish(
            NodeKind::Unary {
                op,
                operand,
                postfix: false,
            },
            start,
        ))
    }

    /// Parse postfix (`[] () ++ --`)
    fn parse_postfix(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current_location();
        let mut expr = self.parse_primary()?;

        loop {
            let loc = self.current_location();

            if self.match_token(&Token::PlusPlus(loc)) {
                expr = self.finish(
                    NodeKind::Unary {
                        op: UnaryOp::Increment,
                        operand: expr,
                        postfix: true,
                    },
                    start,
                );
            } else if self.match_token(&Token::MinusMinus(loc)) {
                expr = self.finish(
                    NodeKind::Unary {
                        op: UnaryOp::Decrement,
                        operand: expr,
                        postfix: true,
                    },
                    start,
                );
            } else if self.match_token(&Token::LBracket(loc)) {
                let index = self.parse_expression()?;
                self.expect_token(
                    &Token::RBracket(self.current_location()),
                    "Expected ']' after array index",
                )?;
                expr = self.finish(NodeKind::ArrayReference { base: expr, index }, start);
            } else if self.check(&Token::LParen(loc)) {
                if !matches!(self.nodes[expr].kind, NodeKind::Identifier(_)) {
                    return Err(self.error("Function call must be on an identifier".to_string()));
                }
                self.advance();
                let args = self.parse_argument_list()?;
                self.expect_token(
                    &Token::RParen(self.current_location()),
                    "Expected ')' after function arguments",
                )?;
                expr = self.finish(NodeKind::FunctionCall { callee: expr, args }, start);
            } else {
                break;
            }
        }

        Ok(expr)
    }

    /// Parse argument list contents into an `ArgumentList` node
    fn parse_argument_list(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current_location();
        let mut args = Vec::new();

        if !self.check(&Token::RParen(start)) {
            loop {
                args.push(self.parse_assignment()?);
                if !self.match_token(&Token::Comma(self.current_location())) {
                    break;
                }
            }
        }

        let span = Span::new(start, self.current_location());
        Ok(self.push_node(NodeKind::ArgumentList(args), span))
    }

    /// Parse primary (literals, identifiers, parenthesized expressions)
    fn parse_primary(&mut self) -> Result<NodeId, ParseError> {
        let loc = self.current_location();

        let kind = match self.peek_token() {
            Token::IntLiteral(n, _) => NodeKind::Constant(Constant::Int(n)),
            Token::FloatLiteral(x, _) => NodeKind::Constant(Constant::Float(x)),
            Token::StringLiteral(s, _) => NodeKind::StringLiteral(s),
            Token::Ident(name, _) => NodeKind::Identifier(name),
            Token::LParen(_) => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect_token(
                    &Token::RParen(self.current_location()),
                    "Expected ')' after expression",
                )?;
                return Ok(expr);
            }
            other => {
                return Err(ParseError {
                    message: format!("Unexpected token: {}", other),
                    location: loc,
                })
            }
        };

        self.advance();
        Ok(self.finish(kind, loc))
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::ast::*;
    use crate::parser::parse::Parser;

    fn parse(source: &str) -> Program {
        Parser::new(source).unwrap().parse_program().unwrap()
    }

    fn operators(program: &Program) -> Vec<String> {
        program
            .nodes
            .iter()
            .filter_map(|n| match &n.kind {
                NodeKind::Operator(op) => Some(op.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_precedence() {
        let program = parse("int main() { int x = 1 || 2 && 3 == 4 + 5 * 6; }");
        assert_eq!(operators(&program), vec!["||", "&&", "==", "+", "*"]);

        // The loosest operator ends up at the root of the expression
        let root = program
            .nodes
            .iter()
            .rev()
            .find(|n| matches!(n.kind, NodeKind::Binary { .. }))
            .unwrap();
        match root.kind {
            NodeKind::Binary { op, .. } => {
                assert_eq!(program.node(op).kind, NodeKind::Operator("||".to_string()))
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_prefix_and_postfix() {
        let program = parse("int main() { int x; ++x; x--; -x; !x; }");
        let unary: Vec<_> = program
            .nodes
            .iter()
            .filter_map(|n| match n.kind {
                NodeKind::Unary { op, postfix, .. } => Some((op, postfix)),
                _ => None,
            })
            .collect();
        assert_eq!(
            unary,
            vec![
                (UnaryOp::Increment, false),
                (UnaryOp::Decrement, true),
                (UnaryOp::Negate, false),
                (UnaryOp::Not, false)
            ]
        );
    }

    #[test]
    fn test_cast_and_call() {
        let program = parse("int f(int a) { return a; } int main() { float y = (float) f(1, 2); }");
        assert!(program
            .nodes
            .iter()
            .any(|n| matches!(n.kind, NodeKind::TypeCast { pointer: None, .. })));
        let args = program
            .nodes
            .iter()
            .find_map(|n| match &n.kind {
                NodeKind::ArgumentList(args) if !args.is_empty() => Some(args.len()),
                _ => None,
            })
            .unwrap();
        assert_eq!(args, 2);
    }

    #[test]
    fn test_array_reference_and_comma() {
        let program = parse("int main() { int a[2]; a[0] = 1, a[1] = 2; }");
        assert!(program
            .nodes
            .iter()
            .any(|n| matches!(&n.kind, NodeKind::ExpressionList(items) if items.len() == 2)));
        assert_eq!(
            program
                .nodes
                .iter()
                .filter(|n| matches!(n.kind, NodeKind::ArrayReference { .. }))
                .count(),
            2
        );
    }
}
