//! Declaration parsing implementation
//!
//! This module handles parsing of declarations and declarators:
//!
//! - Function definitions: `type name(params) { ... }`
//! - Variable declarations, global or local: `int x = 1, a[3] = {1, 2};`
//! - Declarators: pointers, array bounds and parameter lists
//!
//! # Grammar
//!
//! ```text
//! external_decl   ::= specifiers declarator ( compound | init_rest ";" )
//! declaration     ::= specifiers [ init_decl ( "," init_decl )* ] ";"
//! init_decl       ::= declarator [ "=" initializer ]
//! initializer     ::= assignment | "{" assignment ( "," assignment )* [","] "}"
//! declarator      ::= "*"* identifier ( "[" [expr] "]" | "(" params ")" )*
//! params          ::= [ param ( "," param )* ]
//! param           ::= specifiers [ declarator ]
//! ```
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use crate::memory::value::BaseType;
use crate::parser::ast::*;
use crate::parser::lexer::Token;
use crate::parser::parse::{ParseError, Parser};

impl Parser {
    /// Parse a function definition or a global declaration
    pub(crate) fn parse_external_declaration(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current_location();
        let specifiers = self.parse_decl_specifiers()?;

        if self.match_token(&Token::Semicolon(self.current_location())) {
            return Ok(self.finish(
                NodeKind::Declaration {
                    specifiers,
                    declarators: None,
                },
                start,
            ));
        }

        let declarator = self.parse_declarator()?;
        let is_function = matches!(
            self.nodes[declarator].kind,
            NodeKind::FunctionDeclarator { .. }
        );

        if is_function && self.check(&Token::LBrace(self.current_location())) {
            let name = self.declarator_name(declarator).unwrap_or_default();
            let body = self.parse_compound_statement()?;
            let definition = self.finish(
                NodeKind::FunctionDefinition {
                    specifiers,
                    declarator,
                    body,
                },
                start,
            );
            if self.functions.insert(name.clone(), definition).is_some() {
                return Err(ParseError {
                    message: format!("redefinition of function '{}'", name),
                    location: start,
                });
            }
            return Ok(definition);
        }

        let declarators = self.parse_init_declarator_list(Some(declarator))?;
        self.expect_token(
            &Token::Semicolon(self.current_location()),
            "Expected ';' after declaration",
        )?;
        Ok(self.finish(
            NodeKind::Declaration {
                specifiers,
                declarators: Some(declarators),
            },
            start,
        ))
    }

    /// Parse a local declaration: `int x = 1, y;`
    pub(crate) fn parse_declaration(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current_location();
        let specifiers = self.parse_decl_specifiers()?;

        let declarators = if self.check(&Token::Semicolon(self.current_location())) {
            None
        } else {
            Some(self.parse_init_declarator_list(None)?)
        };

        self.expect_token(
            &Token::Semicolon(self.current_location()),
            "Expected ';' after declaration",
        )?;
        Ok(self.finish(
            NodeKind::Declaration {
                specifiers,
                declarators,
            },
            start,
        ))
    }

    /// Parse one or more type keywords
    pub(crate) fn parse_decl_specifiers(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current_location();
        let mut specifiers = Vec::new();

        while self.is_type_keyword() {
            let loc = self.current_location();
            let base = match self.advance() {
                Token::Int(_) => BaseType::Int,
                Token::Float(_) => BaseType::Float,
                _ => BaseType::Void,
            };
            specifiers.push(self.finish(NodeKind::TypeSpec(base), loc));
        }

        if specifiers.is_empty() {
            return Err(self.error(format!("Expected type name, found {}", self.peek())));
        }

        Ok(self.finish(NodeKind::DeclSpecifiers(specifiers), start))
    }

    /// Parse `*`s into a pointer marker node, if any
    pub(crate) fn parse_pointer(&mut self) -> Option<NodeId> {
        let start = self.current_location();
        let mut order = 0;
        while self.match_token(&Token::Star(self.current_location())) {
            order += 1;
        }
        (order > 0).then(|| self.finish(NodeKind::PointerMarker(order), start))
    }

    /// Parse a declarator with its array and function suffixes
    pub(crate) fn parse_declarator(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current_location();
        let pointer = self.parse_pointer();
        let name = self.expect_identifier()?;
        let mut declarator = self.finish(NodeKind::Declarator { pointer, name }, start);

        loop {
            if self.match_token(&Token::LBracket(self.current_location())) {
                let bound = if self.check(&Token::RBracket(self.current_location())) {
                    None
                } else {
                    Some(self.parse_assignment()?)
                };
                self.expect_token(
                    &Token::RBracket(self.current_location()),
                    "Expected ']' after array bound",
                )?;
                declarator = self.finish(
                    NodeKind::ArrayDeclarator {
                        of: declarator,
                        bound,
                    },
                    start,
                );
            } else if self.match_token(&Token::LParen(self.current_location())) {
                let params = self.parse_parameter_list()?;
                self.expect_token(
                    &Token::RParen(self.current_location()),
                    "Expected ')' after parameters",
                )?;
                declarator = self.finish(
                    NodeKind::FunctionDeclarator {
                        of: declarator,
                        params,
                    },
                    start,
                );
            } else {
                break;
            }
        }

        Ok(declarator)
    }

    /// Parse parameter list contents (parentheses handled by the caller)
    fn parse_parameter_list(&mut self) -> Result<Option<NodeId>, ParseError> {
        if self.check(&Token::RParen(self.current_location())) {
            return Ok(None);
        }

        let start = self.current_location();
        let mut params = Vec::new();
        loop {
            let param_start = self.current_location();
            let specifiers = self.parse_decl_specifiers()?;
            let declarator = if matches!(self.peek(), Token::Star(_) | Token::Ident(..)) {
                Some(self.parse_declarator()?)
            } else {
                None
            };
            params.push(self.finish(
                NodeKind::ParameterDeclaration {
                    specifiers,
                    declarator,
                },
                param_start,
            ));

            if !self.match_token(&Token::Comma(self.current_location())) {
                break;
            }
        }

        Ok(Some(self.finish(NodeKind::ParameterList(params), start)))
    }

    /// Parse `declarator [= initializer], ...`, optionally continuing from an
    /// already parsed first declarator
    fn parse_init_declarator_list(&mut self, first: Option<NodeId>) -> Result<NodeId, ParseError> {
        let start = match first {
            Some(id) => self.node_start(id),
            None => self.current_location(),
        };
        let mut items = Vec::new();
        let mut pending = first;

        loop {
            let declarator = match pending.take() {
                Some(id) => id,
                None => self.parse_declarator()?,
            };
            let decl_start = self.node_start(declarator);
            let initializer = if self.match_token(&Token::Eq(self.current_location())) {
                Some(self.parse_initializer()?)
            } else {
                None
            };
            items.push(self.finish(
                NodeKind::InitDeclarator {
                    declarator,
                    initializer,
                },
                decl_start,
            ));

            if !self.match_token(&Token::Comma(self.current_location())) {
                break;
            }
        }

        Ok(self.finish(NodeKind::InitDeclaratorList(items), start))
    }

    fn parse_initializer(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current_location();
        if !self.match_token(&Token::LBrace(start)) {
            return self.parse_assignment();
        }

        let mut items = Vec::new();
        while !self.check(&Token::RBrace(self.current_location())) {
            items.push(self.parse_assignment()?);
            if !self.match_token(&Token::Comma(self.current_location())) {
                break;
            }
        }
        self.expect_token(
            &Token::RBrace(self.current_location()),
            "Expected '}' after initializer list",
        )?;
        Ok(self.finish(NodeKind::InitializerList(items), start))
    }

    fn declarator_name(&self, id: NodeId) -> Option<String> {
        match &self.nodes[id].kind {
            NodeKind::Declarator { name, .. } => Some(name.clone()),
            NodeKind::ArrayDeclarator { of, .. } | NodeKind::FunctionDeclarator { of, .. } => {
                self.declarator_name(*of)
            }
            _ => None,
        }
    }
}
