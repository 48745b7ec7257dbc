//! Expression execution implementation
//!
//! This module handles the expression nodes:
//!
//! - Unary `++`/`--` (prefix and postfix), `-` and `!`
//! - Binary operators, through the table in `ops`
//! - Assignment, array references and type casts
//! - Argument lists, comma expressions and function calls
//!
//! # Postfix updates
//!
//! A postfix `x++` yields the old value and books the write; the write lands at
//! the next sequence point, so later reads in the same statement still see the
//! old value. Prefix `++x` writes immediately.
//!
//! # Calls
//!
//! A call resolves its callee in the root scope, registering the definition on
//! first use, evaluates its arguments, opens a function scope parented at the
//! root and runs the body in it. The call frame stays on the control stack in
//! [`CallPhase::Body`] until the body finishes or a `return` unwinds to it.

use crate::interpreter::environment::{Activation, Environment};
use crate::interpreter::errors::RuntimeError;
use crate::interpreter::frame::{CallPhase, Frame, Operand, Phase, Progress};
use crate::interpreter::ops;
use crate::memory::scope::{ReturnLinkage, Scope, ScopeId, ScopeKind, Symbol, ROOT_SCOPE};
use crate::memory::value::{BaseType, Data, TypeDescriptor, Value};
use crate::parser::ast::*;
use tracing::debug;

impl Environment {
    pub(crate) fn exec_unary(
        &mut self,
        frame: &Frame,
        op: UnaryOp,
        operand: NodeId,
        postfix: bool,
        location: SourceLocation,
    ) -> Result<Progress, RuntimeError> {
        if !frame.entered {
            return self.enter(&[operand], location);
        }

        let target = self.pop_value(location)?;
        let line = self.line;
        let result = match op {
            UnaryOp::Increment | UnaryOp::Decrement => {
                let delta = if op == UnaryOp::Increment { 1 } else { -1 };
                let place = target.place().ok_or_else(|| RuntimeError::TypeError {
                    expected: "assignable operand".to_string(),
                    got: target.describe(),
                    location,
                })?;
                let current = self.resolve(&target, location)?;
                let updated = ops::step_value(&current, delta, location)?;
                if postfix {
                    self.book_update(place, updated, line, location)?;
                    current
                } else {
                    self.write(&place, updated.clone(), line, location)?;
                    updated
                }
            }
            UnaryOp::Negate => ops::negate(&self.resolve(&target, location)?, location)?,
            UnaryOp::Not => ops::not(&self.resolve(&target, location)?, location)?,
        };

        self.complete(Operand::Value(result), location)
    }

    pub(crate) fn exec_binary(
        &mut self,
        frame: &Frame,
        children: [NodeId; 3],
        location: SourceLocation,
    ) -> Result<Progress, RuntimeError> {
        if !frame.entered {
            return self.enter(&children, location);
        }

        let operands = self.pop_values(3, location)?;
        let symbol = match &operands[0] {
            Operand::Value(value) => value.as_op().map(str::to_string),
            _ => None,
        }
        .ok_or_else(|| operands[0].unexpected("operator", location))?;

        let left = self.resolve(&operands[1], location)?;
        let right = self.resolve(&operands[2], location)?;
        let result = ops::apply_binary(&symbol, &left, &right, location)?;
        self.complete(Operand::Value(result), location)
    }

    pub(crate) fn exec_assignment(
        &mut self,
        frame: &Frame,
        target: NodeId,
        value: NodeId,
        location: SourceLocation,
    ) -> Result<Progress, RuntimeError> {
        if !frame.entered {
            return self.enter(&[target, value], location);
        }

        let operands = self.pop_values(2, location)?;
        let value = self.resolve(&operands[1], location)?;
        let place = operands[0].place().ok_or_else(|| RuntimeError::TypeError {
            expected: "assignable target".to_string(),
            got: operands[0].describe(),
            location,
        })?;
        let line = self.line;
        self.write(&place, value, line, location)?;
        self.complete(Operand::Null, location)
    }

    pub(crate) fn exec_array_reference(
        &mut self,
        frame: &Frame,
        base: NodeId,
        index: NodeId,
        location: SourceLocation,
    ) -> Result<Progress, RuntimeError> {
        if !frame.entered {
            return self.enter(&[base, index], location);
        }

        let operands = self.pop_values(2, location)?;
        let name = match &operands[0] {
            Operand::Symbol(name) => name.clone(),
            other => {
                return Err(RuntimeError::TypeError {
                    expected: "array".to_string(),
                    got: other.describe(),
                    location,
                })
            }
        };

        let index = self.resolve(&operands[1], location)?;
        let index = match index.data {
            Data::Int(n) if index.ty.is_arithmetic() => n,
            _ => {
                return Err(RuntimeError::TypeError {
                    expected: "int index".to_string(),
                    got: index.ty.to_string(),
                    location,
                })
            }
        };

        let array = self.read_symbol(&name, location)?;
        let elements = array.elements().ok_or_else(|| RuntimeError::TypeError {
            expected: "array".to_string(),
            got: array.ty.to_string(),
            location,
        })?;
        let value = usize::try_from(index)
            .ok()
            .and_then(|i| elements.get(i))
            .cloned()
            .ok_or_else(|| RuntimeError::IndexOutOfRange {
                name: name.clone(),
                index,
                length: elements.len(),
                location,
            })?;

        self.complete(
            Operand::Element {
                name,
                index: index as usize,
                value,
            },
            location,
        )
    }

    pub(crate) fn exec_type_cast(
        &mut self,
        frame: &Frame,
        node: &Node,
        location: SourceLocation,
    ) -> Result<Progress, RuntimeError> {
        let children = node.children();
        if !frame.entered {
            return self.enter(&children, location);
        }

        let operands = self.pop_values(children.len(), location)?;
        let base = match &operands[0] {
            Operand::Type(ty) => *ty,
            other => return Err(other.unexpected("type", location)),
        };
        let order = match operands.get(1) {
            Some(Operand::Pointer(order)) if operands.len() == 3 => *order,
            _ => 0,
        };
        let target = base.with_pointer(order);

        let expr = operands
            .last()
            .ok_or_else(|| RuntimeError::internal("cast without operand", location))?;
        let value = self.resolve(expr, location)?;
        let cast = value.cast_to(&target).ok_or_else(|| RuntimeError::TypeMismatch {
            left: value.ty.to_string(),
            right: target.to_string(),
            location,
        })?;
        self.complete(Operand::Value(cast), location)
    }

    pub(crate) fn exec_argument_list(
        &mut self,
        frame: &Frame,
        items: &[NodeId],
        location: SourceLocation,
    ) -> Result<Progress, RuntimeError> {
        if !frame.entered && !items.is_empty() {
            return self.enter(items, location);
        }

        let operands = self.pop_values(items.len(), location)?;
        let args = operands
            .iter()
            .map(|operand| self.resolve(operand, location))
            .collect::<Result<Vec<_>, _>>()?;
        self.complete(Operand::Arguments(args), location)
    }

    pub(crate) fn exec_expression_list(
        &mut self,
        frame: &Frame,
        items: &[NodeId],
        location: SourceLocation,
    ) -> Result<Progress, RuntimeError> {
        if !frame.entered {
            return self.enter(items, location);
        }

        let mut operands = self.pop_values(items.len(), location)?;
        let last = operands
            .pop()
            .ok_or_else(|| RuntimeError::internal("empty comma expression", location))?;
        self.complete(last, location)
    }

    // ===== Function calls =====

    pub(crate) fn exec_function_call(
        &mut self,
        program: &Program,
        frame: &Frame,
        callee: NodeId,
        args: NodeId,
        location: SourceLocation,
    ) -> Result<Progress, RuntimeError> {
        let name = match &program.node(callee).kind {
            NodeKind::Identifier(name) => name.as_str(),
            _ => return Err(RuntimeError::internal("call on a non-identifier", location)),
        };

        match frame.phase {
            Phase::Fresh => {
                if self.resolve_function(name, location)? {
                    self.set_phase(Phase::Call(CallPhase::Arguments), location)?;
                    self.push_node(args);
                    return Ok(Progress::Continue);
                }
                let definition = program.functions.get(name).copied().ok_or_else(|| {
                    RuntimeError::UndefinedSymbol {
                        name: name.to_string(),
                        location,
                    }
                })?;
                self.set_phase(Phase::Call(CallPhase::Register), location)?;
                self.push_node(definition);
                Ok(Progress::Continue)
            }
            Phase::Call(CallPhase::Register) => {
                self.pop_value(location)?;
                if !self.resolve_function(name, location)? {
                    return Err(RuntimeError::UndefinedSymbol {
                        name: name.to_string(),
                        location,
                    });
                }
                self.set_phase(Phase::Call(CallPhase::Arguments), location)?;
                self.push_node(args);
                Ok(Progress::Continue)
            }
            Phase::Call(CallPhase::Arguments) => match self.pop_value(location)? {
                Operand::Arguments(values) => {
                    let entry = frame.node == program.entry;
                    self.enter_function(program, name, values, entry, location)
                }
                other => Err(other.unexpected("arguments", location)),
            },
            Phase::Call(CallPhase::Body { scope, base }) => {
                self.leave_function(name, scope, base, location)
            }
            _ => Err(RuntimeError::internal("call frame in a foreign phase", location)),
        }
    }

    /// Whether `name` is a registered function in the root scope
    fn resolve_function(&self, name: &str, location: SourceLocation) -> Result<bool, RuntimeError> {
        match self.scopes.root().get(name) {
            Some(symbol) if symbol.is_function() => Ok(true),
            Some(symbol) => Err(RuntimeError::TypeError {
                expected: "function".to_string(),
                got: symbol.ty.to_string(),
                location,
            }),
            None => Ok(false),
        }
    }

    fn enter_function(
        &mut self,
        program: &Program,
        name: &str,
        args: Vec<Value>,
        entry: bool,
        location: SourceLocation,
    ) -> Result<Progress, RuntimeError> {
        let info = self
            .scopes
            .root()
            .get(name)
            .and_then(|symbol| symbol.function.clone())
            .ok_or_else(|| RuntimeError::UndefinedSymbol {
                name: name.to_string(),
                location,
            })?;

        let expected = info.arity();
        if args.len() != expected {
            return Err(RuntimeError::ArgumentCountMismatch {
                function: name.to_string(),
                expected,
                got: args.len(),
                location,
            });
        }

        let mut bindings = Vec::with_capacity(args.len());
        for (position, (arg, param)) in args.iter().zip(&info.params).enumerate() {
            let value = arg
                .cast_to(&param.ty)
                .ok_or_else(|| RuntimeError::ArgumentTypeMismatch {
                    function: name.to_string(),
                    position: position + 1,
                    expected: param.ty.to_string(),
                    got: arg.ty.to_string(),
                    location,
                })?;
            bindings.push((param, value));
        }

        self.flush_booked_updates()?;

        let scope = self.open_scope(
            Scope::new(ScopeKind::Function, name.to_string(), Some(ROOT_SCOPE)).with_linkage(
                ReturnLinkage {
                    return_scope: self.scope,
                    return_line: self.line,
                    return_type: Some(info.return_type),
                    return_value: None,
                },
            ),
        );

        let definition_line = program.span(info.definition).start_line();
        for (param, value) in bindings {
            let Some(param_name) = &param.name else {
                continue;
            };
            let len = value.elements().map(<[Value]>::len);
            let address = self.allocate(&param.ty, len);
            let mut symbol = Symbol::variable(param_name.clone(), address, param.ty);
            symbol.set_value(value, definition_line);
            self.declare_in(scope, symbol, location)?;
        }

        debug!(function = name, call_line = self.line, depth = self.calls.len() + 1, "enter function");
        self.calls.push(Activation {
            function: name.to_string(),
            scope,
            call_line: self.line,
            entry,
        });

        let base = self.values.len();
        self.set_phase(Phase::Call(CallPhase::Body { scope, base }), location)?;
        self.scope = scope;
        self.line = program.span(info.body).start_line();
        self.push_frame(Frame::function_body(info.body));
        Ok(Progress::Continue)
    }

    fn leave_function(
        &mut self,
        name: &str,
        scope: ScopeId,
        base: usize,
        location: SourceLocation,
    ) -> Result<Progress, RuntimeError> {
        self.values.truncate(base);

        let linkage = self
            .scopes
            .get(scope)
            .and_then(|s| s.linkage.clone())
            .ok_or_else(|| RuntimeError::internal("function scope released early", location))?;
        let return_type = linkage
            .return_type
            .unwrap_or_else(|| TypeDescriptor::new(BaseType::Void));

        let entry = self.calls.last().is_some_and(|call| call.entry);
        let result = match linkage.return_value {
            Some(value) if return_type.is_void() => {
                return Err(RuntimeError::ReturnTypeMismatch {
                    function: name.to_string(),
                    expected: return_type.to_string(),
                    got: value.ty.to_string(),
                    location,
                })
            }
            Some(value) => value
                .cast_to(&return_type)
                .map(Operand::Value)
                .ok_or_else(|| RuntimeError::ReturnTypeMismatch {
                    function: name.to_string(),
                    expected: return_type.to_string(),
                    got: value.ty.to_string(),
                    location,
                })?,
            // `main` may end without a `return`
            None if return_type.is_void() || entry => Operand::Null,
            None => {
                return Err(RuntimeError::ReturnTypeMismatch {
                    function: name.to_string(),
                    expected: return_type.to_string(),
                    got: "void".to_string(),
                    location,
                })
            }
        };

        self.calls.pop();
        if entry {
            // The entry call keeps its own scope so the final state stays inspectable
            self.release_scope(scope + 1);
            self.scope = scope;
        } else {
            self.release_scope(scope);
            self.scope = linkage.return_scope;
        }
        self.line = linkage.return_line;

        debug!(function = name, return_line = self.line, "leave function");
        self.complete(result, location)
    }
}
