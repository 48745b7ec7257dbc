//! Resumable node execution
//!
//! [`Environment::execute`] runs one slice of the frame on top of the control
//! stack. Every node kind follows the same protocol:
//!
//! 1. On first entry the frame is marked entered and the node's children are
//!    pushed in reverse so the leftmost runs first.
//! 2. On the next entry the children's results are popped from the value
//!    stack, combined, and exactly one result is pushed before the frame pops.
//!
//! Statements check the line cursor before doing anything and report
//! [`Progress::Blocked`] while their first line has not been reached. Nodes
//! that need more than two entries keep their position in the frame's
//! [`Phase`](crate::interpreter::frame::Phase).

use crate::interpreter::errors::RuntimeError;
use crate::interpreter::frame::{Frame, Operand, Phase, Progress};
use crate::interpreter::environment::Environment;
use crate::memory::value::{TypeDescriptor, Value};
use crate::parser::ast::*;
use tracing::trace;

impl Environment {
    /// Execute the frame on top of the control stack
    pub fn execute(&mut self, program: &Program) -> Result<Progress, RuntimeError> {
        let frame = match self.control.last() {
            Some(frame) => frame.clone(),
            None => {
                return Err(RuntimeError::internal(
                    "nothing left to execute",
                    SourceLocation::new(self.line, 0),
                ))
            }
        };
        let node = program.node(frame.node);

        if node.is_statement() && !frame.entered && self.line < node.span.start_line() {
            return Ok(Progress::Blocked);
        }

        trace!(
            line = self.line,
            node = %node.label(),
            control = self.control.len(),
            values = self.values.len(),
            "execute"
        );
        self.record(node.label());

        let location = node.span.start;
        match &node.kind {
            NodeKind::Identifier(name) => self.complete(Operand::Symbol(name.clone()), location),
            NodeKind::Constant(Constant::Int(n)) => {
                self.complete(Operand::Value(Value::int(*n)), location)
            }
            NodeKind::Constant(Constant::Float(x)) => {
                self.complete(Operand::Value(Value::float(*x)), location)
            }
            NodeKind::StringLiteral(s) => {
                self.complete(Operand::Value(Value::string(s.clone())), location)
            }
            NodeKind::TypeSpec(base) => {
                self.complete(Operand::Type(TypeDescriptor::new(*base)), location)
            }
            NodeKind::Operator(op) => self.complete(Operand::Value(Value::op(op.clone())), location),
            NodeKind::PointerMarker(order) => self.complete(Operand::Pointer(*order), location),

            NodeKind::Unary { op, operand, postfix } => {
                self.exec_unary(&frame, *op, *operand, *postfix, location)
            }
            NodeKind::Binary { op, left, right } => {
                self.exec_binary(&frame, [*op, *left, *right], location)
            }
            NodeKind::Assignment { target, value } => {
                self.exec_assignment(&frame, *target, *value, location)
            }
            NodeKind::ArrayReference { base, index } => {
                self.exec_array_reference(&frame, *base, *index, location)
            }
            NodeKind::TypeCast { .. } => self.exec_type_cast(&frame, node, location),
            NodeKind::FunctionCall { callee, args } => {
                self.exec_function_call(program, &frame, *callee, *args, location)
            }
            NodeKind::ArgumentList(items) => self.exec_argument_list(&frame, items, location),
            NodeKind::ExpressionList(items) => self.exec_expression_list(&frame, items, location),

            NodeKind::Declaration {
                specifiers,
                declarators,
            } => self.exec_declaration(&frame, *specifiers, *declarators, location),
            NodeKind::DeclSpecifiers(items) => self.exec_decl_specifiers(&frame, items, location),
            NodeKind::Declarator { pointer, name } => {
                self.exec_declarator(&frame, *pointer, name, location)
            }
            NodeKind::ArrayDeclarator { of, bound } => {
                self.exec_array_declarator(&frame, *of, *bound, location)
            }
            NodeKind::FunctionDeclarator { of, params } => {
                self.exec_function_declarator(&frame, *of, *params, location)
            }
            NodeKind::InitDeclaratorList(items) => {
                self.exec_init_declarator_list(&frame, items, location)
            }
            NodeKind::InitDeclarator {
                declarator,
                initializer,
            } => self.exec_init_declarator(&frame, *declarator, *initializer, location),
            NodeKind::InitializerList(items) => {
                self.exec_initializer_list(&frame, items, location)
            }
            NodeKind::ParameterDeclaration {
                specifiers,
                declarator,
            } => self.exec_parameter_declaration(&frame, *specifiers, *declarator, location),
            NodeKind::ParameterList(items) => self.exec_parameter_list(&frame, items, location),

            NodeKind::Compound(items) => self.exec_compound(&frame, items, location),
            NodeKind::Selection {
                condition,
                then_branch,
                else_branch,
            } => self.exec_selection(
                &frame,
                node,
                *condition,
                *then_branch,
                *else_branch,
                location,
            ),
            NodeKind::ExpressionStatement(expr) => {
                self.exec_expression_statement(&frame, *expr, location)
            }
            NodeKind::Iteration {
                init,
                condition,
                update,
                body,
                ..
            } => self.exec_iteration(
                program,
                &frame,
                node,
                [*init, *condition, *update],
                *body,
                location,
            ),
            NodeKind::Jump { kind, expr } => self.exec_jump(&frame, *kind, *expr, location),

            NodeKind::TranslationUnit(items) => {
                self.exec_translation_unit(program, &frame, items, location)
            }
            NodeKind::FunctionDefinition {
                specifiers,
                declarator,
                body,
            } => self.exec_function_definition(&frame, *specifiers, *declarator, *body, location),
        }
    }

    /// Run frames until the control stack is empty or a statement blocks
    pub fn run_to_completion(&mut self, program: &Program) -> Result<Progress, RuntimeError> {
        while !self.control.is_empty() {
            if self.execute(program)? == Progress::Blocked {
                return Ok(Progress::Blocked);
            }
        }
        Ok(Progress::Done)
    }

    /// Set the phase of the frame on top of the control stack
    pub(crate) fn set_phase(&mut self, phase: Phase, location: SourceLocation) -> Result<(), RuntimeError> {
        let top = self.top_frame_mut(location)?;
        top.entered = true;
        top.phase = phase;
        Ok(())
    }

    /// Index of the nearest frame below the top whose node satisfies `pred`
    pub(crate) fn find_frame(&self, mut pred: impl FnMut(&Frame) -> bool) -> Option<usize> {
        let below_top = self.control.len().saturating_sub(1);
        self.control[..below_top].iter().rposition(|frame| pred(frame))
    }
}
