//! Statement execution implementation
//!
//! This module handles the statement nodes and the translation unit:
//!
//! - Compound statements, each with its own block scope
//! - Expression statements
//! - Selection (`if`/`else`) and iteration (`for`/`while`)
//! - Jumps: `return`, `break`, `continue`
//!
//! # Control Flow
//!
//! Selection and iteration open a scope whose linkage records where control
//! continues once the statement is left (`end_line + 1`). Loops move the line
//! cursor to the body when the condition holds and back to the header before
//! the update, so stepping visits the header on every iteration.
//!
//! Jumps unwind the control stack directly: `return` to the nearest call
//! frame, `break` and `continue` to the nearest loop frame, which then resumes
//! in its exit or update phase.

use crate::interpreter::environment::Environment;
use crate::interpreter::errors::RuntimeError;
use crate::interpreter::frame::{CallPhase, Frame, LoopStep, Operand, Phase, Progress};
use crate::memory::scope::{ReturnLinkage, Scope, ScopeId, ScopeKind};
use crate::parser::ast::*;

impl Environment {
    pub(crate) fn exec_compound(
        &mut self,
        frame: &Frame,
        items: &[NodeId],
        location: SourceLocation,
    ) -> Result<Progress, RuntimeError> {
        let (next, scope) = match frame.phase {
            Phase::Fresh => {
                let scope = self.open_scope(Scope::new(
                    ScopeKind::Block,
                    "block".to_string(),
                    Some(self.scope),
                ));
                self.scope = scope;
                (0, Some(scope))
            }
            Phase::Block { next, scope } => {
                if next > 0 {
                    self.pop_value(location)?;
                    self.flush_booked_updates()?;
                }
                (next, scope)
            }
            _ => return Err(RuntimeError::internal("block in a foreign phase", location)),
        };

        match items.get(next) {
            Some(&item) => {
                self.set_phase(Phase::Block { next: next + 1, scope }, location)?;
                self.push_node(item);
                Ok(Progress::Continue)
            }
            None => {
                if let Some(scope) = scope {
                    self.scope = self.parent_of(scope);
                    self.release_scope(scope);
                }
                self.complete(Operand::Null, location)
            }
        }
    }

    pub(crate) fn exec_expression_statement(
        &mut self,
        frame: &Frame,
        expr: Option<NodeId>,
        location: SourceLocation,
    ) -> Result<Progress, RuntimeError> {
        match (expr, frame.entered) {
            (Some(expr), false) => self.enter(&[expr], location),
            (Some(_), true) => {
                self.pop_value(location)?;
                self.complete(Operand::Null, location)
            }
            (None, _) => self.complete(Operand::Null, location),
        }
    }

    pub(crate) fn exec_selection(
        &mut self,
        frame: &Frame,
        node: &Node,
        condition: NodeId,
        then_branch: NodeId,
        else_branch: Option<NodeId>,
        location: SourceLocation,
    ) -> Result<Progress, RuntimeError> {
        match frame.phase {
            Phase::Fresh => {
                let scope = self.open_linked_scope(ScopeKind::Selection, "if", node);
                self.set_phase(
                    Phase::Selection {
                        scope,
                        branch_taken: false,
                    },
                    location,
                )?;
                self.push_node(condition);
                Ok(Progress::Continue)
            }
            Phase::Selection {
                scope,
                branch_taken: false,
            } => {
                let taken = self.pop_condition(location)?;
                self.flush_booked_updates()?;
                let branch = if taken { Some(then_branch) } else { else_branch };
                match branch {
                    Some(branch) => {
                        self.set_phase(
                            Phase::Selection {
                                scope,
                                branch_taken: true,
                            },
                            location,
                        )?;
                        self.push_node(branch);
                        Ok(Progress::Continue)
                    }
                    None => self.leave_linked_scope(scope, location),
                }
            }
            Phase::Selection {
                scope,
                branch_taken: true,
            } => {
                self.pop_value(location)?;
                self.leave_linked_scope(scope, location)
            }
            _ => Err(RuntimeError::internal("selection in a foreign phase", location)),
        }
    }

    pub(crate) fn exec_iteration(
        &mut self,
        program: &Program,
        frame: &Frame,
        node: &Node,
        [init, condition, update]: [Option<NodeId>; 3],
        body: NodeId,
        location: SourceLocation,
    ) -> Result<Progress, RuntimeError> {
        let (step, scope, base) = match frame.phase {
            Phase::Fresh => {
                let label = match node.kind {
                    NodeKind::Iteration {
                        kind: IterationKind::While,
                        ..
                    } => "while",
                    _ => "for",
                };
                let scope = self.open_linked_scope(ScopeKind::Loop, label, node);
                let base = self.values.len();
                self.set_phase(
                    Phase::Iteration {
                        step: LoopStep::ConditionSetup,
                        scope,
                        base,
                    },
                    location,
                )?;
                if let Some(init) = init {
                    self.push_node(init);
                }
                return Ok(Progress::Continue);
            }
            Phase::Iteration { step, scope, base } => (step, scope, base),
            _ => return Err(RuntimeError::internal("loop in a foreign phase", location)),
        };

        let goto = |env: &mut Environment, step: LoopStep| {
            env.set_phase(Phase::Iteration { step, scope, base }, location)
        };

        match step {
            LoopStep::ConditionSetup => {
                self.values.truncate(base);
                self.flush_booked_updates()?;
                match condition {
                    Some(condition) => {
                        goto(self, LoopStep::ConditionEval)?;
                        self.push_node(condition);
                    }
                    None => {
                        goto(self, LoopStep::Body)?;
                        self.line = program.span(body).start_line();
                        self.push_node(body);
                    }
                }
            }
            LoopStep::ConditionEval => {
                let holds = self.pop_condition(location)?;
                self.flush_booked_updates()?;
                if holds {
                    goto(self, LoopStep::Body)?;
                    self.line = program.span(body).start_line();
                    self.push_node(body);
                } else {
                    goto(self, LoopStep::Exit)?;
                }
            }
            LoopStep::Body => {
                self.values.truncate(base);
                goto(self, LoopStep::UpdateSetup)?;
            }
            LoopStep::UpdateSetup => {
                self.line = node.span.start_line();
                self.flush_booked_updates()?;
                goto(self, LoopStep::Update)?;
                if let Some(update) = update {
                    self.push_node(update);
                }
            }
            LoopStep::Update => {
                self.values.truncate(base);
                goto(self, LoopStep::ConditionSetup)?;
            }
            LoopStep::Exit => {
                self.values.truncate(base);
                return self.leave_linked_scope(scope, location);
            }
        }
        Ok(Progress::Continue)
    }

    pub(crate) fn exec_jump(
        &mut self,
        frame: &Frame,
        kind: JumpKind,
        expr: Option<NodeId>,
        location: SourceLocation,
    ) -> Result<Progress, RuntimeError> {
        match kind {
            JumpKind::Return => self.exec_return(frame, expr, location),
            JumpKind::Break | JumpKind::Continue => self.exec_loop_jump(kind, location),
        }
    }

    fn exec_return(
        &mut self,
        frame: &Frame,
        expr: Option<NodeId>,
        location: SourceLocation,
    ) -> Result<Progress, RuntimeError> {
        if let (Some(expr), false) = (expr, frame.entered) {
            return self.enter(&[expr], location);
        }

        let value = match expr {
            Some(_) => {
                let operand = self.pop_value(location)?;
                Some(self.resolve(&operand, location)?)
            }
            None => None,
        };

        let misplaced = || RuntimeError::MisplacedJump {
            keyword: "return".to_string(),
            context: "a function".to_string(),
            location,
        };
        let scope = self.calls.last().map(|call| call.scope).ok_or_else(misplaced)?;
        let call = self
            .find_frame(|f| matches!(f.phase, Phase::Call(CallPhase::Body { .. })))
            .ok_or_else(misplaced)?;

        if let Some(linkage) = self.scopes.get_mut(scope).and_then(|s| s.linkage.as_mut()) {
            linkage.return_value = value;
        }
        self.control.truncate(call + 1);
        Ok(Progress::Continue)
    }

    fn exec_loop_jump(&mut self, kind: JumpKind, location: SourceLocation) -> Result<Progress, RuntimeError> {
        let target = self
            .find_frame(|f| {
                matches!(
                    f.phase,
                    Phase::Iteration { .. } | Phase::Call(CallPhase::Body { .. })
                )
            })
            .map(|index| (index, self.control[index].phase.clone()));

        let Some((index, Phase::Iteration { scope, base, .. })) = target else {
            let keyword = if kind == JumpKind::Break { "break" } else { "continue" };
            return Err(RuntimeError::MisplacedJump {
                keyword: keyword.to_string(),
                context: "a loop".to_string(),
                location,
            });
        };

        self.control.truncate(index + 1);
        self.values.truncate(base);
        self.release_scope(scope + 1);
        self.scope = scope;

        let step = if kind == JumpKind::Break {
            LoopStep::Exit
        } else {
            LoopStep::UpdateSetup
        };
        self.set_phase(Phase::Iteration { step, scope, base }, location)?;
        Ok(Progress::Continue)
    }

    pub(crate) fn exec_translation_unit(
        &mut self,
        program: &Program,
        frame: &Frame,
        items: &[NodeId],
        location: SourceLocation,
    ) -> Result<Progress, RuntimeError> {
        let next = match frame.phase {
            Phase::Fresh => 0,
            Phase::Globals { next } => {
                self.pop_value(location)?;
                self.flush_booked_updates()?;
                next
            }
            _ => return Err(RuntimeError::internal("translation unit in a foreign phase", location)),
        };

        // Function definitions register themselves on first call
        let pending = items[next..]
            .iter()
            .position(|&item| !matches!(program.node(item).kind, NodeKind::FunctionDefinition { .. }))
            .map(|offset| next + offset);

        match pending {
            Some(index) => {
                let item = items[index];
                self.line = program.span(item).start_line();
                self.set_phase(Phase::Globals { next: index + 1 }, location)?;
                self.push_node(item);
                Ok(Progress::Continue)
            }
            None => self.complete(Operand::Null, location),
        }
    }

    // ===== Helpers =====

    /// Open a scope that returns to the current one just past `node`
    fn open_linked_scope(&mut self, kind: ScopeKind, label: &str, node: &Node) -> ScopeId {
        let linkage = ReturnLinkage {
            return_scope: self.scope,
            return_line: node.span.end_line() + 1,
            return_type: None,
            return_value: None,
        };
        let scope = self.open_scope(
            Scope::new(kind, label.to_string(), Some(self.scope)).with_linkage(linkage),
        );
        self.scope = scope;
        scope
    }

    /// Restore the enclosing scope and line, release `scope`, finish the statement
    fn leave_linked_scope(&mut self, scope: ScopeId, location: SourceLocation) -> Result<Progress, RuntimeError> {
        let linkage = self
            .scopes
            .get(scope)
            .and_then(|s| s.linkage.clone())
            .ok_or_else(|| RuntimeError::internal("statement scope released early", location))?;
        self.scope = linkage.return_scope;
        self.line = linkage.return_line;
        self.release_scope(scope);
        self.complete(Operand::Null, location)
    }

    /// Pop a condition result and test it: true when the value is at least 1
    fn pop_condition(&mut self, location: SourceLocation) -> Result<bool, RuntimeError> {
        let operand = self.pop_value(location)?;
        let value = self.resolve(&operand, location)?;
        value.truthy().ok_or_else(|| RuntimeError::TypeError {
            expected: "numeric condition".to_string(),
            got: value.ty.to_string(),
            location,
        })
    }
}
