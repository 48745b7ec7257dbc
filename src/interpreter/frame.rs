//! Control-stack frames and value-stack operands
//!
//! A [`Frame`] is one pending activation of a node: the node id, whether it has
//! been entered, and the [`Phase`] it will resume in. Nodes are immutable, so
//! re-entering the same node (a loop body, a function called twice) simply
//! pushes a fresh frame.
//!
//! An [`Operand`] is one intermediate result on the value stack.

use crate::interpreter::errors::RuntimeError;
use crate::memory::scope::{Param, ScopeId};
use crate::memory::value::{TypeDescriptor, Value};
use crate::parser::ast::{NodeId, SourceLocation};

/// Outcome of executing the frame on top of the control stack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// The node finished: its result is on the value stack and its frame is gone
    Done,
    /// The node made progress but is not finished
    Continue,
    /// A statement is waiting for the line cursor to reach it
    Blocked,
}

/// Resume point of a multi-phase node
#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    /// Children pushed, waiting to combine
    Fresh,
    /// Compound statement: next item to run, and the block scope it opened
    /// (`None` for a function body, which runs in the function scope)
    Block { next: usize, scope: Option<ScopeId> },
    /// Declarator list: resolved base type and next declarator to bind
    Declarators { ty: TypeDescriptor, next: usize },
    /// Declaration waiting for its declarator list
    Binding,
    /// Translation unit: next top-level item to consider
    Globals { next: usize },
    Call(CallPhase),
    Selection { scope: ScopeId, branch_taken: bool },
    Iteration {
        step: LoopStep,
        scope: ScopeId,
        base: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallPhase {
    /// Callee definition pushed so it registers itself
    Register,
    /// Argument list pushed
    Arguments,
    /// Body running; `base` is the value-stack depth when it started
    Body { scope: ScopeId, base: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopStep {
    ConditionSetup,
    ConditionEval,
    Body,
    UpdateSetup,
    Update,
    Exit,
}

/// One pending node activation
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub node: NodeId,
    pub entered: bool,
    pub phase: Phase,
}

impl Frame {
    pub fn new(node: NodeId) -> Self {
        Frame {
            node,
            entered: false,
            phase: Phase::Fresh,
        }
    }

    /// A compound statement that runs in the already open function scope
    pub fn function_body(node: NodeId) -> Self {
        Frame {
            node,
            entered: true,
            phase: Phase::Block {
                next: 0,
                scope: None,
            },
        }
    }
}

/// A writable location
#[derive(Debug, Clone, PartialEq)]
pub enum Place {
    Variable(String),
    Element { name: String, index: usize },
}

impl Place {
    pub fn name(&self) -> &str {
        match self {
            Place::Variable(name) | Place::Element { name, .. } => name,
        }
    }
}

/// Declarator evaluated down to its shape
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DeclaratorShape {
    pub name: String,
    pub pointer: usize,
    /// `Some(None)` for `a[]`, `Some(Some(n))` for `a[n]`
    pub array: Option<Option<usize>>,
    /// Parameters of a function declarator
    pub function: Option<Vec<Param>>,
}

impl DeclaratorShape {
    pub fn apply(&self, base: TypeDescriptor) -> TypeDescriptor {
        let ty = base.with_pointer(self.pointer);
        if self.array.is_some() {
            ty.as_array()
        } else {
            ty
        }
    }
}

/// Initializer of one declarator
#[derive(Debug, Clone, PartialEq)]
pub enum Init {
    Value(Value),
    List(Vec<Value>),
}

/// An intermediate result on the value stack
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Value(Value),
    /// Unresolved identifier reference
    Symbol(String),
    /// Array element: where it lives and what it held when read
    Element {
        name: String,
        index: usize,
        value: Value,
    },
    Type(TypeDescriptor),
    Pointer(usize),
    Declarator(DeclaratorShape),
    InitDeclarator {
        shape: DeclaratorShape,
        init: Option<Init>,
    },
    Parameter(Param),
    Parameters(Vec<Param>),
    Arguments(Vec<Value>),
    Initializers(Vec<Value>),
    /// Result of statements and assignments
    Null,
}

impl Operand {
    /// Writable location this operand designates, if any
    pub fn place(&self) -> Option<Place> {
        match self {
            Operand::Symbol(name) => Some(Place::Variable(name.clone())),
            Operand::Element { name, index, .. } => Some(Place::Element {
                name: name.clone(),
                index: *index,
            }),
            _ => None,
        }
    }

    /// Internal error for an operand a node did not expect from its child
    pub fn unexpected(&self, expected: &str, location: SourceLocation) -> RuntimeError {
        RuntimeError::internal(
            format!("expected {}, found {}", expected, self.describe()),
            location,
        )
    }

    /// Short description used in type errors
    pub fn describe(&self) -> String {
        match self {
            Operand::Value(v) => v.ty.to_string(),
            Operand::Symbol(name) => format!("symbol '{}'", name),
            Operand::Element { value, .. } => value.ty.to_string(),
            Operand::Type(ty) => format!("type {}", ty),
            Operand::Pointer(_) => "pointer marker".to_string(),
            Operand::Declarator(_) | Operand::InitDeclarator { .. } => "declarator".to_string(),
            Operand::Parameter(_) | Operand::Parameters(_) => "parameters".to_string(),
            Operand::Arguments(_) => "arguments".to_string(),
            Operand::Initializers(_) => "initializer list".to_string(),
            Operand::Null => "void".to_string(),
        }
    }
}
