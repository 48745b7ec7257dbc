//! AST definitions
//!
//! Nodes live in a flat arena owned by [`Program`] and refer to their children
//! by [`NodeId`]. Nodes are immutable once parsed; all per-activation execution
//! state is kept by the interpreter, never in the tree.

use crate::memory::value::BaseType;
use rustc_hash::FxHashMap;
use std::fmt::Write as _;

/// Index of a node in the [`Program`] arena
pub type NodeId = usize;

/// Source location information for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Start and end of a node in the source text (both inclusive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: SourceLocation,
    pub end: SourceLocation,
}

impl Span {
    pub fn new(start: SourceLocation, end: SourceLocation) -> Self {
        Span { start, end }
    }

    pub fn start_line(&self) -> usize {
        self.start.line
    }

    pub fn end_line(&self) -> usize {
        self.end.line
    }
}

/// Numeric literal payload
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Constant {
    Int(i64),
    Float(f64),
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Increment, // ++
    Decrement, // --
    Negate,    // -x
    Not,       // !x
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterationKind {
    For,
    While,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpKind {
    Return,
    Break,
    Continue,
}

/// Every node kind in the language
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    // Literals
    Identifier(String),
    Constant(Constant),
    StringLiteral(String),
    TypeSpec(BaseType),
    Operator(String),
    PointerMarker(usize), // Pointer order: 1 = *, 2 = **, ...

    // Expressions
    Unary {
        op: UnaryOp,
        operand: NodeId,
        postfix: bool,
    },
    Binary {
        op: NodeId, // An Operator node
        left: NodeId,
        right: NodeId,
    },
    Assignment {
        target: NodeId,
        value: NodeId,
    },
    ArrayReference {
        base: NodeId,
        index: NodeId,
    },
    TypeCast {
        specifiers: NodeId,
        pointer: Option<NodeId>,
        expr: NodeId,
    },
    FunctionCall {
        callee: NodeId,
        args: NodeId, // An ArgumentList node
    },
    ArgumentList(Vec<NodeId>),
    ExpressionList(Vec<NodeId>), // Comma expression

    // Declarations
    Declaration {
        specifiers: NodeId,
        declarators: Option<NodeId>, // An InitDeclaratorList node
    },
    DeclSpecifiers(Vec<NodeId>),
    Declarator {
        pointer: Option<NodeId>,
        name: String,
    },
    ArrayDeclarator {
        of: NodeId,
        bound: Option<NodeId>,
    },
    FunctionDeclarator {
        of: NodeId,
        params: Option<NodeId>, // A ParameterList node
    },
    InitDeclaratorList(Vec<NodeId>),
    InitDeclarator {
        declarator: NodeId,
        initializer: Option<NodeId>,
    },
    InitializerList(Vec<NodeId>),
    ParameterDeclaration {
        specifiers: NodeId,
        declarator: Option<NodeId>,
    },
    ParameterList(Vec<NodeId>),

    // Statements
    Compound(Vec<NodeId>),
    Selection {
        condition: NodeId,
        then_branch: NodeId,
        else_branch: Option<NodeId>,
    },
    ExpressionStatement(Option<NodeId>),
    Iteration {
        kind: IterationKind,
        init: Option<NodeId>,
        condition: Option<NodeId>,
        update: Option<NodeId>,
        body: NodeId,
    },
    Jump {
        kind: JumpKind,
        expr: Option<NodeId>,
    },

    // Top level
    TranslationUnit(Vec<NodeId>),
    FunctionDefinition {
        specifiers: NodeId,
        declarator: NodeId,
        body: NodeId,
    },
}

/// One node of the tree
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
}

impl Node {
    /// Child node ids in grammar order
    pub fn children(&self) -> Vec<NodeId> {
        match &self.kind {
            NodeKind::Identifier(_)
            | NodeKind::Constant(_)
            | NodeKind::StringLiteral(_)
            | NodeKind::TypeSpec(_)
            | NodeKind::Operator(_)
            | NodeKind::PointerMarker(_) => Vec::new(),
            NodeKind::Unary { operand, .. } => vec![*operand],
            NodeKind::Binary { op, left, right } => vec![*op, *left, *right],
            NodeKind::Assignment { target, value } => vec![*target, *value],
            NodeKind::ArrayReference { base, index } => vec![*base, *index],
            NodeKind::TypeCast {
                specifiers,
                pointer,
                expr,
            } => std::iter::once(*specifiers)
                .chain(*pointer)
                .chain(std::iter::once(*expr))
                .collect(),
            NodeKind::FunctionCall { callee, args } => vec![*callee, *args],
            NodeKind::ArgumentList(items)
            | NodeKind::ExpressionList(items)
            | NodeKind::DeclSpecifiers(items)
            | NodeKind::InitDeclaratorList(items)
            | NodeKind::InitializerList(items)
            | NodeKind::ParameterList(items)
            | NodeKind::Compound(items)
            | NodeKind::TranslationUnit(items) => items.clone(),
            NodeKind::Declaration {
                specifiers,
                declarators,
            } => std::iter::once(*specifiers).chain(*declarators).collect(),
            NodeKind::Declarator { pointer, .. } => pointer.iter().copied().collect(),
            NodeKind::ArrayDeclarator { of, bound } => {
                std::iter::once(*of).chain(*bound).collect()
            }
            NodeKind::FunctionDeclarator { of, params } => {
                std::iter::once(*of).chain(*params).collect()
            }
            NodeKind::InitDeclarator {
                declarator,
                initializer,
            } => std::iter::once(*declarator).chain(*initializer).collect(),
            NodeKind::ParameterDeclaration {
                specifiers,
                declarator,
            } => std::iter::once(*specifiers).chain(*declarator).collect(),
            NodeKind::Selection {
                condition,
                then_branch,
                else_branch,
            } => [*condition, *then_branch]
                .into_iter()
                .chain(*else_branch)
                .collect(),
            NodeKind::ExpressionStatement(expr) => expr.iter().copied().collect(),
            NodeKind::Iteration {
                init,
                condition,
                update,
                body,
                ..
            } => init
                .iter()
                .chain(condition)
                .chain(update)
                .copied()
                .chain(std::iter::once(*body))
                .collect(),
            NodeKind::Jump { expr, .. } => expr.iter().copied().collect(),
            NodeKind::FunctionDefinition {
                specifiers,
                declarator,
                body,
            } => vec![*specifiers, *declarator, *body],
        }
    }

    /// Statements gate on the current line before doing any work
    pub fn is_statement(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::Compound(_)
                | NodeKind::Selection { .. }
                | NodeKind::ExpressionStatement(_)
                | NodeKind::Iteration { .. }
                | NodeKind::Jump { .. }
                | NodeKind::Declaration { .. }
        )
    }

    /// Short label used in logs and tree dumps
    pub fn label(&self) -> String {
        match &self.kind {
            NodeKind::Identifier(name) => format!("Identifier({})", name),
            NodeKind::Constant(Constant::Int(n)) => format!("Constant({})", n),
            NodeKind::Constant(Constant::Float(x)) => format!("Constant({:?})", x),
            NodeKind::StringLiteral(s) => format!("String({:?})", s),
            NodeKind::TypeSpec(base) => format!("Type({})", base),
            NodeKind::Operator(op) => format!("Operator({})", op),
            NodeKind::PointerMarker(n) => format!("Pointer({})", n),
            NodeKind::Unary { op, postfix, .. } => {
                let fix = if *postfix { "postfix" } else { "prefix" };
                format!("Unary({:?}, {})", op, fix)
            }
            NodeKind::Binary { .. } => "BinaryOp".to_string(),
            NodeKind::Assignment { .. } => "Assignment".to_string(),
            NodeKind::ArrayReference { .. } => "ArrayReference".to_string(),
            NodeKind::TypeCast { .. } => "TypeCast".to_string(),
            NodeKind::FunctionCall { .. } => "FunctionCall".to_string(),
            NodeKind::ArgumentList(_) => "ArgumentList".to_string(),
            NodeKind::ExpressionList(_) => "ExpressionList".to_string(),
            NodeKind::Declaration { .. } => "Declaration".to_string(),
            NodeKind::DeclSpecifiers(_) => "DeclSpecifiers".to_string(),
            NodeKind::Declarator { name, .. } => format!("Declarator({})", name),
            NodeKind::ArrayDeclarator { .. } => "ArrayDeclarator".to_string(),
            NodeKind::FunctionDeclarator { .. } => "FunctionDeclarator".to_string(),
            NodeKind::InitDeclaratorList(_) => "InitDeclaratorList".to_string(),
            NodeKind::InitDeclarator { .. } => "InitDeclarator".to_string(),
            NodeKind::InitializerList(_) => "InitializerList".to_string(),
            NodeKind::ParameterDeclaration { .. } => "ParameterDeclaration".to_string(),
            NodeKind::ParameterList(_) => "ParameterList".to_string(),
            NodeKind::Compound(_) => "Compound".to_string(),
            NodeKind::Selection { .. } => "Selection".to_string(),
            NodeKind::ExpressionStatement(_) => "ExpressionStatement".to_string(),
            NodeKind::Iteration { kind, .. } => format!("Iteration({:?})", kind),
            NodeKind::Jump { kind, .. } => format!("Jump({:?})", kind),
            NodeKind::TranslationUnit(_) => "TranslationUnit".to_string(),
            NodeKind::FunctionDefinition { .. } => "FunctionDefinition".to_string(),
        }
    }
}

/// A parsed program: the node arena plus the global function table
#[derive(Debug, Clone)]
pub struct Program {
    pub nodes: Vec<Node>,
    pub root: NodeId,
    /// Function name -> FunctionDefinition node
    pub functions: FxHashMap<String, NodeId>,
    /// Synthetic `main()` call used to start execution
    pub entry: NodeId,
    pub line_count: usize,
}

impl Program {
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn span(&self, id: NodeId) -> Span {
        self.nodes[id].span
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.nodes[id].children()
    }

    /// Name bound by a declarator chain, if any
    pub fn declarator_name(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Declarator { name, .. } => Some(name),
            NodeKind::ArrayDeclarator { of, .. } | NodeKind::FunctionDeclarator { of, .. } => {
                self.declarator_name(*of)
            }
            _ => None,
        }
    }

    /// Indented tree listing, one node per line
    pub fn dump(&self) -> String {
        let mut out = String::new();
        self.dump_node(self.root, 0, &mut out);
        out
    }

    fn dump_node(&self, id: NodeId, depth: usize, out: &mut String) {
        let node = self.node(id);
        let _ = writeln!(
            out,
            "{:indent$}{} [{}:{}-{}:{}]",
            "",
            node.label(),
            node.span.start.line,
            node.span.start.column,
            node.span.end.line,
            node.span.end.column,
            indent = depth * 2
        );
        for child in node.children() {
            self.dump_node(child, depth + 1, out);
        }
    }
}
