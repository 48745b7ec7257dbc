//! Scopes and symbols
//!
//! This module provides the lookup environments used by the interpreter:
//! - [`Symbol`]: a named binding with its current value and full history
//! - [`Scope`]: a symbol table chained to a parent scope
//! - [`ScopeArena`]: owner of every live scope, addressed by [`ScopeId`]
//!
//! # Ownership
//!
//! Scopes never own each other. Parent and return links are plain indices into
//! the arena, and scope lifetimes nest strictly, so releasing a scope simply
//! truncates the arena back to it.
//!
//! # History
//!
//! Every write that gives a symbol a value appends one [`HistoryEntry`]. The log
//! is append-only; its last entry always equals the current value.

use super::value::{TypeDescriptor, Value};
use super::Address;
use crate::parser::ast::NodeId;
use rustc_hash::FxHashMap;

/// Index of a scope inside the [`ScopeArena`]
pub type ScopeId = usize;

/// The global scope is always the first arena slot
pub const ROOT_SCOPE: ScopeId = 0;

/// One recorded write to a symbol
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub value: Value,
    pub line: usize,
}

/// A declared function parameter
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: Option<String>,
    pub ty: TypeDescriptor,
}

/// Signature and body of a registered function
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionInfo {
    pub definition: NodeId,
    pub body: NodeId,
    pub return_type: TypeDescriptor,
    pub params: Vec<Param>,
}

impl FunctionInfo {
    /// Parameters that take an argument. A lone unnamed `void` means none.
    pub fn arity(&self) -> usize {
        match self.params.as_slice() {
            [only] if only.ty.is_void() => 0,
            params => params.len(),
        }
    }
}

/// A named binding
#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub address: Address,
    pub ty: TypeDescriptor,
    pub value: Option<Value>,
    pub history: Vec<HistoryEntry>,
    pub function: Option<FunctionInfo>,
}

impl Symbol {
    pub fn variable(name: String, address: Address, ty: TypeDescriptor) -> Self {
        Symbol {
            name,
            address,
            ty,
            value: None,
            history: Vec::new(),
            function: None,
        }
    }

    pub fn function(name: String, address: Address, info: FunctionInfo) -> Self {
        Symbol {
            name,
            address,
            ty: TypeDescriptor::new(super::value::BaseType::Function),
            value: None,
            history: Vec::new(),
            function: Some(info),
        }
    }

    /// Replace the current value and record the write
    pub fn set_value(&mut self, value: Value, line: usize) {
        self.history.push(HistoryEntry {
            value: value.clone(),
            line,
        });
        self.value = Some(value);
    }

    pub fn is_function(&self) -> bool {
        self.function.is_some()
    }
}

/// What opened a scope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Global,
    Function,
    Block,
    Selection,
    Loop,
}

/// Where control goes back to when a scope is left
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnLinkage {
    pub return_scope: ScopeId,
    pub return_line: usize,
    pub return_type: Option<TypeDescriptor>,
    pub return_value: Option<Value>,
}

/// A lookup environment chained to its parent
#[derive(Debug, Clone)]
pub struct Scope {
    pub kind: ScopeKind,
    pub label: String,
    pub parent: Option<ScopeId>,
    pub linkage: Option<ReturnLinkage>,
    symbols: FxHashMap<String, Symbol>,
    insertion_order: Vec<String>, // Declaration order, for display
}

impl Scope {
    pub fn new(kind: ScopeKind, label: String, parent: Option<ScopeId>) -> Self {
        Scope {
            kind,
            label,
            parent,
            linkage: None,
            symbols: FxHashMap::default(),
            insertion_order: Vec::new(),
        }
    }

    pub fn with_linkage(mut self, linkage: ReturnLinkage) -> Self {
        self.linkage = Some(linkage);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.symbols.contains_key(name)
    }

    /// Bind a new symbol. Returns it back if the name is already taken here.
    pub fn declare(&mut self, symbol: Symbol) -> Result<(), Symbol> {
        if self.symbols.contains_key(&symbol.name) {
            return Err(symbol);
        }
        self.insertion_order.push(symbol.name.clone());
        self.symbols.insert(symbol.name.clone(), symbol);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Symbol> {
        self.symbols.get_mut(name)
    }

    /// Symbols in declaration order
    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.insertion_order
            .iter()
            .filter_map(|name| self.symbols.get(name))
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// Owner of every live scope
#[derive(Debug, Clone)]
pub struct ScopeArena {
    scopes: Vec<Scope>,
}

impl ScopeArena {
    pub fn new() -> Self {
        ScopeArena {
            scopes: vec![Scope::new(ScopeKind::Global, "global".to_string(), None)],
        }
    }

    /// Push a scope and return its id
    pub fn open(&mut self, scope: Scope) -> ScopeId {
        self.scopes.push(scope);
        self.scopes.len() - 1
    }

    /// Drop `id` and every scope opened after it. The root is never released.
    pub fn release(&mut self, id: ScopeId) {
        if id > ROOT_SCOPE && id < self.scopes.len() {
            self.scopes.truncate(id);
        }
    }

    pub fn is_live(&self, id: ScopeId) -> bool {
        id < self.scopes.len()
    }

    pub fn get(&self, id: ScopeId) -> Option<&Scope> {
        self.scopes.get(id)
    }

    pub fn get_mut(&mut self, id: ScopeId) -> Option<&mut Scope> {
        self.scopes.get_mut(id)
    }

    pub fn root(&self) -> &Scope {
        &self.scopes[ROOT_SCOPE]
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Scope ids from `from` up to the root
    pub fn chain(&self, from: ScopeId) -> Vec<ScopeId> {
        let mut ids = Vec::new();
        let mut current = Some(from);
        while let Some(id) = current {
            let Some(scope) = self.scopes.get(id) else {
                break;
            };
            ids.push(id);
            current = scope.parent;
        }
        ids
    }

    /// Find the nearest scope on the chain from `from` that binds `name`
    pub fn resolve(&self, from: ScopeId, name: &str) -> Option<ScopeId> {
        self.chain(from)
            .into_iter()
            .find(|&id| self.scopes[id].contains(name))
    }

    pub fn lookup(&self, from: ScopeId, name: &str) -> Option<&Symbol> {
        let id = self.resolve(from, name)?;
        self.scopes[id].get(name)
    }

}

impl Default for ScopeArena {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int_var(name: &str, address: Address) -> Symbol {
        Symbol::variable(name.to_string(), address, TypeDescriptor::int())
    }

    #[test]
    fn test_duplicate_declaration_rejected() {
        let mut scope = Scope::new(ScopeKind::Block, "block".to_string(), None);
        assert!(scope.declare(int_var("x", 4)).is_ok());
        assert!(scope.declare(int_var("x", 8)).is_err());
        assert_eq!(scope.len(), 1);
    }

    #[test]
    fn test_shadowing_only_inside_nested_scope() {
        let mut arena = ScopeArena::new();
        arena
            .get_mut(ROOT_SCOPE)
            .unwrap()
            .declare(int_var("x", 4))
            .unwrap();
        let inner = arena.open(Scope::new(
            ScopeKind::Block,
            "block".to_string(),
            Some(ROOT_SCOPE),
        ));
        arena.get_mut(inner).unwrap().declare(int_var("x", 8)).unwrap();

        assert_eq!(arena.lookup(inner, "x").unwrap().address, 8);
        assert_eq!(arena.lookup(ROOT_SCOPE, "x").unwrap().address, 4);

        arena.release(inner);
        assert!(!arena.is_live(inner));
        assert_eq!(arena.lookup(ROOT_SCOPE, "x").unwrap().address, 4);
    }

    #[test]
    fn test_history_tracks_current_value() {
        let mut sym = int_var("x", 4);
        sym.set_value(Value::int(5), 2);
        sym.set_value(Value::int(6), 3);
        assert_eq!(sym.history.len(), 2);
        assert_eq!(sym.history.last().unwrap().value, *sym.value.as_ref().unwrap());
        assert_eq!(sym.history[0].line, 2);
    }

    #[test]
    fn test_void_parameter_means_zero_arity() {
        let info = FunctionInfo {
            definition: 0,
            body: 1,
            return_type: TypeDescriptor::int(),
            params: vec![Param {
                name: None,
                ty: TypeDescriptor::new(crate::memory::value::BaseType::Void),
            }],
        };
        assert_eq!(info.arity(), 0);
    }

    #[test]
    fn test_chain_reaches_root() {
        let mut arena = ScopeArena::new();
        let f = arena.open(Scope::new(
            ScopeKind::Function,
            "f".to_string(),
            Some(ROOT_SCOPE),
        ));
        let b = arena.open(Scope::new(ScopeKind::Block, "block".to_string(), Some(f)));
        assert_eq!(arena.chain(b), vec![b, f, ROOT_SCOPE]);
    }
}
