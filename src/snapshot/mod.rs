// Read-only views of interpreter state

use crate::interpreter::environment::Environment;
use crate::memory::scope::{Scope, ScopeKind, Symbol};
use crate::memory::value::{TypeDescriptor, Value};
use crate::memory::Address;

/// One symbol as shown to the user
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolView {
    pub name: String,
    pub ty: TypeDescriptor,
    pub address: Address,
    pub value: Option<Value>,
    pub is_function: bool,
    pub writes: usize,
}

impl SymbolView {
    fn of(symbol: &Symbol) -> Self {
        SymbolView {
            name: symbol.name.clone(),
            ty: symbol.ty,
            address: symbol.address,
            value: symbol.value.clone(),
            is_function: symbol.is_function(),
            writes: symbol.history.len(),
        }
    }

    /// `value`, `<uninitialized>` or `<function>`
    pub fn display_value(&self) -> String {
        match (&self.value, self.is_function) {
            (_, true) => "<function>".to_string(),
            (Some(value), false) => value.to_string(),
            (None, false) => "<uninitialized>".to_string(),
        }
    }
}

/// One scope and its symbols in declaration order
#[derive(Debug, Clone, PartialEq)]
pub struct ScopeView {
    pub label: String,
    pub kind: ScopeKind,
    pub symbols: Vec<SymbolView>,
}

impl ScopeView {
    pub fn of(scope: &Scope) -> Self {
        ScopeView {
            label: scope.label.clone(),
            kind: scope.kind,
            symbols: scope.symbols().map(SymbolView::of).collect(),
        }
    }
}

/// State of the environment at one moment
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub line: usize,
    /// Current scope first, root last
    pub scopes: Vec<ScopeView>,
    /// Innermost call last
    pub calls: Vec<String>,
    pub control_depth: usize,
    pub value_depth: usize,
    pub pending_updates: usize,
}

impl Snapshot {
    pub fn capture(env: &Environment) -> Self {
        Snapshot {
            line: env.line,
            scopes: scope_chain(env),
            calls: env.calls.iter().map(|call| call.function.clone()).collect(),
            control_depth: env.control.len(),
            value_depth: env.values.len(),
            pending_updates: env.booked.len(),
        }
    }

    /// Look a name up the captured chain
    pub fn find(&self, name: &str) -> Option<&SymbolView> {
        self.scopes
            .iter()
            .find_map(|scope| scope.symbols.iter().find(|s| s.name == name))
    }
}

/// Views of the scopes from the current one up to the root
pub fn scope_chain(env: &Environment) -> Vec<ScopeView> {
    env.scopes
        .chain(env.scope)
        .into_iter()
        .filter_map(|id| env.scopes.get(id))
        .map(ScopeView::of)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::scope::ROOT_SCOPE;

    #[test]
    fn test_capture_lists_current_scope_first() {
        let mut env = Environment::new();
        let mut x = Symbol::variable("x".to_string(), 4, TypeDescriptor::int());
        x.set_value(Value::int(1), 1);
        env.scopes.get_mut(ROOT_SCOPE).unwrap().declare(x).unwrap();
        let inner = env.scopes.open(Scope::new(
            ScopeKind::Block,
            "block".to_string(),
            Some(ROOT_SCOPE),
        ));
        env.scope = inner;

        let snapshot = Snapshot::capture(&env);
        assert_eq!(snapshot.scopes.len(), 2);
        assert_eq!(snapshot.scopes[0].label, "block");
        assert_eq!(snapshot.scopes[1].label, "global");
        assert_eq!(snapshot.find("x").unwrap().display_value(), "1");
        assert!(snapshot.find("y").is_none());
    }
}
