//! Execution environment
//!
//! The [`Environment`] holds everything the interpreter mutates while a program
//! runs: the control stack of [`Frame`]s, the value stack of [`Operand`]s, the
//! call stack, the deferred-update queue, the line cursor and the scope arena.
//!
//! Node handlers (in `engine`, `expressions`, `declarations` and `statements`)
//! are `impl Environment` blocks; this file only keeps stack discipline and
//! bookkeeping.

use crate::interpreter::constants::STACK_ADDRESS_START;
use crate::interpreter::errors::RuntimeError;
use crate::interpreter::frame::{Frame, Operand, Place, Progress};
use crate::memory::scope::{Scope, ScopeArena, ScopeId, Symbol, ROOT_SCOPE};
use crate::memory::value::{TypeDescriptor, Value};
use crate::memory::{sizeof_type, Address};
use crate::parser::ast::{NodeId, SourceLocation};
use tracing::trace;

/// One active function call
#[derive(Debug, Clone, PartialEq)]
pub struct Activation {
    pub function: String,
    pub scope: ScopeId,
    pub call_line: usize,
    /// The synthetic call of `main` that starts the program
    pub entry: bool,
}

/// A postfix write waiting for the next sequence point
#[derive(Debug, Clone, PartialEq)]
pub struct BookedUpdate {
    pub scope: ScopeId,
    pub place: Place,
    pub value: Value,
    pub line: usize,
}

/// One executed node, as shown by the `log` command
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub line: usize,
    pub node: String,
    pub control_depth: usize,
    pub value_depth: usize,
}

/// Interpreter state
#[derive(Debug, Clone)]
pub struct Environment {
    pub control: Vec<Frame>,
    pub values: Vec<Operand>,
    pub calls: Vec<Activation>,
    pub booked: Vec<BookedUpdate>,
    /// Line cursor; statements starting after it are gated
    pub line: usize,
    /// Scope new names bind into and lookups start from
    pub scope: ScopeId,
    pub scopes: ScopeArena,
    pub log: Vec<LogEntry>,
    next_address: Address,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            control: Vec::new(),
            values: Vec::new(),
            calls: Vec::new(),
            booked: Vec::new(),
            line: 1,
            scope: ROOT_SCOPE,
            scopes: ScopeArena::new(),
            log: Vec::new(),
            next_address: STACK_ADDRESS_START,
        }
    }

    // ===== Control stack =====

    pub fn push_frame(&mut self, frame: Frame) {
        self.control.push(frame);
    }

    pub fn push_node(&mut self, node: NodeId) {
        self.control.push(Frame::new(node));
    }

    pub fn pop_frame(&mut self, location: SourceLocation) -> Result<Frame, RuntimeError> {
        self.control
            .pop()
            .ok_or_else(|| RuntimeError::internal("control stack underflow", location))
    }

    pub fn top_frame_mut(&mut self, location: SourceLocation) -> Result<&mut Frame, RuntimeError> {
        self.control
            .last_mut()
            .ok_or_else(|| RuntimeError::internal("control stack is empty", location))
    }

    /// Mark the top frame entered and schedule `children` so the first one runs first
    pub fn enter(&mut self, children: &[NodeId], location: SourceLocation) -> Result<Progress, RuntimeError> {
        self.top_frame_mut(location)?.entered = true;
        for &child in children.iter().rev() {
            self.push_node(child);
        }
        Ok(Progress::Continue)
    }

    /// Pop the finished frame and publish its result
    pub fn complete(&mut self, result: Operand, location: SourceLocation) -> Result<Progress, RuntimeError> {
        self.pop_frame(location)?;
        self.values.push(result);
        Ok(Progress::Done)
    }

    // ===== Value stack =====

    pub fn push_value(&mut self, operand: Operand) {
        self.values.push(operand);
    }

    pub fn pop_value(&mut self, location: SourceLocation) -> Result<Operand, RuntimeError> {
        self.values
            .pop()
            .ok_or_else(|| RuntimeError::internal("value stack underflow", location))
    }

    /// Pop the results of `count` children, in the order they were pushed
    pub fn pop_values(&mut self, count: usize, location: SourceLocation) -> Result<Vec<Operand>, RuntimeError> {
        if self.values.len() < count {
            return Err(RuntimeError::internal("value stack underflow", location));
        }
        Ok(self.values.split_off(self.values.len() - count))
    }

    pub fn pop_type(&mut self, location: SourceLocation) -> Result<TypeDescriptor, RuntimeError> {
        match self.pop_value(location)? {
            Operand::Type(ty) => Ok(ty),
            other => Err(RuntimeError::internal(
                format!("expected a type, found {}", other.describe()),
                location,
            )),
        }
    }

    // ===== Scopes =====

    pub fn open_scope(&mut self, scope: Scope) -> ScopeId {
        self.scopes.open(scope)
    }

    /// Release `id` and every scope opened after it, dropping their queued writes
    pub fn release_scope(&mut self, id: ScopeId) {
        self.scopes.release(id);
        self.booked.retain(|update| update.scope < id);
    }

    pub fn parent_of(&self, id: ScopeId) -> ScopeId {
        self.scopes
            .get(id)
            .and_then(|scope| scope.parent)
            .unwrap_or(ROOT_SCOPE)
    }

    /// Hand out the next virtual address
    pub fn allocate(&mut self, ty: &TypeDescriptor, len: Option<usize>) -> Address {
        let address = self.next_address;
        self.next_address = self.next_address.saturating_add(sizeof_type(ty, len));
        address
    }

    /// Bind a new symbol in `scope`
    pub fn declare_in(
        &mut self,
        scope: ScopeId,
        symbol: Symbol,
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        let target = self
            .scopes
            .get_mut(scope)
            .ok_or_else(|| RuntimeError::internal("declaration into a released scope", location))?;
        target
            .declare(symbol)
            .map_err(|symbol| RuntimeError::DuplicateSymbol {
                name: symbol.name,
                location,
            })
    }

    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.scopes.lookup(self.scope, name)
    }

    // ===== Reads and writes =====

    /// Turn an operand into the value it denotes
    pub fn resolve(&self, operand: &Operand, location: SourceLocation) -> Result<Value, RuntimeError> {
        match operand {
            Operand::Value(value) => Ok(value.clone()),
            Operand::Element { value, .. } => Ok(value.clone()),
            Operand::Symbol(name) => self.read_symbol(name, location),
            other => Err(RuntimeError::TypeError {
                expected: "value".to_string(),
                got: other.describe(),
                location,
            }),
        }
    }

    pub fn read_symbol(&self, name: &str, location: SourceLocation) -> Result<Value, RuntimeError> {
        let symbol = self.lookup(name).ok_or_else(|| RuntimeError::UndefinedSymbol {
            name: name.to_string(),
            location,
        })?;
        if symbol.is_function() {
            return Err(RuntimeError::TypeError {
                expected: "value".to_string(),
                got: format!("function '{}'", name),
                location,
            });
        }
        symbol
            .value
            .clone()
            .ok_or_else(|| RuntimeError::UninitializedRead {
                name: name.to_string(),
                location,
            })
    }

    /// Write through the current scope chain
    pub fn write(
        &mut self,
        place: &Place,
        value: Value,
        line: usize,
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        let scope = self.owning_scope(place, location)?;
        self.write_in(scope, place, value, line, location)
    }

    /// Write into the symbol bound in `scope`, casting to its declared type and
    /// recording one history entry at `line`
    pub fn write_in(
        &mut self,
        scope: ScopeId,
        place: &Place,
        value: Value,
        line: usize,
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        let name = place.name();
        let symbol = self
            .scopes
            .get_mut(scope)
            .and_then(|s| s.get_mut(name))
            .ok_or_else(|| RuntimeError::UndefinedSymbol {
                name: name.to_string(),
                location,
            })?;

        if symbol.is_function() {
            return Err(RuntimeError::TypeError {
                expected: "assignable variable".to_string(),
                got: format!("function '{}'", name),
                location,
            });
        }

        match place {
            Place::Variable(_) => {
                let cast = value.cast_to(&symbol.ty).ok_or_else(|| RuntimeError::TypeMismatch {
                    left: symbol.ty.to_string(),
                    right: value.ty.to_string(),
                    location,
                })?;
                symbol.set_value(cast, line);
            }
            Place::Element { index, .. } => {
                let element_ty = symbol.ty.element();
                let cast = value.cast_to(&element_ty).ok_or_else(|| RuntimeError::TypeMismatch {
                    left: element_ty.to_string(),
                    right: value.ty.to_string(),
                    location,
                })?;
                let mut array = symbol.value.clone().ok_or_else(|| RuntimeError::UninitializedRead {
                    name: name.to_string(),
                    location,
                })?;
                let elements = array.elements_mut().ok_or_else(|| RuntimeError::TypeError {
                    expected: "array".to_string(),
                    got: symbol.ty.to_string(),
                    location,
                })?;
                let length = elements.len();
                let slot = elements
                    .get_mut(*index)
                    .ok_or_else(|| RuntimeError::IndexOutOfRange {
                        name: name.to_string(),
                        index: *index as i64,
                        length,
                        location,
                    })?;
                *slot = cast;
                symbol.set_value(array, line);
            }
        }
        Ok(())
    }

    fn owning_scope(&self, place: &Place, location: SourceLocation) -> Result<ScopeId, RuntimeError> {
        self.scopes
            .resolve(self.scope, place.name())
            .ok_or_else(|| RuntimeError::UndefinedSymbol {
                name: place.name().to_string(),
                location,
            })
    }

    // ===== Deferred updates =====

    /// Queue a postfix write for the next sequence point
    pub fn book_update(
        &mut self,
        place: Place,
        value: Value,
        line: usize,
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        let scope = self.owning_scope(&place, location)?;
        self.booked.push(BookedUpdate {
            scope,
            place,
            value,
            line,
        });
        Ok(())
    }

    /// Apply queued writes in booking order
    pub fn flush_booked_updates(&mut self) -> Result<(), RuntimeError> {
        for update in std::mem::take(&mut self.booked) {
            if !self.scopes.is_live(update.scope) {
                continue;
            }
            trace!(place = update.place.name(), value = %update.value, "booked update");
            let location = SourceLocation::new(update.line, 0);
            self.write_in(update.scope, &update.place, update.value, update.line, location)?;
        }
        Ok(())
    }

    // ===== Execution log =====

    pub fn record(&mut self, node: String) {
        self.log.push(LogEntry {
            line: self.line,
            node,
            control_depth: self.control.len(),
            value_depth: self.values.len(),
        });
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::scope::ScopeKind;

    fn loc() -> SourceLocation {
        SourceLocation::new(1, 1)
    }

    fn env_with_int(name: &str, value: i64) -> Environment {
        let mut env = Environment::new();
        let ty = TypeDescriptor::int();
        let address = env.allocate(&ty, None);
        let mut symbol = Symbol::variable(name.to_string(), address, ty);
        symbol.set_value(Value::int(value), 1);
        env.declare_in(ROOT_SCOPE, symbol, loc()).unwrap();
        env
    }

    #[test]
    fn test_value_stack_underflow_is_internal_error() {
        let mut env = Environment::new();
        assert!(matches!(
            env.pop_value(loc()),
            Err(RuntimeError::Internal { .. })
        ));
    }

    #[test]
    fn test_pop_values_preserves_push_order() {
        let mut env = Environment::new();
        env.push_value(Operand::Value(Value::int(1)));
        env.push_value(Operand::Value(Value::int(2)));
        let values = env.pop_values(2, loc()).unwrap();
        assert_eq!(values[0], Operand::Value(Value::int(1)));
        assert_eq!(values[1], Operand::Value(Value::int(2)));
    }

    #[test]
    fn test_booked_update_applies_on_flush() {
        let mut env = env_with_int("x", 5);
        env.book_update(Place::Variable("x".to_string()), Value::int(6), 3, loc())
            .unwrap();
        assert_eq!(env.lookup("x").unwrap().value, Some(Value::int(5)));

        env.flush_booked_updates().unwrap();
        let x = env.lookup("x").unwrap();
        assert_eq!(x.value, Some(Value::int(6)));
        assert_eq!(x.history.last().unwrap().line, 3);
        assert!(env.booked.is_empty());
    }

    #[test]
    fn test_released_scope_drops_booked_updates() {
        let mut env = Environment::new();
        let inner = env.open_scope(Scope::new(
            ScopeKind::Block,
            "block".to_string(),
            Some(ROOT_SCOPE),
        ));
        env.scope = inner;
        let ty = TypeDescriptor::int();
        let mut symbol = Symbol::variable("i".to_string(), 4, ty);
        symbol.set_value(Value::int(0), 1);
        env.declare_in(inner, symbol, loc()).unwrap();
        env.book_update(Place::Variable("i".to_string()), Value::int(1), 1, loc())
            .unwrap();

        env.scope = ROOT_SCOPE;
        env.release_scope(inner);
        assert!(env.booked.is_empty());
        assert!(env.flush_booked_updates().is_ok());
    }

    #[test]
    fn test_write_casts_to_declared_type() {
        let mut env = env_with_int("x", 0);
        env.write(&Place::Variable("x".to_string()), Value::float(2.7), 2, loc())
            .unwrap();
        assert_eq!(env.lookup("x").unwrap().value, Some(Value::int(2)));
    }

    #[test]
    fn test_uninitialized_read() {
        let mut env = Environment::new();
        let symbol = Symbol::variable("y".to_string(), 4, TypeDescriptor::int());
        env.declare_in(ROOT_SCOPE, symbol, loc()).unwrap();
        assert!(matches!(
            env.read_symbol("y", loc()),
            Err(RuntimeError::UninitializedRead { .. })
        ));
    }

    #[test]
    fn test_addresses_advance_by_size() {
        let mut env = Environment::new();
        let first = env.allocate(&TypeDescriptor::int(), None);
        let second = env.allocate(&TypeDescriptor::float(), None);
        let third = env.allocate(&TypeDescriptor::int(), None);
        assert_eq!(first, STACK_ADDRESS_START);
        assert_eq!(second, first + 4);
        assert_eq!(third, second + 8);
    }
}
