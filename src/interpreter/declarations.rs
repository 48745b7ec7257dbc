//! Declaration execution implementation
//!
//! A declaration evaluates its specifiers to a base type, then hands that type
//! to its init-declarator list. The list evaluates and binds one
//! init-declarator at a time, so an initializer can read names declared
//! earlier in the same declaration.
//!
//! Declarators evaluate to a [`DeclaratorShape`] (name, pointer order, array
//! bound, parameter list); binding applies the shape to the base type.
//! Function declarators outside a definition are prototypes and bind nothing.

use crate::interpreter::constants::MAX_ARRAY_LENGTH;
use crate::interpreter::environment::Environment;
use crate::interpreter::errors::RuntimeError;
use crate::interpreter::frame::{DeclaratorShape, Frame, Init, Operand, Phase, Progress};
use crate::memory::scope::{FunctionInfo, Param, Symbol, ROOT_SCOPE};
use crate::memory::value::{BaseType, Data, TypeDescriptor, Value};
use crate::parser::ast::*;

impl Environment {
    pub(crate) fn exec_declaration(
        &mut self,
        frame: &Frame,
        specifiers: NodeId,
        declarators: Option<NodeId>,
        location: SourceLocation,
    ) -> Result<Progress, RuntimeError> {
        if !frame.entered {
            return self.enter(&[specifiers], location);
        }

        match frame.phase {
            Phase::Fresh => {
                let ty = self.pop_type(location)?;
                let Some(list) = declarators else {
                    return self.complete(Operand::Null, location);
                };
                self.push_value(Operand::Type(ty));
                self.set_phase(Phase::Binding, location)?;
                self.push_node(list);
                Ok(Progress::Continue)
            }
            Phase::Binding => {
                self.pop_value(location)?;
                self.complete(Operand::Null, location)
            }
            _ => Err(RuntimeError::internal("declaration in a foreign phase", location)),
        }
    }

    pub(crate) fn exec_decl_specifiers(
        &mut self,
        frame: &Frame,
        items: &[NodeId],
        location: SourceLocation,
    ) -> Result<Progress, RuntimeError> {
        if !frame.entered {
            return self.enter(items, location);
        }

        let operands = self.pop_values(items.len(), location)?;
        match operands.first() {
            Some(Operand::Type(ty)) => self.complete(Operand::Type(*ty), location),
            Some(other) => Err(other.unexpected("type", location)),
            None => Err(RuntimeError::internal("empty specifier list", location)),
        }
    }

    pub(crate) fn exec_declarator(
        &mut self,
        frame: &Frame,
        pointer: Option<NodeId>,
        name: &str,
        location: SourceLocation,
    ) -> Result<Progress, RuntimeError> {
        if let (Some(marker), false) = (pointer, frame.entered) {
            return self.enter(&[marker], location);
        }

        let pointer = match pointer {
            Some(_) => match self.pop_value(location)? {
                Operand::Pointer(order) => order,
                other => return Err(other.unexpected("pointer marker", location)),
            },
            None => 0,
        };

        let shape = DeclaratorShape {
            name: name.to_string(),
            pointer,
            ..DeclaratorShape::default()
        };
        self.complete(Operand::Declarator(shape), location)
    }

    pub(crate) fn exec_array_declarator(
        &mut self,
        frame: &Frame,
        of: NodeId,
        bound: Option<NodeId>,
        location: SourceLocation,
    ) -> Result<Progress, RuntimeError> {
        let children: Vec<NodeId> = std::iter::once(of).chain(bound).collect();
        if !frame.entered {
            return self.enter(&children, location);
        }

        let operands = self.pop_values(children.len(), location)?;
        let mut shape = expect_declarator(&operands[0], location)?;
        if shape.array.is_some() {
            return Err(RuntimeError::TypeError {
                expected: "one-dimensional array".to_string(),
                got: format!("nested array '{}'", shape.name),
                location,
            });
        }

        let length = match operands.get(1) {
            Some(operand) => {
                let value = self.resolve(operand, location)?;
                match value.data {
                    Data::Int(n) if value.ty.is_arithmetic() && n >= 0 => Some(n as usize),
                    _ => {
                        return Err(RuntimeError::TypeError {
                            expected: "non-negative int array bound".to_string(),
                            got: value.to_string(),
                            location,
                        })
                    }
                }
            }
            None => None,
        };
        shape.array = Some(length);
        self.complete(Operand::Declarator(shape), location)
    }

    pub(crate) fn exec_function_declarator(
        &mut self,
        frame: &Frame,
        of: NodeId,
        params: Option<NodeId>,
        location: SourceLocation,
    ) -> Result<Progress, RuntimeError> {
        let children: Vec<NodeId> = std::iter::once(of).chain(params).collect();
        if !frame.entered {
            return self.enter(&children, location);
        }

        let operands = self.pop_values(children.len(), location)?;
        let mut shape = expect_declarator(&operands[0], location)?;
        let params = match operands.get(1) {
            Some(Operand::Parameters(params)) => params.clone(),
            Some(other) => return Err(other.unexpected("parameters", location)),
            None => Vec::new(),
        };
        shape.function = Some(params);
        self.complete(Operand::Declarator(shape), location)
    }

    pub(crate) fn exec_parameter_list(
        &mut self,
        frame: &Frame,
        items: &[NodeId],
        location: SourceLocation,
    ) -> Result<Progress, RuntimeError> {
        if !frame.entered {
            return self.enter(items, location);
        }

        let params = self
            .pop_values(items.len(), location)?
            .into_iter()
            .map(|operand| match operand {
                Operand::Parameter(param) => Ok(param),
                other => Err(other.unexpected("parameter", location)),
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.complete(Operand::Parameters(params), location)
    }

    pub(crate) fn exec_parameter_declaration(
        &mut self,
        frame: &Frame,
        specifiers: NodeId,
        declarator: Option<NodeId>,
        location: SourceLocation,
    ) -> Result<Progress, RuntimeError> {
        let children: Vec<NodeId> = std::iter::once(specifiers).chain(declarator).collect();
        if !frame.entered {
            return self.enter(&children, location);
        }

        let operands = self.pop_values(children.len(), location)?;
        let ty = match &operands[0] {
            Operand::Type(ty) => *ty,
            other => return Err(other.unexpected("type", location)),
        };
        let param = match operands.get(1) {
            Some(operand) => {
                let shape = expect_declarator(operand, location)?;
                Param {
                    ty: shape.apply(ty),
                    name: Some(shape.name),
                }
            }
            None => Param { name: None, ty },
        };
        self.complete(Operand::Parameter(param), location)
    }

    pub(crate) fn exec_init_declarator(
        &mut self,
        frame: &Frame,
        declarator: NodeId,
        initializer: Option<NodeId>,
        location: SourceLocation,
    ) -> Result<Progress, RuntimeError> {
        let children: Vec<NodeId> = std::iter::once(declarator).chain(initializer).collect();
        if !frame.entered {
            return self.enter(&children, location);
        }

        let operands = self.pop_values(children.len(), location)?;
        let shape = expect_declarator(&operands[0], location)?;
        let init = match operands.get(1) {
            Some(Operand::Initializers(items)) => Some(Init::List(items.clone())),
            Some(operand) => Some(Init::Value(self.resolve(operand, location)?)),
            None => None,
        };
        self.complete(Operand::InitDeclarator { shape, init }, location)
    }

    pub(crate) fn exec_initializer_list(
        &mut self,
        frame: &Frame,
        items: &[NodeId],
        location: SourceLocation,
    ) -> Result<Progress, RuntimeError> {
        if !frame.entered && !items.is_empty() {
            return self.enter(items, location);
        }

        let operands = self.pop_values(items.len(), location)?;
        let values = operands
            .iter()
            .map(|operand| self.resolve(operand, location))
            .collect::<Result<Vec<_>, _>>()?;
        self.complete(Operand::Initializers(values), location)
    }

    pub(crate) fn exec_init_declarator_list(
        &mut self,
        frame: &Frame,
        items: &[NodeId],
        location: SourceLocation,
    ) -> Result<Progress, RuntimeError> {
        let (ty, next) = match frame.phase {
            // The enclosing declaration left the base type on the value stack
            Phase::Fresh => (self.pop_type(location)?, 0),
            Phase::Declarators { ty, next } => {
                let bound = self.pop_value(location)?;
                self.bind(ty, bound, location)?;
                (ty, next)
            }
            _ => {
                return Err(RuntimeError::internal(
                    "declarator list in a foreign phase",
                    location,
                ))
            }
        };

        match items.get(next) {
            Some(&item) => {
                self.set_phase(Phase::Declarators { ty, next: next + 1 }, location)?;
                self.push_node(item);
                Ok(Progress::Continue)
            }
            None => self.complete(Operand::Null, location),
        }
    }

    /// Bind one evaluated init-declarator into the current scope
    fn bind(&mut self, base: TypeDescriptor, operand: Operand, location: SourceLocation) -> Result<(), RuntimeError> {
        let (shape, init) = match operand {
            Operand::InitDeclarator { shape, init } => (shape, init),
            other => return Err(other.unexpected("init-declarator", location)),
        };
        if shape.function.is_some() {
            return Ok(());
        }

        let declared = shape.apply(base);
        if declared.is_void() {
            return Err(RuntimeError::TypeError {
                expected: "object type".to_string(),
                got: format!("void '{}'", shape.name),
                location,
            });
        }

        let (value, length) = match shape.array {
            Some(bound) => {
                let (array, length) = build_array(&shape.name, declared, bound, init, location)?;
                (Some(array), Some(length))
            }
            None => {
                let value = match init {
                    Some(Init::Value(value)) => Some(value.cast_to(&declared).ok_or_else(|| {
                        RuntimeError::TypeMismatch {
                            left: declared.to_string(),
                            right: value.ty.to_string(),
                            location,
                        }
                    })?),
                    Some(Init::List(_)) => {
                        return Err(RuntimeError::TypeError {
                            expected: format!("scalar initializer for '{}'", shape.name),
                            got: "initializer list".to_string(),
                            location,
                        })
                    }
                    None => None,
                };
                (value, None)
            }
        };

        let address = self.allocate(&declared, length);
        let mut symbol = Symbol::variable(shape.name, address, declared);
        if let Some(value) = value {
            symbol.set_value(value, self.line);
        }
        let scope = self.scope;
        self.declare_in(scope, symbol, location)
    }

    pub(crate) fn exec_function_definition(
        &mut self,
        frame: &Frame,
        specifiers: NodeId,
        declarator: NodeId,
        body: NodeId,
        location: SourceLocation,
    ) -> Result<Progress, RuntimeError> {
        if !frame.entered {
            return self.enter(&[specifiers, declarator], location);
        }

        let operands = self.pop_values(2, location)?;
        let return_type = match &operands[0] {
            Operand::Type(ty) => *ty,
            other => return Err(other.unexpected("type", location)),
        };
        let shape = expect_declarator(&operands[1], location)?;

        if !self.scopes.root().contains(&shape.name) {
            let info = FunctionInfo {
                definition: frame.node,
                body,
                return_type: return_type.with_pointer(shape.pointer),
                params: shape.function.unwrap_or_default(),
            };
            let address = self.allocate(&TypeDescriptor::new(BaseType::Function), None);
            self.declare_in(ROOT_SCOPE, Symbol::function(shape.name, address, info), location)?;
        }
        self.complete(Operand::Null, location)
    }
}

fn expect_declarator(operand: &Operand, location: SourceLocation) -> Result<DeclaratorShape, RuntimeError> {
    match operand {
        Operand::Declarator(shape) => Ok(shape.clone()),
        other => Err(other.unexpected("declarator", location)),
    }
}

/// Default-initialized array, with a brace list filling the leading elements
fn build_array(
    name: &str,
    declared: TypeDescriptor,
    bound: Option<usize>,
    init: Option<Init>,
    location: SourceLocation,
) -> Result<(Value, usize), RuntimeError> {
    let items = match init {
        Some(Init::List(items)) => Some(items),
        Some(Init::Value(value)) => {
            return Err(RuntimeError::TypeError {
                expected: format!("initializer list for array '{}'", name),
                got: value.ty.to_string(),
                location,
            })
        }
        None => None,
    };

    let length = match (bound, &items) {
        (Some(n), _) => n,
        (None, Some(items)) => items.len(),
        (None, None) => {
            return Err(RuntimeError::TypeError {
                expected: format!("array bound for '{}'", name),
                got: "[]".to_string(),
                location,
            })
        }
    };

    if length > MAX_ARRAY_LENGTH {
        return Err(RuntimeError::TypeError {
            expected: format!("array length of at most {}", MAX_ARRAY_LENGTH),
            got: format!("{}[{}]", name, length),
            location,
        });
    }

    let element = declared.element();
    let mut array = Value::array(element, length);
    if let Some(items) = items {
        if items.len() > length {
            return Err(RuntimeError::TypeError {
                expected: format!("at most {} initializers for '{}'", length, name),
                got: items.len().to_string(),
                location,
            });
        }
        if let Some(slots) = array.elements_mut() {
            for (slot, item) in slots.iter_mut().zip(&items) {
                *slot = item.cast_to(&element).ok_or_else(|| RuntimeError::TypeMismatch {
                    left: element.to_string(),
                    right: item.ty.to_string(),
                    location,
                })?;
            }
        }
    }
    Ok((array, length))
}
