//! Memory model for the interpreter
//!
//! This module provides the core memory abstractions:
//! - [`value`]: Type descriptors and typed runtime values
//! - [`scope`]: Symbols, chained scopes and the scope arena
//!
//! # Type Sizes
//!
//! Symbols receive monotonically increasing virtual addresses. The address
//! counter advances by the symbol's size, using fixed sizes:
//! - `int`: 4 bytes
//! - `float`: 8 bytes
//! - `string`: 8 bytes (a reference)
//! - `pointer`: 8 bytes (regardless of pointee type)
//! - `function`: 0 bytes
//!
//! Arrays occupy `element size * length`.

pub mod scope;
pub mod value;

use value::{BaseType, TypeDescriptor};

/// Virtual address type
pub type Address = u64;

/// Size in bytes of one value of the given type. `len` is the element count
/// for arrays.
pub fn sizeof_type(ty: &TypeDescriptor, len: Option<usize>) -> u64 {
    let element: u64 = if ty.pointer > 0 {
        8
    } else {
        match ty.base {
            BaseType::Int => 4,
            BaseType::Float | BaseType::String => 8,
            BaseType::Function | BaseType::Void | BaseType::Op => 0,
        }
    };
    match (ty.array, len) {
        (true, Some(n)) => element.saturating_mul(n as u64),
        _ => element,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sizes() {
        assert_eq!(sizeof_type(&TypeDescriptor::int(), None), 4);
        assert_eq!(sizeof_type(&TypeDescriptor::float(), None), 8);
        assert_eq!(sizeof_type(&TypeDescriptor::int().with_pointer(1), None), 8);
        assert_eq!(sizeof_type(&TypeDescriptor::int().as_array(), Some(5)), 20);
    }

    #[test]
    fn test_huge_array_size_saturates() {
        let ty = TypeDescriptor::float().as_array();
        assert_eq!(sizeof_type(&ty, Some(usize::MAX)), u64::MAX);
    }
}
