//! Runtime value representation
//!
//! This module defines the [`TypeDescriptor`] carried by every symbol and value,
//! and the [`Value`] struct that pairs a descriptor with its payload.
//!
//! # Castability
//!
//! Two descriptors are castable when both bases are numeric (`int`, `float`) and
//! their ranks (pointer order plus one for arrays) are equal. Only numeric
//! scalars are ever converted; array values cast only to an identical type.
//!
//! # Arrays
//!
//! Array values own their elements. The element count is fixed when the array
//! is declared and never changes afterwards.

use std::fmt;

/// Base types known to the interpreter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseType {
    Int,
    Float,
    String,
    Function,
    Void,
    Op,
}

impl BaseType {
    pub fn is_numeric(self) -> bool {
        matches!(self, BaseType::Int | BaseType::Float)
    }
}

impl fmt::Display for BaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BaseType::Int => "int",
            BaseType::Float => "float",
            BaseType::String => "string",
            BaseType::Function => "function",
            BaseType::Void => "void",
            BaseType::Op => "op",
        };
        f.write_str(name)
    }
}

/// Canonical runtime type: base, pointer order and array flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeDescriptor {
    pub base: BaseType,
    pub pointer: usize, // 0 = not a pointer, 1 = *, 2 = **, ...
    pub array: bool,
}

impl TypeDescriptor {
    pub fn new(base: BaseType) -> Self {
        TypeDescriptor {
            base,
            pointer: 0,
            array: false,
        }
    }

    pub fn int() -> Self {
        Self::new(BaseType::Int)
    }

    pub fn float() -> Self {
        Self::new(BaseType::Float)
    }

    pub fn with_pointer(mut self, order: usize) -> Self {
        self.pointer += order;
        self
    }

    pub fn as_array(mut self) -> Self {
        self.array = true;
        self
    }

    /// The type of one element of an array of this type
    pub fn element(mut self) -> Self {
        self.array = false;
        self
    }

    /// Pointer order plus one for arrays
    pub fn rank(&self) -> usize {
        self.pointer + usize::from(self.array)
    }

    pub fn is_void(&self) -> bool {
        self.base == BaseType::Void && self.rank() == 0
    }

    /// Numeric scalar of rank zero
    pub fn is_arithmetic(&self) -> bool {
        self.base.is_numeric() && self.rank() == 0
    }

    pub fn castable_to(&self, other: &TypeDescriptor) -> bool {
        self.base.is_numeric() && other.base.is_numeric() && self.rank() == other.rank()
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base)?;
        for _ in 0..self.pointer {
            f.write_str("*")?;
        }
        if self.array {
            f.write_str("[]")?;
        }
        Ok(())
    }
}

/// Payload of a runtime value
#[derive(Debug, Clone, PartialEq)]
pub enum Data {
    Int(i64),
    Float(f64),
    Str(String),
    Op(String),
    Array(Vec<Value>),
}

/// A typed runtime value
#[derive(Debug, Clone, PartialEq)]
pub struct Value {
    pub ty: TypeDescriptor,
    pub data: Data,
}

impl Value {
    pub fn int(n: i64) -> Self {
        Value {
            ty: TypeDescriptor::int(),
            data: Data::Int(n),
        }
    }

    pub fn float(x: f64) -> Self {
        Value {
            ty: TypeDescriptor::float(),
            data: Data::Float(x),
        }
    }

    pub fn string(s: impl Into<String>) -> Self {
        Value {
            ty: TypeDescriptor::new(BaseType::String),
            data: Data::Str(s.into()),
        }
    }

    pub fn op(symbol: impl Into<String>) -> Self {
        Value {
            ty: TypeDescriptor::new(BaseType::Op),
            data: Data::Op(symbol.into()),
        }
    }

    pub fn from_bool(b: bool) -> Self {
        Value::int(i64::from(b))
    }

    /// Default element value for a scalar type: `0`, `0.0` or `""`.
    /// Pointers default to address `0`.
    pub fn zero(ty: TypeDescriptor) -> Self {
        let data = match ty.base {
            BaseType::Float if ty.pointer == 0 => Data::Float(0.0),
            BaseType::String if ty.pointer == 0 => Data::Str(String::new()),
            _ => Data::Int(0),
        };
        Value {
            ty: ty.element(),
            data,
        }
    }

    /// A fixed-length array of default-initialized elements
    pub fn array(element: TypeDescriptor, len: usize) -> Self {
        let element = element.element();
        Value {
            ty: element.as_array(),
            data: Data::Array(vec![Value::zero(element); len]),
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self.data {
            Data::Int(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self.data {
            Data::Int(n) => Some(n as f64),
            Data::Float(x) => Some(x),
            _ => None,
        }
    }

    pub fn as_op(&self) -> Option<&str> {
        match &self.data {
            Data::Op(s) => Some(s),
            _ => None,
        }
    }

    pub fn elements(&self) -> Option<&[Value]> {
        match &self.data {
            Data::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn elements_mut(&mut self) -> Option<&mut Vec<Value>> {
        match &mut self.data {
            Data::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Numeric truthiness: a value is true when it is at least `1`.
    /// Returns `None` for non-numeric values.
    pub fn truthy(&self) -> Option<bool> {
        self.as_f64().map(|x| x >= 1.0)
    }

    /// Convert to the target type, or `None` when the two are not castable.
    pub fn cast_to(&self, target: &TypeDescriptor) -> Option<Value> {
        if self.ty.array || target.array {
            return (self.ty == *target).then(|| self.clone());
        }
        if !self.ty.castable_to(target) {
            return None;
        }
        let data = match (target.base, target.pointer, &self.data) {
            (BaseType::Float, 0, Data::Int(n)) => Data::Float(*n as f64),
            (_, _, Data::Float(x)) if target.base == BaseType::Int || target.pointer > 0 => {
                Data::Int(x.trunc() as i64)
            }
            (_, _, data) => data.clone(),
        };
        Some(Value { ty: *target, data })
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.data {
            Data::Int(n) if self.ty.pointer > 0 => write!(f, "0x{:08x}", n),
            Data::Int(n) => write!(f, "{}", n),
            Data::Float(x) if x.is_finite() && x.fract() == 0.0 => write!(f, "{:.1}", x),
            Data::Float(x) => write!(f, "{}", x),
            Data::Str(s) => write!(f, "{:?}", s),
            Data::Op(s) => f.write_str(s),
            Data::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_castability_requires_numeric_and_equal_rank() {
        let int = TypeDescriptor::int();
        let float = TypeDescriptor::float();
        let int_ptr = TypeDescriptor::int().with_pointer(1);
        let int_arr = TypeDescriptor::int().as_array();
        let string = TypeDescriptor::new(BaseType::String);

        assert!(int.castable_to(&float));
        assert!(float.castable_to(&int));
        assert!(!int.castable_to(&int_ptr));
        assert!(int_ptr.castable_to(&int_arr));
        assert!(!string.castable_to(&string));
    }

    #[test]
    fn test_numeric_casts() {
        let v = Value::int(3).cast_to(&TypeDescriptor::float()).unwrap();
        assert_eq!(v, Value::float(3.0));

        let v = Value::float(2.9).cast_to(&TypeDescriptor::int()).unwrap();
        assert_eq!(v, Value::int(2));

        assert!(Value::string("a").cast_to(&TypeDescriptor::int()).is_none());
    }

    #[test]
    fn test_array_defaults() {
        let a = Value::array(TypeDescriptor::float(), 3);
        assert_eq!(a.ty, TypeDescriptor::float().as_array());
        assert_eq!(a.elements().unwrap().len(), 3);
        assert!(a.elements().unwrap().iter().all(|e| *e == Value::float(0.0)));

        let s = Value::array(TypeDescriptor::new(BaseType::String), 2);
        assert_eq!(s.elements().unwrap()[1], Value::string(""));
    }

    #[test]
    fn test_truthiness() {
        assert_eq!(Value::int(1).truthy(), Some(true));
        assert_eq!(Value::int(0).truthy(), Some(false));
        assert_eq!(Value::float(0.5).truthy(), Some(false));
        assert_eq!(Value::int(-3).truthy(), Some(false));
        assert_eq!(Value::string("x").truthy(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::int(14).to_string(), "14");
        assert_eq!(Value::float(2.0).to_string(), "2.0");
        assert_eq!(Value::float(2.5).to_string(), "2.5");
        assert_eq!(Value::array(TypeDescriptor::int(), 2).to_string(), "[0, 0]");
        assert_eq!(TypeDescriptor::int().with_pointer(2).to_string(), "int**");
    }
}
