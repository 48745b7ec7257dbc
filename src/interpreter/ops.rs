//! Binary and unary operator semantics
//!
//! | op | result |
//! |---|---|
//! | `+ - *` | int when both operands are int, else float |
//! | `/` | always float |
//! | `%` | always int |
//! | `&& \|\|` | int 0/1 by truthiness |
//! | `< > <= >= == !=` | int 0/1 |
//!
//! Operands must be castable to each other. Both sides are always evaluated
//! before the operator runs.

use crate::interpreter::errors::RuntimeError;
use crate::memory::value::{Data, Value};
use crate::parser::ast::SourceLocation;
use std::cmp::Ordering;

const OPERATORS: &[&str] = &[
    "+", "-", "*", "/", "%", "&&", "||", "<", ">", "<=", ">=", "==", "!=",
];

/// Numeric payload of an operand
#[derive(Debug, Clone, Copy)]
enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    fn of(value: &Value) -> Option<Number> {
        match value.data {
            Data::Int(n) => Some(Number::Int(n)),
            Data::Float(x) => Some(Number::Float(x)),
            _ => None,
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            Number::Int(n) => n as f64,
            Number::Float(x) => x,
        }
    }

    fn as_i64(self) -> i64 {
        match self {
            Number::Int(n) => n,
            Number::Float(x) => x.trunc() as i64,
        }
    }
}

/// Apply a binary operator to two resolved operands
pub fn apply_binary(
    op: &str,
    left: &Value,
    right: &Value,
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    if !OPERATORS.contains(&op) {
        return Err(RuntimeError::InvalidOperator {
            op: op.to_string(),
            location,
        });
    }

    let mismatch = || RuntimeError::TypeMismatch {
        left: left.ty.to_string(),
        right: right.ty.to_string(),
        location,
    };
    if !left.ty.castable_to(&right.ty) {
        return Err(mismatch());
    }
    let (Some(a), Some(b)) = (Number::of(left), Number::of(right)) else {
        return Err(mismatch());
    };

    match op {
        "+" | "-" | "*" => arithmetic(op, a, b, location),
        "/" => {
            let divisor = b.as_f64();
            if divisor == 0.0 {
                return Err(RuntimeError::DivisionByZero {
                    op: format!("{} / {}", left, right),
                    location,
                });
            }
            Ok(Value::float(a.as_f64() / divisor))
        }
        "%" => {
            let (x, y) = (a.as_i64(), b.as_i64());
            if y == 0 {
                return Err(RuntimeError::DivisionByZero {
                    op: format!("{} % {}", x, y),
                    location,
                });
            }
            x.checked_rem(y)
                .map(Value::int)
                .ok_or(RuntimeError::IntegerOverflow {
                    op: format!("{} % {}", x, y),
                    location,
                })
        }
        "&&" => Ok(Value::from_bool(a.as_f64() >= 1.0 && b.as_f64() >= 1.0)),
        "||" => Ok(Value::from_bool(a.as_f64() >= 1.0 || b.as_f64() >= 1.0)),
        _ => {
            let ordering = compare(a, b);
            let result = match op {
                "<" => ordering == Some(Ordering::Less),
                ">" => ordering == Some(Ordering::Greater),
                "<=" => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
                ">=" => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
                "==" => ordering == Some(Ordering::Equal),
                _ => ordering != Some(Ordering::Equal),
            };
            Ok(Value::from_bool(result))
        }
    }
}

fn arithmetic(op: &str, a: Number, b: Number, location: SourceLocation) -> Result<Value, RuntimeError> {
    match (a, b) {
        (Number::Int(x), Number::Int(y)) => {
            let result = match op {
                "+" => x.checked_add(y),
                "-" => x.checked_sub(y),
                _ => x.checked_mul(y),
            };
            result.map(Value::int).ok_or(RuntimeError::IntegerOverflow {
                op: format!("{} {} {}", x, op, y),
                location,
            })
        }
        _ => {
            let (x, y) = (a.as_f64(), b.as_f64());
            let result = match op {
                "+" => x + y,
                "-" => x - y,
                _ => x * y,
            };
            Ok(Value::float(result))
        }
    }
}

fn compare(a: Number, b: Number) -> Option<Ordering> {
    match (a, b) {
        (Number::Int(x), Number::Int(y)) => Some(x.cmp(&y)),
        _ => a.as_f64().partial_cmp(&b.as_f64()),
    }
}

/// `value + delta` for `++` / `--`, keeping the operand's type
pub fn step_value(value: &Value, delta: i64, location: SourceLocation) -> Result<Value, RuntimeError> {
    let data = match value.data {
        Data::Int(n) => Data::Int(n.checked_add(delta).ok_or(RuntimeError::IntegerOverflow {
            op: format!("{} {} 1", n, if delta > 0 { "+" } else { "-" }),
            location,
        })?),
        Data::Float(x) => Data::Float(x + delta as f64),
        _ => {
            return Err(RuntimeError::TypeError {
                expected: "numeric operand".to_string(),
                got: value.ty.to_string(),
                location,
            })
        }
    };
    Ok(Value { ty: value.ty, data })
}

/// Unary minus
pub fn negate(value: &Value, location: SourceLocation) -> Result<Value, RuntimeError> {
    match value.data {
        Data::Int(n) if value.ty.is_arithmetic() => n
            .checked_neg()
            .map(Value::int)
            .ok_or(RuntimeError::IntegerOverflow {
                op: format!("-{}", n),
                location,
            }),
        Data::Float(x) => Ok(Value::float(-x)),
        _ => Err(RuntimeError::TypeError {
            expected: "numeric operand".to_string(),
            got: value.ty.to_string(),
            location,
        }),
    }
}

/// Logical not: 1 when the operand is not truthy
pub fn not(value: &Value, location: SourceLocation) -> Result<Value, RuntimeError> {
    value
        .truthy()
        .map(|t| Value::from_bool(!t))
        .ok_or_else(|| RuntimeError::TypeError {
            expected: "numeric operand".to_string(),
            got: value.ty.to_string(),
            location,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::value::TypeDescriptor;

    fn loc() -> SourceLocation {
        SourceLocation::new(1, 1)
    }

    fn bin(op: &str, left: Value, right: Value) -> Result<Value, RuntimeError> {
        apply_binary(op, &left, &right, loc())
    }

    #[test]
    fn test_arithmetic_result_types() {
        assert_eq!(bin("+", Value::int(2), Value::int(3)).unwrap(), Value::int(5));
        assert_eq!(
            bin("*", Value::int(2), Value::float(1.5)).unwrap(),
            Value::float(3.0)
        );
        assert_eq!(bin("/", Value::int(7), Value::int(2)).unwrap(), Value::float(3.5));
        assert_eq!(bin("%", Value::int(7), Value::int(3)).unwrap(), Value::int(1));
    }

    #[test]
    fn test_comparisons_yield_int() {
        assert_eq!(bin("<", Value::int(1), Value::int(2)).unwrap(), Value::int(1));
        assert_eq!(bin(">=", Value::int(1), Value::int(2)).unwrap(), Value::int(0));
        assert_eq!(
            bin("==", Value::int(2), Value::float(2.0)).unwrap(),
            Value::int(1)
        );
        assert_eq!(bin("!=", Value::int(2), Value::int(2)).unwrap(), Value::int(0));
    }

    #[test]
    fn test_logical_uses_truthiness() {
        assert_eq!(bin("&&", Value::int(1), Value::int(2)).unwrap(), Value::int(1));
        assert_eq!(
            bin("||", Value::float(0.5), Value::int(0)).unwrap(),
            Value::int(0)
        );
    }

    #[test]
    fn test_errors() {
        assert!(matches!(
            bin("+", Value::string("a"), Value::int(1)),
            Err(RuntimeError::TypeMismatch { .. })
        ));
        assert!(matches!(
            bin("<<", Value::int(1), Value::int(1)),
            Err(RuntimeError::InvalidOperator { .. })
        ));
        assert!(matches!(
            bin("/", Value::int(1), Value::int(0)),
            Err(RuntimeError::DivisionByZero { .. })
        ));
        assert!(matches!(
            bin("+", Value::int(i64::MAX), Value::int(1)),
            Err(RuntimeError::IntegerOverflow { .. })
        ));
        let pointer = Value {
            ty: TypeDescriptor::int().with_pointer(1),
            data: Data::Int(4),
        };
        assert!(matches!(
            bin("+", pointer, Value::int(1)),
            Err(RuntimeError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_unary_helpers() {
        assert_eq!(step_value(&Value::int(1), 1, loc()).unwrap(), Value::int(2));
        assert_eq!(
            step_value(&Value::float(1.5), -1, loc()).unwrap(),
            Value::float(0.5)
        );
        assert_eq!(negate(&Value::int(3), loc()).unwrap(), Value::int(-3));
        assert_eq!(not(&Value::int(0), loc()).unwrap(), Value::int(1));
        assert_eq!(not(&Value::int(5), loc()).unwrap(), Value::int(0));
    }
}
