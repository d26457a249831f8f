//! Scalar and elementwise-batched operator application.
//!
//! Operands are widened to their common numeric type first, then dispatched
//! by kind. Every operator applies elementwise through the matrix algebra
//! (with scalar broadcast); `*` on two non-scalar batches is matrix
//! multiplication. Integer arithmetic wraps; integer division and modulo by
//! zero are errors; float arithmetic follows IEEE 754.

use crate::ast::{Literal, Operator, Type};
use crate::evaluator::error::EvalError;
use crate::matrix::Matrix;

pub(super) fn apply_binary(op: Operator, lhs: Literal, rhs: Literal) -> Result<Literal, EvalError> {
    let (lhs, rhs) = widen_pair(lhs, rhs);
    match (lhs, rhs) {
        (Literal::Int(a), Literal::Int(b)) => int_op(op, a, b),
        (Literal::Float(a), Literal::Float(b)) => float_op(op, a, b),
        (Literal::Double(a), Literal::Double(b)) => double_op(op, a, b),
        (Literal::Char(a), Literal::Char(b)) => char_op(op, a, b),
        (Literal::Bool(a), Literal::Bool(b)) => bool_op(op, a, b),
        (Literal::Str(a), Literal::Str(b)) => str_op(op, a, b),
        (Literal::SymbolicInt(_), other) | (other, Literal::SymbolicInt(_)) => {
            Err(EvalError::UndefinedOperation {
                op,
                left: Type::Int,
                right: other.ty(),
            })
        }
        (a, b) => Err(EvalError::UndefinedOperation {
            op,
            left: a.ty(),
            right: b.ty(),
        }),
    }
}

pub(super) fn apply_unary(op: Operator, operand: Literal) -> Result<Literal, EvalError> {
    match (op, operand) {
        (Operator::LogicalNot, Literal::Bool(m)) => Ok(Literal::Bool(m.map(|b| !b))),
        (Operator::BitwiseNot, Literal::Int(m)) => Ok(Literal::Int(m.map(|v| !v))),
        (op, operand) => Err(EvalError::UndefinedUnaryOperation {
            op,
            ty: operand.ty(),
        }),
    }
}

/// Promote mixed numeric operands to their common type. Char arithmetic
/// promotes through Int, so `char` only ever meets `char` below.
fn widen_pair(lhs: Literal, rhs: Literal) -> (Literal, Literal) {
    if lhs.ty() == rhs.ty() {
        return (lhs, rhs);
    }
    match Type::widen(lhs.ty(), rhs.ty()) {
        Some(target) => {
            let target = if target == Type::Char { Type::Int } else { target };
            (promote(lhs, target), promote(rhs, target))
        }
        // kind mismatch, reported by the dispatch above
        None => (lhs, rhs),
    }
}

fn promote(literal: Literal, target: Type) -> Literal {
    match (literal, target) {
        (Literal::Char(m), Type::Int) => Literal::Int(m.map(|c| *c as i64)),
        (Literal::Char(m), Type::Float) => Literal::Float(m.map(|c| *c as u32 as f32)),
        (Literal::Char(m), Type::Double) => Literal::Double(m.map(|c| *c as u32 as f64)),
        (Literal::Int(m), Type::Float) => Literal::Float(m.map(|v| *v as f32)),
        (Literal::Int(m), Type::Double) => Literal::Double(m.map(|v| *v as f64)),
        (Literal::Float(m), Type::Double) => Literal::Double(m.map(|v| f64::from(*v))),
        (other, _) => other,
    }
}

fn int_op(op: Operator, a: Matrix<i64>, b: Matrix<i64>) -> Result<Literal, EvalError> {
    let lit = match op {
        Operator::Add => Literal::Int(Matrix::componentwise(&a, &b, |x, y| x.wrapping_add(*y))?),
        Operator::Sub => Literal::Int(Matrix::componentwise(&a, &b, |x, y| x.wrapping_sub(*y))?),
        Operator::Mul => {
            if !a.is_scalar() && !b.is_scalar() {
                Literal::Int(Matrix::multiply(&a, &b)?)
            } else {
                Literal::Int(Matrix::componentwise(&a, &b, |x, y| x.wrapping_mul(*y))?)
            }
        }
        Operator::Div => {
            if b.iter().any(|&v| v == 0) {
                return Err(EvalError::DivisionByZero);
            }
            Literal::Int(Matrix::componentwise(&a, &b, |x, y| x.wrapping_div(*y))?)
        }
        Operator::Mod => {
            if b.iter().any(|&v| v == 0) {
                return Err(EvalError::DivisionByZero);
            }
            Literal::Int(Matrix::componentwise(&a, &b, |x, y| x.wrapping_rem(*y))?)
        }
        Operator::BitwiseAnd => Literal::Int(Matrix::componentwise(&a, &b, |x, y| x & y)?),
        Operator::BitwiseOr => Literal::Int(Matrix::componentwise(&a, &b, |x, y| x | y)?),
        Operator::BitwiseXor => Literal::Int(Matrix::componentwise(&a, &b, |x, y| x ^ y)?),
        Operator::Equal => Literal::Bool(Matrix::componentwise(&a, &b, |x, y| x == y)?),
        Operator::NotEqual => Literal::Bool(Matrix::componentwise(&a, &b, |x, y| x != y)?),
        Operator::Less => Literal::Bool(Matrix::componentwise(&a, &b, |x, y| x < y)?),
        Operator::Greater => Literal::Bool(Matrix::componentwise(&a, &b, |x, y| x > y)?),
        Operator::LessEqual => Literal::Bool(Matrix::componentwise(&a, &b, |x, y| x <= y)?),
        Operator::GreaterEqual => Literal::Bool(Matrix::componentwise(&a, &b, |x, y| x >= y)?),
        _ => {
            return Err(EvalError::UndefinedOperation {
                op,
                left: Type::Int,
                right: Type::Int,
            });
        }
    };
    Ok(lit)
}

fn float_op(op: Operator, a: Matrix<f32>, b: Matrix<f32>) -> Result<Literal, EvalError> {
    let lit = match op {
        Operator::Add => Literal::Float(Matrix::componentwise(&a, &b, |x, y| x + y)?),
        Operator::Sub => Literal::Float(Matrix::componentwise(&a, &b, |x, y| x - y)?),
        Operator::Mul => {
            if !a.is_scalar() && !b.is_scalar() {
                Literal::Float(Matrix::multiply(&a, &b)?)
            } else {
                Literal::Float(Matrix::componentwise(&a, &b, |x, y| x * y)?)
            }
        }
        Operator::Div => Literal::Float(Matrix::componentwise(&a, &b, |x, y| x / y)?),
        Operator::Mod => Literal::Float(Matrix::componentwise(&a, &b, |x, y| x % y)?),
        Operator::Equal => Literal::Bool(Matrix::componentwise(&a, &b, |x, y| x == y)?),
        Operator::NotEqual => Literal::Bool(Matrix::componentwise(&a, &b, |x, y| x != y)?),
        Operator::Less => Literal::Bool(Matrix::componentwise(&a, &b, |x, y| x < y)?),
        Operator::Greater => Literal::Bool(Matrix::componentwise(&a, &b, |x, y| x > y)?),
        Operator::LessEqual => Literal::Bool(Matrix::componentwise(&a, &b, |x, y| x <= y)?),
        Operator::GreaterEqual => Literal::Bool(Matrix::componentwise(&a, &b, |x, y| x >= y)?),
        _ => {
            return Err(EvalError::UndefinedOperation {
                op,
                left: Type::Float,
                right: Type::Float,
            });
        }
    };
    Ok(lit)
}

fn double_op(op: Operator, a: Matrix<f64>, b: Matrix<f64>) -> Result<Literal, EvalError> {
    let lit = match op {
        Operator::Add => Literal::Double(Matrix::componentwise(&a, &b, |x, y| x + y)?),
        Operator::Sub => Literal::Double(Matrix::componentwise(&a, &b, |x, y| x - y)?),
        Operator::Mul => {
            if !a.is_scalar() && !b.is_scalar() {
                Literal::Double(Matrix::multiply(&a, &b)?)
            } else {
                Literal::Double(Matrix::componentwise(&a, &b, |x, y| x * y)?)
            }
        }
        Operator::Div => Literal::Double(Matrix::componentwise(&a, &b, |x, y| x / y)?),
        Operator::Mod => Literal::Double(Matrix::componentwise(&a, &b, |x, y| x % y)?),
        Operator::Equal => Literal::Bool(Matrix::componentwise(&a, &b, |x, y| x == y)?),
        Operator::NotEqual => Literal::Bool(Matrix::componentwise(&a, &b, |x, y| x != y)?),
        Operator::Less => Literal::Bool(Matrix::componentwise(&a, &b, |x, y| x < y)?),
        Operator::Greater => Literal::Bool(Matrix::componentwise(&a, &b, |x, y| x > y)?),
        Operator::LessEqual => Literal::Bool(Matrix::componentwise(&a, &b, |x, y| x <= y)?),
        Operator::GreaterEqual => Literal::Bool(Matrix::componentwise(&a, &b, |x, y| x >= y)?),
        _ => {
            return Err(EvalError::UndefinedOperation {
                op,
                left: Type::Double,
                right: Type::Double,
            });
        }
    };
    Ok(lit)
}

fn char_op(op: Operator, a: Matrix<char>, b: Matrix<char>) -> Result<Literal, EvalError> {
    match op {
        Operator::Equal => Ok(Literal::Bool(Matrix::componentwise(&a, &b, |x, y| x == y)?)),
        Operator::NotEqual => Ok(Literal::Bool(Matrix::componentwise(&a, &b, |x, y| x != y)?)),
        Operator::Less => Ok(Literal::Bool(Matrix::componentwise(&a, &b, |x, y| x < y)?)),
        Operator::Greater => Ok(Literal::Bool(Matrix::componentwise(&a, &b, |x, y| x > y)?)),
        Operator::LessEqual => Ok(Literal::Bool(Matrix::componentwise(&a, &b, |x, y| x <= y)?)),
        Operator::GreaterEqual => {
            Ok(Literal::Bool(Matrix::componentwise(&a, &b, |x, y| x >= y)?))
        }
        // char arithmetic computes on code points
        _ => int_op(op, a.map(|c| *c as i64), b.map(|c| *c as i64)),
    }
}

fn bool_op(op: Operator, a: Matrix<bool>, b: Matrix<bool>) -> Result<Literal, EvalError> {
    let m = match op {
        Operator::LogicalAnd => Matrix::componentwise(&a, &b, |x, y| *x && *y)?,
        Operator::LogicalOr => Matrix::componentwise(&a, &b, |x, y| *x || *y)?,
        Operator::Equal => Matrix::componentwise(&a, &b, |x, y| x == y)?,
        Operator::NotEqual => Matrix::componentwise(&a, &b, |x, y| x != y)?,
        _ => {
            return Err(EvalError::UndefinedOperation {
                op,
                left: Type::Bool,
                right: Type::Bool,
            });
        }
    };
    Ok(Literal::Bool(m))
}

fn str_op(op: Operator, a: Matrix<String>, b: Matrix<String>) -> Result<Literal, EvalError> {
    let m = match op {
        Operator::Equal => Matrix::componentwise(&a, &b, |x, y| x == y)?,
        Operator::NotEqual => Matrix::componentwise(&a, &b, |x, y| x != y)?,
        _ => {
            return Err(EvalError::UndefinedOperation {
                op,
                left: Type::String,
                right: Type::String,
            });
        }
    };
    Ok(Literal::Bool(m))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_arithmetic() {
        let result = apply_binary(Operator::Add, Literal::int(2), Literal::int(3)).unwrap();
        assert_eq!(result, Literal::int(5));
        let result = apply_binary(Operator::Sub, Literal::int(1), Literal::int(2)).unwrap();
        assert_eq!(result, Literal::int(-1));
    }

    #[test]
    fn test_int_division_by_zero() {
        assert_eq!(
            apply_binary(Operator::Div, Literal::int(1), Literal::int(0)),
            Err(EvalError::DivisionByZero)
        );
    }

    #[test]
    fn test_int_overflow_wraps() {
        let result =
            apply_binary(Operator::Add, Literal::int(i64::MAX), Literal::int(1)).unwrap();
        assert_eq!(result, Literal::int(i64::MIN));
    }

    #[test]
    fn test_mixed_numeric_operands_widen() {
        let result = apply_binary(Operator::Add, Literal::int(1), Literal::double(0.5)).unwrap();
        assert_eq!(result, Literal::double(1.5));
    }

    #[test]
    fn test_scalar_broadcast_over_batch() {
        let batch = Literal::Int(Matrix::from_rows(vec![vec![1, 2], vec![3, 4]]).unwrap());
        let result = apply_binary(Operator::Add, Literal::int(5), batch).unwrap();
        assert_eq!(
            result,
            Literal::Int(Matrix::from_rows(vec![vec![6, 7], vec![8, 9]]).unwrap())
        );
    }

    #[test]
    fn test_batch_multiplication_is_matrix_multiplication() {
        let a = Literal::Int(Matrix::from_rows(vec![vec![1, 2, 3], vec![4, 5, 6]]).unwrap());
        let b = Literal::Int(
            Matrix::from_rows(vec![vec![7, 8], vec![9, 10], vec![11, 12]]).unwrap(),
        );
        let result = apply_binary(Operator::Mul, a, b).unwrap();
        assert_eq!(
            result,
            Literal::Int(Matrix::from_rows(vec![vec![58, 64], vec![139, 154]]).unwrap())
        );
    }

    #[test]
    fn test_comparison_produces_bool_batch() {
        let a = Literal::Int(Matrix::row(vec![1, 5]).unwrap());
        let b = Literal::Int(Matrix::row(vec![3, 3]).unwrap());
        let result = apply_binary(Operator::Less, a, b).unwrap();
        assert_eq!(result, Literal::Bool(Matrix::row(vec![true, false]).unwrap()));
    }

    #[test]
    fn test_string_equality() {
        let result = apply_binary(
            Operator::Equal,
            Literal::string("a"),
            Literal::string("a"),
        )
        .unwrap();
        assert_eq!(result, Literal::bool(true));
    }

    #[test]
    fn test_undefined_operation() {
        assert!(matches!(
            apply_binary(Operator::Add, Literal::bool(true), Literal::int(1)),
            Err(EvalError::UndefinedOperation { .. })
        ));
    }

    #[test]
    fn test_unary_not() {
        assert_eq!(
            apply_unary(Operator::LogicalNot, Literal::bool(true)).unwrap(),
            Literal::bool(false)
        );
        assert_eq!(
            apply_unary(Operator::BitwiseNot, Literal::int(0)).unwrap(),
            Literal::int(-1)
        );
    }
}
