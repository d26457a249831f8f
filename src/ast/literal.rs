//! Literal values: scalars and batched matrices of scalars.

use std::fmt;

use crate::ast::datatype::Type;
use crate::ast::nodes::Expr;
use crate::matrix::{Dimension, Matrix, MatrixError};

/// A literal value of the language.
///
/// Every literal holds a matrix; a plain scalar is a (1,1) matrix. The
/// [`Literal::SymbolicInt`] variant is an int batch whose elements are still
/// unevaluated expressions, e.g. a slot whose value is an index computed from
/// a variable.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Bool(Matrix<bool>),
    Char(Matrix<char>),
    Int(Matrix<i64>),
    SymbolicInt(Matrix<Expr>),
    Float(Matrix<f32>),
    Double(Matrix<f64>),
    Str(Matrix<String>),
}

impl Literal {
    pub fn bool(value: bool) -> Self {
        Literal::Bool(Matrix::scalar(value))
    }

    pub fn char(value: char) -> Self {
        Literal::Char(Matrix::scalar(value))
    }

    pub fn int(value: i64) -> Self {
        Literal::Int(Matrix::scalar(value))
    }

    pub fn float(value: f32) -> Self {
        Literal::Float(Matrix::scalar(value))
    }

    pub fn double(value: f64) -> Self {
        Literal::Double(Matrix::scalar(value))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Literal::Str(Matrix::scalar(value.into()))
    }

    pub fn ty(&self) -> Type {
        match self {
            Literal::Bool(_) => Type::Bool,
            Literal::Char(_) => Type::Char,
            Literal::Int(_) | Literal::SymbolicInt(_) => Type::Int,
            Literal::Float(_) => Type::Float,
            Literal::Double(_) => Type::Double,
            Literal::Str(_) => Type::String,
        }
    }

    pub fn dim(&self) -> Dimension {
        match self {
            Literal::Bool(m) => m.dim(),
            Literal::Char(m) => m.dim(),
            Literal::Int(m) => m.dim(),
            Literal::SymbolicInt(m) => m.dim(),
            Literal::Float(m) => m.dim(),
            Literal::Double(m) => m.dim(),
            Literal::Str(m) => m.dim(),
        }
    }

    pub fn is_scalar(&self) -> bool {
        self.dim().is_scalar()
    }

    /// The value of a scalar int literal.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Literal::Int(m) => m.scalar_value().copied(),
            _ => None,
        }
    }

    /// The value of a scalar bool literal.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Literal::Bool(m) => m.scalar_value().copied(),
            _ => None,
        }
    }

    /// A rotated copy, leaving this literal untouched.
    pub fn rotated(&self, amount: i64) -> Result<Literal, MatrixError> {
        let mut out = self.clone();
        match &mut out {
            Literal::Bool(m) => m.rotate(amount)?,
            Literal::Char(m) => m.rotate(amount)?,
            Literal::Int(m) => m.rotate(amount)?,
            Literal::SymbolicInt(m) => m.rotate(amount)?,
            Literal::Float(m) => m.rotate(amount)?,
            Literal::Double(m) => m.rotate(amount)?,
            Literal::Str(m) => m.rotate(amount)?,
        }
        Ok(out)
    }

    /// A transposed copy, leaving this literal untouched.
    pub fn transposed(&self) -> Literal {
        let mut out = self.clone();
        match &mut out {
            Literal::Bool(m) => m.transpose(),
            Literal::Char(m) => m.transpose(),
            Literal::Int(m) => m.transpose(),
            Literal::SymbolicInt(m) => m.transpose(),
            Literal::Float(m) => m.transpose(),
            Literal::Double(m) => m.transpose(),
            Literal::Str(m) => m.transpose(),
        }
        out
    }
}

/// Print a float so it re-parses as a float: integral values keep a
/// trailing `.0`.
fn fmt_decimal(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Bool(m) => write!(f, "{m}"),
            Literal::Char(m) => match m.scalar_value() {
                Some(c) => write!(f, "'{}'", c.escape_default()),
                None => write!(f, "{m}"),
            },
            Literal::Int(m) => write!(f, "{m}"),
            Literal::SymbolicInt(m) => write!(f, "{m}"),
            Literal::Float(m) => match m.scalar_value() {
                Some(v) => write!(f, "{}f", fmt_decimal(f64::from(*v))),
                None => write!(f, "{m}"),
            },
            Literal::Double(m) => match m.scalar_value() {
                Some(v) => write!(f, "{}", fmt_decimal(*v)),
                None => write!(f, "{m}"),
            },
            Literal::Str(m) => match m.scalar_value() {
                Some(s) => write!(f, "\"{}\"", s.escape_default()),
                None => write!(f, "{m}"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_literals_are_one_by_one_matrices() {
        assert_eq!(Literal::int(5).dim(), Dimension::new(1, 1));
        assert!(Literal::bool(true).is_scalar());
    }

    #[test]
    fn test_display_round_trippable_scalars() {
        assert_eq!(Literal::int(42).to_string(), "42");
        assert_eq!(Literal::double(1.0).to_string(), "1.0");
        assert_eq!(Literal::double(2.5).to_string(), "2.5");
        assert_eq!(Literal::float(1.5).to_string(), "1.5f");
        assert_eq!(Literal::bool(false).to_string(), "false");
        assert_eq!(Literal::char('a').to_string(), "'a'");
        assert_eq!(Literal::string("hi").to_string(), "\"hi\"");
    }

    #[test]
    fn test_rotated_leaves_original_untouched() {
        let original = Literal::Int(Matrix::row(vec![1, 2, 3, 4]).unwrap());
        let rotated = original.rotated(1).unwrap();
        assert_eq!(original, Literal::Int(Matrix::row(vec![1, 2, 3, 4]).unwrap()));
        assert_eq!(rotated, Literal::Int(Matrix::row(vec![4, 1, 2, 3]).unwrap()));
    }
}
