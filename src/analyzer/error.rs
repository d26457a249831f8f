//! Type-checking errors.

use thiserror::Error;

use crate::ast::{Operator, Type};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypeCheckError {
    #[error("variable '{name}' was not declared in any enclosing scope")]
    UndeclaredVariable { name: String },

    #[error("call to unknown function '{name}'")]
    UnknownFunction { name: String },

    #[error("operator {op} is not defined for operands of type {left} and {right}")]
    MismatchedOperands { op: Operator, left: Type, right: Type },

    #[error("operator {op} is not defined for an operand of type {ty}")]
    InvalidOperand { op: Operator, ty: Type },

    #[error("the condition of a {statement} statement must be bool, got {got}")]
    ConditionNotBool { statement: &'static str, got: Type },

    #[error("cannot assign a value of type {got} to '{name}' declared as {expected}")]
    AssignmentTypeMismatch {
        name: String,
        expected: Type,
        got: Type,
    },

    #[error("expressions in a batched literal must share one type, found {first} and {other}")]
    MixedExpressionList { first: Type, other: Type },

    #[error("an index expression must be int, got {got}")]
    IndexNotInt { got: Type },

    #[error("a rotation amount must be int, got {got}")]
    RotationAmountNotInt { got: Type },

    #[error("return statements of '{function}' disagree on the number of values ({expected} vs. {got})")]
    ReturnArityMismatch {
        function: String,
        expected: usize,
        got: usize,
    },

    #[error("'{function}' returns {got} but is declared to return {expected}")]
    ReturnTypeMismatch {
        function: String,
        expected: Type,
        got: Type,
    },

    #[error("'{function}' returns secret data but its return type is not declared secret")]
    SecretReturnFromPlainFunction { function: String },
}
