//! Evaluation errors.
//!
//! Everything here is fatal: a failing statement aborts the whole
//! evaluation. The one non-error "soft" path — rotate/transpose on operands
//! that are not yet resolvable — never reaches this module; it produces a
//! deferred value instead.

use thiserror::Error;

use crate::ast::{Operator, Type};
use crate::matrix::MatrixError;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EvalError {
    #[error("no value bound for variable '{name}'")]
    UnboundVariable { name: String },

    #[error("call to unknown function '{name}'")]
    UnknownFunction { name: String },

    #[error("function '{function}' expects {expected} arguments but was called with {got}")]
    ArgumentCountMismatch {
        function: String,
        expected: usize,
        got: usize,
    },

    #[error(
        "argument {position} of the call to '{function}' has type {got} \
         but the parameter is declared {expected}"
    )]
    ArgumentTypeMismatch {
        function: String,
        position: usize,
        expected: Type,
        got: Type,
    },

    #[error("the condition of a {statement} statement must evaluate to a boolean scalar")]
    ConditionNotBool { statement: &'static str },

    #[error("operand of {context} did not evaluate to a literal")]
    NotALiteral { context: &'static str },

    #[error("operator {op} is not defined for values of type {left} and {right}")]
    UndefinedOperation { op: Operator, left: Type, right: Type },

    #[error("operator {op} is not defined for a value of type {ty}")]
    UndefinedUnaryOperation { op: Operator, ty: Type },

    #[error("division by zero")]
    DivisionByZero,

    #[error("rotation amount must evaluate to an integer scalar")]
    RotationAmountNotInt,

    #[error("index must evaluate to an integer scalar")]
    IndexNotInt,

    #[error("index {index} is out of bounds for extent {extent}")]
    IndexOutOfBounds { index: i64, extent: usize },

    #[error("expressions in a batched literal must be scalars or rows of one shared type")]
    MalformedList,

    #[error("invalid assignment target")]
    InvalidAssignmentTarget,

    #[error("cannot assign a value of type {got} to an element of a {expected} batch")]
    ElementTypeMismatch { expected: Type, got: Type },

    #[error("call to '{function}' produced no value in an expression context")]
    VoidResult { function: String },

    #[error("call to '{function}' produced {got} values in a single-value context")]
    MultipleResults { function: String, got: usize },

    #[error(transparent)]
    Matrix(#[from] MatrixError),
}
