//! Tree-walking partial evaluation of checked programs.
//!
//! Everything that does not depend on secret input collapses to a literal;
//! rotate/transpose over still-unknown operands come back as deferred
//! residual nodes for the encrypted-domain lowering stage.

mod error;
mod eval;
mod operators;

pub use error::EvalError;
pub use eval::{Value, eval};

#[cfg(test)]
mod eval_test;
