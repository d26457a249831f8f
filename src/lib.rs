//! Cloak - a compiler front end for a batched secret-data language
//!
//! # Overview
//!
//! Cloak compiles a small imperative language with explicit `secret`
//! datatypes into a type-annotated, partially evaluated AST. Values are
//! modeled as rectangular batches of scalars — the parallel slots of one
//! ciphertext — ahead of homomorphic-encryption lowering:
//!
//! 1. [`parse`] turns source text into an AST (recursive descent for
//!    statements, an explicit-stack shunting-yard algorithm for
//!    expressions);
//! 2. [`check`](analyzer::check) infers the datatype and secret-taint of
//!    every expression and variable;
//! 3. [`eval`](evaluator::eval) collapses every compile-time-resolvable
//!    subexpression to a literal, leaving secret-dependent rotations and
//!    transposes unevaluated for the encrypted-domain lowering stage.
//!
//! # Quick Start
//!
//! ```ignore
//! use cloak::{parse, analyzer, evaluator};
//!
//! let program = parse("
//!     int v = {1, 2, 3, 4};
//!     return rotate(v, 1);
//! ").unwrap();
//!
//! let analysis = analyzer::check(&program).unwrap();
//!
//! let results = evaluator::eval(&program, &[]).unwrap();
//! assert_eq!(results[0].to_string(), "[4 1 2 3]");
//! ```
//!
//! # Secret data
//!
//! Declaring a value `secret` taints everything computed from it. The
//! evaluator never forces a secret value: a `rotate(v, secretAmount)` whose
//! amount is unknown at compile time comes back as a deferred residual node
//! instead of a literal, which is exactly what the downstream lowering
//! stage expects to translate into the encrypted-domain op set.

pub mod analyzer;
pub mod ast;
pub mod evaluator;
pub mod matrix;
pub mod parser;
pub mod render;
pub mod scope;

pub use analyzer::{Analysis, TypeCheckError, check};
pub use ast::{Block, Datatype, Expr, ExprKind, Literal, Operator, Stmt, StmtKind, Type};
pub use evaluator::{EvalError, Value, eval};
pub use matrix::{Dimension, Matrix, MatrixError};
pub use parser::{Span, SyntaxError, parse};
