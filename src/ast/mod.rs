//! The abstract syntax tree: node variants, datatypes, operators, literals.

mod datatype;
mod literal;
mod nodes;
mod operator;

pub use datatype::{Datatype, Type};
pub use literal::Literal;
pub use nodes::{Block, Expr, ExprKind, Function, FunctionParameter, NodeId, Stmt, StmtKind};
pub use operator::Operator;
