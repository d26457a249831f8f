//! AST node model.
//!
//! Trees are built from a closed set of node variants. Every node carries a
//! process-unique id and exclusively owns its children; there are no shared
//! nodes and no back edges. Cloning a subtree keeps the source ids — call
//! [`Expr::regenerate_ids`] when a clone is inserted next to its original so
//! ids stay unique within a tree.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::ast::datatype::Datatype;
use crate::ast::literal::Literal;
use crate::ast::operator::Operator;

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of one AST node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u64);

impl NodeId {
    pub fn fresh() -> Self {
        NodeId(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// An expression node.
///
/// Equality is structural and ignores node ids, so parsed and hand-built
/// trees compare by shape.
#[derive(Debug, Clone)]
pub struct Expr {
    pub id: NodeId,
    pub kind: ExprKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Variable(String),
    Literal(Literal),
    Binary {
        op: Operator,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: Operator,
        operand: Box<Expr>,
    },
    Index {
        target: Box<Expr>,
        index: Box<Expr>,
    },
    List(Vec<Expr>),
    Call {
        function: String,
        args: Vec<Expr>,
    },
    Rotate {
        operand: Box<Expr>,
        amount: Box<Expr>,
    },
    Transpose {
        operand: Box<Expr>,
    },
}

impl Expr {
    pub fn new(kind: ExprKind) -> Self {
        Self {
            id: NodeId::fresh(),
            kind,
        }
    }

    pub fn variable(name: impl Into<String>) -> Self {
        Self::new(ExprKind::Variable(name.into()))
    }

    pub fn literal(literal: Literal) -> Self {
        Self::new(ExprKind::Literal(literal))
    }

    pub fn binary(op: Operator, left: Expr, right: Expr) -> Self {
        Self::new(ExprKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    pub fn unary(op: Operator, operand: Expr) -> Self {
        Self::new(ExprKind::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    pub fn index(target: Expr, index: Expr) -> Self {
        Self::new(ExprKind::Index {
            target: Box::new(target),
            index: Box::new(index),
        })
    }

    pub fn list(items: Vec<Expr>) -> Self {
        Self::new(ExprKind::List(items))
    }

    pub fn call(function: impl Into<String>, args: Vec<Expr>) -> Self {
        Self::new(ExprKind::Call {
            function: function.into(),
            args,
        })
    }

    pub fn rotate(operand: Expr, amount: Expr) -> Self {
        Self::new(ExprKind::Rotate {
            operand: Box::new(operand),
            amount: Box::new(amount),
        })
    }

    pub fn transpose(operand: Expr) -> Self {
        Self::new(ExprKind::Transpose {
            operand: Box::new(operand),
        })
    }

    /// Assign fresh ids to this node and all of its descendants.
    pub fn regenerate_ids(&mut self) {
        self.id = NodeId::fresh();
        match &mut self.kind {
            ExprKind::Variable(_) => {}
            ExprKind::Literal(literal) => {
                if let Literal::SymbolicInt(matrix) = literal {
                    for element in matrix.iter_mut() {
                        element.regenerate_ids();
                    }
                }
            }
            ExprKind::Binary { left, right, .. } => {
                left.regenerate_ids();
                right.regenerate_ids();
            }
            ExprKind::Unary { operand, .. } => operand.regenerate_ids(),
            ExprKind::Index { target, index } => {
                target.regenerate_ids();
                index.regenerate_ids();
            }
            ExprKind::List(items) => {
                for item in items {
                    item.regenerate_ids();
                }
            }
            ExprKind::Call { args, .. } => {
                for arg in args {
                    arg.regenerate_ids();
                }
            }
            ExprKind::Rotate { operand, amount } => {
                operand.regenerate_ids();
                amount.regenerate_ids();
            }
            ExprKind::Transpose { operand } => operand.regenerate_ids(),
        }
    }
}

impl PartialEq for Expr {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExprKind::Variable(name) => write!(f, "{name}"),
            ExprKind::Literal(literal) => write!(f, "{literal}"),
            ExprKind::Binary { op, left, right } => write!(f, "({left} {op} {right})"),
            ExprKind::Unary { op, operand } => write!(f, "{op}{operand}"),
            ExprKind::Index { target, index } => write!(f, "{target}[{index}]"),
            ExprKind::List(items) => {
                write!(f, "{{")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "}}")
            }
            ExprKind::Call { function, args } => {
                write!(f, "{function}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
            ExprKind::Rotate { operand, amount } => write!(f, "rotate({operand}, {amount})"),
            ExprKind::Transpose { operand } => write!(f, "transpose({operand})"),
        }
    }
}

/// A statement node.
#[derive(Debug, Clone)]
pub struct Stmt {
    pub id: NodeId,
    pub kind: StmtKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    Block(Block),
    VarDecl {
        datatype: Datatype,
        name: String,
        value: Option<Expr>,
    },
    Assign {
        target: Expr,
        value: Expr,
    },
    If {
        condition: Expr,
        then_branch: Block,
        else_branch: Option<Block>,
    },
    While {
        condition: Expr,
        body: Block,
    },
    For {
        initializer: Option<Box<Stmt>>,
        condition: Expr,
        update: Option<Box<Stmt>>,
        body: Block,
    },
    Return(Vec<Expr>),
    Function(Function),
}

impl Stmt {
    pub fn new(kind: StmtKind) -> Self {
        Self {
            id: NodeId::fresh(),
            kind,
        }
    }
}

impl PartialEq for Stmt {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

/// An ordered sequence of statements forming its own scope.
#[derive(Debug, Clone)]
pub struct Block {
    pub id: NodeId,
    pub statements: Vec<Stmt>,
}

impl Block {
    pub fn new(statements: Vec<Stmt>) -> Self {
        Self {
            id: NodeId::fresh(),
            statements,
        }
    }
}

impl PartialEq for Block {
    fn eq(&self, other: &Self) -> bool {
        self.statements == other.statements
    }
}

/// A function declaration: `public <type> <name>(<params>) { ... }`.
#[derive(Debug, Clone)]
pub struct Function {
    pub id: NodeId,
    pub return_type: Datatype,
    pub name: String,
    pub parameters: Vec<FunctionParameter>,
    pub body: Block,
}

impl Function {
    pub fn new(
        return_type: Datatype,
        name: impl Into<String>,
        parameters: Vec<FunctionParameter>,
        body: Block,
    ) -> Self {
        Self {
            id: NodeId::fresh(),
            return_type,
            name: name.into(),
            parameters,
            body,
        }
    }
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        self.return_type == other.return_type
            && self.name == other.name
            && self.parameters == other.parameters
            && self.body == other.body
    }
}

/// A parameter binding a datatype to an identifier.
#[derive(Debug, Clone)]
pub struct FunctionParameter {
    pub id: NodeId,
    pub datatype: Datatype,
    pub name: String,
}

impl FunctionParameter {
    pub fn new(datatype: Datatype, name: impl Into<String>) -> Self {
        Self {
            id: NodeId::fresh(),
            datatype,
            name: name.into(),
        }
    }
}

impl PartialEq for FunctionParameter {
    fn eq(&self, other: &Self) -> bool {
        self.datatype == other.datatype && self.name == other.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Operator;

    #[test]
    fn test_node_ids_are_unique() {
        let a = Expr::literal(Literal::int(1));
        let b = Expr::literal(Literal::int(1));
        assert_ne!(a.id, b.id);
        assert_eq!(a, b); // structural equality ignores ids
    }

    #[test]
    fn test_clone_keeps_ids_until_regenerated() {
        let original = Expr::binary(
            Operator::Add,
            Expr::variable("x"),
            Expr::literal(Literal::int(1)),
        );
        let mut clone = original.clone();
        assert_eq!(clone.id, original.id);
        clone.regenerate_ids();
        assert_ne!(clone.id, original.id);
        assert_eq!(clone, original);
    }

    #[test]
    fn test_display() {
        let expr = Expr::binary(
            Operator::Mul,
            Expr::binary(
                Operator::Add,
                Expr::literal(Literal::int(2)),
                Expr::literal(Literal::int(3)),
            ),
            Expr::literal(Literal::int(4)),
        );
        assert_eq!(expr.to_string(), "((2 + 3) * 4)");

        let rot = Expr::rotate(Expr::variable("v"), Expr::variable("n"));
        assert_eq!(rot.to_string(), "rotate(v, n)");
    }
}
