//! The tree-walking partial evaluator.
//!
//! Evaluation is a post-order walk: children first, then the node itself.
//! Compile-time-resolvable subexpressions collapse to literals; a rotate or
//! transpose whose operand is still unknown is returned as a deferred clone
//! of itself for the encrypted-domain lowering stage to pick up. Variables
//! live in a flat identifier→value environment with last-write-wins
//! semantics; immutability is the checker's job, not this layer's.

use std::collections::HashMap;
use std::fmt;

use smallvec::SmallVec;

use crate::ast::{Block, Expr, ExprKind, Function, Literal, Stmt, StmtKind};
use crate::evaluator::error::EvalError;
use crate::evaluator::operators::{apply_binary, apply_unary};
use crate::matrix::Matrix;

/// The outcome of evaluating one expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Fully evaluated to a literal.
    Known(Literal),
    /// Not resolvable at compile time; carries the (renumbered) residual
    /// expression for the lowering stage.
    Deferred(Expr),
}

impl Value {
    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Value::Known(literal) => Some(literal),
            Value::Deferred(_) => None,
        }
    }

    pub fn into_literal(self) -> Option<Literal> {
        match self {
            Value::Known(literal) => Some(literal),
            Value::Deferred(_) => None,
        }
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self, Value::Deferred(_))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Known(literal) => write!(f, "{literal}"),
            Value::Deferred(expr) => write!(f, "{expr}"),
        }
    }
}

/// Control flow out of a statement.
enum Flow {
    Normal,
    Return(SmallVec<[Value; 2]>),
}

/// Evaluate a program against input bindings and produce the values of the
/// last `return` it executes (empty if it never returns).
pub fn eval(program: &Block, inputs: &[(&str, Literal)]) -> Result<Vec<Value>, EvalError> {
    let mut functions = HashMap::new();
    collect_functions(program, &mut functions);
    let env = inputs
        .iter()
        .map(|(name, literal)| (name.to_string(), Some(literal.clone())))
        .collect();
    let mut evaluator = Evaluator {
        functions: &functions,
        env,
    };
    match evaluator.run_block(program)? {
        Flow::Return(values) => Ok(values.into_vec()),
        Flow::Normal => Ok(Vec::new()),
    }
}

fn collect_functions<'a>(block: &'a Block, table: &mut HashMap<String, &'a Function>) {
    for stmt in &block.statements {
        match &stmt.kind {
            StmtKind::Function(function) => {
                table.insert(function.name.clone(), function);
                collect_functions(&function.body, table);
            }
            StmtKind::Block(inner) => collect_functions(inner, table),
            StmtKind::If {
                then_branch,
                else_branch,
                ..
            } => {
                collect_functions(then_branch, table);
                if let Some(else_branch) = else_branch {
                    collect_functions(else_branch, table);
                }
            }
            StmtKind::While { body, .. } | StmtKind::For { body, .. } => {
                collect_functions(body, table);
            }
            _ => {}
        }
    }
}

struct Evaluator<'a> {
    functions: &'a HashMap<String, &'a Function>,
    /// `Some(None)` means declared but unknown, e.g. a secret input.
    env: HashMap<String, Option<Literal>>,
}

impl<'a> Evaluator<'a> {
    fn run_block(&mut self, block: &Block) -> Result<Flow, EvalError> {
        for stmt in &block.statements {
            if let Flow::Return(values) = self.visit_stmt(stmt)? {
                return Ok(Flow::Return(values));
            }
        }
        Ok(Flow::Normal)
    }

    fn visit_stmt(&mut self, stmt: &Stmt) -> Result<Flow, EvalError> {
        match &stmt.kind {
            StmtKind::Block(block) => self.run_block(block),

            StmtKind::VarDecl { name, value, .. } => {
                match value {
                    Some(value) => {
                        let binding = self.eval_expr(value)?.into_literal();
                        self.env.insert(name.clone(), binding);
                    }
                    // a bare declaration introduces the name but keeps any
                    // externally supplied binding (a declared input)
                    None => {
                        self.env.entry(name.clone()).or_insert(None);
                    }
                }
                Ok(Flow::Normal)
            }

            StmtKind::Assign { target, value } => {
                let value = self.eval_expr(value)?;
                self.assign_target(target, value)?;
                Ok(Flow::Normal)
            }

            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.eval_condition(condition, "if")? {
                    self.run_block(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.run_block(else_branch)
                } else {
                    Ok(Flow::Normal)
                }
            }

            StmtKind::While { condition, body } => {
                while self.eval_condition(condition, "while")? {
                    if let Flow::Return(values) = self.run_block(body)? {
                        return Ok(Flow::Return(values));
                    }
                }
                Ok(Flow::Normal)
            }

            StmtKind::For {
                initializer,
                condition,
                update,
                body,
            } => {
                if let Some(initializer) = initializer {
                    self.visit_stmt(initializer)?;
                }
                while self.eval_condition(condition, "for")? {
                    if let Flow::Return(values) = self.run_block(body)? {
                        return Ok(Flow::Return(values));
                    }
                    if let Some(update) = update {
                        self.visit_stmt(update)?;
                    }
                }
                Ok(Flow::Normal)
            }

            StmtKind::Return(expressions) => {
                let mut values = SmallVec::new();
                for expr in expressions {
                    values.push(self.eval_expr(expr)?);
                }
                Ok(Flow::Return(values))
            }

            // declarations only execute through calls
            StmtKind::Function(_) => Ok(Flow::Normal),
        }
    }

    fn eval_condition(
        &mut self,
        condition: &Expr,
        statement: &'static str,
    ) -> Result<bool, EvalError> {
        self.eval_expr(condition)?
            .as_literal()
            .and_then(Literal::as_bool)
            .ok_or(EvalError::ConditionNotBool { statement })
    }

    fn eval_expr(&mut self, expr: &Expr) -> Result<Value, EvalError> {
        match &expr.kind {
            ExprKind::Literal(literal) => Ok(Value::Known(literal.clone())),

            ExprKind::Variable(name) => match self.env.get(name) {
                None => Err(EvalError::UnboundVariable { name: name.clone() }),
                Some(None) => Ok(Value::Deferred(residual(expr))),
                Some(Some(literal)) => Ok(Value::Known(literal.clone())),
            },

            ExprKind::Binary { op, left, right } => {
                let lhs = self.eval_known(left, "a binary expression")?;
                let rhs = self.eval_known(right, "a binary expression")?;
                Ok(Value::Known(apply_binary(*op, lhs, rhs)?))
            }

            ExprKind::Unary { op, operand } => {
                let operand = self.eval_known(operand, "a unary expression")?;
                Ok(Value::Known(apply_unary(*op, operand)?))
            }

            ExprKind::Index { target, index } => {
                let target = self.eval_known(target, "an index access")?;
                let index = self
                    .eval_expr(index)?
                    .as_literal()
                    .and_then(Literal::as_int)
                    .ok_or(EvalError::IndexNotInt)?;
                index_literal(&target, index)
            }

            ExprKind::List(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(self.eval_expr(item)?);
                }
                build_list(items, values)
            }

            ExprKind::Call { function, args } => self.eval_call(function, args),

            ExprKind::Rotate { operand, amount } => {
                let operand = self.eval_expr(operand)?;
                let amount = self.eval_expr(amount)?;
                match (operand, amount) {
                    (Value::Known(literal), Value::Known(amount)) => {
                        let amount = amount.as_int().ok_or(EvalError::RotationAmountNotInt)?;
                        // clone before rotating so callers still referencing
                        // the operand see it unchanged
                        Ok(Value::Known(literal.rotated(amount)?))
                    }
                    _ => {
                        tracing::debug!("deferring rotation with unresolved operand");
                        Ok(Value::Deferred(residual(expr)))
                    }
                }
            }

            ExprKind::Transpose { operand } => match self.eval_expr(operand)? {
                Value::Known(literal) => Ok(Value::Known(literal.transposed())),
                Value::Deferred(_) => {
                    tracing::debug!("deferring transpose with unresolved operand");
                    Ok(Value::Deferred(residual(expr)))
                }
            },
        }
    }

    fn eval_known(&mut self, expr: &Expr, context: &'static str) -> Result<Literal, EvalError> {
        self.eval_expr(expr)?
            .into_literal()
            .ok_or(EvalError::NotALiteral { context })
    }

    fn eval_call(&mut self, name: &str, args: &[Expr]) -> Result<Value, EvalError> {
        let function = *self
            .functions
            .get(name)
            .ok_or_else(|| EvalError::UnknownFunction {
                name: name.to_string(),
            })?;
        if args.len() != function.parameters.len() {
            return Err(EvalError::ArgumentCountMismatch {
                function: name.to_string(),
                expected: function.parameters.len(),
                got: args.len(),
            });
        }

        // evaluate and validate every argument before executing any body
        // statement
        let mut bindings = HashMap::new();
        for (position, (arg, parameter)) in args.iter().zip(&function.parameters).enumerate() {
            let literal = self.eval_known(arg, "a call argument")?;
            if literal.ty() != parameter.datatype.ty() {
                return Err(EvalError::ArgumentTypeMismatch {
                    function: name.to_string(),
                    position,
                    expected: parameter.datatype.ty(),
                    got: literal.ty(),
                });
            }
            bindings.insert(parameter.name.clone(), Some(literal));
        }

        tracing::trace!(function = %name, "dispatching call");
        // the callee runs in a fresh environment sharing only the function
        // table
        let mut callee = Evaluator {
            functions: self.functions,
            env: bindings,
        };
        match callee.run_block(&function.body)? {
            Flow::Return(mut values) => match values.len() {
                1 => Ok(values.remove(0)),
                0 => Err(EvalError::VoidResult {
                    function: name.to_string(),
                }),
                got => Err(EvalError::MultipleResults {
                    function: name.to_string(),
                    got,
                }),
            },
            Flow::Normal => Err(EvalError::VoidResult {
                function: name.to_string(),
            }),
        }
    }

    fn assign_target(&mut self, target: &Expr, value: Value) -> Result<(), EvalError> {
        match &target.kind {
            ExprKind::Variable(name) => {
                // rebind unconditionally: last write wins
                self.env.insert(name.clone(), value.into_literal());
                Ok(())
            }
            ExprKind::Index { .. } => {
                let (name, indices) = self.flatten_index_target(target)?;
                let literal = value
                    .into_literal()
                    .ok_or(EvalError::NotALiteral { context: "an element assignment" })?;
                let slot = self
                    .env
                    .get_mut(&name)
                    .ok_or_else(|| EvalError::UnboundVariable { name: name.clone() })?;
                let batch = slot
                    .as_mut()
                    .ok_or(EvalError::NotALiteral { context: "an element assignment target" })?;
                match indices.as_slice() {
                    &[index] => set_vector_element(batch, index, literal),
                    &[row, col] => set_matrix_element(batch, row, col, literal),
                    _ => Err(EvalError::InvalidAssignmentTarget),
                }
            }
            _ => Err(EvalError::InvalidAssignmentTarget),
        }
    }

    /// Peel nested index accesses down to the base variable, evaluating the
    /// index expressions outermost-last.
    fn flatten_index_target(&mut self, target: &Expr) -> Result<(String, Vec<i64>), EvalError> {
        match &target.kind {
            ExprKind::Variable(name) => Ok((name.clone(), Vec::new())),
            ExprKind::Index { target: inner, index } => {
                let (name, mut indices) = self.flatten_index_target(inner)?;
                let index = self
                    .eval_expr(index)?
                    .as_literal()
                    .and_then(Literal::as_int)
                    .ok_or(EvalError::IndexNotInt)?;
                indices.push(index);
                Ok((name, indices))
            }
            _ => Err(EvalError::InvalidAssignmentTarget),
        }
    }
}

/// A renumbered clone of an unresolved node, handed to the lowering stage.
fn residual(expr: &Expr) -> Expr {
    let mut clone = expr.clone();
    clone.regenerate_ids();
    clone
}

fn checked_index(index: i64, extent: usize) -> Result<usize, EvalError> {
    usize::try_from(index)
        .ok()
        .filter(|&i| i < extent)
        .ok_or(EvalError::IndexOutOfBounds { index, extent })
}

/// Read `batch[index]`: an element of a row or column vector, or a whole row
/// of a two-dimensional batch. Elements of a symbolic int batch come back as
/// deferred expressions.
fn index_literal(batch: &Literal, index: i64) -> Result<Value, EvalError> {
    enum Picked<T> {
        Element(T),
        Row(Vec<T>),
    }

    fn pick<T: Clone>(m: &Matrix<T>, index: i64) -> Result<Picked<T>, EvalError> {
        let dim = m.dim();
        if dim.rows == 1 {
            let i = checked_index(index, dim.cols)?;
            Ok(Picked::Element(m.get(0, i)?.clone()))
        } else if dim.cols == 1 {
            let i = checked_index(index, dim.rows)?;
            Ok(Picked::Element(m.get(i, 0)?.clone()))
        } else {
            let i = checked_index(index, dim.rows)?;
            Ok(Picked::Row(m.row_values(i)?.to_vec()))
        }
    }

    let value = match batch {
        Literal::Bool(m) => match pick(m, index)? {
            Picked::Element(v) => Value::Known(Literal::bool(v)),
            Picked::Row(row) => Value::Known(Literal::Bool(Matrix::row(row)?)),
        },
        Literal::Char(m) => match pick(m, index)? {
            Picked::Element(v) => Value::Known(Literal::char(v)),
            Picked::Row(row) => Value::Known(Literal::Char(Matrix::row(row)?)),
        },
        Literal::Int(m) => match pick(m, index)? {
            Picked::Element(v) => Value::Known(Literal::int(v)),
            Picked::Row(row) => Value::Known(Literal::Int(Matrix::row(row)?)),
        },
        Literal::SymbolicInt(m) => match pick(m, index)? {
            Picked::Element(expr) => Value::Deferred(residual(&expr)),
            Picked::Row(row) => Value::Known(Literal::SymbolicInt(Matrix::row(row)?)),
        },
        Literal::Float(m) => match pick(m, index)? {
            Picked::Element(v) => Value::Known(Literal::float(v)),
            Picked::Row(row) => Value::Known(Literal::Float(Matrix::row(row)?)),
        },
        Literal::Double(m) => match pick(m, index)? {
            Picked::Element(v) => Value::Known(Literal::double(v)),
            Picked::Row(row) => Value::Known(Literal::Double(Matrix::row(row)?)),
        },
        Literal::Str(m) => match pick(m, index)? {
            Picked::Element(v) => Value::Known(Literal::string(v)),
            Picked::Row(row) => Value::Known(Literal::Str(Matrix::row(row)?)),
        },
    };
    Ok(value)
}

/// Write one scalar element of a vector-shaped batch.
fn set_vector_element(batch: &mut Literal, index: i64, value: Literal) -> Result<(), EvalError> {
    fn locate<T: Clone>(m: &Matrix<T>, index: i64) -> Result<(usize, usize), EvalError> {
        let dim = m.dim();
        if dim.rows == 1 {
            Ok((0, checked_index(index, dim.cols)?))
        } else if dim.cols == 1 {
            Ok((checked_index(index, dim.rows)?, 0))
        } else {
            Err(EvalError::InvalidAssignmentTarget)
        }
    }

    match (batch, value) {
        (Literal::Bool(m), Literal::Bool(v)) if v.is_scalar() => {
            let (r, c) = locate(m, index)?;
            set_scalar(m, r, c, v)
        }
        (Literal::Char(m), Literal::Char(v)) if v.is_scalar() => {
            let (r, c) = locate(m, index)?;
            set_scalar(m, r, c, v)
        }
        (Literal::Int(m), Literal::Int(v)) if v.is_scalar() => {
            let (r, c) = locate(m, index)?;
            set_scalar(m, r, c, v)
        }
        (Literal::Float(m), Literal::Float(v)) if v.is_scalar() => {
            let (r, c) = locate(m, index)?;
            set_scalar(m, r, c, v)
        }
        (Literal::Double(m), Literal::Double(v)) if v.is_scalar() => {
            let (r, c) = locate(m, index)?;
            set_scalar(m, r, c, v)
        }
        (Literal::Str(m), Literal::Str(v)) if v.is_scalar() => {
            let (r, c) = locate(m, index)?;
            set_scalar(m, r, c, v)
        }
        (batch, value) => Err(EvalError::ElementTypeMismatch {
            expected: batch.ty(),
            got: value.ty(),
        }),
    }
}

/// Write one scalar element of a two-dimensional batch.
fn set_matrix_element(
    batch: &mut Literal,
    row: i64,
    col: i64,
    value: Literal,
) -> Result<(), EvalError> {
    fn locate<T: Clone>(m: &Matrix<T>, row: i64, col: i64) -> Result<(usize, usize), EvalError> {
        let dim = m.dim();
        Ok((checked_index(row, dim.rows)?, checked_index(col, dim.cols)?))
    }

    match (batch, value) {
        (Literal::Bool(m), Literal::Bool(v)) if v.is_scalar() => {
            let (r, c) = locate(m, row, col)?;
            set_scalar(m, r, c, v)
        }
        (Literal::Char(m), Literal::Char(v)) if v.is_scalar() => {
            let (r, c) = locate(m, row, col)?;
            set_scalar(m, r, c, v)
        }
        (Literal::Int(m), Literal::Int(v)) if v.is_scalar() => {
            let (r, c) = locate(m, row, col)?;
            set_scalar(m, r, c, v)
        }
        (Literal::Float(m), Literal::Float(v)) if v.is_scalar() => {
            let (r, c) = locate(m, row, col)?;
            set_scalar(m, r, c, v)
        }
        (Literal::Double(m), Literal::Double(v)) if v.is_scalar() => {
            let (r, c) = locate(m, row, col)?;
            set_scalar(m, r, c, v)
        }
        (Literal::Str(m), Literal::Str(v)) if v.is_scalar() => {
            let (r, c) = locate(m, row, col)?;
            set_scalar(m, r, c, v)
        }
        (batch, value) => Err(EvalError::ElementTypeMismatch {
            expected: batch.ty(),
            got: value.ty(),
        }),
    }
}

fn set_scalar<T: Clone>(
    m: &mut Matrix<T>,
    row: usize,
    col: usize,
    value: Matrix<T>,
) -> Result<(), EvalError> {
    let value = value
        .scalar_value()
        .cloned()
        .ok_or(EvalError::InvalidAssignmentTarget)?;
    m.set(row, col, value)?;
    Ok(())
}

/// Turn evaluated list elements into a batched literal: a row vector of
/// scalars, a stack of equal-width rows, or — when an int-typed element is
/// still unresolved — a symbolic int batch over the original expressions.
fn build_list(items: &[Expr], values: Vec<Value>) -> Result<Value, EvalError> {
    if values.iter().any(Value::is_deferred) {
        let exprs = items.iter().map(residual).collect();
        return Ok(Value::Known(Literal::SymbolicInt(Matrix::row(exprs)?)));
    }

    let mut literals = Vec::with_capacity(values.len());
    for value in values {
        match value.into_literal() {
            Some(literal) => literals.push(literal),
            None => return Err(EvalError::MalformedList),
        }
    }
    let Some(first) = literals.first() else {
        return Err(EvalError::MalformedList);
    };

    macro_rules! combine {
        ($variant:path) => {{
            let mut matrices = Vec::with_capacity(literals.len());
            for literal in &literals {
                match literal {
                    $variant(m) => matrices.push(m),
                    _ => return Err(EvalError::MalformedList),
                }
            }
            Ok(Value::Known($variant(combine_matrices(matrices)?)))
        }};
    }

    match first {
        Literal::Bool(_) => combine!(Literal::Bool),
        Literal::Char(_) => combine!(Literal::Char),
        Literal::Int(_) => combine!(Literal::Int),
        Literal::SymbolicInt(_) => combine!(Literal::SymbolicInt),
        Literal::Float(_) => combine!(Literal::Float),
        Literal::Double(_) => combine!(Literal::Double),
        Literal::Str(_) => combine!(Literal::Str),
    }
}

/// Scalars line up into a (1,N) row; (1,N) rows of equal width stack into an
/// (M,N) batch.
fn combine_matrices<T: Clone>(matrices: Vec<&Matrix<T>>) -> Result<Matrix<T>, EvalError> {
    let mut scalars = Vec::with_capacity(matrices.len());
    for m in &matrices {
        match m.scalar_value() {
            Some(value) => scalars.push(value.clone()),
            None => break,
        }
    }
    if scalars.len() == matrices.len() {
        return Ok(Matrix::row(scalars)?);
    }

    let mut rows = Vec::with_capacity(matrices.len());
    for m in &matrices {
        if m.dim().rows != 1 {
            return Err(EvalError::MalformedList);
        }
        rows.push(m.row_values(0)?.to_vec());
    }
    Matrix::from_rows(rows).map_err(|_| EvalError::MalformedList)
}
