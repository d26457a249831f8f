//! Bottom-up datatype inference and secret-taint propagation.
//!
//! A single post-order traversal resolves a [`Datatype`] for every
//! expression node and a taint flag for every node that can carry one.
//! Variables live in tables keyed by [`ScopedIdentifier`], so shadowed
//! names in nested blocks resolve independently. Literals are never secret;
//! everything that combines values ORs the secrecy of its children.

use std::collections::HashMap;

use crate::analyzer::error::TypeCheckError;
use crate::ast::{
    Block, Datatype, Expr, ExprKind, Function, NodeId, Operator, Stmt, StmtKind, Type,
};
use crate::scope::{ScopeStack, ScopedIdentifier};

/// The checker's output: per-node datatypes and taint, and the variable
/// tables accumulated while walking the tree.
#[derive(Debug, Default)]
pub struct Analysis {
    expression_types: HashMap<NodeId, Datatype>,
    secret_tainted: HashMap<NodeId, bool>,
    variable_types: HashMap<ScopedIdentifier, Datatype>,
}

impl Analysis {
    pub fn expression_type(&self, id: NodeId) -> Option<Datatype> {
        self.expression_types.get(&id).copied()
    }

    pub fn is_secret_tainted(&self, id: NodeId) -> bool {
        self.secret_tainted.get(&id).copied().unwrap_or(false)
    }

    pub fn variable_type(&self, id: &ScopedIdentifier) -> Option<Datatype> {
        self.variable_types.get(id).copied()
    }

    /// The recorded datatype of the first variable with this name, in no
    /// particular scope order. Convenient for tests and diagnostics on
    /// programs without shadowing.
    pub fn variable_type_by_name(&self, name: &str) -> Option<Datatype> {
        self.variable_types
            .iter()
            .find(|(key, _)| key.name == name)
            .map(|(_, dt)| *dt)
    }
}

/// Type-check a program, annotating every expression node.
pub fn check(program: &Block) -> Result<Analysis, TypeCheckError> {
    let mut checker = TypeChecker::new();
    checker.collect_functions(program);
    checker.check_block_statements(program)?;
    Ok(checker.analysis)
}

struct CurrentFunction {
    name: String,
    declared: Datatype,
    return_arity: Option<usize>,
    tainted: bool,
}

struct TypeChecker<'ast> {
    scopes: ScopeStack,
    analysis: Analysis,
    functions: HashMap<String, &'ast Function>,
    /// Body taint of every function already checked.
    function_taint: HashMap<String, bool>,
    current_function: Option<CurrentFunction>,
}

impl<'ast> TypeChecker<'ast> {
    fn new() -> Self {
        Self {
            scopes: ScopeStack::new(),
            analysis: Analysis::default(),
            functions: HashMap::new(),
            function_taint: HashMap::new(),
            current_function: None,
        }
    }

    /// Register every function signature up front so calls can resolve
    /// forward references during the single checking traversal.
    fn collect_functions(&mut self, block: &'ast Block) {
        for stmt in &block.statements {
            match &stmt.kind {
                StmtKind::Function(function) => {
                    self.functions.insert(function.name.clone(), function);
                    self.collect_functions(&function.body);
                }
                StmtKind::Block(inner) => self.collect_functions(inner),
                StmtKind::If {
                    then_branch,
                    else_branch,
                    ..
                } => {
                    self.collect_functions(then_branch);
                    if let Some(else_branch) = else_branch {
                        self.collect_functions(else_branch);
                    }
                }
                StmtKind::While { body, .. } | StmtKind::For { body, .. } => {
                    self.collect_functions(body);
                }
                _ => {}
            }
        }
    }

    fn check_block(&mut self, block: &Block) -> Result<(), TypeCheckError> {
        self.scopes.enter();
        let result = self.check_block_statements(block);
        self.scopes.exit();
        result
    }

    fn check_block_statements(&mut self, block: &Block) -> Result<(), TypeCheckError> {
        for stmt in &block.statements {
            self.check_stmt(stmt)?;
        }
        Ok(())
    }

    fn check_stmt(&mut self, stmt: &Stmt) -> Result<(), TypeCheckError> {
        match &stmt.kind {
            StmtKind::Block(block) => self.check_block(block),

            StmtKind::VarDecl {
                datatype,
                name,
                value,
            } => {
                let mut secret = datatype.is_secret();
                if let Some(value) = value {
                    let value_type = self.check_expr(value)?;
                    if !value_type.ty().widens_to(datatype.ty()) {
                        return Err(TypeCheckError::AssignmentTypeMismatch {
                            name: name.clone(),
                            expected: datatype.ty(),
                            got: value_type.ty(),
                        });
                    }
                    secret = secret || value_type.is_secret();
                }
                let recorded = Datatype::new(datatype.ty(), secret);
                tracing::debug!(name = %name, datatype = %recorded, "declared variable");
                self.analysis
                    .variable_types
                    .insert(self.scopes.key(name), recorded);
                self.analysis.secret_tainted.insert(stmt.id, secret);
                Ok(())
            }

            StmtKind::Assign { target, value } => {
                let value_type = self.check_expr(value)?;
                let (key, declared) = self.check_target(target)?;
                if !value_type.ty().widens_to(declared.ty()) {
                    return Err(TypeCheckError::AssignmentTypeMismatch {
                        name: key.name.clone(),
                        expected: declared.ty(),
                        got: value_type.ty(),
                    });
                }
                // assignment taints the target with the value's secrecy
                let updated = declared.with_secrecy(value_type.is_secret());
                if updated != declared {
                    tracing::debug!(name = %key.name, "variable became secret-tainted");
                }
                self.analysis.variable_types.insert(key, updated);
                self.analysis
                    .secret_tainted
                    .insert(stmt.id, value_type.is_secret());
                Ok(())
            }

            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.check_condition(condition, "if")?;
                self.check_block(then_branch)?;
                if let Some(else_branch) = else_branch {
                    self.check_block(else_branch)?;
                }
                Ok(())
            }

            StmtKind::While { condition, body } => {
                self.check_condition(condition, "while")?;
                self.check_block(body)
            }

            StmtKind::For {
                initializer,
                condition,
                update,
                body,
            } => {
                // the loop header forms its own scope around the body
                self.scopes.enter();
                let result = (|| {
                    if let Some(initializer) = initializer {
                        self.check_stmt(initializer)?;
                    }
                    self.check_condition(condition, "for")?;
                    if let Some(update) = update {
                        self.check_stmt(update)?;
                    }
                    self.check_block(body)
                })();
                self.scopes.exit();
                result
            }

            StmtKind::Return(expressions) => {
                let mut types = Vec::with_capacity(expressions.len());
                for expr in expressions {
                    types.push(self.check_expr(expr)?);
                }
                let secret = types.iter().any(Datatype::is_secret);
                self.analysis.secret_tainted.insert(stmt.id, secret);
                if let Some(current) = self.current_function.as_mut() {
                    match current.return_arity {
                        Some(expected) if expected != types.len() => {
                            return Err(TypeCheckError::ReturnArityMismatch {
                                function: current.name.clone(),
                                expected,
                                got: types.len(),
                            });
                        }
                        Some(_) => {}
                        None => current.return_arity = Some(types.len()),
                    }
                    for dt in &types {
                        if dt.ty() != current.declared.ty() {
                            return Err(TypeCheckError::ReturnTypeMismatch {
                                function: current.name.clone(),
                                expected: current.declared.ty(),
                                got: dt.ty(),
                            });
                        }
                    }
                    if secret && !current.declared.is_secret() {
                        return Err(TypeCheckError::SecretReturnFromPlainFunction {
                            function: current.name.clone(),
                        });
                    }
                    current.tainted = current.tainted || secret;
                }
                Ok(())
            }

            StmtKind::Function(function) => self.check_function(function),
        }
    }

    fn check_function(&mut self, function: &Function) -> Result<(), TypeCheckError> {
        self.scopes.enter();
        for parameter in &function.parameters {
            self.analysis
                .variable_types
                .insert(self.scopes.key(&parameter.name), parameter.datatype);
            self.analysis
                .secret_tainted
                .insert(parameter.id, parameter.datatype.is_secret());
        }
        let previous = self.current_function.replace(CurrentFunction {
            name: function.name.clone(),
            declared: function.return_type,
            return_arity: None,
            tainted: false,
        });
        let result = self.check_block(&function.body);
        let finished = self.current_function.take();
        self.current_function = previous;
        self.scopes.exit();
        if let Some(finished) = finished {
            self.function_taint
                .insert(function.name.clone(), finished.tainted);
        }
        result
    }

    fn check_condition(
        &mut self,
        condition: &Expr,
        statement: &'static str,
    ) -> Result<(), TypeCheckError> {
        let dt = self.check_expr(condition)?;
        if dt.ty() != Type::Bool {
            return Err(TypeCheckError::ConditionNotBool {
                statement,
                got: dt.ty(),
            });
        }
        Ok(())
    }

    /// Resolve an assignment target (a variable, possibly behind nested
    /// index accesses) to its declared datatype, checking index expressions
    /// along the way.
    fn check_target(
        &mut self,
        target: &Expr,
    ) -> Result<(ScopedIdentifier, Datatype), TypeCheckError> {
        match &target.kind {
            ExprKind::Variable(name) => {
                let (key, dt) = self
                    .scopes
                    .resolve(&self.analysis.variable_types, name)
                    .map(|(key, dt)| (key, *dt))
                    .ok_or_else(|| TypeCheckError::UndeclaredVariable { name: name.clone() })?;
                self.analysis.expression_types.insert(target.id, dt);
                self.analysis
                    .secret_tainted
                    .insert(target.id, dt.is_secret());
                Ok((key, dt))
            }
            ExprKind::Index { target: inner, index } => {
                let index_type = self.check_expr(index)?;
                if index_type.ty() != Type::Int {
                    return Err(TypeCheckError::IndexNotInt {
                        got: index_type.ty(),
                    });
                }
                let (key, dt) = self.check_target(inner)?;
                self.analysis.expression_types.insert(target.id, dt);
                self.analysis
                    .secret_tainted
                    .insert(target.id, dt.is_secret());
                Ok((key, dt))
            }
            _ => {
                // the parser only produces variables and index accesses as
                // targets; treat anything else as an undeclared name
                Err(TypeCheckError::UndeclaredVariable {
                    name: target.to_string(),
                })
            }
        }
    }

    fn check_expr(&mut self, expr: &Expr) -> Result<Datatype, TypeCheckError> {
        let dt = self.infer_expr(expr)?;
        self.analysis.expression_types.insert(expr.id, dt);
        self.analysis.secret_tainted.insert(expr.id, dt.is_secret());
        Ok(dt)
    }

    fn infer_expr(&mut self, expr: &Expr) -> Result<Datatype, TypeCheckError> {
        match &expr.kind {
            // literals are never secret
            ExprKind::Literal(literal) => Ok(Datatype::plain(literal.ty())),

            ExprKind::Variable(name) => self
                .scopes
                .resolve(&self.analysis.variable_types, name)
                .map(|(_, dt)| *dt)
                .ok_or_else(|| TypeCheckError::UndeclaredVariable { name: name.clone() }),

            ExprKind::Binary { op, left, right } => {
                let lt = self.check_expr(left)?;
                let rt = self.check_expr(right)?;
                self.binary_result(*op, lt, rt)
            }

            ExprKind::Unary { op, operand } => {
                let dt = self.check_expr(operand)?;
                match op {
                    Operator::LogicalNot if dt.ty() == Type::Bool => Ok(dt),
                    Operator::BitwiseNot if dt.ty() == Type::Int => Ok(dt),
                    _ => Err(TypeCheckError::InvalidOperand { op: *op, ty: dt.ty() }),
                }
            }

            ExprKind::Index { target, index } => {
                let target_type = self.check_expr(target)?;
                let index_type = self.check_expr(index)?;
                if index_type.ty() != Type::Int {
                    return Err(TypeCheckError::IndexNotInt {
                        got: index_type.ty(),
                    });
                }
                // an element of a batch keeps the batch's type and secrecy
                Ok(target_type)
            }

            ExprKind::List(items) => {
                let mut iter = items.iter();
                let first = match iter.next() {
                    Some(first) => self.check_expr(first)?,
                    None => return Ok(Datatype::plain(Type::Void)),
                };
                let mut secret = first.is_secret();
                for item in iter {
                    let dt = self.check_expr(item)?;
                    if dt.ty() != first.ty() {
                        return Err(TypeCheckError::MixedExpressionList {
                            first: first.ty(),
                            other: dt.ty(),
                        });
                    }
                    secret = secret || dt.is_secret();
                }
                Ok(Datatype::new(first.ty(), secret))
            }

            ExprKind::Call { function, args } => {
                let mut secret = false;
                for arg in args {
                    secret = secret || self.check_expr(arg)?.is_secret();
                }
                let declared = self
                    .functions
                    .get(function)
                    .map(|f| f.return_type)
                    .ok_or_else(|| TypeCheckError::UnknownFunction {
                        name: function.clone(),
                    })?;
                let body_taint = self.function_taint.get(function).copied().unwrap_or(false);
                Ok(declared.with_secrecy(secret || body_taint))
            }

            ExprKind::Rotate { operand, amount } => {
                let operand_type = self.check_expr(operand)?;
                let amount_type = self.check_expr(amount)?;
                if amount_type.ty() != Type::Int {
                    return Err(TypeCheckError::RotationAmountNotInt {
                        got: amount_type.ty(),
                    });
                }
                Ok(operand_type.with_secrecy(amount_type.is_secret()))
            }

            ExprKind::Transpose { operand } => self.check_expr(operand),
        }
    }

    fn binary_result(
        &self,
        op: Operator,
        lt: Datatype,
        rt: Datatype,
    ) -> Result<Datatype, TypeCheckError> {
        let secret = lt.is_secret() || rt.is_secret();
        let mismatch = || TypeCheckError::MismatchedOperands {
            op,
            left: lt.ty(),
            right: rt.ty(),
        };
        if op.is_arithmetic() {
            let wide = Type::widen(lt.ty(), rt.ty()).ok_or_else(mismatch)?;
            // char arithmetic promotes to int, C-style
            let wide = if wide == Type::Char { Type::Int } else { wide };
            Ok(Datatype::new(wide, secret))
        } else if op.is_bitwise() {
            if lt.ty() == Type::Int && rt.ty() == Type::Int {
                Ok(Datatype::new(Type::Int, secret))
            } else {
                Err(mismatch())
            }
        } else if op.is_logical() {
            if lt.ty() == Type::Bool && rt.ty() == Type::Bool {
                Ok(Datatype::new(Type::Bool, secret))
            } else {
                Err(mismatch())
            }
        } else if op.is_ordering() {
            if lt.ty().is_numeric() && rt.ty().is_numeric() {
                Ok(Datatype::new(Type::Bool, secret))
            } else {
                Err(mismatch())
            }
        } else if op.is_equality() {
            let comparable =
                lt.ty() == rt.ty() || (lt.ty().is_numeric() && rt.ty().is_numeric());
            if comparable {
                Ok(Datatype::new(Type::Bool, secret))
            } else {
                Err(mismatch())
            }
        } else {
            // unary operators never reach the binary table
            Err(mismatch())
        }
    }
}
