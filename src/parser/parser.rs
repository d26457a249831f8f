//! Recursive-descent statement parsing and shunting-yard expression parsing.
//!
//! Statements dispatch on their first token. Expressions are parsed with two
//! explicit stacks (operands and pending operators) so parse depth is bounded
//! independently of the host call stack: a binary operator pops and reduces
//! while the stack top binds at least as tightly (left-associative operators
//! reduce on equal precedence), unary operators apply to the next-parsed
//! operand, and whatever operators remain at the end of the expression are
//! drained against the remaining operands.

use crate::ast::{
    Block, Datatype, Expr, Function, FunctionParameter, Literal, Operator, Stmt, StmtKind, Type,
};
use crate::parser::cursor::TokenCursor;
use crate::parser::error::SyntaxError;
use crate::parser::lexer::{self, Symbol, TokenKind};

/// Parse a complete source text into a synthetic top-level block.
pub fn parse(source: &str) -> Result<Block, SyntaxError> {
    let tokens = lexer::tokenize(source)?;
    let mut it = TokenCursor::new(tokens);
    let mut statements = Vec::new();
    while !it.is_eof() {
        statements.push(parse_statement(&mut it)?);
    }
    Ok(Block::new(statements))
}

fn parse_statement(it: &mut TokenCursor) -> Result<Stmt, SyntaxError> {
    match it.peek_symbol() {
        Some(Symbol::KwFor) => parse_for_statement(it),
        Some(Symbol::KwIf) => parse_if_statement(it),
        Some(Symbol::KwWhile) => parse_while_statement(it),
        Some(Symbol::KwReturn) => parse_return_statement(it),
        Some(Symbol::OpenCurly) => Ok(Stmt::new(StmtKind::Block(parse_block(it)?))),
        Some(Symbol::KwPublic) => parse_function_statement(it),
        Some(symbol) if is_datatype_start(symbol) => parse_variable_declaration(it),
        // anything else has to be an identifier-led assignment
        _ => parse_assignment(it),
    }
}

fn is_datatype_start(symbol: Symbol) -> bool {
    matches!(
        symbol,
        Symbol::KwSecret
            | Symbol::KwBool
            | Symbol::KwChar
            | Symbol::KwInt
            | Symbol::KwFloat
            | Symbol::KwDouble
            | Symbol::KwString
            | Symbol::KwVoid
    )
}

fn parse_datatype(it: &mut TokenCursor) -> Result<Datatype, SyntaxError> {
    let secret = it.eat_symbol(Symbol::KwSecret);
    let ty = match it.peek_symbol() {
        Some(Symbol::KwBool) => Type::Bool,
        Some(Symbol::KwChar) => Type::Char,
        Some(Symbol::KwInt) => Type::Int,
        Some(Symbol::KwFloat) => Type::Float,
        Some(Symbol::KwDouble) => Type::Double,
        Some(Symbol::KwString) => Type::String,
        Some(Symbol::KwVoid) => Type::Void,
        _ => return Err(it.expected("a datatype")),
    };
    it.advance();
    Ok(Datatype::new(ty, secret))
}

fn parse_block(it: &mut TokenCursor) -> Result<Block, SyntaxError> {
    it.expect_symbol(Symbol::OpenCurly)?;
    let mut statements = Vec::new();
    while !it.at_symbol(Symbol::CloseCurly) {
        if it.is_eof() {
            return Err(it.expected("'}'"));
        }
        statements.push(parse_statement(it)?);
    }
    it.expect_symbol(Symbol::CloseCurly)?;
    Ok(Block::new(statements))
}

fn parse_function_statement(it: &mut TokenCursor) -> Result<Stmt, SyntaxError> {
    it.expect_symbol(Symbol::KwPublic)?;
    let return_type = parse_datatype(it)?;
    let name = it.expect_identifier()?;

    it.expect_symbol(Symbol::OpenParen)?;
    let mut parameters = Vec::new();
    while !it.at_symbol(Symbol::CloseParen) {
        parameters.push(parse_function_parameter(it)?);
    }
    it.expect_symbol(Symbol::CloseParen)?;

    let body = parse_block(it)?;
    Ok(Stmt::new(StmtKind::Function(Function::new(
        return_type,
        name,
        parameters,
        body,
    ))))
}

fn parse_function_parameter(it: &mut TokenCursor) -> Result<FunctionParameter, SyntaxError> {
    let datatype = parse_datatype(it)?;
    let name = it.expect_identifier()?;
    // consume the comma separating this parameter from the next one, if any
    it.eat_symbol(Symbol::Comma);
    Ok(FunctionParameter::new(datatype, name))
}

fn parse_variable_declaration(it: &mut TokenCursor) -> Result<Stmt, SyntaxError> {
    let datatype = parse_datatype(it)?;
    let name = it.expect_identifier()?;
    let value = if it.at_symbol(Symbol::Semicolon) {
        None
    } else {
        it.expect_symbol(Symbol::Assign)?;
        Some(parse_expression(it)?)
    };
    it.expect_symbol(Symbol::Semicolon)?;
    Ok(Stmt::new(StmtKind::VarDecl { datatype, name, value }))
}

fn parse_assignment(it: &mut TokenCursor) -> Result<Stmt, SyntaxError> {
    let stmt = parse_assignment_without_terminator(it)?;
    it.expect_symbol(Symbol::Semicolon)?;
    Ok(stmt)
}

fn parse_assignment_without_terminator(it: &mut TokenCursor) -> Result<Stmt, SyntaxError> {
    let target = parse_target(it)?;
    it.expect_symbol(Symbol::Assign)?;
    let value = parse_expression(it)?;
    Ok(Stmt::new(StmtKind::Assign { target, value }))
}

fn parse_return_statement(it: &mut TokenCursor) -> Result<Stmt, SyntaxError> {
    it.expect_symbol(Symbol::KwReturn)?;
    let mut expressions = Vec::new();
    if !it.at_symbol(Symbol::Semicolon) {
        expressions.push(parse_expression(it)?);
        while it.eat_symbol(Symbol::Comma) {
            expressions.push(parse_expression(it)?);
        }
    }
    it.expect_symbol(Symbol::Semicolon)?;
    Ok(Stmt::new(StmtKind::Return(expressions)))
}

fn parse_if_statement(it: &mut TokenCursor) -> Result<Stmt, SyntaxError> {
    it.expect_symbol(Symbol::KwIf)?;
    it.expect_symbol(Symbol::OpenParen)?;
    let condition = parse_expression(it)?;
    it.expect_symbol(Symbol::CloseParen)?;
    let then_branch = parse_block(it)?;
    let else_branch = if it.eat_symbol(Symbol::KwElse) {
        Some(parse_block(it)?)
    } else {
        None
    };
    Ok(Stmt::new(StmtKind::If {
        condition,
        then_branch,
        else_branch,
    }))
}

fn parse_while_statement(it: &mut TokenCursor) -> Result<Stmt, SyntaxError> {
    it.expect_symbol(Symbol::KwWhile)?;
    it.expect_symbol(Symbol::OpenParen)?;
    let condition = parse_expression(it)?;
    it.expect_symbol(Symbol::CloseParen)?;
    let body = parse_block(it)?;
    Ok(Stmt::new(StmtKind::While { condition, body }))
}

fn parse_for_statement(it: &mut TokenCursor) -> Result<Stmt, SyntaxError> {
    it.expect_symbol(Symbol::KwFor)?;
    it.expect_symbol(Symbol::OpenParen)?;

    // the initializer parses its own terminating semicolon
    let initializer = if it.eat_symbol(Symbol::Semicolon) {
        None
    } else if it.peek_symbol().is_some_and(is_datatype_start) {
        Some(Box::new(parse_variable_declaration(it)?))
    } else {
        Some(Box::new(parse_assignment(it)?))
    };

    let condition = parse_expression(it)?;
    it.expect_symbol(Symbol::Semicolon)?;

    let update = if it.at_symbol(Symbol::CloseParen) {
        None
    } else {
        Some(Box::new(parse_assignment_without_terminator(it)?))
    };
    it.expect_symbol(Symbol::CloseParen)?;

    let body = parse_block(it)?;
    Ok(Stmt::new(StmtKind::For {
        initializer,
        condition,
        update,
        body,
    }))
}

/// A target is a variable, optionally wrapped in an index access per
/// trailing `[...]`.
fn parse_target(it: &mut TokenCursor) -> Result<Expr, SyntaxError> {
    let name = it.expect_identifier()?;
    let mut target = Expr::variable(name);
    while it.eat_symbol(Symbol::OpenSquare) {
        let index = parse_expression(it)?;
        it.expect_symbol(Symbol::CloseSquare)?;
        target = Expr::index(target, index);
    }
    Ok(target)
}

fn is_binary_operator(symbol: Symbol) -> bool {
    matches!(
        symbol,
        Symbol::Plus
            | Symbol::Minus
            | Symbol::Star
            | Symbol::Slash
            | Symbol::Percent
            | Symbol::Ampersand
            | Symbol::Pipe
            | Symbol::Caret
            | Symbol::LogicalAnd
            | Symbol::LogicalOr
            | Symbol::Equal
            | Symbol::NotEqual
            | Symbol::Less
            | Symbol::Greater
            | Symbol::LessEqual
            | Symbol::GreaterEqual
            | Symbol::ShiftLeft
            | Symbol::ShiftRight
    )
}

fn is_unary_operator(symbol: Symbol) -> bool {
    matches!(symbol, Symbol::Bang | Symbol::Tilde)
}

fn parse_operator(it: &mut TokenCursor) -> Result<Operator, SyntaxError> {
    let span = it.span();
    let symbol = match it.peek_symbol() {
        Some(symbol) => symbol,
        None => return Err(it.unexpected()),
    };
    let op = match symbol {
        Symbol::Plus => Operator::Add,
        Symbol::Minus => Operator::Sub,
        Symbol::Star => Operator::Mul,
        Symbol::Slash => Operator::Div,
        Symbol::Percent => Operator::Mod,
        Symbol::Ampersand => Operator::BitwiseAnd,
        Symbol::Pipe => Operator::BitwiseOr,
        Symbol::Caret => Operator::BitwiseXor,
        Symbol::LogicalAnd => Operator::LogicalAnd,
        Symbol::LogicalOr => Operator::LogicalOr,
        Symbol::Equal => Operator::Equal,
        Symbol::NotEqual => Operator::NotEqual,
        Symbol::Less => Operator::Less,
        Symbol::Greater => Operator::Greater,
        Symbol::LessEqual => Operator::LessEqual,
        Symbol::GreaterEqual => Operator::GreaterEqual,
        Symbol::Bang => Operator::LogicalNot,
        Symbol::Tilde => Operator::BitwiseNot,
        Symbol::ShiftLeft => {
            return Err(SyntaxError::UnsupportedOperator {
                operator: "shift left".to_string(),
                span,
            });
        }
        Symbol::ShiftRight => {
            return Err(SyntaxError::UnsupportedOperator {
                operator: "shift right".to_string(),
                span,
            });
        }
        _ => return Err(it.unexpected()),
    };
    it.advance();
    Ok(op)
}

fn is_literal_token(kind: &TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Bool(_)
            | TokenKind::Int(_)
            | TokenKind::Float(_)
            | TokenKind::Double(_)
            | TokenKind::Char(_)
            | TokenKind::Str(_)
    )
}

fn parse_literal(it: &mut TokenCursor) -> Result<Expr, SyntaxError> {
    let token = it.advance().ok_or_else(|| it.unexpected())?;
    let literal = match token.kind {
        TokenKind::Bool(v) => Literal::bool(v),
        TokenKind::Int(v) => Literal::int(v),
        TokenKind::Float(v) => Literal::float(v),
        TokenKind::Double(v) => Literal::double(v),
        TokenKind::Char(v) => Literal::char(v),
        TokenKind::Str(v) => Literal::string(v),
        _ => {
            return Err(SyntaxError::UnexpectedToken {
                found: token.kind.to_string(),
                span: token.span,
            });
        }
    };
    Ok(Expr::literal(literal))
}

/// An identifier in operand position: a call when followed by `(`, otherwise
/// a variable with optional trailing index accesses.
fn parse_identifier_operand(it: &mut TokenCursor) -> Result<Expr, SyntaxError> {
    let name = it.expect_identifier()?;
    if it.eat_symbol(Symbol::OpenParen) {
        let mut args = Vec::new();
        if !it.at_symbol(Symbol::CloseParen) {
            args.push(parse_expression(it)?);
            while it.eat_symbol(Symbol::Comma) {
                args.push(parse_expression(it)?);
            }
        }
        it.expect_symbol(Symbol::CloseParen)?;
        return Ok(Expr::call(name, args));
    }
    let mut expr = Expr::variable(name);
    while it.eat_symbol(Symbol::OpenSquare) {
        let index = parse_expression(it)?;
        it.expect_symbol(Symbol::CloseSquare)?;
        expr = Expr::index(expr, index);
    }
    Ok(expr)
}

fn parse_rotate(it: &mut TokenCursor) -> Result<Expr, SyntaxError> {
    it.expect_symbol(Symbol::KwRotate)?;
    it.expect_symbol(Symbol::OpenParen)?;
    let operand = parse_expression(it)?;
    it.expect_symbol(Symbol::Comma)?;
    let amount = parse_expression(it)?;
    it.expect_symbol(Symbol::CloseParen)?;
    Ok(Expr::rotate(operand, amount))
}

fn parse_transpose(it: &mut TokenCursor) -> Result<Expr, SyntaxError> {
    it.expect_symbol(Symbol::KwTranspose)?;
    it.expect_symbol(Symbol::OpenParen)?;
    let operand = parse_expression(it)?;
    it.expect_symbol(Symbol::CloseParen)?;
    Ok(Expr::transpose(operand))
}

/// `{e1, e2, ...}`: a batched-literal construction. An expression list can
/// only appear at the start of an expression, never inside a larger one.
fn parse_expression_list(it: &mut TokenCursor) -> Result<Expr, SyntaxError> {
    it.expect_symbol(Symbol::OpenCurly)?;
    let mut items = vec![parse_expression(it)?];
    while it.eat_symbol(Symbol::Comma) {
        items.push(parse_expression(it)?);
    }
    it.expect_symbol(Symbol::CloseCurly)?;
    Ok(Expr::list(items))
}

/// Apply pending right-associative (unary) operators to the operand that was
/// just pushed. The guard for non-unary right-associative operators stays in
/// place even though no such operator currently exists in the grammar.
fn apply_pending_unaries(
    operators: &mut Vec<Operator>,
    operands: &mut Vec<Expr>,
    it: &TokenCursor,
) -> Result<(), SyntaxError> {
    while let Some(&op) = operators.last() {
        if !op.is_right_associative() {
            break;
        }
        if !op.is_unary() {
            return Err(SyntaxError::NonUnaryRightAssociative { span: it.span() });
        }
        operators.pop();
        let operand = operands.pop().ok_or_else(|| SyntaxError::MissingOperand {
            operator: op.to_string(),
            span: it.span(),
        })?;
        operands.push(Expr::unary(op, operand));
    }
    Ok(())
}

fn parse_expression(it: &mut TokenCursor) -> Result<Expr, SyntaxError> {
    // a `{` opens an expression list, which cannot be part of a larger
    // expression
    if it.at_symbol(Symbol::OpenCurly) {
        return parse_expression_list(it);
    }

    let mut operands: Vec<Expr> = Vec::new();
    let mut operators: Vec<Operator> = Vec::new();

    loop {
        let symbol = it.peek_symbol();
        if symbol.is_some_and(is_binary_operator) {
            let op1 = parse_operator(it)?;
            while let Some(&op2) = operators.last() {
                let reduce = (!op1.is_right_associative()
                    && op1.precedence() == op2.precedence())
                    || op1.precedence() < op2.precedence();
                if !reduce {
                    break;
                }
                operators.pop();
                let rhs = operands.pop().ok_or_else(|| SyntaxError::MissingOperand {
                    operator: op2.to_string(),
                    span: it.span(),
                })?;
                let lhs = operands.pop().ok_or_else(|| SyntaxError::MissingOperand {
                    operator: op2.to_string(),
                    span: it.span(),
                })?;
                operands.push(Expr::binary(op2, lhs, rhs));
            }
            operators.push(op1);
        } else if symbol.is_some_and(is_unary_operator) {
            operators.push(parse_operator(it)?);
        } else if matches!(symbol, Some(Symbol::Increment | Symbol::Decrement)) {
            // postfix increment/decrement desugars to adding/subtracting 1
            let span = it.span();
            let op = if symbol == Some(Symbol::Increment) {
                Operator::Add
            } else {
                Operator::Sub
            };
            it.advance();
            let operand = operands.pop().ok_or(SyntaxError::MissingOperand {
                operator: "postfix operator".to_string(),
                span,
            })?;
            operands.push(Expr::binary(op, operand, Expr::literal(Literal::int(1))));
        } else if it.peek().is_some_and(|t| is_literal_token(&t.kind)) {
            operands.push(parse_literal(it)?);
            apply_pending_unaries(&mut operators, &mut operands, it)?;
        } else if matches!(it.peek().map(|t| &t.kind), Some(TokenKind::Ident(_))) {
            operands.push(parse_identifier_operand(it)?);
            apply_pending_unaries(&mut operators, &mut operands, it)?;
        } else if symbol == Some(Symbol::KwRotate) {
            operands.push(parse_rotate(it)?);
            apply_pending_unaries(&mut operators, &mut operands, it)?;
        } else if symbol == Some(Symbol::KwTranspose) {
            operands.push(parse_transpose(it)?);
            apply_pending_unaries(&mut operators, &mut operands, it)?;
        } else if symbol == Some(Symbol::OpenParen) {
            // nested expression: recurse
            it.advance();
            let inner = parse_expression(it)?;
            it.expect_symbol(Symbol::CloseParen)?;
            operands.push(inner);
            apply_pending_unaries(&mut operators, &mut operands, it)?;
        } else {
            // stop (without consuming) at any token that cannot extend the
            // expression: a closing parenthesis, a terminator, anything else
            break;
        }
    }

    // drain whatever operators remain
    while let Some(op) = operators.pop() {
        if op.is_unary() {
            return Err(SyntaxError::UnresolvedUnaryOperator { span: it.span() });
        }
        let rhs = operands.pop().ok_or_else(|| SyntaxError::MissingOperand {
            operator: op.to_string(),
            span: it.span(),
        })?;
        let lhs = operands.pop().ok_or_else(|| SyntaxError::MissingOperand {
            operator: op.to_string(),
            span: it.span(),
        })?;
        operands.push(Expr::binary(op, lhs, rhs));
    }

    let mut remaining = operands.into_iter();
    match (remaining.next(), remaining.next()) {
        (Some(expr), None) => Ok(expr),
        (None, _) => Err(SyntaxError::EmptyExpression { span: it.span() }),
        (Some(_), Some(_)) => Err(SyntaxError::UnresolvedOperands { span: it.span() }),
    }
}
