use pretty_assertions::assert_eq;

use crate::ast::{Expr, ExprKind, Literal, Operator, StmtKind};
use crate::parser::parse;

fn parse_value(expression: &str) -> Expr {
    let source = format!("x = {expression};");
    let mut block = parse(&source).unwrap();
    match block.statements.remove(0).kind {
        StmtKind::Assign { value, .. } => value,
        other => panic!("expected assignment, got {other:?}"),
    }
}

fn int(v: i64) -> Expr {
    Expr::literal(Literal::int(v))
}

#[test]
fn test_multiplication_binds_tighter_than_addition() {
    assert_eq!(
        parse_value("2 + 3 * 4"),
        Expr::binary(
            Operator::Add,
            int(2),
            Expr::binary(Operator::Mul, int(3), int(4)),
        )
    );
}

#[test]
fn test_parentheses_override_precedence() {
    assert_eq!(
        parse_value("(2 + 3) * 4"),
        Expr::binary(
            Operator::Mul,
            Expr::binary(Operator::Add, int(2), int(3)),
            int(4),
        )
    );
}

#[test]
fn test_left_associativity_of_subtraction() {
    assert_eq!(
        parse_value("10 - 4 - 3"),
        Expr::binary(
            Operator::Sub,
            Expr::binary(Operator::Sub, int(10), int(4)),
            int(3),
        )
    );
}

#[test]
fn test_subtraction_operand_order() {
    assert_eq!(parse_value("1 - 2"), Expr::binary(Operator::Sub, int(1), int(2)));
}

#[test]
fn test_comparison_binds_looser_than_arithmetic() {
    assert_eq!(
        parse_value("1 + 2 < 3 * 4"),
        Expr::binary(
            Operator::Less,
            Expr::binary(Operator::Add, int(1), int(2)),
            Expr::binary(Operator::Mul, int(3), int(4)),
        )
    );
}

#[test]
fn test_logical_or_binds_loosest() {
    assert_eq!(
        parse_value("a && b || c"),
        Expr::binary(
            Operator::LogicalOr,
            Expr::binary(
                Operator::LogicalAnd,
                Expr::variable("a"),
                Expr::variable("b"),
            ),
            Expr::variable("c"),
        )
    );
}

#[test]
fn test_bitwise_precedence_chain() {
    // `&` binds tighter than `^`, which binds tighter than `|`
    assert_eq!(
        parse_value("a | b ^ c & d"),
        Expr::binary(
            Operator::BitwiseOr,
            Expr::variable("a"),
            Expr::binary(
                Operator::BitwiseXor,
                Expr::variable("b"),
                Expr::binary(
                    Operator::BitwiseAnd,
                    Expr::variable("c"),
                    Expr::variable("d"),
                ),
            ),
        )
    );
}

#[test]
fn test_unary_not_binds_tighter_than_logical_and() {
    assert_eq!(
        parse_value("!a && b"),
        Expr::binary(
            Operator::LogicalAnd,
            Expr::unary(Operator::LogicalNot, Expr::variable("a")),
            Expr::variable("b"),
        )
    );
}

#[test]
fn test_stacked_unary_operators() {
    assert_eq!(
        parse_value("!!a"),
        Expr::unary(
            Operator::LogicalNot,
            Expr::unary(Operator::LogicalNot, Expr::variable("a")),
        )
    );
}

#[test]
fn test_round_trip_preserves_structure() {
    // re-stringifying a parsed expression and parsing it again yields the
    // same tree
    for source in [
        "2 + 3 * 4",
        "(2 + 3) * 4",
        "1 - 2 - 3",
        "(1 + 2) * (3 - 4) / 5",
        "a && (!b || c)",
        "1 < 2 == true",
    ] {
        let first = parse_value(source);
        let second = parse_value(&first.to_string());
        assert_eq!(first, second, "round-trip failed for '{source}'");
        assert!(matches!(
            second.kind,
            ExprKind::Binary { .. } | ExprKind::Unary { .. }
        ));
    }
}
