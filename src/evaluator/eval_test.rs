use indoc::indoc;
use pretty_assertions::assert_eq;

use crate::ast::{Expr, ExprKind, Literal};
use crate::evaluator::{EvalError, Value, eval};
use crate::matrix::Matrix;
use crate::parser::parse;

fn run(source: &str) -> Result<Vec<Value>, EvalError> {
    let program = parse(source).unwrap();
    eval(&program, &[])
}

fn run_with(source: &str, inputs: &[(&str, Literal)]) -> Result<Vec<Value>, EvalError> {
    let program = parse(source).unwrap();
    eval(&program, inputs)
}

fn single(result: Result<Vec<Value>, EvalError>) -> Value {
    let mut values = result.unwrap();
    assert_eq!(values.len(), 1, "expected a single result");
    values.remove(0)
}

#[test]
fn test_precedence_drives_evaluation() {
    assert_eq!(
        single(run("return 2 + 3 * 4;")),
        Value::Known(Literal::int(14))
    );
    assert_eq!(
        single(run("return (2 + 3) * 4;")),
        Value::Known(Literal::int(20))
    );
}

#[test]
fn test_variables_and_assignment() {
    let result = run(indoc! {"
        int x = 5;
        x = x + 1;
        return x;
    "});
    assert_eq!(single(result), Value::Known(Literal::int(6)));
}

#[test]
fn test_read_before_write_is_fatal() {
    assert_eq!(
        run("return missing;"),
        Err(EvalError::UnboundVariable {
            name: "missing".to_string()
        })
    );
}

#[test]
fn test_if_takes_exactly_one_branch() {
    let result = run(indoc! {"
        int x = 0;
        if (1 < 2) { x = 1; } else { x = 2; }
        return x;
    "});
    assert_eq!(single(result), Value::Known(Literal::int(1)));
}

#[test]
fn test_if_without_taken_branch_is_a_no_op() {
    let result = run(indoc! {"
        int x = 0;
        if (2 < 1) { x = 1; }
        return x;
    "});
    assert_eq!(single(result), Value::Known(Literal::int(0)));
}

#[test]
fn test_non_bool_condition_is_fatal() {
    assert_eq!(
        run("if (1 + 2) { int x = 0; }"),
        Err(EvalError::ConditionNotBool { statement: "if" })
    );
}

#[test]
fn test_while_loop() {
    let result = run(indoc! {"
        int i = 0;
        int sum = 0;
        while (i < 5) {
            sum = sum + i;
            i = i + 1;
        }
        return sum;
    "});
    assert_eq!(single(result), Value::Known(Literal::int(10)));
}

#[test]
fn test_for_loop() {
    let result = run(indoc! {"
        int sum = 0;
        for (int i = 1; i <= 4; i = i + 1) {
            sum = sum + i;
        }
        return sum;
    "});
    assert_eq!(single(result), Value::Known(Literal::int(10)));
}

#[test]
fn test_function_call() {
    let result = run(indoc! {"
        public int square(int x) { return x * x; }
        return square(7);
    "});
    assert_eq!(single(result), Value::Known(Literal::int(49)));
}

#[test]
fn test_call_binds_arguments_in_a_fresh_environment() {
    let result = run(indoc! {"
        public int shadowing(int x) {
            x = x + 1;
            return x;
        }
        int x = 10;
        int y = shadowing(1);
        return x, y;
    "});
    let values = result.unwrap();
    assert_eq!(
        values,
        vec![
            Value::Known(Literal::int(10)),
            Value::Known(Literal::int(2)),
        ]
    );
}

#[test]
fn test_call_arity_mismatch_fails_before_the_body_runs() {
    let result = run(indoc! {"
        public int first(int a, int b) { return a; }
        return first(1);
    "});
    assert_eq!(
        result,
        Err(EvalError::ArgumentCountMismatch {
            function: "first".to_string(),
            expected: 2,
            got: 1,
        })
    );
}

#[test]
fn test_call_argument_type_mismatch_is_fatal() {
    let result = run(indoc! {"
        public int identity(int a) { return a; }
        return identity(true);
    "});
    assert_eq!(
        result,
        Err(EvalError::ArgumentTypeMismatch {
            function: "identity".to_string(),
            position: 0,
            expected: crate::ast::Type::Int,
            got: crate::ast::Type::Bool,
        })
    );
}

#[test]
fn test_recursive_call() {
    let result = run(indoc! {"
        public int factorial(int n) {
            if (n <= 1) { return 1; }
            return n * factorial(n - 1);
        }
        return factorial(5);
    "});
    assert_eq!(single(result), Value::Known(Literal::int(120)));
}

#[test]
fn test_expression_list_builds_a_row_vector() {
    let result = run("return {1, 2, 3};");
    assert_eq!(
        single(result),
        Value::Known(Literal::Int(Matrix::row(vec![1, 2, 3]).unwrap()))
    );
}

#[test]
fn test_nested_lists_build_a_two_dimensional_batch() {
    let result = run("return {{1, 2}, {3, 4}};");
    assert_eq!(
        single(result),
        Value::Known(Literal::Int(
            Matrix::from_rows(vec![vec![1, 2], vec![3, 4]]).unwrap()
        ))
    );
}

#[test]
fn test_index_reads() {
    let result = run(indoc! {"
        int v = {10, 20, 30};
        return v[1];
    "});
    assert_eq!(single(result), Value::Known(Literal::int(20)));

    let result = run(indoc! {"
        int m = {{1, 2}, {3, 4}};
        return m[1][0];
    "});
    assert_eq!(single(result), Value::Known(Literal::int(3)));
}

#[test]
fn test_index_out_of_bounds() {
    let result = run(indoc! {"
        int v = {10, 20, 30};
        return v[3];
    "});
    assert_eq!(
        result,
        Err(EvalError::IndexOutOfBounds { index: 3, extent: 3 })
    );
}

#[test]
fn test_index_assignment() {
    let result = run(indoc! {"
        int v = {10, 20, 30};
        v[1] = 99;
        return v;
    "});
    assert_eq!(
        single(result),
        Value::Known(Literal::Int(Matrix::row(vec![10, 99, 30]).unwrap()))
    );
}

#[test]
fn test_matrix_element_assignment() {
    let result = run(indoc! {"
        int m = {{1, 2}, {3, 4}};
        m[0][1] = 9;
        return m[0][1];
    "});
    assert_eq!(single(result), Value::Known(Literal::int(9)));
}

#[test]
fn test_rotation_from_source() {
    let result = run(indoc! {"
        int v = {1, 2, 3, 4};
        return rotate(v, 1);
    "});
    assert_eq!(
        single(result),
        Value::Known(Literal::Int(Matrix::row(vec![4, 1, 2, 3]).unwrap()))
    );
}

#[test]
fn test_rotation_leaves_the_variable_unchanged() {
    let result = run(indoc! {"
        int v = {1, 2, 3, 4};
        int w = rotate(v, 1);
        return v;
    "});
    assert_eq!(
        single(result),
        Value::Known(Literal::Int(Matrix::row(vec![1, 2, 3, 4]).unwrap()))
    );
}

#[test]
fn test_rotation_of_non_vector_is_fatal() {
    let result = run(indoc! {"
        int m = {{1, 2}, {3, 4}};
        return rotate(m, 1);
    "});
    assert!(matches!(result, Err(EvalError::Matrix(_))));
}

#[test]
fn test_transpose_from_source() {
    let result = run(indoc! {"
        int m = {{1, 2, 3}, {4, 5, 6}};
        return transpose(m);
    "});
    assert_eq!(
        single(result),
        Value::Known(Literal::Int(
            Matrix::from_rows(vec![vec![1, 4], vec![2, 5], vec![3, 6]]).unwrap()
        ))
    );
}

#[test]
fn test_deferred_rotation_returns_the_rotate_node() {
    // secretCount is declared but never bound, so the rotation cannot be
    // performed at compile time and comes back unevaluated
    let result = run(indoc! {"
        int v = {1, 2, 3, 4};
        secret int secretCount;
        return rotate(v, secretCount);
    "});
    let value = single(result);
    let Value::Deferred(expr) = value else {
        panic!("expected a deferred value, got {value}");
    };
    assert!(matches!(expr.kind, ExprKind::Rotate { .. }));
    assert_eq!(expr.to_string(), "rotate(v, secretCount)");
}

#[test]
fn test_deferred_transpose_on_unknown_operand() {
    let result = run(indoc! {"
        secret int hidden;
        return transpose(hidden);
    "});
    let value = single(result);
    assert!(matches!(
        value,
        Value::Deferred(Expr {
            kind: ExprKind::Transpose { .. },
            ..
        })
    ));
}

#[test]
fn test_unknown_operand_in_arithmetic_is_fatal() {
    // only rotate/transpose defer; arithmetic on an unknown value fails
    let result = run(indoc! {"
        secret int hidden;
        return hidden + 1;
    "});
    assert_eq!(
        result,
        Err(EvalError::NotALiteral {
            context: "a binary expression"
        })
    );
}

#[test]
fn test_inputs_resolve_declared_unknowns() {
    let result = run_with(
        indoc! {"
            int doubled = x + x;
            return doubled;
        "},
        &[("x", Literal::int(21))],
    );
    assert_eq!(single(result), Value::Known(Literal::int(42)));
}

#[test]
fn test_symbolic_list_keeps_unevaluated_elements() {
    let result = run(indoc! {"
        secret int k;
        return {k, 2};
    "});
    let value = single(result);
    let Value::Known(Literal::SymbolicInt(matrix)) = value else {
        panic!("expected a symbolic int batch, got {value}");
    };
    assert_eq!(matrix.dim().cols, 2);
}

#[test]
fn test_program_without_return_produces_no_values() {
    assert_eq!(run("int x = 5;"), Ok(Vec::new()));
}

#[test]
fn test_return_stops_execution() {
    let result = run(indoc! {"
        int x = 1;
        return x;
        x = 2;
    "});
    assert_eq!(single(result), Value::Known(Literal::int(1)));
}

#[test]
fn test_scalar_broadcast_through_source() {
    let result = run(indoc! {"
        int m = {{1, 2}, {3, 4}};
        return m + 5;
    "});
    assert_eq!(
        single(result),
        Value::Known(Literal::Int(
            Matrix::from_rows(vec![vec![6, 7], vec![8, 9]]).unwrap()
        ))
    );
}
