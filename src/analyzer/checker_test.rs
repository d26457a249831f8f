use indoc::indoc;
use pretty_assertions::assert_eq;

use crate::analyzer::{TypeCheckError, check};
use crate::ast::{Datatype, StmtKind, Type};
use crate::parser::parse;

#[test]
fn test_secrecy_propagates_through_initializers() {
    let program = parse(indoc! {"
        secret int x = 5;
        int y = x + 1;
    "})
    .unwrap();
    let analysis = check(&program).unwrap();

    // y's declared type is plain int, but its recorded type is tainted
    assert_eq!(
        analysis.variable_type_by_name("y"),
        Some(Datatype::secret(Type::Int))
    );
}

#[test]
fn test_assignment_taints_the_target() {
    let program = parse(indoc! {"
        secret int x = 1;
        int y = 0;
        y = x;
    "})
    .unwrap();
    let analysis = check(&program).unwrap();
    assert_eq!(
        analysis.variable_type_by_name("y"),
        Some(Datatype::secret(Type::Int))
    );
}

#[test]
fn test_literals_are_never_secret() {
    let program = parse("int x = 5;").unwrap();
    let analysis = check(&program).unwrap();
    let StmtKind::VarDecl { value: Some(value), .. } = &program.statements[0].kind else {
        panic!("expected declaration");
    };
    assert!(!analysis.is_secret_tainted(value.id));
    assert_eq!(
        analysis.expression_type(value.id),
        Some(Datatype::plain(Type::Int))
    );
}

#[test]
fn test_arithmetic_widens_to_the_wider_numeric_type() {
    let program = parse("double d = 1 + 2.5;").unwrap();
    let analysis = check(&program).unwrap();
    let StmtKind::VarDecl { value: Some(value), .. } = &program.statements[0].kind else {
        panic!("expected declaration");
    };
    assert_eq!(
        analysis.expression_type(value.id),
        Some(Datatype::plain(Type::Double))
    );
}

#[test]
fn test_comparison_produces_bool() {
    let program = parse("bool b = 1 < 2;").unwrap();
    let analysis = check(&program).unwrap();
    let StmtKind::VarDecl { value: Some(value), .. } = &program.statements[0].kind else {
        panic!("expected declaration");
    };
    assert_eq!(
        analysis.expression_type(value.id),
        Some(Datatype::plain(Type::Bool))
    );
}

#[test]
fn test_undeclared_variable_is_an_error() {
    let program = parse("int y = x + 1;").unwrap();
    assert_eq!(
        check(&program).unwrap_err(),
        TypeCheckError::UndeclaredVariable {
            name: "x".to_string()
        }
    );
}

#[test]
fn test_shadowing_resolves_to_the_innermost_declaration() {
    let program = parse(indoc! {"
        int x = 1;
        {
            secret int x = 2;
            int y = x;
        }
        int z = x;
    "})
    .unwrap();
    let analysis = check(&program).unwrap();
    // y saw the inner, secret x; z saw the outer, plain one
    assert_eq!(
        analysis.variable_type_by_name("y"),
        Some(Datatype::secret(Type::Int))
    );
    assert_eq!(
        analysis.variable_type_by_name("z"),
        Some(Datatype::plain(Type::Int))
    );
}

#[test]
fn test_assignment_type_mismatch_is_an_error() {
    let program = parse(indoc! {"
        int x = 0;
        x = true;
    "})
    .unwrap();
    assert!(matches!(
        check(&program),
        Err(TypeCheckError::AssignmentTypeMismatch { .. })
    ));
}

#[test]
fn test_narrowing_initializer_is_an_error() {
    let program = parse("int x = 2.5;").unwrap();
    assert!(matches!(
        check(&program),
        Err(TypeCheckError::AssignmentTypeMismatch { .. })
    ));
}

#[test]
fn test_widening_initializer_is_allowed() {
    let program = parse("double x = 2;").unwrap();
    assert!(check(&program).is_ok());
}

#[test]
fn test_non_bool_condition_is_an_error() {
    let program = parse("if (1 + 2) { int x = 0; }").unwrap();
    assert_eq!(
        check(&program).unwrap_err(),
        TypeCheckError::ConditionNotBool {
            statement: "if",
            got: Type::Int
        }
    );
}

#[test]
fn test_mixed_expression_list_is_an_error() {
    let program = parse("int v = {1, true};").unwrap();
    assert!(matches!(
        check(&program),
        Err(TypeCheckError::MixedExpressionList { .. })
    ));
}

#[test]
fn test_non_int_index_is_an_error() {
    let program = parse(indoc! {"
        int v = {1, 2, 3};
        int x = v[true];
    "})
    .unwrap();
    assert!(matches!(
        check(&program),
        Err(TypeCheckError::IndexNotInt { got: Type::Bool })
    ));
}

#[test]
fn test_call_resolves_forward_references() {
    let program = parse(indoc! {"
        int y = square(3);
        public int square(int x) { return x * x; }
    "})
    .unwrap();
    let analysis = check(&program).unwrap();
    assert_eq!(
        analysis.variable_type_by_name("y"),
        Some(Datatype::plain(Type::Int))
    );
}

#[test]
fn test_call_to_unknown_function_is_an_error() {
    let program = parse("int y = missing(3);").unwrap();
    assert_eq!(
        check(&program).unwrap_err(),
        TypeCheckError::UnknownFunction {
            name: "missing".to_string()
        }
    );
}

#[test]
fn test_call_with_secret_argument_is_tainted() {
    let program = parse(indoc! {"
        public int square(int x) { return x * x; }
        secret int s = 3;
        int y = square(s);
    "})
    .unwrap();
    let analysis = check(&program).unwrap();
    assert_eq!(
        analysis.variable_type_by_name("y"),
        Some(Datatype::secret(Type::Int))
    );
}

#[test]
fn test_return_type_mismatch_is_an_error() {
    let program = parse("public int answer() { return true; }").unwrap();
    assert!(matches!(
        check(&program),
        Err(TypeCheckError::ReturnTypeMismatch { .. })
    ));
}

#[test]
fn test_return_arity_mismatch_is_an_error() {
    let program = parse(indoc! {"
        public int pair(bool which) {
            if (which) { return 1, 2; }
            return 1;
        }
    "})
    .unwrap();
    assert!(matches!(
        check(&program),
        Err(TypeCheckError::ReturnArityMismatch { .. })
    ));
}

#[test]
fn test_secret_return_from_plain_function_is_an_error() {
    let program = parse(indoc! {"
        public int leak(secret int x) { return x; }
    "})
    .unwrap();
    assert_eq!(
        check(&program).unwrap_err(),
        TypeCheckError::SecretReturnFromPlainFunction {
            function: "leak".to_string()
        }
    );
}

#[test]
fn test_secret_return_from_secret_function_is_allowed() {
    let program = parse(indoc! {"
        public secret int identity(secret int x) { return x; }
    "})
    .unwrap();
    assert!(check(&program).is_ok());
}

#[test]
fn test_rotation_amount_must_be_int() {
    let program = parse(indoc! {"
        int v = {1, 2, 3};
        int w = rotate(v, true);
    "})
    .unwrap();
    assert!(matches!(
        check(&program),
        Err(TypeCheckError::RotationAmountNotInt { got: Type::Bool })
    ));
}

#[test]
fn test_logical_operator_on_ints_is_an_error() {
    let program = parse("bool b = 1 && 2;").unwrap();
    assert!(matches!(
        check(&program),
        Err(TypeCheckError::MismatchedOperands { .. })
    ));
}
