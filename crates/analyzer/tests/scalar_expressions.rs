// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Scalar expressions compiled against caller-built scopes

mod common;

use common::context;
use relsql_analyzer::{
    AnalyzerContext, ColumnInfo, DiagnosticCode, RelationInfo, ScopeId, analyze_scalar_expression,
};
use relsql_ast::{
    BinaryOp, ComparisonOp, DataType, Expr, FunctionArguments, FunctionCall, Name, PatternOp,
    QueryExpr, Select, SetQuantifier, TableRef, WhenClause,
};
use relsql_ir::decl::VariableDecl;
use relsql_ir::scalar::LossPolicy;
use relsql_ir::{Scalar, Type, Value, Variable, VariableKind};
use relsql_test_utils::count_let_declarators;

struct Columns {
    scope: ScopeId,
    k: Variable,
    v: Variable,
}

/// A scope holding one relation `t(k bigint, v varchar)`
fn scope_over_t(context: &mut AnalyzerContext) -> Columns {
    let k = context.bindings_mut().stream_variable(Some("k"));
    let v = context.bindings_mut().stream_variable(Some("v"));
    let relation = RelationInfo::new(vec![
        ColumnInfo::new(Some("k".into()), k.clone(), Type::Int8),
        ColumnInfo::new(Some("v".into()), v.clone(), Type::FLEXIBLE_VARCHAR),
    ])
    .with_correlation(Some("t".into()));
    let scope = context.push_scope(None, vec![relation]);
    Columns { scope, k, v }
}

fn codes(context: &AnalyzerContext) -> Vec<DiagnosticCode> {
    context.diagnostics().iter().map(|d| d.code).collect()
}

fn between(symmetric: bool) -> Expr {
    Expr::between(Expr::column("k"), Expr::exact("1"), Expr::exact("10"), symmetric)
}

#[test]
fn test_let_temporaries() {
    let simple_case = Expr::Case {
        operand: Some(Box::new(Expr::column("k"))),
        when_clauses: vec![
            WhenClause {
                when: Expr::exact("1"),
                then: Expr::string("one"),
            },
            WhenClause {
                when: Expr::exact("2"),
                then: Expr::string("two"),
            },
        ],
        default: Some(Box::new(Expr::string("many"))),
    };
    let nullif = Expr::Nullif {
        left: Box::new(Expr::column("k")),
        right: Box::new(Expr::exact("0")),
    };
    let in_list = Expr::InList {
        operand: Box::new(Expr::column("k")),
        values: vec![Expr::exact("1"), Expr::exact("2"), Expr::exact("3")],
        negated: false,
    };

    let cases = [
        (between(false), 1),
        (between(true), 3),
        (simple_case, 1),
        (nullif, 1),
        (in_list, 1),
    ];
    let mut context = context();
    let columns = scope_over_t(&mut context);
    for (expr, expected) in cases {
        let result = analyze_scalar_expression(&mut context, &expr, Some(columns.scope), None)
            .unwrap_or_else(|_| panic!("{expr:?} failed: {:?}", context.diagnostics()));
        assert_eq!(count_let_declarators(&result.expr), expected, "{expr:?}");
        assert!(!result.saw_aggregate);
    }
}

#[test]
fn test_let_binds_operand_once() {
    let mut context = context();
    let columns = scope_over_t(&mut context);
    let result =
        analyze_scalar_expression(&mut context, &between(false), Some(columns.scope), None)
            .unwrap();
    assert_eq!(result.ty, Type::Boolean);
    let Scalar::Let { declarators, body } = &result.expr else {
        panic!("expected let, got {:?}", result.expr);
    };
    assert_eq!(declarators[0].value, Scalar::variable(columns.k.clone()));
    assert!(matches!(declarators[0].variable.kind(), VariableKind::Let));

    let mut reads = 0;
    body.for_each_variable(&mut |variable| {
        if *variable == declarators[0].variable {
            reads += 1;
        }
    });
    assert_eq!(reads, 2);
}

#[test]
fn test_searched_case_has_no_let() {
    let mut context = context();
    let columns = scope_over_t(&mut context);
    let expr = Expr::Case {
        operand: None,
        when_clauses: vec![WhenClause {
            when: Expr::compare(ComparisonOp::Greater, Expr::column("k"), Expr::exact("0")),
            then: Expr::column("v"),
        }],
        default: None,
    };
    let result = analyze_scalar_expression(&mut context, &expr, Some(columns.scope), None).unwrap();
    assert_eq!(count_let_declarators(&result.expr), 0);
    assert_eq!(result.ty, Type::FLEXIBLE_VARCHAR);
}

#[test]
fn test_comparison_keeps_operands() {
    let mut context = context();
    let columns = scope_over_t(&mut context);
    let expr = Expr::compare(ComparisonOp::Equal, Expr::column("k"), Expr::null());
    let result = analyze_scalar_expression(&mut context, &expr, Some(columns.scope), None).unwrap();
    let Scalar::Compare { left, right, .. } = &result.expr else {
        panic!("expected comparison");
    };
    assert_eq!(left.as_variable(), Some(&columns.k));
    // the NULL takes the type of its sibling
    assert_eq!(**right, Scalar::immediate(Value::Null, Type::Int8));
}

#[test]
fn test_lookup_is_idempotent() {
    let mut context = context();
    let columns = scope_over_t(&mut context);
    let first =
        analyze_scalar_expression(&mut context, &Expr::column("V"), Some(columns.scope), None)
            .unwrap();
    let second =
        analyze_scalar_expression(&mut context, &Expr::column("t.v"), Some(columns.scope), None)
            .unwrap();
    assert_eq!(first.expr, second.expr);
    assert_eq!(first.expr.as_variable(), Some(&columns.v));
}

#[test]
fn test_exported_column_wins_in_any_order() {
    for exported in 0..3 {
        let mut context = context();
        let mut expected = None;
        let mut relations = Vec::new();
        for position in 0..3 {
            let variable = context.bindings_mut().stream_variable(Some("x"));
            if position == exported {
                expected = Some(variable.clone());
            }
            relations.push(RelationInfo::new(vec![
                ColumnInfo::new(Some("x".into()), variable, Type::Int4)
                    .with_exported(position == exported),
            ]));
        }
        let scope = context.push_scope(None, relations);
        let result =
            analyze_scalar_expression(&mut context, &Expr::column("x"), Some(scope), None).unwrap();
        assert_eq!(result.expr.as_variable(), expected.as_ref());
        context.pop_scope(scope);
    }
}

/// One relation named `correlation` with int4 columns `names`
fn relation_of(
    context: &mut AnalyzerContext,
    correlation: &str,
    names: &[&str],
) -> (RelationInfo, Vec<Variable>) {
    let variables: Vec<Variable> = names
        .iter()
        .map(|name| context.bindings_mut().stream_variable(Some(name)))
        .collect();
    let columns = names
        .iter()
        .zip(&variables)
        .map(|(name, variable)| {
            ColumnInfo::new(Some(name.to_string()), variable.clone(), Type::Int4)
        })
        .collect();
    let relation = RelationInfo::new(columns).with_correlation(Some(correlation.into()));
    (relation, variables)
}

#[test]
fn test_outer_references_three_scopes_deep() {
    let mut context = context();
    let (a, a_vars) = relation_of(&mut context, "a", &["o", "s"]);
    let (b, b_vars) = relation_of(&mut context, "b", &["m", "s"]);
    let (c, c_vars) = relation_of(&mut context, "c", &["i"]);
    let outer = context.push_scope(None, vec![a]);
    let middle = context.push_scope(Some(outer), vec![b]);
    let inner = context.push_scope(Some(middle), vec![c]);

    let resolve = |context: &mut AnalyzerContext, name: &str| {
        analyze_scalar_expression(context, &Expr::column(name), Some(inner), None)
            .unwrap()
            .expr
            .as_variable()
            .cloned()
    };
    assert_eq!(resolve(&mut context, "i"), Some(c_vars[0].clone()));
    assert_eq!(resolve(&mut context, "m"), Some(b_vars[0].clone()));
    assert_eq!(resolve(&mut context, "o"), Some(a_vars[0].clone()));
    // the nearest scope shadows the outermost one
    assert_eq!(resolve(&mut context, "s"), Some(b_vars[1].clone()));
    assert_eq!(resolve(&mut context, "a.s"), Some(a_vars[1].clone()));

    let sum = Expr::binary(
        BinaryOp::Add,
        Expr::column("o"),
        Expr::binary(BinaryOp::Add, Expr::column("m"), Expr::column("i")),
    );
    let result = analyze_scalar_expression(&mut context, &sum, Some(inner), None).unwrap();
    let mut seen = Vec::new();
    result.expr.for_each_variable(&mut |variable| seen.push(variable.clone()));
    assert_eq!(seen, vec![a_vars[0].clone(), b_vars[0].clone(), c_vars[0].clone()]);

    context.pop_scope(middle);
    assert!(analyze_scalar_expression(&mut context, &Expr::column("o"), Some(outer), None).is_ok());
    assert!(!context.has_errors());
}

#[test]
fn test_not_found_depends_on_scope() {
    let mut context = context();
    assert!(analyze_scalar_expression(&mut context, &Expr::column("nope"), None, None).is_err());
    let columns = scope_over_t(&mut context);
    assert!(
        analyze_scalar_expression(&mut context, &Expr::column("nope"), Some(columns.scope), None)
            .is_err()
    );
    assert_eq!(
        codes(&context),
        vec![
            DiagnosticCode::SymbolNotFound,
            DiagnosticCode::VariableNotFound
        ]
    );
}

#[test]
fn test_schema_variable_without_scope() {
    let mut context = context();
    let expr = Expr::column("tenant_id");
    let result = analyze_scalar_expression(&mut context, &expr, None, None).unwrap();
    assert_eq!(result.ty, Type::Int4);
    let variable = result.expr.as_variable().unwrap();
    assert!(matches!(variable.kind(), VariableKind::External(_)));
}

#[test]
fn test_host_parameters_and_placeholders() {
    let mut context = context();
    context.add_host_parameter(VariableDecl::new("p", Type::Int8));
    context.add_placeholder("n", Value::Int4(5), Type::Int4);

    let result =
        analyze_scalar_expression(&mut context, &Expr::host_parameter("p"), None, None).unwrap();
    assert_eq!(result.ty, Type::Int8);
    assert!(matches!(
        result.expr.as_variable().map(Variable::kind),
        Some(VariableKind::HostParameter(_))
    ));

    let result =
        analyze_scalar_expression(&mut context, &Expr::host_parameter("n"), None, None).unwrap();
    assert_eq!(result.expr, Scalar::immediate(Value::Int4(5), Type::Int4));

    let missing = Expr::host_parameter("q");
    assert!(analyze_scalar_expression(&mut context, &missing, None, None).is_err());
    assert_eq!(codes(&context), vec![DiagnosticCode::VariableNotFound]);
}

#[test]
fn test_mismatched_operands() {
    let mut context = context();
    let columns = scope_over_t(&mut context);
    let expr = Expr::compare(ComparisonOp::Equal, Expr::column("k"), Expr::column("v"));
    assert!(analyze_scalar_expression(&mut context, &expr, Some(columns.scope), None).is_err());
    assert_eq!(codes(&context), vec![DiagnosticCode::InconsistentType]);
}

#[test]
fn test_function_calls() {
    let mut context = context();
    let columns = scope_over_t(&mut context);

    let upper = Expr::function("upper", vec![Expr::column("v")]);
    let result =
        analyze_scalar_expression(&mut context, &upper, Some(columns.scope), None).unwrap();
    assert!(matches!(result.expr, Scalar::FunctionCall { .. }));
    assert!(result.ty.is_character());

    let unknown = Expr::function("frobnicate", vec![Expr::column("k")]);
    assert!(analyze_scalar_expression(&mut context, &unknown, Some(columns.scope), None).is_err());
    assert_eq!(codes(&context), vec![DiagnosticCode::FunctionNotFound]);
}

#[test]
fn test_aggregate_calls_are_flagged() {
    let mut context = context();
    let columns = scope_over_t(&mut context);

    let count = Expr::count_asterisk();
    let result =
        analyze_scalar_expression(&mut context, &count, Some(columns.scope), None).unwrap();
    assert!(result.saw_aggregate);
    assert_eq!(result.ty, Type::Int8);

    let distinct = Expr::FunctionCall(
        FunctionCall::new(Name::simple("count"), vec![Expr::column("k")])
            .with_quantifier(SetQuantifier::Distinct),
    );
    let result =
        analyze_scalar_expression(&mut context, &distinct, Some(columns.scope), None).unwrap();
    let Scalar::AggregateCall { function, .. } = &result.expr else {
        panic!("expected aggregate call");
    };
    assert_eq!(function.declaration().name, "count$distinct");

    let nested = Expr::binary(BinaryOp::Add, Expr::count_asterisk(), Expr::exact("1"));
    let result =
        analyze_scalar_expression(&mut context, &nested, Some(columns.scope), None).unwrap();
    assert!(result.saw_aggregate);

    let bad = Expr::FunctionCall(FunctionCall {
        name: Name::simple("upper"),
        quantifier: None,
        arguments: FunctionArguments::Asterisk,
    });
    assert!(analyze_scalar_expression(&mut context, &bad, Some(columns.scope), None).is_err());
    assert_eq!(codes(&context), vec![DiagnosticCode::FunctionNotFound]);
}

#[test]
fn test_pattern_match() {
    let mut context = context();
    let columns = scope_over_t(&mut context);
    for op in [PatternOp::Like, PatternOp::Similar] {
        let expr = Expr::Pattern {
            op,
            operand: Box::new(Expr::column("v")),
            pattern: Box::new(Expr::string("a%")),
            escape: None,
            negated: false,
        };
        let result =
            analyze_scalar_expression(&mut context, &expr, Some(columns.scope), None).unwrap();
        let Scalar::Match { escape, .. } = &result.expr else {
            panic!("expected match");
        };
        assert_eq!(
            **escape,
            Scalar::immediate(Value::Character(String::new()), Type::FLEXIBLE_VARCHAR)
        );
        assert_eq!(count_let_declarators(&result.expr), 0);
    }

    let numeric = Expr::Pattern {
        op: PatternOp::Like,
        operand: Box::new(Expr::column("k")),
        pattern: Box::new(Expr::string("1%")),
        escape: None,
        negated: false,
    };
    assert!(analyze_scalar_expression(&mut context, &numeric, Some(columns.scope), None).is_err());
    assert_eq!(codes(&context), vec![DiagnosticCode::InconsistentType]);
}

#[test]
fn test_cast_of_null() {
    let mut context = context();
    let expr = Expr::cast(Expr::null(), DataType::Int);
    let result = analyze_scalar_expression(&mut context, &expr, None, None).unwrap();
    assert_eq!(result.ty, Type::Int4);
    assert_eq!(
        result.expr,
        Scalar::Cast {
            operand: Box::new(Scalar::immediate(Value::Null, Type::Int4)),
            target: Type::Int4,
            loss_policy: LossPolicy::Ignore,
        }
    );
}

#[test]
fn test_subqueries_are_unsupported() {
    let mut context = context();
    let query = QueryExpr::select(Select::new().item(Expr::column("k")).from(TableRef::table("t")));
    let scalar = Expr::Subquery(Box::new(query.clone()));
    let in_query = Expr::InQuery {
        operand: Box::new(Expr::exact("1")),
        query: Box::new(query),
        negated: false,
    };
    assert!(analyze_scalar_expression(&mut context, &scalar, None, None).is_err());
    assert!(analyze_scalar_expression(&mut context, &in_query, None, None).is_err());
    assert_eq!(
        codes(&context),
        vec![
            DiagnosticCode::UnsupportedFeature,
            DiagnosticCode::UnsupportedFeature
        ]
    );
}
