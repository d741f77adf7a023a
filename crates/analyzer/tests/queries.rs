// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Query compilation: operator chains and relation shapes

mod common;

use common::{context, failure, kinds, last_operator, plan, select};
use relsql_analyzer::{DiagnosticCode, analyze_query_expression};
use relsql_ast::{
    ApplyKind, BinaryOp, ComparisonOp, Correlation, Expr, Identifier, JoinCondition, JoinKind, Name,
    QueryExpr, Select, SelectItem, SetOperator, SetQuantifier, SortKey, Statement, TableRef,
    WithElement,
};
use relsql_ir::decl::SortOrder;
use relsql_ir::plan::JoinKind as PlanJoinKind;
use relsql_ir::{Graph, Operator, OperatorKind::*, Relation, Scalar, Type};
use relsql_test_utils::{SqlFixtures, count_kind};

fn query_of(statement: Statement) -> QueryExpr {
    match statement {
        Statement::Select(query) => query,
        other => panic!("expected a query, got {other:?}"),
    }
}

#[test]
fn test_filter_reads_scanned_key() {
    let mut context = context();
    let query = query_of(SqlFixtures::select_with_where());
    let mut graph = Graph::new();
    let compiled = analyze_query_expression(&mut context, &mut graph, &query, None, None).unwrap();

    assert_eq!(graph.len(), 3);
    assert_eq!(graph.kinds_to(compiled.output.node()), vec![Scan, Filter, Project]);

    let (scan_id, filter_id) = {
        let project = compiled.output.node();
        let filter = graph.upstream(project, 0).unwrap();
        (graph.upstream(filter, 0).unwrap(), filter)
    };
    let Operator::Scan(scan) = graph.operator(scan_id) else {
        panic!("expected scan");
    };
    let Relation::Index(index) = &scan.source else {
        panic!("expected a scan of the primary index");
    };
    assert_eq!(index.name, "t_pk");
    let Operator::Filter(filter) = graph.operator(filter_id) else {
        panic!("expected filter");
    };
    let Scalar::Compare { left, .. } = &filter.condition else {
        panic!("expected comparison, got {:?}", filter.condition);
    };
    assert_eq!(left.as_variable(), Some(&scan.columns[0].destination));

    let Operator::Project(project) = graph.operator(compiled.output.node()) else {
        panic!("expected project");
    };
    assert!(project.columns.is_empty());
    assert_eq!(compiled.relation.columns.len(), 1);
    assert_eq!(compiled.relation.columns[0].identifier.as_deref(), Some("v"));
    assert_eq!(compiled.relation.columns[0].variable, scan.columns[1].destination);
}

#[test]
fn test_select_all_passes_scan_through() {
    let mut context = context();
    let plan = plan(&mut context, &SqlFixtures::select_all());
    assert_eq!(kinds(&plan), vec![Scan, Emit]);

    let Operator::Emit(emit) = plan.graph.operator(plan.terminal) else {
        panic!("expected emit");
    };
    let names: Vec<_> = emit.columns.iter().map(|c| c.name.as_deref()).collect();
    // the hidden row_version column is not exported
    assert_eq!(
        names,
        vec![Some("id"), Some("email"), Some("name"), Some("created_at")]
    );
}

#[test]
fn test_union_widens_to_float() {
    let mut context = context();
    let query = query_of(SqlFixtures::union_all());
    let mut graph = Graph::new();
    let compiled = analyze_query_expression(&mut context, &mut graph, &query, None, None).unwrap();

    assert_eq!(compiled.relation.columns.len(), 1);
    assert_eq!(compiled.relation.columns[0].ty, Type::Float8);
    assert_eq!(compiled.relation.columns[0].identifier.as_deref(), Some("k"));
    let Operator::Union(union) = graph.operator(compiled.output.node()) else {
        panic!("expected union");
    };
    assert_eq!(union.mappings.len(), 1);
    assert_eq!(union.mappings[0].destination, compiled.relation.columns[0].variable);
}

#[test]
fn test_union_column_count_mismatch() {
    let mut context = context();
    let statement = Statement::Select(QueryExpr::set_operation(
        SetOperator::Union,
        None,
        QueryExpr::select(Select::new().item(Expr::column("k")).from(TableRef::table("t"))),
        QueryExpr::select(
            Select::new()
                .item(Expr::column("a"))
                .item(Expr::column("b"))
                .from(TableRef::table("u")),
        ),
    ));
    assert_eq!(
        failure(&mut context, &statement),
        vec![DiagnosticCode::InconsistentColumns]
    );
}

#[test]
fn test_except_keeps_left_columns() {
    let mut context = context();
    let statement = Statement::Select(QueryExpr::set_operation(
        SetOperator::Except,
        Some(SetQuantifier::All),
        QueryExpr::select(Select::new().item(Expr::column("a")).from(TableRef::table("u"))),
        QueryExpr::select(Select::new().item(Expr::column("k")).from(TableRef::table("t"))),
    ));
    let plan = plan(&mut context, &statement);
    let Operator::Difference(difference) = last_operator(&plan) else {
        panic!("expected difference");
    };
    assert_eq!(difference.group_key_pairs.len(), 1);
}

#[test]
fn test_group_by_chain() {
    let mut context = context();
    let plan = plan(&mut context, &SqlFixtures::group_by());
    assert_eq!(kinds(&plan), vec![Scan, Aggregate, Project, Emit]);

    let aggregate = plan
        .graph
        .nodes()
        .find_map(|(_, node)| match &node.operator {
            Operator::Aggregate(aggregate) => Some(aggregate.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(aggregate.group_keys.len(), 1);
    assert_eq!(aggregate.columns.len(), 1);
    assert!(aggregate.columns[0].arguments.is_empty());
}

#[test]
fn test_having_filters_between_aggregate_and_project() {
    let mut context = context();
    let plan = plan(&mut context, &SqlFixtures::group_by_having());
    assert_eq!(
        kinds(&plan),
        vec![Scan, Aggregate, Filter, Project, Limit, Emit]
    );
    // SUM(b) in the select list and in HAVING share one aggregate column
    let (_, aggregate) = relsql_test_utils::find_operator(&plan.graph, Aggregate).unwrap();
    let Operator::Aggregate(aggregate) = aggregate else {
        panic!("expected aggregate");
    };
    assert_eq!(aggregate.columns.len(), 1);

    let Operator::Limit(limit) = last_operator(&plan) else {
        panic!("expected limit");
    };
    assert_eq!(limit.count, Some(5));
    assert_eq!(limit.sort_keys.len(), 1);
    assert_eq!(limit.sort_keys[0].variable, aggregate.group_keys[0]);
}

#[test]
fn test_plain_column_in_grouped_select() {
    let mut context = context();
    let statement = select(
        Select::new()
            .item(Expr::column("a"))
            .item(Expr::column("b"))
            .from(TableRef::table("u"))
            .group_by(Expr::column("a")),
    );
    assert_eq!(
        failure(&mut context, &statement),
        vec![DiagnosticCode::InvalidAggregationColumn]
    );
}

#[test]
fn test_plain_column_with_aggregate_and_no_group_by() {
    let mut context = context();
    let statement = select(
        Select::new()
            .item(Expr::column("a"))
            .item(Expr::count_asterisk())
            .from(TableRef::table("u")),
    );
    assert_eq!(
        failure(&mut context, &statement),
        vec![DiagnosticCode::InvalidAggregationColumn]
    );
}

#[test]
fn test_aggregate_in_where_is_rejected() {
    let mut context = context();
    let statement = select(
        Select::new()
            .item(Expr::column("a"))
            .from(TableRef::table("u"))
            .filter(Expr::compare(
                ComparisonOp::Greater,
                Expr::count_asterisk(),
                Expr::exact("1"),
            )),
    );
    assert_eq!(
        failure(&mut context, &statement),
        vec![DiagnosticCode::UnsupportedFeature]
    );
}

#[test]
fn test_sibling_items_are_all_diagnosed() {
    let mut context = context();
    let statement = select(
        Select::new()
            .item(Expr::column("missing_one"))
            .item(Expr::column("k"))
            .item(Expr::column("missing_two"))
            .from(TableRef::table("t")),
    );
    assert_eq!(
        failure(&mut context, &statement),
        vec![
            DiagnosticCode::VariableNotFound,
            DiagnosticCode::VariableNotFound
        ]
    );
}

#[test]
fn test_right_join_swaps_operands() {
    let mut context = context();
    let statement = select(Select::new().asterisk().from(TableRef::join(
        JoinKind::RightOuter,
        TableRef::table("t"),
        TableRef::table("u"),
        Some(Expr::compare(
            ComparisonOp::Equal,
            Expr::column("t.k"),
            Expr::column("u.a"),
        )),
    )));
    let plan = plan(&mut context, &statement);

    let join_id = plan.graph.upstream(plan.terminal, 0).unwrap();
    let Operator::Join(join) = plan.graph.operator(join_id) else {
        panic!("expected join");
    };
    assert_eq!(join.kind, PlanJoinKind::LeftOuter);
    let Operator::Scan(first) = plan.graph.operator(plan.graph.upstream(join_id, 0).unwrap()) else {
        panic!("expected scan");
    };
    assert_eq!(first.source.table().name, "u");

    // output columns keep the written order
    let Operator::Emit(emit) = plan.graph.operator(plan.terminal) else {
        panic!("expected emit");
    };
    let names: Vec<_> = emit.columns.iter().map(|c| c.name.as_deref()).collect();
    assert_eq!(names, vec![Some("k"), Some("v"), Some("a"), Some("b")]);
}

#[test]
fn test_join_using_hides_right_column() {
    let mut context = context();
    let statement = select(Select::new().asterisk().from(TableRef::Join {
        kind: JoinKind::Inner,
        left: Box::new(TableRef::table("t")),
        right: Box::new(TableRef::aliased("t", "t2")),
        condition: Some(JoinCondition::Using(vec![Identifier::new("k")])),
    }));
    let plan = plan(&mut context, &statement);
    let Operator::Join(join) = last_operator(&plan) else {
        panic!("expected join");
    };
    assert!(join.condition.is_some());
    let Operator::Emit(emit) = plan.graph.operator(plan.terminal) else {
        panic!("expected emit");
    };
    assert_eq!(emit.columns.len(), 3);
}

#[test]
fn test_join_using_unknown_column() {
    let mut context = context();
    let statement = select(Select::new().asterisk().from(TableRef::Join {
        kind: JoinKind::Inner,
        left: Box::new(TableRef::table("t")),
        right: Box::new(TableRef::table("u")),
        condition: Some(JoinCondition::Using(vec![Identifier::new("k")])),
    }));
    assert_eq!(
        failure(&mut context, &statement),
        vec![DiagnosticCode::ColumnNotFound]
    );
}

#[test]
fn test_natural_join_is_unsupported() {
    let mut context = context();
    let statement = select(Select::new().asterisk().from(TableRef::join(
        JoinKind::NaturalInner,
        TableRef::table("t"),
        TableRef::table("u"),
        None,
    )));
    assert_eq!(
        failure(&mut context, &statement),
        vec![DiagnosticCode::UnsupportedFeature]
    );
}

#[test]
fn test_ambiguous_column_across_join() {
    let mut context = context();
    let statement = select(
        Select::new()
            .item(Expr::column("k"))
            .from(TableRef::table("t"))
            .from(TableRef::aliased("t", "t2")),
    );
    assert_eq!(
        failure(&mut context, &statement),
        vec![DiagnosticCode::ColumnAmbiguous]
    );
}

#[test]
fn test_with_element_becomes_subquery() {
    let mut context = context();
    let statement = Statement::Select(QueryExpr::With {
        recursive: false,
        elements: vec![WithElement {
            name: Identifier::new("c"),
            columns: vec![Identifier::new("n")],
            query: QueryExpr::select(
                Select::new().item(Expr::column("k")).from(TableRef::table("t")),
            ),
        }],
        body: Box::new(QueryExpr::select(
            Select::new().item(Expr::column("n")).from(TableRef::table("c")),
        )),
    });
    let plan = plan(&mut context, &statement);
    assert_eq!(kinds(&plan), vec![Subquery, Project, Emit]);

    let Operator::Subquery(subquery) = plan.graph.operator(plan.graph.upstream(
        plan.graph.upstream(plan.terminal, 0).unwrap(),
        0,
    ).unwrap()) else {
        panic!("expected subquery");
    };
    assert_eq!(subquery.mappings.len(), 1);
    assert_eq!(count_kind(&subquery.graph, Scan), 1);
}

#[test]
fn test_duplicate_with_element() {
    let mut context = context();
    let element = || WithElement {
        name: Identifier::new("c"),
        columns: Vec::new(),
        query: QueryExpr::select(Select::new().item(Expr::column("k")).from(TableRef::table("t"))),
    };
    let statement = Statement::Select(QueryExpr::With {
        recursive: false,
        elements: vec![element(), element()],
        body: Box::new(QueryExpr::select(Select::new().asterisk().from(TableRef::table("c")))),
    });
    assert_eq!(
        failure(&mut context, &statement),
        vec![DiagnosticCode::ViewAlreadyExists]
    );
}

#[test]
fn test_cross_apply_table_function() {
    let mut context = context();
    let statement = select(
        Select::new()
            .item(Expr::column("s.n"))
            .from(TableRef::Apply {
                kind: ApplyKind::Cross,
                operand: Box::new(TableRef::table("t")),
                function: Name::simple("series"),
                arguments: vec![Expr::exact("1"), Expr::column("t.k")],
                correlation: Some(Correlation::new("s")),
            }),
    );
    let plan = plan(&mut context, &statement);
    assert_eq!(kinds(&plan), vec![Scan, Apply, Project, Emit]);
    let apply_id = plan
        .graph
        .upstream(plan.graph.upstream(plan.terminal, 0).unwrap(), 0)
        .unwrap();
    let Operator::Apply(apply) = plan.graph.operator(apply_id) else {
        panic!("expected apply");
    };
    assert_eq!(apply.arguments.len(), 2);
    assert_eq!(apply.columns.len(), 1);
}

#[test]
fn test_apply_unknown_function() {
    let mut context = context();
    let statement = select(Select::new().asterisk().from(TableRef::Apply {
        kind: ApplyKind::Outer,
        operand: Box::new(TableRef::table("t")),
        function: Name::simple("upper"),
        arguments: vec![Expr::column("v")],
        correlation: None,
    }));
    assert_eq!(
        failure(&mut context, &statement),
        vec![DiagnosticCode::FunctionNotFound]
    );
}

#[test]
fn test_values_unify_per_column() {
    let mut context = context();
    let query = QueryExpr::Values(vec![
        vec![Expr::exact("1"), Expr::string("a")],
        vec![Expr::null(), Expr::exact("2")],
    ]);
    let mut graph = Graph::new();
    assert!(analyze_query_expression(&mut context, &mut graph, &query, None, None).is_err());
    assert_eq!(
        context.diagnostics()[0].code,
        DiagnosticCode::InconsistentType
    );

    let mut context = common::context();
    let query = QueryExpr::Values(vec![
        vec![Expr::exact("1"), Expr::string("a")],
        vec![Expr::null(), Expr::string("bc")],
    ]);
    let mut graph = Graph::new();
    let correlation = Correlation::new("x").with_columns(&["n", "s"]);
    let compiled =
        analyze_query_expression(&mut context, &mut graph, &query, None, Some(&correlation))
            .unwrap();
    assert_eq!(compiled.relation.columns[0].ty, Type::Int4);
    assert_eq!(compiled.relation.columns[0].identifier.as_deref(), Some("n"));
    assert_eq!(compiled.relation.correlation.as_deref(), Some("x"));
    let Operator::Values(values) = graph.operator(compiled.output.node()) else {
        panic!("expected values");
    };
    assert_eq!(values.rows.len(), 2);
}

#[test]
fn test_values_arity_mismatch() {
    let mut context = context();
    let statement = Statement::Select(QueryExpr::Values(vec![
        vec![Expr::exact("1")],
        vec![Expr::exact("2"), Expr::exact("3")],
    ]));
    assert_eq!(
        failure(&mut context, &statement),
        vec![DiagnosticCode::InconsistentColumns]
    );
}

#[test]
fn test_order_by_ordinal() {
    let mut context = context();
    let statement = select(
        Select::new()
            .item(Expr::column("v"))
            .item(Expr::column("k"))
            .from(TableRef::table("t"))
            .order_by(SortKey::descending(Expr::exact("2")))
            .limit(Expr::exact("3")),
    );
    let plan = plan(&mut context, &statement);
    let Operator::Limit(limit) = last_operator(&plan) else {
        panic!("expected limit");
    };
    assert_eq!(limit.count, Some(3));
    assert_eq!(limit.sort_keys[0].order, SortOrder::Descending);
    let Operator::Emit(emit) = plan.graph.operator(plan.terminal) else {
        panic!("expected emit");
    };
    assert_eq!(limit.sort_keys[0].variable, emit.columns[1].source);

    let mut context = common::context();
    let statement = select(
        Select::new()
            .item(Expr::column("v"))
            .from(TableRef::table("t"))
            .order_by(SortKey::ascending(Expr::exact("2"))),
    );
    assert_eq!(
        failure(&mut context, &statement),
        vec![DiagnosticCode::ColumnNotFound]
    );
}

#[test]
fn test_order_by_computed_alias() {
    let mut context = context();
    let plan = plan(&mut context, &SqlFixtures::computed_order());
    assert_eq!(kinds(&plan), vec![Scan, Project, Limit, Emit]);
    let Operator::Limit(limit) = last_operator(&plan) else {
        panic!("expected limit");
    };
    assert_eq!(limit.count, None);
    let Operator::Emit(emit) = plan.graph.operator(plan.terminal) else {
        panic!("expected emit");
    };
    assert_eq!(emit.columns[0].name.as_deref(), Some("next"));
    assert_eq!(limit.sort_keys[0].variable, emit.columns[0].source);
}

#[test]
fn test_negative_limit() {
    let mut context = context();
    let statement = select(
        Select::new()
            .asterisk()
            .from(TableRef::table("t"))
            .limit(Expr::exact("-1")),
    );
    assert_eq!(
        failure(&mut context, &statement),
        vec![DiagnosticCode::MalformedSyntax]
    );
}

#[test]
fn test_qualified_asterisk() {
    let mut context = context();
    let statement = select(
        Select {
            items: vec![SelectItem::Asterisk(Some(Name::simple("x")))],
            ..Select::new()
        }
        .from(TableRef::aliased("t", "x"))
        .from(TableRef::table("u")),
    );
    let plan = plan(&mut context, &statement);
    let Operator::Emit(emit) = plan.graph.operator(plan.terminal) else {
        panic!("expected emit");
    };
    assert_eq!(emit.columns.len(), 2);

    let mut context = common::context();
    let statement = select(
        Select {
            items: vec![SelectItem::Asterisk(Some(Name::simple("y")))],
            ..Select::new()
        }
        .from(TableRef::table("t")),
    );
    assert_eq!(
        failure(&mut context, &statement),
        vec![DiagnosticCode::RelationNotFound]
    );
}

#[test]
fn test_derived_table() {
    let mut context = context();
    let inner = QueryExpr::select(
        Select::new()
            .item(Expr::column("v"))
            .from(TableRef::table("t"))
            .filter(Expr::compare(
                ComparisonOp::Greater,
                Expr::column("k"),
                Expr::exact("0"),
            )),
    );
    let statement = select(
        Select::new()
            .item(Expr::column("d.v"))
            .from(TableRef::subquery(inner, Some(Correlation::new("d")))),
    );
    let plan = plan(&mut context, &statement);
    assert_eq!(kinds(&plan), vec![Scan, Filter, Project, Project, Emit]);
}

#[test]
fn test_distinct() {
    let mut context = context();
    let statement = select(
        Select::new()
            .distinct()
            .item(Expr::column("a"))
            .from(TableRef::table("u")),
    );
    let plan = plan(&mut context, &statement);
    assert_eq!(kinds(&plan), vec![Scan, Project, Distinct, Emit]);

    let mut context = common::context();
    let statement = select(
        Select::new()
            .distinct()
            .item(Expr::column("a"))
            .from(TableRef::table("u"))
            .order_by(SortKey::ascending(Expr::column("b"))),
    );
    assert_eq!(
        failure(&mut context, &statement),
        vec![DiagnosticCode::UnsupportedFeature]
    );
}

#[test]
fn test_unknown_table() {
    let mut context = context();
    let statement = select(Select::new().asterisk().from(TableRef::table("nope")));
    assert_eq!(
        failure(&mut context, &statement),
        vec![DiagnosticCode::TableNotFound]
    );
}

#[test]
fn test_aggregate_and_scalar_overloads() {
    let mut context = context();
    let query = QueryExpr::select(
        Select::new()
            .item_as(Expr::function("sum", vec![Expr::column("k")]), "total")
            .from(TableRef::table("t")),
    );
    let mut graph = Graph::new();
    let compiled = analyze_query_expression(&mut context, &mut graph, &query, None, None).unwrap();
    assert_eq!(
        graph.kinds_to(compiled.output.node()),
        vec![Scan, Aggregate, Project]
    );
    assert_eq!(compiled.relation.columns[0].ty, Type::FLEXIBLE_DECIMAL);

    let query = QueryExpr::select(
        Select::new()
            .item(Expr::function("abs", vec![Expr::column("k")]))
            .from(TableRef::table("t")),
    );
    let mut graph = Graph::new();
    let compiled = analyze_query_expression(&mut context, &mut graph, &query, None, None).unwrap();
    assert_eq!(graph.kinds_to(compiled.output.node()), vec![Scan, Project]);
    assert_eq!(compiled.relation.columns[0].ty, Type::Int8);

    // abs(k) is a plain column reference once sum(k) makes the block aggregating
    let statement = select(
        Select::new()
            .item(Expr::function("sum", vec![Expr::column("k")]))
            .item(Expr::function("abs", vec![Expr::column("k")]))
            .from(TableRef::table("t")),
    );
    assert_eq!(
        failure(&mut context, &statement),
        vec![DiagnosticCode::InvalidAggregationColumn]
    );
}

#[test]
fn test_aggregate_only_in_order_by() {
    let mut context = context();
    let statement = select(
        Select::new()
            .item(Expr::column("k"))
            .from(TableRef::table("t"))
            .order_by(SortKey::ascending(Expr::count_asterisk())),
    );
    assert_eq!(
        failure(&mut context, &statement),
        vec![DiagnosticCode::InvalidAggregationColumn]
    );

    let statement = select(
        Select::new()
            .item(Expr::column("a"))
            .from(TableRef::table("u"))
            .group_by(Expr::column("a"))
            .order_by(SortKey::descending(Expr::count_asterisk())),
    );
    let plan = plan(&mut context, &statement);
    assert_eq!(kinds(&plan), vec![Scan, Aggregate, Project, Limit, Emit]);
    let (_, aggregate) = relsql_test_utils::find_operator(&plan.graph, Aggregate).unwrap();
    let Operator::Aggregate(aggregate) = aggregate else {
        panic!("expected aggregate");
    };
    assert_eq!(aggregate.columns.len(), 1);
    let Operator::Limit(limit) = last_operator(&plan) else {
        panic!("expected limit");
    };
    assert_eq!(limit.sort_keys[0].variable, aggregate.columns[0].destination);
    assert_eq!(limit.sort_keys[0].order, SortOrder::Descending);
}

#[test]
fn test_order_by_ungrouped_column() {
    let mut context = context();
    let statement = select(
        Select::new()
            .item(Expr::column("a"))
            .from(TableRef::table("u"))
            .group_by(Expr::column("a"))
            .order_by(SortKey::ascending(Expr::column("b"))),
    );
    assert_eq!(
        failure(&mut context, &statement),
        vec![DiagnosticCode::InvalidAggregationColumn]
    );
}

fn limited(count: Expr) -> Statement {
    select(
        Select::new()
            .item(Expr::column("k"))
            .from(TableRef::table("t"))
            .limit(count),
    )
}

#[test]
fn test_limit_folds_constant_arithmetic() {
    let mut context = context();
    let count = Expr::binary(
        BinaryOp::Multiply,
        Expr::binary(BinaryOp::Add, Expr::exact("2"), Expr::exact("3")),
        Expr::exact("4"),
    );
    let plan = plan(&mut context, &limited(count));
    let Operator::Limit(limit) = last_operator(&plan) else {
        panic!("expected limit");
    };
    assert_eq!(limit.count, Some(20));
    assert!(limit.sort_keys.is_empty());

    let negative = Expr::binary(BinaryOp::Subtract, Expr::exact("2"), Expr::exact("3"));
    assert_eq!(
        failure(&mut context, &limited(negative)),
        vec![DiagnosticCode::MalformedSyntax]
    );
}

#[test]
fn test_limit_must_be_integer_constant() {
    let mut context = context();
    assert_eq!(
        failure(&mut context, &limited(Expr::column("k"))),
        vec![DiagnosticCode::UnsupportedFeature]
    );
    assert_eq!(
        failure(&mut context, &limited(Expr::exact("1.5"))),
        vec![DiagnosticCode::InconsistentType]
    );
    assert_eq!(
        failure(&mut context, &limited(Expr::string("ten"))),
        vec![DiagnosticCode::InconsistentType]
    );
    let division_by_zero = Expr::binary(BinaryOp::Divide, Expr::exact("1"), Expr::exact("0"));
    assert_eq!(
        failure(&mut context, &limited(division_by_zero)),
        vec![DiagnosticCode::UnsupportedFeature]
    );
}

#[test]
fn test_set_operation_type_mismatch() {
    let mut context = context();
    let statement = Statement::Select(QueryExpr::set_operation(
        SetOperator::Union,
        Some(SetQuantifier::All),
        QueryExpr::select(Select::new().item(Expr::column("k")).from(TableRef::table("t"))),
        QueryExpr::select(Select::new().item(Expr::column("v")).from(TableRef::table("t"))),
    ));
    assert_eq!(
        failure(&mut context, &statement),
        vec![DiagnosticCode::InconsistentType]
    );
}

#[test]
fn test_intersect_pairs_columns() {
    let mut context = context();
    let query = QueryExpr::set_operation(
        SetOperator::Intersect,
        None,
        QueryExpr::select(Select::new().item(Expr::column("k")).from(TableRef::table("t"))),
        QueryExpr::select(Select::new().item(Expr::column("a")).from(TableRef::table("u"))),
    );
    let mut graph = Graph::new();
    let compiled = analyze_query_expression(&mut context, &mut graph, &query, None, None).unwrap();
    let Operator::Intersection(intersection) = graph.operator(compiled.output.node()) else {
        panic!("expected intersection");
    };
    assert_eq!(intersection.group_key_pairs.len(), 1);
    assert_eq!(compiled.relation.columns[0].identifier.as_deref(), Some("k"));
}

#[test]
fn test_recursive_with_is_unsupported() {
    let mut context = context();
    let statement = Statement::Select(QueryExpr::With {
        recursive: true,
        elements: vec![WithElement {
            name: Identifier::new("c"),
            columns: Vec::new(),
            query: QueryExpr::select(
                Select::new().item(Expr::column("k")).from(TableRef::table("t")),
            ),
        }],
        body: Box::new(QueryExpr::select(Select::new().asterisk().from(TableRef::table("c")))),
    });
    assert_eq!(
        failure(&mut context, &statement),
        vec![DiagnosticCode::UnsupportedFeature]
    );
}

#[test]
fn test_with_element_scoping() {
    let mut context = context();
    // an element cannot see itself
    let statement = Statement::Select(QueryExpr::With {
        recursive: false,
        elements: vec![WithElement {
            name: Identifier::new("c"),
            columns: Vec::new(),
            query: QueryExpr::select(Select::new().asterisk().from(TableRef::table("c"))),
        }],
        body: Box::new(QueryExpr::select(Select::new().asterisk().from(TableRef::table("c")))),
    });
    assert_eq!(
        failure(&mut context, &statement),
        vec![DiagnosticCode::TableNotFound]
    );

    // a later element sees an earlier one
    let statement = Statement::Select(QueryExpr::With {
        recursive: false,
        elements: vec![
            WithElement {
                name: Identifier::new("c"),
                columns: Vec::new(),
                query: QueryExpr::select(
                    Select::new().item(Expr::column("k")).from(TableRef::table("t")),
                ),
            },
            WithElement {
                name: Identifier::new("d"),
                columns: Vec::new(),
                query: QueryExpr::select(Select::new().asterisk().from(TableRef::table("c"))),
            },
        ],
        body: Box::new(QueryExpr::select(Select::new().asterisk().from(TableRef::table("d")))),
    });
    let plan = plan(&mut context, &statement);
    assert_eq!(kinds(&plan), vec![Subquery, Emit]);
}
