// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Shared helpers for analyzer integration tests

#![allow(dead_code)]

use relsql_analyzer::{
    AnalyzerContext, AnalyzerOptions, DiagnosticCode, StatementResult, analyze_statement,
};
use relsql_ast::{QueryExpr, Select, Statement};
use relsql_ir::{ExecutionPlan, Operator, OperatorKind, Statement as DdlStatement};
use relsql_test_utils::{GraphAssertions, MockCatalogBuilder, init_tracing};

/// A context over the standard test catalog
pub fn context() -> AnalyzerContext {
    context_with(AnalyzerOptions::default())
}

pub fn context_with(options: AnalyzerOptions) -> AnalyzerContext {
    init_tracing();
    let catalog = MockCatalogBuilder::new().with_standard_schema().build_shared();
    AnalyzerContext::new(options, catalog)
}

pub fn select(select: Select) -> Statement {
    Statement::Select(QueryExpr::select(select))
}

/// Analyze a statement expected to yield an execution plan
pub fn plan(context: &mut AnalyzerContext, statement: &Statement) -> ExecutionPlan {
    match analyze_statement(context, statement) {
        StatementResult::ExecutionPlan(plan) => {
            GraphAssertions::assert_connected(&plan.graph);
            plan
        }
        other => panic!("expected an execution plan, got {other:?}"),
    }
}

/// Analyze a statement expected to yield a DDL statement
pub fn ddl(context: &mut AnalyzerContext, statement: &Statement) -> DdlStatement {
    match analyze_statement(context, statement) {
        StatementResult::Statement(statement) => statement,
        other => panic!("expected a statement, got {other:?}"),
    }
}

/// Analyze a statement expected to fail; returns the diagnostic codes
pub fn failure(context: &mut AnalyzerContext, statement: &Statement) -> Vec<DiagnosticCode> {
    match analyze_statement(context, statement) {
        StatementResult::Erroneous(diagnostics) => diagnostics.iter().map(|d| d.code).collect(),
        other => panic!("expected diagnostics, got {other:?}"),
    }
}

/// Operator kinds from the first source to the plan's terminal
pub fn kinds(plan: &ExecutionPlan) -> Vec<OperatorKind> {
    plan.graph.kinds_to(plan.terminal)
}

/// The operator directly upstream of the terminal
pub fn last_operator(plan: &ExecutionPlan) -> &Operator {
    let upstream = plan
        .graph
        .upstream(plan.terminal, 0)
        .expect("terminal has an input");
    plan.graph.operator(upstream)
}
