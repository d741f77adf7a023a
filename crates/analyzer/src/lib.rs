// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! # relsql analyzer
//!
//! Semantic analysis of SQL syntax trees into the relational IR.
//!
//! ## Overview
//!
//! The analyzer resolves every name against the catalog and the enclosing
//! query scopes, types every expression, and lowers queries into a graph of
//! relational operators:
//!
//! - **Scalar expressions** become IR scalar trees ([`analyze_scalar_expression`])
//! - **Query expressions** become operator subgraphs ([`analyze_query_expression`])
//! - **Statements** become execution plans or DDL statements ([`analyze_statement`])
//!
//! Failures never panic. Each failure appends a [`Diagnostic`] to the
//! [`AnalyzerContext`] and the entry point returns an empty result.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use relsql_analyzer::{AnalyzerContext, AnalyzerOptions, StatementResult, analyze_statement};
//!
//! let mut context = AnalyzerContext::new(AnalyzerOptions::default(), Arc::new(catalog));
//! match analyze_statement(&mut context, &statement) {
//!     StatementResult::ExecutionPlan(plan) => println!("{} operators", plan.graph.len()),
//!     StatementResult::Statement(ddl) => println!("{ddl:?}"),
//!     StatementResult::Erroneous(diagnostics) => {
//!         for diagnostic in diagnostics {
//!             eprintln!("{diagnostic}");
//!         }
//!     }
//! }
//! ```

pub mod aggregation;
pub mod context;
pub mod error;
pub mod expression;
pub mod function;
pub mod literal;
pub mod name;
pub mod options;
pub mod query;
pub mod relation;
pub mod scope;
pub mod statement;
pub mod type_resolver;
pub mod typing;

pub use context::AnalyzerContext;
pub use error::{AnalyzerResult, Diagnostic, DiagnosticCode, ErrorReported};
pub use expression::ScalarResult;
pub use literal::TypeContext;
pub use options::AnalyzerOptions;
pub use query::CompiledRelation;
pub use relation::{ColumnInfo, RelationInfo};
pub use scope::ScopeId;
pub use statement::StatementResult;

use relsql_ast::{Correlation, DataType, Expr, Literal, QueryExpr, Statement};
use relsql_ir::{Graph, Type};
use tracing::debug;

/// Compile a scalar expression
///
/// Names resolve in `scope` and its ancestors; without a scope only
/// catalog variables and host parameters are visible.
pub fn analyze_scalar_expression(
    context: &mut AnalyzerContext,
    expr: &Expr,
    scope: Option<ScopeId>,
    target: Option<&TypeContext>,
) -> AnalyzerResult<ScalarResult> {
    match scope {
        Some(scope) => expression::compile_scalar(context, expr, scope, target),
        None => query::scoped(context, None, |context, scope| {
            expression::compile_scalar(context, expr, scope, target)
        }),
    }
}

/// Compile a query expression into `graph`
///
/// `scope` is the enclosing query block for correlated references. The
/// returned relation describes the frontier, renamed by `correlation`.
pub fn analyze_query_expression(
    context: &mut AnalyzerContext,
    graph: &mut Graph,
    query: &QueryExpr,
    scope: Option<ScopeId>,
    correlation: Option<&Correlation>,
) -> AnalyzerResult<CompiledRelation> {
    debug!(nodes = graph.len(), "analyze query expression");
    let compiled = query::compile_query(context, graph, query, scope)?;
    let relation = query::apply_correlation(context, compiled.relation, correlation)?;
    Ok(CompiledRelation::new(compiled.output, relation))
}

/// Resolve a syntactic data type
pub fn analyze_type(context: &mut AnalyzerContext, data_type: &DataType) -> AnalyzerResult<Type> {
    type_resolver::resolve_type(context, data_type)
}

/// Type a literal, optionally in the context of a target type
pub fn analyze_literal(
    context: &mut AnalyzerContext,
    literal: &Literal,
    target: Option<&TypeContext>,
) -> AnalyzerResult<ScalarResult> {
    let (expr, ty) = literal::resolve_literal(context, literal, target)?;
    Ok(ScalarResult {
        expr,
        ty,
        saw_aggregate: false,
    })
}

/// Compile a top-level statement
///
/// On failure the diagnostics recorded during this call are drained from
/// the context into [`StatementResult::Erroneous`].
pub fn analyze_statement(context: &mut AnalyzerContext, statement: &Statement) -> StatementResult {
    debug!(statement = statement_kind(statement), "analyze statement");
    match statement::compile_statement(context, statement) {
        Ok(compiled) => compiled.into(),
        Err(ErrorReported) => StatementResult::Erroneous(context.take_diagnostics()),
    }
}

fn statement_kind(statement: &Statement) -> &'static str {
    match statement {
        Statement::Select(_) => "select",
        Statement::Insert(_) => "insert",
        Statement::Update(_) => "update",
        Statement::Delete(_) => "delete",
        Statement::CreateTable(_) => "create table",
        Statement::DropTable { .. } => "drop table",
        Statement::CreateIndex(_) => "create index",
        Statement::DropIndex { .. } => "drop index",
    }
}
