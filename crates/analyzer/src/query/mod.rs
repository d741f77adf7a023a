// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! # Query expression compiler
//!
//! Compiles query expressions into operators of a caller-supplied
//! [`Graph`] and returns the dangling output together with the
//! [`RelationInfo`] describing its columns.
//!
//! ## Scopes
//!
//! Every query block runs in its own scope pushed onto the context's scope
//! arena. The parent is the scope of the enclosing block, so correlated
//! references resolve by walking the chain outwards. The scope is popped
//! when the block returns, whether it succeeded or not.
//!
//! ## Layout
//!
//! - [`select`]: one SELECT block, clause by clause
//! - [`table_ref`]: FROM items (tables, CTE references, derived tables,
//!   joins, APPLY)
//! - [`values`]: table value constructors
//! - [`set_operation`]: UNION / INTERSECT / EXCEPT
//! - [`with`]: WITH clauses

pub mod select;
pub mod set_operation;
pub mod table_ref;
pub mod values;
pub mod with;

use std::collections::HashSet;

use relsql_ast::{Correlation, QueryExpr};
use relsql_ir::{Graph, Output};
use tracing::debug;

use crate::context::AnalyzerContext;
use crate::error::{AnalyzerResult, DiagnosticCode};
use crate::name::normalize;
use crate::relation::RelationInfo;
use crate::scope::ScopeId;

/// A compiled table expression
#[derive(Debug)]
pub struct CompiledRelation {
    /// The dangling output carrying the relation's rows
    pub output: Output,
    pub relation: RelationInfo,
}

impl CompiledRelation {
    pub fn new(output: Output, relation: RelationInfo) -> Self {
        Self { output, relation }
    }
}

/// Compile `query` into `graph`
///
/// `parent` is the scope of the enclosing query block, if any.
pub fn compile_query(
    context: &mut AnalyzerContext,
    graph: &mut Graph,
    query: &QueryExpr,
    parent: Option<ScopeId>,
) -> AnalyzerResult<CompiledRelation> {
    match query {
        QueryExpr::Select(select) => select::compile_select(context, graph, select, parent),
        QueryExpr::Values(rows) => values::compile_values(context, graph, rows, parent),
        QueryExpr::SetOperation {
            op,
            quantifier,
            corresponding,
            left,
            right,
        } => set_operation::compile_set_operation(
            context,
            graph,
            set_operation::SetOperation {
                op: *op,
                quantifier: *quantifier,
                corresponding: corresponding.as_deref(),
                left,
                right,
            },
            parent,
        ),
        QueryExpr::With {
            recursive,
            elements,
            body,
        } => with::compile_with(context, graph, *recursive, elements, body, parent),
    }
}

/// Run `f` in a fresh scope under `parent`, popping it afterwards
pub(crate) fn scoped<T>(
    context: &mut AnalyzerContext,
    parent: Option<ScopeId>,
    f: impl FnOnce(&mut AnalyzerContext, ScopeId) -> AnalyzerResult<T>,
) -> AnalyzerResult<T> {
    let scope = context.scopes.push(parent);
    let result = f(context, scope);
    context.scopes.pop(scope);
    result
}

/// Apply `AS name [(c1, ...)]` to a compiled relation
///
/// An explicit column list renames the exported columns positionally and
/// must match their count exactly.
pub(crate) fn apply_correlation(
    context: &mut AnalyzerContext,
    mut relation: RelationInfo,
    correlation: Option<&Correlation>,
) -> AnalyzerResult<RelationInfo> {
    let Some(correlation) = correlation else {
        return Ok(relation);
    };
    let name = normalize(context, &correlation.name);
    let location = Some(correlation.name.span);

    if !correlation.columns.is_empty() {
        let exported: Vec<usize> = relation
            .columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.exported)
            .map(|(i, _)| i)
            .collect();
        if exported.len() != correlation.columns.len() {
            return Err(context.report(
                DiagnosticCode::InconsistentColumns,
                location,
                format!(
                    "'{name}' has {} columns but {} column names were given",
                    exported.len(),
                    correlation.columns.len()
                ),
            ));
        }

        let mut seen = HashSet::new();
        let mut names = Vec::with_capacity(correlation.columns.len());
        for column in &correlation.columns {
            let column_name = normalize(context, column);
            if !seen.insert(column_name.clone()) {
                return Err(context.report(
                    DiagnosticCode::ColumnAlreadyExists,
                    Some(column.span),
                    format!("column '{column_name}' is already defined in '{name}'"),
                ));
            }
            names.push(column_name);
        }
        for (position, column_name) in exported.into_iter().zip(names) {
            relation.columns[position].identifier = Some(column_name);
        }
    }

    debug!(correlation = %name, columns = relation.len(), "apply correlation");
    relation.correlation = Some(name);
    Ok(relation)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use relsql_catalog::{Catalog, MemoryCatalog};
    use relsql_ir::Type;

    use super::*;
    use crate::options::AnalyzerOptions;
    use crate::relation::ColumnInfo;

    fn context() -> AnalyzerContext {
        let catalog: Arc<dyn Catalog> = Arc::new(MemoryCatalog::new("db"));
        AnalyzerContext::new(AnalyzerOptions::default(), catalog)
    }

    fn relation(context: &mut AnalyzerContext) -> RelationInfo {
        let a = context.bindings.stream_variable(Some("a"));
        let b = context.bindings.stream_variable(Some("b"));
        RelationInfo::new(vec![
            ColumnInfo::new(Some("a".into()), a, Type::Int4),
            ColumnInfo::new(Some("b".into()), b, Type::Int8),
        ])
    }

    #[test]
    fn test_correlation_renames_columns() {
        let mut context = context();
        let relation = relation(&mut context);
        let correlation = Correlation::new("X").with_columns(&["P", "q"]);
        let renamed = apply_correlation(&mut context, relation, Some(&correlation)).unwrap();
        assert_eq!(renamed.correlation.as_deref(), Some("x"));
        assert_eq!(renamed.find_columns("p"), vec![0]);
        assert_eq!(renamed.find_columns("q"), vec![1]);
    }

    #[test]
    fn test_correlation_column_count_and_duplicates() {
        let mut context = context();
        let first = relation(&mut context);
        let second = first.clone();
        let short = Correlation::new("x").with_columns(&["p"]);
        assert!(apply_correlation(&mut context, first, Some(&short)).is_err());
        let duplicate = Correlation::new("x").with_columns(&["p", "P"]);
        assert!(apply_correlation(&mut context, second, Some(&duplicate)).is_err());

        let codes: Vec<_> = context.diagnostics().iter().map(|d| d.code).collect();
        assert_eq!(
            codes,
            vec![
                DiagnosticCode::InconsistentColumns,
                DiagnosticCode::ColumnAlreadyExists
            ]
        );
    }

    #[test]
    fn test_scoped_pops_on_error() {
        let mut context = context();
        let before = context.scopes.len();
        let result: AnalyzerResult<()> = scoped(&mut context, None, |context, _| {
            Err(context.report(DiagnosticCode::MalformedSyntax, None, "boom"))
        });
        assert!(result.is_err());
        assert_eq!(context.scopes.len(), before);
    }
}
