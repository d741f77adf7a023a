// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! # SELECT blocks
//!
//! Clauses compile in this order, each appending to the frontier:
//!
//! ```text
//! FROM ─▶ WHERE ─▶ [aggregate] ─▶ HAVING ─▶ project ─▶ DISTINCT ─▶ ORDER BY / LIMIT
//!         filter                   filter             distinct     limit
//! ```
//!
//! The select list, HAVING and ORDER BY all compile before the aggregate
//! operator is installed, since each may introduce aggregate calls.
//!
//! ## Projection
//!
//! A select item that is a bare column reuses the column's variable. Any
//! other item, and a repeated column, gets a fresh variable computed by the
//! `project` operator. A select list made only of `*` items emits no
//! `project` unless sort keys need one.
//!
//! ## ORDER BY
//!
//! A sort key is matched, in order, as a select-list name, as a 1-based
//! ordinal, then as an expression over the FROM clause. Expressions that
//! are not already columns of the stream are computed by the `project`.

use std::collections::HashSet;

use relsql_ast::{
    Expr, Identifier, Literal, Name, Select, SelectItem, SetQuantifier, SortDirection, Span,
};
use relsql_ir::decl::{SortOrder, TableColumnRef};
use relsql_ir::plan::{Distinct, Filter, Limit, Project, ProjectColumn, SortKey};
use relsql_ir::scalar::{BinaryOperator, UnaryOperator};
use relsql_ir::{Graph, Operator, Output, Scalar, Type, Variable};
use tracing::debug;

use super::table_ref::compile_from;
use super::{CompiledRelation, scoped};
use crate::aggregation::AggregationProcessor;
use crate::context::AnalyzerContext;
use crate::error::{AnalyzerResult, DiagnosticCode};
use crate::expression::{ScalarResult, compile_scalar};
use crate::name::{ResolvedVariable, normalize, resolve_variable};
use crate::relation::{ColumnInfo, RelationInfo};
use crate::scope::ScopeId;

/// Compile one SELECT block in a fresh scope under `parent`
pub fn compile_select(
    context: &mut AnalyzerContext,
    graph: &mut Graph,
    select: &Select,
    parent: Option<ScopeId>,
) -> AnalyzerResult<CompiledRelation> {
    debug!(
        items = select.items.len(),
        from = select.from.len(),
        "compile select"
    );
    scoped(context, parent, |context, scope| {
        SelectCompiler {
            context,
            graph,
            select,
            scope,
            parent,
            local: HashSet::new(),
        }
        .compile()
    })
}

/// A select-list column before projection
#[derive(Debug)]
struct SelectColumn {
    identifier: Option<String>,
    value: Scalar,
    ty: Type,
    source: Option<TableColumnRef>,
    location: Option<Span>,
}

#[derive(Debug)]
enum SortTarget {
    /// Position in the select list
    Output(usize),
    Expr(Scalar),
}

#[derive(Debug)]
struct SortItem {
    target: SortTarget,
    order: SortOrder,
    location: Option<Span>,
}

/// Evaluate an integer expression built from immediates
///
/// `None` when the expression reads a variable, calls a function or
/// overflows.
fn fold_integer(expr: &Scalar) -> Option<i64> {
    match expr {
        Scalar::Immediate { value, .. } => value.as_i64(),
        Scalar::Cast {
            operand, target, ..
        } if target.is_integer() => fold_integer(operand),
        Scalar::Unary { op, operand } => {
            let value = fold_integer(operand)?;
            match op {
                UnaryOperator::Plus => Some(value),
                UnaryOperator::SignInversion => value.checked_neg(),
                _ => None,
            }
        }
        Scalar::Binary { op, left, right } => {
            let (left, right) = (fold_integer(left)?, fold_integer(right)?);
            match op {
                BinaryOperator::Add => left.checked_add(right),
                BinaryOperator::Subtract => left.checked_sub(right),
                BinaryOperator::Multiply => left.checked_mul(right),
                BinaryOperator::Divide => left.checked_div(right),
                BinaryOperator::Remainder => left.checked_rem(right),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Keep going after a failed item so siblings get diagnosed too
fn first_error<T>(results: Vec<AnalyzerResult<T>>) -> AnalyzerResult<Vec<T>> {
    let mut values = Vec::with_capacity(results.len());
    let mut failed = None;
    for result in results {
        match result {
            Ok(value) => values.push(value),
            Err(error) => failed = failed.or(Some(error)),
        }
    }
    match failed {
        Some(error) => Err(error),
        None => Ok(values),
    }
}

struct SelectCompiler<'a> {
    context: &'a mut AnalyzerContext,
    graph: &'a mut Graph,
    select: &'a Select,
    scope: ScopeId,
    parent: Option<ScopeId>,
    /// Variables produced by the FROM clause
    local: HashSet<Variable>,
}

impl SelectCompiler<'_> {
    fn compile(mut self) -> AnalyzerResult<CompiledRelation> {
        let select = self.select;
        let from = compile_from(self.context, self.graph, &select.from, self.parent)?;
        self.local = from
            .relations
            .iter()
            .flat_map(|r| r.columns.iter().map(|c| c.variable.clone()))
            .collect();
        self.context.scopes.get_mut(self.scope).relations = from.relations;
        let mut output = from.output;

        if let Some(where_clause) = &select.where_clause {
            let condition = self.predicate(where_clause, "WHERE")?;
            if condition.saw_aggregate {
                return Err(self.context.report(
                    DiagnosticCode::UnsupportedFeature,
                    where_clause.span(),
                    "aggregate functions are not allowed in WHERE",
                ));
            }
            output = self.filter(output, condition.expr);
        }

        let mut aggregation = AggregationProcessor::new(self.local.iter().cloned());
        let keys: Vec<_> = select
            .group_by
            .iter()
            .map(|key| self.group_key(key))
            .collect();
        for key in first_error(keys)? {
            aggregation.add_group_key(key);
        }

        let mut columns = self.select_list(&mut aggregation)?;

        let mut having = match &select.having {
            Some(condition) => {
                aggregation.activate();
                Some((self.predicate(condition, "HAVING")?.expr, condition.span()))
            }
            None => None,
        };

        let distinct = select.quantifier == Some(SetQuantifier::Distinct);
        let mut sort_items = self.sort_items(&columns, &mut aggregation)?;
        let limit = self.limit()?;

        let available: HashSet<Variable> = if aggregation.is_active() {
            let mut results = Vec::new();
            for column in &mut columns {
                results.push(aggregation.process(self.context, &mut column.value, column.location));
            }
            if let Some((condition, location)) = &mut having {
                results.push(aggregation.process(self.context, condition, *location));
            }
            for item in &mut sort_items {
                if let SortTarget::Expr(expr) = &mut item.target {
                    results.push(aggregation.process(self.context, expr, item.location));
                }
            }
            first_error(results)?;
            let available = aggregation.output_variables().into_iter().collect();
            output = aggregation.install(self.context, self.graph, output);
            available
        } else {
            self.local.clone()
        };

        if let Some((condition, _)) = having {
            output = self.filter(output, condition);
        }

        let has_expressions = select
            .items
            .iter()
            .any(|item| matches!(item, SelectItem::Expr { .. }));
        let (mut project, output_columns) = self.project_columns(columns);
        let output_variables: HashSet<Variable> =
            output_columns.iter().map(|c| c.variable.clone()).collect();

        let mut sort_keys = Vec::with_capacity(sort_items.len());
        for item in sort_items {
            let variable = match item.target {
                SortTarget::Output(position) => output_columns[position].variable.clone(),
                SortTarget::Expr(Scalar::VariableRef(variable))
                    if output_variables.contains(&variable) =>
                {
                    variable
                }
                SortTarget::Expr(_) if distinct => {
                    return Err(self.context.report(
                        DiagnosticCode::UnsupportedFeature,
                        item.location,
                        "ORDER BY key of a SELECT DISTINCT must be in the select list",
                    ));
                }
                SortTarget::Expr(Scalar::VariableRef(variable))
                    if available.contains(&variable) =>
                {
                    variable
                }
                SortTarget::Expr(value) => {
                    let variable = self.context.bindings.stream_variable(None);
                    project.push(ProjectColumn {
                        variable: variable.clone(),
                        value,
                    });
                    variable
                }
            };
            sort_keys.push(SortKey {
                variable,
                order: item.order,
            });
        }

        if has_expressions || !project.is_empty() {
            debug!(columns = project.len(), "emit project");
            output = self
                .graph
                .add_unary(output, Operator::Project(Project { columns: project }));
        }

        let relation = RelationInfo::new(output_columns);
        if distinct {
            debug!(columns = relation.len(), "emit distinct");
            output = self.graph.add_unary(
                output,
                Operator::Distinct(Distinct {
                    group_keys: relation.variables(),
                }),
            );
        }

        if limit.is_some() || !sort_keys.is_empty() {
            debug!(count = ?limit, keys = sort_keys.len(), "emit limit");
            output = self.graph.add_unary(
                output,
                Operator::Limit(Limit {
                    count: limit,
                    sort_keys,
                }),
            );
        }

        Ok(CompiledRelation::new(output, relation))
    }

    fn filter(&mut self, input: Output, condition: Scalar) -> Output {
        debug!("emit filter");
        self.graph
            .add_unary(input, Operator::Filter(Filter { condition }))
    }

    /// A boolean condition of WHERE or HAVING
    fn predicate(&mut self, expr: &Expr, clause: &str) -> AnalyzerResult<ScalarResult> {
        let result = compile_scalar(self.context, expr, self.scope, None)?;
        if !result.ty.is_boolean_like() {
            return Err(self.context.report(
                DiagnosticCode::InconsistentType,
                expr.span(),
                format!("{clause} condition must be boolean, found {}", result.ty),
            ));
        }
        Ok(result)
    }

    /// Resolve a GROUP BY key to a column of the FROM clause
    fn group_key(&mut self, key: &Expr) -> AnalyzerResult<Variable> {
        let Expr::Variable(name) = key else {
            return Err(self.context.report(
                DiagnosticCode::UnsupportedFeature,
                key.span(),
                "GROUP BY keys must be column references",
            ));
        };
        match resolve_variable(self.context, name, self.scope)? {
            ResolvedVariable::Column(column) if self.local.contains(&column.variable) => {
                Ok(column.variable)
            }
            _ => Err(self.context.report(
                DiagnosticCode::UnsupportedFeature,
                Some(name.span()),
                format!("'{name}' is not a column of the FROM clause"),
            )),
        }
    }

    fn scope_column(&self, variable: &Variable) -> Option<&ColumnInfo> {
        self.context
            .scopes
            .get(self.scope)
            .relations
            .iter()
            .find_map(|r| r.column_of(variable))
    }

    fn select_list(
        &mut self,
        aggregation: &mut AggregationProcessor,
    ) -> AnalyzerResult<Vec<SelectColumn>> {
        let select = self.select;
        let mut results = Vec::with_capacity(select.items.len());
        for item in &select.items {
            let result = match item {
                SelectItem::Asterisk(None) => self.asterisk(),
                SelectItem::Asterisk(Some(name)) => self.qualified_asterisk(name),
                SelectItem::Expr { expr, alias } => {
                    self.select_expr(expr, alias.as_ref(), aggregation).map(|c| vec![c])
                }
            };
            results.push(result);
        }
        Ok(first_error(results)?.into_iter().flatten().collect())
    }

    fn column_entry(column: &ColumnInfo) -> SelectColumn {
        SelectColumn {
            identifier: column.identifier.clone(),
            value: Scalar::variable(column.variable.clone()),
            ty: column.ty.clone(),
            source: column.source.clone(),
            location: None,
        }
    }

    /// `*`: every exported column of the FROM clause, in FROM order
    fn asterisk(&mut self) -> AnalyzerResult<Vec<SelectColumn>> {
        let relations = &self.context.scopes.get(self.scope).relations;
        if relations.is_empty() {
            return Err(self.context.report(
                DiagnosticCode::MalformedSyntax,
                None,
                "SELECT * requires a FROM clause",
            ));
        }
        Ok(relations
            .iter()
            .flat_map(|r| r.exported_columns())
            .map(Self::column_entry)
            .collect())
    }

    /// `r.*`: the exported columns of the FROM relation correlated as `r`
    fn qualified_asterisk(&mut self, name: &Name) -> AnalyzerResult<Vec<SelectColumn>> {
        let Some(last) = name.last() else {
            return Err(self.context.report(DiagnosticCode::MalformedSyntax, None, "empty name"));
        };
        let key = normalize(self.context, last);
        let found = self.context.scopes.get(self.scope).find_relations(&key);
        let columns = match found.as_slice() {
            [relation] => Ok(relation
                .exported_columns()
                .map(Self::column_entry)
                .collect()),
            [] => Err((DiagnosticCode::RelationNotFound, "is not found")),
            _ => Err((DiagnosticCode::RelationAmbiguous, "is ambiguous")),
        };
        columns.map_err(|(code, what)| {
            self.context
                .report(code, Some(name.span()), format!("relation '{key}' {what}"))
        })
    }

    fn select_expr(
        &mut self,
        expr: &Expr,
        alias: Option<&Identifier>,
        aggregation: &mut AggregationProcessor,
    ) -> AnalyzerResult<SelectColumn> {
        let result = compile_scalar(self.context, expr, self.scope, None)?;
        if result.saw_aggregate {
            aggregation.activate();
        }

        let identifier = match (alias, expr) {
            (Some(alias), _) => Some(normalize(self.context, alias)),
            (None, Expr::Variable(name)) => name.last().map(|last| normalize(self.context, last)),
            (None, _) => None,
        };
        let source = result
            .expr
            .as_variable()
            .and_then(|v| self.scope_column(v))
            .and_then(|c| c.source.clone());
        Ok(SelectColumn {
            identifier,
            value: result.expr,
            ty: result.ty,
            source,
            location: expr.span(),
        })
    }

    fn sort_items(
        &mut self,
        columns: &[SelectColumn],
        aggregation: &mut AggregationProcessor,
    ) -> AnalyzerResult<Vec<SortItem>> {
        let select = self.select;
        let mut results = Vec::with_capacity(select.order_by.len());
        for key in &select.order_by {
            let order = match key.direction {
                Some(SortDirection::Descending) => SortOrder::Descending,
                Some(SortDirection::Ascending) | None => SortOrder::Ascending,
            };
            let location = key.key.span();
            let target = self.sort_target(&key.key, columns);
            results.push(target.map(|(target, saw_aggregate)| {
                if saw_aggregate {
                    aggregation.activate();
                }
                SortItem {
                    target,
                    order,
                    location,
                }
            }));
        }
        first_error(results)
    }

    /// The sort target of `key`, and whether it calls an aggregate
    fn sort_target(
        &mut self,
        key: &Expr,
        columns: &[SelectColumn],
    ) -> AnalyzerResult<(SortTarget, bool)> {
        match key {
            Expr::Variable(name) if name.len() == 1 => {
                if let Some(position) = self.output_named(name, columns)? {
                    return Ok((SortTarget::Output(position), false));
                }
            }
            Expr::Literal(Literal::ExactNumeric { negative, digits }) => {
                let position = digits
                    .parse::<usize>()
                    .ok()
                    .filter(|p| !negative && (1..=columns.len()).contains(p));
                return match position {
                    Some(p) => Ok((SortTarget::Output(p - 1), false)),
                    None => Err(self.context.report(
                        DiagnosticCode::ColumnNotFound,
                        key.span(),
                        format!(
                            "ORDER BY position {}{digits} is not in the select list",
                            if *negative { "-" } else { "" }
                        ),
                    )),
                };
            }
            _ => {}
        }
        let result = compile_scalar(self.context, key, self.scope, None)?;
        Ok((SortTarget::Expr(result.expr), result.saw_aggregate))
    }

    /// The select-list column named `name`, if exactly one item has that name
    fn output_named(
        &mut self,
        name: &Name,
        columns: &[SelectColumn],
    ) -> AnalyzerResult<Option<usize>> {
        let Some(last) = name.last() else {
            return Ok(None);
        };
        let key = normalize(self.context, last);
        let matches: Vec<usize> = columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.identifier.as_deref() == Some(key.as_str()))
            .map(|(i, _)| i)
            .collect();
        match matches.as_slice() {
            [] => Ok(None),
            [first, rest @ ..] => {
                if rest.iter().all(|i| columns[*i].value == columns[*first].value) {
                    Ok(Some(*first))
                } else {
                    Err(self.context.report(
                        DiagnosticCode::ColumnAmbiguous,
                        Some(name.span()),
                        format!("ORDER BY key '{key}' is ambiguous"),
                    ))
                }
            }
        }
    }

    /// LIMIT: a non-negative integer constant expression
    fn limit(&mut self) -> AnalyzerResult<Option<u64>> {
        let select = self.select;
        let Some(expr) = &select.limit else {
            return Ok(None);
        };
        let result = compile_scalar(self.context, expr, self.scope, None)?;
        if !result.ty.is_integer() {
            return Err(self.context.report(
                DiagnosticCode::InconsistentType,
                expr.span(),
                format!("LIMIT must be an integer, found {}", result.ty),
            ));
        }
        let Some(count) = fold_integer(&result.expr) else {
            return Err(self.context.report(
                DiagnosticCode::UnsupportedFeature,
                expr.span(),
                "LIMIT must be a constant",
            ));
        };
        u64::try_from(count).map(Some).map_err(|_| {
            self.context.report(
                DiagnosticCode::MalformedSyntax,
                expr.span(),
                format!("LIMIT must not be negative, found {count}"),
            )
        })
    }

    /// Bind each select column to a variable, collecting `project` entries
    fn project_columns(
        &mut self,
        columns: Vec<SelectColumn>,
    ) -> (Vec<ProjectColumn>, Vec<ColumnInfo>) {
        let mut project = Vec::new();
        let mut used = HashSet::new();
        let mut output = Vec::with_capacity(columns.len());
        for column in columns {
            let variable = match column.value {
                Scalar::VariableRef(variable)
                    if self.available_as_is(&variable) && !used.contains(&variable) =>
                {
                    variable
                }
                value => {
                    let variable = self
                        .context
                        .bindings
                        .stream_variable(column.identifier.as_deref());
                    project.push(ProjectColumn {
                        variable: variable.clone(),
                        value,
                    });
                    variable
                }
            };
            used.insert(variable.clone());
            let mut info = ColumnInfo::new(column.identifier, variable, column.ty);
            info.source = column.source;
            output.push(info);
        }
        (project, output)
    }

    /// Variables a select column can pass through without projection
    fn available_as_is(&self, variable: &Variable) -> bool {
        variable.is_stream() && !self.is_outer(variable)
    }

    /// Whether `variable` belongs to an enclosing query block
    fn is_outer(&self, variable: &Variable) -> bool {
        let Some(parent) = self.parent else {
            return false;
        };
        !self.local.contains(variable)
            && self.context.scopes.chain(parent).into_iter().any(|id| {
                self.context
                    .scopes
                    .get(id)
                    .relations
                    .iter()
                    .any(|r| r.column_of(variable).is_some())
            })
    }
}
