// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! # FROM items
//!
//! A FROM item compiles to one dangling output and the list of relations
//! it brings into the block's scope. Joins keep both sides' relations in
//! user-written order, each under its own correlation name.
//!
//! ```text
//! t                     scan(t)
//! cte                   subquery(copy of the CTE graph)
//! (query) AS x          <query operators, inline>
//! a JOIN b ON c         join(a, b; c)
//! a RIGHT JOIN b ON c   join[left outer](b, a; c)
//! a, b                  join[cross](a, b)
//! a CROSS APPLY f(..)   apply(a; f)
//! ```

use std::sync::Arc;

use relsql_ast::{
    ApplyKind as AstApplyKind, Correlation, Expr, Identifier, JoinCondition,
    JoinKind as AstJoinKind, Name, TableRef,
};
use relsql_ir::decl::{FunctionDecl, TableColumnRef};
use relsql_ir::plan::{
    Apply, ApplyColumn, ApplyKind, Join, JoinKind, Scan, ScanColumn, Subquery, SubqueryMapping,
    Values,
};
use relsql_ir::scalar::ComparisonOperator;
use relsql_ir::{Graph, Operator, Output, Scalar, Type};
use tracing::{debug, trace};

use super::{CompiledRelation, apply_correlation, compile_query, scoped};
use crate::context::AnalyzerContext;
use crate::error::{AnalyzerResult, DiagnosticCode, ErrorReported};
use crate::expression::compile_scalar;
use crate::function::{common_parameter_type, select_overload};
use crate::literal::TypeContext;
use crate::name::{normalize, resolve_functions, resolve_table};
use crate::relation::{ColumnInfo, RelationInfo};
use crate::scope::{CteInfo, ScopeId};
use crate::typing::unify;

/// A compiled FROM item
#[derive(Debug)]
pub struct CompiledFrom {
    pub output: Output,
    /// Relations in scope order
    pub relations: Vec<RelationInfo>,
}

/// Compile a FROM clause; items are cross-joined left to right
///
/// An empty FROM clause yields a single empty row.
pub fn compile_from(
    context: &mut AnalyzerContext,
    graph: &mut Graph,
    items: &[TableRef],
    outer: Option<ScopeId>,
) -> AnalyzerResult<CompiledFrom> {
    let mut items = items.iter();
    let Some(first) = items.next() else {
        let output = graph.add_source(Operator::Values(Values {
            columns: Vec::new(),
            rows: vec![Vec::new()],
        }));
        return Ok(CompiledFrom {
            output,
            relations: Vec::new(),
        });
    };

    let mut from = compile_table_ref(context, graph, first, outer)?;
    for item in items {
        let right = compile_table_ref(context, graph, item, outer)?;
        let output = graph.add_binary(
            from.output,
            right.output,
            Operator::Join(Join {
                kind: JoinKind::Cross,
                condition: None,
            }),
        );
        from.relations.extend(right.relations);
        from.output = output;
    }
    Ok(from)
}

/// Compile one FROM item
///
/// `outer` is the scope enclosing the query block; derived tables and join
/// conditions see it, but not the block's other FROM items.
pub fn compile_table_ref(
    context: &mut AnalyzerContext,
    graph: &mut Graph,
    table_ref: &TableRef,
    outer: Option<ScopeId>,
) -> AnalyzerResult<CompiledFrom> {
    let (output, relations) = match table_ref {
        TableRef::Table { name, correlation } => {
            let compiled = compile_named(context, graph, name, correlation.as_ref(), outer)?;
            (compiled.output, vec![compiled.relation])
        }
        TableRef::Subquery { query, correlation } => {
            let compiled = compile_query(context, graph, query, outer)?;
            let mut relation =
                apply_correlation(context, compiled.relation, correlation.as_ref())?;
            relation.table = None;
            relation.index = None;
            (compiled.output, vec![relation])
        }
        TableRef::Join {
            kind,
            left,
            right,
            condition,
        } => {
            let compiled =
                compile_join(context, graph, *kind, left, right, condition.as_ref(), outer)?;
            (compiled.output, compiled.relations)
        }
        TableRef::Apply {
            kind,
            operand,
            function,
            arguments,
            correlation,
        } => {
            let compiled = compile_apply(
                context,
                graph,
                ApplyCall {
                    kind: *kind,
                    function,
                    arguments,
                    correlation: correlation.as_ref(),
                },
                operand,
                outer,
            )?;
            (compiled.output, compiled.relations)
        }
    };
    Ok(CompiledFrom { output, relations })
}

/// A table name: a WITH element in scope, else a catalog table
fn compile_named(
    context: &mut AnalyzerContext,
    graph: &mut Graph,
    name: &Name,
    correlation: Option<&Correlation>,
    outer: Option<ScopeId>,
) -> AnalyzerResult<CompiledRelation> {
    if let ([identifier], Some(scope)) = (name.segments.as_slice(), outer) {
        let key = normalize(context, identifier);
        if let Some(cte) = context.scopes.find_cte(scope, &key).cloned() {
            trace!(name = %key, "resolved WITH element");
            return instantiate_cte(context, graph, &key, cte, correlation);
        }
    }
    compile_scan(context, graph, name, correlation)
}

/// Copy a precompiled WITH element into a `subquery` node
fn instantiate_cte(
    context: &mut AnalyzerContext,
    graph: &mut Graph,
    name: &str,
    cte: CteInfo,
    correlation: Option<&Correlation>,
) -> AnalyzerResult<CompiledRelation> {
    let mut mappings = Vec::with_capacity(cte.relation.len());
    let mut columns = Vec::with_capacity(cte.relation.len());
    for column in &cte.relation.columns {
        let destination = context
            .bindings
            .stream_variable(column.identifier.as_deref());
        mappings.push(SubqueryMapping {
            source: column.variable.clone(),
            destination: destination.clone(),
        });
        columns.push(
            ColumnInfo::new(column.identifier.clone(), destination, column.ty.clone())
                .with_exported(column.exported),
        );
    }

    debug!(name, columns = columns.len(), "emit subquery for WITH element");
    let output = graph.add_source(Operator::Subquery(Subquery {
        graph: cte.graph,
        output: cte.output,
        mappings,
    }));
    let relation = RelationInfo::new(columns).with_correlation(Some(name.to_string()));
    let relation = apply_correlation(context, relation, correlation)?;
    Ok(CompiledRelation::new(output, relation))
}

/// Scan a catalog table, through its primary index when it has one
fn compile_scan(
    context: &mut AnalyzerContext,
    graph: &mut Graph,
    name: &Name,
    correlation: Option<&Correlation>,
) -> AnalyzerResult<CompiledRelation> {
    let (schema, table) = resolve_table(context, name)?;
    let primary = schema.find_primary_index(&table);
    let source = match &primary {
        Some(index) => context.bindings.index(Arc::clone(index)),
        None => context.bindings.table(Arc::clone(&table)),
    };

    let mut scan_columns = Vec::with_capacity(table.columns.len());
    let mut columns = Vec::with_capacity(table.columns.len());
    for (position, decl) in table.columns.iter().enumerate() {
        if !decl.is_exported() {
            continue;
        }
        let Some(column) = TableColumnRef::new(Arc::clone(&table), position) else {
            continue;
        };
        let destination = context.bindings.stream_variable(Some(decl.name.as_str()));
        scan_columns.push(ScanColumn {
            source: context.bindings.table_column(column.clone()),
            destination: destination.clone(),
        });
        columns.push(
            ColumnInfo::new(Some(decl.name.clone()), destination, decl.ty.clone())
                .with_source(column),
        );
    }

    debug!(table = %table.name, columns = columns.len(), "emit scan");
    let output = graph.add_source(Operator::Scan(Scan {
        source,
        columns: scan_columns,
    }));
    let relation = RelationInfo {
        columns,
        table: Some(Arc::clone(&table)),
        index: primary,
        correlation: Some(table.name.clone()),
    };
    let relation = apply_correlation(context, relation, correlation)?;
    Ok(CompiledRelation::new(output, relation))
}

fn compile_join(
    context: &mut AnalyzerContext,
    graph: &mut Graph,
    kind: AstJoinKind,
    left: &TableRef,
    right: &TableRef,
    condition: Option<&JoinCondition>,
    outer: Option<ScopeId>,
) -> AnalyzerResult<CompiledFrom> {
    let (ir_kind, swapped) = match kind {
        AstJoinKind::Cross => (JoinKind::Cross, false),
        AstJoinKind::Inner => (JoinKind::Inner, false),
        AstJoinKind::LeftOuter => (JoinKind::LeftOuter, false),
        AstJoinKind::RightOuter => (JoinKind::LeftOuter, true),
        AstJoinKind::FullOuter => (JoinKind::FullOuter, false),
        AstJoinKind::NaturalInner
        | AstJoinKind::NaturalLeftOuter
        | AstJoinKind::NaturalRightOuter
        | AstJoinKind::NaturalFullOuter => {
            return Err(context.report(
                DiagnosticCode::UnsupportedFeature,
                None,
                "NATURAL JOIN is not supported",
            ));
        }
    };

    let left = compile_table_ref(context, graph, left, outer)?;
    let mut right = compile_table_ref(context, graph, right, outer)?;

    let condition = match (ir_kind, condition) {
        (JoinKind::Cross, None) => None,
        (JoinKind::Cross, Some(_)) => {
            return Err(context.report(
                DiagnosticCode::MalformedSyntax,
                None,
                "CROSS JOIN does not take a join condition",
            ));
        }
        (_, None) => {
            return Err(context.report(
                DiagnosticCode::MalformedSyntax,
                None,
                "join requires ON or USING",
            ));
        }
        (_, Some(JoinCondition::On(expr))) => Some(compile_join_condition(
            context,
            expr,
            &left.relations,
            &right.relations,
            outer,
        )?),
        (_, Some(JoinCondition::Using(columns))) => Some(compile_using(
            context,
            columns,
            &left.relations,
            &mut right.relations,
        )?),
    };

    debug!(kind = ?ir_kind, swapped, "emit join");
    let join = Operator::Join(Join {
        kind: ir_kind,
        condition,
    });
    let output = if swapped {
        graph.add_binary(right.output, left.output, join)
    } else {
        graph.add_binary(left.output, right.output, join)
    };

    let mut relations = left.relations;
    relations.extend(right.relations);
    Ok(CompiledFrom { output, relations })
}

/// Compile an ON condition in a scope holding exactly the two operands
fn compile_join_condition(
    context: &mut AnalyzerContext,
    expr: &Expr,
    left: &[RelationInfo],
    right: &[RelationInfo],
    outer: Option<ScopeId>,
) -> AnalyzerResult<Scalar> {
    scoped(context, outer, |context, scope| {
        let relations = context.scopes.get_mut(scope);
        relations.relations.extend(left.iter().cloned());
        relations.relations.extend(right.iter().cloned());

        let result = compile_scalar(context, expr, scope, None)?;
        if result.saw_aggregate {
            return Err(context.report(
                DiagnosticCode::UnsupportedFeature,
                expr.span(),
                "aggregate functions are not allowed in join conditions",
            ));
        }
        if !result.ty.is_boolean_like() {
            return Err(context.report(
                DiagnosticCode::InconsistentType,
                expr.span(),
                format!("join condition must be boolean, found {}", result.ty),
            ));
        }
        Ok(result.expr)
    })
}

/// The single exported column named `name` across `relations`
fn find_using_column(
    context: &mut AnalyzerContext,
    relations: &[RelationInfo],
    name: &str,
    identifier: &Identifier,
) -> AnalyzerResult<(usize, usize)> {
    let found: Vec<(usize, usize)> = relations
        .iter()
        .enumerate()
        .flat_map(|(r, relation)| {
            relation
                .columns
                .iter()
                .enumerate()
                .filter(|(_, c)| c.exported && c.is_named(name))
                .map(move |(c, _)| (r, c))
        })
        .collect();
    match found.as_slice() {
        [only] => Ok(*only),
        [] => Err(context.report(
            DiagnosticCode::ColumnNotFound,
            Some(identifier.span),
            format!("USING column '{name}' is not found"),
        )),
        _ => Err(context.report(
            DiagnosticCode::ColumnAmbiguous,
            Some(identifier.span),
            format!("USING column '{name}' is ambiguous"),
        )),
    }
}

/// `USING (c, ...)`: equate same-named columns and hide the right ones
fn compile_using(
    context: &mut AnalyzerContext,
    columns: &[Identifier],
    left: &[RelationInfo],
    right: &mut [RelationInfo],
) -> AnalyzerResult<Scalar> {
    let mut condition: Option<Scalar> = None;
    let mut hidden = Vec::with_capacity(columns.len());
    for identifier in columns {
        let name = normalize(context, identifier);
        let (lr, lc) = find_using_column(context, left, &name, identifier)?;
        let (rr, rc) = find_using_column(context, right, &name, identifier)?;
        let left_column = &left[lr].columns[lc];
        let right_column = &right[rr].columns[rc];
        if unify(&left_column.ty, &right_column.ty).is_none() {
            return Err(context.report(
                DiagnosticCode::InconsistentType,
                Some(identifier.span),
                format!(
                    "USING column '{name}' compares {} with {}",
                    left_column.ty, right_column.ty
                ),
            ));
        }
        let equality = Scalar::compare(
            ComparisonOperator::Equal,
            Scalar::variable(left_column.variable.clone()),
            Scalar::variable(right_column.variable.clone()),
        );
        condition = Some(match condition {
            Some(previous) => Scalar::and(previous, equality),
            None => equality,
        });
        hidden.push((rr, rc));
    }
    for (r, c) in hidden {
        right[r].columns[c].exported = false;
    }
    condition.ok_or_else(|| {
        context.report(
            DiagnosticCode::MalformedSyntax,
            None,
            "USING requires at least one column",
        )
    })
}

/// The function side of an APPLY
struct ApplyCall<'a> {
    kind: AstApplyKind,
    function: &'a Name,
    arguments: &'a [Expr],
    correlation: Option<&'a Correlation>,
}

/// `operand CROSS|OUTER APPLY f(args)`; arguments see the operand
fn compile_apply(
    context: &mut AnalyzerContext,
    graph: &mut Graph,
    call: ApplyCall<'_>,
    operand: &TableRef,
    outer: Option<ScopeId>,
) -> AnalyzerResult<CompiledFrom> {
    let operand = compile_table_ref(context, graph, operand, outer)?;

    let (key, candidates) = resolve_functions(context, call.function, call.arguments.len())?;
    let candidates: Vec<Arc<FunctionDecl>> = candidates
        .into_iter()
        .filter(|f| f.features.table_valued)
        .collect();
    if candidates.is_empty() {
        return Err(context.report(
            DiagnosticCode::FunctionNotFound,
            Some(call.function.span()),
            format!("table-valued function '{}' is not found", call.function),
        ));
    }

    let (arguments, types) = scoped(context, outer, |context, scope| {
        context
            .scopes
            .get_mut(scope)
            .relations
            .extend(operand.relations.iter().cloned());
        let mut arguments = Vec::with_capacity(call.arguments.len());
        let mut types = Vec::with_capacity(call.arguments.len());
        let mut failed: Option<ErrorReported> = None;
        for (position, argument) in call.arguments.iter().enumerate() {
            let target = common_parameter_type(&candidates, position).map(TypeContext::new);
            match compile_scalar(context, argument, scope, target.as_ref()) {
                Ok(result) if result.saw_aggregate => {
                    failed = Some(context.report(
                        DiagnosticCode::UnsupportedFeature,
                        argument.span(),
                        "aggregate functions are not allowed in APPLY arguments",
                    ));
                }
                Ok(result) => {
                    arguments.push(result.expr);
                    types.push(result.ty);
                }
                Err(error) => failed = Some(error),
            }
        }
        match failed {
            Some(error) => Err(error),
            None => Ok((arguments, types)),
        }
    })?;

    let decl = select_overload(
        context,
        &key,
        &candidates,
        &types,
        Some(call.function.span()),
    )?;
    let fields = match &decl.return_type {
        Type::Table(fields) if !fields.is_empty() => fields.clone(),
        other => {
            return Err(context.report(
                DiagnosticCode::InconsistentType,
                Some(call.function.span()),
                format!("'{}' must return a non-empty table, found {other}", decl.name),
            ));
        }
    };

    let mut apply_columns = Vec::with_capacity(fields.len());
    let mut columns = Vec::with_capacity(fields.len());
    for (position, field) in fields.into_iter().enumerate() {
        let variable = context.bindings.stream_variable(Some(field.name.as_str()));
        apply_columns.push(ApplyColumn {
            position,
            variable: variable.clone(),
        });
        columns.push(ColumnInfo::new(Some(field.name), variable, field.ty));
    }

    let kind = match call.kind {
        AstApplyKind::Cross => ApplyKind::Cross,
        AstApplyKind::Outer => ApplyKind::Outer,
    };
    debug!(function = %decl.signature(), ?kind, "emit apply");
    let function = context.bindings.function(Arc::clone(&decl));
    let output = graph.add_unary(
        operand.output,
        Operator::Apply(Apply {
            kind,
            function,
            arguments,
            columns: apply_columns,
        }),
    );

    let relation = RelationInfo::new(columns).with_correlation(Some(decl.name.clone()));
    let relation = apply_correlation(context, relation, call.correlation)?;
    let mut relations = operand.relations;
    relations.push(relation);
    Ok(CompiledFrom { output, relations })
}
