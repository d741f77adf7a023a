// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! Table value constructors: `VALUES (..), (..)`

use relsql_ast::{Expr, Literal};
use relsql_ir::plan::Values;
use relsql_ir::scalar::LossPolicy;
use relsql_ir::{Graph, Operator, Scalar, Type};
use tracing::debug;

use super::{CompiledRelation, scoped};
use crate::context::AnalyzerContext;
use crate::error::{AnalyzerResult, DiagnosticCode};
use crate::expression::compile_scalar;
use crate::literal::TypeContext;
use crate::relation::{ColumnInfo, RelationInfo};
use crate::scope::ScopeId;
use crate::typing::unify;

/// Convert `expr` from `from` to `to` when they differ
pub(crate) fn coerce(expr: Scalar, from: &Type, to: &Type) -> Scalar {
    if from == to || *from == Type::Unknown {
        return expr;
    }
    Scalar::Cast {
        operand: Box::new(expr),
        target: to.clone(),
        loss_policy: LossPolicy::Ignore,
    }
}

/// Compile a VALUES list into a `values` operator
///
/// Column types are the unification of each column's cells. Bare `NULL`
/// cells are compiled last, typed by the rest of their column.
pub fn compile_values(
    context: &mut AnalyzerContext,
    graph: &mut Graph,
    rows: &[Vec<Expr>],
    parent: Option<ScopeId>,
) -> AnalyzerResult<CompiledRelation> {
    let Some(arity) = rows.first().map(Vec::len) else {
        return Err(context.report(
            DiagnosticCode::MalformedSyntax,
            None,
            "VALUES requires at least one row",
        ));
    };
    if let Some((index, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != arity) {
        return Err(context.report(
            DiagnosticCode::InconsistentColumns,
            row.first().and_then(Expr::span),
            format!(
                "row {} has {} columns, expected {arity}",
                index + 1,
                row.len()
            ),
        ));
    }

    scoped(context, parent, |context, scope| {
        let mut cells: Vec<Vec<Option<(Scalar, Type)>>> = vec![vec![None; arity]; rows.len()];
        let mut failed = None;
        for (r, row) in rows.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                if matches!(cell, Expr::Literal(Literal::Null)) {
                    continue;
                }
                match compile_scalar(context, cell, scope, None) {
                    Ok(result) => cells[r][c] = Some((result.expr, result.ty)),
                    Err(error) => failed = Some(error),
                }
            }
        }
        if let Some(error) = failed {
            return Err(error);
        }

        let mut types = Vec::with_capacity(arity);
        for c in 0..arity {
            let mut column_type = None;
            for (r, row) in cells.iter().enumerate() {
                let Some((_, ty)) = &row[c] else { continue };
                column_type = match column_type {
                    None => Some(ty.clone()),
                    Some(current) => match unify(&current, ty) {
                        Some(unified) => Some(unified),
                        None => {
                            return Err(context.report(
                                DiagnosticCode::InconsistentType,
                                rows[r][c].span(),
                                format!("column {} mixes {current} and {ty}", c + 1),
                            ));
                        }
                    },
                };
            }
            types.push(column_type);
        }

        for (r, row) in rows.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                if cells[r][c].is_some() {
                    continue;
                }
                let target = types[c].clone().map(TypeContext::new);
                let result = compile_scalar(context, cell, scope, target.as_ref())?;
                cells[r][c] = Some((result.expr, result.ty));
            }
        }

        let types: Vec<Type> = types
            .into_iter()
            .map(|t| t.unwrap_or(Type::Unknown))
            .collect();
        let rows: Vec<Vec<Scalar>> = cells
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .zip(&types)
                    .filter_map(|(cell, ty)| cell.map(|(expr, from)| coerce(expr, &from, ty)))
                    .collect()
            })
            .collect();

        let columns: Vec<ColumnInfo> = types
            .into_iter()
            .map(|ty| ColumnInfo::new(None, context.bindings.stream_variable(None), ty))
            .collect();
        let relation = RelationInfo::new(columns);
        debug!(rows = rows.len(), columns = arity, "emit values");
        let output = graph.add_source(Operator::Values(Values {
            columns: relation.variables(),
            rows,
        }));
        Ok(CompiledRelation::new(output, relation))
    })
}
