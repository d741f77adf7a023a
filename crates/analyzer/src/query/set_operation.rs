// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! UNION / INTERSECT / EXCEPT
//!
//! Both operands compile independently. Columns pair up by position and
//! their types unify. UNION outputs fresh columns named after the left
//! operand; INTERSECT and EXCEPT output the left operand's columns.

use relsql_ast::{Identifier, QueryExpr, SetOperator, SetQuantifier};
use relsql_ir::plan::{GroupKeyPair, Quantifier, SetDifference, Union, UnionMapping};
use relsql_ir::{Graph, Operator};
use tracing::debug;

use super::{CompiledRelation, compile_query};
use crate::context::AnalyzerContext;
use crate::error::{AnalyzerResult, DiagnosticCode};
use crate::relation::{ColumnInfo, RelationInfo};
use crate::scope::ScopeId;
use crate::typing::unify;

/// The parts of a set operation query expression
pub struct SetOperation<'a> {
    pub op: SetOperator,
    pub quantifier: Option<SetQuantifier>,
    pub corresponding: Option<&'a [Identifier]>,
    pub left: &'a QueryExpr,
    pub right: &'a QueryExpr,
}

pub fn compile_set_operation(
    context: &mut AnalyzerContext,
    graph: &mut Graph,
    operation: SetOperation<'_>,
    parent: Option<ScopeId>,
) -> AnalyzerResult<CompiledRelation> {
    if operation.corresponding.is_some() {
        return Err(context.report(
            DiagnosticCode::UnsupportedFeature,
            None,
            "CORRESPONDING is not supported",
        ));
    }

    let left = compile_query(context, graph, operation.left, parent)?;
    let right = compile_query(context, graph, operation.right, parent)?;
    let left_columns: Vec<&ColumnInfo> = left.relation.exported_columns().collect();
    let right_columns: Vec<&ColumnInfo> = right.relation.exported_columns().collect();
    if left_columns.len() != right_columns.len() {
        return Err(context.report(
            DiagnosticCode::InconsistentColumns,
            None,
            format!(
                "{:?} operands have {} and {} columns",
                operation.op,
                left_columns.len(),
                right_columns.len()
            ),
        ));
    }

    let mut types = Vec::with_capacity(left_columns.len());
    for (position, (l, r)) in left_columns.iter().zip(&right_columns).enumerate() {
        match unify(&l.ty, &r.ty) {
            Some(ty) => types.push(ty),
            None => {
                return Err(context.report(
                    DiagnosticCode::InconsistentType,
                    None,
                    format!(
                        "column {} of {:?} mixes {} and {}",
                        position + 1,
                        operation.op,
                        l.ty,
                        r.ty
                    ),
                ));
            }
        }
    }

    let quantifier = match operation.quantifier {
        Some(SetQuantifier::All) => Quantifier::All,
        Some(SetQuantifier::Distinct) | None => Quantifier::Distinct,
    };

    let (operator, columns) = match operation.op {
        SetOperator::Union => {
            let mut mappings = Vec::with_capacity(types.len());
            let mut columns = Vec::with_capacity(types.len());
            for ((l, r), ty) in left_columns.iter().zip(&right_columns).zip(types) {
                let destination = context
                    .bindings
                    .stream_variable(l.identifier.as_deref());
                mappings.push(UnionMapping {
                    left: Some(l.variable.clone()),
                    right: Some(r.variable.clone()),
                    destination: destination.clone(),
                });
                columns.push(ColumnInfo::new(l.identifier.clone(), destination, ty));
            }
            (
                Operator::Union(Union {
                    quantifier,
                    mappings,
                }),
                columns,
            )
        }
        SetOperator::Intersect | SetOperator::Except => {
            let group_key_pairs = left_columns
                .iter()
                .zip(&right_columns)
                .map(|(l, r)| GroupKeyPair {
                    left: l.variable.clone(),
                    right: r.variable.clone(),
                })
                .collect();
            let columns = left_columns
                .iter()
                .zip(types)
                .map(|(l, ty)| ColumnInfo {
                    ty,
                    ..(*l).clone()
                })
                .collect();
            let difference = SetDifference {
                quantifier,
                group_key_pairs,
            };
            let operator = if operation.op == SetOperator::Intersect {
                Operator::Intersection(difference)
            } else {
                Operator::Difference(difference)
            };
            (operator, columns)
        }
    };

    debug!(op = ?operation.op, ?quantifier, columns = columns.len(), "emit set operation");
    let output = graph.add_binary(left.output, right.output, operator);
    Ok(CompiledRelation::new(output, RelationInfo::new(columns)))
}
