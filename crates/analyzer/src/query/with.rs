// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! WITH clauses
//!
//! Each element is compiled once, in order, into a private graph held by
//! the WITH scope. Later elements and the body see earlier elements; an
//! element never sees itself.

use std::collections::HashSet;

use relsql_ast::{Correlation, QueryExpr, WithElement};
use relsql_ir::Graph;
use tracing::debug;

use super::{CompiledRelation, apply_correlation, compile_query, scoped};
use crate::context::AnalyzerContext;
use crate::error::{AnalyzerResult, DiagnosticCode};
use crate::name::normalize;
use crate::scope::{CteInfo, ScopeId};

pub fn compile_with(
    context: &mut AnalyzerContext,
    graph: &mut Graph,
    recursive: bool,
    elements: &[WithElement],
    body: &QueryExpr,
    parent: Option<ScopeId>,
) -> AnalyzerResult<CompiledRelation> {
    if recursive {
        return Err(context.report(
            DiagnosticCode::UnsupportedFeature,
            elements.first().map(|e| e.name.span),
            "WITH RECURSIVE is not supported",
        ));
    }

    scoped(context, parent, |context, scope| {
        let mut names = HashSet::new();
        for element in elements {
            let name = normalize(context, &element.name);
            if !names.insert(name.clone()) {
                return Err(context.report(
                    DiagnosticCode::ViewAlreadyExists,
                    Some(element.name.span),
                    format!("WITH element '{name}' is already defined"),
                ));
            }

            let mut element_graph = Graph::new();
            let compiled = compile_query(context, &mut element_graph, &element.query, Some(scope))?;
            let correlation = Correlation {
                name: element.name.clone(),
                columns: element.columns.clone(),
            };
            let relation = apply_correlation(context, compiled.relation, Some(&correlation))?;
            debug!(name = %name, nodes = element_graph.len(), "compiled WITH element");
            context.scopes.get_mut(scope).ctes.insert(
                name,
                CteInfo {
                    graph: element_graph,
                    output: compiled.output.port(),
                    relation,
                },
            );
        }
        compile_query(context, graph, body, Some(scope))
    })
}
