// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! # Overload narrowing
//!
//! Name lookup returns every overload with the right arity. This module
//! picks one of them from the compiled argument types: each candidate is
//! ranked by the summed [`conversion_cost`] of its arguments, candidates
//! with a non-coercible argument drop out, and the unique cheapest wins.

use std::sync::Arc;

use relsql_ast::Span;
use relsql_ir::Type;
use relsql_ir::decl::{AggregateFunctionDecl, FunctionDecl};
use tracing::trace;

use crate::context::AnalyzerContext;
use crate::error::{AnalyzerResult, DiagnosticCode};
use crate::typing::conversion_cost;

/// A declaration with a parameter list
pub trait Overload {
    fn parameter_types(&self) -> &[Type];

    fn signature(&self) -> String;
}

impl Overload for FunctionDecl {
    fn parameter_types(&self) -> &[Type] {
        &self.parameter_types
    }

    fn signature(&self) -> String {
        FunctionDecl::signature(self)
    }
}

impl Overload for AggregateFunctionDecl {
    fn parameter_types(&self) -> &[Type] {
        &self.parameter_types
    }

    fn signature(&self) -> String {
        AggregateFunctionDecl::signature(self)
    }
}

/// Total widening cost of calling `candidate` with `arguments`
fn call_cost<D: Overload>(candidate: &D, arguments: &[Type]) -> Option<u32> {
    if candidate.parameter_types().len() != arguments.len() {
        return None;
    }
    candidate
        .parameter_types()
        .iter()
        .zip(arguments)
        .map(|(parameter, argument)| conversion_cost(argument, parameter))
        .sum()
}

/// The parameter type every candidate declares at `position`, if they agree
pub fn common_parameter_type<D: Overload>(candidates: &[Arc<D>], position: usize) -> Option<Type> {
    let mut types = candidates
        .iter()
        .map(|c| c.parameter_types().get(position));
    let first = types.next()??;
    types
        .all(|t| t == Some(first))
        .then(|| first.clone())
}

fn describe(arguments: &[Type]) -> String {
    arguments
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Pick the unique cheapest overload of `name` for `arguments`
pub fn select_overload<D: Overload>(
    context: &mut AnalyzerContext,
    name: &str,
    candidates: &[Arc<D>],
    arguments: &[Type],
    location: Option<Span>,
) -> AnalyzerResult<Arc<D>> {
    let ranked: Vec<(u32, &Arc<D>)> = candidates
        .iter()
        .filter_map(|c| call_cost(c.as_ref(), arguments).map(|cost| (cost, c)))
        .collect();

    let Some(best) = ranked.iter().map(|(cost, _)| *cost).min() else {
        return Err(context.report(
            DiagnosticCode::FunctionNotFound,
            location,
            format!("function {name}({}) is not found", describe(arguments)),
        ));
    };

    let winners: Vec<&Arc<D>> = ranked
        .into_iter()
        .filter(|(cost, _)| *cost == best)
        .map(|(_, c)| c)
        .collect();
    match winners.as_slice() {
        [winner] => {
            trace!(function = %winner.signature(), cost = best, "selected overload");
            Ok(Arc::clone(winner))
        }
        _ => {
            let signatures = winners
                .iter()
                .map(|w| w.signature())
                .collect::<Vec<_>>()
                .join(", ");
            Err(context.report(
                DiagnosticCode::FunctionAmbiguous,
                location,
                format!(
                    "function {name}({}) is ambiguous between {signatures}",
                    describe(arguments)
                ),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use relsql_catalog::{Catalog, MemoryCatalog};

    use super::*;
    use crate::options::AnalyzerOptions;

    fn context() -> AnalyzerContext {
        let catalog: Arc<dyn Catalog> = Arc::new(MemoryCatalog::new("db"));
        AnalyzerContext::new(AnalyzerOptions::default(), catalog)
    }

    fn abs_overloads() -> Vec<Arc<FunctionDecl>> {
        [Type::Int4, Type::Int8, Type::FLEXIBLE_DECIMAL, Type::Float8]
            .into_iter()
            .enumerate()
            .map(|(i, ty)| {
                Arc::new(
                    FunctionDecl::new(i as u64 + 1, "abs", ty.clone()).with_parameters(vec![ty]),
                )
            })
            .collect()
    }

    #[test]
    fn test_exact_match_wins() {
        let mut context = context();
        let overloads = abs_overloads();
        let chosen = select_overload(&mut context, "abs", &overloads, &[Type::Int8], None).unwrap();
        assert_eq!(chosen.return_type, Type::Int8);
    }

    #[test]
    fn test_narrowest_widening_wins() {
        let mut context = context();
        let overloads = abs_overloads();
        let chosen = select_overload(&mut context, "abs", &overloads, &[Type::Int2], None).unwrap();
        assert_eq!(chosen.return_type, Type::Int4);
        let chosen =
            select_overload(&mut context, "abs", &overloads, &[Type::Float4], None).unwrap();
        assert_eq!(chosen.return_type, Type::Float8);
    }

    #[test]
    fn test_not_found_and_ambiguous() {
        let mut context = context();
        let overloads = abs_overloads();
        assert!(
            select_overload(&mut context, "abs", &overloads, &[Type::Boolean], None).is_err()
        );

        let ambiguous = vec![
            Arc::new(
                FunctionDecl::new(1, "f", Type::Int8).with_parameters(vec![Type::Int8, Type::Int4]),
            ),
            Arc::new(
                FunctionDecl::new(2, "f", Type::Int8).with_parameters(vec![Type::Int4, Type::Int8]),
            ),
        ];
        assert!(
            select_overload(&mut context, "f", &ambiguous, &[Type::Int4, Type::Int4], None)
                .is_err()
        );

        let codes: Vec<_> = context.diagnostics().iter().map(|d| d.code).collect();
        assert_eq!(
            codes,
            vec![DiagnosticCode::FunctionNotFound, DiagnosticCode::FunctionAmbiguous]
        );
    }

    #[test]
    fn test_common_parameter_type() {
        let overloads = abs_overloads();
        assert_eq!(common_parameter_type(&overloads, 0), None);
        assert_eq!(common_parameter_type(&overloads[..1], 0), Some(Type::Int4));
        assert_eq!(common_parameter_type(&overloads[..1], 1), None);
    }
}
