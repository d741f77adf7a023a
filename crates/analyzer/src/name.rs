// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! # Name resolution
//!
//! Resolves identifier chains of one to four segments
//! (`column`, `relation.column`, `schema.relation.column`,
//! `catalog.schema.relation.column`) against the scope chain, schema-level
//! variables and the catalog search path.
//!
//! ## Normalization
//!
//! Regular identifiers are folded to lower case when
//! `lowercase_regular_identifiers` is set; delimited identifiers are never
//! folded. After normalization names compare exactly.
//!
//! ## Unqualified columns
//!
//! Each scope of the chain is searched innermost first. Within one scope,
//! all same-named columns of all relations are collected; if there is more
//! than one, only exported columns are kept. Exactly one survivor resolves;
//! more is ambiguous; none moves on to the parent scope.

use std::sync::Arc;

use relsql_ast::{Identifier, Name, Span};
use relsql_catalog::SchemaProvider;
use relsql_ir::decl::{AggregateFunctionDecl, FunctionDecl, IndexDecl, TableDecl};
use relsql_ir::{Type, Variable};
use tracing::trace;

use crate::context::AnalyzerContext;
use crate::error::{AnalyzerResult, DiagnosticCode};
use crate::relation::{ColumnInfo, RelationInfo};
use crate::scope::ScopeId;

/// What a variable name resolved to
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedVariable {
    /// A column of a relation in scope
    Column(ColumnInfo),
    /// A schema-level variable
    External { variable: Variable, ty: Type },
}

impl ResolvedVariable {
    pub fn variable(&self) -> &Variable {
        match self {
            ResolvedVariable::Column(column) => &column.variable,
            ResolvedVariable::External { variable, .. } => variable,
        }
    }

    pub fn ty(&self) -> &Type {
        match self {
            ResolvedVariable::Column(column) => &column.ty,
            ResolvedVariable::External { ty, .. } => ty,
        }
    }
}

/// Normalize one identifier
pub fn normalize(context: &AnalyzerContext, identifier: &Identifier) -> String {
    if !identifier.delimited && context.options().lowercase_regular_identifiers {
        identifier.text.to_lowercase()
    } else {
        identifier.text.clone()
    }
}

fn display(name: &Name) -> String {
    name.to_string()
}

fn location(name: &Name) -> Option<Span> {
    Some(name.span())
}

/// Pick the single match, narrowing to exported columns when needed
fn narrow<'a>(matches: Vec<&'a ColumnInfo>) -> Result<Option<&'a ColumnInfo>, usize> {
    match matches.len() {
        0 => Ok(None),
        1 => Ok(matches.first().copied()),
        _ => {
            let exported: Vec<_> = matches.into_iter().filter(|c| c.exported).collect();
            match exported.as_slice() {
                [only] => Ok(Some(*only)),
                _ => Err(exported.len()),
            }
        }
    }
}

/// Resolve a variable name to a column in scope or a schema variable
pub fn resolve_variable(
    context: &mut AnalyzerContext,
    name: &Name,
    scope: ScopeId,
) -> AnalyzerResult<ResolvedVariable> {
    match name.len() {
        1 => resolve_unqualified(context, name, scope),
        2 => resolve_correlated(context, name, scope),
        3 | 4 => resolve_table_qualified(context, name, scope),
        _ => Err(context.report(
            DiagnosticCode::MalformedSyntax,
            location(name),
            format!("invalid variable name '{}'", display(name)),
        )),
    }
}

fn resolve_unqualified(
    context: &mut AnalyzerContext,
    name: &Name,
    scope: ScopeId,
) -> AnalyzerResult<ResolvedVariable> {
    let Some(identifier) = name.last() else {
        return Err(context.report(DiagnosticCode::MalformedSyntax, None, "empty name"));
    };
    let key = normalize(context, identifier);

    let mut saw_relation = false;
    let mut outcome = None;
    for id in context.scopes.chain(scope) {
        let query_scope = context.scopes.get(id);
        saw_relation |= !query_scope.relations.is_empty();
        let matches: Vec<&ColumnInfo> = query_scope
            .relations
            .iter()
            .flat_map(|r| r.columns.iter())
            .filter(|c| c.is_named(&key))
            .collect();
        match narrow(matches) {
            Ok(Some(column)) => {
                trace!(
                    name = %key,
                    variable = %column.variable,
                    scope = id.index(),
                    "resolved column"
                );
                outcome = Some(Ok(column.clone()));
                break;
            }
            Ok(None) => continue,
            Err(_) => {
                outcome = Some(Err(()));
                break;
            }
        }
    }

    match outcome {
        Some(Ok(column)) => return Ok(ResolvedVariable::Column(column)),
        Some(Err(())) => {
            return Err(context.report(
                DiagnosticCode::ColumnAmbiguous,
                location(name),
                format!("column '{key}' is ambiguous"),
            ));
        }
        None => {}
    }

    if let Some(decl) = context.search_path().find_variable(&key) {
        trace!(name = %key, "resolved schema variable");
        let ty = decl.ty.clone();
        let variable = context.bindings.external_variable(decl);
        return Ok(ResolvedVariable::External { variable, ty });
    }

    let code = if saw_relation {
        DiagnosticCode::VariableNotFound
    } else {
        DiagnosticCode::SymbolNotFound
    };
    Err(context.report(code, location(name), format!("'{key}' is not found")))
}

fn find_in_relation(relation: &RelationInfo, key: &str) -> Result<Option<ColumnInfo>, ()> {
    let matches = relation.columns.iter().filter(|c| c.is_named(key)).collect();
    match narrow(matches) {
        Ok(found) => Ok(found.cloned()),
        Err(_) => Err(()),
    }
}

fn resolve_correlated(
    context: &mut AnalyzerContext,
    name: &Name,
    scope: ScopeId,
) -> AnalyzerResult<ResolvedVariable> {
    let qualifier = normalize(context, &name.segments[0]);
    let key = normalize(context, &name.segments[1]);

    for id in context.scopes.chain(scope) {
        let relations = context.scopes.get(id).find_relations(&qualifier);
        match relations.as_slice() {
            [] => continue,
            [relation] => {
                return match find_in_relation(relation, &key) {
                    Ok(Some(column)) => {
                        trace!(relation = %qualifier, name = %key, "resolved qualified column");
                        Ok(ResolvedVariable::Column(column))
                    }
                    Ok(None) => Err(context.report(
                        DiagnosticCode::ColumnNotFound,
                        location(name),
                        format!("column '{key}' is not found in '{qualifier}'"),
                    )),
                    Err(()) => Err(context.report(
                        DiagnosticCode::ColumnAmbiguous,
                        location(name),
                        format!("column '{key}' is ambiguous in '{qualifier}'"),
                    )),
                };
            }
            _ => {
                return Err(context.report(
                    DiagnosticCode::RelationAmbiguous,
                    location(name),
                    format!("relation '{qualifier}' is ambiguous"),
                ));
            }
        }
    }

    Err(context.report(
        DiagnosticCode::RelationNotFound,
        location(name),
        format!("relation '{qualifier}' is not found"),
    ))
}

fn resolve_table_qualified(
    context: &mut AnalyzerContext,
    name: &Name,
    scope: ScopeId,
) -> AnalyzerResult<ResolvedVariable> {
    let table_name = Name::from_segments(name.qualifier().to_vec());
    let (_, table) = resolve_table(context, &table_name)?;
    let key = match name.last() {
        Some(identifier) => normalize(context, identifier),
        None => String::new(),
    };

    let found = context.scopes.chain(scope).into_iter().find_map(|id| {
        context
            .scopes
            .get(id)
            .relations
            .iter()
            .find(|r| {
                r.table.as_ref().is_some_and(|t| Arc::ptr_eq(t, &table))
                    && r.correlation.as_deref() == Some(table.name.as_str())
            })
            .cloned()
    });
    let Some(relation) = found else {
        return Err(context.report(
            DiagnosticCode::RelationNotFound,
            location(name),
            format!("relation '{}' is not in scope", display(&table_name)),
        ));
    };

    match find_in_relation(&relation, &key) {
        Ok(Some(column)) => Ok(ResolvedVariable::Column(column)),
        Ok(None) => Err(context.report(
            DiagnosticCode::ColumnNotFound,
            location(name),
            format!("column '{key}' is not found in '{}'", table.name),
        )),
        Err(()) => Err(context.report(
            DiagnosticCode::ColumnAmbiguous,
            location(name),
            format!("column '{key}' is ambiguous"),
        )),
    }
}

/// Resolve the schema part of a qualified catalog name
///
/// `qualifier` holds the segments before the object name. An empty
/// qualifier yields `None`, meaning "use the search path".
pub fn resolve_schema(
    context: &mut AnalyzerContext,
    qualifier: &[Identifier],
    span: Option<Span>,
) -> AnalyzerResult<Option<Arc<dyn SchemaProvider>>> {
    let (catalog_part, schema_part) = match qualifier {
        [] => return Ok(None),
        [schema] => (None, schema),
        [catalog, schema] => (Some(catalog), schema),
        _ => {
            return Err(context.report(
                DiagnosticCode::MalformedSyntax,
                span,
                "too many name qualifiers",
            ));
        }
    };

    if let Some(catalog) = catalog_part {
        let catalog_name = normalize(context, catalog);
        if catalog_name != context.catalog().name() {
            return Err(context.report(
                DiagnosticCode::CatalogNotFound,
                span,
                format!("catalog '{catalog_name}' is not found"),
            ));
        }
    }

    let schema_name = normalize(context, schema_part);
    match context.catalog().find_schema(&schema_name) {
        Some(schema) => Ok(Some(schema)),
        None => Err(context.report(
            DiagnosticCode::SchemaNotFound,
            span,
            format!("schema '{schema_name}' is not found"),
        )),
    }
}

/// Unqualified object name, normalized
pub(crate) fn object_name(context: &mut AnalyzerContext, name: &Name) -> AnalyzerResult<String> {
    match name.last() {
        Some(identifier) => Ok(normalize(context, identifier)),
        None => Err(context.report(DiagnosticCode::MalformedSyntax, None, "empty name")),
    }
}

/// Look up a table declaration, without reporting if it is missing
pub fn find_table(
    context: &mut AnalyzerContext,
    name: &Name,
) -> AnalyzerResult<Option<(Arc<dyn SchemaProvider>, Arc<TableDecl>)>> {
    let key = object_name(context, name)?;
    let found = match resolve_schema(context, name.qualifier(), location(name))? {
        Some(schema) => schema.find_table(&key).map(|t| (schema, t)),
        None => context.search_path().find_table(&key),
    };
    Ok(found)
}

/// Resolve a table declaration, reporting `table_not_found` if missing
pub fn resolve_table(
    context: &mut AnalyzerContext,
    name: &Name,
) -> AnalyzerResult<(Arc<dyn SchemaProvider>, Arc<TableDecl>)> {
    match find_table(context, name)? {
        Some(found) => Ok(found),
        None => Err(context.report(
            DiagnosticCode::TableNotFound,
            location(name),
            format!("table '{}' is not found", display(name)),
        )),
    }
}

/// Look up an index declaration, without reporting if it is missing
pub fn find_index(
    context: &mut AnalyzerContext,
    name: &Name,
) -> AnalyzerResult<Option<(Arc<dyn SchemaProvider>, Arc<IndexDecl>)>> {
    let key = object_name(context, name)?;
    let found = match resolve_schema(context, name.qualifier(), location(name))? {
        Some(schema) => schema.find_index(&key).map(|i| (schema, i)),
        None => context.search_path().find_index(&key),
    };
    Ok(found)
}

/// Scalar and table-valued overloads of `name` taking `arity` arguments
///
/// An empty result is not reported here; overload narrowing decides.
pub fn resolve_functions(
    context: &mut AnalyzerContext,
    name: &Name,
    arity: usize,
) -> AnalyzerResult<(String, Vec<Arc<FunctionDecl>>)> {
    let key = object_name(context, name)?;
    let overloads = match resolve_schema(context, name.qualifier(), location(name))? {
        Some(schema) => schema.find_functions(&key),
        None => context.search_path().find_functions(&key),
    };
    let overloads = overloads
        .into_iter()
        .filter(|f| f.parameter_types.len() == arity)
        .collect();
    Ok((key, overloads))
}

/// Aggregate overloads of `name` (plus `suffix`) accepting the call shape
///
/// With `asterisk` set only `f(*)` overloads match; otherwise only those
/// declaring exactly `arity` parameters.
pub fn resolve_aggregate_functions(
    context: &mut AnalyzerContext,
    name: &Name,
    suffix: &str,
    arity: usize,
    asterisk: bool,
) -> AnalyzerResult<(String, Vec<Arc<AggregateFunctionDecl>>)> {
    let key = format!("{}{}", object_name(context, name)?, suffix);
    let overloads = match resolve_schema(context, name.qualifier(), location(name))? {
        Some(schema) => schema.find_aggregate_functions(&key),
        None => context.search_path().find_aggregate_functions(&key),
    };
    let overloads = overloads
        .into_iter()
        .filter(|f| {
            if asterisk {
                f.features.asterisk
            } else {
                !f.features.asterisk && f.parameter_types.len() == arity
            }
        })
        .collect();
    Ok((key, overloads))
}

#[cfg(test)]
mod tests {
    use relsql_catalog::{Catalog, MemoryCatalog, MemorySchema};
    use relsql_ir::decl::{ColumnDecl, VariableDecl};

    use super::*;
    use crate::options::AnalyzerOptions;

    fn context() -> AnalyzerContext {
        let mut schema = MemorySchema::new("public");
        schema
            .add_table(TableDecl::new("t", "public").with_columns(vec![
                ColumnDecl::new("k", Type::Int8),
                ColumnDecl::new("v", Type::FLEXIBLE_VARCHAR),
            ]))
            .unwrap();
        schema
            .add_variable(VariableDecl::new("limit_rows", Type::Int4))
            .unwrap();
        let mut catalog = MemoryCatalog::new("db");
        catalog.add_schema(schema).unwrap();
        let catalog: Arc<dyn Catalog> = Arc::new(catalog);
        AnalyzerContext::new(AnalyzerOptions::default(), catalog)
    }

    fn column(context: &mut AnalyzerContext, name: &str, exported: bool) -> ColumnInfo {
        let variable = context.bindings.stream_variable(Some(name));
        ColumnInfo::new(Some(name.to_string()), variable, Type::Int4).with_exported(exported)
    }

    fn codes(context: &AnalyzerContext) -> Vec<DiagnosticCode> {
        context.diagnostics().iter().map(|d| d.code).collect()
    }

    #[test]
    fn test_normalize_folds_regular_only() {
        let context = context();
        assert_eq!(normalize(&context, &Identifier::new("ABC")), "abc");
        assert_eq!(normalize(&context, &Identifier::delimited("ABC")), "ABC");
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let mut context = context();
        let scope = context.scopes.push(None);
        let c = column(&mut context, "c", true);
        context
            .scopes
            .get_mut(scope)
            .relations
            .push(RelationInfo::new(vec![c]).with_correlation(Some("r".into())));

        let first = resolve_variable(&mut context, &Name::simple("C"), scope).unwrap();
        let second = resolve_variable(&mut context, &Name::simple("c"), scope).unwrap();
        assert_eq!(first.variable(), second.variable());

        let qualified = resolve_variable(&mut context, &Name::qualified("r.c"), scope).unwrap();
        assert_eq!(first.variable(), qualified.variable());
    }

    #[test]
    fn test_exported_narrowing_ignores_insertion_order() {
        for exported_position in 0..3 {
            let mut context = context();
            let scope = context.scopes.push(None);
            let columns: Vec<ColumnInfo> = (0..3)
                .map(|i| column(&mut context, "x", i == exported_position))
                .collect();
            let expected = columns[exported_position].variable.clone();
            for column in columns {
                context
                    .scopes
                    .get_mut(scope)
                    .relations
                    .push(RelationInfo::new(vec![column]));
            }

            let resolved = resolve_variable(&mut context, &Name::simple("x"), scope).unwrap();
            assert_eq!(resolved.variable(), &expected);
        }
    }

    #[test]
    fn test_ambiguous_column() {
        let mut context = context();
        let scope = context.scopes.push(None);
        for _ in 0..2 {
            let c = column(&mut context, "x", true);
            context
                .scopes
                .get_mut(scope)
                .relations
                .push(RelationInfo::new(vec![c]));
        }
        assert!(resolve_variable(&mut context, &Name::simple("x"), scope).is_err());
        assert_eq!(codes(&context), vec![DiagnosticCode::ColumnAmbiguous]);
    }

    #[test]
    fn test_outer_scope_reference() {
        let mut context = context();
        let outer = context.scopes.push(None);
        let c = column(&mut context, "o", true);
        let expected = c.variable.clone();
        context
            .scopes
            .get_mut(outer)
            .relations
            .push(RelationInfo::new(vec![c]));
        let inner = context.scopes.push(Some(outer));
        let d = column(&mut context, "i", true);
        context
            .scopes
            .get_mut(inner)
            .relations
            .push(RelationInfo::new(vec![d]));

        let resolved = resolve_variable(&mut context, &Name::simple("o"), inner).unwrap();
        assert_eq!(resolved.variable(), &expected);
    }

    #[test]
    fn test_not_found_codes() {
        let mut context = context();
        let empty = context.scopes.push(None);
        assert!(resolve_variable(&mut context, &Name::simple("nope"), empty).is_err());

        let scope = context.scopes.push(None);
        let c = column(&mut context, "c", true);
        context
            .scopes
            .get_mut(scope)
            .relations
            .push(RelationInfo::new(vec![c]));
        assert!(resolve_variable(&mut context, &Name::simple("nope"), scope).is_err());
        assert!(resolve_variable(&mut context, &Name::qualified("r.c"), scope).is_err());

        assert_eq!(
            codes(&context),
            vec![
                DiagnosticCode::SymbolNotFound,
                DiagnosticCode::VariableNotFound,
                DiagnosticCode::RelationNotFound,
            ]
        );
    }

    #[test]
    fn test_schema_variable() {
        let mut context = context();
        let scope = context.scopes.push(None);
        let resolved = resolve_variable(&mut context, &Name::simple("limit_rows"), scope).unwrap();
        assert!(matches!(resolved, ResolvedVariable::External { .. }));
        assert_eq!(resolved.ty(), &Type::Int4);
    }

    #[test]
    fn test_table_lookup_segments() {
        let mut context = context();
        assert!(resolve_table(&mut context, &Name::simple("t")).is_ok());
        assert!(resolve_table(&mut context, &Name::qualified("public.t")).is_ok());
        assert!(resolve_table(&mut context, &Name::qualified("db.public.t")).is_ok());

        assert!(resolve_table(&mut context, &Name::simple("u")).is_err());
        assert!(resolve_table(&mut context, &Name::qualified("nope.t")).is_err());
        assert!(resolve_table(&mut context, &Name::qualified("nope.public.t")).is_err());

        assert_eq!(
            codes(&context),
            vec![
                DiagnosticCode::TableNotFound,
                DiagnosticCode::SchemaNotFound,
                DiagnosticCode::CatalogNotFound,
            ]
        );
    }
}
