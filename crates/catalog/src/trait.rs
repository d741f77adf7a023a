// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Catalog traits for schema abstraction
//!
//! This module defines the synchronous lookup interface the analyzer uses to
//! query declarations. Lookups never perform I/O from the analyzer's point of
//! view and never fail: a missing symbol is simply `None` or an empty list.

use std::sync::Arc;

use crate::metadata::{
    AggregateFunctionDecl, FunctionDecl, IndexDecl, SchemaDecl, TableDecl, VariableDecl,
};

/// Catalog trait for schema lookup
///
/// A catalog is a named collection of schemas.
///
/// # Examples
///
/// ```rust,ignore
/// use relsql_catalog::Catalog;
///
/// fn table_exists(catalog: &dyn Catalog, schema: &str, table: &str) -> bool {
///     catalog
///         .find_schema(schema)
///         .and_then(|s| s.find_table(table))
///         .is_some()
/// }
/// ```
pub trait Catalog: Send + Sync {
    /// The catalog's own name, matched by four-part names
    fn name(&self) -> &str;

    /// Find a schema by its exact name
    fn find_schema(&self, name: &str) -> Option<Arc<dyn SchemaProvider>>;

    /// All schemas, in registration order
    fn schemas(&self) -> Vec<Arc<dyn SchemaProvider>>;
}

/// Lookup-by-name providers of a single schema
///
/// Names are matched exactly; case folding happens before the lookup.
pub trait SchemaProvider: Send + Sync {
    /// The schema's own declaration
    fn declaration(&self) -> &Arc<SchemaDecl>;

    /// Find a table by name
    fn find_table(&self, name: &str) -> Option<Arc<TableDecl>>;

    /// Find an index by name
    fn find_index(&self, name: &str) -> Option<Arc<IndexDecl>>;

    /// The primary index of `table`, if it has one
    ///
    /// # Arguments
    ///
    /// * `table` - a table previously returned by [`SchemaProvider::find_table`]
    fn find_primary_index(&self, table: &Arc<TableDecl>) -> Option<Arc<IndexDecl>>;

    /// Every scalar or table-valued overload named `name`
    fn find_functions(&self, name: &str) -> Vec<Arc<FunctionDecl>>;

    /// Every aggregate overload named `name`
    fn find_aggregate_functions(&self, name: &str) -> Vec<Arc<AggregateFunctionDecl>>;

    /// Find a schema-level variable by name
    fn find_variable(&self, name: &str) -> Option<Arc<VariableDecl>>;
}
