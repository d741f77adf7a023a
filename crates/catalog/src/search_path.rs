// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Schema search path
//!
//! An ordered list of schemas consulted first-to-last when resolving an
//! unqualified name. The first schema holding a table or index wins;
//! same-named declarations further down the path are never merged in.
//! Function lookup is the exception: overloads from every schema on the
//! path are collected, since narrowing by argument types happens later.

use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::SchemaProvider;
use crate::metadata::{AggregateFunctionDecl, FunctionDecl, IndexDecl, TableDecl, VariableDecl};

/// Ordered list of schemas used for unqualified lookup
#[derive(Clone, Default)]
pub struct SearchPath {
    schemas: Vec<Arc<dyn SchemaProvider>>,
}

impl SearchPath {
    pub fn new(schemas: Vec<Arc<dyn SchemaProvider>>) -> Self {
        Self { schemas }
    }

    /// Append a schema to the end of the path
    pub fn push(&mut self, schema: Arc<dyn SchemaProvider>) {
        self.schemas.push(schema);
    }

    pub fn schemas(&self) -> &[Arc<dyn SchemaProvider>] {
        &self.schemas
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// The first table named `name`, with the schema it was found in
    pub fn find_table(&self, name: &str) -> Option<(Arc<dyn SchemaProvider>, Arc<TableDecl>)> {
        self.schemas.iter().find_map(|schema| {
            let table = schema.find_table(name)?;
            trace!(schema = %schema.declaration().name, table = name, "search path hit");
            Some((schema.clone(), table))
        })
    }

    /// The first index named `name`, with the schema it was found in
    pub fn find_index(&self, name: &str) -> Option<(Arc<dyn SchemaProvider>, Arc<IndexDecl>)> {
        self.schemas
            .iter()
            .find_map(|schema| Some((schema.clone(), schema.find_index(name)?)))
    }

    /// Overloads named `name` from every schema on the path, in path order
    pub fn find_functions(&self, name: &str) -> Vec<Arc<FunctionDecl>> {
        self.schemas
            .iter()
            .flat_map(|schema| schema.find_functions(name))
            .collect()
    }

    /// Aggregate overloads named `name` from every schema on the path
    pub fn find_aggregate_functions(&self, name: &str) -> Vec<Arc<AggregateFunctionDecl>> {
        self.schemas
            .iter()
            .flat_map(|schema| schema.find_aggregate_functions(name))
            .collect()
    }

    /// The first schema-level variable named `name`
    pub fn find_variable(&self, name: &str) -> Option<Arc<VariableDecl>> {
        self.schemas
            .iter()
            .find_map(|schema| schema.find_variable(name))
    }
}

impl fmt::Debug for SearchPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.schemas.iter().map(|s| &s.declaration().name))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use relsql_ir::decl::ColumnDecl;
    use relsql_ir::types::Type;

    use super::*;
    use crate::MemorySchema;

    fn schema_with_table(schema: &str, table: &str) -> Arc<MemorySchema> {
        let mut s = MemorySchema::new(schema);
        s.add_table(
            TableDecl::new(table, schema).with_columns(vec![ColumnDecl::new("k", Type::Int8)]),
        )
        .unwrap();
        Arc::new(s)
    }

    #[test]
    fn test_first_schema_wins() {
        let a = schema_with_table("a", "t");
        let b = schema_with_table("b", "t");
        let path = SearchPath::new(vec![a.clone(), b]);

        let (schema, table) = path.find_table("t").unwrap();
        assert_eq!(schema.declaration().name, "a");
        assert!(Arc::ptr_eq(&table, &a.find_table("t").unwrap()));
        assert!(path.find_table("u").is_none());
    }

    #[test]
    fn test_functions_collected_across_path() {
        let mut a = MemorySchema::new("a");
        a.add_function(FunctionDecl::new(1, "f", Type::Int4).with_parameters(vec![Type::Int4]))
            .unwrap();
        let mut b = MemorySchema::new("b");
        b.add_function(FunctionDecl::new(2, "f", Type::Int4).with_parameters(vec![Type::Int4]))
            .unwrap();
        let path = SearchPath::new(vec![Arc::new(a), Arc::new(b)]);

        let ids: Vec<u64> = path.find_functions("f").iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_debug_lists_schema_names() {
        let path = SearchPath::new(vec![schema_with_table("x", "t")]);
        assert_eq!(format!("{path:?}"), r#"["x"]"#);
    }
}
