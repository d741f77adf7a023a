// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # In-memory Catalog
//!
//! This module provides a catalog implementation holding declarations in
//! insertion-ordered maps. Schemas are populated through `add_*` methods and
//! then frozen by handing them to a [`MemoryCatalog`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! use relsql_catalog::{MemoryCatalog, MemorySchema};
//!
//! let mut schema = MemorySchema::new("public");
//! let t = schema.add_table(TableDecl::new("t", "public").with_columns(columns))?;
//! schema.add_primary_key(&t, &["k"])?;
//!
//! let mut catalog = MemoryCatalog::new("db");
//! catalog.add_schema(schema)?;
//! ```

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::debug;

use crate::metadata::{
    AggregateFunctionDecl, FunctionDecl, IndexDecl, SchemaDecl, TableDecl, VariableDecl,
};
use crate::{Catalog, CatalogError, CatalogResult, SchemaProvider};

/// A schema whose declarations live in memory
#[derive(Debug)]
pub struct MemorySchema {
    declaration: Arc<SchemaDecl>,
    tables: IndexMap<String, Arc<TableDecl>>,
    indexes: IndexMap<String, Arc<IndexDecl>>,
    functions: IndexMap<String, Vec<Arc<FunctionDecl>>>,
    aggregate_functions: IndexMap<String, Vec<Arc<AggregateFunctionDecl>>>,
    variables: IndexMap<String, Arc<VariableDecl>>,
}

impl MemorySchema {
    /// Create an empty schema
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            declaration: Arc::new(SchemaDecl::new(name)),
            tables: IndexMap::new(),
            indexes: IndexMap::new(),
            functions: IndexMap::new(),
            aggregate_functions: IndexMap::new(),
            variables: IndexMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.declaration.name
    }

    /// Register a table; its `schema` field is overwritten with this schema's name
    pub fn add_table(&mut self, mut table: TableDecl) -> CatalogResult<Arc<TableDecl>> {
        if self.tables.contains_key(&table.name) {
            return Err(CatalogError::DuplicateTable(
                self.name().to_string(),
                table.name,
            ));
        }
        table.schema = self.name().to_string();
        let table = Arc::new(table);
        debug!(schema = %self.name(), table = %table.name, "registered table");
        self.tables.insert(table.name.clone(), table.clone());
        Ok(table)
    }

    /// Register an index over a table of this schema
    pub fn add_index(&mut self, index: IndexDecl) -> CatalogResult<Arc<IndexDecl>> {
        if self.indexes.contains_key(&index.name) {
            return Err(CatalogError::DuplicateIndex(
                self.name().to_string(),
                index.name,
            ));
        }
        let owned = self
            .tables
            .get(&index.table.name)
            .is_some_and(|t| Arc::ptr_eq(t, &index.table));
        if !owned {
            return Err(CatalogError::TableNotFound(
                index.table.name.clone(),
                self.name().to_string(),
            ));
        }
        if let Some(key) = index
            .keys
            .iter()
            .find(|k| k.position >= index.table.columns.len())
        {
            return Err(CatalogError::InvalidIndexKey(index.name, key.position));
        }
        if index.is_primary() && self.find_primary_index(&index.table).is_some() {
            return Err(CatalogError::DuplicatePrimaryIndex(index.table.name.clone()));
        }
        let index = Arc::new(index);
        self.indexes.insert(index.name.clone(), index.clone());
        Ok(index)
    }

    /// Register a primary index named `<table>_pk` over the named columns
    pub fn add_primary_key(
        &mut self,
        table: &Arc<TableDecl>,
        columns: &[&str],
    ) -> CatalogResult<Arc<IndexDecl>> {
        let name = format!("{}_pk", table.name);
        let mut index = IndexDecl::new(name.clone(), table.clone()).primary();
        for column in columns {
            let (position, _) = table
                .column(column)
                .ok_or(CatalogError::InvalidIndexKey(name.clone(), table.columns.len()))?;
            index = index.with_key(position);
        }
        self.add_index(index)
    }

    /// Register a scalar or table-valued function overload
    pub fn add_function(&mut self, function: FunctionDecl) -> CatalogResult<Arc<FunctionDecl>> {
        let overloads = self.functions.entry(function.name.clone()).or_default();
        if overloads
            .iter()
            .any(|f| f.parameter_types == function.parameter_types)
        {
            return Err(CatalogError::DuplicateFunction(function.signature()));
        }
        let function = Arc::new(function);
        overloads.push(function.clone());
        Ok(function)
    }

    /// Register an aggregate function overload
    pub fn add_aggregate_function(
        &mut self,
        function: AggregateFunctionDecl,
    ) -> CatalogResult<Arc<AggregateFunctionDecl>> {
        let overloads = self
            .aggregate_functions
            .entry(function.name.clone())
            .or_default();
        if overloads.iter().any(|f| {
            f.parameter_types == function.parameter_types
                && f.features.asterisk == function.features.asterisk
        }) {
            return Err(CatalogError::DuplicateFunction(function.signature()));
        }
        let function = Arc::new(function);
        overloads.push(function.clone());
        Ok(function)
    }

    /// Register a schema-level variable
    pub fn add_variable(&mut self, variable: VariableDecl) -> CatalogResult<Arc<VariableDecl>> {
        if self.variables.contains_key(&variable.name) {
            return Err(CatalogError::DuplicateVariable(
                self.name().to_string(),
                variable.name,
            ));
        }
        let variable = Arc::new(variable);
        self.variables
            .insert(variable.name.clone(), variable.clone());
        Ok(variable)
    }

    /// Registered tables, in registration order
    pub fn tables(&self) -> impl Iterator<Item = &Arc<TableDecl>> {
        self.tables.values()
    }
}

impl SchemaProvider for MemorySchema {
    fn declaration(&self) -> &Arc<SchemaDecl> {
        &self.declaration
    }

    fn find_table(&self, name: &str) -> Option<Arc<TableDecl>> {
        self.tables.get(name).cloned()
    }

    fn find_index(&self, name: &str) -> Option<Arc<IndexDecl>> {
        self.indexes.get(name).cloned()
    }

    fn find_primary_index(&self, table: &Arc<TableDecl>) -> Option<Arc<IndexDecl>> {
        self.indexes
            .values()
            .find(|i| i.is_primary() && Arc::ptr_eq(&i.table, table))
            .cloned()
    }

    fn find_functions(&self, name: &str) -> Vec<Arc<FunctionDecl>> {
        self.functions.get(name).cloned().unwrap_or_default()
    }

    fn find_aggregate_functions(&self, name: &str) -> Vec<Arc<AggregateFunctionDecl>> {
        self.aggregate_functions
            .get(name)
            .cloned()
            .unwrap_or_default()
    }

    fn find_variable(&self, name: &str) -> Option<Arc<VariableDecl>> {
        self.variables.get(name).cloned()
    }
}

/// A catalog of in-memory schemas
#[derive(Debug)]
pub struct MemoryCatalog {
    name: String,
    schemas: IndexMap<String, Arc<MemorySchema>>,
}

impl MemoryCatalog {
    /// Create an empty catalog
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schemas: IndexMap::new(),
        }
    }

    /// Freeze and register a schema
    pub fn add_schema(&mut self, schema: MemorySchema) -> CatalogResult<Arc<MemorySchema>> {
        if self.schemas.contains_key(schema.name()) {
            return Err(CatalogError::DuplicateSchema(schema.name().to_string()));
        }
        let schema = Arc::new(schema);
        self.schemas
            .insert(schema.name().to_string(), schema.clone());
        Ok(schema)
    }
}

impl Catalog for MemoryCatalog {
    fn name(&self) -> &str {
        &self.name
    }

    fn find_schema(&self, name: &str) -> Option<Arc<dyn SchemaProvider>> {
        self.schemas
            .get(name)
            .map(|s| s.clone() as Arc<dyn SchemaProvider>)
    }

    fn schemas(&self) -> Vec<Arc<dyn SchemaProvider>> {
        self.schemas
            .values()
            .map(|s| s.clone() as Arc<dyn SchemaProvider>)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use relsql_ir::decl::ColumnDecl;
    use relsql_ir::types::Type;

    use super::*;

    fn table(name: &str) -> TableDecl {
        TableDecl::new(name, "ignored").with_columns(vec![
            ColumnDecl::new("k", Type::Int8).with_nullable(false),
            ColumnDecl::new("v", Type::FLEXIBLE_VARCHAR),
        ])
    }

    #[test]
    fn test_add_table_sets_schema() {
        let mut schema = MemorySchema::new("public");
        let t = schema.add_table(table("t")).unwrap();
        assert_eq!(t.schema, "public");
        assert!(Arc::ptr_eq(&schema.find_table("t").unwrap(), &t));
        assert!(schema.find_table("T").is_none());
    }

    #[test]
    fn test_duplicate_table() {
        let mut schema = MemorySchema::new("public");
        schema.add_table(table("t")).unwrap();
        let err = schema.add_table(table("t")).unwrap_err();
        assert_eq!(
            err,
            CatalogError::DuplicateTable("public".into(), "t".into())
        );
    }

    #[test]
    fn test_primary_key() {
        let mut schema = MemorySchema::new("public");
        let t = schema.add_table(table("t")).unwrap();
        let pk = schema.add_primary_key(&t, &["k"]).unwrap();
        assert_eq!(pk.name, "t_pk");
        assert_eq!(pk.keys[0].position, 0);
        assert!(Arc::ptr_eq(&schema.find_primary_index(&t).unwrap(), &pk));

        let err = schema.add_primary_key(&t, &["v"]).unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateIndex(..)));

        let again = IndexDecl::new("t_pk2", t.clone()).primary().with_key(1);
        assert_eq!(
            schema.add_index(again).unwrap_err(),
            CatalogError::DuplicatePrimaryIndex("t".into())
        );
    }

    #[test]
    fn test_index_on_foreign_table() {
        let mut schema = MemorySchema::new("public");
        let foreign = Arc::new(table("x"));
        let err = schema
            .add_index(IndexDecl::new("x_i", foreign).with_key(0))
            .unwrap_err();
        assert_eq!(err, CatalogError::TableNotFound("x".into(), "public".into()));
    }

    #[test]
    fn test_function_overloads() {
        let mut schema = MemorySchema::new("public");
        schema
            .add_function(FunctionDecl::new(1, "f", Type::Int4).with_parameters(vec![Type::Int4]))
            .unwrap();
        schema
            .add_function(FunctionDecl::new(2, "f", Type::Int8).with_parameters(vec![Type::Int8]))
            .unwrap();
        assert_eq!(schema.find_functions("f").len(), 2);
        assert!(schema.find_functions("g").is_empty());
        assert!(
            schema
                .add_function(
                    FunctionDecl::new(3, "f", Type::Int4).with_parameters(vec![Type::Int4])
                )
                .is_err()
        );
    }

    #[test]
    fn test_catalog_schemas() {
        let mut catalog = MemoryCatalog::new("db");
        catalog.add_schema(MemorySchema::new("a")).unwrap();
        catalog.add_schema(MemorySchema::new("b")).unwrap();
        assert!(catalog.add_schema(MemorySchema::new("a")).is_err());

        let names: Vec<String> = catalog
            .schemas()
            .iter()
            .map(|s| s.declaration().name.clone())
            .collect();
        assert_eq!(names, vec!["a", "b"]);
        assert!(catalog.find_schema("c").is_none());
        assert_eq!(catalog.name(), "db");
    }
}
