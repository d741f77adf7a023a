// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Mock catalog construction for testing
//!
//! Builds [`MemoryCatalog`]s from YAML schema fixtures, with the builtin
//! functions installed into the first schema.

use std::sync::Arc;

use relsql_catalog::{Catalog, MemoryCatalog, MemorySchema};
use relsql_function_registry::FunctionRegistry;
use relsql_ir::decl::{ColumnDecl, FunctionDecl, TableDecl, VariableDecl};
use relsql_ir::{RowField, Type, Value};

use crate::fixtures::{FixtureError, STANDARD_SCHEMA, SchemaFixture, parse_type};

/// Id of the `series` table-valued function in the standard schema
pub const SERIES_FUNCTION_ID: u64 = 10_000;

/// Builder for creating mock catalogs with a fluent API
pub struct MockCatalogBuilder {
    name: String,
    schemas: Vec<MemorySchema>,
    builtins: bool,
}

impl Default for MockCatalogBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCatalogBuilder {
    /// An empty catalog named `db`, with builtin functions
    pub fn new() -> Self {
        Self {
            name: "db".to_string(),
            schemas: Vec::new(),
            builtins: true,
        }
    }

    /// Leave the builtin functions out
    pub fn without_builtins(mut self) -> Self {
        self.builtins = false;
        self
    }

    /// Add the standard test schema
    ///
    /// Holds the tables of [`STANDARD_SCHEMA`] plus the table-valued
    /// function `series(int8, int8) -> table(n int8)`.
    pub fn with_standard_schema(self) -> Self {
        let mut builder = self
            .try_with_yaml(STANDARD_SCHEMA)
            .expect("standard schema fixture is valid");
        if let Some(schema) = builder.schemas.last_mut() {
            schema
                .add_function(series_function())
                .expect("series is registered once");
        }
        builder
    }

    /// Add a schema described in YAML
    pub fn try_with_yaml(mut self, yaml: &str) -> Result<Self, FixtureError> {
        let fixture = SchemaFixture::from_yaml(yaml)?;
        self.schemas.push(build_schema(&fixture)?);
        Ok(self)
    }

    /// Add a schema built by hand
    pub fn with_schema(mut self, schema: MemorySchema) -> Self {
        self.schemas.push(schema);
        self
    }

    pub fn build(self) -> MemoryCatalog {
        let mut schemas = self.schemas;
        if schemas.is_empty() {
            schemas.push(MemorySchema::new("public"));
        }
        if self.builtins {
            FunctionRegistry::new()
                .install(&mut schemas[0])
                .expect("builtins install into a fresh schema");
        }
        let mut catalog = MemoryCatalog::new(self.name);
        for schema in schemas {
            catalog.add_schema(schema).expect("schema names are distinct");
        }
        catalog
    }

    /// Build and erase the concrete type
    pub fn build_shared(self) -> Arc<dyn Catalog> {
        Arc::new(self.build())
    }
}

fn series_function() -> FunctionDecl {
    FunctionDecl::new(
        SERIES_FUNCTION_ID,
        "series",
        Type::Table(vec![RowField::new("n", Type::Int8)]),
    )
    .with_parameters(vec![Type::Int8, Type::Int8])
    .table_valued()
}

/// Turn a schema fixture into a memory schema
pub fn build_schema(fixture: &SchemaFixture) -> Result<MemorySchema, FixtureError> {
    let mut schema = MemorySchema::new(fixture.name.clone());
    for table in &fixture.tables {
        let mut columns = Vec::with_capacity(table.columns.len());
        for column in &table.columns {
            let mut decl = ColumnDecl::new(column.name.clone(), parse_type(&column.ty)?)
                .with_nullable(column.nullable);
            if column.hidden {
                decl = decl.hidden();
            }
            if let Some(default) = &column.default {
                decl = decl.with_default(Value::Character(default.clone()));
            }
            columns.push(decl);
        }
        let decl = schema.add_table(
            TableDecl::new(table.name.clone(), fixture.name.clone()).with_columns(columns),
        )?;
        if !table.primary_key.is_empty() {
            let keys: Vec<&str> = table.primary_key.iter().map(String::as_str).collect();
            schema.add_primary_key(&decl, &keys)?;
        }
    }
    for variable in &fixture.variables {
        schema.add_variable(VariableDecl::new(variable.name.clone(), parse_type(&variable.ty)?))?;
    }
    Ok(schema)
}

#[cfg(test)]
mod tests {
    use relsql_catalog::SchemaProvider;

    use super::*;

    #[test]
    fn test_standard_catalog() {
        let catalog = MockCatalogBuilder::new().with_standard_schema().build();
        let schema = catalog.find_schema("public").unwrap();

        let t = schema.find_table("t").unwrap();
        assert_eq!(t.columns.len(), 2);
        let pk = schema.find_primary_index(&t).unwrap();
        assert_eq!(pk.keys[0].position, 0);

        assert!(!schema.find_functions("upper").is_empty());
        assert!(!schema.find_aggregate_functions("count").is_empty());
        assert!(schema.find_functions("series")[0].features.table_valued);
        assert!(schema.find_variable("tenant_id").is_some());
    }

    #[test]
    fn test_without_builtins() {
        let catalog = MockCatalogBuilder::new().without_builtins().build();
        let schema = catalog.find_schema("public").unwrap();
        assert!(schema.find_functions("upper").is_empty());
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let yaml = "name: s\ntables:\n  - name: x\n    columns:\n      - { name: c, type: blob }\n";
        assert!(matches!(
            MockCatalogBuilder::new().try_with_yaml(yaml),
            Err(FixtureError::UnknownType(_))
        ));
    }
}
