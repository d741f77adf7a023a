// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Declarations
//!
//! This module defines the catalog-side declarations the analyzer reads:
//! schemas, tables with their columns, indexes, functions, aggregate
//! functions and schema-level variables. Providers own them behind `Arc`;
//! descriptors compare by the identity of the `Arc` they wrap.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::types::Type;
use crate::value::Value;

/// Name suffix distinguishing the `DISTINCT` variant of an aggregate function.
///
/// `COUNT(DISTINCT x)` resolves against `count$distinct`.
pub const DISTINCT_SUFFIX: &str = "$distinct";

/// Metadata for a schema
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SchemaDecl {
    pub name: String,
}

impl SchemaDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Column feature flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnFeatures {
    /// System column invisible to `*` and to name lookup
    pub hidden: bool,
    /// Generated by the storage layer
    pub synthesized: bool,
    pub read_only: bool,
}

/// Metadata for a table column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDecl {
    /// Column name
    pub name: String,
    /// Data type
    #[serde(rename = "type")]
    pub ty: Type,
    /// Whether the column is nullable
    #[serde(default = "default_nullable")]
    pub nullable: bool,
    /// Default value, if declared
    #[serde(default)]
    pub default_value: Option<Value>,
    #[serde(default)]
    pub features: ColumnFeatures,
}

fn default_nullable() -> bool {
    true
}

impl ColumnDecl {
    /// Create a new nullable column with builder pattern
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
            nullable: true,
            default_value: None,
            features: ColumnFeatures::default(),
        }
    }

    /// Builder method: set nullable
    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Builder method: set default value
    pub fn with_default(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }

    /// Builder method: mark as hidden system column
    pub fn hidden(mut self) -> Self {
        self.features.hidden = true;
        self
    }

    /// Whether name lookup and `*` can see this column
    pub fn is_exported(&self) -> bool {
        !self.features.hidden && !self.features.synthesized
    }
}

/// Metadata for a table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDecl {
    /// Table name
    pub name: String,
    /// Owning schema name
    #[serde(default)]
    pub schema: String,
    /// Column definitions in declared order
    pub columns: Vec<ColumnDecl>,
}

impl TableDecl {
    /// Create new table metadata with builder pattern
    pub fn new(name: impl Into<String>, schema: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: schema.into(),
            columns: Vec::new(),
        }
    }

    /// Builder method: add columns
    pub fn with_columns(mut self, columns: Vec<ColumnDecl>) -> Self {
        self.columns = columns;
        self
    }

    /// Get column position and declaration by name
    pub fn column(&self, name: &str) -> Option<(usize, &ColumnDecl)> {
        self.columns.iter().enumerate().find(|(_, c)| c.name == name)
    }
}

/// A column of a shared table declaration, identified by position.
///
/// Two references are equal only if they point into the same `Arc`.
#[derive(Debug, Clone)]
pub struct TableColumnRef {
    table: Arc<TableDecl>,
    position: usize,
}

impl TableColumnRef {
    /// Returns `None` if `position` is out of range
    pub fn new(table: Arc<TableDecl>, position: usize) -> Option<Self> {
        (position < table.columns.len()).then_some(Self { table, position })
    }

    pub fn table(&self) -> &Arc<TableDecl> {
        &self.table
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn column(&self) -> &ColumnDecl {
        &self.table.columns[self.position]
    }
}

impl PartialEq for TableColumnRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.table, &other.table) && self.position == other.position
    }
}

impl Eq for TableColumnRef {}

impl std::hash::Hash for TableColumnRef {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        (Arc::as_ptr(&self.table) as usize).hash(state);
        self.position.hash(state);
    }
}

impl fmt::Display for TableColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table.name, self.column().name)
    }
}

/// Sort order of an index key
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// One key column of an index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IndexKeyDecl {
    /// Position of the key column in the owning table
    pub position: usize,
    pub order: SortOrder,
}

/// Index feature flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct IndexFeatures {
    pub primary: bool,
    pub unique: bool,
}

/// Metadata for an index over a table
#[derive(Debug, Clone, PartialEq)]
pub struct IndexDecl {
    pub name: String,
    pub table: Arc<TableDecl>,
    pub keys: Vec<IndexKeyDecl>,
    pub features: IndexFeatures,
}

impl IndexDecl {
    pub fn new(name: impl Into<String>, table: Arc<TableDecl>) -> Self {
        Self {
            name: name.into(),
            table,
            keys: Vec::new(),
            features: IndexFeatures::default(),
        }
    }

    /// Builder method: add an ascending key column by position
    pub fn with_key(mut self, position: usize) -> Self {
        self.keys.push(IndexKeyDecl {
            position,
            order: SortOrder::Ascending,
        });
        self
    }

    /// Builder method: mark as the table's primary index
    pub fn primary(mut self) -> Self {
        self.features.primary = true;
        self.features.unique = true;
        self
    }

    pub fn is_primary(&self) -> bool {
        self.features.primary
    }
}

/// Function feature flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FunctionFeatures {
    /// Returns a [`Type::Table`]; usable only from APPLY
    pub table_valued: bool,
}

/// Metadata for a scalar or table-valued function overload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDecl {
    pub id: u64,
    pub name: String,
    pub return_type: Type,
    pub parameter_types: Vec<Type>,
    #[serde(default)]
    pub features: FunctionFeatures,
}

impl FunctionDecl {
    /// Create new function metadata with builder pattern
    pub fn new(id: u64, name: impl Into<String>, return_type: Type) -> Self {
        Self {
            id,
            name: name.into(),
            return_type,
            parameter_types: Vec::new(),
            features: FunctionFeatures::default(),
        }
    }

    /// Builder method: set parameter types
    pub fn with_parameters(mut self, parameter_types: Vec<Type>) -> Self {
        self.parameter_types = parameter_types;
        self
    }

    /// Builder method: mark as table-valued
    pub fn table_valued(mut self) -> Self {
        self.features.table_valued = true;
        self
    }

    /// Signature for diagnostics, e.g. `abs(bigint) -> bigint`
    pub fn signature(&self) -> String {
        signature(&self.name, &self.parameter_types, &self.return_type)
    }
}

/// Aggregate function feature flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AggregateFeatures {
    /// Accepts `*` in place of arguments, as `COUNT(*)`
    pub asterisk: bool,
}

/// Metadata for an aggregate function overload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateFunctionDecl {
    pub id: u64,
    pub name: String,
    pub return_type: Type,
    pub parameter_types: Vec<Type>,
    #[serde(default)]
    pub features: AggregateFeatures,
}

impl AggregateFunctionDecl {
    pub fn new(id: u64, name: impl Into<String>, return_type: Type) -> Self {
        Self {
            id,
            name: name.into(),
            return_type,
            parameter_types: Vec::new(),
            features: AggregateFeatures::default(),
        }
    }

    pub fn with_parameters(mut self, parameter_types: Vec<Type>) -> Self {
        self.parameter_types = parameter_types;
        self
    }

    pub fn asterisk(mut self) -> Self {
        self.features.asterisk = true;
        self
    }

    pub fn signature(&self) -> String {
        if self.features.asterisk {
            return format!("{}(*) -> {}", self.name, self.return_type);
        }
        signature(&self.name, &self.parameter_types, &self.return_type)
    }
}

fn signature(name: &str, parameters: &[Type], return_type: &Type) -> String {
    let params: Vec<String> = parameters.iter().map(|t| t.to_string()).collect();
    format!("{}({}) -> {}", name, params.join(", "), return_type)
}

/// Metadata for a schema-level variable or a host parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: Type,
}

impl VariableDecl {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}
