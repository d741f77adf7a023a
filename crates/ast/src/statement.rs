// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Statements
//!
//! Top-level DML and DDL statements.

use serde::{Deserialize, Serialize};

use crate::expr::Expr;
use crate::name::{Identifier, Name};
use crate::query::{QueryExpr, SortDirection};
use crate::types::DataType;

/// A SQL statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    Select(QueryExpr),
    Insert(Insert),
    Update(Update),
    Delete(Delete),
    CreateTable(CreateTable),
    DropTable { name: Name, if_exists: bool },
    CreateIndex(CreateIndex),
    DropIndex { name: Name, if_exists: bool },
}

/// Source rows of an INSERT
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InsertSource {
    Values(Vec<Vec<Expr>>),
    Query(QueryExpr),
    DefaultValues,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insert {
    pub table: Name,
    /// Explicit target columns, empty for "all columns"
    pub columns: Vec<Identifier>,
    pub source: InsertSource,
}

/// `SET column = value`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub column: Identifier,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Update {
    pub table: Name,
    pub assignments: Vec<Assignment>,
    pub where_clause: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delete {
    pub table: Name,
    pub where_clause: Option<Expr>,
}

/// A column definition in CREATE TABLE
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    pub name: Identifier,
    pub data_type: DataType,
    pub not_null: bool,
    pub default: Option<Expr>,
    /// Column-level `PRIMARY KEY`
    pub primary_key: bool,
}

impl ColumnDefinition {
    pub fn new(name: &str, data_type: DataType) -> Self {
        Self {
            name: Identifier::new(name),
            data_type,
            not_null: false,
            default: None,
            primary_key: false,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn with_default(mut self, default: Expr) -> Self {
        self.default = Some(default);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTable {
    pub name: Name,
    pub if_not_exists: bool,
    pub columns: Vec<ColumnDefinition>,
    /// Table-level `PRIMARY KEY (...)` constraints, in source order
    pub primary_keys: Vec<Vec<Identifier>>,
}

/// A key column of CREATE INDEX
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexKey {
    pub column: Identifier,
    pub direction: Option<SortDirection>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateIndex {
    pub name: Name,
    pub table: Name,
    pub keys: Vec<IndexKey>,
    pub if_not_exists: bool,
}
