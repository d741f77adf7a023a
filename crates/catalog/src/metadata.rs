// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Metadata types for database schema information
//!
//! This module re-exports declaration types from the `relsql-ir` crate.
//! These types define the schema information for tables, columns, indexes,
//! functions and variables.

// Re-export all declaration types from the ir crate
pub use relsql_ir::decl::{
    AggregateFeatures, AggregateFunctionDecl, ColumnDecl, ColumnFeatures, DISTINCT_SUFFIX,
    FunctionDecl, FunctionFeatures, IndexDecl, IndexFeatures, IndexKeyDecl, SchemaDecl, SortOrder,
    TableColumnRef, TableDecl, VariableDecl,
};
