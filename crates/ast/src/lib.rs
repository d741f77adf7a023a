// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # relsql - Abstract Syntax Tree
//!
//! This crate provides the parsed form of one SQL statement as consumed by
//! the semantic analyzer. The tree is:
//! - Immutable once built; the analyzer only reads and pattern-matches it
//! - Closed: every node family is a sum type, matched exhaustively
//! - Lossless for literals: token text is kept verbatim

pub mod expr;
pub mod literal;
pub mod name;
pub mod query;
pub mod statement;
pub mod types;

// Re-export commonly used types
pub use expr::{
    BinaryOp, ComparisonOp, Expr, FunctionArguments, FunctionCall, PatternOp, UnaryOp, WhenClause,
};
pub use literal::{Literal, TemporalKind, TruthValue};
pub use name::{Identifier, Name, Span};
pub use query::{
    ApplyKind, Correlation, JoinCondition, JoinKind, QueryExpr, Select, SelectItem, SetOperator,
    SetQuantifier, SortDirection, SortKey, TableRef, WithElement,
};
pub use statement::{
    Assignment, ColumnDefinition, CreateIndex, CreateTable, Delete, IndexKey, Insert,
    InsertSource, Statement, Update,
};
pub use types::{DataType, Length};
