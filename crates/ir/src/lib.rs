// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # relsql - Intermediate Representation
//!
//! The model the analyzer emits into:
//! - [`types`] and [`value`]: IR types and immediate values
//! - [`decl`]: catalog declarations (tables, indexes, functions, variables)
//! - [`descriptor`]: identity-compared handles and the binding factory
//! - [`scalar`]: lowered scalar expressions
//! - [`plan`]: the relational operator graph
//! - [`statement`]: DDL statements and execution plans

pub mod decl;
pub mod descriptor;
pub mod plan;
pub mod scalar;
pub mod statement;
pub mod types;
pub mod value;

pub use decl::{
    AggregateFunctionDecl, ColumnDecl, DISTINCT_SUFFIX, FunctionDecl, IndexDecl, SchemaDecl,
    TableColumnRef, TableDecl, VariableDecl,
};
pub use descriptor::{BindingFactory, Relation, Variable, VariableKind};
pub use plan::{Graph, NodeId, Operator, OperatorKind, Output};
pub use scalar::Scalar;
pub use statement::{ExecutionPlan, PlanKind, Statement};
pub use types::{RowField, Type};
pub use value::Value;
