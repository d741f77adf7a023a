// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Statements
//!
//! Top-level analysis results: DDL statements and execution plans.

use std::sync::Arc;

use crate::decl::{IndexDecl, TableDecl};
use crate::descriptor::{Relation, Schema};
use crate::plan::{Graph, NodeId};

/// What an execution plan does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlanKind {
    Query,
    Insert,
    Update,
    Delete,
}

/// A DML statement lowered to an operator graph
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionPlan {
    pub kind: PlanKind,
    pub graph: Graph,
    /// The `emit` or `write` node terminating the graph
    pub terminal: NodeId,
}

/// A DDL statement
#[derive(Debug, Clone)]
pub enum Statement {
    CreateTable {
        schema: Schema,
        table: Arc<TableDecl>,
        primary_index: Option<Arc<IndexDecl>>,
    },
    DropTable {
        table: Relation,
    },
    CreateIndex {
        index: Arc<IndexDecl>,
    },
    DropIndex {
        index: Relation,
    },
    /// Nothing to do, e.g. `DROP TABLE IF EXISTS` on a missing table
    Empty,
}
