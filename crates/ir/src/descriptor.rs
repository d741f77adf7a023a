// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Descriptors
//!
//! Opaque handles the IR uses to name variables, relations, functions and
//! schemas. Descriptors are cheap to clone and compare by identity:
//!
//! - a table-column variable equals another one iff both point at the same
//!   column of the same shared [`TableDecl`]
//! - declaration-backed descriptors compare by `Arc` identity
//! - synthetic variables (stream columns, let temporaries) compare by the id
//!   the [`BindingFactory`] minted for them
//!
//! Every descriptor is produced by a [`BindingFactory`], so ids never collide
//! within one analysis.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::decl::{
    AggregateFunctionDecl, FunctionDecl, IndexDecl, SchemaDecl, TableColumnRef, TableDecl,
    VariableDecl,
};

/// What a [`Variable`] stands for
#[derive(Debug, Clone)]
pub enum VariableKind {
    /// A column of a stored table
    TableColumn(TableColumnRef),
    /// A column flowing between relational operators
    Stream { label: Option<String> },
    /// A temporary introduced by a `let` expression
    Let,
    HostParameter(Arc<VariableDecl>),
    /// A schema-level variable
    External(Arc<VariableDecl>),
}

/// A variable descriptor
#[derive(Debug, Clone)]
pub struct Variable {
    id: u64,
    kind: VariableKind,
}

impl Variable {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn kind(&self) -> &VariableKind {
        &self.kind
    }

    /// Human-readable label, if the variable carries one
    pub fn label(&self) -> Option<&str> {
        match &self.kind {
            VariableKind::TableColumn(column) => Some(column.column().name.as_str()),
            VariableKind::Stream { label } => label.as_deref(),
            VariableKind::Let => None,
            VariableKind::HostParameter(decl) | VariableKind::External(decl) => {
                Some(decl.name.as_str())
            }
        }
    }

    pub fn table_column(&self) -> Option<&TableColumnRef> {
        match &self.kind {
            VariableKind::TableColumn(column) => Some(column),
            _ => None,
        }
    }

    pub fn is_stream(&self) -> bool {
        matches!(self.kind, VariableKind::Stream { .. })
    }
}

impl PartialEq for Variable {
    fn eq(&self, other: &Self) -> bool {
        match (&self.kind, &other.kind) {
            (VariableKind::TableColumn(a), VariableKind::TableColumn(b)) => a == b,
            (VariableKind::HostParameter(a), VariableKind::HostParameter(b))
            | (VariableKind::External(a), VariableKind::External(b)) => Arc::ptr_eq(a, b),
            (
                VariableKind::Stream { .. } | VariableKind::Let,
                VariableKind::Stream { .. } | VariableKind::Let,
            ) => self.id == other.id,
            _ => false,
        }
    }
}

impl Eq for Variable {}

impl Hash for Variable {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match &self.kind {
            VariableKind::TableColumn(column) => {
                0u8.hash(state);
                column.hash(state);
            }
            VariableKind::HostParameter(decl) => {
                1u8.hash(state);
                (Arc::as_ptr(decl) as usize).hash(state);
            }
            VariableKind::External(decl) => {
                2u8.hash(state);
                (Arc::as_ptr(decl) as usize).hash(state);
            }
            VariableKind::Stream { .. } | VariableKind::Let => {
                3u8.hash(state);
                self.id.hash(state);
            }
        }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            VariableKind::TableColumn(column) => write!(f, "{column}"),
            VariableKind::Stream { label: Some(label) } => write!(f, "{label}#{}", self.id),
            VariableKind::Stream { label: None } => write!(f, "#{}", self.id),
            VariableKind::Let => write!(f, "let#{}", self.id),
            VariableKind::HostParameter(decl) => write!(f, ":{}", decl.name),
            VariableKind::External(decl) => f.write_str(&decl.name),
        }
    }
}

/// A relation descriptor: what a scan or write targets
#[derive(Debug, Clone)]
pub enum Relation {
    Table(Arc<TableDecl>),
    Index(Arc<IndexDecl>),
}

impl Relation {
    /// The table the relation stores rows of
    pub fn table(&self) -> &Arc<TableDecl> {
        match self {
            Relation::Table(table) => table,
            Relation::Index(index) => &index.table,
        }
    }
}

impl PartialEq for Relation {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Relation::Table(a), Relation::Table(b)) => Arc::ptr_eq(a, b),
            (Relation::Index(a), Relation::Index(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Eq for Relation {}

macro_rules! declaration_descriptor {
    ($(#[$meta:meta])* $name:ident => $decl:ty) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $name(Arc<$decl>);

        impl $name {
            pub fn declaration(&self) -> &Arc<$decl> {
                &self.0
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                Arc::ptr_eq(&self.0, &other.0)
            }
        }

        impl Eq for $name {}
    };
}

declaration_descriptor!(
    /// A scalar or table-valued function descriptor
    Function => FunctionDecl
);
declaration_descriptor!(
    /// An aggregate function descriptor
    AggregateFunction => AggregateFunctionDecl
);
declaration_descriptor!(
    /// A schema descriptor
    Schema => SchemaDecl
);

/// Mints descriptors for one analysis.
#[derive(Debug, Default)]
pub struct BindingFactory {
    next_id: u64,
}

impl BindingFactory {
    pub fn new() -> Self {
        Self::default()
    }

    fn variable(&mut self, kind: VariableKind) -> Variable {
        self.next_id += 1;
        Variable {
            id: self.next_id,
            kind,
        }
    }

    pub fn table_column(&mut self, column: TableColumnRef) -> Variable {
        self.variable(VariableKind::TableColumn(column))
    }

    pub fn stream_variable(&mut self, label: Option<&str>) -> Variable {
        self.variable(VariableKind::Stream {
            label: label.map(str::to_string),
        })
    }

    pub fn let_variable(&mut self) -> Variable {
        self.variable(VariableKind::Let)
    }

    pub fn host_parameter(&mut self, decl: Arc<VariableDecl>) -> Variable {
        self.variable(VariableKind::HostParameter(decl))
    }

    pub fn external_variable(&mut self, decl: Arc<VariableDecl>) -> Variable {
        self.variable(VariableKind::External(decl))
    }

    pub fn function(&self, decl: Arc<FunctionDecl>) -> Function {
        Function(decl)
    }

    pub fn aggregate_function(&self, decl: Arc<AggregateFunctionDecl>) -> AggregateFunction {
        AggregateFunction(decl)
    }

    pub fn schema(&self, decl: Arc<SchemaDecl>) -> Schema {
        Schema(decl)
    }

    pub fn table(&self, decl: Arc<TableDecl>) -> Relation {
        Relation::Table(decl)
    }

    pub fn index(&self, decl: Arc<IndexDecl>) -> Relation {
        Relation::Index(decl)
    }
}
