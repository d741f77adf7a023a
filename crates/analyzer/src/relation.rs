// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! # Relation info
//!
//! What a compiled table expression exposes: an ordered list of columns,
//! each bound to a stream variable of the graph, plus optional provenance.
//! Column order is significant (`SELECT *`, VALUES arity, positional column
//! lists). All variables of one relation are distinct.

use std::sync::Arc;

use relsql_ir::decl::{IndexDecl, TableColumnRef, TableDecl};
use relsql_ir::{Type, Variable};

/// A column exposed by a relation
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnInfo {
    /// Normalized column name; `None` for unnamed expressions
    pub identifier: Option<String>,
    /// The stream variable carrying the column
    pub variable: Variable,
    pub ty: Type,
    /// Declaring table column, when the column is a plain scan output
    pub source: Option<TableColumnRef>,
    /// Visible to unqualified lookup and `*`
    pub exported: bool,
}

impl ColumnInfo {
    pub fn new(identifier: Option<String>, variable: Variable, ty: Type) -> Self {
        Self {
            identifier,
            variable,
            ty,
            source: None,
            exported: true,
        }
    }

    /// Builder method: record the declaring table column
    pub fn with_source(mut self, source: TableColumnRef) -> Self {
        self.source = Some(source);
        self
    }

    /// Builder method: set visibility
    pub fn with_exported(mut self, exported: bool) -> Self {
        self.exported = exported;
        self
    }

    pub fn is_named(&self, name: &str) -> bool {
        self.identifier.as_deref() == Some(name)
    }
}

/// The columns a table expression exposes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelationInfo {
    pub columns: Vec<ColumnInfo>,
    /// Scanned table, for base table references
    pub table: Option<Arc<TableDecl>>,
    /// Scanned index, when the scan reads one
    pub index: Option<Arc<IndexDecl>>,
    /// Normalized correlation name
    pub correlation: Option<String>,
}

impl RelationInfo {
    pub fn new(columns: Vec<ColumnInfo>) -> Self {
        Self {
            columns,
            ..Self::default()
        }
    }

    /// Builder method: set the correlation name
    pub fn with_correlation(mut self, correlation: Option<String>) -> Self {
        self.correlation = correlation;
        self
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Positions of every column named `name`, exported or not
    pub fn find_columns(&self, name: &str) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_named(name))
            .map(|(i, _)| i)
            .collect()
    }

    /// Columns visible to `*`
    pub fn exported_columns(&self) -> impl Iterator<Item = &ColumnInfo> {
        self.columns.iter().filter(|c| c.exported)
    }

    pub fn variables(&self) -> Vec<Variable> {
        self.columns.iter().map(|c| c.variable.clone()).collect()
    }

    /// The column carried by `variable`
    pub fn column_of(&self, variable: &Variable) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| &c.variable == variable)
    }
}

#[cfg(test)]
mod tests {
    use relsql_ir::BindingFactory;

    use super::*;

    #[test]
    fn test_find_columns() {
        let mut factory = BindingFactory::new();
        let relation = RelationInfo::new(vec![
            ColumnInfo::new(Some("a".into()), factory.stream_variable(Some("a")), Type::Int4),
            ColumnInfo::new(None, factory.stream_variable(None), Type::Int4),
            ColumnInfo::new(Some("a".into()), factory.stream_variable(Some("a")), Type::Int8)
                .with_exported(false),
        ]);

        assert_eq!(relation.find_columns("a"), vec![0, 2]);
        assert!(relation.find_columns("b").is_empty());
        assert_eq!(relation.exported_columns().count(), 2);
        assert_eq!(relation.len(), 3);
    }

    #[test]
    fn test_column_of() {
        let mut factory = BindingFactory::new();
        let v = factory.stream_variable(Some("v"));
        let relation = RelationInfo::new(vec![ColumnInfo::new(
            Some("v".into()),
            v.clone(),
            Type::FLEXIBLE_VARCHAR,
        )]);
        assert_eq!(relation.column_of(&v).unwrap().ty, Type::FLEXIBLE_VARCHAR);
        assert!(relation.column_of(&factory.let_variable()).is_none());
    }
}
