// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Query expressions
//!
//! SELECT-family query expressions and the table references they read from.
//!
//! ## Query structure
//!
//! ```text
//! QueryExpr
//! ├── Select
//! │   ├── quantifier (DISTINCT / ALL)
//! │   ├── items (select list)
//! │   ├── from (table references)
//! │   ├── where_clause
//! │   ├── group_by
//! │   ├── having
//! │   ├── order_by
//! │   └── limit
//! ├── Values (table value constructor)
//! ├── SetOperation (UNION / INTERSECT / EXCEPT)
//! └── With (WITH elements + body)
//! ```
//!
//! ## Table references
//!
//! ```sql
//! FROM t                                   -- Table
//! FROM t AS x (a, b)                       -- Table with correlation
//! FROM (SELECT ...) AS s                   -- Subquery
//! FROM a LEFT JOIN b ON a.id = b.id        -- Join
//! FROM a CROSS APPLY f(a.x) AS r           -- Apply
//! FROM a, b                                -- two items, implicit CROSS JOIN
//! ```

use serde::{Deserialize, Serialize};

use crate::expr::Expr;
use crate::name::{Identifier, Name};

/// `ALL` / `DISTINCT`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SetQuantifier {
    All,
    Distinct,
}

/// A query expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum QueryExpr {
    Select(Box<Select>),

    /// `VALUES (..), (..)`
    Values(Vec<Vec<Expr>>),

    SetOperation {
        op: SetOperator,
        quantifier: Option<SetQuantifier>,
        /// `CORRESPONDING [BY (...)]`
        corresponding: Option<Vec<Identifier>>,
        left: Box<QueryExpr>,
        right: Box<QueryExpr>,
    },

    With {
        recursive: bool,
        elements: Vec<WithElement>,
        body: Box<QueryExpr>,
    },
}

impl QueryExpr {
    pub fn select(select: Select) -> Self {
        QueryExpr::Select(Box::new(select))
    }

    pub fn set_operation(
        op: SetOperator,
        quantifier: Option<SetQuantifier>,
        left: QueryExpr,
        right: QueryExpr,
    ) -> Self {
        QueryExpr::SetOperation {
            op,
            quantifier,
            corresponding: None,
            left: Box::new(left),
            right: Box::new(right),
        }
    }
}

/// Set operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SetOperator {
    Union,
    Intersect,
    Except,
}

/// One `name [(cols)] AS (query)` entry of a WITH clause
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WithElement {
    pub name: Identifier,
    pub columns: Vec<Identifier>,
    pub query: QueryExpr,
}

/// A SELECT query block
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Select {
    pub quantifier: Option<SetQuantifier>,
    pub items: Vec<SelectItem>,
    pub from: Vec<TableRef>,
    pub where_clause: Option<Expr>,
    pub group_by: Vec<Expr>,
    pub having: Option<Expr>,
    pub order_by: Vec<SortKey>,
    pub limit: Option<Expr>,
}

impl Select {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: add an unaliased select item
    pub fn item(mut self, expr: Expr) -> Self {
        self.items.push(SelectItem::Expr { expr, alias: None });
        self
    }

    /// Builder method: add an aliased select item
    pub fn item_as(mut self, expr: Expr, alias: &str) -> Self {
        self.items.push(SelectItem::Expr {
            expr,
            alias: Some(Identifier::new(alias)),
        });
        self
    }

    /// Builder method: add `*`
    pub fn asterisk(mut self) -> Self {
        self.items.push(SelectItem::Asterisk(None));
        self
    }

    /// Builder method: add a FROM item
    pub fn from(mut self, table: TableRef) -> Self {
        self.from.push(table);
        self
    }

    pub fn filter(mut self, condition: Expr) -> Self {
        self.where_clause = Some(condition);
        self
    }

    pub fn group_by(mut self, key: Expr) -> Self {
        self.group_by.push(key);
        self
    }

    pub fn having(mut self, condition: Expr) -> Self {
        self.having = Some(condition);
        self
    }

    pub fn order_by(mut self, key: SortKey) -> Self {
        self.order_by.push(key);
        self
    }

    pub fn limit(mut self, count: Expr) -> Self {
        self.limit = Some(count);
        self
    }

    pub fn distinct(mut self) -> Self {
        self.quantifier = Some(SetQuantifier::Distinct);
        self
    }
}

/// An item in the select list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SelectItem {
    Expr {
        expr: Expr,
        alias: Option<Identifier>,
    },
    /// `*` when `None`, `r.*` otherwise
    Asterisk(Option<Name>),
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// An ORDER BY key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortKey {
    pub key: Expr,
    pub direction: Option<SortDirection>,
}

impl SortKey {
    pub fn ascending(key: Expr) -> Self {
        Self {
            key,
            direction: Some(SortDirection::Ascending),
        }
    }

    pub fn descending(key: Expr) -> Self {
        Self {
            key,
            direction: Some(SortDirection::Descending),
        }
    }
}

/// `AS name [(c1, c2, ...)]`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Correlation {
    pub name: Identifier,
    pub columns: Vec<Identifier>,
}

impl Correlation {
    pub fn new(name: &str) -> Self {
        Self {
            name: Identifier::new(name),
            columns: Vec::new(),
        }
    }

    pub fn with_columns(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| Identifier::new(*c)).collect();
        self
    }
}

/// Join kinds as written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JoinKind {
    Cross,
    Inner,
    LeftOuter,
    RightOuter,
    FullOuter,
    NaturalInner,
    NaturalLeftOuter,
    NaturalRightOuter,
    NaturalFullOuter,
}

/// Join specification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum JoinCondition {
    On(Expr),
    Using(Vec<Identifier>),
}

/// `CROSS APPLY` / `OUTER APPLY`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApplyKind {
    Cross,
    Outer,
}

/// A table reference in a FROM clause
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TableRef {
    Table {
        name: Name,
        correlation: Option<Correlation>,
    },

    Subquery {
        query: Box<QueryExpr>,
        correlation: Option<Correlation>,
    },

    Join {
        kind: JoinKind,
        left: Box<TableRef>,
        right: Box<TableRef>,
        condition: Option<JoinCondition>,
    },

    Apply {
        kind: ApplyKind,
        operand: Box<TableRef>,
        function: Name,
        arguments: Vec<Expr>,
        correlation: Option<Correlation>,
    },
}

impl TableRef {
    pub fn table(name: &str) -> Self {
        TableRef::Table {
            name: Name::qualified(name),
            correlation: None,
        }
    }

    pub fn aliased(name: &str, alias: &str) -> Self {
        TableRef::Table {
            name: Name::qualified(name),
            correlation: Some(Correlation::new(alias)),
        }
    }

    pub fn subquery(query: QueryExpr, correlation: Option<Correlation>) -> Self {
        TableRef::Subquery {
            query: Box::new(query),
            correlation,
        }
    }

    pub fn join(kind: JoinKind, left: TableRef, right: TableRef, on: Option<Expr>) -> Self {
        TableRef::Join {
            kind,
            left: Box::new(left),
            right: Box::new(right),
            condition: on.map(JoinCondition::On),
        }
    }
}
