// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Test fixtures: catalog schemas in YAML and sample statements

use relsql_ast::{
    BinaryOp, ComparisonOp, Expr, JoinKind, QueryExpr, Select, SetOperator, SetQuantifier,
    SortKey, Statement, TableRef,
};
use relsql_ir::Type;
use serde::Deserialize;
use thiserror::Error;

/// The standard test schema
///
/// `t` is the smallest table most tests need; `users` and `orders` cover
/// joins and aggregation.
pub const STANDARD_SCHEMA: &str = r#"
name: public
tables:
  - name: t
    columns:
      - { name: k, type: int8, nullable: false }
      - { name: v, type: varchar }
    primary_key: [k]
  - name: u
    columns:
      - { name: a, type: int4 }
      - { name: b, type: int4 }
  - name: f
    columns:
      - { name: x, type: float8 }
  - name: users
    columns:
      - { name: id, type: int8, nullable: false }
      - { name: email, type: "varchar(255)", nullable: false }
      - { name: name, type: "varchar(100)" }
      - { name: created_at, type: timestamp }
      - { name: row_version, type: int8, hidden: true }
    primary_key: [id]
  - name: orders
    columns:
      - { name: id, type: int8, nullable: false }
      - { name: user_id, type: int8, nullable: false }
      - { name: total, type: "decimal(10, 2)" }
      - { name: status, type: varchar, default: pending }
    primary_key: [id]
variables:
  - { name: tenant_id, type: int4 }
"#;

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("invalid fixture document: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("unknown type '{0}' in fixture")]
    UnknownType(String),

    #[error(transparent)]
    Catalog(#[from] relsql_catalog::CatalogError),
}

/// A schema described in YAML
#[derive(Debug, Clone, Deserialize)]
pub struct SchemaFixture {
    pub name: String,
    #[serde(default)]
    pub tables: Vec<TableFixture>,
    #[serde(default)]
    pub variables: Vec<VariableFixture>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TableFixture {
    pub name: String,
    pub columns: Vec<ColumnFixture>,
    #[serde(default)]
    pub primary_key: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ColumnFixture {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
    #[serde(default)]
    pub hidden: bool,
    /// Character default value
    #[serde(default)]
    pub default: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VariableFixture {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
}

fn default_nullable() -> bool {
    true
}

impl SchemaFixture {
    pub fn from_yaml(text: &str) -> Result<Self, FixtureError> {
        Ok(serde_yaml::from_str(text)?)
    }
}

/// Parse the short type names used in fixtures, e.g. `int8`, `varchar(10)`
pub fn parse_type(text: &str) -> Result<Type, FixtureError> {
    let text = text.trim().to_ascii_lowercase();
    let (head, arguments) = match text.split_once('(') {
        Some((head, rest)) => {
            let arguments: Vec<u32> = rest
                .trim_end_matches(')')
                .split(',')
                .map(|a| a.trim().parse())
                .collect::<Result<_, _>>()
                .map_err(|_| FixtureError::UnknownType(text.clone()))?;
            (head.trim().to_string(), arguments)
        }
        None => (text.clone(), Vec::new()),
    };
    let ty = match (head.as_str(), arguments.as_slice()) {
        ("boolean", []) => Type::Boolean,
        ("int1", []) => Type::Int1,
        ("int2", []) => Type::Int2,
        ("int4", []) => Type::Int4,
        ("int8", []) => Type::Int8,
        ("float4", []) => Type::Float4,
        ("float8", []) => Type::Float8,
        ("decimal", []) => Type::FLEXIBLE_DECIMAL,
        ("decimal", [p, s]) => Type::decimal(*p, *s),
        ("varchar", []) => Type::FLEXIBLE_VARCHAR,
        ("varchar", [n]) => Type::varchar(*n),
        ("char", [n]) => Type::char(*n),
        ("date", []) => Type::Date,
        ("timestamp", []) => Type::TimePoint {
            with_time_zone: false,
        },
        _ => return Err(FixtureError::UnknownType(text)),
    };
    Ok(ty)
}

/// Sample statements, built as syntax trees
pub struct SqlFixtures;

impl SqlFixtures {
    /// `SELECT v FROM t WHERE k > 0`
    pub fn select_with_where() -> Statement {
        Statement::Select(QueryExpr::select(
            Select::new()
                .item(Expr::column("v"))
                .from(TableRef::table("t"))
                .filter(Expr::compare(
                    ComparisonOp::Greater,
                    Expr::column("k"),
                    Expr::exact("0"),
                )),
        ))
    }

    /// `SELECT * FROM users`
    pub fn select_all() -> Statement {
        Statement::Select(QueryExpr::select(
            Select::new().asterisk().from(TableRef::table("users")),
        ))
    }

    /// `SELECT u.name, o.total FROM users u INNER JOIN orders o ON u.id = o.user_id`
    pub fn inner_join() -> Statement {
        Statement::Select(QueryExpr::select(
            Select::new()
                .item(Expr::column("u.name"))
                .item(Expr::column("o.total"))
                .from(TableRef::join(
                    JoinKind::Inner,
                    TableRef::aliased("users", "u"),
                    TableRef::aliased("orders", "o"),
                    Some(Expr::compare(
                        ComparisonOp::Equal,
                        Expr::column("u.id"),
                        Expr::column("o.user_id"),
                    )),
                )),
        ))
    }

    /// `SELECT status, COUNT(*) FROM orders GROUP BY status`
    pub fn group_by() -> Statement {
        Statement::Select(QueryExpr::select(
            Select::new()
                .item(Expr::column("status"))
                .item_as(Expr::count_asterisk(), "count")
                .from(TableRef::table("orders"))
                .group_by(Expr::column("status")),
        ))
    }

    /// `SELECT a, SUM(b) FROM u GROUP BY a HAVING SUM(b) > 10 ORDER BY a LIMIT 5`
    pub fn group_by_having() -> Statement {
        let sum = || Expr::function("sum", vec![Expr::column("b")]);
        Statement::Select(QueryExpr::select(
            Select::new()
                .item(Expr::column("a"))
                .item_as(sum(), "total")
                .from(TableRef::table("u"))
                .group_by(Expr::column("a"))
                .having(Expr::compare(ComparisonOp::Greater, sum(), Expr::exact("10")))
                .order_by(SortKey::ascending(Expr::column("a")))
                .limit(Expr::exact("5")),
        ))
    }

    /// `SELECT k FROM t UNION ALL SELECT x FROM f`
    pub fn union_all() -> Statement {
        Statement::Select(QueryExpr::set_operation(
            SetOperator::Union,
            Some(SetQuantifier::All),
            QueryExpr::select(Select::new().item(Expr::column("k")).from(TableRef::table("t"))),
            QueryExpr::select(Select::new().item(Expr::column("x")).from(TableRef::table("f"))),
        ))
    }

    /// `SELECT k + 1 AS next FROM t ORDER BY next DESC`
    pub fn computed_order() -> Statement {
        Statement::Select(QueryExpr::select(
            Select::new()
                .item_as(
                    Expr::binary(BinaryOp::Add, Expr::column("k"), Expr::exact("1")),
                    "next",
                )
                .from(TableRef::table("t"))
                .order_by(SortKey::descending(Expr::column("next"))),
        ))
    }
}
