// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Builtin aggregate function definitions

use relsql_ir::decl::{AggregateFunctionDecl, DISTINCT_SUFFIX};
use relsql_ir::types::Type;

fn time() -> Type {
    Type::TimeOfDay {
        with_time_zone: false,
    }
}

fn timestamp(with_time_zone: bool) -> Type {
    Type::TimePoint { with_time_zone }
}

/// Parameter types `min` and `max` are declared over
fn comparable_types() -> Vec<Type> {
    vec![
        Type::Int4,
        Type::Int8,
        Type::FLEXIBLE_DECIMAL,
        Type::Float4,
        Type::Float8,
        Type::FLEXIBLE_VARCHAR,
        Type::Date,
        time(),
        timestamp(false),
        timestamp(true),
    ]
}

fn unary(name: &str, parameter: Type, result: Type) -> AggregateFunctionDecl {
    AggregateFunctionDecl::new(0, name, result).with_parameters(vec![parameter])
}

/// The `ALL` variants, without `count(*)`
fn all_quantified() -> Vec<AggregateFunctionDecl> {
    let mut aggregates = Vec::new();

    for ty in comparable_types() {
        aggregates.push(unary("count", ty.clone(), Type::Int8));
        aggregates.push(unary("min", ty.clone(), ty.clone()));
        aggregates.push(unary("max", ty.clone(), ty));
    }
    aggregates.push(unary("count", Type::Boolean, Type::Int8));

    aggregates.push(unary("sum", Type::Int4, Type::Int8));
    aggregates.push(unary("sum", Type::Int8, Type::FLEXIBLE_DECIMAL));
    aggregates.push(unary("sum", Type::FLEXIBLE_DECIMAL, Type::FLEXIBLE_DECIMAL));
    aggregates.push(unary("sum", Type::Float8, Type::Float8));

    aggregates.push(unary("avg", Type::Int8, Type::FLEXIBLE_DECIMAL));
    aggregates.push(unary("avg", Type::FLEXIBLE_DECIMAL, Type::FLEXIBLE_DECIMAL));
    aggregates.push(unary("avg", Type::Float8, Type::Float8));

    aggregates
}

/// Get all builtin aggregate functions
///
/// Every quantified aggregate is declared twice: once under its own name for
/// `ALL`, once under `<name>$distinct` for `DISTINCT`.
pub fn all_aggregates() -> Vec<AggregateFunctionDecl> {
    let mut aggregates = vec![AggregateFunctionDecl::new(0, "count", Type::Int8).asterisk()];
    for decl in all_quantified() {
        let mut distinct = decl.clone();
        distinct.name = format!("{}{}", decl.name, DISTINCT_SUFFIX);
        aggregates.push(decl);
        aggregates.push(distinct);
    }
    aggregates
}
