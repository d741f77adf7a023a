// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Builtin scalar function definitions

use relsql_ir::decl::FunctionDecl;
use relsql_ir::types::Type;

fn function(name: &str, parameters: Vec<Type>, result: Type) -> FunctionDecl {
    FunctionDecl::new(0, name, result).with_parameters(parameters)
}

/// Get all builtin scalar functions
pub fn all_functions() -> Vec<FunctionDecl> {
    let varchar = Type::FLEXIBLE_VARCHAR;
    let varbinary = Type::Octet {
        varying: true,
        length: None,
    };
    let decimal = Type::FLEXIBLE_DECIMAL;

    let mut functions = Vec::new();

    // Numeric functions
    for ty in [Type::Int4, Type::Int8, decimal.clone(), Type::Float8] {
        functions.push(function("abs", vec![ty.clone()], ty));
    }
    for ty in [Type::Int4, Type::Int8, decimal] {
        functions.push(function("mod", vec![ty.clone(), ty.clone()], ty));
    }

    // String functions
    functions.push(function("upper", vec![varchar.clone()], varchar.clone()));
    functions.push(function("lower", vec![varchar.clone()], varchar.clone()));
    for name in ["character_length", "char_length"] {
        functions.push(function(name, vec![varchar.clone()], Type::Int8));
    }
    functions.push(function("octet_length", vec![varchar.clone()], Type::Int8));
    functions.push(function("octet_length", vec![varbinary], Type::Int8));
    functions.push(function(
        "substring",
        vec![varchar.clone(), Type::Int8],
        varchar.clone(),
    ));
    functions.push(function(
        "substring",
        vec![varchar.clone(), Type::Int8, Type::Int8],
        varchar,
    ));

    // Date/time functions
    functions.push(function("current_date", vec![], Type::Date));
    functions.push(function(
        "localtime",
        vec![],
        Type::TimeOfDay {
            with_time_zone: false,
        },
    ));
    functions.push(function(
        "localtimestamp",
        vec![],
        Type::TimePoint {
            with_time_zone: false,
        },
    ));
    functions.push(function(
        "current_timestamp",
        vec![],
        Type::TimePoint {
            with_time_zone: true,
        },
    ));

    functions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_table_valued_builtins() {
        assert!(all_functions().iter().all(|f| !f.features.table_valued));
    }

    #[test]
    fn test_substring_arities() {
        let mut arities: Vec<usize> = all_functions()
            .iter()
            .filter(|f| f.name == "substring")
            .map(|f| f.parameter_types.len())
            .collect();
        arities.sort();
        assert_eq!(arities, vec![2, 3]);
    }
}
