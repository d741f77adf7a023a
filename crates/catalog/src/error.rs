// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Error types for Catalog operations
//!
//! This module defines the error types raised while registering
//! declarations into a catalog.

use serde::Serialize;
use thiserror::Error;

/// Result type alias for Catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Errors that can occur during Catalog operations
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize)]
pub enum CatalogError {
    /// A schema with the same name is already registered
    #[error("Schema '{0}' already exists")]
    DuplicateSchema(String),

    /// A table with the same name is already registered in the schema
    #[error("Table '{1}' already exists in schema '{0}'")]
    DuplicateTable(String, String),

    /// An index with the same name is already registered in the schema
    #[error("Index '{1}' already exists in schema '{0}'")]
    DuplicateIndex(String, String),

    /// A variable with the same name is already registered in the schema
    #[error("Variable '{1}' already exists in schema '{0}'")]
    DuplicateVariable(String, String),

    /// An overload with identical parameter types is already registered
    #[error("Function '{0}' already exists")]
    DuplicateFunction(String),

    /// Requested table was not found
    #[error("Table '{0}' not found in schema '{1}'")]
    TableNotFound(String, String),

    /// The table already has a primary index
    #[error("Table '{0}' already has a primary index")]
    DuplicatePrimaryIndex(String),

    /// An index key refers to a column position the table does not have
    #[error("Index '{0}' refers to missing column position {1}")]
    InvalidIndexKey(String, usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CatalogError::DuplicateTable("public".into(), "t".into());
        assert_eq!(err.to_string(), "Table 't' already exists in schema 'public'");

        let err = CatalogError::InvalidIndexKey("t_pk".into(), 7);
        assert!(err.to_string().contains("position 7"));
    }

    #[test]
    fn test_error_serialization() {
        let err = CatalogError::DuplicateSchema("s".into());
        let json = serde_json::to_string(&err).unwrap();
        assert_eq!(json, r#"{"DuplicateSchema":"s"}"#);
    }
}
