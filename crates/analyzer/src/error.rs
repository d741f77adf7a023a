// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! # Diagnostics for semantic analysis
//!
//! Analysis never stops at the first problem by unwinding a rich error.
//! Instead every failure site appends a [`Diagnostic`] to the context and
//! returns [`ErrorReported`], a marker proving that at least one diagnostic
//! was recorded. Callers propagate the marker with `?`.

use std::fmt;

use relsql_ast::Span;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for analysis operations
pub type AnalyzerResult<T> = Result<T, ErrorReported>;

/// Marker returned after a diagnostic has been logged
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("analysis failed; see diagnostics")]
pub struct ErrorReported;

/// Stable diagnostic codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticCode {
    // not found
    SymbolNotFound,
    VariableNotFound,
    ColumnNotFound,
    RelationNotFound,
    TableNotFound,
    IndexNotFound,
    SchemaNotFound,
    CatalogNotFound,
    FunctionNotFound,

    // ambiguity
    VariableAmbiguous,
    ColumnAmbiguous,
    RelationAmbiguous,
    FunctionAmbiguous,

    // already exists
    ColumnAlreadyExists,
    TableAlreadyExists,
    IndexAlreadyExists,
    ViewAlreadyExists,
    PrimaryIndexAlreadyExists,

    // type or shape
    InconsistentType,
    InconsistentColumns,
    InvalidTypeLength,
    InvalidNumericPrecision,
    InvalidNumericScale,

    // value range
    UnsupportedDecimalValue,
    UnsupportedApproximateNumberValue,
    UnsupportedStringValue,

    // feature gaps
    UnsupportedFeature,
    FlexibleLengthIsNotSupported,

    MalformedSyntax,

    // context
    MissingContextOfNull,
    MissingContextOfDefaultValue,

    InvalidAggregationColumn,
}

impl DiagnosticCode {
    /// The stable snake_case name
    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticCode::SymbolNotFound => "symbol_not_found",
            DiagnosticCode::VariableNotFound => "variable_not_found",
            DiagnosticCode::ColumnNotFound => "column_not_found",
            DiagnosticCode::RelationNotFound => "relation_not_found",
            DiagnosticCode::TableNotFound => "table_not_found",
            DiagnosticCode::IndexNotFound => "index_not_found",
            DiagnosticCode::SchemaNotFound => "schema_not_found",
            DiagnosticCode::CatalogNotFound => "catalog_not_found",
            DiagnosticCode::FunctionNotFound => "function_not_found",
            DiagnosticCode::VariableAmbiguous => "variable_ambiguous",
            DiagnosticCode::ColumnAmbiguous => "column_ambiguous",
            DiagnosticCode::RelationAmbiguous => "relation_ambiguous",
            DiagnosticCode::FunctionAmbiguous => "function_ambiguous",
            DiagnosticCode::ColumnAlreadyExists => "column_already_exists",
            DiagnosticCode::TableAlreadyExists => "table_already_exists",
            DiagnosticCode::IndexAlreadyExists => "index_already_exists",
            DiagnosticCode::ViewAlreadyExists => "view_already_exists",
            DiagnosticCode::PrimaryIndexAlreadyExists => "primary_index_already_exists",
            DiagnosticCode::InconsistentType => "inconsistent_type",
            DiagnosticCode::InconsistentColumns => "inconsistent_columns",
            DiagnosticCode::InvalidTypeLength => "invalid_type_length",
            DiagnosticCode::InvalidNumericPrecision => "invalid_numeric_precision",
            DiagnosticCode::InvalidNumericScale => "invalid_numeric_scale",
            DiagnosticCode::UnsupportedDecimalValue => "unsupported_decimal_value",
            DiagnosticCode::UnsupportedApproximateNumberValue => {
                "unsupported_approximate_number_value"
            }
            DiagnosticCode::UnsupportedStringValue => "unsupported_string_value",
            DiagnosticCode::UnsupportedFeature => "unsupported_feature",
            DiagnosticCode::FlexibleLengthIsNotSupported => "flexible_length_is_not_supported",
            DiagnosticCode::MalformedSyntax => "malformed_syntax",
            DiagnosticCode::MissingContextOfNull => "missing_context_of_null",
            DiagnosticCode::MissingContextOfDefaultValue => "missing_context_of_default_value",
            DiagnosticCode::InvalidAggregationColumn => "invalid_aggregation_column",
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recorded analysis problem
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    /// Source region, when the offending node carries one
    pub location: Option<Span>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(code: DiagnosticCode, location: Option<Span>, message: impl Into<String>) -> Self {
        Self {
            code,
            location,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_display_matches_serde() {
        for code in [
            DiagnosticCode::ColumnNotFound,
            DiagnosticCode::UnsupportedApproximateNumberValue,
            DiagnosticCode::MissingContextOfDefaultValue,
            DiagnosticCode::PrimaryIndexAlreadyExists,
        ] {
            let json = serde_json::to_string(&code).unwrap();
            assert_eq!(json, format!("\"{}\"", code));
        }
    }

    #[test]
    fn test_diagnostic_display() {
        let diagnostic = Diagnostic::new(
            DiagnosticCode::ColumnAmbiguous,
            Some(Span::new(7, 8)),
            "column 'k' is ambiguous",
        );
        assert_eq!(
            diagnostic.to_string(),
            "column_ambiguous: column 'k' is ambiguous"
        );
    }

    #[test]
    fn test_diagnostic_serialization() {
        let diagnostic = Diagnostic::new(DiagnosticCode::MalformedSyntax, None, "empty IN list");
        let json = serde_json::to_value(&diagnostic).unwrap();
        assert_eq!(json["code"], "malformed_syntax");
        assert!(json["location"].is_null());
    }
}
