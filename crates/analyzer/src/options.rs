// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Analyzer Configuration
//!
//! Feature flags and numeric policy for one analysis.
//!
//! ## Example
//!
//! ```rust,ignore
//! use relsql_analyzer::AnalyzerOptions;
//!
//! let options = AnalyzerOptions {
//!     prefer_small_integer_literals: true,
//!     ..Default::default()
//! };
//! ```

use serde::{Deserialize, Serialize};

/// Analyzer options
///
/// Every field has a default, so partial JSON or YAML documents load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerOptions {
    /// Fold regular (unquoted) identifiers to lower case. Default: `true`
    pub lowercase_regular_identifiers: bool,

    /// Type integer literals with the narrowest of int1/int2/int4/int8.
    /// Default: `false` (int4, then int8)
    pub prefer_small_integer_literals: bool,

    /// Type decimal literals with their exact precision and scale.
    /// Default: `false` (flexible decimal)
    pub prefer_small_decimal_literals: bool,

    /// Type a NULL without context as `unknown` instead of failing.
    /// Default: `false`
    pub allow_context_independent_null: bool,

    /// Wrap literals in a raising cast when a context type differs.
    /// Default: `true`
    pub cast_literals_in_context: bool,

    /// Host parameter declarations are keyed with a leading `:`.
    /// Default: `false`
    pub host_parameter_declaration_starts_with_colon: bool,

    /// Precision of `DECIMAL` without arguments; `None` means flexible
    pub default_decimal_precision: Option<u32>,

    /// Scale of `DECIMAL(p)` without a scale; `None` means `0`
    pub default_decimal_scale: Option<u32>,

    /// Largest accepted decimal precision. Default: `38`
    pub max_decimal_precision: u32,

    /// Offset in minutes east of UTC for zone-less literals. Default: `0`
    pub system_zone_offset: i32,
}

impl Default for AnalyzerOptions {
    fn default() -> Self {
        Self {
            lowercase_regular_identifiers: true,
            prefer_small_integer_literals: false,
            prefer_small_decimal_literals: false,
            allow_context_independent_null: false,
            cast_literals_in_context: true,
            host_parameter_declaration_starts_with_colon: false,
            default_decimal_precision: None,
            default_decimal_scale: None,
            max_decimal_precision: 38,
            system_zone_offset: 0,
        }
    }
}

impl AnalyzerOptions {
    /// Parse options from a JSON document; missing fields take defaults
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}
