// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Testing utilities for relsql
//!
//! This crate provides common testing components including:
//! - Mock catalogs built from YAML schema fixtures
//! - Sample statements as syntax trees
//! - Graph and scalar assertions
//! - Tracing setup for tests

pub mod assertions;
pub mod fixtures;
pub mod mock_catalog;

use std::sync::Once;

use tracing_subscriber::EnvFilter;

// Re-exports for convenience
pub use assertions::{GraphAssertions, count_kind, count_let_declarators, find_operator};
pub use fixtures::{FixtureError, STANDARD_SCHEMA, SchemaFixture, SqlFixtures, parse_type};
pub use mock_catalog::{MockCatalogBuilder, SERIES_FUNCTION_ID, build_schema};

static TRACING: Once = Once::new();

/// Install a test-friendly tracing subscriber once per process
///
/// Filtered by `RUST_LOG`, silent by default.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("off"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}
