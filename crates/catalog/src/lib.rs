// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # relsql - Catalog Layer
//!
//! This crate provides the schema abstraction the analyzer resolves names
//! against. It defines the [`Catalog`] and [`SchemaProvider`] traits, an
//! in-memory implementation and the [`SearchPath`].
//!
//! ## Architecture
//!
//! The catalog layer is responsible for:
//! - Providing declarations (tables, indexes, functions, variables)
//! - Ordering unqualified lookup through the search path
//! - Rejecting inconsistent registrations up front
//!
//! Lookups are synchronous and infallible: a missing symbol is `None` or an
//! empty overload list. Only registration returns [`CatalogResult`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! use relsql_catalog::{Catalog, MemoryCatalog, MemorySchema};
//!
//! fn table_exists(catalog: &dyn Catalog, schema: &str, table: &str) -> bool {
//!     catalog
//!         .find_schema(schema)
//!         .and_then(|s| s.find_table(table))
//!         .is_some()
//! }
//! ```

pub mod error;
pub mod memory;
pub mod metadata;
pub mod search_path;
pub mod r#trait;

// Re-exports
pub use error::{CatalogError, CatalogResult};
pub use memory::{MemoryCatalog, MemorySchema};
pub use metadata::{
    AggregateFunctionDecl, ColumnDecl, FunctionDecl, IndexDecl, SchemaDecl, TableDecl,
    VariableDecl,
};
pub use r#trait::{Catalog, SchemaProvider};
pub use search_path::SearchPath;
