// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # SQL Function Registry
//!
//! This crate provides the builtin scalar and aggregate functions the
//! analyzer resolves calls against.
//!
//! ## Features
//!
//! - Numeric, string and date/time scalar functions
//! - `count`, `sum`, `avg`, `min` and `max` with `DISTINCT` variants
//! - Installation into any [`relsql_catalog::MemorySchema`]
//!
//! ## Usage
//!
//! ```rust,ignore
//! use relsql_function_registry::FunctionRegistry;
//!
//! let registry = FunctionRegistry::new();
//! let mut schema = MemorySchema::new("public");
//! registry.install(&mut schema)?;
//! ```

pub mod builtin;
pub mod registry;

pub use registry::FunctionRegistry;
