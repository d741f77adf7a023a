// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

use relsql_catalog::{CatalogResult, MemorySchema};
use relsql_ir::decl::{AggregateFunctionDecl, FunctionDecl};
use tracing::debug;

use crate::builtin;

/// Function registry for builtin SQL functions
///
/// This struct owns the builtin scalar and aggregate declarations, each with
/// a unique id, and installs them into a schema.
#[derive(Debug, Clone)]
pub struct FunctionRegistry {
    functions: Vec<FunctionDecl>,
    aggregate_functions: Vec<AggregateFunctionDecl>,
}

impl FunctionRegistry {
    /// Create a new function registry with all builtin functions loaded
    ///
    /// Ids are assigned sequentially from `1`, scalar functions first.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// use relsql_function_registry::FunctionRegistry;
    ///
    /// let registry = FunctionRegistry::new();
    /// assert!(registry.has_function("upper"));
    /// ```
    pub fn new() -> Self {
        let mut next_id = 1;
        let mut assign = || {
            let id = next_id;
            next_id += 1;
            id
        };

        let functions = builtin::scalar::all_functions()
            .into_iter()
            .map(|mut f| {
                f.id = assign();
                f
            })
            .collect();
        let aggregate_functions = builtin::aggregate::all_aggregates()
            .into_iter()
            .map(|mut f| {
                f.id = assign();
                f
            })
            .collect();

        Self {
            functions,
            aggregate_functions,
        }
    }

    pub fn functions(&self) -> &[FunctionDecl] {
        &self.functions
    }

    pub fn aggregate_functions(&self) -> &[AggregateFunctionDecl] {
        &self.aggregate_functions
    }

    /// Every scalar overload named `name`
    ///
    /// # Arguments
    ///
    /// * `name` - The function name to lookup (exact match, lower case)
    pub fn get_functions(&self, name: &str) -> Vec<&FunctionDecl> {
        self.functions.iter().filter(|f| f.name == name).collect()
    }

    /// Every aggregate overload named `name`
    pub fn get_aggregate_functions(&self, name: &str) -> Vec<&AggregateFunctionDecl> {
        self.aggregate_functions
            .iter()
            .filter(|f| f.name == name)
            .collect()
    }

    /// Check if a scalar or aggregate function exists
    pub fn has_function(&self, name: &str) -> bool {
        !self.get_functions(name).is_empty() || !self.get_aggregate_functions(name).is_empty()
    }

    /// Register every builtin into `schema`
    ///
    /// Fails if the schema already holds an overload with the same signature.
    pub fn install(&self, schema: &mut MemorySchema) -> CatalogResult<()> {
        for function in &self.functions {
            schema.add_function(function.clone())?;
        }
        for aggregate in &self.aggregate_functions {
            schema.add_aggregate_function(aggregate.clone())?;
        }
        debug!(
            schema = %schema.name(),
            functions = self.functions.len(),
            aggregates = self.aggregate_functions.len(),
            "installed builtin functions"
        );
        Ok(())
    }

    /// Install the builtins into a fresh schema named `name`
    pub fn builtin_schema(&self, name: &str) -> CatalogResult<MemorySchema> {
        let mut schema = MemorySchema::new(name);
        self.install(&mut schema)?;
        Ok(schema)
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
