// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! # Scope management for semantic analysis
//!
//! Query scopes live in an arena and link to their parent by index, so a
//! nested query block resolves outer references by walking the chain
//! read-only. A scope is pushed when a query block starts and popped, with
//! everything pushed after it, when the block returns.

use indexmap::IndexMap;
use relsql_ir::Graph;
use relsql_ir::plan::PortRef;

use crate::relation::RelationInfo;

/// Index of a scope in the [`ScopeArena`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(usize);

impl ScopeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A precompiled WITH element
///
/// Each reference clones `graph` into its own subquery node; graphs are
/// never shared between references.
#[derive(Debug, Clone)]
pub struct CteInfo {
    pub graph: Graph,
    /// The dangling output of `graph`
    pub output: PortRef,
    /// Columns of `output`, named by the optional column list
    pub relation: RelationInfo,
}

/// The relations visible to one query block
#[derive(Debug, Clone, Default)]
pub struct QueryScope {
    pub parent: Option<ScopeId>,
    /// FROM-items in source order
    pub relations: Vec<RelationInfo>,
    /// WITH elements, keyed by normalized name
    pub ctes: IndexMap<String, CteInfo>,
}

impl QueryScope {
    /// Relations whose correlation name is `name`
    pub fn find_relations(&self, name: &str) -> Vec<&RelationInfo> {
        self.relations
            .iter()
            .filter(|r| r.correlation.as_deref() == Some(name))
            .collect()
    }
}

/// Arena of query scopes
#[derive(Debug, Default)]
pub struct ScopeArena {
    scopes: Vec<QueryScope>,
}

impl ScopeArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty scope
    pub fn push(&mut self, parent: Option<ScopeId>) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(QueryScope {
            parent,
            ..QueryScope::default()
        });
        id
    }

    /// Drop `id` and every scope created after it
    pub fn pop(&mut self, id: ScopeId) {
        self.scopes.truncate(id.0);
    }

    pub fn get(&self, id: ScopeId) -> &QueryScope {
        &self.scopes[id.0]
    }

    pub fn get_mut(&mut self, id: ScopeId) -> &mut QueryScope {
        &mut self.scopes[id.0]
    }

    /// `id` followed by its ancestors, innermost first
    pub fn chain(&self, id: ScopeId) -> Vec<ScopeId> {
        let mut chain = vec![id];
        let mut current = id;
        while let Some(parent) = self.get(current).parent {
            chain.push(parent);
            current = parent;
        }
        chain
    }

    /// The nearest WITH element named `name`
    pub fn find_cte(&self, id: ScopeId, name: &str) -> Option<&CteInfo> {
        self.chain(id)
            .into_iter()
            .find_map(|s| self.get(s).ctes.get(name))
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }
}
