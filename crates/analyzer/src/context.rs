// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Analyzer context for tracking state during one statement compilation

use std::sync::Arc;

use indexmap::IndexMap;
use relsql_ast::Span;
use relsql_catalog::{Catalog, SchemaProvider, SearchPath};
use relsql_ir::decl::VariableDecl;
use relsql_ir::{BindingFactory, Type, Value};
use tracing::debug;

use crate::error::{Diagnostic, DiagnosticCode, ErrorReported};
use crate::options::AnalyzerOptions;
use crate::relation::RelationInfo;
use crate::scope::{ScopeArena, ScopeId};

/// Context for one analysis
///
/// The context maintains:
/// - Options and the catalog, search path and default schema
/// - Host parameter declarations and placeholder values
/// - The append-only diagnostics log
/// - The descriptor factory and the scope arena
pub struct AnalyzerContext {
    options: AnalyzerOptions,

    catalog: Arc<dyn Catalog>,

    search_path: SearchPath,

    /// Schema receiving CREATE statements without a schema qualifier
    default_schema: Option<Arc<dyn SchemaProvider>>,

    /// Host parameter declarations by name, as declared
    host_parameters: IndexMap<String, Arc<VariableDecl>>,

    /// Literal values substituted for placeholders
    placeholders: IndexMap<String, (Value, Type)>,

    diagnostics: Vec<Diagnostic>,

    pub(crate) bindings: BindingFactory,

    pub(crate) scopes: ScopeArena,
}

impl AnalyzerContext {
    /// Create a context whose search path is every catalog schema, in order
    ///
    /// The first schema becomes the default schema.
    pub fn new(options: AnalyzerOptions, catalog: Arc<dyn Catalog>) -> Self {
        let schemas = catalog.schemas();
        let default_schema = schemas.first().cloned();
        Self {
            options,
            catalog,
            search_path: SearchPath::new(schemas),
            default_schema,
            host_parameters: IndexMap::new(),
            placeholders: IndexMap::new(),
            diagnostics: Vec::new(),
            bindings: BindingFactory::new(),
            scopes: ScopeArena::new(),
        }
    }

    /// Builder method: replace the search path
    pub fn with_search_path(mut self, search_path: SearchPath) -> Self {
        self.search_path = search_path;
        self
    }

    /// Builder method: replace the default schema
    pub fn with_default_schema(mut self, schema: Arc<dyn SchemaProvider>) -> Self {
        self.default_schema = Some(schema);
        self
    }

    /// Declare a host parameter
    pub fn add_host_parameter(&mut self, decl: VariableDecl) -> Arc<VariableDecl> {
        let decl = Arc::new(decl);
        self.host_parameters.insert(decl.name.clone(), decl.clone());
        decl
    }

    /// Bind a placeholder to a literal value
    pub fn add_placeholder(&mut self, name: impl Into<String>, value: Value, ty: Type) {
        self.placeholders.insert(name.into(), (value, ty));
    }

    pub fn options(&self) -> &AnalyzerOptions {
        &self.options
    }

    pub fn catalog(&self) -> &Arc<dyn Catalog> {
        &self.catalog
    }

    pub fn search_path(&self) -> &SearchPath {
        &self.search_path
    }

    pub fn default_schema(&self) -> Option<&Arc<dyn SchemaProvider>> {
        self.default_schema.as_ref()
    }

    /// Host parameter declared as `name`
    ///
    /// `name` is the reference without its leading colon; the colon is added
    /// back when declarations are keyed with it.
    pub fn find_host_parameter(&self, name: &str) -> Option<&Arc<VariableDecl>> {
        if self.options.host_parameter_declaration_starts_with_colon {
            self.host_parameters.get(&format!(":{name}"))
        } else {
            self.host_parameters.get(name)
        }
    }

    pub fn find_placeholder(&self, name: &str) -> Option<&(Value, Type)> {
        self.placeholders.get(name)
    }

    /// Record a diagnostic and return the marker proving it
    pub fn report(
        &mut self,
        code: DiagnosticCode,
        location: Option<Span>,
        message: impl Into<String>,
    ) -> ErrorReported {
        let diagnostic = Diagnostic::new(code, location, message);
        debug!(code = %diagnostic.code, message = %diagnostic.message, "diagnostic");
        self.diagnostics.push(diagnostic);
        ErrorReported
    }

    /// Get all recorded diagnostics
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Check if any diagnostics were recorded
    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    /// Take the recorded diagnostics, leaving the log empty
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    /// Descriptor factory shared by everything compiled with this context
    pub fn bindings_mut(&mut self) -> &mut BindingFactory {
        &mut self.bindings
    }

    /// Open a query scope exposing `relations`
    ///
    /// Used by embedders compiling expressions against relations they
    /// built themselves. Scopes must be popped in reverse order.
    pub fn push_scope(
        &mut self,
        parent: Option<ScopeId>,
        relations: Vec<RelationInfo>,
    ) -> ScopeId {
        let id = self.scopes.push(parent);
        self.scopes.get_mut(id).relations = relations;
        id
    }

    /// Close `scope` and every scope opened after it
    pub fn pop_scope(&mut self, scope: ScopeId) {
        self.scopes.pop(scope);
    }
}
