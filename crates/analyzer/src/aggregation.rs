// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! # Aggregation processor
//!
//! One processor serves one SELECT block. It is inactive until a GROUP BY
//! key is registered or an aggregate call is seen. Once active, every
//! expression of the select list, HAVING and ORDER BY goes through
//! [`AggregationProcessor::process`], which:
//!
//! - replaces each aggregate call with a reference to a fresh output column
//!   of the `aggregate` operator (identical calls share one column)
//! - rejects references to columns of the block's own FROM clause that are
//!   neither group keys nor inside an aggregate call
//!
//! References to outer queries and `let` temporaries are constants for the
//! group and always allowed.
//!
//! [`AggregationProcessor::install`] then emits the operator:
//!
//! ```text
//! input ─▶ [project: non-trivial arguments] ─▶ aggregate(keys; f(args) AS dest, ...)
//! ```

use indexmap::IndexSet;
use relsql_ast::Span;
use relsql_ir::descriptor::AggregateFunction;
use relsql_ir::plan::{Aggregate, AggregateColumn, Project, ProjectColumn};
use relsql_ir::{Graph, Operator, Output, Scalar, Variable};
use tracing::debug;

use crate::context::AnalyzerContext;
use crate::error::{AnalyzerResult, DiagnosticCode};

/// One distinct aggregate call
#[derive(Debug, Clone)]
struct AggregateEntry {
    function: AggregateFunction,
    arguments: Vec<Scalar>,
    destination: Variable,
}

/// Rewrites aggregate calls for one SELECT block
#[derive(Debug)]
pub struct AggregationProcessor {
    /// Columns produced by the block's FROM clause
    local: IndexSet<Variable>,
    group_keys: IndexSet<Variable>,
    entries: Vec<AggregateEntry>,
    active: bool,
}

impl AggregationProcessor {
    pub fn new(local: impl IntoIterator<Item = Variable>) -> Self {
        Self {
            local: local.into_iter().collect(),
            group_keys: IndexSet::new(),
            entries: Vec::new(),
            active: false,
        }
    }

    /// Register a GROUP BY key; duplicates are ignored
    pub fn add_group_key(&mut self, key: Variable) {
        self.group_keys.insert(key);
        self.active = true;
    }

    /// Mark the block as aggregating because an aggregate call was seen
    pub fn activate(&mut self) {
        self.active = true;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn group_keys(&self) -> impl Iterator<Item = &Variable> {
        self.group_keys.iter()
    }

    pub fn is_group_key(&self, variable: &Variable) -> bool {
        self.group_keys.contains(variable)
    }

    /// Columns the `aggregate` operator will produce so far
    pub fn output_variables(&self) -> Vec<Variable> {
        self.group_keys
            .iter()
            .cloned()
            .chain(self.entries.iter().map(|e| e.destination.clone()))
            .collect()
    }

    /// Rewrite `expr` in place into a function of group keys and aggregates
    pub fn process(
        &mut self,
        context: &mut AnalyzerContext,
        expr: &mut Scalar,
        location: Option<Span>,
    ) -> AnalyzerResult<()> {
        match expr {
            Scalar::AggregateCall {
                function,
                arguments,
            } => {
                if arguments.iter().any(Scalar::contains_aggregate) {
                    return Err(context.report(
                        DiagnosticCode::UnsupportedFeature,
                        location,
                        format!("nested aggregate in '{}'", function.declaration().name),
                    ));
                }
                let destination = self.register(context, function, arguments);
                *expr = Scalar::variable(destination);
                Ok(())
            }
            Scalar::VariableRef(variable) => {
                if self.local.contains(variable) && !self.group_keys.contains(variable) {
                    let name = variable.label().unwrap_or("?").to_string();
                    return Err(context.report(
                        DiagnosticCode::InvalidAggregationColumn,
                        location,
                        format!(
                            "column '{name}' must appear in GROUP BY \
                             or be used in an aggregate function"
                        ),
                    ));
                }
                Ok(())
            }
            _ => {
                for child in expr.children_mut() {
                    self.process(context, child, location)?;
                }
                Ok(())
            }
        }
    }

    fn register(
        &mut self,
        context: &mut AnalyzerContext,
        function: &AggregateFunction,
        arguments: &[Scalar],
    ) -> Variable {
        if let Some(entry) = self
            .entries
            .iter()
            .find(|e| &e.function == function && e.arguments == arguments)
        {
            return entry.destination.clone();
        }
        let destination = context
            .bindings
            .stream_variable(Some(function.declaration().name.as_str()));
        self.entries.push(AggregateEntry {
            function: function.clone(),
            arguments: arguments.to_vec(),
            destination: destination.clone(),
        });
        destination
    }

    /// Emit the `aggregate` operator, preceded by a `project` evaluating
    /// non-trivial arguments, downstream of `input`
    pub fn install(
        self,
        context: &mut AnalyzerContext,
        graph: &mut Graph,
        input: Output,
    ) -> Output {
        let mut arguments_project = Vec::new();
        let mut columns = Vec::with_capacity(self.entries.len());
        for entry in self.entries {
            let mut arguments = Vec::with_capacity(entry.arguments.len());
            for argument in entry.arguments {
                match argument {
                    Scalar::VariableRef(variable) => arguments.push(variable),
                    value => {
                        let variable = context.bindings.stream_variable(None);
                        arguments_project.push(ProjectColumn {
                            variable: variable.clone(),
                            value,
                        });
                        arguments.push(variable);
                    }
                }
            }
            columns.push(AggregateColumn {
                function: entry.function,
                arguments,
                destination: entry.destination,
            });
        }

        let input = if arguments_project.is_empty() {
            input
        } else {
            debug!(columns = arguments_project.len(), "emit project for aggregate arguments");
            graph.add_unary(
                input,
                Operator::Project(Project {
                    columns: arguments_project,
                }),
            )
        };
        debug!(
            group_keys = self.group_keys.len(),
            aggregates = columns.len(),
            "emit aggregate"
        );
        graph.add_unary(
            input,
            Operator::Aggregate(Aggregate {
                group_keys: self.group_keys.into_iter().collect(),
                columns,
            }),
        )
    }
}
