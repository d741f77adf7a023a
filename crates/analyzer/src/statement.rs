// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! # Statement compiler
//!
//! Lowers top-level statements:
//!
//! | Statement | Result |
//! |---|---|
//! | `SELECT` | plan: query operators → `emit` |
//! | `INSERT` | plan: `values` or query [→ `project`] → `write(insert)` |
//! | `UPDATE` | plan: `scan` [→ `filter`] → `project` → `write(update)` |
//! | `DELETE` | plan: `scan` [→ `filter`] → `write(delete)` |
//! | `CREATE TABLE` / `CREATE INDEX` | statement with the new declarations |
//! | `DROP TABLE` / `DROP INDEX` | statement naming the dropped relation |
//!
//! Writes target the table's primary index when it has one, and are keyed
//! by the primary index's key columns.

use std::collections::HashSet;
use std::sync::Arc;

use relsql_ast::{
    Assignment, CreateIndex, CreateTable, Delete, Expr, Identifier, Insert, InsertSource, Name,
    QueryExpr, SortDirection, Span, Statement as AstStatement, TableRef, Update,
};
use relsql_catalog::SchemaProvider;
use relsql_ir::decl::{ColumnDecl, IndexDecl, IndexKeyDecl, SortOrder, TableColumnRef, TableDecl};
use relsql_ir::plan::{
    Emit, EmitColumn, Filter, Project, ProjectColumn, Values, Write, WriteColumn, WriteKind,
};
use relsql_ir::scalar::LossPolicy;
use relsql_ir::{
    ExecutionPlan, Graph, Operator, Output, PlanKind, Relation, Scalar, Statement, Type, Value,
    Variable,
};
use tracing::debug;

use crate::context::AnalyzerContext;
use crate::error::{AnalyzerResult, Diagnostic, DiagnosticCode};
use crate::expression::compile_scalar;
use crate::literal::TypeContext;
use crate::name::{
    find_index, find_table, normalize, object_name, resolve_schema, resolve_table,
};
use crate::query::table_ref::compile_table_ref;
use crate::query::{compile_query, scoped};
use crate::relation::RelationInfo;
use crate::scope::ScopeId;
use crate::type_resolver::resolve_type;
use crate::typing::is_assignable;

/// Outcome of analyzing one statement
#[derive(Debug)]
pub enum StatementResult {
    /// A DDL statement
    Statement(Statement),
    /// A DML statement's operator graph
    ExecutionPlan(ExecutionPlan),
    /// Analysis failed; the diagnostics drained from the context
    Erroneous(Vec<Diagnostic>),
}

impl StatementResult {
    pub fn is_erroneous(&self) -> bool {
        matches!(self, StatementResult::Erroneous(_))
    }
}

/// A successfully compiled statement
#[derive(Debug)]
pub enum CompiledStatement {
    Statement(Statement),
    ExecutionPlan(ExecutionPlan),
}

impl From<CompiledStatement> for StatementResult {
    fn from(compiled: CompiledStatement) -> Self {
        match compiled {
            CompiledStatement::Statement(statement) => StatementResult::Statement(statement),
            CompiledStatement::ExecutionPlan(plan) => StatementResult::ExecutionPlan(plan),
        }
    }
}

pub fn compile_statement(
    context: &mut AnalyzerContext,
    statement: &AstStatement,
) -> AnalyzerResult<CompiledStatement> {
    let compiled = match statement {
        AstStatement::Select(query) => {
            CompiledStatement::ExecutionPlan(compile_select(context, query)?)
        }
        AstStatement::Insert(insert) => {
            CompiledStatement::ExecutionPlan(compile_insert(context, insert)?)
        }
        AstStatement::Update(update) => {
            CompiledStatement::ExecutionPlan(compile_update(context, update)?)
        }
        AstStatement::Delete(delete) => {
            CompiledStatement::ExecutionPlan(compile_delete(context, delete)?)
        }
        AstStatement::CreateTable(create) => {
            CompiledStatement::Statement(compile_create_table(context, create)?)
        }
        AstStatement::DropTable { name, if_exists } => {
            CompiledStatement::Statement(compile_drop_table(context, name, *if_exists)?)
        }
        AstStatement::CreateIndex(create) => {
            CompiledStatement::Statement(compile_create_index(context, create)?)
        }
        AstStatement::DropIndex { name, if_exists } => {
            CompiledStatement::Statement(compile_drop_index(context, name, *if_exists)?)
        }
    };
    Ok(compiled)
}

fn compile_select(
    context: &mut AnalyzerContext,
    query: &QueryExpr,
) -> AnalyzerResult<ExecutionPlan> {
    let mut graph = Graph::new();
    let compiled = compile_query(context, &mut graph, query, None)?;
    let columns: Vec<EmitColumn> = compiled
        .relation
        .exported_columns()
        .map(|c| EmitColumn {
            source: c.variable.clone(),
            name: c.identifier.clone(),
        })
        .collect();
    debug!(columns = columns.len(), "emit query results");
    let terminal = graph.add_sink(compiled.output, Operator::Emit(Emit { columns }));
    Ok(ExecutionPlan {
        kind: PlanKind::Query,
        graph,
        terminal,
    })
}

/// The relation a write targets: the primary index, else the table
fn write_target(
    context: &AnalyzerContext,
    schema: &Arc<dyn SchemaProvider>,
    table: &Arc<TableDecl>,
) -> (Relation, Option<Arc<IndexDecl>>) {
    match schema.find_primary_index(table) {
        Some(index) => (context.bindings.index(Arc::clone(&index)), Some(index)),
        None => (context.bindings.table(Arc::clone(table)), None),
    }
}

fn table_column(
    context: &mut AnalyzerContext,
    table: &Arc<TableDecl>,
    position: usize,
) -> Option<Variable> {
    TableColumnRef::new(Arc::clone(table), position).map(|c| context.bindings.table_column(c))
}

/// Resolve a column of `table` that statements may name
fn resolve_column(
    context: &mut AnalyzerContext,
    table: &TableDecl,
    identifier: &Identifier,
) -> AnalyzerResult<usize> {
    let name = normalize(context, identifier);
    match table.column(&name) {
        Some((position, decl)) if decl.is_exported() => Ok(position),
        _ => Err(context.report(
            DiagnosticCode::ColumnNotFound,
            Some(identifier.span),
            format!("column '{name}' is not found in '{}'", table.name),
        )),
    }
}

/// Resolve a list of distinct columns of `table`
fn resolve_column_list(
    context: &mut AnalyzerContext,
    table: &TableDecl,
    identifiers: &[&Identifier],
) -> AnalyzerResult<Vec<usize>> {
    let mut positions = Vec::with_capacity(identifiers.len());
    let mut seen = HashSet::new();
    for identifier in identifiers {
        let position = resolve_column(context, table, identifier)?;
        if !seen.insert(position) {
            return Err(context.report(
                DiagnosticCode::ColumnAlreadyExists,
                Some(identifier.span),
                format!(
                    "column '{}' is specified more than once",
                    table.columns[position].name
                ),
            ));
        }
        positions.push(position);
    }
    Ok(positions)
}

/// The literal context for a value written into `column`
fn column_context(column: &ColumnDecl) -> TypeContext {
    TypeContext::new(column.ty.clone())
        .with_default(column.default_value.clone().unwrap_or(Value::Null))
}

/// A column's declared default as an immediate
fn default_value(column: &ColumnDecl) -> Scalar {
    Scalar::immediate(
        column.default_value.clone().unwrap_or(Value::Null),
        column.ty.clone(),
    )
}

/// Check a value of type `from` can be written into `column`, casting it
fn assign(
    context: &mut AnalyzerContext,
    value: Scalar,
    from: &Type,
    column: &ColumnDecl,
    location: Option<Span>,
) -> AnalyzerResult<Scalar> {
    if !is_assignable(from, &column.ty) {
        return Err(context.report(
            DiagnosticCode::InconsistentType,
            location,
            format!(
                "cannot assign {from} to column '{}' of type {}",
                column.name, column.ty
            ),
        ));
    }
    if *from == column.ty || *from == Type::Unknown {
        return Ok(value);
    }
    Ok(Scalar::Cast {
        operand: Box::new(value),
        target: column.ty.clone(),
        loss_policy: LossPolicy::Error,
    })
}

fn compile_insert(context: &mut AnalyzerContext, insert: &Insert) -> AnalyzerResult<ExecutionPlan> {
    let (schema, table) = resolve_table(context, &insert.table)?;
    let (destination, _) = write_target(context, &schema, &table);
    debug!(table = %table.name, "compile insert");

    let targets = if insert.columns.is_empty() {
        table
            .columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_exported())
            .map(|(i, _)| i)
            .collect()
    } else {
        let identifiers: Vec<&Identifier> = insert.columns.iter().collect();
        resolve_column_list(context, &table, &identifiers)?
    };
    // every exported column is written; those not targeted get their default
    let written: Vec<usize> = table
        .columns
        .iter()
        .enumerate()
        .filter(|(_, c)| c.is_exported())
        .map(|(i, _)| i)
        .collect();

    let mut graph = Graph::new();
    let (output, sources) = match &insert.source {
        InsertSource::Values(rows) => {
            insert_values(context, &mut graph, &table, &targets, &written, rows)?
        }
        InsertSource::DefaultValues => {
            insert_values(context, &mut graph, &table, &[], &written, &[Vec::new()])?
        }
        InsertSource::Query(query) => {
            insert_query(context, &mut graph, &table, &targets, &written, query)?
        }
    };

    let mut columns = Vec::with_capacity(written.len());
    for (position, source) in written.into_iter().zip(sources) {
        if let Some(destination) = table_column(context, &table, position) {
            columns.push(WriteColumn {
                source,
                destination,
            });
        }
    }
    debug!(columns = columns.len(), "emit write(insert)");
    let terminal = graph.add_sink(
        output,
        Operator::Write(Write {
            kind: WriteKind::Insert,
            destination,
            keys: Vec::new(),
            columns,
        }),
    );
    Ok(ExecutionPlan {
        kind: PlanKind::Insert,
        graph,
        terminal,
    })
}

/// Rows of literal cells; returns one stream variable per written column
fn insert_values(
    context: &mut AnalyzerContext,
    graph: &mut Graph,
    table: &TableDecl,
    targets: &[usize],
    written: &[usize],
    rows: &[Vec<Expr>],
) -> AnalyzerResult<(Output, Vec<Variable>)> {
    let rows = scoped(context, None, |context, scope| {
        let mut compiled_rows = Vec::with_capacity(rows.len());
        for (index, row) in rows.iter().enumerate() {
            if row.len() != targets.len() {
                return Err(context.report(
                    DiagnosticCode::InconsistentColumns,
                    row.first().and_then(Expr::span),
                    format!(
                        "row {} has {} values for {} columns",
                        index + 1,
                        row.len(),
                        targets.len()
                    ),
                ));
            }
            let mut cells = Vec::with_capacity(written.len());
            for &position in written {
                let column = &table.columns[position];
                let cell = match targets.iter().position(|t| *t == position) {
                    Some(slot) => compile_cell(context, &row[slot], column, scope)?,
                    None => default_value(column),
                };
                cells.push(cell);
            }
            compiled_rows.push(cells);
        }
        Ok(compiled_rows)
    })?;

    let columns: Vec<Variable> = written
        .iter()
        .map(|p| {
            context
                .bindings
                .stream_variable(Some(table.columns[*p].name.as_str()))
        })
        .collect();
    debug!(rows = rows.len(), "emit values for insert");
    let output = graph.add_source(Operator::Values(Values {
        columns: columns.clone(),
        rows,
    }));
    Ok((output, columns))
}

fn compile_cell(
    context: &mut AnalyzerContext,
    cell: &Expr,
    column: &ColumnDecl,
    scope: ScopeId,
) -> AnalyzerResult<Scalar> {
    let target = column_context(column);
    let result = compile_scalar(context, cell, scope, Some(&target))?;
    if result.saw_aggregate {
        return Err(context.report(
            DiagnosticCode::UnsupportedFeature,
            cell.span(),
            "aggregate functions are not allowed in VALUES",
        ));
    }
    assign(context, result.expr, &result.ty, column, cell.span())
}

/// `INSERT ... SELECT`; returns one stream variable per written column
fn insert_query(
    context: &mut AnalyzerContext,
    graph: &mut Graph,
    table: &TableDecl,
    targets: &[usize],
    written: &[usize],
    query: &QueryExpr,
) -> AnalyzerResult<(Output, Vec<Variable>)> {
    let compiled = compile_query(context, graph, query, None)?;
    let source_columns: Vec<_> = compiled.relation.exported_columns().cloned().collect();
    if source_columns.len() != targets.len() {
        return Err(context.report(
            DiagnosticCode::InconsistentColumns,
            None,
            format!(
                "query has {} columns for {} target columns",
                source_columns.len(),
                targets.len()
            ),
        ));
    }

    let mut project = Vec::new();
    let mut sources = Vec::with_capacity(written.len());
    for &position in written {
        let column = &table.columns[position];
        let value = match targets.iter().position(|t| *t == position) {
            Some(slot) => {
                let source = &source_columns[slot];
                let value = Scalar::variable(source.variable.clone());
                match assign(context, value, &source.ty, column, None)? {
                    Scalar::VariableRef(variable) => {
                        sources.push(variable);
                        continue;
                    }
                    value => value,
                }
            }
            None => default_value(column),
        };
        let variable = context.bindings.stream_variable(Some(column.name.as_str()));
        project.push(ProjectColumn {
            variable: variable.clone(),
            value,
        });
        sources.push(variable);
    }

    let output = if project.is_empty() {
        compiled.output
    } else {
        debug!(columns = project.len(), "emit project for insert");
        graph.add_unary(compiled.output, Operator::Project(Project { columns: project }))
    };
    Ok((output, sources))
}

/// Scan `name` for UPDATE or DELETE, filtered by `where_clause`
///
/// Returns the frontier and the scanned relation.
fn scan_for_write(
    context: &mut AnalyzerContext,
    graph: &mut Graph,
    name: &Name,
    where_clause: Option<&Expr>,
    scope: ScopeId,
) -> AnalyzerResult<(Output, RelationInfo)> {
    let table_ref = TableRef::Table {
        name: name.clone(),
        correlation: None,
    };
    let compiled = compile_table_ref(context, graph, &table_ref, None)?;
    let mut output = compiled.output;
    let relation = compiled.relations.into_iter().next().unwrap_or_default();
    context.scopes.get_mut(scope).relations.push(relation.clone());

    if let Some(condition) = where_clause {
        let result = compile_scalar(context, condition, scope, None)?;
        if result.saw_aggregate {
            return Err(context.report(
                DiagnosticCode::UnsupportedFeature,
                condition.span(),
                "aggregate functions are not allowed in WHERE",
            ));
        }
        if !result.ty.is_boolean_like() {
            return Err(context.report(
                DiagnosticCode::InconsistentType,
                condition.span(),
                format!("WHERE condition must be boolean, found {}", result.ty),
            ));
        }
        debug!("emit filter");
        output = graph.add_unary(
            output,
            Operator::Filter(Filter {
                condition: result.expr,
            }),
        );
    }
    Ok((output, relation))
}

/// The scanned variable carrying column `position` of the table
fn scanned(relation: &RelationInfo, position: usize) -> Option<Variable> {
    relation
        .columns
        .iter()
        .find(|c| c.source.as_ref().is_some_and(|s| s.position() == position))
        .map(|c| c.variable.clone())
}

/// Primary index key columns, paired with their scanned variables
fn write_keys(
    context: &mut AnalyzerContext,
    table: &Arc<TableDecl>,
    primary: Option<&Arc<IndexDecl>>,
    relation: &RelationInfo,
) -> Vec<WriteColumn> {
    let Some(primary) = primary else {
        return Vec::new();
    };
    primary
        .keys
        .iter()
        .filter_map(|key| {
            let source = scanned(relation, key.position)?;
            let destination = table_column(context, table, key.position)?;
            Some(WriteColumn {
                source,
                destination,
            })
        })
        .collect()
}

fn compile_update(context: &mut AnalyzerContext, update: &Update) -> AnalyzerResult<ExecutionPlan> {
    let (schema, table) = resolve_table(context, &update.table)?;
    let (destination, primary) = write_target(context, &schema, &table);
    debug!(table = %table.name, "compile update");

    let identifiers: Vec<&Identifier> = update.assignments.iter().map(|a| &a.column).collect();
    let positions = resolve_column_list(context, &table, &identifiers)?;

    let mut graph = Graph::new();
    let (output, relation, project, columns) = scoped(context, None, |context, scope| {
        let (output, relation) = scan_for_write(
            context,
            &mut graph,
            &update.table,
            update.where_clause.as_ref(),
            scope,
        )?;
        let mut project = Vec::with_capacity(positions.len());
        let mut columns = Vec::with_capacity(positions.len());
        for (Assignment { value, .. }, &position) in update.assignments.iter().zip(&positions) {
            let column = &table.columns[position];
            let value = compile_cell(context, value, column, scope)?;
            let variable = context.bindings.stream_variable(Some(column.name.as_str()));
            project.push(ProjectColumn {
                variable: variable.clone(),
                value,
            });
            if let Some(destination) = table_column(context, &table, position) {
                columns.push(WriteColumn {
                    source: variable,
                    destination,
                });
            }
        }
        Ok((output, relation, project, columns))
    })?;

    debug!(columns = project.len(), "emit project for update");
    let output = graph.add_unary(output, Operator::Project(Project { columns: project }));
    let keys = write_keys(context, &table, primary.as_ref(), &relation);
    debug!(keys = keys.len(), columns = columns.len(), "emit write(update)");
    let terminal = graph.add_sink(
        output,
        Operator::Write(Write {
            kind: WriteKind::Update,
            destination,
            keys,
            columns,
        }),
    );
    Ok(ExecutionPlan {
        kind: PlanKind::Update,
        graph,
        terminal,
    })
}

fn compile_delete(context: &mut AnalyzerContext, delete: &Delete) -> AnalyzerResult<ExecutionPlan> {
    let (schema, table) = resolve_table(context, &delete.table)?;
    let (destination, primary) = write_target(context, &schema, &table);
    debug!(table = %table.name, "compile delete");

    let mut graph = Graph::new();
    let (output, relation) = scoped(context, None, |context, scope| {
        scan_for_write(
            context,
            &mut graph,
            &delete.table,
            delete.where_clause.as_ref(),
            scope,
        )
    })?;
    let keys = write_keys(context, &table, primary.as_ref(), &relation);
    debug!(keys = keys.len(), "emit write(delete)");
    let terminal = graph.add_sink(
        output,
        Operator::Write(Write {
            kind: WriteKind::Delete,
            destination,
            keys,
            columns: Vec::new(),
        }),
    );
    Ok(ExecutionPlan {
        kind: PlanKind::Delete,
        graph,
        terminal,
    })
}

/// The schema a CREATE statement targets
fn target_schema(
    context: &mut AnalyzerContext,
    name: &Name,
) -> AnalyzerResult<Arc<dyn SchemaProvider>> {
    if let Some(schema) = resolve_schema(context, name.qualifier(), Some(name.span()))? {
        return Ok(schema);
    }
    match context.default_schema() {
        Some(schema) => Ok(Arc::clone(schema)),
        None => Err(context.report(
            DiagnosticCode::SchemaNotFound,
            Some(name.span()),
            "no default schema to create in",
        )),
    }
}

/// The value of a constant expression, looking through a cast
fn constant(expr: &Scalar) -> Option<(&Value, &Type)> {
    match expr {
        Scalar::Immediate { value, ty } => Some((value, ty)),
        Scalar::Cast { operand, .. } => constant(operand),
        _ => None,
    }
}

/// A column's DEFAULT clause, which must be a literal of a compatible type
fn column_default(
    context: &mut AnalyzerContext,
    expr: &Expr,
    column: &str,
    ty: &Type,
) -> AnalyzerResult<Value> {
    let result = scoped(context, None, |context, scope| {
        compile_scalar(context, expr, scope, Some(&TypeContext::new(ty.clone())))
    })?;
    let Some((value, value_ty)) = constant(&result.expr) else {
        return Err(context.report(
            DiagnosticCode::UnsupportedFeature,
            expr.span(),
            format!("default value of '{column}' must be a literal"),
        ));
    };
    if !is_assignable(value_ty, ty) {
        return Err(context.report(
            DiagnosticCode::InconsistentType,
            expr.span(),
            format!("default value of '{column}' has type {value_ty}, expected {ty}"),
        ));
    }
    Ok(value.clone())
}

fn compile_create_table(
    context: &mut AnalyzerContext,
    create: &CreateTable,
) -> AnalyzerResult<Statement> {
    let schema = target_schema(context, &create.name)?;
    let name = object_name(context, &create.name)?;
    debug!(schema = %schema.declaration().name, table = %name, "compile create table");

    if schema.find_table(&name).is_some() {
        if create.if_not_exists {
            return Ok(Statement::Empty);
        }
        return Err(context.report(
            DiagnosticCode::TableAlreadyExists,
            Some(create.name.span()),
            format!("table '{name}' already exists"),
        ));
    }

    let mut columns: Vec<ColumnDecl> = Vec::with_capacity(create.columns.len());
    for definition in &create.columns {
        let column_name = normalize(context, &definition.name);
        if columns.iter().any(|c| c.name == column_name) {
            return Err(context.report(
                DiagnosticCode::ColumnAlreadyExists,
                Some(definition.name.span),
                format!("column '{column_name}' is already defined"),
            ));
        }
        let ty = resolve_type(context, &definition.data_type)?;
        let mut column = ColumnDecl::new(column_name, ty)
            .with_nullable(!definition.not_null && !definition.primary_key);
        if let Some(default) = &definition.default {
            let value = column_default(context, default, &column.name, &column.ty)?;
            column = column.with_default(value);
        }
        columns.push(column);
    }

    let mut primary_keys: Vec<Vec<&Identifier>> = create
        .columns
        .iter()
        .filter(|c| c.primary_key)
        .map(|c| vec![&c.name])
        .collect();
    primary_keys.extend(create.primary_keys.iter().map(|keys| keys.iter().collect()));
    if primary_keys.len() > 1 {
        return Err(context.report(
            DiagnosticCode::PrimaryIndexAlreadyExists,
            Some(create.name.span()),
            format!("table '{name}' declares more than one primary key"),
        ));
    }

    let mut table =
        TableDecl::new(name.clone(), schema.declaration().name.clone()).with_columns(columns);
    let key_positions = match primary_keys.first() {
        Some(keys) => resolve_column_list(context, &table, keys)?,
        None => Vec::new(),
    };
    for &position in &key_positions {
        table.columns[position].nullable = false;
    }
    let table = Arc::new(table);

    let primary_index = (!key_positions.is_empty()).then(|| {
        let index = key_positions
            .iter()
            .fold(IndexDecl::new(name.clone(), Arc::clone(&table)), |index, &p| {
                index.with_key(p)
            })
            .primary();
        Arc::new(index)
    });

    Ok(Statement::CreateTable {
        schema: context.bindings.schema(Arc::clone(schema.declaration())),
        table,
        primary_index,
    })
}

fn compile_drop_table(
    context: &mut AnalyzerContext,
    name: &Name,
    if_exists: bool,
) -> AnalyzerResult<Statement> {
    debug!(table = %name, "compile drop table");
    match find_table(context, name)? {
        Some((_, table)) => Ok(Statement::DropTable {
            table: context.bindings.table(table),
        }),
        None if if_exists => Ok(Statement::Empty),
        None => Err(context.report(
            DiagnosticCode::TableNotFound,
            Some(name.span()),
            format!("table '{name}' is not found"),
        )),
    }
}

fn compile_create_index(
    context: &mut AnalyzerContext,
    create: &CreateIndex,
) -> AnalyzerResult<Statement> {
    let schema = target_schema(context, &create.name)?;
    let name = object_name(context, &create.name)?;
    debug!(schema = %schema.declaration().name, index = %name, "compile create index");

    if schema.find_index(&name).is_some() {
        if create.if_not_exists {
            return Ok(Statement::Empty);
        }
        return Err(context.report(
            DiagnosticCode::IndexAlreadyExists,
            Some(create.name.span()),
            format!("index '{name}' already exists"),
        ));
    }

    let (_, table) = resolve_table(context, &create.table)?;
    let identifiers: Vec<&Identifier> = create.keys.iter().map(|k| &k.column).collect();
    let positions = resolve_column_list(context, &table, &identifiers)?;
    let keys = positions
        .into_iter()
        .zip(&create.keys)
        .map(|(position, key)| IndexKeyDecl {
            position,
            order: match key.direction {
                Some(SortDirection::Descending) => SortOrder::Descending,
                Some(SortDirection::Ascending) | None => SortOrder::Ascending,
            },
        })
        .collect();

    let mut index = IndexDecl::new(name, table);
    index.keys = keys;
    Ok(Statement::CreateIndex {
        index: Arc::new(index),
    })
}

fn compile_drop_index(
    context: &mut AnalyzerContext,
    name: &Name,
    if_exists: bool,
) -> AnalyzerResult<Statement> {
    debug!(index = %name, "compile drop index");
    match find_index(context, name)? {
        Some((_, index)) => Ok(Statement::DropIndex {
            index: context.bindings.index(index),
        }),
        None if if_exists => Ok(Statement::Empty),
        None => Err(context.report(
            DiagnosticCode::IndexNotFound,
            Some(name.span()),
            format!("index '{name}' is not found"),
        )),
    }
}
