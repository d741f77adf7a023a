// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! # Scalar expression compiler
//!
//! Lowers AST scalar expressions into IR [`Scalar`] trees.
//!
//! ## Desugaring
//!
//! Forms that read one operand several times bind it to a `let` temporary
//! so it is evaluated once:
//!
//! ```text
//! x BETWEEN lo AND hi            let t := x in (lo <= t) AND (t <= hi)
//! x BETWEEN SYMMETRIC lo AND hi  let t := x, l := lo, h := hi in
//!                                  ((l <= t) AND (t <= h)) OR ((h <= t) AND (t <= l))
//! x IN (a, b)                    let t := x in (t = a) OR (t = b)
//! CASE x WHEN a THEN r ... END   let t := x in CASE WHEN t = a THEN r ... END
//! NULLIF(a, b)                   let t := a in CASE WHEN t = b THEN NULL ELSE t END
//! ```
//!
//! ## NULL operands
//!
//! An untyped `NULL` takes its type from the sibling operands it is unified
//! with, e.g. `k = NULL` types the `NULL` as `k`'s type.
//!
//! ## Aggregates
//!
//! Aggregate calls compile to [`Scalar::AggregateCall`] and set
//! [`ScalarResult::saw_aggregate`]. Rewriting them into references to an
//! `aggregate` operator is the aggregation processor's job.

use relsql_ast::{
    BinaryOp, ComparisonOp, Expr, FunctionArguments, FunctionCall, Literal, Name, PatternOp,
    SetQuantifier, Span, TruthValue, UnaryOp, WhenClause,
};
use relsql_ir::scalar::{
    Alternative, BinaryOperator, ComparisonOperator, Declarator, LossPolicy, MatchOperator,
    UnaryOperator,
};
use relsql_ir::{DISTINCT_SUFFIX, Scalar, Type, Value};
use tracing::trace;

use crate::context::AnalyzerContext;
use crate::error::{AnalyzerResult, DiagnosticCode, ErrorReported};
use crate::function::{common_parameter_type, select_overload};
use crate::literal::{TypeContext, resolve_literal};
use crate::name::{resolve_aggregate_functions, resolve_functions, resolve_variable};
use crate::scope::ScopeId;
use crate::type_resolver::resolve_type;
use crate::typing::unify;

/// A compiled scalar expression
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarResult {
    pub expr: Scalar,
    pub ty: Type,
    /// An aggregate call occurs somewhere in `expr`
    pub saw_aggregate: bool,
}

/// Compile `expr` in `scope`
///
/// `target` types a bare `NULL` or `DEFAULT` and, with
/// `cast_literals_in_context`, casts a bare literal.
pub fn compile_scalar(
    context: &mut AnalyzerContext,
    expr: &Expr,
    scope: ScopeId,
    target: Option<&TypeContext>,
) -> AnalyzerResult<ScalarResult> {
    let mut compiler = ScalarCompiler {
        context,
        scope,
        saw_aggregate: false,
    };
    let (expr, ty) = compiler.compile(expr, target)?;
    Ok(ScalarResult {
        expr,
        ty,
        saw_aggregate: compiler.saw_aggregate,
    })
}

fn is_null(expr: &Expr) -> bool {
    matches!(expr, Expr::Literal(Literal::Null))
}

fn comparison(op: ComparisonOp) -> ComparisonOperator {
    match op {
        ComparisonOp::Equal => ComparisonOperator::Equal,
        ComparisonOp::NotEqual => ComparisonOperator::NotEqual,
        ComparisonOp::Less => ComparisonOperator::Less,
        ComparisonOp::LessEqual => ComparisonOperator::LessEqual,
        ComparisonOp::Greater => ComparisonOperator::Greater,
        ComparisonOp::GreaterEqual => ComparisonOperator::GreaterEqual,
    }
}

fn arithmetic(op: BinaryOp) -> Option<BinaryOperator> {
    match op {
        BinaryOp::Add => Some(BinaryOperator::Add),
        BinaryOp::Subtract => Some(BinaryOperator::Subtract),
        BinaryOp::Multiply => Some(BinaryOperator::Multiply),
        BinaryOp::Divide => Some(BinaryOperator::Divide),
        BinaryOp::Remainder => Some(BinaryOperator::Remainder),
        _ => None,
    }
}

fn concatenated_length(a: Option<u32>, b: Option<u32>) -> Option<u32> {
    a?.checked_add(b?)
}

/// Result type of `a || b`
fn concat_type(a: &Type, b: &Type) -> Option<Type> {
    match (a, b) {
        (Type::Unknown, Type::Unknown) => Some(Type::FLEXIBLE_VARCHAR),
        (Type::Unknown, other) | (other, Type::Unknown) => concat_type(other, other),
        (Type::Character { length: la, .. }, Type::Character { length: lb, .. }) => {
            Some(Type::Character {
                varying: true,
                length: concatenated_length(*la, *lb),
            })
        }
        (Type::Octet { length: la, .. }, Type::Octet { length: lb, .. }) => Some(Type::Octet {
            varying: true,
            length: concatenated_length(*la, *lb),
        }),
        (Type::Bit { length: la, .. }, Type::Bit { length: lb, .. }) => Some(Type::Bit {
            varying: true,
            length: concatenated_length(*la, *lb),
        }),
        _ => None,
    }
}

struct ScalarCompiler<'a> {
    context: &'a mut AnalyzerContext,
    scope: ScopeId,
    saw_aggregate: bool,
}

impl ScalarCompiler<'_> {
    fn compile(
        &mut self,
        expr: &Expr,
        target: Option<&TypeContext>,
    ) -> AnalyzerResult<(Scalar, Type)> {
        match expr {
            Expr::Literal(literal) => resolve_literal(self.context, literal, target),
            Expr::Variable(name) => {
                let resolved = resolve_variable(self.context, name, self.scope)?;
                Ok((
                    Scalar::variable(resolved.variable().clone()),
                    resolved.ty().clone(),
                ))
            }
            Expr::HostParameter { name, span } => self.host_parameter(name, *span),
            Expr::Unary { op, operand } => self.unary(*op, operand, expr),
            Expr::Binary { op, left, right } => self.binary(*op, left, right, expr),
            Expr::Comparison { op, left, right } => {
                let (operands, _) = self.unified(&[left.as_ref(), right.as_ref()], None, expr)?;
                let [left, right] = self.split(operands, expr)?;
                Ok((
                    Scalar::compare(comparison(*op), left, right),
                    Type::Boolean,
                ))
            }
            Expr::Between {
                operand,
                low,
                high,
                symmetric,
                negated,
            } => self.between(operand, low, high, *symmetric, *negated, expr),
            Expr::InList {
                operand,
                values,
                negated,
            } => self.in_list(operand, values, *negated, expr),
            Expr::InQuery { .. } => Err(self.context.report(
                DiagnosticCode::UnsupportedFeature,
                expr.span(),
                "IN with a subquery is not supported",
            )),
            Expr::Pattern {
                op,
                operand,
                pattern,
                escape,
                negated,
            } => self.pattern(*op, operand, pattern, escape.as_deref(), *negated, expr),
            Expr::Case {
                operand,
                when_clauses,
                default,
            } => self.case(operand.as_deref(), when_clauses, default.as_deref(), target, expr),
            Expr::Nullif { left, right } => self.nullif(left, right, expr),
            Expr::Cast { operand, target } => {
                let ty = resolve_type(self.context, target)?;
                let operand_context = TypeContext::new(ty.clone());
                let (operand, _) = if is_null(operand) {
                    self.compile(operand, Some(&operand_context))?
                } else {
                    self.compile(operand, None)?
                };
                Ok((
                    Scalar::Cast {
                        operand: Box::new(operand),
                        target: ty.clone(),
                        loss_policy: LossPolicy::Ignore,
                    },
                    ty,
                ))
            }
            Expr::FunctionCall(call) => self.function_call(call),
            Expr::Subquery(_) => Err(self.context.report(
                DiagnosticCode::UnsupportedFeature,
                expr.span(),
                "scalar subqueries are not supported",
            )),
        }
    }

    fn inconsistent(&mut self, expr: &Expr, message: String) -> ErrorReported {
        self.context
            .report(DiagnosticCode::InconsistentType, expr.span(), message)
    }

    /// Destructure the operands compiled for a fixed-arity form
    fn split<T, const N: usize>(&mut self, items: Vec<T>, whole: &Expr) -> AnalyzerResult<[T; N]> {
        items.try_into().map_err(|_| {
            self.context.report(
                DiagnosticCode::MalformedSyntax,
                whole.span(),
                format!("expected {N} operands"),
            )
        })
    }

    /// Compile operands that must share a type
    ///
    /// Non-NULL operands are compiled first; bare NULLs then take the unified
    /// type, or `fallback` when every operand is NULL.
    fn unified(
        &mut self,
        operands: &[&Expr],
        fallback: Option<&TypeContext>,
        whole: &Expr,
    ) -> AnalyzerResult<(Vec<Scalar>, Type)> {
        let mut compiled: Vec<Option<Scalar>> = Vec::with_capacity(operands.len());
        let mut ty = Type::Unknown;
        for operand in operands {
            if is_null(operand) {
                compiled.push(None);
                continue;
            }
            let (scalar, operand_ty) = self.compile(operand, None)?;
            ty = match unify(&ty, &operand_ty) {
                Some(unified) => unified,
                None => {
                    return Err(self.inconsistent(
                        whole,
                        format!("incompatible operand types {ty} and {operand_ty}"),
                    ));
                }
            };
            compiled.push(Some(scalar));
        }

        let null_context = match (&ty, fallback) {
            (Type::Unknown, Some(fallback)) => Some(TypeContext::new(fallback.ty.clone())),
            (Type::Unknown, None) => None,
            (ty, _) => Some(TypeContext::new(ty.clone())),
        };
        let mut scalars = Vec::with_capacity(compiled.len());
        for (operand, scalar) in operands.iter().zip(compiled) {
            match scalar {
                Some(scalar) => scalars.push(scalar),
                None => {
                    let (scalar, null_ty) = self.compile(operand, null_context.as_ref())?;
                    if ty == Type::Unknown {
                        ty = null_ty;
                    }
                    scalars.push(scalar);
                }
            }
        }
        Ok((scalars, ty))
    }

    fn host_parameter(
        &mut self,
        name: &str,
        span: Span,
    ) -> AnalyzerResult<(Scalar, Type)> {
        let key = name.strip_prefix(':').unwrap_or(name);
        if let Some(decl) = self.context.find_host_parameter(key).cloned() {
            trace!(name = key, "resolved host parameter");
            let ty = decl.ty.clone();
            let variable = self.context.bindings.host_parameter(decl);
            return Ok((Scalar::variable(variable), ty));
        }
        if let Some((value, ty)) = self.context.find_placeholder(key).cloned() {
            trace!(name = key, "resolved placeholder");
            return Ok((Scalar::immediate(value, ty.clone()), ty));
        }
        Err(self.context.report(
            DiagnosticCode::VariableNotFound,
            Some(span),
            format!("host parameter ':{key}' is not declared"),
        ))
    }

    fn unary(
        &mut self,
        op: UnaryOp,
        operand: &Expr,
        whole: &Expr,
    ) -> AnalyzerResult<(Scalar, Type)> {
        if op == UnaryOp::Minus {
            match operand {
                Expr::Literal(Literal::ExactNumeric { negative, digits }) => {
                    let folded = Literal::ExactNumeric {
                        negative: !negative,
                        digits: digits.clone(),
                    };
                    return resolve_literal(self.context, &folded, None);
                }
                Expr::Literal(Literal::ApproximateNumeric { negative, text }) => {
                    let folded = Literal::ApproximateNumeric {
                        negative: !negative,
                        text: text.clone(),
                    };
                    return resolve_literal(self.context, &folded, None);
                }
                _ => {}
            }
        }

        let (scalar, ty) = self.compile(operand, None)?;
        let boolean = |scalar| (scalar, Type::Boolean);
        match op {
            UnaryOp::Plus | UnaryOp::Minus => {
                if !ty.is_numeric() && ty != Type::Unknown {
                    return Err(self.inconsistent(
                        whole,
                        format!("unary sign requires a numeric operand, got {ty}"),
                    ));
                }
                let ir = if op == UnaryOp::Plus {
                    UnaryOperator::Plus
                } else {
                    UnaryOperator::SignInversion
                };
                Ok((Scalar::unary(ir, scalar), ty))
            }
            UnaryOp::IsNull => Ok(boolean(Scalar::unary(UnaryOperator::IsNull, scalar))),
            UnaryOp::IsNotNull => Ok(boolean(Scalar::not(Scalar::unary(
                UnaryOperator::IsNull,
                scalar,
            )))),
            UnaryOp::Not
            | UnaryOp::IsTrue
            | UnaryOp::IsNotTrue
            | UnaryOp::IsFalse
            | UnaryOp::IsNotFalse
            | UnaryOp::IsUnknown
            | UnaryOp::IsNotUnknown => {
                if !ty.is_boolean_like() {
                    return Err(self.inconsistent(
                        whole,
                        format!("boolean operator applied to {ty}"),
                    ));
                }
                let result = match op {
                    UnaryOp::Not => Scalar::not(scalar),
                    UnaryOp::IsTrue => Scalar::unary(UnaryOperator::IsTrue, scalar),
                    UnaryOp::IsNotTrue => {
                        Scalar::not(Scalar::unary(UnaryOperator::IsTrue, scalar))
                    }
                    UnaryOp::IsFalse => Scalar::unary(UnaryOperator::IsFalse, scalar),
                    UnaryOp::IsNotFalse => {
                        Scalar::not(Scalar::unary(UnaryOperator::IsFalse, scalar))
                    }
                    UnaryOp::IsUnknown => Scalar::unary(UnaryOperator::IsUnknown, scalar),
                    _ => Scalar::not(Scalar::unary(UnaryOperator::IsUnknown, scalar)),
                };
                Ok(boolean(result))
            }
        }
    }

    fn binary(
        &mut self,
        op: BinaryOp,
        left: &Expr,
        right: &Expr,
        whole: &Expr,
    ) -> AnalyzerResult<(Scalar, Type)> {
        match op {
            BinaryOp::Is | BinaryOp::IsNot => {
                let test = match right {
                    Expr::Literal(Literal::Boolean(TruthValue::True)) => UnaryOperator::IsTrue,
                    Expr::Literal(Literal::Boolean(TruthValue::False)) => UnaryOperator::IsFalse,
                    Expr::Literal(Literal::Boolean(TruthValue::Unknown)) => {
                        UnaryOperator::IsUnknown
                    }
                    Expr::Literal(Literal::Null) => UnaryOperator::IsNull,
                    _ => {
                        return Err(self.context.report(
                            DiagnosticCode::MalformedSyntax,
                            whole.span(),
                            "IS requires TRUE, FALSE, UNKNOWN or NULL on its right",
                        ));
                    }
                };
                let (operand, ty) = self.compile(left, None)?;
                if test != UnaryOperator::IsNull && !ty.is_boolean_like() {
                    return Err(self.inconsistent(
                        whole,
                        format!("truth value test applied to {ty}"),
                    ));
                }
                let result = Scalar::unary(test, operand);
                let result = if op == BinaryOp::IsNot {
                    Scalar::not(result)
                } else {
                    result
                };
                Ok((result, Type::Boolean))
            }
            BinaryOp::And | BinaryOp::Or => {
                let boolean = TypeContext::new(Type::Boolean);
                let (left, left_ty) = self.compile(left, Some(&boolean).filter(|_| is_null(left)))?;
                let (right, right_ty) =
                    self.compile(right, Some(&boolean).filter(|_| is_null(right)))?;
                if !left_ty.is_boolean_like() || !right_ty.is_boolean_like() {
                    return Err(self.inconsistent(
                        whole,
                        format!("logical operator applied to {left_ty} and {right_ty}"),
                    ));
                }
                let result = if op == BinaryOp::And {
                    Scalar::and(left, right)
                } else {
                    Scalar::or(left, right)
                };
                Ok((result, Type::Boolean))
            }
            BinaryOp::Concat => {
                let [(left, left_ty), (right, right_ty)] = self.typed_pair(left, right)?;
                match concat_type(&left_ty, &right_ty) {
                    Some(ty) => Ok((Scalar::binary(BinaryOperator::Concat, left, right), ty)),
                    None => Err(self.inconsistent(
                        whole,
                        format!("cannot concatenate {left_ty} and {right_ty}"),
                    )),
                }
            }
            _ => {
                let Some(ir) = arithmetic(op) else {
                    return Err(self.context.report(
                        DiagnosticCode::MalformedSyntax,
                        whole.span(),
                        "unknown binary operator",
                    ));
                };
                let (operands, ty) = self.unified(&[left, right], None, whole)?;
                if !ty.is_numeric() && ty != Type::Unknown {
                    return Err(self.inconsistent(
                        whole,
                        format!("arithmetic requires numeric operands, got {ty}"),
                    ));
                }
                let [left, right] = self.split(operands, whole)?;
                Ok((Scalar::binary(ir, left, right), ty))
            }
        }
    }

    /// Compile two operands, typing a bare NULL from its sibling without
    /// requiring the two types to unify
    fn typed_pair(&mut self, first: &Expr, second: &Expr) -> AnalyzerResult<[(Scalar, Type); 2]> {
        let (first, second) = match (is_null(first), is_null(second)) {
            (true, false) => {
                let second = self.compile(second, None)?;
                let first = self.compile(first, Some(&TypeContext::new(second.1.clone())))?;
                (first, second)
            }
            (false, true) => {
                let first = self.compile(first, None)?;
                let second = self.compile(second, Some(&TypeContext::new(first.1.clone())))?;
                (first, second)
            }
            _ => (self.compile(first, None)?, self.compile(second, None)?),
        };
        Ok([first, second])
    }

    fn between(
        &mut self,
        operand: &Expr,
        low: &Expr,
        high: &Expr,
        symmetric: bool,
        negated: bool,
        whole: &Expr,
    ) -> AnalyzerResult<(Scalar, Type)> {
        let (operands, _) = self.unified(&[operand, low, high], None, whole)?;
        let [operand, low, high] = self.split(operands, whole)?;

        let x = self.context.bindings.let_variable();
        let x_ref = || Scalar::variable(x.clone());
        let in_range = |low: Scalar, high: Scalar| {
            Scalar::and(
                Scalar::compare(ComparisonOperator::LessEqual, low, x_ref()),
                Scalar::compare(ComparisonOperator::LessEqual, x_ref(), high),
            )
        };

        let mut declarators = vec![Declarator {
            variable: x.clone(),
            value: operand,
        }];
        let body = if symmetric {
            let l = self.context.bindings.let_variable();
            let h = self.context.bindings.let_variable();
            declarators.push(Declarator {
                variable: l.clone(),
                value: low,
            });
            declarators.push(Declarator {
                variable: h.clone(),
                value: high,
            });
            Scalar::or(
                in_range(Scalar::variable(l.clone()), Scalar::variable(h.clone())),
                in_range(Scalar::variable(h), Scalar::variable(l)),
            )
        } else {
            in_range(low, high)
        };

        let result = Scalar::Let {
            declarators,
            body: Box::new(body),
        };
        Ok((negate_if(result, negated), Type::Boolean))
    }

    fn in_list(
        &mut self,
        operand: &Expr,
        values: &[Expr],
        negated: bool,
        whole: &Expr,
    ) -> AnalyzerResult<(Scalar, Type)> {
        if values.is_empty() {
            return Err(self.context.report(
                DiagnosticCode::MalformedSyntax,
                whole.span(),
                "IN list must not be empty",
            ));
        }
        let mut operands: Vec<&Expr> = vec![operand];
        operands.extend(values.iter());
        let (mut compiled, _) = self.unified(&operands, None, whole)?;
        let values = compiled.split_off(1);
        let Some(operand) = compiled.pop() else {
            return Err(self.context.report(DiagnosticCode::MalformedSyntax, whole.span(), "IN"));
        };

        let x = self.context.bindings.let_variable();
        let body = values
            .into_iter()
            .map(|value| {
                Scalar::compare(ComparisonOperator::Equal, Scalar::variable(x.clone()), value)
            })
            .reduce(Scalar::or);
        let Some(body) = body else {
            return Err(self.context.report(DiagnosticCode::MalformedSyntax, whole.span(), "IN"));
        };
        let result = Scalar::Let {
            declarators: vec![Declarator {
                variable: x,
                value: operand,
            }],
            body: Box::new(body),
        };
        Ok((negate_if(result, negated), Type::Boolean))
    }

    fn pattern(
        &mut self,
        op: PatternOp,
        operand: &Expr,
        pattern: &Expr,
        escape: Option<&Expr>,
        negated: bool,
        whole: &Expr,
    ) -> AnalyzerResult<(Scalar, Type)> {
        let string_context = TypeContext::new(Type::FLEXIBLE_VARCHAR);
        let mut strings = Vec::with_capacity(3);
        for part in [Some(operand), Some(pattern), escape].into_iter().flatten() {
            let (scalar, ty) = self.compile(part, Some(&string_context).filter(|_| is_null(part)))?;
            if !ty.is_character() && ty != Type::Unknown {
                return Err(self.inconsistent(
                    whole,
                    format!("pattern matching requires character operands, got {ty}"),
                ));
            }
            strings.push(scalar);
        }
        if escape.is_none() {
            strings.push(Scalar::immediate(
                Value::Character(String::new()),
                Type::FLEXIBLE_VARCHAR,
            ));
        }
        let [input, pattern, escape] = self.split(strings, whole)?;
        let op = match op {
            PatternOp::Like => MatchOperator::Like,
            PatternOp::Similar => MatchOperator::Similar,
        };
        let result = Scalar::Match {
            op,
            input: Box::new(input),
            pattern: Box::new(pattern),
            escape: Box::new(escape),
        };
        Ok((negate_if(result, negated), Type::Boolean))
    }

    fn case(
        &mut self,
        operand: Option<&Expr>,
        when_clauses: &[WhenClause],
        default: Option<&Expr>,
        target: Option<&TypeContext>,
        whole: &Expr,
    ) -> AnalyzerResult<(Scalar, Type)> {
        if when_clauses.is_empty() {
            return Err(self.context.report(
                DiagnosticCode::MalformedSyntax,
                whole.span(),
                "CASE requires at least one WHEN clause",
            ));
        }

        let mut declarators = Vec::new();
        let conditions = match operand {
            Some(operand) => {
                let mut operands: Vec<&Expr> = vec![operand];
                operands.extend(when_clauses.iter().map(|w| &w.when));
                let (mut compiled, _) = self.unified(&operands, None, whole)?;
                let whens = compiled.split_off(1);
                let x = self.context.bindings.let_variable();
                if let Some(value) = compiled.pop() {
                    declarators.push(Declarator {
                        variable: x.clone(),
                        value,
                    });
                }
                whens
                    .into_iter()
                    .map(|when| {
                        Scalar::compare(
                            ComparisonOperator::Equal,
                            Scalar::variable(x.clone()),
                            when,
                        )
                    })
                    .collect()
            }
            None => {
                let mut conditions = Vec::with_capacity(when_clauses.len());
                for clause in when_clauses {
                    let (condition, ty) = self.compile(&clause.when, None)?;
                    if !ty.is_boolean_like() {
                        return Err(self.inconsistent(
                            &clause.when,
                            format!("WHEN condition must be boolean, got {ty}"),
                        ));
                    }
                    conditions.push(condition);
                }
                conditions
            }
        };

        let mut results: Vec<&Expr> = when_clauses.iter().map(|w| &w.then).collect();
        if let Some(default) = default {
            results.push(default);
        }
        let (mut bodies, ty) = self.unified(&results, target, whole)?;
        let default = default.and_then(|_| bodies.pop()).map(Box::new);

        let alternatives = conditions
            .into_iter()
            .zip(bodies)
            .map(|(condition, body)| Alternative { condition, body })
            .collect();
        let conditional = Scalar::Conditional {
            alternatives,
            default,
        };
        let result = if declarators.is_empty() {
            conditional
        } else {
            Scalar::Let {
                declarators,
                body: Box::new(conditional),
            }
        };
        Ok((result, ty))
    }

    fn nullif(
        &mut self,
        left: &Expr,
        right: &Expr,
        whole: &Expr,
    ) -> AnalyzerResult<(Scalar, Type)> {
        let (operands, ty) = self.unified(&[left, right], None, whole)?;
        let [left, right] = self.split(operands, whole)?;
        let x = self.context.bindings.let_variable();
        let conditional = Scalar::Conditional {
            alternatives: vec![Alternative {
                condition: Scalar::compare(
                    ComparisonOperator::Equal,
                    Scalar::variable(x.clone()),
                    right,
                ),
                body: Scalar::immediate(Value::Null, ty.clone()),
            }],
            default: Some(Box::new(Scalar::variable(x.clone()))),
        };
        Ok((
            Scalar::Let {
                declarators: vec![Declarator {
                    variable: x,
                    value: left,
                }],
                body: Box::new(conditional),
            },
            ty,
        ))
    }

    fn function_call(&mut self, call: &FunctionCall) -> AnalyzerResult<(Scalar, Type)> {
        let distinct = call.quantifier == Some(SetQuantifier::Distinct);
        let (asterisk, arguments) = match &call.arguments {
            FunctionArguments::Asterisk => (true, &[][..]),
            FunctionArguments::List(arguments) => (false, arguments.as_slice()),
        };

        if !distinct && !asterisk && call.quantifier.is_none() {
            let (key, candidates) = resolve_functions(self.context, &call.name, arguments.len())?;
            let candidates: Vec<_> = candidates
                .into_iter()
                .filter(|f| !f.features.table_valued)
                .collect();
            if !candidates.is_empty() {
                let (arguments, types) = self.arguments(arguments, |position| {
                    common_parameter_type(&candidates, position)
                })?;
                let location = Some(call.name.span());
                let decl = select_overload(self.context, &key, &candidates, &types, location)?;
                let ty = decl.return_type.clone();
                let function = self.context.bindings.function(decl);
                return Ok((Scalar::FunctionCall { function, arguments }, ty));
            }
        }

        self.aggregate_call(&call.name, distinct, asterisk, arguments)
    }

    fn aggregate_call(
        &mut self,
        name: &Name,
        distinct: bool,
        asterisk: bool,
        arguments: &[Expr],
    ) -> AnalyzerResult<(Scalar, Type)> {
        let suffix = if distinct { DISTINCT_SUFFIX } else { "" };
        let (key, candidates) =
            resolve_aggregate_functions(self.context, name, suffix, arguments.len(), asterisk)?;
        if candidates.is_empty() {
            return Err(self.context.report(
                DiagnosticCode::FunctionNotFound,
                Some(name.span()),
                format!("function '{name}' with {} argument(s) is not found", arguments.len()),
            ));
        }
        let (arguments, types) = self.arguments(arguments, |position| {
            common_parameter_type(&candidates, position)
        })?;
        let decl = select_overload(self.context, &key, &candidates, &types, Some(name.span()))?;
        let ty = decl.return_type.clone();
        let function = self.context.bindings.aggregate_function(decl);
        self.saw_aggregate = true;
        Ok((Scalar::AggregateCall { function, arguments }, ty))
    }

    /// Compile call arguments; a bare NULL argument is typed by
    /// `parameter_type` when every candidate agrees on it
    fn arguments(
        &mut self,
        arguments: &[Expr],
        parameter_type: impl Fn(usize) -> Option<Type>,
    ) -> AnalyzerResult<(Vec<Scalar>, Vec<Type>)> {
        let mut scalars = Vec::with_capacity(arguments.len());
        let mut types = Vec::with_capacity(arguments.len());
        for (position, argument) in arguments.iter().enumerate() {
            let null_context = if is_null(argument) {
                parameter_type(position).map(TypeContext::new)
            } else {
                None
            };
            let (scalar, ty) = self.compile(argument, null_context.as_ref())?;
            scalars.push(scalar);
            types.push(ty);
        }
        Ok((scalars, types))
    }
}

fn negate_if(scalar: Scalar, negated: bool) -> Scalar {
    if negated { Scalar::not(scalar) } else { scalar }
}
