// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Scalar expressions
//!
//! Value expressions and predicates as produced by the parser.
//!
//! ## Design
//!
//! Expressions are a closed sum type. Predicates with dedicated SQL syntax
//! (`BETWEEN`, `IN`, `LIKE`, `CASE`, `NULLIF`, `CAST`) keep their own
//! variants instead of being folded into function calls, so the analyzer can
//! lower each form precisely:
//!
//! ```text
//! Between {
//!   operand: Variable(k),
//!   low: Literal(1),
//!   high: Literal(10),
//!   symmetric: false,
//!   negated: false,
//! }
//! ```
//!
//! Represents: `k BETWEEN 1 AND 10`
//!
//! ## Operators
//!
//! - **Unary**: `+x`, `-x`, `NOT x`, `x IS [NOT] NULL`, `x IS [NOT] TRUE/FALSE/UNKNOWN`
//! - **Binary**: arithmetic, `||`, `AND`, `OR`, and the generic `x IS [NOT] y`
//!   form whose right operand must be a truth value or `NULL`
//! - **Comparison**: `=`, `<>`, `<`, `<=`, `>`, `>=`
//!
//! ## Function calls
//!
//! ```sql
//! COUNT(*)                  -- arguments: Asterisk
//! COUNT(DISTINCT category)  -- quantifier: Some(Distinct)
//! UPPER(name)
//! ```

use serde::{Deserialize, Serialize};

use crate::literal::Literal;
use crate::name::{Name, Span};
use crate::query::{QueryExpr, SetQuantifier};
use crate::types::DataType;

/// A scalar expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Literal(Literal),

    /// Column or variable reference (e.g., `k`, `t.k`, `sch.v`)
    Variable(Name),

    /// Host parameter or placeholder (e.g., `:p`)
    HostParameter { name: String, span: Span },

    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },

    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    Comparison {
        op: ComparisonOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// `x [NOT] BETWEEN [SYMMETRIC] low AND high`
    Between {
        operand: Box<Expr>,
        low: Box<Expr>,
        high: Box<Expr>,
        symmetric: bool,
        negated: bool,
    },

    /// `x [NOT] IN (v1, v2, ...)`
    InList {
        operand: Box<Expr>,
        values: Vec<Expr>,
        negated: bool,
    },

    /// `x [NOT] IN (SELECT ...)`
    InQuery {
        operand: Box<Expr>,
        query: Box<QueryExpr>,
        negated: bool,
    },

    /// `x [NOT] LIKE p [ESCAPE e]` and `x [NOT] SIMILAR TO p [ESCAPE e]`
    Pattern {
        op: PatternOp,
        operand: Box<Expr>,
        pattern: Box<Expr>,
        escape: Option<Box<Expr>>,
        negated: bool,
    },

    /// Searched CASE when `operand` is `None`, simple CASE otherwise
    Case {
        operand: Option<Box<Expr>>,
        when_clauses: Vec<WhenClause>,
        default: Option<Box<Expr>>,
    },

    Nullif {
        left: Box<Expr>,
        right: Box<Expr>,
    },

    Cast {
        operand: Box<Expr>,
        target: DataType,
    },

    FunctionCall(FunctionCall),

    /// Scalar subquery `(SELECT ...)`
    Subquery(Box<QueryExpr>),
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    Plus,
    Minus,
    Not,
    IsNull,
    IsNotNull,
    IsTrue,
    IsNotTrue,
    IsFalse,
    IsNotFalse,
    IsUnknown,
    IsNotUnknown,
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Remainder,
    Concat,
    And,
    Or,
    Is,
    IsNot,
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComparisonOp {
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
}

/// Pattern matching operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatternOp {
    Like,
    Similar,
}

/// One `WHEN ... THEN ...` arm of a CASE expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhenClause {
    pub when: Expr,
    pub then: Expr,
}

/// Arguments of a function call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FunctionArguments {
    /// `f(*)`
    Asterisk,
    List(Vec<Expr>),
}

/// A function or aggregate function invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: Name,
    pub quantifier: Option<SetQuantifier>,
    pub arguments: FunctionArguments,
}

impl FunctionCall {
    pub fn new(name: Name, arguments: Vec<Expr>) -> Self {
        Self {
            name,
            quantifier: None,
            arguments: FunctionArguments::List(arguments),
        }
    }

    /// Builder method: set the set quantifier (`ALL` / `DISTINCT`)
    pub fn with_quantifier(mut self, quantifier: SetQuantifier) -> Self {
        self.quantifier = Some(quantifier);
        self
    }

    pub fn argument_count(&self) -> usize {
        match &self.arguments {
            FunctionArguments::Asterisk => 0,
            FunctionArguments::List(args) => args.len(),
        }
    }
}

impl Expr {
    /// Unqualified or dot-qualified column reference, e.g. `"t.k"`
    pub fn column(path: &str) -> Self {
        Expr::Variable(Name::qualified(path))
    }

    /// Exact numeric literal from its source text
    pub fn exact(text: &str) -> Self {
        Expr::Literal(Literal::exact(text))
    }

    pub fn string(body: &str) -> Self {
        Expr::Literal(Literal::string(body))
    }

    pub fn null() -> Self {
        Expr::Literal(Literal::Null)
    }

    pub fn host_parameter(name: &str) -> Self {
        Expr::HostParameter {
            name: name.to_string(),
            span: Span::default(),
        }
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Expr::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn compare(op: ComparisonOp, left: Expr, right: Expr) -> Self {
        Expr::Comparison {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn and(left: Expr, right: Expr) -> Self {
        Expr::binary(BinaryOp::And, left, right)
    }

    pub fn function(name: &str, arguments: Vec<Expr>) -> Self {
        Expr::FunctionCall(FunctionCall::new(Name::qualified(name), arguments))
    }

    /// `COUNT(*)`
    pub fn count_asterisk() -> Self {
        Expr::FunctionCall(FunctionCall {
            name: Name::simple("count"),
            quantifier: None,
            arguments: FunctionArguments::Asterisk,
        })
    }

    pub fn cast(operand: Expr, target: DataType) -> Self {
        Expr::Cast {
            operand: Box::new(operand),
            target,
        }
    }

    pub fn between(operand: Expr, low: Expr, high: Expr, symmetric: bool) -> Self {
        Expr::Between {
            operand: Box::new(operand),
            low: Box::new(low),
            high: Box::new(high),
            symmetric,
            negated: false,
        }
    }

    /// Source span of the expression, when the parser recorded one
    pub fn span(&self) -> Option<Span> {
        match self {
            Expr::Variable(name) => Some(name.span()),
            Expr::HostParameter { span, .. } => Some(*span),
            Expr::FunctionCall(call) => Some(call.name.span()),
            Expr::Unary { operand, .. } => operand.span(),
            Expr::Binary { left, .. } | Expr::Comparison { left, .. } => left.span(),
            _ => None,
        }
    }
}
