// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Scalar expressions
//!
//! Lowered scalar expression trees. Unlike the AST, the IR has no BETWEEN,
//! IN-list, simple CASE or NULLIF: those are expressed with [`Scalar::Let`]
//! temporaries and [`Scalar::Conditional`].
//!
//! [`Scalar::AggregateCall`] exists only while a SELECT block is being
//! compiled; the aggregation step replaces every such node with a reference
//! to an `aggregate` operator column before the tree reaches the graph.

use crate::descriptor::{AggregateFunction, Function, Variable};
use crate::types::Type;
use crate::value::Value;

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    Plus,
    SignInversion,
    ConditionalNot,
    IsNull,
    IsTrue,
    IsFalse,
    IsUnknown,
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Remainder,
    Concat,
    ConditionalAnd,
    ConditionalOr,
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOperator {
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
}

/// Pattern match operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchOperator {
    Like,
    Similar,
}

/// What a cast does when the value does not fit the target type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LossPolicy {
    /// Best effort, never raises
    Ignore,
    /// Raises at evaluation time
    Error,
}

/// One `(condition, result)` arm of a conditional
#[derive(Debug, Clone, PartialEq)]
pub struct Alternative {
    pub condition: Scalar,
    pub body: Scalar,
}

/// `variable := value` in a let expression
#[derive(Debug, Clone, PartialEq)]
pub struct Declarator {
    pub variable: Variable,
    pub value: Scalar,
}

/// A scalar expression
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Immediate {
        value: Value,
        ty: Type,
    },
    VariableRef(Variable),
    Unary {
        op: UnaryOperator,
        operand: Box<Scalar>,
    },
    Binary {
        op: BinaryOperator,
        left: Box<Scalar>,
        right: Box<Scalar>,
    },
    Compare {
        op: ComparisonOperator,
        left: Box<Scalar>,
        right: Box<Scalar>,
    },
    Match {
        op: MatchOperator,
        input: Box<Scalar>,
        pattern: Box<Scalar>,
        escape: Box<Scalar>,
    },
    /// First alternative whose condition holds wins; `default` otherwise
    Conditional {
        alternatives: Vec<Alternative>,
        default: Option<Box<Scalar>>,
    },
    /// Evaluates each declarator once, in order, then `body`
    Let {
        declarators: Vec<Declarator>,
        body: Box<Scalar>,
    },
    Cast {
        operand: Box<Scalar>,
        target: Type,
        loss_policy: LossPolicy,
    },
    FunctionCall {
        function: Function,
        arguments: Vec<Scalar>,
    },
    AggregateCall {
        function: AggregateFunction,
        arguments: Vec<Scalar>,
    },
}

impl Scalar {
    pub fn immediate(value: Value, ty: Type) -> Self {
        Scalar::Immediate { value, ty }
    }

    pub fn variable(variable: Variable) -> Self {
        Scalar::VariableRef(variable)
    }

    pub fn unary(op: UnaryOperator, operand: Scalar) -> Self {
        Scalar::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn binary(op: BinaryOperator, left: Scalar, right: Scalar) -> Self {
        Scalar::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn compare(op: ComparisonOperator, left: Scalar, right: Scalar) -> Self {
        Scalar::Compare {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn not(operand: Scalar) -> Self {
        Scalar::unary(UnaryOperator::ConditionalNot, operand)
    }

    pub fn and(left: Scalar, right: Scalar) -> Self {
        Scalar::binary(BinaryOperator::ConditionalAnd, left, right)
    }

    pub fn or(left: Scalar, right: Scalar) -> Self {
        Scalar::binary(BinaryOperator::ConditionalOr, left, right)
    }

    /// The referenced variable, if this is a bare variable reference
    pub fn as_variable(&self) -> Option<&Variable> {
        match self {
            Scalar::VariableRef(v) => Some(v),
            _ => None,
        }
    }

    /// Direct subexpressions, in evaluation order
    pub fn children(&self) -> Vec<&Scalar> {
        match self {
            Scalar::Immediate { .. } | Scalar::VariableRef(_) => Vec::new(),
            Scalar::Unary { operand, .. } | Scalar::Cast { operand, .. } => vec![operand.as_ref()],
            Scalar::Binary { left, right, .. } | Scalar::Compare { left, right, .. } => {
                vec![left.as_ref(), right.as_ref()]
            }
            Scalar::Match {
                input,
                pattern,
                escape,
                ..
            } => vec![input.as_ref(), pattern.as_ref(), escape.as_ref()],
            Scalar::Conditional {
                alternatives,
                default,
            } => {
                let mut out = Vec::with_capacity(alternatives.len() * 2 + 1);
                for alternative in alternatives {
                    out.push(&alternative.condition);
                    out.push(&alternative.body);
                }
                if let Some(default) = default {
                    out.push(default.as_ref());
                }
                out
            }
            Scalar::Let { declarators, body } => {
                let mut out: Vec<&Scalar> = declarators.iter().map(|d| &d.value).collect();
                out.push(body.as_ref());
                out
            }
            Scalar::FunctionCall { arguments, .. } | Scalar::AggregateCall { arguments, .. } => {
                arguments.iter().collect()
            }
        }
    }

    /// Mutable direct subexpressions, in evaluation order
    pub fn children_mut(&mut self) -> Vec<&mut Scalar> {
        match self {
            Scalar::Immediate { .. } | Scalar::VariableRef(_) => Vec::new(),
            Scalar::Unary { operand, .. } | Scalar::Cast { operand, .. } => vec![operand.as_mut()],
            Scalar::Binary { left, right, .. } | Scalar::Compare { left, right, .. } => {
                vec![left.as_mut(), right.as_mut()]
            }
            Scalar::Match {
                input,
                pattern,
                escape,
                ..
            } => vec![input.as_mut(), pattern.as_mut(), escape.as_mut()],
            Scalar::Conditional {
                alternatives,
                default,
            } => {
                let mut out = Vec::with_capacity(alternatives.len() * 2 + 1);
                for alternative in alternatives.iter_mut() {
                    out.push(&mut alternative.condition);
                    out.push(&mut alternative.body);
                }
                if let Some(default) = default {
                    out.push(default.as_mut());
                }
                out
            }
            Scalar::Let { declarators, body } => {
                let mut out: Vec<&mut Scalar> =
                    declarators.iter_mut().map(|d| &mut d.value).collect();
                out.push(body.as_mut());
                out
            }
            Scalar::FunctionCall { arguments, .. } | Scalar::AggregateCall { arguments, .. } => {
                arguments.iter_mut().collect()
            }
        }
    }

    /// Whether an aggregate call occurs anywhere in the tree
    pub fn contains_aggregate(&self) -> bool {
        matches!(self, Scalar::AggregateCall { .. })
            || self.children().into_iter().any(Scalar::contains_aggregate)
    }

    /// Calls `f` on every variable referenced in the tree, pre-order
    pub fn for_each_variable<'a>(&'a self, f: &mut impl FnMut(&'a Variable)) {
        if let Scalar::VariableRef(v) = self {
            f(v);
        }
        if let Scalar::Let { declarators, .. } = self {
            for declarator in declarators {
                f(&declarator.variable);
            }
        }
        for child in self.children() {
            child.for_each_variable(f);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::BindingFactory;

    #[test]
    fn test_children_order() {
        let mut factory = BindingFactory::new();
        let x = factory.stream_variable(Some("x"));
        let expr = Scalar::and(
            Scalar::compare(
                ComparisonOperator::Less,
                Scalar::variable(x.clone()),
                Scalar::immediate(Value::Int4(1), Type::Int4),
            ),
            Scalar::unary(UnaryOperator::IsNull, Scalar::variable(x.clone())),
        );
        assert_eq!(expr.children().len(), 2);
        let mut seen = Vec::new();
        expr.for_each_variable(&mut |v| seen.push(v.clone()));
        assert_eq!(seen, vec![x.clone(), x]);
        assert!(!expr.contains_aggregate());
    }

    #[test]
    fn test_children_mut_rewrites_in_place() {
        let mut factory = BindingFactory::new();
        let x = factory.stream_variable(None);
        let y = factory.stream_variable(None);
        let mut expr = Scalar::not(Scalar::variable(x));
        for child in expr.children_mut() {
            *child = Scalar::variable(y.clone());
        }
        assert_eq!(expr, Scalar::not(Scalar::variable(y)));
    }
}
