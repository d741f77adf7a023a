// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Type lattice and coercion
//!
//! Two relations over IR types:
//! - [`unify`]: the least upper bound of two types, used by VALUES columns,
//!   set operations, CASE results and comparisons.
//! - [`conversion_cost`]: how far an argument type must widen to reach a
//!   parameter type, used to rank function overloads.

use relsql_ir::Type;

/// Decimal digits needed for the integral part of each integer type
fn integer_digits(ty: &Type) -> Option<u32> {
    match ty {
        Type::Int1 => Some(3),
        Type::Int2 => Some(5),
        Type::Int4 => Some(10),
        Type::Int8 => Some(19),
        _ => None,
    }
}

/// Position on the numeric widening ladder
fn numeric_rank(ty: &Type) -> Option<u32> {
    match ty {
        Type::Int1 => Some(0),
        Type::Int2 => Some(1),
        Type::Int4 => Some(2),
        Type::Int8 => Some(3),
        Type::Decimal { .. } => Some(4),
        Type::Float4 => Some(5),
        Type::Float8 => Some(6),
        _ => None,
    }
}

fn decimal_parts(ty: &Type) -> Option<(u32, u32)> {
    match ty {
        Type::Decimal {
            precision: Some(p),
            scale,
        } => {
            let s = scale.unwrap_or(0);
            Some((p.saturating_sub(s), s))
        }
        _ => integer_digits(ty).map(|d| (d, 0)),
    }
}

fn unify_exact(a: &Type, b: &Type) -> Type {
    match (decimal_parts(a), decimal_parts(b)) {
        (Some((ia, sa)), Some((ib, sb))) => {
            let scale = sa.max(sb);
            Type::decimal(ia.max(ib) + scale, scale)
        }
        _ => Type::FLEXIBLE_DECIMAL,
    }
}

fn max_length(a: Option<u32>, b: Option<u32>) -> Option<u32> {
    Some(a?.max(b?))
}

/// The least upper bound of `a` and `b`, or `None` if they do not unify
pub fn unify(a: &Type, b: &Type) -> Option<Type> {
    if a == b {
        return Some(a.clone());
    }
    match (a, b) {
        (Type::Unknown, other) | (other, Type::Unknown) => Some(other.clone()),

        _ if a.is_integer() && b.is_integer() => {
            let wider = if numeric_rank(a) >= numeric_rank(b) { a } else { b };
            Some(wider.clone())
        }
        _ if a.is_exact_numeric() && b.is_exact_numeric() => Some(unify_exact(a, b)),
        _ if a.is_numeric() && b.is_numeric() => Some(Type::Float8),

        (
            Type::Character {
                varying: va,
                length: la,
            },
            Type::Character {
                varying: vb,
                length: lb,
            },
        ) => Some(Type::Character {
            varying: *va || *vb,
            length: max_length(*la, *lb),
        }),
        (
            Type::Octet {
                varying: va,
                length: la,
            },
            Type::Octet {
                varying: vb,
                length: lb,
            },
        ) => Some(Type::Octet {
            varying: *va || *vb,
            length: max_length(*la, *lb),
        }),
        (
            Type::Bit {
                varying: va,
                length: la,
            },
            Type::Bit {
                varying: vb,
                length: lb,
            },
        ) => Some(Type::Bit {
            varying: *va || *vb,
            length: max_length(*la, *lb),
        }),

        (
            Type::TimeOfDay {
                with_time_zone: za,
            },
            Type::TimeOfDay {
                with_time_zone: zb,
            },
        ) => Some(Type::TimeOfDay {
            with_time_zone: *za || *zb,
        }),
        (
            Type::TimePoint {
                with_time_zone: za,
            },
            Type::TimePoint {
                with_time_zone: zb,
            },
        ) => Some(Type::TimePoint {
            with_time_zone: *za || *zb,
        }),
        (Type::Date, point @ Type::TimePoint { .. })
        | (point @ Type::TimePoint { .. }, Type::Date) => {
            Some(point.clone())
        }

        _ => None,
    }
}

fn string_cost(
    from: (bool, Option<u32>),
    to: (bool, Option<u32>),
) -> Option<u32> {
    let (from_varying, from_length) = from;
    let (to_varying, to_length) = to;
    if !to_varying {
        return None;
    }
    let fits = match (from_length, to_length) {
        (_, None) => true,
        (Some(f), Some(t)) => f <= t,
        (None, Some(_)) => false,
    };
    match (fits, from_varying) {
        (false, _) => None,
        (true, true) => Some(1),
        (true, false) => Some(2),
    }
}

/// Widening distance from an argument type to a parameter type
///
/// `Some(0)` is an exact match; `None` means the argument does not coerce.
pub fn conversion_cost(from: &Type, to: &Type) -> Option<u32> {
    if from == to {
        return Some(0);
    }
    match (from, to) {
        (Type::Unknown, _) => Some(1),

        (Type::Decimal { .. }, Type::Decimal { precision, .. }) => match precision {
            None => Some(1),
            Some(_) => {
                let (fi, fs) = decimal_parts(from)?;
                let (ti, ts) = decimal_parts(to)?;
                (fi <= ti && fs <= ts).then_some(1)
            }
        },
        _ if from.is_integer() && matches!(to, Type::Decimal { precision: Some(_), .. }) => {
            let (fi, _) = decimal_parts(from)?;
            let (ti, _) = decimal_parts(to)?;
            let distance = numeric_rank(to)?.checked_sub(numeric_rank(from)?)?;
            (fi <= ti).then_some(distance)
        }
        _ if from.is_numeric() && to.is_numeric() => {
            let (f, t) = (numeric_rank(from)?, numeric_rank(to)?);
            t.checked_sub(f).filter(|distance| *distance > 0)
        }

        (
            Type::Character {
                varying: fv,
                length: fl,
            },
            Type::Character {
                varying: tv,
                length: tl,
            },
        )
        | (
            Type::Octet {
                varying: fv,
                length: fl,
            },
            Type::Octet {
                varying: tv,
                length: tl,
            },
        )
        | (
            Type::Bit {
                varying: fv,
                length: fl,
            },
            Type::Bit {
                varying: tv,
                length: tl,
            },
        ) => string_cost((*fv, *fl), (*tv, *tl)),

        (
            Type::TimeOfDay {
                with_time_zone: false,
            },
            Type::TimeOfDay {
                with_time_zone: true,
            },
        )
        | (
            Type::TimePoint {
                with_time_zone: false,
            },
            Type::TimePoint {
                with_time_zone: true,
            },
        ) => Some(1),
        (Type::Date, Type::TimePoint { with_time_zone }) => {
            Some(if *with_time_zone { 2 } else { 1 })
        }

        _ => None,
    }
}

/// Whether a value of type `from` may be stored into a column of type `to`
///
/// Narrowing within a type family is allowed; the write raises on loss.
pub fn is_assignable(from: &Type, to: &Type) -> bool {
    unify(from, to).is_some()
}
