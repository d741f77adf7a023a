// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! # Literal resolution
//!
//! Interprets literal token text into IR immediates.
//!
//! ## Exact numerics
//!
//! | Text           | Default type     | With `prefer_small_*` |
//! |----------------|------------------|-----------------------|
//! | `127`          | `int`            | `tinyint`             |
//! | `2147483648`   | `bigint`         | `bigint`              |
//! | `12.50`        | `decimal(*, *)`  | `decimal(4, 2)`       |
//!
//! Integers beyond `bigint` become decimals with scale 0. Anything needing
//! more digits than `max_decimal_precision` is rejected.
//!
//! ## Context
//!
//! `NULL` and `DEFAULT` take their type from a [`TypeContext`]. Other
//! literals keep their natural type unless `cast_literals_in_context` is set,
//! in which case they are wrapped in a raising cast to the context type.

use bigdecimal::BigDecimal;
use chrono::{FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use num_bigint::BigInt;
use relsql_ast::{Literal, TemporalKind, TruthValue};
use relsql_ir::scalar::LossPolicy;
use relsql_ir::{Scalar, Type, Value};

use crate::context::AnalyzerContext;
use crate::error::{AnalyzerResult, DiagnosticCode};

/// Target type of an expression position
#[derive(Debug, Clone, PartialEq)]
pub struct TypeContext {
    pub ty: Type,
    /// What `DEFAULT` evaluates to here; `None` where `DEFAULT` is not allowed
    pub default_value: Option<Value>,
}

impl TypeContext {
    pub fn new(ty: Type) -> Self {
        Self {
            ty,
            default_value: None,
        }
    }

    /// Builder method: allow `DEFAULT`, evaluating to `value`
    pub fn with_default(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }
}

/// Resolve a literal to an immediate and its type
pub fn resolve_literal(
    context: &mut AnalyzerContext,
    literal: &Literal,
    target: Option<&TypeContext>,
) -> AnalyzerResult<(Scalar, Type)> {
    let (value, ty) = match literal {
        Literal::Null => return null(context, target),
        Literal::Default => return default(context, target),
        Literal::Boolean(truth) => match truth {
            TruthValue::True => (Value::Boolean(true), Type::Boolean),
            TruthValue::False => (Value::Boolean(false), Type::Boolean),
            TruthValue::Unknown => (Value::Null, Type::Boolean),
        },
        Literal::ExactNumeric { negative, digits } => exact_numeric(context, *negative, digits)?,
        Literal::ApproximateNumeric { negative, text } => {
            approximate_numeric(context, *negative, text)?
        }
        Literal::CharacterString(tokens) => {
            let text = character_string(context, tokens)?;
            (Value::Character(text), Type::FLEXIBLE_VARCHAR)
        }
        Literal::BitString(tokens) => {
            let bits = bit_string(context, tokens)?;
            let ty = Type::Bit {
                varying: true,
                length: None,
            };
            (Value::Bit(bits), ty)
        }
        Literal::OctetString(tokens) => {
            let bytes = octet_string(context, tokens)?;
            let ty = Type::Octet {
                varying: true,
                length: None,
            };
            (Value::Octet(bytes), ty)
        }
        Literal::Temporal { kind, value } => temporal(context, *kind, value)?,
    };

    let immediate = Scalar::immediate(value, ty.clone());
    match target {
        Some(target) if target.ty != ty && context.options().cast_literals_in_context => Ok((
            Scalar::Cast {
                operand: Box::new(immediate),
                target: target.ty.clone(),
                loss_policy: LossPolicy::Error,
            },
            target.ty.clone(),
        )),
        _ => Ok((immediate, ty)),
    }
}

fn null(
    context: &mut AnalyzerContext,
    target: Option<&TypeContext>,
) -> AnalyzerResult<(Scalar, Type)> {
    match target {
        Some(target) => Ok((
            Scalar::immediate(Value::Null, target.ty.clone()),
            target.ty.clone(),
        )),
        None if context.options().allow_context_independent_null => {
            Ok((Scalar::immediate(Value::Null, Type::Unknown), Type::Unknown))
        }
        None => Err(context.report(
            DiagnosticCode::MissingContextOfNull,
            None,
            "cannot infer the type of NULL here",
        )),
    }
}

fn default(
    context: &mut AnalyzerContext,
    target: Option<&TypeContext>,
) -> AnalyzerResult<(Scalar, Type)> {
    match target {
        Some(TypeContext {
            ty,
            default_value: Some(value),
        }) => Ok((Scalar::immediate(value.clone(), ty.clone()), ty.clone())),
        _ => Err(context.report(
            DiagnosticCode::MissingContextOfDefaultValue,
            None,
            "DEFAULT is not allowed here",
        )),
    }
}

/// Number of decimal digits in the magnitude of `value`
fn digit_count(value: &BigInt) -> u32 {
    let digits = value.magnitude().to_string().len();
    u32::try_from(digits).unwrap_or(u32::MAX)
}

fn smallest_integer(value: i64, prefer_small: bool) -> (Value, Type) {
    if prefer_small {
        if let Ok(v) = i8::try_from(value) {
            return (Value::Int1(v), Type::Int1);
        }
        if let Ok(v) = i16::try_from(value) {
            return (Value::Int2(v), Type::Int2);
        }
    }
    match i32::try_from(value) {
        Ok(v) => (Value::Int4(v), Type::Int4),
        Err(_) => (Value::Int8(value), Type::Int8),
    }
}

fn exact_numeric(
    context: &mut AnalyzerContext,
    negative: bool,
    text: &str,
) -> AnalyzerResult<(Value, Type)> {
    let (integral, fraction) = match text.split_once('.') {
        Some((integral, fraction)) => (integral, Some(fraction)),
        None => (text, None),
    };
    let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if (integral.is_empty() && fraction.is_none_or(str::is_empty))
        || !all_digits(integral)
        || !fraction.is_none_or(all_digits)
    {
        return Err(context.report(
            DiagnosticCode::MalformedSyntax,
            None,
            format!("invalid numeric literal '{text}'"),
        ));
    }

    let fraction = fraction.unwrap_or("");
    let mut unscaled_text = format!("{integral}{fraction}");
    if unscaled_text.is_empty() {
        unscaled_text.push('0');
    }
    let mut unscaled: BigInt = match unscaled_text.parse() {
        Ok(value) => value,
        Err(_) => {
            return Err(context.report(
                DiagnosticCode::MalformedSyntax,
                None,
                format!("invalid numeric literal '{text}'"),
            ));
        }
    };
    if negative {
        unscaled = -unscaled;
    }
    let scale = u32::try_from(fraction.len()).unwrap_or(u32::MAX);

    let max = context.options().max_decimal_precision;
    let precision = digit_count(&unscaled).max(scale).max(1);
    if precision > max {
        let sign = if negative { "-" } else { "" };
        return Err(context.report(
            DiagnosticCode::UnsupportedDecimalValue,
            None,
            format!("numeric literal '{sign}{text}' exceeds the maximum precision {max}"),
        ));
    }

    if scale == 0 {
        if let Ok(value) = i64::try_from(&unscaled) {
            return Ok(smallest_integer(
                value,
                context.options().prefer_small_integer_literals,
            ));
        }
    }

    let ty = if context.options().prefer_small_decimal_literals {
        Type::decimal(precision, scale)
    } else {
        Type::FLEXIBLE_DECIMAL
    };
    let value = BigDecimal::new(unscaled, i64::from(scale));
    Ok((Value::Decimal(value), ty))
}

fn approximate_numeric(
    context: &mut AnalyzerContext,
    negative: bool,
    text: &str,
) -> AnalyzerResult<(Value, Type)> {
    match text.parse::<f64>() {
        Ok(value) if value.is_finite() => {
            let value = if negative { -value } else { value };
            Ok((Value::Float8(value), Type::Float8))
        }
        _ => Err(context.report(
            DiagnosticCode::UnsupportedApproximateNumberValue,
            None,
            format!("approximate numeric literal '{text}' is out of range"),
        )),
    }
}

/// The body of a quoted token, with doubled quotes collapsed
fn unquote(token: &str, prefixes: &[char]) -> Option<String> {
    let token = token.strip_prefix(prefixes).unwrap_or(token);
    let body = token.strip_prefix('\'')?.strip_suffix('\'')?;
    Some(body.replace("''", "'"))
}

fn character_string(context: &mut AnalyzerContext, tokens: &[String]) -> AnalyzerResult<String> {
    let mut text = String::new();
    for token in tokens {
        match unquote(token, &[]) {
            Some(body) => text.push_str(&body),
            None => {
                return Err(context.report(
                    DiagnosticCode::MalformedSyntax,
                    None,
                    format!("malformed string literal {token}"),
                ));
            }
        }
    }
    Ok(text)
}

fn bit_string(context: &mut AnalyzerContext, tokens: &[String]) -> AnalyzerResult<Vec<bool>> {
    let mut bits = Vec::new();
    for token in tokens {
        let body = unquote(token, &['B', 'b']).unwrap_or_default();
        for c in body.chars() {
            match c {
                '0' => bits.push(false),
                '1' => bits.push(true),
                _ => {
                    return Err(context.report(
                        DiagnosticCode::UnsupportedStringValue,
                        None,
                        format!("invalid bit string {token}"),
                    ));
                }
            }
        }
    }
    Ok(bits)
}

fn octet_string(context: &mut AnalyzerContext, tokens: &[String]) -> AnalyzerResult<Vec<u8>> {
    let mut digits = String::new();
    for token in tokens {
        digits.push_str(&unquote(token, &['X', 'x']).unwrap_or_default());
    }
    let invalid = |context: &mut AnalyzerContext| {
        context.report(
            DiagnosticCode::UnsupportedStringValue,
            None,
            format!("invalid octet string '{digits}'"),
        )
    };
    if digits.len() % 2 != 0 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid(context));
    }
    let mut bytes = Vec::with_capacity(digits.len() / 2);
    for pair in digits.as_bytes().chunks(2) {
        let text = std::str::from_utf8(pair).unwrap_or("");
        match u8::from_str_radix(text, 16) {
            Ok(byte) => bytes.push(byte),
            Err(_) => return Err(invalid(context)),
        }
    }
    Ok(bytes)
}

/// Parse `Z`, `+hh`, `+hh:mm` or `+hhmm`
fn parse_zone(text: &str) -> Option<FixedOffset> {
    if text.eq_ignore_ascii_case("z") {
        return FixedOffset::east_opt(0);
    }
    let (sign, rest) = match text.split_at_checked(1)? {
        ("+", rest) => (1, rest),
        ("-", rest) => (-1, rest),
        _ => return None,
    };
    let (hours, minutes) = match rest.split_once(':') {
        Some((h, m)) => (h, m),
        None if rest.len() == 4 => rest.split_at(2),
        None => (rest, "0"),
    };
    if hours.is_empty() || hours.len() > 2 || minutes.len() > 2 {
        return None;
    }
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// Split a time text into the time part and an optional zone suffix
fn split_zone(text: &str) -> (&str, Option<&str>) {
    let text = text.trim();
    if let Some(body) = text.strip_suffix(['Z', 'z']) {
        return (body.trim_end(), Some(&text[body.len()..]));
    }
    match text.rfind(['+', '-']) {
        Some(position) => (text[..position].trim_end(), Some(&text[position..])),
        None => (text, None),
    }
}

fn parse_time(text: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(text, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M"))
        .ok()
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").ok()
}

/// Time of day and an optional zone; `None` on malformed input
fn parse_time_with_zone(text: &str) -> Option<(NaiveTime, Option<FixedOffset>)> {
    let (time, zone) = split_zone(text);
    let time = parse_time(time)?;
    match zone {
        Some(zone) => Some((time, Some(parse_zone(zone)?))),
        None => Some((time, None)),
    }
}

fn parse_timestamp(text: &str) -> Option<(NaiveDateTime, Option<FixedOffset>)> {
    let text = text.trim();
    let (date, time) = match text.split_once(['T', ' ']) {
        Some((date, time)) => (date, Some(time)),
        None => (text, None),
    };
    let date = parse_date(date)?;
    match time {
        Some(time) => {
            let (time, zone) = parse_time_with_zone(time)?;
            Some((date.and_time(time), zone))
        }
        None => Some((date.and_time(NaiveTime::MIN), None)),
    }
}

fn temporal(
    context: &mut AnalyzerContext,
    kind: TemporalKind,
    token: &str,
) -> AnalyzerResult<(Value, Type)> {
    let text = unquote(token, &[]).unwrap_or_default();
    let system_zone = FixedOffset::east_opt(context.options().system_zone_offset * 60);

    let resolved = match kind {
        TemporalKind::Date => parse_date(&text).map(|date| (Value::Date(date), Type::Date)),
        TemporalKind::Time { with_time_zone } => {
            parse_time_with_zone(&text).and_then(|(time, zone)| {
                let ty = Type::TimeOfDay { with_time_zone };
                match (with_time_zone, zone) {
                    (false, None) => Some((Value::TimeOfDay(time), ty)),
                    (false, Some(_)) => None,
                    (true, zone) => {
                        let offset = zone.or(system_zone)?;
                        Some((Value::TimeOfDayWithZone { time, offset }, ty))
                    }
                }
            })
        }
        TemporalKind::Timestamp { with_time_zone } => {
            parse_timestamp(&text).and_then(|(point, zone)| {
                let ty = Type::TimePoint { with_time_zone };
                match (with_time_zone, zone) {
                    (false, None) => Some((Value::TimePoint(point), ty)),
                    (false, Some(_)) => None,
                    (true, zone) => {
                        let offset = zone.or(system_zone)?;
                        let point = point.and_local_timezone(offset).single()?;
                        Some((Value::TimePointWithZone(point), ty))
                    }
                }
            })
        }
    };

    resolved.ok_or_else(|| {
        context.report(
            DiagnosticCode::UnsupportedStringValue,
            None,
            format!("invalid date/time literal {token}"),
        )
    })
}
