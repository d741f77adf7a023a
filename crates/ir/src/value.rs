// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Values
//!
//! Immediate values carried by literals, placeholders and column defaults.
//! Exact numerics beyond `int8` are kept as [`BigDecimal`]; date/time values
//! use `chrono`.

use std::fmt;

use bigdecimal::BigDecimal;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// An immediate value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Boolean(bool),
    Int1(i8),
    Int2(i16),
    Int4(i32),
    Int8(i64),
    Float4(f32),
    Float8(f64),
    Decimal(BigDecimal),
    Character(String),
    Octet(Vec<u8>),
    Bit(Vec<bool>),
    Date(NaiveDate),
    TimeOfDay(NaiveTime),
    TimeOfDayWithZone {
        time: NaiveTime,
        #[serde(with = "offset_seconds")]
        offset: FixedOffset,
    },
    TimePoint(NaiveDateTime),
    TimePointWithZone(DateTime<FixedOffset>),
}

/// Zone offsets travel as seconds east of UTC
mod offset_seconds {
    use chrono::FixedOffset;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        offset: &FixedOffset,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_i32(offset.local_minus_utc())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<FixedOffset, D::Error> {
        let seconds = i32::deserialize(deserializer)?;
        FixedOffset::east_opt(seconds)
            .ok_or_else(|| D::Error::custom(format!("zone offset {seconds}s is out of range")))
    }
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The value as a signed integer, if it is an exact integral value
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int1(v) => Some(i64::from(*v)),
            Value::Int2(v) => Some(i64::from(*v)),
            Value::Int4(v) => Some(i64::from(*v)),
            Value::Int8(v) => Some(*v),
            Value::Decimal(d) if d.is_integer() => {
                let (digits, _) = d.with_scale(0).into_bigint_and_exponent();
                i64::try_from(digits).ok()
            }
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Boolean(v) => write!(f, "{}", if *v { "TRUE" } else { "FALSE" }),
            Value::Int1(v) => write!(f, "{v}"),
            Value::Int2(v) => write!(f, "{v}"),
            Value::Int4(v) => write!(f, "{v}"),
            Value::Int8(v) => write!(f, "{v}"),
            Value::Float4(v) => write!(f, "{v}"),
            Value::Float8(v) => write!(f, "{v}"),
            Value::Decimal(v) => write!(f, "{v}"),
            Value::Character(v) => write!(f, "'{}'", v.replace('\'', "''")),
            Value::Octet(bytes) => {
                f.write_str("X'")?;
                for b in bytes {
                    write!(f, "{b:02X}")?;
                }
                f.write_str("'")
            }
            Value::Bit(bits) => {
                f.write_str("B'")?;
                for b in bits {
                    f.write_str(if *b { "1" } else { "0" })?;
                }
                f.write_str("'")
            }
            Value::Date(v) => write!(f, "DATE '{v}'"),
            Value::TimeOfDay(v) => write!(f, "TIME '{v}'"),
            Value::TimeOfDayWithZone { time, offset } => {
                write!(f, "TIME WITH TIME ZONE '{time}{offset}'")
            }
            Value::TimePoint(v) => write!(f, "TIMESTAMP '{v}'"),
            Value::TimePointWithZone(v) => write!(f, "TIMESTAMP WITH TIME ZONE '{v}'"),
        }
    }
}
