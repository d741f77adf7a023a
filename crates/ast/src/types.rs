// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Type nodes
//!
//! Data types as they appear in CAST targets and column definitions.

use serde::{Deserialize, Serialize};

use crate::name::Name;

/// A length, precision or scale argument of a type.
///
/// `Flexible` is the `*` sentinel, e.g. `VARCHAR(*)` or `DECIMAL(*, *)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Length {
    Value(u32),
    Flexible,
}

/// A SQL data type node
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Boolean,
    TinyInt,
    SmallInt,
    Int,
    BigInt,
    Real,
    Float,
    DoublePrecision,

    /// `DECIMAL[(p[, s])]` / `NUMERIC[(p[, s])]`
    Decimal {
        precision: Option<Length>,
        scale: Option<Length>,
    },

    /// `CHAR[(n)]` / `VARCHAR[(n)]`
    Character { varying: bool, length: Option<Length> },

    /// `BINARY[(n)]` / `VARBINARY[(n)]`
    Octet { varying: bool, length: Option<Length> },

    /// `BIT[(n)]` / `BIT VARYING[(n)]`
    Bit { varying: bool, length: Option<Length> },

    Date,
    Time { with_time_zone: bool },
    Timestamp { with_time_zone: bool },

    /// A named type the grammar accepted but the core does not model
    UserDefined(Name),
}

impl DataType {
    pub fn varchar(length: u32) -> Self {
        DataType::Character {
            varying: true,
            length: Some(Length::Value(length)),
        }
    }

    pub fn decimal(precision: u32, scale: u32) -> Self {
        DataType::Decimal {
            precision: Some(Length::Value(precision)),
            scale: Some(Length::Value(scale)),
        }
    }
}
