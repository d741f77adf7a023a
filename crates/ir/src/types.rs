// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # IR types
//!
//! The closed set of value types scalar expressions and columns can have.
//! Lengths, precisions and scales are `None` when flexible (`*`).

use std::fmt;

use serde::{Deserialize, Serialize};

/// An IR data type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    /// Type of a context-independent NULL
    Unknown,
    Boolean,
    Int1,
    Int2,
    Int4,
    Int8,
    Float4,
    Float8,
    Decimal {
        precision: Option<u32>,
        scale: Option<u32>,
    },
    Character {
        varying: bool,
        length: Option<u32>,
    },
    Octet {
        varying: bool,
        length: Option<u32>,
    },
    Bit {
        varying: bool,
        length: Option<u32>,
    },
    Date,
    TimeOfDay {
        with_time_zone: bool,
    },
    TimePoint {
        with_time_zone: bool,
    },
    /// Row type returned by table-valued functions
    Table(Vec<RowField>),
}

/// A named field of a [`Type::Table`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RowField {
    pub name: String,
    pub ty: Type,
}

impl RowField {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

impl Type {
    /// `decimal(*, *)`
    pub const FLEXIBLE_DECIMAL: Type = Type::Decimal {
        precision: None,
        scale: None,
    };

    /// `varchar(*)`
    pub const FLEXIBLE_VARCHAR: Type = Type::Character {
        varying: true,
        length: None,
    };

    pub fn decimal(precision: u32, scale: u32) -> Self {
        Type::Decimal {
            precision: Some(precision),
            scale: Some(scale),
        }
    }

    pub fn varchar(length: u32) -> Self {
        Type::Character {
            varying: true,
            length: Some(length),
        }
    }

    pub fn char(length: u32) -> Self {
        Type::Character {
            varying: false,
            length: Some(length),
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Type::Int1 | Type::Int2 | Type::Int4 | Type::Int8)
    }

    pub fn is_exact_numeric(&self) -> bool {
        self.is_integer() || matches!(self, Type::Decimal { .. })
    }

    pub fn is_approximate_numeric(&self) -> bool {
        matches!(self, Type::Float4 | Type::Float8)
    }

    pub fn is_numeric(&self) -> bool {
        self.is_exact_numeric() || self.is_approximate_numeric()
    }

    pub fn is_character(&self) -> bool {
        matches!(self, Type::Character { .. })
    }

    /// Boolean, or an untyped NULL usable where a boolean is expected
    pub fn is_boolean_like(&self) -> bool {
        matches!(self, Type::Boolean | Type::Unknown)
    }

    pub fn is_table(&self) -> bool {
        matches!(self, Type::Table(_))
    }
}

fn write_length(f: &mut fmt::Formatter<'_>, length: Option<u32>) -> fmt::Result {
    match length {
        Some(n) => write!(f, "({n})"),
        None => f.write_str("(*)"),
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Unknown => f.write_str("unknown"),
            Type::Boolean => f.write_str("boolean"),
            Type::Int1 => f.write_str("tinyint"),
            Type::Int2 => f.write_str("smallint"),
            Type::Int4 => f.write_str("int"),
            Type::Int8 => f.write_str("bigint"),
            Type::Float4 => f.write_str("real"),
            Type::Float8 => f.write_str("double precision"),
            Type::Decimal { precision, scale } => {
                let p = precision.map_or_else(|| "*".to_string(), |p| p.to_string());
                let s = scale.map_or_else(|| "*".to_string(), |s| s.to_string());
                write!(f, "decimal({p}, {s})")
            }
            Type::Character { varying, length } => {
                f.write_str(if *varying { "varchar" } else { "char" })?;
                write_length(f, *length)
            }
            Type::Octet { varying, length } => {
                f.write_str(if *varying { "varbinary" } else { "binary" })?;
                write_length(f, *length)
            }
            Type::Bit { varying, length } => {
                f.write_str(if *varying { "bit varying" } else { "bit" })?;
                write_length(f, *length)
            }
            Type::Date => f.write_str("date"),
            Type::TimeOfDay { with_time_zone } => {
                f.write_str(if *with_time_zone {
                    "time with time zone"
                } else {
                    "time"
                })
            }
            Type::TimePoint { with_time_zone } => f.write_str(if *with_time_zone {
                "timestamp with time zone"
            } else {
                "timestamp"
            }),
            Type::Table(fields) => {
                f.write_str("table(")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{} {}", field.name, field.ty)?;
                }
                f.write_str(")")
            }
        }
    }
}
