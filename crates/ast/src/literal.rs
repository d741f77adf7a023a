// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Literals
//!
//! Literal nodes keep the token text exactly as the parser saw it. String
//! tokens still carry their surrounding single quotes and any doubled quote
//! characters; numeric tokens keep every digit. Interpreting the text is the
//! literal resolver's job.
//!
//! ```sql
//! 'it''s'            -- CharacterString(["'it''s'"])
//! 'abc' 'def'        -- CharacterString(["'abc'", "'def'"])
//! -12.50             -- ExactNumeric { negative: true, digits: "12.50" }
//! 1.5E3              -- ApproximateNumeric { negative: false, text: "1.5E3" }
//! DATE '2024-01-31'  -- Temporal { kind: Date, value: "'2024-01-31'" }
//! ```

use serde::{Deserialize, Serialize};

/// Truth values of a boolean literal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TruthValue {
    True,
    False,
    Unknown,
}

/// The kind of a date/time literal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TemporalKind {
    Date,
    Time { with_time_zone: bool },
    Timestamp { with_time_zone: bool },
}

/// A literal value node
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Literal {
    Boolean(TruthValue),

    /// Exact numeric token, digits with an optional decimal point
    ExactNumeric { negative: bool, digits: String },

    /// Approximate numeric token with an exponent part
    ApproximateNumeric { negative: bool, text: String },

    /// One or more adjacent quoted tokens
    CharacterString(Vec<String>),

    /// `B'0101'` tokens, each still quoted
    BitString(Vec<String>),

    /// `X'0A1B'` tokens, each still quoted
    OctetString(Vec<String>),

    Temporal { kind: TemporalKind, value: String },

    Null,

    /// The `DEFAULT` keyword in a value position
    Default,
}

impl Literal {
    /// Exact numeric literal from its source text, e.g. `"-1.50"`
    pub fn exact(text: &str) -> Self {
        let (negative, digits) = split_sign(text);
        Literal::ExactNumeric {
            negative,
            digits: digits.to_string(),
        }
    }

    /// Approximate numeric literal from its source text, e.g. `"1e3"`
    pub fn approximate(text: &str) -> Self {
        let (negative, rest) = split_sign(text);
        Literal::ApproximateNumeric {
            negative,
            text: rest.to_string(),
        }
    }

    /// Character string literal from its unquoted body
    pub fn string(body: &str) -> Self {
        Literal::CharacterString(vec![format!("'{}'", body.replace('\'', "''"))])
    }

    pub fn date(value: &str) -> Self {
        Literal::Temporal {
            kind: TemporalKind::Date,
            value: format!("'{value}'"),
        }
    }

    pub fn timestamp(value: &str, with_time_zone: bool) -> Self {
        Literal::Temporal {
            kind: TemporalKind::Timestamp { with_time_zone },
            value: format!("'{value}'"),
        }
    }
}

fn split_sign(text: &str) -> (bool, &str) {
    if let Some(rest) = text.strip_prefix('-') {
        (true, rest)
    } else if let Some(rest) = text.strip_prefix('+') {
        (false, rest)
    } else {
        (false, text)
    }
}
