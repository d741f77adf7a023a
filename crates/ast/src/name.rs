// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Names
//!
//! Identifiers and qualified names as written in the source text.
//!
//! A [`Name`] is a chain of one or more [`Identifier`] segments in source
//! order, so `cat.sch.t.c` has four segments with `c` last:
//!
//! ```sql
//! -- one segment
//! c
//! -- relation-qualified
//! t.c
//! -- fully qualified
//! cat.sch.t.c
//! ```
//!
//! Identifiers remember whether they were delimited (quoted). Case folding
//! is the analyzer's business; the AST keeps the text verbatim.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A byte range in the source text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub begin: usize,
    pub end: usize,
}

impl Span {
    pub fn new(begin: usize, end: usize) -> Self {
        Self { begin, end }
    }

    /// Smallest span covering both `self` and `other`.
    pub fn merge(self, other: Span) -> Span {
        if self == Span::default() {
            return other;
        }
        if other == Span::default() {
            return self;
        }
        Span {
            begin: self.begin.min(other.begin),
            end: self.end.max(other.end),
        }
    }
}

/// A single identifier token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identifier {
    /// Identifier body, without surrounding quotes
    pub text: String,
    /// Whether the identifier was written in double quotes
    pub delimited: bool,
    #[serde(default)]
    pub span: Span,
}

impl Identifier {
    /// Create a regular (unquoted) identifier
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            delimited: false,
            span: Span::default(),
        }
    }

    /// Create a delimited (quoted) identifier
    pub fn delimited(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            delimited: true,
            span: Span::default(),
        }
    }

    /// Builder method: set the source span
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.delimited {
            write!(f, "\"{}\"", self.text.replace('"', "\"\""))
        } else {
            f.write_str(&self.text)
        }
    }
}

/// A possibly qualified name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Name {
    /// Segments in source order; never empty when produced by the parser
    pub segments: Vec<Identifier>,
}

impl Name {
    /// Create a single-segment name
    pub fn simple(text: impl Into<String>) -> Self {
        Self {
            segments: vec![Identifier::new(text)],
        }
    }

    /// Create a name from dot-separated regular identifiers, e.g. `"s.t"`
    pub fn qualified(path: &str) -> Self {
        Self {
            segments: path.split('.').map(Identifier::new).collect(),
        }
    }

    pub fn from_segments(segments: Vec<Identifier>) -> Self {
        Self { segments }
    }

    /// The last (least significant) segment
    pub fn last(&self) -> Option<&Identifier> {
        self.segments.last()
    }

    /// Everything except the last segment
    pub fn qualifier(&self) -> &[Identifier] {
        match self.segments.split_last() {
            Some((_, rest)) => rest,
            None => &[],
        }
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn span(&self) -> Span {
        self.segments
            .iter()
            .fold(Span::default(), |acc, s| acc.merge(s.span))
    }
}

impl From<Identifier> for Name {
    fn from(identifier: Identifier) -> Self {
        Self {
            segments: vec![identifier],
        }
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qualified_name_segments() {
        let name = Name::qualified("sch.t.c");
        assert_eq!(name.len(), 3);
        assert_eq!(name.last().map(|i| i.text.as_str()), Some("c"));
        assert_eq!(name.qualifier().len(), 2);
        assert_eq!(name.to_string(), "sch.t.c");
    }

    #[test]
    fn test_delimited_identifier_display() {
        let id = Identifier::delimited("My\"Col");
        assert_eq!(id.to_string(), "\"My\"\"Col\"");
        assert!(!Identifier::new("x").delimited);
    }

    #[test]
    fn test_span_merge() {
        let a = Identifier::new("a").with_span(Span::new(0, 1));
        let b = Identifier::new("b").with_span(Span::new(2, 3));
        let name = Name::from_segments(vec![a, b]);
        assert_eq!(name.span(), Span::new(0, 3));
        assert_eq!(Name::simple("x").span(), Span::default());
    }
}
