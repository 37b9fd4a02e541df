//! Column types accepted for generated index columns.
//!
//! The type is interpolated into DDL, so it is checked against a closed
//! grammar: a known base type, an optional argument list whose shape depends
//! on the base type, and an optional `UNSIGNED` for integer and decimal types.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{StoreError, StoreResult};

/// How many parenthesized arguments a base type accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Arity {
    /// No argument list.
    None,
    /// An optional single argument (display width, fractional seconds).
    Optional,
    /// A required single argument (length).
    Length,
    /// An optional precision with an optional scale.
    PrecisionScale,
}

const BASE_TYPES: &[(&str, Arity, bool)] = &[
    ("TINYINT", Arity::Optional, true),
    ("SMALLINT", Arity::Optional, true),
    ("MEDIUMINT", Arity::Optional, true),
    ("INT", Arity::Optional, true),
    ("INTEGER", Arity::Optional, true),
    ("BIGINT", Arity::Optional, true),
    ("DECIMAL", Arity::PrecisionScale, true),
    ("FLOAT", Arity::None, false),
    ("DOUBLE", Arity::None, false),
    ("BOOLEAN", Arity::None, false),
    ("BOOL", Arity::None, false),
    ("CHAR", Arity::Length, false),
    ("VARCHAR", Arity::Length, false),
    ("BINARY", Arity::Length, false),
    ("VARBINARY", Arity::Length, false),
    ("DATE", Arity::None, false),
    ("YEAR", Arity::None, false),
    ("TIME", Arity::Optional, false),
    ("DATETIME", Arity::Optional, false),
    ("TIMESTAMP", Arity::Optional, false),
];

fn column_type_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([A-Z]+)(?:\((\d{1,5})(?:,(\d{1,2}))?\))?(?: (UNSIGNED))?$")
            .expect("valid column type regex")
    })
}

/// A validated, normalized column type such as `VARCHAR(255)`.
///
/// # Example
///
/// ```rust
/// use docstore_common::ColumnType;
///
/// let ty = ColumnType::parse("varchar( 255 )").unwrap();
/// assert_eq!(ty.as_str(), "VARCHAR(255)");
/// assert!(ColumnType::parse("INT; DROP TABLE users").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnType(String);

impl ColumnType {
    /// Parses and normalizes a column type, reporting failures against
    /// `dataType`.
    pub fn parse(text: &str) -> StoreResult<Self> {
        let invalid = || StoreError::invalid_argument("dataType");

        let normalized = normalize(text);
        let caps = column_type_regex()
            .captures(&normalized)
            .ok_or_else(invalid)?;

        let base = caps.get(1).map_or("", |m| m.as_str());
        let (_, arity, allows_unsigned) = BASE_TYPES
            .iter()
            .find(|(name, _, _)| *name == base)
            .ok_or_else(invalid)?;

        let first = caps.get(2).is_some();
        let second = caps.get(3).is_some();
        let unsigned = caps.get(4).is_some();

        let args_ok = match arity {
            Arity::None => !first,
            Arity::Optional => !second,
            Arity::Length => first && !second,
            Arity::PrecisionScale => true,
        };
        if !args_ok || (unsigned && !allows_unsigned) {
            return Err(invalid());
        }

        Ok(Self(normalized))
    }

    /// Returns the normalized type text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Uppercases, drops whitespace inside parentheses and collapses the rest.
fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut depth = 0usize;
    let mut pending_space = false;
    for c in text.trim().chars() {
        match c {
            '(' => {
                depth += 1;
                pending_space = false;
                out.push(c);
            }
            ')' => {
                depth = depth.saturating_sub(1);
                out.push(c);
            }
            c if c.is_whitespace() => {
                if depth == 0 {
                    pending_space = true;
                }
            }
            c => {
                if pending_space {
                    out.push(' ');
                    pending_space = false;
                }
                out.push(c.to_ascii_uppercase());
            }
        }
    }
    out
}
