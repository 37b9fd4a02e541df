//! Validated identifiers that render as quoted SQL.
//!
//! Construction is the validation step: once an `Ident`, `TableName` or
//! `FieldPath` exists, interpolating it into statement text is safe.

use std::fmt;

use crate::error::{StoreError, StoreResult};
use crate::hash::hash_field;
use crate::validate::{is_nested_variable_name_like, is_plain_identifier};

/// A single validated identifier (table, column, index or database name).
///
/// # Example
///
/// ```rust
/// use docstore_common::Ident;
///
/// let col = Ident::new("doc", "jsonCol").unwrap();
/// assert_eq!(col.to_string(), "`doc`");
/// assert!(Ident::new("doc`; DROP", "jsonCol").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ident(String);

impl Ident {
    /// Validates `name`; on failure reports `please provide valid <argument>`.
    pub fn new(name: &str, argument: &str) -> StoreResult<Self> {
        if is_plain_identifier(name) {
            Ok(Self(name.to_string()))
        } else {
            Err(StoreError::invalid_argument(argument))
        }
    }

    /// Returns the raw, unquoted name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}`", self.0)
    }
}

/// A table reference: `table` or `database.table`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableName {
    database: Option<Ident>,
    table: Ident,
    raw: String,
}

impl TableName {
    /// Parses a table reference, reporting failures against `table`.
    pub fn parse(name: &str) -> StoreResult<Self> {
        Self::parse_as(name, "table")
    }

    /// Parses a table reference, reporting failures against `argument`.
    pub fn parse_as(name: &str, argument: &str) -> StoreResult<Self> {
        let (database, table) = match name.split_once('.') {
            Some((db, table)) => (Some(Ident::new(db, argument)?), Ident::new(table, argument)?),
            None => (None, Ident::new(name, argument)?),
        };
        Ok(Self {
            database,
            table,
            raw: name.to_string(),
        })
    }

    /// Parses a reference that must carry its database (`database.table`).
    pub fn parse_qualified(name: &str, argument: &str) -> StoreResult<Self> {
        let parsed = Self::parse_as(name, argument)?;
        if parsed.database.is_none() {
            return Err(StoreError::invalid_argument(argument));
        }
        Ok(parsed)
    }

    /// Returns the database part, if the reference is qualified.
    #[must_use]
    pub fn database(&self) -> Option<&Ident> {
        self.database.as_ref()
    }

    /// Returns the table part.
    #[must_use]
    pub fn table(&self) -> &Ident {
        &self.table
    }

    /// Returns the reference as the caller wrote it.
    ///
    /// This is the form recorded in the field-hash catalog.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.database {
            Some(db) => write!(f, "{db}.{}", self.table),
            None => write!(f, "{}", self.table),
        }
    }
}

/// A dotted JSON field path such as `address.city`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldPath(String);

impl FieldPath {
    /// Validates a field path, reporting failures against `fieldPath`.
    pub fn parse(path: &str) -> StoreResult<Self> {
        if is_nested_variable_name_like(path) {
            Ok(Self(path.to_string()))
        } else {
            Err(StoreError::invalid_argument("fieldPath"))
        }
    }

    /// Returns the dotted path.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the JSON path expression, `$.<path>`.
    #[must_use]
    pub fn json_path(&self) -> String {
        format!("$.{}", self.0)
    }

    /// Returns the quoted JSON path literal for statement text.
    ///
    /// Path segments are variable-name-like, so no escaping is needed.
    #[must_use]
    pub fn json_path_literal(&self) -> String {
        format!("'$.{}'", self.0)
    }

    /// Returns the generated-column name for this path.
    #[must_use]
    pub fn hashed_column(&self) -> Ident {
        Ident(hash_field(&self.0))
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
