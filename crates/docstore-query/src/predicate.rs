//! Parameterized predicate fragments built from filter objects.
//!
//! A filter object maps JSON field paths to the values they must equal, e.g.
//! `{"address.city": "Paris", "age": 30}`. Keys become identifiers in
//! statement text and are validated; values are always bound parameters.

use docstore_common::error::{StoreError, StoreResult};
use docstore_common::validate::{is_nested_variable_name_like, is_valid_query_object};
use docstore_common::{FieldPath, Ident, Value};
use serde_json::Value as JsonValue;

use crate::transform::combine;

/// A SQL fragment with its positional parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fragment {
    /// SQL text with `?` placeholders.
    pub sql: String,
    /// Parameters in placeholder order.
    pub params: Vec<Value>,
}

impl Fragment {
    /// Creates an empty fragment.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns true if the fragment has no SQL text.
    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }

    /// Appends `<lhs> = ?` joined by `AND`.
    pub fn push_eq(&mut self, lhs: &str, value: Value) {
        let predicate = format!("{lhs} = ?");
        self.sql = combine(&self.sql, &predicate);
        self.params.push(value);
    }

    /// AND-combines two fragments; parameters keep placeholder order.
    #[must_use]
    pub fn and(mut self, other: Fragment) -> Fragment {
        self.sql = combine(&self.sql, &other.sql);
        self.params.extend(other.params);
        self
    }
}

/// Returns `JSON_UNQUOTE(JSON_EXTRACT(<json_col>, '$.<path>'))`.
pub fn json_extract(json_col: &Ident, path: &FieldPath) -> String {
    format!(
        "JSON_UNQUOTE(JSON_EXTRACT({json_col}, {}))",
        path.json_path_literal()
    )
}

/// Validates a filter object and returns its fields in key order.
///
/// Rejects anything but a non-empty object with `please provide valid
/// queryObject`, then stops at the first key that is not a field path.
pub fn validate_filter(filter: &JsonValue) -> StoreResult<Vec<(FieldPath, &JsonValue)>> {
    let map = match filter.as_object() {
        Some(map) if is_valid_query_object(filter) => map,
        _ => return Err(StoreError::invalid_argument("queryObject")),
    };

    map.iter()
        .map(|(key, value)| {
            if !is_nested_variable_name_like(key) {
                return Err(StoreError::invalid_field_name(key));
            }
            let path = FieldPath::parse(key).map_err(|_| StoreError::invalid_field_name(key))?;
            Ok((path, value))
        })
        .collect()
}

/// Builds one JSON-extraction equality per filter key, ANDed together.
pub fn scan_predicates(json_col: &Ident, filter: &JsonValue) -> StoreResult<Fragment> {
    let mut fragment = Fragment::empty();
    for (path, value) in validate_filter(filter)? {
        fragment.push_eq(&json_extract(json_col, &path), Value::from_json_filter(value));
    }
    Ok(fragment)
}

/// A filter split between indexed generated columns and JSON scans.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SplitFilter {
    /// Predicates over generated columns that carry an index.
    pub indexed: Fragment,
    /// Predicates evaluated by JSON extraction.
    pub scan: Fragment,
}

impl SplitFilter {
    /// Routes each filter field to the indexed or the scan fragment.
    ///
    /// `is_indexed` is asked about the hashed column name of each field.
    pub fn plan(
        json_col: &Ident,
        filter: &JsonValue,
        is_indexed: impl Fn(&Ident) -> bool,
    ) -> StoreResult<Self> {
        let mut split = Self::default();
        for (path, value) in validate_filter(filter)? {
            let column = path.hashed_column();
            let param = Value::from_json_filter(value);
            if is_indexed(&column) {
                split.indexed.push_eq(&column.to_string(), param);
            } else {
                split.scan.push_eq(&json_extract(json_col, &path), param);
            }
        }
        Ok(split)
    }

    /// Returns the combined `WHERE` fragment, indexed predicates first.
    pub fn into_where(self) -> Fragment {
        self.indexed.and(self.scan)
    }
}
