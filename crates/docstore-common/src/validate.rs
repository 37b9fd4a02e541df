//! Identifier and value validation.
//!
//! Identifiers cannot be bound as statement parameters, so these checks are
//! the only thing standing between caller input and generated SQL text. The
//! safe identifier types in [`crate::types`] are built on top of them.

use serde_json::Value as JsonValue;

use crate::constants::{MAX_IDENTIFIER_LEN, MAX_PRIMARY_KEY_LEN};

/// Returns true if `name` is shorter than the engine identifier limit.
#[must_use]
pub fn is_valid_identifier(name: &str) -> bool {
    name.chars().count() < MAX_IDENTIFIER_LEN
}

/// Returns true if `name` is non-empty, within the length limit, and made
/// only of `[A-Za-z0-9_$]`.
///
/// This is the character class accepted unquoted by the engine, which rules
/// out statement terminators, quotes and comment syntax.
#[must_use]
pub fn is_plain_identifier(name: &str) -> bool {
    !name.is_empty()
        && is_valid_identifier(name)
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Returns true if `key` can be stored in the primary-key column.
#[must_use]
pub fn is_valid_primary_key(key: &str) -> bool {
    key.chars().count() <= MAX_PRIMARY_KEY_LEN
}

/// Returns true if `name` matches `^[A-Za-z_]\w*$`.
#[must_use]
pub fn is_variable_name_like(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Returns true if every dot-separated segment of `name` is variable-name-like.
///
/// Used for JSON field paths such as `address.city`.
#[must_use]
pub fn is_nested_variable_name_like(name: &str) -> bool {
    name.split('.').all(is_variable_name_like)
}

/// Returns true if `name` has the `database.table` form with two plain
/// identifiers and nothing else.
#[must_use]
pub fn is_db_dot_table(name: &str) -> bool {
    match name.split_once('.') {
        Some((db, table)) => is_plain_identifier(db) && is_plain_identifier(table),
        None => false,
    }
}

/// Returns true if `value` is a storable document.
///
/// Rejects `null` and the empty string, array and object. Scalars such as
/// `0` and `false` are accepted.
#[must_use]
pub fn is_valid_json_value(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => false,
        JsonValue::String(s) => !s.is_empty(),
        JsonValue::Array(items) => !items.is_empty(),
        JsonValue::Object(map) => !map.is_empty(),
        JsonValue::Bool(_) | JsonValue::Number(_) => true,
    }
}

/// Returns true if `value` is a non-empty JSON object usable as a filter.
#[must_use]
pub fn is_valid_query_object(value: &JsonValue) -> bool {
    value.as_object().is_some_and(|map| !map.is_empty())
}
