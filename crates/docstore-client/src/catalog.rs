//! Field-hash catalog statements.
//!
//! The catalog lives in `system.field_hash_map` and reverse-maps generated
//! column names to the JSON field paths they were derived from. The primary
//! key `(tableName, fieldHash)` keeps at most one row per table and hash;
//! writes use `REPLACE` so repeating them never duplicates a row.

use docstore_common::{FIELD_HASH_TABLE, SYSTEM_DATABASE};
use serde::Serialize;

/// One catalog row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMapping {
    /// Generated column name, `col_<hex>`.
    pub field_hash: String,
    /// Table reference as given at registration.
    pub table_name: String,
    /// Dotted JSON field path.
    pub field_name: String,
}

/// Returns the quoted catalog table reference.
pub(crate) fn catalog_table() -> String {
    format!("`{SYSTEM_DATABASE}`.`{FIELD_HASH_TABLE}`")
}

/// Statements that create the catalog if it is missing.
pub(crate) fn bootstrap_statements() -> [String; 2] {
    [
        format!("CREATE DATABASE IF NOT EXISTS `{SYSTEM_DATABASE}`"),
        format!(
            "CREATE TABLE IF NOT EXISTS {} (\
             `fieldHash` VARCHAR(64) NOT NULL, \
             `tableName` VARCHAR(129) NOT NULL, \
             `fieldName` VARCHAR(1024) NOT NULL, \
             PRIMARY KEY (`tableName`, `fieldHash`))",
            catalog_table()
        ),
    ]
}

pub(crate) fn upsert_sql() -> String {
    format!(
        "REPLACE INTO {} (`fieldHash`, `tableName`, `fieldName`) VALUES (?, ?, ?)",
        catalog_table()
    )
}

pub(crate) fn lookup_sql(hash_count: usize) -> String {
    let placeholders = vec!["?"; hash_count].join(", ");
    format!(
        "SELECT `fieldHash`, `fieldName` FROM {} WHERE `tableName` = ? AND `fieldHash` IN ({placeholders})",
        catalog_table()
    )
}

pub(crate) fn mappings_sql() -> String {
    format!(
        "SELECT `fieldHash`, `tableName`, `fieldName` FROM {} WHERE `tableName` = ? ORDER BY `fieldName`",
        catalog_table()
    )
}

pub(crate) fn delete_table_sql() -> String {
    format!("DELETE FROM {} WHERE `tableName` = ?", catalog_table())
}

pub(crate) fn delete_database_sql() -> String {
    format!(
        "DELETE FROM {} WHERE `tableName` LIKE ? ESCAPE '!'",
        catalog_table()
    )
}

/// Returns a `LIKE` pattern matching `<database>.` followed by anything.
pub(crate) fn like_prefix(database: &str) -> String {
    let mut pattern = String::with_capacity(database.len() + 2);
    for c in database.chars() {
        if matches!(c, '!' | '%' | '_') {
            pattern.push('!');
        }
        pattern.push(c);
    }
    pattern.push_str(".%");
    pattern
}

/// Replaces every known hash in `message` with its field name.
pub(crate) fn rewrite_message(message: &str, mappings: &[(String, String)]) -> String {
    mappings
        .iter()
        .fold(message.to_string(), |text, (hash, field)| text.replace(hash, field))
}
