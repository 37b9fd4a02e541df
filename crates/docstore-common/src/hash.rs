//! Content-addressed names for generated JSON columns.
//!
//! A field path of any length maps to `col_` followed by the lowercase hex
//! SHA-224 digest of its UTF-8 bytes. The result is 60 characters, under the
//! engine's 64-character identifier limit. Deployed indexes and catalog rows
//! depend on this exact format.

use std::sync::OnceLock;

use regex::Regex;
use sha2::{Digest, Sha224};

use crate::constants::{FIELD_DIGEST_HEX_LEN, HASHED_COLUMN_PREFIX};

/// Returns the generated-column name for `field_path`.
///
/// # Example
///
/// ```rust
/// use docstore_common::hash_field;
///
/// let name = hash_field("address.city");
/// assert_eq!(name, hash_field("address.city"));
/// assert_eq!(name.len(), 60);
/// ```
#[must_use]
pub fn hash_field(field_path: &str) -> String {
    let digest = Sha224::digest(field_path.as_bytes());
    format!("{HASHED_COLUMN_PREFIX}{}", hex::encode(digest))
}

fn hashed_column_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(
            "{HASHED_COLUMN_PREFIX}[0-9a-f]{{{FIELD_DIGEST_HEX_LEN}}}"
        ))
        .expect("valid hashed column regex")
    })
}

/// Returns true if `name` is exactly a hashed column name.
#[must_use]
pub fn is_hashed_column(name: &str) -> bool {
    name.len() == HASHED_COLUMN_PREFIX.len() + FIELD_DIGEST_HEX_LEN
        && hashed_column_regex()
            .find(name)
            .is_some_and(|m| m.start() == 0 && m.end() == name.len())
}

/// Returns every distinct hashed column name found in `text`, in order of
/// first appearance.
#[must_use]
pub fn find_hashed_columns(text: &str) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    for m in hashed_column_regex().find_iter(text) {
        if !found.iter().any(|f| f == m.as_str()) {
            found.push(m.as_str().to_string());
        }
    }
    found
}
