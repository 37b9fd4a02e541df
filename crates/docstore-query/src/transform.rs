//! Fragment transformer.
//!
//! Indexed-field predicates are answered by the engine's secondary indexes,
//! the residual by JSON extraction at scan time; the results are ANDed.

/// AND-joins two predicate fragments, skipping empty ones.
///
/// ```rust
/// use docstore_query::combine;
///
/// assert_eq!(combine("", ""), "");
/// assert_eq!(combine("x", ""), "x");
/// assert_eq!(combine("", "y"), "y");
/// assert_eq!(combine("x", "y"), "x AND y");
/// ```
#[must_use]
pub fn combine(indexed: &str, non_indexed: &str) -> String {
    match (indexed.is_empty(), non_indexed.is_empty()) {
        (true, true) => String::new(),
        (false, true) => indexed.to_string(),
        (true, false) => non_indexed.to_string(),
        (false, false) => format!("{indexed} AND {non_indexed}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combine_laws() {
        assert_eq!(combine("", ""), "");
        assert_eq!(combine("x", ""), "x");
        assert_eq!(combine("", "y"), "y");
        assert_eq!(combine("x", "y"), "x AND y");
    }

    #[test]
    fn test_combine_keeps_fragments_verbatim() {
        let indexed = "`col_1` = ? AND `col_2` = ?";
        let scan = "JSON_UNQUOTE(JSON_EXTRACT(`doc`, '$.a')) = ?";
        assert_eq!(
            combine(indexed, scan),
            format!("{indexed} AND {scan}")
        );
    }
}
