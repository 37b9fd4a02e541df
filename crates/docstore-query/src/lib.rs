//! # docstore-query
//!
//! Query text handling for docstore.
//!
//! - **Lexer**: a cursor over query text driven by a table of
//!   character-class rules ([`lexer`])
//! - **Transformer**: AND-combination of an indexed-predicate fragment with a
//!   scan-predicate fragment ([`transform`])
//! - **Predicates**: parameterized SQL fragments built from filter objects,
//!   split between indexed generated columns and JSON scans ([`predicate`])
//!
//! ## Example
//!
//! ```rust
//! use docstore_query::{combine, tokenize};
//!
//! assert_eq!(combine("a = ?", "b = ?"), "a = ? AND b = ?");
//! assert_eq!(tokenize("   ").unwrap().len(), 1);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod lexer;
pub mod predicate;
pub mod transform;

pub use lexer::{tokenize, Cursor, Lexer, Rule, Token, TokenKind, DEFAULT_RULES};
pub use predicate::{json_extract, scan_predicates, validate_filter, Fragment, SplitFilter};
pub use transform::combine;
