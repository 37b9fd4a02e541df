//! # docstore-common
//!
//! Common types, errors, and utilities for docstore.
//!
//! This crate provides the foundational pieces shared by every docstore
//! component. It includes:
//!
//! - **Validation**: identifier, primary-key and JSON field-path rules
//! - **Types**: safe identifiers (`Ident`, `TableName`, `FieldPath`), column
//!   types for generated columns, and the bound-parameter `Value`
//! - **Hashing**: content-addressed generated-column names (`hash_field`)
//! - **Errors**: the tagged `StoreError` taxonomy
//! - **Config**: connection configuration and its loaders
//! - **Constants**: engine limits and catalog names
//!
//! ## Example
//!
//! ```rust
//! use docstore_common::{hash_field, FieldPath, TableName};
//! use docstore_common::error::StoreResult;
//!
//! fn example() -> StoreResult<()> {
//!     let table = TableName::parse("shop.users")?;
//!     let field = FieldPath::parse("address.city")?;
//!     assert_eq!(table.to_string(), "`shop`.`users`");
//!     assert_eq!(field.json_path(), "$.address.city");
//!     assert!(hash_field(field.as_str()).starts_with("col_"));
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod constants;
pub mod error;
pub mod hash;
pub mod types;
pub mod validate;

// Re-export commonly used items at the crate root
pub use config::ConnectionConfig;
pub use constants::*;
pub use error::{ErrorKind, StoreError, StoreResult};
pub use hash::{find_hashed_columns, hash_field, is_hashed_column};
pub use types::{ColumnType, FieldPath, Ident, TableName, Value};
