//! Core types for docstore.
//!
//! Safe identifiers are the only way identifiers reach generated SQL text;
//! `Value` is the only way data does.

mod column_type;
mod ident;
mod value;

pub use column_type::ColumnType;
pub use ident::{FieldPath, Ident, TableName};
pub use value::Value;
