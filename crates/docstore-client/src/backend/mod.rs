//! The engine seam.
//!
//! A [`Backend`] runs one statement at a time and knows nothing about
//! documents, indexes or the catalog. The session layers all docstore
//! semantics on top, so a backend can be the real engine or a test double.

use std::sync::Arc;

use async_trait::async_trait;
use docstore_common::error::StoreResult;
use docstore_common::Value;

#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod mysql;

pub use mysql::MySqlBackend;

/// A statement executor over a single engine connection.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Runs a statement that returns no rows; returns the affected row count.
    async fn execute(&self, sql: &str, params: Vec<Value>) -> StoreResult<u64>;

    /// Runs a statement and returns its rows.
    async fn query(&self, sql: &str, params: Vec<Value>) -> StoreResult<Vec<Row>>;

    /// Releases the connection. Safe to call more than once.
    async fn close(&self) -> StoreResult<()>;
}

/// A result row with named columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<Value>,
}

impl Row {
    /// Creates a row. `values` is matched to `columns` by position.
    pub fn new(columns: Arc<[String]>, values: Vec<Value>) -> Self {
        Self { columns, values }
    }

    /// Returns the column names.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the values in column order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Gets a value by position.
    pub fn get_index(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Gets a value by column name, ignoring ASCII case.
    ///
    /// Metadata tables report upper-case names on some engine versions and
    /// lower-case on others.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(column))
            .and_then(|i| self.values.get(i))
    }

    /// Gets a text value by column name.
    pub fn get_str(&self, column: &str) -> Option<&str> {
        self.get(column).and_then(Value::as_str)
    }

    /// Gets an integer value by column name.
    pub fn get_i64(&self, column: &str) -> Option<i64> {
        self.get(column).and_then(Value::as_i64)
    }
}
