//! # docstore-client
//!
//! A JSON document store over a MySQL-compatible engine.
//!
//! Documents live in one JSON column keyed by a string primary key. Any JSON
//! field can be indexed through a generated column whose name is a hash of
//! the field path; a catalog table maps those names back to field paths so
//! engine errors and index listings stay readable.
//!
//! - **Sessions**: explicit connection lifecycle (`init` / `close`)
//! - **Documents**: `put`, `get`, `delete_key` by primary key
//! - **Indexes**: `create_index_for_json_field`, `get_table_indexes`
//! - **Queries**: full scans (`get_from_non_index`) and index-aware `find`
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use docstore_client::{ConnectionConfig, JsonIndex, Session};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let session = Session::new();
//!     session.init(&ConnectionConfig::from_env()?).await?;
//!
//!     session.create_table("users", "id", "doc").await?;
//!     session.put("users", "id", "u1", "doc", &json!({"email": "a@b.c"})).await?;
//!     session
//!         .create_index_for_json_field("users", "doc", &JsonIndex::new("email").unique(true))
//!         .await?;
//!
//!     let found = session.find("users", "doc", &json!({"email": "a@b.c"})).await?;
//!     println!("{found:?}");
//!
//!     session.close().await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Statement executors.
pub mod backend;

/// Field-hash catalog.
pub mod catalog;

/// Sessions and the operations they run.
pub mod session;

// Re-exports
pub use backend::{Backend, MySqlBackend, Row};
pub use catalog::FieldMapping;
pub use session::{
    IndexDescriptor, JsonIndex, Session, SessionState, SessionStats, DEFAULT_INDEX_TYPE,
};

pub use docstore_common::{ConnectionConfig, ErrorKind, StoreError, StoreResult, Value};
