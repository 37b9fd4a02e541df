//! Error handling for docstore.
//!
//! This module provides the tagged error type and result alias used
//! across all docstore components.

mod store;

pub use store::{ErrorKind, StoreError};

/// Result type alias for docstore operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
