//! Configuration for docstore.
//!
//! The session never invents defaults: every connection field must be
//! supplied, either directly or through one of the loaders here.

mod connection;

pub use connection::{ConnectionConfig, ConnectionParams};
