//! # docstore-test
//!
//! End-to-end tests for docstore.
//!
//! The tests under `tests/` talk to a live MySQL-compatible engine configured
//! through `DOCSTORE_TEST_HOST`, `DOCSTORE_TEST_PORT`, `DOCSTORE_TEST_USER`,
//! `DOCSTORE_TEST_PASSWORD` and `DOCSTORE_TEST_DATABASE` (which must already
//! exist). Every test skips when `DOCSTORE_TEST_HOST` is unset.

#![warn(missing_docs)]
#![warn(clippy::all)]

use std::sync::atomic::{AtomicU32, Ordering};

use docstore_client::Session;
use docstore_common::ConnectionConfig;
use tracing::warn;

/// Prefix of the variables read by [`test_config`].
pub const TEST_ENV_PREFIX: &str = "DOCSTORE_TEST_";

/// Database used when `DOCSTORE_TEST_DATABASE` is unset.
pub const DEFAULT_TEST_DATABASE: &str = "docstore_test";

static TABLE_COUNTER: AtomicU32 = AtomicU32::new(0);

/// Returns the live-engine configuration, or `None` when no engine is set up.
pub fn test_config() -> Option<ConnectionConfig> {
    let lookup = |key: &str| std::env::var(format!("{TEST_ENV_PREFIX}{key}")).ok();
    let host = lookup("HOST")?;

    let port = match lookup("PORT").map(|p| p.parse::<u16>()) {
        Some(Ok(port)) => port,
        Some(Err(e)) => {
            warn!("Ignoring invalid {}PORT: {}", TEST_ENV_PREFIX, e);
            docstore_common::DEFAULT_MYSQL_PORT
        }
        None => docstore_common::DEFAULT_MYSQL_PORT,
    };

    Some(
        ConnectionConfig::new()
            .host(host)
            .port(port)
            .user(lookup("USER").unwrap_or_else(|| "root".to_string()))
            .password(lookup("PASSWORD").unwrap_or_default())
            .database(lookup("DATABASE").unwrap_or_else(|| DEFAULT_TEST_DATABASE.to_string())),
    )
}

/// Returns the database the tests run in.
pub fn test_database(config: &ConnectionConfig) -> &str {
    config.database.as_deref().unwrap_or(DEFAULT_TEST_DATABASE)
}

/// Returns a table name unique within this process.
pub fn unique_table(prefix: &str) -> String {
    let n = TABLE_COUNTER.fetch_add(1, Ordering::SeqCst);
    format!("{prefix}_{}_{n}", std::process::id())
}

/// Opens a session, or returns `None` (with a note) when the tests should
/// skip.
pub async fn open_session() -> Option<(Session, ConnectionConfig)> {
    let Some(config) = test_config() else {
        eprintln!("Skipping test - DOCSTORE_TEST_HOST is not set");
        return None;
    };

    let session = Session::new();
    match session.init(&config).await {
        Ok(()) => Some((session, config)),
        Err(e) => {
            eprintln!("Skipping test - could not connect: {e}");
            None
        }
    }
}
