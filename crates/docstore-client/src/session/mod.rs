//! Session management.
//!
//! A [`Session`] owns at most one engine connection and is passed explicitly
//! to every operation. Independent sessions do not share state.
//!
//! ```text
//!   Closed --init--> Open --close--> Closed
//! ```
//!
//! `init` on an open session fails; `close` is idempotent; every other
//! operation fails fast with `Please call init before <operation>` while the
//! session is closed.

use std::sync::Arc;
use std::time::{Duration, Instant};

use docstore_common::config::ConnectionConfig;
use docstore_common::error::{StoreError, StoreResult};
use docstore_common::Value;
use parking_lot::RwLock;
use serde_json::Value as JsonValue;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, warn};

use crate::backend::{Backend, MySqlBackend, Row};
use crate::catalog;

mod catalog_ops;
mod document;
mod index;
mod introspect;
mod scan;
mod schema;

pub use index::{JsonIndex, DEFAULT_INDEX_TYPE};
pub use introspect::IndexDescriptor;

/// Session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No connection.
    Closed,
    /// Connection established and catalog bootstrapped.
    Open,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Closed => write!(f, "closed"),
            SessionState::Open => write!(f, "open"),
        }
    }
}

/// Statistics about session usage.
#[derive(Debug, Clone, Default)]
pub struct SessionStats {
    /// Statements sent to the engine.
    pub statements_executed: u64,
    /// Statements the engine rejected.
    pub engine_errors: u64,
    /// Successful `init` calls.
    pub sessions_opened: u64,
}

struct SessionInner {
    state: SessionState,
    backend: Option<Arc<dyn Backend>>,
    opened_at: Option<Instant>,
}

/// A docstore session.
pub struct Session {
    inner: RwLock<SessionInner>,
    /// Serializes `init` and `close`.
    op_lock: AsyncMutex<()>,
    stats: RwLock<SessionStats>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Creates a closed session.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(SessionInner {
                state: SessionState::Closed,
                backend: None,
                opened_at: None,
            }),
            op_lock: AsyncMutex::new(()),
            stats: RwLock::new(SessionStats::default()),
        }
    }

    /// Connects to the engine and bootstraps the field-hash catalog.
    ///
    /// Every config field is required; the error names the first missing
    /// one. Fails if the session is already open.
    pub async fn init(&self, config: &ConnectionConfig) -> StoreResult<()> {
        let _lock = self.op_lock.lock().await;
        self.ensure_closed()?;

        let params = config.validated()?;
        let backend = MySqlBackend::connect(&params).await?;
        info!("Connected to {} (database {})", params.address(), params.database);

        self.attach(Arc::new(backend)).await
    }

    /// Opens the session over an existing backend.
    pub async fn init_with_backend(&self, backend: Arc<dyn Backend>) -> StoreResult<()> {
        let _lock = self.op_lock.lock().await;
        self.ensure_closed()?;
        self.attach(backend).await
    }

    async fn attach(&self, backend: Arc<dyn Backend>) -> StoreResult<()> {
        if let Err(err) = self.bootstrap_catalog(backend.as_ref()).await {
            if let Err(close_err) = backend.close().await {
                warn!("Failed to close connection after bootstrap error: {}", close_err);
            }
            return Err(err);
        }

        {
            let mut inner = self.inner.write();
            inner.state = SessionState::Open;
            inner.backend = Some(backend);
            inner.opened_at = Some(Instant::now());
        }

        self.stats.write().sessions_opened += 1;
        Ok(())
    }

    /// Releases the connection. Safe to call at any time, including before
    /// `init` and more than once.
    pub async fn close(&self) -> StoreResult<()> {
        let _lock = self.op_lock.lock().await;

        let backend = {
            let mut inner = self.inner.write();
            inner.state = SessionState::Closed;
            inner.opened_at = None;
            inner.backend.take()
        };

        match backend {
            Some(backend) => {
                info!("Closing session");
                backend.close().await
            }
            None => Ok(()),
        }
    }

    /// Returns the session state.
    pub fn state(&self) -> SessionState {
        self.inner.read().state
    }

    /// Returns true if the session is open.
    pub fn is_open(&self) -> bool {
        self.state() == SessionState::Open
    }

    /// Returns session statistics.
    pub fn stats(&self) -> SessionStats {
        self.stats.read().clone()
    }

    /// Returns how long the session has been open.
    pub fn open_duration(&self) -> Option<Duration> {
        self.inner.read().opened_at.map(|t| t.elapsed())
    }

    // =========================================================================
    // Helper Methods
    // =========================================================================

    fn ensure_closed(&self) -> StoreResult<()> {
        match self.state() {
            SessionState::Closed => Ok(()),
            SessionState::Open => Err(StoreError::already_initialized()),
        }
    }

    /// Returns the backend, or the not-initialized error for `operation`.
    pub(crate) fn backend(&self, operation: &str) -> StoreResult<Arc<dyn Backend>> {
        let inner = self.inner.read();
        match (&inner.state, &inner.backend) {
            (SessionState::Open, Some(backend)) => Ok(Arc::clone(backend)),
            _ => Err(StoreError::not_initialized(operation)),
        }
    }

    pub(crate) async fn execute(
        &self,
        backend: &dyn Backend,
        sql: &str,
        params: Vec<Value>,
    ) -> StoreResult<u64> {
        debug!(sql, params = params.len(), "execute");
        let result = backend.execute(sql, params).await;
        self.record(result.is_err());
        result
    }

    pub(crate) async fn query(
        &self,
        backend: &dyn Backend,
        sql: &str,
        params: Vec<Value>,
    ) -> StoreResult<Vec<Row>> {
        debug!(sql, params = params.len(), "query");
        let result = backend.query(sql, params).await;
        self.record(result.is_err());
        result
    }

    fn record(&self, failed: bool) {
        let mut stats = self.stats.write();
        stats.statements_executed += 1;
        if failed {
            stats.engine_errors += 1;
        }
    }

    async fn bootstrap_catalog(&self, backend: &dyn Backend) -> StoreResult<()> {
        for sql in catalog::bootstrap_statements() {
            self.execute(backend, &sql, Vec::new()).await?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

/// Decodes a JSON column value.
pub(crate) fn decode_document(value: &Value) -> StoreResult<JsonValue> {
    match value {
        Value::String(_) | Value::Bytes(_) => {
            let text = value
                .as_str()
                .ok_or_else(|| StoreError::serialization("document is not valid UTF-8"))?;
            Ok(serde_json::from_str(text)?)
        }
        Value::Null => Ok(JsonValue::Null),
        other => Err(StoreError::serialization(format!(
            "unexpected document value {other}"
        ))),
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::MockBackend;
    use docstore_common::ErrorKind;

    #[tokio::test]
    async fn test_init_bootstraps_catalog() {
        let mock = Arc::new(MockBackend::new());
        let session = Session::new();
        assert_eq!(session.state(), SessionState::Closed);

        session.init_with_backend(mock.clone()).await.unwrap();
        assert!(session.is_open());

        let log = mock.sql_log();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0], "CREATE DATABASE IF NOT EXISTS `system`");
        assert!(log[1].starts_with("CREATE TABLE IF NOT EXISTS `system`.`field_hash_map`"));
    }

    #[tokio::test]
    async fn test_double_init_fails() {
        let session = Session::new();
        session
            .init_with_backend(Arc::new(MockBackend::new()))
            .await
            .unwrap();

        let err = session
            .init_with_backend(Arc::new(MockBackend::new()))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SessionState);
        assert_eq!(
            err.to_string(),
            "one connection active, close before reinitializing"
        );
    }

    #[tokio::test]
    async fn test_init_reports_missing_field() {
        let session = Session::new();
        let config = ConnectionConfig::new().host("localhost").port(3306);
        let err = session.init(&config).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidConfig { ref field, .. } if field == "user"));
        assert!(!session.is_open());
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let session = Session::new();
        session.close().await.unwrap();

        let mock = Arc::new(MockBackend::new());
        session.init_with_backend(mock.clone()).await.unwrap();
        session.close().await.unwrap();
        session.close().await.unwrap();

        assert!(mock.is_closed());
        assert_eq!(session.state(), SessionState::Closed);

        session
            .init_with_backend(Arc::new(MockBackend::new()))
            .await
            .unwrap();
        assert!(session.is_open());
    }

    #[tokio::test]
    async fn test_operations_require_init() {
        let session = Session::new();
        let err = session.get("users", "id", "k1", "doc").await.unwrap_err();
        assert_eq!(err.to_string(), "Please call init before get");

        let err = session.list_databases().await.unwrap_err();
        assert_eq!(err.to_string(), "Please call init before listDatabases");
    }

    #[tokio::test]
    async fn test_bootstrap_failure_leaves_session_closed() {
        let mock = Arc::new(MockBackend::new());
        mock.push_error(StoreError::engine("access denied"));

        let session = Session::new();
        let err = session.init_with_backend(mock.clone()).await.unwrap_err();
        assert_eq!(err.to_string(), "access denied");
        assert!(!session.is_open());
        assert!(mock.is_closed());
    }

    #[tokio::test]
    async fn test_stats_count_statements() {
        let mock = Arc::new(MockBackend::new());
        let session = Session::new();
        session.init_with_backend(mock.clone()).await.unwrap();
        mock.push_error(StoreError::engine("boom"));
        let _ = session.list_databases().await;

        let stats = session.stats();
        assert_eq!(stats.sessions_opened, 1);
        assert_eq!(stats.statements_executed, 3);
        assert_eq!(stats.engine_errors, 1);
    }

    #[test]
    fn test_decode_document() {
        let doc = decode_document(&Value::Bytes(br#"{"a":1}"#.to_vec())).unwrap();
        assert_eq!(doc["a"], 1);
        assert!(decode_document(&Value::Bytes(b"{not json".to_vec())).is_err());
        assert!(decode_document(&Value::Integer(3)).is_err());
    }
}
