//! Scripted backend for tests.
//!
//! Records every statement with its parameters and answers from a queue of
//! prepared responses. An empty queue answers `0` affected rows or no rows.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use docstore_common::error::{StoreError, StoreResult};
use docstore_common::Value;
use parking_lot::Mutex;

use super::{Backend, Row};

/// A statement seen by the mock.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// Statement text.
    pub sql: String,
    /// Bound parameters.
    pub params: Vec<Value>,
}

/// A queued answer.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Affected row count for `execute`.
    Affected(u64),
    /// Result rows for `query`.
    Rows(Vec<Row>),
    /// Failure for either call.
    Error(StoreError),
}

/// Scripted [`Backend`].
#[derive(Debug, Default)]
pub struct MockBackend {
    statements: Mutex<Vec<Statement>>,
    responses: Mutex<VecDeque<MockResponse>>,
    closed: AtomicBool,
}

impl MockBackend {
    /// Creates an empty mock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an affected-row count.
    pub fn push_affected(&self, count: u64) {
        self.responses.lock().push_back(MockResponse::Affected(count));
    }

    /// Queues a result set.
    pub fn push_rows(&self, columns: &[&str], rows: Vec<Vec<Value>>) {
        let columns: Arc<[String]> = columns.iter().map(|c| (*c).to_string()).collect();
        let rows = rows
            .into_iter()
            .map(|values| Row::new(Arc::clone(&columns), values))
            .collect();
        self.responses.lock().push_back(MockResponse::Rows(rows));
    }

    /// Queues a failure.
    pub fn push_error(&self, err: StoreError) {
        self.responses.lock().push_back(MockResponse::Error(err));
    }

    /// Returns every statement seen so far.
    pub fn statements(&self) -> Vec<Statement> {
        self.statements.lock().clone()
    }

    /// Returns the text of every statement seen so far.
    pub fn sql_log(&self) -> Vec<String> {
        self.statements.lock().iter().map(|s| s.sql.clone()).collect()
    }

    /// Forgets recorded statements.
    pub fn clear_log(&self) {
        self.statements.lock().clear();
    }

    /// Returns true once `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn record(&self, sql: &str, params: Vec<Value>) -> Option<MockResponse> {
        self.statements.lock().push(Statement {
            sql: sql.to_string(),
            params,
        });
        self.responses.lock().pop_front()
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn execute(&self, sql: &str, params: Vec<Value>) -> StoreResult<u64> {
        match self.record(sql, params) {
            None => Ok(0),
            Some(MockResponse::Affected(n)) => Ok(n),
            Some(MockResponse::Rows(rows)) => Ok(rows.len() as u64),
            Some(MockResponse::Error(err)) => Err(err),
        }
    }

    async fn query(&self, sql: &str, params: Vec<Value>) -> StoreResult<Vec<Row>> {
        match self.record(sql, params) {
            None | Some(MockResponse::Affected(_)) => Ok(Vec::new()),
            Some(MockResponse::Rows(rows)) => Ok(rows),
            Some(MockResponse::Error(err)) => Err(err),
        }
    }

    async fn close(&self) -> StoreResult<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
