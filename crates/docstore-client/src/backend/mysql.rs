//! MySQL wire-protocol backend.
//!
//! Holds exactly one connection. Concurrent statements are queued on an
//! async mutex; waiting callers are suspended, not blocked.

use std::sync::Arc;

use async_trait::async_trait;
use docstore_common::config::ConnectionParams;
use docstore_common::error::{StoreError, StoreResult};
use docstore_common::Value;
use mysql_async::prelude::Queryable;
use mysql_async::{Conn, OptsBuilder, Params};
use tokio::sync::Mutex as AsyncMutex;
use tracing::debug;

use super::{Backend, Row};

/// Backend over a single `mysql_async` connection.
pub struct MySqlBackend {
    conn: AsyncMutex<Option<Conn>>,
    address: String,
}

impl MySqlBackend {
    /// Opens a connection using fully validated parameters.
    pub async fn connect(params: &ConnectionParams) -> StoreResult<Self> {
        let opts = OptsBuilder::default()
            .ip_or_hostname(params.host.clone())
            .tcp_port(params.port)
            .user(Some(params.user.clone()))
            .pass(Some(params.password.clone()))
            .db_name(Some(params.database.clone()));

        debug!("Connecting to {}", params.address());
        let conn = Conn::new(opts).await.map_err(engine_error)?;

        Ok(Self {
            conn: AsyncMutex::new(Some(conn)),
            address: params.address(),
        })
    }
}

impl std::fmt::Debug for MySqlBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MySqlBackend")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Backend for MySqlBackend {
    async fn execute(&self, sql: &str, params: Vec<Value>) -> StoreResult<u64> {
        let mut guard = self.conn.lock().await;
        let conn = guard.as_mut().ok_or_else(connection_closed)?;

        let result = if params.is_empty() {
            conn.query_drop(sql).await
        } else {
            conn.exec_drop(sql, to_params(params)).await
        };
        result.map_err(engine_error)?;

        Ok(conn.affected_rows())
    }

    async fn query(&self, sql: &str, params: Vec<Value>) -> StoreResult<Vec<Row>> {
        let mut guard = self.conn.lock().await;
        let conn = guard.as_mut().ok_or_else(connection_closed)?;

        let rows = if params.is_empty() {
            conn.query::<mysql_async::Row, _>(sql).await
        } else {
            conn.exec::<mysql_async::Row, _, _>(sql, to_params(params)).await
        }
        .map_err(engine_error)?;

        Ok(convert_rows(rows))
    }

    async fn close(&self) -> StoreResult<()> {
        let conn = self.conn.lock().await.take();
        if let Some(conn) = conn {
            conn.disconnect().await.map_err(engine_error)?;
        }
        Ok(())
    }
}

fn connection_closed() -> StoreError {
    StoreError::SessionState {
        reason: "connection closed".to_string(),
    }
}

/// Maps a driver error, keeping the server's native code and SQLSTATE.
fn engine_error(err: mysql_async::Error) -> StoreError {
    match err {
        mysql_async::Error::Server(server) => StoreError::Engine {
            code: Some(server.code),
            state: Some(server.state),
            message: server.message,
        },
        other => StoreError::engine(other.to_string()),
    }
}

fn to_params(params: Vec<Value>) -> Params {
    Params::Positional(params.into_iter().map(to_mysql).collect())
}

fn to_mysql(value: Value) -> mysql_async::Value {
    match value {
        Value::Null => mysql_async::Value::NULL,
        Value::Boolean(b) => mysql_async::Value::Int(i64::from(b)),
        Value::Integer(i) => mysql_async::Value::Int(i),
        Value::UInteger(u) => mysql_async::Value::UInt(u),
        Value::Float(f) => mysql_async::Value::Double(f),
        Value::String(s) => mysql_async::Value::Bytes(s.into_bytes()),
        Value::Bytes(b) => mysql_async::Value::Bytes(b),
    }
}

fn from_mysql(value: &mysql_async::Value) -> Value {
    match value {
        mysql_async::Value::NULL => Value::Null,
        mysql_async::Value::Bytes(b) => Value::Bytes(b.clone()),
        mysql_async::Value::Int(i) => Value::Integer(*i),
        mysql_async::Value::UInt(u) => Value::UInteger(*u),
        mysql_async::Value::Float(f) => Value::Float(f64::from(*f)),
        mysql_async::Value::Double(d) => Value::Float(*d),
        mysql_async::Value::Date(y, mo, d, h, mi, s, us) => Value::String(format!(
            "{y:04}-{mo:02}-{d:02} {h:02}:{mi:02}:{s:02}.{us:06}"
        )),
        mysql_async::Value::Time(neg, d, h, mi, s, us) => {
            let sign = if *neg { "-" } else { "" };
            let hours = u64::from(*d) * 24 + u64::from(*h);
            Value::String(format!("{sign}{hours:02}:{mi:02}:{s:02}.{us:06}"))
        }
    }
}

fn convert_rows(rows: Vec<mysql_async::Row>) -> Vec<Row> {
    let Some(first) = rows.first() else {
        return Vec::new();
    };
    let columns: Arc<[String]> = first
        .columns_ref()
        .iter()
        .map(|c| c.name_str().into_owned())
        .collect();

    rows.iter()
        .map(|row| {
            let values = (0..row.len())
                .map(|i| row.as_ref(i).map_or(Value::Null, from_mysql))
                .collect();
            Row::new(Arc::clone(&columns), values)
        })
        .collect()
}
