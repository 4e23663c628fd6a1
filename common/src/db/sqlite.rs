use crate::db::guard::{classify, StatementKind};
use crate::error::Result;
use async_trait::async_trait;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, ErrorCode, OpenFlags};
use serde_json::{Map, Number, Value};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use thiserror::Error;

/// one result row, column name to value, in projection order
pub type Row = Map<String, Value>;

pub type ResultSet = Vec<Row>;

/// The store's reason for rejecting a query. Only ever shown to the model
/// and the user, never inspected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct QueryError {
    pub message: String,
}

impl QueryError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<rusqlite::Error> for QueryError {
    fn from(e: rusqlite::Error) -> Self {
        Self::new(e.to_string())
    }
}

#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, sql: &str) -> std::result::Result<ResultSet, QueryError>;
}

/// virtual machine steps between deadline checks
const PROGRESS_OPS: i32 = 1000;

/// Read-only SQLite store. Queries run on the blocking pool, one at a time.
///
/// Every query carries its own deadline, set when `execute` is called. Time
/// spent waiting for the connection counts against it, and a query whose
/// deadline passed before it got the connection is never started.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    timeout: Duration,
}

impl SqliteStore {
    pub fn open(path: &Path, timeout: Duration) -> Result<Self> {
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(path, flags)?;

        tracing::info!("connected to ipl database at {}", path.display());

        Ok(Self::from_connection(conn, timeout))
    }

    pub fn from_connection(conn: Connection, timeout: Duration) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
            timeout,
        }
    }
}

#[async_trait]
impl QueryExecutor for SqliteStore {
    #[tracing::instrument(skip(self, sql), fields(sql_len = sql.len()))]
    async fn execute(&self, sql: &str) -> std::result::Result<ResultSet, QueryError> {
        match classify(sql) {
            StatementKind::CommentOnly => {
                tracing::info!("model declined the question, returning no rows");
                return Ok(Vec::new());
            }
            StatementKind::Rejected(reason) => {
                tracing::warn!("refusing to execute: {}", reason);
                return Err(QueryError::new(reason));
            }
            StatementKind::ReadOnly | StatementKind::Unparsed => {}
        }

        let conn = Arc::clone(&self.conn);
        let sql_owned = sql.to_string();
        let timeout = self.timeout;
        let deadline = Instant::now() + timeout;

        let result = tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|_| QueryError::new("database connection lock poisoned"))?;
            if Instant::now() >= deadline {
                return Err(timed_out(timeout));
            }

            conn.progress_handler(PROGRESS_OPS, Some(move || Instant::now() >= deadline));
            let result = run_query(&conn, &sql_owned);
            conn.progress_handler(PROGRESS_OPS, None::<fn() -> bool>);

            result.map_err(|e| match e.sqlite_error_code() {
                Some(ErrorCode::OperationInterrupted) => timed_out(timeout),
                _ => QueryError::from(e),
            })
        })
        .await
        .map_err(|e| QueryError::new(format!("query task failed: {}", e)))?;

        match &result {
            Ok(rows) => tracing::debug!(row_count = rows.len(), "query returned"),
            Err(e) => tracing::debug!(error = %e, "query failed"),
        }
        result
    }
}

fn timed_out(timeout: Duration) -> QueryError {
    QueryError::new(format!("query timed out after {:?}", timeout))
}

fn run_query(conn: &Connection, sql: &str) -> rusqlite::Result<ResultSet> {
    let mut stmt = conn.prepare(sql)?;
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

    let mut rows = stmt.query([])?;
    let mut out = Vec::new();

    while let Some(row) = rows.next()? {
        let mut record = Row::with_capacity(columns.len());
        for (idx, name) in columns.iter().enumerate() {
            record.insert(name.clone(), value_to_json(row.get_ref(idx)?));
        }
        out.push(record);
    }

    Ok(out)
}

fn value_to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(v) => Value::from(v),
        ValueRef::Real(v) => Number::from_f64(v).map(Value::Number).unwrap_or(Value::Null),
        ValueRef::Text(v) => Value::String(String::from_utf8_lossy(v).into_owned()),
        ValueRef::Blob(v) => Value::Array(v.iter().map(|b| Value::from(*b)).collect()),
    }
}
