//! SQLite executor backed by a sqlx pool

use super::error::{Error, Result};
use super::{Backend, ExecResult, QueryExecutor, Row, SqlValue, Transaction};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteArguments, SqlitePool, SqliteRow};
use sqlx::{Column as _, Row as _, Sqlite, TypeInfo as _, ValueRef as _};
use tokio::sync::Mutex;

type SqliteQuery<'q> = sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>;

/// SQLite executor
#[derive(Clone)]
pub struct SqliteExecutor {
    pool: SqlitePool,
}

impl SqliteExecutor {
    /// Connect a new pool
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(url)
            .await
            .map_err(|e| Error::database(format!("Failed to connect to SQLite: {}", e)))?;

        Ok(Self { pool })
    }

    /// Create executor from existing pool
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get reference to the underlying pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl QueryExecutor for SqliteExecutor {
    fn backend(&self) -> Backend {
        Backend::Sqlite
    }

    async fn execute(&self, sql: &str, args: &[SqlValue]) -> Result<ExecResult> {
        execute_on(&self.pool, sql, args).await
    }

    async fn query(&self, sql: &str, args: &[SqlValue]) -> Result<Vec<Row>> {
        fetch_all_on(&self.pool, sql, args).await
    }

    async fn query_row(&self, sql: &str, args: &[SqlValue]) -> Result<Row> {
        fetch_optional_on(&self.pool, sql, args)
            .await?
            .ok_or(Error::NotFound)
    }

    async fn begin(&self) -> Result<Box<dyn Transaction>> {
        let tx = self.pool.begin().await.map_err(map_err)?;
        log::debug!("SQLite BEGIN");
        Ok(Box::new(SqliteTransaction {
            inner: Mutex::new(Some(tx)),
        }))
    }
}

/// Transaction on one pooled SQLite connection
pub struct SqliteTransaction {
    inner: Mutex<Option<sqlx::Transaction<'static, Sqlite>>>,
}

#[async_trait]
impl QueryExecutor for SqliteTransaction {
    fn backend(&self) -> Backend {
        Backend::Sqlite
    }

    async fn execute(&self, sql: &str, args: &[SqlValue]) -> Result<ExecResult> {
        let mut guard = self.inner.lock().await;
        let tx = guard.as_mut().ok_or(Error::TransactionClosed)?;
        execute_on(&mut **tx, sql, args).await
    }

    async fn query(&self, sql: &str, args: &[SqlValue]) -> Result<Vec<Row>> {
        let mut guard = self.inner.lock().await;
        let tx = guard.as_mut().ok_or(Error::TransactionClosed)?;
        fetch_all_on(&mut **tx, sql, args).await
    }

    async fn query_row(&self, sql: &str, args: &[SqlValue]) -> Result<Row> {
        let mut guard = self.inner.lock().await;
        let tx = guard.as_mut().ok_or(Error::TransactionClosed)?;
        fetch_optional_on(&mut **tx, sql, args)
            .await?
            .ok_or(Error::NotFound)
    }

    async fn begin(&self) -> Result<Box<dyn Transaction>> {
        Err(Error::unsupported(
            "nested transactions; use the executor passed to the callback",
        ))
    }
}

#[async_trait]
impl Transaction for SqliteTransaction {
    fn as_executor(&self) -> &dyn QueryExecutor {
        self
    }

    async fn commit(&self) -> Result<()> {
        let tx = self.inner.lock().await.take().ok_or(Error::TransactionClosed)?;
        tx.commit().await.map_err(map_err)?;
        log::debug!("SQLite COMMIT");
        Ok(())
    }

    async fn rollback(&self) -> Result<()> {
        let tx = self.inner.lock().await.take().ok_or(Error::TransactionClosed)?;
        tx.rollback().await.map_err(map_err)?;
        log::debug!("SQLite ROLLBACK");
        Ok(())
    }
}

fn map_err(error: sqlx::Error) -> Error {
    match error {
        sqlx::Error::RowNotFound => Error::NotFound,
        other => Error::database(other.to_string()),
    }
}

fn build_query<'q>(sql: &'q str, args: &[SqlValue]) -> SqliteQuery<'q> {
    let mut query = sqlx::query(sql);
    for arg in args {
        query = bind_value(query, arg.clone());
    }
    query
}

fn bind_value(query: SqliteQuery<'_>, value: SqlValue) -> SqliteQuery<'_> {
    match value {
        SqlValue::Null => query.bind(None::<String>),
        SqlValue::Bool(b) => query.bind(b),
        SqlValue::Int(i) => query.bind(i),
        SqlValue::Float(f) => query.bind(f),
        SqlValue::Text(s) => query.bind(s),
        SqlValue::Bytes(b) => query.bind(b),

        // No native types for these; stored as text
        SqlValue::Json(j) => query.bind(j.to_string()),
        SqlValue::Uuid(u) => query.bind(u.to_string()),
        SqlValue::Decimal(d) => query.bind(d.to_string()),
        SqlValue::Date(d) => query.bind(d.to_string()),
        SqlValue::Time(t) => query.bind(t.to_string()),
        SqlValue::Timestamp(ts) => query.bind(ts.to_string()),
        SqlValue::TimestampTz(ts) => query.bind(ts.to_rfc3339()),
        array @ SqlValue::Array(_) => query.bind(array.to_json().to_string()),
    }
}

fn decode_row(row: &SqliteRow) -> Result<Row> {
    let columns: Vec<String> = row.columns().iter().map(|c| c.name().to_string()).collect();
    let mut values = Vec::with_capacity(columns.len());

    for index in 0..columns.len() {
        let raw = row.try_get_raw(index).map_err(map_err)?;
        if raw.is_null() {
            values.push(SqlValue::Null);
            continue;
        }

        let storage = raw.type_info().name().to_string();
        let value = match storage.as_str() {
            "INTEGER" | "BOOLEAN" => SqlValue::Int(row.try_get_unchecked::<i64, _>(index).map_err(map_err)?),
            "REAL" | "NUMERIC" => SqlValue::Float(row.try_get_unchecked::<f64, _>(index).map_err(map_err)?),
            "BLOB" => SqlValue::Bytes(row.try_get_unchecked::<Vec<u8>, _>(index).map_err(map_err)?),
            _ => SqlValue::Text(row.try_get_unchecked::<String, _>(index).map_err(map_err)?),
        };
        values.push(value);
    }

    Ok(Row::new(columns, values))
}

async fn execute_on<'c, X>(executor: X, sql: &str, args: &[SqlValue]) -> Result<ExecResult>
where
    X: sqlx::Executor<'c, Database = Sqlite>,
{
    log::debug!("SQLite EXECUTE: {}", sql);
    let result = build_query(sql, args)
        .execute(executor)
        .await
        .map_err(map_err)?;

    Ok(ExecResult::new(
        result.rows_affected(),
        Some(result.last_insert_rowid()),
    ))
}

async fn fetch_all_on<'c, X>(executor: X, sql: &str, args: &[SqlValue]) -> Result<Vec<Row>>
where
    X: sqlx::Executor<'c, Database = Sqlite>,
{
    log::debug!("SQLite FETCH_ALL: {}", sql);
    let rows = build_query(sql, args)
        .fetch_all(executor)
        .await
        .map_err(map_err)?;

    rows.iter().map(decode_row).collect()
}

async fn fetch_optional_on<'c, X>(executor: X, sql: &str, args: &[SqlValue]) -> Result<Option<Row>>
where
    X: sqlx::Executor<'c, Database = Sqlite>,
{
    log::debug!("SQLite FETCH_ONE: {}", sql);
    let row = build_query(sql, args)
        .fetch_optional(executor)
        .await
        .map_err(map_err)?;

    row.as_ref().map(decode_row).transpose()
}
