//! Executor abstraction used by generated query code
//!
//! Generated wrappers are written once against [`QueryExecutor`] and work
//! the same on a pooled connection or inside a transaction opened by
//! [`with_tx`].

use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::fmt;
use std::panic::AssertUnwindSafe;

pub mod batch;
pub mod copy;
pub mod error;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod value;

pub use batch::{BatchItem, BatchMode, BatchReply, BatchResults};
pub use copy::CopyOutcome;
pub use error::{Error, Result};
#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteExecutor, SqliteTransaction};
pub use value::{FromSql, SqlArrayElement, SqlValue, ToSql};

/// SQL dialect of an executor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    Postgres,
    MySql,
    Sqlite,
}

impl Backend {
    /// Placeholder for the 1-based argument `n`
    pub fn placeholder(&self, n: usize) -> String {
        match self {
            Backend::Postgres => format!("${}", n),
            Backend::MySql | Backend::Sqlite => "?".to_string(),
        }
    }

    pub fn quote_ident(&self, ident: &str) -> String {
        match self {
            Backend::MySql => format!("`{}`", ident.replace('`', "``")),
            Backend::Postgres | Backend::Sqlite => format!("\"{}\"", ident.replace('"', "\"\"")),
        }
    }
}

/// Outcome of a statement run for its side effects
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecResult {
    rows_affected: u64,
    last_insert_id: Option<i64>,
}

impl ExecResult {
    pub fn new(rows_affected: u64, last_insert_id: Option<i64>) -> Self {
        Self {
            rows_affected,
            last_insert_id,
        }
    }

    pub fn rows_affected(&self) -> u64 {
        self.rows_affected
    }

    /// Identity generated by the statement, when the backend reports one
    pub fn last_insert_id(&self) -> Option<i64> {
        self.last_insert_id
    }
}

/// One result row, values in select-list order
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<SqlValue>,
}

impl Row {
    pub fn new(columns: Vec<String>, values: Vec<SqlValue>) -> Self {
        Self { columns, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn value(&self, index: usize) -> Option<&SqlValue> {
        self.values.get(index)
    }

    /// Decode the value at `index`
    pub fn get<T: FromSql>(&self, index: usize) -> Result<T> {
        let value = self.values.get(index).ok_or_else(|| {
            Error::decode(format!(
                "column index {} out of range for a row of {}",
                index,
                self.values.len()
            ))
        })?;

        T::from_sql(value).map_err(|e| match e {
            Error::Decode(message) => Error::Decode(format!(
                "column {} ({}): {}",
                index,
                self.columns.get(index).map(String::as_str).unwrap_or("?"),
                message
            )),
            other => other,
        })
    }

    pub fn get_by_name<T: FromSql>(&self, name: &str) -> Result<T> {
        let index = self
            .columns
            .iter()
            .position(|column| column == name)
            .ok_or_else(|| Error::decode(format!("no column named '{}'", name)))?;
        self.get(index)
    }
}

/// Types decoded positionally from a row
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> Result<Self>;
}

/// Decode the first column of a row
pub fn decode_scalar<T: FromSql>(row: &Row) -> Result<T> {
    row.get(0)
}

/// The capability surface generated code runs against
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    fn backend(&self) -> Backend;

    /// Run a statement for its side effects
    async fn execute(&self, sql: &str, args: &[SqlValue]) -> Result<ExecResult>;

    /// Run a statement and collect every row
    async fn query(&self, sql: &str, args: &[SqlValue]) -> Result<Vec<Row>>;

    /// Run a statement expecting at most one row
    ///
    /// An empty result is `Error::NotFound`, never another error.
    async fn query_row(&self, sql: &str, args: &[SqlValue]) -> Result<Row> {
        self.query(sql, args)
            .await?
            .into_iter()
            .next()
            .ok_or(Error::NotFound)
    }

    /// Run one statement per item, reporting each outcome in item order
    async fn send_batch(
        &self,
        sql: &str,
        mode: BatchMode,
        items: Vec<Vec<SqlValue>>,
    ) -> Result<Vec<Result<BatchReply>>> {
        Ok(batch::run_sequential(self, sql, mode, items).await)
    }

    /// Stream rows into `table`
    async fn copy_from(
        &self,
        table: &str,
        columns: &[&str],
        rows: Vec<Vec<SqlValue>>,
    ) -> CopyOutcome {
        copy::insert_rows(self, table, columns, rows).await
    }

    /// Open a transaction
    async fn begin(&self) -> Result<Box<dyn Transaction>>;
}

/// An open transaction
///
/// Once committed or rolled back every further call fails with
/// `Error::TransactionClosed`.
#[async_trait]
pub trait Transaction: QueryExecutor {
    fn as_executor(&self) -> &dyn QueryExecutor;

    async fn commit(&self) -> Result<()>;

    async fn rollback(&self) -> Result<()>;
}

/// Run `f` inside a transaction
///
/// Commits when `f` succeeds. Rolls back when `f` fails or panics; a failed
/// rollback is logged and the original error or panic is what the caller
/// sees.
///
/// ```rust,no_run
/// use rustf_querygen::runtime::{with_tx, QueryExecutor, Result};
///
/// # async fn example(db: &dyn QueryExecutor) -> Result<()> {
/// with_tx(db, |tx| {
///     Box::pin(async move {
///         tx.execute("UPDATE accounts SET balance = balance - 10 WHERE id = 1", &[]).await?;
///         tx.execute("UPDATE accounts SET balance = balance + 10 WHERE id = 2", &[]).await?;
///         Ok::<_, rustf_querygen::runtime::Error>(())
///     })
/// })
/// .await
/// # }
/// ```
pub async fn with_tx<T, E, F>(executor: &dyn QueryExecutor, f: F) -> std::result::Result<T, E>
where
    F: for<'t> FnOnce(&'t dyn QueryExecutor) -> BoxFuture<'t, std::result::Result<T, E>>,
    E: From<Error> + fmt::Display,
{
    let tx = executor.begin().await.map_err(E::from)?;

    let outcome = AssertUnwindSafe(f(tx.as_executor())).catch_unwind().await;

    match outcome {
        Ok(Ok(value)) => {
            tx.commit().await.map_err(E::from)?;
            Ok(value)
        }
        Ok(Err(error)) => {
            if let Err(rollback_error) = tx.rollback().await {
                log::error!(
                    "Rollback failed after error '{}': {}",
                    error,
                    rollback_error
                );
            }
            Err(error)
        }
        Err(panic) => {
            if let Err(rollback_error) = tx.rollback().await {
                log::error!("Rollback failed after panic: {}", rollback_error);
            }
            std::panic::resume_unwind(panic)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_get_reports_column() {
        let row = Row::new(
            vec!["id".to_string(), "name".to_string()],
            vec![SqlValue::Int(1), SqlValue::Int(2)],
        );

        assert_eq!(row.get::<i64>(0).unwrap(), 1);
        let error = row.get::<String>(1).unwrap_err();
        assert!(error.to_string().contains("column 1 (name)"));
        assert!(row.get::<i64>(5).is_err());
        assert_eq!(row.get_by_name::<i64>("name").unwrap(), 2);
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(Backend::Postgres.placeholder(3), "$3");
        assert_eq!(Backend::Sqlite.placeholder(3), "?");
    }
}
