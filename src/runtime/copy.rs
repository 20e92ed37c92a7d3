//! Bulk copy
//!
//! Rows are streamed into the target table in order. The first failing row
//! stops the stream; the outcome carries the number of rows written before
//! it and that one error.

use super::error::{Error, Result};
use super::value::SqlValue;
use super::{Backend, QueryExecutor};

/// Result of a bulk copy
#[derive(Debug)]
pub struct CopyOutcome {
    pub rows_written: u64,
    pub error: Option<Error>,
}

impl CopyOutcome {
    pub fn complete(rows_written: u64) -> Self {
        Self {
            rows_written,
            error: None,
        }
    }

    pub fn failed(rows_written: u64, error: Error) -> Self {
        Self {
            rows_written,
            error: Some(error),
        }
    }

    /// Row count, or one `Error::BulkCopy` carrying the partial count
    pub fn into_result(self) -> Result<u64> {
        match self.error {
            None => Ok(self.rows_written),
            Some(source) => Err(Error::BulkCopy {
                written: self.rows_written,
                source: Box::new(source),
            }),
        }
    }
}

/// Single-row `INSERT` for the copy target
pub fn insert_statement(backend: Backend, table: &str, columns: &[&str]) -> String {
    let table = table
        .split('.')
        .map(|part| backend.quote_ident(part))
        .collect::<Vec<_>>()
        .join(".");
    let placeholders = (1..=columns.len())
        .map(|n| backend.placeholder(n))
        .collect::<Vec<_>>()
        .join(", ");
    let columns = columns
        .iter()
        .map(|column| backend.quote_ident(column))
        .collect::<Vec<_>>()
        .join(", ");

    format!("INSERT INTO {} ({}) VALUES ({})", table, columns, placeholders)
}

/// Copy rows through prepared inserts, stopping at the first failure
pub async fn insert_rows<E>(
    executor: &E,
    table: &str,
    columns: &[&str],
    rows: Vec<Vec<SqlValue>>,
) -> CopyOutcome
where
    E: QueryExecutor + ?Sized,
{
    let sql = insert_statement(executor.backend(), table, columns);
    let mut written = 0u64;

    for (index, row) in rows.into_iter().enumerate() {
        if row.len() != columns.len() {
            return CopyOutcome::failed(
                written,
                Error::Other(format!(
                    "row {} has {} value(s) for {} column(s)",
                    index,
                    row.len(),
                    columns.len()
                )),
            );
        }

        match executor.execute(&sql, &row).await {
            Ok(result) => written += result.rows_affected(),
            Err(e) => {
                log::warn!("Bulk copy into {} stopped at row {}: {}", table, index, e);
                return CopyOutcome::failed(written, e);
            }
        }
    }

    log::debug!("Bulk copy wrote {} row(s) into {}", written, table);
    CopyOutcome::complete(written)
}
