//! Batched statements
//!
//! A batch runs one statement once per item. Every item gets its own
//! outcome; a failing item never aborts its siblings, and outcomes are always
//! reported in submission order.

use super::error::{Error, Result};
use super::value::SqlValue;
use super::{QueryExecutor, Row};

/// What each batch item is expected to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchMode {
    Exec,
    QueryRow,
    Query,
}

/// Raw outcome of one successful batch item
#[derive(Debug, Clone)]
pub enum BatchReply {
    Exec(u64),
    Row(Row),
    Rows(Vec<Row>),
}

impl BatchReply {
    pub fn into_exec(self) -> Result<()> {
        match self {
            BatchReply::Exec(_) => Ok(()),
            other => Err(Error::Other(format!("expected exec reply, got {}", other.describe()))),
        }
    }

    pub fn into_row(self) -> Result<Row> {
        match self {
            BatchReply::Row(row) => Ok(row),
            other => Err(Error::Other(format!("expected row reply, got {}", other.describe()))),
        }
    }

    pub fn into_rows(self) -> Result<Vec<Row>> {
        match self {
            BatchReply::Rows(rows) => Ok(rows),
            other => Err(Error::Other(format!("expected rows reply, got {}", other.describe()))),
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            BatchReply::Exec(_) => "exec",
            BatchReply::Row(_) => "row",
            BatchReply::Rows(_) => "rows",
        }
    }
}

/// Run a batch one item at a time, in order
///
/// Used by executors without a pipelined transport.
pub async fn run_sequential<E>(
    executor: &E,
    sql: &str,
    mode: BatchMode,
    items: Vec<Vec<SqlValue>>,
) -> Vec<Result<BatchReply>>
where
    E: QueryExecutor + ?Sized,
{
    let mut replies = Vec::with_capacity(items.len());

    for (index, args) in items.into_iter().enumerate() {
        let reply = match mode {
            BatchMode::Exec => executor
                .execute(sql, &args)
                .await
                .map(|result| BatchReply::Exec(result.rows_affected())),
            BatchMode::QueryRow => executor.query_row(sql, &args).await.map(BatchReply::Row),
            BatchMode::Query => executor.query(sql, &args).await.map(BatchReply::Rows),
        };

        if let Err(e) = &reply {
            log::warn!("Batch item {} failed: {}", index, e);
        }
        replies.push(reply);
    }

    replies
}

/// Outcome of one item, tagged with its submission index
#[derive(Debug)]
pub struct BatchItem<T> {
    pub index: usize,
    pub outcome: Result<T>,
}

/// Per-item outcomes of a batch, ordered by submission index
#[derive(Debug)]
pub struct BatchResults<T> {
    items: Vec<BatchItem<T>>,
}

impl<T> BatchResults<T> {
    /// Decode raw replies; decoding errors stay attached to their item
    pub fn from_replies<F>(replies: Vec<Result<BatchReply>>, mut decode: F) -> Self
    where
        F: FnMut(BatchReply) -> Result<T>,
    {
        let items = replies
            .into_iter()
            .enumerate()
            .map(|(index, reply)| BatchItem {
                index,
                outcome: reply.and_then(&mut decode),
            })
            .collect();

        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Outcome of the item submitted at `index`
    pub fn get(&self, index: usize) -> Option<&Result<T>> {
        self.items.get(index).map(|item| &item.outcome)
    }

    pub fn iter(&self) -> impl Iterator<Item = &BatchItem<T>> {
        self.items.iter()
    }

    /// Visit every outcome in submission order
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(usize, &Result<T>),
    {
        for item in &self.items {
            f(item.index, &item.outcome);
        }
    }

    pub fn succeeded(&self) -> usize {
        self.items.iter().filter(|item| item.outcome.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.items.len() - self.succeeded()
    }

    pub fn into_results(self) -> Vec<Result<T>> {
        self.items.into_iter().map(|item| item.outcome).collect()
    }
}

impl<T> IntoIterator for BatchResults<T> {
    type Item = BatchItem<T>;
    type IntoIter = std::vec::IntoIter<BatchItem<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}
