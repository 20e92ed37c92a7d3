use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by generated query code
#[derive(Error, Debug)]
pub enum Error {
    /// A single-row query matched nothing
    #[error("No rows returned")]
    NotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    #[error("Transaction already finished")]
    TransactionClosed,

    /// Bulk copy stopped early; `written` rows made it in before `source`
    #[error("Bulk copy failed after {written} row(s): {source}")]
    BulkCopy {
        written: u64,
        #[source]
        source: Box<Error>,
    },

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a database error
    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    /// Create a decode error
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Create an unsupported-operation error
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound)
    }

    /// Rows a failed bulk copy wrote before stopping
    pub fn rows_written(&self) -> Option<u64> {
        match self {
            Error::BulkCopy { written, .. } => Some(*written),
            _ => None,
        }
    }
}
