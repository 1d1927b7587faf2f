//! Error type for the feedback store.

use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// SQLite failure, tagged with the operation that hit it.
    #[error("[Feedback Store] {op}: {source}")]
    Sqlite {
        op: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    /// JSON column could not be encoded.
    #[error("[Feedback Store] json encode: {0}")]
    Json(#[from] serde_json::Error),

    /// Could not create the database directory.
    #[error("[Feedback Store] io: {0}")]
    Io(#[from] std::io::Error),

    /// Database schema is newer than this binary understands.
    #[error("[Feedback Store] schema version {found} is newer than supported {supported}")]
    SchemaTooNew { found: i64, supported: i64 },

    /// Update targeted a row that does not exist.
    #[error("[Feedback Store] {0} not found")]
    NotFound(&'static str),

    /// Connection mutex was poisoned by a panicking writer.
    #[error("[Feedback Store] connection lock poisoned")]
    Poisoned,

    /// Blocking task failed to complete.
    #[error("[Feedback Store] blocking task failed: {0}")]
    Join(String),
}

impl StoreError {
    pub(crate) fn sqlite(op: &'static str) -> impl FnOnce(rusqlite::Error) -> Self {
        move |source| Self::Sqlite { op, source }
    }
}
