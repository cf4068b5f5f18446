//! Store error types

use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// A thread panicked while holding the connection
    #[error("store connection lock poisoned")]
    Lock,

    /// A stored row that cannot be mapped back to a record
    #[error("corrupt record: {0}")]
    Corrupt(String),
}
