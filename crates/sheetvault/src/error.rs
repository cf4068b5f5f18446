//! Error types for the ingestion and view pipeline

use sheetvault_store::StoreError;
use thiserror::Error;

/// Result type alias for sheetvault operations
pub type Result<T> = std::result::Result<T, SheetVaultError>;

/// What a [`SheetVaultError::NotFound`] was looking for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Missing {
    File(i64),
    Sheet(i64),
    Image(i64),
}

impl std::fmt::Display for Missing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Missing::File(id) => write!(f, "file {id}"),
            Missing::Sheet(id) => write!(f, "sheet {id}"),
            Missing::Image(id) => write!(f, "image {id}"),
        }
    }
}

/// Errors surfaced to callers of the facade.
///
/// Every variant is terminal for the request that raised it.
#[derive(Error, Debug)]
pub enum SheetVaultError {
    /// File name does not end in `.xlsx` or `.xls`
    #[error("unsupported file format '{0}', expected .xlsx or .xls")]
    UnsupportedFormat(String),

    /// Upload exceeds the configured ceiling
    #[error("file is {size} bytes, the limit is {limit} bytes")]
    FileTooLarge { size: u64, limit: u64 },

    /// The format adapter could not interpret the bytes
    #[error("failed to parse spreadsheet: {cause}")]
    ParseFailure { cause: String },

    /// Unknown id, or a sheet that does not belong to the given file
    #[error("{0} not found")]
    NotFound(Missing),

    /// Page number or page size out of range
    #[error("invalid page request: {0}")]
    InvalidPage(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl SheetVaultError {
    pub(crate) fn parse_failure(cause: impl std::fmt::Display) -> Self {
        SheetVaultError::ParseFailure {
            cause: cause.to_string(),
        }
    }
}
