//! Prelude module - common imports for sheetvault users
//!
//! ```rust
//! use sheetvault::prelude::*;
//! ```

pub use crate::{
    // Storage
    DurableStore,
    FileId,
    // Upload
    IngestOptions,
    Ingestor,
    // Errors
    Result,
    SheetId,
    SheetPage,
    SheetVaultError,
    // Read side
    SheetViewer,
    SpreadsheetFormat,
    SqliteStore,
    UploadReceipt,
    ViewOptions,
};
