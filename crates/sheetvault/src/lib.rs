//! # sheetvault
//!
//! Ingest spreadsheet files into a durable store and read them back as
//! paginated, re-densified views.
//!
//! ## Features
//!
//! - Read XLSX (Office Open XML) and legacy XLS (BIFF8) workbooks
//! - Sparse cell storage: only non-empty cells are persisted
//! - Merged cells, images and charts kept as overlay metadata
//! - Detection of several blank-row separated tables within one sheet
//! - Pages rebuilt on demand with headers taken from the first row
//!
//! Legacy XLS files never yield images or charts.
//!
//! ## Example
//!
//! ```rust,no_run
//! use sheetvault::prelude::*;
//!
//! let store = SqliteStore::open_path("vault.db")?;
//! let bytes = std::fs::read("report.xlsx")?;
//!
//! let receipt = Ingestor::new(&store).ingest("report.xlsx", bytes)?;
//!
//! let viewer = SheetViewer::new(&store);
//! let detail = viewer.file_detail(receipt.file_id)?;
//! let page = viewer.page(receipt.file_id, detail.sheets[0].id, 1, None)?;
//! println!("{:?}", page.headers);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod error;
pub mod format;
pub mod ingest;
pub mod prelude;
pub mod view;

pub use error::{Missing, Result, SheetVaultError};
pub use format::{image_content_type, SpreadsheetFormat};
pub use ingest::{IngestOptions, Ingestor, UploadReceipt, DEFAULT_MAX_FILE_SIZE};
pub use view::{
    fallback_header, Download, FileDetail, ImagePayload, SheetPage, SheetViewer, ViewOptions,
};

// Re-export the pieces callers need alongside the facade
pub use sheetvault_core::{
    detect_table_regions, CellValue, ChartKind, MergeRange, SheetExtraction, TableRegion,
};
pub use sheetvault_store::{
    DurableStore, FileId, FileListing, FileRecord, ImageId, SheetId, SheetRecord, SqliteStore,
    StoreError,
};
