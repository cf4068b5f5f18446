//! # sheetvault-store
//!
//! The durable store consumed by the ingestion pipeline and the paginated
//! view reconstructor.
//!
//! [`DurableStore`] names the create/read/delete operations the core needs.
//! Records are written once at upload time and only ever removed as a unit
//! by [`DurableStore::delete_file`]. [`SqliteStore`] implements the trait on
//! top of a single SQLite connection.

pub mod error;
pub mod records;
mod schema;
pub mod sqlite;
pub mod store;
pub mod writer;

pub use error::{StoreError, StoreResult};
pub use records::{
    CellRecord, ChartId, ChartRecord, FileId, FileListing, FileRecord, ImageBlob, ImageId,
    ImageRecord, SheetId, SheetRecord,
};
pub use sqlite::SqliteStore;
pub use store::DurableStore;
pub use writer::{cell_records, write_sheet, SheetBatch, UploadBatch};
