//! # sheetvault-xls
//!
//! Legacy XLS (BIFF8) format adapter for sheetvault.
//!
//! [`XlsReader`] reads the cell records and merged ranges of every worksheet.
//! The legacy format adapter never extracts images or charts: the
//! corresponding collections of each
//! [`SheetExtraction`](sheetvault_core::SheetExtraction) are always empty.

pub mod biff;
pub mod error;
pub mod merge;
pub mod reader;

pub use error::{XlsError, XlsResult};
pub use merge::{normalize_xls_merge, LegacyMergeRange};
pub use reader::XlsReader;
