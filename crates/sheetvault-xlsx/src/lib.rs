//! # sheetvault-xlsx
//!
//! XLSX (Office Open XML) format adapter for sheetvault.
//!
//! [`XlsxReader`] turns a workbook package into one
//! [`SheetExtraction`](sheetvault_core::SheetExtraction) per worksheet: sparse
//! cells, merged ranges, and the images and charts anchored on the sheet's
//! drawing.

pub mod error;
pub mod merge;
pub mod reader;

mod rels;

pub use error::{XlsxError, XlsxResult};
pub use merge::{normalize_xlsx_merge, XlsxMergeRef};
pub use reader::XlsxReader;
