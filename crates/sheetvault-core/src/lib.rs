//! # sheetvault-core
//!
//! Core data structures shared by the sheetvault format adapters, the durable
//! store and the view reconstructor.
//!
//! This crate provides:
//! - [`CellValue`] - Typed cell values and their coercion to stored text
//! - [`CellAddress`] - A1-style address parsing
//! - [`SheetExtraction`] - Everything one parse pass yields for one sheet
//! - [`MergeRange`], [`ImageExtraction`], [`ChartExtraction`] - Overlay metadata
//! - [`TableRegion`] and [`detect_table_regions`] - Multi-table segmentation
//!
//! ## Example
//!
//! ```rust
//! use sheetvault_core::{detect_table_regions, CellValue};
//!
//! let rows = vec![
//!     vec![Some(CellValue::text("Sales"))],
//!     vec![None],
//!     vec![Some(CellValue::text("Costs"))],
//! ];
//! let regions = detect_table_regions(&rows, 1);
//! assert_eq!(regions.len(), 2);
//! assert_eq!(regions[1].table_name.as_deref(), Some("Costs"));
//! ```

pub mod address;
pub mod error;
pub mod extraction;
pub mod region;
pub mod value;

pub use address::CellAddress;
pub use error::{Error, Error as CoreError, Result};
pub use extraction::{
    AnchorKind, ChartData, ChartExtraction, ChartKind, ImageAnchor, ImageExtraction,
    ItemOutcome, MergeRange, SeriesInfo, SheetExtraction, SkippedItem, SparseCell,
};
pub use region::{detect_table_regions, TableRegion, TABLE_NAME_MAX_CHARS};
pub use value::{excel_serial_to_datetime, CellValue};

/// Maximum number of rows in a worksheet (Excel limit)
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a worksheet (Excel limit)
pub const MAX_COLS: u32 = 16_384;
