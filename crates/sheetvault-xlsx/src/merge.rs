//! Merged-cell ranges as written in `<mergeCell ref="..."/>`

use sheetvault_core::{CellAddress, MergeRange};

use crate::error::{XlsxError, XlsxResult};

/// A merge range in the package's own numbering: 1-based, inclusive on both
/// axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XlsxMergeRef {
    pub min_row: u32,
    pub min_col: u32,
    pub max_row: u32,
    pub max_col: u32,
}

impl XlsxMergeRef {
    /// Parse a `ref` attribute such as `"B2:C3"`
    pub fn parse(reference: &str) -> XlsxResult<Self> {
        let (start, end) = CellAddress::parse_range_numbers(reference)?;
        Ok(Self {
            min_row: start.row.min(end.row),
            min_col: start.col.min(end.col),
            max_row: start.row.max(end.row),
            max_col: start.col.max(end.col),
        })
    }
}

/// Convert a 1-based inclusive range to the 0-based inclusive form.
///
/// Every bound moves down by one. Ranges touching row or column 0 cannot come
/// from a valid reference and yield `None`.
///
/// ```
/// use sheetvault_xlsx::{normalize_xlsx_merge, XlsxMergeRef};
///
/// let native = XlsxMergeRef { min_row: 2, min_col: 1, max_row: 3, max_col: 1 };
/// let range = normalize_xlsx_merge(native).unwrap();
/// assert_eq!((range.start_row, range.start_col, range.end_row, range.end_col), (1, 0, 2, 0));
/// ```
pub fn normalize_xlsx_merge(native: XlsxMergeRef) -> Option<MergeRange> {
    MergeRange::new(
        native.min_row.checked_sub(1)?,
        native.min_col.checked_sub(1)?,
        native.max_row.checked_sub(1)?,
        native.max_col.checked_sub(1)?,
    )
}

pub(crate) fn parse_merge_ref(reference: &str) -> XlsxResult<MergeRange> {
    let native = XlsxMergeRef::parse(reference)?;
    normalize_xlsx_merge(native)
        .ok_or_else(|| XlsxError::Parse(format!("Invalid merge range '{}'", reference)))
}
