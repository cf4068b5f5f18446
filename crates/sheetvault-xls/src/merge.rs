//! Merged-cell ranges in the legacy half-open convention

use sheetvault_core::MergeRange;

/// A merge range as the legacy format's readers report it: starts are
/// 0-based and inclusive, ends are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegacyMergeRange {
    pub row_start: u32,
    pub row_end_exclusive: u32,
    pub col_start: u32,
    pub col_end_exclusive: u32,
}

impl LegacyMergeRange {
    /// Build from a MERGECELLS entry, whose bounds are all inclusive.
    pub fn from_inclusive(first_row: u16, last_row: u16, first_col: u16, last_col: u16) -> Self {
        Self {
            row_start: first_row as u32,
            row_end_exclusive: last_row as u32 + 1,
            col_start: first_col as u32,
            col_end_exclusive: last_col as u32 + 1,
        }
    }
}

/// Convert a half-open legacy range to the 0-based inclusive form.
///
/// Only the exclusive ends move down by one; the starts are kept as they
/// are. Empty ranges yield `None`.
///
/// ```
/// use sheetvault_xls::{normalize_xls_merge, LegacyMergeRange};
///
/// let native = LegacyMergeRange { row_start: 1, row_end_exclusive: 3, col_start: 0, col_end_exclusive: 1 };
/// let range = normalize_xls_merge(native).unwrap();
/// assert_eq!((range.start_row, range.start_col, range.end_row, range.end_col), (1, 0, 2, 0));
/// ```
pub fn normalize_xls_merge(native: LegacyMergeRange) -> Option<MergeRange> {
    MergeRange::new(
        native.row_start,
        native.col_start,
        native.row_end_exclusive.checked_sub(1)?,
        native.col_end_exclusive.checked_sub(1)?,
    )
}
