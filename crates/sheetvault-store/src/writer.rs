//! Sparse cell store writer.
//!
//! Turns a parse pass into store-ready batches: cells are collapsed to their
//! stored text (empty values are dropped, their absence encodes "empty"),
//! skipped images and charts are left out, and each record family of a sheet
//! goes to the store in one bulk write.

use sheetvault_core::{
    ChartExtraction, ImageExtraction, ItemOutcome, MergeRange, SheetExtraction, SparseCell,
    TableRegion,
};

use crate::error::StoreResult;
use crate::records::{CellRecord, FileId, SheetId};
use crate::store::DurableStore;

/// Everything stored for one sheet
#[derive(Debug, Clone, PartialEq)]
pub struct SheetBatch {
    pub name: String,
    pub index: u32,
    pub row_count: u32,
    pub column_count: u32,
    pub cells: Vec<CellRecord>,
    pub merged_cells: Vec<MergeRange>,
    pub images: Vec<ImageExtraction>,
    pub charts: Vec<ChartExtraction>,
    pub table_regions: Vec<TableRegion>,
}

impl SheetBatch {
    pub fn from_extraction(sheet: SheetExtraction, table_regions: Vec<TableRegion>) -> Self {
        Self {
            cells: cell_records(&sheet.cells),
            images: sheet.images.into_iter().filter_map(extracted).collect(),
            charts: sheet.charts.into_iter().filter_map(extracted).collect(),
            name: sheet.name,
            index: sheet.index,
            row_count: sheet.row_count,
            column_count: sheet.column_count,
            merged_cells: sheet.merged_cells,
            table_regions,
        }
    }
}

fn extracted<T>(outcome: ItemOutcome<T>) -> Option<T> {
    match outcome {
        ItemOutcome::Extracted(item) => Some(item),
        ItemOutcome::Skipped { .. } => None,
    }
}

/// A whole upload: the original bytes plus one batch per sheet
#[derive(Debug, Clone, PartialEq)]
pub struct UploadBatch {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub sheets: Vec<SheetBatch>,
}

/// Coerce cells to their stored text, dropping the ones that store nothing.
pub fn cell_records(cells: &[SparseCell]) -> Vec<CellRecord> {
    cells
        .iter()
        .filter_map(|cell| {
            cell.value
                .to_stored_text()
                .map(|text| CellRecord::new(cell.row, cell.col, text))
        })
        .collect()
}

/// Write one sheet and its dependents through the store's individual
/// operations.
pub fn write_sheet<S: DurableStore + ?Sized>(
    store: &S,
    file_id: FileId,
    sheet: &SheetBatch,
) -> StoreResult<SheetId> {
    let sheet_id = store.put_sheet(
        file_id,
        &sheet.name,
        sheet.index,
        sheet.row_count,
        sheet.column_count,
    )?;
    store.put_cells_bulk(sheet_id, &sheet.cells)?;
    store.put_merged_cells_bulk(sheet_id, &sheet.merged_cells)?;
    for image in &sheet.images {
        store.put_image(sheet_id, image)?;
    }
    for chart in &sheet.charts {
        store.put_chart(sheet_id, chart)?;
    }
    store.put_table_regions_bulk(sheet_id, &sheet.table_regions)?;
    Ok(sheet_id)
}
