//! The durable store interface

use sheetvault_core::{ChartExtraction, ImageExtraction, MergeRange, TableRegion};

use crate::error::StoreResult;
use crate::records::{
    CellRecord, ChartId, ChartRecord, FileId, FileListing, FileRecord, ImageBlob, ImageId,
    ImageRecord, SheetId, SheetRecord,
};
use crate::writer::{write_sheet, UploadBatch};

/// Create, read and cascade-delete operations over uploaded files.
///
/// Every `*_bulk` write is all-or-nothing and a no-op for an empty batch.
/// Records are never updated after creation.
pub trait DurableStore {
    fn put_file(&self, name: &str, bytes: &[u8], sheet_count: u32) -> StoreResult<FileId>;

    fn put_sheet(
        &self,
        file_id: FileId,
        name: &str,
        index: u32,
        row_count: u32,
        column_count: u32,
    ) -> StoreResult<SheetId>;

    fn put_cells_bulk(&self, sheet_id: SheetId, cells: &[CellRecord]) -> StoreResult<()>;

    fn put_merged_cells_bulk(&self, sheet_id: SheetId, ranges: &[MergeRange]) -> StoreResult<()>;

    fn put_image(&self, sheet_id: SheetId, image: &ImageExtraction) -> StoreResult<ImageId>;

    fn put_chart(&self, sheet_id: SheetId, chart: &ChartExtraction) -> StoreResult<ChartId>;

    fn put_table_regions_bulk(&self, sheet_id: SheetId, regions: &[TableRegion]) -> StoreResult<()>;

    /// Cells with `start_row <= row_index < end_row`, in row-major order
    fn get_cells_in_row_range(
        &self,
        sheet_id: SheetId,
        start_row: u32,
        end_row: u32,
    ) -> StoreResult<Vec<CellRecord>>;

    /// Largest stored row index of the sheet, `0` when it has no cells
    fn get_max_row_index(&self, sheet_id: SheetId) -> StoreResult<u32>;

    fn get_merged_cells(&self, sheet_id: SheetId) -> StoreResult<Vec<MergeRange>>;

    fn get_images(&self, sheet_id: SheetId) -> StoreResult<Vec<ImageRecord>>;

    fn get_charts(&self, sheet_id: SheetId) -> StoreResult<Vec<ChartRecord>>;

    /// Regions ordered by `region_index`
    fn get_table_regions(&self, sheet_id: SheetId) -> StoreResult<Vec<TableRegion>>;

    /// Remove a file with its sheets and everything they own. Returns
    /// `false` when the file does not exist.
    fn delete_file(&self, file_id: FileId) -> StoreResult<bool>;

    fn get_file(&self, file_id: FileId) -> StoreResult<Option<FileRecord>>;

    fn get_file_bytes(&self, file_id: FileId) -> StoreResult<Option<Vec<u8>>>;

    fn list_files(&self, skip: u32, limit: u32) -> StoreResult<FileListing>;

    /// Sheets of a file ordered by index
    fn list_sheets(&self, file_id: FileId) -> StoreResult<Vec<SheetRecord>>;

    fn get_sheet(&self, sheet_id: SheetId) -> StoreResult<Option<SheetRecord>>;

    fn get_image(&self, image_id: ImageId) -> StoreResult<Option<ImageBlob>>;

    /// Persist a whole parsed upload.
    ///
    /// This default issues the individual writes one after another. Each bulk
    /// write is atomic, but the upload as a whole is not: readers can observe
    /// a partially written file until the compensating delete that follows a
    /// failure has run. Backends with multi-statement transactions override
    /// this to make the whole upload one unit.
    fn write_upload(&self, upload: &UploadBatch) -> StoreResult<FileId> {
        let file_id = self.put_file(&upload.file_name, &upload.bytes, upload.sheets.len() as u32)?;
        for sheet in &upload.sheets {
            if let Err(e) = write_sheet(self, file_id, sheet) {
                log::warn!(
                    "upload of '{}' failed at sheet '{}', removing file {}: {}",
                    upload.file_name,
                    sheet.name,
                    file_id,
                    e
                );
                if let Err(cleanup) = self.delete_file(file_id) {
                    log::warn!("cleanup of file {file_id} failed: {cleanup}");
                }
                return Err(e);
            }
        }
        Ok(file_id)
    }
}
