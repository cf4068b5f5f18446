//! Paginated view reconstruction and the read-side accessors.
//!
//! Stored cells are sparse. A page is re-densified to the sheet's declared
//! column count, but only rows that own at least one stored cell appear in
//! the body: a gap in the sparse store stays a gap in the page.

use ahash::AHashMap;
use serde::Serialize;
use sheetvault_core::{MergeRange, TableRegion};
use sheetvault_store::{
    ChartRecord, DurableStore, FileId, FileListing, FileRecord, ImageId, ImageRecord, SheetId,
    SheetRecord,
};

use crate::error::{Missing, Result, SheetVaultError};
use crate::format::{image_content_type, SpreadsheetFormat};

/// Options controlling read-side paging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewOptions {
    /// Rows per page when the caller does not ask for a size
    pub default_page_size: u32,
    /// Largest page size a caller may ask for
    pub max_page_size: u32,
    /// Largest number of files returned by one listing call
    pub max_list_limit: u32,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            default_page_size: 50,
            max_page_size: 200,
            max_list_limit: 100,
        }
    }
}

/// One page of a sheet plus all of its overlay metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetPage {
    pub sheet_id: SheetId,
    pub sheet_name: String,
    /// Largest stored row index plus one
    pub total_rows: u32,
    pub total_columns: u32,
    pub page: u32,
    pub page_size: u32,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub merged_cells: Vec<MergeRange>,
    pub images: Vec<ImageRecord>,
    pub charts: Vec<ChartRecord>,
    pub table_regions: Vec<TableRegion>,
}

/// A file's metadata with its sheets
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileDetail {
    #[serde(flatten)]
    pub file: FileRecord,
    pub sheets: Vec<SheetRecord>,
}

/// The original upload, byte for byte
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Header text for a column with no usable row-0 value
pub fn fallback_header(column: u32) -> String {
    format!("列{}", column + 1)
}

/// Read-side operations over a [`DurableStore`]
pub struct SheetViewer<'a, S: DurableStore + ?Sized> {
    store: &'a S,
    options: ViewOptions,
}

impl<'a, S: DurableStore + ?Sized> SheetViewer<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self::with_options(store, ViewOptions::default())
    }

    pub fn with_options(store: &'a S, options: ViewOptions) -> Self {
        Self { store, options }
    }

    /// Reconstruct one page of a sheet.
    ///
    /// `page` is 1-based. `page_size` falls back to
    /// [`ViewOptions::default_page_size`]. The sheet must belong to `file_id`.
    pub fn page(
        &self,
        file_id: FileId,
        sheet_id: SheetId,
        page: u32,
        page_size: Option<u32>,
    ) -> Result<SheetPage> {
        let page_size = page_size.unwrap_or(self.options.default_page_size);
        if page < 1 {
            return Err(SheetVaultError::InvalidPage(format!(
                "page must be at least 1, got {page}"
            )));
        }
        if page_size < 1 || page_size > self.options.max_page_size {
            return Err(SheetVaultError::InvalidPage(format!(
                "page size must be between 1 and {}, got {page_size}",
                self.options.max_page_size
            )));
        }

        self.require_file(file_id)?;
        let sheet = self
            .store
            .get_sheet(sheet_id)?
            .filter(|sheet| sheet.file_id == file_id)
            .ok_or(SheetVaultError::NotFound(Missing::Sheet(sheet_id)))?;

        let max_row = self.store.get_max_row_index(sheet_id)?;
        let column_count = sheet.column_count;

        let headers = if max_row > 0 {
            let row0: AHashMap<u32, String> = self
                .store
                .get_cells_in_row_range(sheet_id, 0, 1)?
                .into_iter()
                .map(|cell| (cell.column_index, cell.value))
                .collect();
            (0..column_count)
                .map(|col| match row0.get(&col) {
                    Some(value) if !value.is_empty() => value.clone(),
                    _ => fallback_header(col),
                })
                .collect()
        } else {
            (0..column_count).map(fallback_header).collect()
        };

        // Row arithmetic in u64 so large page numbers cannot overflow
        let start = u64::from(page - 1) * u64::from(page_size);
        let end = (start + u64::from(page_size)).min(u64::from(max_row) + 1);

        let mut rows = Vec::new();
        if start < end {
            // end <= max_row + 1 <= u32::MAX + 1, and start < end
            let start = start as u32;
            let fetch_end = u32::try_from(end).unwrap_or(u32::MAX);
            let mut by_row: AHashMap<u32, AHashMap<u32, String>> = AHashMap::new();
            for cell in self
                .store
                .get_cells_in_row_range(sheet_id, start, fetch_end)?
            {
                by_row
                    .entry(cell.row_index)
                    .or_default()
                    .insert(cell.column_index, cell.value);
            }
            for row_index in u64::from(start)..end {
                let Some(mut cells) = by_row.remove(&(row_index as u32)) else {
                    continue;
                };
                rows.push(
                    (0..column_count)
                        .map(|col| cells.remove(&col).unwrap_or_default())
                        .collect(),
                );
            }
        }

        log::debug!(
            "sheet {} page {} (size {}): {} rows",
            sheet_id,
            page,
            page_size,
            rows.len()
        );

        Ok(SheetPage {
            sheet_id,
            sheet_name: sheet.sheet_name,
            total_rows: max_row.saturating_add(1),
            total_columns: column_count,
            page,
            page_size,
            headers,
            rows,
            merged_cells: self.store.get_merged_cells(sheet_id)?,
            images: self.store.get_images(sheet_id)?,
            charts: self.store.get_charts(sheet_id)?,
            table_regions: self.store.get_table_regions(sheet_id)?,
        })
    }

    pub fn file_detail(&self, file_id: FileId) -> Result<FileDetail> {
        let file = self.require_file(file_id)?;
        let sheets = self.store.list_sheets(file_id)?;
        Ok(FileDetail { file, sheets })
    }

    /// Files newest first. `limit` must be in `1..=max_list_limit`.
    pub fn list_files(&self, skip: u32, limit: u32) -> Result<FileListing> {
        if limit < 1 || limit > self.options.max_list_limit {
            return Err(SheetVaultError::InvalidPage(format!(
                "limit must be between 1 and {}, got {limit}",
                self.options.max_list_limit
            )));
        }
        Ok(self.store.list_files(skip, limit)?)
    }

    pub fn download(&self, file_id: FileId) -> Result<Download> {
        let file = self.require_file(file_id)?;
        let bytes = self
            .store
            .get_file_bytes(file_id)?
            .ok_or(SheetVaultError::NotFound(Missing::File(file_id)))?;
        let format =
            SpreadsheetFormat::from_file_name(&file.file_name).unwrap_or(SpreadsheetFormat::Xls);

        Ok(Download {
            file_name: file.file_name,
            content_type: format.content_type(),
            bytes,
        })
    }

    pub fn image(&self, image_id: ImageId) -> Result<ImagePayload> {
        let blob = self
            .store
            .get_image(image_id)?
            .ok_or(SheetVaultError::NotFound(Missing::Image(image_id)))?;
        Ok(ImagePayload {
            content_type: image_content_type(&blob.image_format),
            bytes: blob.data,
        })
    }

    /// Remove a file and everything parsed from it
    pub fn delete_file(&self, file_id: FileId) -> Result<()> {
        if self.store.delete_file(file_id)? {
            Ok(())
        } else {
            Err(SheetVaultError::NotFound(Missing::File(file_id)))
        }
    }

    fn require_file(&self, file_id: FileId) -> Result<FileRecord> {
        self.store
            .get_file(file_id)?
            .ok_or(SheetVaultError::NotFound(Missing::File(file_id)))
    }
}
