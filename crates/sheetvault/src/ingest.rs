//! Upload pipeline: validate, parse, detect regions, persist.

use serde::Serialize;
use sheetvault_core::detect_table_regions;
use sheetvault_store::{DurableStore, FileId, SheetBatch, UploadBatch};

use crate::error::{Result, SheetVaultError};
use crate::format::SpreadsheetFormat;

/// Default upload ceiling: 50 MiB
pub const DEFAULT_MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// Options controlling uploads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestOptions {
    /// Largest accepted upload in bytes. Anything bigger is rejected before
    /// parsing.
    pub max_file_size: u64,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

/// What a successful upload returns
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadReceipt {
    pub file_id: FileId,
    pub file_name: String,
    pub sheet_count: u32,
}

/// Turns uploaded bytes into stored records.
///
/// Parsing is CPU-bound and runs on the calling thread; async callers should
/// move [`Ingestor::ingest`] onto a blocking pool.
pub struct Ingestor<'a, S: DurableStore + ?Sized> {
    store: &'a S,
    options: IngestOptions,
}

impl<'a, S: DurableStore + ?Sized> Ingestor<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self::with_options(store, IngestOptions::default())
    }

    pub fn with_options(store: &'a S, options: IngestOptions) -> Self {
        Self { store, options }
    }

    /// Validate, parse and persist one upload.
    ///
    /// Nothing is written unless the whole file parses.
    pub fn ingest(&self, file_name: &str, bytes: Vec<u8>) -> Result<UploadReceipt> {
        let upload = self.prepare(file_name, bytes)?;
        let sheet_count = upload.sheets.len() as u32;
        let file_id = self.store.write_upload(&upload)?;

        log::info!(
            "stored '{}' as file {} ({} bytes, {} sheets)",
            upload.file_name,
            file_id,
            upload.bytes.len(),
            sheet_count
        );

        Ok(UploadReceipt {
            file_id,
            file_name: upload.file_name,
            sheet_count,
        })
    }

    /// Everything [`ingest`](Self::ingest) does short of touching the store.
    pub fn prepare(&self, file_name: &str, bytes: Vec<u8>) -> Result<UploadBatch> {
        let format = SpreadsheetFormat::from_file_name(file_name)?;

        let size = bytes.len() as u64;
        if size > self.options.max_file_size {
            return Err(SheetVaultError::FileTooLarge {
                size,
                limit: self.options.max_file_size,
            });
        }

        let sheets = format.parse(&bytes)?;
        log::debug!("parsed '{}' as {}: {} sheets", file_name, format, sheets.len());

        let sheets = sheets
            .into_iter()
            .map(|sheet| {
                for skipped in sheet.skipped_items() {
                    log::debug!("sheet '{}': {:?}", sheet.name, skipped);
                }
                let regions = detect_table_regions(&sheet.row_matrix(), sheet.column_count);
                if !regions.is_empty() {
                    log::debug!("sheet '{}': {} table regions", sheet.name, regions.len());
                }
                SheetBatch::from_extraction(sheet, regions)
            })
            .collect();

        Ok(UploadBatch {
            file_name: file_name.to_string(),
            bytes,
            sheets,
        })
    }
}
