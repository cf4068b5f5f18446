//! Records as they come back out of the store

use chrono::NaiveDateTime;
use serde::Serialize;
use sheetvault_core::{AnchorKind, ChartData, ChartKind};

pub type FileId = i64;
pub type SheetId = i64;
pub type ImageId = i64;
pub type ChartId = i64;

/// An uploaded file's metadata. The original bytes are fetched separately.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileRecord {
    pub id: FileId,
    pub file_name: String,
    pub file_size: u64,
    pub sheet_count: u32,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SheetRecord {
    pub id: SheetId,
    pub file_id: FileId,
    pub sheet_name: String,
    pub sheet_index: u32,
    pub row_count: u32,
    pub column_count: u32,
}

/// One stored cell; the value is already coerced to text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CellRecord {
    pub row_index: u32,
    pub column_index: u32,
    pub value: String,
}

impl CellRecord {
    pub fn new(row_index: u32, column_index: u32, value: impl Into<String>) -> Self {
        Self {
            row_index,
            column_index,
            value: value.into(),
        }
    }
}

/// Image placement metadata, without the payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageRecord {
    pub id: ImageId,
    pub sheet_id: SheetId,
    pub image_format: String,
    pub anchor_row: u32,
    pub anchor_col: u32,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub anchor_type: AnchorKind,
}

/// An image payload, as returned by [`DurableStore::get_image`](crate::DurableStore::get_image)
#[derive(Clone, PartialEq, Eq)]
pub struct ImageBlob {
    pub id: ImageId,
    pub image_format: String,
    pub data: Vec<u8>,
}

impl std::fmt::Debug for ImageBlob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageBlob")
            .field("id", &self.id)
            .field("image_format", &self.image_format)
            .field("data", &format_args!("<{} bytes>", self.data.len()))
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartRecord {
    pub id: ChartId,
    pub sheet_id: SheetId,
    pub chart_type: ChartKind,
    pub chart_title: Option<String>,
    pub chart_data: Option<ChartData>,
    pub anchor_row: u32,
    pub anchor_col: u32,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// One page of the file listing, newest first
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileListing {
    /// Number of files in the store, regardless of the page
    pub total: u64,
    pub files: Vec<FileRecord>,
}
