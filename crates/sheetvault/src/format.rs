//! Accepted spreadsheet formats

use std::path::Path;

use sheetvault_core::SheetExtraction;
use sheetvault_xls::XlsReader;
use sheetvault_xlsx::XlsxReader;

use crate::error::{Result, SheetVaultError};

/// The two formats an upload may be in, chosen by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpreadsheetFormat {
    /// Office Open XML workbook
    Xlsx,
    /// Legacy BIFF8 workbook
    Xls,
}

impl SpreadsheetFormat {
    /// Pick the format from a file name's extension, case-insensitively.
    pub fn from_file_name(name: &str) -> Result<Self> {
        let extension = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match extension.as_deref() {
            Some("xlsx") => Ok(SpreadsheetFormat::Xlsx),
            Some("xls") => Ok(SpreadsheetFormat::Xls),
            _ => Err(SheetVaultError::UnsupportedFormat(name.to_string())),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            SpreadsheetFormat::Xlsx => "xlsx",
            SpreadsheetFormat::Xls => "xls",
        }
    }

    /// MIME type used when the original bytes are handed back
    pub fn content_type(&self) -> &'static str {
        match self {
            SpreadsheetFormat::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            SpreadsheetFormat::Xls => "application/vnd.ms-excel",
        }
    }

    /// Run the matching format adapter. Any adapter error becomes a
    /// [`SheetVaultError::ParseFailure`].
    pub fn parse(&self, bytes: &[u8]) -> Result<Vec<SheetExtraction>> {
        match self {
            SpreadsheetFormat::Xlsx => {
                XlsxReader::read_bytes(bytes).map_err(SheetVaultError::parse_failure)
            }
            SpreadsheetFormat::Xls => {
                XlsReader::read_bytes(bytes).map_err(SheetVaultError::parse_failure)
            }
        }
    }
}

impl std::fmt::Display for SpreadsheetFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, ".{}", self.extension())
    }
}

/// MIME type for a stored image format tag
pub fn image_content_type(format: &str) -> &'static str {
    match format.to_lowercase().as_str() {
        "png" => "image/png",
        "jpeg" | "jpg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "tiff" | "tif" => "image/tiff",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "emf" => "image/emf",
        "wmf" => "image/wmf",
        _ => "application/octet-stream",
    }
}
