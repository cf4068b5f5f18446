//! Cell value types

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Text layout used when a date/time value is coerced to its stored form
pub const STORED_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Largest serial Excel can represent (9999-12-31)
const MAX_SERIAL: f64 = 2_958_465.999_999;

/// A cell value as read from a spreadsheet, before it is collapsed to text
/// at the storage boundary.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum CellValue {
    /// No value
    #[default]
    Empty,
    /// String value
    Text(String),
    /// Numeric value (all numbers are f64 in Excel)
    Number(f64),
    /// Boolean value
    Boolean(bool),
    /// Date/time resolved through the cell's number format
    DateTime(NaiveDateTime),
    /// Error literal (e.g. `#DIV/0!`)
    Error(String),
}

impl CellValue {
    /// Create a text value
    pub fn text(s: impl Into<String>) -> Self {
        CellValue::Text(s.into())
    }

    /// True for `Empty` and for empty text
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// True when the value renders as nothing once surrounding whitespace is
    /// trimmed
    pub fn is_blank(&self) -> bool {
        match self.to_stored_text() {
            None => true,
            Some(s) => s.trim().is_empty(),
        }
    }

    /// Collapse the value to its stored text encoding.
    ///
    /// Returns `None` for values that are never persisted.
    ///
    /// ```
    /// use sheetvault_core::CellValue;
    ///
    /// assert_eq!(CellValue::Number(3.0).to_stored_text().as_deref(), Some("3"));
    /// assert_eq!(CellValue::Number(3.25).to_stored_text().as_deref(), Some("3.25"));
    /// assert_eq!(CellValue::Boolean(true).to_stored_text().as_deref(), Some("TRUE"));
    /// assert_eq!(CellValue::text("").to_stored_text(), None);
    /// ```
    pub fn to_stored_text(&self) -> Option<String> {
        match self {
            CellValue::Empty => None,
            CellValue::Text(s) if s.is_empty() => None,
            CellValue::Text(s) => Some(s.clone()),
            CellValue::Number(n) => Some(format_number(*n)),
            CellValue::Boolean(b) => Some(if *b { "TRUE" } else { "FALSE" }.to_string()),
            CellValue::DateTime(dt) => Some(dt.format(STORED_DATETIME_FORMAT).to_string()),
            CellValue::Error(code) => Some(code.clone()),
        }
    }
}

// f64's Display never switches to exponent notation and drops a zero fraction
fn format_number(n: f64) -> String {
    if n == 0.0 {
        // Normalizes -0
        return "0".to_string();
    }
    format!("{}", n)
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Boolean(b)
    }
}

impl From<NaiveDateTime> for CellValue {
    fn from(dt: NaiveDateTime) -> Self {
        CellValue::DateTime(dt)
    }
}

/// Convert an Excel serial date to a calendar date/time.
///
/// The 1900 system reproduces Excel's phantom 1900-02-29: serials below 60
/// are shifted by one day. Fractions are rounded to the nearest second.
/// Returns `None` for negative or out-of-range serials.
pub fn excel_serial_to_datetime(serial: f64, date_1904: bool) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 || serial > MAX_SERIAL {
        return None;
    }

    let epoch = if date_1904 {
        NaiveDate::from_ymd_opt(1904, 1, 1)?
    } else if serial < 60.0 {
        NaiveDate::from_ymd_opt(1899, 12, 31)?
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 30)?
    };

    let total_seconds = (serial * 86_400.0).round() as i64;
    epoch
        .and_hms_opt(0, 0, 0)?
        .checked_add_signed(Duration::seconds(total_seconds))
}
