//! Parse-pass output: one [`SheetExtraction`] per sheet, with its overlays.

use crate::value::CellValue;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A non-empty cell at a zero-based position
#[derive(Debug, Clone, PartialEq)]
pub struct SparseCell {
    pub row: u32,
    pub col: u32,
    pub value: CellValue,
}

impl SparseCell {
    pub fn new(row: u32, col: u32, value: CellValue) -> Self {
        Self { row, col, value }
    }
}

/// A merged region, 0-indexed with inclusive bounds on both axes.
///
/// Constructed only through the per-format normalizers, which reject ranges
/// whose start lies past their end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MergeRange {
    pub start_row: u32,
    pub start_col: u32,
    pub end_row: u32,
    pub end_col: u32,
}

impl MergeRange {
    /// Build a range, returning `None` unless `start <= end` on both axes
    pub fn new(start_row: u32, start_col: u32, end_row: u32, end_col: u32) -> Option<Self> {
        if start_row > end_row || start_col > end_col {
            return None;
        }
        Some(Self {
            start_row,
            start_col,
            end_row,
            end_col,
        })
    }

    /// Check if the range contains a cell
    pub fn contains(&self, row: u32, col: u32) -> bool {
        row >= self.start_row && row <= self.end_row && col >= self.start_col && col <= self.end_col
    }
}

/// Which DrawingML anchor element positioned a floating object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AnchorKind {
    #[default]
    #[serde(rename = "oneCellAnchor")]
    OneCell,
    #[serde(rename = "twoCellAnchor")]
    TwoCell,
    #[serde(rename = "absoluteAnchor")]
    Absolute,
}

impl AnchorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnchorKind::OneCell => "oneCellAnchor",
            AnchorKind::TwoCell => "twoCellAnchor",
            AnchorKind::Absolute => "absoluteAnchor",
        }
    }

    /// Parse an anchor element's local name
    pub fn from_local_name(name: &str) -> Option<Self> {
        match name {
            "oneCellAnchor" => Some(AnchorKind::OneCell),
            "twoCellAnchor" => Some(AnchorKind::TwoCell),
            "absoluteAnchor" => Some(AnchorKind::Absolute),
            _ => None,
        }
    }
}

impl fmt::Display for AnchorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a floating object sits, before it is collapsed to a row/column pair.
///
/// Images may be positioned either by a `from` marker (a cell plus an offset
/// inside it) or by a plain row/column pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageAnchor {
    FromMarker {
        row: u32,
        col: u32,
        row_offset_emu: i64,
        col_offset_emu: i64,
    },
    Direct {
        row: u32,
        col: u32,
    },
}

impl ImageAnchor {
    /// The zero-based `(row, col)` the object is attached to
    pub fn cell(&self) -> (u32, u32) {
        match *self {
            ImageAnchor::FromMarker { row, col, .. } => (row, col),
            ImageAnchor::Direct { row, col } => (row, col),
        }
    }
}

/// An embedded picture and its placement
#[derive(Clone, PartialEq)]
pub struct ImageExtraction {
    pub data: Vec<u8>,
    pub format: String,
    pub anchor_row: u32,
    pub anchor_col: u32,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub anchor_type: AnchorKind,
}

impl ImageExtraction {
    pub fn new(data: Vec<u8>, format: impl Into<String>, anchor: ImageAnchor) -> Self {
        let (anchor_row, anchor_col) = anchor.cell();
        Self {
            data,
            format: format.into(),
            anchor_row,
            anchor_col,
            width: None,
            height: None,
            anchor_type: AnchorKind::default(),
        }
    }
}

impl fmt::Debug for ImageExtraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageExtraction")
            .field("data", &format_args!("<{} bytes>", self.data.len()))
            .field("format", &self.format)
            .field("anchor_row", &self.anchor_row)
            .field("anchor_col", &self.anchor_col)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("anchor_type", &self.anchor_type)
            .finish()
    }
}

/// Chart type vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartKind {
    Bar,
    Bar3D,
    Line,
    Line3D,
    Pie,
    Pie3D,
    Area,
    Area3D,
    Scatter,
    Radar,
    Doughnut,
    Bubble,
    Stock,
    Surface,
    Surface3D,
    Unknown,
}

impl ChartKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartKind::Bar => "bar",
            ChartKind::Bar3D => "bar3d",
            ChartKind::Line => "line",
            ChartKind::Line3D => "line3d",
            ChartKind::Pie => "pie",
            ChartKind::Pie3D => "pie3d",
            ChartKind::Area => "area",
            ChartKind::Area3D => "area3d",
            ChartKind::Scatter => "scatter",
            ChartKind::Radar => "radar",
            ChartKind::Doughnut => "doughnut",
            ChartKind::Bubble => "bubble",
            ChartKind::Stock => "stock",
            ChartKind::Surface => "surface",
            ChartKind::Surface3D => "surface3d",
            ChartKind::Unknown => "unknown",
        }
    }

    /// Map a stored tag back to a kind; unknown tags map to `Unknown`
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "bar" => ChartKind::Bar,
            "bar3d" => ChartKind::Bar3D,
            "line" => ChartKind::Line,
            "line3d" => ChartKind::Line3D,
            "pie" => ChartKind::Pie,
            "pie3d" => ChartKind::Pie3D,
            "area" => ChartKind::Area,
            "area3d" => ChartKind::Area3D,
            "scatter" => ChartKind::Scatter,
            "radar" => ChartKind::Radar,
            "doughnut" => ChartKind::Doughnut,
            "bubble" => ChartKind::Bubble,
            "stock" => ChartKind::Stock,
            "surface" => ChartKind::Surface,
            "surface3d" => ChartKind::Surface3D,
            _ => ChartKind::Unknown,
        }
    }

    /// Map a DrawingML plot element (`barChart`, `pie3DChart`, ...) to a kind.
    ///
    /// Returns `None` for elements that are not plot types at all, so callers
    /// can keep scanning `c:plotArea`.
    pub fn from_plot_element(local_name: &str) -> Option<Self> {
        let kind = match local_name {
            "barChart" => ChartKind::Bar,
            "bar3DChart" => ChartKind::Bar3D,
            "lineChart" => ChartKind::Line,
            "line3DChart" => ChartKind::Line3D,
            "pieChart" | "ofPieChart" => ChartKind::Pie,
            "pie3DChart" => ChartKind::Pie3D,
            "areaChart" => ChartKind::Area,
            "area3DChart" => ChartKind::Area3D,
            "scatterChart" => ChartKind::Scatter,
            "radarChart" => ChartKind::Radar,
            "doughnutChart" => ChartKind::Doughnut,
            "bubbleChart" => ChartKind::Bubble,
            "stockChart" => ChartKind::Stock,
            "surfaceChart" => ChartKind::Surface,
            "surface3DChart" => ChartKind::Surface3D,
            other if other.ends_with("Chart") => ChartKind::Unknown,
            _ => return None,
        };
        Some(kind)
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ChartKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One data series of a chart
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SeriesInfo {
    pub index: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories_ref: Option<String>,
}

/// Structured series metadata persisted with a chart
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChartData {
    pub series: Vec<SeriesInfo>,
}

impl ChartData {
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// An embedded chart's structural metadata
#[derive(Debug, Clone, PartialEq)]
pub struct ChartExtraction {
    pub kind: ChartKind,
    pub title: Option<String>,
    pub data: ChartData,
    pub anchor_row: u32,
    pub anchor_col: u32,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Result of extracting one floating object
#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome<T> {
    Extracted(T),
    Skipped { reason: String },
}

impl<T> ItemOutcome<T> {
    pub fn skipped(reason: impl Into<String>) -> Self {
        ItemOutcome::Skipped {
            reason: reason.into(),
        }
    }

    pub fn extracted(&self) -> Option<&T> {
        match self {
            ItemOutcome::Extracted(item) => Some(item),
            ItemOutcome::Skipped { .. } => None,
        }
    }

    pub fn skip_reason(&self) -> Option<&str> {
        match self {
            ItemOutcome::Extracted(_) => None,
            ItemOutcome::Skipped { reason } => Some(reason),
        }
    }
}

impl<T, E: fmt::Display> From<std::result::Result<T, E>> for ItemOutcome<T> {
    fn from(result: std::result::Result<T, E>) -> Self {
        match result {
            Ok(item) => ItemOutcome::Extracted(item),
            Err(e) => ItemOutcome::Skipped {
                reason: e.to_string(),
            },
        }
    }
}

/// A skipped image or chart, as reported by [`SheetExtraction::skipped_items`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedItem {
    pub kind: &'static str,
    pub reason: String,
}

/// Everything one parse pass produced for one sheet
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SheetExtraction {
    pub name: String,
    /// Zero-based position in the workbook
    pub index: u32,
    pub row_count: u32,
    pub column_count: u32,
    /// Non-empty cells in row-major order
    pub cells: Vec<SparseCell>,
    pub merged_cells: Vec<MergeRange>,
    pub images: Vec<ItemOutcome<ImageExtraction>>,
    pub charts: Vec<ItemOutcome<ChartExtraction>>,
}

impl SheetExtraction {
    pub fn new(name: impl Into<String>, index: u32) -> Self {
        Self {
            name: name.into(),
            index,
            ..Default::default()
        }
    }

    pub fn extracted_images(&self) -> impl Iterator<Item = &ImageExtraction> {
        self.images.iter().filter_map(ItemOutcome::extracted)
    }

    pub fn extracted_charts(&self) -> impl Iterator<Item = &ChartExtraction> {
        self.charts.iter().filter_map(ItemOutcome::extracted)
    }

    pub fn skipped_items(&self) -> Vec<SkippedItem> {
        let images = self.images.iter().filter_map(|o| {
            o.skip_reason().map(|reason| SkippedItem {
                kind: "image",
                reason: reason.to_string(),
            })
        });
        let charts = self.charts.iter().filter_map(|o| {
            o.skip_reason().map(|reason| SkippedItem {
                kind: "chart",
                reason: reason.to_string(),
            })
        });
        images.chain(charts).collect()
    }

    /// Materialize the dense row matrix (`row_count` rows) consumed by the
    /// table region detector.
    ///
    /// Rows are as wide as the widest populated cell in them; positions
    /// without a stored cell are `None`.
    pub fn row_matrix(&self) -> Vec<Vec<Option<CellValue>>> {
        let height = self
            .cells
            .iter()
            .map(|c| c.row + 1)
            .max()
            .unwrap_or(0)
            .max(self.row_count) as usize;
        let mut rows: Vec<Vec<Option<CellValue>>> = vec![Vec::new(); height];

        for cell in &self.cells {
            let row = &mut rows[cell.row as usize];
            let col = cell.col as usize;
            if row.len() <= col {
                row.resize(col + 1, None);
            }
            row[col] = Some(cell.value.clone());
        }

        rows
    }
}
