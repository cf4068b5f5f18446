//! Blank-row segmentation of a sheet into independent tables

use crate::value::CellValue;
use serde::{Deserialize, Serialize};

/// Longest table name kept from a region's first row
pub const TABLE_NAME_MAX_CHARS: usize = 50;

/// One blank-row-bounded table inside a sheet (0-indexed, inclusive bounds)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRegion {
    pub region_index: u32,
    pub start_row: u32,
    pub start_col: u32,
    pub end_row: u32,
    pub end_col: u32,
    pub header_rows: u32,
    pub table_name: Option<String>,
}

fn is_blank_row(row: &[Option<CellValue>]) -> bool {
    row.iter().all(|cell| match cell {
        None => true,
        Some(value) => value.is_blank(),
    })
}

fn table_name(first_row: &[Option<CellValue>]) -> Option<String> {
    first_row.iter().flatten().find_map(|value| {
        let text = value.to_stored_text()?;
        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.chars().take(TABLE_NAME_MAX_CHARS).collect())
        }
    })
}

/// Segment a row matrix into tables separated by blank rows.
///
/// Every region spans columns `0..column_count` and has one header row. A
/// sheet holding a single contiguous table (or nothing) yields an empty list:
/// only sheets with two or more tables carry explicit regions.
pub fn detect_table_regions(rows: &[Vec<Option<CellValue>>], column_count: u32) -> Vec<TableRegion> {
    let end_col = column_count.saturating_sub(1);
    let mut regions = Vec::new();
    let mut open: Option<usize> = None;

    let close = |start: usize, end: usize, regions: &mut Vec<TableRegion>| {
        regions.push(TableRegion {
            region_index: regions.len() as u32,
            start_row: start as u32,
            start_col: 0,
            end_row: end as u32,
            end_col,
            header_rows: 1,
            table_name: table_name(&rows[start]),
        });
    };

    for (i, row) in rows.iter().enumerate() {
        let blank = is_blank_row(row);
        match open {
            None if !blank => open = Some(i),
            Some(start) if blank => {
                close(start, i - 1, &mut regions);
                open = None;
            }
            _ => {}
        }
    }

    if let Some(start) = open {
        close(start, rows.len() - 1, &mut regions);
    }

    if regions.len() == 1 {
        regions.clear();
    }

    regions
}
