//! XLS (BIFF8) reader.
//!
//! Opens the Compound File Binary container, reads the `Workbook` stream,
//! parses the globals substream (shared strings and sheet directory) and then
//! every worksheet substream the directory points at.

use std::collections::BTreeMap;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

use sheetvault_core::{CellValue, MergeRange, SheetExtraction, SparseCell};

use crate::biff::parser::{read_f64, read_rk, read_u16, read_u32, read_u8};
use crate::biff::records;
use crate::biff::strings::{parse_sst, read_short_string, read_unicode_string};
use crate::biff::{self, BiffRecord};
use crate::error::{XlsError, XlsResult};
use crate::merge::{normalize_xls_merge, LegacyMergeRange};

/// XLS file reader.
pub struct XlsReader;

/// Sheet directory entry from a BOUNDSHEET record.
#[derive(Debug)]
struct SheetInfo {
    /// Stream offset of the sheet's BOF record
    offset: u32,
    sheet_type: u8,
    name: String,
}

#[derive(Debug, Default)]
struct Globals {
    sst: Vec<String>,
    sheets: Vec<SheetInfo>,
}

/// Error literal for a BOOLERR / FORMULA error code.
fn error_literal(code: u8) -> &'static str {
    match code {
        0x00 => "#NULL!",
        0x07 => "#DIV/0!",
        0x0F => "#VALUE!",
        0x17 => "#REF!",
        0x1D => "#NAME?",
        0x24 => "#NUM!",
        0x2A => "#N/A",
        0x2B => "#GETTING_DATA",
        _ => "#VALUE!",
    }
}

/// Cells and merges collected from one worksheet substream.
#[derive(Debug, Default)]
struct SheetBuilder {
    cells: BTreeMap<(u32, u32), CellValue>,
    merged_cells: Vec<MergeRange>,
    last_row: Option<u32>,
    last_col: Option<u32>,
}

impl SheetBuilder {
    /// Record a value cell. Empty values widen the extent but are not kept.
    fn put(&mut self, row: u16, col: u16, value: CellValue) {
        let (row, col) = (row as u32, col as u32);
        self.last_row = Some(self.last_row.map_or(row, |r| r.max(row)));
        self.last_col = Some(self.last_col.map_or(col, |c| c.max(col)));
        if value.is_empty() {
            self.cells.remove(&(row, col));
        } else {
            self.cells.insert((row, col), value);
        }
    }

    fn finish(self, name: &str, index: u32) -> SheetExtraction {
        let mut sheet = SheetExtraction::new(name, index);
        sheet.row_count = self.last_row.map_or(0, |r| r + 1);
        sheet.column_count = self.last_col.map_or(0, |c| c + 1);
        sheet.cells = self
            .cells
            .into_iter()
            .map(|((row, col), value)| SparseCell::new(row, col, value))
            .collect();
        sheet.merged_cells = self.merged_cells;
        sheet
    }
}

/// The leading row/col/xf triple shared by every cell record.
fn cell_header(data: &[u8], off: &mut usize) -> XlsResult<(u16, u16)> {
    let row = read_u16(data, off)?;
    let col = read_u16(data, off)?;
    let _xf = read_u16(data, off)?;
    Ok((row, col))
}

impl XlsReader {
    /// Read an XLS file from a filesystem path.
    pub fn read_file<P: AsRef<Path>>(path: P) -> XlsResult<Vec<SheetExtraction>> {
        let file = std::fs::File::open(path.as_ref())?;
        Self::read(file)
    }

    /// Read an XLS file held in memory.
    pub fn read_bytes(bytes: &[u8]) -> XlsResult<Vec<SheetExtraction>> {
        Self::read(Cursor::new(bytes))
    }

    /// Read an XLS file from any `Read + Seek` source, one extraction per
    /// worksheet in workbook order. Chart sheets and macro sheets are skipped.
    pub fn read<R: Read + Seek>(reader: R) -> XlsResult<Vec<SheetExtraction>> {
        let mut cfb = cfb::CompoundFile::open(reader)?;

        // BIFF5 files name the stream "Book"; the version check rejects them
        let stream_path = if cfb.exists("/Workbook") {
            "/Workbook"
        } else if cfb.exists("/Book") {
            "/Book"
        } else {
            return Err(XlsError::InvalidFormat(
                "no Workbook or Book stream found in CFB".into(),
            ));
        };

        let mut stream_data = Vec::new();
        {
            let mut stream = cfb.open_stream(stream_path)?;
            stream.read_to_end(&mut stream_data)?;
        }

        let all_records = biff::read_all_records(&mut Cursor::new(&stream_data))?;
        let globals = Self::parse_globals(&all_records)?;

        let mut sheets = Vec::new();
        for info in globals
            .sheets
            .iter()
            .filter(|s| s.sheet_type == records::SHEET_TYPE_WORKSHEET)
        {
            let start = all_records
                .iter()
                .position(|r| {
                    r.record_type == records::BOF && r.stream_offset == info.offset as u64
                })
                .ok_or_else(|| {
                    XlsError::InvalidFormat(format!(
                        "sheet '{}' points at offset {} where no BOF record starts",
                        info.name, info.offset
                    ))
                })?;

            let builder = Self::parse_sheet_records(&all_records[start + 1..], &globals.sst)?;
            let sheet = builder.finish(&info.name, sheets.len() as u32);
            log::debug!(
                "xls sheet '{}': {}x{}, {} cells, {} merges",
                sheet.name,
                sheet.row_count,
                sheet.column_count,
                sheet.cells.len(),
                sheet.merged_cells.len()
            );
            sheets.push(sheet);
        }

        Ok(sheets)
    }

    /// Parse the globals substream up to its EOF.
    fn parse_globals(all_records: &[BiffRecord]) -> XlsResult<Globals> {
        let first = all_records
            .first()
            .ok_or_else(|| XlsError::InvalidFormat("empty Workbook stream".into()))?;

        match first.record_type {
            records::BOF => {}
            records::BOF_BIFF2 | records::BOF_BIFF3 | records::BOF_BIFF4 => {
                return Err(XlsError::UnsupportedVersion(format!(
                    "BIFF2-4 file (BOF record 0x{:04X})",
                    first.record_type
                )));
            }
            other => {
                return Err(XlsError::InvalidFormat(format!(
                    "stream starts with record 0x{other:04X}, expected BOF"
                )));
            }
        }

        let (version, substream) = biff::parse_bof(&first.data)?;
        if version != records::BIFF8_VERSION {
            return Err(XlsError::UnsupportedVersion(format!(
                "expected BIFF8 (0x0600), got 0x{version:04X}"
            )));
        }
        if substream != records::BOF_WORKBOOK_GLOBALS {
            return Err(XlsError::InvalidFormat(format!(
                "first substream is 0x{substream:04X}, expected workbook globals"
            )));
        }

        let mut globals = Globals::default();
        for rec in &all_records[1..] {
            match rec.record_type {
                records::EOF => break,
                records::SST => globals.sst = parse_sst(&rec.data, &rec.continue_offsets)?,
                records::BOUNDSHEET => globals.sheets.push(Self::parse_boundsheet(&rec.data)?),
                _ => {}
            }
        }
        Ok(globals)
    }

    /// BOUNDSHEET: bof_offset(4) + visibility(1) + sheet_type(1) + short_string
    fn parse_boundsheet(data: &[u8]) -> XlsResult<SheetInfo> {
        let mut off = 0;
        let offset = read_u32(data, &mut off)?;
        let _visibility = read_u8(data, &mut off)?;
        let sheet_type = read_u8(data, &mut off)?;
        let name = read_short_string(data, &mut off)?;
        Ok(SheetInfo {
            offset,
            sheet_type,
            name,
        })
    }

    /// Parse a worksheet substream, starting right after its BOF and stopping
    /// at the matching EOF. Records of embedded substreams are skipped.
    fn parse_sheet_records(sheet_records: &[BiffRecord], sst: &[String]) -> XlsResult<SheetBuilder> {
        let mut builder = SheetBuilder::default();
        // FORMULA with a string result; the text arrives in the next STRING
        let mut pending_string: Option<(u16, u16)> = None;
        let mut nested = 0usize;

        for rec in sheet_records {
            match rec.record_type {
                records::BOF => {
                    nested += 1;
                    continue;
                }
                records::EOF if nested == 0 => break,
                records::EOF => {
                    nested -= 1;
                    continue;
                }
                _ if nested > 0 => continue,
                _ => {}
            }

            let data = rec.data.as_slice();
            match rec.record_type {
                records::LABELSST => {
                    let mut off = 0;
                    let (row, col) = cell_header(data, &mut off)?;
                    let index = read_u32(data, &mut off)? as usize;
                    let text = sst.get(index).ok_or_else(|| {
                        XlsError::Parse(format!(
                            "shared string index {index} out of bounds ({} strings)",
                            sst.len()
                        ))
                    })?;
                    builder.put(row, col, CellValue::text(text.as_str()));
                }
                records::LABEL => {
                    let mut off = 0;
                    let (row, col) = cell_header(data, &mut off)?;
                    builder.put(row, col, CellValue::Text(read_unicode_string(data, &mut off)?));
                }
                records::NUMBER => {
                    let mut off = 0;
                    let (row, col) = cell_header(data, &mut off)?;
                    builder.put(row, col, CellValue::Number(read_f64(data, &mut off)?));
                }
                records::RK => {
                    let mut off = 0;
                    let (row, col) = cell_header(data, &mut off)?;
                    builder.put(row, col, CellValue::Number(read_rk(data, &mut off)?));
                }
                records::MULRK => Self::parse_mulrk(data, &mut builder)?,
                records::BOOLERR => {
                    let mut off = 0;
                    let (row, col) = cell_header(data, &mut off)?;
                    let value = read_u8(data, &mut off)?;
                    let is_error = read_u8(data, &mut off)? != 0;
                    let cell = if is_error {
                        CellValue::Error(error_literal(value).to_string())
                    } else {
                        CellValue::Boolean(value != 0)
                    };
                    builder.put(row, col, cell);
                }
                records::FORMULA => {
                    pending_string = Self::parse_formula(data, &mut builder)?;
                    continue;
                }
                records::STRING => {
                    if let Some((row, col)) = pending_string.take() {
                        let mut off = 0;
                        builder.put(row, col, CellValue::Text(read_unicode_string(data, &mut off)?));
                    }
                }
                records::MERGECELLS => {
                    Self::parse_mergecells(data, &mut builder)?;
                    continue;
                }
                // SHRFMLA and ARRAY may sit between a FORMULA and its STRING
                _ => continue,
            }
            pending_string = None;
        }

        Ok(builder)
    }

    /// MULRK: row(2) + first_col(2) + [xf(2) + rk(4)]* + last_col(2)
    fn parse_mulrk(data: &[u8], builder: &mut SheetBuilder) -> XlsResult<()> {
        if data.len() < 6 {
            return Err(XlsError::Parse("MULRK record too short".into()));
        }
        let mut off = 0;
        let row = read_u16(data, &mut off)?;
        let first_col = read_u16(data, &mut off)?;
        let body = &data[..data.len() - 2];

        let mut col = first_col;
        while off + 6 <= body.len() {
            let _xf = read_u16(body, &mut off)?;
            builder.put(row, col, CellValue::Number(read_rk(body, &mut off)?));
            col = col.saturating_add(1);
        }
        Ok(())
    }

    /// FORMULA: row(2) + col(2) + xf(2) + result(8) + ...
    ///
    /// The cached result is a double unless its last two bytes are `0xFFFF`,
    /// in which case byte 0 tags it as string (0), boolean (1), error (2) or
    /// empty string (3). Returns the cell position when a STRING record
    /// carries the text.
    fn parse_formula(data: &[u8], builder: &mut SheetBuilder) -> XlsResult<Option<(u16, u16)>> {
        let mut off = 0;
        let (row, col) = cell_header(data, &mut off)?;
        let result_start = off;
        let number = read_f64(data, &mut off)?;
        let result = &data[result_start..off];

        if result[6] != 0xFF || result[7] != 0xFF {
            builder.put(row, col, CellValue::Number(number));
            return Ok(None);
        }

        match result[0] {
            0x00 => {
                builder.put(row, col, CellValue::Empty);
                return Ok(Some((row, col)));
            }
            0x01 => builder.put(row, col, CellValue::Boolean(result[2] != 0)),
            0x02 => builder.put(row, col, CellValue::Error(error_literal(result[2]).to_string())),
            _ => builder.put(row, col, CellValue::Empty),
        }
        Ok(None)
    }

    /// MERGECELLS: count(2) + [first_row(2) + last_row(2) + first_col(2) + last_col(2)]*
    fn parse_mergecells(data: &[u8], builder: &mut SheetBuilder) -> XlsResult<()> {
        let mut off = 0;
        let count = read_u16(data, &mut off)?;
        for _ in 0..count {
            let first_row = read_u16(data, &mut off)?;
            let last_row = read_u16(data, &mut off)?;
            let first_col = read_u16(data, &mut off)?;
            let last_col = read_u16(data, &mut off)?;

            let native = LegacyMergeRange::from_inclusive(first_row, last_row, first_col, last_col);
            match normalize_xls_merge(native) {
                Some(range) => builder.merged_cells.push(range),
                None => log::warn!("dropping inverted merge range {native:?}"),
            }
        }
        Ok(())
    }
}
