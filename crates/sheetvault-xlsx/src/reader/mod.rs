//! XLSX reader

mod chart;
mod content_types;
mod drawing;
mod styles;

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use sheetvault_core::{excel_serial_to_datetime, CellAddress, CellValue, SheetExtraction, SparseCell};

use self::content_types::ContentTypes;
use self::drawing::read_drawing;
use self::styles::{read_date_styles, DateStyles};
use crate::error::{XlsxError, XlsxResult};
use crate::merge::parse_merge_ref;
use crate::rels::{parse_relationships, rels_path_for, resolve_target, Relationships};

const WORKBOOK_PART: &str = "xl/workbook.xml";

/// Decode Excel's `_xHHHH_` escapes (`_x000d_` is CR, `_x005f_` an
/// underscore). Anything that is not a complete escape is kept verbatim.
pub(crate) fn decode_excel_escapes(s: &str) -> String {
    if !s.contains("_x") {
        return s.to_string();
    }

    let mut out = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(pos) = rest.find("_x") {
        out.push_str(&rest[..pos]);
        let candidate = &rest[pos..];
        let decoded = candidate
            .get(2..6)
            .filter(|hex| hex.bytes().all(|b| b.is_ascii_hexdigit()))
            .filter(|_| candidate.as_bytes().get(6) == Some(&b'_'))
            .and_then(|hex| u32::from_str_radix(hex, 16).ok())
            .and_then(char::from_u32);

        match decoded {
            Some(c) => {
                out.push(c);
                rest = &candidate[7..];
            }
            None => {
                out.push_str("_x");
                rest = &candidate[2..];
            }
        }
    }

    out.push_str(rest);
    out
}

/// Read a part from the package, `None` when it does not exist
pub(crate) fn read_part<R: Read + Seek>(
    archive: &mut zip::ZipArchive<R>,
    path: &str,
) -> XlsxResult<Option<Vec<u8>>> {
    let mut file = match archive.by_name(path) {
        Ok(f) => f,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut data = Vec::with_capacity(file.size() as usize);
    file.read_to_end(&mut data)?;
    Ok(Some(data))
}

fn bool_attr(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}

/// A sheet entry in `xl/workbook.xml`
#[derive(Debug)]
struct SheetEntry {
    name: String,
    r_id: String,
}

#[derive(Debug, Default)]
struct WorkbookInfo {
    sheets: Vec<SheetEntry>,
    date_1904: bool,
}

/// Everything a worksheet needs to turn raw `<c>` elements into values
struct CellContext<'a> {
    shared_strings: &'a [String],
    styles: &'a DateStyles,
    date_1904: bool,
}

impl CellContext<'_> {
    fn value(&self, cell_type: Option<&str>, raw: &str, style: Option<u32>) -> XlsxResult<CellValue> {
        let value = match cell_type {
            Some("s") => {
                let idx: usize = raw.trim().parse().map_err(|_| {
                    XlsxError::Parse(format!("Invalid shared string index: {}", raw))
                })?;
                let s = self.shared_strings.get(idx).ok_or_else(|| {
                    XlsxError::Parse(format!("Shared string index {} out of bounds", idx))
                })?;
                CellValue::Text(s.clone())
            }
            Some("b") => CellValue::Boolean(bool_attr(raw.trim())),
            Some("e") => CellValue::Error(raw.to_string()),
            Some("str") | Some("inlineStr") => CellValue::Text(decode_excel_escapes(raw)),
            Some("d") => parse_iso_datetime(raw.trim())
                .map(CellValue::DateTime)
                .unwrap_or_else(|| CellValue::Text(raw.to_string())),
            None | Some("n") => match raw.trim().parse::<f64>() {
                Ok(n) if self.styles.is_date(style) => excel_serial_to_datetime(n, self.date_1904)
                    .map(CellValue::DateTime)
                    .unwrap_or(CellValue::Number(n)),
                Ok(n) => CellValue::Number(n),
                Err(_) => CellValue::Text(raw.to_string()),
            },
            Some(_) => CellValue::Text(raw.to_string()),
        };
        Ok(value)
    }
}

fn parse_iso_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim_end_matches('Z');
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// State of the `<c>` element being read
#[derive(Debug, Default)]
struct PendingCell {
    row: u32,
    col: u32,
    cell_type: Option<String>,
    style: Option<u32>,
    value: Option<String>,
    inline: Option<String>,
}

impl PendingCell {
    fn raw(&self) -> Option<&str> {
        match self.cell_type.as_deref() {
            Some("inlineStr") => self.inline.as_deref().or(self.value.as_deref()),
            _ => self.value.as_deref().or(self.inline.as_deref()),
        }
    }
}

/// Row and column bookkeeping for cells that omit their `r` attribute
#[derive(Debug, Default)]
struct CellCursor {
    current_row: Option<u32>,
    next_col: u32,
}

impl CellCursor {
    fn start_row(&mut self, explicit: Option<u32>) {
        let row = match explicit {
            Some(r) => r.saturating_sub(1),
            None => self.current_row.map_or(0, |r| r + 1),
        };
        self.current_row = Some(row);
        self.next_col = 0;
    }

    fn place(&mut self, reference: Option<&str>) -> XlsxResult<(u32, u32)> {
        let (row, col) = match reference {
            Some(r) => {
                let addr = CellAddress::parse(r).map_err(|e| {
                    XlsxError::Parse(format!("Invalid cell reference '{}': {}", r, e))
                })?;
                (addr.row, addr.col)
            }
            None => (self.current_row.unwrap_or(0), self.next_col),
        };
        self.current_row = Some(row);
        self.next_col = col + 1;
        Ok((row, col))
    }
}

/// What one pass over a worksheet part produced
struct WorksheetPart {
    sheet: SheetExtraction,
    drawing_rel: Option<String>,
}

/// XLSX file reader
pub struct XlsxReader;

impl XlsxReader {
    /// Read every worksheet of a workbook at a file path
    pub fn read_file<P: AsRef<Path>>(path: P) -> XlsxResult<Vec<SheetExtraction>> {
        let file = File::open(path)?;
        Self::read(BufReader::new(file))
    }

    /// Read every worksheet of an in-memory workbook
    pub fn read_bytes(bytes: &[u8]) -> XlsxResult<Vec<SheetExtraction>> {
        Self::read(Cursor::new(bytes))
    }

    /// Read every worksheet of a workbook, in workbook order.
    ///
    /// Chart sheets and dialog sheets are not worksheets and are left out;
    /// sheet indexes count worksheets only.
    pub fn read<R: Read + Seek>(reader: R) -> XlsxResult<Vec<SheetExtraction>> {
        let mut archive = zip::ZipArchive::new(reader)?;

        let content_types = match read_part(&mut archive, "[Content_Types].xml")? {
            Some(data) => ContentTypes::parse(data.as_slice())?,
            None => {
                return Err(XlsxError::InvalidFormat(
                    "Missing [Content_Types].xml".into(),
                ))
            }
        };

        let shared_strings = Self::read_shared_strings(&mut archive)?;
        let styles = match read_part(&mut archive, "xl/styles.xml")? {
            Some(data) => read_date_styles(data.as_slice())?,
            None => DateStyles::default(),
        };
        let workbook = Self::read_workbook_xml(&mut archive)?;
        let workbook_rels = Self::read_rels_of(&mut archive, WORKBOOK_PART)?
            .ok_or_else(|| XlsxError::MissingPart(rels_path_for(WORKBOOK_PART)))?;

        let ctx = CellContext {
            shared_strings: &shared_strings,
            styles: &styles,
            date_1904: workbook.date_1904,
        };

        let mut sheets = Vec::new();
        for entry in &workbook.sheets {
            let Some(rel) = workbook_rels.get(&entry.r_id) else {
                log::warn!("Sheet '{}' has no relationship {}", entry.name, entry.r_id);
                continue;
            };
            if !rel.is_type("/worksheet") {
                log::debug!("Skipping non-worksheet sheet '{}'", entry.name);
                continue;
            }

            let path = resolve_target(WORKBOOK_PART, &rel.target);
            let index = sheets.len() as u32;
            let part = Self::read_worksheet(&mut archive, &path, &entry.name, index, &ctx)?;
            let mut sheet = part.sheet;

            if let Some(drawing_rel) = part.drawing_rel {
                Self::read_sheet_drawing(
                    &mut archive,
                    &path,
                    &drawing_rel,
                    &content_types,
                    &mut sheet,
                )?;
            }

            log::debug!(
                "Read sheet '{}': {}x{}, {} cell(s), {} merge(s)",
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

    fn read_rels_of<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
        part: &str,
    ) -> XlsxResult<Option<Relationships>> {
        match read_part(archive, &rels_path_for(part))? {
            Some(data) => Ok(Some(parse_relationships(data.as_slice())?)),
            None => Ok(None),
        }
    }

    /// Read the shared strings table.
    ///
    /// Phonetic runs (`<rPh>`) are furigana annotations, not part of the text.
    fn read_shared_strings<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<Vec<String>> {
        let mut strings = Vec::new();

        let file = match archive.by_name("xl/sharedStrings.xml") {
            Ok(f) => f,
            Err(_) => return Ok(strings),
        };

        let mut xml_reader = Reader::from_reader(BufReader::new(file));
        // Leading and trailing spaces are significant in string items
        xml_reader.trim_text(false);

        let mut buf = Vec::new();
        let mut current = String::new();
        let mut in_si = false;
        let mut in_t = false;
        let mut in_rph = false;

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => match e.local_name().as_ref() {
                    b"si" => {
                        in_si = true;
                        current.clear();
                    }
                    b"rPh" => in_rph = true,
                    b"t" if in_si && !in_rph => in_t = true,
                    _ => {}
                },
                Ok(Event::Empty(e)) if e.local_name().as_ref() == b"si" => {
                    strings.push(String::new());
                }
                Ok(Event::End(e)) => match e.local_name().as_ref() {
                    b"si" => {
                        strings.push(decode_excel_escapes(&current));
                        current.clear();
                        in_si = false;
                    }
                    b"rPh" => in_rph = false,
                    b"t" => in_t = false,
                    _ => {}
                },
                Ok(Event::Text(e)) if in_t => {
                    if let Ok(text) = e.unescape() {
                        current.push_str(&text);
                    }
                }
                Ok(Event::CData(e)) if in_t => {
                    current.push_str(&String::from_utf8_lossy(&e));
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(strings)
    }

    /// Read workbook.xml for the sheet list and the date system
    fn read_workbook_xml<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<WorkbookInfo> {
        let file = archive
            .by_name(WORKBOOK_PART)
            .map_err(|_| XlsxError::MissingPart(WORKBOOK_PART.into()))?;

        let mut xml_reader = Reader::from_reader(BufReader::new(file));
        xml_reader.trim_text(true);

        let mut buf = Vec::new();
        let mut info = WorkbookInfo::default();

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Empty(e)) | Ok(Event::Start(e)) => match e.local_name().as_ref() {
                    b"sheet" => {
                        let mut name = None;
                        let mut r_id = None;

                        for attr in e.attributes().flatten() {
                            match attr.key.local_name().as_ref() {
                                b"name" => {
                                    name = attr.unescape_value().ok().map(|s| s.to_string());
                                }
                                b"id" => {
                                    r_id = attr.unescape_value().ok().map(|s| s.to_string());
                                }
                                _ => {}
                            }
                        }

                        if let (Some(name), Some(r_id)) = (name, r_id) {
                            info.sheets.push(SheetEntry { name, r_id });
                        }
                    }
                    b"workbookPr" => {
                        for attr in e.attributes().flatten() {
                            if attr.key.as_ref() == b"date1904" {
                                info.date_1904 =
                                    attr.unescape_value().map_or(false, |v| bool_attr(&v));
                            }
                        }
                    }
                    _ => {}
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(info)
    }

    fn read_worksheet<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
        path: &str,
        name: &str,
        index: u32,
        ctx: &CellContext<'_>,
    ) -> XlsxResult<WorksheetPart> {
        let file = archive
            .by_name(path)
            .map_err(|_| XlsxError::MissingPart(path.to_string()))?;

        let mut xml_reader = Reader::from_reader(BufReader::new(file));
        xml_reader.trim_text(false);

        let mut sheet = SheetExtraction::new(name, index);
        // Keyed by position so a repeated reference keeps only its last value
        let mut cells: BTreeMap<(u32, u32), CellValue> = BTreeMap::new();
        let mut drawing_rel = None;
        let mut dimension: Option<(u32, u32)> = None;
        let mut extent: Option<(u32, u32)> = None;

        let mut buf = Vec::new();
        let mut cursor = CellCursor::default();
        let mut cell: Option<PendingCell> = None;
        let mut in_value = false;
        let mut in_inline = false;
        let mut in_inline_text = false;
        let mut in_rph = false;

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => match e.local_name().as_ref() {
                    b"row" => cursor.start_row(Self::row_number(&e)),
                    b"c" => cell = Some(Self::begin_cell(&e, &mut cursor)?),
                    b"v" if cell.is_some() => in_value = true,
                    b"is" if cell.is_some() => in_inline = true,
                    b"rPh" if in_inline => in_rph = true,
                    b"t" if in_inline && !in_rph => in_inline_text = true,
                    b"dimension" => dimension = Self::dimension_extent(&e),
                    b"mergeCell" => Self::push_merge(&e, &mut sheet),
                    _ => {}
                },
                Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                    b"row" => cursor.start_row(Self::row_number(&e)),
                    b"c" => {
                        let pending = Self::begin_cell(&e, &mut cursor)?;
                        Self::finish_cell(pending, ctx, &mut cells, &mut extent)?;
                    }
                    b"dimension" => dimension = Self::dimension_extent(&e),
                    b"mergeCell" => Self::push_merge(&e, &mut sheet),
                    b"drawing" => {
                        drawing_rel = e
                            .attributes()
                            .flatten()
                            .find(|a| a.key.local_name().as_ref() == b"id")
                            .and_then(|a| a.unescape_value().ok().map(|v| v.to_string()));
                    }
                    _ => {}
                },
                Ok(Event::End(e)) => match e.local_name().as_ref() {
                    b"c" => {
                        if let Some(pending) = cell.take() {
                            Self::finish_cell(pending, ctx, &mut cells, &mut extent)?;
                        }
                        in_value = false;
                        in_inline = false;
                        in_inline_text = false;
                    }
                    b"v" => in_value = false,
                    b"is" => in_inline = false,
                    b"rPh" => in_rph = false,
                    b"t" => in_inline_text = false,
                    _ => {}
                },
                Ok(Event::Text(e)) if in_value || in_inline_text => {
                    if let (Some(pending), Ok(text)) = (cell.as_mut(), e.unescape()) {
                        let target = if in_value {
                            &mut pending.value
                        } else {
                            &mut pending.inline
                        };
                        target.get_or_insert_with(String::new).push_str(&text);
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        sheet.cells = cells
            .into_iter()
            .map(|((row, col), value)| SparseCell::new(row, col, value))
            .collect();

        // A sheet without cells is empty whatever its dimension claims
        if let Some((rows, cols)) = extent {
            let (dim_rows, dim_cols) = dimension.unwrap_or((0, 0));
            sheet.row_count = rows.max(dim_rows);
            sheet.column_count = cols.max(dim_cols);
        }

        Ok(WorksheetPart { sheet, drawing_rel })
    }

    fn row_number(e: &BytesStart<'_>) -> Option<u32> {
        e.attributes()
            .flatten()
            .find(|a| a.key.as_ref() == b"r")
            .and_then(|a| a.unescape_value().ok()?.trim().parse().ok())
    }

    fn begin_cell(e: &BytesStart<'_>, cursor: &mut CellCursor) -> XlsxResult<PendingCell> {
        let mut reference = None;
        let mut cell_type = None;
        let mut style = None;

        for attr in e.attributes().flatten() {
            match attr.key.as_ref() {
                b"r" => reference = attr.unescape_value().ok().map(|s| s.to_string()),
                b"t" => cell_type = attr.unescape_value().ok().map(|s| s.to_string()),
                b"s" => {
                    style = attr
                        .unescape_value()
                        .ok()
                        .and_then(|s| s.parse::<u32>().ok())
                }
                _ => {}
            }
        }

        let (row, col) = cursor.place(reference.as_deref())?;
        Ok(PendingCell {
            row,
            col,
            cell_type,
            style,
            ..PendingCell::default()
        })
    }

    fn finish_cell(
        pending: PendingCell,
        ctx: &CellContext<'_>,
        cells: &mut BTreeMap<(u32, u32), CellValue>,
        extent: &mut Option<(u32, u32)>,
    ) -> XlsxResult<()> {
        let (rows, cols) = extent.unwrap_or((0, 0));
        *extent = Some((rows.max(pending.row + 1), cols.max(pending.col + 1)));

        let position = (pending.row, pending.col);
        let value = match pending.raw() {
            Some(raw) => ctx.value(pending.cell_type.as_deref(), raw, pending.style)?,
            None => CellValue::Empty,
        };
        if value.is_empty() {
            cells.remove(&position);
        } else {
            cells.insert(position, value);
        }
        Ok(())
    }

    /// 1-based end corner of `<dimension ref="A1:D10"/>`, as (rows, cols)
    fn dimension_extent(e: &BytesStart<'_>) -> Option<(u32, u32)> {
        let reference = e
            .attributes()
            .flatten()
            .find(|a| a.key.as_ref() == b"ref")
            .and_then(|a| a.unescape_value().ok().map(|v| v.to_string()))?;
        let (start, end) = CellAddress::parse_range_numbers(&reference).ok()?;
        Some((start.row.max(end.row), start.col.max(end.col)))
    }

    fn push_merge(e: &BytesStart<'_>, sheet: &mut SheetExtraction) {
        let reference = e
            .attributes()
            .flatten()
            .find(|a| a.key.as_ref() == b"ref")
            .and_then(|a| a.unescape_value().ok().map(|v| v.to_string()));

        match reference.as_deref().map(parse_merge_ref) {
            Some(Ok(range)) => sheet.merged_cells.push(range),
            Some(Err(err)) => log::warn!("Ignoring merge on sheet '{}': {}", sheet.name, err),
            None => log::warn!("Ignoring merge without ref on sheet '{}'", sheet.name),
        }
    }

    fn read_sheet_drawing<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
        sheet_path: &str,
        drawing_rel: &str,
        content_types: &ContentTypes,
        sheet: &mut SheetExtraction,
    ) -> XlsxResult<()> {
        let Some(rels) = Self::read_rels_of(archive, sheet_path)? else {
            log::warn!("Sheet '{}' references a drawing but has no rels part", sheet.name);
            return Ok(());
        };
        let Some(rel) = rels.get(drawing_rel).filter(|r| r.is_type("/drawing")) else {
            log::warn!(
                "Sheet '{}' drawing relationship {} does not resolve",
                sheet.name,
                drawing_rel
            );
            return Ok(());
        };

        let drawing_path = resolve_target(sheet_path, &rel.target);
        match read_drawing(archive, &drawing_path, content_types) {
            Ok(items) => {
                sheet.images = items.images;
                sheet.charts = items.charts;
            }
            Err(e) => log::warn!(
                "Ignoring unreadable drawing {} on sheet '{}': {}",
                drawing_path,
                sheet.name,
                e
            ),
        }
        Ok(())
    }
}
