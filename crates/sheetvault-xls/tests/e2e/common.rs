//! BIFF8 workbook fixtures.
//!
//! Records are written by hand and packed into a `Workbook` stream inside a
//! CFB container, the same layout Excel produces.

use std::io::{Cursor, Write};

pub const BOF: u16 = 0x0809;
pub const EOF: u16 = 0x000A;
pub const BOUNDSHEET: u16 = 0x0085;
pub const SST: u16 = 0x00FC;
pub const CONTINUE: u16 = 0x003C;
pub const LABELSST: u16 = 0x00FD;
pub const LABEL: u16 = 0x0204;
pub const NUMBER: u16 = 0x0203;
pub const RK: u16 = 0x027E;
pub const MULRK: u16 = 0x00BD;
pub const BLANK: u16 = 0x0201;
pub const BOOLERR: u16 = 0x0205;
pub const MERGECELLS: u16 = 0x00E5;

pub const SHEET_WORKSHEET: u8 = 0x00;
pub const SHEET_CHART: u8 = 0x02;

pub fn record(record_type: u16, body: &[u8]) -> Vec<u8> {
    let mut out = record_type.to_le_bytes().to_vec();
    out.extend_from_slice(&(body.len() as u16).to_le_bytes());
    out.extend_from_slice(body);
    out
}

pub fn bof(version: u16, substream: u16) -> Vec<u8> {
    let mut body = version.to_le_bytes().to_vec();
    body.extend_from_slice(&substream.to_le_bytes());
    body.extend_from_slice(&[0; 12]);
    record(BOF, &body)
}

/// String with a 2-byte length prefix, compressed when every char fits a byte.
pub fn unicode_string(text: &str) -> Vec<u8> {
    let units: Vec<u16> = text.encode_utf16().collect();
    let mut out = (units.len() as u16).to_le_bytes().to_vec();
    push_chars(&mut out, &units);
    out
}

fn push_chars(out: &mut Vec<u8>, units: &[u16]) {
    if units.iter().all(|u| *u < 0x100) {
        out.push(0x00);
        out.extend(units.iter().map(|u| *u as u8));
    } else {
        out.push(0x01);
        for u in units {
            out.extend_from_slice(&u.to_le_bytes());
        }
    }
}

fn cell_prefix(row: u16, col: u16) -> Vec<u8> {
    let mut body = row.to_le_bytes().to_vec();
    body.extend_from_slice(&col.to_le_bytes());
    body.extend_from_slice(&15u16.to_le_bytes());
    body
}

pub fn labelsst(row: u16, col: u16, index: u32) -> Vec<u8> {
    let mut body = cell_prefix(row, col);
    body.extend_from_slice(&index.to_le_bytes());
    record(LABELSST, &body)
}

pub fn label(row: u16, col: u16, text: &str) -> Vec<u8> {
    let mut body = cell_prefix(row, col);
    body.extend(unicode_string(text));
    record(LABEL, &body)
}

pub fn number(row: u16, col: u16, value: f64) -> Vec<u8> {
    let mut body = cell_prefix(row, col);
    body.extend_from_slice(&value.to_le_bytes());
    record(NUMBER, &body)
}

/// RK cell holding an integer
pub fn rk_int(row: u16, col: u16, value: i32) -> Vec<u8> {
    let mut body = cell_prefix(row, col);
    body.extend_from_slice(&(((value << 2) as u32) | 0x02).to_le_bytes());
    record(RK, &body)
}

pub fn mulrk_ints(row: u16, first_col: u16, values: &[i32]) -> Vec<u8> {
    let mut body = row.to_le_bytes().to_vec();
    body.extend_from_slice(&first_col.to_le_bytes());
    for v in values {
        body.extend_from_slice(&15u16.to_le_bytes());
        body.extend_from_slice(&(((v << 2) as u32) | 0x02).to_le_bytes());
    }
    body.extend_from_slice(&(first_col + values.len() as u16 - 1).to_le_bytes());
    record(MULRK, &body)
}

pub fn blank(row: u16, col: u16) -> Vec<u8> {
    record(BLANK, &cell_prefix(row, col))
}

pub fn boolerr(row: u16, col: u16, value: u8, is_error: bool) -> Vec<u8> {
    let mut body = cell_prefix(row, col);
    body.push(value);
    body.push(is_error as u8);
    record(BOOLERR, &body)
}

/// MERGECELLS with inclusive `(first_row, last_row, first_col, last_col)` entries
pub fn mergecells(ranges: &[(u16, u16, u16, u16)]) -> Vec<u8> {
    let mut body = (ranges.len() as u16).to_le_bytes().to_vec();
    for (r0, r1, c0, c1) in ranges {
        for v in [r0, r1, c0, c1] {
            body.extend_from_slice(&v.to_le_bytes());
        }
    }
    record(MERGECELLS, &body)
}

struct FixtureSheet {
    name: String,
    sheet_type: u8,
    records: Vec<Vec<u8>>,
}

/// Builds a BIFF8 workbook inside a CFB container.
pub struct XlsFixture {
    version: u16,
    shared_strings: Vec<String>,
    /// Split the SST after this many strings' worth of bytes, mid-string
    sst_split: Option<usize>,
    sheets: Vec<FixtureSheet>,
}

impl Default for XlsFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl XlsFixture {
    pub fn new() -> Self {
        Self {
            version: 0x0600,
            shared_strings: Vec::new(),
            sst_split: None,
            sheets: Vec::new(),
        }
    }

    pub fn version(mut self, version: u16) -> Self {
        self.version = version;
        self
    }

    pub fn shared_strings(mut self, strings: &[&str]) -> Self {
        self.shared_strings = strings.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Move the SST bytes from `at` onwards into a CONTINUE record. The
    /// continuation repeats the compressed flags byte, so `at` must fall inside
    /// the characters of a compressed string.
    pub fn split_sst_at(mut self, at: usize) -> Self {
        self.sst_split = Some(at);
        self
    }

    pub fn sheet(mut self, name: &str, records: Vec<Vec<u8>>) -> Self {
        self.sheets.push(FixtureSheet {
            name: name.to_string(),
            sheet_type: SHEET_WORKSHEET,
            records,
        });
        self
    }

    pub fn chart_sheet(mut self, name: &str) -> Self {
        self.sheets.push(FixtureSheet {
            name: name.to_string(),
            sheet_type: SHEET_CHART,
            records: Vec::new(),
        });
        self
    }

    fn sst_records(&self) -> Vec<u8> {
        if self.shared_strings.is_empty() {
            return Vec::new();
        }
        let mut body = (self.shared_strings.len() as u32).to_le_bytes().to_vec();
        body.extend_from_slice(&(self.shared_strings.len() as u32).to_le_bytes());
        for s in &self.shared_strings {
            body.extend(unicode_string(s));
        }
        match self.sst_split {
            Some(at) => {
                let mut cont = vec![0x00];
                cont.extend_from_slice(&body[at..]);
                let mut out = record(SST, &body[..at]);
                out.extend(record(CONTINUE, &cont));
                out
            }
            None => record(SST, &body),
        }
    }

    fn globals(&self, offsets: &[u32]) -> Vec<u8> {
        let mut out = bof(self.version, 0x0005);
        out.extend(self.sst_records());
        for (sheet, offset) in self.sheets.iter().zip(offsets) {
            let mut body = offset.to_le_bytes().to_vec();
            body.push(0x00);
            body.push(sheet.sheet_type);
            let units: Vec<u16> = sheet.name.encode_utf16().collect();
            body.push(units.len() as u8);
            push_chars(&mut body, &units);
            out.extend(record(BOUNDSHEET, &body));
        }
        out.extend(record(EOF, &[]));
        out
    }

    fn substream(&self, sheet: &FixtureSheet) -> Vec<u8> {
        let substream_type = if sheet.sheet_type == SHEET_CHART { 0x0020 } else { 0x0010 };
        let mut out = bof(self.version, substream_type);
        for rec in &sheet.records {
            out.extend_from_slice(rec);
        }
        out.extend(record(EOF, &[]));
        out
    }

    pub fn stream(&self) -> Vec<u8> {
        let placeholder = vec![0u32; self.sheets.len()];
        let globals_len = self.globals(&placeholder).len() as u32;

        let substreams: Vec<Vec<u8>> = self.sheets.iter().map(|s| self.substream(s)).collect();
        let mut offsets = Vec::new();
        let mut next = globals_len;
        for sub in &substreams {
            offsets.push(next);
            next += sub.len() as u32;
        }

        let mut stream = self.globals(&offsets);
        for sub in substreams {
            stream.extend(sub);
        }
        stream
    }

    pub fn build(&self) -> Vec<u8> {
        pack_stream("/Workbook", &self.stream())
    }
}

/// Wrap a raw stream into a CFB container under `path`.
pub fn pack_stream(path: &str, stream: &[u8]) -> Vec<u8> {
    let mut compound = cfb::CompoundFile::create(Cursor::new(Vec::new())).unwrap();
    {
        let mut out = compound.create_stream(path).unwrap();
        out.write_all(stream).unwrap();
        out.flush().unwrap();
    }
    compound.flush().unwrap();
    compound.into_inner().into_inner()
}
