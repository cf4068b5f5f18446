//! BIFF8 Unicode strings.
//!
//! A string header is a character count (`u8` for short strings, `u16`
//! otherwise) and a flags byte:
//! - bit 0: characters are UTF-16LE rather than compressed single bytes
//! - bit 2: a `u32` size of trailing phonetic data follows the header
//! - bit 3: a `u16` count of 4-byte rich text runs follows the header
//!
//! Inside the SST a string may be split across a CONTINUE boundary. The
//! continuation repeats the flags byte, and the character width may change
//! at that point.

use super::parser::{read_u16, read_u32, read_u8, skip};
use crate::error::{XlsError, XlsResult};

const FLAG_WIDE: u8 = 0x01;
const FLAG_PHONETIC: u8 = 0x04;
const FLAG_RICH: u8 = 0x08;

struct StringHeader {
    char_count: usize,
    flags: u8,
    run_count: usize,
    phonetic_size: usize,
}

fn read_header(data: &[u8], offset: &mut usize, char_count: usize) -> XlsResult<StringHeader> {
    let flags = read_u8(data, offset)?;
    let run_count = if flags & FLAG_RICH != 0 {
        read_u16(data, offset)? as usize
    } else {
        0
    };
    let phonetic_size = if flags & FLAG_PHONETIC != 0 {
        read_u32(data, offset)? as usize
    } else {
        0
    };
    Ok(StringHeader {
        char_count,
        flags,
        run_count,
        phonetic_size,
    })
}

fn push_chars(data: &[u8], offset: &mut usize, count: usize, wide: bool, out: &mut Vec<u16>) -> XlsResult<()> {
    if wide {
        for _ in 0..count {
            out.push(read_u16(data, offset)?);
        }
    } else {
        for _ in 0..count {
            out.push(read_u8(data, offset)? as u16);
        }
    }
    Ok(())
}

fn decode(units: &[u16]) -> XlsResult<String> {
    String::from_utf16(units).map_err(|e| XlsError::Parse(format!("invalid UTF-16 string: {e}")))
}

/// Read the string at `offset`, honouring CONTINUE boundaries.
fn read_split_string(data: &[u8], offset: &mut usize, boundaries: &[usize]) -> XlsResult<String> {
    let char_count = read_u16(data, offset)? as usize;
    let header = read_header(data, offset, char_count)?;

    let mut units = Vec::with_capacity(header.char_count);
    let mut wide = header.flags & FLAG_WIDE != 0;
    while units.len() < header.char_count {
        if boundaries.contains(offset) {
            wide = read_u8(data, offset)? & FLAG_WIDE != 0;
        }
        let segment_end = boundaries
            .iter()
            .copied()
            .find(|b| *b > *offset)
            .unwrap_or(data.len());
        let width = if wide { 2 } else { 1 };
        let fits = (segment_end - *offset) / width;
        let count = fits.min(header.char_count - units.len());
        if count == 0 {
            return Err(XlsError::Parse(format!(
                "string data runs out at offset {}",
                *offset
            )));
        }
        push_chars(data, offset, count, wide, &mut units)?;
    }

    skip(data, offset, header.run_count * 4)?;
    skip(data, offset, header.phonetic_size)?;
    decode(&units)
}

/// Read a string with a 1-byte length prefix (BOUNDSHEET names).
pub fn read_short_string(data: &[u8], offset: &mut usize) -> XlsResult<String> {
    let char_count = read_u8(data, offset)? as usize;
    let flags = read_u8(data, offset)?;
    let mut units = Vec::with_capacity(char_count);
    push_chars(data, offset, char_count, flags & FLAG_WIDE != 0, &mut units)?;
    decode(&units)
}

/// Read a string with a 2-byte length prefix (LABEL, STRING).
pub fn read_unicode_string(data: &[u8], offset: &mut usize) -> XlsResult<String> {
    read_split_string(data, offset, &[])
}

/// Parse the shared string table.
///
/// The body holds the total reference count (`u32`), the unique string count
/// (`u32`) and then the strings. `boundaries` are the CONTINUE offsets of the
/// SST record. A table that ends early keeps the strings read so far.
pub fn parse_sst(data: &[u8], boundaries: &[usize]) -> XlsResult<Vec<String>> {
    let mut offset = 0;
    let _total = read_u32(data, &mut offset)?;
    let unique = read_u32(data, &mut offset)? as usize;

    let mut strings = Vec::with_capacity(unique.min(data.len()));
    for i in 0..unique {
        match read_split_string(data, &mut offset, boundaries) {
            Ok(s) => strings.push(s),
            Err(e) => {
                log::warn!("SST truncated at string {i} of {unique}: {e}");
                break;
            }
        }
    }
    Ok(strings)
}
