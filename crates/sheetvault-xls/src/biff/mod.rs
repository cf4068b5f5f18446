//! BIFF8 record stream.
//!
//! A stream is a sequence of records, each a 4-byte header (record type and
//! body length, both `u16`) followed by the body. CONTINUE records extend the
//! preceding record past the 8224-byte body limit.

pub mod parser;
pub mod records;
pub mod strings;

use std::io::{ErrorKind, Read, Seek};

use crate::error::{XlsError, XlsResult};

/// One record with its CONTINUE bodies appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BiffRecord {
    pub record_type: u16,
    pub data: Vec<u8>,
    /// Offsets into `data` where each CONTINUE body starts
    pub continue_offsets: Vec<usize>,
    /// Offset of the record header in the stream. BOUNDSHEET points at
    /// worksheet BOF records by this offset.
    pub stream_offset: u64,
}

/// Read every record of a stream, folding CONTINUE records into their
/// parent. An orphaned CONTINUE at the start of the stream is dropped.
pub fn read_all_records<R: Read + Seek>(stream: &mut R) -> XlsResult<Vec<BiffRecord>> {
    let mut records: Vec<BiffRecord> = Vec::new();
    let mut header = [0u8; 4];

    loop {
        let stream_offset = stream.stream_position()?;
        match stream.read_exact(&mut header) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(XlsError::Io(e)),
        }

        let record_type = u16::from_le_bytes([header[0], header[1]]);
        let len = u16::from_le_bytes([header[2], header[3]]) as usize;
        let mut body = vec![0u8; len];
        stream.read_exact(&mut body).map_err(|e| {
            XlsError::Parse(format!(
                "record 0x{record_type:04X} at offset {stream_offset} is truncated: {e}"
            ))
        })?;

        if record_type == records::CONTINUE {
            if let Some(prev) = records.last_mut() {
                prev.continue_offsets.push(prev.data.len());
                prev.data.extend_from_slice(&body);
            }
        } else {
            records.push(BiffRecord {
                record_type,
                data: body,
                continue_offsets: Vec::new(),
                stream_offset,
            });
        }
    }

    Ok(records)
}

/// Returns `(version, substream_type)` from a BOF body.
pub fn parse_bof(data: &[u8]) -> XlsResult<(u16, u16)> {
    let mut off = 0;
    let version = parser::read_u16(data, &mut off)
        .map_err(|_| XlsError::InvalidFormat("BOF record too short".into()))?;
    let substream = parser::read_u16(data, &mut off)
        .map_err(|_| XlsError::InvalidFormat("BOF record too short".into()))?;
    Ok((version, substream))
}
