//! Date detection from `xl/styles.xml`
//!
//! Only the number format of each cell format record matters here: a numeric
//! cell whose `s` index points at a date-like format is read as a date.

use std::io::BufRead;

use ahash::AHashMap;
use once_cell::sync::Lazy;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use regex::Regex;

use crate::error::{XlsxError, XlsxResult};

/// Quoted literals, backslash escapes, bracketed colour/condition sections and
/// `_x` / `*x` padding carry no date meaning.
static NON_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""[^"]*"|\\.|\[[^\]]*\]|_.|\*."#).expect("static regex is valid")
});

static DATE_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)[ymdhs]").expect("static regex is valid"));

/// Elapsed-time sections (`[h]`, `[mm]`, `[ss]`) are the one bracket form that
/// does mark a time.
static ELAPSED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\[(h+|m+|s+)\]").expect("static regex is valid"));

/// Whether a builtin number format id is a date or time format
pub(crate) fn is_builtin_date_format(id: u32) -> bool {
    matches!(id, 14..=22 | 45..=47)
}

/// Whether a custom format code renders its number as a date or time
pub(crate) fn is_date_format_code(code: &str) -> bool {
    if ELAPSED.is_match(code) {
        return true;
    }
    // Only the positive section decides
    let section = code.split(';').next().unwrap_or_default();
    let stripped = NON_TOKEN.replace_all(section, "");
    if stripped.eq_ignore_ascii_case("general") {
        return false;
    }
    DATE_TOKEN.is_match(&stripped)
}

/// Which cell format indexes (`<c s="...">`) format their number as a date
#[derive(Debug, Clone, Default)]
pub(crate) struct DateStyles {
    date_xfs: Vec<bool>,
}

impl DateStyles {
    pub fn is_date(&self, style_index: Option<u32>) -> bool {
        let idx = style_index.unwrap_or(0) as usize;
        self.date_xfs.get(idx).copied().unwrap_or(false)
    }
}

fn num_fmt_id(e: &BytesStart<'_>) -> Option<u32> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == b"numFmtId")
        .and_then(|a| a.unescape_value().ok()?.parse().ok())
}

pub(crate) fn read_date_styles<R: BufRead>(reader: R) -> XlsxResult<DateStyles> {
    let mut xml_reader = Reader::from_reader(reader);
    xml_reader.trim_text(true);

    let mut buf = Vec::new();
    let mut custom_formats: AHashMap<u32, String> = AHashMap::new();
    let mut xf_format_ids: Vec<u32> = Vec::new();
    let mut in_cell_xfs = false;

    loop {
        match xml_reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"numFmt" => {
                    let mut code = None;
                    for attr in e.attributes().flatten() {
                        if attr.key.as_ref() == b"formatCode" {
                            code = attr.unescape_value().ok().map(|s| s.to_string());
                        }
                    }
                    if let (Some(id), Some(code)) = (num_fmt_id(&e), code) {
                        custom_formats.insert(id, code);
                    }
                }
                b"cellXfs" => in_cell_xfs = true,
                b"xf" if in_cell_xfs => xf_format_ids.push(num_fmt_id(&e).unwrap_or(0)),
                _ => {}
            },
            Ok(Event::End(e)) if e.local_name().as_ref() == b"cellXfs" => {
                in_cell_xfs = false;
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    let date_xfs = xf_format_ids
        .into_iter()
        .map(|id| match custom_formats.get(&id) {
            Some(code) => is_date_format_code(code),
            None => is_builtin_date_format(id),
        })
        .collect();

    Ok(DateStyles { date_xfs })
}
