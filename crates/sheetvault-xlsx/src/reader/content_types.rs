//! `[Content_Types].xml`

use std::io::BufRead;

use ahash::AHashMap;
use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::error::{XlsxError, XlsxResult};

#[derive(Debug, Clone, Default)]
pub(crate) struct ContentTypes {
    /// Lower-cased extension -> content type
    defaults: AHashMap<String, String>,
    /// Part name without the leading `/` -> content type
    overrides: AHashMap<String, String>,
}

impl ContentTypes {
    pub fn parse<R: BufRead>(reader: R) -> XlsxResult<Self> {
        let mut xml_reader = Reader::from_reader(reader);
        xml_reader.trim_text(true);

        let mut buf = Vec::new();
        let mut types = ContentTypes::default();

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Empty(e)) | Ok(Event::Start(e))
                    if matches!(e.local_name().as_ref(), b"Default" | b"Override") =>
                {
                    let is_default = e.local_name().as_ref() == b"Default";

                    let mut key = None;
                    let mut content_type = None;
                    for attr in e.attributes().flatten() {
                        match attr.key.as_ref() {
                            b"Extension" | b"PartName" => {
                                key = attr.unescape_value().ok().map(|s| s.to_string())
                            }
                            b"ContentType" => {
                                content_type = attr.unescape_value().ok().map(|s| s.to_string())
                            }
                            _ => {}
                        }
                    }

                    if let (Some(key), Some(content_type)) = (key, content_type) {
                        if is_default {
                            types.defaults.insert(key.to_ascii_lowercase(), content_type);
                        } else {
                            let part = key.trim_start_matches('/').to_string();
                            types.overrides.insert(part, content_type);
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(types)
    }

    /// Content type declared for a part, by override first, then by extension
    pub fn content_type_for(&self, part: &str) -> Option<&str> {
        if let Some(ct) = self.overrides.get(part.trim_start_matches('/')) {
            return Some(ct);
        }
        let ext = part_extension(part)?;
        self.defaults.get(&ext).map(String::as_str)
    }
}

pub(crate) fn part_extension(part: &str) -> Option<String> {
    let file = part.rsplit('/').next()?;
    let (_, ext) = file.rsplit_once('.')?;
    if ext.is_empty() {
        None
    } else {
        Some(ext.to_ascii_lowercase())
    }
}

/// Short format tag for an image content type (`image/png` -> `png`)
pub(crate) fn image_format_from_content_type(content_type: &str) -> Option<String> {
    let subtype = content_type.strip_prefix("image/")?;
    let tag = match subtype {
        "x-emf" => "emf",
        "x-wmf" => "wmf",
        "x-bmp" => "bmp",
        "svg+xml" => "svg",
        "x-pict" => "pict",
        other => other,
    };
    if tag.is_empty() {
        None
    } else {
        Some(tag.to_ascii_lowercase())
    }
}
