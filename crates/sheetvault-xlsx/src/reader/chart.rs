//! Chart parts (`xl/charts/chartN.xml`)
//!
//! Only structural metadata is read: the plot type, the chart title and one
//! [`SeriesInfo`] per `c:ser`. Axis, legend and formatting elements are
//! skipped.

use std::io::BufRead;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use sheetvault_core::{ChartData, ChartKind, SeriesInfo};

use crate::error::{XlsxError, XlsxResult};

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ChartPart {
    pub kind: ChartKind,
    pub title: Option<String>,
    pub data: ChartData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SeriesSection {
    Name,
    Categories,
    Values,
}

fn series_section(local: &[u8]) -> Option<SeriesSection> {
    match local {
        b"tx" => Some(SeriesSection::Name),
        b"cat" | b"xVal" => Some(SeriesSection::Categories),
        b"val" | b"yVal" => Some(SeriesSection::Values),
        _ => None,
    }
}

fn val_attr(e: &BytesStart<'_>) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == b"val")
        .and_then(|a| a.unescape_value().ok().map(|v| v.to_string()))
}

#[derive(Default)]
struct SeriesBuilder {
    info: SeriesInfo,
    cached_name: Option<String>,
    name_ref: Option<String>,
}

impl SeriesBuilder {
    fn finish(self) -> SeriesInfo {
        SeriesInfo {
            name: self.cached_name.or(self.name_ref),
            ..self.info
        }
    }
}

fn record_series_text(
    builder: &mut SeriesBuilder,
    section: Option<SeriesSection>,
    leaf: Option<&[u8]>,
    text: &str,
) {
    match (section, leaf) {
        (Some(SeriesSection::Name), Some(b"v")) => {
            if builder.cached_name.is_none() {
                builder.cached_name = Some(text.to_string());
            }
        }
        (Some(SeriesSection::Name), Some(b"f")) => builder.name_ref = Some(text.to_string()),
        (Some(SeriesSection::Categories), Some(b"f")) => {
            builder.info.categories_ref = Some(text.to_string())
        }
        (Some(SeriesSection::Values), Some(b"f")) => builder.info.values_ref = Some(text.to_string()),
        _ => {}
    }
}

pub(crate) fn parse_chart<R: BufRead>(reader: R) -> XlsxResult<ChartPart> {
    let mut xml_reader = Reader::from_reader(reader);
    // Rich text runs keep their spacing
    xml_reader.trim_text(false);

    let mut buf = Vec::new();
    let mut path: Vec<Vec<u8>> = Vec::new();

    let mut saw_chart_space = false;
    let mut kind: Option<ChartKind> = None;
    let mut title_depth: Option<usize> = None;
    let mut title_text = String::new();
    let mut title_ref: Option<String> = None;
    let mut series: Vec<SeriesInfo> = Vec::new();
    let mut current: Option<(usize, SeriesBuilder)> = None;

    loop {
        let event = xml_reader.read_event_into(&mut buf);
        match event {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                let is_start = matches!(event, Ok(Event::Start(_)));
                let local = e.local_name().as_ref().to_vec();
                let parent = path.last().map(Vec::as_slice);

                match local.as_slice() {
                    b"chartSpace" => saw_chart_space = true,
                    b"title" if parent == Some(b"chart".as_slice()) && is_start => {
                        title_depth = Some(path.len());
                    }
                    // Each paragraph after the first starts a new line
                    b"p" if is_start && title_depth.is_some() && !title_text.is_empty() => {
                        title_text.push('\n');
                    }
                    b"ser" if is_start => {
                        let builder = SeriesBuilder {
                            info: SeriesInfo {
                                index: series.len() as u32,
                                ..SeriesInfo::default()
                            },
                            ..SeriesBuilder::default()
                        };
                        current = Some((path.len(), builder));
                    }
                    b"idx" if parent == Some(b"ser".as_slice()) => {
                        if let (Some((_, builder)), Some(idx)) =
                            (current.as_mut(), val_attr(e).and_then(|v| v.parse().ok()))
                        {
                            builder.info.index = idx;
                        }
                    }
                    other if parent == Some(b"plotArea".as_slice()) && kind.is_none() => {
                        kind = ChartKind::from_plot_element(&String::from_utf8_lossy(other));
                    }
                    _ => {}
                }

                if is_start {
                    path.push(local);
                }
            }
            Ok(Event::End(_)) => {
                path.pop();
                if title_depth == Some(path.len()) {
                    title_depth = None;
                }
                if let Some((depth, _)) = &current {
                    if *depth == path.len() {
                        if let Some((_, builder)) = current.take() {
                            series.push(builder.finish());
                        }
                    }
                }
            }
            Ok(Event::Text(ref e)) => {
                if let Ok(text) = e.unescape() {
                    let leaf = path.last().map(Vec::as_slice);
                    if let Some(depth) = title_depth {
                        if path.len() > depth {
                            match leaf {
                                Some(b"t") => title_text.push_str(&text),
                                Some(b"f") => title_ref = Some(text.to_string()),
                                _ => {}
                            }
                        }
                    } else if let Some((depth, builder)) = current.as_mut() {
                        let section = path.get(*depth + 1).and_then(|s| series_section(s));
                        record_series_text(builder, section, leaf, &text);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    if !saw_chart_space {
        return Err(XlsxError::InvalidFormat(
            "chart part has no chartSpace element".into(),
        ));
    }

    let title = if title_text.trim().is_empty() {
        title_ref
    } else {
        Some(title_text)
    };

    Ok(ChartPart {
        kind: kind.unwrap_or(ChartKind::Unknown),
        title,
        data: ChartData { series },
    })
}
