//! Worksheet drawings: the images and charts floating over a sheet
//!
//! A drawing part holds one anchor element per object. The anchor says where
//! the object sits; its `xdr:pic` or `xdr:graphicFrame` child says what it is,
//! through a relationship id that resolves against the drawing's own rels.

use std::io::{BufRead, Read, Seek};

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use sheetvault_core::{AnchorKind, ChartExtraction, ImageAnchor, ImageExtraction, ItemOutcome};

use super::chart::parse_chart;
use super::content_types::{image_format_from_content_type, part_extension, ContentTypes};
use super::read_part;
use crate::error::{XlsxError, XlsxResult};
use crate::rels::{parse_relationships, rels_path_for, resolve_target, Relationships};

const EMU_PER_INCH: i64 = 914_400;
const PIXELS_PER_INCH: i64 = 96;

/// EMU extent to whole pixels at 96 DPI, truncated
pub(crate) fn emu_to_pixels(emu: i64) -> Option<u32> {
    if emu < 0 {
        return None;
    }
    let pixels = emu.checked_mul(PIXELS_PER_INCH)? / EMU_PER_INCH;
    u32::try_from(pixels).ok()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Marker {
    pub col: Option<u32>,
    pub row: Option<u32>,
    pub col_off: i64,
    pub row_off: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MarkerField {
    Col,
    ColOff,
    Row,
    RowOff,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DrawingObject {
    Picture {
        embed: Option<String>,
        ext: Option<(i64, i64)>,
    },
    Chart {
        rel_id: Option<String>,
        ext: Option<(i64, i64)>,
    },
}

impl DrawingObject {
    fn set_ext(&mut self, size: (i64, i64)) {
        match self {
            DrawingObject::Picture { ext, .. } | DrawingObject::Chart { ext, .. } => {
                if ext.is_none() {
                    *ext = Some(size);
                }
            }
        }
    }

    fn ext(&self) -> Option<(i64, i64)> {
        match self {
            DrawingObject::Picture { ext, .. } | DrawingObject::Chart { ext, .. } => *ext,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DrawingAnchor {
    pub kind: AnchorKind,
    pub from: Option<Marker>,
    pub ext: Option<(i64, i64)>,
    pub objects: Vec<DrawingObject>,
}

impl DrawingAnchor {
    fn new(kind: AnchorKind) -> Self {
        Self {
            kind,
            from: None,
            ext: None,
            objects: Vec::new(),
        }
    }

    /// Collapse the anchor to the cell the object is attached to
    pub fn resolve(&self) -> Result<ImageAnchor, String> {
        match (self.kind, self.from) {
            (
                _,
                Some(Marker {
                    col: Some(col),
                    row: Some(row),
                    col_off,
                    row_off,
                }),
            ) => Ok(ImageAnchor::FromMarker {
                row,
                col,
                row_offset_emu: row_off,
                col_offset_emu: col_off,
            }),
            (AnchorKind::Absolute, None) => Ok(ImageAnchor::Direct { row: 0, col: 0 }),
            (_, Some(_)) => Err(format!("{} has an incomplete from marker", self.kind)),
            (_, None) => Err(format!("{} has no from marker", self.kind)),
        }
    }

    /// Pixel size of an object: the anchor's own extent, else the object's
    /// transform extent when it is non-zero
    fn pixel_size(&self, object: &DrawingObject) -> (Option<u32>, Option<u32>) {
        let ext = self
            .ext
            .or_else(|| object.ext().filter(|&(cx, cy)| cx > 0 && cy > 0));
        match ext {
            Some((cx, cy)) => (emu_to_pixels(cx), emu_to_pixels(cy)),
            None => (None, None),
        }
    }
}

fn ext_attrs(e: &BytesStart<'_>) -> Option<(i64, i64)> {
    let mut cx = None;
    let mut cy = None;
    for attr in e.attributes().flatten() {
        match attr.key.local_name().as_ref() {
            b"cx" => cx = attr.unescape_value().ok().and_then(|v| v.trim().parse().ok()),
            b"cy" => cy = attr.unescape_value().ok().and_then(|v| v.trim().parse().ok()),
            _ => {}
        }
    }
    Some((cx?, cy?))
}

fn attr_by_local_name(e: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == name)
        .and_then(|a| a.unescape_value().ok().map(|v| v.to_string()))
}

/// Parse a drawing part into its anchors
pub(crate) fn parse_drawing<R: BufRead>(reader: R) -> XlsxResult<Vec<DrawingAnchor>> {
    let mut xml_reader = Reader::from_reader(reader);
    xml_reader.trim_text(true);

    let mut buf = Vec::new();
    let mut path: Vec<Vec<u8>> = Vec::new();
    let mut anchors = Vec::new();
    let mut current: Option<(usize, DrawingAnchor)> = None;
    let mut marker_field: Option<MarkerField> = None;

    loop {
        let event = xml_reader.read_event_into(&mut buf);
        match event {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                let is_start = matches!(event, Ok(Event::Start(_)));
                let local = e.local_name().as_ref().to_vec();
                let parent = path.last().map(Vec::as_slice);
                // Only the preferred branch of mc:AlternateContent counts
                let in_fallback = path.iter().any(|p| p.as_slice() == b"Fallback");

                if let Some(kind) = AnchorKind::from_local_name(&String::from_utf8_lossy(&local))
                {
                    if is_start && current.is_none() {
                        current = Some((path.len(), DrawingAnchor::new(kind)));
                    }
                } else if let Some((depth, anchor)) = current.as_mut() {
                    let direct_child = path.len() == *depth + 1;
                    match local.as_slice() {
                        b"from" if direct_child => anchor.from = Some(Marker::default()),
                        b"col" | b"colOff" | b"row" | b"rowOff"
                            if parent == Some(b"from".as_slice()) && path.len() == *depth + 2 =>
                        {
                            marker_field = match local.as_slice() {
                                b"col" => Some(MarkerField::Col),
                                b"colOff" => Some(MarkerField::ColOff),
                                b"row" => Some(MarkerField::Row),
                                _ => Some(MarkerField::RowOff),
                            };
                        }
                        b"ext" if direct_child => anchor.ext = ext_attrs(e),
                        b"ext" if parent == Some(b"xfrm".as_slice()) && !in_fallback => {
                            if let (Some(object), Some(size)) =
                                (anchor.objects.last_mut(), ext_attrs(e))
                            {
                                object.set_ext(size);
                            }
                        }
                        b"pic" if !in_fallback => anchor.objects.push(DrawingObject::Picture {
                            embed: None,
                            ext: None,
                        }),
                        b"graphicFrame" if !in_fallback => {
                            anchor.objects.push(DrawingObject::Chart {
                                rel_id: None,
                                ext: None,
                            })
                        }
                        b"blip" if !in_fallback => {
                            if let Some(DrawingObject::Picture { embed, .. }) =
                                anchor.objects.last_mut()
                            {
                                *embed = attr_by_local_name(e, b"embed");
                            }
                        }
                        b"chart" if !in_fallback => {
                            if let Some(DrawingObject::Chart { rel_id, .. }) =
                                anchor.objects.last_mut()
                            {
                                *rel_id = attr_by_local_name(e, b"id");
                            }
                        }
                        _ => {}
                    }
                }

                if is_start {
                    path.push(local);
                }
            }
            Ok(Event::Text(ref e)) => {
                if let (Some(field), Some((_, anchor))) = (marker_field, current.as_mut()) {
                    let text = e.unescape().ok();
                    let text = text.as_deref().map(str::trim).unwrap_or_default();
                    let marker = anchor.from.get_or_insert_with(Marker::default);
                    match field {
                        MarkerField::Col => marker.col = text.parse().ok(),
                        MarkerField::Row => marker.row = text.parse().ok(),
                        MarkerField::ColOff => marker.col_off = text.parse().unwrap_or(0),
                        MarkerField::RowOff => marker.row_off = text.parse().unwrap_or(0),
                    }
                }
            }
            Ok(Event::End(_)) => {
                marker_field = None;
                path.pop();
                if matches!(&current, Some((depth, _)) if *depth == path.len()) {
                    if let Some((_, anchor)) = current.take() {
                        anchors.push(anchor);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(anchors)
}

fn image_format(part: &str, content_types: &ContentTypes) -> String {
    content_types
        .content_type_for(part)
        .and_then(image_format_from_content_type)
        .or_else(|| part_extension(part))
        .unwrap_or_else(|| "png".to_string())
}

fn extract_image<R: Read + Seek>(
    archive: &mut zip::ZipArchive<R>,
    anchor: &DrawingAnchor,
    object: &DrawingObject,
    embed: Option<&str>,
    ctx: &DrawingContext<'_>,
) -> Result<ImageExtraction, String> {
    let placement = anchor.resolve()?;
    let embed = embed.ok_or("picture has no blip reference")?;
    let rel = ctx
        .rels
        .get(embed)
        .ok_or_else(|| format!("unknown image relationship {}", embed))?;
    if rel.external {
        return Err(format!("image {} is linked, not embedded", rel.target));
    }

    let part = resolve_target(ctx.drawing_path, &rel.target);
    let data = read_part(archive, &part)
        .map_err(|e| e.to_string())?
        .ok_or_else(|| format!("media part {} is missing", part))?;

    let mut image = ImageExtraction::new(data, image_format(&part, ctx.content_types), placement);
    let (width, height) = anchor.pixel_size(object);
    image.width = width;
    image.height = height;
    image.anchor_type = anchor.kind;
    Ok(image)
}

fn extract_chart<R: Read + Seek>(
    archive: &mut zip::ZipArchive<R>,
    anchor: &DrawingAnchor,
    object: &DrawingObject,
    rel_id: Option<&str>,
    ctx: &DrawingContext<'_>,
) -> Result<ChartExtraction, String> {
    let (anchor_row, anchor_col) = anchor.resolve()?.cell();
    let rel_id = rel_id.ok_or("graphic frame has no chart reference")?;
    let rel = ctx
        .rels
        .get(rel_id)
        .ok_or_else(|| format!("unknown chart relationship {}", rel_id))?;

    let part = resolve_target(ctx.drawing_path, &rel.target);
    let xml = read_part(archive, &part)
        .map_err(|e| e.to_string())?
        .ok_or_else(|| format!("chart part {} is missing", part))?;
    let chart = parse_chart(xml.as_slice()).map_err(|e| format!("{}: {}", part, e))?;

    let (width, height) = anchor.pixel_size(object);
    Ok(ChartExtraction {
        kind: chart.kind,
        title: chart.title,
        data: chart.data,
        anchor_row,
        anchor_col,
        width,
        height,
    })
}

struct DrawingContext<'a> {
    drawing_path: &'a str,
    rels: &'a Relationships,
    content_types: &'a ContentTypes,
}

/// Images and charts of one drawing part
#[derive(Debug, Default)]
pub(crate) struct DrawingItems {
    pub images: Vec<ItemOutcome<ImageExtraction>>,
    pub charts: Vec<ItemOutcome<ChartExtraction>>,
}

/// Read a drawing part and extract every image and chart on it.
///
/// A failing object is recorded as skipped; only an unreadable drawing part
/// itself is an error.
pub(crate) fn read_drawing<R: Read + Seek>(
    archive: &mut zip::ZipArchive<R>,
    drawing_path: &str,
    content_types: &ContentTypes,
) -> XlsxResult<DrawingItems> {
    let xml = read_part(archive, drawing_path)?
        .ok_or_else(|| XlsxError::MissingPart(drawing_path.to_string()))?;
    let anchors = parse_drawing(xml.as_slice())?;

    let rels = match read_part(archive, &rels_path_for(drawing_path))? {
        Some(data) => parse_relationships(data.as_slice())?,
        None => Relationships::new(),
    };
    let ctx = DrawingContext {
        drawing_path,
        rels: &rels,
        content_types,
    };

    let mut items = DrawingItems::default();
    for anchor in &anchors {
        for object in &anchor.objects {
            match object {
                DrawingObject::Picture { embed, .. } => {
                    let outcome: ItemOutcome<_> =
                        extract_image(archive, anchor, object, embed.as_deref(), &ctx).into();
                    if let Some(reason) = outcome.skip_reason() {
                        log::warn!("Skipping image in {}: {}", drawing_path, reason);
                    }
                    items.images.push(outcome);
                }
                DrawingObject::Chart { rel_id, .. } => {
                    let outcome: ItemOutcome<_> =
                        extract_chart(archive, anchor, object, rel_id.as_deref(), &ctx).into();
                    if let Some(reason) = outcome.skip_reason() {
                        log::warn!("Skipping chart in {}: {}", drawing_path, reason);
                    }
                    items.charts.push(outcome);
                }
            }
        }
    }

    log::debug!(
        "{}: {} image(s), {} chart(s)",
        drawing_path,
        items.images.len(),
        items.charts.len()
    );
    Ok(items)
}
