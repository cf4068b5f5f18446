//! Images and charts reached through the sheet's drawing part.

use crate::common::*;
use pretty_assertions::assert_eq;
use sheetvault_core::{AnchorKind, ChartKind, SeriesInfo};
use sheetvault_xlsx::XlsxReader;

const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nfake-image-payload";

const DRAWING: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<xdr:wsDr xmlns:xdr="http://schemas.openxmlformats.org/drawingml/2006/spreadsheetDrawing" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:c="http://schemas.openxmlformats.org/drawingml/2006/chart">
  <xdr:oneCellAnchor>
    <xdr:from><xdr:col>3</xdr:col><xdr:colOff>0</xdr:colOff><xdr:row>1</xdr:row><xdr:rowOff>0</xdr:rowOff></xdr:from>
    <xdr:ext cx="1828800" cy="914400"/>
    <xdr:pic><xdr:blipFill><a:blip r:embed="rId1"/></xdr:blipFill></xdr:pic>
    <xdr:clientData/>
  </xdr:oneCellAnchor>
  <xdr:twoCellAnchor>
    <xdr:from><xdr:col>0</xdr:col><xdr:colOff>0</xdr:colOff><xdr:row>8</xdr:row><xdr:rowOff>0</xdr:rowOff></xdr:from>
    <xdr:to><xdr:col>6</xdr:col><xdr:colOff>0</xdr:colOff><xdr:row>20</xdr:row><xdr:rowOff>0</xdr:rowOff></xdr:to>
    <xdr:graphicFrame macro="">
      <xdr:xfrm><a:off x="0" y="0"/><a:ext cx="4572000" cy="2743200"/></xdr:xfrm>
      <a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/chart"><c:chart r:id="rId2"/></a:graphicData></a:graphic>
    </xdr:graphicFrame>
    <xdr:clientData/>
  </xdr:twoCellAnchor>
  <xdr:oneCellAnchor>
    <xdr:from><xdr:col>9</xdr:col><xdr:colOff>0</xdr:colOff><xdr:row>9</xdr:row><xdr:rowOff>0</xdr:rowOff></xdr:from>
    <xdr:ext cx="914400" cy="914400"/>
    <xdr:pic><xdr:blipFill><a:blip r:embed="rId3"/></xdr:blipFill></xdr:pic>
    <xdr:clientData/>
  </xdr:oneCellAnchor>
  <xdr:twoCellAnchor>
    <xdr:from><xdr:col>1</xdr:col><xdr:colOff>0</xdr:colOff><xdr:row>30</xdr:row><xdr:rowOff>0</xdr:rowOff></xdr:from>
    <xdr:to><xdr:col>2</xdr:col><xdr:colOff>0</xdr:colOff><xdr:row>31</xdr:row><xdr:rowOff>0</xdr:rowOff></xdr:to>
    <xdr:graphicFrame macro=""><a:graphic><a:graphicData><c:chart r:id="rId4"/></a:graphicData></a:graphic></xdr:graphicFrame>
    <xdr:clientData/>
  </xdr:twoCellAnchor>
</xdr:wsDr>"#;

const CHART: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<c:chartSpace xmlns:c="http://schemas.openxmlformats.org/drawingml/2006/chart" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main">
  <c:chart>
    <c:title><c:tx><c:rich><a:p><a:r><a:t>Share</a:t></a:r></a:p></c:rich></c:tx></c:title>
    <c:plotArea><c:layout/>
      <c:pieChart>
        <c:ser><c:idx val="0"/>
          <c:tx><c:strRef><c:f>Data!$B$1</c:f><c:strCache><c:pt idx="0"><c:v>Units</c:v></c:pt></c:strCache></c:strRef></c:tx>
          <c:cat><c:strRef><c:f>Data!$A$2:$A$4</c:f></c:strRef></c:cat>
          <c:val><c:numRef><c:f>Data!$B$2:$B$4</c:f></c:numRef></c:val>
        </c:ser>
      </c:pieChart>
    </c:plotArea>
  </c:chart>
</c:chartSpace>"#;

fn workbook_with_drawing() -> Vec<u8> {
    XlsxFixture::new()
        .sheet(
            "Dashboard",
            worksheet(
                r#"<sheetData><row r="1"><c r="A1"><v>1</v></c></row></sheetData><drawing r:id="rId1"/>"#,
            ),
        )
        .part(
            "xl/worksheets/_rels/sheet1.xml.rels",
            rels(&[("rId1", REL_DRAWING, "../drawings/drawing1.xml")]),
        )
        .part("xl/drawings/drawing1.xml", DRAWING)
        .part(
            "xl/drawings/_rels/drawing1.xml.rels",
            rels(&[
                ("rId1", REL_IMAGE, "../media/image1.png"),
                ("rId2", REL_CHART, "../charts/chart1.xml"),
                ("rId3", REL_IMAGE, "../media/missing.png"),
                ("rId4", REL_CHART, "../charts/chart2.xml"),
            ]),
        )
        .part("xl/media/image1.png", PNG_BYTES)
        .part("xl/charts/chart1.xml", CHART)
        .part(
            "xl/charts/chart2.xml",
            "<c:chartSpace><c:chart></c:plotArea></c:chartSpace>",
        )
        .build()
}

#[test]
fn test_images_are_extracted_with_anchor_and_size() {
    let sheet = XlsxReader::read_bytes(&workbook_with_drawing())
        .unwrap()
        .remove(0);

    let images: Vec<_> = sheet.extracted_images().collect();
    assert_eq!(images.len(), 1);
    let image = images[0];
    assert_eq!(image.data, PNG_BYTES);
    assert_eq!(image.format, "png");
    assert_eq!((image.anchor_row, image.anchor_col), (1, 3));
    assert_eq!((image.width, image.height), (Some(192), Some(96)));
    assert_eq!(image.anchor_type, AnchorKind::OneCell);
}

#[test]
fn test_charts_are_extracted_with_series() {
    let sheet = XlsxReader::read_bytes(&workbook_with_drawing())
        .unwrap()
        .remove(0);

    let charts: Vec<_> = sheet.extracted_charts().collect();
    assert_eq!(charts.len(), 1);
    let chart = charts[0];
    assert_eq!(chart.kind, ChartKind::Pie);
    assert_eq!(chart.title.as_deref(), Some("Share"));
    assert_eq!((chart.anchor_row, chart.anchor_col), (8, 0));
    assert_eq!((chart.width, chart.height), (Some(480), Some(288)));
    assert_eq!(
        chart.data.series,
        vec![SeriesInfo {
            index: 0,
            name: Some("Units".into()),
            values_ref: Some("Data!$B$2:$B$4".into()),
            categories_ref: Some("Data!$A$2:$A$4".into()),
        }]
    );
}

#[test]
fn test_broken_items_are_skipped_not_fatal() {
    let sheet = XlsxReader::read_bytes(&workbook_with_drawing())
        .unwrap()
        .remove(0);

    assert_eq!(sheet.images.len(), 2);
    assert_eq!(sheet.charts.len(), 2);

    let skipped = sheet.skipped_items();
    assert_eq!(skipped.len(), 2);
    assert_eq!(skipped[0].kind, "image");
    assert!(skipped[0].reason.contains("missing.png"), "{}", skipped[0].reason);
    assert_eq!(skipped[1].kind, "chart");
    assert!(skipped[1].reason.contains("chart2.xml"), "{}", skipped[1].reason);

    // Cells are unaffected
    assert_eq!(sheet.cells.len(), 1);
}

#[test]
fn test_dangling_drawing_relationship_leaves_sheet_intact() {
    let bytes = XlsxFixture::new()
        .sheet(
            "S",
            worksheet(
                r#"<sheetData><row r="1"><c r="A1"><v>1</v></c></row></sheetData><drawing r:id="rId7"/>"#,
            ),
        )
        .build();

    let sheet = &XlsxReader::read_bytes(&bytes).unwrap()[0];
    assert!(sheet.images.is_empty());
    assert!(sheet.charts.is_empty());
    assert_eq!(sheet.cells.len(), 1);
}

fn picture_anchor(row: u32, embed: &str) -> String {
    format!(
        r#"<xdr:oneCellAnchor>
    <xdr:from><xdr:col>0</xdr:col><xdr:colOff>0</xdr:colOff><xdr:row>{}</xdr:row><xdr:rowOff>0</xdr:rowOff></xdr:from>
    <xdr:ext cx="914400" cy="914400"/>
    <xdr:pic><xdr:blipFill><a:blip r:embed="{}"/></xdr:blipFill></xdr:pic>
    <xdr:clientData/>
  </xdr:oneCellAnchor>"#,
        row, embed
    )
}

#[test]
fn test_image_format_falls_back_to_extension_then_png() {
    let drawing = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<xdr:wsDr xmlns:xdr="http://schemas.openxmlformats.org/drawingml/2006/spreadsheetDrawing" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">{}{}{}</xdr:wsDr>"#,
        picture_anchor(0, "rId1"),
        picture_anchor(1, "rId2"),
        picture_anchor(2, "rId3"),
    );

    let bytes = XlsxFixture::new()
        .sheet(
            "Pictures",
            worksheet(r#"<sheetData/><drawing r:id="rId1"/>"#),
        )
        .part(
            "xl/worksheets/_rels/sheet1.xml.rels",
            rels(&[("rId1", REL_DRAWING, "../drawings/drawing1.xml")]),
        )
        .part("xl/drawings/drawing1.xml", drawing)
        .part(
            "xl/drawings/_rels/drawing1.xml.rels",
            rels(&[
                ("rId1", REL_IMAGE, "../media/image1.jpeg"),
                ("rId2", REL_IMAGE, "../media/image2.emf"),
                ("rId3", REL_IMAGE, "../media/image3"),
            ]),
        )
        .part("xl/media/image1.jpeg", b"jpeg-bytes".to_vec())
        .part("xl/media/image2.emf", b"emf-bytes".to_vec())
        .part("xl/media/image3", b"raw-bytes".to_vec())
        .build();

    let sheet = XlsxReader::read_bytes(&bytes).unwrap().remove(0);
    assert!(sheet.skipped_items().is_empty());
    let formats: Vec<_> = sheet
        .extracted_images()
        .map(|image| (image.anchor_row, image.format.as_str()))
        .collect();
    assert_eq!(formats, vec![(0, "jpeg"), (1, "emf"), (2, "png")]);
}
