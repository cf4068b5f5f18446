//! Common utilities for E2E tests.

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::ZipWriter;

pub const SHEET_NS: &str = r#"xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships""#;

pub const REL_WORKSHEET: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";
pub const REL_CHARTSHEET: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/chartsheet";
pub const REL_DRAWING: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/drawing";
pub const REL_IMAGE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
pub const REL_CHART: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/chart";

/// Wrap `<sheetData>` content (and anything after it) in a worksheet part
pub fn worksheet(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet {}>{}</worksheet>"#,
        SHEET_NS, body
    )
}

/// A relationships part from `(id, type, target)` triples
pub fn rels(entries: &[(&str, &str, &str)]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    for (id, rel_type, target) in entries {
        xml.push_str(&format!(
            r#"<Relationship Id="{}" Type="{}" Target="{}"/>"#,
            id, rel_type, target
        ));
    }
    xml.push_str("</Relationships>");
    xml
}

/// Builds a minimal XLSX package in memory
#[derive(Default)]
pub struct XlsxFixture {
    sheets: Vec<(String, String, String)>,
    shared_strings: Option<Vec<String>>,
    styles: Option<String>,
    date_1904: bool,
    parts: Vec<(String, Vec<u8>)>,
}

impl XlsxFixture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a worksheet, stored at `xl/worksheets/sheetN.xml`
    pub fn sheet(mut self, name: &str, xml: impl Into<String>) -> Self {
        self.sheets
            .push((name.to_string(), REL_WORKSHEET.to_string(), xml.into()));
        self
    }

    /// Add a chart sheet (not a worksheet)
    pub fn chart_sheet(mut self, name: &str) -> Self {
        self.sheets.push((
            name.to_string(),
            REL_CHARTSHEET.to_string(),
            r#"<chartsheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"/>"#
                .to_string(),
        ));
        self
    }

    pub fn shared_strings(mut self, strings: &[&str]) -> Self {
        self.shared_strings = Some(strings.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn styles(mut self, xml: impl Into<String>) -> Self {
        self.styles = Some(xml.into());
        self
    }

    pub fn date_1904(mut self) -> Self {
        self.date_1904 = true;
        self
    }

    /// Add any other part verbatim
    pub fn part(mut self, path: &str, data: impl Into<Vec<u8>>) -> Self {
        self.parts.push((path.to_string(), data.into()));
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();

        let put = |zip: &mut ZipWriter<Cursor<Vec<u8>>>, path: &str, data: &[u8]| {
            zip.start_file(path, options).unwrap();
            zip.write_all(data).unwrap();
        };

        put(
            &mut zip,
            "[Content_Types].xml",
            br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Default Extension="png" ContentType="image/png"/>
<Default Extension="jpeg" ContentType="image/jpeg"/>
<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
</Types>"#,
        );

        let mut workbook = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook {}>"#,
            SHEET_NS
        );
        if self.date_1904 {
            workbook.push_str(r#"<workbookPr date1904="1"/>"#);
        }
        workbook.push_str("<sheets>");
        let mut workbook_rels = Vec::new();
        for (i, (name, rel_type, _)) in self.sheets.iter().enumerate() {
            workbook.push_str(&format!(
                r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
                name,
                i + 1,
                i + 1
            ));
            let target = if rel_type == REL_WORKSHEET {
                format!("worksheets/sheet{}.xml", i + 1)
            } else {
                format!("chartsheets/sheet{}.xml", i + 1)
            };
            workbook_rels.push((format!("rId{}", i + 1), rel_type.clone(), target));
        }
        workbook.push_str("</sheets></workbook>");
        put(&mut zip, "xl/workbook.xml", workbook.as_bytes());

        let rel_refs: Vec<(&str, &str, &str)> = workbook_rels
            .iter()
            .map(|(id, t, target)| (id.as_str(), t.as_str(), target.as_str()))
            .collect();
        put(
            &mut zip,
            "xl/_rels/workbook.xml.rels",
            rels(&rel_refs).as_bytes(),
        );

        for (i, (_, rel_type, xml)) in self.sheets.iter().enumerate() {
            let dir = if rel_type == REL_WORKSHEET {
                "worksheets"
            } else {
                "chartsheets"
            };
            put(
                &mut zip,
                &format!("xl/{}/sheet{}.xml", dir, i + 1),
                xml.as_bytes(),
            );
        }

        if let Some(strings) = &self.shared_strings {
            let mut xml = String::from(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
            );
            for s in strings {
                xml.push_str(&format!(r#"<si><t xml:space="preserve">{}</t></si>"#, s));
            }
            xml.push_str("</sst>");
            put(&mut zip, "xl/sharedStrings.xml", xml.as_bytes());
        }

        if let Some(styles) = &self.styles {
            put(&mut zip, "xl/styles.xml", styles.as_bytes());
        }

        for (path, data) in &self.parts {
            put(&mut zip, path, data);
        }

        zip.finish().unwrap().into_inner()
    }
}
