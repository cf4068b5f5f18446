//! Cell values, extents and sheet ordering.

use crate::common::*;
use pretty_assertions::assert_eq;
use sheetvault_core::{CellValue, SparseCell};
use sheetvault_xlsx::{XlsxError, XlsxReader};

const DATE_STYLES: &str = r#"<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<numFmts count="1"><numFmt numFmtId="164" formatCode="yyyy-mm-dd hh:mm"/></numFmts>
<cellXfs count="3"><xf numFmtId="0"/><xf numFmtId="14"/><xf numFmtId="164"/></cellXfs>
</styleSheet>"#;

#[test]
fn test_read_typed_cells() {
    let bytes = XlsxFixture::new()
        .shared_strings(&["Name", "  padded  "])
        .sheet(
            "Data",
            worksheet(
                r#"<dimension ref="A1:C3"/><sheetData>
<row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" t="s"><v>1</v></c></row>
<row r="2"><c r="A2"><v>42</v></c><c r="B2"><v>3.25</v></c><c r="C2" t="b"><v>1</v></c></row>
<row r="3"><c r="A3" t="e"><v>#DIV/0!</v></c><c r="B3" t="inlineStr"><is><t>inline</t></is></c><c r="C3" t="str"><f>A1&amp;"!"</f><v>Name!</v></c></row>
</sheetData>"#,
            ),
        )
        .build();

    let sheets = XlsxReader::read_bytes(&bytes).unwrap();
    assert_eq!(sheets.len(), 1);
    let sheet = &sheets[0];
    assert_eq!(sheet.name, "Data");
    assert_eq!(sheet.index, 0);
    assert_eq!((sheet.row_count, sheet.column_count), (3, 3));
    assert_eq!(
        sheet.cells,
        vec![
            SparseCell::new(0, 0, CellValue::text("Name")),
            SparseCell::new(0, 1, CellValue::text("  padded  ")),
            SparseCell::new(1, 0, CellValue::Number(42.0)),
            SparseCell::new(1, 1, CellValue::Number(3.25)),
            SparseCell::new(1, 2, CellValue::Boolean(true)),
            SparseCell::new(2, 0, CellValue::Error("#DIV/0!".into())),
            SparseCell::new(2, 1, CellValue::text("inline")),
            SparseCell::new(2, 2, CellValue::text("Name!")),
        ]
    );
    assert!(sheet.images.is_empty());
    assert!(sheet.charts.is_empty());
}

#[test]
fn test_extent_takes_furthest_cell_and_dimension() {
    let bytes = XlsxFixture::new()
        .sheet(
            "Wide",
            worksheet(
                r#"<dimension ref="A1:B2"/><sheetData>
<row r="10"><c r="E10"><v>1</v></c></row>
</sheetData>"#,
            ),
        )
        .sheet(
            "Tall",
            worksheet(
                r#"<dimension ref="A1:F20"/><sheetData>
<row r="1"><c r="A1"><v>1</v></c></row>
</sheetData>"#,
            ),
        )
        .build();

    let sheets = XlsxReader::read_bytes(&bytes).unwrap();
    assert_eq!((sheets[0].row_count, sheets[0].column_count), (10, 5));
    assert_eq!((sheets[1].row_count, sheets[1].column_count), (20, 6));
    assert_eq!(sheets[1].index, 1);
}

#[test]
fn test_empty_sheet_is_zero_by_zero() {
    let bytes = XlsxFixture::new()
        .sheet("Empty", worksheet(r#"<dimension ref="A1"/><sheetData/>"#))
        .build();

    let sheets = XlsxReader::read_bytes(&bytes).unwrap();
    assert_eq!((sheets[0].row_count, sheets[0].column_count), (0, 0));
    assert!(sheets[0].cells.is_empty());
    assert!(sheets[0].row_matrix().is_empty());
}

#[test]
fn test_styled_empty_cells_count_toward_extent_only() {
    let bytes = XlsxFixture::new()
        .sheet(
            "S",
            worksheet(
                r#"<sheetData>
<row r="1"><c r="A1"><v>x</v></c><c r="D1" s="1"/></row>
<row r="4"><c r="A4" t="inlineStr"><is><t></t></is></c></row>
</sheetData>"#,
            ),
        )
        .build();

    let sheet = &XlsxReader::read_bytes(&bytes).unwrap()[0];
    assert_eq!((sheet.row_count, sheet.column_count), (4, 4));
    assert_eq!(sheet.cells, vec![SparseCell::new(0, 0, CellValue::text("x"))]);
}

#[test]
fn test_cells_without_references() {
    let bytes = XlsxFixture::new()
        .sheet(
            "S",
            worksheet(
                r#"<sheetData>
<row><c><v>1</v></c><c><v>2</v></c></row>
<row><c><v>3</v></c></row>
</sheetData>"#,
            ),
        )
        .build();

    let sheet = &XlsxReader::read_bytes(&bytes).unwrap()[0];
    assert_eq!(
        sheet.cells,
        vec![
            SparseCell::new(0, 0, CellValue::Number(1.0)),
            SparseCell::new(0, 1, CellValue::Number(2.0)),
            SparseCell::new(1, 0, CellValue::Number(3.0)),
        ]
    );
}

#[test]
fn test_date_formatted_numbers_become_dates() {
    let bytes = XlsxFixture::new()
        .styles(DATE_STYLES)
        .sheet(
            "Dates",
            worksheet(
                r#"<sheetData><row r="1">
<c r="A1" s="1"><v>45000</v></c>
<c r="B1" s="2"><v>45000.75</v></c>
<c r="C1" s="0"><v>45000</v></c>
</row></sheetData>"#,
            ),
        )
        .build();

    let sheet = &XlsxReader::read_bytes(&bytes).unwrap()[0];
    let stored: Vec<_> = sheet
        .cells
        .iter()
        .map(|c| c.value.to_stored_text().unwrap())
        .collect();
    assert_eq!(
        stored,
        vec!["2023-03-15 00:00:00", "2023-03-15 18:00:00", "45000"]
    );
}

#[test]
fn test_date_1904_system() {
    let bytes = XlsxFixture::new()
        .date_1904()
        .styles(DATE_STYLES)
        .sheet(
            "Dates",
            worksheet(r#"<sheetData><row r="1"><c r="A1" s="1"><v>1</v></c></row></sheetData>"#),
        )
        .build();

    let sheet = &XlsxReader::read_bytes(&bytes).unwrap()[0];
    assert_eq!(
        sheet.cells[0].value.to_stored_text().as_deref(),
        Some("1904-01-02 00:00:00")
    );
}

#[test]
fn test_chart_sheets_are_skipped() {
    let bytes = XlsxFixture::new()
        .sheet("First", worksheet("<sheetData/>"))
        .chart_sheet("Chart1")
        .sheet("Second", worksheet("<sheetData/>"))
        .build();

    let sheets = XlsxReader::read_bytes(&bytes).unwrap();
    let names: Vec<_> = sheets.iter().map(|s| (s.name.as_str(), s.index)).collect();
    assert_eq!(names, vec![("First", 0), ("Second", 1)]);
}

#[test]
fn test_escapes_in_shared_strings() {
    let bytes = XlsxFixture::new()
        .shared_strings(&["line_x000a_break", "a &amp; b"])
        .sheet(
            "S",
            worksheet(
                r#"<sheetData><row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" t="s"><v>1</v></c></row></sheetData>"#,
            ),
        )
        .build();

    let sheet = &XlsxReader::read_bytes(&bytes).unwrap()[0];
    assert_eq!(sheet.cells[0].value, CellValue::text("line\nbreak"));
    assert_eq!(sheet.cells[1].value, CellValue::text("a & b"));
}

#[test]
fn test_not_a_package() {
    let err = XlsxReader::read_bytes(b"definitely not a zip").unwrap_err();
    assert!(matches!(err, XlsxError::Zip(_)));
}

#[test]
fn test_bad_shared_string_index_fails_the_file() {
    let bytes = XlsxFixture::new()
        .shared_strings(&["only"])
        .sheet(
            "S",
            worksheet(r#"<sheetData><row r="1"><c r="A1" t="s"><v>7</v></c></row></sheetData>"#),
        )
        .build();

    let err = XlsxReader::read_bytes(&bytes).unwrap_err();
    assert!(err.to_string().contains("out of bounds"));
}

#[test]
fn test_repeated_reference_keeps_last_value() {
    let bytes = XlsxFixture::new()
        .sheet(
            "Dupes",
            worksheet(
                r#"<sheetData>
<row r="1"><c r="A1" t="inlineStr"><is><t>first</t></is></c><c r="A1" t="inlineStr"><is><t>second</t></is></c><c r="B1"><v>1</v></c></row>
<row r="2"><c r="A2"><v>5</v></c><c r="A2"/></row>
</sheetData>"#,
            ),
        )
        .build();

    let sheet = XlsxReader::read_bytes(&bytes).unwrap().remove(0);
    assert_eq!(
        sheet.cells,
        vec![
            SparseCell::new(0, 0, CellValue::text("second")),
            SparseCell::new(0, 1, CellValue::Number(1.0)),
        ]
    );
    assert_eq!((sheet.row_count, sheet.column_count), (2, 2));
}
