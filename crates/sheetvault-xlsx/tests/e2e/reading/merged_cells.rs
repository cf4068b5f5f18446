//! Merged ranges come out 0-indexed and inclusive.

use crate::common::*;
use pretty_assertions::assert_eq;
use sheetvault_core::MergeRange;
use sheetvault_xlsx::XlsxReader;

#[test]
fn test_merges_are_normalized() {
    let bytes = XlsxFixture::new()
        .sheet(
            "Merged",
            worksheet(
                r#"<sheetData><row r="1"><c r="A1"><v>1</v></c></row></sheetData>
<mergeCells count="3">
  <mergeCell ref="A2:A3"/>
  <mergeCell ref="B2:C3"/>
  <mergeCell ref="D1:F1"></mergeCell>
</mergeCells>"#,
            ),
        )
        .build();

    let sheet = &XlsxReader::read_bytes(&bytes).unwrap()[0];
    assert_eq!(
        sheet.merged_cells,
        vec![
            MergeRange::new(1, 0, 2, 0).unwrap(),
            MergeRange::new(1, 1, 2, 2).unwrap(),
            MergeRange::new(0, 3, 0, 5).unwrap(),
        ]
    );
}

#[test]
fn test_unparseable_merge_is_dropped() {
    let bytes = XlsxFixture::new()
        .sheet(
            "Merged",
            worksheet(
                r#"<sheetData/>
<mergeCells count="2"><mergeCell ref="bogus"/><mergeCell ref="C3:D4"/></mergeCells>"#,
            ),
        )
        .build();

    let sheet = &XlsxReader::read_bytes(&bytes).unwrap()[0];
    assert_eq!(sheet.merged_cells, vec![MergeRange::new(2, 2, 3, 3).unwrap()]);
}
