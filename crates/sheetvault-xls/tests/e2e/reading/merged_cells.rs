//! MERGECELLS records normalized through the half-open legacy convention.

use crate::common::*;
use pretty_assertions::assert_eq;
use sheetvault_core::MergeRange;
use sheetvault_xls::XlsReader;

#[test]
fn test_merges_keep_inclusive_geometry() {
    let bytes = XlsFixture::new()
        .sheet(
            "S",
            vec![
                label(0, 0, "Title"),
                mergecells(&[(0, 0, 0, 3), (1, 2, 0, 0), (5, 7, 2, 4)]),
            ],
        )
        .build();

    let sheet = &XlsReader::read_bytes(&bytes).unwrap()[0];
    assert_eq!(
        sheet.merged_cells,
        vec![
            MergeRange::new(0, 0, 0, 3).unwrap(),
            MergeRange::new(1, 0, 2, 0).unwrap(),
            MergeRange::new(5, 2, 7, 4).unwrap(),
        ]
    );
}

#[test]
fn test_inverted_merge_is_dropped() {
    let bytes = XlsFixture::new()
        .sheet("S", vec![mergecells(&[(4, 2, 0, 0), (0, 1, 0, 1)])])
        .build();

    let sheet = &XlsReader::read_bytes(&bytes).unwrap()[0];
    assert_eq!(sheet.merged_cells, vec![MergeRange::new(0, 0, 1, 1).unwrap()]);
}
