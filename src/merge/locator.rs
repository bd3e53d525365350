//! Finding section anchors in the marker column.

use crate::types::Sheet;

/// First row whose marker cell contains `keyword`, ignoring case.
///
/// Only text cells can match; numbers, booleans and errors are skipped.
#[must_use]
pub fn locate(sheet: &Sheet, marker_col: u32, keyword: &str) -> Option<u32> {
    let needle = keyword.to_lowercase();
    sheet.rows().find_map(|(row, _)| {
        let text = sheet.value(row, marker_col)?.as_text()?;
        text.to_lowercase().contains(&needle).then_some(row)
    })
}

/// First row after `anchor` whose marker cell holds anything, else one
/// past the last populated row.
#[must_use]
pub fn next_anchor(sheet: &Sheet, marker_col: u32, anchor: u32) -> u32 {
    sheet
        .rows()
        .filter(|(row, _)| *row > anchor)
        .find_map(|(row, _)| {
            sheet
                .value(row, marker_col)
                .filter(|v| !v.is_blank())
                .map(|_| row)
        })
        .unwrap_or_else(|| sheet.max_row().max(anchor) + 1)
}
