//! Copying a source sheet's grid into a section of a target sheet.

use crate::cell_ref::MAX_ROW;
use crate::error::{Result, XlmergeError};
use crate::styles::{StyleImporter, StyleRegistry};
use crate::types::{Cell, MergeRange, Sheet};

/// Rows a source sheet occupies once copied: its last populated row or
/// the bottom of its lowest merged range, whichever is further down.
#[must_use]
pub fn block_height(source: &Sheet) -> u32 {
    source
        .merges()
        .iter()
        .map(|m| m.end_row)
        .fold(source.max_row(), u32::max)
}

/// Copy every cell and merged range of `source` into `dest`, source row
/// `r` landing on row `start_row + r - 1`.
///
/// Styles are imported into `dest_styles`, reusing equivalent entries.
/// Values are copied as stored; formulas are not carried over since their
/// references would point at the wrong rows. Merged ranges are checked
/// before anything is written, so an overlap leaves `dest` untouched.
/// A block that would end below [`MAX_ROW`] fails the same way.
/// Returns the number of cells written.
pub fn copy_block(
    source: &Sheet,
    source_styles: &StyleRegistry,
    dest: &mut Sheet,
    dest_styles: &mut StyleRegistry,
    start_row: u32,
) -> Result<usize> {
    let delta = start_row.saturating_sub(1);
    let last = block_height(source);
    if !matches!(last.checked_add(delta), Some(end) if end <= MAX_ROW) {
        return Err(XlmergeError::RowOutOfRange { row: last, delta });
    }

    let merges: Vec<MergeRange> = source.merges().iter().map(|m| m.offset_rows(delta)).collect();
    for merge in &merges {
        if let Some(existing) = dest
            .merges()
            .iter()
            .find(|m| *m != merge && m.overlaps(merge))
        {
            return Err(XlmergeError::MergeOverlap {
                range: merge.to_string(),
                existing: existing.to_string(),
            });
        }
    }

    let mut importer = StyleImporter::new(source_styles);
    let mut written = 0;
    for (row, col, cell) in source.cells() {
        let style = importer.import(dest_styles, cell.style)?;
        dest.set_cell(
            row + delta,
            col,
            Cell {
                value: cell.value.clone(),
                formula: None,
                style,
            },
        );
        written += 1;
    }

    for merge in merges {
        dest.merge_cells(merge)?;
    }

    Ok(written)
}
