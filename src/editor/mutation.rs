//! Structural edits on a worksheet.
//!
//! Row insertion and deletion move cells, row attributes and merged
//! ranges together so the no-overlap invariant of merged ranges holds
//! after every call.

use std::collections::BTreeMap;

use crate::error::{Result, XlmergeError};
use crate::types::{MergeRange, Row, Sheet};

impl Sheet {
    /// Insert `n` blank rows before row `at`.
    ///
    /// Rows at or below `at` move down by `n`. Merged ranges starting at
    /// or below `at` move with them; ranges spanning `at` grow.
    pub fn insert_rows(&mut self, at: u32, n: u32) {
        if n == 0 {
            return;
        }
        let at = at.max(1);

        let moved = self.rows.split_off(&at);
        self.rows
            .extend(moved.into_iter().map(|(r, row)| (r.saturating_add(n), row)));

        for merge in &mut self.merges {
            if merge.start_row >= at {
                *merge = merge.offset_rows(n);
            } else if merge.end_row >= at {
                merge.end_row = merge.end_row.saturating_add(n);
            }
        }
    }

    /// Delete `n` rows starting at row `at`, moving everything below up.
    ///
    /// Merged ranges fully inside the deleted rows are dropped. A merged
    /// range that shares rows with the deleted span without lying fully
    /// inside it fails the whole call with
    /// [`XlmergeError::MergedRangeStraddle`]; the sheet is left unchanged.
    pub fn delete_rows(&mut self, at: u32, n: u32) -> Result<()> {
        if n == 0 {
            return Ok(());
        }
        let at = at.max(1);
        let last = at.saturating_add(n - 1);

        if let Some(straddle) = self
            .merges
            .iter()
            .find(|m| m.touches_rows(at, last) && !m.within_rows(at, last))
        {
            return Err(XlmergeError::MergedRangeStraddle {
                range: straddle.to_string(),
                start: at,
                end: last,
            });
        }

        let mut below = self.rows.split_off(&at);
        let kept_below: BTreeMap<u32, Row> = below.split_off(&last.saturating_add(1));
        self.rows
            .extend(kept_below.into_iter().map(|(r, row)| (r - n, row)));

        self.merges.retain(|m| !m.within_rows(at, last));
        for merge in &mut self.merges {
            if merge.start_row > last {
                merge.start_row -= n;
                merge.end_row -= n;
            }
        }
        Ok(())
    }

    /// Clear the values of every cell in rows `first..=last`.
    ///
    /// Styles, row attributes and merged ranges stay.
    pub fn clear_rows(&mut self, first: u32, last: u32) {
        if first > last {
            return;
        }
        let targets: Vec<(u32, u32)> = self
            .rows
            .range(first..=last)
            .flat_map(|(r, row)| row.cells.keys().map(move |c| (*r, *c)))
            .collect();
        for (row, col) in targets {
            self.clear_value(row, col);
        }
    }

    /// Remove merged ranges lying entirely within rows `first..=last`.
    ///
    /// Returns how many were removed.
    pub fn unmerge_within(&mut self, first: u32, last: u32) -> usize {
        let before = self.merges.len();
        self.merges.retain(|m| !m.within_rows(first, last));
        before - self.merges.len()
    }

    /// Add a merged range.
    ///
    /// Returns `Ok(false)` if the identical range already exists. Any other
    /// overlap with an existing range is an error and nothing is added.
    pub fn merge_cells(&mut self, range: MergeRange) -> Result<bool> {
        if self.merges.contains(&range) {
            return Ok(false);
        }
        if let Some(existing) = self.merges.iter().find(|m| m.overlaps(&range)) {
            return Err(XlmergeError::MergeOverlap {
                range: range.to_string(),
                existing: existing.to_string(),
            });
        }
        self.merges.push(range);
        Ok(true)
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use crate::types::{Cell, CellValue, MergeRange, Sheet};
    use crate::XlmergeError;

    fn sample() -> Sheet {
        let mut sheet = Sheet::new("GA-501");
        for row in 1..=10 {
            sheet.set_value(row, 1, f64::from(row));
        }
        sheet.set_row_attrs(6, vec![("ht".into(), "25".into())]);
        sheet
    }

    #[test]
    fn test_insert_rows_shifts_cells_and_attrs() {
        let mut sheet = sample();
        sheet.insert_rows(5, 3);

        assert_eq!(sheet.value(4, 1), Some(&CellValue::Number(4.0)));
        assert!(sheet.cell(5, 1).is_none());
        assert!(sheet.cell(7, 1).is_none());
        assert_eq!(sheet.value(8, 1), Some(&CellValue::Number(5.0)));
        assert_eq!(sheet.value(13, 1), Some(&CellValue::Number(10.0)));
        assert_eq!(sheet.row_attrs(9).len(), 1);
        assert_eq!(sheet.max_row(), 13);
    }

    #[test]
    fn test_insert_rows_moves_and_grows_merges() {
        let mut sheet = sample();
        sheet.merges.push(MergeRange::new(1, 1, 2, 3)); // above
        sheet.merges.push(MergeRange::new(4, 2, 6, 2)); // spans row 5
        sheet.merges.push(MergeRange::new(5, 1, 5, 4)); // starts at 5
        sheet.insert_rows(5, 2);

        assert_eq!(
            sheet.merges(),
            &[
                MergeRange::new(1, 1, 2, 3),
                MergeRange::new(4, 2, 8, 2),
                MergeRange::new(7, 1, 7, 4),
            ]
        );
    }

    #[test]
    fn test_delete_rows_shifts_up_and_drops_inner_merges() {
        let mut sheet = sample();
        sheet.merges.push(MergeRange::new(4, 1, 5, 2)); // inside 4..=6
        sheet.merges.push(MergeRange::new(8, 1, 9, 2)); // below
        sheet.delete_rows(4, 3).unwrap();

        assert_eq!(sheet.value(3, 1), Some(&CellValue::Number(3.0)));
        assert_eq!(sheet.value(4, 1), Some(&CellValue::Number(7.0)));
        assert_eq!(sheet.max_row(), 7);
        assert!(sheet.row_attrs(3).is_empty());
        assert_eq!(sheet.merges(), &[MergeRange::new(5, 1, 6, 2)]);
    }

    #[test]
    fn test_delete_rows_straddle_leaves_sheet_untouched() {
        let mut sheet = sample();
        sheet.merges.push(MergeRange::new(5, 1, 7, 1));
        let before = sheet.clone();

        let err = sheet.delete_rows(6, 4).unwrap_err();
        assert!(matches!(
            err,
            XlmergeError::MergedRangeStraddle { start: 6, end: 9, .. }
        ));
        assert!(!err.is_fatal());
        assert_eq!(sheet.max_row(), before.max_row());
        assert_eq!(sheet.merges(), before.merges());
    }

    #[test]
    fn test_delete_rows_enclosing_merge_is_a_straddle() {
        let mut sheet = sample();
        sheet.merges.push(MergeRange::new(2, 1, 9, 1));
        assert!(sheet.delete_rows(4, 2).is_err());
    }

    #[test]
    fn test_insert_then_delete_restores_row_count() {
        let mut sheet = sample();
        sheet.insert_rows(3, 4);
        sheet.delete_rows(3, 4).unwrap();
        assert_eq!(sheet.max_row(), 10);
        assert_eq!(sheet.value(3, 1), Some(&CellValue::Number(3.0)));
        assert_eq!(sheet.row_attrs(6).len(), 1);
    }

    #[test]
    fn test_clear_rows_keeps_styles() {
        let mut sheet = sample();
        sheet.set_cell(
            3,
            2,
            Cell {
                value: "styled".into(),
                formula: None,
                style: 5,
            },
        );
        sheet.clear_rows(2, 4);

        assert!(sheet.cell(2, 1).is_none());
        assert_eq!(sheet.value(3, 2), Some(&CellValue::Empty));
        assert_eq!(sheet.cell(3, 2).unwrap().style, 5);
        assert_eq!(sheet.value(5, 1), Some(&CellValue::Number(5.0)));
    }

    #[test]
    fn test_merge_cells_rejects_overlap() {
        let mut sheet = Sheet::new("S");
        assert!(sheet.merge_cells(MergeRange::new(1, 1, 2, 2)).unwrap());
        assert!(!sheet.merge_cells(MergeRange::new(1, 1, 2, 2)).unwrap());
        let err = sheet.merge_cells(MergeRange::new(2, 2, 3, 3)).unwrap_err();
        assert!(matches!(err, XlmergeError::MergeOverlap { .. }));
        assert_eq!(sheet.merges().len(), 1);
    }

    #[test]
    fn test_unmerge_within() {
        let mut sheet = Sheet::new("S");
        sheet.merge_cells(MergeRange::new(2, 1, 3, 1)).unwrap();
        sheet.merge_cells(MergeRange::new(3, 2, 6, 2)).unwrap();
        assert_eq!(sheet.unmerge_within(2, 4), 1);
        assert_eq!(sheet.merges(), &[MergeRange::new(3, 2, 6, 2)]);
    }
}
