//! Resizing a section's editable span to an exact row count.

use crate::error::XlmergeError;
use crate::types::Sheet;

use super::locator::next_anchor;

/// What the reconciler did to the row count.
#[derive(Debug)]
pub enum ResizeAction {
    Unchanged,
    Grown,
    Shrunk,
    /// Deleting rows would have cut a merged range; the span kept its
    /// old size (content is still cleared).
    ShrinkAborted(XlmergeError),
}

/// Result of reconciling one section.
#[derive(Debug)]
pub struct Reconciled {
    /// First row of the editable span; data is written from here.
    pub start_row: u32,
    /// Editable rows before the call.
    pub available: u32,
    pub action: ResizeAction,
}

/// Make the span between `anchor` and the next marker row exactly
/// `needed` rows long.
///
/// The span's values are cleared and merged ranges lying fully inside it
/// are removed first, so nothing of a previous fill survives. Rows are
/// then inserted just before the next anchor, or deleted from the end of
/// the span.
pub fn reconcile(sheet: &mut Sheet, marker_col: u32, anchor: u32, needed: u32) -> Reconciled {
    let next = next_anchor(sheet, marker_col, anchor);
    let available = next - anchor - 1;
    let start_row = anchor + 1;

    if available > 0 {
        sheet.clear_rows(start_row, next - 1);
        sheet.unmerge_within(start_row, next - 1);
    }

    let action = if needed > available {
        sheet.insert_rows(next, needed - available);
        ResizeAction::Grown
    } else if needed < available {
        match sheet.delete_rows(start_row + needed, available - needed) {
            Ok(()) => ResizeAction::Shrunk,
            Err(e) => ResizeAction::ShrinkAborted(e),
        }
    } else {
        ResizeAction::Unchanged
    };

    Reconciled {
        start_row,
        available,
        action,
    }
}
