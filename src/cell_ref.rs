//! Utilities for parsing and formatting Excel-style cell references and ranges.
//!
//! Rows and columns are 1-based throughout the crate, matching the A1
//! notation they come from.

/// Last row a worksheet can hold.
pub const MAX_ROW: u32 = 1_048_576;

/// Parse a cell reference like "B3" into `(row, col)`, both 1-based.
pub fn parse_cell_ref(cell_ref: &str) -> Option<(u32, u32)> {
    parse_cell_ref_bytes(cell_ref.trim().as_bytes())
}

/// Parse a cell reference from raw bytes (ASCII) into `(row, col)`, both 1-based.
///
/// This is the bytes equivalent of [`parse_cell_ref`] for use when working with
/// raw XML attribute values (e.g., `attr.value` from quick-xml).
pub fn parse_cell_ref_bytes(ref_bytes: &[u8]) -> Option<(u32, u32)> {
    let mut col: u32 = 0;
    let mut row: u32 = 0;
    let mut saw_col = false;
    let mut saw_row = false;

    for &b in ref_bytes {
        if b == b'$' {
            continue;
        }
        if b.is_ascii_alphabetic() {
            if saw_row {
                return None;
            }
            let upper = b.to_ascii_uppercase();
            col = col
                .checked_mul(26)?
                .checked_add(u32::from(upper - b'A') + 1)?;
            saw_col = true;
        } else if b.is_ascii_digit() {
            row = row.checked_mul(10)?.checked_add(u32::from(b - b'0'))?;
            saw_row = true;
        } else {
            return None;
        }
    }

    if !saw_col || !saw_row || row == 0 {
        return None;
    }

    Some((row, col))
}

/// Parse a cell range like "A1:B10" or "A1" into `(start_row, start_col, end_row, end_col)`.
///
/// Corners are normalized so that start <= end on both axes.
pub fn parse_cell_range(range: &str) -> Option<(u32, u32, u32, u32)> {
    let (start, end) = range.split_once(':').unwrap_or((range, range));
    let (r1, c1) = parse_cell_ref(start)?;
    let (r2, c2) = parse_cell_ref(end)?;
    Some((r1.min(r2), c1.min(c2), r1.max(r2), c1.max(c2)))
}

/// Convert a 1-based column number to its letters (1 -> "A", 27 -> "AA").
pub fn col_to_letter(col: u32) -> String {
    let mut result = String::new();
    let mut n = col;
    while n > 0 {
        n -= 1;
        let c = char::from(b'A' + u8::try_from(n % 26).unwrap_or(0));
        result.insert(0, c);
        n /= 26;
    }
    result
}

/// Format `(row, col)` as an A1 reference.
pub fn format_cell_ref(row: u32, col: u32) -> String {
    format!("{}{}", col_to_letter(col), row)
}

/// Format a rectangular range as "A1:B2" (or "A1" when it is a single cell).
pub fn format_range(start_row: u32, start_col: u32, end_row: u32, end_col: u32) -> String {
    if start_row == end_row && start_col == end_col {
        return format_cell_ref(start_row, start_col);
    }
    format!(
        "{}:{}",
        format_cell_ref(start_row, start_col),
        format_cell_ref(end_row, end_col)
    )
}
