use serde::{Deserialize, Serialize};

use crate::cell_ref::format_range;
use crate::xml_helpers::RawAttr;

/// A rectangular block of cells rendered as one (1-based, inclusive).
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct MergeRange {
    pub start_row: u32,
    pub start_col: u32,
    pub end_row: u32,
    pub end_col: u32,
}

impl MergeRange {
    #[must_use]
    pub fn new(start_row: u32, start_col: u32, end_row: u32, end_col: u32) -> Self {
        Self {
            start_row: start_row.min(end_row),
            start_col: start_col.min(end_col),
            end_row: start_row.max(end_row),
            end_col: start_col.max(end_col),
        }
    }

    /// Parse an A1 range such as "A5:C6".
    #[must_use]
    pub fn parse(range: &str) -> Option<Self> {
        let (r1, c1, r2, c2) = crate::cell_ref::parse_cell_range(range)?;
        Some(Self::new(r1, c1, r2, c2))
    }

    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start_row <= other.end_row
            && other.start_row <= self.end_row
            && self.start_col <= other.end_col
            && other.start_col <= self.end_col
    }

    /// Whether the range lies entirely within rows `first..=last`.
    #[must_use]
    pub fn within_rows(&self, first: u32, last: u32) -> bool {
        self.start_row >= first && self.end_row <= last
    }

    /// Whether the range shares at least one row with `first..=last`.
    #[must_use]
    pub fn touches_rows(&self, first: u32, last: u32) -> bool {
        self.start_row <= last && self.end_row >= first
    }

    /// The same range moved down by `delta` rows, clamped at `u32::MAX`.
    #[must_use]
    pub fn offset_rows(&self, delta: u32) -> Self {
        Self {
            start_row: self.start_row.saturating_add(delta),
            end_row: self.end_row.saturating_add(delta),
            ..*self
        }
    }
}

impl std::fmt::Display for MergeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&format_range(
            self.start_row,
            self.start_col,
            self.end_row,
            self.end_col,
        ))
    }
}

/// Cell format (`xf`) from `cellXfs`.
///
/// Component ids index into the owning registry's tables. Alignment and
/// protection are kept as canonical XML fragments; any other attribute
/// (`applyFont`, `quotePrefix`, ...) is kept verbatim in `flags`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct CellXf {
    pub num_fmt_id: u32,
    pub font_id: u32,
    pub fill_id: u32,
    pub border_id: u32,
    /// Reference to `cellStyleXfs` (named style).
    pub xf_id: Option<u32>,
    pub flags: Vec<RawAttr>,
    pub alignment: Option<String>,
    pub protection: Option<String>,
}
