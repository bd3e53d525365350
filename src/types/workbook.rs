use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::*;
use crate::styles::StyleRegistry;
use crate::xml_helpers::RawAttr;

/// A complete Excel workbook: ordered worksheets plus the style registry
/// their cells reference.
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
    pub styles: StyleRegistry,
    /// ZIP path of each sheet's part, parallel to `sheets`.
    pub(crate) sheet_paths: Vec<String>,
}

impl Workbook {
    /// Look up a worksheet by exact (case-sensitive) name.
    #[must_use]
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    /// Mutable lookup by exact (case-sensitive) name.
    pub fn sheet_mut(&mut self, name: &str) -> Option<&mut Sheet> {
        self.sheets.iter_mut().find(|s| s.name == name)
    }

    #[must_use]
    pub fn sheet_index(&self, name: &str) -> Option<usize> {
        self.sheets.iter().position(|s| s.name == name)
    }

    pub fn sheet_names(&self) -> impl Iterator<Item = &str> {
        self.sheets.iter().map(|s| s.name.as_str())
    }
}

/// Sheet visibility state
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SheetState {
    #[default]
    Visible,
    Hidden,
    VeryHidden,
}

/// One grid row: its `<row>` attributes (height, hidden, outline level…)
/// and its cells keyed by 1-based column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    pub(crate) attrs: Vec<RawAttr>,
    pub(crate) cells: BTreeMap<u32, Cell>,
}

impl Row {
    pub(crate) fn is_empty(&self) -> bool {
        self.attrs.is_empty() && self.cells.is_empty()
    }

    /// Cells in column order.
    pub fn cells(&self) -> impl Iterator<Item = (u32, &Cell)> {
        self.cells.iter().map(|(c, cell)| (*c, cell))
    }
}

/// A worksheet element kept as raw XML because it is not modeled.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Fragment {
    /// Local element name, used to keep schema order on write.
    pub name: String,
    pub xml: String,
}

/// Everything of the original worksheet part that the grid does not
/// model, in document order around `<sheetData>`.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct SheetLayout {
    pub root_attrs: Vec<RawAttr>,
    pub sheet_pr_attrs: Vec<RawAttr>,
    pub sheet_pr_children: Vec<Fragment>,
    pub before_data: Vec<Fragment>,
    pub after_data: Vec<Fragment>,
}

/// A single worksheet: a sparse, row-indexed grid of cells with merged
/// ranges and a tab color. Rows and columns are 1-based.
#[derive(Debug, Clone, Default)]
pub struct Sheet {
    pub name: String,
    pub state: SheetState,
    /// Tab color as ARGB hex (e.g. `FF00FF00`).
    pub tab_color: Option<String>,
    pub(crate) rows: BTreeMap<u32, Row>,
    pub(crate) merges: Vec<MergeRange>,
    pub(crate) layout: SheetLayout,
}

impl Sheet {
    /// An empty worksheet.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn cell(&self, row: u32, col: u32) -> Option<&Cell> {
        self.rows.get(&row)?.cells.get(&col)
    }

    #[must_use]
    pub fn value(&self, row: u32, col: u32) -> Option<&CellValue> {
        self.cell(row, col).map(|c| &c.value)
    }

    /// Store `cell` at `(row, col)`, replacing what was there.
    ///
    /// Absent-equivalent cells are removed instead of stored.
    pub fn set_cell(&mut self, row: u32, col: u32, cell: Cell) {
        if cell.is_absent() {
            self.remove_cell(row, col);
            return;
        }
        self.rows.entry(row).or_default().cells.insert(col, cell);
    }

    /// Replace only the value, keeping style; clears any formula.
    pub fn set_value(&mut self, row: u32, col: u32, value: impl Into<CellValue>) {
        let style = self.cell(row, col).map_or(0, |c| c.style);
        self.set_cell(
            row,
            col,
            Cell {
                value: value.into(),
                formula: None,
                style,
            },
        );
    }

    /// Clear value and formula of one cell, keeping its style.
    pub fn clear_value(&mut self, row: u32, col: u32) {
        let Some(entry) = self.rows.get_mut(&row) else {
            return;
        };
        if let Some(cell) = entry.cells.get_mut(&col) {
            cell.value = CellValue::Empty;
            cell.formula = None;
            if cell.is_absent() {
                entry.cells.remove(&col);
            }
        }
        if entry.is_empty() {
            self.rows.remove(&row);
        }
    }

    pub(crate) fn remove_cell(&mut self, row: u32, col: u32) {
        if let Some(entry) = self.rows.get_mut(&row) {
            entry.cells.remove(&col);
            if entry.is_empty() {
                self.rows.remove(&row);
            }
        }
    }

    /// Last row holding at least one cell, or 0 for an empty sheet.
    #[must_use]
    pub fn max_row(&self) -> u32 {
        self.rows
            .iter()
            .rev()
            .find(|(_, r)| !r.cells.is_empty())
            .map_or(0, |(r, _)| *r)
    }

    /// Right-most populated column, or 0 for an empty sheet.
    #[must_use]
    pub fn max_col(&self) -> u32 {
        self.rows
            .values()
            .filter_map(|r| r.cells.keys().next_back().copied())
            .max()
            .unwrap_or(0)
    }

    /// Every stored cell in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (u32, u32, &Cell)> {
        self.rows
            .iter()
            .flat_map(|(r, row)| row.cells.iter().map(move |(c, cell)| (*r, *c, cell)))
    }

    /// Rows that carry cells or attributes, in order.
    pub fn rows(&self) -> impl Iterator<Item = (u32, &Row)> {
        self.rows.iter().map(|(r, row)| (*r, row))
    }

    #[must_use]
    pub fn merges(&self) -> &[MergeRange] {
        &self.merges
    }

    /// Raw `<row>` attributes (height, hidden, …) of a row.
    #[must_use]
    pub fn row_attrs(&self, row: u32) -> &[RawAttr] {
        self.rows.get(&row).map_or(&[], |r| r.attrs.as_slice())
    }

    pub fn set_row_attrs(&mut self, row: u32, attrs: Vec<RawAttr>) {
        let entry = self.rows.entry(row).or_default();
        entry.attrs = attrs;
        if entry.is_empty() {
            self.rows.remove(&row);
        }
    }
}
