//! Editable workbook document.
//!
//! `XlDocument` owns a parsed workbook together with the bytes it was
//! loaded from, adding:
//! - Dirty tracking per sheet
//! - Structural edits (see [`mutation`])
//! - XLSX save (roundtrip via the export pipeline)

pub(crate) mod mutation;

use std::collections::HashSet;
use std::path::Path;

use crate::error::{Result, XlmergeError};
use crate::types::{Sheet, Workbook};

/// A loaded workbook that can be edited and saved back.
#[derive(Debug, Clone)]
pub struct XlDocument {
    original_bytes: Vec<u8>,
    workbook: Workbook,
    /// Indices of sheets modified since load.
    dirty_sheets: HashSet<usize>,
}

impl XlDocument {
    /// Load an XLSX file from bytes.
    ///
    /// Stores the original bytes for later save (ZIP roundtrip).
    pub fn load(data: &[u8]) -> Result<Self> {
        let workbook = crate::parser::parse(data)?;
        Ok(Self {
            original_bytes: data.to_vec(),
            workbook,
            dirty_sheets: HashSet::new(),
        })
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read(path.as_ref())?;
        Self::load(&data)
    }

    #[must_use]
    pub fn workbook(&self) -> &Workbook {
        &self.workbook
    }

    /// Mutable access to the whole workbook.
    ///
    /// Callers that change a sheet through this must [`mark_dirty`](Self::mark_dirty) it.
    pub fn workbook_mut(&mut self) -> &mut Workbook {
        &mut self.workbook
    }

    /// Mutable access to a sheet by name; the sheet is marked dirty.
    pub fn sheet_mut(&mut self, name: &str) -> Option<&mut Sheet> {
        let idx = self.workbook.sheet_index(name)?;
        self.dirty_sheets.insert(idx);
        self.workbook.sheets.get_mut(idx)
    }

    /// Flag a sheet for re-serialization on save.
    pub fn mark_dirty(&mut self, name: &str) -> Result<()> {
        let idx = self
            .workbook
            .sheet_index(name)
            .ok_or_else(|| XlmergeError::Other(format!("no sheet named '{name}'")))?;
        self.dirty_sheets.insert(idx);
        Ok(())
    }

    /// Check if any sheet or the style registry changed.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        !self.dirty_sheets.is_empty() || self.workbook.styles.is_dirty()
    }

    /// Save the workbook to XLSX bytes.
    ///
    /// If nothing changed, returns the original bytes.
    pub fn save(&self) -> Result<Vec<u8>> {
        crate::export::save_xlsx(&self.original_bytes, &self.workbook, &self.dirty_sheets)
    }

    /// Save to a file.
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path.as_ref(), self.save()?)?;
        Ok(())
    }
}
