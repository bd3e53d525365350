//! xlmerge - section-anchored XLSX merge engine
//!
//! Fills per-location worksheets of a main workbook from sheets of source
//! workbooks, driven by an equipment roster:
//! - Sections located by keyword in a fixed marker column
//! - Section spans resized to the incoming row count, merged ranges kept consistent
//! - Cells copied with their formatting, styles deduplicated across workbooks
//! - Per-sheet completion status written as the tab color
//! - Untouched package parts saved byte-identical
//!
//! # Usage
//!
//! ```no_run
//! use xlmerge::{merge, roster, MergeConfig, XlDocument};
//!
//! # fn main() -> xlmerge::Result<()> {
//! let config = MergeConfig::default();
//! let mut main = XlDocument::open("main.xlsx")?;
//! let sources = vec![XlDocument::open("converted.xlsx")?.workbook().clone()];
//! let roster_wb = XlDocument::open("roster.xlsx")?;
//! let records = roster::load_roster(roster_wb.workbook(), &config.roster)?;
//!
//! let report = merge::run(&mut main, &sources, &records, &config)?;
//! main.save_to("main.xlsx")?;
//! println!("{}", report.to_json()?);
//! # Ok(())
//! # }
//! ```

// Document model and XLSX I/O
pub mod cell_ref;
pub mod error;
pub mod numfmt;
pub mod parser;
pub mod styles;
pub mod types;
pub mod xml_helpers;

mod export;

// Editing and merging
pub mod config;
pub mod editor;
pub mod merge;
pub mod roster;

pub use config::{ConsolePolicy, MergeConfig};
pub use editor::XlDocument;
pub use error::{Result, XlmergeError};
pub use merge::{CompletionStatus, MergeEvent, MergeReport, SubsectionState};
pub use roster::{EquipmentRecord, RosterField};
pub use types::*;

/// Get the library version
#[must_use]
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
