//! Data types for the grid document model.

mod cell;
mod style;
mod workbook;

pub use cell::*;
pub use style::*;
pub use workbook::*;
