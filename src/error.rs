//! Structured error types for xlmerge.
//!
//! Package and I/O failures are fatal for a merge run; the structural
//! variants (`MergedRangeStraddle`, `MergeOverlap`) are recovered per
//! section by the orchestrator and recorded in the event log.

/// All errors that can occur while loading, editing, merging or saving.
#[derive(Debug, thiserror::Error)]
pub enum XlmergeError {
    /// XML parsing error from quick-xml.
    #[error("XML parsing: {0}")]
    Xml(#[from] quick_xml::Error),

    /// ZIP archive error.
    #[error("ZIP archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (config or report) error.
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid cell reference.
    #[error("Invalid cell reference: {0}")]
    CellRef(String),

    /// General parse error.
    #[error("Parse error: {0}")]
    Parse(String),

    /// A row deletion boundary cuts through a merged range.
    #[error("merged range {range} straddles the deleted rows {start}..={end}")]
    MergedRangeStraddle { range: String, start: u32, end: u32 },

    /// A new merged range would overlap an existing, different one.
    #[error("merged range {range} overlaps existing range {existing}")]
    MergeOverlap { range: String, existing: String },

    /// Shifting a row by an offset would run past the last sheet row.
    #[error("row {row} moved down by {delta} rows falls past the last sheet row")]
    RowOutOfRange { row: u32, delta: u32 },

    /// The style registry reached the format's cell-format limit.
    #[error("style registry full: cannot register more than {limit} cell formats")]
    StyleRegistryFull { limit: usize },

    /// Catch-all for string errors.
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, XlmergeError>;

impl XlmergeError {
    /// Whether this error must abort a whole merge run.
    ///
    /// Everything else is local to one section and is reported instead.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::MergedRangeStraddle { .. }
                | Self::MergeOverlap { .. }
                | Self::RowOutOfRange { .. }
                | Self::CellRef(_)
        )
    }
}

impl From<String> for XlmergeError {
    fn from(s: String) -> Self {
        Self::Other(s)
    }
}

impl From<&str> for XlmergeError {
    fn from(s: &str) -> Self {
        Self::Other(s.to_string())
    }
}
