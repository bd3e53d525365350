use serde::{Deserialize, Serialize};

/// A cell's stored value.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    Error(String),
}

impl CellValue {
    /// True for `Empty` and for text that is blank after trimming.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// The text content, if this is a text value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// A single cell: value, formula text and a reference into the
/// workbook's style registry.
///
/// Font, fill, border, alignment, protection and number format all live
/// in the referenced cell format (`xf`); index 0 is the default format.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Cell {
    pub value: CellValue,
    /// Formula text without the leading `=` (preserved for roundtrip save).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    /// Index into the workbook's `cellXfs`.
    pub style: u32,
}

impl Cell {
    /// A default-styled cell holding `value`.
    pub fn new(value: impl Into<CellValue>) -> Self {
        Self {
            value: value.into(),
            formula: None,
            style: 0,
        }
    }

    /// A cell with no value, no formula and the default style is
    /// indistinguishable from an absent one.
    #[must_use]
    pub fn is_absent(&self) -> bool {
        self.value == CellValue::Empty && self.formula.is_none() && self.style == 0
    }
}
