//! Merge run configuration.
//!
//! Every field has a default matching the production workbooks, so an
//! empty JSON object (or no config file at all) is a valid configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;

/// Settings for one merge run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct MergeConfig {
    /// 1-based column holding the section keywords (7 = column G).
    pub marker_column: u32,
    /// Prefix joined with a location id to form the target sheet name.
    pub sheet_prefix: String,
    pub keywords: SectionKeywords,
    pub palette: StatusPalette,
    pub console_not_applicable: ConsolePolicy,
    pub roster: RosterColumns,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            marker_column: 7,
            sheet_prefix: "GA-".to_string(),
            keywords: SectionKeywords::default(),
            palette: StatusPalette::default(),
            console_not_applicable: ConsolePolicy::default(),
            roster: RosterColumns::default(),
        }
    }
}

impl MergeConfig {
    /// Load from a JSON file; missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Target sheet name for a location id.
    #[must_use]
    pub fn sheet_name(&self, location: &str) -> String {
        format!("{}{}", self.sheet_prefix, location)
    }
}

/// Marker-column keywords naming the three subsections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionKeywords {
    pub arm_a: String,
    pub arm_b: String,
    pub console: String,
}

impl Default for SectionKeywords {
    fn default() -> Self {
        Self {
            arm_a: "Moving Arm".to_string(),
            arm_b: "Fixed Arm".to_string(),
            console: "Console".to_string(),
        }
    }
}

/// Tab colors (ARGB hex) for each completion status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusPalette {
    pub complete: String,
    pub partial: String,
    pub missing: String,
}

impl Default for StatusPalette {
    fn default() -> Self {
        Self {
            complete: "FF00FF00".to_string(),
            partial: "FF800080".to_string(),
            missing: "FFFF0000".to_string(),
        }
    }
}

/// What a not-applicable Console entry means for a sheet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsolePolicy {
    /// Collapse the section body; the sheet can still be Complete.
    #[default]
    KeepSection,
    /// Remove the section, anchor row included, and classify Missing.
    RemoveSection,
}

/// Roster header names and filters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RosterColumns {
    /// Sheet holding the roster; the first sheet when unset.
    pub sheet: Option<String>,
    pub location: String,
    pub arm_a: String,
    pub arm_b: String,
    pub console: String,
    /// Only locations starting with this prefix are merged.
    pub location_prefix: Option<String>,
}

impl Default for RosterColumns {
    fn default() -> Self {
        Self {
            sheet: None,
            location: "MachineNumber".to_string(),
            arm_a: "MovingArm".to_string(),
            arm_b: "FixedArm".to_string(),
            console: "Console".to_string(),
            location_prefix: None,
        }
    }
}
