//! Per-sheet completion status from the three subsection outcomes.

use serde::Serialize;
use std::fmt;

use crate::config::{ConsolePolicy, StatusPalette};

/// Outcome of one subsection after a merge attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubsectionState {
    Filled,
    NotApplicable,
    NotFound,
}

/// Status shown as the sheet's tab color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionStatus {
    Complete,
    Partial,
    Missing,
}

impl CompletionStatus {
    #[must_use]
    pub fn color(self, palette: &StatusPalette) -> &str {
        match self {
            Self::Complete => &palette.complete,
            Self::Partial => &palette.partial,
            Self::Missing => &palette.missing,
        }
    }
}

impl fmt::Display for CompletionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Complete => "complete",
            Self::Partial => "partial",
            Self::Missing => "missing",
        })
    }
}

/// Console failure dominates; otherwise both arms must be filled.
#[must_use]
pub fn classify(
    arm_a: SubsectionState,
    arm_b: SubsectionState,
    console: SubsectionState,
    policy: ConsolePolicy,
) -> CompletionStatus {
    use SubsectionState::{Filled, NotApplicable, NotFound};

    match (arm_a, arm_b, console) {
        (_, _, NotFound) => CompletionStatus::Missing,
        (_, _, NotApplicable) if policy == ConsolePolicy::RemoveSection => {
            CompletionStatus::Missing
        }
        (Filled, Filled, _) => CompletionStatus::Complete,
        _ => CompletionStatus::Partial,
    }
}
