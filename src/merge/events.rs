//! Audit trail of a merge run.

use serde::Serialize;
use std::fmt;

use super::classify::{CompletionStatus, SubsectionState};

/// Which of the three subsections an event concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Subsection {
    ArmA,
    ArmB,
    Console,
}

impl Subsection {
    pub const ALL: [Self; 3] = [Self::ArmA, Self::ArmB, Self::Console];
}

impl fmt::Display for Subsection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ArmA => "arm A",
            Self::ArmB => "arm B",
            Self::Console => "console",
        })
    }
}

/// One notable action or recovered failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum MergeEvent {
    LocationSkipped {
        location: String,
        sheet: String,
    },
    SectionMatched {
        sheet: String,
        keyword: String,
        anchor_row: u32,
    },
    SectionResized {
        sheet: String,
        keyword: String,
        from_rows: u32,
        to_rows: u32,
    },
    SectionCleared {
        sheet: String,
        keyword: String,
    },
    SectionRemoved {
        sheet: String,
        keyword: String,
    },
    SectionNotFound {
        sheet: String,
        keyword: String,
        /// Roster identifier that was to be placed, if any.
        identifier: Option<String>,
    },
    SourceNotFound {
        sheet: String,
        keyword: String,
        identifier: String,
    },
    NoIdentifier {
        sheet: String,
        keyword: String,
    },
    ShrinkAborted {
        sheet: String,
        keyword: String,
        reason: String,
    },
    CopyFailed {
        sheet: String,
        keyword: String,
        identifier: String,
        reason: String,
    },
    Copied {
        sheet: String,
        keyword: String,
        identifier: String,
        rows: u32,
    },
    Recolored {
        sheet: String,
        status: CompletionStatus,
        color: String,
    },
}

impl MergeEvent {
    /// Whether this records a recovered failure rather than an action.
    #[must_use]
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            Self::LocationSkipped { .. }
                | Self::SectionNotFound { .. }
                | Self::SourceNotFound { .. }
                | Self::NoIdentifier { .. }
                | Self::ShrinkAborted { .. }
                | Self::CopyFailed { .. }
        )
    }
}

impl fmt::Display for MergeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LocationSkipped { location, sheet } => {
                write!(f, "location {location}: sheet '{sheet}' not found, skipped")
            }
            Self::SectionMatched {
                sheet,
                keyword,
                anchor_row,
            } => write!(f, "{sheet}: '{keyword}' found at row {anchor_row}"),
            Self::SectionResized {
                sheet,
                keyword,
                from_rows,
                to_rows,
            } => write!(f, "{sheet}: '{keyword}' resized from {from_rows} to {to_rows} rows"),
            Self::SectionCleared { sheet, keyword } => {
                write!(f, "{sheet}: '{keyword}' not applicable, section cleared")
            }
            Self::SectionRemoved { sheet, keyword } => {
                write!(f, "{sheet}: '{keyword}' not applicable, section removed")
            }
            Self::SectionNotFound {
                sheet,
                keyword,
                identifier: Some(identifier),
            } => write!(f, "{sheet}: no '{keyword}' marker to place '{identifier}'"),
            Self::SectionNotFound {
                sheet,
                keyword,
                identifier: None,
            } => write!(f, "{sheet}: no '{keyword}' marker"),
            Self::SourceNotFound {
                sheet,
                keyword,
                identifier,
            } => write!(f, "{sheet}: '{keyword}' source sheet '{identifier}' not found"),
            Self::NoIdentifier { sheet, keyword } => {
                write!(f, "{sheet}: '{keyword}' has no roster entry")
            }
            Self::ShrinkAborted {
                sheet,
                keyword,
                reason,
            } => write!(f, "{sheet}: '{keyword}' left unresized: {reason}"),
            Self::CopyFailed {
                sheet,
                keyword,
                identifier,
                reason,
            } => write!(f, "{sheet}: copying '{identifier}' into '{keyword}' failed: {reason}"),
            Self::Copied {
                sheet,
                keyword,
                identifier,
                rows,
            } => write!(f, "{sheet}: '{keyword}' filled from '{identifier}' ({rows} rows)"),
            Self::Recolored {
                sheet,
                status,
                color,
            } => write!(f, "{sheet}: status {status}, tab color {color}"),
        }
    }
}

/// Ordered, append-only event list, mirrored to the `log` facade.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct EventLog {
    events: Vec<MergeEvent>,
}

impl EventLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: MergeEvent) {
        if event.is_warning() {
            log::warn!("{event}");
        } else {
            log::info!("{event}");
        }
        self.events.push(event);
    }

    #[must_use]
    pub fn events(&self) -> &[MergeEvent] {
        &self.events
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn warnings(&self) -> impl Iterator<Item = &MergeEvent> {
        self.events.iter().filter(|e| e.is_warning())
    }
}

/// Outcome for one roster location.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationReport {
    pub location: String,
    pub sheet: String,
    pub arm_a: SubsectionState,
    pub arm_b: SubsectionState,
    pub console: SubsectionState,
    pub status: CompletionStatus,
}

/// Everything a run did, per location plus the full event log.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MergeReport {
    pub locations: Vec<LocationReport>,
    /// Locations whose target sheet does not exist.
    pub skipped: Vec<String>,
    pub events: EventLog,
}

impl MergeReport {
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Count of processed locations per status: (complete, partial, missing).
    #[must_use]
    pub fn status_counts(&self) -> (usize, usize, usize) {
        self.locations
            .iter()
            .fold((0, 0, 0), |(c, p, m), loc| match loc.status {
                CompletionStatus::Complete => (c + 1, p, m),
                CompletionStatus::Partial => (c, p + 1, m),
                CompletionStatus::Missing => (c, p, m + 1),
            })
    }
}
