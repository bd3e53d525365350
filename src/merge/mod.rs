//! Merging source sheets into the sections of per-location target sheets.
//!
//! For every roster record, in roster order, the target sheet
//! `<prefix><location>` gets its three subsections (arm A, arm B,
//! console) resized and filled from the named source sheets, then its tab
//! colored by completion status. Sections are processed strictly one
//! after another: every resize shifts the rows below it, so anchors are
//! located afresh right before each edit.
//!
//! Recoverable problems (missing sheets, markers or sources, merged
//! ranges in the way) become events and the run continues. Only errors
//! for which [`crate::XlmergeError::is_fatal`] holds abort it.

pub mod classify;
pub mod copy;
pub mod events;
pub mod locator;
pub mod reconcile;

use crate::config::{ConsolePolicy, MergeConfig};
use crate::editor::XlDocument;
use crate::error::Result;
use crate::roster::{EquipmentRecord, RosterField};
use crate::styles::StyleRegistry;
use crate::types::{Sheet, Workbook};

pub use classify::{classify, CompletionStatus, SubsectionState};
pub use events::{EventLog, LocationReport, MergeEvent, MergeReport, Subsection};

use copy::{block_height, copy_block};
use locator::locate;
use reconcile::{reconcile, ResizeAction};

/// Merge every roster record into `doc`.
///
/// `doc` is mutated in place; saving it is left to the caller.
pub fn run(
    doc: &mut XlDocument,
    sources: &[Workbook],
    roster: &[EquipmentRecord],
    config: &MergeConfig,
) -> Result<MergeReport> {
    let mut report = MergeReport::default();

    for record in roster {
        let sheet_name = config.sheet_name(&record.location);
        let Some(idx) = doc.workbook().sheet_index(&sheet_name) else {
            report.events.push(MergeEvent::LocationSkipped {
                location: record.location.clone(),
                sheet: sheet_name,
            });
            report.skipped.push(record.location.clone());
            continue;
        };

        let workbook = doc.workbook_mut();
        let Some(sheet) = workbook.sheets.get_mut(idx) else {
            continue;
        };
        let mut target = Target {
            sheet,
            styles: &mut workbook.styles,
            events: &mut report.events,
            config,
        };

        let mut states = [SubsectionState::NotFound; 3];
        for (state, subsection) in states.iter_mut().zip(Subsection::ALL) {
            let field = match subsection {
                Subsection::ArmA => &record.arm_a,
                Subsection::ArmB => &record.arm_b,
                Subsection::Console => &record.console,
            };
            *state = target.merge_section(subsection, field, sources)?;
        }
        let [arm_a, arm_b, console] = states;

        let status = classify(arm_a, arm_b, console, config.console_not_applicable);
        let color = status.color(&config.palette).to_string();
        target.sheet.tab_color = Some(color.clone());
        target.events.push(MergeEvent::Recolored {
            sheet: sheet_name.clone(),
            status,
            color,
        });
        doc.mark_dirty(&sheet_name)?;

        report.locations.push(LocationReport {
            location: record.location.clone(),
            sheet: sheet_name,
            arm_a,
            arm_b,
            console,
            status,
        });
    }

    let (complete, partial, missing) = report.status_counts();
    log::info!(
        "merge finished: {complete} complete, {partial} partial, {missing} missing, {} skipped",
        report.skipped.len()
    );
    Ok(report)
}

/// First source sheet named `identifier`, searching workbooks in order.
fn find_source<'a>(
    sources: &'a [Workbook],
    identifier: &str,
) -> Option<(&'a Sheet, &'a StyleRegistry)> {
    sources
        .iter()
        .find_map(|wb| wb.sheet(identifier).map(|sheet| (sheet, &wb.styles)))
}

/// One target sheet being merged, with the registry its cells use.
struct Target<'a> {
    sheet: &'a mut Sheet,
    styles: &'a mut StyleRegistry,
    events: &'a mut EventLog,
    config: &'a MergeConfig,
}

impl Target<'_> {
    fn keyword(&self, subsection: Subsection) -> &str {
        let keywords = &self.config.keywords;
        match subsection {
            Subsection::ArmA => &keywords.arm_a,
            Subsection::ArmB => &keywords.arm_b,
            Subsection::Console => &keywords.console,
        }
    }

    fn anchor(&mut self, keyword: &str, identifier: Option<&str>) -> Option<u32> {
        let anchor = locate(self.sheet, self.config.marker_column, keyword);
        match anchor {
            Some(anchor_row) => self.events.push(MergeEvent::SectionMatched {
                sheet: self.sheet.name.clone(),
                keyword: keyword.to_string(),
                anchor_row,
            }),
            None => self.events.push(MergeEvent::SectionNotFound {
                sheet: self.sheet.name.clone(),
                keyword: keyword.to_string(),
                identifier: identifier.map(str::to_string),
            }),
        }
        anchor
    }

    fn merge_section(
        &mut self,
        subsection: Subsection,
        field: &RosterField,
        sources: &[Workbook],
    ) -> Result<SubsectionState> {
        let keyword = self.keyword(subsection).to_string();
        match field {
            RosterField::NotApplicable => {
                self.clear_section(subsection, &keyword);
                Ok(SubsectionState::NotApplicable)
            }
            RosterField::Empty => {
                self.events.push(MergeEvent::NoIdentifier {
                    sheet: self.sheet.name.clone(),
                    keyword,
                });
                Ok(SubsectionState::NotFound)
            }
            RosterField::Identifier(identifier) => {
                let Some((source, source_styles)) = find_source(sources, identifier) else {
                    self.events.push(MergeEvent::SourceNotFound {
                        sheet: self.sheet.name.clone(),
                        keyword,
                        identifier: identifier.clone(),
                    });
                    return Ok(SubsectionState::NotFound);
                };
                self.fill_section(&keyword, identifier, source, source_styles)
            }
        }
    }

    /// Collapse a not-applicable section's span; with the remove policy a
    /// console section loses its anchor row too. A span that cannot be
    /// collapsed keeps its anchor row.
    fn clear_section(&mut self, subsection: Subsection, keyword: &str) {
        let Some(anchor) = self.anchor(keyword, None) else {
            return;
        };
        let remove = subsection == Subsection::Console
            && self.config.console_not_applicable == ConsolePolicy::RemoveSection;

        let reconciled = reconcile(self.sheet, self.config.marker_column, anchor, 0);
        if let ResizeAction::ShrinkAborted(err) = reconciled.action {
            self.events.push(MergeEvent::ShrinkAborted {
                sheet: self.sheet.name.clone(),
                keyword: keyword.to_string(),
                reason: err.to_string(),
            });
            if remove {
                return;
            }
        }

        if !remove {
            self.events.push(MergeEvent::SectionCleared {
                sheet: self.sheet.name.clone(),
                keyword: keyword.to_string(),
            });
            return;
        }
        match self.sheet.delete_rows(anchor, 1) {
            Ok(()) => self.events.push(MergeEvent::SectionRemoved {
                sheet: self.sheet.name.clone(),
                keyword: keyword.to_string(),
            }),
            Err(err) => self.events.push(MergeEvent::ShrinkAborted {
                sheet: self.sheet.name.clone(),
                keyword: keyword.to_string(),
                reason: err.to_string(),
            }),
        }
    }

    fn fill_section(
        &mut self,
        keyword: &str,
        identifier: &str,
        source: &Sheet,
        source_styles: &StyleRegistry,
    ) -> Result<SubsectionState> {
        let Some(anchor) = self.anchor(keyword, Some(identifier)) else {
            return Ok(SubsectionState::NotFound);
        };

        let needed = block_height(source);
        let reconciled = reconcile(self.sheet, self.config.marker_column, anchor, needed);
        match reconciled.action {
            ResizeAction::Grown | ResizeAction::Shrunk => {
                self.events.push(MergeEvent::SectionResized {
                    sheet: self.sheet.name.clone(),
                    keyword: keyword.to_string(),
                    from_rows: reconciled.available,
                    to_rows: needed,
                });
            }
            ResizeAction::ShrinkAborted(err) => {
                self.events.push(MergeEvent::ShrinkAborted {
                    sheet: self.sheet.name.clone(),
                    keyword: keyword.to_string(),
                    reason: err.to_string(),
                });
            }
            ResizeAction::Unchanged => {}
        }

        match copy_block(source, source_styles, self.sheet, self.styles, reconciled.start_row) {
            Ok(_) => {
                self.events.push(MergeEvent::Copied {
                    sheet: self.sheet.name.clone(),
                    keyword: keyword.to_string(),
                    identifier: identifier.to_string(),
                    rows: needed,
                });
                Ok(SubsectionState::Filled)
            }
            Err(err) if err.is_fatal() => Err(err),
            Err(err) => {
                self.events.push(MergeEvent::CopyFailed {
                    sheet: self.sheet.name.clone(),
                    keyword: keyword.to_string(),
                    identifier: identifier.to_string(),
                    reason: err.to_string(),
                });
                Ok(SubsectionState::NotFound)
            }
        }
    }
}
