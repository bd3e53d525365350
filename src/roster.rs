//! Equipment roster: which source sheet fills which subsection of which
//! location.
//!
//! The roster is an ordinary worksheet with a header row. Identifier
//! cells are normalized so a numeric `5`, `5.0` or text `"5.0"` all name
//! the source sheet `"5"`.

use serde::Serialize;

use crate::config::RosterColumns;
use crate::error::{Result, XlmergeError};
use crate::types::{CellValue, Sheet, Workbook};

/// Lowercased spellings meaning "this subsection does not apply".
const NOT_APPLICABLE: &[&str] = &[
    "n/a",
    "n-a",
    "na",
    "n.a.",
    "nvt",
    "n.v.t.",
    "niet beschikbaar",
    "not applicable",
];

/// One roster entry for a subsection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum RosterField {
    Empty,
    NotApplicable,
    /// Name of the source sheet to copy.
    Identifier(String),
}

impl RosterField {
    /// Classify a raw text entry.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Self::Empty;
        }
        let lower = trimmed.to_lowercase();
        if NOT_APPLICABLE.contains(&lower.as_str()) {
            return Self::NotApplicable;
        }
        Self::Identifier(normalize_identifier(trimmed))
    }

    #[must_use]
    pub fn from_value(value: Option<&CellValue>) -> Self {
        match value {
            Some(CellValue::Text(s)) => Self::parse(s),
            Some(CellValue::Number(n)) => Self::Identifier(format_number(*n)),
            _ => Self::Empty,
        }
    }
}

/// One roster row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EquipmentRecord {
    pub location: String,
    pub arm_a: RosterField,
    pub arm_b: RosterField,
    pub console: RosterField,
}

/// Collapse integral decimal text (`"5.0"`, `"12.00"`) to its integer part.
///
/// Anything else is returned trimmed; leading zeros are kept.
#[must_use]
pub fn normalize_identifier(raw: &str) -> String {
    let trimmed = raw.trim();
    if let Some((int, frac)) = trimmed.split_once('.') {
        if !int.is_empty()
            && int.bytes().all(|b| b.is_ascii_digit())
            && !frac.is_empty()
            && frac.bytes().all(|b| b == b'0')
        {
            return int.to_string();
        }
    }
    trimmed.to_string()
}

#[allow(clippy::cast_possible_truncation)]
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

/// Read every roster row from `workbook`.
///
/// The first populated row is the header. A missing location column is
/// an error; a missing subsection column reads as empty fields. Rows
/// without a location, or outside the configured location prefix, are
/// skipped.
pub fn load_roster(workbook: &Workbook, columns: &RosterColumns) -> Result<Vec<EquipmentRecord>> {
    let sheet = match &columns.sheet {
        Some(name) => workbook
            .sheet(name)
            .ok_or_else(|| XlmergeError::Other(format!("roster sheet '{name}' not found")))?,
        None => workbook
            .sheets
            .first()
            .ok_or_else(|| XlmergeError::Other("roster workbook has no sheets".into()))?,
    };

    let Some((header_row, _)) = sheet.rows().find(|(_, row)| row.cells().next().is_some()) else {
        return Ok(Vec::new());
    };

    let location_col = find_column(sheet, header_row, &columns.location).ok_or_else(|| {
        XlmergeError::Other(format!(
            "roster has no '{}' column in sheet '{}'",
            columns.location, sheet.name
        ))
    })?;
    let arm_a_col = find_column(sheet, header_row, &columns.arm_a);
    let arm_b_col = find_column(sheet, header_row, &columns.arm_b);
    let console_col = find_column(sheet, header_row, &columns.console);
    for (name, col) in [
        (&columns.arm_a, arm_a_col),
        (&columns.arm_b, arm_b_col),
        (&columns.console, console_col),
    ] {
        if col.is_none() {
            log::warn!("roster has no '{name}' column; its entries read as empty");
        }
    }

    let field = |row: u32, col: Option<u32>| {
        col.map_or(RosterField::Empty, |c| {
            RosterField::from_value(sheet.value(row, c))
        })
    };

    let mut records = Vec::new();
    for (row, _) in sheet.rows().filter(|(r, _)| *r > header_row) {
        let RosterField::Identifier(location) = field(row, Some(location_col)) else {
            continue;
        };
        if let Some(prefix) = &columns.location_prefix {
            if !location.starts_with(prefix.as_str()) {
                continue;
            }
        }
        records.push(EquipmentRecord {
            location,
            arm_a: field(row, arm_a_col),
            arm_b: field(row, arm_b_col),
            console: field(row, console_col),
        });
    }

    log::debug!("loaded {} roster records from '{}'", records.len(), sheet.name);
    Ok(records)
}

/// Column of the header cell matching `name` (case-insensitive, trimmed).
fn find_column(sheet: &Sheet, header_row: u32, name: &str) -> Option<u32> {
    let wanted = name.trim().to_lowercase();
    sheet
        .rows()
        .find(|(r, _)| *r == header_row)?
        .1
        .cells()
        .find(|(_, cell)| {
            cell.value
                .as_text()
                .is_some_and(|t| t.trim().to_lowercase() == wanted)
        })
        .map(|(col, _)| col)
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("SH1", RosterField::Identifier("SH1".into()) ; "plain identifier")]
    #[test_case("  CN1 ", RosterField::Identifier("CN1".into()) ; "trimmed")]
    #[test_case("5.0", RosterField::Identifier("5".into()) ; "integral decimal text")]
    #[test_case("007", RosterField::Identifier("007".into()) ; "leading zeros kept")]
    #[test_case("5.5", RosterField::Identifier("5.5".into()) ; "real decimal kept")]
    #[test_case("N/A", RosterField::NotApplicable ; "upper n slash a")]
    #[test_case("n.v.t.", RosterField::NotApplicable ; "dutch abbreviation")]
    #[test_case("Niet beschikbaar", RosterField::NotApplicable ; "dutch phrase")]
    #[test_case("Not Applicable", RosterField::NotApplicable ; "english phrase")]
    #[test_case("   ", RosterField::Empty ; "blank")]
    fn test_parse_field(raw: &str, expected: RosterField) {
        assert_eq!(RosterField::parse(raw), expected);
    }

    #[test]
    fn test_numeric_cells_normalize() {
        assert_eq!(
            RosterField::from_value(Some(&CellValue::Number(5.0))),
            RosterField::Identifier("5".into())
        );
        assert_eq!(
            RosterField::from_value(Some(&CellValue::Number(2.5))),
            RosterField::Identifier("2.5".into())
        );
        assert_eq!(RosterField::from_value(None), RosterField::Empty);
    }

    fn roster_workbook() -> Workbook {
        let mut sheet = Sheet::new("Roster");
        for (col, header) in ["machinenumber", "MovingArm", "FixedArm", " CONSOLE "]
            .iter()
            .enumerate()
        {
            sheet.set_value(1, u32::try_from(col).unwrap() + 1, *header);
        }
        sheet.set_value(2, 1, 501.0);
        sheet.set_value(2, 2, "SH1");
        sheet.set_value(2, 3, "n/a");
        sheet.set_value(2, 4, "CN1");
        sheet.set_value(3, 1, "612");
        sheet.set_value(3, 2, 5.0);
        sheet.set_value(4, 2, "orphan");
        Workbook {
            sheets: vec![sheet],
            ..Workbook::default()
        }
    }

    #[test]
    fn test_load_roster() {
        let records = load_roster(&roster_workbook(), &RosterColumns::default()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0],
            EquipmentRecord {
                location: "501".into(),
                arm_a: RosterField::Identifier("SH1".into()),
                arm_b: RosterField::NotApplicable,
                console: RosterField::Identifier("CN1".into()),
            }
        );
        assert_eq!(records[1].arm_a, RosterField::Identifier("5".into()));
        assert_eq!(records[1].console, RosterField::Empty);
    }

    #[test]
    fn test_location_prefix_filter() {
        let columns = RosterColumns {
            location_prefix: Some("5".into()),
            ..RosterColumns::default()
        };
        let records = load_roster(&roster_workbook(), &columns).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].location, "501");
    }

    #[test]
    fn test_missing_location_column_is_an_error() {
        let columns = RosterColumns {
            location: "Asset".into(),
            ..RosterColumns::default()
        };
        assert!(load_roster(&roster_workbook(), &columns).is_err());
    }
}
