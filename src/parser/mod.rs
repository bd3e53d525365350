//! Main XLSX parser
//!
//! Orchestrates the parsing of all components from the ZIP archive.

mod relationships;
mod worksheet;

use std::io::{Cursor, Read, Seek};
use zip::ZipArchive;

use crate::error::Result;
use crate::styles::StyleRegistry;
use crate::types::Workbook;

use relationships::{get_sheet_info, parse_shared_strings, parse_workbook_relationships};
use worksheet::parse_sheet;

/// Parse an XLSX file from bytes.
pub fn parse(data: &[u8]) -> Result<Workbook> {
    let mut archive = ZipArchive::new(Cursor::new(data))?;

    let relationships = parse_workbook_relationships(&mut archive)?;
    let shared_strings =
        parse_shared_strings(&mut archive, relationships.shared_strings.as_deref())?;

    let styles_path = relationships
        .styles
        .clone()
        .unwrap_or_else(|| "xl/styles.xml".to_string());
    let styles = match read_part(&mut archive, &styles_path)? {
        Some(bytes) => StyleRegistry::parse(&styles_path, &bytes)?,
        None => StyleRegistry::new(),
    };

    let sheet_info = get_sheet_info(&mut archive, &relationships.worksheets)?;

    let mut sheets = Vec::with_capacity(sheet_info.len());
    let mut sheet_paths = Vec::with_capacity(sheet_info.len());
    for info in sheet_info {
        let Some(bytes) = read_part(&mut archive, &info.path)? else {
            log::warn!("sheet '{}' has no part at {}; skipped", info.name, info.path);
            continue;
        };
        sheets.push(parse_sheet(&bytes, &info, &shared_strings)?);
        sheet_paths.push(info.path);
    }

    log::debug!(
        "parsed workbook: {} sheets, {} cell formats, {} shared strings",
        sheets.len(),
        styles.len(),
        shared_strings.len()
    );

    Ok(Workbook {
        sheets,
        styles,
        sheet_paths,
    })
}

/// Read a whole package part, `None` if the archive has no such entry.
fn read_part<R: Read + Seek>(archive: &mut ZipArchive<R>, path: &str) -> Result<Option<Vec<u8>>> {
    let mut file = match archive.by_name(path) {
        Ok(file) => file,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut bytes = Vec::with_capacity(usize::try_from(file.size()).unwrap_or(0));
    file.read_to_end(&mut bytes)?;
    Ok(Some(bytes))
}
