//! Patch an XLSX ZIP archive with modified part XML.
//!
//! Unmodified entries are copied via `raw_copy_file` (zero recompression cost).
//! Only dirty sheets, and the styles part when new formats were registered,
//! get new XML generated and written.

use std::collections::{HashMap, HashSet};
use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::Result;
use crate::types::Workbook;

use super::sheet_writer::write_sheet_xml;

/// Patch the original XLSX bytes, replacing sheets in `dirty_sheets` and
/// the styles part if the registry changed.
///
/// Returns the new XLSX file as `Vec<u8>`.
pub(crate) fn patch_zip(
    original_data: &[u8],
    workbook: &Workbook,
    dirty_sheets: &HashSet<usize>,
) -> Result<Vec<u8>> {
    let mut archive = ZipArchive::new(Cursor::new(original_data))?;

    // ZIP path -> replacement bytes
    let mut replacements: HashMap<String, Vec<u8>> = HashMap::new();
    for &idx in dirty_sheets {
        if let (Some(path), Some(sheet)) = (workbook.sheet_paths.get(idx), workbook.sheets.get(idx))
        {
            replacements.insert(path.clone(), write_sheet_xml(sheet)?.into_bytes());
        }
    }
    if let Some((path, bytes)) = workbook.styles.to_part()? {
        replacements.insert(path, bytes);
    }

    let buf: Vec<u8> = Vec::with_capacity(original_data.len());
    let mut writer = ZipWriter::new(Cursor::new(buf));
    let options: FileOptions<()> =
        FileOptions::default().compression_method(CompressionMethod::Deflated);

    for i in 0..archive.len() {
        let entry = archive.by_index_raw(i)?;
        let name = entry.name().to_string();

        if let Some(bytes) = replacements.get(&name) {
            writer.start_file(name.as_str(), options)?;
            writer.write_all(bytes)?;
            continue;
        }

        // Pass through unmodified entry (raw copy, no re-compression)
        writer.raw_copy_file(entry)?;
    }

    let cursor = writer.finish()?;
    Ok(cursor.into_inner())
}
