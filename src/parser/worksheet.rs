//! Worksheet parsing: one sheet part into a [`Sheet`].
//!
//! The grid (`sheetData`), merged ranges and the tab color are modeled.
//! Every other child of `<worksheet>` is kept as a raw fragment, in order,
//! so a rewritten sheet keeps its column widths, views, print setup,
//! conditional formats and so on.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::cell_ref::parse_cell_ref_bytes;
use crate::error::{Result, XlmergeError};
use crate::types::{Cell, CellValue, Fragment, MergeRange, Sheet, SheetState};
use crate::xml_helpers::{attr_string, element_span, local_name_string, raw_attrs};

/// Sheet metadata from workbook.xml
pub(super) struct SheetInfo {
    pub name: String,
    pub path: String,
    pub state: SheetState,
}

/// Cell type tag from the `t` attribute of a `<c>` element.
#[derive(Copy, Clone)]
pub(super) enum CellTypeTag {
    Shared,
    Inline,
    Str,
    Bool,
    Error,
    Default,
}

pub(super) fn parse_cell_type_tag(value: &[u8]) -> CellTypeTag {
    match value {
        b"s" => CellTypeTag::Shared,
        b"b" => CellTypeTag::Bool,
        b"e" => CellTypeTag::Error,
        b"str" => CellTypeTag::Str,
        b"inlineStr" => CellTypeTag::Inline,
        _ => CellTypeTag::Default,
    }
}

pub(super) fn parse_u32_bytes(value: &[u8]) -> Option<u32> {
    let mut num: u32 = 0;
    let mut seen = false;
    for &b in value {
        if !b.is_ascii_digit() {
            return None;
        }
        seen = true;
        num = num.saturating_mul(10).saturating_add(u32::from(b - b'0'));
    }
    seen.then_some(num)
}

/// Raw content of a `<c>` element.
#[derive(Default)]
struct CellBody {
    value: Option<String>,
    formula: Option<String>,
    inline: Option<String>,
}

/// Parse a single worksheet part.
pub(super) fn parse_sheet(data: &[u8], info: &SheetInfo, shared_strings: &[String]) -> Result<Sheet> {
    let mut sheet = Sheet::new(info.name.clone());
    sheet.state = info.state;

    let mut xml = Reader::from_reader(data);
    xml.trim_text(false);

    let mut buf = Vec::new();
    let mut inner = Vec::new();
    let mut in_root = false;
    let mut seen_sheet_data = false;

    loop {
        let before = xml.buffer_position();
        buf.clear();
        match xml.read_event_into(&mut buf)? {
            ref event @ (Event::Start(ref e) | Event::Empty(ref e)) => {
                let is_empty = matches!(event, Event::Empty(_));
                if !in_root {
                    sheet.layout.root_attrs = raw_attrs(e, &[]);
                    in_root = true;
                    continue;
                }
                match e.local_name().as_ref() {
                    b"sheetPr" => {
                        sheet.layout.sheet_pr_attrs = raw_attrs(e, &[]);
                        if !is_empty {
                            parse_sheet_pr(&mut xml, data, &mut sheet)?;
                        }
                    }
                    // Regenerated from the grid on write.
                    b"dimension" => {
                        element_span(&mut xml, before, is_empty, &mut inner)?;
                    }
                    b"sheetData" => {
                        seen_sheet_data = true;
                        if !is_empty {
                            parse_sheet_data(&mut xml, &mut sheet, shared_strings)?;
                        }
                    }
                    b"mergeCells" => {
                        if !is_empty {
                            parse_merge_cells(&mut xml, &mut sheet)?;
                        }
                    }
                    _ => {
                        let name = local_name_string(e);
                        let span = element_span(&mut xml, before, is_empty, &mut inner)?;
                        let fragment = Fragment {
                            name,
                            xml: String::from_utf8_lossy(data.get(span).unwrap_or_default())
                                .into_owned(),
                        };
                        if seen_sheet_data {
                            sheet.layout.after_data.push(fragment);
                        } else {
                            sheet.layout.before_data.push(fragment);
                        }
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(sheet)
}

fn parse_sheet_pr(xml: &mut Reader<&[u8]>, data: &[u8], sheet: &mut Sheet) -> Result<()> {
    let mut buf = Vec::new();
    let mut inner = Vec::new();
    loop {
        let before = xml.buffer_position();
        buf.clear();
        match xml.read_event_into(&mut buf)? {
            ref event @ (Event::Start(ref e) | Event::Empty(ref e)) => {
                let is_empty = matches!(event, Event::Empty(_));
                let name = local_name_string(e);
                // Theme/indexed tab colors stay raw; only ARGB is modeled.
                if name == "tabColor" {
                    if let Some(rgb) = attr_string(e, b"rgb") {
                        sheet.tab_color = Some(rgb);
                        element_span(xml, before, is_empty, &mut inner)?;
                        continue;
                    }
                }
                let span = element_span(xml, before, is_empty, &mut inner)?;
                sheet.layout.sheet_pr_children.push(Fragment {
                    name,
                    xml: String::from_utf8_lossy(data.get(span).unwrap_or_default()).into_owned(),
                });
            }
            Event::End(_) => return Ok(()),
            Event::Eof => return Err(XlmergeError::Parse("unterminated <sheetPr>".into())),
            _ => {}
        }
    }
}

fn parse_sheet_data(
    xml: &mut Reader<&[u8]>,
    sheet: &mut Sheet,
    shared_strings: &[String],
) -> Result<()> {
    let mut buf = Vec::new();
    let mut current_row: u32 = 0;
    let mut current_col: u32 = 0;

    loop {
        buf.clear();
        match xml.read_event_into(&mut buf)? {
            ref event @ (Event::Start(ref e) | Event::Empty(ref e)) => {
                let is_empty = matches!(event, Event::Empty(_));
                match e.local_name().as_ref() {
                    b"row" => {
                        current_row = attr_string(e, b"r")
                            .and_then(|r| parse_u32_bytes(r.as_bytes()))
                            .unwrap_or(current_row.saturating_add(1));
                        current_col = 0;
                        let attrs = raw_attrs(e, &[b"r", b"spans"]);
                        if !attrs.is_empty() {
                            sheet.set_row_attrs(current_row, attrs);
                        }
                    }
                    b"c" => {
                        let (row, col) = attr_string(e, b"r")
                            .and_then(|r| parse_cell_ref_bytes(r.as_bytes()))
                            .unwrap_or((current_row, current_col.saturating_add(1)));
                        current_col = col;
                        let body = if is_empty {
                            CellBody::default()
                        } else {
                            read_cell_body(xml)?
                        };
                        let cell = build_cell(e, body, shared_strings);
                        sheet.set_cell(row.max(1), col.max(1), cell);
                    }
                    _ => {}
                }
            }
            Event::End(ref e) if e.local_name().as_ref() == b"sheetData" => return Ok(()),
            Event::Eof => return Err(XlmergeError::Parse("unterminated <sheetData>".into())),
            _ => {}
        }
    }
}

/// Read the children of a `<c>` element up to its end tag.
fn read_cell_body(xml: &mut Reader<&[u8]>) -> Result<CellBody> {
    let mut body = CellBody::default();
    let mut buf = Vec::new();
    let mut target: Option<&'static str> = None;
    let mut text = String::new();
    let mut in_rph = false;

    loop {
        buf.clear();
        match xml.read_event_into(&mut buf)? {
            Event::Start(ref e) => match e.local_name().as_ref() {
                b"v" => target = Some("v"),
                b"f" => target = Some("f"),
                b"is" => body.inline = Some(String::new()),
                b"rPh" => in_rph = true,
                b"t" if body.inline.is_some() && !in_rph => target = Some("t"),
                _ => {}
            },
            Event::Empty(ref e) if e.local_name().as_ref() == b"is" => {
                body.inline = Some(String::new());
            }
            Event::Text(ref e) if target.is_some() => text.push_str(&e.unescape()?),
            Event::CData(ref e) if target.is_some() => {
                text.push_str(&String::from_utf8_lossy(e.as_ref()));
            }
            Event::End(ref e) => match e.local_name().as_ref() {
                b"c" => return Ok(body),
                b"rPh" => in_rph = false,
                b"v" | b"f" | b"t" => {
                    let content = std::mem::take(&mut text);
                    match target.take() {
                        Some("v") => body.value = Some(content),
                        Some("f") if !content.is_empty() => body.formula = Some(content),
                        Some("t") => {
                            if let Some(inline) = body.inline.as_mut() {
                                inline.push_str(&content);
                            }
                        }
                        _ => {}
                    }
                }
                _ => {}
            },
            Event::Eof => return Err(XlmergeError::Parse("unterminated <c>".into())),
            _ => {}
        }
    }
}

fn build_cell(e: &BytesStart, body: CellBody, shared_strings: &[String]) -> Cell {
    let tag = e
        .attributes()
        .flatten()
        .find(|a| a.key.as_ref() == b"t")
        .map_or(CellTypeTag::Default, |a| parse_cell_type_tag(&a.value));
    let style = attr_string(e, b"s")
        .and_then(|s| parse_u32_bytes(s.as_bytes()))
        .unwrap_or(0);

    let value = match tag {
        CellTypeTag::Shared => body
            .value
            .and_then(|v| v.trim().parse::<usize>().ok())
            .and_then(|idx| shared_strings.get(idx).cloned())
            .map_or(CellValue::Empty, CellValue::Text),
        CellTypeTag::Inline => body.inline.map_or(CellValue::Empty, CellValue::Text),
        CellTypeTag::Str => body.value.map_or(CellValue::Empty, CellValue::Text),
        CellTypeTag::Bool => body
            .value
            .map_or(CellValue::Empty, |v| CellValue::Bool(v.trim() == "1")),
        CellTypeTag::Error => body.value.map_or(CellValue::Empty, CellValue::Error),
        CellTypeTag::Default => match body.value {
            None => CellValue::Empty,
            Some(v) => v
                .trim()
                .parse::<f64>()
                .map_or(CellValue::Text(v), CellValue::Number),
        },
    };

    Cell {
        value,
        formula: body.formula,
        style,
    }
}

fn parse_merge_cells(xml: &mut Reader<&[u8]>, sheet: &mut Sheet) -> Result<()> {
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match xml.read_event_into(&mut buf)? {
            Event::Start(ref e) | Event::Empty(ref e) if e.local_name().as_ref() == b"mergeCell" => {
                if let Some(range) = attr_string(e, b"ref").as_deref().and_then(MergeRange::parse)
                {
                    sheet.merges.push(range);
                }
            }
            Event::End(ref e) if e.local_name().as_ref() == b"mergeCells" => return Ok(()),
            Event::Eof => return Err(XlmergeError::Parse("unterminated <mergeCells>".into())),
            _ => {}
        }
    }
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

    fn info() -> SheetInfo {
        SheetInfo {
            name: "GA-501".into(),
            path: "xl/worksheets/sheet1.xml".into(),
            state: SheetState::Visible,
        }
    }

    const SHEET: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <sheetPr><tabColor rgb="FFFF0000"/><pageSetUpPr fitToPage="1"/></sheetPr>
  <dimension ref="A1:G13"/>
  <cols><col min="1" max="1" width="20" customWidth="1"/></cols>
  <sheetData>
    <row r="1" spans="1:7" ht="30" customHeight="1">
      <c r="A1" t="s" s="2"><v>0</v></c>
      <c r="B1" t="inlineStr"><is><r><t>Inline </t></r><r><t xml:space="preserve">rich</t></r><rPh><t>x</t></rPh></is></c>
      <c r="C1"><f>SUM(D1:E1)</f><v>3.5</v></c>
      <c r="D1" t="b"><v>1</v></c>
      <c r="E1" t="e"><v>#DIV/0!</v></c>
      <c r="F1" s="4"/>
      <c r="G1" t="str"><v>a &amp; b</v></c>
    </row>
    <row r="5"><c r="G5" t="s"><v>1</v></c></row>
  </sheetData>
  <mergeCells count="1"><mergeCell ref="A5:C6"/></mergeCells>
  <pageMargins left="0.7" right="0.7" top="0.75" bottom="0.75" header="0.3" footer="0.3"/>
</worksheet>"#;

    fn parse() -> Sheet {
        let strings = vec!["Header".to_string(), "Moving Arm".to_string()];
        parse_sheet(SHEET.as_bytes(), &info(), &strings).unwrap()
    }

    #[test]
    fn test_cell_values() {
        let sheet = parse();
        assert_eq!(sheet.value(1, 1), Some(&CellValue::Text("Header".into())));
        assert_eq!(sheet.cell(1, 1).unwrap().style, 2);
        assert_eq!(sheet.value(1, 2), Some(&CellValue::Text("Inline rich".into())));
        assert_eq!(sheet.value(1, 3), Some(&CellValue::Number(3.5)));
        assert_eq!(sheet.cell(1, 3).unwrap().formula.as_deref(), Some("SUM(D1:E1)"));
        assert_eq!(sheet.value(1, 4), Some(&CellValue::Bool(true)));
        assert_eq!(sheet.value(1, 5), Some(&CellValue::Error("#DIV/0!".into())));
        assert_eq!(sheet.value(1, 6), Some(&CellValue::Empty));
        assert_eq!(sheet.cell(1, 6).unwrap().style, 4);
        assert_eq!(sheet.value(1, 7), Some(&CellValue::Text("a & b".into())));
        assert_eq!(sheet.value(5, 7), Some(&CellValue::Text("Moving Arm".into())));
        assert_eq!(sheet.max_row(), 5);
    }

    #[test]
    fn test_layout_and_structure() {
        let sheet = parse();
        assert_eq!(sheet.tab_color.as_deref(), Some("FFFF0000"));
        assert_eq!(sheet.merges(), &[MergeRange::new(5, 1, 6, 3)]);
        assert_eq!(
            sheet.row_attrs(1),
            &[
                ("ht".to_string(), "30".to_string()),
                ("customHeight".to_string(), "1".to_string())
            ]
        );
        assert!(sheet.row_attrs(5).is_empty());

        let layout = &sheet.layout;
        assert_eq!(layout.sheet_pr_children.len(), 1);
        assert_eq!(layout.sheet_pr_children[0].name, "pageSetUpPr");
        assert_eq!(layout.before_data.len(), 1);
        assert_eq!(layout.before_data[0].name, "cols");
        assert_eq!(layout.after_data.len(), 1);
        assert_eq!(layout.after_data[0].name, "pageMargins");
        assert!(layout.root_attrs.iter().any(|(k, _)| k == "xmlns:r"));
    }

    #[test]
    fn test_cells_without_references() {
        let xml = r#"<worksheet><sheetData><row><c><v>1</v></c><c><v>2</v></c></row><row><c><v>3</v></c></row></sheetData></worksheet>"#;
        let sheet = parse_sheet(xml.as_bytes(), &info(), &[]).unwrap();
        assert_eq!(sheet.value(1, 2), Some(&CellValue::Number(2.0)));
        assert_eq!(sheet.value(2, 1), Some(&CellValue::Number(3.0)));
    }
}
