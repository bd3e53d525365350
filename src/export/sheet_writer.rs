//! Generates worksheet XML from a `Sheet` struct.
//!
//! Modified sheets use inline strings (`t="inlineStr"`) instead of shared
//! string references, avoiding the need to rebuild the shared string table.
//! Unmodeled elements captured at parse time are written back verbatim
//! around the regenerated `<sheetData>`.

use crate::cell_ref::{format_cell_ref, format_range};
use crate::error::Result;
use crate::types::{Cell, CellValue, Fragment, Sheet};
use crate::xml_helpers::{push_raw_attrs, xml_escape};

const MAIN_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Worksheet children that must follow `<mergeCells>` in schema order.
const AFTER_MERGE_CELLS: &[&str] = &[
    "phoneticPr",
    "conditionalFormatting",
    "dataValidations",
    "hyperlinks",
    "printOptions",
    "pageMargins",
    "pageSetup",
    "headerFooter",
    "rowBreaks",
    "colBreaks",
    "customProperties",
    "cellWatches",
    "ignoredErrors",
    "smartTags",
    "drawing",
    "legacyDrawing",
    "legacyDrawingHF",
    "picture",
    "oleObjects",
    "controls",
    "webPublishItems",
    "tableParts",
    "extLst",
];

/// Write a complete worksheet XML string from a `Sheet`.
pub(crate) fn write_sheet_xml(sheet: &Sheet) -> Result<String> {
    let mut out = String::with_capacity(4096);
    out.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    out.push('\n');

    out.push_str("<worksheet");
    if sheet.layout.root_attrs.is_empty() {
        out.push_str(&format!(" xmlns=\"{MAIN_NS}\" xmlns:r=\"{REL_NS}\""));
    } else {
        push_raw_attrs(&mut out, &sheet.layout.root_attrs);
    }
    out.push('>');

    write_sheet_pr(&mut out, sheet);

    // <dimension>
    let (max_row, max_col) = (sheet.max_row(), sheet.max_col());
    if max_row > 0 && max_col > 0 {
        out.push_str(&format!(
            "<dimension ref=\"{}\"/>",
            format_range(1, 1, max_row, max_col)
        ));
    } else {
        out.push_str("<dimension ref=\"A1\"/>");
    }

    push_fragments(&mut out, &sheet.layout.before_data);

    // <sheetData>
    out.push_str("<sheetData>");
    write_sheet_data(&mut out, sheet);
    out.push_str("</sheetData>");

    let after = &sheet.layout.after_data;
    let split = after
        .iter()
        .position(|f| AFTER_MERGE_CELLS.contains(&f.name.as_str()))
        .unwrap_or(after.len());
    let (head, tail) = after.split_at(split);
    push_fragments(&mut out, head);

    // <mergeCells>
    if !sheet.merges.is_empty() {
        out.push_str(&format!("<mergeCells count=\"{}\">", sheet.merges.len()));
        for merge in &sheet.merges {
            out.push_str(&format!("<mergeCell ref=\"{merge}\"/>"));
        }
        out.push_str("</mergeCells>");
    }

    push_fragments(&mut out, tail);

    out.push_str("</worksheet>");
    Ok(out)
}

fn write_sheet_pr(out: &mut String, sheet: &Sheet) {
    let layout = &sheet.layout;
    // A modeled tab color replaces any raw one.
    let children: Vec<&Fragment> = layout
        .sheet_pr_children
        .iter()
        .filter(|f| sheet.tab_color.is_none() || f.name != "tabColor")
        .collect();
    if layout.sheet_pr_attrs.is_empty() && children.is_empty() && sheet.tab_color.is_none() {
        return;
    }

    out.push_str("<sheetPr");
    push_raw_attrs(out, &layout.sheet_pr_attrs);
    if children.is_empty() && sheet.tab_color.is_none() {
        out.push_str("/>");
        return;
    }
    out.push('>');
    if let Some(rgb) = &sheet.tab_color {
        out.push_str(&format!("<tabColor rgb=\"{}\"/>", xml_escape(rgb)));
    }
    for child in children {
        out.push_str(&child.xml);
    }
    out.push_str("</sheetPr>");
}

fn push_fragments(out: &mut String, fragments: &[Fragment]) {
    for fragment in fragments {
        out.push_str(&fragment.xml);
    }
}

/// Write `<row>` and `<c>` elements.
fn write_sheet_data(out: &mut String, sheet: &Sheet) {
    for (row_num, row) in sheet.rows() {
        out.push_str(&format!("<row r=\"{row_num}\""));
        push_raw_attrs(out, &row.attrs);
        if row.cells.is_empty() {
            out.push_str("/>");
            continue;
        }
        out.push('>');
        for (col, cell) in row.cells() {
            write_cell(out, row_num, col, cell);
        }
        out.push_str("</row>");
    }
}

/// Write a single `<c>` element.
fn write_cell(out: &mut String, row: u32, col: u32, cell: &Cell) {
    let cell_ref = format_cell_ref(row, col);
    let style_attr = if cell.style > 0 {
        format!(" s=\"{}\"", cell.style)
    } else {
        String::new()
    };
    let formula = cell
        .formula
        .as_deref()
        .map(|f| format!("<f>{}</f>", xml_escape(f)))
        .unwrap_or_default();

    match &cell.value {
        CellValue::Text(text) if formula.is_empty() => {
            out.push_str(&format!(
                "<c r=\"{cell_ref}\"{style_attr} t=\"inlineStr\"><is><t xml:space=\"preserve\">{}</t></is></c>",
                xml_escape(text)
            ));
        }
        // Formula results that are text use t="str".
        CellValue::Text(text) => {
            out.push_str(&format!(
                "<c r=\"{cell_ref}\"{style_attr} t=\"str\">{formula}<v>{}</v></c>",
                xml_escape(text)
            ));
        }
        CellValue::Number(n) => {
            out.push_str(&format!(
                "<c r=\"{cell_ref}\"{style_attr}>{formula}<v>{n}</v></c>"
            ));
        }
        CellValue::Bool(b) => {
            let v = if *b { "1" } else { "0" };
            out.push_str(&format!(
                "<c r=\"{cell_ref}\"{style_attr} t=\"b\">{formula}<v>{v}</v></c>"
            ));
        }
        CellValue::Error(e) => {
            out.push_str(&format!(
                "<c r=\"{cell_ref}\"{style_attr} t=\"e\">{formula}<v>{}</v></c>",
                xml_escape(e)
            ));
        }
        CellValue::Empty if formula.is_empty() => {
            out.push_str(&format!("<c r=\"{cell_ref}\"{style_attr}/>"));
        }
        CellValue::Empty => {
            out.push_str(&format!("<c r=\"{cell_ref}\"{style_attr}>{formula}</c>"));
        }
    }
}
