//! Load, edit and save: what survives a round trip through the package.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

mod fixtures;

use std::io::{Cursor, Read};

use fixtures::{roster_sheet, target_sheet, SheetBuilder, StyleBuilder, XlsxBuilder};
use xlmerge::{merge, parser, roster, CellValue, MergeConfig, MergeRange, SheetState, XlDocument};

const APP_XML: &[u8] = br#"<?xml version="1.0" encoding="UTF-8"?><Properties><Application>Microsoft Excel</Application></Properties>"#;

/// Decompressed bytes of one package part.
fn part(xlsx: &[u8], name: &str) -> Vec<u8> {
    let mut archive = zip::ZipArchive::new(Cursor::new(xlsx)).unwrap();
    let mut entry = archive.by_name(name).unwrap();
    let mut out = Vec::new();
    entry.read_to_end(&mut out).unwrap();
    out
}

fn part_names(xlsx: &[u8]) -> Vec<String> {
    let archive = zip::ZipArchive::new(Cursor::new(xlsx)).unwrap();
    archive.file_names().map(str::to_string).collect()
}

fn overview() -> SheetBuilder {
    SheetBuilder::new("Overview")
        .cell("A1", "Summary", Some(StyleBuilder::new().bold()))
        .col_width(1, 1, 30.0)
}

#[test]
fn test_unchanged_document_saves_original_bytes() {
    let xlsx = XlsxBuilder::new().sheet(overview()).build();
    let doc = XlDocument::load(&xlsx).unwrap();
    assert!(!doc.is_dirty());
    assert_eq!(doc.save().unwrap(), xlsx);
}

#[test]
fn test_untouched_parts_are_preserved() {
    let xlsx = XlsxBuilder::new()
        .sheet(overview())
        .sheet(target_sheet("GA-501"))
        .part("docProps/app.xml", APP_XML)
        .build();

    let mut doc = XlDocument::load(&xlsx).unwrap();
    doc.sheet_mut("GA-501").unwrap().set_value(6, 1, "edited");
    let saved = doc.save().unwrap();

    assert_eq!(part_names(&saved), part_names(&xlsx));
    for name in [
        "docProps/app.xml",
        "xl/worksheets/sheet1.xml",
        "xl/workbook.xml",
        "xl/sharedStrings.xml",
        "xl/styles.xml",
    ] {
        assert_eq!(part(&saved, name), part(&xlsx, name), "{name} changed");
    }
    assert_ne!(
        part(&saved, "xl/worksheets/sheet2.xml"),
        part(&xlsx, "xl/worksheets/sheet2.xml")
    );

    let reloaded = XlDocument::load(&saved).unwrap();
    let sheet = reloaded.workbook().sheet("GA-501").unwrap();
    assert_eq!(sheet.value(6, 1), Some(&CellValue::Text("edited".into())));
    assert_eq!(sheet.value(7, 1), Some(&CellValue::Text("old moving 2".into())));
}

#[test]
fn test_rewritten_sheet_keeps_layout() {
    let xlsx = XlsxBuilder::new()
        .sheet(
            target_sheet("GA-501")
                .tab_color("#0000FF")
                .row_height(6, 24.0)
                .col_width(1, 3, 18.5),
        )
        .build();

    let mut doc = XlDocument::load(&xlsx).unwrap();
    doc.sheet_mut("GA-501").unwrap().insert_rows(6, 2);
    let saved = doc.save().unwrap();
    let xml = String::from_utf8(part(&saved, "xl/worksheets/sheet1.xml")).unwrap();

    assert!(xml.contains("<sheetViews>"));
    assert!(xml.contains(r#"width="18.5""#));
    assert!(xml.contains("<pageMargins"));
    assert!(xml.find("</sheetData>").unwrap() < xml.find("<mergeCells").unwrap());
    assert!(xml.find("<mergeCells").unwrap() < xml.find("<pageMargins").unwrap());

    let reloaded = XlDocument::load(&saved).unwrap();
    let sheet = reloaded.workbook().sheet("GA-501").unwrap();
    assert_eq!(sheet.tab_color.as_deref(), Some("FF0000FF"));
    assert!(sheet.row_attrs(8).iter().any(|(k, v)| k == "ht" && v == "24"));
    assert!(sheet.row_attrs(6).is_empty());
    assert_eq!(sheet.value(11, 7), Some(&CellValue::Text("Fixed Arm".into())));
    assert_eq!(sheet.merges(), &[MergeRange::new(1, 1, 1, 4)]);
}

#[test]
fn test_hidden_sheet_state_is_read() {
    let xlsx = XlsxBuilder::new()
        .sheet(overview())
        .sheet(SheetBuilder::new("Lookup").hidden())
        .build();
    let doc = XlDocument::load(&xlsx).unwrap();
    let names: Vec<_> = doc.workbook().sheet_names().collect();
    assert_eq!(names, ["Overview", "Lookup"]);
    assert_eq!(
        doc.workbook().sheet("Lookup").unwrap().state,
        SheetState::Hidden
    );
}

#[test]
fn test_formulas_survive_untouched_rewrite() {
    let xlsx = XlsxBuilder::new()
        .sheet(
            SheetBuilder::new("Calc")
                .cell("A1", 2.0, None)
                .cell("A2", fixtures::CellValue::Formula("A1*3".into(), 6.0), None),
        )
        .build();
    let mut doc = XlDocument::load(&xlsx).unwrap();
    doc.sheet_mut("Calc").unwrap().set_value(3, 1, "note");

    let reloaded = XlDocument::load(&doc.save().unwrap()).unwrap();
    let cell = reloaded.workbook().sheet("Calc").unwrap().cell(2, 1).unwrap();
    assert_eq!(cell.formula.as_deref(), Some("A1*3"));
    assert_eq!(cell.value, CellValue::Number(6.0));
}

#[test]
fn test_merged_result_reloads_with_imported_styles() {
    let config = MergeConfig::default();
    let xlsx = XlsxBuilder::new()
        .sheet(target_sheet("GA-501"))
        .part("docProps/app.xml", APP_XML)
        .build();
    let source_xlsx = XlsxBuilder::new()
        .sheet(
            SheetBuilder::new("SH1")
                .cell(
                    "A1",
                    "Calibration",
                    Some(StyleBuilder::new().bold().align_horizontal("center")),
                )
                .merge("A1:B1")
                .cell("A2", 0.25, Some(StyleBuilder::new().number_format("0.0%")))
                .cell("A3", 3.0, Some(StyleBuilder::new().number_format("#,##0"))),
        )
        .sheet(SheetBuilder::new("CN1").cell("A1", "console", None))
        .build();
    let roster_xlsx = XlsxBuilder::new()
        .sheet(roster_sheet(&[["501", "SH1", "SH1", "CN1"]]))
        .build();

    let sources = vec![parser::parse(&source_xlsx).unwrap()];
    let records = roster::load_roster(&parser::parse(&roster_xlsx).unwrap(), &config.roster).unwrap();
    let mut doc = XlDocument::load(&xlsx).unwrap();
    merge::run(&mut doc, &sources, &records, &config).unwrap();
    assert!(doc.is_dirty());

    let saved = doc.save().unwrap();
    assert_eq!(part(&saved, "docProps/app.xml"), APP_XML);
    let styles_xml = String::from_utf8(part(&saved, "xl/styles.xml")).unwrap();
    assert!(styles_xml.contains(r#"formatCode="0.0%""#));
    assert!(styles_xml.find("<numFmts").unwrap() < styles_xml.find("<fonts").unwrap());

    let reloaded = XlDocument::load(&saved).unwrap();
    let wb = reloaded.workbook();
    let sheet = wb.sheet("GA-501").unwrap();
    assert_eq!(sheet.tab_color.as_deref(), Some("FF00FF00"));

    // Both arms hold SH1, each with its own copy of the title merge.
    for top in [6, 10] {
        assert_eq!(
            sheet.value(top, 1),
            Some(&CellValue::Text("Calibration".into()))
        );
        assert!(sheet.merges().contains(&MergeRange::new(top, 1, top, 2)));
        let pct = sheet.cell(top + 1, 1).unwrap().style;
        assert_eq!(wb.styles.number_format(pct), Some("0.0%"));
        let thousands = sheet.cell(top + 2, 1).unwrap().style;
        assert_eq!(wb.styles.number_format(thousands), Some("#,##0"));
    }
    let title = wb.styles.cell_xf(sheet.cell(6, 1).unwrap().style).unwrap();
    assert!(title.alignment.as_deref().is_some_and(|a| a.contains("center")));
}
