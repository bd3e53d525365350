//! In-memory XLSX builders for integration tests.
//!
//! ```rust,ignore
//! use fixtures::{SheetBuilder, StyleBuilder, XlsxBuilder};
//!
//! let xlsx = XlsxBuilder::new()
//!     .sheet(
//!         SheetBuilder::new("GA-501")
//!             .cell("G5", "Moving Arm", Some(StyleBuilder::new().bold()))
//!             .merge("A6:C6"),
//!     )
//!     .build();
//!
//! let doc = xlmerge::XlDocument::load(&xlsx).unwrap();
//! ```
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::cast_possible_truncation
)]

use std::collections::BTreeMap;
use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::ZipWriter;

// ============================================================================
// Style Builder
// ============================================================================

/// Builder for a cell format.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleBuilder {
    pub bold: bool,
    pub font_color: Option<String>,
    pub bg_color: Option<String>,
    pub border: Option<String>,
    pub align_horizontal: Option<String>,
    pub number_format: Option<String>,
}

impl StyleBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    /// Font color as ARGB or `#RRGGBB`.
    #[must_use]
    pub fn font_color(mut self, color: &str) -> Self {
        self.font_color = Some(normalize_color(color));
        self
    }

    /// Solid background fill.
    #[must_use]
    pub fn bg_color(mut self, color: &str) -> Self {
        self.bg_color = Some(normalize_color(color));
        self
    }

    /// Same border style on all four sides.
    #[must_use]
    pub fn border(mut self, style: &str) -> Self {
        self.border = Some(style.to_string());
        self
    }

    #[must_use]
    pub fn align_horizontal(mut self, align: &str) -> Self {
        self.align_horizontal = Some(align.to_string());
        self
    }

    #[must_use]
    pub fn number_format(mut self, format: &str) -> Self {
        self.number_format = Some(format.to_string());
        self
    }
}

// ============================================================================
// Cell Value
// ============================================================================

/// A value written into a fixture cell.
#[derive(Debug, Clone)]
pub enum CellValue {
    /// Stored in the shared string table.
    String(String),
    InlineString(String),
    Number(f64),
    Boolean(bool),
    /// A cached value with its formula.
    Formula(String, f64),
    Empty,
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::String(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<i32> for CellValue {
    fn from(n: i32) -> Self {
        CellValue::Number(f64::from(n))
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Boolean(b)
    }
}

// ============================================================================
// Sheet Builder
// ============================================================================

#[derive(Debug, Clone)]
pub struct CellEntry {
    pub cell_ref: String,
    pub value: CellValue,
    pub style: Option<StyleBuilder>,
}

/// Builder for a single worksheet.
#[derive(Debug, Clone, Default)]
pub struct SheetBuilder {
    pub name: String,
    pub cells: Vec<CellEntry>,
    pub merges: Vec<String>,
    pub row_heights: Vec<(u32, f64)>,
    pub tab_color: Option<String>,
    pub col_width: Option<(u32, u32, f64)>,
    pub page_margins: bool,
    pub hidden: bool,
}

impl SheetBuilder {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn cell<V: Into<CellValue>>(
        mut self,
        cell_ref: &str,
        value: V,
        style: Option<StyleBuilder>,
    ) -> Self {
        self.cells.push(CellEntry {
            cell_ref: cell_ref.to_string(),
            value: value.into(),
            style,
        });
        self
    }

    /// Add an empty cell carrying only a style.
    #[must_use]
    pub fn styled_cell(mut self, cell_ref: &str, style: StyleBuilder) -> Self {
        self.cells.push(CellEntry {
            cell_ref: cell_ref.to_string(),
            value: CellValue::Empty,
            style: Some(style),
        });
        self
    }

    /// Add a merge range (e.g., "A1:B2").
    #[must_use]
    pub fn merge(mut self, range: &str) -> Self {
        self.merges.push(range.to_string());
        self
    }

    #[must_use]
    pub fn row_height(mut self, row: u32, height: f64) -> Self {
        self.row_heights.push((row, height));
        self
    }

    #[must_use]
    pub fn tab_color(mut self, color: &str) -> Self {
        self.tab_color = Some(normalize_color(color));
        self
    }

    #[must_use]
    pub fn col_width(mut self, min: u32, max: u32, width: f64) -> Self {
        self.col_width = Some((min, max, width));
        self
    }

    /// Emit a `pageMargins` element after the sheet data.
    #[must_use]
    pub fn page_margins(mut self) -> Self {
        self.page_margins = true;
        self
    }

    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }
}

// ============================================================================
// XLSX Builder
// ============================================================================

/// Builder for a complete XLSX package.
#[derive(Debug, Default)]
pub struct XlsxBuilder {
    sheets: Vec<SheetBuilder>,
    extra_parts: Vec<(String, Vec<u8>)>,
}

impl XlsxBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn sheet(mut self, sheet: SheetBuilder) -> Self {
        self.sheets.push(sheet);
        self
    }

    /// Add an arbitrary package part, stored as given.
    #[must_use]
    pub fn part(mut self, path: &str, data: &[u8]) -> Self {
        self.extra_parts.push((path.to_string(), data.to_vec()));
        self
    }

    /// Build the XLSX file as bytes.
    #[must_use]
    pub fn build(self) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options: FileOptions<()> =
            FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        let mut styles = StylesCollector::new();
        let mut shared_strings: Vec<String> = Vec::new();
        for cell in self.sheets.iter().flat_map(|s| &s.cells) {
            if let Some(style) = &cell.style {
                styles.add_style(style);
            }
            if let CellValue::String(s) = &cell.value {
                if !shared_strings.contains(s) {
                    shared_strings.push(s.clone());
                }
            }
        }

        let mut write = |path: &str, data: &[u8]| {
            zip.start_file(path, options).unwrap();
            zip.write_all(data).unwrap();
        };

        write(
            "[Content_Types].xml",
            generate_content_types(self.sheets.len()).as_bytes(),
        );
        write("_rels/.rels", RELS.as_bytes());
        write(
            "xl/_rels/workbook.xml.rels",
            generate_workbook_rels(self.sheets.len()).as_bytes(),
        );
        write(
            "xl/workbook.xml",
            generate_workbook(&self.sheets).as_bytes(),
        );
        write("xl/styles.xml", styles.generate_styles_xml().as_bytes());
        write(
            "xl/sharedStrings.xml",
            generate_shared_strings(&shared_strings).as_bytes(),
        );
        for (i, sheet) in self.sheets.iter().enumerate() {
            write(
                &format!("xl/worksheets/sheet{}.xml", i + 1),
                generate_sheet_xml(sheet, &shared_strings, &styles).as_bytes(),
            );
        }
        for (path, data) in &self.extra_parts {
            write(path, data);
        }

        zip.finish().expect("Failed to finish ZIP").into_inner()
    }
}

// ============================================================================
// Styles Collector
// ============================================================================

/// Collects and deduplicates styles into a `styles.xml` part.
#[derive(Debug, Default)]
struct StylesCollector {
    fonts: Vec<String>,
    fills: Vec<String>,
    borders: Vec<String>,
    num_fmts: Vec<(u32, String)>,
    cell_xfs: Vec<String>,
    style_map: Vec<(StyleBuilder, u32)>,
}

impl StylesCollector {
    fn new() -> Self {
        let mut collector = Self::default();
        collector
            .fonts
            .push(r#"<font><sz val="11"/><name val="Calibri"/></font>"#.to_string());
        collector
            .fills
            .push(r#"<fill><patternFill patternType="none"/></fill>"#.to_string());
        collector
            .fills
            .push(r#"<fill><patternFill patternType="gray125"/></fill>"#.to_string());
        collector
            .borders
            .push("<border><left/><right/><top/><bottom/><diagonal/></border>".to_string());
        collector
            .cell_xfs
            .push(r#"<xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>"#.to_string());
        collector
    }

    fn add_style(&mut self, style: &StyleBuilder) -> u32 {
        if let Some((_, idx)) = self.style_map.iter().find(|(s, _)| s == style) {
            return *idx;
        }

        let mut font = String::from("<font>");
        if style.bold {
            font.push_str("<b/>");
        }
        font.push_str(r#"<sz val="11"/>"#);
        if let Some(color) = &style.font_color {
            font.push_str(&format!(r#"<color rgb="{color}"/>"#));
        }
        font.push_str(r#"<name val="Calibri"/></font>"#);
        let font_id = intern(&mut self.fonts, font);

        let fill_id = match &style.bg_color {
            Some(color) => intern(
                &mut self.fills,
                format!(
                    r#"<fill><patternFill patternType="solid"><fgColor rgb="{color}"/><bgColor indexed="64"/></patternFill></fill>"#
                ),
            ),
            None => 0,
        };

        let border_id = match &style.border {
            Some(kind) => {
                let side =
                    |name: &str| format!(r#"<{name} style="{kind}"><color auto="1"/></{name}>"#);
                intern(
                    &mut self.borders,
                    format!(
                        "<border>{}{}{}{}<diagonal/></border>",
                        side("left"),
                        side("right"),
                        side("top"),
                        side("bottom")
                    ),
                )
            }
            None => 0,
        };

        let num_fmt_id = style.number_format.as_ref().map_or(0, |code| {
            if let Some(id) = builtin_format_id(code) {
                return id;
            }
            if let Some((id, _)) = self.num_fmts.iter().find(|(_, c)| c == code) {
                return *id;
            }
            let id = 164 + self.num_fmts.len() as u32;
            self.num_fmts.push((id, code.clone()));
            id
        });

        let mut attrs = format!(
            r#"numFmtId="{num_fmt_id}" fontId="{font_id}" fillId="{fill_id}" borderId="{border_id}" xfId="0""#
        );
        if num_fmt_id > 0 {
            attrs.push_str(r#" applyNumberFormat="1""#);
        }
        if font_id > 0 {
            attrs.push_str(r#" applyFont="1""#);
        }
        if fill_id > 0 {
            attrs.push_str(r#" applyFill="1""#);
        }
        if border_id > 0 {
            attrs.push_str(r#" applyBorder="1""#);
        }
        let xf = match &style.align_horizontal {
            Some(h) => {
                format!(r#"<xf {attrs} applyAlignment="1"><alignment horizontal="{h}"/></xf>"#)
            }
            None => format!("<xf {attrs}/>"),
        };

        let idx = self.cell_xfs.len() as u32;
        self.cell_xfs.push(xf);
        self.style_map.push((style.clone(), idx));
        idx
    }

    fn style_index(&self, style: &StyleBuilder) -> u32 {
        self.style_map
            .iter()
            .find(|(s, _)| s == style)
            .map_or(0, |(_, idx)| *idx)
    }

    fn generate_styles_xml(&self) -> String {
        let mut xml = String::new();
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push_str(
            r#"<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
        );
        if !self.num_fmts.is_empty() {
            xml.push_str(&format!(r#"<numFmts count="{}">"#, self.num_fmts.len()));
            for (id, code) in &self.num_fmts {
                xml.push_str(&format!(
                    r#"<numFmt numFmtId="{id}" formatCode="{}"/>"#,
                    escape_xml(code)
                ));
            }
            xml.push_str("</numFmts>");
        }
        push_section(&mut xml, "fonts", &self.fonts);
        push_section(&mut xml, "fills", &self.fills);
        push_section(&mut xml, "borders", &self.borders);
        xml.push_str(r#"<cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>"#);
        push_section(&mut xml, "cellXfs", &self.cell_xfs);
        xml.push_str(r#"<cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>"#);
        xml.push_str("</styleSheet>");
        xml
    }
}

fn intern(list: &mut Vec<String>, item: String) -> u32 {
    if let Some(pos) = list.iter().position(|x| *x == item) {
        return pos as u32;
    }
    list.push(item);
    (list.len() - 1) as u32
}

fn push_section(xml: &mut String, name: &str, items: &[String]) {
    xml.push_str(&format!(r#"<{name} count="{}">"#, items.len()));
    for item in items {
        xml.push_str(item);
    }
    xml.push_str(&format!("</{name}>"));
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Normalize a color to uppercase ARGB without `#`.
fn normalize_color(color: &str) -> String {
    let color = color.trim_start_matches('#').to_uppercase();
    if color.len() == 6 {
        format!("FF{color}")
    } else {
        color
    }
}

fn builtin_format_id(format: &str) -> Option<u32> {
    match format {
        "General" => Some(0),
        "0" => Some(1),
        "0.00" => Some(2),
        "#,##0" => Some(3),
        "#,##0.00" => Some(4),
        "0%" => Some(9),
        "0.00%" => Some(10),
        "mm-dd-yy" => Some(14),
        "@" => Some(49),
        _ => None,
    }
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

const RELS: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>"#,
    "</Relationships>"
);

fn generate_content_types(sheet_count: usize) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#);
    xml.push_str(r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#);
    xml.push_str(r#"<Default Extension="xml" ContentType="application/xml"/>"#);
    xml.push_str(r#"<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#);
    xml.push_str(r#"<Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>"#);
    xml.push_str(r#"<Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/>"#);
    for i in 1..=sheet_count {
        xml.push_str(&format!(
            r#"<Override PartName="/xl/worksheets/sheet{i}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#
        ));
    }
    xml.push_str("</Types>");
    xml
}

fn generate_workbook_rels(sheet_count: usize) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    for i in 1..=sheet_count {
        xml.push_str(&format!(
            r#"<Relationship Id="rId{i}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{i}.xml"/>"#
        ));
    }
    xml.push_str(&format!(
        r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#,
        sheet_count + 1
    ));
    xml.push_str(&format!(
        r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/>"#,
        sheet_count + 2
    ));
    xml.push_str("</Relationships>");
    xml
}

fn generate_workbook(sheets: &[SheetBuilder]) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#);
    xml.push_str("<sheets>");
    for (i, sheet) in sheets.iter().enumerate() {
        let state = if sheet.hidden {
            r#" state="hidden""#
        } else {
            ""
        };
        xml.push_str(&format!(
            r#"<sheet name="{}" sheetId="{}"{state} r:id="rId{}"/>"#,
            escape_xml(&sheet.name),
            i + 1,
            i + 1
        ));
    }
    xml.push_str("</sheets></workbook>");
    xml
}

fn generate_shared_strings(strings: &[String]) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(&format!(
        r#"<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{0}" uniqueCount="{0}">"#,
        strings.len()
    ));
    for s in strings {
        xml.push_str(&format!(
            r#"<si><t xml:space="preserve">{}</t></si>"#,
            escape_xml(s)
        ));
    }
    xml.push_str("</sst>");
    xml
}

/// Parse "B12" into 1-based (row, col).
fn parse_cell_ref(cell_ref: &str) -> (u32, u32) {
    let mut col = 0u32;
    let mut row = 0u32;
    for c in cell_ref.chars() {
        if c.is_ascii_alphabetic() {
            col = col * 26 + (c.to_ascii_uppercase() as u32 - 'A' as u32 + 1);
        } else if let Some(d) = c.to_digit(10) {
            row = row * 10 + d;
        }
    }
    (row, col)
}

fn generate_sheet_xml(
    sheet: &SheetBuilder,
    shared_strings: &[String],
    styles: &StylesCollector,
) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#);

    if let Some(color) = &sheet.tab_color {
        xml.push_str(&format!(r#"<sheetPr><tabColor rgb="{color}"/></sheetPr>"#));
    }
    xml.push_str(r#"<sheetViews><sheetView workbookViewId="0"/></sheetViews>"#);
    xml.push_str(r#"<sheetFormatPr defaultRowHeight="15"/>"#);
    if let Some((min, max, width)) = sheet.col_width {
        xml.push_str(&format!(
            r#"<cols><col min="{min}" max="{max}" width="{width}" customWidth="1"/></cols>"#
        ));
    }

    let mut rows: BTreeMap<u32, Vec<(u32, &CellEntry)>> = BTreeMap::new();
    for cell in &sheet.cells {
        let (row, col) = parse_cell_ref(&cell.cell_ref);
        rows.entry(row).or_default().push((col, cell));
    }
    for (row, _) in &sheet.row_heights {
        rows.entry(*row).or_default();
    }

    xml.push_str("<sheetData>");
    for (row_num, mut cells) in rows {
        cells.sort_by_key(|(col, _)| *col);
        let mut row_attrs = format!(r#"r="{row_num}""#);
        if let Some((_, height)) = sheet.row_heights.iter().find(|(r, _)| *r == row_num) {
            row_attrs.push_str(&format!(r#" ht="{height}" customHeight="1""#));
        }
        xml.push_str(&format!("<row {row_attrs}>"));

        for (_, cell) in cells {
            let mut attrs = format!(r#"r="{}""#, cell.cell_ref);
            if let Some(style) = &cell.style {
                let idx = styles.style_index(style);
                if idx > 0 {
                    attrs.push_str(&format!(r#" s="{idx}""#));
                }
            }
            match &cell.value {
                CellValue::String(s) => {
                    let idx = shared_strings.iter().position(|x| x == s).unwrap_or(0);
                    xml.push_str(&format!(r#"<c {attrs} t="s"><v>{idx}</v></c>"#));
                }
                CellValue::InlineString(s) => {
                    xml.push_str(&format!(
                        r#"<c {attrs} t="inlineStr"><is><t>{}</t></is></c>"#,
                        escape_xml(s)
                    ));
                }
                CellValue::Number(n) => {
                    xml.push_str(&format!(r#"<c {attrs}><v>{n}</v></c>"#));
                }
                CellValue::Boolean(b) => {
                    xml.push_str(&format!(r#"<c {attrs} t="b"><v>{}</v></c>"#, u8::from(*b)));
                }
                CellValue::Formula(f, v) => {
                    xml.push_str(&format!(
                        r#"<c {attrs}><f>{}</f><v>{v}</v></c>"#,
                        escape_xml(f)
                    ));
                }
                CellValue::Empty => {
                    xml.push_str(&format!(r#"<c {attrs}/>"#));
                }
            }
        }
        xml.push_str("</row>");
    }
    xml.push_str("</sheetData>");

    if !sheet.merges.is_empty() {
        xml.push_str(&format!(r#"<mergeCells count="{}">"#, sheet.merges.len()));
        for range in &sheet.merges {
            xml.push_str(&format!(r#"<mergeCell ref="{range}"/>"#));
        }
        xml.push_str("</mergeCells>");
    }
    if sheet.page_margins {
        xml.push_str(r#"<pageMargins left="0.7" right="0.7" top="0.75" bottom="0.75" header="0.3" footer="0.3"/>"#);
    }

    xml.push_str("</worksheet>");
    xml
}

// ============================================================================
// Merge scenario fixtures
// ============================================================================

/// Target sheet with the three sections anchored in column G at rows 5, 9
/// and 13, each span holding leftovers of an earlier fill.
#[must_use]
pub fn target_sheet(name: &str) -> SheetBuilder {
    let header = StyleBuilder::new().bold().bg_color("#D9D9D9");
    SheetBuilder::new(name)
        .cell("A1", format!("Location {name}"), Some(header.clone()))
        .merge("A1:D1")
        .cell("G5", "Moving Arm", Some(header.clone()))
        .cell("A6", "old moving 1", None)
        .cell("A7", "old moving 2", None)
        .cell("A8", "old moving 3", None)
        .cell("G9", "Fixed Arm", Some(header.clone()))
        .cell("A10", "old fixed 1", None)
        .cell("A11", "old fixed 2", None)
        .cell("A12", "old fixed 3", None)
        .cell("G13", "Console", Some(header))
        .cell("A14", "old console 1", None)
        .cell("A15", "old console 2", None)
        .page_margins()
}

/// Roster sheet with the default column headers.
#[must_use]
pub fn roster_sheet(rows: &[[&str; 4]]) -> SheetBuilder {
    let mut sheet = SheetBuilder::new("Roster")
        .cell("A1", "MachineNumber", None)
        .cell("B1", "MovingArm", None)
        .cell("C1", "FixedArm", None)
        .cell("D1", "Console", None);
    for (i, fields) in rows.iter().enumerate() {
        let row = i + 2;
        for (col, value) in ["A", "B", "C", "D"].iter().zip(fields) {
            if !value.is_empty() {
                sheet = sheet.cell(&format!("{col}{row}"), *value, None);
            }
        }
    }
    sheet
}
