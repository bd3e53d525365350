//! The workbook style registry, backed by `xl/styles.xml`.
//!
//! Fonts, fills and borders are kept as canonical XML fragments so that
//! "an equivalent entry already exists" is plain string equality. Cell
//! formats (`cellXfs`) reference those tables by index. Importing a cell
//! format from another workbook's registry looks up or registers every
//! component and then the format itself; nothing is shared between
//! registries.
//!
//! On save only the five managed sections are regenerated and spliced
//! into the original part; everything else (named styles, dxfs, colors)
//! passes through unchanged.

use std::collections::HashMap;
use std::ops::Range;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{Result, XlmergeError};
use crate::numfmt::{get_builtin_format, is_builtin_id, FIRST_CUSTOM_ID};
use crate::types::CellXf;
use crate::xml_helpers::{
    attr_string, attr_u32, canonical_fragment, element_span, push_raw_attrs, raw_attrs,
    xml_escape, RawAttr,
};

/// Upper bound on distinct cell formats in one workbook.
pub const MAX_CELL_XFS: usize = 64_000;

const DEFAULT_FONT: &str = r#"<font><sz val="11"/><name val="Calibri"/><family val="2"/></font>"#;
const DEFAULT_FILLS: [&str; 2] = [
    r#"<fill><patternFill patternType="none"/></fill>"#,
    r#"<fill><patternFill patternType="gray125"/></fill>"#,
];
const DEFAULT_BORDER: &str = "<border><left/><right/><top/><bottom/><diagonal/></border>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SectionKind {
    NumFmts,
    Fonts,
    Fills,
    Borders,
    CellXfs,
}

impl SectionKind {
    fn from_local_name(name: &[u8]) -> Option<Self> {
        match name {
            b"numFmts" => Some(Self::NumFmts),
            b"fonts" => Some(Self::Fonts),
            b"fills" => Some(Self::Fills),
            b"borders" => Some(Self::Borders),
            b"cellXfs" => Some(Self::CellXfs),
            _ => None,
        }
    }
}

/// Location of a managed section inside the original part.
#[derive(Debug, Clone)]
struct PartSection {
    kind: SectionKind,
    span: Range<usize>,
    attrs: Vec<RawAttr>,
}

/// The original `styles.xml`, kept for splicing on save.
#[derive(Debug, Clone)]
struct StylesPart {
    path: String,
    xml: Vec<u8>,
    sections: Vec<PartSection>,
}

/// Fonts, fills, borders, number formats and cell formats of one workbook.
#[derive(Debug, Clone)]
pub struct StyleRegistry {
    num_fmts: Vec<(u32, String)>,
    fonts: Vec<String>,
    fills: Vec<String>,
    borders: Vec<String>,
    cell_xfs: Vec<CellXf>,
    part: Option<StylesPart>,
    dirty: bool,
}

impl Default for StyleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl StyleRegistry {
    /// A registry holding only the format's default entries.
    #[must_use]
    pub fn new() -> Self {
        Self {
            num_fmts: Vec::new(),
            fonts: vec![DEFAULT_FONT.to_string()],
            fills: DEFAULT_FILLS.iter().map(ToString::to_string).collect(),
            borders: vec![DEFAULT_BORDER.to_string()],
            cell_xfs: vec![CellXf::default()],
            part: None,
            dirty: false,
        }
    }

    /// Parse the styles part found at `path` inside the package.
    pub fn parse(path: &str, data: &[u8]) -> Result<Self> {
        let mut registry = Self {
            num_fmts: Vec::new(),
            fonts: Vec::new(),
            fills: Vec::new(),
            borders: Vec::new(),
            cell_xfs: Vec::new(),
            part: None,
            dirty: false,
        };
        let mut sections = Vec::new();

        let mut xml = Reader::from_reader(data);
        xml.trim_text(false);
        let mut buf = Vec::new();
        let mut inner = Vec::new();
        let mut depth: u32 = 0;

        loop {
            let before = xml.buffer_position();
            buf.clear();
            match xml.read_event_into(&mut buf)? {
                ref event @ (Event::Start(ref e) | Event::Empty(ref e)) => {
                    let is_empty = matches!(event, Event::Empty(_));
                    if depth == 0 {
                        // <styleSheet>
                        if !is_empty {
                            depth = 1;
                        }
                        continue;
                    }
                    let name = e.local_name();
                    let Some(kind) = SectionKind::from_local_name(name.as_ref()) else {
                        element_span(&mut xml, before, is_empty, &mut inner)?;
                        continue;
                    };
                    let attrs = raw_attrs(e, &[b"count"]);
                    if !is_empty {
                        registry.read_section(&mut xml, kind, data)?;
                    }
                    sections.push(PartSection {
                        kind,
                        span: before..xml.buffer_position(),
                        attrs,
                    });
                }
                Event::End(_) => depth = depth.saturating_sub(1),
                Event::Eof => break,
                _ => {}
            }
        }

        if registry.cell_xfs.is_empty() {
            registry.cell_xfs.push(CellXf::default());
        }
        registry.part = Some(StylesPart {
            path: path.to_string(),
            xml: data.to_vec(),
            sections,
        });
        Ok(registry)
    }

    /// Read the children of a managed section up to its end tag.
    fn read_section(
        &mut self,
        xml: &mut Reader<&[u8]>,
        kind: SectionKind,
        data: &[u8],
    ) -> Result<()> {
        let mut buf = Vec::new();
        let mut inner = Vec::new();
        loop {
            let before = xml.buffer_position();
            buf.clear();
            match xml.read_event_into(&mut buf)? {
                ref event @ (Event::Start(ref e) | Event::Empty(ref e)) => {
                    let is_empty = matches!(event, Event::Empty(_));
                    if kind == SectionKind::NumFmts {
                        if let (Some(id), Some(code)) =
                            (attr_u32(e, b"numFmtId"), attr_string(e, b"formatCode"))
                        {
                            self.num_fmts.push((id, code));
                        }
                        element_span(xml, before, is_empty, &mut inner)?;
                        continue;
                    }
                    let span = element_span(xml, before, is_empty, &mut inner)?;
                    let raw = data.get(span).unwrap_or_default();
                    match kind {
                        SectionKind::Fonts => self.fonts.push(canonical_fragment(raw)?),
                        SectionKind::Fills => self.fills.push(canonical_fragment(raw)?),
                        SectionKind::Borders => self.borders.push(canonical_fragment(raw)?),
                        SectionKind::CellXfs => self.cell_xfs.push(parse_xf(raw)?),
                        SectionKind::NumFmts => {}
                    }
                }
                Event::End(_) => return Ok(()),
                Event::Eof => {
                    return Err(XlmergeError::Parse(
                        "styles.xml ended inside a style section".into(),
                    ))
                }
                _ => {}
            }
        }
    }

    /// Number of cell formats.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cell_xfs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cell_xfs.is_empty()
    }

    #[must_use]
    pub fn cell_xf(&self, idx: u32) -> Option<&CellXf> {
        self.cell_xfs.get(usize::try_from(idx).ok()?)
    }

    #[must_use]
    pub fn font(&self, id: u32) -> Option<&str> {
        lookup(&self.fonts, id)
    }

    #[must_use]
    pub fn fill(&self, id: u32) -> Option<&str> {
        lookup(&self.fills, id)
    }

    #[must_use]
    pub fn border(&self, id: u32) -> Option<&str> {
        lookup(&self.borders, id)
    }

    /// Format code of a number format id (built-in or declared).
    #[must_use]
    pub fn format_code(&self, num_fmt_id: u32) -> Option<&str> {
        get_builtin_format(num_fmt_id).or_else(|| {
            self.num_fmts
                .iter()
                .find(|(id, _)| *id == num_fmt_id)
                .map(|(_, code)| code.as_str())
        })
    }

    /// Number format code applied by a cell format.
    #[must_use]
    pub fn number_format(&self, xf_idx: u32) -> Option<&str> {
        self.format_code(self.cell_xf(xf_idx)?.num_fmt_id)
    }

    /// Whether entries were registered since load.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Look up or register an equivalent of `source`'s cell format
    /// `xf_idx`, returning the index in this registry.
    ///
    /// Unknown source indices map to the default format.
    pub fn import_xf(&mut self, source: &StyleRegistry, xf_idx: u32) -> Result<u32> {
        let Some(src) = source.cell_xf(xf_idx) else {
            return Ok(0);
        };

        let font_id = match source.font(src.font_id) {
            Some(font) => intern(&mut self.fonts, font, &mut self.dirty),
            None => 0,
        };
        let fill_id = match source.fill(src.fill_id) {
            Some(fill) => intern(&mut self.fills, fill, &mut self.dirty),
            None => 0,
        };
        let border_id = match source.border(src.border_id) {
            Some(border) => intern(&mut self.borders, border, &mut self.dirty),
            None => 0,
        };
        let num_fmt_id = if is_builtin_id(src.num_fmt_id) {
            src.num_fmt_id
        } else {
            match source.format_code(src.num_fmt_id) {
                Some(code) => self.intern_num_fmt(code),
                None => 0,
            }
        };

        let candidate = CellXf {
            num_fmt_id,
            font_id,
            fill_id,
            border_id,
            // Named styles are workbook-local; fall back to "Normal".
            xf_id: src.xf_id.map(|_| 0),
            flags: src.flags.clone(),
            alignment: src.alignment.clone(),
            protection: src.protection.clone(),
        };
        self.intern_xf(candidate)
    }

    /// Index of an equal cell format, registering it if absent.
    pub fn intern_xf(&mut self, xf: CellXf) -> Result<u32> {
        if let Some(pos) = self.cell_xfs.iter().position(|x| *x == xf) {
            return Ok(to_u32(pos));
        }
        if self.cell_xfs.len() >= MAX_CELL_XFS {
            return Err(XlmergeError::StyleRegistryFull {
                limit: MAX_CELL_XFS,
            });
        }
        self.cell_xfs.push(xf);
        self.dirty = true;
        Ok(to_u32(self.cell_xfs.len() - 1))
    }

    fn intern_num_fmt(&mut self, code: &str) -> u32 {
        if let Some((id, _)) = self.num_fmts.iter().find(|(_, c)| c == code) {
            return *id;
        }
        let next = self
            .num_fmts
            .iter()
            .map(|(id, _)| id + 1)
            .max()
            .unwrap_or(FIRST_CUSTOM_ID)
            .max(FIRST_CUSTOM_ID);
        self.num_fmts.push((next, code.to_string()));
        self.dirty = true;
        next
    }

    /// Serialize the registry back into its part, if anything changed.
    ///
    /// Returns the part path and its new bytes.
    pub fn to_part(&self) -> Result<Option<(String, Vec<u8>)>> {
        if !self.dirty {
            return Ok(None);
        }
        let Some(part) = &self.part else {
            return Err(XlmergeError::Other(
                "workbook has no styles part to update".into(),
            ));
        };

        let mut sections: Vec<&PartSection> = part.sections.iter().collect();
        sections.sort_by_key(|s| s.span.start);
        let has_num_fmts = sections.iter().any(|s| s.kind == SectionKind::NumFmts);

        let mut out = String::with_capacity(part.xml.len() + 1024);
        let mut cursor = 0;
        for section in sections {
            let head = part.xml.get(cursor..section.span.start).unwrap_or_default();
            out.push_str(&String::from_utf8_lossy(head));
            if section.kind == SectionKind::Fonts && !has_num_fmts && !self.num_fmts.is_empty() {
                self.write_section(&mut out, SectionKind::NumFmts, &[]);
            }
            self.write_section(&mut out, section.kind, &section.attrs);
            cursor = section.span.end;
        }
        let tail = part.xml.get(cursor..).unwrap_or_default();
        out.push_str(&String::from_utf8_lossy(tail));

        Ok(Some((part.path.clone(), out.into_bytes())))
    }

    fn write_section(&self, out: &mut String, kind: SectionKind, attrs: &[RawAttr]) {
        let (tag, count) = match kind {
            SectionKind::NumFmts => ("numFmts", self.num_fmts.len()),
            SectionKind::Fonts => ("fonts", self.fonts.len()),
            SectionKind::Fills => ("fills", self.fills.len()),
            SectionKind::Borders => ("borders", self.borders.len()),
            SectionKind::CellXfs => ("cellXfs", self.cell_xfs.len()),
        };
        out.push_str(&format!("<{tag} count=\"{count}\""));
        push_raw_attrs(out, attrs);
        out.push('>');
        match kind {
            SectionKind::NumFmts => {
                for (id, code) in &self.num_fmts {
                    out.push_str(&format!(
                        "<numFmt numFmtId=\"{id}\" formatCode=\"{}\"/>",
                        xml_escape(code)
                    ));
                }
            }
            SectionKind::Fonts => self.fonts.iter().for_each(|f| out.push_str(f)),
            SectionKind::Fills => self.fills.iter().for_each(|f| out.push_str(f)),
            SectionKind::Borders => self.borders.iter().for_each(|b| out.push_str(b)),
            SectionKind::CellXfs => self.cell_xfs.iter().for_each(|xf| write_xf(out, xf)),
        }
        out.push_str(&format!("</{tag}>"));
    }
}

/// Cached cross-registry import, so each source format is resolved once
/// per copy.
pub struct StyleImporter<'a> {
    source: &'a StyleRegistry,
    cache: HashMap<u32, u32>,
}

impl<'a> StyleImporter<'a> {
    #[must_use]
    pub fn new(source: &'a StyleRegistry) -> Self {
        Self {
            source,
            cache: HashMap::new(),
        }
    }

    pub fn import(&mut self, dest: &mut StyleRegistry, xf_idx: u32) -> Result<u32> {
        if let Some(&mapped) = self.cache.get(&xf_idx) {
            return Ok(mapped);
        }
        let mapped = dest.import_xf(self.source, xf_idx)?;
        self.cache.insert(xf_idx, mapped);
        Ok(mapped)
    }
}

fn lookup(table: &[String], id: u32) -> Option<&str> {
    table.get(usize::try_from(id).ok()?).map(String::as_str)
}

fn intern(table: &mut Vec<String>, fragment: &str, dirty: &mut bool) -> u32 {
    if let Some(pos) = table.iter().position(|f| f == fragment) {
        return to_u32(pos);
    }
    table.push(fragment.to_string());
    *dirty = true;
    to_u32(table.len() - 1)
}

fn to_u32(idx: usize) -> u32 {
    u32::try_from(idx).unwrap_or(u32::MAX)
}

/// Parse one `<xf>` element of `cellXfs`.
fn parse_xf(raw: &[u8]) -> Result<CellXf> {
    let mut xml = Reader::from_reader(raw);
    xml.trim_text(false);
    let mut buf = Vec::new();
    let mut inner = Vec::new();
    let mut xf = CellXf::default();
    let mut seen_root = false;

    loop {
        let before = xml.buffer_position();
        buf.clear();
        match xml.read_event_into(&mut buf)? {
            ref event @ (Event::Start(ref e) | Event::Empty(ref e)) => {
                let is_empty = matches!(event, Event::Empty(_));
                if !seen_root {
                    seen_root = true;
                    read_xf_attrs(e, &mut xf);
                    continue;
                }
                let span = element_span(&mut xml, before, is_empty, &mut inner)?;
                let fragment = canonical_fragment(raw.get(span).unwrap_or_default())?;
                match e.local_name().as_ref() {
                    b"alignment" => xf.alignment = Some(fragment),
                    b"protection" => xf.protection = Some(fragment),
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(xf)
}

fn read_xf_attrs(e: &BytesStart, xf: &mut CellXf) {
    xf.num_fmt_id = attr_u32(e, b"numFmtId").unwrap_or(0);
    xf.font_id = attr_u32(e, b"fontId").unwrap_or(0);
    xf.fill_id = attr_u32(e, b"fillId").unwrap_or(0);
    xf.border_id = attr_u32(e, b"borderId").unwrap_or(0);
    xf.xf_id = attr_u32(e, b"xfId");
    xf.flags = raw_attrs(
        e,
        &[b"numFmtId", b"fontId", b"fillId", b"borderId", b"xfId"],
    );
}

fn write_xf(out: &mut String, xf: &CellXf) {
    out.push_str(&format!(
        "<xf numFmtId=\"{}\" fontId=\"{}\" fillId=\"{}\" borderId=\"{}\"",
        xf.num_fmt_id, xf.font_id, xf.fill_id, xf.border_id
    ));
    if let Some(xf_id) = xf.xf_id {
        out.push_str(&format!(" xfId=\"{xf_id}\""));
    }
    push_raw_attrs(out, &xf.flags);
    if xf.alignment.is_none() && xf.protection.is_none() {
        out.push_str("/>");
        return;
    }
    out.push('>');
    if let Some(alignment) = &xf.alignment {
        out.push_str(alignment);
    }
    if let Some(protection) = &xf.protection {
        out.push_str(protection);
    }
    out.push_str("</xf>");
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

    const MAIN_STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <fonts count="2">
    <font><sz val="11"/><name val="Calibri"/></font>
    <font><b/><sz val="11"/><name val="Calibri"/></font>
  </fonts>
  <fills count="2">
    <fill><patternFill patternType="none"/></fill>
    <fill><patternFill patternType="gray125"/></fill>
  </fills>
  <borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders>
  <cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>
  <cellXfs count="2">
    <xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>
    <xf numFmtId="0" fontId="1" fillId="0" borderId="0" xfId="0" applyFont="1"/>
  </cellXfs>
  <cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>
</styleSheet>"#;

    const SOURCE_STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <numFmts count="1"><numFmt numFmtId="170" formatCode="0.000&quot; mm&quot;"/></numFmts>
  <fonts count="2">
    <font><sz val="11"/><name val="Calibri"/></font>
    <font>
      <b/>
      <sz val="11"/>
      <name val="Calibri"/>
    </font>
  </fonts>
  <fills count="3">
    <fill><patternFill patternType="none"/></fill>
    <fill><patternFill patternType="gray125"/></fill>
    <fill><patternFill patternType="solid"><fgColor rgb="FFFFFF00"/></patternFill></fill>
  </fills>
  <borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders>
  <cellXfs count="3">
    <xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>
    <xf numFmtId="0" fontId="1" fillId="0" borderId="0" xfId="0" applyFont="1"/>
    <xf numFmtId="170" fontId="1" fillId="2" borderId="0" xfId="0" applyFill="1">
      <alignment horizontal="center"/>
      <protection locked="0"/>
    </xf>
  </cellXfs>
</styleSheet>"#;

    fn main_registry() -> StyleRegistry {
        StyleRegistry::parse("xl/styles.xml", MAIN_STYLES.as_bytes()).unwrap()
    }

    fn source_registry() -> StyleRegistry {
        StyleRegistry::parse("xl/styles.xml", SOURCE_STYLES.as_bytes()).unwrap()
    }

    #[test]
    fn test_parse_tables() {
        let reg = source_registry();
        assert_eq!(reg.len(), 3);
        assert_eq!(reg.font(1), Some("<font><b/><sz val=\"11\"/><name val=\"Calibri\"/></font>"));
        assert_eq!(reg.number_format(2), Some("0.000\" mm\""));
        let xf = reg.cell_xf(2).unwrap();
        assert_eq!(xf.alignment.as_deref(), Some("<alignment horizontal=\"center\"/>"));
        assert_eq!(xf.protection.as_deref(), Some("<protection locked=\"0\"/>"));
        assert_eq!(xf.flags, vec![("applyFill".to_string(), "1".to_string())]);
        assert!(!reg.is_dirty());
    }

    #[test]
    fn test_import_reuses_equivalent_entries() {
        let mut main = main_registry();
        let source = source_registry();

        // Bold font exists in both (different whitespace), same xf shape.
        assert_eq!(main.import_xf(&source, 1).unwrap(), 1);
        assert!(!main.is_dirty());
    }

    #[test]
    fn test_import_registers_missing_components() {
        let mut main = main_registry();
        let source = source_registry();

        let idx = main.import_xf(&source, 2).unwrap();
        assert_eq!(idx, 2);
        assert!(main.is_dirty());

        let xf = main.cell_xf(idx).unwrap().clone();
        assert_eq!(xf.font_id, 1);
        assert_eq!(xf.fill_id, 2);
        assert_eq!(xf.num_fmt_id, FIRST_CUSTOM_ID);
        assert_eq!(main.number_format(idx), Some("0.000\" mm\""));
        assert_eq!(xf.protection.as_deref(), Some("<protection locked=\"0\"/>"));

        // A second import is a pure lookup.
        assert_eq!(main.import_xf(&source, 2).unwrap(), idx);
        assert_eq!(main.len(), 3);
    }

    #[test]
    fn test_import_unknown_index_maps_to_default() {
        let mut main = main_registry();
        assert_eq!(main.import_xf(&source_registry(), 99).unwrap(), 0);
    }

    #[test]
    fn test_to_part_splices_sections() {
        let mut main = main_registry();
        assert!(main.to_part().unwrap().is_none());

        let idx = main.import_xf(&source_registry(), 2).unwrap();
        let (path, bytes) = main.to_part().unwrap().unwrap();
        assert_eq!(path, "xl/styles.xml");

        let text = String::from_utf8(bytes.clone()).unwrap();
        assert!(text.contains("<numFmts count=\"1\"><numFmt numFmtId=\"164\""));
        assert!(text.find("<numFmts").unwrap() < text.find("<fonts").unwrap());
        assert!(text.contains("<cellXfs count=\"3\">"));
        assert!(text.contains("<cellStyle name=\"Normal\" xfId=\"0\" builtinId=\"0\"/>"));

        // The rewritten part parses back to the same registry content.
        let reparsed = StyleRegistry::parse("xl/styles.xml", &bytes).unwrap();
        assert_eq!(reparsed.len(), 3);
        assert_eq!(reparsed.cell_xf(idx), main.cell_xf(idx));
        assert_eq!(reparsed.number_format(idx), Some("0.000\" mm\""));
    }

    #[test]
    fn test_registry_limit_is_fatal() {
        let mut reg = StyleRegistry::new();
        for i in 1..MAX_CELL_XFS {
            reg.intern_xf(CellXf {
                num_fmt_id: u32::try_from(i).unwrap(),
                ..CellXf::default()
            })
            .unwrap();
        }
        let err = reg
            .intern_xf(CellXf {
                num_fmt_id: u32::MAX,
                ..CellXf::default()
            })
            .unwrap_err();
        assert!(matches!(err, XlmergeError::StyleRegistryFull { .. }));
        assert!(err.is_fatal());
    }
}
