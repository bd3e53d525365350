//! Shared XML utilities for reading and re-emitting XLSX parts.
//!
//! Attribute helpers handle namespace-prefixed keys and UTF-8 conversion
//! safely. The fragment helpers let the parser keep elements it does not
//! model as raw XML so they can be written back untouched.

use std::ops::Range;

use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};

use crate::error::{Result, XlmergeError};

/// An attribute as it appears in the source, value still XML-escaped.
pub type RawAttr = (String, String);

/// Extract a string attribute value by key (unescaped).
///
/// Returns `None` if the attribute is missing or not valid UTF-8.
pub fn attr_string(e: &BytesStart, key: &[u8]) -> Option<String> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == key {
            return attr.unescape_value().ok().map(|s| s.into_owned());
        }
    }
    None
}

/// Extract a `u32` attribute value by key.
pub fn attr_u32(e: &BytesStart, key: &[u8]) -> Option<u32> {
    attr_string(e, key).and_then(|s| s.trim().parse().ok())
}

/// Extract a boolean attribute value by key.
///
/// Returns `None` if missing. Recognizes `"1"`, `"true"` as true; `"0"`, `"false"` as false.
pub fn attr_bool(e: &BytesStart, key: &[u8]) -> Option<bool> {
    attr_string(e, key).map(|s| matches!(s.as_str(), "1" | "true"))
}

/// Collect every attribute of an element, keeping the raw (escaped) value.
///
/// Keys listed in `skip` are left out.
pub fn raw_attrs(e: &BytesStart, skip: &[&[u8]]) -> Vec<RawAttr> {
    e.attributes()
        .flatten()
        .filter(|attr| !skip.contains(&attr.key.as_ref()))
        .map(|attr| {
            (
                String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
                String::from_utf8_lossy(&attr.value).into_owned(),
            )
        })
        .collect()
}

/// Append raw attributes as ` key="value"` pairs.
pub fn push_raw_attrs(out: &mut String, attrs: &[RawAttr]) {
    for (key, value) in attrs {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        out.push_str(value);
        out.push('"');
    }
}

/// Get the local element name as an owned string.
///
/// Returns empty string if not valid UTF-8.
#[inline]
pub fn local_name_string(e: &BytesStart) -> String {
    let bytes = e.local_name();
    std::str::from_utf8(bytes.as_ref())
        .unwrap_or("")
        .to_string()
}

/// Minimal XML escaping for attribute/text content.
pub fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Skip to the end of the element whose start tag was just read.
///
/// `start` is the byte offset of that start tag's `<`. Returns the byte
/// span of the whole element, start tag through matching end tag. For an
/// empty element (`<x/>`) pass `is_empty = true` and nothing is read.
pub fn element_span(
    xml: &mut Reader<&[u8]>,
    start: usize,
    is_empty: bool,
    buf: &mut Vec<u8>,
) -> Result<Range<usize>> {
    if is_empty {
        return Ok(start..xml.buffer_position());
    }
    let mut depth: u32 = 1;
    loop {
        buf.clear();
        match xml.read_event_into(buf)? {
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
            Event::Eof => {
                return Err(XlmergeError::Parse(
                    "unexpected end of document inside element".into(),
                ))
            }
            _ => {}
        }
    }
    Ok(start..xml.buffer_position())
}

/// Re-emit an XML fragment in a canonical form.
///
/// Whitespace-only text between tags is dropped and empty elements are
/// written as `<x/>`, so two fragments with the same content compare
/// equal as strings.
pub fn canonical_fragment(raw: &[u8]) -> Result<String> {
    let mut reader = Reader::from_reader(raw);
    reader.trim_text(true);
    reader.expand_empty_elements(false);
    let mut writer = Writer::new(Vec::with_capacity(raw.len()));
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Eof => break,
            Event::Comment(_) | Event::Decl(_) | Event::PI(_) | Event::DocType(_) => {}
            event => writer.write_event(event)?,
        }
        buf.clear();
    }
    String::from_utf8(writer.into_inner())
        .map_err(|e| XlmergeError::Parse(format!("fragment is not UTF-8: {e}")))
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

    fn first_start(xml: &str) -> BytesStart<'static> {
        let mut reader = Reader::from_str(xml);
        loop {
            match reader.read_event().unwrap() {
                Event::Start(e) | Event::Empty(e) => return e.into_owned(),
                Event::Eof => panic!("no element"),
                _ => {}
            }
        }
    }

    #[test]
    fn test_attr_helpers() {
        let e = first_start(r#"<numFmt numFmtId="164" formatCode="&quot;kg&quot; 0" hidden="1"/>"#);
        assert_eq!(attr_u32(&e, b"numFmtId"), Some(164));
        assert_eq!(attr_string(&e, b"formatCode").as_deref(), Some("\"kg\" 0"));
        assert_eq!(attr_bool(&e, b"hidden"), Some(true));
        assert_eq!(attr_bool(&e, b"missing"), None);
    }

    #[test]
    fn test_raw_attrs_keep_escaping_and_skip_keys() {
        let e = first_start(r#"<row r="5" spans="1:3" ht="20" x14ac:dyDescent="0.25"/>"#);
        let attrs = raw_attrs(&e, &[b"r", b"spans"]);
        assert_eq!(
            attrs,
            vec![
                ("ht".to_string(), "20".to_string()),
                ("x14ac:dyDescent".to_string(), "0.25".to_string())
            ]
        );
        let mut out = String::new();
        push_raw_attrs(&mut out, &attrs);
        assert_eq!(out, r#" ht="20" x14ac:dyDescent="0.25""#);
    }

    #[test]
    fn test_canonical_fragment_ignores_formatting_whitespace() {
        let a = canonical_fragment(b"<font>\n  <b/>\n  <sz val=\"11\"/>\n</font>").unwrap();
        let b = canonical_fragment(b"<font><b/><sz val=\"11\"/></font>").unwrap();
        assert_eq!(a, b);
        assert_eq!(a, "<font><b/><sz val=\"11\"/></font>");
    }

    #[test]
    fn test_element_span_covers_nested_element() {
        let data = br#"<root><keep a="1"><x><y/></x></keep><next/></root>"#;
        let mut xml = Reader::from_reader(&data[..]);
        let mut buf = Vec::new();
        let mut span = None;
        loop {
            let before = xml.buffer_position();
            match xml.read_event_into(&mut buf).unwrap() {
                Event::Start(e) if e.local_name().as_ref() == b"keep" => {
                    let mut inner = Vec::new();
                    span = Some(element_span(&mut xml, before, false, &mut inner).unwrap());
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }
        let span = span.unwrap();
        assert_eq!(&data[span], br#"<keep a="1"><x><y/></x></keep>"#.as_slice());
    }

    #[test]
    fn test_xml_escape() {
        assert_eq!(xml_escape(r#"a<b & "c""#), "a&lt;b &amp; &quot;c&quot;");
    }
}
