//! Resource XML parsers.
//!
//! Two interchangeable backends collect the same [`FileSymbols`]: a document
//! parser built on `roxmltree` and an event parser built on `quick-xml`.
//! The streaming parser never materialises the tree and is the faster of
//! the two on large values files.

use andpack_config::ResourceParserKind;
use andpack_resources::XmlError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::symbols::FileSymbols;

/// Collects the symbols declared inside one XML resource document.
pub trait ResourceParser: Send + Sync {
    /// Short name used in logs and cache keys.
    fn name(&self) -> &'static str;

    /// Parses `text`. `values` selects `values*/` semantics, where each
    /// direct child of the root declares an entry.
    fn parse_xml(&self, text: &str, values: bool) -> Result<FileSymbols, XmlError>;
}

/// Returns the parser selected by configuration.
pub fn parser_for(kind: ResourceParserKind) -> Box<dyn ResourceParser> {
    match kind {
        ResourceParserKind::Managed => Box::new(ManagedParser),
        ResourceParserKind::Streaming => Box::new(StreamingParser),
    }
}

/// Document parser.
#[derive(Debug, Default, Clone, Copy)]
pub struct ManagedParser;

impl ResourceParser for ManagedParser {
    fn name(&self) -> &'static str {
        "managed"
    }

    fn parse_xml(&self, text: &str, values: bool) -> Result<FileSymbols, XmlError> {
        let doc = roxmltree::Document::parse(text)?;
        let root = doc.root_element();
        let mut out = FileSymbols::default();
        for node in root.descendants().filter(|n| n.is_element()) {
            for attr in node.attributes() {
                out.note_attribute(attr.value());
            }
            if !values {
                continue;
            }
            let tag = node.tag_name().name();
            if node.parent() == Some(root) {
                if let Some(name) = node.attribute("name") {
                    if tag == "declare-styleable" {
                        let attrs = node
                            .descendants()
                            .filter(|n| n.has_tag_name("attr"))
                            .filter_map(|n| n.attribute("name"))
                            .map(String::from)
                            .collect();
                        out.insert_styleable(name, attrs);
                    } else {
                        out.note_values_entry(tag, node.attribute("type"), name);
                    }
                }
            }
            if matches!(tag, "enum" | "flag") {
                if let Some(name) = node.attribute("name") {
                    out.insert(tag, name);
                }
            }
        }
        Ok(out)
    }
}

/// Event parser.
#[derive(Debug, Default, Clone, Copy)]
pub struct StreamingParser;

struct OpenStyleable {
    name: String,
    attrs: Vec<String>,
}

impl StreamingParser {
    fn element(
        out: &mut FileSymbols,
        start: &BytesStart<'_>,
        depth: usize,
        values: bool,
        styleable: &mut Option<OpenStyleable>,
        offset: usize,
        text: &str,
    ) -> Result<(), XmlError> {
        let mut name_attr = None;
        let mut type_attr = None;
        for attr in start.attributes() {
            let attr = attr.map_err(|e| position_error(e.to_string(), offset, text))?;
            let raw = std::str::from_utf8(&attr.value)
                .map_err(|e| position_error(e.to_string(), offset, text))?;
            let value = quick_xml::escape::unescape(raw)
                .map_err(|e| position_error(e.to_string(), offset, text))?
                .into_owned();
            out.note_attribute(&value);
            match attr.key.as_ref() {
                b"name" => name_attr = Some(value),
                b"type" => type_attr = Some(value),
                _ => {}
            }
        }
        if !values {
            return Ok(());
        }
        let local = start.local_name();
        let tag = std::str::from_utf8(local.as_ref())
            .map_err(|e| position_error(e.to_string(), offset, text))?;
        if depth == 1 {
            if let Some(name) = &name_attr {
                if tag == "declare-styleable" {
                    *styleable = Some(OpenStyleable {
                        name: name.clone(),
                        attrs: Vec::new(),
                    });
                } else {
                    out.note_values_entry(tag, type_attr.as_deref(), name);
                }
            }
        } else if tag == "attr" {
            if let (Some(open), Some(name)) = (styleable.as_mut(), &name_attr) {
                open.attrs.push(name.clone());
            }
        }
        if matches!(tag, "enum" | "flag") {
            if let Some(name) = &name_attr {
                out.insert(tag, name);
            }
        }
        Ok(())
    }
}

impl ResourceParser for StreamingParser {
    fn name(&self) -> &'static str {
        "streaming"
    }

    fn parse_xml(&self, text: &str, values: bool) -> Result<FileSymbols, XmlError> {
        let mut reader = Reader::from_str(text);
        let mut out = FileSymbols::default();
        let mut depth = 0usize;
        let mut seen_root = false;
        let mut styleable: Option<OpenStyleable> = None;
        loop {
            let offset = reader.buffer_position() as usize;
            let event = reader
                .read_event()
                .map_err(|e| position_error(e.to_string(), reader.error_position() as usize, text))?;
            match event {
                Event::Start(start) => {
                    if depth == 0 && seen_root {
                        return Err(position_error("multiple root elements".into(), offset, text));
                    }
                    seen_root = true;
                    Self::element(&mut out, &start, depth, values, &mut styleable, offset, text)?;
                    depth += 1;
                }
                Event::Empty(start) => {
                    if depth == 0 && seen_root {
                        return Err(position_error("multiple root elements".into(), offset, text));
                    }
                    seen_root = true;
                    Self::element(&mut out, &start, depth, values, &mut styleable, offset, text)?;
                    // A self-closing styleable ends immediately.
                    if depth == 1 {
                        if let Some(open) = styleable.take() {
                            out.insert_styleable(&open.name, open.attrs);
                        }
                    }
                }
                Event::End(_) => {
                    depth = depth.saturating_sub(1);
                    if depth == 1 {
                        if let Some(open) = styleable.take() {
                            out.insert_styleable(&open.name, open.attrs);
                        }
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }
        if !seen_root {
            return Err(position_error("no root element".into(), text.len(), text));
        }
        if depth != 0 {
            return Err(position_error("unexpected end of document".into(), text.len(), text));
        }
        Ok(out)
    }
}

fn position_error(message: String, offset: usize, text: &str) -> XmlError {
    let before = &text[..offset.min(text.len())];
    let line = before.matches('\n').count() as u32 + 1;
    let column = before.rsplit('\n').next().map_or(0, |l| l.chars().count()) as u32 + 1;
    XmlError {
        message,
        line,
        column,
    }
}
