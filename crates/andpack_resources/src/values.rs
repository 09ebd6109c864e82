//! `values*/` file entries.
//!
//! An entry's key is its resource kind plus its `name` attribute, so
//! `<string name="hello">` and `<item type="string" name="hello">` collide.

use std::fmt;
use std::ops::Range;

/// Identity of one values entry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ValuesKey {
    /// Resource kind (`string`, `array`, `styleable`, ...).
    pub kind: String,
    /// The `name` attribute.
    pub name: String,
}

impl fmt::Display for ValuesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.name)
    }
}

/// One entry of a values file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValuesEntry {
    /// Entry key.
    pub key: ValuesKey,
    /// 1-based line of the element.
    pub line: u32,
    /// 1-based column of the element.
    pub column: u32,
    /// Byte range of the element in the source text.
    pub range: Range<usize>,
}

/// A malformed XML document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlError {
    /// Parser message.
    pub message: String,
    /// 1-based line.
    pub line: u32,
    /// 1-based column.
    pub column: u32,
}

impl From<roxmltree::Error> for XmlError {
    fn from(err: roxmltree::Error) -> Self {
        let pos = err.pos();
        Self {
            message: err.to_string(),
            line: pos.row,
            column: pos.col,
        }
    }
}

impl fmt::Display for XmlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Maps a values element to its resource kind, `None` for elements that do
/// not declare a resource.
pub fn entry_kind(element: &str, type_attr: Option<&str>) -> Option<String> {
    let kind = match element {
        "item" => type_attr?,
        "string-array" | "integer-array" | "array" => "array",
        "declare-styleable" => "styleable",
        "eat-comment" | "skip" | "public" | "public-group" | "java-symbol" | "add-resource" => {
            return None
        }
        other => other,
    };
    Some(kind.to_string())
}

/// Parses the top-level entries of a values document.
pub fn parse_values(text: &str) -> Result<Vec<ValuesEntry>, XmlError> {
    let doc = roxmltree::Document::parse(text)?;
    let mut entries = Vec::new();
    for node in doc.root_element().children().filter(|n| n.is_element()) {
        let Some(name) = node.attribute("name") else {
            continue;
        };
        let Some(kind) = entry_kind(node.tag_name().name(), node.attribute("type")) else {
            continue;
        };
        let pos = doc.text_pos_at(node.range().start);
        entries.push(ValuesEntry {
            key: ValuesKey {
                kind,
                name: name.to_string(),
            },
            line: pos.row,
            column: pos.col,
            range: node.range(),
        });
    }
    Ok(entries)
}

/// Appends element snippets to the root of a values document.
///
/// Used to fold a library's surviving entries into an app file at the same
/// logical path.
pub fn append_entries(base: &str, snippets: &[&str]) -> Result<String, XmlError> {
    let doc = roxmltree::Document::parse(base)?;
    let root = doc.root_element();
    let range = root.range();
    let element = &base[range.clone()];
    let insert: String = snippets.iter().map(|s| format!("    {s}\n")).collect();

    let mut out = String::with_capacity(base.len() + insert.len() + 16);
    if element.ends_with("/>") {
        let open_end = range.end - 2;
        out.push_str(base[..open_end].trim_end());
        out.push_str(">\n");
        out.push_str(&insert);
        out.push_str(&format!("</{}>", root.tag_name().name()));
        out.push_str(&base[range.end..]);
    } else {
        let close = element.rfind("</").map_or(range.end, |i| range.start + i);
        out.push_str(&base[..close]);
        if !base[..close].ends_with('\n') {
            out.push('\n');
        }
        out.push_str(&insert);
        out.push_str(&base[close..]);
    }
    Ok(out)
}
