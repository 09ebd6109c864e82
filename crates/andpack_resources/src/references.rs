//! Resource symbol collection and reference validation.
//!
//! Every output file of the merged tree contributes symbols: file resources
//! by name, values files per entry, and `@+id/` declarations anywhere.
//! References (`@string/hello`) found in attributes or values text must
//! resolve against those symbols or a library's `R.txt`.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use andpack_diagnostics::{codes, Diagnostic, DiagnosticSink, Location};
use regex::Regex;

use crate::dir::resource_name;
use crate::error::ResourceError;
use crate::item::ResourceItem;
use crate::tree::{MergedEntry, MergedResourceTree};
use crate::values::{entry_kind, XmlError};

const TOOLS_NS: &str = "http://schemas.android.com/tools";

/// Kinds whose symbols come from file names and are case folded with them.
const FILE_KINDS: [&str; 12] = [
    "anim",
    "animator",
    "color",
    "drawable",
    "font",
    "interpolator",
    "layout",
    "menu",
    "mipmap",
    "navigation",
    "transition",
    "xml",
];

/// Declared resource symbols as `(kind, name)` pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolTable {
    symbols: BTreeSet<(String, String)>,
}

impl SymbolTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a symbol.
    pub fn insert(&mut self, kind: &str, name: &str) {
        self.symbols.insert((kind.to_string(), name.to_string()));
    }

    /// Returns `true` if the symbol is declared.
    pub fn contains(&self, kind: &str, name: &str) -> bool {
        self.symbols.contains(&(kind.to_string(), name.to_string()))
    }

    /// Declares every symbol listed in an `R.txt`.
    pub fn extend_from_r_txt(&mut self, text: &str) {
        for line in text.lines() {
            let mut parts = line.split_whitespace();
            let (Some(_), Some(kind), Some(name)) = (parts.next(), parts.next(), parts.next()) else {
                continue;
            };
            self.insert(kind, name);
        }
    }

    /// Number of symbols.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Returns `true` if no symbols are declared.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

fn reference_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^@(\+)?(\*)?(?:([A-Za-z0-9_.]+):)?([a-z][a-z\-]*)/([A-Za-z0-9_.$]+)$")
            .expect("valid regex")
    })
}

enum Parsed<'a> {
    Declaration(&'a str),
    Reference { kind: &'a str, name: &'a str },
    Other,
}

fn classify(value: &str) -> Parsed<'_> {
    let Some(caps) = reference_regex().captures(value.trim()) else {
        return Parsed::Other;
    };
    let kind = caps.get(4).map_or("", |m| m.as_str());
    let name = caps.get(5).map_or("", |m| m.as_str());
    if caps.get(1).is_some() {
        return if kind == "id" {
            Parsed::Declaration(name)
        } else {
            Parsed::Other
        };
    }
    if caps.get(3).is_some() || caps.get(2).is_some() {
        return Parsed::Other;
    }
    Parsed::Reference { kind, name }
}

struct PendingReference {
    kind: String,
    name: String,
    location: Location,
    project: String,
}

/// Collects symbols from the tree, then reports every unresolved reference.
///
/// `extra` holds symbols declared elsewhere (library `R.txt` files). Returns
/// the full symbol table.
pub fn validate_references(
    tree: &MergedResourceTree,
    extra: &SymbolTable,
    lowercase_file_names: bool,
    sink: &DiagnosticSink,
) -> Result<SymbolTable, ResourceError> {
    let mut symbols = extra.clone();
    let mut pending = Vec::new();
    for entry in tree.iter() {
        let Some(dir) = entry.dir() else {
            continue;
        };
        if !entry.is_values() {
            symbols.insert(&dir.kind, resource_name(entry.output.file_name()));
        }
        if !dir.holds_xml() || !entry.output.file_name().ends_with(".xml") {
            continue;
        }
        for item in entry.contributors() {
            let text = std::fs::read_to_string(&item.source)
                .map_err(|e| ResourceError::io(&item.source, e))?;
            // Malformed documents are reported by the merge or when materialising.
            if scan(&text, entry, item, &mut symbols, &mut pending).is_err() {
                tracing::debug!(file = %item.source.display(), "skipping reference scan of malformed XML");
            }
        }
    }

    for reference in pending {
        let name = if lowercase_file_names && FILE_KINDS.contains(&reference.kind.as_str()) {
            reference.name.to_lowercase()
        } else {
            reference.name.clone()
        };
        let kind = if reference.kind == "string-array" { "array" } else { reference.kind.as_str() };
        if !symbols.contains(kind, &name) {
            sink.emit(
                Diagnostic::error(
                    codes::UNRESOLVED_REFERENCE,
                    format!("resource {}/{} not found", reference.kind, reference.name),
                )
                .at(reference.location)
                .for_project(&reference.project),
            );
        }
    }
    Ok(symbols)
}

fn scan(
    text: &str,
    entry: &MergedEntry,
    item: &ResourceItem,
    symbols: &mut SymbolTable,
    pending: &mut Vec<PendingReference>,
) -> Result<(), XmlError> {
    let doc = roxmltree::Document::parse(text)?;
    let dropped = entry.dropped.get(&item.source);
    let mut note = |value: &str, pos: usize, symbols: &mut SymbolTable| match classify(value) {
        Parsed::Declaration(name) => symbols.insert("id", name),
        Parsed::Reference { kind, name } => {
            let at = doc.text_pos_at(pos);
            pending.push(PendingReference {
                kind: kind.to_string(),
                name: name.to_string(),
                location: Location::at(&item.source, at.row, at.col),
                project: item.origin.project.clone(),
            });
        }
        Parsed::Other => {}
    };

    let values = entry.is_values();
    for node in doc.root_element().descendants() {
        if node.is_element() {
            if values && node.parent() == Some(doc.root_element()) {
                let kind = entry_kind(node.tag_name().name(), node.attribute("type"));
                if let (Some(kind), Some(name)) = (kind, node.attribute("name")) {
                    let key = format!("{kind}/{name}");
                    if dropped.is_some_and(|d| d.contains(&key)) {
                        continue;
                    }
                    symbols.insert(&kind, name);
                }
            }
            if values && node.tag_name().name() == "attr" {
                if let Some(name) = node.attribute("name").filter(|n| !n.contains(':')) {
                    symbols.insert("attr", name);
                }
            }
            for attr in node.attributes() {
                if attr.namespace() == Some(TOOLS_NS) {
                    continue;
                }
                note(attr.value(), attr.range_value().start, symbols);
            }
        } else if node.is_text() {
            if let Some(value) = node.text() {
                if value.trim_start().starts_with('@') {
                    let start = node.range().start + (value.len() - value.trim_start().len());
                    note(value, start, symbols);
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ResourceOrigin;
    use crate::merge::{merge, MergeOptions};
    use andpack_common::LogicalPath;
    use andpack_config::FileNameCheck;
    use std::path::Path;

    fn write_item(root: &Path, logical: &str, content: &str) -> ResourceItem {
        let source = root.join("Resources").join(logical);
        std::fs::create_dir_all(source.parent().unwrap()).unwrap();
        std::fs::write(&source, content).unwrap();
        ResourceItem {
            logical: LogicalPath::new(logical),
            source,
            origin: ResourceOrigin::app("App1"),
        }
    }

    fn run(items: Vec<ResourceItem>, extra: &SymbolTable) -> (SymbolTable, DiagnosticSink) {
        let options = MergeOptions {
            max_api_level: 34,
            lowercase_file_names: true,
            file_name_check: FileNameCheck::Error,
        };
        let sink = DiagnosticSink::new();
        let tree = merge(items, vec![], &options, &sink).unwrap();
        let symbols = validate_references(&tree, extra, true, &sink).unwrap();
        (symbols, sink)
    }

    const LAYOUT: &str = r#"<LinearLayout xmlns:android="http://schemas.android.com/apk/res/android"
    xmlns:tools="http://schemas.android.com/tools"
    tools:context="@layout/nothing_here">
  <ImageView android:id="@+id/image1" android:src="@drawable/UPPER_image" />
  <TextView android:id="@+id/text1" android:text="@string/hello" android:layout_below="@id/image1" />
  <TextView android:text="@android:string/ok" />
</LinearLayout>"#;

    #[test]
    fn collects_symbols_of_every_kind() {
        let dir = tempfile::tempdir().unwrap();
        let items = vec![
            write_item(dir.path(), "layout/Main.xml", LAYOUT),
            write_item(dir.path(), "drawable/UPPER_image.png", "png"),
            write_item(
                dir.path(),
                "values/Strings.xml",
                r#"<resources><string name="hello">Hi</string><declare-styleable name="MyView"><attr name="shade" format="color"/></declare-styleable></resources>"#,
            ),
        ];
        let (symbols, sink) = run(items, &SymbolTable::new());
        assert!(sink.diagnostics().is_empty(), "{:?}", sink.diagnostics());
        assert!(symbols.contains("layout", "main"));
        assert!(symbols.contains("drawable", "upper_image"));
        assert!(symbols.contains("string", "hello"));
        assert!(symbols.contains("id", "image1"));
        assert!(symbols.contains("id", "text1"));
        assert!(symbols.contains("styleable", "MyView"));
        assert!(symbols.contains("attr", "shade"));
    }

    #[test]
    fn unresolved_reference_has_position() {
        let dir = tempfile::tempdir().unwrap();
        let items = vec![write_item(
            dir.path(),
            "layout/main.xml",
            "<LinearLayout xmlns:android=\"http://schemas.android.com/apk/res/android\">\n  <TextView android:text=\"@string/missing\" />\n</LinearLayout>",
        )];
        let (_, sink) = run(items, &SymbolTable::new());
        let diags = sink.diagnostics();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, codes::UNRESOLVED_REFERENCE);
        assert_eq!(diags[0].message, "resource string/missing not found");
        let location = diags[0].location.as_ref().unwrap();
        assert!(location.file.ends_with("layout/main.xml"));
        assert_eq!(location.line, Some(2));
        assert_eq!(location.column, Some(27));
    }

    #[test]
    fn library_r_txt_symbols_resolve() {
        let dir = tempfile::tempdir().unwrap();
        let items = vec![write_item(
            dir.path(),
            "layout/main.xml",
            "<TextView xmlns:android=\"http://schemas.android.com/apk/res/android\" android:text=\"@string/lib_name\" />",
        )];
        let mut extra = SymbolTable::new();
        extra.extend_from_r_txt("int string lib_name 0x7f0c0001\nint[] styleable Lib { 0x7f020001 }\n");
        let (_, sink) = run(items, &extra);
        assert!(!sink.has_errors());
    }

    #[test]
    fn values_text_references_are_checked() {
        let dir = tempfile::tempdir().unwrap();
        let items = vec![write_item(
            dir.path(),
            "values/styles.xml",
            "<resources><style name=\"Theme\"><item name=\"android:background\">@drawable/nope</item></style></resources>",
        )];
        let (_, sink) = run(items, &SymbolTable::new());
        assert_eq!(sink.error_count(), 1);
    }

    #[test]
    fn malformed_layout_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let items = vec![write_item(
            dir.path(),
            "layout/main.xml",
            "<LinearLayout>\n<TextView android:text=\"@string/nope\">\n</LinearLayout>",
        )];
        let (symbols, sink) = run(items, &SymbolTable::new());
        assert!(sink.diagnostics().is_empty());
        assert!(symbols.contains("layout", "main"));
    }
}
