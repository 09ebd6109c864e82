//! Folding library manifests into the application manifest.
//!
//! Library elements are spliced into the application document as text, so
//! the application's own formatting survives. `${applicationId}` is
//! replaced everywhere with the application's package.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use andpack_diagnostics::{codes, Diagnostic, DiagnosticSink, Location};

const ANDROID_NS: &str = "http://schemas.android.com/apk/res/android";
const APPLICATION_ID: &str = "${applicationId}";

/// A library manifest to merge.
#[derive(Debug, Clone)]
pub struct LibraryManifest {
    /// Where the manifest was read from, for diagnostics.
    pub path: PathBuf,
    /// Manifest text.
    pub text: String,
}

impl LibraryManifest {
    /// Reads a manifest from disk.
    pub fn read(path: &Path) -> std::io::Result<Self> {
        Ok(Self {
            path: path.to_path_buf(),
            text: std::fs::read_to_string(path)?,
        })
    }
}

/// Identity used to de-duplicate merged elements.
fn element_key(node: roxmltree::Node<'_, '_>) -> Option<String> {
    let tag = node.tag_name().name();
    let name = node.attribute((ANDROID_NS, "name"));
    match tag {
        "meta-data" => {
            let value = node
                .attribute((ANDROID_NS, "value"))
                .or_else(|| node.attribute((ANDROID_NS, "resource")))
                .unwrap_or_default();
            Some(format!("meta-data|{}|{value}", name.unwrap_or_default()))
        }
        "uses-sdk" => None,
        _ => name.map(|n| format!("{tag}|{n}")),
    }
}

#[derive(Default)]
struct Collected {
    manifest_level: Vec<String>,
    application_level: Vec<String>,
}

fn collect_library(
    text: &str,
    seen: &mut BTreeSet<String>,
    out: &mut Collected,
) -> Result<(), roxmltree::Error> {
    let doc = roxmltree::Document::parse(text)?;
    for child in doc.root_element().children().filter(|n| n.is_element()) {
        if child.tag_name().name() == "application" {
            for inner in child.children().filter(|n| n.is_element()) {
                if element_key(inner).is_some_and(|k| seen.insert(k)) {
                    out.application_level.push(text[inner.range()].to_string());
                }
            }
        } else if element_key(child).is_some_and(|k| seen.insert(k)) {
            out.manifest_level.push(text[child.range()].to_string());
        }
    }
    Ok(())
}

fn indented(snippets: &[String], indent: &str) -> String {
    snippets.iter().map(|s| format!("{indent}{s}\n")).collect()
}

/// Merges `libraries` into `app`.
///
/// `<uses-permission>` and other top-level elements are de-duplicated by
/// `android:name`, `<meta-data>` by name and value, and application
/// components by name. A library manifest that cannot be parsed is reported
/// as LIB0003 and skipped. An unparseable application manifest yields
/// `None` after reporting.
pub fn merge_manifests(
    app: &LibraryManifest,
    libraries: &[LibraryManifest],
    package: &str,
    project: &str,
    sink: &DiagnosticSink,
) -> Option<String> {
    let base = app.text.replace(APPLICATION_ID, package);
    let doc = match roxmltree::Document::parse(&base) {
        Ok(doc) => doc,
        Err(err) => {
            report(&app.path, &err, project, sink);
            return None;
        }
    };
    let root = doc.root_element();
    let mut seen: BTreeSet<String> = BTreeSet::new();
    let application = root
        .children()
        .find(|n| n.is_element() && n.has_tag_name("application"));
    for node in root.children().filter(|n| n.is_element()) {
        if Some(node) == application {
            seen.extend(node.children().filter(|n| n.is_element()).filter_map(element_key));
        } else if let Some(key) = element_key(node) {
            seen.insert(key);
        }
    }

    let mut collected = Collected::default();
    for library in libraries {
        let text = library.text.replace(APPLICATION_ID, package);
        if let Err(err) = collect_library(&text, &mut seen, &mut collected) {
            report(&library.path, &err, project, sink);
        }
    }
    if collected.manifest_level.is_empty() && collected.application_level.is_empty() {
        return Some(base);
    }

    let mut out = base.clone();
    let root_range = root.range();
    let root_close = base[root_range.clone()]
        .rfind("</")
        .map_or(root_range.end, |i| root_range.start + i);

    // Splice from the end so earlier offsets stay valid.
    let manifest_insert_at;
    match application {
        Some(app_node) => {
            let range = app_node.range();
            let element = &base[range.clone()];
            let children = indented(&collected.application_level, "    ");
            if element.ends_with("/>") {
                let open_end = range.end - 2;
                let replacement = format!(">\n{children}  </application>");
                out.replace_range(open_end..range.end, &replacement);
            } else if !children.is_empty() {
                let close = element.rfind("</").map_or(range.end, |i| range.start + i);
                let line_start = base[..close].rfind('\n').map_or(0, |i| i + 1);
                if base[line_start..close].trim().is_empty() {
                    out.insert_str(line_start, &children);
                } else {
                    out.insert_str(close, &format!("\n{children}  "));
                }
            }
            manifest_insert_at = range.start;
        }
        None => {
            if !collected.application_level.is_empty() {
                let block = format!(
                    "  <application>\n{}  </application>\n",
                    indented(&collected.application_level, "    ")
                );
                out.insert_str(root_close, &block);
            }
            manifest_insert_at = root_close;
        }
    }
    if !collected.manifest_level.is_empty() {
        let mut block = indented(&collected.manifest_level, "");
        block.push_str("  ");
        out.insert_str(manifest_insert_at, &block);
    }
    Some(out)
}

fn report(path: &Path, err: &roxmltree::Error, project: &str, sink: &DiagnosticSink) {
    let pos = err.pos();
    sink.emit(
        Diagnostic::error(
            codes::MANIFEST_MERGE_FAILED,
            format!("Manifest could not be merged: {err}"),
        )
        .at(Location::at(path, pos.row, pos.col))
        .for_project(project),
    );
}
