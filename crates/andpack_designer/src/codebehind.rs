//! Layout code-behind.
//!
//! A layout whose root element lists types in `tools:classes` gets a
//! `Binding.<Layout>` class exposing every `@+id/` widget as a lazily bound
//! property, plus a partial class per listed type holding the binding.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use andpack_common::fs::{remove_unknown_files, write_if_changed};
use andpack_diagnostics::{codes, Diagnostic, DiagnosticSink, Location};
use andpack_resources::dir::resource_name;
use andpack_resources::{MergedResourceTree, XmlError};

use crate::collect::GenerationMode;
use crate::error::DesignerError;
use crate::model::field_name;

const ANDROID_NS: &str = "http://schemas.android.com/apk/res/android";
const TOOLS_NS: &str = "http://schemas.android.com/tools";

/// Directory under the intermediate dir holding generated bindings.
pub const GENERATED_DIR: &str = "generated";

/// One bound widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Widget {
    /// Id name without the `@+id/` prefix.
    pub id: String,
    /// Fully qualified managed type.
    pub type_name: String,
    /// Bound through the fragment manager instead of `FindViewById`.
    pub fragment: bool,
}

/// Everything needed to render one layout's binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutBinding {
    /// Layout name as written by the author.
    pub layout: String,
    /// Types from `tools:classes`.
    pub classes: Vec<String>,
    /// Widgets in document order, one per id.
    pub widgets: Vec<Widget>,
}

/// Maps a layout element to the managed type it inflates to.
fn widget_type(element: &str) -> String {
    if element.contains('.') {
        return element.to_string();
    }
    let namespace = match element {
        "View" | "ViewGroup" | "SurfaceView" | "TextureView" | "ViewStub" => "Android.Views",
        "WebView" => "Android.Webkit",
        _ => "Android.Widget",
    };
    format!("{namespace}.{element}")
}

/// Extracts the binding of a layout, `None` when its root has no
/// `tools:classes`.
pub fn parse_layout_binding(layout: &str, text: &str) -> Result<Option<LayoutBinding>, XmlError> {
    let doc = roxmltree::Document::parse(text)?;
    let root = doc.root_element();
    let Some(classes) = root.attribute((TOOLS_NS, "classes")) else {
        return Ok(None);
    };
    let classes: Vec<String> = classes
        .split([';', ','])
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(String::from)
        .collect();
    if classes.is_empty() {
        return Ok(None);
    }

    let mut seen = BTreeSet::new();
    let mut widgets = Vec::new();
    for node in root.descendants().filter(|n| n.is_element()) {
        let Some(id) = node
            .attribute((ANDROID_NS, "id"))
            .and_then(|v| v.trim().strip_prefix("@+id/"))
        else {
            continue;
        };
        let tag = node.tag_name().name();
        if matches!(tag, "include" | "merge") || !seen.insert(id.to_string()) {
            continue;
        }
        let fragment = tag == "fragment";
        let type_name = if fragment || tag == "view" {
            let Some(class) = node.attribute((ANDROID_NS, "name")).or_else(|| node.attribute("class")) else {
                continue;
            };
            class.to_string()
        } else {
            widget_type(tag)
        };
        widgets.push(Widget {
            id: id.to_string(),
            type_name,
            fragment,
        });
    }
    Ok(Some(LayoutBinding {
        layout: layout.to_string(),
        classes,
        widgets,
    }))
}

/// Renders `<Layout>.g.cs`. `namespace` is the designer namespace whose
/// `Resource.Id` holds the widget ids.
pub fn render_binding(binding: &LayoutBinding, namespace: &str) -> String {
    let class = field_name(&binding.layout);
    let mut out = String::new();
    out.push_str("// <auto-generated>\n//     Generated by andpack from layout ");
    out.push_str(&binding.layout);
    out.push_str(".\n// </auto-generated>\n\n");
    out.push_str("namespace Binding\n{\n");
    out.push_str(&format!(
        "\tsealed partial class {class} : global::Xamarin.Android.Design.LayoutBinding\n\t{{\n"
    ));
    out.push_str(&format!(
        "\t\tpublic {class} (global::Android.App.Activity client) : base (client) {{ }}\n"
    ));
    out.push_str(&format!(
        "\t\tpublic {class} (global::Android.Views.View client) : base (client) {{ }}\n"
    ));
    for widget in &binding.widgets {
        let property = field_name(&widget.id);
        let finder = if widget.fragment { "FindFragment" } else { "FindView" };
        out.push_str(&format!("\n\t\tglobal::{} __{property};\n", widget.type_name));
        out.push_str(&format!(
            "\t\tpublic global::{ty} {property} => {finder} (global::{namespace}.Resource.Id.{property}, ref __{property});\n",
            ty = widget.type_name
        ));
    }
    out.push_str("\t}\n}\n");
    for full in &binding.classes {
        let (ns, name) = match full.rsplit_once('.') {
            Some((ns, name)) => (Some(ns), name),
            None => (None, full.as_str()),
        };
        out.push('\n');
        let indent = if ns.is_some() { "\t" } else { "" };
        if let Some(ns) = ns {
            out.push_str(&format!("namespace {ns}\n{{\n"));
        }
        out.push_str(&format!("{indent}partial class {name}\n{indent}{{\n"));
        out.push_str(&format!(
            "{indent}\tglobal::Binding.{class} __{class}_binding;\n"
        ));
        out.push_str(&format!("{indent}}}\n"));
        if ns.is_some() {
            out.push_str("}\n");
        }
    }
    out
}

/// Files written by [`generate_bindings`].
#[derive(Debug, Clone, Default)]
pub struct BindingReport {
    /// Files created or rewritten.
    pub written: Vec<PathBuf>,
    /// Files left alone because their content was unchanged.
    pub unchanged: usize,
    /// Stale files deleted.
    pub removed: Vec<PathBuf>,
}

/// Writes a binding for every base `layout/` file of `tree` that asks for
/// one into `out_dir`, removing bindings of layouts that no longer do.
pub fn generate_bindings(
    tree: &MergedResourceTree,
    namespace: &str,
    out_dir: &Path,
    mode: GenerationMode,
    sink: &DiagnosticSink,
) -> Result<BindingReport, DesignerError> {
    let mut report = BindingReport::default();
    let mut known = BTreeSet::new();
    for entry in tree.iter().filter(|e| e.output.first_segment() == "layout") {
        let source = &entry.item.source;
        let text = std::fs::read_to_string(source).map_err(|e| DesignerError::io(source, e))?;
        let layout = resource_name(entry.item.logical.file_name());
        let binding = match parse_layout_binding(layout, &text) {
            Ok(Some(binding)) => binding,
            Ok(None) => continue,
            Err(err) => {
                if mode == GenerationMode::DesignTime {
                    sink.emit(
                        Diagnostic::warning(
                            codes::DESIGNER_PARSE_SKIPPED,
                            format!("Could not generate code-behind: {}", err.message),
                        )
                        .at(Location::at(source, err.line, err.column))
                        .for_project(&entry.item.origin.project),
                    );
                }
                continue;
            }
        };
        let path = out_dir.join(format!("{}.g.cs", field_name(&binding.layout)));
        if write_if_changed(&path, render_binding(&binding, namespace).as_bytes())
            .map_err(|e| DesignerError::io(&path, e))?
        {
            report.written.push(path.clone());
        } else {
            report.unchanged += 1;
        }
        known.insert(path);
    }
    report.removed = remove_unknown_files(out_dir, &known).map_err(|e| DesignerError::io(out_dir, e))?;
    Ok(report)
}
