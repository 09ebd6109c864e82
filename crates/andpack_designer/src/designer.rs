//! `Resource.designer.{cs,fs}` generation.
//!
//! In intermediate mode every constant lives in nested partial classes of
//! `<namespace>.Resource`. In assembly mode the constants move to
//! `_Microsoft.Android.Resource.Designer.ResourceConstant`, `Resource`
//! derives from it, and `UpdateIdValues` redirects library fields.

use andpack_config::{DesignerLanguage, DesignerMode};

use crate::alias::AliasTable;
use crate::kind::nested_type_name;
use crate::model::DesignerModel;

const CONSTANT_NAMESPACE: &str = "_Microsoft.Android.Resource.Designer";
const CONSTANT_CLASS: &str = "ResourceConstant";
const HEADER: &str = "This code was generated by andpack.\nChanges to this file will be lost when the code is regenerated.";

/// What to generate.
#[derive(Debug, Clone, Copy)]
pub struct DesignerOptions<'a> {
    /// Namespace of the `Resource` class.
    pub namespace: &'a str,
    /// Intermediate file or designer assembly.
    pub mode: DesignerMode,
    /// Output language.
    pub language: DesignerLanguage,
}

/// `Resource.designer.cs` or `Resource.designer.fs`.
pub fn designer_file_name(language: DesignerLanguage) -> String {
    format!("Resource.designer.{}", language.extension())
}

/// Indenting line writer shared by both languages.
struct SourceWriter {
    out: String,
    depth: usize,
    indent: &'static str,
}

impl SourceWriter {
    fn new(indent: &'static str) -> Self {
        Self {
            out: String::new(),
            depth: 0,
            indent,
        }
    }

    fn line(&mut self, text: &str) {
        if !text.is_empty() {
            for _ in 0..self.depth {
                self.out.push_str(self.indent);
            }
            self.out.push_str(text);
        }
        self.out.push('\n');
    }

    fn open(&mut self, header: &str) {
        self.line(header);
        self.line("{");
        self.depth += 1;
    }

    fn close(&mut self) {
        self.depth = self.depth.saturating_sub(1);
        self.line("}");
    }
}

/// Renders the designer source.
pub fn generate_designer(model: &DesignerModel, aliases: &AliasTable, options: &DesignerOptions<'_>) -> String {
    match options.language {
        DesignerLanguage::CSharp => csharp(model, aliases, options),
        DesignerLanguage::FSharp => fsharp(model, aliases, options),
    }
}

fn csharp_constants(w: &mut SourceWriter, model: &DesignerModel) {
    for (kind, symbols) in model.kinds() {
        w.open(&format!("public partial class {}", nested_type_name(kind)));
        for symbol in symbols {
            w.line(&format!("// aapt resource value: 0x{:08X}", symbol.id));
            w.line(&format!("public const int {} = {};", symbol.display, symbol.id));
        }
        w.close();
    }
    if model.styleables().is_empty() {
        return;
    }
    w.open("public partial class Styleable");
    for styleable in model.styleables() {
        let ids: Vec<String> = styleable.attrs.iter().map(|(_, id)| format!("0x{id:08X}")).collect();
        w.line(&format!(
            "public static int[] {} = new int[] {{ {} }};",
            styleable.name,
            ids.join(", ")
        ));
        for (field, index) in styleable.index_fields() {
            w.line(&format!("public const int {field} = {index};"));
        }
    }
    w.close();
}

fn csharp(model: &DesignerModel, aliases: &AliasTable, options: &DesignerOptions<'_>) -> String {
    let mut w = SourceWriter::new("\t");
    w.line("#pragma warning disable 1591");
    for line in HEADER.lines() {
        w.line(&format!("// {line}"));
    }
    w.line("");
    match options.mode {
        DesignerMode::Intermediate => {
            w.open(&format!("namespace {}", options.namespace));
            w.open("public partial class Resource");
            csharp_constants(&mut w, model);
            w.close();
            w.close();
        }
        DesignerMode::Assembly => {
            w.open(&format!("namespace {CONSTANT_NAMESPACE}"));
            w.open(&format!("public partial class {CONSTANT_CLASS}"));
            csharp_constants(&mut w, model);
            w.close();
            w.close();
            w.line("");
            w.open(&format!("namespace {}", options.namespace));
            w.open(&format!(
                "public partial class Resource : global::{CONSTANT_NAMESPACE}.{CONSTANT_CLASS}"
            ));
            w.open("public static void UpdateIdValues()");
            for alias in aliases.iter() {
                let nested = nested_type_name(&alias.kind);
                w.line(&format!(
                    "global::{}.Resource.{nested}.{field} = global::{}.Resource.{nested}.{field};",
                    alias.library,
                    options.namespace,
                    field = alias.field
                ));
            }
            w.close();
            w.close();
            w.close();
        }
    }
    w.out
}

fn fsharp_constants(w: &mut SourceWriter, model: &DesignerModel) {
    for (kind, symbols) in model.kinds() {
        w.line(&format!("module {} =", nested_type_name(kind)));
        w.depth += 1;
        for symbol in symbols {
            w.line("[<Literal>]");
            w.line(&format!("let {} = 0x{:08x}", symbol.display, symbol.id));
        }
        w.depth -= 1;
    }
    if model.styleables().is_empty() {
        return;
    }
    w.line("module Styleable =");
    w.depth += 1;
    for styleable in model.styleables() {
        let ids: Vec<String> = styleable.attrs.iter().map(|(_, id)| format!("0x{id:08x}")).collect();
        w.line(&format!("let {} = [| {} |]", styleable.name, ids.join("; ")));
        for (field, index) in styleable.index_fields() {
            w.line("[<Literal>]");
            w.line(&format!("let {field} = {index}"));
        }
    }
    w.depth -= 1;
}

fn fsharp(model: &DesignerModel, aliases: &AliasTable, options: &DesignerOptions<'_>) -> String {
    let mut w = SourceWriter::new("    ");
    for line in HEADER.lines() {
        w.line(&format!("// {line}"));
    }
    w.line("");
    match options.mode {
        DesignerMode::Intermediate => {
            w.line(&format!("namespace {}", options.namespace));
            w.line("");
            w.line("module Resource =");
            w.depth += 1;
            fsharp_constants(&mut w, model);
            w.depth -= 1;
        }
        DesignerMode::Assembly => {
            w.line(&format!("namespace {CONSTANT_NAMESPACE}"));
            w.line("");
            w.line(&format!("module {CONSTANT_CLASS} ="));
            w.depth += 1;
            fsharp_constants(&mut w, model);
            w.depth -= 1;
            w.line("");
            w.line(&format!("namespace {}", options.namespace));
            w.line("");
            w.line("module Resource =");
            w.depth += 1;
            let styleables = (!model.styleables().is_empty()).then_some("styleable");
            for kind in model.kinds().map(|(k, _)| k).chain(styleables) {
                let nested = nested_type_name(kind);
                w.line(&format!(
                    "module {nested} = global.{CONSTANT_NAMESPACE}.{CONSTANT_CLASS}.{nested}"
                ));
            }
            w.line("let UpdateIdValues () =");
            w.depth += 1;
            for alias in aliases.iter() {
                let nested = nested_type_name(&alias.kind);
                w.line(&format!(
                    "global.{}.Resource.{nested}.{field} <- global.{}.Resource.{nested}.{field}",
                    alias.library,
                    options.namespace,
                    field = alias.field
                ));
            }
            w.line("()");
            w.depth -= 1;
            w.depth -= 1;
        }
    }
    w.out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alias::LibrarySymbols;
    use crate::symbols::FileSymbols;
    use std::collections::BTreeMap;

    fn model() -> DesignerModel {
        let mut symbols = FileSymbols::default();
        symbols.insert("drawable", "icon");
        symbols.insert("string", "hello");
        symbols.insert_styleable("MyView", vec!["shade".into()]);
        DesignerModel::build(&symbols, &BTreeMap::new())
    }

    fn options(mode: DesignerMode, language: DesignerLanguage) -> DesignerOptions<'static> {
        DesignerOptions {
            namespace: "AppA",
            mode,
            language,
        }
    }

    #[test]
    fn intermediate_csharp_nests_constants_under_resource() {
        let text = generate_designer(
            &model(),
            &AliasTable::default(),
            &options(DesignerMode::Intermediate, DesignerLanguage::CSharp),
        );
        assert!(text.contains("namespace AppA\n{\n\tpublic partial class Resource\n"));
        assert!(text.contains("\t\tpublic partial class Drawable\n"));
        assert!(text.contains(&format!("public const int icon = {};", 0x7f02_0000u32)));
        assert!(text.contains("public static int[] MyView = new int[] { 0x7F010000 };"));
        assert!(text.contains("public const int MyView_shade = 0;"));
        assert!(!text.contains("UpdateIdValues"));
        assert_eq!(text.matches('{').count(), text.matches('}').count());
    }

    #[test]
    fn assembly_mode_redirects_library_fields() {
        let m = model();
        let lib = LibrarySymbols::from_r_txt("LibraryB", "int drawable icon 0x7f010000\n");
        let aliases = AliasTable::build("AppA", &m, &[lib]);
        let text = generate_designer(&m, &aliases, &options(DesignerMode::Assembly, DesignerLanguage::CSharp));
        assert!(text.contains("namespace _Microsoft.Android.Resource.Designer"));
        assert!(text.contains(
            "public partial class Resource : global::_Microsoft.Android.Resource.Designer.ResourceConstant"
        ));
        assert!(text.contains(
            "global::LibraryB.Resource.Drawable.icon = global::AppA.Resource.Drawable.icon;"
        ));
    }

    #[test]
    fn fsharp_uses_literal_modules() {
        let m = model();
        let text = generate_designer(
            &m,
            &AliasTable::default(),
            &options(DesignerMode::Intermediate, DesignerLanguage::FSharp),
        );
        assert!(text.contains("namespace AppA\n\nmodule Resource =\n    module Attribute =\n"));
        assert!(text.contains("\n    module Drawable =\n"));
        assert!(text.contains("        [<Literal>]\n        let icon = 0x7f020000\n"));
        assert!(text.contains("let MyView = [| 0x7f010000 |]"));

        let lib = LibrarySymbols::from_r_txt("LibraryB", "int string hello 0x7f010000\n");
        let aliases = AliasTable::build("AppA", &m, &[lib]);
        let text = generate_designer(&m, &aliases, &options(DesignerMode::Assembly, DesignerLanguage::FSharp));
        assert!(text.contains(
            "module String = global._Microsoft.Android.Resource.Designer.ResourceConstant.String"
        ));
        assert!(text.contains(
            "global.LibraryB.Resource.String.hello <- global.AppA.Resource.String.hello"
        ));
    }

    #[test]
    fn file_names_follow_language() {
        assert_eq!(designer_file_name(DesignerLanguage::CSharp), "Resource.designer.cs");
        assert_eq!(designer_file_name(DesignerLanguage::FSharp), "Resource.designer.fs");
    }
}
