//! One designer pass: symbols in, `R.txt`, `R.java` and designer source out.

use std::path::{Path, PathBuf};

use andpack_cache::ArtifactStore;
use andpack_common::fs::write_if_changed;
use andpack_config::DesignerMode;
use andpack_diagnostics::DiagnosticSink;
use andpack_resources::MergedResourceTree;

use crate::alias::{AliasTable, LibrarySymbols};
use crate::collect::{collect_symbols, GenerationMode};
use crate::designer::{designer_file_name, generate_designer, DesignerOptions};
use crate::error::DesignerError;
use crate::java::{generate_r_java, r_java_path};
use crate::model::DesignerModel;
use crate::parser::ResourceParser;

/// Inputs of a designer pass.
pub struct DesignerRequest<'a> {
    /// The merged tree; design-time passes may pass a tree built straight
    /// from source items.
    pub tree: &'a MergedResourceTree,
    /// XML backend.
    pub parser: &'a dyn ResourceParser,
    /// Parse cache, if any.
    pub cache: Option<&'a ArtifactStore>,
    /// Full or design-time.
    pub mode: GenerationMode,
    /// Designer shape.
    pub options: DesignerOptions<'a>,
    /// Java package for `R.java`; `None` skips it.
    pub package: Option<&'a str>,
    /// Library `R.txt` symbols to alias in assembly mode.
    pub libraries: &'a [LibrarySymbols],
}

/// Rendered outputs of a pass.
#[derive(Debug, Clone)]
pub struct GeneratedDesigner {
    /// The id-assigned symbol table.
    pub model: DesignerModel,
    /// Library redirects; empty in intermediate mode.
    pub aliases: AliasTable,
    /// `R.txt` text.
    pub r_txt: String,
    /// Designer source text.
    pub designer: String,
    /// `(package, R.java text)` when a package was given.
    pub r_java: Option<(String, String)>,
}

/// Where [`GeneratedDesigner::write`] puts things.
#[derive(Debug, Clone)]
pub struct DesignerPaths {
    /// `R.txt`; `None` skips it.
    pub r_txt: Option<PathBuf>,
    /// Directory receiving `Resource.designer.<ext>`.
    pub designer_dir: PathBuf,
    /// Java source root receiving `<package>/R.java`.
    pub java_src: Option<PathBuf>,
}

/// Runs a designer pass without touching the output tree.
pub fn generate(request: &DesignerRequest<'_>, sink: &DiagnosticSink) -> Result<GeneratedDesigner, DesignerError> {
    let collection = collect_symbols(request.tree, request.parser, request.cache, request.mode, sink)?;
    let model = DesignerModel::build(&collection.symbols, &collection.display);
    let aliases = match request.options.mode {
        DesignerMode::Assembly => AliasTable::build(request.options.namespace, &model, request.libraries),
        DesignerMode::Intermediate => AliasTable::default(),
    };
    let designer = generate_designer(&model, &aliases, &request.options);
    let r_java = request
        .package
        .map(|package| (package.to_string(), generate_r_java(package, &model)));
    Ok(GeneratedDesigner {
        r_txt: model.to_r_txt(),
        model,
        aliases,
        designer,
        r_java,
    })
}

fn write(path: &Path, text: &str, changed: &mut Vec<PathBuf>) -> Result<(), DesignerError> {
    if write_if_changed(path, text.as_bytes()).map_err(|e| DesignerError::io(path, e))? {
        changed.push(path.to_path_buf());
    }
    Ok(())
}

impl GeneratedDesigner {
    /// Writes every output whose content changed. Read-only files are
    /// unlocked first. Returns the paths actually written.
    pub fn write(&self, paths: &DesignerPaths, options: &DesignerOptions<'_>) -> Result<Vec<PathBuf>, DesignerError> {
        let mut changed = Vec::new();
        if let Some(r_txt) = &paths.r_txt {
            write(r_txt, &self.r_txt, &mut changed)?;
        }
        let designer = paths.designer_dir.join(designer_file_name(options.language));
        write(&designer, &self.designer, &mut changed)?;
        if let (Some(src), Some((package, text))) = (&paths.java_src, &self.r_java) {
            write(&r_java_path(src, package), text, &mut changed)?;
        }
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ManagedParser;
    use andpack_config::{DesignerLanguage, FileNameCheck};
    use andpack_resources::{collect_dir_items, merge, MergeOptions, ResourceOrigin};

    fn tree(res: &Path) -> MergedResourceTree {
        let items = collect_dir_items(res, &ResourceOrigin::app("AppA")).unwrap();
        let options = MergeOptions {
            max_api_level: 34,
            lowercase_file_names: true,
            file_name_check: FileNameCheck::Error,
        };
        merge(items, Vec::new(), &options, &DiagnosticSink::new()).unwrap()
    }

    #[test]
    fn unchanged_outputs_are_not_rewritten() {
        let dir = tempfile::tempdir().unwrap();
        let res = dir.path().join("Resources");
        std::fs::create_dir_all(res.join("values")).unwrap();
        std::fs::write(res.join("values/strings.xml"), r#"<resources><string name="hello">Hi</string></resources>"#).unwrap();
        let tree = tree(&res);
        let options = DesignerOptions {
            namespace: "AppA",
            mode: DesignerMode::Intermediate,
            language: DesignerLanguage::CSharp,
        };
        let request = DesignerRequest {
            tree: &tree,
            parser: &ManagedParser,
            cache: None,
            mode: GenerationMode::Full,
            options,
            package: Some("com.example.appa"),
            libraries: &[],
        };
        let out = dir.path().join("obj");
        let paths = DesignerPaths {
            r_txt: Some(out.join("R.txt")),
            designer_dir: out.clone(),
            java_src: Some(out.join("android/src")),
        };
        let sink = DiagnosticSink::new();
        let first = generate(&request, &sink).unwrap();
        assert_eq!(first.write(&paths, &options).unwrap().len(), 3);
        assert!(out.join("android/src/com/example/appa/R.java").is_file());
        assert_eq!(
            std::fs::read_to_string(out.join("R.txt")).unwrap(),
            "int string hello 0x7f010000\n"
        );

        let second = generate(&request, &sink).unwrap();
        assert!(second.write(&paths, &options).unwrap().is_empty());
    }

    #[test]
    fn read_only_designer_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let res = dir.path().join("Resources");
        std::fs::create_dir_all(res.join("layout")).unwrap();
        std::fs::write(res.join("layout/Main.xml"), "<LinearLayout/>").unwrap();
        let tree = tree(&res);
        let options = DesignerOptions {
            namespace: "AppA",
            mode: DesignerMode::Intermediate,
            language: DesignerLanguage::CSharp,
        };
        let designer = dir.path().join(designer_file_name(DesignerLanguage::CSharp));
        std::fs::write(&designer, "stale").unwrap();
        let mut perms = std::fs::metadata(&designer).unwrap().permissions();
        perms.set_readonly(true);
        std::fs::set_permissions(&designer, perms).unwrap();

        let request = DesignerRequest {
            tree: &tree,
            parser: &ManagedParser,
            cache: None,
            mode: GenerationMode::Full,
            options,
            package: None,
            libraries: &[],
        };
        let paths = DesignerPaths {
            r_txt: None,
            designer_dir: dir.path().to_path_buf(),
            java_src: None,
        };
        let generated = generate(&request, &DiagnosticSink::new()).unwrap();
        assert_eq!(generated.write(&paths, &options).unwrap(), vec![designer.clone()]);
        assert!(std::fs::read_to_string(&designer).unwrap().contains("public const int Main ="));
    }
}
