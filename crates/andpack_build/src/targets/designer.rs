//! `_UpdateAndroidResgen` and `_GenerateLayoutBindings`, for full and
//! design-time builds.

use std::path::PathBuf;

use andpack_cache::{ArtifactStore, Namespace, TargetInputs};
use andpack_designer::{
    designer_file_name, generate, generate_bindings, parser_for, r_java_path, DesignerOptions, DesignerPaths,
    DesignerRequest, GenerationMode, LibrarySymbols, GENERATED_DIR,
};
use andpack_diagnostics::DiagnosticSink;
use andpack_resources::{merge, MergedResourceTree};

use crate::error::BuildError;
use crate::target::{BuildState, Target};

use super::resources::{collect_items, item_sources, merge_options};
use super::{files_under, merged_tree, GENERATE_LAYOUT_BINDINGS, UPDATE_RESGEN};

/// Directory of the designer parse cache inside the intermediate directory.
pub const RESOURCE_CACHE_DIR: &str = "resourcecache";

fn library_symbols(state: &BuildState<'_>) -> Result<Vec<LibrarySymbols>, BuildError> {
    let mut libraries = Vec::new();
    for library in &state.imports.libraries {
        let Some(r_txt) = &library.r_txt else {
            continue;
        };
        let text = std::fs::read_to_string(r_txt).map_err(|e| BuildError::io(r_txt, e))?;
        let namespace = library.namespace.as_deref().unwrap_or(&library.name);
        libraries.push(LibrarySymbols::from_r_txt(namespace, &text));
    }
    Ok(libraries)
}

fn library_r_txts(state: &BuildState<'_>) -> Vec<PathBuf> {
    state.imports.libraries.iter().filter_map(|l| l.r_txt.clone()).collect()
}

fn designer_inputs(state: &BuildState<'_>, sources: Vec<PathBuf>) -> TargetInputs {
    TargetInputs::new()
        .files(sources)
        .files(library_r_txts(state))
        .property("namespace", state.project.namespace())
        .property("package", state.project.package())
}

/// Generates the designer for the current tree.
///
/// Full builds read the merged tree and also write `R.txt` and `R.java`.
/// Design-time builds merge the source items themselves, quietly, and write
/// only `designtime/Resource.designer.*`.
pub struct UpdateResgen;

impl UpdateResgen {
    fn design_time_tree(state: &BuildState<'_>) -> Result<MergedResourceTree, BuildError> {
        let quiet = DiagnosticSink::new();
        let tree = merge(
            state.own_resources.clone(),
            state.imported_resources.clone(),
            &merge_options(state),
            &quiet,
        )?;
        tracing::debug!(
            suppressed = quiet.take_all().len(),
            "design-time merge diagnostics suppressed"
        );
        Ok(tree)
    }
}

impl Target for UpdateResgen {
    fn name(&self) -> &'static str {
        UPDATE_RESGEN
    }

    fn inputs(&self, state: &mut BuildState<'_>) -> Result<TargetInputs, BuildError> {
        let sources = match state.namespace {
            Namespace::Full => merged_tree(state)?.sources(),
            Namespace::DesignTime => {
                collect_items(state, &DiagnosticSink::new())?;
                item_sources(state)
            }
        };
        Ok(designer_inputs(state, sources))
    }

    fn execute(&self, state: &mut BuildState<'_>) -> Result<Vec<PathBuf>, BuildError> {
        let project = state.project;
        let build = &project.build;
        let namespace = project.namespace();
        let package = project.package();
        let options = DesignerOptions {
            namespace: &namespace,
            mode: build.designer,
            language: build.language,
        };
        let parser = parser_for(build.resource_parser);
        let cache = ArtifactStore::new(
            &project.intermediate().join(RESOURCE_CACHE_DIR),
            env!("CARGO_PKG_VERSION"),
        );
        let libraries = library_symbols(state)?;
        let ns_dir = state.namespace_dir();

        let (tree, mode, paths) = match state.namespace {
            Namespace::Full => {
                let paths = DesignerPaths {
                    r_txt: Some(project.r_txt()),
                    designer_dir: ns_dir.clone(),
                    java_src: Some(project.java_src_out()),
                };
                (merged_tree(state)?.clone(), GenerationMode::Full, paths)
            }
            Namespace::DesignTime => {
                let paths = DesignerPaths {
                    r_txt: None,
                    designer_dir: ns_dir.clone(),
                    java_src: None,
                };
                (Self::design_time_tree(state)?, GenerationMode::DesignTime, paths)
            }
        };

        let request = DesignerRequest {
            tree: &tree,
            parser: parser.as_ref(),
            cache: Some(&cache),
            mode,
            options,
            package: paths.java_src.as_ref().map(|_| package.as_str()),
            libraries: &libraries,
        };
        let generated = generate(&request, state.sink)?;
        let written = generated.write(&paths, &options)?;
        tracing::debug!(written = written.len(), "designer outputs updated");

        let mut outputs = vec![ns_dir.join(designer_file_name(build.language))];
        if let Some(r_txt) = &paths.r_txt {
            outputs.push(r_txt.clone());
        }
        if let Some(src) = &paths.java_src {
            outputs.push(r_java_path(src, &package));
        }
        if state.namespace == Namespace::DesignTime {
            tree.save(&ns_dir)?;
            state.tree = Some(tree);
        }
        Ok(outputs)
    }

    fn restore(&self, state: &mut BuildState<'_>) -> Result<bool, BuildError> {
        if state.namespace == Namespace::DesignTime {
            state.tree = MergedResourceTree::load(&state.namespace_dir());
            return Ok(state.tree.is_some());
        }
        Ok(true)
    }
}

/// Writes `Binding.<Layout>` classes into `<namespace dir>/generated`.
pub struct GenerateLayoutBindings;

fn layout_sources(tree: &MergedResourceTree) -> Vec<PathBuf> {
    tree.iter()
        .filter(|e| e.output.first_segment() == "layout")
        .map(|e| e.item.source.clone())
        .collect()
}

impl Target for GenerateLayoutBindings {
    fn name(&self) -> &'static str {
        GENERATE_LAYOUT_BINDINGS
    }

    fn inputs(&self, state: &mut BuildState<'_>) -> Result<TargetInputs, BuildError> {
        let layouts = layout_sources(merged_tree(state)?);
        Ok(TargetInputs::new()
            .files(layouts)
            .property("namespace", state.project.namespace()))
    }

    fn execute(&self, state: &mut BuildState<'_>) -> Result<Vec<PathBuf>, BuildError> {
        let mode = match state.namespace {
            Namespace::Full => GenerationMode::Full,
            Namespace::DesignTime => GenerationMode::DesignTime,
        };
        let out_dir = state.namespace_dir().join(GENERATED_DIR);
        let report = generate_bindings(
            merged_tree(state)?,
            &state.project.namespace(),
            &out_dir,
            mode,
            state.sink,
        )?;
        tracing::debug!(
            written = report.written.len(),
            removed = report.removed.len(),
            "layout bindings updated"
        );
        files_under(&out_dir)
    }
}
