//! `_GenerateAndroidResourceDir` and `_CompileResources`.

use std::ffi::OsString;
use std::path::PathBuf;

use andpack_cache::TargetInputs;
use andpack_diagnostics::{codes, DiagnosticSink};
use andpack_resources::{
    collect_dir_items, collect_project_items, materialize, merge, validate_references, CustomViewMap, MergeOptions,
    MergedResourceTree, ResourceOrigin, RewriteRules, SymbolTable, CASE_MAP_FILE, RESOURCE_PATHS_FILE,
};

use crate::error::BuildError;
use crate::target::{BuildState, Target};
use crate::tool::{SourceMap, ToolCommand, ToolRunner};

use super::{files_under, merged_tree, COMPILE_RESOURCES, GENERATE_RESOURCE_DIR};

/// Collects the project's own items and every imported library's items into
/// `state`, reporting into `sink`.
pub(crate) fn collect_items(state: &mut BuildState<'_>, sink: &DiagnosticSink) -> Result<(), BuildError> {
    let project = state.project;
    state.own_resources = collect_project_items(
        &project.dir,
        &project.build.resource_dir,
        &project.config.resources,
        &ResourceOrigin::app(project.name()),
        sink,
    )?;
    let mut imported = Vec::new();
    for (index, (library, dir)) in state.imports.res_dirs().enumerate() {
        imported.extend(collect_dir_items(dir, &ResourceOrigin::library(&library.name, index))?);
    }
    state.imported_resources = imported;
    Ok(())
}

/// Every source file of the collected items.
pub(crate) fn item_sources(state: &BuildState<'_>) -> Vec<PathBuf> {
    state
        .own_resources
        .iter()
        .chain(&state.imported_resources)
        .map(|i| i.source.clone())
        .collect()
}

pub(crate) fn merge_options(state: &BuildState<'_>) -> MergeOptions {
    let build = &state.project.build;
    MergeOptions {
        max_api_level: build.max_api_level,
        lowercase_file_names: build.lowercase_file_names,
        file_name_check: build.file_name_check,
    }
}

/// Managed types of the project and its libraries.
pub(crate) fn managed_types(state: &BuildState<'_>) -> Vec<String> {
    let mut types = state.project.build.managed_types.clone();
    types.extend(state.imports.managed_types());
    types.sort();
    types.dedup();
    types
}

/// Merges own and imported items, checks references, and writes
/// `<intermediate>/res`.
pub struct GenerateResourceDir;

impl Target for GenerateResourceDir {
    fn name(&self) -> &'static str {
        GENERATE_RESOURCE_DIR
    }

    fn inputs(&self, state: &mut BuildState<'_>) -> Result<TargetInputs, BuildError> {
        let sink = state.sink;
        collect_items(state, sink)?;
        let r_txts: Vec<PathBuf> = state.imports.libraries.iter().filter_map(|l| l.r_txt.clone()).collect();
        Ok(TargetInputs::new()
            .files(item_sources(state))
            .files(r_txts)
            .property("managed_types", managed_types(state).join(";")))
    }

    fn execute(&self, state: &mut BuildState<'_>) -> Result<Vec<PathBuf>, BuildError> {
        let project = state.project;
        let tree = merge(
            state.own_resources.clone(),
            state.imported_resources.clone(),
            &merge_options(state),
            state.sink,
        )?;

        let mut library_symbols = SymbolTable::new();
        for r_txt in state.imports.libraries.iter().filter_map(|l| l.r_txt.as_ref()) {
            let text = std::fs::read_to_string(r_txt).map_err(|e| BuildError::io(r_txt, e))?;
            library_symbols.extend_from_r_txt(&text);
        }
        let lowercase = project.build.lowercase_file_names;
        validate_references(&tree, &library_symbols, lowercase, state.sink)?;

        let custom_views = CustomViewMap::new(managed_types(state));
        let rules = RewriteRules {
            lowercase_references: lowercase,
            custom_views: &custom_views,
        };
        let res = project.res_out();
        let report = materialize(&tree, &res, &rules, state.sink)?;
        tracing::debug!(
            written = report.written.len(),
            unchanged = report.unchanged,
            removed = report.removed.len(),
            "resource directory materialised"
        );

        let intermediate = project.intermediate();
        tree.save(&intermediate)?;
        let mut outputs: Vec<PathBuf> = tree.output_paths(&res).into_iter().collect();
        outputs.push(intermediate.join(RESOURCE_PATHS_FILE));
        outputs.push(intermediate.join(CASE_MAP_FILE));
        state.tree = Some(tree);
        Ok(outputs)
    }

    fn restore(&self, state: &mut BuildState<'_>) -> Result<bool, BuildError> {
        state.tree = MergedResourceTree::load(&state.project.intermediate());
        Ok(state.tree.is_some())
    }
}

/// Output of the resource compiler.
const COMPILED_RESOURCES: &str = "compiled_resources.zip";

/// Runs `tools.resource_compiler compile --dir <res> -o <zip>`. Its errors
/// are reported against the original resource files.
pub struct CompileResources;

impl Target for CompileResources {
    fn name(&self) -> &'static str {
        COMPILE_RESOURCES
    }

    fn inputs(&self, state: &mut BuildState<'_>) -> Result<TargetInputs, BuildError> {
        let command = state.project.config.tools.resource_compiler.clone().unwrap_or_default();
        Ok(TargetInputs::new()
            .files(files_under(&state.project.res_out())?)
            .property("resource_compiler", command))
    }

    fn execute(&self, state: &mut BuildState<'_>) -> Result<Vec<PathBuf>, BuildError> {
        let project = state.project;
        let tool = ToolCommand {
            label: "resource compiler",
            command: project.config.tools.resource_compiler.clone().unwrap_or_default(),
            failure: codes::RESOURCE_TOOL_FAILED,
        };
        let res = project.res_out();
        let out = project.intermediate().join(COMPILED_RESOURCES);
        let sources = SourceMap::from_tree(merged_tree(state)?, &res);
        let args: Vec<OsString> = vec![
            "compile".into(),
            "--dir".into(),
            res.into_os_string(),
            "-o".into(),
            out.clone().into_os_string(),
        ];
        let runner = ToolRunner::new(state.context, project.name(), &project.dir, state.sink);
        if runner.run(&tool, &args, &sources) && out.exists() {
            return Ok(vec![out]);
        }
        Ok(Vec::new())
    }
}
