//! Which targets a project build runs, and running them.

use andpack_cache::{CacheStore, Namespace};
use andpack_config::PackageFormat;
use andpack_diagnostics::DiagnosticSink;

use crate::context::BuildContext;
use crate::engine::{BuildReport, TargetGraph};
use crate::error::BuildError;
use crate::project::Project;
use crate::target::{BuildState, Target};
use crate::targets::assets::{BuildAssetPacks, CreateAssetPackManifests, GenerateAssetsDir};
use crate::targets::designer::{GenerateLayoutBindings, UpdateResgen};
use crate::targets::imports::ResolveImports;
use crate::targets::java::{CompileJava, CompileToDalvik, LinkAssemblies};
use crate::targets::manifest::MergeManifest;
use crate::targets::package::{BuildPackage, CreateLibraryArchive, Sign};
use crate::targets::resources::{CompileResources, GenerateResourceDir};
use crate::targets::*;

/// The full build of `project`.
///
/// Applications end with a signed APK or bundle; libraries end with an
/// `.aar` and never dex or package.
pub fn full_graph(project: &Project) -> Result<TargetGraph, BuildError> {
    let mut graph = TargetGraph::new();
    graph.add(ResolveImports, &[])?;
    graph.add(GenerateResourceDir, &[RESOLVE_IMPORTS])?;
    let mut resgen_deps = vec![GENERATE_RESOURCE_DIR];
    if project.config.tools.resource_compiler.is_some() {
        graph.add(CompileResources, &[GENERATE_RESOURCE_DIR])?;
        resgen_deps.push(COMPILE_RESOURCES);
    }
    graph.add(UpdateResgen, &resgen_deps)?;
    graph.add(GenerateLayoutBindings, &[GENERATE_RESOURCE_DIR])?;
    graph.add(GenerateAssetsDir, &[RESOLVE_IMPORTS])?;
    graph.add(MergeManifest, &[RESOLVE_IMPORTS])?;
    graph.add(CompileJava, &[UPDATE_RESGEN])?;

    if project.is_library() {
        graph.add(
            CreateLibraryArchive,
            &[
                GENERATE_RESOURCE_DIR,
                UPDATE_RESGEN,
                GENERATE_ASSETS_DIR,
                MERGE_MANIFEST,
                COMPILE_JAVA,
            ],
        )?;
        return Ok(graph);
    }

    let format = project.package_format();
    let mut package_deps = vec![
        GENERATE_RESOURCE_DIR,
        UPDATE_RESGEN,
        GENERATE_LAYOUT_BINDINGS,
        GENERATE_ASSETS_DIR,
        MERGE_MANIFEST,
        COMPILE_TO_DALVIK,
        LINK_ASSEMBLIES,
    ];
    if format == PackageFormat::Aab {
        graph.add(CreateAssetPackManifests, &[GENERATE_ASSETS_DIR])?;
        graph.add(BuildAssetPacks, &[CREATE_ASSET_PACK_MANIFESTS])?;
        package_deps.push(BUILD_ASSET_PACKS);
    }
    graph.add(CompileToDalvik, &[COMPILE_JAVA])?;
    graph.add(LinkAssemblies, &[])?;
    let package = BuildPackage::new(format);
    let package_name = package.name();
    graph.add(package, &package_deps)?;
    graph.add(Sign, &[package_name])?;
    Ok(graph)
}

/// The design-time pass: designer and bindings only, straight from source.
pub fn design_time_graph() -> Result<TargetGraph, BuildError> {
    let mut graph = TargetGraph::new();
    graph.add(ResolveImports, &[])?;
    graph.add(UpdateResgen, &[RESOLVE_IMPORTS])?;
    graph.add(GenerateLayoutBindings, &[UPDATE_RESGEN])?;
    Ok(graph)
}

/// Builds one project.
///
/// Build properties are compared first: when the tool version or a
/// build-wide setting changed, every record of the namespace is dropped so
/// all targets run. Diagnostics end up in the report; an `Err` means the
/// build could not proceed at all.
pub fn build_project(project: &Project, context: &BuildContext, namespace: Namespace) -> Result<BuildReport, BuildError> {
    let store = CacheStore::open(&project.intermediate(), namespace);
    let changed = store.sync_build_props(&project.build_props())?;
    if !changed.is_empty() {
        tracing::info!(changed = %changed.join(", "), "build properties changed; rebuilding everything");
    }

    let graph = match namespace {
        Namespace::Full => full_graph(project)?,
        Namespace::DesignTime => design_time_graph()?,
    };
    let sink = DiagnosticSink::new();
    let mut state = BuildState::new(project, context, &sink, namespace);
    let targets = graph.run(&store, &mut state)?;

    let diagnostics = sink.take_all();
    let succeeded = !diagnostics.iter().any(|d| d.severity.is_error());
    Ok(BuildReport {
        project: project.name().to_string(),
        targets,
        diagnostics,
        succeeded,
    })
}

/// Removes build outputs.
///
/// A design-time clean only drops `<intermediate>/designtime`; a full clean
/// removes the intermediate and output directories.
pub fn clean_project(project: &Project, namespace: Namespace) -> Result<(), BuildError> {
    match namespace {
        Namespace::DesignTime => {
            CacheStore::open(&project.intermediate(), Namespace::DesignTime).clean()?;
        }
        Namespace::Full => {
            for dir in [project.intermediate(), project.output_dir()] {
                if dir.exists() {
                    std::fs::remove_dir_all(&dir).map_err(|e| BuildError::io(&dir, e))?;
                }
            }
        }
    }
    tracing::info!(project = %project.name(), namespace = ?namespace, "cleaned");
    Ok(())
}
