//! The targets of a project build.

pub mod assets;
pub mod designer;
pub mod imports;
pub mod java;
pub mod manifest;
pub mod package;
pub mod resources;

use std::path::PathBuf;

use andpack_common::InternalError;
use andpack_resources::MergedResourceTree;

use crate::error::BuildError;
use crate::target::BuildState;

/// Extracts referenced libraries.
pub const RESOLVE_IMPORTS: &str = "_ResolveLibraryProjectImports";
/// Merges and materialises `res/`.
pub const GENERATE_RESOURCE_DIR: &str = "_GenerateAndroidResourceDir";
/// Runs the configured resource compiler over `res/`.
pub const COMPILE_RESOURCES: &str = "_CompileResources";
/// Writes `R.txt`, `R.java` and the designer.
pub const UPDATE_RESGEN: &str = "_UpdateAndroidResgen";
/// Writes layout code-behind.
pub const GENERATE_LAYOUT_BINDINGS: &str = "_GenerateLayoutBindings";
/// Materialises base `assets/`.
pub const GENERATE_ASSETS_DIR: &str = "_GenerateAndroidAssetsDir";
/// Writes asset pack manifests.
pub const CREATE_ASSET_PACK_MANIFESTS: &str = "_CreateAssetPackManifests";
/// Materialises asset pack contents.
pub const BUILD_ASSET_PACKS: &str = "_BuildAssetPacks";
/// Merges library manifests into the application's.
pub const MERGE_MANIFEST: &str = "_MergeManifest";
/// Compiles Java sources.
pub const COMPILE_JAVA: &str = "_CompileJava";
/// Converts classes to dex.
pub const COMPILE_TO_DALVIK: &str = "_CompileToDalvik";
/// Copies assemblies for packaging.
pub const LINK_ASSEMBLIES: &str = "_LinkAssembliesNoShrink";
/// Writes the APK.
pub const BUILD_APK: &str = "_BuildApk";
/// Writes the app bundle.
pub const BUILD_APP_BUNDLE: &str = "_BuildAppBundle";
/// Signs the package.
pub const SIGN: &str = "_Sign";
/// Writes a library project's `.aar`.
pub const CREATE_LIBRARY_ARCHIVE: &str = "_CreateAndroidLibraryArchive";

/// The merged tree, which a resource target upstream has put in place.
pub(crate) fn merged_tree<'s>(state: &'s BuildState<'_>) -> Result<&'s MergedResourceTree, BuildError> {
    state
        .tree
        .as_ref()
        .ok_or_else(|| InternalError::new("merged resource tree is not available").into())
}

/// Files under `root`, or an I/O error naming it.
pub(crate) fn files_under(root: &std::path::Path) -> Result<Vec<PathBuf>, BuildError> {
    andpack_common::fs::list_files(root).map_err(|e| BuildError::io(root, e))
}
