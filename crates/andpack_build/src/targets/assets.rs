//! `_GenerateAndroidAssetsDir`, `_CreateAssetPackManifests` and
//! `_BuildAssetPacks`.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use andpack_assets::{
    check_library_assets, collect_assets, encode_assets_pb, materialize_pack, pack_dir, pack_manifest, partition,
    remove_stale_packs, AssetItem, AssetPartition, ASSETS_PB,
};
use andpack_cache::TargetInputs;
use andpack_common::fs::write_if_changed;
use andpack_config::PackageFormat;

use crate::error::BuildError;
use crate::project::MANIFEST_FILE;
use crate::target::{BuildState, Target};

use super::{BUILD_ASSET_PACKS, CREATE_ASSET_PACK_MANIFESTS, GENERATE_ASSETS_DIR};

/// Own assets first, then each library's, so the project's copy of a path
/// wins over an imported one.
fn collect_items(state: &BuildState<'_>) -> Result<(Vec<AssetItem>, Vec<AssetItem>), BuildError> {
    let project = state.project;
    let own = collect_assets(&project.dir, &project.build.asset_dir, &project.config.assets)?;
    let mut imported = Vec::new();
    for dir in state.imports.libraries.iter().filter_map(|l| l.assets_dir.as_deref()) {
        let (Some(root), Some(name)) = (dir.parent(), dir.file_name()) else {
            continue;
        };
        imported.extend(collect_assets(root, &name.to_string_lossy(), &[])?);
    }
    Ok((own, imported))
}

fn pack_assignments(state: &BuildState<'_>) -> String {
    state
        .project
        .config
        .assets
        .iter()
        .map(|a| {
            format!(
                "{}|{}|{}",
                a.path,
                a.pack.as_deref().unwrap_or(""),
                a.delivery.map(|d| d.to_string()).unwrap_or_default()
            )
        })
        .collect::<Vec<_>>()
        .join(";")
}

fn partition_of<'s>(state: &'s BuildState<'_>) -> Result<&'s AssetPartition, BuildError> {
    state.partition.as_ref().ok_or_else(|| {
        andpack_common::InternalError::new("asset partition is not available").into()
    })
}

/// Partitions assets and writes the base pack to `<intermediate>/assets`.
///
/// APKs have no asset pack modules, so every pack is folded into base.
/// Library projects may not declare packs at all.
pub struct GenerateAssetsDir;

impl Target for GenerateAssetsDir {
    fn name(&self) -> &'static str {
        GENERATE_ASSETS_DIR
    }

    fn inputs(&self, state: &mut BuildState<'_>) -> Result<TargetInputs, BuildError> {
        let project = state.project;
        let (own, imported) = collect_items(state)?;
        if project.is_library() {
            check_library_assets(&own, project.name(), state.sink);
        }
        let items: Vec<AssetItem> = own.into_iter().chain(imported).collect();
        let mut assets = partition(items, project.name(), state.sink);
        if project.is_library() || project.package_format() == PackageFormat::Apk {
            assets = assets.folded();
        }
        // Pack-only assets belong to `_BuildAssetPacks`.
        let mut sources = assets.base().sources();
        sources.dedup();
        let base: Vec<String> = assets.base().assets.keys().map(ToString::to_string).collect();
        state.partition = Some(assets);
        Ok(TargetInputs::new()
            .files(sources)
            .property("assets", pack_assignments(state))
            .property("base", base.join(";")))
    }

    fn execute(&self, state: &mut BuildState<'_>) -> Result<Vec<PathBuf>, BuildError> {
        let out = state.project.assets_out();
        let report = materialize_pack(partition_of(state)?.base(), &out)?;
        tracing::debug!(
            written = report.written.len(),
            removed = report.removed.len(),
            "base assets materialised"
        );
        Ok(partition_of(state)?
            .base()
            .assets
            .keys()
            .map(|logical| logical.to_path(&out))
            .collect())
    }
}

/// Writes `<intermediate>/assetpacks/<pack>/AndroidManifest.xml` for every
/// named pack and removes directories of packs that are gone.
pub struct CreateAssetPackManifests;

impl Target for CreateAssetPackManifests {
    fn name(&self) -> &'static str {
        CREATE_ASSET_PACK_MANIFESTS
    }

    fn inputs(&self, state: &mut BuildState<'_>) -> Result<TargetInputs, BuildError> {
        let packs: Vec<String> = partition_of(state)?
            .named_packs()
            .map(|p| format!("{}={}", p.name, p.delivery))
            .collect();
        Ok(TargetInputs::new()
            .property("packs", packs.join(";"))
            .property("package", state.project.package()))
    }

    fn execute(&self, state: &mut BuildState<'_>) -> Result<Vec<PathBuf>, BuildError> {
        let intermediate = state.project.intermediate();
        let package = state.project.package();
        let assets = partition_of(state)?;
        let removed = remove_stale_packs(&intermediate, &assets.pack_names())?;
        for dir in removed {
            tracing::debug!(dir = %dir.display(), "removed stale asset pack");
        }
        let mut outputs = Vec::new();
        for pack in assets.named_packs() {
            let path = pack_dir(&intermediate, &pack.name).join(MANIFEST_FILE);
            let text = pack_manifest(&package, pack)?;
            write_if_changed(&path, text.as_bytes()).map_err(|e| BuildError::io(&path, e))?;
            outputs.push(path);
        }
        Ok(outputs)
    }
}

/// Copies each named pack's assets to `assetpacks/<pack>/assets` and writes
/// its `assets.pb`. Packs whose content did not change keep their files
/// untouched.
pub struct BuildAssetPacks;

fn pack_listing(assets: &AssetPartition) -> String {
    assets
        .named_packs()
        .flat_map(|p| p.assets.keys().map(move |logical| format!("{}:{logical}", p.name)))
        .collect::<Vec<_>>()
        .join(";")
}

fn write_pack(intermediate: &Path, pack: &andpack_assets::AssetPack) -> Result<Vec<PathBuf>, BuildError> {
    let dir = pack_dir(intermediate, &pack.name);
    let assets_dir = dir.join("assets");
    let report = materialize_pack(pack, &assets_dir)?;
    let pb = dir.join(ASSETS_PB);
    write_if_changed(&pb, &encode_assets_pb(pack)).map_err(|e| BuildError::io(&pb, e))?;
    tracing::debug!(
        pack = %pack.name,
        written = report.written.len(),
        removed = report.removed.len(),
        "asset pack materialised"
    );
    let mut outputs: Vec<PathBuf> = pack.assets.keys().map(|l| l.to_path(&assets_dir)).collect();
    outputs.push(pb);
    Ok(outputs)
}

impl Target for BuildAssetPacks {
    fn name(&self) -> &'static str {
        BUILD_ASSET_PACKS
    }

    fn inputs(&self, state: &mut BuildState<'_>) -> Result<TargetInputs, BuildError> {
        let assets = partition_of(state)?;
        let sources: BTreeSet<PathBuf> = assets.named_packs().flat_map(|p| p.sources()).collect();
        let listing = pack_listing(assets);
        Ok(TargetInputs::new().files(sources).property("assets", listing))
    }

    fn execute(&self, state: &mut BuildState<'_>) -> Result<Vec<PathBuf>, BuildError> {
        let intermediate = state.project.intermediate();
        let mut outputs = Vec::new();
        for pack in partition_of(state)?.named_packs() {
            outputs.extend(write_pack(&intermediate, pack)?);
        }
        Ok(outputs)
    }
}
