//! Copying packs into the intermediate directory.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use andpack_common::fs::{copy_if_changed, remove_unknown_files};

use crate::error::AssetError;
use crate::partition::AssetPack;

/// Directory below the intermediate directory holding named packs.
pub const ASSET_PACKS_DIR: &str = "assetpacks";

/// What [`materialize_pack`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackReport {
    /// Files whose content changed.
    pub written: Vec<PathBuf>,
    /// Files left untouched.
    pub unchanged: usize,
    /// Stale files deleted.
    pub removed: Vec<PathBuf>,
}

/// `<intermediate>/assetpacks/<pack>`.
pub fn pack_dir(intermediate: &Path, pack: &str) -> PathBuf {
    intermediate.join(ASSET_PACKS_DIR).join(pack)
}

/// Copies a pack's assets into `assets_dir` and deletes files that no longer
/// belong to it.
pub fn materialize_pack(pack: &AssetPack, assets_dir: &Path) -> Result<PackReport, AssetError> {
    let mut report = PackReport::default();
    let mut known = BTreeSet::new();
    for (logical, source) in &pack.assets {
        let dest = logical.to_path(assets_dir);
        if copy_if_changed(source, &dest).map_err(|e| AssetError::io(&dest, e))? {
            report.written.push(dest.clone());
        } else {
            report.unchanged += 1;
        }
        known.insert(dest);
    }
    report.removed =
        remove_unknown_files(assets_dir, &known).map_err(|e| AssetError::io(assets_dir, e))?;
    tracing::debug!(
        pack = %pack.name,
        written = report.written.len(),
        removed = report.removed.len(),
        "materialised asset pack"
    );
    Ok(report)
}

/// Deletes pack directories under `<intermediate>/assetpacks` whose pack no
/// longer exists. Returns the removed directories.
pub fn remove_stale_packs(
    intermediate: &Path,
    keep: &BTreeSet<String>,
) -> Result<Vec<PathBuf>, AssetError> {
    let root = intermediate.join(ASSET_PACKS_DIR);
    let Ok(entries) = std::fs::read_dir(&root) else {
        return Ok(Vec::new());
    };
    let mut removed = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| AssetError::io(&root, e))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if entry.path().is_dir() && !keep.contains(&name) {
            remove_unknown_files(&entry.path(), &BTreeSet::new())
                .map_err(|e| AssetError::io(entry.path(), e))?;
            std::fs::remove_dir_all(entry.path()).map_err(|e| AssetError::io(entry.path(), e))?;
            removed.push(entry.path());
        }
    }
    removed.sort();
    Ok(removed)
}
