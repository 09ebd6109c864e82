//! Asset item discovery.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use andpack_common::fs::list_files;
use andpack_common::LogicalPath;
use andpack_config::{AssetEntry, DeliveryType};
use serde::{Deserialize, Serialize};

use crate::error::AssetError;
use crate::partition::BASE_PACK;

/// One asset file together with the pack metadata declared for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetItem {
    /// Path inside `assets/`.
    pub logical: LogicalPath,
    /// Physical file.
    pub source: PathBuf,
    /// Declared pack. `None` when no `[[assets]]` entry names one.
    pub pack: Option<String>,
    /// Declared delivery type.
    pub delivery: Option<DeliveryType>,
}

impl AssetItem {
    /// Returns `true` when the item was explicitly declared `pack = "base"`.
    pub fn is_explicit_base(&self) -> bool {
        self.pack.as_deref() == Some(BASE_PACK)
    }

    /// The named pack this item asks for, if any.
    pub fn named_pack(&self) -> Option<&str> {
        self.pack.as_deref().filter(|p| *p != BASE_PACK)
    }
}

struct Candidate {
    logical: LogicalPath,
    depth: usize,
    metadata: Vec<(Option<String>, Option<DeliveryType>)>,
}

/// Discovers asset files under `<project>/<asset_dir>` and applies
/// `[[assets]]` metadata.
///
/// An entry path names a file or a directory; for a directory it applies to
/// every file below it. The deepest matching entry wins. Entries outside the
/// asset directory add their files under the entry's own root. A file
/// matched by several entries of the same depth yields one item per distinct
/// pack so that the partitioner can resolve the conflict.
pub fn collect_assets(
    project_dir: &Path,
    asset_dir: &str,
    entries: &[AssetEntry],
) -> Result<Vec<AssetItem>, AssetError> {
    let root = project_dir.join(asset_dir);
    let mut found: BTreeMap<PathBuf, Candidate> = BTreeMap::new();
    for source in list_files(&root).map_err(|e| AssetError::io(&root, e))? {
        let Some(logical) = LogicalPath::relative(&source, &root) else {
            continue;
        };
        if logical.file_name().starts_with('.') {
            continue;
        }
        found.insert(
            source,
            Candidate {
                logical,
                depth: 0,
                metadata: Vec::new(),
            },
        );
    }

    for entry in entries {
        let relative = LogicalPath::new(&entry.path);
        let target = relative.to_path(project_dir);
        let files = if target.is_dir() {
            list_files(&target).map_err(|e| AssetError::io(&target, e))?
        } else if target.is_file() {
            vec![target.clone()]
        } else {
            tracing::debug!(path = %target.display(), "asset entry matches no files");
            continue;
        };
        let depth = relative.segments().count();
        let pack = entry.pack.clone().filter(|p| !p.is_empty());
        for source in files {
            let candidate = found.entry(source.clone()).or_insert_with(|| Candidate {
                logical: linked_logical(&source, &root, &target),
                depth: 0,
                metadata: Vec::new(),
            });
            if depth > candidate.depth {
                candidate.depth = depth;
                candidate.metadata.clear();
            }
            if depth == candidate.depth && !candidate.metadata.contains(&(pack.clone(), entry.delivery)) {
                candidate.metadata.push((pack.clone(), entry.delivery));
            }
        }
    }

    let mut items = Vec::new();
    for (source, candidate) in found {
        if candidate.metadata.is_empty() {
            items.push(AssetItem {
                logical: candidate.logical,
                source,
                pack: None,
                delivery: None,
            });
            continue;
        }
        for (pack, delivery) in candidate.metadata {
            items.push(AssetItem {
                logical: candidate.logical.clone(),
                source: source.clone(),
                pack,
                delivery,
            });
        }
    }
    items.sort_by(|a, b| a.logical.cmp(&b.logical).then_with(|| a.pack.cmp(&b.pack)));
    Ok(items)
}

fn linked_logical(source: &Path, root: &Path, target: &Path) -> LogicalPath {
    LogicalPath::relative(source, root)
        .or_else(|| LogicalPath::relative(source, target).filter(|l| !l.is_empty()))
        .unwrap_or_else(|| {
            let name = source.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
            LogicalPath::new(&name)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, path.to_string_lossy().as_bytes()).unwrap();
    }

    fn entry(path: &str, pack: Option<&str>, delivery: Option<DeliveryType>) -> AssetEntry {
        AssetEntry {
            path: path.into(),
            pack: pack.map(String::from),
            delivery,
        }
    }

    #[test]
    fn plain_assets_have_no_pack() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("Assets/asset1.txt"));
        write(&dir.path().join("Assets/sub/asset2.txt"));
        write(&dir.path().join("Assets/.hidden"));
        let items = collect_assets(dir.path(), "Assets", &[]).unwrap();
        let logical: Vec<&str> = items.iter().map(|i| i.logical.as_str()).collect();
        assert_eq!(logical, vec!["asset1.txt", "sub/asset2.txt"]);
        assert!(items.iter().all(|i| i.pack.is_none()));
    }

    #[test]
    fn deepest_entry_wins() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("Assets/packed/a.txt"));
        write(&dir.path().join("Assets/packed/b.txt"));
        let entries = vec![
            entry("Assets/packed", Some("assetpack1"), Some(DeliveryType::OnDemand)),
            entry("Assets\\packed\\b.txt", Some("base"), None),
        ];
        let items = collect_assets(dir.path(), "Assets", &entries).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].named_pack(), Some("assetpack1"));
        assert_eq!(items[0].delivery, Some(DeliveryType::OnDemand));
        assert!(items[1].is_explicit_base());
    }

    #[test]
    fn same_depth_entries_produce_one_item_each() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("Assets/a.txt"));
        let entries = vec![
            entry("Assets/a.txt", Some("assetpack1"), None),
            entry("Assets/a.txt", Some("base"), None),
            entry("Assets/a.txt", Some("assetpack1"), None),
        ];
        let items = collect_assets(dir.path(), "Assets", &entries).unwrap();
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn linked_files_outside_asset_dir() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("Shared/asset1.txt"));
        write(&dir.path().join("Shared/SubDirectory/asset3.txt"));
        write(&dir.path().join("Other/single.txt"));
        let entries = vec![
            entry("Shared", Some("assetpack1"), None),
            entry("Other/single.txt", None, None),
        ];
        let items = collect_assets(dir.path(), "Assets", &entries).unwrap();
        let logical: Vec<&str> = items.iter().map(|i| i.logical.as_str()).collect();
        assert_eq!(logical, vec!["SubDirectory/asset3.txt", "asset1.txt", "single.txt"]);
    }
}
