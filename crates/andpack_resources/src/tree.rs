//! The merged resource tree.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use andpack_common::fs::write_if_changed;
use andpack_common::LogicalPath;
use serde::{Deserialize, Serialize};

use crate::dir::ResourceDir;
use crate::error::ResourceError;
use crate::item::ResourceItem;

/// File holding the serialized tree inside the intermediate directory.
pub const RESOURCE_PATHS_FILE: &str = "resourcepaths.cache";

/// File mapping original-case logical paths to output paths.
pub const CASE_MAP_FILE: &str = "case_map.txt";

/// One output file of the merged tree and where it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedEntry {
    /// Path inside `res/` after case folding.
    pub output: LogicalPath,
    /// The winning item.
    pub item: ResourceItem,
    /// Lower-precedence items at the same path. For values files their
    /// surviving entries are folded into the output.
    pub overridden: Vec<ResourceItem>,
    /// Values entries (`kind/name`) dropped from a contributor because a
    /// higher-precedence project declares them.
    pub dropped: BTreeMap<PathBuf, BTreeSet<String>>,
}

impl MergedEntry {
    /// The parsed output directory.
    pub fn dir(&self) -> Option<ResourceDir> {
        ResourceDir::parse(self.output.first_segment()).ok()
    }

    /// Returns `true` for `values*/` files.
    pub fn is_values(&self) -> bool {
        self.output.first_segment().split('-').next() == Some("values")
    }

    /// Every item whose content reaches the output: the winner and, for
    /// values files, the overridden contributors.
    pub fn contributors(&self) -> impl Iterator<Item = &ResourceItem> {
        let folded: &[ResourceItem] = if self.is_values() { &self.overridden } else { &[] };
        std::iter::once(&self.item).chain(folded.iter())
    }
}

/// Mapping from lower-cased resource path to the winning item.
///
/// Keys are unique case-insensitively; iteration is ordered by key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedResourceTree {
    entries: BTreeMap<String, MergedEntry>,
}

impl MergedResourceTree {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up an entry by any-case path.
    pub fn get(&self, path: &str) -> Option<&MergedEntry> {
        self.entries.get(&path.to_lowercase())
    }

    pub(crate) fn get_mut(&mut self, key: &str) -> Option<&mut MergedEntry> {
        self.entries.get_mut(key)
    }

    pub(crate) fn insert(&mut self, entry: MergedEntry) {
        self.entries.insert(entry.output.as_str().to_lowercase(), entry);
    }

    /// Iterates entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = &MergedEntry> {
        self.entries.values()
    }

    /// Number of output files.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the tree has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every source file the tree was built from, including overridden ones.
    pub fn sources(&self) -> Vec<PathBuf> {
        let mut sources: Vec<PathBuf> = self
            .entries
            .values()
            .flat_map(|e| std::iter::once(&e.item).chain(e.overridden.iter()))
            .map(|i| i.source.clone())
            .collect();
        sources.sort();
        sources.dedup();
        sources
    }

    /// Absolute output paths under `res_dir`.
    pub fn output_paths(&self, res_dir: &Path) -> BTreeSet<PathBuf> {
        self.entries.values().map(|e| e.output.to_path(res_dir)).collect()
    }

    /// Renders `case_map.txt`: `original|output` per line.
    pub fn case_map_text(&self) -> String {
        self.entries
            .values()
            .map(|e| format!("{}|{}\n", e.item.logical, e.output))
            .collect()
    }

    /// Writes `resourcepaths.cache` and `case_map.txt` into `dir`.
    pub fn save(&self, dir: &Path) -> Result<(), ResourceError> {
        let json = serde_json::to_string_pretty(self).map_err(|e| ResourceError::Serialization {
            reason: e.to_string(),
        })?;
        let paths = dir.join(RESOURCE_PATHS_FILE);
        write_if_changed(&paths, json.as_bytes()).map_err(|e| ResourceError::io(&paths, e))?;
        let case_map = dir.join(CASE_MAP_FILE);
        write_if_changed(&case_map, self.case_map_text().as_bytes())
            .map_err(|e| ResourceError::io(&case_map, e))?;
        Ok(())
    }

    /// Loads a tree saved by [`save`](Self::save). Missing or corrupt files
    /// yield `None`.
    pub fn load(dir: &Path) -> Option<Self> {
        let text = std::fs::read_to_string(dir.join(RESOURCE_PATHS_FILE)).ok()?;
        serde_json::from_str(&text).ok()
    }
}

/// Parses `case_map.txt` into output path → original path.
pub fn parse_case_map(text: &str) -> BTreeMap<String, String> {
    text.lines()
        .filter_map(|line| line.split_once('|'))
        .map(|(original, output)| (output.to_string(), original.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ResourceOrigin;

    fn entry(original: &str, source: &str) -> MergedEntry {
        let logical = LogicalPath::new(original);
        MergedEntry {
            output: logical.to_lowercase(),
            item: ResourceItem {
                logical,
                source: PathBuf::from(source),
                origin: ResourceOrigin::app("App1"),
            },
            overridden: Vec::new(),
            dropped: BTreeMap::new(),
        }
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let mut tree = MergedResourceTree::new();
        tree.insert(entry("drawable/UPPER_image.png", "/p/Resources/drawable/UPPER_image.png"));
        assert!(tree.get("drawable/upper_image.png").is_some());
        assert!(tree.get("DRAWABLE/Upper_Image.PNG").is_some());
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn case_map_roundtrip() {
        let mut tree = MergedResourceTree::new();
        tree.insert(entry("drawable/UPPER_image.png", "/a"));
        tree.insert(entry("layout/Main.xml", "/b"));
        let text = tree.case_map_text();
        assert_eq!(
            text,
            "drawable/UPPER_image.png|drawable/upper_image.png\nlayout/Main.xml|layout/main.xml\n"
        );
        let map = parse_case_map(&text);
        assert_eq!(map["layout/main.xml"], "layout/Main.xml");
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut tree = MergedResourceTree::new();
        tree.insert(entry("values/Strings.xml", "/a"));
        tree.save(dir.path()).unwrap();
        assert_eq!(MergedResourceTree::load(dir.path()), Some(tree));
        assert!(dir.path().join(CASE_MAP_FILE).exists());
    }

    #[test]
    fn values_contributors_include_overridden() {
        let mut values = entry("values/strings.xml", "/app");
        values.overridden.push(ResourceItem {
            logical: LogicalPath::new("values/strings.xml"),
            source: PathBuf::from("/lib"),
            origin: ResourceOrigin::library("Lib1", 0),
        });
        assert_eq!(values.contributors().count(), 2);

        let mut image = entry("drawable/icon.png", "/app");
        image.overridden = values.overridden.clone();
        assert_eq!(image.contributors().count(), 1);
    }
}
