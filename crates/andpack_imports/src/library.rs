//! What an imported library contributes.

use std::path::{Path, PathBuf};

use andpack_common::ContentHash;
use serde::{Deserialize, Serialize};

/// Metadata file written into every `.aar` andpack creates.
pub const METADATA_FILE: &str = "andpack.json";

/// Contents of `andpack.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryMetadata {
    /// Project name.
    pub name: String,
    /// Designer namespace.
    #[serde(default)]
    pub namespace: Option<String>,
    /// Managed types declared by the library, for custom view rewriting.
    #[serde(default)]
    pub managed_types: Vec<String>,
}

impl LibraryMetadata {
    /// Reads `andpack.json` from an extracted library. Missing or malformed
    /// metadata reads as `None`.
    pub fn load(root: &Path) -> Option<Self> {
        let text = std::fs::read_to_string(root.join(METADATA_FILE)).ok()?;
        serde_json::from_str(&text).ok()
    }
}

/// One resolved reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryImport {
    /// The referenced `.aar` or `.jar`.
    pub archive: PathBuf,
    /// Extraction slot under `lp/`; `None` for plain jars.
    pub slot: Option<usize>,
    /// Content hash of the archive.
    pub hash: ContentHash,
    /// Library name: `andpack.json` name or the archive's file stem.
    pub name: String,
    /// Designer namespace, when the library declares one.
    pub namespace: Option<String>,
    /// Managed types declared by the library.
    pub managed_types: Vec<String>,
    /// Extracted `res/`.
    pub res_dir: Option<PathBuf>,
    /// Extracted `assets/`.
    pub assets_dir: Option<PathBuf>,
    /// Extracted `jni/`.
    pub jni_dir: Option<PathBuf>,
    /// Extracted `AndroidManifest.xml`.
    pub manifest: Option<PathBuf>,
    /// Extracted `R.txt`.
    pub r_txt: Option<PathBuf>,
    /// Class jars: `classes.jar`, `libs/*.jar`, or the archive itself.
    pub jars: Vec<PathBuf>,
}

impl LibraryImport {
    /// Extracted paths that consumers read: `res/`, the manifest and `R.txt`.
    pub fn extracted_outputs(&self) -> Vec<PathBuf> {
        [&self.res_dir, &self.manifest, &self.r_txt]
            .into_iter()
            .flatten()
            .cloned()
            .collect()
    }
}

fn existing(path: PathBuf) -> Option<PathBuf> {
    path.exists().then_some(path)
}

/// Describes an extracted `.aar` rooted at `root`.
pub(crate) fn describe_extracted(archive: &Path, slot: usize, hash: ContentHash, root: &Path) -> LibraryImport {
    let metadata = LibraryMetadata::load(root);
    let stem = archive
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut jars: Vec<PathBuf> = existing(root.join("classes.jar")).into_iter().collect();
    if let Ok(files) = andpack_common::fs::list_files(&root.join("libs")) {
        jars.extend(
            files
                .into_iter()
                .filter(|f| f.extension().is_some_and(|e| e.eq_ignore_ascii_case("jar"))),
        );
    }
    LibraryImport {
        archive: archive.to_path_buf(),
        slot: Some(slot),
        hash,
        name: metadata.as_ref().map_or(stem, |m| m.name.clone()),
        namespace: metadata.as_ref().and_then(|m| m.namespace.clone()),
        managed_types: metadata.map(|m| m.managed_types).unwrap_or_default(),
        res_dir: existing(root.join("res")),
        assets_dir: existing(root.join("assets")),
        jni_dir: existing(root.join("jni")),
        manifest: existing(root.join("AndroidManifest.xml")),
        r_txt: existing(root.join("R.txt")),
        jars,
    }
}

/// Describes a plain jar reference.
pub(crate) fn describe_jar(archive: &Path, hash: ContentHash) -> LibraryImport {
    LibraryImport {
        archive: archive.to_path_buf(),
        slot: None,
        hash,
        name: archive
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default(),
        namespace: None,
        managed_types: Vec::new(),
        res_dir: None,
        assets_dir: None,
        jni_dir: None,
        manifest: None,
        r_txt: None,
        jars: vec![archive.to_path_buf()],
    }
}
