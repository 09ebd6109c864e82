//! Library archives (`.aar`) produced by library projects.

use std::path::{Path, PathBuf};

use andpack_imports::{LibraryMetadata, METADATA_FILE};

use crate::error::PackageError;
use crate::layout::{dir_entries, ArchiveEntry};
use crate::native::NativeLibrary;
use crate::writer::write_archive;

/// What a library archive is built from.
#[derive(Debug, Clone)]
pub struct LibraryArchiveContents {
    /// Library manifest.
    pub manifest: PathBuf,
    /// Materialised `res/`.
    pub res_dir: Option<PathBuf>,
    /// Library assets.
    pub assets_dir: Option<PathBuf>,
    /// Native libraries, stored under `jni/<abi>/`.
    pub native: Vec<NativeLibrary>,
    /// The library's `R.txt`.
    pub r_txt: Option<PathBuf>,
    /// Compiled classes.
    pub classes_jar: Option<PathBuf>,
    /// Written as `andpack.json`.
    pub metadata: LibraryMetadata,
}

impl LibraryArchiveContents {
    /// Lists the archive's entries.
    pub fn entries(&self) -> Result<Vec<ArchiveEntry>, PackageError> {
        let metadata_path = Path::new(METADATA_FILE);
        let json = serde_json::to_vec_pretty(&self.metadata).map_err(|e| PackageError::Serialization {
            path: metadata_path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let mut entries = vec![
            ArchiveEntry::file("AndroidManifest.xml", &self.manifest),
            ArchiveEntry::bytes(METADATA_FILE, json),
        ];
        if let Some(r_txt) = &self.r_txt {
            entries.push(ArchiveEntry::file("R.txt", r_txt));
        }
        if let Some(jar) = &self.classes_jar {
            entries.push(ArchiveEntry::file("classes.jar", jar));
        }
        if let Some(res) = &self.res_dir {
            entries.extend(dir_entries(res, "res")?);
        }
        if let Some(assets) = &self.assets_dir {
            entries.extend(dir_entries(assets, "assets")?);
        }
        for lib in &self.native {
            entries.push(ArchiveEntry::file(format!("jni/{}/{}", lib.abi, lib.name), &lib.source));
        }
        Ok(entries)
    }
}

/// Writes the `.aar` from scratch, so content removed from the library is
/// gone from the archive too. Returns `true` when the file changed.
pub fn create_library_archive(contents: &LibraryArchiveContents, path: &Path) -> Result<bool, PackageError> {
    write_archive(path, &contents.entries()?)
}
