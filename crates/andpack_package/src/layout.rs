//! Where each kind of content goes inside an APK or an app bundle.

use std::path::{Path, PathBuf};

use andpack_common::fs::list_files;
use andpack_common::LogicalPath;
use andpack_config::PackageFormat;

use crate::error::PackageError;
use crate::native::NativeLibrary;

/// Bytes of one archive entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryData {
    /// Copied from a file.
    File(PathBuf),
    /// Generated in memory.
    Bytes(Vec<u8>),
}

/// One file inside an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Path inside the archive, `/`-separated.
    pub name: String,
    /// Content.
    pub data: EntryData,
}

impl ArchiveEntry {
    /// An entry copied from `path`.
    pub fn file(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            data: EntryData::File(path.into()),
        }
    }

    /// An entry holding `bytes`.
    pub fn bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            data: EntryData::Bytes(bytes),
        }
    }
}

/// A materialised asset pack: `<dir>/AndroidManifest.xml`,
/// `<dir>/assets/...` and `<dir>/assets.pb`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackSource {
    /// Pack (module) name.
    pub name: String,
    /// The pack directory under `assetpacks/`.
    pub dir: PathBuf,
}

/// Everything that goes into an application package.
#[derive(Debug, Clone, Default)]
pub struct PackageContents {
    /// Merged manifest.
    pub manifest: PathBuf,
    /// Materialised `res/`.
    pub res_dir: Option<PathBuf>,
    /// Materialised base `assets/`.
    pub assets_dir: Option<PathBuf>,
    /// Validated native libraries.
    pub native: Vec<NativeLibrary>,
    /// `classes*.dex` files.
    pub dex: Vec<PathBuf>,
    /// Linked assemblies.
    pub assemblies: Vec<PathBuf>,
    /// Named asset packs; bundles only.
    pub packs: Vec<PackSource>,
}

impl PackageContents {
    /// Every file the package is built from, for cache records.
    pub fn input_files(&self) -> Result<Vec<PathBuf>, PackageError> {
        let mut files = vec![self.manifest.clone()];
        for dir in self.res_dir.iter().chain(&self.assets_dir) {
            files.extend(list_files(dir).map_err(|e| PackageError::io(dir, e))?);
        }
        files.extend(self.native.iter().map(|n| n.source.clone()));
        files.extend(self.dex.iter().cloned());
        files.extend(self.assemblies.iter().cloned());
        for pack in &self.packs {
            files.extend(list_files(&pack.dir).map_err(|e| PackageError::io(&pack.dir, e))?);
        }
        files.sort();
        files.dedup();
        Ok(files)
    }
}

/// Every file under `root` as an entry below `prefix`.
pub fn dir_entries(root: &Path, prefix: &str) -> Result<Vec<ArchiveEntry>, PackageError> {
    let files = list_files(root).map_err(|e| PackageError::io(root, e))?;
    Ok(files
        .into_iter()
        .filter_map(|path| {
            let logical = LogicalPath::relative(&path, root)?;
            if logical.file_name().starts_with('.') {
                return None;
            }
            Some(ArchiveEntry::file(logical.prefixed(prefix).as_str(), path))
        })
        .collect())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Maps package contents to archive entries for one package format.
pub trait ArchiveLayout: Send + Sync {
    /// The format this layout produces.
    fn format(&self) -> PackageFormat;

    /// Lists the archive's entries in write order.
    fn entries(&self, contents: &PackageContents) -> Result<Vec<ArchiveEntry>, PackageError>;
}

/// Flat APK layout. Named packs must already be folded into base assets.
pub struct ApkLayout;

impl ArchiveLayout for ApkLayout {
    fn format(&self) -> PackageFormat {
        PackageFormat::Apk
    }

    fn entries(&self, contents: &PackageContents) -> Result<Vec<ArchiveEntry>, PackageError> {
        let mut entries = vec![ArchiveEntry::file("AndroidManifest.xml", &contents.manifest)];
        for dex in &contents.dex {
            entries.push(ArchiveEntry::file(file_name(dex), dex));
        }
        if let Some(res) = &contents.res_dir {
            entries.extend(dir_entries(res, "res")?);
        }
        if let Some(assets) = &contents.assets_dir {
            entries.extend(dir_entries(assets, "assets")?);
        }
        for lib in &contents.native {
            entries.push(ArchiveEntry::file(lib.archive_path(), &lib.source));
        }
        for assembly in &contents.assemblies {
            entries.push(ArchiveEntry::file(format!("assemblies/{}", file_name(assembly)), assembly));
        }
        Ok(entries)
    }
}

/// App bundle layout: a `base/` module plus one module per asset pack.
pub struct AabLayout;

impl ArchiveLayout for AabLayout {
    fn format(&self) -> PackageFormat {
        PackageFormat::Aab
    }

    fn entries(&self, contents: &PackageContents) -> Result<Vec<ArchiveEntry>, PackageError> {
        let mut entries = vec![ArchiveEntry::file("base/manifest/AndroidManifest.xml", &contents.manifest)];
        for dex in &contents.dex {
            entries.push(ArchiveEntry::file(format!("base/dex/{}", file_name(dex)), dex));
        }
        if let Some(res) = &contents.res_dir {
            entries.extend(dir_entries(res, "base/res")?);
        }
        if let Some(assets) = &contents.assets_dir {
            entries.extend(dir_entries(assets, "base/assets")?);
        }
        for lib in &contents.native {
            entries.push(ArchiveEntry::file(format!("base/{}", lib.archive_path()), &lib.source));
        }
        for assembly in &contents.assemblies {
            entries.push(ArchiveEntry::file(
                format!("base/root/assemblies/{}", file_name(assembly)),
                assembly,
            ));
        }
        for pack in &contents.packs {
            let name = &pack.name;
            entries.push(ArchiveEntry::file(
                format!("{name}/manifest/AndroidManifest.xml"),
                pack.dir.join("AndroidManifest.xml"),
            ));
            entries.extend(dir_entries(&pack.dir.join("assets"), &format!("{name}/assets"))?);
            entries.push(ArchiveEntry::file(
                format!("{name}/{}", andpack_assets::ASSETS_PB),
                pack.dir.join(andpack_assets::ASSETS_PB),
            ));
        }
        Ok(entries)
    }
}

/// Returns the layout for `format`.
pub fn layout_for(format: PackageFormat) -> &'static dyn ArchiveLayout {
    match format {
        PackageFormat::Apk => &ApkLayout,
        PackageFormat::Aab => &AabLayout,
    }
}
