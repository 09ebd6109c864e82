//! Packaging assembly.
//!
//! Materialised resources, assets, native libraries, dex files and
//! assemblies are laid out by an [`ArchiveLayout`] (flat APK or app bundle
//! with asset pack modules) and written by a deterministic zip writer that
//! leaves unchanged archives untouched. The built-in signer adds a digest
//! manifest; library projects get an `.aar` instead.

#![warn(missing_docs)]

pub mod aar;
pub mod error;
pub mod layout;
pub mod native;
pub mod sign;
pub mod writer;

pub use aar::{create_library_archive, LibraryArchiveContents};
pub use error::PackageError;
pub use layout::{layout_for, AabLayout, ApkLayout, ArchiveEntry, ArchiveLayout, EntryData, PackSource, PackageContents};
pub use native::{collect_native_libraries, sources_from_entries, sources_from_jni_dir, NativeLibrary, NativeSource};
pub use sign::{sign_archive, signed_path, verify_archive, MANIFEST_ENTRY};
pub use writer::{entry_names, read_archive, write_archive};

use std::path::Path;

/// Lays out `contents` for `layout` and writes the archive. Returns `true`
/// when the file changed.
pub fn assemble(layout: &dyn ArchiveLayout, contents: &PackageContents, out: &Path) -> Result<bool, PackageError> {
    let entries = layout.entries(contents)?;
    let written = write_archive(out, &entries)?;
    tracing::info!(
        format = %layout.format(),
        path = %out.display(),
        entries = entries.len(),
        written,
        "package assembled"
    );
    Ok(written)
}
