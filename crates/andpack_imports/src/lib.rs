//! Library import resolution.
//!
//! Referenced library archives (`.aar` and `.jar`) are given stable slots in
//! an [`IdentityMap`], extracted once under `lp/<slot>/jl` and re-extracted
//! only when their content changes. The resolved [`ImportSet`] lists each
//! library's resources, assets, native libraries, manifest and jars for the
//! later stages; [`merge_manifests`] folds the library manifests into the
//! application's.

#![warn(missing_docs)]

pub mod error;
pub mod extract;
pub mod identity;
pub mod library;
pub mod manifest;
pub mod resolve;

pub use error::ImportError;
pub use extract::{extract_archive, read_entry, ExtractReport};
pub use identity::{archive_identity, IdentityMap, MAP_FILE};
pub use library::{LibraryImport, LibraryMetadata, METADATA_FILE};
pub use manifest::{merge_manifests, LibraryManifest};
pub use resolve::{extract_root, resolve_imports, ImportSet, EXTRACT_DIR, IMPORTS_CACHE_FILE, LP_DIR};
