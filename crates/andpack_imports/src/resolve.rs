//! Resolution of referenced `.aar` and `.jar` files.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use andpack_cache::{FileStamp, SourceHasher};
use andpack_common::fs::{mtime_nanos, write_if_changed};
use andpack_common::ContentHash;
use andpack_diagnostics::{codes, Diagnostic, DiagnosticSink, Location};
use serde::{Deserialize, Serialize};

use crate::error::ImportError;
use crate::extract::extract_archive;
use crate::identity::{archive_identity, IdentityMap};
use crate::library::{describe_extracted, describe_jar, LibraryImport};

/// Directory under the intermediate dir holding extracted libraries.
pub const LP_DIR: &str = "lp";

/// Extraction directory inside a slot.
pub const EXTRACT_DIR: &str = "jl";

/// Resolved import list, written next to the build's cache records.
pub const IMPORTS_CACHE_FILE: &str = "libraryprojectimports.cache";

/// `lp/<slot>/jl`.
pub fn extract_root(intermediate: &Path, slot: usize) -> PathBuf {
    intermediate.join(LP_DIR).join(slot.to_string()).join(EXTRACT_DIR)
}

fn stamp_path(intermediate: &Path, slot: usize) -> PathBuf {
    intermediate.join(LP_DIR).join(format!("{slot}.stamp"))
}

/// Every library a project imports, in reference order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSet {
    /// Resolved libraries; identical archives appear once.
    pub libraries: Vec<LibraryImport>,
}

impl ImportSet {
    /// Extracted `res/` directories, highest precedence first.
    pub fn res_dirs(&self) -> impl Iterator<Item = (&LibraryImport, &Path)> {
        self.libraries
            .iter()
            .filter_map(|l| l.res_dir.as_deref().map(|d| (l, d)))
    }

    /// Every class jar.
    pub fn jars(&self) -> Vec<PathBuf> {
        self.libraries.iter().flat_map(|l| l.jars.iter().cloned()).collect()
    }

    /// Managed types declared across all libraries.
    pub fn managed_types(&self) -> Vec<String> {
        self.libraries
            .iter()
            .flat_map(|l| l.managed_types.iter().cloned())
            .collect()
    }

    /// Writes `libraryprojectimports.cache` into `dir`. Returns `true` if it
    /// changed.
    pub fn save(&self, dir: &Path) -> Result<bool, ImportError> {
        let path = dir.join(IMPORTS_CACHE_FILE);
        let json = serde_json::to_string_pretty(self).map_err(|e| ImportError::Serialization {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        write_if_changed(&path, json.as_bytes()).map_err(|e| ImportError::io(&path, e))
    }

    /// Reads a set saved by [`save`](Self::save); `None` when missing or
    /// unreadable.
    pub fn load(dir: &Path) -> Option<Self> {
        let text = std::fs::read_to_string(dir.join(IMPORTS_CACHE_FILE)).ok()?;
        serde_json::from_str(&text).ok()
    }
}

fn load_stamp(path: &Path) -> Option<FileStamp> {
    let text = std::fs::read_to_string(path).ok()?;
    serde_json::from_str(&text).ok()
}

fn save_stamp(path: &Path, stamp: &FileStamp) -> Result<(), ImportError> {
    let json = serde_json::to_string(stamp).map_err(|e| ImportError::Serialization {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    andpack_common::fs::write_atomic(path, json.as_bytes()).map_err(|e| ImportError::io(path, e))
}

fn is_jar(path: &Path) -> bool {
    path.extension().is_some_and(|e| e.eq_ignore_ascii_case("jar"))
}

/// How an `.aar` slot was brought up to date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Refresh {
    UpToDate,
    Touched,
    Extracted,
}

/// The archive's current stamp, reusing `previous` when size and timestamp
/// still match.
fn current_stamp(archive: &Path, previous: Option<FileStamp>) -> Result<(FileStamp, bool), ImportError> {
    let meta = std::fs::metadata(archive).map_err(|e| ImportError::io(archive, e))?;
    if let Some(prev) = previous {
        if prev.same_metadata(meta.len(), mtime_nanos(&meta)) {
            return Ok((prev, true));
        }
    }
    Ok((SourceHasher::stamp_file(archive, None)?, false))
}

fn refresh_slot(
    archive: &Path,
    intermediate: &Path,
    slot: usize,
    previous: Option<FileStamp>,
    stamp: &FileStamp,
) -> Result<Refresh, ImportError> {
    let refresh = if previous.is_some_and(|p| p.hash == stamp.hash) {
        Refresh::Touched
    } else {
        extract_archive(archive, &extract_root(intermediate, slot))?;
        Refresh::Extracted
    };
    save_stamp(&stamp_path(intermediate, slot), stamp)?;
    Ok(refresh)
}

/// Resolves `archives` for `project`, extracting `.aar` files under
/// `<intermediate>/lp/<slot>/jl`.
///
/// Missing archives (LIB0002) and corrupt ones (LIB0001) are reported to
/// `sink` and left out. An archive whose size and timestamp match its stamp
/// is not reopened; one whose timestamp changed but whose content did not
/// keeps its extraction. Archives with identical content resolve once.
pub fn resolve_imports(
    archives: &[PathBuf],
    intermediate: &Path,
    project: &str,
    sink: &DiagnosticSink,
) -> Result<ImportSet, ImportError> {
    let lp_dir = intermediate.join(LP_DIR);
    let mut map = IdentityMap::load(&lp_dir);
    let mut set = ImportSet::default();
    let mut seen: BTreeMap<ContentHash, PathBuf> = BTreeMap::new();

    for archive in archives {
        if !archive.is_file() {
            sink.emit(
                Diagnostic::error(
                    codes::MISSING_REFERENCE,
                    format!("Referenced library '{}' was not found", archive.display()),
                )
                .for_project(project),
            );
            continue;
        }

        if is_jar(archive) {
            let hash = SourceHasher::hash_file(archive)?;
            if seen.insert(hash, archive.clone()).is_none() {
                set.libraries.push(describe_jar(archive, hash));
            }
            continue;
        }

        let identity = archive_identity(archive);
        let known_slot = map.slot_of(&identity);
        let previous = known_slot
            .filter(|slot| extract_root(intermediate, *slot).is_dir())
            .and_then(|slot| load_stamp(&stamp_path(intermediate, slot)));
        let (stamp, up_to_date) = current_stamp(archive, previous)?;
        if let Some(first) = seen.get(&stamp.hash) {
            tracing::debug!(
                archive = %archive.display(),
                first = %first.display(),
                "identical archive already resolved"
            );
            continue;
        }
        let slot = map.slot_for(&identity);
        let refresh = if up_to_date {
            Refresh::UpToDate
        } else {
            match refresh_slot(archive, intermediate, slot, previous, &stamp) {
                Ok(refresh) => refresh,
                Err(ImportError::CorruptArchive { reason, .. }) => {
                    let _ = std::fs::remove_file(stamp_path(intermediate, slot));
                    sink.emit(
                        Diagnostic::error(
                            codes::CORRUPT_ARCHIVE,
                            format!("Library archive could not be read: {reason}"),
                        )
                        .at(Location::file(archive))
                        .for_project(project),
                    );
                    continue;
                }
                Err(e) => return Err(e),
            }
        };
        match refresh {
            Refresh::UpToDate => tracing::debug!(
                "Skipped resource lookup for {}: extracted files are up to date",
                archive.display()
            ),
            Refresh::Touched => tracing::debug!(
                archive = %archive.display(),
                "archive timestamp changed but contents did not; keeping extraction"
            ),
            Refresh::Extracted => tracing::debug!(archive = %archive.display(), slot, "extracted library"),
        }
        seen.insert(stamp.hash, archive.clone());
        let root = extract_root(intermediate, slot);
        set.libraries.push(describe_extracted(archive, slot, stamp.hash, &root));
    }

    map.save(&lp_dir)?;
    Ok(set)
}
