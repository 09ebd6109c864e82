//! Input file stamping and change detection.
//!
//! Stamps combine a content hash with size and modification time. When size
//! and timestamp match a previous stamp the file is not re-read; otherwise it
//! is hashed. Stamping of many files runs in parallel.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use andpack_common::fs::mtime_nanos;
use andpack_common::ContentHash;
use rayon::prelude::*;

use crate::error::CacheError;
use crate::record::FileStamp;

/// Result of comparing current input stamps against a recorded set.
///
/// A file counts as modified when either its content hash or its timestamp
/// differs, so touching a file re-runs the targets that read it directly.
/// Downstream targets only see the change if the upstream target actually
/// rewrote its outputs.
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    /// Files that are not in the recorded set.
    pub new_files: Vec<PathBuf>,
    /// Files whose stamp differs from the recorded one.
    pub modified_files: Vec<PathBuf>,
    /// Files recorded previously but absent now.
    pub deleted_files: Vec<PathBuf>,
    /// Files whose stamp matches.
    pub unchanged_files: Vec<PathBuf>,
}

impl ChangeSet {
    /// Returns `true` if there are no changes.
    pub fn is_empty(&self) -> bool {
        self.new_files.is_empty() && self.modified_files.is_empty() && self.deleted_files.is_empty()
    }

    /// Returns the total number of files that need reprocessing (new + modified).
    pub fn dirty_count(&self) -> usize {
        self.new_files.len() + self.modified_files.len()
    }

    /// Returns the first changed path, in new, modified, deleted order.
    pub fn first_change(&self) -> Option<&Path> {
        self.new_files
            .first()
            .or_else(|| self.modified_files.first())
            .or_else(|| self.deleted_files.first())
            .map(PathBuf::as_path)
    }
}

/// Utility for stamping input files and detecting changes.
pub struct SourceHasher;

impl SourceHasher {
    /// Computes the content hash of a single file.
    pub fn hash_file(path: &Path) -> Result<ContentHash, CacheError> {
        let content = std::fs::read(path).map_err(|e| CacheError::io(path, e))?;
        Ok(ContentHash::from_bytes(&content))
    }

    /// Stamps a file, reusing `previous`'s hash when size and timestamp match.
    pub fn stamp_file(path: &Path, previous: Option<&FileStamp>) -> Result<FileStamp, CacheError> {
        let meta = std::fs::metadata(path).map_err(|e| CacheError::io(path, e))?;
        let len = meta.len();
        let mtime = mtime_nanos(&meta);
        if let Some(prev) = previous {
            if prev.same_metadata(len, mtime) {
                return Ok(*prev);
            }
        }
        Ok(FileStamp {
            hash: Self::hash_file(path)?,
            len,
            mtime,
        })
    }

    /// Stamps many files in parallel.
    ///
    /// Files that cannot be read are left out and therefore show up as
    /// deleted in a change set.
    pub fn stamp_files(
        paths: &[PathBuf],
        previous: &BTreeMap<PathBuf, FileStamp>,
    ) -> BTreeMap<PathBuf, FileStamp> {
        paths
            .par_iter()
            .filter_map(|path| {
                Self::stamp_file(path, previous.get(path))
                    .ok()
                    .map(|stamp| (path.clone(), stamp))
            })
            .collect()
    }

    /// Compares current stamps against recorded ones.
    pub fn detect_changes(
        current: &BTreeMap<PathBuf, FileStamp>,
        recorded: &BTreeMap<PathBuf, FileStamp>,
    ) -> ChangeSet {
        let mut changes = ChangeSet::default();
        for (path, stamp) in current {
            match recorded.get(path) {
                Some(prev) if prev == stamp => changes.unchanged_files.push(path.clone()),
                Some(_) => changes.modified_files.push(path.clone()),
                None => changes.new_files.push(path.clone()),
            }
        }
        changes.deleted_files = recorded
            .keys()
            .filter(|p| !current.contains_key(*p))
            .cloned()
            .collect();
        changes
    }
}
