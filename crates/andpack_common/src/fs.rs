//! File helpers that keep incremental outputs stable.
//!
//! Every stage writes through [`write_if_changed`] so an unchanged output keeps
//! its timestamp, which is what lets downstream targets stay skipped. Writes go
//! to a sibling temporary file and are renamed into place, and read-only
//! destinations are unlocked first.

use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

/// Writes `contents` to `path` unless the file already holds exactly those bytes.
///
/// Creates parent directories as needed and clears a read-only bit on an
/// existing destination. Returns `true` if the file was written.
pub fn write_if_changed(path: &Path, contents: &[u8]) -> io::Result<bool> {
    if let Ok(existing) = std::fs::read(path) {
        if existing == contents {
            return Ok(false);
        }
    }
    write_atomic(path, contents)?;
    Ok(true)
}

/// Copies `src` to `dst` unless `dst` already has identical content.
///
/// Returns `true` if the destination was written.
pub fn copy_if_changed(src: &Path, dst: &Path) -> io::Result<bool> {
    let contents = std::fs::read(src)?;
    write_if_changed(dst, &contents)
}

/// Writes `contents` to `path` via a temporary file and rename.
pub fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if path.exists() {
        ensure_writable(path)?;
    }
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!(".{file_name}.{}.tmp", std::process::id()));
    std::fs::write(&tmp, contents)?;
    match std::fs::rename(&tmp, path) {
        Ok(()) => Ok(()),
        Err(e) => {
            let _ = std::fs::remove_file(&tmp);
            Err(e)
        }
    }
}

/// Clears the read-only bit on `path` if it is set.
pub fn ensure_writable(path: &Path) -> io::Result<()> {
    let meta = std::fs::metadata(path)?;
    let mut perms = meta.permissions();
    if !perms.readonly() {
        return Ok(());
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        perms.set_mode(perms.mode() | 0o200);
    }
    #[cfg(not(unix))]
    {
        #[allow(clippy::permissions_set_readonly_false)]
        perms.set_readonly(false);
    }
    std::fs::set_permissions(path, perms)
}

/// Removes a file, unlocking it first. Missing files are not an error.
pub fn remove_file_forced(path: &Path) -> io::Result<()> {
    match std::fs::symlink_metadata(path) {
        Ok(_) => {
            ensure_writable(path)?;
            std::fs::remove_file(path)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// Deletes every file under `root` that is not in `known`, then removes
/// directories left empty, deepest first.
///
/// `known` holds absolute paths. Returns the removed files, sorted.
pub fn remove_unknown_files(root: &Path, known: &BTreeSet<PathBuf>) -> io::Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Ok(Vec::new());
    }
    let mut removed = Vec::new();
    let mut dirs = Vec::new();
    for entry in walkdir::WalkDir::new(root).min_depth(1) {
        let entry = entry.map_err(io::Error::other)?;
        let path = entry.path().to_path_buf();
        if entry.file_type().is_dir() {
            dirs.push(path);
        } else if !known.contains(&path) {
            remove_file_forced(&path)?;
            removed.push(path);
        }
    }
    dirs.sort_by_key(|d| std::cmp::Reverse(d.components().count()));
    for dir in dirs {
        let is_empty = std::fs::read_dir(&dir)?.next().is_none();
        if is_empty {
            std::fs::remove_dir(&dir)?;
        }
    }
    removed.sort();
    Ok(removed)
}

/// Lists all files under `root` recursively, sorted. Missing roots yield nothing.
pub fn list_files(root: &Path) -> io::Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(root).min_depth(1) {
        let entry = entry.map_err(io::Error::other)?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

/// Returns the modification time of `meta` in nanoseconds since the epoch.
pub fn mtime_nanos(meta: &std::fs::Metadata) -> u64 {
    meta.modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map_or(0, |d| u64::try_from(d.as_nanos()).unwrap_or(u64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_if_changed_skips_identical_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("a.txt");
        assert!(write_if_changed(&path, b"one").unwrap());
        assert!(!write_if_changed(&path, b"one").unwrap());
        assert!(write_if_changed(&path, b"two").unwrap());
        assert_eq!(std::fs::read(&path).unwrap(), b"two");
    }

    #[test]
    fn write_if_changed_overwrites_read_only_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Resource.designer.cs");
        std::fs::write(&path, "old").unwrap();
        let mut perms = std::fs::metadata(&path).unwrap().permissions();
        perms.set_readonly(true);
        std::fs::set_permissions(&path, perms).unwrap();

        assert!(write_if_changed(&path, b"new").unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new");
        assert!(!std::fs::metadata(&path).unwrap().permissions().readonly());
    }

    #[test]
    fn write_atomic_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.bin");
        write_atomic(&path, b"data").unwrap();
        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["x.bin".to_string()]);
    }

    #[test]
    fn copy_if_changed_copies_once() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src.png");
        let dst = dir.path().join("res").join("dst.png");
        std::fs::write(&src, [1u8, 2, 3]).unwrap();
        assert!(copy_if_changed(&src, &dst).unwrap());
        assert!(!copy_if_changed(&src, &dst).unwrap());
    }

    #[test]
    fn remove_unknown_files_prunes_files_and_empty_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let keep = root.join("values").join("strings.xml");
        let stale = root.join("drawable").join("old.png");
        std::fs::create_dir_all(keep.parent().unwrap()).unwrap();
        std::fs::create_dir_all(stale.parent().unwrap()).unwrap();
        std::fs::write(&keep, "<resources/>").unwrap();
        std::fs::write(&stale, "png").unwrap();

        let known: BTreeSet<PathBuf> = [keep.clone()].into_iter().collect();
        let removed = remove_unknown_files(root, &known).unwrap();
        assert_eq!(removed, vec![stale]);
        assert!(keep.exists());
        assert!(!root.join("drawable").exists());
    }

    #[test]
    fn remove_unknown_files_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let removed = remove_unknown_files(&dir.path().join("nope"), &BTreeSet::new()).unwrap();
        assert!(removed.is_empty());
    }

    #[test]
    fn remove_file_forced_missing_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        remove_file_forced(&dir.path().join("missing")).unwrap();
    }

    #[test]
    fn list_files_is_sorted_and_recursive() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("b")).unwrap();
        std::fs::write(dir.path().join("b").join("z.txt"), "").unwrap();
        std::fs::write(dir.path().join("a.txt"), "").unwrap();
        let files = list_files(dir.path()).unwrap();
        assert_eq!(files, vec![dir.path().join("a.txt"), dir.path().join("b").join("z.txt")]);
    }
}
