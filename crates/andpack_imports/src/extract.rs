//! Archive extraction.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use andpack_common::fs::{remove_unknown_files, write_if_changed};
use zip::ZipArchive;

use crate::error::ImportError;

/// Result of extracting one archive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractReport {
    /// Every file now present under the destination.
    pub files: Vec<PathBuf>,
    /// Files whose content changed.
    pub written: usize,
    /// Files left over from a previous extraction and deleted.
    pub removed: usize,
}

fn open(archive: &Path) -> Result<ZipArchive<File>, ImportError> {
    let file = File::open(archive).map_err(|e| ImportError::io(archive, e))?;
    ZipArchive::new(file).map_err(|e| ImportError::corrupt(archive, e))
}

/// Extracts every file of `archive` into `dest`.
///
/// Unchanged files keep their timestamps, files no longer in the archive are
/// removed, and entries that would escape `dest` are skipped.
pub fn extract_archive(archive: &Path, dest: &Path) -> Result<ExtractReport, ImportError> {
    let mut zip = open(archive)?;
    let mut report = ExtractReport::default();
    let mut known = BTreeSet::new();
    for index in 0..zip.len() {
        let mut entry = zip.by_index(index).map_err(|e| ImportError::corrupt(archive, e))?;
        if entry.is_dir() {
            continue;
        }
        let Some(relative) = entry.enclosed_name() else {
            tracing::warn!(archive = %archive.display(), entry = entry.name(), "skipping unsafe archive entry");
            continue;
        };
        let mut contents = Vec::with_capacity(entry.size() as usize);
        entry
            .read_to_end(&mut contents)
            .map_err(|e| ImportError::corrupt(archive, e))?;
        let target = dest.join(relative);
        if write_if_changed(&target, &contents).map_err(|e| ImportError::io(&target, e))? {
            report.written += 1;
        }
        known.insert(target);
    }
    report.removed = remove_unknown_files(dest, &known)
        .map_err(|e| ImportError::io(dest, e))?
        .len();
    report.files = known.into_iter().collect();
    Ok(report)
}

/// Reads one entry, `None` if the archive has no such file.
pub fn read_entry(archive: &Path, name: &str) -> Result<Option<Vec<u8>>, ImportError> {
    let mut zip = open(archive)?;
    let result = match zip.by_name(name) {
        Ok(mut entry) => {
            let mut contents = Vec::new();
            entry
                .read_to_end(&mut contents)
                .map_err(|e| ImportError::corrupt(archive, e))?;
            Some(contents)
        }
        Err(zip::result::ZipError::FileNotFound) => None,
        Err(e) => return Err(ImportError::corrupt(archive, e)),
    };
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn write_zip(path: &Path, files: &[(&str, &str)]) {
        let mut zip = zip::ZipWriter::new(File::create(path).unwrap());
        for (name, contents) in files {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(contents.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }

    #[test]
    fn extracts_and_prunes() {
        let dir = tempfile::tempdir().unwrap();
        let aar = dir.path().join("lib.aar");
        let dest = dir.path().join("out");
        write_zip(&aar, &[("AndroidManifest.xml", "<manifest/>"), ("res/values/strings.xml", "<resources/>")]);
        let first = extract_archive(&aar, &dest).unwrap();
        assert_eq!(first.written, 2);
        assert!(dest.join("res/values/strings.xml").is_file());

        write_zip(&aar, &[("AndroidManifest.xml", "<manifest/>")]);
        let second = extract_archive(&aar, &dest).unwrap();
        assert_eq!((second.written, second.removed), (0, 1));
        assert!(!dest.join("res/values/strings.xml").exists());
    }

    #[test]
    fn corrupt_archives_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let aar = dir.path().join("broken.aar");
        std::fs::write(&aar, b"not a zip").unwrap();
        let err = extract_archive(&aar, &dir.path().join("out")).unwrap_err();
        assert!(matches!(err, ImportError::CorruptArchive { .. }));
    }

    #[test]
    fn reads_single_entries() {
        let dir = tempfile::tempdir().unwrap();
        let aar = dir.path().join("lib.aar");
        write_zip(&aar, &[("R.txt", "int string a 0x7f010000\n")]);
        assert_eq!(read_entry(&aar, "R.txt").unwrap().unwrap(), b"int string a 0x7f010000\n");
        assert!(read_entry(&aar, "missing").unwrap().is_none());
    }
}
