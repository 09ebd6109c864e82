//! Deterministic zip writing.
//!
//! Entries carry a fixed timestamp and the archive is only replaced when
//! its bytes change, so rebuilding from unchanged inputs leaves the output
//! untouched.

use std::io::{Cursor, Read, Write};
use std::path::Path;

use andpack_common::fs::write_if_changed;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipArchive, ZipWriter};

use crate::error::PackageError;
use crate::layout::{ArchiveEntry, EntryData};

/// Extensions stored without compression; they are compressed already or
/// must be mapped directly from the package.
const STORED_EXTENSIONS: [&str; 10] = ["png", "jpg", "jpeg", "gif", "webp", "ogg", "mp3", "mp4", "zip", "so"];

fn options_for(name: &str) -> SimpleFileOptions {
    let stored = name
        .rsplit_once('.')
        .is_some_and(|(_, ext)| STORED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()));
    let method = if stored {
        CompressionMethod::Stored
    } else {
        CompressionMethod::Deflated
    };
    SimpleFileOptions::default()
        .compression_method(method)
        .last_modified_time(DateTime::default())
        .unix_permissions(0o644)
}

/// Encodes `entries` into zip bytes, in order.
pub fn encode_archive(path: &Path, entries: &[ArchiveEntry]) -> Result<Vec<u8>, PackageError> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for entry in entries {
        zip.start_file(entry.name.as_str(), options_for(&entry.name))
            .map_err(|e| PackageError::archive(path, e))?;
        match &entry.data {
            EntryData::Bytes(bytes) => zip.write_all(bytes).map_err(|e| PackageError::io(path, e))?,
            EntryData::File(source) => {
                let bytes = std::fs::read(source).map_err(|e| PackageError::io(source, e))?;
                zip.write_all(&bytes).map_err(|e| PackageError::io(path, e))?;
            }
        }
    }
    let cursor = zip.finish().map_err(|e| PackageError::archive(path, e))?;
    Ok(cursor.into_inner())
}

/// Writes the archive to `path` unless an identical one is already there.
/// Returns `true` when the file was written.
pub fn write_archive(path: &Path, entries: &[ArchiveEntry]) -> Result<bool, PackageError> {
    let bytes = encode_archive(path, entries)?;
    let written = write_if_changed(path, &bytes).map_err(|e| PackageError::io(path, e))?;
    tracing::debug!(path = %path.display(), entries = entries.len(), written, "archive assembled");
    Ok(written)
}

/// Reads every file entry of an archive, in archive order.
pub fn read_archive(path: &Path) -> Result<Vec<(String, Vec<u8>)>, PackageError> {
    let file = std::fs::File::open(path).map_err(|e| PackageError::io(path, e))?;
    let mut archive = ZipArchive::new(file).map_err(|e| PackageError::archive(path, e))?;
    let mut entries = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(|e| PackageError::archive(path, e))?;
        if entry.is_dir() {
            continue;
        }
        let mut bytes = Vec::with_capacity(usize::try_from(entry.size()).unwrap_or_default());
        entry.read_to_end(&mut bytes).map_err(|e| PackageError::io(path, e))?;
        entries.push((entry.name().to_string(), bytes));
    }
    Ok(entries)
}

/// Names of every file entry of an archive.
pub fn entry_names(path: &Path) -> Result<Vec<String>, PackageError> {
    Ok(read_archive(path)?.into_iter().map(|(name, _)| name).collect())
}
