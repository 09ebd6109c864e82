//! The built-in digest signer.
//!
//! Writes a v1 `META-INF/MANIFEST.MF` listing a base64 SHA-256 digest for
//! every entry and copies the entries after it. Any previous `META-INF/`
//! content is replaced.

use std::collections::BTreeMap;
use std::path::Path;

use base64::{engine::general_purpose, Engine as _};
use sha2::{Digest, Sha256};

use crate::error::PackageError;
use crate::layout::ArchiveEntry;
use crate::writer::{read_archive, write_archive};

/// Name of the manifest entry.
pub const MANIFEST_ENTRY: &str = "META-INF/MANIFEST.MF";

const DIGEST_HEADER: &str = "SHA-256-Digest";

/// Base64 SHA-256 of `bytes`, as written in the manifest.
pub fn entry_digest(bytes: &[u8]) -> String {
    general_purpose::STANDARD.encode(Sha256::digest(bytes))
}

/// Renders the manifest for `(name, bytes)` entries.
pub fn manifest_text<'a>(entries: impl IntoIterator<Item = (&'a str, &'a [u8])>) -> String {
    let mut out = String::from("Manifest-Version: 1.0\r\nCreated-By: andpack\r\n\r\n");
    for (name, bytes) in entries {
        out.push_str(&format!(
            "Name: {name}\r\n{DIGEST_HEADER}: {}\r\n\r\n",
            entry_digest(bytes)
        ));
    }
    out
}

/// Reads the digests back out of a manifest.
pub fn parse_manifest(text: &str) -> BTreeMap<String, String> {
    let mut digests = BTreeMap::new();
    let mut name: Option<&str> = None;
    for line in text.lines() {
        if let Some(rest) = line.strip_prefix("Name: ") {
            name = Some(rest.trim());
        } else if let Some(rest) = line.strip_prefix(DIGEST_HEADER).and_then(|r| r.strip_prefix(": ")) {
            if let Some(n) = name.take() {
                digests.insert(n.to_string(), rest.trim().to_string());
            }
        }
    }
    digests
}

/// Signs `unsigned` into `signed`. Returns `true` when `signed` was written.
pub fn sign_archive(unsigned: &Path, signed: &Path) -> Result<bool, PackageError> {
    let entries: Vec<(String, Vec<u8>)> = read_archive(unsigned)?
        .into_iter()
        .filter(|(name, _)| !name.starts_with("META-INF/"))
        .collect();
    let manifest = manifest_text(entries.iter().map(|(n, b)| (n.as_str(), b.as_slice())));
    let mut out = Vec::with_capacity(entries.len() + 1);
    out.push(ArchiveEntry::bytes(MANIFEST_ENTRY, manifest.into_bytes()));
    out.extend(entries.into_iter().map(|(name, bytes)| ArchiveEntry::bytes(name, bytes)));
    write_archive(signed, &out)
}

/// Entries of a signed archive whose digest is missing or wrong.
pub fn verify_archive(path: &Path) -> Result<Vec<String>, PackageError> {
    let entries = read_archive(path)?;
    let manifest = entries
        .iter()
        .find(|(name, _)| name == MANIFEST_ENTRY)
        .map(|(_, bytes)| String::from_utf8_lossy(bytes).into_owned())
        .unwrap_or_default();
    let digests = parse_manifest(&manifest);
    Ok(entries
        .iter()
        .filter(|(name, _)| !name.starts_with("META-INF/"))
        .filter(|(name, bytes)| digests.get(name) != Some(&entry_digest(bytes)))
        .map(|(name, _)| name.clone())
        .collect())
}

/// `<package>-Signed.<ext>` next to the unsigned archive.
pub fn signed_path(unsigned: &Path) -> std::path::PathBuf {
    let stem = unsigned
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match unsigned.extension() {
        Some(ext) => format!("{stem}-Signed.{}", ext.to_string_lossy()),
        None => format!("{stem}-Signed"),
    };
    unsigned.with_file_name(name)
}
