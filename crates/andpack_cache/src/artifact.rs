//! Content-keyed binary blobs under the intermediate directory.
//!
//! Used for data that is expensive to recompute and keyed by the hash of
//! what produced it: parsed resource models, extracted archive listings.
//! Every blob starts with a small bincode header (magic, format version,
//! tool version, payload checksum). Anything that fails validation reads
//! back as `None`.

use std::path::{Path, PathBuf};

use andpack_common::fs::write_if_changed;
use andpack_common::ContentHash;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::CacheError;

const BLOB_MAGIC: [u8; 4] = *b"ANDP";

/// Bumped whenever the header or any cached payload type changes shape.
const BLOB_FORMAT_VERSION: u32 = 1;

const BLOB_EXT: &str = "bin";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct BlobHeader {
    magic: [u8; 4],
    format_version: u32,
    tool_version: String,
    checksum: ContentHash,
}

/// Store of binary blobs at `<root>/<kind>/<key>.bin`.
pub struct ArtifactStore {
    root: PathBuf,
    tool_version: String,
}

impl ArtifactStore {
    /// Creates a store rooted at `root` (typically `obj/resourcecache`).
    ///
    /// Blobs written by a different `tool_version` are treated as misses.
    pub fn new(root: &Path, tool_version: &str) -> Self {
        Self {
            root: root.to_path_buf(),
            tool_version: tool_version.to_string(),
        }
    }

    /// Path of the blob for `key` in `kind`.
    pub fn blob_path(&self, kind: &str, key: &ContentHash) -> PathBuf {
        self.root.join(kind).join(format!("{key}.{BLOB_EXT}"))
    }

    /// Serializes `value` and stores it under `key`.
    pub fn put<T: Serialize>(&self, kind: &str, key: &ContentHash, value: &T) -> Result<(), CacheError> {
        let payload = bincode::serde::encode_to_vec(value, bincode::config::standard())
            .map_err(|e| CacheError::Serialization {
                reason: e.to_string(),
            })?;
        self.put_bytes(kind, key, &payload)
    }

    /// Loads and deserializes the value stored under `key`.
    pub fn get<T: DeserializeOwned>(&self, kind: &str, key: &ContentHash) -> Option<T> {
        let payload = self.get_bytes(kind, key)?;
        bincode::serde::decode_from_slice(&payload, bincode::config::standard())
            .ok()
            .map(|(value, _)| value)
    }

    /// Stores raw bytes under `key`.
    pub fn put_bytes(&self, kind: &str, key: &ContentHash, payload: &[u8]) -> Result<(), CacheError> {
        let header = BlobHeader {
            magic: BLOB_MAGIC,
            format_version: BLOB_FORMAT_VERSION,
            tool_version: self.tool_version.clone(),
            checksum: ContentHash::from_bytes(payload),
        };
        let header_bytes = bincode::serde::encode_to_vec(&header, bincode::config::standard())
            .map_err(|e| CacheError::Serialization {
                reason: e.to_string(),
            })?;

        // u32 header length, header, payload
        let mut out = Vec::with_capacity(4 + header_bytes.len() + payload.len());
        out.extend_from_slice(&(header_bytes.len() as u32).to_le_bytes());
        out.extend_from_slice(&header_bytes);
        out.extend_from_slice(payload);

        let path = self.blob_path(kind, key);
        write_if_changed(&path, &out).map_err(|e| CacheError::io(&path, e))?;
        Ok(())
    }

    /// Loads the raw bytes stored under `key`, validating the header.
    pub fn get_bytes(&self, kind: &str, key: &ContentHash) -> Option<Vec<u8>> {
        let raw = std::fs::read(self.blob_path(kind, key)).ok()?;
        let len_bytes: [u8; 4] = raw.get(..4)?.try_into().ok()?;
        let header_len = u32::from_le_bytes(len_bytes) as usize;
        let header_end = 4usize.checked_add(header_len)?;
        let (header, _): (BlobHeader, usize) =
            bincode::serde::decode_from_slice(raw.get(4..header_end)?, bincode::config::standard())
                .ok()?;
        if header.magic != BLOB_MAGIC
            || header.format_version != BLOB_FORMAT_VERSION
            || header.tool_version != self.tool_version
        {
            return None;
        }
        let payload = &raw[header_end..];
        (ContentHash::from_bytes(payload) == header.checksum).then(|| payload.to_vec())
    }

    /// Deletes blobs of `kind` whose key is not in `live`. Returns the count removed.
    pub fn gc(&self, kind: &str, live: &[ContentHash]) -> Result<usize, CacheError> {
        let dir = self.root.join(kind);
        if !dir.is_dir() {
            return Ok(0);
        }
        let live: Vec<String> = live.iter().map(|k| k.to_string()).collect();
        let entries = std::fs::read_dir(&dir).map_err(|e| CacheError::io(&dir, e))?;
        let mut removed = 0;
        for entry in entries {
            let path = entry.map_err(|e| CacheError::io(&dir, e))?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(BLOB_EXT) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if !live.iter().any(|k| k == stem) {
                andpack_common::fs::remove_file_forced(&path).map_err(|e| CacheError::io(&path, e))?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}
