//! Per-target cache records.

use std::collections::BTreeMap;
use std::path::PathBuf;

use andpack_common::ContentHash;
use serde::{Deserialize, Serialize};

/// Identity of one input file at the time a target ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStamp {
    /// Content hash.
    pub hash: ContentHash,
    /// Size in bytes.
    pub len: u64,
    /// Modification time in nanoseconds since the epoch.
    pub mtime: u64,
}

impl FileStamp {
    /// Returns `true` if size and timestamp match, meaning the content hash
    /// can be reused without reading the file.
    pub fn same_metadata(&self, len: u64, mtime: u64) -> bool {
        self.len == len && self.mtime == mtime
    }
}

/// How the last run of a target ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetOutcome {
    /// The target completed without errors.
    Succeeded,
    /// The target reported errors; it must run again next time.
    Failed,
}

/// The declared inputs of a target for one evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetInputs {
    /// Input files. Missing files are recorded as absent, not as errors.
    pub files: Vec<PathBuf>,
    /// Named values that affect the target's output (package name, ABIs, ...).
    pub properties: BTreeMap<String, String>,
}

impl TargetInputs {
    /// Creates an empty input set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one input file.
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.files.push(path.into());
        self
    }

    /// Adds several input files.
    pub fn files(mut self, paths: impl IntoIterator<Item = PathBuf>) -> Self {
        self.files.extend(paths);
        self
    }

    /// Adds a named property.
    pub fn property(mut self, key: &str, value: impl ToString) -> Self {
        self.properties.insert(key.to_string(), value.to_string());
        self
    }
}

/// The persisted state of one target after its last run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheRecord {
    /// Target name, e.g. `_UpdateAndroidResgen`.
    pub target: String,
    /// Stamp of every input file that existed when the target ran.
    pub inputs: BTreeMap<PathBuf, FileStamp>,
    /// Properties the target ran with.
    pub properties: BTreeMap<String, String>,
    /// Files the target produced.
    pub outputs: Vec<PathBuf>,
    /// How the run ended.
    pub outcome: TargetOutcome,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_metadata() {
        let stamp = FileStamp {
            hash: ContentHash::from_bytes(b"x"),
            len: 1,
            mtime: 42,
        };
        assert!(stamp.same_metadata(1, 42));
        assert!(!stamp.same_metadata(1, 43));
        assert!(!stamp.same_metadata(2, 42));
    }

    #[test]
    fn inputs_builder() {
        let inputs = TargetInputs::new()
            .file("Resources/values/Strings.xml")
            .files(vec![PathBuf::from("a.png")])
            .property("package", "com.example.app1");
        assert_eq!(inputs.files.len(), 2);
        assert_eq!(inputs.properties["package"], "com.example.app1");
    }

    #[test]
    fn record_serde_roundtrip() {
        let mut inputs = BTreeMap::new();
        inputs.insert(
            PathBuf::from("Resources/drawable/Image1.png"),
            FileStamp {
                hash: ContentHash::from_bytes(b"png"),
                len: 3,
                mtime: 7,
            },
        );
        let record = CacheRecord {
            target: "_GenerateAndroidResourceDir".to_string(),
            inputs,
            properties: BTreeMap::new(),
            outputs: vec![PathBuf::from("obj/res/drawable/image1.png")],
            outcome: TargetOutcome::Succeeded,
        };
        let json = serde_json::to_string(&record).unwrap();
        let back: CacheRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.target, record.target);
        assert_eq!(back.inputs, record.inputs);
        assert_eq!(back.outcome, TargetOutcome::Succeeded);
    }
}
