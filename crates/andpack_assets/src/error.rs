//! Error types for asset partitioning.

use std::path::PathBuf;

/// Failures that stop asset processing outright.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    /// Reading an asset or writing an intermediate file failed.
    #[error("asset I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The partition could not be serialized.
    #[error("failed to write asset pack cache: {reason}")]
    Serialization {
        /// Description of the failure.
        reason: String,
    },
}

impl AssetError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AssetError::Io {
            path: path.into(),
            source,
        }
    }
}
