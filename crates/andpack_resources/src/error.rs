//! Error types for the resource merger.

use std::path::PathBuf;

/// Failures that stop resource merging outright.
///
/// Problems with the resources themselves (bad names, duplicates, unresolved
/// references) are diagnostics, not errors.
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    /// Reading a source or writing an intermediate file failed.
    #[error("resource I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The merged tree could not be serialized.
    #[error("failed to write resource path cache: {reason}")]
    Serialization {
        /// Description of the failure.
        reason: String,
    },
}

impl ResourceError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ResourceError::Io {
            path: path.into(),
            source,
        }
    }
}
