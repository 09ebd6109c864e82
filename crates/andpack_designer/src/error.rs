//! Error types for designer generation.

use std::path::PathBuf;

use andpack_cache::CacheError;

/// Failures that stop designer generation outright.
#[derive(Debug, thiserror::Error)]
pub enum DesignerError {
    /// Reading a resource or writing a generated file failed.
    #[error("designer I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The parse cache could not be written.
    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl DesignerError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DesignerError::Io {
            path: path.into(),
            source,
        }
    }
}
