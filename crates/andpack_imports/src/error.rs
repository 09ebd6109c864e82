//! Error types for library import resolution.

use std::path::PathBuf;

use andpack_cache::CacheError;

/// Failures of the import resolver.
///
/// A corrupt archive is an error here so that extraction can bail out from
/// deep inside the zip reader; the resolver turns it into a diagnostic and
/// carries on with the remaining references.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    /// Reading an archive or writing an extracted file failed.
    #[error("import I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The archive is not a readable zip file.
    #[error("{path} is not a valid archive: {reason}")]
    CorruptArchive {
        /// The archive.
        path: PathBuf,
        /// What the zip reader reported.
        reason: String,
    },

    /// A cache file could not be written.
    #[error("failed to write {path}: {reason}")]
    Serialization {
        /// The cache file.
        path: PathBuf,
        /// Description of the failure.
        reason: String,
    },

    /// Stamping an archive failed.
    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl ImportError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ImportError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn corrupt(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        ImportError::CorruptArchive {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
