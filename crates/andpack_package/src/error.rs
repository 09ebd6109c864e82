//! Error type for archive assembly.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Failures while writing or reading archives.
///
/// Invalid native library layouts are diagnostics, not errors.
#[derive(Debug, Error)]
pub enum PackageError {
    /// Reading an input or writing an archive failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// The file involved.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The zip encoder or decoder rejected an archive.
    #[error("archive error in {}: {reason}", path.display())]
    Archive {
        /// The archive.
        path: PathBuf,
        /// What went wrong.
        reason: String,
    },

    /// Library metadata could not be serialized.
    #[error("failed to serialize {}: {reason}", path.display())]
    Serialization {
        /// The entry being written.
        path: PathBuf,
        /// What went wrong.
        reason: String,
    },
}

impl PackageError {
    pub(crate) fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        PackageError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub(crate) fn archive(path: impl AsRef<Path>, err: zip::result::ZipError) -> Self {
        PackageError::Archive {
            path: path.as_ref().to_path_buf(),
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn archive_error_names_the_file() {
        let err = PackageError::archive("bin/app.apk", zip::result::ZipError::FileNotFound);
        let text = err.to_string();
        assert!(text.starts_with("archive error in bin/app.apk:"), "{text}");
    }
}
