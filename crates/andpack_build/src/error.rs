//! Error type of the build engine.
//!
//! Each stage crate has its own error; they all convert into [`BuildError`]
//! so targets can use `?` throughout.

use std::path::{Path, PathBuf};

use andpack_assets::AssetError;
use andpack_cache::CacheError;
use andpack_common::InternalError;
use andpack_config::ConfigError;
use andpack_designer::DesignerError;
use andpack_imports::ImportError;
use andpack_package::PackageError;
use andpack_resources::ResourceError;
use thiserror::Error;

/// Failures that stop a project build outright.
///
/// Problems with the project's content are diagnostics instead.
#[derive(Debug, Error)]
pub enum BuildError {
    /// File system access failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// The file involved.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// `andpack.toml` could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The cache store failed.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// Resource merging failed.
    #[error(transparent)]
    Resource(#[from] ResourceError),

    /// Asset handling failed.
    #[error(transparent)]
    Asset(#[from] AssetError),

    /// Designer generation failed.
    #[error(transparent)]
    Designer(#[from] DesignerError),

    /// Library import resolution failed.
    #[error(transparent)]
    Import(#[from] ImportError),

    /// Packaging failed.
    #[error(transparent)]
    Package(#[from] PackageError),

    /// A bug in andpack itself.
    #[error(transparent)]
    Internal(#[from] InternalError),

    /// Project references form a cycle.
    #[error("project reference cycle involving {}", path.display())]
    ReferenceCycle {
        /// A project on the cycle.
        path: PathBuf,
    },

    /// A target named a dependency that is not registered.
    #[error("target '{target}' depends on unknown target '{dependency}'")]
    UnknownDependency {
        /// The dependent target.
        target: String,
        /// The missing dependency.
        dependency: String,
    },
}

impl BuildError {
    pub(crate) fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        BuildError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        let err = BuildError::UnknownDependency {
            target: "_Sign".into(),
            dependency: "_Missing".into(),
        };
        assert_eq!(err.to_string(), "target '_Sign' depends on unknown target '_Missing'");
        let err = BuildError::io("obj/res", std::io::Error::other("denied"));
        assert_eq!(err.to_string(), "I/O error on obj/res: denied");
    }
}
