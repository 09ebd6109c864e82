//! Forward-slash logical paths for resources and assets.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// A relative, forward-slash separated path such as `drawable/icon.png`.
///
/// Logical paths are what the merged resource tree, asset packs and archive
/// entries are keyed by. They never start with a separator and never contain
/// `.` or `..` segments.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogicalPath(String);

impl LogicalPath {
    /// Builds a logical path from text, normalizing `\` to `/` and dropping
    /// empty and `.` segments.
    pub fn new(text: &str) -> Self {
        let joined = text
            .split(['/', '\\'])
            .filter(|s| !s.is_empty() && *s != ".")
            .collect::<Vec<_>>()
            .join("/");
        Self(joined)
    }

    /// Builds a logical path from `path` relative to `base`.
    ///
    /// Returns `None` if `path` is not under `base` or escapes it.
    pub fn relative(path: &Path, base: &Path) -> Option<Self> {
        let rel = path.strip_prefix(base).ok()?;
        let mut parts = Vec::new();
        for component in rel.components() {
            match component {
                Component::Normal(s) => parts.push(s.to_string_lossy().into_owned()),
                Component::CurDir => {}
                _ => return None,
            }
        }
        Some(Self(parts.join("/")))
    }

    /// Returns the path as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns a lower-cased copy.
    pub fn to_lowercase(&self) -> Self {
        Self(self.0.to_lowercase())
    }

    /// Returns the path segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }

    /// Returns the first segment (the resource directory for resources).
    pub fn first_segment(&self) -> &str {
        self.0.split('/').next().unwrap_or("")
    }

    /// Returns the final segment.
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or("")
    }

    /// Returns the path with its final segment replaced.
    pub fn with_file_name(&self, name: &str) -> Self {
        match self.0.rfind('/') {
            Some(pos) => Self(format!("{}/{}", &self.0[..pos], name)),
            None => Self(name.to_string()),
        }
    }

    /// Prepends `prefix` as leading segments.
    pub fn prefixed(&self, prefix: &str) -> Self {
        Self::new(&format!("{prefix}/{}", self.0))
    }

    /// Resolves the logical path against a base directory.
    pub fn to_path(&self, base: &Path) -> PathBuf {
        let mut out = base.to_path_buf();
        for seg in self.segments() {
            out.push(seg);
        }
        out
    }

    /// Returns `true` if the path has no segments.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for LogicalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for LogicalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LogicalPath({:?})", self.0)
    }
}

impl From<&str> for LogicalPath {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}
