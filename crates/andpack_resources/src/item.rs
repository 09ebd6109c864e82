//! Resource items and their discovery.

use std::fmt;
use std::path::{Path, PathBuf};

use andpack_common::LogicalPath;
use andpack_config::ResourceEntry;
use andpack_diagnostics::{codes, Diagnostic, DiagnosticSink};
use serde::{Deserialize, Serialize};

use crate::error::ResourceError;

/// Whether a contributing project is the application being built or one of
/// its libraries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    /// The project being built.
    App,
    /// A referenced library, in reference order.
    Library(usize),
}

/// The project a resource item came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceOrigin {
    /// Project name, used in diagnostics.
    pub project: String,
    /// App or library.
    pub role: Role,
}

impl ResourceOrigin {
    /// Origin for the application's own items.
    pub fn app(project: &str) -> Self {
        Self {
            project: project.to_string(),
            role: Role::App,
        }
    }

    /// Origin for the `index`th referenced library.
    pub fn library(project: &str, index: usize) -> Self {
        Self {
            project: project.to_string(),
            role: Role::Library(index),
        }
    }

    /// Returns `true` for the application's own items.
    pub fn is_app(&self) -> bool {
        self.role == Role::App
    }
}

impl fmt::Display for ResourceOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.project)
    }
}

/// One resource file declared by a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceItem {
    /// Path inside `res/`, original case, e.g. `drawable/UPPER_image.png`.
    pub logical: LogicalPath,
    /// File on disk.
    pub source: PathBuf,
    /// Contributing project.
    pub origin: ResourceOrigin,
}

impl ResourceItem {
    /// Directory part of the logical path (`values-fr`, `drawable`, ...).
    pub fn dir_name(&self) -> &str {
        self.logical.first_segment()
    }

    /// File name part of the logical path.
    pub fn file_name(&self) -> &str {
        self.logical.file_name()
    }
}

/// Maps an on-disk file name to its logical name: `.axml` layouts become
/// `.xml`.
fn normalize_extension(logical: LogicalPath) -> LogicalPath {
    let renamed = logical
        .file_name()
        .strip_suffix(".axml")
        .map(|stem| format!("{stem}.xml"));
    match renamed {
        Some(name) => logical.with_file_name(&name),
        None => logical,
    }
}

/// Discovers every file under a resource directory.
///
/// Files directly in the root (such as `AboutResources.txt`) and dotfiles are
/// not resources. Items come back sorted by logical path.
pub fn collect_dir_items(root: &Path, origin: &ResourceOrigin) -> Result<Vec<ResourceItem>, ResourceError> {
    let files = andpack_common::fs::list_files(root).map_err(|e| ResourceError::io(root, e))?;
    let mut items = Vec::new();
    for source in files {
        let Some(logical) = LogicalPath::relative(&source, root) else {
            continue;
        };
        if logical.segments().count() < 2 || logical.file_name().starts_with('.') {
            continue;
        }
        items.push(ResourceItem {
            logical: normalize_extension(logical),
            source,
            origin: origin.clone(),
        });
    }
    items.sort_by(|a, b| a.logical.cmp(&b.logical));
    Ok(items)
}

/// Discovers a project's own resource items: everything under its resource
/// directory plus explicit `[[resources]]` entries.
///
/// A `logical_name` containing `\` is rejected (APT0005) since logical names
/// always use `/`.
pub fn collect_project_items(
    project_dir: &Path,
    resource_dir: &str,
    entries: &[ResourceEntry],
    origin: &ResourceOrigin,
    sink: &DiagnosticSink,
) -> Result<Vec<ResourceItem>, ResourceError> {
    let root = project_dir.join(resource_dir);
    let mut items = collect_dir_items(&root, origin)?;
    for entry in entries {
        let source = project_dir.join(&entry.path);
        let logical = match &entry.logical_name {
            Some(name) if name.contains('\\') => {
                sink.emit(
                    Diagnostic::error(
                        codes::ILLEGAL_LOGICAL_NAME,
                        format!("Logical name '{name}' contains an illegal path separator '\\'"),
                    )
                    .in_file(&source)
                    .for_project(&origin.project),
                );
                continue;
            }
            Some(name) => LogicalPath::new(name),
            None => match LogicalPath::relative(&source, &root) {
                Some(rel) => rel,
                None => LogicalPath::new(&entry.path),
            },
        };
        let logical = normalize_extension(logical);
        items.retain(|i| i.source != source);
        items.push(ResourceItem {
            logical,
            source,
            origin: origin.clone(),
        });
    }
    items.sort_by(|a, b| a.logical.cmp(&b.logical));
    Ok(items)
}
