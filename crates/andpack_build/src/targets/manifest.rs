//! `_MergeManifest`.

use std::path::PathBuf;

use andpack_cache::TargetInputs;
use andpack_common::fs::write_if_changed;
use andpack_imports::{merge_manifests, LibraryManifest};

use crate::error::BuildError;
use crate::project::Project;
use crate::target::{BuildState, Target};

use super::MERGE_MANIFEST;

/// The manifest used when a project does not have one.
fn default_manifest(project: &Project) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<manifest xmlns:android="http://schemas.android.com/apk/res/android" package="{package}" android:versionName="{version}">
  <application android:label="{name}">
  </application>
</manifest>
"#,
        package = project.package(),
        version = project.config.project.version,
        name = project.name(),
    )
}

/// Merges every library manifest into the project's and writes the result
/// to `<intermediate>/android/AndroidManifest.xml`.
pub struct MergeManifest;

fn library_manifests(state: &BuildState<'_>) -> Vec<PathBuf> {
    state.imports.libraries.iter().filter_map(|l| l.manifest.clone()).collect()
}

impl Target for MergeManifest {
    fn name(&self) -> &'static str {
        MERGE_MANIFEST
    }

    fn inputs(&self, state: &mut BuildState<'_>) -> Result<TargetInputs, BuildError> {
        Ok(TargetInputs::new()
            .file(state.project.source_manifest())
            .files(library_manifests(state))
            .property("package", state.project.package())
            .property("version", &state.project.config.project.version))
    }

    fn execute(&self, state: &mut BuildState<'_>) -> Result<Vec<PathBuf>, BuildError> {
        let project = state.project;
        let source = project.source_manifest();
        let app = if source.is_file() {
            LibraryManifest::read(&source).map_err(|e| BuildError::io(&source, e))?
        } else {
            LibraryManifest {
                path: source,
                text: default_manifest(project),
            }
        };
        let mut libraries = Vec::new();
        for path in library_manifests(state) {
            libraries.push(LibraryManifest::read(&path).map_err(|e| BuildError::io(&path, e))?);
        }

        let Some(merged) = merge_manifests(&app, &libraries, &project.package(), project.name(), state.sink) else {
            return Ok(Vec::new());
        };
        let out = project.manifest_out();
        write_if_changed(&out, merged.as_bytes()).map_err(|e| BuildError::io(&out, e))?;
        Ok(vec![out])
    }
}
