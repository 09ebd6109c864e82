//! `_ResolveLibraryProjectImports`.

use std::path::PathBuf;

use andpack_cache::TargetInputs;
use andpack_imports::{resolve_imports, ImportSet, IMPORTS_CACHE_FILE};

use crate::error::BuildError;
use crate::target::{BuildState, Target};

use super::RESOLVE_IMPORTS;

/// Resolves every referenced archive and records the result in the active
/// namespace. Extractions under `lp/` are shared by both namespaces.
pub struct ResolveImports;

impl Target for ResolveImports {
    fn name(&self) -> &'static str {
        RESOLVE_IMPORTS
    }

    fn inputs(&self, state: &mut BuildState<'_>) -> Result<TargetInputs, BuildError> {
        let archives = state.project.referenced_archives();
        let listed: Vec<String> = archives.iter().map(|a| a.display().to_string()).collect();
        Ok(TargetInputs::new()
            .files(archives)
            .property("references", listed.join(";")))
    }

    fn execute(&self, state: &mut BuildState<'_>) -> Result<Vec<PathBuf>, BuildError> {
        let archives = state.project.referenced_archives();
        let set = resolve_imports(
            &archives,
            &state.project.intermediate(),
            state.project.name(),
            state.sink,
        )?;
        let dir = state.namespace_dir();
        set.save(&dir)?;

        let mut outputs = vec![dir.join(IMPORTS_CACHE_FILE)];
        for library in &set.libraries {
            outputs.extend(library.extracted_outputs());
        }
        tracing::debug!(libraries = set.libraries.len(), "library imports resolved");
        state.imports = set;
        Ok(outputs)
    }

    fn restore(&self, state: &mut BuildState<'_>) -> Result<bool, BuildError> {
        match ImportSet::load(&state.namespace_dir()) {
            Some(set) => {
                state.imports = set;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
