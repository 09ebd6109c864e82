//! The unit of incremental work.

use std::path::PathBuf;

use andpack_assets::AssetPartition;
use andpack_cache::{Namespace, TargetInputs};
use andpack_diagnostics::{Diagnostic, DiagnosticSink};
use andpack_imports::ImportSet;
use andpack_package::NativeLibrary;
use andpack_resources::{MergedResourceTree, ResourceItem};

use crate::context::BuildContext;
use crate::error::BuildError;
use crate::project::Project;

/// State threaded through the targets of one project build.
///
/// A target that runs leaves its results here; a skipped target restores
/// them from what it persisted last time.
pub struct BuildState<'a> {
    /// The project being built.
    pub project: &'a Project,
    /// Process-wide settings.
    pub context: &'a BuildContext,
    /// Where diagnostics go.
    pub sink: &'a DiagnosticSink,
    /// Full or design-time.
    pub namespace: Namespace,
    /// Resolved library imports.
    pub imports: ImportSet,
    /// Own resource items, collected while computing inputs.
    pub own_resources: Vec<ResourceItem>,
    /// Imported resource items, in library precedence order.
    pub imported_resources: Vec<ResourceItem>,
    /// The merged resource tree.
    pub tree: Option<MergedResourceTree>,
    /// Assets by pack.
    pub partition: Option<AssetPartition>,
    /// Native libraries to package.
    pub native: Vec<NativeLibrary>,
    /// Warnings computed while evaluating inputs, reported when the target
    /// actually runs.
    pub deferred: Vec<Diagnostic>,
    /// Compiled `classes.jar`, when Java was compiled.
    pub classes_jar: Option<PathBuf>,
}

impl<'a> BuildState<'a> {
    /// Fresh state for one build of `project`.
    pub fn new(project: &'a Project, context: &'a BuildContext, sink: &'a DiagnosticSink, namespace: Namespace) -> Self {
        Self {
            project,
            context,
            sink,
            namespace,
            imports: ImportSet::default(),
            own_resources: Vec::new(),
            imported_resources: Vec::new(),
            tree: None,
            partition: None,
            native: Vec::new(),
            deferred: Vec::new(),
            classes_jar: None,
        }
    }

    /// Root of the active cache namespace.
    pub fn namespace_dir(&self) -> PathBuf {
        self.project.namespace_dir(self.namespace)
    }

    /// Emits the deferred warnings.
    pub fn flush_deferred(&mut self) {
        self.sink.extend(std::mem::take(&mut self.deferred));
    }
}

/// One named step of a project build.
///
/// The engine asks for [`inputs`](Target::inputs) every time, compares them
/// with the cache record and then calls either [`execute`](Target::execute)
/// or [`restore`](Target::restore).
pub trait Target: Send + Sync {
    /// Target name as shown in logs (`_UpdateAndroidResgen`).
    fn name(&self) -> &'static str;

    /// The files and properties that decide whether the target runs.
    fn inputs(&self, state: &mut BuildState<'_>) -> Result<TargetInputs, BuildError>;

    /// Does the work. Returns the files produced.
    fn execute(&self, state: &mut BuildState<'_>) -> Result<Vec<PathBuf>, BuildError>;

    /// Rebuilds in-memory results after a skip. Returning `false` means the
    /// persisted state is unusable and the target has to run after all.
    fn restore(&self, _state: &mut BuildState<'_>) -> Result<bool, BuildError> {
        Ok(true)
    }
}
