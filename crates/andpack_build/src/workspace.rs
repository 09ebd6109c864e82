//! Building a project together with the library projects it references.
//!
//! References form a DAG. Projects are grouped into levels where every
//! project only depends on earlier levels; a level builds in parallel once
//! the previous one is done, so a library's `.aar` is complete before any
//! project that imports it resolves its references.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use andpack_cache::Namespace;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use rayon::prelude::*;

use crate::context::BuildContext;
use crate::engine::BuildReport;
use crate::error::BuildError;
use crate::plan::build_project;
use crate::project::Project;

/// How one project's build ended.
#[derive(Debug)]
pub enum ProjectOutcome {
    /// The engine ran; the report says whether it succeeded.
    Finished(BuildReport),
    /// The build could not proceed.
    Aborted(BuildError),
    /// A referenced project failed, so this one was not built.
    Blocked,
}

/// Result of one project in a workspace build.
#[derive(Debug)]
pub struct ProjectResult {
    /// Project name.
    pub name: String,
    /// Project directory.
    pub dir: PathBuf,
    /// What happened.
    pub outcome: ProjectOutcome,
}

impl ProjectResult {
    /// Returns `true` if the project built without errors.
    pub fn succeeded(&self) -> bool {
        matches!(&self.outcome, ProjectOutcome::Finished(report) if report.succeeded)
    }
}

/// A root project and everything it references, transitively.
pub struct Workspace {
    projects: DiGraph<Project, ()>,
    root: NodeIndex,
}

fn canonical(dir: &Path) -> Result<PathBuf, BuildError> {
    dir.canonicalize().map_err(|e| BuildError::io(dir, e))
}

impl Workspace {
    /// Loads the project in `dir` and, recursively, its project references.
    pub fn load(dir: &Path, configuration: &str) -> Result<Self, BuildError> {
        let mut projects: DiGraph<Project, ()> = DiGraph::new();
        let mut index: BTreeMap<PathBuf, NodeIndex> = BTreeMap::new();
        let root_dir = canonical(dir)?;
        let root = projects.add_node(Project::load(&root_dir, configuration)?);
        index.insert(root_dir, root);

        let mut pending = vec![root];
        while let Some(node) = pending.pop() {
            for reference in projects[node].project_references() {
                let reference = canonical(&reference)?;
                let dependency = match index.get(&reference) {
                    Some(&existing) => existing,
                    None => {
                        let loaded = projects.add_node(Project::load(&reference, configuration)?);
                        index.insert(reference, loaded);
                        pending.push(loaded);
                        loaded
                    }
                };
                projects.add_edge(dependency, node, ());
            }
        }

        toposort(&projects, None).map_err(|cycle| BuildError::ReferenceCycle {
            path: projects[cycle.node_id()].dir.clone(),
        })?;
        Ok(Self { projects, root })
    }

    /// The project the workspace was loaded from.
    pub fn root(&self) -> &Project {
        &self.projects[self.root]
    }

    /// Number of projects, the root included.
    pub fn len(&self) -> usize {
        self.projects.node_count()
    }

    /// Returns `true` if the workspace has no projects, which never happens
    /// for a loaded workspace.
    pub fn is_empty(&self) -> bool {
        self.projects.node_count() == 0
    }

    /// Projects grouped by depth: level 0 has no references, level `n`
    /// only references projects of lower levels.
    pub fn levels(&self) -> Result<Vec<Vec<NodeIndex>>, BuildError> {
        let order = toposort(&self.projects, None).map_err(|cycle| BuildError::ReferenceCycle {
            path: self.projects[cycle.node_id()].dir.clone(),
        })?;
        let mut depth: BTreeMap<NodeIndex, usize> = BTreeMap::new();
        let mut levels: Vec<Vec<NodeIndex>> = Vec::new();
        for node in order {
            let level = self
                .projects
                .neighbors_directed(node, Direction::Incoming)
                .filter_map(|dep| depth.get(&dep))
                .map(|d| d + 1)
                .max()
                .unwrap_or(0);
            depth.insert(node, level);
            if levels.len() <= level {
                levels.resize_with(level + 1, Vec::new);
            }
            levels[level].push(node);
        }
        for level in &mut levels {
            level.sort_by(|a, b| self.projects[*a].name().cmp(self.projects[*b].name()));
        }
        Ok(levels)
    }

    /// Builds every project, dependencies first.
    ///
    /// A design-time build only runs for the root project: referenced
    /// projects contribute through whatever `.aar` they last produced.
    pub fn build(&self, context: &BuildContext, namespace: Namespace) -> Result<Vec<ProjectResult>, BuildError> {
        if namespace == Namespace::DesignTime {
            let root = self.root();
            return Ok(vec![Self::run_one(root, context, namespace)]);
        }

        let mut finished: BTreeMap<NodeIndex, bool> = BTreeMap::new();
        let mut results = Vec::with_capacity(self.len());
        for level in self.levels()? {
            let level_results: Vec<(NodeIndex, ProjectResult)> = level
                .par_iter()
                .map(|&node| {
                    let project = &self.projects[node];
                    let blocked = self
                        .projects
                        .neighbors_directed(node, Direction::Incoming)
                        .any(|dep| !finished.get(&dep).copied().unwrap_or(false));
                    if blocked {
                        tracing::info!(project = %project.name(), "skipped: a referenced project failed");
                        let result = ProjectResult {
                            name: project.name().to_string(),
                            dir: project.dir.clone(),
                            outcome: ProjectOutcome::Blocked,
                        };
                        return (node, result);
                    }
                    (node, Self::run_one(project, context, namespace))
                })
                .collect();
            for (node, result) in level_results {
                finished.insert(node, result.succeeded());
                results.push(result);
            }
        }
        Ok(results)
    }

    fn run_one(project: &Project, context: &BuildContext, namespace: Namespace) -> ProjectResult {
        let outcome = match build_project(project, context, namespace) {
            Ok(report) => ProjectOutcome::Finished(report),
            Err(err) => ProjectOutcome::Aborted(err),
        };
        ProjectResult {
            name: project.name().to_string(),
            dir: project.dir.clone(),
            outcome,
        }
    }

    /// Every project in the order a full build starts them.
    pub fn build_order(&self) -> Result<Vec<&Project>, BuildError> {
        Ok(self
            .levels()?
            .into_iter()
            .flatten()
            .map(|node| &self.projects[node])
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_project(dir: &Path, toml: &str) {
        std::fs::create_dir_all(dir).unwrap();
        std::fs::write(dir.join("andpack.toml"), toml).unwrap();
    }

    #[test]
    fn library_is_a_level_below_the_app() {
        let tmp = tempfile::tempdir().unwrap();
        write_project(&tmp.path().join("Lib1"), "[project]\nname = \"Lib1\"\nkind = \"library\"\n");
        write_project(
            &tmp.path().join("App1"),
            "[project]\nname = \"App1\"\npackage = \"com.example.app1\"\n\n[[references]]\nproject = \"../Lib1\"\n",
        );
        let workspace = Workspace::load(&tmp.path().join("App1"), "Debug").unwrap();
        assert_eq!(workspace.len(), 2);
        assert_eq!(workspace.root().name(), "App1");

        let levels = workspace.levels().unwrap();
        let names: Vec<Vec<&str>> = levels
            .iter()
            .map(|l| l.iter().map(|n| workspace.projects[*n].name()).collect())
            .collect();
        assert_eq!(names, vec![vec!["Lib1"], vec!["App1"]]);
    }

    #[test]
    fn shared_library_is_loaded_once() {
        let tmp = tempfile::tempdir().unwrap();
        write_project(&tmp.path().join("Core"), "[project]\nname = \"Core\"\nkind = \"library\"\n");
        write_project(
            &tmp.path().join("Lib1"),
            "[project]\nname = \"Lib1\"\nkind = \"library\"\n\n[[references]]\nproject = \"../Core\"\n",
        );
        write_project(
            &tmp.path().join("App1"),
            "[project]\nname = \"App1\"\npackage = \"com.example.app1\"\n\n[[references]]\nproject = \"../Lib1\"\n\n[[references]]\nproject = \"../Core\"\n",
        );
        let workspace = Workspace::load(&tmp.path().join("App1"), "Debug").unwrap();
        assert_eq!(workspace.len(), 3);
        assert_eq!(workspace.levels().unwrap().len(), 3);
    }

    #[test]
    fn reference_cycle_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        write_project(
            &tmp.path().join("A"),
            "[project]\nname = \"A\"\nkind = \"library\"\n\n[[references]]\nproject = \"../B\"\n",
        );
        write_project(
            &tmp.path().join("B"),
            "[project]\nname = \"B\"\nkind = \"library\"\n\n[[references]]\nproject = \"../A\"\n",
        );
        let err = Workspace::load(&tmp.path().join("A"), "Debug").err().unwrap();
        assert!(matches!(err, BuildError::ReferenceCycle { .. }));
    }
}
