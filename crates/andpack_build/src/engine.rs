//! The incremental engine: a graph of targets run in dependency order
//! against a cache store.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use andpack_cache::{CacheStore, Decision, RunReason};
use andpack_common::InternalError;
use andpack_diagnostics::Diagnostic;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;

use crate::error::BuildError;
use crate::target::{BuildState, Target};

/// What happened to one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetStatus {
    /// Inputs and outputs were up to date.
    Skipped,
    /// The target ran, for the given reason.
    Built(RunReason),
    /// The target ran and reported errors.
    Failed,
    /// A dependency failed; the target did not run.
    Blocked,
}

impl fmt::Display for TargetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetStatus::Skipped => f.write_str("skipped"),
            TargetStatus::Built(reason) => write!(f, "built ({reason})"),
            TargetStatus::Failed => f.write_str("failed"),
            TargetStatus::Blocked => f.write_str("blocked"),
        }
    }
}

/// One line of a [`BuildReport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetReport {
    /// Target name.
    pub name: &'static str,
    /// Outcome.
    pub status: TargetStatus,
}

/// Outcome of building one project.
#[derive(Debug, Clone)]
pub struct BuildReport {
    /// Project name.
    pub project: String,
    /// Every target in execution order.
    pub targets: Vec<TargetReport>,
    /// Diagnostics reported while building.
    pub diagnostics: Vec<Diagnostic>,
    /// `true` when no error was reported.
    pub succeeded: bool,
}

impl BuildReport {
    /// The status of `target`, if it was part of the build.
    pub fn status(&self, target: &str) -> Option<&TargetStatus> {
        self.targets.iter().find(|t| t.name == target).map(|t| &t.status)
    }

    /// Returns `true` if `target` was skipped.
    pub fn was_skipped(&self, target: &str) -> bool {
        self.status(target) == Some(&TargetStatus::Skipped)
    }

    /// Returns `true` if `target` ran, successfully or not.
    pub fn ran(&self, target: &str) -> bool {
        matches!(self.status(target), Some(TargetStatus::Built(_) | TargetStatus::Failed))
    }
}

/// Targets and the dependency edges between them.
#[derive(Default)]
pub struct TargetGraph {
    graph: DiGraph<Box<dyn Target>, ()>,
    index: BTreeMap<&'static str, NodeIndex>,
}

impl TargetGraph {
    /// An empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `target`, running after every target named in `dependencies`.
    /// Dependencies must already be in the graph.
    pub fn add(&mut self, target: impl Target + 'static, dependencies: &[&'static str]) -> Result<(), BuildError> {
        let name = target.name();
        let mut edges = Vec::with_capacity(dependencies.len());
        for dependency in dependencies {
            let Some(&from) = self.index.get(dependency) else {
                return Err(BuildError::UnknownDependency {
                    target: name.to_string(),
                    dependency: dependency.to_string(),
                });
            };
            edges.push(from);
        }
        let node = self.graph.add_node(Box::new(target));
        for from in edges {
            self.graph.add_edge(from, node, ());
        }
        self.index.insert(name, node);
        Ok(())
    }

    /// Returns `true` if a target of that name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Target names in execution order.
    pub fn names(&self) -> Result<Vec<&'static str>, BuildError> {
        Ok(self.order()?.into_iter().map(|n| self.graph[n].name()).collect())
    }

    fn order(&self) -> Result<Vec<NodeIndex>, BuildError> {
        toposort(&self.graph, None).map_err(|cycle| {
            InternalError::new(format!(
                "target graph has a cycle through '{}'",
                self.graph[cycle.node_id()].name()
            ))
            .into()
        })
    }

    /// Runs every target in dependency order.
    ///
    /// A target whose inputs match its record is skipped and restores its
    /// results instead. A target that raises errors is recorded as failed so
    /// it runs again next time, and everything depending on it is blocked.
    pub fn run(&self, store: &CacheStore, state: &mut BuildState<'_>) -> Result<Vec<TargetReport>, BuildError> {
        let mut statuses: BTreeMap<NodeIndex, TargetStatus> = BTreeMap::new();
        let mut reports = Vec::with_capacity(self.graph.node_count());
        for node in self.order()? {
            let target = &self.graph[node];
            let name = target.name();
            let blocked = self
                .graph
                .neighbors_directed(node, Direction::Incoming)
                .any(|dep| matches!(statuses.get(&dep), Some(TargetStatus::Failed | TargetStatus::Blocked)));
            let status = if blocked {
                tracing::info!("Target \"{name}\" blocked: a dependency failed");
                TargetStatus::Blocked
            } else {
                run_target(target.as_ref(), store, state)?
            };
            statuses.insert(node, status.clone());
            reports.push(TargetReport { name, status });
        }
        Ok(reports)
    }
}

fn run_target(target: &dyn Target, store: &CacheStore, state: &mut BuildState<'_>) -> Result<TargetStatus, BuildError> {
    let name = target.name();
    let errors_before = state.sink.error_count();
    state.deferred.clear();
    let inputs = target.inputs(state)?;

    let mut decision = store.should_run(name, &inputs)?;
    if decision.is_skip() {
        if target.restore(state)? {
            tracing::info!("Target \"{name}\" skipped: all inputs up to date");
            return Ok(TargetStatus::Skipped);
        }
        decision = Decision::Run(RunReason::OutputMissing(store.record_path(name)));
    }
    let Decision::Run(reason) = decision else {
        return Ok(TargetStatus::Skipped);
    };

    tracing::info!("Building target \"{name}\": {reason}");
    state.flush_deferred();
    let outputs: Vec<PathBuf> = target.execute(state)?;
    if state.sink.error_count() > errors_before {
        store.commit_failed(name, &inputs)?;
        tracing::info!("Target \"{name}\" failed");
        return Ok(TargetStatus::Failed);
    }
    store.commit(name, &inputs, &outputs)?;
    Ok(TargetStatus::Built(reason))
}
