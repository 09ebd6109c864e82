//! The build engine.
//!
//! A project build is a graph of named targets (`_GenerateAndroidResourceDir`,
//! `_UpdateAndroidResgen`, `_BuildApk`, ...). Each target declares the files
//! and properties it depends on; the engine compares them with the target's
//! cache record and either skips the target or runs it and records the new
//! state. External tools (`javac`, `d8`, a resource compiler, a signer) run
//! as subprocesses whose output is turned into diagnostics.
//!
//! [`Workspace`] builds a project together with the library projects it
//! references, dependencies first and independent projects in parallel.

#![warn(missing_docs)]

pub mod context;
pub mod engine;
pub mod error;
pub mod plan;
pub mod project;
pub mod target;
pub mod targets;
pub mod tool;
pub mod workspace;

pub use context::BuildContext;
pub use engine::{BuildReport, TargetGraph, TargetReport, TargetStatus};
pub use error::BuildError;
pub use plan::{build_project, clean_project, design_time_graph, full_graph};
pub use project::{Project, MANIFEST_FILE};
pub use target::{BuildState, Target};
pub use workspace::{ProjectOutcome, ProjectResult, Workspace};

pub use andpack_cache::Namespace;
