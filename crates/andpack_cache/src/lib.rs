//! Persistent incremental build cache.
//!
//! Each build target owns a [`CacheRecord`] listing the stamps (content hash,
//! size and modification time) of its inputs, the named properties it was run
//! with, and the outputs it produced. [`CacheStore::should_run`] compares the
//! current inputs against that record; [`CacheStore::commit`] rewrites it after
//! the target ran. Records live on disk so a second build process observes the
//! same decisions. Full and design-time builds use separate namespaces.

#![warn(missing_docs)]

pub mod artifact;
pub mod error;
pub mod hasher;
pub mod props;
pub mod record;
pub mod store;

pub use artifact::ArtifactStore;
pub use error::CacheError;
pub use hasher::{ChangeSet, SourceHasher};
pub use props::BuildProps;
pub use record::{CacheRecord, FileStamp, TargetInputs, TargetOutcome};
pub use store::{CacheStore, Decision, Namespace, RunReason};
