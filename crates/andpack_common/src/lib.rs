//! Shared foundational types used across the andpack packaging pipeline.
//!
//! This crate provides content hashing, the internal error type, logical
//! (forward-slash) resource paths, and the file helpers every stage uses to
//! keep incremental outputs stable: write-if-changed, copy-if-changed,
//! read-only clearing, and stale file removal.

#![warn(missing_docs)]

pub mod fs;
pub mod hash;
pub mod path;
pub mod result;

pub use hash::{stable_hash64, ContentHash};
pub use path::LogicalPath;
pub use result::{AndpackResult, InternalError};
