//! Android resource merging.
//!
//! Resource files are collected from the application project and every
//! imported library ([`collect_project_items`], [`collect_dir_items`]),
//! validated and merged into one case-insensitive [`MergedResourceTree`]
//! ([`merge`]), checked for unresolved references ([`validate_references`])
//! and finally written to the intermediate `res/` directory with layout
//! rewriting applied ([`materialize`]).

#![warn(missing_docs)]

pub mod dir;
pub mod error;
pub mod item;
pub mod merge;
pub mod ninepatch;
pub mod output;
pub mod references;
pub mod rewrite;
pub mod tree;
pub mod values;

pub use dir::{ResourceDir, RESOURCE_TYPES};
pub use error::ResourceError;
pub use item::{collect_dir_items, collect_project_items, ResourceItem, ResourceOrigin, Role};
pub use merge::{merge, MergeOptions};
pub use ninepatch::{validate_nine_patch, NinePatchError};
pub use output::{materialize, MaterializeReport};
pub use references::{validate_references, SymbolTable};
pub use rewrite::{hashed_package, CustomViewMap, RewriteRules};
pub use tree::{parse_case_map, MergedEntry, MergedResourceTree, CASE_MAP_FILE, RESOURCE_PATHS_FILE};
pub use values::{parse_values, XmlError};
