//! Parsing and validation of `andpack.toml` project configuration files.
//!
//! This crate reads the project configuration file and produces a strongly
//! typed [`ProjectConfig`]. Build item metadata (asset packs, delivery types,
//! logical names, ABIs) is validated here at ingestion time, and named
//! configurations (`[profiles.Release]`) are folded into a [`ResolvedBuild`].

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod resolve;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str, CONFIG_FILE};
pub use resolve::{resolve_profile, ResolvedBuild};
pub use types::*;
