//! `build.props`: the property set a namespace's records were produced under.
//!
//! Stored as sorted `key=value` lines. When any property differs from the
//! stored set, every record in the namespace is discarded.

use std::collections::BTreeMap;
use std::path::Path;

use andpack_common::fs::write_if_changed;

use crate::error::CacheError;

/// File name of the property snapshot within a namespace directory.
pub const BUILD_PROPS_FILE: &str = "build.props";

/// Build-wide properties (configuration, package format, ABIs, tool versions).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildProps(pub BTreeMap<String, String>);

impl BuildProps {
    /// Creates an empty property set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a property.
    pub fn with(mut self, key: &str, value: impl ToString) -> Self {
        self.0.insert(key.to_string(), value.to_string());
        self
    }

    /// Renders the properties as `key=value` lines.
    pub fn to_text(&self) -> String {
        self.0.iter().map(|(k, v)| format!("{k}={v}\n")).collect()
    }

    /// Parses `key=value` lines, ignoring blank lines and lines without `=`.
    pub fn parse(text: &str) -> Self {
        let map = text
            .lines()
            .filter_map(|line| line.split_once('='))
            .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
            .collect();
        Self(map)
    }

    /// Loads the snapshot from a namespace directory, `None` if absent.
    pub fn load(dir: &Path) -> Option<Self> {
        let text = std::fs::read_to_string(dir.join(BUILD_PROPS_FILE)).ok()?;
        Some(Self::parse(&text))
    }

    /// Saves the snapshot into a namespace directory.
    pub fn save(&self, dir: &Path) -> Result<(), CacheError> {
        let path = dir.join(BUILD_PROPS_FILE);
        write_if_changed(&path, self.to_text().as_bytes()).map_err(|e| CacheError::io(&path, e))?;
        Ok(())
    }

    /// Returns the keys whose values differ between two snapshots.
    pub fn changed_keys(&self, other: &BuildProps) -> Vec<String> {
        let mut keys: Vec<String> = self
            .0
            .iter()
            .filter(|(k, v)| other.0.get(*k) != Some(v))
            .map(|(k, _)| k.clone())
            .collect();
        for k in other.0.keys() {
            if !self.0.contains_key(k) {
                keys.push(k.clone());
            }
        }
        keys.sort();
        keys
    }
}
