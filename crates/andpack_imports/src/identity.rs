//! Short, stable extraction slots for referenced archives.
//!
//! Each archive gets a numbered directory under `lp/`. Numbers are handed
//! out in first-seen order and persisted in `lp/map.cache`, one identity per
//! line, so that a slot never moves while its archive is still referenced.

use std::path::Path;

use andpack_common::fs::write_if_changed;

use crate::error::ImportError;

/// Identity map file inside the `lp/` directory.
pub const MAP_FILE: &str = "map.cache";

/// Archive identity → slot number.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityMap {
    identities: Vec<String>,
}

/// The identity of an archive: its absolute path with `/` separators.
pub fn archive_identity(path: &Path) -> String {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    absolute.to_string_lossy().replace('\\', "/")
}

impl IdentityMap {
    /// Reads `lp/map.cache`. A missing or unreadable file is an empty map.
    pub fn load(lp_dir: &Path) -> Self {
        let identities = std::fs::read_to_string(lp_dir.join(MAP_FILE))
            .map(|text| text.lines().map(str::to_string).collect())
            .unwrap_or_default();
        Self { identities }
    }

    /// Slot already assigned to `identity`.
    pub fn slot_of(&self, identity: &str) -> Option<usize> {
        self.identities.iter().position(|i| i == identity)
    }

    /// Slot of `identity`, assigning the next free number on first use.
    pub fn slot_for(&mut self, identity: &str) -> usize {
        if let Some(slot) = self.slot_of(identity) {
            return slot;
        }
        self.identities.push(identity.to_string());
        self.identities.len() - 1
    }

    /// Number of assigned slots.
    pub fn len(&self) -> usize {
        self.identities.len()
    }

    /// Returns `true` if no slot was ever assigned.
    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    /// Writes the map back. Returns `true` if it changed.
    pub fn save(&self, lp_dir: &Path) -> Result<bool, ImportError> {
        let path = lp_dir.join(MAP_FILE);
        let text: String = self.identities.iter().map(|i| format!("{i}\n")).collect();
        write_if_changed(&path, text.as_bytes()).map_err(|e| ImportError::io(&path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_survive_a_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut map = IdentityMap::load(dir.path());
        assert!(map.is_empty());
        assert_eq!(map.slot_of("/libs/a.aar"), None);
        assert_eq!(map.slot_for("/libs/a.aar"), 0);
        assert_eq!(map.slot_for("/libs/b.aar"), 1);
        assert_eq!(map.slot_for("/libs/a.aar"), 0);
        assert!(map.save(dir.path()).unwrap());
        assert!(!map.save(dir.path()).unwrap());

        let mut reloaded = IdentityMap::load(dir.path());
        assert_eq!(reloaded.slot_for("/libs/b.aar"), 1);
        assert_eq!(reloaded.slot_for("/libs/c.aar"), 2);
        assert_eq!(reloaded.len(), 3);
    }

    #[test]
    fn identity_is_absolute() {
        let id = archive_identity(Path::new("libs/a.aar"));
        assert!(id.ends_with("libs/a.aar"));
        assert!(Path::new(&id).is_absolute());
    }
}
