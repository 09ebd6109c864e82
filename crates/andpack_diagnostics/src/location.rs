//! Source locations in original project files.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// A position in a project file, with 1-based line and column.
///
/// Always refers to the file the user edits, never an intermediate copy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// The original source file.
    pub file: PathBuf,
    /// 1-based line, if known.
    pub line: Option<u32>,
    /// 1-based column, if known.
    pub column: Option<u32>,
}

impl Location {
    /// A location naming only a file.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            file: path.into(),
            line: None,
            column: None,
        }
    }

    /// A location with line and column.
    pub fn at(path: impl Into<PathBuf>, line: u32, column: u32) -> Self {
        Self {
            file: path.into(),
            line: Some(line),
            column: Some(column),
        }
    }

    /// Returns the same position in a different file.
    pub fn remapped(&self, file: &Path) -> Self {
        Self {
            file: file.to_path_buf(),
            ..self.clone()
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.file.display())?;
        match (self.line, self.column) {
            (Some(l), Some(c)) => write!(f, "({l},{c})"),
            (Some(l), None) => write!(f, "({l})"),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_with_line_and_column() {
        let loc = Location::at("Resources/layout/Main.axml", 3, 7);
        assert_eq!(loc.to_string(), "Resources/layout/Main.axml(3,7)");
    }

    #[test]
    fn display_file_only() {
        assert_eq!(Location::file("a.png").to_string(), "a.png");
    }

    #[test]
    fn remapped_keeps_position() {
        let loc = Location::at("obj/res/layout/main.xml", 2, 1);
        let orig = loc.remapped(Path::new("Resources/layout/Main.axml"));
        assert_eq!(orig.line, Some(2));
        assert_eq!(orig.file, PathBuf::from("Resources/layout/Main.axml"));
    }
}
