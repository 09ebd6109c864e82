//! Diagnostic codes with category prefixes for structured error identification.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The pipeline area a diagnostic belongs to, determining its prefix.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Category {
    /// Resource merging and validation, prefixed with `APT`.
    Resource,
    /// Designer and code-behind generation, prefixed with `DSG`.
    Designer,
    /// Asset pack partitioning, prefixed with `AST`.
    Asset,
    /// Library import resolution, prefixed with `LIB`.
    Library,
    /// Packaging and native libraries, prefixed with `PKG`.
    Package,
    /// Build orchestration and external tools, prefixed with `BLD`.
    Build,
}

impl Category {
    /// Returns the prefix for this category.
    pub fn prefix(self) -> &'static str {
        match self {
            Category::Resource => "APT",
            Category::Designer => "DSG",
            Category::Asset => "AST",
            Category::Library => "LIB",
            Category::Package => "PKG",
            Category::Build => "BLD",
        }
    }

    fn from_prefix(prefix: &str) -> Option<Self> {
        Some(match prefix {
            "APT" => Category::Resource,
            "DSG" => Category::Designer,
            "AST" => Category::Asset,
            "LIB" => Category::Library,
            "PKG" => Category::Package,
            "BLD" => Category::Build,
            _ => return None,
        })
    }
}

/// A structured diagnostic code combining a category prefix and a number.
///
/// Displayed as the prefix followed by a zero-padded 4-digit number, e.g.
/// `APT0004`, `PKG0001`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct DiagnosticCode {
    /// The category of this diagnostic.
    pub category: Category,
    /// The numeric identifier within the category.
    pub number: u16,
}

impl DiagnosticCode {
    /// Creates a new diagnostic code.
    pub const fn new(category: Category, number: u16) -> Self {
        Self { category, number }
    }

    /// Parses a displayed code such as `APT2259` back into a code.
    ///
    /// Returns `None` for prefixes outside the known categories.
    pub fn parse(text: &str) -> Option<Self> {
        if text.len() < 4 || !text.is_char_boundary(3) {
            return None;
        }
        let (prefix, digits) = text.split_at(3);
        let category = Category::from_prefix(prefix)?;
        if !digits.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let number = digits.parse().ok()?;
        Some(Self { category, number })
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:04}", self.category.prefix(), self.number)
    }
}

/// Well-known codes emitted by the pipeline.
pub mod codes {
    use super::{Category, DiagnosticCode};

    /// External resource compiler failure.
    pub const RESOURCE_TOOL_FAILED: DiagnosticCode = DiagnosticCode::new(Category::Resource, 0);
    /// Invalid resource directory name.
    pub const INVALID_RESOURCE_DIRECTORY: DiagnosticCode =
        DiagnosticCode::new(Category::Resource, 1);
    /// Invalid resource file name.
    pub const INVALID_RESOURCE_FILE_NAME: DiagnosticCode =
        DiagnosticCode::new(Category::Resource, 2);
    /// Duplicate resource file within one project.
    pub const DUPLICATE_RESOURCE_FILE: DiagnosticCode = DiagnosticCode::new(Category::Resource, 3);
    /// Reference to an undeclared resource.
    pub const UNRESOLVED_REFERENCE: DiagnosticCode = DiagnosticCode::new(Category::Resource, 4);
    /// Illegal separator in a logical name.
    pub const ILLEGAL_LOGICAL_NAME: DiagnosticCode = DiagnosticCode::new(Category::Resource, 5);
    /// Duplicate values entry within one file.
    pub const DUPLICATE_VALUES_ENTRY: DiagnosticCode = DiagnosticCode::new(Category::Resource, 6);
    /// Duplicate resource across projects, resolved by precedence.
    pub const OVERRIDDEN_RESOURCE: DiagnosticCode = DiagnosticCode::new(Category::Resource, 7);
    /// Resource qualifier above the maximum supported API level.
    pub const API_LEVEL_SKIPPED: DiagnosticCode = DiagnosticCode::new(Category::Resource, 8);
    /// Invalid 9-patch image.
    pub const INVALID_NINE_PATCH: DiagnosticCode = DiagnosticCode::new(Category::Resource, 9);
    /// Malformed XML in a resource file.
    pub const MALFORMED_RESOURCE_XML: DiagnosticCode = DiagnosticCode::new(Category::Resource, 10);

    /// Malformed XML skipped during design-time parsing.
    pub const DESIGNER_PARSE_SKIPPED: DiagnosticCode = DiagnosticCode::new(Category::Designer, 1);

    /// Conflicting delivery types within one asset pack.
    pub const CONFLICTING_DELIVERY: DiagnosticCode = DiagnosticCode::new(Category::Asset, 1);
    /// Asset assigned to two named packs.
    pub const ASSET_IN_TWO_PACKS: DiagnosticCode = DiagnosticCode::new(Category::Asset, 2);
    /// Invalid asset pack name.
    pub const INVALID_PACK_NAME: DiagnosticCode = DiagnosticCode::new(Category::Asset, 3);
    /// Asset pack declared by a library project.
    pub const PACK_IN_LIBRARY: DiagnosticCode = DiagnosticCode::new(Category::Asset, 4);

    /// Corrupt or unreadable library archive.
    pub const CORRUPT_ARCHIVE: DiagnosticCode = DiagnosticCode::new(Category::Library, 1);
    /// Referenced archive not found.
    pub const MISSING_REFERENCE: DiagnosticCode = DiagnosticCode::new(Category::Library, 2);
    /// Library manifest could not be merged.
    pub const MANIFEST_MERGE_FAILED: DiagnosticCode = DiagnosticCode::new(Category::Library, 3);

    /// Native library under an unknown ABI directory.
    pub const UNKNOWN_ABI: DiagnosticCode = DiagnosticCode::new(Category::Package, 1);
    /// Duplicate native library archive path.
    pub const DUPLICATE_NATIVE_LIBRARY: DiagnosticCode = DiagnosticCode::new(Category::Package, 2);

    /// External tool failed.
    pub const TOOL_FAILED: DiagnosticCode = DiagnosticCode::new(Category::Build, 1);
    /// External tool not configured or not found.
    pub const TOOL_MISSING: DiagnosticCode = DiagnosticCode::new(Category::Build, 2);
    /// Diagnostic reported by an external tool.
    pub const TOOL_DIAGNOSTIC: DiagnosticCode = DiagnosticCode::new(Category::Build, 3);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_prefixes() {
        assert_eq!(Category::Resource.prefix(), "APT");
        assert_eq!(Category::Package.prefix(), "PKG");
        assert_eq!(Category::Build.prefix(), "BLD");
    }

    #[test]
    fn display_format() {
        assert_eq!(codes::RESOURCE_TOOL_FAILED.to_string(), "APT0000");
        assert_eq!(codes::UNRESOLVED_REFERENCE.to_string(), "APT0004");
        assert_eq!(codes::UNKNOWN_ABI.to_string(), "PKG0001");
    }

    #[test]
    fn parse_known_prefix() {
        let code = DiagnosticCode::parse("APT2259").unwrap();
        assert_eq!(code.category, Category::Resource);
        assert_eq!(code.number, 2259);
        assert_eq!(DiagnosticCode::parse(&code.to_string()), Some(code));
    }

    #[test]
    fn parse_rejects_unknown() {
        assert!(DiagnosticCode::parse("CS0103").is_none());
        assert!(DiagnosticCode::parse("APTx").is_none());
        assert!(DiagnosticCode::parse("AP").is_none());
    }

    #[test]
    fn serde_roundtrip() {
        let code = codes::DUPLICATE_RESOURCE_FILE;
        let json = serde_json::to_string(&code).unwrap();
        let back: DiagnosticCode = serde_json::from_str(&json).unwrap();
        assert_eq!(code, back);
    }
}
