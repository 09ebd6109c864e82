//! Resource directory and file name grammar.
//!
//! A resource directory is a type name (`values`, `drawable`, `layout`, ...)
//! followed by zero or more `-`-separated configuration qualifiers in the
//! fixed Android order. File names must consist of `[a-z0-9_.]`.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

/// Resource directory types accepted by the packaging tools.
pub const RESOURCE_TYPES: [&str; 14] = [
    "anim",
    "animator",
    "color",
    "drawable",
    "font",
    "interpolator",
    "layout",
    "menu",
    "mipmap",
    "navigation",
    "raw",
    "transition",
    "values",
    "xml",
];

/// A parsed resource directory name such as `values-fr-v21`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceDir {
    /// The type part (`values`, `drawable`, ...).
    pub kind: String,
    /// Qualifiers in declaration order.
    pub qualifiers: Vec<String>,
    /// Platform version qualifier (`-vNN`), if present.
    pub api_level: Option<u32>,
}

/// Why a directory name was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirError {
    /// The type part is not a known resource type.
    UnknownType(String),
    /// A qualifier is not recognised.
    InvalidQualifier(String),
}

impl fmt::Display for DirError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DirError::UnknownType(t) => write!(f, "unknown resource type '{t}'"),
            DirError::InvalidQualifier(q) => write!(f, "invalid configuration qualifier '{q}'"),
        }
    }
}

fn qualifier_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let alternatives = [
            r"mcc\d+",
            r"mnc\d+",
            r"[a-z]{2,3}",
            r"r[A-Z]{2}",
            r"b\+[a-z]{2,8}(\+[A-Za-z0-9]{2,8})*",
            r"ld(rtl|ltr)",
            r"sw\d+dp",
            r"[wh]\d+dp",
            r"small|normal|large|xlarge",
            r"long|notlong",
            r"round|notround",
            r"widecg|nowidecg",
            r"highdr|lowdr",
            r"port|land|square",
            r"car|desk|television|appliance|watch|vrheadset",
            r"night|notnight",
            r"(l|m|h|xh|xxh|xxxh|no|tv|any)dpi|\d+dpi",
            r"notouch|finger|stylus",
            r"keysexposed|keyshidden|keyssoft",
            r"nokeys|qwerty|12key",
            r"navexposed|navhidden",
            r"nonav|dpad|trackball|wheel",
            r"\d+x\d+",
            r"v\d+",
        ];
        let pattern = format!("^(?:{})$", alternatives.join("|"));
        Regex::new(&pattern).expect("valid regex")
    })
}

impl ResourceDir {
    /// Parses a directory name.
    pub fn parse(name: &str) -> Result<Self, DirError> {
        let mut parts = name.split('-');
        let kind = parts.next().unwrap_or_default();
        if !RESOURCE_TYPES.contains(&kind) {
            return Err(DirError::UnknownType(kind.to_string()));
        }
        let mut qualifiers = Vec::new();
        let mut api_level = None;
        for q in parts {
            if !qualifier_regex().is_match(q) {
                return Err(DirError::InvalidQualifier(q.to_string()));
            }
            if let Some(level) = q.strip_prefix('v').and_then(|v| v.parse::<u32>().ok()) {
                api_level = Some(level);
            }
            qualifiers.push(q.to_string());
        }
        Ok(Self {
            kind: kind.to_string(),
            qualifiers,
            api_level,
        })
    }

    /// Returns `true` for `values*` directories.
    pub fn is_values(&self) -> bool {
        self.kind == "values"
    }

    /// Returns `true` if files in this directory are XML documents that may
    /// carry references (everything but `raw`).
    pub fn holds_xml(&self) -> bool {
        self.kind != "raw"
    }

    /// Returns `true` if a language or locale qualifier is present.
    pub fn is_localized(&self) -> bool {
        self.qualifiers.iter().any(|q| {
            q.starts_with("b+")
                || ((q.len() == 2 || q.len() == 3)
                    && q.chars().all(|c| c.is_ascii_lowercase())
                    && !matches!(q.as_str(), "car" | "mcc" | "mnc"))
        })
    }
}

/// Checks a resource file name against `[a-z0-9_.]`.
///
/// Returns the first offending character.
pub fn invalid_file_name_char(name: &str) -> Option<char> {
    name.chars()
        .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_' || *c == '.'))
}

/// Returns the resource name of a file: the part before the first `.`, so
/// `image.9.png` names `image`.
pub fn resource_name(file_name: &str) -> &str {
    file_name.split('.').next().unwrap_or(file_name)
}
