//! Symbols declared by a single resource file.

use std::collections::{BTreeMap, BTreeSet};

use andpack_common::LogicalPath;
use andpack_resources::dir::resource_name;
use andpack_resources::ResourceDir;
use serde::{Deserialize, Serialize};

use crate::kind::{is_designer_kind, symbol_kind};

/// What one file contributes to the designer.
///
/// Names are raw: style names still contain `.` and file names keep the
/// case of the output path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSymbols {
    /// `(kind, name)` pairs.
    pub symbols: BTreeSet<(String, String)>,
    /// `declare-styleable` name to its `attr` names in declaration order.
    pub styleables: BTreeMap<String, Vec<String>>,
}

impl FileSymbols {
    /// Declares a symbol. Framework (`android:`) names and unknown kinds are
    /// ignored.
    pub fn insert(&mut self, kind: &str, name: &str) {
        let kind = symbol_kind(kind);
        if name.is_empty() || name.contains("android:") || !is_designer_kind(kind) {
            return;
        }
        self.symbols.insert((kind.to_string(), name.to_string()));
    }

    /// Declares a styleable. The first declaration of a name wins.
    pub fn insert_styleable(&mut self, name: &str, attrs: Vec<String>) {
        if name.is_empty() {
            return;
        }
        self.styleables.entry(name.to_string()).or_insert(attrs);
    }

    /// Handles an attribute value; `@+id/name` declares an id.
    pub fn note_attribute(&mut self, value: &str) {
        if let Some(name) = value.trim().strip_prefix("@+id/") {
            self.insert("id", name);
        }
    }

    /// Handles a direct child of a values root.
    pub fn note_values_entry(&mut self, element: &str, type_attr: Option<&str>, name: &str) {
        let Some(kind) = andpack_resources::values::entry_kind(element, type_attr) else {
            return;
        };
        if kind != "styleable" {
            self.insert(&kind, name);
        }
    }

    /// Drops every symbol whose values key (`kind/name`) is in `dropped`.
    pub fn without(mut self, dropped: &BTreeSet<String>) -> Self {
        self.symbols
            .retain(|(kind, name)| !dropped.contains(&format!("{kind}/{name}")));
        self.styleables
            .retain(|name, _| !dropped.contains(&format!("styleable/{name}")));
        self
    }

    /// Adds everything from `other`.
    pub fn merge(&mut self, other: FileSymbols) {
        self.symbols.extend(other.symbols);
        for (name, attrs) in other.styleables {
            self.styleables.entry(name).or_insert(attrs);
        }
    }
}

/// The file-level symbol of a non-values resource: `drawable/icon.png`
/// declares `drawable/icon`, `drawable/frame.9.png` declares `drawable/frame`.
pub fn file_symbol(output: &LogicalPath) -> Option<(String, String)> {
    let dir = ResourceDir::parse(output.first_segment()).ok()?;
    if dir.is_values() || !is_designer_kind(&dir.kind) {
        return None;
    }
    let name = resource_name(output.file_name());
    if name.is_empty() {
        return None;
    }
    Some((dir.kind, name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_symbols_strip_extensions() {
        assert_eq!(
            file_symbol(&LogicalPath::new("drawable-hdpi/frame.9.png")),
            Some(("drawable".into(), "frame".into()))
        );
        assert_eq!(
            file_symbol(&LogicalPath::new("layout/main.xml")),
            Some(("layout".into(), "main".into()))
        );
        assert_eq!(file_symbol(&LogicalPath::new("values/strings.xml")), None);
    }

    #[test]
    fn framework_names_are_ignored() {
        let mut symbols = FileSymbols::default();
        symbols.insert("attr", "android:textColor");
        symbols.insert("string-array", "planets");
        symbols.insert("public", "x");
        assert_eq!(
            symbols.symbols.into_iter().collect::<Vec<_>>(),
            vec![("array".to_string(), "planets".to_string())]
        );
    }

    #[test]
    fn dropped_entries_are_removed() {
        let mut symbols = FileSymbols::default();
        symbols.insert("string", "a");
        symbols.insert("string", "b");
        symbols.insert_styleable("MyView", vec!["shade".into()]);
        let dropped: BTreeSet<String> =
            ["string/a".to_string(), "styleable/MyView".to_string()].into_iter().collect();
        let kept = symbols.without(&dropped);
        assert_eq!(kept.symbols.len(), 1);
        assert!(kept.styleables.is_empty());
    }
}
