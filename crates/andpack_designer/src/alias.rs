//! Redirects from library designer fields to the application's ids.
//!
//! A library compiled on its own assigns ids that are wrong once its
//! resources are merged into an application. In assembly mode the
//! application's designer rewrites every library field it can match at
//! startup instead of duplicating constants. The table is built after both
//! symbol sets are final and never feeds back into the library.

use std::collections::BTreeSet;

use crate::model::{parse_r_txt, DesignerModel, RTxtEntry};

/// The `R.txt` symbols of one library and the namespace its designer lives in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibrarySymbols {
    /// Designer namespace of the library.
    pub namespace: String,
    /// Entries read from its `R.txt`.
    pub entries: Vec<RTxtEntry>,
}

impl LibrarySymbols {
    /// Parses a library's `R.txt`.
    pub fn from_r_txt(namespace: &str, text: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            entries: parse_r_txt(text),
        }
    }
}

/// One `Library.Resource.<Kind>.<field> = App.Resource.<Kind>.<field>` line.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Alias {
    /// Namespace of the library designer being redirected.
    pub library: String,
    /// Resource kind.
    pub kind: String,
    /// Field name, identical on both sides.
    pub field: String,
}

/// Every alias an application designer emits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasTable {
    aliases: BTreeSet<Alias>,
}

impl AliasTable {
    /// Matches library symbols against the application's model. Symbols the
    /// application does not know (dropped by the merge) produce no alias, nor
    /// does a library sharing the application's namespace.
    pub fn build(app_namespace: &str, app: &DesignerModel, libraries: &[LibrarySymbols]) -> Self {
        let mut aliases = BTreeSet::new();
        for library in libraries.iter().filter(|l| l.namespace != app_namespace) {
            for entry in &library.entries {
                let field = if entry.is_id() {
                    app.find(&entry.kind, &entry.name).map(|s| s.display.clone())
                } else if entry.data_type == "int[]" && entry.kind == "styleable" {
                    app.styleables()
                        .iter()
                        .find(|s| s.name == entry.name)
                        .map(|s| s.name.clone())
                } else {
                    None
                };
                if let Some(field) = field {
                    aliases.insert(Alias {
                        library: library.namespace.clone(),
                        kind: entry.kind.clone(),
                        field,
                    });
                }
            }
        }
        Self { aliases }
    }

    /// Aliases ordered by library, kind and field.
    pub fn iter(&self) -> impl Iterator<Item = &Alias> {
        self.aliases.iter()
    }

    /// Number of aliases.
    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    /// Returns `true` if there is nothing to redirect.
    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}
