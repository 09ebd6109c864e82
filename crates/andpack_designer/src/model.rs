//! The designer symbol table and its `R.txt` form.
//!
//! Type ids are handed out from 1 in kind order, skipping kinds with no
//! symbols. Item ids start at 0 within each type, in ordinal name order.
//! A resource id is `0x7f<type:02x><item:04x>`.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

use crate::kind::DESIGNER_KINDS;
use crate::symbols::FileSymbols;

const PACKAGE_ID: u32 = 0x7f;

/// Turns a resource name into a field name.
pub fn field_name(name: &str) -> String {
    name.replace(['.', ':', '-'], "_")
}

/// One constant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    /// Field name as seen by the resource compiler.
    pub name: String,
    /// Field name emitted into the designer; differs from `name` only in case.
    pub display: String,
    /// Resource id.
    pub id: u32,
}

/// One `declare-styleable`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Styleable {
    /// Field name.
    pub name: String,
    /// Attribute names, sorted case-insensitively, with the id each resolves
    /// to. Framework attributes resolve to 0.
    pub attrs: Vec<(String, u32)>,
}

impl Styleable {
    /// `<Styleable>_<attr>` index field names in array order.
    pub fn index_fields(&self) -> impl Iterator<Item = (String, usize)> + '_ {
        self.attrs
            .iter()
            .enumerate()
            .map(|(index, (attr, _))| (format!("{}_{}", self.name, field_name(attr)), index))
    }
}

/// Every symbol of a project, with ids assigned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DesignerModel {
    kinds: BTreeMap<String, Vec<Symbol>>,
    styleables: Vec<Styleable>,
    type_ids: BTreeMap<String, u32>,
}

impl DesignerModel {
    /// Assigns ids to `symbols`. `display` maps `(kind, name)` to the
    /// original-case name to emit for file-based resources.
    pub fn build(symbols: &FileSymbols, display: &BTreeMap<(String, String), String>) -> Self {
        let mut names: BTreeMap<&str, BTreeMap<String, String>> = BTreeMap::new();
        for (kind, name) in &symbols.symbols {
            let shown = display
                .get(&(kind.clone(), name.clone()))
                .map(String::as_str)
                .unwrap_or(name.as_str());
            names
                .entry(kind.as_str())
                .or_default()
                .insert(field_name(name), field_name(shown));
        }
        for attrs in symbols.styleables.values() {
            for attr in attrs.iter().filter(|a| !a.starts_with("android:")) {
                names
                    .entry("attr")
                    .or_default()
                    .entry(field_name(attr))
                    .or_insert_with(|| field_name(attr));
            }
        }

        let mut model = DesignerModel::default();
        let mut next_type = 1u32;
        for kind in DESIGNER_KINDS {
            if kind == "styleable" {
                if !symbols.styleables.is_empty() {
                    model.type_ids.insert(kind.to_string(), next_type);
                    next_type += 1;
                }
                continue;
            }
            let Some(entries) = names.get(kind).filter(|e| !e.is_empty()) else {
                continue;
            };
            let type_id = next_type;
            next_type += 1;
            model.type_ids.insert(kind.to_string(), type_id);
            let list = entries
                .iter()
                .enumerate()
                .map(|(item, (name, shown))| Symbol {
                    name: name.clone(),
                    display: shown.clone(),
                    id: (PACKAGE_ID << 24) | (type_id << 16) | item as u32,
                })
                .collect();
            model.kinds.insert(kind.to_string(), list);
        }

        for (name, attrs) in &symbols.styleables {
            let mut sorted: Vec<&String> = attrs.iter().collect::<BTreeSet<_>>().into_iter().collect();
            sorted.sort_by_key(|a| a.to_lowercase());
            let attrs = sorted
                .into_iter()
                .map(|attr| {
                    let id = if attr.starts_with("android:") {
                        0
                    } else {
                        model.id_of("attr", &field_name(attr)).unwrap_or(0)
                    };
                    (attr.clone(), id)
                })
                .collect();
            model.styleables.push(Styleable {
                name: field_name(name),
                attrs,
            });
        }
        model
    }

    /// Kinds with at least one symbol, in id order.
    pub fn kinds(&self) -> impl Iterator<Item = (&str, &[Symbol])> {
        DESIGNER_KINDS
            .iter()
            .filter_map(|k| self.kinds.get_key_value(*k))
            .map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Symbols of one kind.
    pub fn symbols(&self, kind: &str) -> &[Symbol] {
        self.kinds.get(kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Styleables, ordered by name.
    pub fn styleables(&self) -> &[Styleable] {
        &self.styleables
    }

    /// Type id assigned to `kind`, if it has symbols.
    pub fn type_id(&self, kind: &str) -> Option<u32> {
        self.type_ids.get(kind).copied()
    }

    /// Id of the field `name` of `kind`.
    pub fn id_of(&self, kind: &str, name: &str) -> Option<u32> {
        let list = self.kinds.get(kind)?;
        list.binary_search_by(|s| s.name.as_str().cmp(name))
            .ok()
            .map(|i| list[i].id)
    }

    /// Looks up a symbol by field name, ignoring case.
    pub fn find(&self, kind: &str, name: &str) -> Option<&Symbol> {
        self.symbols(kind)
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
    }

    /// Total number of `int` fields.
    pub fn len(&self) -> usize {
        self.kinds.values().map(Vec::len).sum()
    }

    /// Returns `true` if there are no symbols at all.
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty() && self.styleables.is_empty()
    }

    /// Renders `R.txt`.
    pub fn to_r_txt(&self) -> String {
        let mut out = String::new();
        for (kind, symbols) in self.kinds() {
            for symbol in symbols {
                let _ = writeln!(out, "int {kind} {} 0x{:08x}", symbol.name, symbol.id);
            }
        }
        for styleable in &self.styleables {
            let ids: Vec<String> = styleable.attrs.iter().map(|(_, id)| format!("0x{id:08x}")).collect();
            let _ = writeln!(out, "int[] styleable {} {{ {} }}", styleable.name, ids.join(", "));
            for (field, index) in styleable.index_fields() {
                let _ = writeln!(out, "int styleable {field} {index}");
            }
        }
        out
    }
}

/// One line of an `R.txt` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RTxtEntry {
    /// `int` or `int[]`.
    pub data_type: String,
    /// Resource kind.
    pub kind: String,
    /// Field name.
    pub name: String,
    /// Value text as written.
    pub value: String,
}

impl RTxtEntry {
    /// Returns `true` for plain resource ids, excluding styleable arrays and
    /// indices.
    pub fn is_id(&self) -> bool {
        self.data_type == "int" && self.kind != "styleable"
    }
}

/// Parses `R.txt`. Malformed lines are skipped.
pub fn parse_r_txt(text: &str) -> Vec<RTxtEntry> {
    text.lines()
        .filter_map(|line| {
            let mut parts = line.trim().splitn(4, ' ');
            let data_type = parts.next()?;
            let kind = parts.next()?;
            let name = parts.next()?;
            let value = parts.next()?;
            if data_type != "int" && data_type != "int[]" {
                return None;
            }
            Some(RTxtEntry {
                data_type: data_type.to_string(),
                kind: kind.to_string(),
                name: name.to_string(),
                value: value.to_string(),
            })
        })
        .collect()
}
