//! Assigning assets to the base module and named asset packs.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use andpack_common::LogicalPath;
use andpack_config::DeliveryType;
use andpack_diagnostics::{codes, Diagnostic, DiagnosticSink};
use serde::{Deserialize, Serialize};

use crate::item::AssetItem;

/// Name of the main module's pack.
pub const BASE_PACK: &str = "base";

/// The assets routed to one module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetPack {
    /// Pack name; [`BASE_PACK`] for the main module.
    pub name: String,
    /// Delivery type; always install-time for the base pack.
    pub delivery: DeliveryType,
    /// Logical path inside `assets/` to source file.
    pub assets: BTreeMap<LogicalPath, PathBuf>,
}

impl AssetPack {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            delivery: DeliveryType::InstallTime,
            assets: BTreeMap::new(),
        }
    }

    /// Returns `true` for the main module.
    pub fn is_base(&self) -> bool {
        self.name == BASE_PACK
    }

    /// Source files of every asset, sorted.
    pub fn sources(&self) -> Vec<PathBuf> {
        let mut sources: Vec<PathBuf> = self.assets.values().cloned().collect();
        sources.sort();
        sources
    }
}

/// Every pack of a project. The base pack always exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetPartition {
    packs: BTreeMap<String, AssetPack>,
}

impl Default for AssetPartition {
    fn default() -> Self {
        let mut packs = BTreeMap::new();
        packs.insert(BASE_PACK.to_string(), AssetPack::new(BASE_PACK));
        Self { packs }
    }
}

impl AssetPartition {
    /// The main module's assets.
    pub fn base(&self) -> &AssetPack {
        &self.packs[BASE_PACK]
    }

    /// Looks up a pack by name.
    pub fn get(&self, name: &str) -> Option<&AssetPack> {
        self.packs.get(name)
    }

    /// Named packs in name order.
    pub fn named_packs(&self) -> impl Iterator<Item = &AssetPack> {
        self.packs.values().filter(|p| !p.is_base())
    }

    /// Names of the named packs.
    pub fn pack_names(&self) -> BTreeSet<String> {
        self.named_packs().map(|p| p.name.clone()).collect()
    }

    /// Moves every named pack's assets into base. Used for APK output, which
    /// has no separate modules. Base keeps its own copy on collision.
    pub fn folded(mut self) -> Self {
        let named: Vec<String> = self.pack_names().into_iter().collect();
        for name in named {
            let Some(pack) = self.packs.remove(&name) else {
                continue;
            };
            if let Some(base) = self.packs.get_mut(BASE_PACK) {
                for (logical, source) in pack.assets {
                    base.assets.entry(logical).or_insert(source);
                }
            }
        }
        self
    }

    fn pack_mut(&mut self, name: &str) -> &mut AssetPack {
        self.packs.entry(name.to_string()).or_insert_with(|| AssetPack::new(name))
    }
}

/// Returns `true` for names usable as an Android module name.
pub fn is_valid_pack_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Splits asset items into packs.
///
/// For each logical path an explicit `base` declaration wins over a named
/// pack, and a named pack wins over an undeclared item. A path claimed by
/// two different named packs is AST0002; the first pack by name keeps it.
/// Conflicting explicit delivery types within one pack are AST0001 and
/// invalid pack names AST0003.
pub fn partition(items: Vec<AssetItem>, project: &str, sink: &DiagnosticSink) -> AssetPartition {
    let mut invalid = BTreeSet::new();
    let mut by_path: BTreeMap<LogicalPath, Vec<AssetItem>> = BTreeMap::new();
    for item in items {
        if let Some(name) = item.named_pack() {
            if !is_valid_pack_name(name) {
                if invalid.insert(name.to_string()) {
                    sink.emit(
                        Diagnostic::error(
                            codes::INVALID_PACK_NAME,
                            format!(
                                "Invalid asset pack name '{name}': names must start with a letter and contain only letters, digits and '_'"
                            ),
                        )
                        .in_file(&item.source)
                        .for_project(project),
                    );
                }
                continue;
            }
        }
        by_path.entry(item.logical.clone()).or_default().push(item);
    }

    let mut result = AssetPartition::default();
    let mut deliveries: BTreeMap<String, BTreeSet<DeliveryType>> = BTreeMap::new();
    for (logical, candidates) in by_path {
        let explicit_base = candidates.iter().find(|i| i.is_explicit_base());
        let named: BTreeMap<&str, &AssetItem> = candidates
            .iter()
            .filter_map(|i| i.named_pack().map(|p| (p, i)))
            .collect();
        if named.len() > 1 && explicit_base.is_none() {
            let names: Vec<&str> = named.keys().copied().collect();
            sink.emit(
                Diagnostic::error(
                    codes::ASSET_IN_TWO_PACKS,
                    format!(
                        "Asset '{logical}' is assigned to more than one asset pack: {}",
                        names.join(", ")
                    ),
                )
                .for_project(project),
            );
        }

        let (pack, winner) = match (explicit_base, named.iter().next()) {
            (Some(base), Some((name, _))) => {
                tracing::debug!(asset = %logical, pack = *name, "base declaration suppresses pack copy");
                (BASE_PACK, base)
            }
            (Some(base), None) => (BASE_PACK, base),
            (None, Some((name, item))) => (*name, *item),
            (None, None) => match candidates.first() {
                Some(item) => (BASE_PACK, item),
                None => continue,
            },
        };
        if pack != BASE_PACK {
            for item in candidates.iter().filter(|i| i.named_pack() == Some(pack)) {
                if let Some(delivery) = item.delivery {
                    deliveries.entry(pack.to_string()).or_default().insert(delivery);
                }
            }
        }
        result.pack_mut(pack).assets.insert(logical, winner.source.clone());
    }

    for (name, kinds) in deliveries {
        if kinds.len() > 1 {
            let listed: Vec<String> = kinds.iter().map(ToString::to_string).collect();
            sink.emit(
                Diagnostic::error(
                    codes::CONFLICTING_DELIVERY,
                    format!(
                        "Asset pack '{name}' has conflicting delivery types: {}",
                        listed.join(", ")
                    ),
                )
                .for_project(project),
            );
        }
        if let Some(first) = kinds.into_iter().next() {
            result.pack_mut(&name).delivery = first;
        }
    }
    result
}

/// Reports every item of a library project that asks for a named pack
/// (AST0004). Libraries only contribute to their consumer's base module.
pub fn check_library_assets(items: &[AssetItem], project: &str, sink: &DiagnosticSink) {
    for item in items {
        if let Some(pack) = item.named_pack() {
            sink.emit(
                Diagnostic::error(
                    codes::PACK_IN_LIBRARY,
                    format!(
                        "Asset '{}' declares asset pack '{pack}'; asset packs are only supported in application projects",
                        item.logical
                    ),
                )
                .in_file(&item.source)
                .for_project(project),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(logical: &str, pack: Option<&str>, delivery: Option<DeliveryType>) -> AssetItem {
        AssetItem {
            logical: LogicalPath::new(logical),
            source: PathBuf::from(format!("/p/{}/{logical}", pack.unwrap_or("none"))),
            pack: pack.map(String::from),
            delivery,
        }
    }

    #[test]
    fn defaults_to_base() {
        let sink = DiagnosticSink::new();
        let parts = partition(
            vec![
                item("asset1.txt", None, None),
                item("asset2.txt", Some("assetpack1"), Some(DeliveryType::InstallTime)),
                item("asset4.txt", Some("assetpack2"), Some(DeliveryType::OnDemand)),
                item("asset5.txt", Some("assetpack3"), Some(DeliveryType::FastFollow)),
            ],
            "App1",
            &sink,
        );
        assert!(sink.diagnostics().is_empty());
        assert!(parts.base().assets.contains_key(&LogicalPath::new("asset1.txt")));
        assert!(!parts.base().assets.contains_key(&LogicalPath::new("asset2.txt")));
        assert_eq!(
            parts.pack_names().into_iter().collect::<Vec<_>>(),
            vec!["assetpack1", "assetpack2", "assetpack3"]
        );
        assert_eq!(parts.get("assetpack2").unwrap().delivery, DeliveryType::OnDemand);
        assert_eq!(parts.get("assetpack3").unwrap().delivery, DeliveryType::FastFollow);
    }

    #[test]
    fn explicit_base_overrides_pack() {
        let sink = DiagnosticSink::new();
        let parts = partition(
            vec![
                item("asset1.txt", Some("assetpack1"), None),
                item("asset2.txt", Some("assetpack1"), None),
                item("asset2.txt", Some("base"), None),
            ],
            "App1",
            &sink,
        );
        assert!(!sink.has_errors());
        let pack = parts.get("assetpack1").unwrap();
        assert!(pack.assets.contains_key(&LogicalPath::new("asset1.txt")));
        assert!(!pack.assets.contains_key(&LogicalPath::new("asset2.txt")));
        assert!(parts.base().assets.contains_key(&LogicalPath::new("asset2.txt")));
        assert!(!parts.base().assets.contains_key(&LogicalPath::new("asset1.txt")));
    }

    #[test]
    fn named_pack_beats_undeclared_copy() {
        let sink = DiagnosticSink::new();
        let parts = partition(
            vec![item("a.txt", None, None), item("a.txt", Some("assetpack1"), None)],
            "App1",
            &sink,
        );
        assert!(parts.base().assets.is_empty());
        assert_eq!(parts.get("assetpack1").unwrap().assets.len(), 1);
    }

    #[test]
    fn two_named_packs_conflict() {
        let sink = DiagnosticSink::new();
        let parts = partition(
            vec![item("a.txt", Some("packb"), None), item("a.txt", Some("packa"), None)],
            "App1",
            &sink,
        );
        let diags = sink.diagnostics();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, codes::ASSET_IN_TWO_PACKS);
        assert!(parts.get("packa").is_some());
        assert!(parts.get("packb").is_none());
    }

    #[test]
    fn conflicting_delivery_is_reported() {
        let sink = DiagnosticSink::new();
        partition(
            vec![
                item("a.txt", Some("assetpack1"), Some(DeliveryType::OnDemand)),
                item("b.txt", Some("assetpack1"), Some(DeliveryType::FastFollow)),
                item("c.txt", Some("assetpack1"), None),
            ],
            "App1",
            &sink,
        );
        let diags = sink.diagnostics();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, codes::CONFLICTING_DELIVERY);
    }

    #[test]
    fn invalid_pack_names() {
        assert!(is_valid_pack_name("assetpack1"));
        assert!(is_valid_pack_name("My_Pack"));
        assert!(!is_valid_pack_name("1pack"));
        assert!(!is_valid_pack_name("my-pack"));
        assert!(!is_valid_pack_name(""));

        let sink = DiagnosticSink::new();
        let parts = partition(
            vec![item("a.txt", Some("my-pack"), None), item("b.txt", Some("my-pack"), None)],
            "App1",
            &sink,
        );
        assert_eq!(sink.error_count(), 1);
        assert!(parts.named_packs().next().is_none());
    }

    #[test]
    fn folding_keeps_base_copy() {
        let sink = DiagnosticSink::new();
        let parts = partition(
            vec![item("a.txt", None, None), item("b.txt", Some("assetpack1"), None)],
            "App1",
            &sink,
        )
        .folded();
        assert_eq!(parts.base().assets.len(), 2);
        assert!(parts.pack_names().is_empty());
    }

    #[test]
    fn library_packs_are_rejected() {
        let sink = DiagnosticSink::new();
        check_library_assets(
            &[item("a.txt", Some("assetpack1"), None), item("b.txt", Some("base"), None)],
            "Lib1",
            &sink,
        );
        let diags = sink.diagnostics();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, codes::PACK_IN_LIBRARY);
    }
}
