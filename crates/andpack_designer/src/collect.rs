//! Gathers designer symbols from a merged resource tree.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use andpack_cache::ArtifactStore;
use andpack_common::ContentHash;
use andpack_diagnostics::{codes, Diagnostic, DiagnosticSink, Location};
use andpack_resources::dir::resource_name;
use andpack_resources::{MergedEntry, MergedResourceTree, ResourceItem};
use rayon::prelude::*;

use crate::error::DesignerError;
use crate::parser::ResourceParser;
use crate::symbols::{file_symbol, FileSymbols};

/// Which kind of build the symbols are collected for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationMode {
    /// Full build. Malformed XML has already been reported by the merge.
    Full,
    /// Design-time build. Malformed XML is reported as a warning and the
    /// file contributes only its file-level symbol.
    DesignTime,
}

/// Symbols of a whole tree.
#[derive(Debug, Clone, Default)]
pub struct SymbolCollection {
    /// Every declared symbol.
    pub symbols: FileSymbols,
    /// `(kind, name)` → original-case name, for file-level symbols whose
    /// output name was lower-cased.
    pub display: BTreeMap<(String, String), String>,
    /// Files parsed in this pass.
    pub parsed: usize,
    /// Files served from the parse cache.
    pub cached: usize,
}

struct Contribution {
    symbols: FileSymbols,
    display: Option<((String, String), String)>,
    parsed: usize,
    cached: usize,
}

fn cache_kind(values: bool) -> &'static str {
    if values {
        "values"
    } else {
        "xml"
    }
}

fn parse_item(
    item: &ResourceItem,
    values: bool,
    parser: &dyn ResourceParser,
    cache: Option<&ArtifactStore>,
    mode: GenerationMode,
    sink: &DiagnosticSink,
) -> Result<(Option<FileSymbols>, bool), DesignerError> {
    let bytes = std::fs::read(&item.source).map_err(|e| DesignerError::io(&item.source, e))?;
    let key = ContentHash::from_bytes(&bytes);
    if let Some(hit) = cache.and_then(|c| c.get::<FileSymbols>(cache_kind(values), &key)) {
        return Ok((Some(hit), true));
    }
    let text = String::from_utf8_lossy(&bytes);
    match parser.parse_xml(&text, values) {
        Ok(symbols) => {
            if let Some(cache) = cache {
                cache.put(cache_kind(values), &key, &symbols)?;
            }
            Ok((Some(symbols), false))
        }
        Err(err) => {
            match mode {
                GenerationMode::DesignTime => sink.emit(
                    Diagnostic::warning(
                        codes::DESIGNER_PARSE_SKIPPED,
                        format!("Could not parse resource file: {}", err.message),
                    )
                    .at(Location::at(&item.source, err.line, err.column))
                    .for_project(&item.origin.project),
                ),
                GenerationMode::Full => tracing::debug!(
                    file = %item.source.display(),
                    "skipping malformed resource for designer symbols"
                ),
            }
            Ok((None, false))
        }
    }
}

fn is_xml_file(name: &str) -> bool {
    Path::new(name)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"))
}

fn contribute(
    entry: &MergedEntry,
    parser: &dyn ResourceParser,
    cache: Option<&ArtifactStore>,
    mode: GenerationMode,
    sink: &DiagnosticSink,
) -> Result<Contribution, DesignerError> {
    let mut out = Contribution {
        symbols: FileSymbols::default(),
        display: None,
        parsed: 0,
        cached: 0,
    };
    if let Some((kind, name)) = file_symbol(&entry.output) {
        let original = resource_name(entry.item.logical.file_name());
        if original != name && original.eq_ignore_ascii_case(&name) {
            out.display = Some(((kind.clone(), name.clone()), original.to_string()));
        }
        out.symbols.insert(&kind, &name);
    }

    let Some(dir) = entry.dir() else {
        return Ok(out);
    };
    if !dir.holds_xml() || !is_xml_file(entry.output.file_name()) {
        return Ok(out);
    }
    let values = dir.is_values();
    let none = BTreeSet::new();
    for item in entry.contributors() {
        let (symbols, hit) = parse_item(item, values, parser, cache, mode, sink)?;
        if hit {
            out.cached += 1;
        } else {
            out.parsed += 1;
        }
        if let Some(symbols) = symbols {
            let dropped = entry.dropped.get(&item.source).unwrap_or(&none);
            out.symbols.merge(symbols.without(dropped));
        }
    }
    Ok(out)
}

/// Collects the symbols declared by every file of `tree`.
///
/// Files are parsed from their original sources in parallel; parses are
/// cached by content hash when `cache` is given.
pub fn collect_symbols(
    tree: &MergedResourceTree,
    parser: &dyn ResourceParser,
    cache: Option<&ArtifactStore>,
    mode: GenerationMode,
    sink: &DiagnosticSink,
) -> Result<SymbolCollection, DesignerError> {
    let entries: Vec<&MergedEntry> = tree.iter().collect();
    let contributions: Vec<Contribution> = entries
        .par_iter()
        .map(|entry| contribute(entry, parser, cache, mode, sink))
        .collect::<Result<_, _>>()?;

    let mut collection = SymbolCollection::default();
    for contribution in contributions {
        collection.symbols.merge(contribution.symbols);
        if let Some((key, original)) = contribution.display {
            collection.display.entry(key).or_insert(original);
        }
        collection.parsed += contribution.parsed;
        collection.cached += contribution.cached;
    }
    tracing::debug!(
        parser = parser.name(),
        parsed = collection.parsed,
        cached = collection.cached,
        symbols = collection.symbols.symbols.len(),
        "collected designer symbols"
    );
    Ok(collection)
}
