//! Merging a project's own resources with its libraries' resources.
//!
//! Precedence: the app beats any library, and an earlier reference beats a
//! later one. Two items at the same case-folded path from one project are an
//! error. For values files the merge is per entry rather than per file.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use andpack_config::FileNameCheck;
use andpack_diagnostics::{codes, Diagnostic, DiagnosticSink, Location, Severity};

use crate::dir::{invalid_file_name_char, ResourceDir};
use crate::error::ResourceError;
use crate::item::{ResourceItem, ResourceOrigin, Role};
use crate::tree::{MergedEntry, MergedResourceTree};
use crate::values::{parse_values, ValuesKey};

/// Settings that shape the merge.
#[derive(Debug, Clone, Copy)]
pub struct MergeOptions {
    /// Directories qualified with a higher `-vNN` are skipped.
    pub max_api_level: u32,
    /// Lower-case output paths.
    pub lowercase_file_names: bool,
    /// Severity of invalid file names.
    pub file_name_check: FileNameCheck,
}

/// Merges own and imported items into one tree.
///
/// Invalid items are reported to `sink` and left out; the returned tree holds
/// everything that survived. I/O errors reading values files abort.
pub fn merge(
    own: Vec<ResourceItem>,
    imported: Vec<ResourceItem>,
    options: &MergeOptions,
    sink: &DiagnosticSink,
) -> Result<MergedResourceTree, ResourceError> {
    let mut tree = MergedResourceTree::new();
    let mut skipped_dirs = BTreeSet::new();

    for item in own.into_iter().chain(imported) {
        let Some(output) = admit(&item, options, sink, &mut skipped_dirs) else {
            continue;
        };
        let key = output.as_str().to_lowercase();
        let Some(existing) = tree.get_mut(&key) else {
            tree.insert(MergedEntry {
                output,
                item,
                overridden: Vec::new(),
                dropped: BTreeMap::new(),
            });
            continue;
        };
        if existing.item.origin == item.origin {
            sink.emit(
                Diagnostic::error(
                    codes::DUPLICATE_RESOURCE_FILE,
                    format!(
                        "Resource '{}' is declared more than once: '{}' and '{}' map to the same file",
                        existing.output,
                        existing.item.source.display(),
                        item.source.display()
                    ),
                )
                .in_file(&item.source)
                .for_project(&item.origin.project),
            );
            continue;
        }
        let (winner, loser) = if item.origin.role < existing.item.origin.role {
            let previous = std::mem::replace(&mut existing.item, item);
            existing.output = output;
            (existing.item.origin.clone(), previous)
        } else {
            (existing.item.origin.clone(), item)
        };
        let localized = existing.dir().is_some_and(|d| d.is_localized());
        if !existing.is_values() && !localized {
            sink.emit(
                Diagnostic::warning(
                    codes::OVERRIDDEN_RESOURCE,
                    format!(
                        "Resource '{}' from '{}' is overridden by '{}'",
                        existing.output, loser.origin, winner
                    ),
                )
                .in_file(&loser.source)
                .for_project(&winner.project),
            );
        }
        existing.overridden.push(loser);
        existing.overridden.sort_by(|a, b| a.origin.role.cmp(&b.origin.role));
    }

    merge_values(&mut tree, sink)?;
    Ok(tree)
}

/// Validates one item and computes its output path.
fn admit(
    item: &ResourceItem,
    options: &MergeOptions,
    sink: &DiagnosticSink,
    skipped_dirs: &mut BTreeSet<(String, String)>,
) -> Option<andpack_common::LogicalPath> {
    let dir_name = item.dir_name();
    let parsed = if item.logical.segments().count() == 2 {
        ResourceDir::parse(dir_name).map_err(|e| e.to_string())
    } else {
        Err("resource files may not be nested".to_string())
    };
    let dir = match parsed {
        Ok(dir) => dir,
        Err(reason) => {
            sink.emit(
                Diagnostic::error(
                    codes::INVALID_RESOURCE_DIRECTORY,
                    format!("Invalid resource directory name: \"{dir_name}\" ({reason})"),
                )
                .in_file(&item.source)
                .for_project(&item.origin.project),
            );
            return None;
        }
    };
    if let Some(level) = dir.api_level.filter(|l| *l > options.max_api_level) {
        if skipped_dirs.insert((item.origin.project.clone(), dir_name.to_string())) {
            sink.emit(
                Diagnostic::warning(
                    codes::API_LEVEL_SKIPPED,
                    format!(
                        "Skipping resource directory '{dir_name}': API level {level} is higher than the maximum supported level {}",
                        options.max_api_level
                    ),
                )
                .in_file(&item.source)
                .for_project(&item.origin.project),
            );
        }
        return None;
    }

    let output = if options.lowercase_file_names {
        item.logical.to_lowercase()
    } else {
        item.logical.clone()
    };
    if let Some(bad) = invalid_file_name_char(output.file_name()) {
        let severity = match options.file_name_check {
            FileNameCheck::Error => Severity::Error,
            FileNameCheck::Warning => Severity::Warning,
        };
        sink.emit(
            Diagnostic::error(
                codes::INVALID_RESOURCE_FILE_NAME,
                format!(
                    "Invalid file name '{}': contains '{bad}'; file-based resource names must contain only lowercase a-z, 0-9, or underscore",
                    item.file_name()
                ),
            )
            .with_severity(severity)
            .in_file(&item.source)
            .for_project(&item.origin.project),
        );
        if severity.is_error() {
            return None;
        }
    }
    Some(output)
}

struct Declared {
    role: Role,
    origin: ResourceOrigin,
    source: PathBuf,
}

/// Resolves values entries across every values file of each directory.
fn merge_values(tree: &mut MergedResourceTree, sink: &DiagnosticSink) -> Result<(), ResourceError> {
    let mut by_dir: BTreeMap<String, Vec<(String, ResourceItem)>> = BTreeMap::new();
    for entry in tree.iter().filter(|e| e.is_values()) {
        let key = entry.output.as_str().to_lowercase();
        for item in std::iter::once(&entry.item).chain(entry.overridden.iter()) {
            by_dir
                .entry(entry.output.first_segment().to_string())
                .or_default()
                .push((key.clone(), item.clone()));
        }
    }

    for (dir_name, mut files) in by_dir {
        let localized = ResourceDir::parse(&dir_name).is_ok_and(|d| d.is_localized());
        files.sort_by(|a, b| {
            (a.1.origin.role, &a.1.logical).cmp(&(b.1.origin.role, &b.1.logical))
        });
        let mut owners: BTreeMap<ValuesKey, Declared> = BTreeMap::new();
        for (tree_key, item) in files {
            let text = std::fs::read_to_string(&item.source)
                .map_err(|e| ResourceError::io(&item.source, e))?;
            let entries = match parse_values(&text) {
                Ok(entries) => entries,
                Err(err) => {
                    sink.emit(
                        Diagnostic::error(codes::MALFORMED_RESOURCE_XML, err.message)
                            .at(Location::at(&item.source, err.line, err.column))
                            .for_project(&item.origin.project),
                    );
                    continue;
                }
            };
            let mut seen_here = BTreeSet::new();
            let mut dropped = BTreeSet::new();
            for entry in entries {
                let location = Location::at(&item.source, entry.line, entry.column);
                if !seen_here.insert(entry.key.clone()) {
                    if entry.key.kind != "id" {
                        sink.emit(
                            Diagnostic::error(
                                codes::DUPLICATE_VALUES_ENTRY,
                                format!(
                                    "Resource entry {} is already defined in '{}'",
                                    entry.key.name,
                                    item.source.display()
                                ),
                            )
                            .at(location)
                            .for_project(&item.origin.project),
                        );
                    }
                    continue;
                }
                if entry.key.kind == "id" {
                    continue;
                }
                match owners.get(&entry.key) {
                    None => {
                        owners.insert(
                            entry.key,
                            Declared {
                                role: item.origin.role,
                                origin: item.origin.clone(),
                                source: item.source.clone(),
                            },
                        );
                    }
                    Some(owner) if owner.role == item.origin.role => {
                        sink.emit(
                            Diagnostic::error(
                                codes::DUPLICATE_VALUES_ENTRY,
                                format!(
                                    "Resource entry {} is already defined in '{}'",
                                    entry.key.name,
                                    owner.source.display()
                                ),
                            )
                            .at(location)
                            .for_project(&item.origin.project),
                        );
                    }
                    Some(owner) => {
                        if !localized {
                            sink.emit(
                                Diagnostic::warning(
                                    codes::OVERRIDDEN_RESOURCE,
                                    format!(
                                        "Resource entry {} from '{}' is overridden by '{}'",
                                        entry.key, item.origin, owner.origin
                                    ),
                                )
                                .at(location)
                                .for_project(&owner.origin.project),
                            );
                        }
                        dropped.insert(entry.key.to_string());
                    }
                }
            }
            if !dropped.is_empty() {
                if let Some(merged) = tree.get_mut(&tree_key) {
                    merged.dropped.insert(item.source.clone(), dropped);
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use andpack_common::LogicalPath;
    use std::path::Path;

    fn options() -> MergeOptions {
        MergeOptions {
            max_api_level: 34,
            lowercase_file_names: true,
            file_name_check: FileNameCheck::Error,
        }
    }

    fn item(root: &Path, logical: &str, origin: &ResourceOrigin, content: &str) -> ResourceItem {
        let source = root.join(&origin.project).join(logical);
        std::fs::create_dir_all(source.parent().unwrap()).unwrap();
        std::fs::write(&source, content).unwrap();
        ResourceItem {
            logical: LogicalPath::new(logical),
            source,
            origin: origin.clone(),
        }
    }

    fn codes_of(sink: &DiagnosticSink) -> Vec<String> {
        sink.diagnostics().iter().map(|d| d.code.to_string()).collect()
    }

    #[test]
    fn lowercases_output_paths() {
        let dir = tempfile::tempdir().unwrap();
        let app = ResourceOrigin::app("App1");
        let own = vec![item(dir.path(), "drawable/UPPER_image.png", &app, "png")];
        let sink = DiagnosticSink::new();
        let tree = merge(own, vec![], &options(), &sink).unwrap();
        let entry = tree.get("drawable/upper_image.png").unwrap();
        assert_eq!(entry.output.as_str(), "drawable/upper_image.png");
        assert_eq!(entry.item.logical.as_str(), "drawable/UPPER_image.png");
        assert!(!sink.has_errors());
    }

    #[test]
    fn same_project_case_duplicate_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let app = ResourceOrigin::app("App1");
        let own = vec![
            item(dir.path(), "layout/main.xml", &app, "<a/>"),
            item(dir.path(), "layout/Main.xml", &app, "<b/>"),
        ];
        let sink = DiagnosticSink::new();
        let tree = merge(own, vec![], &options(), &sink).unwrap();
        assert_eq!(codes_of(&sink), vec!["APT0003"]);
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn different_qualifiers_are_distinct() {
        let dir = tempfile::tempdir().unwrap();
        let app = ResourceOrigin::app("App1");
        let own = vec![
            item(dir.path(), "layout/main.xml", &app, "<a/>"),
            item(dir.path(), "layout-xhdpi/Main.xml", &app, "<b/>"),
        ];
        let sink = DiagnosticSink::new();
        let tree = merge(own, vec![], &options(), &sink).unwrap();
        assert_eq!(tree.len(), 2);
        assert!(!sink.has_errors());
    }

    #[test]
    fn app_overrides_library() {
        let dir = tempfile::tempdir().unwrap();
        let app = ResourceOrigin::app("App1");
        let lib = ResourceOrigin::library("Lib1", 0);
        let imported = vec![item(dir.path(), "drawable/icon.png", &lib, "lib")];
        let own = vec![item(dir.path(), "drawable/Icon.png", &app, "app")];
        let sink = DiagnosticSink::new();
        // Library listed first on purpose: precedence does not depend on order.
        let tree = merge(imported, own, &options(), &sink).unwrap();
        let entry = tree.get("drawable/icon.png").unwrap();
        assert!(entry.item.origin.is_app());
        assert_eq!(entry.overridden.len(), 1);
        assert_eq!(codes_of(&sink), vec!["APT0007"]);
        assert!(!sink.has_errors());
    }

    #[test]
    fn invalid_directory_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let app = ResourceOrigin::app("App1");
        let own = vec![item(dir.path(), "drawables/icon.png", &app, "png")];
        let sink = DiagnosticSink::new();
        let tree = merge(own, vec![], &options(), &sink).unwrap();
        assert!(tree.is_empty());
        let diags = sink.diagnostics();
        assert_eq!(diags[0].code, codes::INVALID_RESOURCE_DIRECTORY);
        assert!(diags[0].message.contains("\"drawables\""));
    }

    #[test]
    fn api_level_above_max_is_warning() {
        let dir = tempfile::tempdir().unwrap();
        let app = ResourceOrigin::app("App1");
        let own = vec![
            item(dir.path(), "values-v99/styles.xml", &app, "<resources/>"),
            item(dir.path(), "values-v99/colors.xml", &app, "<resources/>"),
        ];
        let sink = DiagnosticSink::new();
        let tree = merge(own, vec![], &options(), &sink).unwrap();
        assert!(tree.is_empty());
        assert_eq!(codes_of(&sink), vec!["APT0008"]);
        assert!(!sink.has_errors());
    }

    #[test]
    fn invalid_file_name_severity_follows_config() {
        let dir = tempfile::tempdir().unwrap();
        let app = ResourceOrigin::app("App1");
        let own = || vec![item(dir.path(), "drawable/my-image.png", &app, "png")];

        let sink = DiagnosticSink::new();
        let tree = merge(own(), vec![], &options(), &sink).unwrap();
        assert!(sink.has_errors());
        assert!(tree.is_empty());

        let sink = DiagnosticSink::new();
        let lenient = MergeOptions {
            file_name_check: FileNameCheck::Warning,
            ..options()
        };
        let tree = merge(own(), vec![], &lenient, &sink).unwrap();
        assert!(!sink.has_errors());
        assert_eq!(sink.warning_count(), 1);
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn duplicate_values_entry_in_one_file() {
        let dir = tempfile::tempdir().unwrap();
        let app = ResourceOrigin::app("App1");
        let own = vec![item(
            dir.path(),
            "values/strings.xml",
            &app,
            "<resources>\n<string name=\"a\">1</string>\n<string name=\"a\">2</string>\n</resources>",
        )];
        let sink = DiagnosticSink::new();
        merge(own, vec![], &options(), &sink).unwrap();
        let diags = sink.diagnostics();
        assert_eq!(diags[0].code, codes::DUPLICATE_VALUES_ENTRY);
        assert_eq!(diags[0].location.as_ref().unwrap().line, Some(3));
    }

    #[test]
    fn library_values_entry_dropped_when_app_declares_it() {
        let dir = tempfile::tempdir().unwrap();
        let app = ResourceOrigin::app("App1");
        let lib = ResourceOrigin::library("Lib1", 0);
        let own = vec![item(
            dir.path(),
            "values/Strings.xml",
            &app,
            "<resources><string name=\"hello\">app</string></resources>",
        )];
        let imported = vec![item(
            dir.path(),
            "values/lib_strings.xml",
            &lib,
            "<resources><string name=\"hello\">lib</string><string name=\"other\">x</string></resources>",
        )];
        let sink = DiagnosticSink::new();
        let tree = merge(own, imported, &options(), &sink).unwrap();
        assert!(!sink.has_errors());
        assert_eq!(codes_of(&sink), vec!["APT0007"]);
        let lib_entry = tree.get("values/lib_strings.xml").unwrap();
        let dropped = lib_entry.dropped.values().next().unwrap();
        assert!(dropped.contains("string/hello"));
        assert!(!dropped.contains("string/other"));
    }

    #[test]
    fn localized_library_override_is_silent() {
        let dir = tempfile::tempdir().unwrap();
        let app = ResourceOrigin::app("App1");
        let lib = ResourceOrigin::library("Lib1", 0);
        let text = "<resources><string name=\"hello\">Bonjour</string></resources>";
        let own = vec![item(dir.path(), "values-fr/strings.xml", &app, text)];
        let imported = vec![item(dir.path(), "values-fr/strings.xml", &lib, text)];
        let sink = DiagnosticSink::new();
        merge(own, imported, &options(), &sink).unwrap();
        assert!(sink.diagnostics().is_empty());
    }

    #[test]
    fn malformed_values_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let app = ResourceOrigin::app("App1");
        let own = vec![item(dir.path(), "values/strings.xml", &app, "<resources><string>")];
        let sink = DiagnosticSink::new();
        merge(own, vec![], &options(), &sink).unwrap();
        assert_eq!(codes_of(&sink), vec!["APT0010"]);
    }
}
