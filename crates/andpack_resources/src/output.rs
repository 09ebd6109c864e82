//! Writing the merged tree to `<intermediate>/res`.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use andpack_common::fs::{copy_if_changed, remove_unknown_files, write_if_changed};
use andpack_diagnostics::{codes, Diagnostic, DiagnosticSink, Location};
use rayon::prelude::*;

use crate::error::ResourceError;
use crate::ninepatch::{is_nine_patch, validate_nine_patch};
use crate::rewrite::{rewrite_xml, RewriteRules};
use crate::tree::{MergedEntry, MergedResourceTree};
use crate::values::{append_entries, parse_values, XmlError};

/// What [`materialize`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaterializeReport {
    /// Files whose content changed.
    pub written: Vec<PathBuf>,
    /// Files left untouched because their content matched.
    pub unchanged: usize,
    /// Stale files deleted.
    pub removed: Vec<PathBuf>,
}

enum Outcome {
    Written(PathBuf),
    Unchanged,
    Skipped,
}

/// Writes every tree entry below `res_dir` and deletes anything else there.
///
/// XML files are rewritten, values files from several projects are folded
/// together, 9-patch images are validated (APT0009). Output files keep their
/// timestamps when the content is unchanged.
pub fn materialize(
    tree: &MergedResourceTree,
    res_dir: &Path,
    rules: &RewriteRules<'_>,
    sink: &DiagnosticSink,
) -> Result<MaterializeReport, ResourceError> {
    let entries: Vec<&MergedEntry> = tree.iter().collect();
    let outcomes: Vec<Outcome> = entries
        .par_iter()
        .map(|entry| write_entry(entry, res_dir, rules, sink))
        .collect::<Result<_, _>>()?;

    let mut report = MaterializeReport::default();
    for outcome in outcomes {
        match outcome {
            Outcome::Written(path) => report.written.push(path),
            Outcome::Unchanged => report.unchanged += 1,
            Outcome::Skipped => {}
        }
    }
    let known: BTreeSet<PathBuf> = tree.output_paths(res_dir);
    report.removed =
        remove_unknown_files(res_dir, &known).map_err(|e| ResourceError::io(res_dir, e))?;
    for removed in &report.removed {
        tracing::debug!(path = %removed.display(), "removed stale resource");
    }
    Ok(report)
}

fn write_entry(
    entry: &MergedEntry,
    res_dir: &Path,
    rules: &RewriteRules<'_>,
    sink: &DiagnosticSink,
) -> Result<Outcome, ResourceError> {
    let dest = entry.output.to_path(res_dir);
    let source = &entry.item.source;
    let file_name = entry.output.file_name();

    if is_nine_patch(file_name) {
        let bytes = std::fs::read(source).map_err(|e| ResourceError::io(source, e))?;
        if let Err(err) = validate_nine_patch(&bytes) {
            sink.emit(
                Diagnostic::error(codes::INVALID_NINE_PATCH, format!("invalid 9-patch image: {err}"))
                    .in_file(source)
                    .for_project(&entry.item.origin.project),
            );
            return Ok(Outcome::Skipped);
        }
    }

    let is_xml = file_name.ends_with(".xml") && entry.dir().is_some_and(|d| d.holds_xml());
    let changed = if is_xml {
        let Some(text) = xml_output(entry)? else {
            return Ok(Outcome::Skipped);
        };
        let bytes = match rewrite_xml(&text, rules) {
            Ok(rewritten) => rewritten.unwrap_or(text),
            Err(err) => {
                report_xml_error(entry, source, err, sink);
                return Ok(Outcome::Skipped);
            }
        };
        write_if_changed(&dest, bytes.as_bytes()).map_err(|e| ResourceError::io(&dest, e))?
    } else {
        copy_if_changed(source, &dest).map_err(|e| ResourceError::io(&dest, e))?
    };
    Ok(if changed {
        Outcome::Written(dest)
    } else {
        Outcome::Unchanged
    })
}

fn report_xml_error(entry: &MergedEntry, source: &Path, err: XmlError, sink: &DiagnosticSink) {
    sink.emit(
        Diagnostic::error(codes::MALFORMED_RESOURCE_XML, err.message)
            .at(Location::at(source, err.line, err.column))
            .for_project(&entry.item.origin.project),
    );
}

/// Text of an XML entry before rewriting: the winner's source with dropped
/// values entries cut out and, for values files, the surviving entries of
/// overridden contributors appended.
///
/// `None` for a malformed values file; the merge already reported it.
fn xml_output(entry: &MergedEntry) -> Result<Option<String>, ResourceError> {
    let source = &entry.item.source;
    let text = std::fs::read_to_string(source).map_err(|e| ResourceError::io(source, e))?;
    if !entry.is_values() {
        return Ok(Some(text));
    }
    let Ok(mut base) = strip_dropped(&text, entry.dropped.get(source)) else {
        return Ok(None);
    };
    let mut snippets = Vec::new();
    for other in entry.contributors().skip(1) {
        let other_text =
            std::fs::read_to_string(&other.source).map_err(|e| ResourceError::io(&other.source, e))?;
        let dropped = entry.dropped.get(&other.source);
        let Ok(values) = parse_values(&other_text) else {
            continue;
        };
        for value in values {
            if dropped.is_some_and(|d| d.contains(&value.key.to_string())) {
                continue;
            }
            snippets.push(other_text[value.range].to_string());
        }
    }
    if !snippets.is_empty() {
        let refs: Vec<&str> = snippets.iter().map(String::as_str).collect();
        let Ok(appended) = append_entries(&base, &refs) else {
            return Ok(None);
        };
        base = appended;
    }
    Ok(Some(base))
}

fn strip_dropped(text: &str, dropped: Option<&BTreeSet<String>>) -> Result<String, XmlError> {
    let Some(dropped) = dropped else {
        return Ok(text.to_string());
    };
    let mut out = String::with_capacity(text.len());
    let mut pos = 0;
    for value in parse_values(text)? {
        if dropped.contains(&value.key.to_string()) {
            out.push_str(&text[pos..value.range.start]);
            pos = value.range.end;
        }
    }
    out.push_str(&text[pos..]);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{ResourceItem, ResourceOrigin};
    use crate::merge::{merge, MergeOptions};
    use crate::ninepatch::tests::valid_nine_patch;
    use crate::rewrite::CustomViewMap;
    use andpack_common::LogicalPath;
    use andpack_config::FileNameCheck;

    fn options() -> MergeOptions {
        MergeOptions {
            max_api_level: 34,
            lowercase_file_names: true,
            file_name_check: FileNameCheck::Error,
        }
    }

    fn item(root: &Path, origin: &ResourceOrigin, logical: &str, content: &[u8]) -> ResourceItem {
        let source = root.join(&origin.project).join(logical);
        std::fs::create_dir_all(source.parent().unwrap()).unwrap();
        std::fs::write(&source, content).unwrap();
        ResourceItem {
            logical: LogicalPath::new(logical),
            source,
            origin: origin.clone(),
        }
    }

    fn build(
        own: Vec<ResourceItem>,
        imported: Vec<ResourceItem>,
        res: &Path,
    ) -> (MaterializeReport, DiagnosticSink) {
        let sink = DiagnosticSink::new();
        let tree = merge(own, imported, &options(), &sink).unwrap();
        let views = CustomViewMap::default();
        let rules = RewriteRules {
            lowercase_references: true,
            custom_views: &views,
        };
        let report = materialize(&tree, res, &rules, &sink).unwrap();
        (report, sink)
    }

    #[test]
    fn writes_lowercased_tree_and_keeps_unchanged_files() {
        let dir = tempfile::tempdir().unwrap();
        let res = dir.path().join("obj/res");
        let app = ResourceOrigin::app("App1");
        let own = || {
            vec![
                item(dir.path(), &app, "drawable/UPPER_image.png", b"png"),
                item(
                    dir.path(),
                    &app,
                    "layout/Main.xml",
                    b"<ImageView xmlns:android=\"http://schemas.android.com/apk/res/android\" android:src=\"@drawable/UPPER_image\"/>",
                ),
            ]
        };
        let (report, sink) = build(own(), vec![], &res);
        assert!(!sink.has_errors());
        assert_eq!(report.written.len(), 2);
        let layout = std::fs::read_to_string(res.join("layout/main.xml")).unwrap();
        assert!(layout.contains("@drawable/upper_image"));
        assert!(res.join("drawable/upper_image.png").exists());

        let (report, _) = build(own(), vec![], &res);
        assert!(report.written.is_empty());
        assert_eq!(report.unchanged, 2);
    }

    #[test]
    fn removed_and_renamed_items_leave_no_orphans() {
        let dir = tempfile::tempdir().unwrap();
        let res = dir.path().join("obj/res");
        let app = ResourceOrigin::app("App1");
        let first = vec![
            item(dir.path(), &app, "drawable/image1.png", b"1"),
            item(dir.path(), &app, "raw/data.bin", b"2"),
        ];
        build(first, vec![], &res);

        let second = vec![item(dir.path(), &app, "drawable/image2.png", b"1")];
        let (report, _) = build(second, vec![], &res);
        assert_eq!(report.removed.len(), 2);
        assert!(!res.join("drawable/image1.png").exists());
        assert!(!res.join("raw").exists());
        assert!(res.join("drawable/image2.png").exists());
    }

    #[test]
    fn library_values_are_folded_into_app_file() {
        let dir = tempfile::tempdir().unwrap();
        let res = dir.path().join("obj/res");
        let app = ResourceOrigin::app("App1");
        let lib = ResourceOrigin::library("Lib1", 0);
        let own = vec![item(
            dir.path(),
            &app,
            "values/strings.xml",
            b"<resources>\n    <string name=\"hello\">app</string>\n</resources>\n",
        )];
        let imported = vec![item(
            dir.path(),
            &lib,
            "values/strings.xml",
            b"<resources>\n    <string name=\"hello\">lib</string>\n    <string name=\"lib_only\">x</string>\n</resources>\n",
        )];
        let (_, sink) = build(own, imported, &res);
        assert!(!sink.has_errors());
        let merged = std::fs::read_to_string(res.join("values/strings.xml")).unwrap();
        let names: Vec<String> = parse_values(&merged).unwrap().into_iter().map(|v| v.key.name).collect();
        assert_eq!(names, vec!["hello", "lib_only"]);
        assert!(merged.contains(">app<"));
        assert!(!merged.contains(">lib<"));
    }

    #[test]
    fn dropped_entry_is_cut_from_library_file() {
        let dir = tempfile::tempdir().unwrap();
        let res = dir.path().join("obj/res");
        let app = ResourceOrigin::app("App1");
        let lib = ResourceOrigin::library("Lib1", 0);
        let own = vec![item(dir.path(), &app, "values/strings.xml", b"<resources><string name=\"a\">app</string></resources>")];
        let imported = vec![item(
            dir.path(),
            &lib,
            "values/lib.xml",
            b"<resources><string name=\"a\">lib</string><string name=\"b\">b</string></resources>",
        )];
        build(own, imported, &res);
        let lib_out = std::fs::read_to_string(res.join("values/lib.xml")).unwrap();
        assert_eq!(lib_out, "<resources><string name=\"b\">b</string></resources>");
    }

    #[test]
    fn nine_patches_are_validated() {
        let dir = tempfile::tempdir().unwrap();
        let res = dir.path().join("obj/res");
        let app = ResourceOrigin::app("App1");
        let lib = ResourceOrigin::library("Lib1", 0);
        let own = vec![
            item(dir.path(), &app, "drawable/Image.9.png", &valid_nine_patch()),
            item(dir.path(), &app, "drawable/broken.9.png", b"not a png"),
        ];
        let imported = vec![item(dir.path(), &lib, "drawable/Image2.9.png", &valid_nine_patch())];
        let (_, sink) = build(own, imported, &res);
        assert!(res.join("drawable/image.9.png").exists());
        assert!(res.join("drawable/image2.9.png").exists());
        assert!(!res.join("drawable/broken.9.png").exists());
        assert_eq!(sink.error_count(), 1);
        assert_eq!(sink.diagnostics()[0].code, codes::INVALID_NINE_PATCH);
    }

    #[test]
    fn read_only_output_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let res = dir.path().join("obj/res");
        let app = ResourceOrigin::app("App1");
        build(vec![item(dir.path(), &app, "raw/data.txt", b"one")], vec![], &res);
        let out = res.join("raw/data.txt");
        let mut perms = std::fs::metadata(&out).unwrap().permissions();
        perms.set_readonly(true);
        std::fs::set_permissions(&out, perms).unwrap();

        build(vec![item(dir.path(), &app, "raw/data.txt", b"two")], vec![], &res);
        assert_eq!(std::fs::read(&out).unwrap(), b"two");
    }
}
