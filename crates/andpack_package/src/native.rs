//! Native library collection.
//!
//! Every shared object ends up at `lib/<abi>/<file>`. The ABI comes from an
//! explicit declaration or from the directory holding the file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use andpack_config::{NativeLibraryEntry, KNOWN_ABIS};
use andpack_diagnostics::{codes, Diagnostic, DiagnosticSink};
use walkdir::WalkDir;

/// A native library candidate before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeSource {
    /// The `.so` file.
    pub path: PathBuf,
    /// Declared ABI; inferred from the parent directory when `None`.
    pub abi: Option<String>,
    /// Contributing project, for diagnostics.
    pub project: String,
}

/// A validated native library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeLibrary {
    /// Target ABI.
    pub abi: String,
    /// File name inside `lib/<abi>/`.
    pub name: String,
    /// File on disk.
    pub source: PathBuf,
    /// Contributing project.
    pub project: String,
}

impl NativeLibrary {
    /// `lib/<abi>/<name>`.
    pub fn archive_path(&self) -> String {
        format!("lib/{}/{}", self.abi, self.name)
    }
}

fn shared_objects(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "so"))
        .collect();
    files.sort();
    files
}

/// Expands `[[native_libraries]]` entries. A directory entry contributes
/// every `.so` below it.
pub fn sources_from_entries(project_dir: &Path, entries: &[NativeLibraryEntry], project: &str) -> Vec<NativeSource> {
    let mut sources = Vec::new();
    for entry in entries {
        let path = project_dir.join(&entry.path);
        let files = if path.is_dir() { shared_objects(&path) } else { vec![path] };
        sources.extend(files.into_iter().map(|path| NativeSource {
            path,
            abi: entry.abi.clone(),
            project: project.to_string(),
        }));
    }
    sources
}

/// Every `.so` under an extracted library's `jni/` directory.
pub fn sources_from_jni_dir(jni_dir: &Path, project: &str) -> Vec<NativeSource> {
    shared_objects(jni_dir)
        .into_iter()
        .map(|path| NativeSource {
            path,
            abi: None,
            project: project.to_string(),
        })
        .collect()
}

fn inferred_abi(source: &NativeSource) -> Option<String> {
    source.abi.clone().or_else(|| {
        source
            .path
            .parent()
            .and_then(Path::file_name)
            .map(|n| n.to_string_lossy().into_owned())
    })
}

/// Validates sources and lays them out by ABI.
///
/// A file whose ABI is not a known Android ABI is PKG0001. A second file
/// mapping to an archive path already taken is PKG0002 and dropped. Files
/// for known ABIs outside `supported_abis` are left out silently. The result
/// is sorted by archive path.
pub fn collect_native_libraries(
    sources: &[NativeSource],
    supported_abis: &[String],
    sink: &DiagnosticSink,
) -> Vec<NativeLibrary> {
    let mut libraries: BTreeMap<String, NativeLibrary> = BTreeMap::new();
    for source in sources {
        let abi = inferred_abi(source).unwrap_or_default();
        if !KNOWN_ABIS.contains(&abi.as_str()) {
            sink.emit(
                Diagnostic::error(
                    codes::UNKNOWN_ABI,
                    format!(
                        "Cannot determine ABI of native library '{}'. Move this file to a directory with a valid Android ABI name such as 'libs/armeabi-v7a/'.",
                        source.path.display()
                    ),
                )
                .in_file(&source.path)
                .for_project(&source.project),
            );
            continue;
        }
        if !supported_abis.iter().any(|a| *a == abi) {
            tracing::debug!(path = %source.path.display(), abi = %abi, "native library ABI not supported; skipped");
            continue;
        }
        let Some(name) = source.path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };
        let library = NativeLibrary {
            abi,
            name,
            source: source.path.clone(),
            project: source.project.clone(),
        };
        let key = library.archive_path();
        if let Some(first) = libraries.get(&key) {
            sink.emit(
                Diagnostic::warning(
                    codes::DUPLICATE_NATIVE_LIBRARY,
                    format!(
                        "Native library '{key}' from '{}' is ignored; '{}' already provides it.",
                        source.path.display(),
                        first.source.display()
                    ),
                )
                .in_file(&source.path)
                .for_project(&source.project),
            );
            continue;
        }
        libraries.insert(key, library);
    }
    libraries.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, b"\x7fELF").unwrap();
    }

    fn abis() -> Vec<String> {
        vec!["arm64-v8a".into(), "x86_64".into()]
    }

    #[test]
    fn abi_comes_from_directory_or_declaration() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("libs/arm64-v8a/libfoo.so"));
        touch(&dir.path().join("native/libbar.so"));
        let entries = vec![
            NativeLibraryEntry {
                path: "libs".into(),
                abi: None,
            },
            NativeLibraryEntry {
                path: "native/libbar.so".into(),
                abi: Some("x86_64".into()),
            },
        ];
        let sources = sources_from_entries(dir.path(), &entries, "App1");
        let sink = DiagnosticSink::new();
        let libs = collect_native_libraries(&sources, &abis(), &sink);
        let paths: Vec<String> = libs.iter().map(NativeLibrary::archive_path).collect();
        assert_eq!(paths, vec!["lib/arm64-v8a/libfoo.so", "lib/x86_64/libbar.so"]);
        assert!(sink.diagnostics().is_empty());
    }

    #[test]
    fn unknown_abi_is_an_error_naming_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("libs/armeabi-v9/libfoo.so");
        touch(&path);
        let sources = sources_from_jni_dir(&dir.path().join("libs"), "Library1");
        let sink = DiagnosticSink::new();
        assert!(collect_native_libraries(&sources, &abis(), &sink).is_empty());
        let diags = sink.diagnostics();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, codes::UNKNOWN_ABI);
        assert!(diags[0].message.contains(&path.display().to_string()));
    }

    #[test]
    fn duplicates_keep_the_first() {
        let dir = tempfile::tempdir().unwrap();
        let app = dir.path().join("app/libs/x86_64/libfoo.so");
        let lib = dir.path().join("lib/jni/x86_64/libfoo.so");
        touch(&app);
        touch(&lib);
        let mut sources = sources_from_jni_dir(&dir.path().join("app/libs"), "App1");
        sources.extend(sources_from_jni_dir(&dir.path().join("lib/jni"), "Library1"));
        let sink = DiagnosticSink::new();
        let libs = collect_native_libraries(&sources, &abis(), &sink);
        assert_eq!(libs.len(), 1);
        assert_eq!(libs[0].source, app);
        let diags = sink.diagnostics();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, codes::DUPLICATE_NATIVE_LIBRARY);
        assert!(!diags[0].severity.is_error());
    }

    #[test]
    fn unsupported_known_abi_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("libs/x86/libfoo.so"));
        let sources = sources_from_jni_dir(&dir.path().join("libs"), "App1");
        let sink = DiagnosticSink::new();
        assert!(collect_native_libraries(&sources, &abis(), &sink).is_empty());
        assert!(sink.diagnostics().is_empty());
    }
}
