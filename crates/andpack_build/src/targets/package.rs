//! `_BuildApk`, `_BuildAppBundle`, `_Sign` and
//! `_CreateAndroidLibraryArchive`.

use std::ffi::OsString;
use std::path::PathBuf;

use andpack_assets::pack_dir;
use andpack_cache::TargetInputs;
use andpack_config::PackageFormat;
use andpack_diagnostics::{codes, DiagnosticSink};
use andpack_imports::LibraryMetadata;
use andpack_package::{
    assemble, collect_native_libraries, create_library_archive, layout_for, sign_archive, signed_path,
    sources_from_entries, sources_from_jni_dir, LibraryArchiveContents, NativeLibrary, PackSource, PackageContents,
};

use crate::error::BuildError;
use crate::target::{BuildState, Target};
use crate::tool::{SourceMap, ToolCommand, ToolRunner};

use super::java::dex_files;
use super::resources::managed_types;
use super::{files_under, BUILD_APK, BUILD_APP_BUNDLE, CREATE_LIBRARY_ARCHIVE, SIGN};

/// Validates native libraries of the project and, when `with_imports`, of
/// every imported library.
///
/// Errors go straight to the build's sink so the target fails. Warnings are
/// held back until the target actually runs, so a skipped package does not
/// repeat them.
fn native_libraries(state: &mut BuildState<'_>, with_imports: bool) -> Vec<NativeLibrary> {
    let project = state.project;
    let mut sources = sources_from_entries(&project.dir, &project.config.native_libraries, project.name());
    if with_imports {
        for library in &state.imports.libraries {
            if let Some(jni) = &library.jni_dir {
                sources.extend(sources_from_jni_dir(jni, &library.name));
            }
        }
    }
    let scratch = DiagnosticSink::new();
    let libraries = collect_native_libraries(&sources, &project.build.supported_abis, &scratch);
    for diagnostic in scratch.take_all() {
        if diagnostic.severity.is_error() {
            state.sink.emit(diagnostic);
        } else {
            state.deferred.push(diagnostic);
        }
    }
    libraries
}

fn existing_dir(path: PathBuf) -> Option<PathBuf> {
    path.is_dir().then_some(path)
}

/// Writes `<output>/<package>.apk` or `.aab` from everything the earlier
/// targets produced.
pub struct BuildPackage {
    format: PackageFormat,
}

impl BuildPackage {
    /// The packaging target for `format`.
    pub fn new(format: PackageFormat) -> Self {
        Self { format }
    }

    fn contents(&self, state: &BuildState<'_>) -> Result<PackageContents, BuildError> {
        let project = state.project;
        let intermediate = project.intermediate();
        let packs = match self.format {
            PackageFormat::Apk => Vec::new(),
            PackageFormat::Aab => state
                .partition
                .iter()
                .flat_map(|p| p.pack_names())
                .map(|name| PackSource {
                    dir: pack_dir(&intermediate, &name),
                    name,
                })
                .collect(),
        };
        Ok(PackageContents {
            manifest: project.manifest_out(),
            res_dir: existing_dir(project.res_out()),
            assets_dir: existing_dir(project.assets_out()),
            native: state.native.clone(),
            dex: dex_files(&project.bin_out())?,
            assemblies: files_under(&project.assemblies_out())?,
            packs,
        })
    }
}

impl Target for BuildPackage {
    fn name(&self) -> &'static str {
        match self.format {
            PackageFormat::Apk => BUILD_APK,
            PackageFormat::Aab => BUILD_APP_BUNDLE,
        }
    }

    fn inputs(&self, state: &mut BuildState<'_>) -> Result<TargetInputs, BuildError> {
        state.native = native_libraries(state, true);
        let contents = self.contents(state)?;
        let native: Vec<String> = contents.native.iter().map(NativeLibrary::archive_path).collect();
        Ok(TargetInputs::new()
            .files(contents.input_files()?)
            .property("format", self.format)
            .property("native", native.join(";")))
    }

    fn execute(&self, state: &mut BuildState<'_>) -> Result<Vec<PathBuf>, BuildError> {
        let out = state.project.package_path();
        let contents = self.contents(state)?;
        assemble(layout_for(self.format), &contents, &out)?;
        Ok(vec![out])
    }
}

/// Signs the package, with the configured signer or the built-in one.
pub struct Sign;

impl Target for Sign {
    fn name(&self) -> &'static str {
        SIGN
    }

    fn inputs(&self, state: &mut BuildState<'_>) -> Result<TargetInputs, BuildError> {
        let signer = state.project.config.tools.signer.clone().unwrap_or_default();
        Ok(TargetInputs::new()
            .file(state.project.package_path())
            .property("signer", signer))
    }

    fn execute(&self, state: &mut BuildState<'_>) -> Result<Vec<PathBuf>, BuildError> {
        let project = state.project;
        let unsigned = project.package_path();
        let signed = signed_path(&unsigned);
        match &project.config.tools.signer {
            Some(command) => {
                let tool = ToolCommand {
                    label: "signer",
                    command: command.clone(),
                    failure: codes::TOOL_FAILED,
                };
                let args: Vec<OsString> = vec![
                    "--out".into(),
                    signed.clone().into_os_string(),
                    unsigned.into_os_string(),
                ];
                let runner = ToolRunner::new(state.context, project.name(), &project.dir, state.sink);
                if !runner.run(&tool, &args, &SourceMap::default()) {
                    return Ok(Vec::new());
                }
            }
            None => {
                sign_archive(&unsigned, &signed)?;
            }
        }
        Ok(vec![signed])
    }
}

/// Writes `<output>/<name>.aar` for a library project.
pub struct CreateLibraryArchive;

impl CreateLibraryArchive {
    fn contents(state: &BuildState<'_>) -> LibraryArchiveContents {
        let project = state.project;
        let r_txt = project.r_txt();
        LibraryArchiveContents {
            manifest: project.manifest_out(),
            res_dir: existing_dir(project.res_out()),
            assets_dir: existing_dir(project.assets_out()),
            native: state.native.clone(),
            r_txt: r_txt.is_file().then_some(r_txt),
            classes_jar: state.classes_jar.clone(),
            metadata: LibraryMetadata {
                name: project.name().to_string(),
                namespace: Some(project.namespace()),
                managed_types: managed_types(state),
            },
        }
    }
}

impl Target for CreateLibraryArchive {
    fn name(&self) -> &'static str {
        CREATE_LIBRARY_ARCHIVE
    }

    fn inputs(&self, state: &mut BuildState<'_>) -> Result<TargetInputs, BuildError> {
        state.native = native_libraries(state, false);
        let contents = Self::contents(state);
        let mut files = vec![contents.manifest.clone()];
        for dir in contents.res_dir.iter().chain(&contents.assets_dir) {
            files.extend(files_under(dir)?);
        }
        files.extend(contents.native.iter().map(|n| n.source.clone()));
        files.extend(contents.r_txt.clone());
        files.extend(contents.classes_jar.clone());
        Ok(TargetInputs::new()
            .files(files)
            .property("namespace", state.project.namespace())
            .property("managed_types", contents.metadata.managed_types.join(";")))
    }

    fn execute(&self, state: &mut BuildState<'_>) -> Result<Vec<PathBuf>, BuildError> {
        let out = state.project.library_archive_path();
        create_library_archive(&Self::contents(state), &out)?;
        Ok(vec![out])
    }
}
