//! `_CompileJava`, `_CompileToDalvik` and `_LinkAssembliesNoShrink`.

use std::collections::BTreeSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use andpack_cache::TargetInputs;
use andpack_common::fs::{copy_if_changed, remove_file_forced, remove_unknown_files};
use andpack_common::LogicalPath;
use andpack_designer::r_java_path;
use andpack_diagnostics::codes;
use andpack_package::{write_archive, ArchiveEntry};

use crate::error::BuildError;
use crate::target::{BuildState, Target};
use crate::tool::{SourceMap, ToolCommand, ToolRunner};

use super::{files_under, COMPILE_JAVA, COMPILE_TO_DALVIK, LINK_ASSEMBLIES};

/// Lowest API level dex output targets.
const MIN_API_LEVEL: u32 = 21;

fn class_path(state: &BuildState<'_>) -> Vec<PathBuf> {
    let mut paths = state.imports.jars();
    paths.extend(state.context.android_jar(state.project.build.max_api_level));
    paths
}

fn remove_if_present(path: &Path) -> Result<(), BuildError> {
    remove_file_forced(path).map_err(|e| BuildError::io(path, e))
}

/// Compiles the project's Java sources together with the generated
/// `R.java`, then jars the classes. A project without Java sources has
/// nothing to compile.
pub struct CompileJava;

impl CompileJava {
    fn jar_classes(classes: &Path, jar: &Path) -> Result<(), BuildError> {
        let mut entries = Vec::new();
        for file in files_under(classes)? {
            if let Some(logical) = LogicalPath::relative(&file, classes) {
                entries.push(ArchiveEntry::file(logical.as_str(), file));
            }
        }
        write_archive(jar, &entries)?;
        Ok(())
    }
}

impl Target for CompileJava {
    fn name(&self) -> &'static str {
        COMPILE_JAVA
    }

    fn inputs(&self, state: &mut BuildState<'_>) -> Result<TargetInputs, BuildError> {
        let project = state.project;
        let r_java = r_java_path(&project.java_src_out(), &project.package());
        Ok(TargetInputs::new()
            .files(project.java_sources()?)
            .file(r_java)
            .files(state.imports.jars())
            .property("javac", project.config.tools.javac.as_deref().unwrap_or("javac")))
    }

    fn execute(&self, state: &mut BuildState<'_>) -> Result<Vec<PathBuf>, BuildError> {
        let project = state.project;
        let classes = project.classes_out();
        let jar = project.classes_jar();
        let sources = project.java_sources()?;
        if sources.is_empty() {
            tracing::debug!("no Java sources; nothing to compile");
            remove_unknown_files(&classes, &BTreeSet::new()).map_err(|e| BuildError::io(&classes, e))?;
            remove_if_present(&jar)?;
            state.classes_jar = None;
            return Ok(Vec::new());
        }

        remove_unknown_files(&classes, &BTreeSet::new()).map_err(|e| BuildError::io(&classes, e))?;
        std::fs::create_dir_all(&classes).map_err(|e| BuildError::io(&classes, e))?;
        let mut args: Vec<OsString> = vec!["-d".into(), classes.clone().into_os_string()];
        let cp = class_path(state);
        if !cp.is_empty() {
            let joined = std::env::join_paths(&cp).map_err(|e| BuildError::io(&classes, std::io::Error::other(e)))?;
            args.push("-classpath".into());
            args.push(joined);
        }
        args.push("-implicit:none".into());
        args.extend(sources.into_iter().map(PathBuf::into_os_string));
        let r_java = r_java_path(&project.java_src_out(), &project.package());
        if r_java.is_file() {
            args.push(r_java.into_os_string());
        }

        let tool = ToolCommand {
            label: "javac",
            command: project.config.tools.javac.clone().unwrap_or_else(|| "javac".to_string()),
            failure: codes::TOOL_FAILED,
        };
        let runner = ToolRunner::new(state.context, project.name(), &project.dir, state.sink);
        if !runner.run(&tool, &args, &SourceMap::default()) {
            return Ok(Vec::new());
        }
        Self::jar_classes(&classes, &jar)?;
        state.classes_jar = Some(jar.clone());
        Ok(vec![jar])
    }

    fn restore(&self, state: &mut BuildState<'_>) -> Result<bool, BuildError> {
        let jar = state.project.classes_jar();
        state.classes_jar = jar.is_file().then_some(jar);
        Ok(true)
    }
}

/// `classes.dex`, `classes2.dex`, ... in `dir`, in load order.
pub(crate) fn dex_files(dir: &Path) -> Result<Vec<PathBuf>, BuildError> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Ok(Vec::new());
    };
    let mut found = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| BuildError::io(dir, e))?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Some(index) = name.strip_prefix("classes").and_then(|n| n.strip_suffix(".dex")) else {
            continue;
        };
        let order = if index.is_empty() { Some(1) } else { index.parse::<u32>().ok() };
        if let Some(order) = order {
            found.push((order, path));
        }
    }
    found.sort();
    Ok(found.into_iter().map(|(_, p)| p).collect())
}

/// Converts the project's classes and every library jar to dex.
pub struct CompileToDalvik;

impl Target for CompileToDalvik {
    fn name(&self) -> &'static str {
        COMPILE_TO_DALVIK
    }

    fn inputs(&self, state: &mut BuildState<'_>) -> Result<TargetInputs, BuildError> {
        let project = state.project;
        Ok(TargetInputs::new()
            .files(state.classes_jar.clone())
            .files(state.imports.jars())
            .property("d8", project.config.tools.d8.as_deref().unwrap_or("d8")))
    }

    fn execute(&self, state: &mut BuildState<'_>) -> Result<Vec<PathBuf>, BuildError> {
        let project = state.project;
        let bin = project.bin_out();
        for stale in dex_files(&bin)? {
            remove_if_present(&stale)?;
        }
        let mut programs: Vec<PathBuf> = state.classes_jar.iter().cloned().collect();
        programs.extend(state.imports.jars());
        if programs.is_empty() {
            tracing::debug!("no classes; nothing to dex");
            return Ok(Vec::new());
        }

        std::fs::create_dir_all(&bin).map_err(|e| BuildError::io(&bin, e))?;
        let mut args: Vec<OsString> = vec![
            "--output".into(),
            bin.clone().into_os_string(),
            "--min-api".into(),
            MIN_API_LEVEL.to_string().into(),
        ];
        if let Some(jar) = state.context.android_jar(project.build.max_api_level) {
            args.push("--lib".into());
            args.push(jar.into_os_string());
        }
        if project.configuration == "Release" {
            args.push("--release".into());
        }
        args.extend(programs.into_iter().map(PathBuf::into_os_string));

        let tool = ToolCommand {
            label: "d8",
            command: project.config.tools.d8.clone().unwrap_or_else(|| "d8".to_string()),
            failure: codes::TOOL_FAILED,
        };
        let runner = ToolRunner::new(state.context, project.name(), &project.dir, state.sink);
        if !runner.run(&tool, &args, &SourceMap::default()) {
            return Ok(Vec::new());
        }
        dex_files(&bin)
    }
}

/// Copies the project's assemblies and debug symbols to
/// `<intermediate>/android/assets`, deleting ones no longer present.
pub struct LinkAssemblies;

impl Target for LinkAssemblies {
    fn name(&self) -> &'static str {
        LINK_ASSEMBLIES
    }

    fn inputs(&self, state: &mut BuildState<'_>) -> Result<TargetInputs, BuildError> {
        Ok(TargetInputs::new().files(state.project.assemblies()?))
    }

    fn execute(&self, state: &mut BuildState<'_>) -> Result<Vec<PathBuf>, BuildError> {
        let out = state.project.assemblies_out();
        let mut known = BTreeSet::new();
        for source in state.project.assemblies()? {
            let Some(name) = source.file_name() else {
                continue;
            };
            let dest = out.join(name);
            copy_if_changed(&source, &dest).map_err(|e| BuildError::io(&dest, e))?;
            known.insert(dest);
        }
        remove_unknown_files(&out, &known).map_err(|e| BuildError::io(&out, e))?;
        Ok(known.into_iter().collect())
    }
}
