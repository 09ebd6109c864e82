//! A loaded project and the paths its build reads and writes.

use std::path::{Path, PathBuf};

use andpack_cache::{BuildProps, Namespace};
use andpack_config::{
    load_config, resolve_profile, BuildConfig, PackageFormat, ProjectConfig, ProjectKind, ReferenceSpec,
};

use crate::error::BuildError;

/// Name of the application manifest in a project directory.
pub const MANIFEST_FILE: &str = "AndroidManifest.xml";

/// One project with its configuration resolved for a build configuration.
#[derive(Debug, Clone)]
pub struct Project {
    /// Project directory (holds `andpack.toml`).
    pub dir: PathBuf,
    /// Parsed configuration.
    pub config: ProjectConfig,
    /// `[build]` with the configuration's overrides applied.
    pub build: BuildConfig,
    /// Configuration name.
    pub configuration: String,
}

impl Project {
    /// Loads `dir/andpack.toml` for `configuration`.
    pub fn load(dir: &Path, configuration: &str) -> Result<Self, BuildError> {
        let dir = std::path::absolute(dir).map_err(|e| BuildError::io(dir, e))?;
        let config = load_config(&dir)?;
        let resolved = resolve_profile(&config, configuration)?;
        Ok(Self {
            dir,
            config,
            build: resolved.build,
            configuration: resolved.profile,
        })
    }

    /// Project name.
    pub fn name(&self) -> &str {
        &self.config.project.name
    }

    /// Application id / Java package.
    pub fn package(&self) -> String {
        self.config.project.package_name()
    }

    /// Namespace of the generated `Resource` class.
    pub fn namespace(&self) -> String {
        self.config.project.designer_namespace()
    }

    /// `true` for library projects.
    pub fn is_library(&self) -> bool {
        self.config.project.kind == ProjectKind::Library
    }

    /// Intermediate directory.
    pub fn intermediate(&self) -> PathBuf {
        self.dir.join(&self.build.intermediate_dir)
    }

    /// Root of a cache namespace.
    pub fn namespace_dir(&self, namespace: Namespace) -> PathBuf {
        namespace.dir(&self.intermediate())
    }

    /// Output directory.
    pub fn output_dir(&self) -> PathBuf {
        self.dir.join(&self.build.output_dir)
    }

    /// Materialised `res/`.
    pub fn res_out(&self) -> PathBuf {
        self.intermediate().join("res")
    }

    /// Materialised base `assets/`.
    pub fn assets_out(&self) -> PathBuf {
        self.intermediate().join("assets")
    }

    /// Merged manifest.
    pub fn manifest_out(&self) -> PathBuf {
        self.intermediate().join("android").join(MANIFEST_FILE)
    }

    /// Generated Java sources (`R.java`).
    pub fn java_src_out(&self) -> PathBuf {
        self.intermediate().join("android").join("src")
    }

    /// `android/bin`: dex files and the classes jar.
    pub fn bin_out(&self) -> PathBuf {
        self.intermediate().join("android").join("bin")
    }

    /// Compiled classes.
    pub fn classes_out(&self) -> PathBuf {
        self.bin_out().join("classes")
    }

    /// Jar of the compiled classes.
    pub fn classes_jar(&self) -> PathBuf {
        self.bin_out().join("classes.jar")
    }

    /// Linked assemblies.
    pub fn assemblies_out(&self) -> PathBuf {
        self.intermediate().join("android").join("assets")
    }

    /// `R.txt`.
    pub fn r_txt(&self) -> PathBuf {
        self.intermediate().join("R.txt")
    }

    /// The application's own manifest.
    pub fn source_manifest(&self) -> PathBuf {
        self.dir.join(MANIFEST_FILE)
    }

    /// `<output>/<package>.apk|.aab`.
    pub fn package_path(&self) -> PathBuf {
        self.output_dir()
            .join(format!("{}.{}", self.package(), self.build.package_format))
    }

    /// `<output>/<name>.aar`.
    pub fn library_archive_path(&self) -> PathBuf {
        self.output_dir().join(format!("{}.aar", self.name()))
    }

    /// Package format of this build.
    pub fn package_format(&self) -> PackageFormat {
        self.build.package_format
    }

    /// Java sources under the Java directory, sorted.
    pub fn java_sources(&self) -> Result<Vec<PathBuf>, BuildError> {
        let root = self.dir.join(&self.build.java_dir);
        let files = andpack_common::fs::list_files(&root).map_err(|e| BuildError::io(&root, e))?;
        Ok(files
            .into_iter()
            .filter(|f| f.extension().is_some_and(|e| e == "java"))
            .collect())
    }

    /// Assemblies and their debug symbols under the assembly directory.
    pub fn assemblies(&self) -> Result<Vec<PathBuf>, BuildError> {
        let root = self.dir.join(&self.build.assembly_dir);
        let files = andpack_common::fs::list_files(&root).map_err(|e| BuildError::io(&root, e))?;
        Ok(files
            .into_iter()
            .filter(|f| {
                f.extension()
                    .is_some_and(|e| ["dll", "pdb", "mdb"].iter().any(|x| e.eq_ignore_ascii_case(x)))
            })
            .collect())
    }

    /// Directories of referenced projects.
    pub fn project_references(&self) -> Vec<PathBuf> {
        self.config
            .references
            .iter()
            .filter_map(|r| match r {
                ReferenceSpec::Project { project } => Some(self.dir.join(project)),
                ReferenceSpec::Archive { .. } => None,
            })
            .collect()
    }

    /// Every referenced archive in reference order. A project reference
    /// resolves to that project's `.aar`, which may not exist yet.
    pub fn referenced_archives(&self) -> Vec<PathBuf> {
        self.config
            .references
            .iter()
            .map(|r| match r {
                ReferenceSpec::Archive { archive } => self.dir.join(archive),
                ReferenceSpec::Project { project } => {
                    let dir = self.dir.join(project);
                    match Project::load(&dir, &self.configuration) {
                        Ok(referenced) => referenced.library_archive_path(),
                        Err(_) => dir.join("bin").join(format!("{project}.aar")),
                    }
                }
            })
            .collect()
    }

    /// Properties whose change discards every cache record.
    pub fn build_props(&self) -> BuildProps {
        BuildProps::new()
            .with("tool_version", env!("CARGO_PKG_VERSION"))
            .with("configuration", &self.configuration)
            .with("kind", format!("{:?}", self.config.project.kind))
            .with("package", self.package())
            .with("package_format", self.build.package_format)
            .with("supported_abis", self.build.supported_abis.join(";"))
            .with("max_api_level", self.build.max_api_level)
            .with("designer", format!("{:?}", self.build.designer))
            .with("language", format!("{:?}", self.build.language))
            .with("resource_parser", format!("{:?}", self.build.resource_parser))
            .with("lowercase_file_names", self.build.lowercase_file_names)
    }
}
