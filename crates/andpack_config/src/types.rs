//! Configuration types deserialized from `andpack.toml`.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// ABIs a native library may be packaged for.
pub const KNOWN_ABIS: [&str; 4] = ["armeabi-v7a", "arm64-v8a", "x86", "x86_64"];

/// The top-level project configuration parsed from `andpack.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectConfig {
    /// Core project metadata (name, version, package, kind).
    pub project: ProjectMeta,
    /// Build settings.
    #[serde(default)]
    pub build: BuildConfig,
    /// Resource items declared in addition to those discovered under the resource dir.
    #[serde(default)]
    pub resources: Vec<ResourceEntry>,
    /// Asset metadata (pack assignment and delivery type).
    #[serde(default)]
    pub assets: Vec<AssetEntry>,
    /// Native libraries to package.
    #[serde(default)]
    pub native_libraries: Vec<NativeLibraryEntry>,
    /// Referenced library projects and archives.
    #[serde(default)]
    pub references: Vec<ReferenceSpec>,
    /// External tool commands.
    #[serde(default)]
    pub tools: ToolsConfig,
    /// Named build configurations overriding `[build]`.
    #[serde(default)]
    pub profiles: BTreeMap<String, ProfileOverrides>,
}

/// Core project metadata required in every `andpack.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectMeta {
    /// The project name.
    pub name: String,
    /// The project version string.
    #[serde(default = "default_version")]
    pub version: String,
    /// The application id (`com.example.app`). Required for applications.
    #[serde(default)]
    pub package: Option<String>,
    /// Whether this project is an application or a library.
    #[serde(default)]
    pub kind: ProjectKind,
    /// Namespace of the generated designer class; defaults to the project name.
    #[serde(default)]
    pub namespace: Option<String>,
}

fn default_version() -> String {
    "1.0".to_string()
}

impl ProjectMeta {
    /// Returns the designer namespace.
    pub fn designer_namespace(&self) -> String {
        self.namespace
            .clone()
            .unwrap_or_else(|| self.name.replace(['-', ' '], "_"))
    }

    /// Returns the application id, falling back to a lower-cased project name.
    pub fn package_name(&self) -> String {
        self.package
            .clone()
            .unwrap_or_else(|| self.name.to_lowercase().replace(['-', ' '], "_"))
    }
}

/// Whether a project produces an installable package or a library archive.
#[derive(Debug, Default, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProjectKind {
    /// An application producing an APK or AAB.
    #[default]
    App,
    /// A library producing an `.aar`.
    Library,
}

/// Build configuration shared by every profile.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Output package format.
    pub package_format: PackageFormat,
    /// ABIs to package native libraries for. Accepts a string or a list.
    #[serde(deserialize_with = "deserialize_string_or_vec")]
    pub supported_abis: Vec<String>,
    /// Maximum API level; resource directories qualified above it are skipped.
    pub max_api_level: u32,
    /// How the designer is generated.
    pub designer: DesignerMode,
    /// Language of the generated designer.
    pub language: DesignerLanguage,
    /// Which resource parser backs design-time generation.
    pub resource_parser: ResourceParserKind,
    /// Severity of invalid resource file names.
    pub file_name_check: FileNameCheck,
    /// Whether resource file names are lower-cased on output.
    pub lowercase_file_names: bool,
    /// Directory holding resources, relative to the project.
    pub resource_dir: String,
    /// Directory holding assets, relative to the project.
    pub asset_dir: String,
    /// Directory holding Java sources, relative to the project.
    pub java_dir: String,
    /// Directory holding prebuilt managed assemblies, relative to the project.
    pub assembly_dir: String,
    /// Intermediate output directory, relative to the project.
    pub intermediate_dir: String,
    /// Final output directory, relative to the project.
    pub output_dir: String,
    /// Managed types usable as custom views in layouts (`Ns.TypeName`).
    pub managed_types: Vec<String>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            package_format: PackageFormat::Apk,
            supported_abis: vec!["arm64-v8a".to_string(), "x86_64".to_string()],
            max_api_level: 34,
            designer: DesignerMode::Intermediate,
            language: DesignerLanguage::CSharp,
            resource_parser: ResourceParserKind::Managed,
            file_name_check: FileNameCheck::Error,
            lowercase_file_names: true,
            resource_dir: "Resources".to_string(),
            asset_dir: "Assets".to_string(),
            java_dir: "Java".to_string(),
            assembly_dir: "Assemblies".to_string(),
            intermediate_dir: "obj".to_string(),
            output_dir: "bin".to_string(),
            managed_types: Vec::new(),
        }
    }
}

/// Deserializes a field that can be either a single string or a list of strings.
///
/// Allows `supported_abis = "arm64-v8a"` as well as
/// `supported_abis = ["arm64-v8a", "x86_64"]`.
fn deserialize_string_or_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct StringOrVec;

    impl<'de> Visitor<'de> for StringOrVec {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a string or a list of strings")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(v.split(';')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect())
        }

        fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut vec = Vec::new();
            while let Some(val) = seq.next_element::<String>()? {
                vec.push(val);
            }
            Ok(vec)
        }
    }

    deserializer.deserialize_any(StringOrVec)
}

fn deserialize_opt_string_or_vec<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_string_or_vec(deserializer).map(Some)
}

/// Output package format.
#[derive(Debug, Default, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PackageFormat {
    /// A single installable APK.
    #[default]
    Apk,
    /// An Android App Bundle with optional asset packs.
    Aab,
}

impl fmt::Display for PackageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PackageFormat::Apk => f.write_str("apk"),
            PackageFormat::Aab => f.write_str("aab"),
        }
    }
}

/// Where generated resource constants live.
#[derive(Debug, Default, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DesignerMode {
    /// A partial class compiled with the project.
    #[default]
    Intermediate,
    /// A separate designer unit; libraries redirect to it through aliases.
    Assembly,
}

/// Language of the generated designer source.
#[derive(Debug, Default, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DesignerLanguage {
    /// `Resource.designer.cs`.
    #[default]
    CSharp,
    /// `Resource.designer.fs`.
    FSharp,
}

impl DesignerLanguage {
    /// File extension for generated sources.
    pub fn extension(self) -> &'static str {
        match self {
            DesignerLanguage::CSharp => "cs",
            DesignerLanguage::FSharp => "fs",
        }
    }
}

/// Which parser implementation collects designer symbols.
#[derive(Debug, Default, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResourceParserKind {
    /// Full document parser.
    #[default]
    Managed,
    /// Event-based streaming parser.
    Streaming,
}

/// Severity applied to invalid resource file names.
#[derive(Debug, Default, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileNameCheck {
    /// Invalid names fail the build.
    #[default]
    Error,
    /// Invalid names are reported and packaged anyway.
    Warning,
}

/// An extra resource item.
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceEntry {
    /// Path of the file, relative to the project.
    pub path: String,
    /// Path inside `res/`, e.g. `drawable/foo.png`.
    #[serde(default)]
    pub logical_name: Option<String>,
}

/// Asset metadata applying to a file or to every file under a directory.
#[derive(Debug, Clone, Deserialize)]
pub struct AssetEntry {
    /// File or directory path, relative to the project.
    pub path: String,
    /// Asset pack name; `base` or absent means the main module.
    #[serde(default)]
    pub pack: Option<String>,
    /// Delivery type for the pack.
    #[serde(default)]
    pub delivery: Option<DeliveryType>,
}

/// How an asset pack is delivered to devices.
#[derive(Debug, Default, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DeliveryType {
    /// Installed together with the app.
    #[default]
    InstallTime,
    /// Downloaded right after installation.
    FastFollow,
    /// Downloaded when the app asks for it.
    OnDemand,
}

impl DeliveryType {
    /// The `dist:` element name used in pack manifests.
    pub fn manifest_element(self) -> &'static str {
        match self {
            DeliveryType::InstallTime => "dist:install-time",
            DeliveryType::FastFollow => "dist:fast-follow",
            DeliveryType::OnDemand => "dist:on-demand",
        }
    }
}

impl fmt::Display for DeliveryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryType::InstallTime => f.write_str("InstallTime"),
            DeliveryType::FastFollow => f.write_str("FastFollow"),
            DeliveryType::OnDemand => f.write_str("OnDemand"),
        }
    }
}

/// A native library to package.
#[derive(Debug, Clone, Deserialize)]
pub struct NativeLibraryEntry {
    /// Path of the `.so`, relative to the project.
    pub path: String,
    /// ABI; inferred from the parent directory name when absent.
    #[serde(default)]
    pub abi: Option<String>,
}

/// A referenced library.
///
/// Uses serde's untagged enum to distinguish project references from archives.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ReferenceSpec {
    /// Another andpack library project; its `.aar` output is consumed.
    Project {
        /// Directory of the referenced project, relative to this one.
        project: String,
    },
    /// A prebuilt `.aar` or `.jar`.
    Archive {
        /// Path of the archive, relative to this project.
        archive: String,
    },
}

/// External tool commands.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToolsConfig {
    /// Java compiler command.
    #[serde(default)]
    pub javac: Option<String>,
    /// Dex compiler command.
    #[serde(default)]
    pub d8: Option<String>,
    /// Optional resource compiler run over the merged resource directory.
    #[serde(default)]
    pub resource_compiler: Option<String>,
    /// Optional external signer; the built-in signer is used when absent.
    #[serde(default)]
    pub signer: Option<String>,
}

/// Per-configuration overrides of `[build]`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileOverrides {
    /// Output package format.
    #[serde(default)]
    pub package_format: Option<PackageFormat>,
    /// ABIs to package.
    #[serde(default, deserialize_with = "deserialize_opt_string_or_vec")]
    pub supported_abis: Option<Vec<String>>,
    /// Maximum API level.
    #[serde(default)]
    pub max_api_level: Option<u32>,
    /// Designer mode.
    #[serde(default)]
    pub designer: Option<DesignerMode>,
    /// Resource parser.
    #[serde(default)]
    pub resource_parser: Option<ResourceParserKind>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_config_from_str;

    #[test]
    fn build_defaults() {
        let b = BuildConfig::default();
        assert_eq!(b.package_format, PackageFormat::Apk);
        assert_eq!(b.resource_dir, "Resources");
        assert!(b.lowercase_file_names);
        assert_eq!(b.max_api_level, 34);
    }

    #[test]
    fn abis_accept_semicolon_string() {
        let toml = r#"
[project]
name = "App1"
package = "com.example.app1"

[build]
supported_abis = "armeabi-v7a;x86"
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.build.supported_abis, vec!["armeabi-v7a", "x86"]);
    }

    #[test]
    fn delivery_types_parse() {
        let toml = r#"
[project]
name = "App1"
package = "com.example.app1"

[[assets]]
path = "Assets/big"
pack = "assetpack1"
delivery = "OnDemand"

[[assets]]
path = "Assets/small.txt"
pack = "assetpack2"
delivery = "FastFollow"
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.assets[0].delivery, Some(DeliveryType::OnDemand));
        assert_eq!(config.assets[1].delivery, Some(DeliveryType::FastFollow));
    }

    #[test]
    fn references_untagged() {
        let toml = r#"
[project]
name = "App1"
package = "com.example.app1"

[[references]]
project = "../Library1"

[[references]]
archive = "libs/material.aar"
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(
            config.references[0],
            ReferenceSpec::Project {
                project: "../Library1".to_string()
            }
        );
        assert!(matches!(config.references[1], ReferenceSpec::Archive { .. }));
    }

    #[test]
    fn designer_namespace_defaults_to_name() {
        let toml = r#"
[project]
name = "My-App"
package = "com.example.myapp"
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.project.designer_namespace(), "My_App");
    }

    #[test]
    fn delivery_manifest_elements() {
        assert_eq!(DeliveryType::InstallTime.manifest_element(), "dist:install-time");
        assert_eq!(DeliveryType::OnDemand.manifest_element(), "dist:on-demand");
        assert_eq!(DeliveryType::FastFollow.to_string(), "FastFollow");
    }
}
