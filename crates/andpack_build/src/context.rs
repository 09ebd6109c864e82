//! Process-wide build settings, captured once and passed everywhere.

use std::path::{Path, PathBuf};

/// Environment variables consulted for the SDK location, first match wins.
pub const SDK_VARIABLES: [&str; 3] = ["ANDPACK_SDK_PATH", "TEST_ANDROID_SDK_PATH", "ANDROID_SDK_ROOT"];

/// Forwarded to every JVM tool.
pub const JAVA_TOOL_OPTIONS: &str = "JAVA_TOOL_OPTIONS";

/// Immutable build context.
///
/// Nothing in the engine reads the environment directly; tests build a
/// context with [`BuildContext::from_vars`] instead.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildContext {
    /// Android SDK root.
    pub sdk_path: Option<PathBuf>,
    /// Value of `JAVA_TOOL_OPTIONS`.
    pub java_tool_options: Option<String>,
    /// Configuration name (`Debug`, `Release`, ...).
    pub configuration: String,
}

impl BuildContext {
    /// Captures the process environment.
    pub fn from_env(configuration: &str) -> Self {
        Self::from_vars(configuration, |name| std::env::var(name).ok())
    }

    /// Builds a context from an arbitrary variable lookup.
    pub fn from_vars(configuration: &str, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let sdk_path = SDK_VARIABLES
            .iter()
            .filter_map(|name| lookup(name))
            .find(|value| !value.trim().is_empty())
            .map(PathBuf::from);
        Self {
            sdk_path,
            java_tool_options: lookup(JAVA_TOOL_OPTIONS).filter(|v| !v.trim().is_empty()),
            configuration: configuration.to_string(),
        }
    }

    /// `platforms/android-<api>/android.jar`, when the SDK has it.
    pub fn android_jar(&self, api_level: u32) -> Option<PathBuf> {
        let jar = self
            .sdk_path
            .as_deref()?
            .join("platforms")
            .join(format!("android-{api_level}"))
            .join("android.jar");
        jar.is_file().then_some(jar)
    }

    /// Resolves a configured tool. Bare names are looked up in the SDK's
    /// newest `build-tools/<version>/` first and otherwise left to `PATH`.
    pub fn tool_path(&self, tool: &str) -> PathBuf {
        let configured = Path::new(tool);
        if configured.components().count() > 1 {
            return configured.to_path_buf();
        }
        self.sdk_path
            .as_deref()
            .and_then(|sdk| newest_build_tools(&sdk.join("build-tools")))
            .map(|dir| dir.join(tool))
            .filter(|p| p.is_file())
            .unwrap_or_else(|| configured.to_path_buf())
    }
}

fn newest_build_tools(dir: &Path) -> Option<PathBuf> {
    let mut versions: Vec<(Vec<u32>, PathBuf)> = std::fs::read_dir(dir)
        .ok()?
        .filter_map(Result::ok)
        .filter(|e| e.path().is_dir())
        .map(|e| {
            let name = e.file_name().to_string_lossy().into_owned();
            let key = name.split(['.', '-']).map(|p| p.parse().unwrap_or(0)).collect();
            (key, e.path())
        })
        .collect();
    versions.sort();
    versions.pop().map(|(_, path)| path)
}
