//! Profile resolution: folding a named configuration into the build settings.

use crate::error::ConfigError;
use crate::types::{BuildConfig, ProjectConfig};

/// Configurations that exist even when `andpack.toml` does not declare them.
const IMPLICIT_PROFILES: [&str; 2] = ["Debug", "Release"];

/// Build settings with a named configuration's overrides applied.
#[derive(Debug, Clone)]
pub struct ResolvedBuild {
    /// The configuration name (`Debug`, `Release`, ...).
    pub profile: String,
    /// Effective build settings.
    pub build: BuildConfig,
}

/// Resolves `profile` against the project configuration.
///
/// `Debug` and `Release` always exist; other names must be declared under
/// `[profiles.<name>]`. Declared overrides replace the matching `[build]`
/// fields.
pub fn resolve_profile(config: &ProjectConfig, profile: &str) -> Result<ResolvedBuild, ConfigError> {
    let mut build = config.build.clone();
    match config.profiles.get(profile) {
        Some(overrides) => {
            if let Some(format) = overrides.package_format {
                build.package_format = format;
            }
            if let Some(abis) = &overrides.supported_abis {
                build.supported_abis = abis.clone();
            }
            if let Some(level) = overrides.max_api_level {
                build.max_api_level = level;
            }
            if let Some(designer) = overrides.designer {
                build.designer = designer;
            }
            if let Some(parser) = overrides.resource_parser {
                build.resource_parser = parser;
            }
        }
        None if IMPLICIT_PROFILES.contains(&profile) => {}
        None => return Err(ConfigError::UnknownProfile(profile.to_string())),
    }
    Ok(ResolvedBuild {
        profile: profile.to_string(),
        build,
    })
}
