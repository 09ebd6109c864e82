//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::{PackageFormat, ProjectConfig, ProjectKind, KNOWN_ABIS};
use std::path::Path;

/// Name of the project configuration file.
pub const CONFIG_FILE: &str = "andpack.toml";

/// Loads and validates an `andpack.toml` configuration from a project directory.
pub fn load_config(project_dir: &Path) -> Result<ProjectConfig, ConfigError> {
    let config_path = project_dir.join(CONFIG_FILE);
    let content = std::fs::read_to_string(&config_path)?;
    load_config_from_str(&content)
}

/// Parses and validates an `andpack.toml` configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<ProjectConfig, ConfigError> {
    let config: ProjectConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Validates that required fields are present and values are consistent.
fn validate_config(config: &ProjectConfig) -> Result<(), ConfigError> {
    if config.project.name.trim().is_empty() {
        return Err(ConfigError::MissingField("project.name".to_string()));
    }
    match (&config.project.kind, &config.project.package) {
        (ProjectKind::App, None) => {
            return Err(ConfigError::MissingField("project.package".to_string()));
        }
        (_, Some(package)) if !is_valid_package_name(package) => {
            return Err(ConfigError::ValidationError(format!(
                "'{package}' is not a valid application id"
            )));
        }
        _ => {}
    }
    if config.project.kind == ProjectKind::Library
        && config.build.package_format == PackageFormat::Aab
    {
        return Err(ConfigError::ValidationError(
            "library projects cannot use package_format = \"aab\"".to_string(),
        ));
    }
    validate_abis(&config.build.supported_abis)?;
    if config.build.max_api_level < 21 {
        return Err(ConfigError::ValidationError(format!(
            "max_api_level {} is below the minimum of 21",
            config.build.max_api_level
        )));
    }
    for (name, profile) in &config.profiles {
        if let Some(abis) = &profile.supported_abis {
            validate_abis(abis).map_err(|e| {
                ConfigError::ValidationError(format!("profile '{name}': {e}"))
            })?;
        }
    }
    Ok(())
}

fn validate_abis(abis: &[String]) -> Result<(), ConfigError> {
    for abi in abis {
        if !KNOWN_ABIS.contains(&abi.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "unsupported ABI '{abi}' (expected one of {})",
                KNOWN_ABIS.join(", ")
            )));
        }
    }
    Ok(())
}

/// Returns `true` for dotted Java package names with at least two segments.
fn is_valid_package_name(name: &str) -> bool {
    let segments: Vec<&str> = name.split('.').collect();
    segments.len() >= 2
        && segments.iter().all(|seg| {
            let mut chars = seg.chars();
            matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
}
