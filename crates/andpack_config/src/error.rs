//! Error types for configuration loading and validation.

/// Errors that can occur when loading or validating an `andpack.toml` configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An I/O error occurred while reading the configuration file.
    #[error("failed to read configuration: {0}")]
    IoError(#[from] std::io::Error),

    /// The TOML content could not be parsed.
    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    /// A requested build configuration does not exist.
    #[error("unknown configuration '{0}'")]
    UnknownProfile(String),

    /// A required field is missing from the configuration.
    #[error("missing required field: {0}")]
    MissingField(String),

    /// A configuration value failed validation.
    #[error("validation error: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_unknown_profile() {
        let err = ConfigError::UnknownProfile("Staging".to_string());
        assert_eq!(format!("{err}"), "unknown configuration 'Staging'");
    }

    #[test]
    fn display_missing_field() {
        let err = ConfigError::MissingField("project.package".to_string());
        assert_eq!(format!("{err}"), "missing required field: project.package");
    }

    #[test]
    fn display_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = ConfigError::IoError(io_err);
        assert!(format!("{err}").starts_with("failed to read configuration:"));
    }
}
