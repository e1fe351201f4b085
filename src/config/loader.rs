//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use crate::config::schema::VelariumConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable toggling interactive API documentation.
pub const DEBUG_ENV: &str = "DEBUG";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<VelariumConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: VelariumConfig = toml::from_str(&content).map_err(ConfigError::Parse)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply environment overrides on top of file or default values.
pub fn apply_env(config: &mut VelariumConfig) {
    if debug_enabled(std::env::var(DEBUG_ENV).ok().as_deref()) {
        config.server.debug = true;
    }
}

/// Any non-empty value turns debug on.
pub fn debug_enabled(value: Option<&str>) -> bool {
    matches!(value, Some(v) if !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn debug_toggle_requires_non_empty_value() {
        assert!(!debug_enabled(None));
        assert!(!debug_enabled(Some("")));
        assert!(debug_enabled(Some("1")));
        assert!(debug_enabled(Some("false")));
    }

    #[test]
    fn loads_file_and_validates() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nsocket = \"/run/velarium.sock\"").unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(
            config.server.socket.as_deref(),
            Some(Path::new("/run/velarium.sock"))
        );
    }

    #[test]
    fn invalid_file_surfaces_validation_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nrequest_timeout_secs = 0").unwrap();

        match load_config(file.path()) {
            Err(ConfigError::Validation(errors)) => {
                assert_eq!(errors, vec![ValidationError::ZeroTimeout])
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_config(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
