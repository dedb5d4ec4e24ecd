//! Error types for zapret-core
//!
//! Centralized error handling using `thiserror` for ergonomic error definitions.

use thiserror::Error;

/// Main error type for zapret-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// One or more required files or directories are absent
    #[error("Missing resources: {}", .missing.join(", "))]
    MissingResource {
        /// Names of the missing resources, in check order
        missing: Vec<String>,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// Path to the missing config file
        path: String,
    },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    ConfigValue {
        /// Configuration key
        key: String,
        /// Error message
        message: String,
    },

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a config value error
    pub fn config_value(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValue {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create a missing-resource error from any list of names
    pub fn missing<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::MissingResource {
            missing: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Names carried by a missing-resource error, empty for other variants
    pub fn missing_names(&self) -> &[String] {
        match self {
            Self::MissingResource { missing } => missing,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_resource_display() {
        let err = Error::missing(["list-x.txt", "list-meta.txt"]);
        assert_eq!(err.to_string(), "Missing resources: list-x.txt, list-meta.txt");
        assert_eq!(err.missing_names(), ["list-x.txt", "list-meta.txt"]);
    }

    #[test]
    fn test_config_value_display() {
        let err = Error::config_value("process.executable", "must not be empty");
        assert!(err.to_string().contains("process.executable"));
        assert!(err.to_string().contains("must not be empty"));
        assert!(err.missing_names().is_empty());
    }
}
