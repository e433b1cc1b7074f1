//! Facet index configuration
//!
//! Every field has a default, so `{}` is a complete configuration file.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::observability::{Logger, Severity};

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Cannot read config file: {0}")]
    Io(String),

    #[error("Malformed config: {0}")]
    Parse(String),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Index key layout and engine behavior
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetConfig {
    /// Name of the synthetic facet holding the document type (default: "type")
    #[serde(default = "default_type_facet")]
    pub type_facet: String,

    /// Separator between facet name and value in index keys (default: ":")
    #[serde(default = "default_key_separator")]
    pub key_separator: String,

    /// Let updates change a document's type, moving its type key.
    ///
    /// Off by default: the type is fixed after creation and an update that
    /// changes it is rejected.
    #[serde(default)]
    pub diff_type_on_update: bool,

    /// Minimum log severity written out (default: "WARN")
    #[serde(default = "default_log_severity")]
    pub log_severity: String,
}

fn default_type_facet() -> String {
    "type".to_string()
}

fn default_key_separator() -> String {
    ":".to_string()
}

fn default_log_severity() -> String {
    "WARN".to_string()
}

impl Default for FacetConfig {
    fn default() -> Self {
        Self {
            type_facet: default_type_facet(),
            key_separator: default_key_separator(),
            diff_type_on_update: false,
            log_severity: default_log_severity(),
        }
    }
}

impl FacetConfig {
    /// Parse and validate a JSON configuration
    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        let config: FacetConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&raw)
    }

    /// Check the key layout is unambiguous
    pub fn validate(&self) -> ConfigResult<()> {
        if self.key_separator.is_empty() {
            return Err(ConfigError::Invalid("key_separator must not be empty".to_string()));
        }
        if self.type_facet.is_empty() {
            return Err(ConfigError::Invalid("type_facet must not be empty".to_string()));
        }
        if self.type_facet.contains(&self.key_separator) {
            return Err(ConfigError::Invalid(format!(
                "type_facet '{}' contains the key separator '{}'",
                self.type_facet, self.key_separator
            )));
        }
        self.severity()?;
        Ok(())
    }

    pub fn severity(&self) -> ConfigResult<Severity> {
        self.log_severity.parse().map_err(ConfigError::Invalid)
    }

    /// Push the configured log severity to the process-wide logger
    pub fn apply_logging(&self) -> ConfigResult<()> {
        Logger::set_min_severity(self.severity()?);
        Ok(())
    }
}
