//! Loading and validating configuration documents.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::logging::LoggingConfig;
use crate::security::SecurityConfig;

/// Result alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors produced while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file `{}`: {source}", path.display())]
    Io {
        /// Path that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// JSON document failed to parse.
    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),
    /// TOML document failed to parse.
    #[error("invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),
    /// File extension is neither `.json` nor `.toml`.
    #[error("unsupported config format for `{}`", path.display())]
    UnsupportedFormat {
        /// Offending path.
        path: PathBuf,
    },
    /// Document parsed but holds unusable values.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Human-readable reason for rejection.
        reason: String,
    },
}

impl ConfigError {
    fn invalid(reason: impl Into<String>) -> Self {
        Self::Invalid {
            reason: reason.into(),
        }
    }
}

/// Top-level configuration document.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolkitConfig {
    /// Guard and sandbox settings.
    pub security: SecurityConfig,
    /// Tracing settings.
    pub logging: LoggingConfig,
}

impl ToolkitConfig {
    /// Parses and validates a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] on malformed input or
    /// [`ConfigError::Invalid`] when [`validate`](Self::validate) fails.
    pub fn from_json_str(input: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Toml`] on malformed input or
    /// [`ConfigError::Invalid`] when [`validate`](Self::validate) fails.
    pub fn from_toml_str(input: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration file, choosing the parser by extension.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::UnsupportedFormat`] for unknown extensions, or any
    /// parse/validation error.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        let parse: fn(&str) -> ConfigResult<Self> = match extension.as_deref() {
            Some("json") => Self::from_json_str,
            Some("toml") => Self::from_toml_str,
            _ => {
                return Err(ConfigError::UnsupportedFormat {
                    path: path.to_path_buf(),
                });
            }
        };

        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "loading toolkit configuration");
        parse(&contents)
    }

    /// Rejects values that would make the runtime unusable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a limit is zero or a tool is
    /// both denied and explicitly allowed.
    pub fn validate(&self) -> ConfigResult<()> {
        let security = &self.security;
        if security.max_concurrent_calls == 0 {
            return Err(ConfigError::invalid("max_concurrent_calls must be > 0"));
        }
        if security.max_execution_time.is_zero() {
            return Err(ConfigError::invalid("max_execution_time must be > 0"));
        }
        if security.max_output_size == 0 {
            return Err(ConfigError::invalid("max_output_size must be > 0"));
        }
        if let Some(allowed) = &security.allowed_tools {
            if let Some(conflict) = allowed.iter().find(|name| security.is_denied(name)) {
                return Err(ConfigError::invalid(format!(
                    "tool `{conflict}` is both denied and allowed"
                )));
            }
        }
        Ok(())
    }
}
