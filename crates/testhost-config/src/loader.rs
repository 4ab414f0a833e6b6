//! Configuration loader with layered approach.
//!
//! This module provides the [`ConfigLoader`] for loading configuration from
//! multiple sources: defaults, files, `.env` files and environment variables.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use testhost_telemetry::LogFormat;

use crate::{ConfigError, HarnessConfig};

/// Default environment variable prefix.
pub const DEFAULT_ENV_PREFIX: &str = "TESTHOST";

/// Configuration loader with layered approach.
///
/// The loader applies configuration in layers, with later layers overriding
/// earlier ones:
/// 1. Default values (built into the code)
/// 2. Configuration file (TOML or JSON)
/// 3. `.env` file entries
/// 4. Process environment variables
///
/// `.env` entries never override a variable that is actually set in the
/// process environment. Neither layer writes to the process environment.
///
/// # Example
///
/// ```no_run
/// use testhost_config::ConfigLoader;
///
/// # fn main() -> Result<(), testhost_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_optional_file("testhost.toml")?
///     .with_optional_dotenv(".env")?
///     .with_env_prefix("TESTHOST")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: HarnessConfig,
    env_prefix: Option<String>,
    dotenv: BTreeMap<String, String>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new configuration loader starting from defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: HarnessConfig::default(),
            env_prefix: None,
            dotenv: BTreeMap::new(),
        }
    }

    /// Reset to default configuration values.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.config = HarnessConfig::default();
        self
    }

    /// Load configuration from a file.
    ///
    /// Supports TOML (.toml) and JSON (.json) formats, chosen by extension.
    /// Sections absent from the file keep their current values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - The file does not exist
    /// - The file cannot be read
    /// - The file contains invalid TOML/JSON
    /// - The file contains unknown fields
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        let file_config = Self::parse(&content, &extension)?;
        self.config = file_config;

        Ok(self)
    }

    /// Load configuration from a file if it exists.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be loaded.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Load configuration from a string in the given format (`toml` or `json`).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if parsing fails.
    ///
    /// # Example
    ///
    /// ```
    /// use testhost_config::ConfigLoader;
    ///
    /// let toml = r#"
    ///     [hosting]
    ///     environment = "Staging"
    /// "#;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string(toml, "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.hosting.environment, "Staging");
    /// assert_eq!(config.host.base_url, "http://localhost");
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = Self::parse(content, &format.to_lowercase())?;
        Ok(self)
    }

    /// Set environment variable prefix for overrides.
    ///
    /// Environment variables use the format `PREFIX__SECTION__KEY`, e.g.
    /// `TESTHOST__HOSTING__ENVIRONMENT=Development`.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Read `KEY=VALUE` entries from a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file is missing or malformed.
    pub fn with_dotenv<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let dotenv_error = |reason: String| ConfigError::DotenvError {
            path: PathBuf::from(path),
            reason,
        };

        let entries = dotenvy::from_path_iter(path).map_err(|e| dotenv_error(e.to_string()))?;
        for entry in entries {
            let (key, value) = entry.map_err(|e| dotenv_error(e.to_string()))?;
            self.dotenv.insert(key, value);
        }
        Ok(self)
    }

    /// Read a `.env` file if it exists.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but is malformed.
    pub fn with_optional_dotenv<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_dotenv(path)
        } else {
            Ok(self)
        }
    }

    /// Finalize and return the loaded configuration.
    ///
    /// Applies `.env` and environment variable overrides (if a prefix was
    /// set) and validates the final configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if an override does not parse or validation
    /// fails.
    pub fn load(self) -> Result<HarnessConfig, ConfigError> {
        let config = self.load_unvalidated()?;
        config.validate()?;
        Ok(config)
    }

    /// Finalize without validation.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if an override does not parse.
    pub fn load_unvalidated(mut self) -> Result<HarnessConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            let mut overrides = std::mem::take(&mut self.dotenv);
            overrides.extend(env::vars());
            self.apply_overrides(&prefix, overrides)?;
        }
        Ok(self.config)
    }

    fn parse(content: &str, format: &str) -> Result<HarnessConfig, ConfigError> {
        match format {
            "toml" => Ok(toml::from_str(content)?),
            "json" => Ok(serde_json::from_str(content)?),
            other => Err(ConfigError::UnsupportedFormat(other.to_string())),
        }
    }

    fn apply_overrides(
        &mut self,
        prefix: &str,
        vars: impl IntoIterator<Item = (String, String)>,
    ) -> Result<(), ConfigError> {
        for (key, value) in vars {
            if key.starts_with(prefix) {
                self.apply_env_var(&key, &value, prefix)?;
            }
        }
        Ok(())
    }

    // Apply a single environment variable
    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let Some(key_without_prefix) = key
            .strip_prefix(prefix)
            .and_then(|k| k.strip_prefix("__"))
        else {
            // `TESTHOSTX` and friends share the prefix but are not ours.
            return Ok(());
        };

        let parts: Vec<&str> = key_without_prefix.split("__").collect();
        let bool_value = || {
            parse_bool(value).ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))
        };

        match parts.as_slice() {
            ["HOST", "BASE_URL"] => {
                self.config.host.base_url = value.to_string();
            }
            ["HOST", "TRUST_REQUEST_ID"] => {
                self.config.host.trust_request_id = bool_value()?;
            }

            ["HOSTING", "ENVIRONMENT"] => {
                self.config.hosting.environment = value.to_string();
            }
            ["HOSTING", "CONTENT_ROOT"] => {
                self.config.hosting.content_root = if value.is_empty() {
                    None
                } else {
                    Some(PathBuf::from(value))
                };
            }

            ["LOGGING", "ENABLED"] => {
                self.config.logging.enabled = bool_value()?;
            }
            ["LOGGING", "LEVEL"] => {
                self.config.logging.level = value.to_string();
            }
            ["LOGGING", "FORMAT"] => {
                self.config.logging.format = match value.to_lowercase().as_str() {
                    "json" => LogFormat::Json,
                    "pretty" => LogFormat::Pretty,
                    "compact" => LogFormat::Compact,
                    _ => {
                        return Err(ConfigError::env_parse_error(
                            key,
                            "expected 'json', 'pretty' or 'compact'",
                        ))
                    }
                };
            }
            ["LOGGING", "SPAN_EVENTS"] => {
                self.config.logging.span_events = bool_value()?;
            }
            ["LOGGING", "FILE_LINE_INFO"] => {
                self.config.logging.file_line_info = bool_value()?;
            }
            ["LOGGING", "INCLUDE_TARGET"] => {
                self.config.logging.include_target = bool_value()?;
            }

            _ => {}
        }

        Ok(())
    }
}

/// Parse a boolean from a string.
fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
