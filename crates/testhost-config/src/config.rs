//! Harness configuration types.
//!
//! This module provides the top-level [`HarnessConfig`] struct and its
//! sections.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use testhost_core::TEST_ENVIRONMENT;
use testhost_telemetry::{create_env_filter, LogConfig};

use crate::ConfigError;

/// Default host label for relative request URLs.
pub const DEFAULT_BASE_URL: &str = "http://localhost";

/// Complete harness configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load configuration from files
/// and environment variables.
///
/// # Example
///
/// ```
/// use testhost_config::HarnessConfig;
///
/// let config = HarnessConfig::default();
/// assert_eq!(config.host.base_url, "http://localhost");
/// assert_eq!(config.hosting.environment, "Test");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct HarnessConfig {
    /// In-memory host settings.
    #[serde(default)]
    pub host: HostConfig,

    /// Hosting environment presented to sample sites.
    #[serde(default)]
    pub hosting: HostingConfig,

    /// Log capture and echo.
    #[serde(default)]
    pub logging: LogConfig,
}

impl HarnessConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - `host.base_url` is not an absolute http(s) URL without a path
    /// - `hosting.environment` is empty
    /// - `logging.level` is not a valid filter directive
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_base_url(&self.host.base_url)?;

        if self.hosting.environment.trim().is_empty() {
            return Err(ConfigError::invalid_value(
                "hosting.environment",
                "must not be empty",
            ));
        }

        create_env_filter(&self.logging.level)
            .map_err(|e| ConfigError::invalid_value("logging.level", e.to_string()))?;

        Ok(())
    }

    /// Create a configuration that echoes debug logs.
    ///
    /// # Example
    ///
    /// ```
    /// use testhost_config::HarnessConfig;
    ///
    /// let config = HarnessConfig::verbose();
    /// assert!(config.logging.enabled);
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn verbose() -> Self {
        Self {
            logging: LogConfig::development(),
            ..Self::default()
        }
    }
}

fn validate_base_url(raw: &str) -> Result<(), ConfigError> {
    let uri: http::Uri = raw
        .parse()
        .map_err(|e: http::uri::InvalidUri| ConfigError::invalid_value("host.base_url", e.to_string()))?;

    match uri.scheme_str() {
        Some("http" | "https") => {}
        _ => {
            return Err(ConfigError::invalid_value(
                "host.base_url",
                format!("expected an absolute http or https URL, got '{raw}'"),
            ))
        }
    }

    if uri.authority().is_none() {
        return Err(ConfigError::invalid_value("host.base_url", "missing host"));
    }

    let path = uri.path();
    if !(path.is_empty() || path == "/") || uri.query().is_some() {
        return Err(ConfigError::invalid_value(
            "host.base_url",
            format!("must not contain a path or query, got '{raw}'"),
        ));
    }

    Ok(())
}

/// In-memory host settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct HostConfig {
    /// Host label that relative request URLs are resolved against.
    pub base_url: String,

    /// Whether an incoming `RequestId` header is adopted.
    pub trust_request_id: bool,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            trust_request_id: true,
        }
    }
}

/// Hosting environment presented to sample sites.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct HostingConfig {
    /// Environment name, `Test` unless overridden.
    pub environment: String,

    /// Content root; the site's own directory when unset.
    pub content_root: Option<PathBuf>,
}

impl Default for HostingConfig {
    fn default() -> Self {
        Self {
            environment: TEST_ENVIRONMENT.to_string(),
            content_root: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(HarnessConfig::default().validate().is_ok());
        assert!(HarnessConfig::verbose().validate().is_ok());
    }

    #[test]
    fn test_base_url_with_trailing_slash_is_valid() {
        assert!(validate_base_url("https://example.test/").is_ok());
        assert!(validate_base_url("http://localhost:5000").is_ok());
    }

    #[test]
    fn test_relative_base_url_rejected() {
        let err = validate_base_url("/relative").unwrap_err();
        assert!(err.to_string().contains("host.base_url"));
    }

    #[test]
    fn test_base_url_with_path_rejected() {
        assert!(validate_base_url("http://localhost/app").is_err());
        assert!(validate_base_url("http://localhost?x=1").is_err());
        assert!(validate_base_url("ftp://localhost").is_err());
    }

    #[test]
    fn test_empty_environment_rejected() {
        let mut config = HarnessConfig::default();
        config.hosting.environment = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_log_level_rejected() {
        let mut config = HarnessConfig::default();
        config.logging.level = "testhost=loud".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("logging.level"));
    }

    #[test]
    fn test_unknown_section_rejected() {
        let result: Result<HarnessConfig, _> = toml::from_str("[server]\nport = 1\n");
        assert!(result.is_err());
    }
}
