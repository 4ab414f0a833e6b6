//! Layered configuration for in-memory test hosts.
//!
//! This crate provides the [`HarnessConfig`] every fixture starts from:
//! - TOML and JSON configuration files
//! - `.env` files read through `dotenvy`
//! - Environment variable overrides
//! - Strict validation (fails on unknown fields)
//!
//! # Overview
//!
//! - [`HostConfig`] - host label for relative URLs, request ID adoption
//! - [`HostingConfig`] - environment name and content root for sites
//! - [`LogConfig`](testhost_telemetry::LogConfig) - log capture filter and echo
//!
//! # Example
//!
//! ```no_run
//! use testhost_config::ConfigLoader;
//!
//! # fn main() -> Result<(), testhost_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_optional_file("testhost.toml")?
//!     .with_env_prefix("TESTHOST")
//!     .load()?;
//!
//! println!("Relative URLs resolve against {}", config.host.base_url);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [host]
//! base_url = "http://localhost"
//! trust_request_id = true
//!
//! [hosting]
//! environment = "Test"
//! content_root = "tests/sites/BasicWebSite"
//!
//! [logging]
//! enabled = false
//! level = "info"
//! format = "pretty"
//! ```
//!
//! # Environment Variable Overrides
//!
//! Values can be overridden using the format `PREFIX__SECTION__KEY`:
//!
//! - `TESTHOST__HOST__BASE_URL=https://example.test`
//! - `TESTHOST__HOSTING__ENVIRONMENT=Development`
//! - `TESTHOST__LOGGING__LEVEL=testhost_server=trace`

#![warn(missing_docs)]

mod config;
mod error;
mod loader;

pub use config::{HarnessConfig, HostConfig, HostingConfig, DEFAULT_BASE_URL};
pub use error::ConfigError;
pub use loader::{ConfigLoader, DEFAULT_ENV_PREFIX};
pub use testhost_telemetry::{LogConfig, LogFormat};
