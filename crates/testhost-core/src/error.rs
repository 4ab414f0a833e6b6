//! Error types for hosting a site.
//!
//! [`HostError`] covers everything that can go wrong while a fixture builds
//! its service provider and server. These are setup defects: they are
//! returned to the test, which fails.

use crate::di::InjectionError;
use thiserror::Error;

/// Result type alias using [`HostError`].
pub type HostResult<T> = Result<T, HostError>;

/// Errors raised while assembling a test host.
#[derive(Debug, Error)]
pub enum HostError {
    /// The requested sample site is not in the catalog.
    #[error("Sample site '{name}' not found (available: {})", available.join(", "))]
    SiteNotFound {
        /// The requested site name.
        name: String,
        /// Names of all registered sites.
        available: Vec<String>,
    },

    /// A service could not be resolved during startup.
    #[error(transparent)]
    Injection(#[from] InjectionError),

    /// The site's startup code failed.
    #[error("Startup of site '{site}' failed: {source}")]
    Startup {
        /// The site being started.
        site: String,
        /// The underlying failure.
        #[source]
        source: anyhow::Error,
    },

    /// Harness configuration is invalid.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The host was used after it was disposed.
    #[error("Host has been disposed")]
    Disposed,
}

impl HostError {
    /// Creates a site-not-found error.
    #[must_use]
    pub fn site_not_found<I, S>(name: impl Into<String>, available: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::SiteNotFound {
            name: name.into(),
            available: available.into_iter().map(Into::into).collect(),
        }
    }

    /// Wraps a startup failure.
    pub fn startup(site: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self::Startup {
            site: site.into(),
            source: source.into(),
        }
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_site_not_found_lists_available() {
        let error = HostError::site_not_found("Missing", ["BasicWebSite", "FormatterWebSite"]);
        let message = error.to_string();
        assert!(message.contains("'Missing'"));
        assert!(message.contains("BasicWebSite, FormatterWebSite"));
    }

    #[test]
    fn test_injection_error_converts() {
        let error: HostError = InjectionError::not_registered::<String>().into();
        assert!(matches!(error, HostError::Injection(_)));
        assert!(error.to_string().contains("not registered"));
    }

    #[test]
    fn test_startup_error_keeps_source() {
        let error = HostError::startup("BasicWebSite", anyhow::anyhow!("bad route"));
        assert!(error.to_string().contains("BasicWebSite"));
        assert!(std::error::Error::source(&error).is_some());
    }
}
