//! Hosting environment seen by a sample site.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the environment test hosts run in unless configured otherwise.
pub const TEST_ENVIRONMENT: &str = "Test";

/// Describes where and as what a site is being hosted.
///
/// The harness registers one of these as a singleton before the site's own
/// services, so sites can read their application name without knowing they
/// are under test.
///
/// # Example
///
/// ```
/// use testhost_core::HostingEnvironment;
///
/// let env = HostingEnvironment::new("BasicWebSite");
/// assert!(env.is_environment("test"));
/// assert_eq!(env.application_name(), "BasicWebSite");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostingEnvironment {
    application_name: String,
    environment_name: String,
    content_root: PathBuf,
}

impl HostingEnvironment {
    /// Creates an environment named [`TEST_ENVIRONMENT`] rooted at the current directory.
    #[must_use]
    pub fn new(application_name: impl Into<String>) -> Self {
        Self {
            application_name: application_name.into(),
            environment_name: TEST_ENVIRONMENT.to_string(),
            content_root: PathBuf::from("."),
        }
    }

    /// Sets the environment name.
    #[must_use]
    pub fn with_environment_name(mut self, name: impl Into<String>) -> Self {
        self.environment_name = name.into();
        self
    }

    /// Sets the content root.
    #[must_use]
    pub fn with_content_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.content_root = root.into();
        self
    }

    /// Returns the hosted application's name.
    #[must_use]
    pub fn application_name(&self) -> &str {
        &self.application_name
    }

    /// Returns the environment name.
    #[must_use]
    pub fn environment_name(&self) -> &str {
        &self.environment_name
    }

    /// Returns the content root directory.
    #[must_use]
    pub fn content_root(&self) -> &Path {
        &self.content_root
    }

    /// Compares the environment name, ignoring ASCII case.
    #[must_use]
    pub fn is_environment(&self, name: &str) -> bool {
        self.environment_name.eq_ignore_ascii_case(name)
    }
}
