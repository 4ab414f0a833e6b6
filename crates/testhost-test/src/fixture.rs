//! Per-site fixtures.
//!
//! A [`SiteFixture`] hosts one sample site from a [`SiteCatalog`] and hands
//! out clients for it. Each fixture owns its own [`LogContext`], so logs
//! written while serving one test never show up in another.

use testhost_config::HarnessConfig;
use testhost_core::ServiceProvider;
use testhost_server::{HostOptions, SiteCatalog, TestServer};
use testhost_telemetry::LogContext;

use crate::client::TestClient;
use crate::error::TestError;

/// A hosted site together with a client and its captured logs.
///
/// # Example
///
/// ```ignore
/// use testhost_test::SiteFixture;
///
/// let fixture = SiteFixture::start(&sites::catalog(), "BasicWebSite").await?;
/// let response = fixture.client().get("/").send().await?;
/// response.assert_success();
/// assert!(fixture.logs().contains_message("request finished"));
/// fixture.shutdown().await?;
/// ```
#[derive(Debug)]
pub struct SiteFixture {
    server: TestServer,
    client: TestClient,
    logs: LogContext,
}

impl SiteFixture {
    /// Hosts `site` with default options.
    ///
    /// # Errors
    ///
    /// Returns [`TestError::Host`] if the site is unknown or fails to start.
    pub async fn start(catalog: &SiteCatalog, site: &str) -> Result<Self, TestError> {
        Self::start_with(catalog, site, HostOptions::new()).await
    }

    /// Hosts `site` with a validated harness configuration.
    ///
    /// Log capture follows `config.logging`.
    ///
    /// # Errors
    ///
    /// Returns [`TestError::Configuration`] for an invalid configuration,
    /// otherwise as [`start`](Self::start).
    pub async fn from_config(
        catalog: &SiteCatalog,
        site: &str,
        config: HarnessConfig,
    ) -> Result<Self, TestError> {
        config.validate()?;
        let logs = LogContext::from_config(&config.logging)?;
        let options = HostOptions::new().with_config(config).with_log_context(logs);
        Self::start_with(catalog, site, options).await
    }

    /// Hosts `site` with explicit options.
    ///
    /// # Errors
    ///
    /// As [`start`](Self::start).
    pub async fn start_with(
        catalog: &SiteCatalog,
        site: &str,
        options: HostOptions,
    ) -> Result<Self, TestError> {
        let logs = options.log_context().clone();
        let server = TestServer::for_site(catalog, site, options).await?;
        let client = TestClient::new(server.clone());
        Ok(Self {
            server,
            client,
            logs,
        })
    }

    /// Returns the fixture's shared client.
    #[must_use]
    pub fn client(&self) -> &TestClient {
        &self.client
    }

    /// Creates a new client without shared state.
    #[must_use]
    pub fn create_client(&self) -> TestClient {
        TestClient::new(self.server.clone())
    }

    /// Returns the server.
    #[must_use]
    pub fn server(&self) -> &TestServer {
        &self.server
    }

    /// Returns the site's root service provider.
    #[must_use]
    pub fn services(&self) -> &ServiceProvider {
        self.server.services()
    }

    /// Returns the captured logs.
    #[must_use]
    pub fn logs(&self) -> &LogContext {
        &self.logs
    }

    /// Runs shutdown hooks and disposes the site's services.
    ///
    /// # Errors
    ///
    /// Returns [`TestError::Server`] if a shutdown hook fails.
    pub async fn shutdown(&self) -> Result<(), TestError> {
        self.server.shutdown().await?;
        Ok(())
    }
}
