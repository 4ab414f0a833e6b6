//! Building a site's service provider.
//!
//! [`create_services`] layers registrations in a fixed order so tests can
//! always win:
//!
//! 1. harness doubles: [`HostingEnvironment`], [`LoggerFactory`],
//!    [`LogContext`] and the [`HarnessConfig`]
//! 2. component discovery ([`ApplicationParts`])
//! 3. the site's own [`Startup::configure_services`](crate::Startup::configure_services)
//! 4. the fixture's additional-services callback
//!
//! Registering a type again replaces the earlier registration.

use std::fmt;
use std::sync::Arc;

use testhost_config::HarnessConfig;
use testhost_core::{HostError, HostResult, HostingEnvironment, ServiceCollection, ServiceProvider};
use testhost_telemetry::{LogContext, LoggerFactory};

use crate::discovery::{ApplicationParts, ComponentProvider, SiteComponentProvider};
use crate::site::SiteCatalog;

/// Callback adding or replacing services after the site registered its own.
pub type ServicesCallback = Arc<dyn Fn(&mut ServiceCollection) + Send + Sync>;

/// Options a fixture hosts a site with.
///
/// # Example
///
/// ```rust
/// use testhost_server::HostOptions;
/// use testhost_telemetry::LogContext;
///
/// struct FakeClock;
///
/// let logs = LogContext::new();
/// let options = HostOptions::new()
///     .with_log_context(logs.clone())
///     .with_services(|services| {
///         services.add_singleton(|_| Ok(FakeClock));
///     });
/// assert_eq!(options.config().hosting.environment, "Test");
/// ```
#[derive(Clone, Default)]
pub struct HostOptions {
    config: HarnessConfig,
    log_context: LogContext,
    component_provider: Option<Arc<dyn ComponentProvider>>,
    additional_services: Option<ServicesCallback>,
}

impl HostOptions {
    /// Default options: `Test` environment, a fresh log context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses the given harness configuration.
    #[must_use]
    pub fn with_config(mut self, config: HarnessConfig) -> Self {
        self.config = config;
        self
    }

    /// Routes the host's logs into `log_context`.
    #[must_use]
    pub fn with_log_context(mut self, log_context: LogContext) -> Self {
        self.log_context = log_context;
        self
    }

    /// Replaces site-scoped component discovery.
    #[must_use]
    pub fn with_component_provider<P: ComponentProvider>(mut self, provider: P) -> Self {
        self.component_provider = Some(Arc::new(provider));
        self
    }

    /// Adds registrations applied after the site's own.
    ///
    /// Calling this again chains the callbacks in call order.
    #[must_use]
    pub fn with_services<F>(mut self, callback: F) -> Self
    where
        F: Fn(&mut ServiceCollection) + Send + Sync + 'static,
    {
        self.additional_services = Some(match self.additional_services.take() {
            Some(previous) => Arc::new(move |services: &mut ServiceCollection| {
                previous(services);
                callback(services);
            }),
            None => Arc::new(callback),
        });
        self
    }

    /// Returns the harness configuration.
    #[must_use]
    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Returns the log context.
    #[must_use]
    pub fn log_context(&self) -> &LogContext {
        &self.log_context
    }
}

impl fmt::Debug for HostOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostOptions")
            .field("config", &self.config)
            .field("component_provider", &self.component_provider.is_some())
            .field("additional_services", &self.additional_services.is_some())
            .finish_non_exhaustive()
    }
}

/// Builds the root provider for `site_name`.
///
/// # Errors
///
/// - [`HostError::SiteNotFound`] if the catalog has no such site
/// - [`HostError::Startup`] if the site's service configuration fails
pub fn create_services(
    catalog: &SiteCatalog,
    site_name: &str,
    options: &HostOptions,
) -> HostResult<ServiceProvider> {
    let startup = catalog.get(site_name)?;
    let config = options.config();

    let mut environment =
        HostingEnvironment::new(startup.name()).with_environment_name(config.hosting.environment.clone());
    if let Some(root) = &config.hosting.content_root {
        environment = environment.with_content_root(root.clone());
    }

    options.log_context().in_scope(|| -> HostResult<ServiceProvider> {
        let mut services = ServiceCollection::new();

        services
            .add_instance(Arc::new(environment.clone()))
            .add_instance(Arc::new(options.log_context().logger_factory()))
            .add_instance(Arc::new(options.log_context().clone()))
            .add_instance(Arc::new(config.clone()));

        let provider: Arc<dyn ComponentProvider> = match &options.component_provider {
            Some(provider) => Arc::clone(provider),
            None => Arc::new(SiteComponentProvider::new(catalog, startup.name())),
        };
        services.add_instance(Arc::new(ApplicationParts::new(provider)));

        startup
            .configure_services(&mut services, &environment)
            .map_err(|e| HostError::startup(startup.name(), e))?;

        if let Some(callback) = &options.additional_services {
            callback(&mut services);
        }

        tracing::debug!(
            site = startup.name(),
            environment = environment.environment_name(),
            service_count = services.len(),
            "service provider built"
        );
        Ok(services.build())
    })
}
