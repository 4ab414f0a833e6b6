//! Component discovery.
//!
//! A site's controllers are found through a [`ComponentProvider`] registered
//! in the service collection, wrapped in [`ApplicationParts`]. By default the
//! harness registers a [`SiteComponentProvider`] that only sees the
//! components belonging to the site under test, so controllers of other
//! sample sites compiled into the same test binary never leak in.

use std::fmt;
use std::sync::Arc;

use crate::routes::RouteTable;
use crate::site::SiteCatalog;

/// A group of endpoints a site exposes.
///
/// # Example
///
/// ```rust
/// use testhost_server::{responses, Controller, RouteTable};
///
/// struct HomeController;
///
/// impl Controller for HomeController {
///     fn name(&self) -> &'static str {
///         "Home"
///     }
///
///     fn map_routes(&self, routes: &mut RouteTable) {
///         routes.get("/Home/Index", |_ctx| async { Ok(responses::text("Hello")) });
///     }
/// }
///
/// let mut routes = RouteTable::new();
/// HomeController.map_routes(&mut routes);
/// assert_eq!(routes.len(), 1);
/// ```
pub trait Controller: Send + Sync + 'static {
    /// Returns the controller name, used in logs.
    fn name(&self) -> &'static str;

    /// Adds this controller's routes to the table.
    fn map_routes(&self, routes: &mut RouteTable);
}

/// Supplies the controllers an application may use.
pub trait ComponentProvider: Send + Sync + 'static {
    /// Returns the controllers, in mapping order.
    fn controllers(&self) -> Vec<Arc<dyn Controller>>;
}

/// Discovery restricted to one site's components.
#[derive(Clone)]
pub struct SiteComponentProvider {
    site: String,
    controllers: Vec<Arc<dyn Controller>>,
}

impl SiteComponentProvider {
    /// Collects the components the catalog holds for `site`.
    ///
    /// An unknown site yields an empty provider.
    #[must_use]
    pub fn new(catalog: &SiteCatalog, site: &str) -> Self {
        Self {
            site: site.to_string(),
            controllers: catalog.components_for(site),
        }
    }

    /// Returns the site this provider is scoped to.
    #[must_use]
    pub fn site(&self) -> &str {
        &self.site
    }
}

impl ComponentProvider for SiteComponentProvider {
    fn controllers(&self) -> Vec<Arc<dyn Controller>> {
        self.controllers.clone()
    }
}

impl fmt::Debug for SiteComponentProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SiteComponentProvider")
            .field("site", &self.site)
            .field(
                "controllers",
                &self.controllers.iter().map(|c| c.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// A fixed list of controllers, for overriding discovery in tests.
#[derive(Clone, Default)]
pub struct StaticComponentProvider {
    controllers: Vec<Arc<dyn Controller>>,
}

impl StaticComponentProvider {
    /// Creates an empty provider.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a controller.
    #[must_use]
    pub fn with_controller<C: Controller>(mut self, controller: C) -> Self {
        self.controllers.push(Arc::new(controller));
        self
    }
}

impl ComponentProvider for StaticComponentProvider {
    fn controllers(&self) -> Vec<Arc<dyn Controller>> {
        self.controllers.clone()
    }
}

/// The component provider an application was built with.
///
/// Registered as a singleton; `use_controllers` resolves it.
#[derive(Clone)]
pub struct ApplicationParts {
    provider: Arc<dyn ComponentProvider>,
}

impl ApplicationParts {
    /// Wraps a component provider.
    #[must_use]
    pub fn new(provider: Arc<dyn ComponentProvider>) -> Self {
        Self { provider }
    }

    /// Returns the discovered controllers.
    #[must_use]
    pub fn controllers(&self) -> Vec<Arc<dyn Controller>> {
        self.provider.controllers()
    }

    /// Returns the names of the discovered controllers.
    #[must_use]
    pub fn controller_names(&self) -> Vec<&'static str> {
        self.controllers().iter().map(|c| c.name()).collect()
    }
}

impl fmt::Debug for ApplicationParts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApplicationParts")
            .field("controllers", &self.controller_names())
            .finish()
    }
}
