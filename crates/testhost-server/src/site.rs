//! Sample-site descriptors and the catalog they are looked up in.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use testhost_core::{HostError, HostResult, HostingEnvironment, ServiceCollection};

use crate::app::ApplicationBuilder;
use crate::discovery::Controller;

/// How a sample site registers its services and builds its pipeline.
///
/// # Example
///
/// ```rust
/// use testhost_core::{HostingEnvironment, ServiceCollection};
/// use testhost_server::{responses, ApplicationBuilder, Startup};
///
/// struct Clock(&'static str);
///
/// struct BasicWebSite;
///
/// impl Startup for BasicWebSite {
///     fn name(&self) -> &str {
///         "BasicWebSite"
///     }
///
///     fn configure_services(
///         &self,
///         services: &mut ServiceCollection,
///         _env: &HostingEnvironment,
///     ) -> anyhow::Result<()> {
///         services.add_singleton(|_| Ok(Clock("12:00")));
///         Ok(())
///     }
///
///     fn configure(&self, app: &mut ApplicationBuilder) {
///         app.map_get("/time", |ctx| async move {
///             let clock = ctx.resolve::<Clock>()?;
///             Ok(responses::text(clock.0))
///         });
///     }
/// }
/// ```
pub trait Startup: Send + Sync + 'static {
    /// Returns the site name fixtures refer to it by.
    fn name(&self) -> &str;

    /// Registers the site's services.
    fn configure_services(
        &self,
        _services: &mut ServiceCollection,
        _env: &HostingEnvironment,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    /// Builds the site's pipeline and routes.
    fn configure(&self, app: &mut ApplicationBuilder);

    /// Returns controllers owned by the site itself.
    fn controllers(&self) -> Vec<Arc<dyn Controller>> {
        Vec::new()
    }
}

/// Registry of the sample sites a test binary can host.
///
/// Sites are registered explicitly, keeping their registration order.
#[derive(Clone, Default)]
pub struct SiteCatalog {
    sites: IndexMap<String, Arc<dyn Startup>>,
    components: Vec<(String, Arc<dyn Controller>)>,
}

impl SiteCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a site under its own name, replacing one with the same name.
    #[must_use]
    pub fn with_site<S: Startup>(mut self, startup: S) -> Self {
        self.register(Arc::new(startup));
        self
    }

    /// Adds an already-shared site.
    pub fn register(&mut self, startup: Arc<dyn Startup>) -> &mut Self {
        self.sites.insert(startup.name().to_string(), startup);
        self
    }

    /// Attributes a controller to a site.
    #[must_use]
    pub fn with_component<C: Controller>(mut self, site: impl Into<String>, controller: C) -> Self {
        self.components.push((site.into(), Arc::new(controller)));
        self
    }

    /// Looks up a site by name.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::SiteNotFound`] listing the known sites.
    pub fn get(&self, name: &str) -> HostResult<Arc<dyn Startup>> {
        self.sites
            .get(name)
            .cloned()
            .ok_or_else(|| HostError::site_not_found(name, self.names()))
    }

    /// Returns `true` if a site with this name is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.sites.contains_key(name)
    }

    /// Returns the site names in registration order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.sites.keys().map(String::as_str).collect()
    }

    /// Returns every controller belonging to `site`: the startup's own
    /// first, then those attributed through [`with_component`](Self::with_component).
    #[must_use]
    pub fn components_for(&self, site: &str) -> Vec<Arc<dyn Controller>> {
        let own = self
            .sites
            .get(site)
            .map(|startup| startup.controllers())
            .unwrap_or_default();
        own.into_iter()
            .chain(
                self.components
                    .iter()
                    .filter(|(owner, _)| owner == site)
                    .map(|(_, controller)| Arc::clone(controller)),
            )
            .collect()
    }

    /// Returns the number of registered sites.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sites.len()
    }

    /// Returns `true` if no sites are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}

impl fmt::Debug for SiteCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SiteCatalog")
            .field("sites", &self.names())
            .field("components", &self.components.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::RouteTable;

    struct Empty(&'static str);

    impl Startup for Empty {
        fn name(&self) -> &str {
            self.0
        }

        fn configure(&self, _app: &mut ApplicationBuilder) {}
    }

    struct WithOwnController;

    struct Own;

    impl Controller for Own {
        fn name(&self) -> &'static str {
            "Own"
        }

        fn map_routes(&self, _routes: &mut RouteTable) {}
    }

    struct Extra;

    impl Controller for Extra {
        fn name(&self) -> &'static str {
            "Extra"
        }

        fn map_routes(&self, _routes: &mut RouteTable) {}
    }

    impl Startup for WithOwnController {
        fn name(&self) -> &str {
            "RoutingWebSite"
        }

        fn configure(&self, _app: &mut ApplicationBuilder) {}

        fn controllers(&self) -> Vec<Arc<dyn Controller>> {
            vec![Arc::new(Own)]
        }
    }

    #[test]
    fn test_get_known_site() {
        let catalog = SiteCatalog::new().with_site(Empty("BasicWebSite"));
        assert_eq!(catalog.get("BasicWebSite").unwrap().name(), "BasicWebSite");
        assert!(catalog.contains("BasicWebSite"));
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_unknown_site_fails_with_available_names() {
        let catalog = SiteCatalog::new()
            .with_site(Empty("BasicWebSite"))
            .with_site(Empty("FormatterWebSite"));

        let err = catalog.get("MissingWebSite").err().unwrap();
        match &err {
            HostError::SiteNotFound { name, available } => {
                assert_eq!(name, "MissingWebSite");
                assert_eq!(available, &["BasicWebSite", "FormatterWebSite"]);
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(err.to_string().contains("BasicWebSite, FormatterWebSite"));
    }

    #[test]
    fn test_names_keep_registration_order() {
        let catalog = SiteCatalog::new()
            .with_site(Empty("Zeta"))
            .with_site(Empty("Alpha"));
        assert_eq!(catalog.names(), vec!["Zeta", "Alpha"]);
    }

    #[test]
    fn test_components_for_combines_sources() {
        let catalog = SiteCatalog::new()
            .with_site(WithOwnController)
            .with_component("RoutingWebSite", Extra)
            .with_component("OtherWebSite", Extra);

        let names: Vec<_> = catalog
            .components_for("RoutingWebSite")
            .iter()
            .map(|c| c.name())
            .collect();
        assert_eq!(names, vec!["Own", "Extra"]);
        assert_eq!(catalog.components_for("OtherWebSite").len(), 1);
    }
}
