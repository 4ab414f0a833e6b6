//! Application configuration: pipeline stages, routes and lifecycle.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use http::Method;
use testhost_core::{HostResult, HostingEnvironment, ServiceProvider};
use testhost_middleware::{
    BoxFuture, BoxedMiddleware, ExceptionHeadersMiddleware, FnMiddleware, Middleware,
    MiddlewareContext, Next, Pipeline, PipelineBuilder, Request, RequestIdMiddleware,
    RequestLoggingMiddleware, Response,
};

use crate::discovery::ApplicationParts;
use crate::endpoint::EndpointContext;
use crate::handler::HandlerResult;
use crate::lifecycle::{Lifecycle, LifecycleResult};
use crate::routes::RouteTable;

/// Mutable configuration handed to [`Startup::configure`](crate::Startup::configure).
///
/// The harness always runs its core stages (request ID, request logging,
/// exception headers) ahead of anything added here.
///
/// # Example
///
/// ```rust
/// use testhost_core::ServiceCollection;
/// use testhost_server::{responses, ApplicationBuilder};
///
/// let mut app = ApplicationBuilder::new(ServiceCollection::new().build());
/// app.use_fn("powered_by", |ctx, request, next| {
///     Box::pin(async move {
///         let mut response = next.run(ctx, request).await;
///         response
///             .headers_mut()
///             .insert("x-powered-by", http::HeaderValue::from_static("testhost"));
///         response
///     })
/// })
/// .map_get("/", |_ctx| async { Ok(responses::text("Hello")) });
///
/// let application = app.build().unwrap();
/// assert_eq!(
///     application.stage_names(),
///     vec!["request_id", "request_logging", "exception_headers", "powered_by"]
/// );
/// ```
pub struct ApplicationBuilder {
    services: ServiceProvider,
    stages: Vec<BoxedMiddleware>,
    routes: RouteTable,
    lifecycle: Lifecycle,
    use_controllers: bool,
    trust_request_id: bool,
}

impl ApplicationBuilder {
    /// Creates a builder over a root provider.
    #[must_use]
    pub fn new(services: ServiceProvider) -> Self {
        Self {
            services,
            stages: Vec::new(),
            routes: RouteTable::new(),
            lifecycle: Lifecycle::new(),
            use_controllers: false,
            trust_request_id: true,
        }
    }

    /// Returns the root provider.
    #[must_use]
    pub fn services(&self) -> &ServiceProvider {
        &self.services
    }

    /// Returns the hosting environment, when the harness registered one.
    #[must_use]
    pub fn environment(&self) -> Option<Arc<HostingEnvironment>> {
        self.services.resolve::<HostingEnvironment>()
    }

    /// Appends a pipeline stage.
    pub fn use_middleware<M: Middleware>(&mut self, middleware: M) -> &mut Self {
        self.stages.push(Arc::new(middleware));
        self
    }

    /// Appends a closure stage.
    pub fn use_fn<F>(&mut self, name: &'static str, func: F) -> &mut Self
    where
        F: for<'a> Fn(&'a mut MiddlewareContext, Request, Next<'a>) -> BoxFuture<'a, Response>
            + Send
            + Sync
            + 'static,
    {
        self.use_middleware(FnMiddleware::new(name, func))
    }

    /// Maps controllers found through [`ApplicationParts`] when the
    /// application is built.
    pub fn use_controllers(&mut self) -> &mut Self {
        self.use_controllers = true;
        self
    }

    /// Controls whether an incoming `RequestId` header is adopted.
    pub fn trust_request_id(&mut self, trust: bool) -> &mut Self {
        self.trust_request_id = trust;
        self
    }

    /// Maps a route.
    pub fn map<F, Fut>(&mut self, method: Method, path: &str, handler: F) -> &mut Self
    where
        F: Fn(EndpointContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.routes.map(method, path, handler);
        self
    }

    /// Maps a GET route.
    pub fn map_get<F, Fut>(&mut self, path: &str, handler: F) -> &mut Self
    where
        F: Fn(EndpointContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.map(Method::GET, path, handler)
    }

    /// Maps a POST route.
    pub fn map_post<F, Fut>(&mut self, path: &str, handler: F) -> &mut Self
    where
        F: Fn(EndpointContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.map(Method::POST, path, handler)
    }

    /// Returns the route table for direct mapping.
    pub fn routes_mut(&mut self) -> &mut RouteTable {
        &mut self.routes
    }

    /// Registers a startup hook.
    pub fn on_startup<F, Fut>(&mut self, name: impl Into<String>, hook: F) -> &mut Self
    where
        F: Fn(ServiceProvider) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = LifecycleResult> + Send + 'static,
    {
        self.lifecycle = std::mem::take(&mut self.lifecycle).on_startup_named(name, hook);
        self
    }

    /// Registers a shutdown hook.
    pub fn on_shutdown<F, Fut>(&mut self, name: impl Into<String>, hook: F) -> &mut Self
    where
        F: Fn(ServiceProvider) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = LifecycleResult> + Send + 'static,
    {
        self.lifecycle = std::mem::take(&mut self.lifecycle).on_shutdown_named(name, hook);
        self
    }

    /// Freezes the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::Injection`](testhost_core::HostError::Injection)
    /// if controllers are requested but no [`ApplicationParts`] is registered.
    pub fn build(self) -> HostResult<Application> {
        let mut routes = self.routes;

        if self.use_controllers {
            let parts = self.services.resolve_required::<ApplicationParts>()?;
            for controller in parts.controllers() {
                tracing::debug!(controller = controller.name(), "mapping controller routes");
                controller.map_routes(&mut routes);
            }
        }

        let request_id = if self.trust_request_id {
            RequestIdMiddleware::new()
        } else {
            RequestIdMiddleware::generate_only()
        };

        let pipeline = PipelineBuilder::new()
            .add_stage(request_id)
            .add_stage(RequestLoggingMiddleware::new())
            .add_stage(ExceptionHeadersMiddleware::new())
            .extend(self.stages)
            .build();

        tracing::debug!(
            stages = ?pipeline.stage_names(),
            routes = routes.len(),
            "application built"
        );

        Ok(Application {
            pipeline,
            routes: Arc::new(routes),
            lifecycle: self.lifecycle,
        })
    }
}

impl fmt::Debug for ApplicationBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApplicationBuilder")
            .field("stages", &self.stages.iter().map(|s| s.name()).collect::<Vec<_>>())
            .field("routes", &self.routes)
            .field("use_controllers", &self.use_controllers)
            .field("trust_request_id", &self.trust_request_id)
            .finish_non_exhaustive()
    }
}

/// A built application: the pipeline, routes and lifecycle a server runs.
#[derive(Debug, Clone)]
pub struct Application {
    pub(crate) pipeline: Pipeline,
    pub(crate) routes: Arc<RouteTable>,
    pub(crate) lifecycle: Lifecycle,
}

impl Application {
    /// Returns the pipeline's stage names in execution order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.pipeline.stage_names()
    }

    /// Returns the route table.
    #[must_use]
    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Returns the lifecycle hooks.
    #[must_use]
    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }
}
