//! The in-memory test server.
//!
//! [`TestServer`] runs requests through an application's pipeline without
//! opening a socket. Each dispatch:
//!
//! 1. opens a fresh [`ServiceScope`](testhost_core::ServiceScope) on the root provider
//! 2. runs the pipeline (core stages, then the site's stages)
//! 3. routes to an endpoint, answering 404 or 405 when nothing matches
//! 4. releases the scope, disposing its scoped services
//!
//! All of it runs under the fixture's [`LogContext`] dispatch, so events
//! land in that fixture's capture buffer only.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use http::header::{HeaderValue, ALLOW};
use http::{Method, StatusCode};
use http_body_util::{BodyExt, Full};
use testhost_config::HarnessConfig;
use testhost_core::{Fault, HostError, HostResult, HostingEnvironment, ServiceProvider};
use testhost_middleware::{
    fault_to_response, BoxFuture, MiddlewareContext, Pipeline, Request, Response, ResponseExt,
};
use testhost_router::RouteOutcome;
use testhost_telemetry::LogContext;
use tracing::instrument::WithSubscriber;

use crate::app::{Application, ApplicationBuilder};
use crate::endpoint::EndpointContext;
use crate::error::ServerError;
use crate::lifecycle::Lifecycle;
use crate::routes::RouteTable;
use crate::services::{create_services, HostOptions};
use crate::site::SiteCatalog;

/// Application name used when the provider has no [`HostingEnvironment`].
pub const DEFAULT_APPLICATION_NAME: &str = "testhost";

/// Type name reported when a route names an operation without a handler.
const MISSING_HANDLER: &str = "testhost::MissingHandler";

/// An in-memory server hosting one application.
///
/// Cloning is cheap; clones share the same application and provider, and
/// may send requests concurrently.
///
/// # Example
///
/// ```rust
/// use testhost_core::ServiceCollection;
/// use testhost_server::{responses, TestServer};
///
/// # tokio_test::block_on(async {
/// let server = TestServer::create(ServiceCollection::new().build(), |app| {
///     app.map_get("/ping", |_ctx| async { Ok(responses::text("pong")) });
/// })
/// .await
/// .unwrap();
///
/// let request = http::Request::get("/ping").body(Default::default()).unwrap();
/// let response = server.send(request).await.unwrap();
/// assert_eq!(response.status(), 200);
/// # });
/// ```
#[derive(Clone)]
pub struct TestServer {
    inner: Arc<ServerInner>,
}

struct ServerInner {
    name: String,
    base_url: String,
    services: ServiceProvider,
    pipeline: Pipeline,
    routes: Arc<RouteTable>,
    lifecycle: Lifecycle,
    log_context: LogContext,
    shut_down: AtomicBool,
}

impl TestServer {
    /// Builds a server over `services`, letting `configure` set up the
    /// pipeline and routes, then runs the startup hooks.
    ///
    /// The provider's [`LogContext`] and [`HarnessConfig`] are used when
    /// registered; otherwise a fresh context and the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`HostError`] if the application cannot be built or a
    /// startup hook fails.
    pub async fn create<F>(services: ServiceProvider, configure: F) -> HostResult<Self>
    where
        F: FnOnce(&mut ApplicationBuilder),
    {
        let log_context = services
            .resolve::<LogContext>()
            .map(|ctx| LogContext::clone(&ctx))
            .unwrap_or_default();
        let config = services
            .resolve::<HarnessConfig>()
            .map(|config| HarnessConfig::clone(&config))
            .unwrap_or_default();
        let name = services
            .resolve::<HostingEnvironment>()
            .map_or_else(
                || DEFAULT_APPLICATION_NAME.to_string(),
                |env| env.application_name().to_string(),
            );

        let application = log_context.in_scope(|| {
            let mut builder = ApplicationBuilder::new(services.clone());
            builder.trust_request_id(config.host.trust_request_id);
            configure(&mut builder);
            builder.build()
        })?;

        Self::start(name, config, services, application, log_context).await
    }

    /// Builds the provider for a catalog site and hosts it.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::SiteNotFound`] for an unknown site, or any
    /// error from [`create_services`] and [`TestServer::create`].
    pub async fn for_site(
        catalog: &SiteCatalog,
        site_name: &str,
        options: HostOptions,
    ) -> HostResult<Self> {
        let startup = catalog.get(site_name)?;
        let services = create_services(catalog, site_name, &options)?;
        Self::create(services, |app| startup.configure(app)).await
    }

    async fn start(
        name: String,
        config: HarnessConfig,
        services: ServiceProvider,
        application: Application,
        log_context: LogContext,
    ) -> HostResult<Self> {
        let Application {
            pipeline,
            routes,
            lifecycle,
        } = application;

        lifecycle
            .run_startup(&services)
            .with_subscriber(log_context.dispatch().clone())
            .await
            .map_err(|e| HostError::startup(name.clone(), e))?;

        log_context.in_scope(|| {
            tracing::info!(
                site = %name,
                base_url = %config.host.base_url,
                stages = pipeline.stage_count(),
                routes = routes.len(),
                "test server started"
            );
        });

        Ok(Self {
            inner: Arc::new(ServerInner {
                name,
                base_url: config.host.base_url,
                services,
                pipeline,
                routes,
                lifecycle,
                log_context,
                shut_down: AtomicBool::new(false),
            }),
        })
    }

    /// Dispatches a request and returns the buffered response.
    ///
    /// Application failures are responses (500 with exception headers), not
    /// errors.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::ShutDown`] after [`shutdown`](Self::shutdown).
    pub async fn send(&self, request: Request) -> Result<Response, ServerError> {
        if self.is_shut_down() {
            return Err(ServerError::shut_down(&self.inner.name));
        }
        let dispatch = self.inner.log_context.dispatch().clone();
        Ok(self.inner.dispatch(request).with_subscriber(dispatch).await)
    }

    /// Runs shutdown hooks in reverse order, then disposes singletons.
    ///
    /// Later calls to [`send`](Self::send) fail. Calling this twice is a
    /// no-op.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Lifecycle`] if a shutdown hook failed; the
    /// provider is disposed regardless.
    pub async fn shutdown(&self) -> Result<(), ServerError> {
        if self.inner.shut_down.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        let inner = &self.inner;
        let hooks = inner
            .lifecycle
            .run_shutdown(&inner.services)
            .with_subscriber(inner.log_context.dispatch().clone())
            .await;

        inner.log_context.in_scope(|| {
            inner.services.dispose();
            tracing::info!(site = %inner.name, "test server shut down");
        });
        hooks.map_err(ServerError::from)
    }

    /// Returns `true` once [`shutdown`](Self::shutdown) has started.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.inner.shut_down.load(Ordering::Acquire)
    }

    /// Returns the root provider.
    #[must_use]
    pub fn services(&self) -> &ServiceProvider {
        &self.inner.services
    }

    /// Returns the hosted application's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Returns the host label relative URLs resolve against.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Returns the log context requests are dispatched under.
    #[must_use]
    pub fn log_context(&self) -> &LogContext {
        &self.inner.log_context
    }

    /// Returns the pipeline's stage names.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.inner.pipeline.stage_names()
    }
}

impl fmt::Debug for TestServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestServer")
            .field("name", &self.inner.name)
            .field("pipeline", &self.inner.pipeline)
            .field("routes", &self.inner.routes)
            .field("shut_down", &self.is_shut_down())
            .finish_non_exhaustive()
    }
}

impl ServerInner {
    async fn dispatch(&self, request: Request) -> Response {
        let strip_body = request.method() == Method::HEAD;
        let scope = Arc::new(self.services.create_scope());
        let ctx = MiddlewareContext::with_services(Arc::clone(&scope));
        let routes = Arc::clone(&self.routes);

        let response = self
            .pipeline
            .process(ctx, request, move |ctx, request| {
                route_to_endpoint(&routes, scope, ctx, request)
            })
            .await;

        if strip_body {
            let (parts, _) = response.into_parts();
            Response::from_parts(parts, Full::new(Bytes::new()))
        } else {
            response
        }
    }
}

fn route_to_endpoint(
    routes: &RouteTable,
    scope: Arc<testhost_core::ServiceScope>,
    ctx: &mut MiddlewareContext,
    request: Request,
) -> BoxFuture<'static, Response> {
    let (operation_id, params) = match routes.route_request(request.method(), request.uri().path()) {
        RouteOutcome::Matched(m) => (m.operation_id.to_string(), m.params),
        RouteOutcome::MethodNotAllowed { allowed } => {
            tracing::debug!(method = %request.method(), "no route for method");
            let mut response = Response::empty(StatusCode::METHOD_NOT_ALLOWED);
            let allow = allowed
                .iter()
                .map(Method::as_str)
                .collect::<Vec<_>>()
                .join(", ");
            if let Ok(value) = HeaderValue::from_str(&allow) {
                response.headers_mut().insert(ALLOW, value);
            }
            return Box::pin(async move { response });
        }
        RouteOutcome::NotFound => {
            tracing::debug!("no route for path");
            return Box::pin(async { Response::empty(StatusCode::NOT_FOUND) });
        }
    };

    ctx.set_operation_id(operation_id.clone());
    let request_id = ctx.request_id().clone();
    let Some(handler) = routes.handler(&operation_id).cloned() else {
        let fault = Fault::new(MISSING_HANDLER, format!("no handler for '{operation_id}'"));
        return Box::pin(async move { fault_to_response(fault) });
    };

    Box::pin(async move {
        let (parts, body) = request.into_parts();
        let body = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(never) => match never {},
        };
        let endpoint = EndpointContext::new(parts, body, params, request_id, operation_id, scope);
        match handler(endpoint).await {
            Ok(response) => response,
            Err(error) => fault_to_response(error.into_fault()),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::responses;
    use futures_util::future::join_all;
    use std::sync::atomic::AtomicUsize;
    use testhost_core::{Dispose, ServiceCollection};
    use testhost_middleware::{EXCEPTION_MESSAGE_HEADER, EXCEPTION_TYPE_HEADER, REQUEST_ID_HEADER};

    #[derive(Debug, thiserror::Error)]
    #[error("Loader exception message")]
    struct LoaderError;

    struct Counted {
        disposed: Arc<AtomicUsize>,
    }

    impl Dispose for Counted {
        fn dispose(&self) {
            self.disposed.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn get(uri: &str) -> Request {
        http::Request::get(uri).body(Full::default()).unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn server() -> TestServer {
        TestServer::create(ServiceCollection::new().build(), |app| {
            app.map_get("/Home/Index", |_ctx| async { Ok(responses::text("Hello")) })
                .map_post("/Home/Index", |ctx| async move {
                    Ok(responses::text(ctx.text()?.to_uppercase()))
                })
                .map_get("/fail", |_ctx| async { Err(LoaderError.into()) })
                .map_get("/echo-id", |ctx| async move {
                    Ok(responses::text(ctx.request_id().to_string()))
                });
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_routes_to_handler() {
        let server = server().await;
        let response = server.send(get("http://localhost/home/index")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "Hello");

        let request = http::Request::post("/Home/Index")
            .body(Full::new(Bytes::from_static(b"posted")))
            .unwrap();
        let response = server.send(request).await.unwrap();
        assert_eq!(body_text(response).await, "POSTED");
    }

    #[tokio::test]
    async fn test_not_found_and_method_not_allowed() {
        let server = server().await;

        let response = server.send(get("/missing")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let request = http::Request::delete("/Home/Index")
            .body(Full::default())
            .unwrap();
        let response = server.send(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[ALLOW], "GET, HEAD, POST");
    }

    #[tokio::test]
    async fn test_head_strips_body() {
        let server = server().await;
        let request = http::Request::head("/Home/Index")
            .body(Full::default())
            .unwrap();
        let response = server.send(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(http::header::CONTENT_TYPE));
        assert_eq!(body_text(response).await, "");
    }

    #[tokio::test]
    async fn test_handler_error_becomes_exception_headers() {
        let server = server().await;
        let response = server.send(get("/fail")).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let type_name = response.headers()[EXCEPTION_TYPE_HEADER].to_str().unwrap();
        assert!(type_name.ends_with("LoaderError"));
        assert_eq!(
            response.headers()[EXCEPTION_MESSAGE_HEADER],
            "Loader exception message"
        );
    }

    #[tokio::test]
    async fn test_request_id_reaches_endpoint() {
        let server = server().await;
        let request = http::Request::get("/echo-id")
            .header(REQUEST_ID_HEADER, "first")
            .body(Full::default())
            .unwrap();
        let response = server.send(request).await.unwrap();
        assert_eq!(response.headers()[REQUEST_ID_HEADER], "first");
        assert_eq!(body_text(response).await, "first");
    }

    #[tokio::test]
    async fn test_untrusted_request_id_is_replaced() {
        let server = TestServer::create(ServiceCollection::new().build(), |app| {
            app.trust_request_id(false).map_get("/echo-id", |ctx| async move {
                Ok(responses::text(ctx.request_id().to_string()))
            });
        })
        .await
        .unwrap();

        let request = http::Request::get("/echo-id")
            .header(REQUEST_ID_HEADER, "spoofed")
            .body(Full::default())
            .unwrap();
        let response = server.send(request).await.unwrap();
        assert_ne!(body_text(response).await, "spoofed");
    }

    #[tokio::test]
    async fn test_requests_are_logged_to_the_servers_context() {
        let logs = LogContext::new();
        let mut services = ServiceCollection::new();
        services.add_instance(Arc::new(logs.clone()));

        let server = TestServer::create(services.build(), |app| {
            app.map_get("/", |_ctx| async {
                tracing::info!("inside endpoint");
                Ok(responses::text("ok"))
            });
        })
        .await
        .unwrap();

        let request = http::Request::get("/")
            .header(REQUEST_ID_HEADER, "logged-1")
            .body(Full::default())
            .unwrap();
        server.send(request).await.unwrap();

        let record = logs.find_message("inside endpoint").unwrap();
        assert_eq!(record.field("request_id"), Some("logged-1"));
        assert!(logs.contains_message("request completed"));
        assert!(logs.contains_message("test server started"));
    }

    #[tokio::test]
    async fn test_scoped_services_disposed_per_request() {
        let disposed = Arc::new(AtomicUsize::new(0));
        let tracker = Arc::clone(&disposed);

        let mut services = ServiceCollection::new();
        services.add_scoped_disposable(move |_| {
            Ok(Counted {
                disposed: Arc::clone(&tracker),
            })
        });

        let server = TestServer::create(services.build(), |app| {
            app.map_get("/", |ctx| async move {
                ctx.resolve::<Counted>()?;
                Ok(responses::text("ok"))
            });
        })
        .await
        .unwrap();

        server.send(get("/")).await.unwrap();
        server.send(get("/")).await.unwrap();
        assert_eq!(disposed.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_shutdown_runs_hooks_and_disposes() {
        let disposed = Arc::new(AtomicUsize::new(0));
        let tracker = Arc::clone(&disposed);
        let hook_runs = Arc::new(AtomicUsize::new(0));
        let hook_counter = Arc::clone(&hook_runs);

        let mut services = ServiceCollection::new();
        services.add_singleton_disposable(move |_| {
            Ok(Counted {
                disposed: Arc::clone(&tracker),
            })
        });

        let server = TestServer::create(services.build(), move |app| {
            app.on_shutdown("count", move |_| {
                let counter = Arc::clone(&hook_counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            });
        })
        .await
        .unwrap();

        assert!(!server.services().is_created::<Counted>());
        server.services().resolve_required::<Counted>().unwrap();

        server.shutdown().await.unwrap();
        server.shutdown().await.unwrap();

        assert!(server.is_shut_down());
        assert_eq!(hook_runs.load(Ordering::SeqCst), 1);
        assert_eq!(disposed.load(Ordering::SeqCst), 1);
        let err = server.send(get("/")).await.unwrap_err();
        assert!(err.is_shut_down());
    }

    #[tokio::test]
    async fn test_startup_hook_failure_fails_creation() {
        let result = TestServer::create(ServiceCollection::new().build(), |app| {
            app.on_startup("migrate", |_| async {
                Err(crate::LifecycleError::new("schema missing"))
            });
        })
        .await;

        let err = result.unwrap_err();
        assert!(matches!(err, HostError::Startup { .. }));
        assert!(err.to_string().contains(DEFAULT_APPLICATION_NAME));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_sends() {
        let server = server().await;
        let sends = (0..32).map(|i| {
            let server = server.clone();
            async move {
                let request = http::Request::get("/echo-id")
                    .header(REQUEST_ID_HEADER, format!("req-{i}"))
                    .body(Full::default())
                    .unwrap();
                let response = server.send(request).await.unwrap();
                (i, body_text(response).await)
            }
        });

        for (i, body) in join_all(sends).await {
            assert_eq!(body, format!("req-{i}"));
        }
    }
}
