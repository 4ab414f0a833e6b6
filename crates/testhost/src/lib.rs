//! # Testhost
//!
//! **In-memory functional testing for sample web sites**
//!
//! Testhost stands a named sample site up inside the test process and drives
//! it with real HTTP messages, without sockets:
//!
//! - **Site Catalog** – sites register by name through a [`Startup`](server::Startup)
//!   descriptor; unknown names fail fast
//! - **Service Container** – singleton, scoped and transient lifetimes with
//!   lazy singletons and disposal in reverse creation order
//! - **Ordered Pipeline** – request ID, request logging and exception headers
//!   always run ahead of the site's own stages
//! - **Per-Request Scopes** – every request gets its own scope, released when
//!   the response is produced
//! - **Test Client** – fluent requests, buffered responses, a cookie jar and
//!   anti-forgery helpers
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use testhost::prelude::*;
//!
//! struct BasicWebSite;
//!
//! impl Startup for BasicWebSite {
//!     fn name(&self) -> &str {
//!         "BasicWebSite"
//!     }
//!
//!     fn configure(&self, app: &mut ApplicationBuilder) {
//!         app.map_get("/", |_ctx| async { Ok(responses::text("Hello")) });
//!     }
//! }
//!
//! #[tokio::test]
//! async fn home_page() {
//!     let catalog = SiteCatalog::new().with_site(BasicWebSite);
//!     let fixture = SiteFixture::start(&catalog, "BasicWebSite").await.unwrap();
//!
//!     fixture
//!         .client()
//!         .get("/")
//!         .send()
//!         .await
//!         .unwrap()
//!         .assert_body_eq("Hello");
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! TestClient → TestServer → RequestId → RequestLogging → ExceptionHeaders → site stages → route → handler
//!                                                                                              ↓
//! TestResponse ←──────────────────────────── response (scope released) ←─────────────────────┘
//! ```

#![doc(html_root_url = "https://docs.rs/testhost/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use testhost_core as core;

// Re-export server types
pub use testhost_server as server;

// Re-export middleware types
pub use testhost_middleware as middleware;

// Re-export router types
pub use testhost_router as router;

// Re-export client-side test tooling
pub use testhost_test as client;

// Re-export logging and capture
pub use testhost_telemetry as telemetry;

// Re-export configuration
pub use testhost_config as config;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use testhost::prelude::*;
///
/// let catalog = SiteCatalog::new();
/// assert!(catalog.is_empty());
/// ```
pub mod prelude {
    pub use testhost_core::{
        Dispose, HostError, HostResult, HostingEnvironment, InjectionError, Resolver,
        ServiceCollection, ServiceProvider, ServiceScope,
    };

    // Hosting
    pub use testhost_server::{
        responses, ApplicationBuilder, ComponentProvider, Controller, EndpointContext,
        HandlerError, HandlerResult, HostOptions, RouteTable, SiteCatalog, Startup, TestServer,
    };

    // Pipeline stages
    pub use testhost_middleware::{
        BoxFuture, Middleware, MiddlewareContext, Next, Request, Response,
        EXCEPTION_MESSAGE_HEADER, EXCEPTION_TYPE_HEADER, REQUEST_ID_HEADER,
    };

    // Client-side tooling
    pub use testhost_test::{
        antiforgery, CookieJar, SetCookie, SiteFixture, TestClient, TestError, TestRequest,
        TestResponse,
    };

    // Configuration and logs
    pub use testhost_config::{ConfigLoader, HarnessConfig};
    pub use testhost_telemetry::{LogContext, LogRecord, LoggerFactory};
}
