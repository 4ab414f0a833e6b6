//! # Testhost Server
//!
//! In-memory hosting of sample sites.
//!
//! This crate provides the pieces a fixture uses to stand up a site:
//!
//! - [`SiteCatalog`] / [`Startup`] - named sample sites and their configuration
//! - [`create_services`] - builds a site's root provider with harness doubles
//! - [`ComponentProvider`] - controller discovery, scoped to the site under test
//! - [`ApplicationBuilder`] - pipeline stages, routes and lifecycle hooks
//! - [`TestServer`] - dispatches requests without sockets, one scope per request
//!
//! ## Example
//!
//! ```rust
//! use testhost_server::{responses, ApplicationBuilder, HostOptions, SiteCatalog, Startup, TestServer};
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
//! # tokio_test::block_on(async {
//! let catalog = SiteCatalog::new().with_site(BasicWebSite);
//! let server = TestServer::for_site(&catalog, "BasicWebSite", HostOptions::new())
//!     .await
//!     .unwrap();
//!
//! let response = server
//!     .send(http::Request::get("/").body(Default::default()).unwrap())
//!     .await
//!     .unwrap();
//! assert_eq!(response.status(), 200);
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/testhost-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod app;
pub mod discovery;
mod endpoint;
mod error;
pub mod handler;
mod lifecycle;
pub mod responses;
mod routes;
mod server;
mod services;
mod site;

pub use app::{Application, ApplicationBuilder};
pub use discovery::{
    ApplicationParts, ComponentProvider, Controller, SiteComponentProvider,
    StaticComponentProvider,
};
pub use endpoint::EndpointContext;
pub use error::ServerError;
pub use handler::{HandlerError, HandlerResult};
pub use lifecycle::{Lifecycle, LifecycleError, LifecycleHook, LifecycleResult};
pub use routes::RouteTable;
pub use server::{TestServer, DEFAULT_APPLICATION_NAME};
pub use services::{create_services, HostOptions, ServicesCallback};
pub use site::{SiteCatalog, Startup};

pub use testhost_middleware::{Request, Response};
