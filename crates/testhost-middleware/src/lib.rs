//! # Testhost Middleware
//!
//! The ordered request pipeline every in-memory test server runs.
//!
//! Each dispatched request passes through the host's core stages before
//! reaching whatever stages the sample site registered and, finally, the
//! routed endpoint:
//!
//! ```text
//! Request → RequestId → RequestLogging → ExceptionHeaders → site stages… → Endpoint
//!                                                                            ↓
//! Response ←───────────────────────────────────────────────────────────────┘
//! ```
//!
//! | Stage | Middleware           | Purpose                                          |
//! |-------|---------------------|--------------------------------------------------|
//! | 1     | Request ID           | Adopt the `RequestId` header or generate UUID v7 |
//! | 2     | Request Logging      | `request` span plus a completion event           |
//! | 3     | Exception Headers    | Faults become 500 with `X-Exception-*` headers   |
//!
//! Site stages run in registration order after the core stages. A stage can
//! short-circuit by returning without calling [`Next::run`].
//!
//! ## Example
//!
//! ```
//! use testhost_middleware::{Pipeline, Stage};
//!
//! let pipeline = Pipeline::builder().with_core_stages().build();
//! assert_eq!(pipeline.stage_count(), Stage::core().len());
//! assert_eq!(Stage::core()[0].name(), "request_id");
//! ```

#![doc(html_root_url = "https://docs.rs/testhost-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod context;
pub mod middleware;
pub mod pipeline;
pub mod stages;
pub mod types;

pub use context::MiddlewareContext;
pub use middleware::{BoxFuture, FnMiddleware, Middleware, Next};
pub use pipeline::{BoxedMiddleware, Pipeline, PipelineBuilder, Stage};
pub use stages::exception_headers::fault_to_response;
pub use stages::{
    ExceptionHeadersMiddleware, RequestIdMiddleware, RequestLoggingMiddleware,
    EXCEPTION_MESSAGE_HEADER, EXCEPTION_TYPE_HEADER, REQUEST_ID_HEADER,
};
pub use types::{Request, Response, ResponseExt, TEXT_PLAIN_UTF8};
