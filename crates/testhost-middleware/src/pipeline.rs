//! Ordered middleware pipeline.
//!
//! A pipeline is the host's fixed core stages followed by whatever stages
//! the sample site registered, in registration order. It is immutable once
//! built and shared by every request the server dispatches.
//!
//! ```text
//! Request → RequestId → RequestLogging → ExceptionHeaders → site stages… → Endpoint
//! ```

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::stages::{ExceptionHeadersMiddleware, RequestIdMiddleware, RequestLoggingMiddleware};
use crate::types::{Request, Response};
use std::sync::Arc;

/// A type-erased middleware that can be stored in a vector.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// An immutable, ordered list of middleware stages.
///
/// # Example
///
/// ```
/// use testhost_middleware::{Pipeline, Stage};
///
/// let pipeline = Pipeline::builder().with_core_stages().build();
/// assert_eq!(pipeline.stage_names(), vec!["request_id", "request_logging", "exception_headers"]);
/// assert_eq!(Stage::core().len(), 3);
/// ```
#[derive(Clone)]
pub struct Pipeline {
    stages: Vec<BoxedMiddleware>,
}

impl Pipeline {
    /// Creates a new pipeline builder.
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Runs a request through every stage and then the endpoint.
    pub async fn process<H>(
        &self,
        mut ctx: MiddlewareContext,
        request: Request,
        endpoint: H,
    ) -> Response
    where
        H: FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, Response> + Send + 'static,
    {
        let next = self.build_chain(endpoint);
        next.run(&mut ctx, request).await
    }

    /// Builds the continuation chain from back to front.
    fn build_chain<'a, H>(&'a self, endpoint: H) -> Next<'a>
    where
        H: FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, Response> + Send + 'a,
    {
        self.stages
            .iter()
            .rev()
            .fold(Next::endpoint(endpoint), |next, middleware| {
                Next::new(middleware.as_ref(), next)
            })
    }

    /// Returns the names of all stages in execution order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|mw| mw.name()).collect()
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stage_names())
            .finish()
    }
}

/// Builder for constructing a [`Pipeline`].
#[derive(Default)]
pub struct PipelineBuilder {
    stages: Vec<BoxedMiddleware>,
}

impl PipelineBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the core stages in [`Stage::core`] order.
    #[must_use]
    pub fn with_core_stages(self) -> Self {
        self.add_stage(RequestIdMiddleware::new())
            .add_stage(RequestLoggingMiddleware::new())
            .add_stage(ExceptionHeadersMiddleware::new())
    }

    /// Appends a stage.
    #[must_use]
    pub fn add_stage<M: Middleware>(mut self, middleware: M) -> Self {
        self.stages.push(Arc::new(middleware));
        self
    }

    /// Appends an already-shared stage.
    #[must_use]
    pub fn add_boxed(mut self, middleware: BoxedMiddleware) -> Self {
        self.stages.push(middleware);
        self
    }

    /// Appends several shared stages, keeping their order.
    #[must_use]
    pub fn extend(mut self, stages: impl IntoIterator<Item = BoxedMiddleware>) -> Self {
        self.stages.extend(stages);
        self
    }

    /// Builds the pipeline.
    #[must_use]
    pub fn build(self) -> Pipeline {
        Pipeline {
            stages: self.stages,
        }
    }
}

/// The host's core stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Stage {
    /// Adopts or generates the request's correlation ID
    RequestId = 1,
    /// Opens the request span and logs completion
    RequestLogging = 2,
    /// Turns unhandled faults into a 500 with exception headers
    ExceptionHeaders = 3,
}

impl Stage {
    /// Returns the stage name, matching [`Middleware::name`].
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::RequestId => "request_id",
            Self::RequestLogging => "request_logging",
            Self::ExceptionHeaders => "exception_headers",
        }
    }

    /// Returns all core stages in order.
    #[must_use]
    pub const fn core() -> [Stage; 3] {
        [Self::RequestId, Self::RequestLogging, Self::ExceptionHeaders]
    }
}
