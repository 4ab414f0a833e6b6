//! Request logging middleware.
//!
//! Opens a `request` span for everything downstream, so that any event a
//! stage or endpoint emits carries the request's ID, method and path. When
//! the response comes back the stage records the status and logs one
//! completion event with the elapsed time.
//!
//! # Log Fields
//!
//! - `request_id` - The ID chosen by the request-id stage
//! - `method` - HTTP method
//! - `path` - Request path
//! - `status` - Response status code (recorded on completion)
//! - `duration_ms` - Time spent in the rest of the pipeline

use crate::{
    context::MiddlewareContext,
    middleware::{BoxFuture, Middleware, Next},
    types::{Request, Response},
};
use tracing::{field, Instrument};

/// Middleware that wraps each request in a tracing span.
#[derive(Debug, Clone)]
pub struct RequestLoggingMiddleware {
    /// Whether to log the completion event at all.
    log_completion: bool,
}

impl Default for RequestLoggingMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestLoggingMiddleware {
    /// Creates a logging middleware that logs completions.
    #[must_use]
    pub fn new() -> Self {
        Self {
            log_completion: true,
        }
    }

    /// Creates a logging middleware that only opens the span.
    #[must_use]
    pub fn span_only() -> Self {
        Self {
            log_completion: false,
        }
    }
}

impl Middleware for RequestLoggingMiddleware {
    fn name(&self) -> &'static str {
        "request_logging"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        let span = tracing::info_span!(
            "request",
            request_id = %ctx.request_id(),
            method = %request.method(),
            path = %request.uri().path(),
            status = field::Empty,
        );

        Box::pin(
            async move {
                tracing::debug!("request started");
                let started = std::time::Instant::now();

                let response = next.run(ctx, request).await;

                let status = response.status().as_u16();
                tracing::Span::current().record("status", status);

                if self.log_completion {
                    let duration_ms = started.elapsed().as_secs_f64() * 1000.0;
                    if let Some(operation_id) = ctx.operation_id() {
                        tracing::info!(status, duration_ms, operation_id, "request completed");
                    } else {
                        tracing::info!(status, duration_ms, "request completed");
                    }
                }

                response
            }
            .instrument(span),
        )
    }
}
