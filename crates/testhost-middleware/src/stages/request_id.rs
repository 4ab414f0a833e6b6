//! Request ID middleware.
//!
//! Tests tag requests with a `RequestId` header so that sample sites can
//! echo it back (for example through a scoped service) and the test can
//! prove which request a response belongs to.
//!
//! ## Request ID Sources
//!
//! 1. **RequestId header**: used verbatim when present and trusted
//! 2. **Generated UUID v7**: otherwise
//!
//! The chosen ID is always echoed in the response's `RequestId` header.

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response};
use http::HeaderValue;
use testhost_core::RequestId;

/// The header name for request ID propagation.
pub const REQUEST_ID_HEADER: &str = "requestid";

/// Middleware that adopts or generates request IDs.
#[derive(Debug, Clone)]
pub struct RequestIdMiddleware {
    /// Whether to adopt incoming `RequestId` headers.
    trust_incoming: bool,
}

impl Default for RequestIdMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestIdMiddleware {
    /// Creates a middleware that adopts incoming request IDs.
    #[must_use]
    pub fn new() -> Self {
        Self {
            trust_incoming: true,
        }
    }

    /// Creates a middleware that always generates a fresh ID.
    #[must_use]
    pub fn generate_only() -> Self {
        Self {
            trust_incoming: false,
        }
    }

    fn extract_request_id(&self, request: &Request) -> Option<RequestId> {
        if !self.trust_incoming {
            return None;
        }

        request
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(RequestId::from)
    }
}

impl Middleware for RequestIdMiddleware {
    fn name(&self) -> &'static str {
        "request_id"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let request_id = self
                .extract_request_id(&request)
                .unwrap_or_else(RequestId::new);
            ctx.set_request_id(request_id.clone());

            let mut response = next.run(ctx, request).await;

            if let Ok(value) = HeaderValue::from_str(request_id.as_str()) {
                response.headers_mut().insert(REQUEST_ID_HEADER, value);
            }
            response
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ResponseExt;
    use bytes::Bytes;
    use http::StatusCode;
    use http_body_util::Full;

    fn request_with_id(request_id: Option<&str>) -> Request {
        let mut builder = http::Request::builder().uri("/test");
        if let Some(id) = request_id {
            builder = builder.header("RequestId", id);
        }
        builder.body(Full::new(Bytes::new())).unwrap()
    }

    fn endpoint<'a>() -> Next<'a> {
        Next::endpoint(|ctx, _req| {
            let seen = ctx.request_id().to_string();
            Box::pin(async move { Response::text(StatusCode::OK, seen) })
        })
    }

    #[tokio::test]
    async fn test_adopts_incoming_id() {
        let middleware = RequestIdMiddleware::new();
        let mut ctx = MiddlewareContext::new();

        let response = middleware
            .process(&mut ctx, request_with_id(Some("first-request")), endpoint())
            .await;

        assert_eq!(ctx.request_id().as_str(), "first-request");
        assert_eq!(
            response.headers().get(REQUEST_ID_HEADER).unwrap(),
            "first-request"
        );
    }

    #[tokio::test]
    async fn test_generates_when_missing() {
        let middleware = RequestIdMiddleware::new();
        let mut ctx = MiddlewareContext::new();

        let response = middleware
            .process(&mut ctx, request_with_id(None), endpoint())
            .await;

        let header_id = response
            .headers()
            .get(REQUEST_ID_HEADER)
            .unwrap()
            .to_str()
            .unwrap();
        assert_eq!(header_id.len(), 36);
        assert_eq!(ctx.request_id().as_str(), header_id);
    }

    #[tokio::test]
    async fn test_generate_only_ignores_header() {
        let middleware = RequestIdMiddleware::generate_only();
        let mut ctx = MiddlewareContext::new();

        let response = middleware
            .process(&mut ctx, request_with_id(Some("spoofed")), endpoint())
            .await;

        assert_ne!(
            response.headers().get(REQUEST_ID_HEADER).unwrap(),
            "spoofed"
        );
    }

    #[test]
    fn test_middleware_name() {
        assert_eq!(RequestIdMiddleware::new().name(), "request_id");
    }
}
