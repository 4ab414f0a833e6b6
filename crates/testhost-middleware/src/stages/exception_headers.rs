//! Exception headers middleware.
//!
//! Converts an unhandled fault anywhere downstream into a 500 response that
//! describes the fault in two headers, so a test can assert on what went
//! wrong without parsing a body:
//!
//! - `X-Exception-Type` - the error's Rust type name, or `panic`
//! - `X-Exception-Message` - the error's display text or panic message
//!
//! Two kinds of fault are recognized:
//!
//! 1. A panic while running the rest of the pipeline.
//! 2. A response carrying a [`Fault`] extension, which is how the endpoint
//!    dispatcher reports a handler that returned `Err`.
//!
//! Header values cannot contain control characters, so those are replaced
//! with spaces before the headers are written.

use crate::{
    context::MiddlewareContext,
    middleware::{BoxFuture, Middleware, Next},
    types::{Request, Response, ResponseExt},
};
use futures_util::FutureExt;
use http::{HeaderValue, StatusCode};
use std::panic::AssertUnwindSafe;
use testhost_core::Fault;

/// Header carrying the fault's type name.
pub const EXCEPTION_TYPE_HEADER: &str = "x-exception-type";

/// Header carrying the fault's message.
pub const EXCEPTION_MESSAGE_HEADER: &str = "x-exception-message";

/// Middleware that reports faults through response headers.
#[derive(Debug, Clone, Default)]
pub struct ExceptionHeadersMiddleware {
    _private: (),
}

impl ExceptionHeadersMiddleware {
    /// Creates the middleware.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the 500 response describing `fault`.
    #[must_use]
    pub fn fault_response(fault: &Fault) -> Response {
        let mut response = Response::text(StatusCode::INTERNAL_SERVER_ERROR, fault.message());
        let headers = response.headers_mut();
        if let Ok(value) = header_value(fault.type_name()) {
            headers.insert(EXCEPTION_TYPE_HEADER, value);
        }
        if let Ok(value) = header_value(fault.message()) {
            headers.insert(EXCEPTION_MESSAGE_HEADER, value);
        }
        response.extensions_mut().insert(fault.clone());
        response
    }
}

/// Attaches `fault` to a bare 500 response for this stage to report.
#[must_use]
pub fn fault_to_response(fault: Fault) -> Response {
    let mut response = Response::empty(StatusCode::INTERNAL_SERVER_ERROR);
    response.extensions_mut().insert(fault);
    response
}

fn header_value(raw: &str) -> Result<HeaderValue, http::header::InvalidHeaderValue> {
    let sanitized: String = raw
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    HeaderValue::from_str(sanitized.trim())
}

impl Middleware for ExceptionHeadersMiddleware {
    fn name(&self) -> &'static str {
        "exception_headers"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let outcome = AssertUnwindSafe(next.run(ctx, request))
                .catch_unwind()
                .await;

            let fault = match outcome {
                Ok(mut response) => match response.extensions_mut().remove::<Fault>() {
                    Some(fault) => fault,
                    None => return response,
                },
                Err(payload) => Fault::from_panic(payload.as_ref()),
            };

            tracing::error!(
                request_id = %ctx.request_id(),
                exception_type = fault.type_name(),
                exception_message = fault.message(),
                "unhandled fault while serving request"
            );

            Self::fault_response(&fault)
        })
    }
}
