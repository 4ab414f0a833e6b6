//! HTTP request and response types flowing through the pipeline.

use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::StatusCode;
use http_body_util::Full;

/// The HTTP request type used in the pipeline.
///
/// Bodies are fully buffered; there is no socket to stream from.
pub type Request = http::Request<Full<Bytes>>;

/// The HTTP response type used in the pipeline.
pub type Response = http::Response<Full<Bytes>>;

/// Media type for plain-text bodies produced by the harness itself.
pub const TEXT_PLAIN_UTF8: &str = "text/plain; charset=utf-8";

/// Extension trait for building simple responses without a builder.
///
/// These constructors cannot fail, unlike `http::response::Builder`.
pub trait ResponseExt {
    /// Creates a body-less response with the given status.
    fn empty(status: StatusCode) -> Response;

    /// Creates a plain-text response.
    fn text(status: StatusCode, body: impl Into<String>) -> Response;
}

impl ResponseExt for Response {
    fn empty(status: StatusCode) -> Response {
        let mut response = http::Response::new(Full::new(Bytes::new()));
        *response.status_mut() = status;
        response
    }

    fn text(status: StatusCode, body: impl Into<String>) -> Response {
        let mut response = http::Response::new(Full::new(Bytes::from(body.into())));
        *response.status_mut() = status;
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(TEXT_PLAIN_UTF8));
        response
    }
}
