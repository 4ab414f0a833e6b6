//! Response constructors for endpoint handlers.

use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE, LOCATION};
use http::StatusCode;
use http_body_util::Full;
use serde::Serialize;
use testhost_middleware::{Response, ResponseExt};

use crate::handler::HandlerError;

/// Media type of JSON bodies.
pub const APPLICATION_JSON: &str = "application/json; charset=utf-8";

/// Media type of HTML bodies.
pub const TEXT_HTML_UTF8: &str = "text/html; charset=utf-8";

/// A 200 response with a plain-text body.
#[must_use]
pub fn text(body: impl Into<String>) -> Response {
    Response::text(StatusCode::OK, body)
}

/// A 200 response with an HTML body.
#[must_use]
pub fn html(body: impl Into<String>) -> Response {
    with_body(StatusCode::OK, TEXT_HTML_UTF8, Bytes::from(body.into()))
}

/// A 200 response with `value` serialized as JSON.
pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Response, HandlerError> {
    json_with_status(StatusCode::OK, value)
}

/// A JSON response with an explicit status.
pub fn json_with_status<T: Serialize + ?Sized>(
    status: StatusCode,
    value: &T,
) -> Result<Response, HandlerError> {
    let body = serde_json::to_vec(value)?;
    Ok(with_body(status, APPLICATION_JSON, Bytes::from(body)))
}

/// A body-less response.
#[must_use]
pub fn status(status: StatusCode) -> Response {
    Response::empty(status)
}

/// A 302 redirect. A location that is not a valid header value yields a
/// redirect without `Location`.
#[must_use]
pub fn redirect(location: &str) -> Response {
    let mut response = Response::empty(StatusCode::FOUND);
    if let Ok(value) = HeaderValue::from_str(location) {
        response.headers_mut().insert(LOCATION, value);
    }
    response
}

/// A response with a body of the given media type.
#[must_use]
pub fn with_body(status: StatusCode, content_type: &'static str, body: Bytes) -> Response {
    let mut response = http::Response::new(Full::new(body));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}
