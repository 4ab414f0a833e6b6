//! Test response wrapper.

use crate::cookie::SetCookie;
use crate::error::TestError;
use bytes::Bytes;
use http::{header, HeaderMap, HeaderValue, StatusCode};
use serde::de::DeserializeOwned;
use std::fmt;
use testhost_middleware::{EXCEPTION_MESSAGE_HEADER, EXCEPTION_TYPE_HEADER, REQUEST_ID_HEADER};

/// A fully buffered response with helper methods for assertions.
///
/// Repeated headers are kept as sent; use [`headers_all`](Self::headers_all)
/// or [`set_cookies`](Self::set_cookies) to see every value.
#[derive(Clone)]
pub struct TestResponse {
    /// HTTP status code
    status: StatusCode,
    /// Response headers
    headers: HeaderMap,
    /// Response body bytes
    body: Bytes,
}

impl TestResponse {
    /// Creates a new test response from an HTTP response.
    ///
    /// # Errors
    ///
    /// Returns [`TestError::BodyRead`] if the body cannot be collected.
    pub async fn from_http<B>(response: http::Response<B>) -> Result<Self, TestError>
    where
        B: http_body_util::BodyExt,
        B::Error: fmt::Display,
    {
        let (parts, body) = response.into_parts();
        let body_bytes = body
            .collect()
            .await
            .map_err(|e| TestError::BodyRead(e.to_string()))?
            .to_bytes();

        Ok(Self {
            status: parts.status,
            headers: parts.headers,
            body: body_bytes,
        })
    }

    /// Creates a test response from raw parts.
    #[must_use]
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Returns the status code.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the status code as a u16.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    /// Returns true if the status is successful (2xx).
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Returns a reference to the headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Gets the first value of a header.
    #[must_use]
    pub fn header(&self, name: impl AsRef<str>) -> Option<&HeaderValue> {
        self.headers.get(name.as_ref())
    }

    /// Gets the first value of a header as a string.
    #[must_use]
    pub fn header_str(&self, name: impl AsRef<str>) -> Option<&str> {
        self.header(name).and_then(|v| v.to_str().ok())
    }

    /// Returns every value of a header, in the order sent.
    ///
    /// Values that are not visible ASCII are skipped.
    #[must_use]
    pub fn headers_all(&self, name: impl AsRef<str>) -> Vec<&str> {
        self.headers
            .get_all(name.as_ref())
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect()
    }

    /// Returns every `Set-Cookie` header that parses, in the order sent.
    #[must_use]
    pub fn set_cookies(&self) -> Vec<SetCookie> {
        self.headers_all(header::SET_COOKIE.as_str())
            .into_iter()
            .filter_map(SetCookie::parse)
            .collect()
    }

    /// Returns the first `Set-Cookie` with the given name.
    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<SetCookie> {
        self.set_cookies().into_iter().find(|c| c.name == name)
    }

    /// Returns the Content-Type header value.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header_str(header::CONTENT_TYPE.as_str())
    }

    /// Returns the request ID the pipeline assigned.
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        self.header_str(REQUEST_ID_HEADER)
    }

    /// Returns the fault type reported by the exception headers, if any.
    #[must_use]
    pub fn exception_type(&self) -> Option<&str> {
        self.header_str(EXCEPTION_TYPE_HEADER)
    }

    /// Returns the fault message reported by the exception headers, if any.
    #[must_use]
    pub fn exception_message(&self) -> Option<&str> {
        self.header_str(EXCEPTION_MESSAGE_HEADER)
    }

    /// Returns the raw body bytes.
    #[must_use]
    pub fn bytes(&self) -> &Bytes {
        &self.body
    }

    /// Returns the body as a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not valid UTF-8.
    pub fn text(&self) -> Result<String, TestError> {
        String::from_utf8(self.body.to_vec())
            .map_err(|e| TestError::BodyRead(format!("Invalid UTF-8: {e}")))
    }

    /// Deserializes the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`TestError::Json`] if the body does not deserialize into `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, TestError> {
        serde_json::from_slice(&self.body).map_err(TestError::Json)
    }

    // Assertion methods

    /// Asserts that the status code equals the expected value.
    ///
    /// # Panics
    ///
    /// Panics if the status code doesn't match.
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status, expected,
            "Expected status {}, got {} (exception: {:?})",
            expected,
            self.status,
            self.exception_message()
        );
        self
    }

    /// Asserts that the response is successful (2xx).
    ///
    /// # Panics
    ///
    /// Panics if the status is not 2xx.
    pub fn assert_success(&self) -> &Self {
        assert!(
            self.is_success(),
            "Expected success status, got {} (exception: {:?})",
            self.status,
            self.exception_message()
        );
        self
    }

    /// Asserts that a header exists with the expected value.
    ///
    /// # Panics
    ///
    /// Panics if the header doesn't exist or doesn't match.
    pub fn assert_header(&self, name: impl AsRef<str>, expected: impl AsRef<str>) -> &Self {
        let name = name.as_ref();
        let expected = expected.as_ref();
        let actual = self
            .header_str(name)
            .unwrap_or_else(|| panic!("Header '{name}' not found"));
        assert_eq!(
            actual, expected,
            "Header '{name}': expected '{expected}', got '{actual}'"
        );
        self
    }

    /// Asserts that the Content-Type header starts with `expected`.
    ///
    /// # Panics
    ///
    /// Panics if Content-Type is missing or doesn't match.
    pub fn assert_content_type(&self, expected: impl AsRef<str>) -> &Self {
        let expected = expected.as_ref();
        let actual = self
            .content_type()
            .unwrap_or_else(|| panic!("Content-Type header not found"));
        assert!(
            actual.starts_with(expected),
            "Content-Type: expected '{expected}', got '{actual}'"
        );
        self
    }

    /// Asserts a 500 response carrying the given exception type.
    ///
    /// # Panics
    ///
    /// Panics if the status is not 500 or the exception type differs.
    pub fn assert_exception(&self, expected_type: impl AsRef<str>) -> &Self {
        let expected_type = expected_type.as_ref();
        self.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        let actual = self
            .exception_type()
            .unwrap_or_else(|| panic!("Header '{EXCEPTION_TYPE_HEADER}' not found"));
        assert_eq!(
            actual, expected_type,
            "Exception type: expected '{expected_type}', got '{actual}'"
        );
        self
    }

    /// Asserts that the body contains the expected substring.
    ///
    /// # Panics
    ///
    /// Panics if the body is not UTF-8 or doesn't contain the substring.
    pub fn assert_body_contains(&self, expected: impl AsRef<str>) -> &Self {
        let expected = expected.as_ref();
        let body = self.text().unwrap_or_else(|e| panic!("{e}"));
        assert!(
            body.contains(expected),
            "Body should contain '{expected}', got: {body}"
        );
        self
    }

    /// Asserts that the body equals the expected string.
    ///
    /// # Panics
    ///
    /// Panics if the body doesn't match.
    pub fn assert_body_eq(&self, expected: impl AsRef<str>) -> &Self {
        let body = self.text().unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(body, expected.as_ref(), "Body mismatch");
        self
    }

    /// Asserts that a JSON field exists and equals the expected value.
    ///
    /// Paths are dot-separated; numeric segments index arrays.
    ///
    /// # Panics
    ///
    /// Panics if the field doesn't exist or doesn't match.
    pub fn assert_json_field(&self, path: impl AsRef<str>, expected: &serde_json::Value) -> &Self {
        let path = path.as_ref();
        let json: serde_json::Value = self.json().unwrap_or_else(|e| panic!("{e}"));
        let actual = json_path(&json, path)
            .unwrap_or_else(|| panic!("JSON path '{path}' not found in: {json}"));
        assert_eq!(
            actual, expected,
            "JSON field '{path}': expected {expected}, got {actual}"
        );
        self
    }
}

impl fmt::Debug for TestResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("body_len", &self.body.len())
            .finish()
    }
}

fn json_path<'a>(value: &'a serde_json::Value, path: &str) -> Option<&'a serde_json::Value> {
    let mut current = value;
    for segment in path.split('.').filter(|s| !s.is_empty()) {
        current = match segment.parse::<usize>() {
            Ok(index) => current.get(index)?,
            Err(_) => current.get(segment)?,
        };
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::Full;
    use serde_json::json;

    fn create_response(status: u16, body: &str) -> TestResponse {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        TestResponse::new(
            StatusCode::from_u16(status).unwrap(),
            headers,
            Bytes::from(body.to_string()),
        )
    }

    #[tokio::test]
    async fn test_from_http_preserves_repeated_headers() {
        let response = http::Response::builder()
            .status(StatusCode::OK)
            .header(header::SET_COOKIE, "a=1; path=/")
            .header(header::SET_COOKIE, "b=2; httponly")
            .header("x-trace", "one")
            .header("x-trace", "two")
            .body(Full::new(Bytes::from_static(b"done")))
            .unwrap();

        let response = TestResponse::from_http(response).await.unwrap();
        assert_eq!(response.headers_all("x-trace"), vec!["one", "two"]);
        let cookies = response.set_cookies();
        assert_eq!(cookies.len(), 2);
        assert_eq!(cookies[0].pair(), "a=1");
        assert!(cookies[1].http_only);
        assert_eq!(response.cookie("b").unwrap().value, "2");
        assert_eq!(response.text().unwrap(), "done");
    }

    #[test]
    fn test_status() {
        let response = create_response(200, "{}");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.status_code(), 200);
        assert!(response.is_success());
        assert!(!create_response(404, "{}").is_success());
    }

    #[test]
    fn test_header() {
        let response = create_response(200, "{}");
        assert_eq!(response.header_str("Content-Type"), Some("application/json"));
        assert!(response.headers_all("missing").is_empty());
    }

    #[test]
    fn test_json() {
        let response = create_response(200, "{\"name\":\"Alice\",\"age\":30}");
        let value: serde_json::Value = response.json().unwrap();
        assert_eq!(value["name"], "Alice");
        assert_eq!(value["age"], 30);
    }

    #[test]
    fn test_invalid_json_is_error() {
        let response = create_response(200, "not json");
        assert!(matches!(response.json::<serde_json::Value>(), Err(TestError::Json(_))));
    }

    #[test]
    fn test_exception_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(EXCEPTION_TYPE_HEADER, HeaderValue::from_static("LoaderError"));
        headers.insert(EXCEPTION_MESSAGE_HEADER, HeaderValue::from_static("view not found"));
        let response = TestResponse::new(StatusCode::INTERNAL_SERVER_ERROR, headers, Bytes::new());

        response.assert_exception("LoaderError");
        assert_eq!(response.exception_message(), Some("view not found"));
    }

    #[test]
    #[should_panic(expected = "Expected status 200 OK")]
    fn test_assert_status_panics() {
        create_response(500, "{}").assert_status(StatusCode::OK);
    }

    #[test]
    fn test_assertions_chain() {
        create_response(201, "{\"user\":{\"name\":\"Alice\",\"tags\":[\"admin\"]}}")
            .assert_success()
            .assert_header("Content-Type", "application/json")
            .assert_content_type("application/json")
            .assert_body_contains("Alice")
            .assert_json_field("user.name", &json!("Alice"))
            .assert_json_field("user.tags.0", &json!("admin"));
    }

    #[test]
    fn test_json_path() {
        let value = json!({"user": {"tags": ["admin", "user"]}});
        assert_eq!(json_path(&value, "user.tags.1"), Some(&json!("user")));
        assert_eq!(json_path(&value, "nonexistent"), None);
    }
}
