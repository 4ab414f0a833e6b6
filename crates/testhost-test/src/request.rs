//! Test request building.

use bytes::Bytes;
use http::{header, HeaderMap, HeaderName, HeaderValue, Method};
use http_body_util::Full;
use serde::Serialize;
use testhost_config::DEFAULT_BASE_URL;
use testhost_server::Request;

use crate::antiforgery::{self, AntiforgeryCookie};
use crate::cookie::CookieJar;
use crate::error::TestError;

/// Media type for form posts.
pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// Builder for requests sent through a [`TestClient`](crate::TestClient).
///
/// Invalid header names or values do not panic; the first problem is kept
/// and reported by [`build`](Self::build).
///
/// # Example
///
/// ```
/// use testhost_test::TestRequest;
///
/// let request = TestRequest::post("/SimpleForms")
///     .header("Accept", "text/html")
///     .cookie("session", "abc")
///     .form([("Name", "Jane Doe"), ("Age", "42")])
///     .build("http://localhost")
///     .unwrap();
///
/// assert_eq!(request.uri(), "http://localhost/SimpleForms");
/// assert_eq!(request.headers()["cookie"], "session=abc");
/// ```
#[derive(Debug)]
#[must_use]
pub struct TestRequest {
    method: Method,
    url: String,
    headers: HeaderMap,
    cookies: Vec<(String, String)>,
    body: Bytes,
    error: Option<TestError>,
}

impl TestRequest {
    /// Creates a request with any method.
    pub fn new(method: Method, url: impl AsRef<str>) -> Self {
        Self {
            method,
            url: url.as_ref().to_string(),
            headers: HeaderMap::new(),
            cookies: Vec::new(),
            body: Bytes::new(),
            error: None,
        }
    }

    /// Creates a new GET request.
    pub fn get(url: impl AsRef<str>) -> Self {
        Self::new(Method::GET, url)
    }

    /// Creates a new POST request.
    pub fn post(url: impl AsRef<str>) -> Self {
        Self::new(Method::POST, url)
    }

    /// Creates a new PUT request.
    pub fn put(url: impl AsRef<str>) -> Self {
        Self::new(Method::PUT, url)
    }

    /// Creates a new PATCH request.
    pub fn patch(url: impl AsRef<str>) -> Self {
        Self::new(Method::PATCH, url)
    }

    /// Creates a new DELETE request.
    pub fn delete(url: impl AsRef<str>) -> Self {
        Self::new(Method::DELETE, url)
    }

    /// Creates a new OPTIONS request.
    pub fn options(url: impl AsRef<str>) -> Self {
        Self::new(Method::OPTIONS, url)
    }

    /// Creates a new HEAD request.
    pub fn head(url: impl AsRef<str>) -> Self {
        Self::new(Method::HEAD, url)
    }

    /// Returns the method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the URL as given, before it is made absolute.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the headers added so far.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Appends a header, keeping earlier values of the same name.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        if let Some((name, value)) = self.parse_header(name.as_ref(), value.as_ref()) {
            self.headers.append(name, value);
        }
        self
    }

    /// Sets a header, replacing earlier values of the same name.
    pub fn set_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        if let Some((name, value)) = self.parse_header(name.as_ref(), value.as_ref()) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Adds a cookie; all cookies are sent in one `Cookie` header.
    pub fn cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.push((name.into(), value.into()));
        self
    }

    /// Adds the jar's cookies that the request does not already set.
    pub(crate) fn with_jar(mut self, jar: &CookieJar) -> Self {
        for (name, value) in jar.pairs() {
            if !self.cookies.iter().any(|(existing, _)| *existing == name) {
                self.cookies.push((name, value));
            }
        }
        self
    }

    /// Attaches an anti-forgery cookie and sends `token` in the
    /// `RequestVerificationToken` header.
    pub fn antiforgery(self, cookie: &AntiforgeryCookie, token: impl AsRef<str>) -> Self {
        self.cookie(cookie.name.clone(), cookie.value.clone())
            .set_header(antiforgery::HEADER_NAME, token)
    }

    /// Sets the Content-Type header.
    pub fn content_type(self, content_type: impl AsRef<str>) -> Self {
        self.set_header(header::CONTENT_TYPE.as_str(), content_type)
    }

    /// Sets the Accept header.
    pub fn accept(self, accept: impl AsRef<str>) -> Self {
        self.set_header(header::ACCEPT.as_str(), accept)
    }

    /// Sets the raw request body without touching Content-Type.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Sets the raw request body with an explicit media type.
    pub fn raw(self, body: impl Into<Bytes>, media_type: impl AsRef<str>) -> Self {
        self.body(body).content_type(media_type)
    }

    /// Sets a UTF-8 text body.
    pub fn text(self, body: impl Into<String>) -> Self {
        self.raw(body.into(), "text/plain; charset=utf-8")
    }

    /// Sets the request body as JSON.
    ///
    /// This also sets the `Content-Type` header to `application/json`.
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(bytes) => self.raw(bytes, "application/json"),
            Err(e) => {
                self.error.get_or_insert(TestError::Json(e));
                self
            }
        }
    }

    /// Sets the request body as form-urlencoded pairs, in order.
    ///
    /// This also sets the `Content-Type` header to
    /// `application/x-www-form-urlencoded`.
    pub fn form<I, K, V>(self, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let encoded = fields
            .into_iter()
            .map(|(key, value)| format!("{}={}", encode_form(key.as_ref()), encode_form(value.as_ref())))
            .collect::<Vec<_>>()
            .join("&");
        self.raw(encoded, FORM_URLENCODED)
    }

    /// Builds the HTTP request, resolving a relative URL against `base_url`.
    ///
    /// # Errors
    ///
    /// Returns the first header or body error recorded while building, or
    /// [`TestError::RequestBuild`] if the resolved URL is invalid.
    pub fn build(self, base_url: &str) -> Result<Request, TestError> {
        if let Some(error) = self.error {
            return Err(error);
        }

        let url = absolute_url(base_url, &self.url);
        let uri: http::Uri = url
            .parse()
            .map_err(|e| TestError::RequestBuild(format!("Invalid URI '{url}': {e}")))?;

        let mut headers = self.headers;
        if !headers.contains_key(header::HOST) {
            if let Some(authority) = uri.authority() {
                let host = HeaderValue::from_str(authority.as_str())
                    .map_err(|e| TestError::InvalidHeader(e.to_string()))?;
                headers.insert(header::HOST, host);
            }
        }
        if !self.cookies.is_empty() || headers.get_all(header::COOKIE).iter().count() > 1 {
            let value = merge_cookie_header(&headers, &self.cookies)?;
            headers.insert(header::COOKIE, value);
        }

        let mut request = http::Request::builder()
            .method(self.method)
            .uri(uri)
            .body(Full::new(self.body))
            .map_err(|e| TestError::RequestBuild(e.to_string()))?;
        *request.headers_mut() = headers;
        Ok(request)
    }

    fn parse_header(&mut self, name: &str, value: &str) -> Option<(HeaderName, HeaderValue)> {
        let parsed = HeaderName::try_from(name)
            .map_err(|e| TestError::InvalidHeader(format!("{name}: {e}")))
            .and_then(|name| {
                HeaderValue::try_from(value)
                    .map(|value| (name, value))
                    .map_err(|e| TestError::InvalidHeader(format!("{value}: {e}")))
            });
        match parsed {
            Ok(pair) => Some(pair),
            Err(error) => {
                self.error.get_or_insert(error);
                None
            }
        }
    }
}

/// Resolves `url` against `base_url` unless it is already absolute.
#[must_use]
pub fn absolute_url(base_url: &str, url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        return url.to_string();
    }
    let base = if base_url.is_empty() { DEFAULT_BASE_URL } else { base_url };
    let base = base.trim_end_matches('/');
    if url.starts_with('/') {
        format!("{base}{url}")
    } else {
        format!("{base}/{url}")
    }
}

/// Joins any `Cookie` headers already set with the builder's cookies into
/// one header value.
fn merge_cookie_header(
    headers: &HeaderMap,
    cookies: &[(String, String)],
) -> Result<HeaderValue, TestError> {
    let mut pairs = Vec::new();
    for value in headers.get_all(header::COOKIE) {
        let value = value
            .to_str()
            .map_err(|e| TestError::InvalidHeader(format!("cookie: {e}")))?
            .trim()
            .trim_end_matches(';');
        if !value.is_empty() {
            pairs.push(value.to_string());
        }
    }
    pairs.extend(cookies.iter().map(|(name, value)| format!("{name}={value}")));
    HeaderValue::from_str(&pairs.join("; ")).map_err(|e| TestError::InvalidHeader(e.to_string()))
}

fn encode_form(value: &str) -> String {
    urlencoding::encode(value).replace("%20", "+")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const BASE: &str = "http://localhost";

    #[test]
    fn test_relative_urls_made_absolute() {
        assert_eq!(absolute_url(BASE, "/users"), "http://localhost/users");
        assert_eq!(absolute_url(BASE, "users?id=1"), "http://localhost/users?id=1");
        assert_eq!(absolute_url("http://example.test/", "/a"), "http://example.test/a");
        assert_eq!(absolute_url("", "a"), "http://localhost/a");
        assert_eq!(absolute_url(BASE, "https://other.test/x"), "https://other.test/x");
    }

    #[test]
    fn test_build_sets_host() {
        let request = TestRequest::get("/Home/Index").build(BASE).unwrap();
        assert_eq!(request.method(), Method::GET);
        assert_eq!(request.uri().path(), "/Home/Index");
        assert_eq!(request.headers()[header::HOST], "localhost");
    }

    #[test]
    fn test_custom_method() {
        let request = TestRequest::new(Method::from_bytes(b"PROPFIND").unwrap(), "/dav")
            .build(BASE)
            .unwrap();
        assert_eq!(request.method().as_str(), "PROPFIND");
    }

    #[test]
    fn test_header_appends() {
        let request = TestRequest::get("/")
            .header("Accept-Language", "en")
            .header("Accept-Language", "fr")
            .build(BASE)
            .unwrap();
        let values: Vec<_> = request.headers().get_all("accept-language").iter().collect();
        assert_eq!(values, vec!["en", "fr"]);
    }

    #[test]
    fn test_set_header_replaces() {
        let request = TestRequest::get("/")
            .header("RequestId", "one")
            .set_header("RequestId", "two")
            .build(BASE)
            .unwrap();
        assert_eq!(request.headers().get_all("requestid").iter().count(), 1);
        assert_eq!(request.headers()["requestid"], "two");
    }

    #[test]
    fn test_cookies_joined() {
        let request = TestRequest::get("/")
            .cookie("a", "1")
            .cookie("b", "2")
            .build(BASE)
            .unwrap();
        assert_eq!(request.headers()[header::COOKIE], "a=1; b=2");
    }

    #[test]
    fn test_raw_cookie_header_merged_with_cookies() {
        let request = TestRequest::get("/")
            .header("Cookie", "raw=1;")
            .cookie("a", "2")
            .build(BASE)
            .unwrap();
        let values: Vec<_> = request.headers().get_all(header::COOKIE).iter().collect();
        assert_eq!(values, vec!["raw=1; a=2"]);
    }

    #[test]
    fn test_repeated_cookie_headers_merged() {
        let request = TestRequest::get("/")
            .header("Cookie", "x=1")
            .header("Cookie", "y=2")
            .build(BASE)
            .unwrap();
        assert_eq!(request.headers().get_all(header::COOKIE).iter().count(), 1);
        assert_eq!(request.headers()[header::COOKIE], "x=1; y=2");
    }

    #[test]
    fn test_jar_cookies_do_not_override_explicit() {
        let jar = CookieJar::new();
        jar.insert("session", "from-jar");
        jar.insert("theme", "dark");
        let request = TestRequest::get("/")
            .cookie("session", "explicit")
            .with_jar(&jar)
            .build(BASE)
            .unwrap();
        assert_eq!(request.headers()[header::COOKIE], "session=explicit; theme=dark");
    }

    #[test]
    fn test_antiforgery_header_and_cookie() {
        let cookie = AntiforgeryCookie {
            name: ".AspNetCore.Antiforgery.abc".to_string(),
            value: "CfDJ8".to_string(),
        };
        let request = TestRequest::post("/HandlerTestPage")
            .antiforgery(&cookie, "form-token")
            .build(BASE)
            .unwrap();
        assert_eq!(request.headers()["requestverificationtoken"], "form-token");
        assert_eq!(request.headers()[header::COOKIE], ".AspNetCore.Antiforgery.abc=CfDJ8");
    }

    #[test]
    fn test_json_body() {
        let request = TestRequest::post("/api/products").json(&json!({"name": "Widget"}));
        assert_eq!(request.headers()[header::CONTENT_TYPE], "application/json");
        assert_eq!(request.body, Bytes::from_static(b"{\"name\":\"Widget\"}"));
    }

    #[test]
    fn test_form_body() {
        let request = TestRequest::post("/SimpleForms").form([("Name", "Jane Doe"), ("q", "a&b")]);
        assert_eq!(request.headers()[header::CONTENT_TYPE], FORM_URLENCODED);
        assert_eq!(request.body, Bytes::from_static(b"Name=Jane+Doe&q=a%26b"));
    }

    #[test]
    fn test_raw_body_with_media_type() {
        let request = TestRequest::post("/upload").raw("<x/>", "application/xml");
        assert_eq!(request.headers()[header::CONTENT_TYPE], "application/xml");
        assert_eq!(request.body, Bytes::from_static(b"<x/>"));
    }

    #[test]
    fn test_invalid_header_reported_on_build() {
        let err = TestRequest::get("/")
            .header("bad header", "value")
            .header("also bad", "value")
            .build(BASE)
            .unwrap_err();
        match err {
            TestError::InvalidHeader(msg) => assert!(msg.contains("bad header")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_url_rejected() {
        let err = TestRequest::get("/has space").build(BASE).unwrap_err();
        assert!(matches!(err, TestError::RequestBuild(_)));
    }
}
