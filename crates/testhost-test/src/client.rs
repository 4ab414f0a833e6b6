//! Test client for in-memory HTTP testing.

use crate::antiforgery::AntiforgeryCookie;
use crate::cookie::CookieJar;
use crate::error::TestError;
use crate::request::TestRequest;
use crate::response::TestResponse;
use bytes::Bytes;
use http::Method;
use serde::Serialize;
use testhost_server::TestServer;

/// A client sending requests to a [`TestServer`] without a network.
///
/// Relative URLs resolve against the server's base URL unless
/// [`with_base_url`](Self::with_base_url) overrides it. Clones share the
/// server and, when enabled, the cookie jar.
///
/// # Example
///
/// ```ignore
/// use testhost_test::TestClient;
///
/// let client = TestClient::new(server)
///     .with_default_header("Accept", "text/html")
///     .with_cookie_jar();
///
/// let response = client.get("/Home/Index").send().await?;
/// response.assert_status(http::StatusCode::OK);
/// ```
#[derive(Debug, Clone)]
#[must_use]
pub struct TestClient {
    server: TestServer,
    base_url: String,
    default_headers: Vec<(String, String)>,
    cookies: Option<CookieJar>,
}

impl TestClient {
    /// Creates a client for `server`.
    pub fn new(server: TestServer) -> Self {
        let base_url = server.base_url().to_string();
        Self {
            server,
            base_url,
            default_headers: Vec::new(),
            cookies: None,
        }
    }

    /// Adds a header sent with every request that does not set it itself.
    pub fn with_default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// Resolves relative URLs against `base_url` instead of the server's.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Stores response cookies and replays them on later requests.
    pub fn with_cookie_jar(self) -> Self {
        self.with_shared_cookie_jar(CookieJar::new())
    }

    /// Uses `jar` for cookies, shared with whoever else holds it.
    pub fn with_shared_cookie_jar(mut self, jar: CookieJar) -> Self {
        self.cookies = Some(jar);
        self
    }

    /// Returns the cookie jar, if enabled.
    #[must_use]
    pub fn cookie_jar(&self) -> Option<&CookieJar> {
        self.cookies.as_ref()
    }

    /// Returns the server.
    #[must_use]
    pub fn server(&self) -> &TestServer {
        &self.server
    }

    /// Returns the base URL relative requests resolve against.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Creates a GET request builder.
    pub fn get(&self, url: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::GET, url)
    }

    /// Creates a POST request builder.
    pub fn post(&self, url: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::POST, url)
    }

    /// Creates a PUT request builder.
    pub fn put(&self, url: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::PUT, url)
    }

    /// Creates a PATCH request builder.
    pub fn patch(&self, url: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::PATCH, url)
    }

    /// Creates a DELETE request builder.
    pub fn delete(&self, url: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::DELETE, url)
    }

    /// Creates an OPTIONS request builder.
    pub fn options(&self, url: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::OPTIONS, url)
    }

    /// Creates a HEAD request builder.
    pub fn head(&self, url: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::HEAD, url)
    }

    /// Creates a request builder with any method.
    pub fn request(&self, method: Method, url: impl AsRef<str>) -> TestClientRequest<'_> {
        TestClientRequest {
            client: self,
            request: TestRequest::new(method, url),
        }
    }

    /// GETs `url` and returns the body of a successful response.
    ///
    /// # Errors
    ///
    /// Returns [`TestError::Processing`] for a non-2xx status, or any error
    /// from [`send`](Self::send).
    pub async fn get_string(&self, url: impl AsRef<str>) -> Result<String, TestError> {
        let response = self.get(url).send().await?;
        if !response.is_success() {
            return Err(TestError::Processing(format!(
                "GET returned {} (exception: {:?})",
                response.status(),
                response.exception_message()
            )));
        }
        response.text()
    }

    /// Sends a request and buffers the response.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be built, the server has shut
    /// down, or the body cannot be read.
    pub async fn send(&self, request: TestRequest) -> Result<TestResponse, TestError> {
        let mut request = request;
        for (name, value) in &self.default_headers {
            if !request.headers().contains_key(name.as_str()) {
                request = request.header(name, value);
            }
        }
        if let Some(jar) = &self.cookies {
            request = request.with_jar(jar);
        }

        let request = request.build(&self.base_url)?;
        let response = self.server.send(request).await?;
        let response = TestResponse::from_http(response).await?;

        if let Some(jar) = &self.cookies {
            jar.store_all(&response.set_cookies());
        }
        Ok(response)
    }
}

/// A request builder bound to a test client.
#[must_use]
pub struct TestClientRequest<'a> {
    client: &'a TestClient,
    request: TestRequest,
}

impl TestClientRequest<'_> {
    /// Appends a header.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.request = self.request.header(name, value);
        self
    }

    /// Sets a header, replacing earlier values.
    pub fn set_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.request = self.request.set_header(name, value);
        self
    }

    /// Adds a cookie.
    pub fn cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request = self.request.cookie(name, value);
        self
    }

    /// Sets the Content-Type header.
    pub fn content_type(mut self, content_type: impl AsRef<str>) -> Self {
        self.request = self.request.content_type(content_type);
        self
    }

    /// Sets the Accept header.
    pub fn accept(mut self, accept: impl AsRef<str>) -> Self {
        self.request = self.request.accept(accept);
        self
    }

    /// Sets the raw request body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.request = self.request.body(body);
        self
    }

    /// Sets the raw request body with an explicit media type.
    pub fn raw(mut self, body: impl Into<Bytes>, media_type: impl AsRef<str>) -> Self {
        self.request = self.request.raw(body, media_type);
        self
    }

    /// Sets the request body as JSON.
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        self.request = self.request.json(value);
        self
    }

    /// Sets the request body as form-urlencoded pairs.
    pub fn form<I, K, V>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.request = self.request.form(fields);
        self
    }

    /// Attaches an anti-forgery cookie and token header.
    pub fn antiforgery(mut self, cookie: &AntiforgeryCookie, token: impl AsRef<str>) -> Self {
        self.request = self.request.antiforgery(cookie, token);
        self
    }

    /// Sends the request.
    ///
    /// # Errors
    ///
    /// See [`TestClient::send`].
    pub async fn send(self) -> Result<TestResponse, TestError> {
        self.client.send(self.request).await
    }
}
