//! What an endpoint handler sees of a request.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use http::header::{AsHeaderName, COOKIE, CONTENT_TYPE};
use http::request::Parts;
use http::{HeaderMap, Method, Uri};
use serde::de::DeserializeOwned;
use testhost_core::{InjectionError, RequestId, ServiceScope};
use testhost_router::Params;

use crate::handler::HandlerError;

/// A routed request handed to an endpoint handler.
///
/// The context owns the buffered body and a handle to the request's
/// service scope. Scoped services resolved through it are the same
/// instances the middleware stages of this request saw.
pub struct EndpointContext {
    parts: Parts,
    body: Bytes,
    params: Params,
    request_id: RequestId,
    operation_id: String,
    services: Arc<ServiceScope>,
}

impl EndpointContext {
    pub(crate) fn new(
        parts: Parts,
        body: Bytes,
        params: Params,
        request_id: RequestId,
        operation_id: String,
        services: Arc<ServiceScope>,
    ) -> Self {
        Self {
            parts,
            body,
            params,
            request_id,
            operation_id,
            services,
        }
    }

    /// Returns the request method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.parts.method
    }

    /// Returns the request URI.
    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.parts.uri
    }

    /// Returns the request path.
    #[must_use]
    pub fn path(&self) -> &str {
        self.parts.uri.path()
    }

    /// Returns the raw query string.
    #[must_use]
    pub fn query(&self) -> Option<&str> {
        self.parts.uri.query()
    }

    /// Returns the first decoded query value for `name`.
    #[must_use]
    pub fn query_value(&self, name: &str) -> Option<String> {
        parse_urlencoded(self.query()?)
            .into_iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    /// Returns the request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.parts.headers
    }

    /// Returns the first value of a header, if it is valid text.
    #[must_use]
    pub fn header<K: AsHeaderName>(&self, name: K) -> Option<&str> {
        self.parts.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns every value of a header, in the order they were sent.
    #[must_use]
    pub fn header_all<K: AsHeaderName>(&self, name: K) -> Vec<&str> {
        self.parts
            .headers
            .get_all(name)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect()
    }

    /// Returns the declared media type of the body.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header(CONTENT_TYPE)
    }

    /// Returns the value of a request cookie.
    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.header_all(COOKIE)
            .into_iter()
            .flat_map(|line| line.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value)
    }

    /// Returns the raw body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the body as UTF-8 text.
    pub fn text(&self) -> Result<&str, HandlerError> {
        Ok(std::str::from_utf8(&self.body)?)
    }

    /// Deserializes a JSON body.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, HandlerError> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Decodes an `application/x-www-form-urlencoded` body.
    ///
    /// Repeated keys are kept in order.
    pub fn form(&self) -> Result<Vec<(String, String)>, HandlerError> {
        Ok(parse_urlencoded(self.text()?))
    }

    /// Returns the first form field named `name`.
    pub fn form_value(&self, name: &str) -> Result<Option<String>, HandlerError> {
        Ok(self
            .form()?
            .into_iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value))
    }

    /// Returns a route parameter, matching the name exactly first and then
    /// ignoring ASCII case.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .get(name)
            .or_else(|| self.params.get_ignore_case(name))
    }

    /// Returns every captured route parameter.
    #[must_use]
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Returns the lowercased format extension, as in `/products/7.json`.
    #[must_use]
    pub fn format(&self) -> Option<&str> {
        self.params.get("format")
    }

    /// Returns the request's correlation ID.
    #[must_use]
    pub fn request_id(&self) -> &RequestId {
        &self.request_id
    }

    /// Returns the operation ID the router chose.
    #[must_use]
    pub fn operation_id(&self) -> &str {
        &self.operation_id
    }

    /// Returns the request's service scope.
    #[must_use]
    pub fn services(&self) -> &ServiceScope {
        &self.services
    }

    /// Resolves a service within the request scope.
    pub fn resolve<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, InjectionError> {
        self.services.resolve_required()
    }
}

impl fmt::Debug for EndpointContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointContext")
            .field("method", self.method())
            .field("uri", self.uri())
            .field("operation_id", &self.operation_id)
            .field("request_id", &self.request_id)
            .field("body_len", &self.body.len())
            .finish_non_exhaustive()
    }
}

/// Splits `a=1&b=two+words` into decoded pairs.
pub(crate) fn parse_urlencoded(input: &str) -> Vec<(String, String)> {
    input
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (decode_component(key), decode_component(value))
        })
        .collect()
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced).map_or_else(|_| spaced.clone(), Cow::into_owned)
}

#[cfg(test)]
pub(crate) fn test_context(uri: &str, operation_id: &str) -> EndpointContext {
    let (parts, ()) = http::Request::builder()
        .uri(uri)
        .body(())
        .unwrap()
        .into_parts();
    let scope = testhost_core::ServiceCollection::new().build().create_scope();
    EndpointContext::new(
        parts,
        Bytes::new(),
        Params::new(),
        RequestId::from("test"),
        operation_id.to_string(),
        Arc::new(scope),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use testhost_core::ServiceCollection;

    fn context_with(request: http::Request<&'static str>, params: Params) -> EndpointContext {
        let (parts, body) = request.into_parts();
        let mut services = ServiceCollection::new();
        services.add_scoped(|_| Ok(String::from("scoped value")));
        let scope = services.build().create_scope();
        EndpointContext::new(
            parts,
            Bytes::from_static(body.as_bytes()),
            params,
            RequestId::from("ctx-1"),
            "Forms.Submit".to_string(),
            Arc::new(scope),
        )
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Product {
        id: u32,
        name: String,
    }

    #[test]
    fn test_query_values_are_decoded() {
        let ctx = context_with(
            http::Request::get("/search?q=two+words&tag=a%26b&q=ignored")
                .body("")
                .unwrap(),
            Params::new(),
        );
        assert_eq!(ctx.path(), "/search");
        assert_eq!(ctx.query_value("q").as_deref(), Some("two words"));
        assert_eq!(ctx.query_value("tag").as_deref(), Some("a&b"));
        assert!(ctx.query_value("missing").is_none());
    }

    #[test]
    fn test_form_body() {
        let ctx = context_with(
            http::Request::post("/forms")
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body("Name=Jane+Doe&__RequestVerificationToken=abc%3D%3D&Name=second")
                .unwrap(),
            Params::new(),
        );
        let form = ctx.form().unwrap();
        assert_eq!(form.len(), 3);
        assert_eq!(ctx.form_value("Name").unwrap().as_deref(), Some("Jane Doe"));
        assert_eq!(
            ctx.form_value("__RequestVerificationToken").unwrap().as_deref(),
            Some("abc==")
        );
        assert_eq!(ctx.content_type(), Some("application/x-www-form-urlencoded"));
    }

    #[test]
    fn test_json_body() {
        let ctx = context_with(
            http::Request::post("/products")
                .body(r#"{"id":7,"name":"Chai"}"#)
                .unwrap(),
            Params::new(),
        );
        let product: Product = ctx.json().unwrap();
        assert_eq!(product, Product { id: 7, name: "Chai".into() });

        let err = ctx.json::<Vec<u8>>().unwrap_err();
        assert!(err.type_name().contains("serde_json"));
    }

    #[test]
    fn test_cookies_across_headers() {
        let ctx = context_with(
            http::Request::get("/")
                .header(COOKIE, "a=1; session=xyz")
                .header(COOKIE, "theme=dark")
                .body("")
                .unwrap(),
            Params::new(),
        );
        assert_eq!(ctx.cookie("session"), Some("xyz"));
        assert_eq!(ctx.cookie("theme"), Some("dark"));
        assert!(ctx.cookie("missing").is_none());
        assert_eq!(ctx.header_all(COOKIE).len(), 2);
    }

    #[test]
    fn test_params_and_format() {
        let mut params = Params::new();
        params.push("id", "7");
        params.push("format", "json");
        let ctx = context_with(http::Request::get("/products/7.JSON").body("").unwrap(), params);

        assert_eq!(ctx.param("id"), Some("7"));
        assert_eq!(ctx.param("ID"), Some("7"));
        assert_eq!(ctx.format(), Some("json"));
        assert_eq!(ctx.params().len(), 2);
    }

    #[test]
    fn test_resolves_scoped_services() {
        let ctx = context_with(http::Request::get("/").body("").unwrap(), Params::new());
        let first = ctx.resolve::<String>().unwrap();
        let second = ctx.resolve::<String>().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(ctx.resolve::<u64>().is_err());
        assert_eq!(ctx.request_id().as_str(), "ctx-1");
        assert_eq!(ctx.operation_id(), "Forms.Submit");
    }

    #[test]
    fn test_parse_urlencoded_edge_cases() {
        assert!(parse_urlencoded("").is_empty());
        assert_eq!(
            parse_urlencoded("flag&&k="),
            vec![("flag".to_string(), String::new()), ("k".to_string(), String::new())]
        );
        assert_eq!(parse_urlencoded("bad=%FF")[0].1, "%FF");
    }
}
