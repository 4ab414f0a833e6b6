//! The route table: paths to operation IDs to handlers.

use std::fmt;
use std::future::Future;

use http::Method;
use testhost_router::{MethodRouter, RouteOutcome, Router};

use crate::endpoint::EndpointContext;
use crate::handler::{erase, ErasedHandler, HandlerRegistry, HandlerResult};

/// Routes and handlers of one application.
///
/// Mapping the same method and path twice keeps the first mapping.
///
/// # Example
///
/// ```rust
/// use http::Method;
/// use testhost_server::{responses, RouteTable};
///
/// let mut routes = RouteTable::new();
/// routes.get("/Home/Index", |_ctx| async { Ok(responses::text("Hello")) });
/// routes.map_named(Method::POST, "/Home/Index", "Home.Post", |_ctx| async {
///     Ok(responses::text("Posted"))
/// });
///
/// assert_eq!(routes.len(), 2);
/// assert!(routes.handler("GET /Home/Index").is_some());
/// assert!(routes.handler("Home.Post").is_some());
/// ```
#[derive(Default, Clone)]
pub struct RouteTable {
    router: Router,
    handlers: HandlerRegistry,
}

impl RouteTable {
    /// Creates an empty route table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps a method and path template, naming the operation
    /// `"{METHOD} {path}"`.
    pub fn map<F, Fut>(&mut self, method: Method, path: &str, handler: F) -> &mut Self
    where
        F: Fn(EndpointContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        let operation_id = format!("{method} {path}");
        self.map_erased(method, path, operation_id, erase(handler))
    }

    /// Maps a method and path template under an explicit operation ID.
    pub fn map_named<F, Fut>(
        &mut self,
        method: Method,
        path: &str,
        operation_id: impl Into<String>,
        handler: F,
    ) -> &mut Self
    where
        F: Fn(EndpointContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.map_erased(method, path, operation_id.into(), erase(handler))
    }

    /// Maps an already-erased handler.
    pub fn map_erased(
        &mut self,
        method: Method,
        path: &str,
        operation_id: String,
        handler: ErasedHandler,
    ) -> &mut Self {
        if self.handlers.contains(&operation_id) {
            tracing::debug!(operation_id = %operation_id, "operation already mapped; keeping the first");
            return self;
        }
        self.router
            .insert(path, MethodRouter::new().method(&method, operation_id.clone()));
        self.handlers.register_erased(operation_id, handler);
        self
    }

    /// Maps a GET route.
    pub fn get<F, Fut>(&mut self, path: &str, handler: F) -> &mut Self
    where
        F: Fn(EndpointContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.map(Method::GET, path, handler)
    }

    /// Maps a POST route.
    pub fn post<F, Fut>(&mut self, path: &str, handler: F) -> &mut Self
    where
        F: Fn(EndpointContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.map(Method::POST, path, handler)
    }

    /// Maps a PUT route.
    pub fn put<F, Fut>(&mut self, path: &str, handler: F) -> &mut Self
    where
        F: Fn(EndpointContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.map(Method::PUT, path, handler)
    }

    /// Maps a DELETE route.
    pub fn delete<F, Fut>(&mut self, path: &str, handler: F) -> &mut Self
    where
        F: Fn(EndpointContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.map(Method::DELETE, path, handler)
    }

    /// Routes a request to an operation.
    #[must_use]
    pub fn route_request(&self, method: &Method, path: &str) -> RouteOutcome<'_> {
        self.router.route_request(method, path)
    }

    /// Returns the handler for an operation.
    #[must_use]
    pub fn handler(&self, operation_id: &str) -> Option<&ErasedHandler> {
        self.handlers.get(operation_id)
    }

    /// Returns the mapped operation IDs, sorted.
    #[must_use]
    pub fn operation_ids(&self) -> Vec<&str> {
        self.handlers.operation_ids()
    }

    /// Returns the number of mapped operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns `true` if nothing is mapped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteTable")
            .field("operations", &self.operation_ids())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::responses;

    fn table() -> RouteTable {
        let mut routes = RouteTable::new();
        routes
            .get("/products/{id}.{format}", |_ctx| async { Ok(responses::text("one")) })
            .post("/products", |_ctx| async { Ok(responses::text("created")) })
            .get("/products", |_ctx| async { Ok(responses::text("all")) });
        routes
    }

    #[test]
    fn test_auto_operation_ids() {
        let routes = table();
        assert_eq!(
            routes.operation_ids(),
            vec!["GET /products", "GET /products/{id}.{format}", "POST /products"]
        );
    }

    #[test]
    fn test_route_request_matches_extension_case_insensitively() {
        let routes = table();
        match routes.route_request(&Method::GET, "/Products/7.JSON") {
            RouteOutcome::Matched(m) => {
                assert_eq!(m.operation_id, "GET /products/{id}.{format}");
                assert_eq!(m.params.get("format"), Some("json"));
            }
            other => panic!("expected a match, got {other:?}"),
        }
    }

    #[test]
    fn test_method_not_allowed_lists_methods() {
        let routes = table();
        match routes.route_request(&Method::DELETE, "/products") {
            RouteOutcome::MethodNotAllowed { allowed } => {
                assert!(allowed.contains(&Method::GET));
                assert!(allowed.contains(&Method::POST));
            }
            other => panic!("expected 405, got {other:?}"),
        }
        assert_eq!(
            routes.route_request(&Method::GET, "/missing"),
            RouteOutcome::NotFound
        );
    }

    #[test]
    fn test_first_mapping_wins() {
        let mut routes = RouteTable::new();
        routes.map_named(Method::GET, "/a", "A", |_ctx| async { Ok(responses::text("first")) });
        routes.map_named(Method::GET, "/b", "A", |_ctx| async { Ok(responses::text("second")) });
        assert_eq!(routes.len(), 1);
        assert_eq!(
            routes.route_request(&Method::GET, "/b"),
            RouteOutcome::NotFound
        );
    }
}
