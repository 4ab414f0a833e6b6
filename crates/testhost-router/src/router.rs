//! High-level router API.

use http::Method;

use crate::method_router::MethodRouter;
use crate::node::Node;
use crate::params::Params;
use crate::RouteMatch;

/// Outcome of routing a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome<'a> {
    /// An endpoint serves the method and path.
    Matched(RouteMatch<'a>),
    /// The path exists but not for this method.
    MethodNotAllowed {
        /// Methods the path does answer.
        allowed: Vec<Method>,
    },
    /// No route matches the path.
    NotFound,
}

/// A radix tree router mapping `(method, path)` to endpoint names.
///
/// # Example
///
/// ```rust
/// use testhost_router::{MethodRouter, RouteOutcome, Router};
/// use http::Method;
///
/// let mut router = Router::new();
/// router.insert("/Home/Index", MethodRouter::new().get("Home.Index"));
/// router.insert("/products/{id}.{format}", MethodRouter::new().get("Products.Get"));
///
/// let m = router.match_route(&Method::GET, "/products/7.JSON").unwrap();
/// assert_eq!(m.operation_id, "Products.Get");
/// assert_eq!(m.params.get("format"), Some("json"));
///
/// assert!(matches!(
///     router.route_request(&Method::POST, "/home/index"),
///     RouteOutcome::MethodNotAllowed { .. }
/// ));
/// ```
///
/// # Route Priority
///
/// When multiple routes could match a segment, the router tries:
///
/// 1. **Literal segments** (e.g., `/users/me`), compared ignoring ASCII case
/// 2. **Parameter-with-extension segments** (e.g., `/users/{id}.{format}`)
/// 3. **Parameter segments** (e.g., `/users/{id}`)
/// 4. **Wildcard segments** (e.g., `/files/*path`)
#[derive(Debug, Clone)]
pub struct Router {
    root: Node,
    route_count: usize,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    /// Creates a new empty router.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: Node::root(),
            route_count: 0,
        }
    }

    /// Inserts a route, merging with methods already registered on the path.
    pub fn insert(&mut self, path: &str, methods: MethodRouter) {
        self.root.insert(path, methods);
        self.route_count += 1;
    }

    /// Convenience method to add a single-method route.
    pub fn route(&mut self, method: &Method, path: &str, operation_id: impl Into<String>) {
        self.insert(path, MethodRouter::new().method(method, operation_id));
    }

    /// Matches a method and path, returning `None` on any miss.
    #[must_use]
    pub fn match_route(&self, method: &Method, path: &str) -> Option<RouteMatch<'_>> {
        match self.route_request(method, path) {
            RouteOutcome::Matched(m) => Some(m),
            _ => None,
        }
    }

    /// Routes a request, distinguishing unknown paths from unsupported methods.
    #[must_use]
    pub fn route_request(&self, method: &Method, path: &str) -> RouteOutcome<'_> {
        let Some((methods, params)) = self.root.match_path(path) else {
            return RouteOutcome::NotFound;
        };
        match methods.resolve(method) {
            Some(operation_id) => RouteOutcome::Matched(RouteMatch::new(operation_id, params)),
            None => RouteOutcome::MethodNotAllowed {
                allowed: methods.allowed_methods(),
            },
        }
    }

    /// Matches a path without regard to method.
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<(&MethodRouter, Params)> {
        self.root.match_path(path)
    }

    /// Returns the number of routes registered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.route_count
    }

    /// Returns true if no routes are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.route_count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_router_new() {
        let router = Router::new();
        assert!(router.is_empty());
        assert_eq!(router.len(), 0);
    }

    #[test]
    fn test_router_match_param() {
        let mut router = Router::new();
        router.insert("/users/{id}", MethodRouter::new().get("getUser"));

        let route_match = router.match_route(&Method::GET, "/users/123").unwrap();
        assert_eq!(route_match.operation_id, "getUser");
        assert_eq!(route_match.params.get("id"), Some("123"));
    }

    #[test]
    fn test_router_method_not_allowed() {
        let mut router = Router::new();
        router.insert("/users", MethodRouter::new().get("listUsers"));

        assert!(router.match_route(&Method::POST, "/users").is_none());
        assert_eq!(
            router.route_request(&Method::POST, "/users"),
            RouteOutcome::MethodNotAllowed {
                allowed: vec![Method::GET, Method::HEAD]
            }
        );
    }

    #[test]
    fn test_router_not_found() {
        let mut router = Router::new();
        router.insert("/users", MethodRouter::new().get("listUsers"));
        assert_eq!(
            router.route_request(&Method::GET, "/posts"),
            RouteOutcome::NotFound
        );
    }

    #[test]
    fn test_router_head_served_by_get() {
        let mut router = Router::new();
        router.route(&Method::GET, "/page", "page");

        let m = router.match_route(&Method::HEAD, "/page").unwrap();
        assert_eq!(m.operation_id, "page");
    }

    #[test]
    fn test_router_merges_methods_on_same_path() {
        let mut router = Router::new();
        router.route(&Method::GET, "/Forms", "Forms.Show");
        router.route(&Method::POST, "/forms", "Forms.Submit");

        assert_eq!(
            router.match_route(&Method::POST, "/FORMS").map(|m| m.operation_id),
            Some("Forms.Submit")
        );
        assert_eq!(router.len(), 2);
    }

    #[test]
    fn test_router_trailing_slash() {
        let mut router = Router::new();
        router.insert("/users", MethodRouter::new().get("listUsers"));

        let result = router.match_route(&Method::GET, "/users/");
        assert_eq!(result.unwrap().operation_id, "listUsers");
    }

    #[test]
    fn test_router_empty_path() {
        let mut router = Router::new();
        router.insert("/", MethodRouter::new().get("root"));

        let result = router.match_route(&Method::GET, "/");
        assert_eq!(result.unwrap().operation_id, "root");
    }
}
