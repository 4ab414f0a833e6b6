//! Radix tree router for in-memory test hosts.
//!
//! Routes map a method and a path template to an endpoint name; the server
//! crate looks the name up in its endpoint table.
//!
//! # Features
//!
//! - **Case-insensitive literals**: `/Home/Index` matches `/home/INDEX`
//! - **Path Parameters**: `/users/{id}`, percent-decoded on capture
//! - **Format extensions**: `/products/{id}.{format}` captures `format` lowercased
//! - **Wildcards**: catch-all routes (`/files/*path`)
//! - **405 support**: [`Router::route_request`] reports the allowed methods
//!
//! # Example
//!
//! ```rust
//! use testhost_router::{Router, MethodRouter};
//! use http::Method;
//!
//! let mut router = Router::new();
//! router.insert("/users", MethodRouter::new().get("listUsers").post("createUser"));
//! router.insert("/users/{id}", MethodRouter::new().get("getUser"));
//!
//! let route_match = router.match_route(&Method::GET, "/Users/123").unwrap();
//! assert_eq!(route_match.operation_id, "getUser");
//! assert_eq!(route_match.params.get("id"), Some("123"));
//! ```
//!
//! # Architecture
//!
//! ```text
//!                    (root)
//!                      │
//!              ┌───────┴───────┐
//!              │               │
//!            "users"        "files"
//!              │               │
//!        ┌─────┴─────┐      "*path"
//!        │           │
//!       (leaf)    "{id}"
//!   [GET,POST]      │
//!                 (leaf)
//!                 [GET]
//! ```

mod method_router;
mod node;
mod params;
mod router;

pub use method_router::MethodRouter;
pub use node::{Node, SegmentKind};
pub use params::Params;
pub use router::{RouteOutcome, Router};

/// A matched route with its endpoint name and extracted parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'a> {
    /// The endpoint name for the matched route
    pub operation_id: &'a str,
    /// Extracted path parameters
    pub params: Params,
}

impl<'a> RouteMatch<'a> {
    /// Creates a new route match.
    #[must_use]
    pub fn new(operation_id: &'a str, params: Params) -> Self {
        Self {
            operation_id,
            params,
        }
    }
}
