//! HTTP method-based routing.
//!
//! [`MethodRouter`] maps HTTP methods to endpoint names for a single path.
//! Besides the standard verbs it accepts extension methods, and a route may
//! declare an `any` endpoint that serves every method.

use http::Method;

/// Maps HTTP methods to endpoint names for a single route.
///
/// # Example
///
/// ```rust
/// use testhost_router::MethodRouter;
/// use http::Method;
///
/// let router = MethodRouter::new()
///     .get("Home.Index")
///     .post("Home.Submit");
///
/// assert_eq!(router.get_operation(&Method::GET), Some("Home.Index"));
/// assert_eq!(router.resolve(&Method::HEAD), Some("Home.Index"));
/// assert_eq!(router.get_operation(&Method::DELETE), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MethodRouter {
    get: Option<String>,
    post: Option<String>,
    put: Option<String>,
    delete: Option<String>,
    patch: Option<String>,
    head: Option<String>,
    options: Option<String>,
    /// Non-standard methods such as `PROPFIND`
    extensions: Vec<(Method, String)>,
    /// Endpoint serving every method without a dedicated entry
    any: Option<String>,
}

impl MethodRouter {
    /// Creates a new empty method router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&mut self, method: &Method) -> Option<&mut Option<String>> {
        match *method {
            Method::GET => Some(&mut self.get),
            Method::POST => Some(&mut self.post),
            Method::PUT => Some(&mut self.put),
            Method::DELETE => Some(&mut self.delete),
            Method::PATCH => Some(&mut self.patch),
            Method::HEAD => Some(&mut self.head),
            Method::OPTIONS => Some(&mut self.options),
            _ => None,
        }
    }

    /// Registers a GET endpoint.
    #[must_use]
    pub fn get(self, operation_id: impl Into<String>) -> Self {
        self.method(&Method::GET, operation_id)
    }

    /// Registers a POST endpoint.
    #[must_use]
    pub fn post(self, operation_id: impl Into<String>) -> Self {
        self.method(&Method::POST, operation_id)
    }

    /// Registers a PUT endpoint.
    #[must_use]
    pub fn put(self, operation_id: impl Into<String>) -> Self {
        self.method(&Method::PUT, operation_id)
    }

    /// Registers a DELETE endpoint.
    #[must_use]
    pub fn delete(self, operation_id: impl Into<String>) -> Self {
        self.method(&Method::DELETE, operation_id)
    }

    /// Registers a PATCH endpoint.
    #[must_use]
    pub fn patch(self, operation_id: impl Into<String>) -> Self {
        self.method(&Method::PATCH, operation_id)
    }

    /// Registers an explicit HEAD endpoint.
    #[must_use]
    pub fn head(self, operation_id: impl Into<String>) -> Self {
        self.method(&Method::HEAD, operation_id)
    }

    /// Registers an OPTIONS endpoint.
    #[must_use]
    pub fn options(self, operation_id: impl Into<String>) -> Self {
        self.method(&Method::OPTIONS, operation_id)
    }

    /// Registers an endpoint for every method.
    #[must_use]
    pub fn any(mut self, operation_id: impl Into<String>) -> Self {
        self.any = Some(operation_id.into());
        self
    }

    /// Registers an endpoint for a specific method, including extension methods.
    #[must_use]
    pub fn method(mut self, method: &Method, operation_id: impl Into<String>) -> Self {
        let op = operation_id.into();
        if let Some(slot) = self.slot(method) {
            *slot = Some(op);
        } else if let Some(entry) = self.extensions.iter_mut().find(|(m, _)| m == method) {
            entry.1 = op;
        } else {
            self.extensions.push((method.clone(), op));
        }
        self
    }

    /// Returns the endpoint registered for exactly this method.
    #[must_use]
    pub fn get_operation(&self, method: &Method) -> Option<&str> {
        match *method {
            Method::GET => self.get.as_deref(),
            Method::POST => self.post.as_deref(),
            Method::PUT => self.put.as_deref(),
            Method::DELETE => self.delete.as_deref(),
            Method::PATCH => self.patch.as_deref(),
            Method::HEAD => self.head.as_deref(),
            Method::OPTIONS => self.options.as_deref(),
            _ => self
                .extensions
                .iter()
                .find(|(m, _)| m == method)
                .map(|(_, op)| op.as_str()),
        }
    }

    /// Returns the endpoint that serves `method`.
    ///
    /// HEAD falls back to the GET endpoint; any method falls back to the
    /// `any` endpoint.
    #[must_use]
    pub fn resolve(&self, method: &Method) -> Option<&str> {
        self.get_operation(method)
            .or_else(|| {
                (*method == Method::HEAD)
                    .then(|| self.get.as_deref())
                    .flatten()
            })
            .or(self.any.as_deref())
    }

    /// Merges another method router into this one.
    ///
    /// Methods already set in this router are kept.
    pub fn merge(&mut self, other: MethodRouter) {
        let MethodRouter {
            get,
            post,
            put,
            delete,
            patch,
            head,
            options,
            extensions,
            any,
        } = other;

        for (slot, incoming) in [
            (&mut self.get, get),
            (&mut self.post, post),
            (&mut self.put, put),
            (&mut self.delete, delete),
            (&mut self.patch, patch),
            (&mut self.head, head),
            (&mut self.options, options),
            (&mut self.any, any),
        ] {
            if slot.is_none() {
                *slot = incoming;
            }
        }
        for (method, op) in extensions {
            if !self.extensions.iter().any(|(m, _)| *m == method) {
                self.extensions.push((method, op));
            }
        }
    }

    /// Returns true if any methods are registered.
    #[must_use]
    pub fn has_any_method(&self) -> bool {
        self.any.is_some() || !self.allowed_methods().is_empty()
    }

    /// Returns the methods this route answers, as advertised in `Allow`.
    ///
    /// HEAD is listed whenever GET is.
    #[must_use]
    pub fn allowed_methods(&self) -> Vec<Method> {
        let mut methods: Vec<Method> = [
            (Method::GET, &self.get),
            (Method::HEAD, &self.head),
            (Method::POST, &self.post),
            (Method::PUT, &self.put),
            (Method::DELETE, &self.delete),
            (Method::PATCH, &self.patch),
            (Method::OPTIONS, &self.options),
        ]
        .into_iter()
        .filter(|(m, op)| op.is_some() || (*m == Method::HEAD && self.get.is_some()))
        .map(|(m, _)| m)
        .collect();
        methods.extend(self.extensions.iter().map(|(m, _)| m.clone()));
        methods
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_router_new() {
        let router = MethodRouter::new();
        assert!(!router.has_any_method());
        assert!(router.allowed_methods().is_empty());
    }

    #[test]
    fn test_verbs() {
        let router = MethodRouter::new()
            .get("get")
            .post("post")
            .put("put")
            .delete("delete")
            .patch("patch")
            .options("options");

        assert_eq!(router.get_operation(&Method::GET), Some("get"));
        assert_eq!(router.get_operation(&Method::POST), Some("post"));
        assert_eq!(router.get_operation(&Method::PUT), Some("put"));
        assert_eq!(router.get_operation(&Method::DELETE), Some("delete"));
        assert_eq!(router.get_operation(&Method::PATCH), Some("patch"));
        assert_eq!(router.get_operation(&Method::OPTIONS), Some("options"));
    }

    #[test]
    fn test_extension_method() {
        let propfind = Method::from_bytes(b"PROPFIND").unwrap();
        let router = MethodRouter::new().method(&propfind, "Dav.Find");

        assert_eq!(router.get_operation(&propfind), Some("Dav.Find"));
        assert_eq!(router.allowed_methods(), vec![propfind]);
    }

    #[test]
    fn test_head_falls_back_to_get() {
        let router = MethodRouter::new().get("page");
        assert_eq!(router.get_operation(&Method::HEAD), None);
        assert_eq!(router.resolve(&Method::HEAD), Some("page"));

        let explicit = MethodRouter::new().get("page").head("probe");
        assert_eq!(explicit.resolve(&Method::HEAD), Some("probe"));
    }

    #[test]
    fn test_any_fallback() {
        let router = MethodRouter::new().post("create").any("catchAll");
        assert_eq!(router.resolve(&Method::POST), Some("create"));
        assert_eq!(router.resolve(&Method::PUT), Some("catchAll"));
        assert!(router.has_any_method());
    }

    #[test]
    fn test_allowed_methods_lists_head_with_get() {
        let router = MethodRouter::new().get("get").post("post");
        assert_eq!(
            router.allowed_methods(),
            vec![Method::GET, Method::HEAD, Method::POST]
        );
    }

    #[test]
    fn test_merge_does_not_overwrite() {
        let mut router = MethodRouter::new().get("originalGet");
        router.merge(MethodRouter::new().get("newGet").post("createUser"));

        assert_eq!(router.get_operation(&Method::GET), Some("originalGet"));
        assert_eq!(router.get_operation(&Method::POST), Some("createUser"));
    }

    #[test]
    fn test_merge_extensions() {
        let report = Method::from_bytes(b"REPORT").unwrap();
        let mut router = MethodRouter::new().method(&report, "first");
        router.merge(MethodRouter::new().method(&report, "second").any("all"));

        assert_eq!(router.get_operation(&report), Some("first"));
        assert_eq!(router.resolve(&Method::DELETE), Some("all"));
    }
}
