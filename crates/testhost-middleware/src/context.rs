//! Middleware context types.
//!
//! The [`MiddlewareContext`] is created once per dispatched request and
//! dropped when the response is produced. It owns the request's service
//! scope, so nothing stored in it can outlive or leak into another request.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use testhost_core::{InjectionError, RequestContext, RequestId, ServiceScope};

/// Context that flows through the pipeline.
///
/// # Example
///
/// ```
/// use testhost_middleware::MiddlewareContext;
///
/// #[derive(Debug, PartialEq)]
/// struct Culture(&'static str);
///
/// let mut ctx = MiddlewareContext::new();
/// ctx.set_extension(Culture("fr-FR"));
/// assert_eq!(ctx.get_extension::<Culture>(), Some(&Culture("fr-FR")));
/// ```
pub struct MiddlewareContext {
    request_id: RequestId,

    /// Request-lifetime services.
    services: Option<Arc<ServiceScope>>,

    /// The endpoint chosen by routing.
    operation_id: Option<String>,

    started_at: Instant,

    extensions: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl MiddlewareContext {
    /// Creates a context with a fresh request ID and no service scope.
    #[must_use]
    pub fn new() -> Self {
        Self {
            request_id: RequestId::new(),
            services: None,
            operation_id: None,
            started_at: Instant::now(),
            extensions: HashMap::new(),
        }
    }

    /// Creates a context owning the given request scope.
    #[must_use]
    pub fn with_services(services: Arc<ServiceScope>) -> Self {
        Self {
            services: Some(services),
            ..Self::new()
        }
    }

    /// Returns the request ID.
    #[must_use]
    pub fn request_id(&self) -> &RequestId {
        &self.request_id
    }

    /// Sets the request ID.
    ///
    /// Only the request-id stage should call this.
    pub fn set_request_id(&mut self, request_id: RequestId) {
        self.request_id = request_id;
    }

    /// Returns the request's service scope, if the host attached one.
    #[must_use]
    pub fn request_services(&self) -> Option<&Arc<ServiceScope>> {
        self.services.as_ref()
    }

    /// Resolves a service from the request scope.
    pub fn resolve<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, InjectionError> {
        self.services
            .as_ref()
            .ok_or_else(|| InjectionError::custom::<T>("no request scope attached to this request"))?
            .resolve_required()
    }

    /// Returns the endpoint name, if routing has run.
    #[must_use]
    pub fn operation_id(&self) -> Option<&str> {
        self.operation_id.as_deref()
    }

    /// Records the endpoint chosen by routing.
    pub fn set_operation_id(&mut self, operation_id: impl Into<String>) {
        self.operation_id = Some(operation_id.into());
    }

    /// Returns when the request started processing.
    #[must_use]
    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Returns the elapsed time since the request started.
    #[must_use]
    pub fn elapsed(&self) -> std::time::Duration {
        self.started_at.elapsed()
    }

    /// Stores a typed extension value, replacing any previous one.
    pub fn set_extension<T: Send + Sync + 'static>(&mut self, value: T) {
        self.extensions.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Retrieves a typed extension value.
    #[must_use]
    pub fn get_extension<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref())
    }

    /// Removes and returns a typed extension value.
    pub fn remove_extension<T: Send + Sync + 'static>(&mut self) -> Option<T> {
        self.extensions
            .remove(&TypeId::of::<T>())
            .and_then(|v| v.downcast().ok())
            .map(|b| *b)
    }

    /// Checks if an extension of the given type exists.
    #[must_use]
    pub fn has_extension<T: Send + Sync + 'static>(&self) -> bool {
        self.extensions.contains_key(&TypeId::of::<T>())
    }

    /// Snapshots this context as a [`RequestContext`] for endpoints.
    #[must_use]
    pub fn to_request_context(&self) -> RequestContext {
        let ctx = RequestContext::with_request_id(self.request_id.clone());
        match &self.operation_id {
            Some(op) => ctx.with_endpoint(op.clone()),
            None => ctx,
        }
    }
}

impl Default for MiddlewareContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MiddlewareContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiddlewareContext")
            .field("request_id", &self.request_id)
            .field("scope_id", &self.services.as_ref().map(|s| s.id()))
            .field("operation_id", &self.operation_id)
            .field("extension_count", &self.extensions.len())
            .finish_non_exhaustive()
    }
}
