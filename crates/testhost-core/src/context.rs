//! Request context types.
//!
//! The [`RequestContext`] carries per-request state through the middleware
//! pipeline and into endpoint handlers.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// A correlation identifier for one request.
///
/// Tests usually supply their own value through the `RequestId` header so
/// they can tell requests apart; when none is supplied a UUID v7 is
/// generated. The value is opaque and compared as a string.
///
/// # Example
///
/// ```
/// use testhost_core::RequestId;
///
/// let generated = RequestId::new();
/// assert_eq!(generated.as_str().len(), 36);
///
/// let supplied = RequestId::from("first-request");
/// assert_eq!(supplied.to_string(), "first-request");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Arc<str>);

impl RequestId {
    /// Creates a new unique request ID using UUID v7.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string().into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RequestId {
    fn from(value: &str) -> Self {
        Self(value.into())
    }
}

impl From<String> for RequestId {
    fn from(value: String) -> Self {
        Self(value.into())
    }
}

impl From<Uuid> for RequestId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid.to_string().into())
    }
}

impl AsRef<str> for RequestId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Per-request context that flows through the pipeline.
///
/// # Example
///
/// ```
/// use testhost_core::RequestContext;
///
/// let ctx = RequestContext::new().with_endpoint("Products.Get");
/// assert_eq!(ctx.endpoint(), Some("Products.Get"));
/// ```
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: RequestId,

    /// The endpoint chosen by routing, once routing has run.
    endpoint: Option<String>,

    started_at: Instant,
}

impl RequestContext {
    /// Creates a new request context with a fresh request ID.
    #[must_use]
    pub fn new() -> Self {
        Self::with_request_id(RequestId::new())
    }

    /// Creates a new request context with the specified request ID.
    #[must_use]
    pub fn with_request_id(request_id: RequestId) -> Self {
        Self {
            request_id,
            endpoint: None,
            started_at: Instant::now(),
        }
    }

    /// Returns the request ID.
    #[must_use]
    pub fn request_id(&self) -> &RequestId {
        &self.request_id
    }

    /// Returns the endpoint name if set.
    #[must_use]
    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    /// Sets the endpoint name.
    pub fn set_endpoint(&mut self, endpoint: impl Into<String>) {
        self.endpoint = Some(endpoint.into());
    }

    /// Returns a new context with the specified endpoint name.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Returns the elapsed time since the request started.
    #[must_use]
    pub fn elapsed(&self) -> std::time::Duration {
        self.started_at.elapsed()
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_id_new_generates_unique_ids() {
        let id1 = RequestId::new();
        let id2 = RequestId::new();
        assert_ne!(id1, id2, "Each RequestId should be unique");
    }

    #[test]
    fn test_request_id_display() {
        let id = RequestId::new();
        let display = id.to_string();
        // UUID v7 format: xxxxxxxx-xxxx-7xxx-xxxx-xxxxxxxxxxxx
        assert_eq!(display.len(), 36);
        assert!(display.contains('-'));
    }

    #[test]
    fn test_request_id_is_opaque() {
        let id = RequestId::from("not-a-uuid");
        assert_eq!(id.as_str(), "not-a-uuid");
        assert_eq!(id, RequestId::from("not-a-uuid".to_string()));
    }

    #[test]
    fn test_request_id_serialization() {
        let id = RequestId::from("abc");
        let json = serde_json::to_string(&id).expect("serialization should work");
        assert_eq!(json, "\"abc\"");
        let parsed: RequestId = serde_json::from_str(&json).expect("deserialization should work");
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_request_context_endpoint() {
        let mut ctx = RequestContext::with_request_id(RequestId::from("r1"));
        assert!(ctx.endpoint().is_none());
        ctx.set_endpoint("Home.Index");
        assert_eq!(ctx.endpoint(), Some("Home.Index"));
        assert_eq!(ctx.request_id().as_str(), "r1");
    }

    #[test]
    fn test_request_context_elapsed() {
        let ctx = RequestContext::new();
        std::thread::sleep(std::time::Duration::from_millis(10));
        assert!(ctx.elapsed() >= std::time::Duration::from_millis(10));
    }
}
