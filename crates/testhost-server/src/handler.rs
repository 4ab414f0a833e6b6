//! Endpoint handler registration.
//!
//! Handlers are async functions taking an [`EndpointContext`] and returning
//! a [`HandlerResult`]. They are stored type-erased under an operation ID,
//! which is what the router resolves a request to.
//!
//! # Example
//!
//! ```rust
//! use testhost_server::handler::{HandlerRegistry, HandlerResult};
//! use testhost_server::{responses, EndpointContext};
//!
//! async fn hello(ctx: EndpointContext) -> HandlerResult {
//!     Ok(responses::text(format!("Hello from {}", ctx.path())))
//! }
//!
//! let mut registry = HandlerRegistry::new();
//! registry.register("Home.Hello", hello);
//! assert!(registry.contains("Home.Hello"));
//! ```

use std::collections::HashMap;
use std::error::Error as StdError;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use testhost_core::Fault;
use testhost_middleware::{BoxFuture, Response};

use crate::endpoint::EndpointContext;

/// Result returned by endpoint handlers.
pub type HandlerResult = Result<Response, HandlerError>;

/// A type-erased handler function.
pub type ErasedHandler = Arc<dyn Fn(EndpointContext) -> BoxFuture<'static, HandlerResult> + Send + Sync>;

/// An error escaping an endpoint handler.
///
/// Any [`std::error::Error`] converts with `?`, keeping the name of its
/// concrete type. The server turns the error into a 500 response whose
/// `X-Exception-Type` header carries that name.
///
/// `HandlerError` deliberately does not implement `std::error::Error`
/// itself, so the blanket conversion stays coherent.
pub struct HandlerError {
    fault: Fault,
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl HandlerError {
    /// Creates an error from an explicit type name and message.
    #[must_use]
    pub fn new(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            fault: Fault::new(type_name, message),
            source: None,
        }
    }

    /// Returns the name of the error's type.
    #[must_use]
    pub fn type_name(&self) -> &str {
        self.fault.type_name()
    }

    /// Returns the error message.
    #[must_use]
    pub fn message(&self) -> &str {
        self.fault.message()
    }

    /// Returns the original error, if this was converted from one.
    #[must_use]
    pub fn inner(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.source.as_deref()
    }

    /// Attempts to view the original error as `E`.
    #[must_use]
    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        self.source.as_deref().and_then(|e| e.downcast_ref::<E>())
    }

    /// Converts into the fault record the pipeline reports.
    #[must_use]
    pub fn into_fault(self) -> Fault {
        self.fault
    }
}

impl<E> From<E> for HandlerError
where
    E: StdError + Send + Sync + 'static,
{
    fn from(error: E) -> Self {
        Self {
            fault: Fault::from_error(&error),
            source: Some(Box::new(error)),
        }
    }
}

impl fmt::Debug for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerError")
            .field("type_name", &self.type_name())
            .field("message", &self.message())
            .finish()
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.fault, f)
    }
}

/// Boxes an async handler function.
pub fn erase<F, Fut>(handler: F) -> ErasedHandler
where
    F: Fn(EndpointContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    Arc::new(move |ctx| Box::pin(handler(ctx)))
}

/// Registry mapping operation IDs to handlers.
#[derive(Default, Clone)]
pub struct HandlerRegistry {
    handlers: HashMap<String, ErasedHandler>,
}

impl HandlerRegistry {
    /// Creates a new empty handler registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler, replacing any handler with the same ID.
    pub fn register<F, Fut>(&mut self, operation_id: impl Into<String>, handler: F)
    where
        F: Fn(EndpointContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.register_erased(operation_id, erase(handler));
    }

    /// Registers an already-erased handler.
    pub fn register_erased(&mut self, operation_id: impl Into<String>, handler: ErasedHandler) {
        self.handlers.insert(operation_id.into(), handler);
    }

    /// Looks up a handler by operation ID.
    #[must_use]
    pub fn get(&self, operation_id: &str) -> Option<&ErasedHandler> {
        self.handlers.get(operation_id)
    }

    /// Checks if a handler is registered for an operation.
    #[must_use]
    pub fn contains(&self, operation_id: &str) -> bool {
        self.handlers.contains_key(operation_id)
    }

    /// Returns the registered operation IDs, sorted.
    #[must_use]
    pub fn operation_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Returns the number of registered handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns `true` if no handlers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("operations", &self.operation_ids())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::test_context;
    use crate::responses;
    use http::StatusCode;
    use http_body_util::BodyExt;

    #[derive(Debug, thiserror::Error)]
    #[error("Loader exception message")]
    struct LoaderError;

    async fn fails(_ctx: EndpointContext) -> HandlerResult {
        Err(LoaderError.into())
    }

    #[test]
    fn test_from_error_keeps_type_name() {
        let err = HandlerError::from(LoaderError);
        assert!(err.type_name().ends_with("LoaderError"));
        assert_eq!(err.message(), "Loader exception message");
        assert!(err.downcast_ref::<LoaderError>().is_some());
        assert!(err.downcast_ref::<std::fmt::Error>().is_none());
    }

    #[test]
    fn test_explicit_error_has_no_source() {
        let err = HandlerError::new("InvalidTimeZone", "Unknown zone 'Mars/Olympus'");
        assert_eq!(err.to_string(), "InvalidTimeZone: Unknown zone 'Mars/Olympus'");
        assert!(err.inner().is_none());
        assert_eq!(err.into_fault().type_name(), "InvalidTimeZone");
    }

    #[tokio::test]
    async fn test_register_and_invoke() {
        let mut registry = HandlerRegistry::new();
        registry.register("Home.Index", |ctx: EndpointContext| async move {
            Ok(responses::text(ctx.operation_id().to_string()))
        });
        registry.register("Home.Fail", fails);

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.operation_ids(), vec!["Home.Fail", "Home.Index"]);

        let handler = registry.get("Home.Index").unwrap();
        let response = handler(test_context("/", "Home.Index")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"Home.Index");

        let handler = registry.get("Home.Fail").unwrap();
        let err = handler(test_context("/fail", "Home.Fail")).await.unwrap_err();
        assert!(err.type_name().ends_with("LoaderError"));
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = HandlerRegistry::new();
        registry.register("op", fails);
        registry.register("op", fails);
        assert_eq!(registry.len(), 1);
        assert!(registry.contains("op"));
        assert!(registry.get("other").is_none());
    }
}
