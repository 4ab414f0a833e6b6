//! Server error types.

use thiserror::Error;

use crate::lifecycle::LifecycleError;

/// Errors returned by [`TestServer`](crate::TestServer) operations.
///
/// Failures inside application code never surface here; they become 500
/// responses. These errors mean the harness itself refused the call.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The server was shut down before the call.
    #[error("Test server '{name}' has been shut down")]
    ShutDown {
        /// Name of the hosted application.
        name: String,
    },

    /// A shutdown hook failed.
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

impl ServerError {
    /// Creates a shut-down error for the named application.
    #[must_use]
    pub fn shut_down(name: impl Into<String>) -> Self {
        Self::ShutDown { name: name.into() }
    }

    /// Returns `true` if the server had been shut down.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        matches!(self, Self::ShutDown { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shut_down_names_application() {
        let err = ServerError::shut_down("BasicWebSite");
        assert!(err.is_shut_down());
        assert!(err.to_string().contains("BasicWebSite"));
    }

    #[test]
    fn test_lifecycle_error_converts() {
        let err: ServerError = LifecycleError::ShutdownFailed("flush: disk full".into()).into();
        assert!(!err.is_shut_down());
        assert!(err.to_string().contains("disk full"));
    }
}
