//! Startup and shutdown hooks of a hosted application.
//!
//! # Execution Order
//!
//! - **Startup hooks**: run in registration order while the server is
//!   created, before the first request can be sent
//! - **Shutdown hooks**: run in reverse registration order from
//!   [`TestServer::shutdown`](crate::TestServer::shutdown), before singletons
//!   are disposed
//!
//! # Example
//!
//! ```rust
//! use testhost_server::Lifecycle;
//!
//! let lifecycle = Lifecycle::new()
//!     .on_startup(|_services| async { Ok(()) })
//!     .on_shutdown(|_services| async { Ok(()) });
//! assert_eq!(lifecycle.startup_hook_count(), 1);
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use testhost_core::ServiceProvider;
use testhost_middleware::BoxFuture;
use thiserror::Error;

/// Error type for lifecycle hook failures.
#[derive(Error, Debug)]
pub enum LifecycleError {
    /// A startup hook failed.
    #[error("Startup hook failed: {0}")]
    StartupFailed(String),

    /// One or more shutdown hooks failed.
    #[error("Shutdown hook failed: {0}")]
    ShutdownFailed(String),

    /// Error raised by a hook body.
    #[error("Lifecycle hook error: {message}")]
    HookError {
        /// Error message
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl LifecycleError {
    /// Creates a new hook error with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self::HookError {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new hook error with a source.
    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::HookError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Result type for lifecycle hooks.
pub type LifecycleResult<T = ()> = Result<T, LifecycleError>;

/// A lifecycle hook. Receives a handle to the application's root provider.
pub type LifecycleHook =
    Arc<dyn Fn(ServiceProvider) -> BoxFuture<'static, LifecycleResult> + Send + Sync>;

/// Ordered startup and shutdown hooks.
#[must_use]
#[derive(Clone, Default)]
pub struct Lifecycle {
    startup_hooks: Vec<(String, LifecycleHook)>,
    shutdown_hooks: Vec<(String, LifecycleHook)>,
}

impl fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lifecycle")
            .field("startup_hooks", &self.startup_hook_names())
            .field("shutdown_hooks", &self.shutdown_hook_names())
            .finish()
    }
}

fn boxed<F, Fut>(hook: F) -> LifecycleHook
where
    F: Fn(ServiceProvider) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = LifecycleResult> + Send + 'static,
{
    Arc::new(move |services| Box::pin(hook(services)))
}

impl Lifecycle {
    /// Creates an empty lifecycle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a startup hook named after its position.
    pub fn on_startup<F, Fut>(self, hook: F) -> Self
    where
        F: Fn(ServiceProvider) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = LifecycleResult> + Send + 'static,
    {
        let name = format!("startup_{}", self.startup_hooks.len());
        self.on_startup_named(name, hook)
    }

    /// Registers a named startup hook.
    pub fn on_startup_named<F, Fut>(mut self, name: impl Into<String>, hook: F) -> Self
    where
        F: Fn(ServiceProvider) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = LifecycleResult> + Send + 'static,
    {
        self.startup_hooks.push((name.into(), boxed(hook)));
        self
    }

    /// Registers a shutdown hook named after its position.
    pub fn on_shutdown<F, Fut>(self, hook: F) -> Self
    where
        F: Fn(ServiceProvider) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = LifecycleResult> + Send + 'static,
    {
        let name = format!("shutdown_{}", self.shutdown_hooks.len());
        self.on_shutdown_named(name, hook)
    }

    /// Registers a named shutdown hook.
    pub fn on_shutdown_named<F, Fut>(mut self, name: impl Into<String>, hook: F) -> Self
    where
        F: Fn(ServiceProvider) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = LifecycleResult> + Send + 'static,
    {
        self.shutdown_hooks.push((name.into(), boxed(hook)));
        self
    }

    /// Returns the number of startup hooks.
    pub fn startup_hook_count(&self) -> usize {
        self.startup_hooks.len()
    }

    /// Returns the number of shutdown hooks.
    pub fn shutdown_hook_count(&self) -> usize {
        self.shutdown_hooks.len()
    }

    fn startup_hook_names(&self) -> Vec<&str> {
        self.startup_hooks.iter().map(|(name, _)| name.as_str()).collect()
    }

    fn shutdown_hook_names(&self) -> Vec<&str> {
        self.shutdown_hooks.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Runs startup hooks in registration order, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns `LifecycleError::StartupFailed` naming the failed hook.
    pub async fn run_startup(&self, services: &ServiceProvider) -> LifecycleResult {
        for (name, hook) in &self.startup_hooks {
            tracing::debug!(hook = %name, "running startup hook");
            if let Err(e) = hook(services.clone()).await {
                tracing::error!(hook = %name, error = %e, "startup hook failed");
                return Err(LifecycleError::StartupFailed(format!(
                    "Hook '{}' failed: {}",
                    name, e
                )));
            }
        }
        Ok(())
    }

    /// Runs every shutdown hook in reverse order, collecting failures.
    ///
    /// # Errors
    ///
    /// Returns `LifecycleError::ShutdownFailed` summarizing every failed hook.
    pub async fn run_shutdown(&self, services: &ServiceProvider) -> LifecycleResult {
        let mut errors: Vec<String> = Vec::new();

        for (name, hook) in self.shutdown_hooks.iter().rev() {
            tracing::debug!(hook = %name, "running shutdown hook");
            if let Err(e) = hook(services.clone()).await {
                tracing::error!(hook = %name, error = %e, "shutdown hook failed");
                errors.push(format!("{}: {}", name, e));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(LifecycleError::ShutdownFailed(errors.join("; ")))
        }
    }

    /// Appends another lifecycle's hooks to this one's.
    pub fn merge(mut self, other: Lifecycle) -> Self {
        self.startup_hooks.extend(other.startup_hooks);
        self.shutdown_hooks.extend(other.shutdown_hooks);
        self
    }
}
