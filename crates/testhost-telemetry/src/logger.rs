//! Category loggers for application code.
//!
//! Sample sites that want a logger resolve [`LoggerFactory`] from the
//! container instead of calling `tracing` macros directly. The factory is
//! bound to the fixture's [`LogContext`](crate::LogContext), so events from
//! background work that runs outside a request span still land in the
//! right fixture.

use std::sync::Arc;
use tracing::{Dispatch, Level};

/// Creates [`Logger`]s bound to one dispatch.
#[derive(Clone)]
pub struct LoggerFactory {
    dispatch: Dispatch,
}

impl LoggerFactory {
    /// Creates a factory writing to `dispatch`.
    #[must_use]
    pub fn new(dispatch: Dispatch) -> Self {
        Self { dispatch }
    }

    /// Creates a logger for the given category.
    #[must_use]
    pub fn create_logger(&self, category: impl Into<Arc<str>>) -> Logger {
        Logger {
            category: category.into(),
            dispatch: self.dispatch.clone(),
        }
    }
}

impl std::fmt::Debug for LoggerFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoggerFactory").finish_non_exhaustive()
    }
}

/// A logger tagging each event with its category.
#[derive(Clone)]
pub struct Logger {
    category: Arc<str>,
    dispatch: Dispatch,
}

impl Logger {
    /// Returns the category name.
    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Logs `message` at `level`.
    pub fn log(&self, level: Level, message: &str) {
        let category = &*self.category;
        tracing::dispatcher::with_default(&self.dispatch, || match level {
            Level::TRACE => tracing::trace!(category, "{message}"),
            Level::DEBUG => tracing::debug!(category, "{message}"),
            Level::INFO => tracing::info!(category, "{message}"),
            Level::WARN => tracing::warn!(category, "{message}"),
            _ => tracing::error!(category, "{message}"),
        });
    }

    /// Logs at debug level.
    pub fn debug(&self, message: &str) {
        self.log(Level::DEBUG, message);
    }

    /// Logs at info level.
    pub fn info(&self, message: &str) {
        self.log(Level::INFO, message);
    }

    /// Logs at warn level.
    pub fn warn(&self, message: &str) {
        self.log(Level::WARN, message);
    }

    /// Logs at error level.
    pub fn error(&self, message: &str) {
        self.log(Level::ERROR, message);
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("category", &self.category)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use crate::LogContext;
    use tracing::Level;

    #[test]
    fn test_logger_writes_to_bound_context() {
        let logs = LogContext::new();
        let logger = logs.logger_factory().create_logger("HomeController");

        logger.info("Index requested");
        logger.error("boom");

        let records = logs.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].message, "Index requested");
        assert_eq!(records[0].field("category"), Some("HomeController"));
        assert_eq!(records[1].level, Level::ERROR);
    }

    #[test]
    fn test_logger_category() {
        let logs = LogContext::new();
        let logger = logs.logger_factory().create_logger("Startup");
        assert_eq!(logger.category(), "Startup");
    }
}
