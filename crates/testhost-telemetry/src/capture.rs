//! Per-fixture log capture.
//!
//! A [`LogContext`] owns a `tracing` [`Dispatch`] whose subscriber records
//! every event into a shared buffer. Fixtures hand the context to the
//! server, which runs each request under that dispatch, so a test can look
//! at exactly the events its own requests produced even when other tests
//! run in parallel on the same thread pool.
//!
//! Events inherit the fields of the spans they were emitted in; an event
//! logged from an endpoint therefore carries the `request_id` recorded on
//! the request span.

use crate::config::LogConfig;
use crate::logger::LoggerFactory;
use crate::logging::{create_env_filter, output_layer};
use crate::TelemetryResult;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id, Record};
use tracing::{Dispatch, Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{Layer, Registry};

/// One captured event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// Event level.
    pub level: Level,
    /// Event target (module path unless overridden).
    pub target: String,
    /// The event's message, empty if it had none.
    pub message: String,
    /// Event fields merged over the fields of its enclosing spans.
    pub fields: BTreeMap<String, String>,
    /// Name of the innermost enclosing span.
    pub span: Option<String>,
}

impl LogRecord {
    /// Returns a field's value.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.level, self.target, self.message)
    }
}

type Records = Arc<Mutex<Vec<LogRecord>>>;

/// A layer appending every event to a shared buffer.
#[derive(Debug, Clone)]
pub struct CaptureLayer {
    records: Records,
}

/// Span fields stashed in the registry's span extensions.
#[derive(Debug, Default)]
struct SpanFields(BTreeMap<String, String>);

#[derive(Default)]
struct FieldVisitor {
    message: Option<String>,
    fields: BTreeMap<String, String>,
}

impl Visit for FieldVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            self.fields.insert(field.name().to_string(), value.to_string());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = Some(format!("{value:?}"));
        } else {
            self.fields
                .insert(field.name().to_string(), format!("{value:?}"));
        }
    }
}

impl<S> Layer<S> for CaptureLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor::default();
        attrs.record(&mut visitor);
        if let Some(span) = ctx.span(id) {
            span.extensions_mut().insert(SpanFields(visitor.fields));
        }
    }

    fn on_record(&self, id: &Id, values: &Record<'_>, ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor::default();
        values.record(&mut visitor);
        if let Some(span) = ctx.span(id) {
            let mut extensions = span.extensions_mut();
            if let Some(existing) = extensions.get_mut::<SpanFields>() {
                existing.0.extend(visitor.fields);
            }
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let mut fields = BTreeMap::new();
        let mut span_name = None;

        if let Some(scope) = ctx.event_scope(event) {
            for span in scope.from_root() {
                if let Some(stored) = span.extensions().get::<SpanFields>() {
                    fields.extend(stored.0.clone());
                }
                span_name = Some(span.name().to_string());
            }
        }

        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);
        fields.extend(visitor.fields);

        let metadata = event.metadata();
        self.records.lock().push(LogRecord {
            level: *metadata.level(),
            target: metadata.target().to_string(),
            message: visitor.message.unwrap_or_default(),
            fields,
            span: span_name,
        });
    }
}

/// A fixture's private logging context.
///
/// Cloning is cheap and every clone shares the same buffer and dispatch.
///
/// # Example
///
/// ```
/// use testhost_telemetry::LogContext;
///
/// let logs = LogContext::new();
/// logs.in_scope(|| tracing::info!(site = "BasicWebSite", "fixture ready"));
///
/// let record = logs.find_message("fixture ready").unwrap();
/// assert_eq!(record.field("site"), Some("BasicWebSite"));
/// ```
#[derive(Clone)]
pub struct LogContext {
    records: Records,
    dispatch: Dispatch,
}

impl LogContext {
    /// Creates a context capturing events at every level, echoing nothing.
    #[must_use]
    pub fn new() -> Self {
        let records = Records::default();
        let layer = CaptureLayer {
            records: Arc::clone(&records),
        };
        let dispatch = Dispatch::new(Registry::default().with(layer));
        Self { records, dispatch }
    }

    /// Creates a context filtered by `config.level` that also echoes to the
    /// test output when `config.enabled`.
    ///
    /// # Errors
    ///
    /// Returns `TelemetryError::InvalidFilter` for a bad `level` directive.
    pub fn from_config(config: &LogConfig) -> TelemetryResult<Self> {
        let records = Records::default();
        let capture = CaptureLayer {
            records: Arc::clone(&records),
        }
        .with_filter(create_env_filter(&config.level)?);

        let echo = if config.enabled {
            Some(output_layer::<Registry>(config)?)
        } else {
            None
        };

        let subscriber = Registry::default().with(echo).with(capture);
        Ok(Self {
            records,
            dispatch: Dispatch::new(subscriber),
        })
    }

    /// Returns the dispatch to run fixture code under.
    #[must_use]
    pub fn dispatch(&self) -> &Dispatch {
        &self.dispatch
    }

    /// Runs `f` with this context as the default subscriber.
    pub fn in_scope<R>(&self, f: impl FnOnce() -> R) -> R {
        tracing::dispatcher::with_default(&self.dispatch, f)
    }

    /// Returns a logger factory writing into this context.
    #[must_use]
    pub fn logger_factory(&self) -> LoggerFactory {
        LoggerFactory::new(self.dispatch.clone())
    }

    /// Returns a snapshot of every captured record.
    #[must_use]
    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().clone()
    }

    /// Returns the records at exactly `level`.
    #[must_use]
    pub fn records_at(&self, level: Level) -> Vec<LogRecord> {
        self.records
            .lock()
            .iter()
            .filter(|r| r.level == level)
            .cloned()
            .collect()
    }

    /// Returns the records whose fields include `name = value`.
    #[must_use]
    pub fn records_with_field(&self, name: &str, value: &str) -> Vec<LogRecord> {
        self.records
            .lock()
            .iter()
            .filter(|r| r.field(name) == Some(value))
            .cloned()
            .collect()
    }

    /// Returns the first record whose message contains `needle`.
    #[must_use]
    pub fn find_message(&self, needle: &str) -> Option<LogRecord> {
        self.records
            .lock()
            .iter()
            .find(|r| r.message.contains(needle))
            .cloned()
    }

    /// Returns `true` if any record's message contains `needle`.
    #[must_use]
    pub fn contains_message(&self, needle: &str) -> bool {
        self.records.lock().iter().any(|r| r.message.contains(needle))
    }

    /// Returns the number of captured records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Returns `true` if nothing was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Discards every captured record.
    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

impl Default for LogContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LogContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogContext")
            .field("records", &self.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::instrument::WithSubscriber;

    #[test]
    fn test_captures_message_and_fields() {
        let logs = LogContext::new();
        logs.in_scope(|| tracing::warn!(attempt = 2, "retrying"));

        let records = logs.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].level, Level::WARN);
        assert_eq!(records[0].message, "retrying");
        assert_eq!(records[0].field("attempt"), Some("2"));
        assert!(records[0].span.is_none());
    }

    #[test]
    fn test_events_inherit_span_fields() {
        let logs = LogContext::new();
        logs.in_scope(|| {
            let span = tracing::info_span!("request", request_id = "r-1", status = tracing::field::Empty);
            let _entered = span.enter();
            span.record("status", 200);
            tracing::info!("inside");
        });

        let record = logs.find_message("inside").unwrap();
        assert_eq!(record.span.as_deref(), Some("request"));
        assert_eq!(record.field("request_id"), Some("r-1"));
        assert_eq!(record.field("status"), Some("200"));
    }

    #[test]
    fn test_contexts_are_isolated() {
        let first = LogContext::new();
        let second = LogContext::new();

        first.in_scope(|| tracing::info!("only in first"));

        assert!(first.contains_message("only in first"));
        assert!(second.is_empty());
    }

    #[test]
    fn test_from_config_filters_capture() {
        let logs = LogContext::from_config(&LogConfig::default().with_level("warn")).unwrap();
        logs.in_scope(|| {
            tracing::info!("dropped");
            tracing::error!("kept");
        });

        assert_eq!(logs.len(), 1);
        assert_eq!(logs.records_at(Level::ERROR).len(), 1);
    }

    #[test]
    fn test_from_config_rejects_bad_filter() {
        let result = LogContext::from_config(&LogConfig::default().with_level("x=loud"));
        assert!(result.is_err());
    }

    #[test]
    fn test_clear() {
        let logs = LogContext::new();
        logs.in_scope(|| tracing::info!("first"));
        logs.clear();
        assert!(logs.is_empty());
    }

    #[tokio::test]
    async fn test_with_subscriber_captures_async_work() {
        let logs = LogContext::new();

        async {
            tokio::task::yield_now().await;
            tracing::info!(request_id = "async-1", "handled");
        }
        .with_subscriber(logs.dispatch().clone())
        .await;

        assert_eq!(logs.records_with_field("request_id", "async-1").len(), 1);
    }
}
