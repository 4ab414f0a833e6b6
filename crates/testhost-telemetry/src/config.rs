//! Logging configuration.

use serde::{Deserialize, Serialize};

/// Output format for echoed log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line human-readable output.
    #[default]
    Pretty,
    /// Single-line human-readable output.
    Compact,
    /// One JSON object per event.
    Json,
}

/// Logging configuration.
///
/// `level` is an `EnvFilter` directive, so it accepts both a bare level
/// (`"debug"`) and per-target directives (`"testhost_server=trace,warn"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
    /// Whether log lines are echoed to the test output.
    ///
    /// Capture through [`LogContext`](crate::LogContext) happens regardless.
    pub enabled: bool,

    /// Filter directive applied to echoing and capture.
    pub level: String,

    /// Output format for echoed lines.
    pub format: LogFormat,

    /// Whether to emit span open/close events.
    pub span_events: bool,

    /// Whether to include file/line info.
    pub file_line_info: bool,

    /// Whether to include the target (module path).
    pub include_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            level: "info".to_string(),
            format: LogFormat::Pretty,
            span_events: false,
            file_line_info: false,
            include_target: true,
        }
    }
}

impl LogConfig {
    /// Creates a verbose configuration for debugging a failing test.
    #[must_use]
    pub fn development() -> Self {
        Self {
            enabled: true,
            level: "debug".to_string(),
            format: LogFormat::Pretty,
            span_events: true,
            file_line_info: true,
            include_target: true,
        }
    }

    /// Creates a configuration that echoes JSON lines.
    #[must_use]
    pub fn json() -> Self {
        Self {
            enabled: true,
            format: LogFormat::Json,
            ..Self::default()
        }
    }

    /// Returns a copy with a different filter directive.
    #[must_use]
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }
}
