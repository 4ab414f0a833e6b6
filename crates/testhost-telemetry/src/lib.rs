//! Logging for in-memory test hosts.
//!
//! - **Capture**: [`LogContext`] records every event a fixture's requests
//!   produce, for assertions
//! - **Echo**: [`LogConfig`] optionally mirrors those events to the test
//!   output as pretty, compact or JSON lines
//! - **Loggers**: [`LoggerFactory`] gives application code category loggers
//!   bound to the fixture's context
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────── fixture ─────────────────────────┐
//! │                                                           │
//! │   TestServer::send ──► request span ──► endpoint events   │
//! │          │                                                │
//! │          └── runs under LogContext::dispatch()            │
//! │                         │                                 │
//! │              ┌──────────┴──────────┐                      │
//! │              ▼                     ▼                      │
//! │       CaptureLayer           fmt layer (optional)         │
//! │       Vec<LogRecord>         test writer                  │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! No global subscriber is required. [`init_logging`] installs one for
//! debugging sessions that want output from outside any fixture too.
//!
//! # Example
//!
//! ```
//! use testhost_telemetry::{LogConfig, LogContext};
//!
//! let logs = LogContext::from_config(&LogConfig::default().with_level("debug")).unwrap();
//! logs.in_scope(|| tracing::debug!("service constructed"));
//! assert!(logs.contains_message("service constructed"));
//! ```

#![warn(missing_docs)]

pub mod capture;
pub mod config;
pub mod error;
pub mod logger;
pub mod logging;

pub use capture::{CaptureLayer, LogContext, LogRecord};
pub use config::{LogConfig, LogFormat};
pub use error::TelemetryError;
pub use logger::{Logger, LoggerFactory};
pub use logging::{create_env_filter, fields, init_logging};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
