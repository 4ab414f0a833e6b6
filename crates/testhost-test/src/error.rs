//! Test error types.

use std::fmt;

use testhost_config::ConfigError;
use testhost_core::HostError;
use testhost_server::ServerError;
use testhost_telemetry::TelemetryError;

/// Errors that can occur while driving a hosted site.
#[derive(Debug)]
pub enum TestError {
    /// Request building failed
    RequestBuild(String),
    /// Header name or value is invalid
    InvalidHeader(String),
    /// Response body reading failed
    BodyRead(String),
    /// JSON serialization/deserialization failed
    Json(serde_json::Error),
    /// Request processing failed
    Processing(String),
    /// Harness configuration or log capture is invalid
    Configuration(String),
    /// The site could not be hosted
    Host(HostError),
    /// The server rejected the dispatch
    Server(ServerError),
}

impl fmt::Display for TestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RequestBuild(msg) => write!(f, "Request build error: {msg}"),
            Self::InvalidHeader(msg) => write!(f, "Invalid header: {msg}"),
            Self::BodyRead(msg) => write!(f, "Body read error: {msg}"),
            Self::Json(e) => write!(f, "JSON error: {e}"),
            Self::Processing(msg) => write!(f, "Processing error: {msg}"),
            Self::Configuration(msg) => write!(f, "Configuration error: {msg}"),
            Self::Host(e) => write!(f, "Host error: {e}"),
            Self::Server(e) => write!(f, "Server error: {e}"),
        }
    }
}

impl std::error::Error for TestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Json(e) => Some(e),
            Self::Host(e) => Some(e),
            Self::Server(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for TestError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

impl From<ConfigError> for TestError {
    fn from(e: ConfigError) -> Self {
        Self::Configuration(e.to_string())
    }
}

impl From<TelemetryError> for TestError {
    fn from(e: TelemetryError) -> Self {
        Self::Configuration(e.to_string())
    }
}

impl From<HostError> for TestError {
    fn from(e: HostError) -> Self {
        Self::Host(e)
    }
}

impl From<ServerError> for TestError {
    fn from(e: ServerError) -> Self {
        Self::Server(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_display() {
        let err = TestError::InvalidHeader("bad name".to_string());
        assert_eq!(err.to_string(), "Invalid header: bad name");
    }

    #[test]
    fn test_host_error_is_source() {
        let err: TestError = HostError::site_not_found("Missing", vec!["BasicWebSite".to_string()]).into();
        assert!(err.to_string().contains("Missing"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_server_error_conversion() {
        let err: TestError = ServerError::shut_down("testhost").into();
        assert!(matches!(err, TestError::Server(ref e) if e.is_shut_down()));
    }
}
