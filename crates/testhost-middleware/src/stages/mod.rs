//! Core middleware stages.
//!
//! These run ahead of any stage a sample site adds:
//!
//! 1. [`request_id`] - Adopt the `RequestId` header or generate an ID
//! 2. [`request_logging`] - Request span and completion log
//! 3. [`exception_headers`] - Fault to 500 with exception headers

pub mod exception_headers;
pub mod request_id;
pub mod request_logging;

pub use exception_headers::{
    ExceptionHeadersMiddleware, EXCEPTION_MESSAGE_HEADER, EXCEPTION_TYPE_HEADER,
};
pub use request_id::{RequestIdMiddleware, REQUEST_ID_HEADER};
pub use request_logging::RequestLoggingMiddleware;
