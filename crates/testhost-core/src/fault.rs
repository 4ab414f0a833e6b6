//! Records of unhandled faults inside the request pipeline.

use std::any::Any;
use std::fmt;

/// Type name reported for faults that were panics.
pub const PANIC_TYPE_NAME: &str = "panic";

/// An unhandled failure raised by application code while serving a request.
///
/// The endpoint dispatcher attaches a `Fault` to the 500 response it
/// produces; the exception-headers stage turns it into response headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
    type_name: String,
    message: String,
}

impl Fault {
    /// Creates a fault from its parts.
    #[must_use]
    pub fn new(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            message: message.into(),
        }
    }

    /// Creates a fault from an error value, naming its concrete type.
    #[must_use]
    pub fn from_error<E: std::error::Error>(error: &E) -> Self {
        Self::new(std::any::type_name::<E>(), error.to_string())
    }

    /// Creates a fault from a caught panic payload.
    #[must_use]
    pub fn from_panic(payload: &(dyn Any + Send)) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_string()
        };
        Self::new(PANIC_TYPE_NAME, message)
    }

    /// Returns the fault's type name.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Returns the fault's message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns `true` if the fault was a panic.
    #[must_use]
    pub fn is_panic(&self) -> bool {
        self.type_name == PANIC_TYPE_NAME
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.type_name, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct LoaderError;

    impl fmt::Display for LoaderError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("Loader exception message")
        }
    }

    impl std::error::Error for LoaderError {}

    #[test]
    fn test_from_error_uses_type_name() {
        let fault = Fault::from_error(&LoaderError);
        assert!(fault.type_name().ends_with("LoaderError"));
        assert_eq!(fault.message(), "Loader exception message");
        assert!(!fault.is_panic());
    }

    #[test]
    fn test_from_panic_payloads() {
        let fault = Fault::from_panic(&"boom");
        assert!(fault.is_panic());
        assert_eq!(fault.message(), "boom");

        let fault = Fault::from_panic(&String::from("owned boom"));
        assert_eq!(fault.message(), "owned boom");

        let fault = Fault::from_panic(&42_u32);
        assert_eq!(fault.message(), "unknown panic payload");
    }

    #[test]
    fn test_display() {
        let fault = Fault::new("MyError", "went wrong");
        assert_eq!(fault.to_string(), "MyError: went wrong");
    }
}
