//! # Testhost Core
//!
//! Core types shared by every testhost crate.
//!
//! - [`di`] - Service registry with singleton, scoped and transient lifetimes
//! - [`RequestContext`] - Per-request state carried through the pipeline
//! - [`RequestId`] - Opaque request correlation identifier
//! - [`HostingEnvironment`] - The environment a sample site believes it runs in
//! - [`Fault`] - An unhandled failure captured while serving a request
//! - [`HostError`] - Errors raised while assembling a host

#![doc(html_root_url = "https://docs.rs/testhost-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;
pub mod di;
mod environment;
mod error;
mod fault;

pub use context::{RequestContext, RequestId};
pub use di::{
    Dispose, Inject, InjectionError, Lifetime, Resolver, ServiceCollection, ServiceProvider,
    ServiceScope,
};
pub use environment::{HostingEnvironment, TEST_ENVIRONMENT};
pub use error::{HostError, HostResult};
pub use fault::{Fault, PANIC_TYPE_NAME};
