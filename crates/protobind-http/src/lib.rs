//! HTTP binding layer for protobuf services.
//!
//! A request travels through the crate in a fixed order:
//!
//! - **Path**: the URI path is percent-decoded into a [`PathStack`]
//! - **Binding**: a mounted [`ProtobufBinding`] claims the request or misses
//! - **Router**: the last path segment is resolved to a method descriptor
//! - **Materializer**: verb and content type decide whether a body is decoded
//! - **Handler**: the service is called once and its completion becomes the response
//!
//! A miss at any routing step is not an error. When every binding misses, the
//! [`ProtobufHttpService`] answers `404`; failures after a binding matched answer
//! `500` with a plain-text body.

pub mod binding;
pub mod body;
pub mod handler;
pub mod materialize;
pub mod path;
pub mod response;
pub mod router;
pub mod service;

#[cfg(test)]
pub(crate) mod testing;

pub use binding::{Binding, PendingCall, ProtobufBinding};
pub use body::ProtobufResponseBody;
pub use handler::InvocationHandler;
pub use materialize::{Materialized, Payload};
pub use path::PathStack;
pub use service::{ProtobufHttpConfig, ProtobufHttpService};
