//! Core configuration and error types for Protobind.
//!
//! This crate holds the process-wide settings shared by the HTTP binding layer
//! and the server binary.

mod config;
mod error;

pub use config::{DEFAULT_MAX_BODY_BYTES, LogFormat, ProtobindConfig};
pub use error::{ProtobindError, ProtobindResult};
