//! Error types for the Protobind core.

/// Core error type for Protobind infrastructure.
#[derive(Debug, thiserror::Error)]
pub enum ProtobindError {
    /// A configuration value could not be parsed.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Convenience result type for Protobind operations.
pub type ProtobindResult<T> = Result<T, ProtobindError>;
