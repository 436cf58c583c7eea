//! RPC error types.
//!
//! Every failure past the binding decision ends up as an [`RpcError`] and is
//! rendered as a plain-text `500` response. Binding misses are not errors and
//! never reach this type.

use std::any::Any;
use std::backtrace::BacktraceStatus;
use std::error::Error as StdError;
use std::fmt;

/// Well-known RPC failure codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum RpcErrorCode {
    /// The request body could not be decoded into the method's input type.
    MalformedPayload,
    /// The request body could not be read from the connection.
    BodyRead,
    /// The service returned an error from `call_method`.
    ServiceFailure,
    /// The service panicked inside `call_method`.
    ServicePanicked,
    /// The service returned without completing the call.
    NotCompleted,
    /// The service completed the call more than once.
    CompletedMoreThanOnce,
    /// The service completed with a message of the wrong type.
    ResponseTypeMismatch,
    /// The response message could not be encoded.
    ResponseEncode,
    /// A descriptor pool or service descriptor is invalid.
    InvalidDescriptor,
}

impl RpcErrorCode {
    /// Returns the short error code string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MalformedPayload => "MalformedPayload",
            Self::BodyRead => "BodyRead",
            Self::ServiceFailure => "ServiceFailure",
            Self::ServicePanicked => "ServicePanicked",
            Self::NotCompleted => "NotCompleted",
            Self::CompletedMoreThanOnce => "CompletedMoreThanOnce",
            Self::ResponseTypeMismatch => "ResponseTypeMismatch",
            Self::ResponseEncode => "ResponseEncode",
            Self::InvalidDescriptor => "InvalidDescriptor",
        }
    }

    /// Whether this code means the bound service broke its calling contract.
    #[must_use]
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            Self::ServiceFailure
                | Self::ServicePanicked
                | Self::NotCompleted
                | Self::CompletedMoreThanOnce
                | Self::ResponseTypeMismatch
        )
    }

    /// Returns the HTTP status code for this error.
    ///
    /// Clients cannot be assumed to understand a structured error body, so
    /// every failure maps to `500` and is reported as plain text.
    #[must_use]
    pub fn default_status_code(&self) -> http::StatusCode {
        http::StatusCode::INTERNAL_SERVER_ERROR
    }
}

impl fmt::Display for RpcErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed RPC invocation.
#[derive(Debug)]
pub struct RpcError {
    /// The error code.
    pub code: RpcErrorCode,
    /// A human-readable error message.
    pub message: String,
    /// The HTTP status code.
    pub status_code: http::StatusCode,
    /// Fully qualified name of the method being invoked, if known.
    pub method: Option<String>,
    /// A rendered backtrace captured where the error originated, if any.
    pub backtrace: Option<String>,
    /// The underlying source error, if any.
    pub source: Option<Box<dyn StdError + Send + Sync>>,
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RpcError({}): {}", self.code, self.message)
    }
}

impl StdError for RpcError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

impl RpcError {
    /// Create a new `RpcError` from an error code.
    #[must_use]
    pub fn new(code: RpcErrorCode) -> Self {
        Self::with_message(code, code.as_str())
    }

    /// Create a new `RpcError` with a custom message.
    #[must_use]
    pub fn with_message(code: RpcErrorCode, message: impl Into<String>) -> Self {
        Self {
            status_code: code.default_status_code(),
            message: message.into(),
            code,
            method: None,
            backtrace: None,
            source: None,
        }
    }

    /// Set the source error.
    #[must_use]
    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Record the method this error occurred in.
    #[must_use]
    pub fn with_method(mut self, full_name: impl Into<String>) -> Self {
        self.method = Some(full_name.into());
        self
    }

    // -- Convenience constructors --

    /// The request body is not a valid encoding of `type_name`.
    #[must_use]
    pub fn malformed_payload(type_name: &str, err: prost::DecodeError) -> Self {
        Self::with_message(
            RpcErrorCode::MalformedPayload,
            format!("failed to decode {type_name}: {err}"),
        )
        .with_source(err)
    }

    /// The request body could not be read.
    #[must_use]
    pub fn body_read(message: impl fmt::Display) -> Self {
        Self::with_message(
            RpcErrorCode::BodyRead,
            format!("failed to read request body: {message}"),
        )
    }

    /// The service returned an error.
    ///
    /// A backtrace captured by `anyhow` at the error's origin is kept for the
    /// diagnostic trace.
    #[must_use]
    pub fn service_failure(err: anyhow::Error) -> Self {
        let backtrace = match err.backtrace().status() {
            BacktraceStatus::Captured => Some(err.backtrace().to_string()),
            _ => None,
        };
        let mut rpc = Self::with_message(RpcErrorCode::ServiceFailure, err.to_string());
        rpc.backtrace = backtrace;
        rpc.source = Some(err.into());
        rpc
    }

    /// The service panicked; `payload` is what `catch_unwind` returned.
    #[must_use]
    pub fn service_panicked(payload: &(dyn Any + Send)) -> Self {
        let detail = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_owned())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_owned());
        Self::with_message(
            RpcErrorCode::ServicePanicked,
            format!("service panicked: {detail}"),
        )
    }

    /// The service returned without calling its completion.
    #[must_use]
    pub fn not_completed() -> Self {
        Self::with_message(
            RpcErrorCode::NotCompleted,
            "the service must complete the call before returning; \
             asynchronous completion is not supported",
        )
    }

    /// The service called its completion `times` times.
    #[must_use]
    pub fn completed_more_than_once(times: u32) -> Self {
        Self::with_message(
            RpcErrorCode::CompletedMoreThanOnce,
            format!("the service completed the call {times} times; exactly once is required"),
        )
    }

    /// The service completed with a message of an unexpected type.
    #[must_use]
    pub fn response_type_mismatch(expected: &str, actual: &str) -> Self {
        Self::with_message(
            RpcErrorCode::ResponseTypeMismatch,
            format!("the service completed with {actual}, expected {expected}"),
        )
    }

    /// The response message could not be encoded.
    #[must_use]
    pub fn response_encode(err: prost::EncodeError) -> Self {
        Self::with_message(
            RpcErrorCode::ResponseEncode,
            format!("failed to encode response: {err}"),
        )
        .with_source(err)
    }

    /// A descriptor could not be built or found.
    #[must_use]
    pub fn invalid_descriptor(message: impl Into<String>) -> Self {
        Self::with_message(RpcErrorCode::InvalidDescriptor, message)
    }

    /// Render the diagnostic trace that follows the message in error bodies.
    ///
    /// One line per frame of context: the method, each cause not already part
    /// of the message, then the captured backtrace.
    #[must_use]
    pub fn trace(&self) -> String {
        let mut lines = Vec::new();

        if let Some(method) = &self.method {
            lines.push(format!("at {method}"));
        }

        let mut cause = StdError::source(self);
        while let Some(err) = cause {
            let text = err.to_string();
            if !self.message.contains(&text) {
                lines.push(format!("caused by: {text}"));
            }
            cause = err.source();
        }

        if let Some(backtrace) = &self.backtrace {
            lines.push("stack backtrace:".to_owned());
            lines.push(backtrace.trim_end().to_owned());
        }

        lines.join("\n")
    }
}
