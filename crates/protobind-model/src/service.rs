//! The service capability and its one-shot completion.

use bytes::{Bytes, BytesMut};
use prost::Message;
use prost_reflect::{
    DynamicMessage, MessageDescriptor, MethodDescriptor, ReflectMessage, ServiceDescriptor,
};

use crate::codec::encode_message;
use crate::error::RpcError;

/// Per-call context handed to [`ProtobufService::call_method`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcContext {
    /// Identifier of the HTTP request carrying this call.
    pub request_id: String,
}

impl RpcContext {
    /// Create a context for the request with the given id.
    #[must_use]
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
        }
    }
}

/// A protobuf service that can be bound to HTTP.
///
/// Implementations describe themselves through a [`ServiceDescriptor`] and
/// answer calls synchronously: `call_method` must call
/// [`Completion::complete`] exactly once before it returns. Returning without
/// completing, or completing twice, is a contract violation reported to the
/// client as a server error.
///
/// A single instance serves concurrent requests, so it must manage its own
/// interior state.
pub trait ProtobufService: Send + Sync + 'static {
    /// The descriptor listing this service's methods.
    fn descriptor(&self) -> ServiceDescriptor;

    /// An empty request message for `method`, into which the body is decoded.
    fn request_prototype(&self, method: &MethodDescriptor) -> DynamicMessage {
        DynamicMessage::new(method.input())
    }

    /// Invoke `method` with `request` (`None` when the HTTP request has no body).
    fn call_method(
        &self,
        ctx: &RpcContext,
        method: &MethodDescriptor,
        request: Option<DynamicMessage>,
        done: &mut Completion,
    ) -> anyhow::Result<()>;
}

/// One-shot completion slot for a single call.
///
/// The first [`complete`](Self::complete) serializes the response into an
/// owned buffer immediately; the message itself is not retained. Every call
/// is counted so that zero or repeated completions can be detected once the
/// service returns.
#[derive(Debug)]
pub struct Completion {
    expected: MessageDescriptor,
    fired: u32,
    body: BytesMut,
    failure: Option<RpcError>,
}

impl Completion {
    /// Create a pending completion for a call to `method`.
    #[must_use]
    pub fn new(method: &MethodDescriptor) -> Self {
        Self {
            expected: method.output(),
            fired: 0,
            body: BytesMut::new(),
            failure: None,
        }
    }

    /// Complete the call with `response`, or with an empty body for `None`.
    pub fn complete(&mut self, response: Option<DynamicMessage>) {
        self.fired = self.fired.saturating_add(1);
        if self.fired > 1 {
            return;
        }

        let Some(message) = response else {
            return;
        };

        let actual = message.descriptor();
        if actual.full_name() != self.expected.full_name() {
            self.failure = Some(RpcError::response_type_mismatch(
                self.expected.full_name(),
                actual.full_name(),
            ));
            return;
        }

        self.body.reserve(message.encoded_len());
        if let Err(err) = encode_message(&message, &mut self.body) {
            self.failure = Some(err);
        }
    }

    /// Whether `complete` has been called at least once.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.fired > 0
    }

    /// How many times `complete` has been called.
    #[must_use]
    pub fn times_completed(&self) -> u32 {
        self.fired
    }

    /// Consume the slot after the service returned, yielding the response body.
    pub fn into_body(self) -> Result<Bytes, RpcError> {
        match self.fired {
            0 => Err(RpcError::not_completed()),
            1 => match self.failure {
                Some(err) => Err(err),
                None => Ok(self.body.freeze()),
            },
            n => Err(RpcError::completed_more_than_once(n)),
        }
    }
}
