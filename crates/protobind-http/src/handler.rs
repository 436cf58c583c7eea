//! Invocation of a bound service method.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use bytes::Bytes;
use protobind_model::{
    Completion, DynamicMessage, MethodDescriptor, ProtobufService, RpcContext, RpcError,
};
use tracing::{debug, error, warn};

use crate::body::ProtobufResponseBody;
use crate::response::{error_to_response, protobuf_response};

/// A resolved method and its decoded request, ready to be invoked once.
///
/// Processing consumes the handler; it is never reused across requests.
pub struct InvocationHandler {
    service: Arc<dyn ProtobufService>,
    method: MethodDescriptor,
    request: Option<DynamicMessage>,
    ctx: RpcContext,
}

impl fmt::Debug for InvocationHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvocationHandler")
            .field("service", &self.service.descriptor().full_name())
            .field("method", &self.method.name())
            .field("request", &self.request)
            .field("ctx", &self.ctx)
            .finish()
    }
}

impl InvocationHandler {
    /// Create a handler for one call.
    #[must_use]
    pub fn new(
        service: Arc<dyn ProtobufService>,
        method: MethodDescriptor,
        request: Option<DynamicMessage>,
        ctx: RpcContext,
    ) -> Self {
        Self {
            service,
            method,
            request,
            ctx,
        }
    }

    /// The method this handler will invoke.
    #[must_use]
    pub fn method(&self) -> &MethodDescriptor {
        &self.method
    }

    /// The decoded request, if the HTTP request carried one.
    #[must_use]
    pub fn request(&self) -> Option<&DynamicMessage> {
        self.request.as_ref()
    }

    /// Call the service and return the encoded response body.
    ///
    /// Errors returned by the service, panics, and a completion that fired
    /// zero or several times all become an `RpcError` tagged with the method.
    pub fn invoke(self) -> Result<Bytes, RpcError> {
        let Self {
            service,
            method,
            request,
            ctx,
        } = self;

        debug!(
            request_id = %ctx.request_id,
            method = %method.full_name(),
            has_request = request.is_some(),
            "invoking protobuf method",
        );

        let mut done = Completion::new(&method);
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            service.call_method(&ctx, &method, request, &mut done)
        }));

        let result = match outcome {
            Ok(Ok(())) => done.into_body(),
            Ok(Err(err)) => Err(RpcError::service_failure(err)),
            Err(payload) => Err(RpcError::service_panicked(payload.as_ref())),
        };

        result.map_err(|err| err.with_method(method.full_name()))
    }

    /// Invoke the method and turn the outcome into the HTTP response.
    #[must_use]
    pub fn process(self, include_trace: bool) -> http::Response<ProtobufResponseBody> {
        let request_id = self.ctx.request_id.clone();
        match self.invoke() {
            Ok(body) => protobuf_response(body),
            Err(err) => failure_response(&err, &request_id, include_trace),
        }
    }
}

/// Log a failed call and build its plain-text response.
#[must_use]
pub fn failure_response(
    err: &RpcError,
    request_id: &str,
    include_trace: bool,
) -> http::Response<ProtobufResponseBody> {
    let method = err.method.as_deref().unwrap_or("-");
    if err.code.is_contract_violation() {
        error!(
            request_id,
            method,
            code = %err.code,
            error = %err.message,
            "service broke its calling contract",
        );
    } else {
        warn!(
            request_id,
            method,
            code = %err.code,
            error = %err.message,
            "protobuf call failed",
        );
    }
    error_to_response(err, include_trace)
}
