//! The HTTP service tying bindings, body collection and invocation together.
//!
//! [`ProtobufHttpService`] processes each request through:
//!
//! 1. Path decoding into a [`PathStack`]
//! 2. Binding: every mounted service is offered the request in registration order
//! 3. Body collection, only when the matched call carries a protobuf payload
//! 4. Materialization and synchronous invocation
//! 5. Common response headers (`x-request-id`, `server`)

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Limited};
use protobind_core::DEFAULT_MAX_BODY_BYTES;
use protobind_model::{RpcContext, RpcError};
use tracing::debug;

use crate::binding::{Binding, PendingCall, ProtobufBinding};
use crate::body::ProtobufResponseBody;
use crate::handler::failure_response;
use crate::path::PathStack;
use crate::response::{add_common_headers, not_found_response};

/// Configuration for the protobuf HTTP service.
#[derive(Debug, Clone)]
pub struct ProtobufHttpConfig {
    /// Maximum accepted request body size in bytes.
    pub max_body_bytes: usize,
    /// Whether error responses carry a diagnostic trace after the message.
    pub error_trace: bool,
}

impl Default for ProtobufHttpConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            error_trace: true,
        }
    }
}

/// Hyper `Service` dispatching requests to mounted protobuf services.
#[derive(Debug, Clone)]
pub struct ProtobufHttpService {
    bindings: Arc<[ProtobufBinding]>,
    config: Arc<ProtobufHttpConfig>,
}

impl ProtobufHttpService {
    /// Create a service over `bindings`, tried in order.
    #[must_use]
    pub fn new(bindings: Vec<ProtobufBinding>, config: ProtobufHttpConfig) -> Self {
        Self {
            bindings: bindings.into(),
            config: Arc::new(config),
        }
    }

    /// Fully qualified names of the mounted services.
    #[must_use]
    pub fn service_names(&self) -> Vec<String> {
        self.bindings
            .iter()
            .map(|b| b.service_name().to_owned())
            .collect()
    }

    /// Mount points of the mounted services, in registration order.
    #[must_use]
    pub fn mount_paths(&self) -> Vec<String> {
        self.bindings.iter().map(ProtobufBinding::mount_path).collect()
    }

    /// Process one request to completion.
    pub async fn handle<B>(&self, req: http::Request<B>) -> http::Response<ProtobufResponseBody>
    where
        B: http_body::Body<Data = Bytes>,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let request_id = uuid::Uuid::new_v4().to_string();
        let response = process_request(req, &self.bindings, &self.config, &request_id).await;
        add_common_headers(response, &request_id)
    }
}

impl<B> hyper::service::Service<http::Request<B>> for ProtobufHttpService
where
    B: http_body::Body<Data = Bytes> + Send + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    type Response = http::Response<ProtobufResponseBody>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<B>) -> Self::Future {
        let svc = self.clone();
        Box::pin(async move { Ok(svc.handle(req).await) })
    }
}

/// Offer the request to each binding until one claims it.
fn bind(
    bindings: &[ProtobufBinding],
    method: &http::Method,
    headers: &http::HeaderMap,
    path: &PathStack,
) -> Option<PendingCall> {
    bindings.iter().find_map(|binding| {
        let mut rest = path.clone();
        if !rest.strip_prefix(binding.mount_segments()) {
            return None;
        }
        match binding.try_bind(method, headers, &mut rest) {
            Binding::Bound(call) => Some(call),
            Binding::Miss => None,
        }
    })
}

/// Process a single request through the full pipeline.
async fn process_request<B>(
    req: http::Request<B>,
    bindings: &[ProtobufBinding],
    config: &ProtobufHttpConfig,
    request_id: &str,
) -> http::Response<ProtobufResponseBody>
where
    B: http_body::Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let (parts, incoming) = req.into_parts();
    let path = PathStack::from_path(parts.uri.path());

    // 1. Bind. A miss everywhere is a plain 404, not an error.
    let Some(call) = bind(bindings, &parts.method, &parts.headers, &path) else {
        debug!(
            request_id,
            method = %parts.method,
            path = parts.uri.path(),
            "no binding claimed request",
        );
        return not_found_response(&parts.method, parts.uri.path());
    };

    // 2. Collect the body only when a message is expected.
    let body = if call.needs_body() {
        match collect_body(incoming, config.max_body_bytes).await {
            Ok(body) => body,
            Err(err) => {
                let err = err.with_method(call.method().full_name());
                return failure_response(&err, request_id, config.error_trace);
            }
        }
    } else {
        Bytes::new()
    };

    // 3. Decode the request message.
    let handler = match call.materialize(RpcContext::new(request_id), body) {
        Ok(handler) => handler,
        Err(err) => return failure_response(&err, request_id, config.error_trace),
    };

    // 4. Invoke.
    handler.process(config.error_trace)
}

/// Collect the incoming body into a single `Bytes` buffer, up to `limit` bytes.
async fn collect_body<B>(incoming: B, limit: usize) -> Result<Bytes, RpcError>
where
    B: http_body::Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    Limited::new(incoming, limit)
        .collect()
        .await
        .map(http_body_util::Collected::to_bytes)
        .map_err(RpcError::body_read)
}
