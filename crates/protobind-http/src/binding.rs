//! Binding a mounted service to incoming requests.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use protobind_model::{MethodDescriptor, ProtobufService, RpcContext, RpcError, ServiceDescriptor};

use crate::handler::InvocationHandler;
use crate::materialize::{Payload, content_type, decode_request, negotiate};
use crate::path::PathStack;
use crate::router::resolve_method;

/// Whether a binding claimed a request.
#[derive(Debug)]
pub enum Binding {
    /// The request targets a method of this binding's service.
    Bound(PendingCall),
    /// The request is not handled here; try the next binding.
    Miss,
}

/// A service instance mounted under a path prefix.
#[derive(Clone)]
pub struct ProtobufBinding {
    mount: Vec<String>,
    service: Arc<dyn ProtobufService>,
    descriptor: ServiceDescriptor,
}

impl fmt::Debug for ProtobufBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProtobufBinding")
            .field("mount", &self.mount_path())
            .field("service", &self.descriptor.full_name())
            .finish_non_exhaustive()
    }
}

impl ProtobufBinding {
    /// Bind `service` under its fully qualified name, e.g. `/pkg.EchoService`.
    #[must_use]
    pub fn new(service: Arc<dyn ProtobufService>) -> Self {
        let descriptor = service.descriptor();
        Self {
            mount: vec![descriptor.full_name().to_owned()],
            service,
            descriptor,
        }
    }

    /// Mount the service under `path` instead (`"/"` mounts at the root).
    ///
    /// The mount is decoded like a request path, so `/my%20api` matches
    /// requests for `/my%20api/<Method>`.
    #[must_use]
    pub fn with_mount(mut self, path: &str) -> Self {
        self.mount = PathStack::from_path(path).into_segments();
        self
    }

    /// Fully qualified name of the bound service.
    #[must_use]
    pub fn service_name(&self) -> &str {
        self.descriptor.full_name()
    }

    /// The mount point as a path, e.g. `/api/echo`.
    #[must_use]
    pub fn mount_path(&self) -> String {
        format!("/{}", self.mount.join("/"))
    }

    /// The mount point split into segments.
    #[must_use]
    pub fn mount_segments(&self) -> &[String] {
        &self.mount
    }

    /// Try to claim a request whose mount point has already been consumed.
    ///
    /// Misses when the remaining path does not name exactly one method, or when
    /// the verb and content type are not handled. The body is not read here.
    #[must_use]
    pub fn try_bind(
        &self,
        method: &http::Method,
        headers: &http::HeaderMap,
        path: &mut PathStack,
    ) -> Binding {
        let Some(descriptor) = resolve_method(&self.descriptor, path) else {
            return Binding::Miss;
        };
        let Some(payload) = negotiate(method, content_type(headers)) else {
            return Binding::Miss;
        };
        Binding::Bound(PendingCall {
            service: Arc::clone(&self.service),
            method: descriptor,
            payload,
        })
    }
}

/// A matched request waiting for its body.
pub struct PendingCall {
    service: Arc<dyn ProtobufService>,
    method: MethodDescriptor,
    payload: Payload,
}

impl fmt::Debug for PendingCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingCall")
            .field("method", &self.method.full_name())
            .field("payload", &self.payload)
            .finish_non_exhaustive()
    }
}

impl PendingCall {
    /// The resolved method.
    #[must_use]
    pub fn method(&self) -> &MethodDescriptor {
        &self.method
    }

    /// Whether the request body must be read before materializing.
    #[must_use]
    pub fn needs_body(&self) -> bool {
        self.payload == Payload::Protobuf
    }

    /// Decode the request from `body` into a fresh prototype and build the handler.
    pub fn materialize(self, ctx: RpcContext, body: Bytes) -> Result<InvocationHandler, RpcError> {
        let prototype = self.service.request_prototype(&self.method);
        let request = decode_request(self.payload, prototype, body)
            .map_err(|err| err.with_method(self.method.full_name()))?;
        Ok(InvocationHandler::new(
            self.service,
            self.method,
            request,
            ctx,
        ))
    }
}
