//! Gateway service in front of the protobuf bindings.
//!
//! Health-check endpoints (`/_protobind/health`, `/_health`, `/health`) are
//! intercepted here and report the mounted services. Everything else is
//! forwarded to the [`ProtobufHttpService`].

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use hyper::service::Service;

use protobind_http::{ProtobufHttpService, ProtobufResponseBody};

/// Canonical health endpoint, also used by `--health-check`.
pub const HEALTH_PATH: &str = "/_protobind/health";

/// Gateway that answers health probes and forwards RPC requests.
#[derive(Debug, Clone)]
pub struct GatewayService {
    rpc: ProtobufHttpService,
    version: &'static str,
}

impl GatewayService {
    /// Create a new gateway over the bound services.
    pub fn new(rpc: ProtobufHttpService, version: &'static str) -> Self {
        Self { rpc, version }
    }

    /// Fully qualified names of the mounted services.
    pub fn service_names(&self) -> Vec<String> {
        self.rpc.service_names()
    }

    fn health_check_response(&self) -> http::Response<ProtobufResponseBody> {
        let services: serde_json::Map<String, serde_json::Value> = self
            .rpc
            .service_names()
            .into_iter()
            .map(|name| (name, serde_json::Value::from("running")))
            .collect();
        let body = serde_json::json!({
            "services": services,
            "mounts": self.rpc.mount_paths(),
            "version": self.version,
        });
        http::Response::builder()
            .status(http::StatusCode::OK)
            .header(http::header::CONTENT_TYPE, "application/json")
            .body(ProtobufResponseBody::from_string(body.to_string()))
            .expect("static health response should be valid")
    }
}

impl<B> Service<http::Request<B>> for GatewayService
where
    B: http_body::Body<Data = Bytes> + Send + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    type Response = http::Response<ProtobufResponseBody>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<B>) -> Self::Future {
        if is_health_check(req.method(), req.uri().path()) {
            let resp = self.health_check_response();
            return Box::pin(async { Ok(resp) });
        }

        let rpc = self.rpc.clone();
        Box::pin(async move { Ok(rpc.handle(req).await) })
    }
}

/// Check if the request is a health check probe.
fn is_health_check(method: &http::Method, path: &str) -> bool {
    *method == http::Method::GET
        && (path == HEALTH_PATH || path == "/_health" || path == "/health")
}
