//! The built-in echo service.
//!
//! ```text
//! package protobind.echo;
//!
//! message Empty {}
//! message EchoRequest  { string text = 1; }
//! message EchoResponse { string text = 1; }
//! message StatsResponse { uint64 calls = 1; }
//!
//! service EchoService {
//!   rpc Ping(Empty) returns (Empty);
//!   rpc Echo(EchoRequest) returns (EchoResponse);
//!   rpc Reverse(EchoRequest) returns (EchoResponse);
//!   rpc Stats(Empty) returns (StatsResponse);
//! }
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Context;
use protobind_model::schema::{FieldType, ProtoFileBuilder, find_service};
use protobind_model::{
    Completion, DynamicMessage, MethodDescriptor, ProtobufService, RpcContext, RpcError,
    ServiceDescriptor, Value,
};
use tracing::debug;

/// Fully qualified name of the echo service.
pub const ECHO_SERVICE: &str = "protobind.echo.EchoService";

/// Echoes text back and counts the calls it has served.
#[derive(Debug)]
pub struct EchoService {
    descriptor: ServiceDescriptor,
    calls: AtomicU64,
}

impl EchoService {
    /// Build the service and its descriptor.
    pub fn new() -> Result<Self, RpcError> {
        let pool = ProtoFileBuilder::new("protobind/echo.proto", "protobind.echo")
            .message("Empty", &[])
            .message("EchoRequest", &[("text", 1, FieldType::String)])
            .message("EchoResponse", &[("text", 1, FieldType::String)])
            .message("StatsResponse", &[("calls", 1, FieldType::Uint64)])
            .service(
                "EchoService",
                &[
                    ("Ping", "Empty", "Empty"),
                    ("Echo", "EchoRequest", "EchoResponse"),
                    ("Reverse", "EchoRequest", "EchoResponse"),
                    ("Stats", "Empty", "StatsResponse"),
                ],
            )
            .build()?;
        Ok(Self {
            descriptor: find_service(&pool, ECHO_SERVICE)?,
            calls: AtomicU64::new(0),
        })
    }
}

fn request_text(request: Option<&DynamicMessage>) -> String {
    request
        .and_then(|r| r.get_field_by_name("text"))
        .and_then(|v| v.as_str().map(str::to_owned))
        .unwrap_or_default()
}

fn text_response(method: &MethodDescriptor, text: String) -> anyhow::Result<DynamicMessage> {
    let mut response = DynamicMessage::new(method.output());
    response
        .try_set_field_by_name("text", Value::String(text))
        .with_context(|| format!("building {} response", method.full_name()))?;
    Ok(response)
}

impl ProtobufService for EchoService {
    fn descriptor(&self) -> ServiceDescriptor {
        self.descriptor.clone()
    }

    fn call_method(
        &self,
        ctx: &RpcContext,
        method: &MethodDescriptor,
        request: Option<DynamicMessage>,
        done: &mut Completion,
    ) -> anyhow::Result<()> {
        let calls = self.calls.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(request_id = %ctx.request_id, method = method.name(), calls, "echo call");

        match method.name() {
            "Ping" => done.complete(None),
            "Echo" => {
                let text = request_text(request.as_ref());
                done.complete(Some(text_response(method, text)?));
            }
            "Reverse" => {
                let text = request_text(request.as_ref()).chars().rev().collect();
                done.complete(Some(text_response(method, text)?));
            }
            "Stats" => {
                let mut response = DynamicMessage::new(method.output());
                response
                    .try_set_field_by_name("calls", Value::U64(calls))
                    .context("building Stats response")?;
                done.complete(Some(response));
            }
            other => anyhow::bail!("method {other} is declared but not implemented"),
        }
        Ok(())
    }
}
