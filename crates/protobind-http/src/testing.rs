//! Test service with one method per calling-contract behavior.

use std::sync::Arc;

use bytes::Bytes;
use prost::Message;
use protobind_model::schema::{FieldType, ProtoFileBuilder, find_service};
use protobind_model::{
    Completion, DynamicMessage, MethodDescriptor, ProtobufService, RpcContext, ServiceDescriptor,
    Value,
};

pub(crate) const SERVICE_NAME: &str = "test.rpc.TestService";

/// A service whose methods each exercise one way of honoring or breaking the
/// completion contract.
#[derive(Debug)]
pub(crate) struct TestService {
    descriptor: ServiceDescriptor,
}

impl TestService {
    pub(crate) fn new() -> Self {
        let pool = ProtoFileBuilder::new("test_rpc.proto", "test.rpc")
            .message("Empty", &[])
            .message("EchoRequest", &[("text", 1, FieldType::String)])
            .message("EchoResponse", &[("text", 1, FieldType::String)])
            .service(
                "TestService",
                &[
                    ("Ping", "Empty", "Empty"),
                    ("Echo", "EchoRequest", "EchoResponse"),
                    ("Fail", "EchoRequest", "EchoResponse"),
                    ("Forget", "EchoRequest", "EchoResponse"),
                    ("Twice", "EchoRequest", "EchoResponse"),
                    ("Panic", "EchoRequest", "EchoResponse"),
                    ("WrongType", "EchoRequest", "EchoResponse"),
                ],
            )
            .build()
            .expect("test descriptor is valid");
        let descriptor = find_service(&pool, SERVICE_NAME).expect("test service is declared");
        Self { descriptor }
    }

    pub(crate) fn shared() -> Arc<dyn ProtobufService> {
        Arc::new(Self::new())
    }

    pub(crate) fn method(&self, name: &str) -> MethodDescriptor {
        self.descriptor
            .methods()
            .find(|m| m.name() == name)
            .expect("method is declared")
    }
}

impl ProtobufService for TestService {
    fn descriptor(&self) -> ServiceDescriptor {
        self.descriptor.clone()
    }

    fn call_method(
        &self,
        _ctx: &RpcContext,
        method: &MethodDescriptor,
        request: Option<DynamicMessage>,
        done: &mut Completion,
    ) -> anyhow::Result<()> {
        let text = request
            .as_ref()
            .and_then(|r| r.get_field_by_name("text"))
            .and_then(|v| v.as_str().map(str::to_owned))
            .unwrap_or_default();

        let mut reply = DynamicMessage::new(method.output());
        match method.name() {
            "Ping" => done.complete(None),
            "Echo" => {
                reply.set_field_by_name("text", Value::String(text));
                done.complete(Some(reply));
            }
            "Fail" => anyhow::bail!("backend exploded"),
            "Forget" => {}
            "Twice" => {
                done.complete(Some(reply.clone()));
                done.complete(Some(reply));
            }
            "Panic" => panic!("kaboom"),
            "WrongType" => done.complete(Some(DynamicMessage::new(method.input()))),
            other => anyhow::bail!("unhandled method {other}"),
        }
        Ok(())
    }
}

pub(crate) const GREETER_NAME: &str = "test.rpc.Greeter";

/// A service whose request prototype arrives pre-populated with `lang = "en"`.
///
/// `Greet` answers with the request it received, so the merge of body and
/// prototype is visible in the response.
#[derive(Debug)]
pub(crate) struct Greeter {
    descriptor: ServiceDescriptor,
}

impl Greeter {
    pub(crate) fn new() -> Self {
        let pool = ProtoFileBuilder::new("greeter.proto", "test.rpc")
            .message(
                "Greeting",
                &[("text", 1, FieldType::String), ("lang", 2, FieldType::String)],
            )
            .service("Greeter", &[("Greet", "Greeting", "Greeting")])
            .build()
            .expect("test descriptor is valid");
        let descriptor = find_service(&pool, GREETER_NAME).expect("test service is declared");
        Self { descriptor }
    }

    pub(crate) fn shared() -> Arc<dyn ProtobufService> {
        Arc::new(Self::new())
    }

    pub(crate) fn greet(&self) -> MethodDescriptor {
        self.descriptor
            .methods()
            .next()
            .expect("Greet is declared")
    }
}

impl ProtobufService for Greeter {
    fn descriptor(&self) -> ServiceDescriptor {
        self.descriptor.clone()
    }

    fn request_prototype(&self, method: &MethodDescriptor) -> DynamicMessage {
        let mut prototype = DynamicMessage::new(method.input());
        prototype.set_field_by_name("lang", Value::String("en".to_owned()));
        prototype
    }

    fn call_method(
        &self,
        _ctx: &RpcContext,
        _method: &MethodDescriptor,
        request: Option<DynamicMessage>,
        done: &mut Completion,
    ) -> anyhow::Result<()> {
        done.complete(request);
        Ok(())
    }
}

/// Read a string field of a decoded message.
pub(crate) fn string_field(msg: &DynamicMessage, name: &str) -> String {
    msg.get_field_by_name(name)
        .and_then(|v| v.as_str().map(str::to_owned))
        .unwrap_or_default()
}

/// Encode an `EchoRequest`/`EchoResponse`-shaped message carrying `text`.
pub(crate) fn encode_text(method: &MethodDescriptor, text: &str) -> Bytes {
    let mut msg = DynamicMessage::new(method.input());
    msg.set_field_by_name("text", Value::String(text.to_owned()));
    Bytes::from(msg.encode_to_vec())
}

/// Decode the `text` field of a response body for `method`.
pub(crate) fn decode_text(method: &MethodDescriptor, body: &[u8]) -> String {
    let msg = DynamicMessage::decode(method.output(), body).expect("valid response body");
    msg.get_field_by_name("text")
        .and_then(|v| v.as_str().map(str::to_owned))
        .unwrap_or_default()
}
