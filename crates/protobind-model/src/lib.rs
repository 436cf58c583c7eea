//! Model types for Protobind.
//!
//! This crate defines everything a protobuf service needs to be bound to HTTP
//! without knowing anything about HTTP itself:
//!
//! - **Codec**: the recognized media type and decode/encode helpers over
//!   [`prost_reflect::DynamicMessage`]
//! - **Service trait**: [`ProtobufService`], the capability a bound object exposes
//! - **Completion**: the one-shot slot a service fills exactly once per call
//! - **Schema**: a small builder for descriptor pools without `protoc`
//! - **Errors**: [`RpcError`] and [`RpcErrorCode`]

pub mod codec;
pub mod error;
pub mod schema;
pub mod service;

pub use codec::PROTOBUF_CONTENT_TYPE;
pub use error::{RpcError, RpcErrorCode};
pub use service::{Completion, ProtobufService, RpcContext};

pub use prost_reflect::{
    DescriptorPool, DynamicMessage, MessageDescriptor, MethodDescriptor, ServiceDescriptor, Value,
};
