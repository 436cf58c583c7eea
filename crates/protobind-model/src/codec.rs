//! Protobuf wire codec over dynamic messages.
//!
//! A request or response body is exactly one encoded message. There is no
//! length prefix, envelope or trailer.

use bytes::{Buf, BufMut};
use prost::Message;
use prost_reflect::{DynamicMessage, ReflectMessage};

use crate::error::RpcError;

/// The only media type accepted for request bodies and produced for responses.
pub const PROTOBUF_CONTENT_TYPE: &str = "application/vnd.google.protobuf";

/// Merge the whole of `body` into `prototype` and return the built message.
///
/// `prototype` is normally an empty message of the method's input type.
pub fn decode_message(
    mut prototype: DynamicMessage,
    body: impl Buf,
) -> Result<DynamicMessage, RpcError> {
    match prototype.merge(body) {
        Ok(()) => Ok(prototype),
        Err(err) => Err(RpcError::malformed_payload(
            prototype.descriptor().full_name(),
            err,
        )),
    }
}

/// Append the encoding of `message` to `out`.
pub fn encode_message(message: &DynamicMessage, out: &mut impl BufMut) -> Result<(), RpcError> {
    message.encode(out).map_err(RpcError::response_encode)
}
