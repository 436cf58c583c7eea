//! Request materialization: verb and content-type negotiation plus decoding.
//!
//! | Verb   | Content type                         | Outcome                    |
//! |--------|--------------------------------------|----------------------------|
//! | `GET`  | any                                  | no request message         |
//! | `POST` | exactly `application/vnd.google.protobuf` | body decoded as one message |
//! | `POST` | anything else or missing             | binding miss               |
//! | other  | any                                  | binding miss               |
//!
//! Negotiation never touches the body, so a miss leaves the body available to
//! another binding. Decoding happens only after the binding has matched.

use bytes::Bytes;
use http::Method;
use protobind_model::codec::decode_message;
use protobind_model::{DynamicMessage, PROTOBUF_CONTENT_TYPE, RpcError};

/// What a matched request carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payload {
    /// No request message (`GET`).
    Empty,
    /// One encoded request message (`POST`).
    Protobuf,
}

/// The outcome of materializing a request in one step.
#[derive(Debug, Clone)]
pub enum Materialized {
    /// The request carries no message.
    Absent,
    /// The decoded request message.
    Message(DynamicMessage),
    /// The verb or content type is not handled here.
    Miss,
}

/// Extract the `content-type` header as a string, if present and valid.
#[must_use]
pub fn content_type(headers: &http::HeaderMap) -> Option<&str> {
    headers
        .get(http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
}

/// Decide from verb and content type whether this request is handled, and how.
///
/// The content type must match the protobuf media type exactly; parameters or
/// different casing are a miss.
#[must_use]
pub fn negotiate(method: &Method, content_type: Option<&str>) -> Option<Payload> {
    if *method == Method::GET {
        Some(Payload::Empty)
    } else if *method == Method::POST && content_type == Some(PROTOBUF_CONTENT_TYPE) {
        Some(Payload::Protobuf)
    } else {
        None
    }
}

/// Build the request message for a negotiated payload.
///
/// `prototype` is a fresh, empty message of the method's input type. The
/// whole body is decoded as one message; malformed bytes are a fatal error.
pub fn decode_request(
    payload: Payload,
    prototype: DynamicMessage,
    body: Bytes,
) -> Result<Option<DynamicMessage>, RpcError> {
    match payload {
        Payload::Empty => Ok(None),
        Payload::Protobuf => decode_message(prototype, body).map(Some),
    }
}

/// Negotiate and decode in one step.
pub fn materialize(
    method: &Method,
    content_type: Option<&str>,
    body: Bytes,
    prototype: DynamicMessage,
) -> Result<Materialized, RpcError> {
    let Some(payload) = negotiate(method, content_type) else {
        return Ok(Materialized::Miss);
    };
    Ok(match decode_request(payload, prototype, body)? {
        Some(message) => Materialized::Message(message),
        None => Materialized::Absent,
    })
}
