//! Response construction.
//!
//! Success responses carry the encoded response message under the protobuf
//! media type. Failures are never encoded as protobuf: the client may not know
//! any error schema, so they are plain text of the form
//!
//! ```text
//! <message>
//! <diagnostic trace>
//! ```

use bytes::Bytes;
use protobind_model::{PROTOBUF_CONTENT_TYPE, RpcError};

use crate::body::ProtobufResponseBody;

/// Content type for error and not-found responses.
pub const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Header carrying the per-request identifier.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Build a `200` response from an encoded response message.
#[must_use]
pub fn protobuf_response(body: Bytes) -> http::Response<ProtobufResponseBody> {
    http::Response::builder()
        .status(http::StatusCode::OK)
        .header(http::header::CONTENT_TYPE, PROTOBUF_CONTENT_TYPE)
        .body(ProtobufResponseBody::from_bytes(body))
        .expect("valid protobuf response")
}

/// Render the plain-text error body: the message, a newline, then the trace.
#[must_use]
pub fn error_body(error: &RpcError, include_trace: bool) -> String {
    let trace = if include_trace {
        error.trace()
    } else {
        String::new()
    };
    format!("{}\n{trace}", error.message)
}

/// Convert an `RpcError` into a complete plain-text HTTP response.
#[must_use]
pub fn error_to_response(
    error: &RpcError,
    include_trace: bool,
) -> http::Response<ProtobufResponseBody> {
    http::Response::builder()
        .status(error.status_code)
        .header(http::header::CONTENT_TYPE, TEXT_CONTENT_TYPE)
        .body(ProtobufResponseBody::from_string(error_body(
            error,
            include_trace,
        )))
        .expect("valid error response")
}

/// Build the `404` returned when no binding claims a request.
#[must_use]
pub fn not_found_response(
    method: &http::Method,
    path: &str,
) -> http::Response<ProtobufResponseBody> {
    http::Response::builder()
        .status(http::StatusCode::NOT_FOUND)
        .header(http::header::CONTENT_TYPE, TEXT_CONTENT_TYPE)
        .body(ProtobufResponseBody::from_string(format!(
            "no service method bound to {method} {path}\n"
        )))
        .expect("valid not-found response")
}

/// Add headers common to every response.
#[must_use]
pub fn add_common_headers(
    mut response: http::Response<ProtobufResponseBody>,
    request_id: &str,
) -> http::Response<ProtobufResponseBody> {
    let headers = response.headers_mut();

    if let Ok(hv) = http::HeaderValue::from_str(request_id) {
        headers.entry(REQUEST_ID_HEADER).or_insert(hv);
    }

    headers.insert(
        http::header::SERVER,
        http::HeaderValue::from_static("Protobind"),
    );

    response
}
