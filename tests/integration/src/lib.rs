//! Integration tests for the Protobind server.
//!
//! These tests require a running Protobind server at `localhost:4580`.
//! They are marked `#[ignore]` so they don't run during normal `cargo test`.
//!
//! Run them with:
//! ```text
//! cargo test -p protobind-integration -- --ignored
//! ```

use std::sync::Once;

use bytes::Bytes;

mod test_health;
mod test_rpc;

/// Media type of protobuf request and response bodies.
pub const PROTOBUF_CONTENT_TYPE: &str = "application/vnd.google.protobuf";

/// Mount point of the built-in echo service.
pub const ECHO_MOUNT: &str = "/protobind.echo.EchoService";

static INIT: Once = Once::new();

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// Endpoint URL for the server.
fn endpoint_url() -> String {
    std::env::var("PROTOBIND_ENDPOINT_URL").unwrap_or_else(|_| "http://localhost:4580".to_owned())
}

/// Wire shape of `protobind.echo.EchoRequest` and `EchoResponse`.
#[derive(Clone, PartialEq, prost::Message)]
pub struct EchoText {
    /// The text to echo.
    #[prost(string, tag = "1")]
    pub text: String,
}

/// Wire shape of `protobind.echo.StatsResponse`.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Stats {
    /// Calls served since startup.
    #[prost(uint64, tag = "1")]
    pub calls: u64,
}

/// HTTP client for the echo service.
#[derive(Debug, Clone)]
pub struct EchoClient {
    http: reqwest::Client,
    base: String,
}

impl EchoClient {
    /// Client pointing at the local server.
    #[must_use]
    pub fn new() -> Self {
        init_tracing();
        Self {
            http: reqwest::Client::new(),
            base: endpoint_url(),
        }
    }

    /// Absolute URL for `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    /// `GET` a method of the echo service.
    pub async fn get(&self, method: &str) -> anyhow::Result<reqwest::Response> {
        let url = self.url(&format!("{ECHO_MOUNT}/{method}"));
        tracing::debug!(%url, "GET");
        Ok(self.http.get(url).send().await?)
    }

    /// `POST` a raw protobuf body to a method of the echo service.
    pub async fn post(&self, method: &str, body: Bytes) -> anyhow::Result<reqwest::Response> {
        let url = self.url(&format!("{ECHO_MOUNT}/{method}"));
        tracing::debug!(%url, len = body.len(), "POST");
        Ok(self
            .http
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, PROTOBUF_CONTENT_TYPE)
            .body(body)
            .send()
            .await?)
    }

    /// Send an arbitrary request to the server.
    pub async fn request(
        &self,
        verb: reqwest::Method,
        path: &str,
    ) -> anyhow::Result<reqwest::Response> {
        Ok(self.http.request(verb, self.url(path)).send().await?)
    }
}

impl Default for EchoClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Encode `text` as an echo request body.
#[must_use]
pub fn echo_body(text: &str) -> Bytes {
    let msg = EchoText {
        text: text.to_owned(),
    };
    Bytes::from(prost::Message::encode_to_vec(&msg))
}
