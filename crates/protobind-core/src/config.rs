//! Configuration management for Protobind.
//!
//! All configuration is driven by environment variables.

use std::fmt;
use std::str::FromStr;

use crate::error::{ProtobindError, ProtobindResult};

/// Default upper bound for a buffered request body (4 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable, single-line records.
    #[default]
    Text,
    /// One JSON object per record.
    Json,
}

impl FromStr for LogFormat {
    type Err = ProtobindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" | "" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(ProtobindError::Config(format!(
                "unknown log format '{other}', expected 'text' or 'json'"
            ))),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => f.write_str("text"),
            Self::Json => f.write_str("json"),
        }
    }
}

/// Global configuration for Protobind.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtobindConfig {
    /// Bind address for the gateway.
    pub gateway_listen: String,
    /// Log level filter used when `RUST_LOG` is unset.
    pub log_level: String,
    /// Log output format.
    pub log_format: LogFormat,
    /// Maximum accepted request body size in bytes.
    pub max_body_bytes: usize,
    /// Whether error responses carry a diagnostic trace after the message.
    pub error_trace: bool,
}

impl Default for ProtobindConfig {
    fn default() -> Self {
        Self {
            gateway_listen: "0.0.0.0:4580".to_owned(),
            log_level: "info".to_owned(),
            log_format: LogFormat::Text,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            error_trace: true,
        }
    }
}

impl ProtobindConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> ProtobindResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// Unset keys keep their default value; malformed values are rejected.
    pub fn from_lookup<F>(lookup: F) -> ProtobindResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = lookup("GATEWAY_LISTEN") {
            config.gateway_listen = v;
        }
        if let Some(v) = lookup("LOG_LEVEL") {
            config.log_level = v;
        }
        if let Some(v) = lookup("LOG_FORMAT") {
            config.log_format = v.parse()?;
        }
        if let Some(v) = lookup("PROTOBIND_MAX_BODY_BYTES") {
            config.max_body_bytes = v.trim().parse().map_err(|e| {
                ProtobindError::Config(format!("invalid PROTOBIND_MAX_BODY_BYTES '{v}': {e}"))
            })?;
        }
        if let Some(v) = lookup("PROTOBIND_ERROR_TRACE") {
            config.error_trace = parse_bool(&v);
        }

        Ok(config)
    }
}

fn parse_bool(v: &str) -> bool {
    matches!(
        v.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
