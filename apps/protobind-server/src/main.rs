//! Protobind Server - protobuf services over plain HTTP.
//!
//! Each mounted service answers `GET <mount>/<Method>` with no request and
//! `POST <mount>/<Method>` with a body of type `application/vnd.google.protobuf`.
//! The built-in echo service is mounted at `/protobind.echo.EchoService`.
//!
//! # Usage
//!
//! ```text
//! GATEWAY_LISTEN=0.0.0.0:4580 protobind-server
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `GATEWAY_LISTEN` | `0.0.0.0:4580` | Bind address |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `LOG_FORMAT` | `text` | `text` or `json` |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |
//! | `PROTOBIND_MAX_BODY_BYTES` | `4194304` | Largest accepted request body |
//! | `PROTOBIND_ERROR_TRACE` | `true` | Append a diagnostic trace to error bodies |

mod echo;
mod gateway;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as HttpConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use protobind_core::{LogFormat, ProtobindConfig};
use protobind_http::{ProtobufBinding, ProtobufHttpConfig, ProtobufHttpService};

use crate::echo::EchoService;
use crate::gateway::{GatewayService, HEALTH_PATH};

/// Server version reported in health check responses.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
fn init_tracing(log_level: &str, format: LogFormat) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }

    Ok(())
}

/// Build the [`ProtobufHttpConfig`] from the application [`ProtobindConfig`].
fn build_http_config(config: &ProtobindConfig) -> ProtobufHttpConfig {
    ProtobufHttpConfig {
        max_body_bytes: config.max_body_bytes,
        error_trace: config.error_trace,
    }
}

/// Bind the services this server hosts, in the order they are tried.
fn build_bindings() -> Result<Vec<ProtobufBinding>> {
    let echo = EchoService::new().context("failed to build the echo service")?;
    Ok(vec![ProtobufBinding::new(Arc::new(echo))])
}

/// Run the accept loop, serving connections until a shutdown signal is received.
async fn serve(listener: TcpListener, service: GatewayService) -> Result<()> {
    let graceful = hyper_util::server::graceful::GracefulShutdown::new();
    let http = HttpConnBuilder::new(TokioExecutor::new());

    let shutdown = async {
        tokio::signal::ctrl_c().await.ok();
        info!("received shutdown signal, draining connections");
    };

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = listener.accept() => {
                let (stream, peer_addr) = match result {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!(error = %e, "failed to accept connection");
                        continue;
                    }
                };

                let svc = service.clone();
                let conn = http.serve_connection(TokioIo::new(stream), svc);
                let conn = graceful.watch(conn.into_owned());

                tokio::spawn(async move {
                    if let Err(e) = conn.await {
                        error!(peer_addr = %peer_addr, error = %e, "connection error");
                    }
                });
            }

            () = &mut shutdown => {
                info!("shutting down gracefully");
                break;
            }
        }
    }

    graceful.shutdown().await;
    info!("all connections drained, exiting");

    Ok(())
}

/// Query [`HEALTH_PATH`] on a running server and validate the answer.
async fn run_health_check(addr: &str) -> Result<()> {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    let mut stream = TcpStream::connect(addr)
        .await
        .with_context(|| format!("cannot connect to {addr}"))?;

    let request =
        format!("GET {HEALTH_PATH} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await?;

    let mut raw = String::new();
    stream.read_to_string(&mut raw).await?;

    check_health_response(&raw).with_context(|| format!("unhealthy response from {addr}"))
}

/// Accept a raw HTTP/1.1 health response only if it is a `200` whose JSON
/// document lists at least one running service.
fn check_health_response(raw: &str) -> Result<()> {
    let (head, body) = raw
        .split_once("\r\n\r\n")
        .context("health response has no body")?;

    let status = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .context("health response has no status line")?;
    anyhow::ensure!(status == "200", "health endpoint answered {status}");

    let health: serde_json::Value =
        serde_json::from_str(body).context("health body is not JSON")?;
    let running = health["services"]
        .as_object()
        .is_some_and(|services| services.values().any(|state| state == "running"));
    anyhow::ensure!(running, "no service reports running");

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = ProtobindConfig::from_env()?;

    // Handle --health-check flag for Docker HEALTHCHECK.
    if std::env::args().any(|a| a == "--health-check") {
        let addr = config.gateway_listen.replace("0.0.0.0", "127.0.0.1");
        let healthy = run_health_check(&addr).await.is_ok();
        std::process::exit(i32::from(!healthy));
    }

    init_tracing(&config.log_level, config.log_format)?;

    let bindings = build_bindings()?;
    let rpc = ProtobufHttpService::new(bindings, build_http_config(&config));
    info!(
        mounts = ?rpc.mount_paths(),
        max_body_bytes = config.max_body_bytes,
        error_trace = config.error_trace,
        "bound protobuf services",
    );

    let gateway = GatewayService::new(rpc, VERSION);
    let service_names = gateway.service_names();

    let addr: SocketAddr = config
        .gateway_listen
        .parse()
        .with_context(|| format!("invalid bind address: {}", config.gateway_listen))?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!(
        %addr,
        services = ?service_names,
        version = VERSION,
        "starting Protobind Server",
    );

    serve(listener, gateway).await
}
