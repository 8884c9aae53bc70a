//! HTTP server lifecycle management for both jar listeners.
//!
//! Provides [`start_server`] (request gateway) and [`start_push_server`]
//! (persistent channel listener), each of which binds a TCP port and
//! runs its Axum router until the process is terminated.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tracing::info;

use crate::router::{build_push_router, build_router};
use crate::state::AppState;

/// Configuration for the jar's network listeners.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// The host address to bind to (e.g. `0.0.0.0`).
    pub host: String,

    /// TCP port for the request gateway.
    pub http_port: u16,

    /// TCP port for the push channel.
    pub push_port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: String::from("0.0.0.0"),
            http_port: 8080,
            push_port: 8081,
        }
    }
}

/// Errors that can occur when starting or running a listener.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Failed to bind to the network address.
    #[error("bind error: {0}")]
    Bind(String),

    /// The server encountered a fatal error while serving.
    #[error("serve error: {0}")]
    Serve(String),
}

/// Start the request gateway.
///
/// Binds `host:http_port` and serves the REST surface until the process
/// is terminated.
///
/// # Errors
///
/// Returns [`ServerError`] if the TCP listener cannot bind or the
/// server encounters a fatal I/O error.
pub async fn start_server(config: &ServerConfig, state: Arc<AppState>) -> Result<(), ServerError> {
    let router = build_router(state);
    serve_on(&config.host, config.http_port, router, "gateway").await
}

/// Start the push channel listener.
///
/// Binds `host:push_port` and serves the `WebSocket` upgrade route until
/// the process is terminated.
///
/// # Errors
///
/// Returns [`ServerError`] if the TCP listener cannot bind or the
/// server encounters a fatal I/O error.
pub async fn start_push_server(
    config: &ServerConfig,
    state: Arc<AppState>,
) -> Result<(), ServerError> {
    let router = build_push_router(state);
    serve_on(&config.host, config.push_port, router, "push channel").await
}

/// Bind an address and serve a router until termination.
async fn serve_on(host: &str, port: u16, router: Router, label: &str) -> Result<(), ServerError> {
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .map_err(|e| ServerError::Bind(format!("invalid address: {e}")))?;

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| ServerError::Bind(format!("bind failed on {addr}: {e}")))?;

    info!(%addr, "{label} listening");

    axum::serve(listener, router)
        .await
        .map_err(|e| ServerError::Serve(format!("serve error: {e}")))?;

    Ok(())
}
