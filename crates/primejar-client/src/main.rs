//! `jar-monitor` -- follow a Jar of Primes from the terminal.
//!
//! Connects to a jar's push channel (falling back to polling, exactly
//! like the browser client) and logs every counter movement through a
//! [`TracingDisplay`](primejar_client::TracingDisplay).
//!
//! # Usage
//!
//! ```text
//! jar-monitor [HOST] [HTTP_PORT] [PUSH_PORT]
//! ```
//!
//! Defaults: `127.0.0.1`, `8080`, `8081`. Log verbosity follows
//! `RUST_LOG` (default `info`).

use anyhow::Context;
use primejar_client::{ClientSession, SessionConfig, TracingDisplay};
use primejar_core::config::ClientConfig;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let mut args = std::env::args().skip(1);
    let host = args.next().unwrap_or_else(|| String::from("127.0.0.1"));
    let http_port: u16 = match args.next() {
        Some(raw) => raw.parse().context("HTTP_PORT must be a port number")?,
        None => 8080,
    };
    let push_port: u16 = match args.next() {
        Some(raw) => raw.parse().context("PUSH_PORT must be a port number")?,
        None => 8081,
    };

    let gateway_url = format!("http://{host}:{http_port}");
    let push_url = format!("ws://{host}:{push_port}/");
    info!(gateway_url, push_url, "jar-monitor starting");

    let config =
        SessionConfig::from_client_config(gateway_url, push_url, &ClientConfig::default());
    let (mut session, _step_handle) = ClientSession::new(config, TracingDisplay::new());

    // Runs until interrupted; nothing inside is fatal.
    session.run().await;

    Ok(())
}
