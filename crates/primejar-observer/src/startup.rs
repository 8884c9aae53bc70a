//! Observer startup helper for embedding in the device binary.
//!
//! Provides [`spawn_observer`] which launches the request gateway, the
//! push listener, and the liveness sweep on background Tokio tasks. The
//! device binary calls this during startup so the network surface runs
//! concurrently with whatever else the process does.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::info;

use crate::hub;
use crate::server::{ServerConfig, ServerError};
use crate::state::AppState;

/// Errors that can occur when spawning the observer tasks.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// A listener failed to bind or start.
    #[error("server start error: {0}")]
    Server(#[from] ServerError),
}

/// Background task handles for the observer surface.
///
/// The caller should hold these and abort or await them during clean
/// shutdown. Dropping them detaches the tasks.
#[derive(Debug)]
pub struct ObserverHandles {
    /// The request gateway server task.
    pub gateway: JoinHandle<()>,

    /// The push channel server task.
    pub push: JoinHandle<()>,

    /// The liveness sweep task.
    pub sweep: JoinHandle<()>,
}

/// Spawn the jar's network surface on background Tokio tasks.
///
/// Starts three tasks: the request gateway on `config.http_port`, the
/// push listener on `config.push_port`, and the hub liveness sweep at
/// `probe_interval`. Obvious address misconfigurations are caught
/// eagerly before any task is spawned.
///
/// # Errors
///
/// Returns [`StartupError::Server`] if the configured address cannot be
/// parsed. Bind failures inside the spawned tasks are logged.
pub fn spawn_observer(
    config: &ServerConfig,
    state: &Arc<AppState>,
    probe_interval: Duration,
) -> Result<ObserverHandles, StartupError> {
    // Verify the address is parseable before spawning anything. The
    // actual binds happen inside the server tasks.
    let addr_str = format!("{}:{}", config.host, config.http_port);
    let _: std::net::SocketAddr = addr_str.parse().map_err(|e| {
        StartupError::Server(ServerError::Bind(format!("invalid address {addr_str}: {e}")))
    })?;

    let gateway = {
        let config = config.clone();
        let state = Arc::clone(state);
        tokio::spawn(async move {
            if let Err(e) = crate::server::start_server(&config, state).await {
                tracing::error!(error = %e, "gateway exited with error");
            }
        })
    };

    let push = {
        let config = config.clone();
        let state = Arc::clone(state);
        tokio::spawn(async move {
            if let Err(e) = crate::server::start_push_server(&config, state).await {
                tracing::error!(error = %e, "push listener exited with error");
            }
        })
    };

    let sweep = {
        let registry = Arc::clone(&state.registry);
        tokio::spawn(hub::run_liveness_sweep(registry, probe_interval))
    };

    info!(
        http_port = config.http_port,
        push_port = config.push_port,
        probe_interval_secs = probe_interval.as_secs(),
        "observer tasks spawned"
    );

    Ok(ObserverHandles { gateway, push, sweep })
}
