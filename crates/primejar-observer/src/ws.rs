//! WebSocket handler for the persistent push channel.
//!
//! Clients connect to the push listener's root route with the `arduino`
//! subprotocol and receive a bare numeric text frame each time the
//! counter lands on a new prime. The channel is bidirectional: a client
//! text message `"step"` commands a step, and `"ping"` is keep-warm
//! noise that keeps intermediaries from idling the connection.
//!
//! Liveness is protocol-level only: the sweep commands this task to send
//! Ping frames, and only the client's Pong frames confirm liveness.
//! If a client falls behind the broadcast channel, lagged values are
//! silently skipped and the client resumes from the most recent prime.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use tracing::{debug, warn};

use crate::hub::ProbeCommand;
use crate::state::AppState;

/// Subprotocol tag the original device advertises on its push channel.
pub const PUSH_SUBPROTOCOL: &str = "arduino";

/// Buffered probe commands per connection; the sweep sends at most one
/// command per interval, so a small buffer is plenty.
const PROBE_COMMAND_BUFFER: usize = 4;

/// Upgrade an HTTP request to a `WebSocket` connection on the push
/// channel and begin streaming counter updates.
///
/// # Route
///
/// `GET /` on the push listener.
pub async fn ws_push(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.protocols([PUSH_SUBPROTOCOL])
        .on_upgrade(|socket| handle_push(socket, state))
}

/// Handle the `WebSocket` lifecycle: register with the hub, forward
/// counter updates, answer probes, and execute step commands.
async fn handle_push(mut socket: WebSocket, state: Arc<AppState>) {
    let (probe_tx, mut probe_rx) = tokio::sync::mpsc::channel(PROBE_COMMAND_BUFFER);
    let connection = state.registry.register(probe_tx).await;
    let id = connection.id();
    debug!(%id, "push client connected");

    let mut rx = state.subscribe();

    loop {
        tokio::select! {
            // Receive a counter update from the engine.
            result = rx.recv() => {
                match result {
                    Ok(value) => {
                        let frame = Message::Text(value.to_string().into());
                        if socket.send(frame).await.is_err() {
                            debug!(%id, "push client disconnected (send failed)");
                            break;
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                        debug!(%id, skipped = n, "push client lagged, skipping ahead");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                        debug!(%id, "announce channel closed, shutting down push client");
                        break;
                    }
                }
            }
            // Execute a command from the liveness sweep.
            command = probe_rx.recv() => {
                match command {
                    Some(ProbeCommand::Probe) => {
                        if socket.send(Message::Ping(Bytes::new())).await.is_err() {
                            debug!(%id, "push client disconnected (probe failed)");
                            break;
                        }
                    }
                    Some(ProbeCommand::Terminate) | None => {
                        debug!(%id, "terminating push client");
                        break;
                    }
                }
            }
            // Handle a frame from the client.
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        match text.as_str() {
                            "step" => {
                                if let Err(e) = state.command_step().await {
                                    warn!(%id, error = %e, "step command failed");
                                }
                            }
                            // Keep-warm only; not a liveness confirmation.
                            "ping" => debug!(%id, "keep-warm ping"),
                            other => {
                                debug!(%id, message = other, "ignoring unknown text message");
                            }
                        }
                    }
                    Some(Ok(Message::Pong(_))) => {
                        connection.confirm_alive().await;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        let pong = Message::Pong(data);
                        if socket.send(pong).await.is_err() {
                            debug!(%id, "push client disconnected (pong failed)");
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        debug!(%id, "push client disconnected");
                        break;
                    }
                    Some(Err(e)) => {
                        debug!(%id, error = %e, "push client socket error");
                        break;
                    }
                    Some(Ok(Message::Binary(_))) => {
                        // Binary frames are not part of the protocol.
                    }
                }
            }
        }
    }

    state.registry.deregister(id).await;
}
